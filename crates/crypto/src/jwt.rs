//! # JWT（HMAC署名）
//!
//! `header.payload.signature` 形式（各部Base64URL、パディングなし）のトークンを
//! 生成・検証する。対応する `alg` は HS256 / HS384 / HS512 のみで、
//! `none` を含むそれ以外は拒否する。

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{hmac_sign, hmac_verify, CryptoError, HmacAlgorithm};

/// Base64エンジン（URL-safe、パディングなし）
fn b64url() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::URL_SAFE_NO_PAD
}

/// JWTの署名アルゴリズム。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtAlgorithm {
    /// HMAC-SHA256
    Hs256,
    /// HMAC-SHA384
    Hs384,
    /// HMAC-SHA512
    Hs512,
}

impl JwtAlgorithm {
    /// ヘッダーの `alg` 値を返す。
    pub fn name(self) -> &'static str {
        match self {
            JwtAlgorithm::Hs256 => "HS256",
            JwtAlgorithm::Hs384 => "HS384",
            JwtAlgorithm::Hs512 => "HS512",
        }
    }

    /// ヘッダーの `alg` 値から解決する。
    pub fn from_name(name: &str) -> Result<Self, CryptoError> {
        match name {
            "HS256" => Ok(JwtAlgorithm::Hs256),
            "HS384" => Ok(JwtAlgorithm::Hs384),
            "HS512" => Ok(JwtAlgorithm::Hs512),
            other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    fn hmac(self) -> HmacAlgorithm {
        match self {
            JwtAlgorithm::Hs256 => HmacAlgorithm::Sha256,
            JwtAlgorithm::Hs384 => HmacAlgorithm::Sha384,
            JwtAlgorithm::Hs512 => HmacAlgorithm::Sha512,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// クレームからJWTを生成する。
pub fn encode(
    algorithm: JwtAlgorithm,
    claims: &Map<String, Value>,
    secret: &[u8],
) -> Result<String, CryptoError> {
    let header = Header {
        alg: algorithm.name().to_string(),
        typ: Some("JWT".to_string()),
    };
    let header_json = serde_json::to_vec(&header)
        .map_err(|e| CryptoError::MalformedToken(format!("ヘッダーのシリアライズに失敗: {e}")))?;
    let claims_json = serde_json::to_vec(claims)
        .map_err(|e| CryptoError::MalformedToken(format!("クレームのシリアライズに失敗: {e}")))?;

    let signing_input = format!(
        "{}.{}",
        b64url().encode(header_json),
        b64url().encode(claims_json)
    );
    let tag = hmac_sign(algorithm.hmac(), secret, signing_input.as_bytes())?;

    Ok(format!("{signing_input}.{}", b64url().encode(tag)))
}

/// JWTを検証し、クレームを返す。
///
/// - 署名はヘッダーの `alg` に従って定数時間で比較する
/// - `exp` が `now_secs` 以下なら `Expired`
/// - `nbf` が `now_secs` より後なら `NotYetValid`
pub fn decode(token: &str, secret: &[u8], now_secs: u64) -> Result<Map<String, Value>, CryptoError> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(CryptoError::MalformedToken(
            "3つのセグメントが必要です".to_string(),
        ));
    };

    let header: Header = serde_json::from_slice(&decode_segment(header_b64, "ヘッダー")?)
        .map_err(|e| CryptoError::MalformedToken(format!("ヘッダーのパースに失敗: {e}")))?;
    let algorithm = JwtAlgorithm::from_name(&header.alg)?;

    let signature = decode_segment(signature_b64, "署名")?;
    let signing_input_len = header_b64.len() + 1 + claims_b64.len();
    hmac_verify(
        algorithm.hmac(),
        secret,
        &token.as_bytes()[..signing_input_len],
        &signature,
    )?;

    let claims: Map<String, Value> =
        serde_json::from_slice(&decode_segment(claims_b64, "クレーム")?)
            .map_err(|e| CryptoError::MalformedToken(format!("クレームのパースに失敗: {e}")))?;

    if let Some(exp) = numeric_date(&claims, "exp")? {
        if exp <= now_secs as f64 {
            return Err(CryptoError::Expired);
        }
    }
    if let Some(nbf) = numeric_date(&claims, "nbf")? {
        if nbf > now_secs as f64 {
            return Err(CryptoError::NotYetValid);
        }
    }

    Ok(claims)
}

fn decode_segment(segment: &str, label: &str) -> Result<Vec<u8>, CryptoError> {
    b64url()
        .decode(segment.trim_end_matches('='))
        .map_err(|e| CryptoError::MalformedToken(format!("{label}のBase64デコードに失敗: {e}")))
}

fn numeric_date(claims: &Map<String, Value>, name: &str) -> Result<Option<f64>, CryptoError> {
    match claims.get(name) {
        None => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| CryptoError::MalformedToken(format!("{name}は数値である必要があります"))),
    }
}
