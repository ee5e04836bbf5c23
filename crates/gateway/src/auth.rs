//! # ベアラートークン認証
//!
//! 解決済みトークンの検証と、資格情報必須設定の適用。

use std::time::{SystemTime, UNIX_EPOCH};

use s3url_types::Claims;

use crate::error::GatewayError;

/// ベアラートークンの検証インターフェース。
pub trait TokenVerifier: Send + Sync {
    /// トークンを検証し、クレームを返す。不正なトークンは `Unauthorized`。
    fn verify(&self, token: &str) -> Result<Claims, GatewayError>;
}

/// HMAC署名JWTの検証器（HS256/HS384/HS512）。
pub struct JwtVerifier {
    secret: Vec<u8>,
}

impl JwtVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Claims, GatewayError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| GatewayError::Internal(format!("時刻取得失敗: {e}")))?
            .as_secs();

        s3url_crypto::jwt::decode(token, &self.secret, now)
            .map_err(|e| GatewayError::Unauthorized(e.to_string()))
    }
}

/// 資格情報の有無と設定に応じて認証を行う。
///
/// - トークンなし・任意 → `Ok(None)`
/// - トークンなし・必須 → `Unauthorized`
/// - トークンあり → 必須設定にかかわらず検証し、失敗すれば `Unauthorized`
pub fn authorize(
    verifier: &dyn TokenVerifier,
    credentials_required: bool,
    credential: Option<&str>,
) -> Result<Option<Claims>, GatewayError> {
    match credential {
        Some(token) => verifier.verify(token).map(Some),
        None if credentials_required => Err(GatewayError::Unauthorized(
            "ベアラートークンが必要です".to_string(),
        )),
        None => Ok(None),
    }
}
