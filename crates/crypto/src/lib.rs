//! # s3-url-service 暗号処理
//!
//! ベアラートークン（JWT）の署名・検証に用いるHMACプリミティブを提供する。
//!
//! ## 暗号アルゴリズム
//! | JWT `alg` | アルゴリズム |
//! |-----------|------------|
//! | HS256 | HMAC-SHA256 |
//! | HS384 | HMAC-SHA384 |
//! | HS512 | HMAC-SHA512 |

pub mod jwt;

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};

/// 暗号処理のエラー型
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// HMAC鍵の初期化エラー
    #[error("HMAC鍵が不正です")]
    InvalidKey,
    /// 署名検証エラー
    #[error("署名検証に失敗しました")]
    SignatureVerifyError,
    /// トークン形式エラー
    #[error("トークン形式が不正です: {0}")]
    MalformedToken(String),
    /// 未対応のアルゴリズム
    #[error("未対応のアルゴリズムです: {0}")]
    UnsupportedAlgorithm(String),
    /// 有効期限切れ
    #[error("トークンの有効期限が切れています")]
    Expired,
    /// 有効期間開始前
    #[error("トークンはまだ有効ではありません")]
    NotYetValid,
}

/// HMACのハッシュ関数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HmacAlgorithm {
    /// HMAC-SHA256
    Sha256,
    /// HMAC-SHA384
    Sha384,
    /// HMAC-SHA512
    Sha512,
}

/// HMACによる署名。
pub fn hmac_sign(
    algorithm: HmacAlgorithm,
    secret: &[u8],
    message: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    match algorithm {
        HmacAlgorithm::Sha256 => sign_with::<Hmac<Sha256>>(secret, message),
        HmacAlgorithm::Sha384 => sign_with::<Hmac<Sha384>>(secret, message),
        HmacAlgorithm::Sha512 => sign_with::<Hmac<Sha512>>(secret, message),
    }
}

/// HMACによる署名検証（定数時間比較）。
pub fn hmac_verify(
    algorithm: HmacAlgorithm,
    secret: &[u8],
    message: &[u8],
    tag: &[u8],
) -> Result<(), CryptoError> {
    match algorithm {
        HmacAlgorithm::Sha256 => verify_with::<Hmac<Sha256>>(secret, message, tag),
        HmacAlgorithm::Sha384 => verify_with::<Hmac<Sha384>>(secret, message, tag),
        HmacAlgorithm::Sha512 => verify_with::<Hmac<Sha512>>(secret, message, tag),
    }
}

/// 鍵を設定し、メッセージを入力済みのMACを返す。
fn keyed_mac<M: Mac + KeyInit>(secret: &[u8], message: &[u8]) -> Result<M, CryptoError> {
    let mut mac = <M as KeyInit>::new_from_slice(secret).map_err(|_| CryptoError::InvalidKey)?;
    mac.update(message);
    Ok(mac)
}

fn sign_with<M: Mac + KeyInit>(secret: &[u8], message: &[u8]) -> Result<Vec<u8>, CryptoError> {
    Ok(keyed_mac::<M>(secret, message)?
        .finalize()
        .into_bytes()
        .to_vec())
}

fn verify_with<M: Mac + KeyInit>(
    secret: &[u8],
    message: &[u8],
    tag: &[u8],
) -> Result<(), CryptoError> {
    keyed_mac::<M>(secret, message)?
        .verify_slice(tag)
        .map_err(|_| CryptoError::SignatureVerifyError)
}
