//! # s3-url-service 共有型定義
//!
//! 署名付きURLリクエストの記述子と、ベアラートークンのクレームを
//! Rust構造体として提供する。
//!
//! ## 操作の対応
//! | HTTPメソッド | Verb | S3操作 |
//! |------------|------|-------|
//! | GET | `Retrieve` | `getObject` |
//! | PUT | `Store` | `putObject` |

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// 定数
// ---------------------------------------------------------------------------

/// SigV4署名付きURLの最大有効期限（秒）。1週間。
pub const MAX_PRESIGN_EXPIRY_SECS: u32 = 60 * 60 * 24 * 7;

/// デフォルトのリンク・キャッシュ有効期限（秒）。
pub const DEFAULT_EXPIRY_SECS: u32 = MAX_PRESIGN_EXPIRY_SECS;

/// SSE-KMSのアルゴリズム識別子。
pub const SSE_ALGORITHM_KMS: &str = "aws:kms";

/// パスパラメータ欠落時のエラーメッセージ。
pub const MISSING_PARAMETER_MESSAGE: &str = "Requires both valid bucket and key parameters";

// ---------------------------------------------------------------------------
// 署名リクエスト
// ---------------------------------------------------------------------------

/// 署名付きURLで許可する操作。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Verb {
    /// オブジェクト取得（GET）
    Retrieve,
    /// オブジェクト格納（PUT）
    Store,
}

impl Verb {
    /// S3 API上の操作名を返す。
    pub fn operation(self) -> &'static str {
        match self {
            Verb::Retrieve => "getObject",
            Verb::Store => "putObject",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.operation())
    }
}

/// サーバーサイド暗号化パラメータ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSideEncryption {
    /// 暗号化アルゴリズム（"aws:kms"）
    pub algorithm: String,
    /// KMSキーID
    pub key_id: String,
}

impl ServerSideEncryption {
    /// 指定のキーIDでSSE-KMSパラメータを構築する。
    pub fn kms(key_id: impl Into<String>) -> Self {
        Self {
            algorithm: SSE_ALGORITHM_KMS.to_string(),
            key_id: key_id.into(),
        }
    }
}

/// 署名付きURL生成のリクエスト記述子。リクエストごとに構築され、永続化されない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningRequest {
    /// バケット名（デコード済み、空でない）
    pub container_id: String,
    /// オブジェクトキー（デコード済み、空でない、'/'を含み得る）
    pub object_id: String,
    /// 許可する操作
    pub verb: Verb,
    /// URLの有効期限（秒、1以上）
    pub expiry_secs: u32,
    /// サーバーサイド暗号化（Storeのみ）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_side_encryption: Option<ServerSideEncryption>,
}

// ---------------------------------------------------------------------------
// 認証
// ---------------------------------------------------------------------------

/// 検証済みベアラートークンのクレーム。
pub type Claims = serde_json::Map<String, serde_json::Value>;
