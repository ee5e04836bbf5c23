//! # 署名付きURL生成
//!
//! 署名付きURL生成器の抽象インターフェース。
//! S3実装は `s3` サブモジュールを参照。

pub mod s3;

pub use self::s3::S3UrlSigner;

use s3url_types::SigningRequest;

use crate::error::GatewayError;

/// 署名付きURL生成の抽象インターフェース。
///
/// Gateway運用者はAWS S3やS3互換ストレージ（MinIO, Cloudflare R2等）を
/// 実装として選択できる。
#[async_trait::async_trait]
pub trait UrlSigner: Send + Sync {
    /// リクエスト記述子から署名付きURLを生成する。
    ///
    /// 失敗は設定または権限の問題であり、呼び出し側で再試行しない。
    async fn presign(&self, request: &SigningRequest) -> Result<String, GatewayError>;
}
