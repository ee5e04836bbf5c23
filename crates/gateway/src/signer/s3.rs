//! # S3 署名付きURL生成
//!
//! AWS S3, MinIO, Cloudflare R2 等のS3互換APIに対する
//! SigV4署名付きURLを生成する。署名はローカル計算でありネットワーク通信は発生しない。

// rust-s3 の presign_put は http 0.2 のヘッダー型を受け取る
use http02::{HeaderMap, HeaderName, HeaderValue};
use s3url_types::{ServerSideEncryption, SigningRequest, Verb};

use super::UrlSigner;
use crate::config::StorageConfig;
use crate::error::GatewayError;

/// SSEアルゴリズムを指定する署名対象ヘッダー
const SSE_HEADER: &str = "x-amz-server-side-encryption";
/// SSE-KMSキーIDを指定する署名対象ヘッダー
const SSE_KMS_KEY_ID_HEADER: &str = "x-amz-server-side-encryption-aws-kms-key-id";

/// S3互換ストレージによる署名付きURL生成器。
/// バケットはリクエストごとに異なるため、リージョンと資格情報のみを保持する。
pub struct S3UrlSigner {
    region: s3::Region,
    credentials: s3::creds::Credentials,
    /// カスタムエンドポイント使用時はパススタイルURLを生成する
    path_style: bool,
}

impl S3UrlSigner {
    pub fn new(region: s3::Region, credentials: s3::creds::Credentials, path_style: bool) -> Self {
        Self {
            region,
            credentials,
            path_style,
        }
    }

    /// 設定から構築する。
    ///
    /// `endpoint` が指定された場合はカスタムリージョンとして扱い、パススタイルを使用する。
    pub fn from_config(config: &StorageConfig) -> anyhow::Result<Self> {
        let region = match &config.endpoint {
            Some(endpoint) => {
                tracing::info!(s3_endpoint = %endpoint, "S3互換エンドポイントを設定");
                s3::Region::Custom {
                    region: config.region.clone(),
                    endpoint: endpoint.clone(),
                }
            }
            None => config.region.parse::<s3::Region>()?,
        };

        let credentials = s3::creds::Credentials::new(
            config.access_key_id.as_deref(),
            config.secret_access_key.as_deref(),
            None,
            config.session_token.as_deref(),
            None,
        )?;

        Ok(Self::new(region, credentials, config.endpoint.is_some()))
    }

    fn bucket(&self, name: &str) -> Result<s3::Bucket, GatewayError> {
        let bucket = s3::Bucket::new(name, self.region.clone(), self.credentials.clone())
            .map_err(|e| GatewayError::SigningFailure(format!("バケットの初期化に失敗: {e}")))?;
        let bucket = if self.path_style {
            bucket.with_path_style()
        } else {
            bucket
        };
        Ok(*bucket)
    }
}

/// SSEパラメータを署名対象ヘッダーに変換する。
fn sse_headers(sse: &ServerSideEncryption) -> Result<HeaderMap, GatewayError> {
    let value = |v: &str| {
        HeaderValue::from_str(v)
            .map_err(|e| GatewayError::Internal(format!("SSEヘッダー値が不正: {e}")))
    };

    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static(SSE_HEADER), value(&sse.algorithm)?);
    headers.insert(
        HeaderName::from_static(SSE_KMS_KEY_ID_HEADER),
        value(&sse.key_id)?,
    );
    Ok(headers)
}

#[async_trait::async_trait]
impl UrlSigner for S3UrlSigner {
    async fn presign(&self, request: &SigningRequest) -> Result<String, GatewayError> {
        let bucket = self.bucket(&request.container_id)?;
        let path = format!("/{}", request.object_id);

        let url = match request.verb {
            Verb::Retrieve => bucket.presign_get(&path, request.expiry_secs, None).await,
            Verb::Store => {
                let custom_headers = request
                    .server_side_encryption
                    .as_ref()
                    .map(sse_headers)
                    .transpose()?;
                bucket
                    .presign_put(&path, request.expiry_secs, custom_headers, None)
                    .await
            }
        };

        url.map_err(|e| GatewayError::SigningFailure(format!("{}: {e}", request.verb)))
    }
}
