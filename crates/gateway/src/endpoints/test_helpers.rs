//! # エンドポイントテスト用共通ヘルパー
//!
//! 署名呼び出しを記録するモック署名器と、テスト用GatewayStateの構築。

use std::sync::{Arc, Mutex};
use std::time::Duration;

use s3url_crypto::jwt::{encode, JwtAlgorithm};
use s3url_types::SigningRequest;

use crate::auth::JwtVerifier;
use crate::config::{GatewayConfig, GatewayState};
use crate::error::GatewayError;
use crate::signer::UrlSigner;

pub const TEST_SECRET: &str = "test-secret";

/// 署名リクエストを記録し、ダミーURLを返すモック署名器。
pub struct RecordingSigner {
    calls: Arc<Mutex<Vec<SigningRequest>>>,
}

impl RecordingSigner {
    /// 署名器と、記録された呼び出しへのハンドルを返す。
    pub fn new() -> (Self, Arc<Mutex<Vec<SigningRequest>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait::async_trait]
impl UrlSigner for RecordingSigner {
    async fn presign(&self, request: &SigningRequest) -> Result<String, GatewayError> {
        self.calls.lock().unwrap().push(request.clone());
        Ok(format!(
            "https://{}.s3.amazonaws.com/{}?op={}&X-Amz-Expires={}",
            request.container_id,
            request.object_id,
            request.verb.operation(),
            request.expiry_secs
        ))
    }
}

/// 常に失敗するモック署名器。
pub struct FailingSigner;

#[async_trait::async_trait]
impl UrlSigner for FailingSigner {
    async fn presign(&self, _request: &SigningRequest) -> Result<String, GatewayError> {
        Err(GatewayError::SigningFailure(
            "The AWS Access Key Id you provided does not exist in our records.".to_string(),
        ))
    }
}

/// 応答しないモック署名器（タイムアウト確認用）。
pub struct StalledSigner;

#[async_trait::async_trait]
impl UrlSigner for StalledSigner {
    async fn presign(&self, _request: &SigningRequest) -> Result<String, GatewayError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(String::new())
    }
}

/// テスト用設定（環境変数なし相当 + テスト用シークレット）。
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::from_lookup(|_| None).unwrap();
    config.jwt_secret = TEST_SECRET.to_string();
    config.expiry_secs = 3600;
    config
}

/// テスト用GatewayStateを構築する。
pub fn test_state(config: GatewayConfig, signer: impl UrlSigner + 'static) -> Arc<GatewayState> {
    let verifier = JwtVerifier::new(config.jwt_secret.as_bytes());
    Arc::new(GatewayState {
        config,
        signer: Box::new(signer),
        verifier: Box::new(verifier),
    })
}

/// テスト用シークレットで署名したJWTを生成する。
pub fn test_token(sub: &str) -> String {
    let claims = serde_json::json!({ "sub": sub });
    encode(
        JwtAlgorithm::Hs256,
        claims.as_object().unwrap(),
        TEST_SECRET.as_bytes(),
    )
    .unwrap()
}
