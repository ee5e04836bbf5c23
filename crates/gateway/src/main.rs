//! # s3-url-service Gateway
//!
//! バケット・キーのパスを短命の署名付きS3 URLへリダイレクトするGateway。
//! データ転送は行わず、リダイレクトのみを返す。
//!
//! ## 役割
//! - ベアラートークン（JWT）の検証（ヘッダー > クエリ > Cookie）
//! - パスパラメータ（バケット・キー）の検証
//! - 署名付きURLの発行とリダイレクト
//!
//! ## API エンドポイント
//! - `GET /{bucket}/{key...}` — 取得用署名付きURLへ307リダイレクト
//! - `PUT /{bucket}/{key...}` — 格納用署名付きURLへ307リダイレクト（SSE-KMS対応）

mod auth;
mod config;
mod endpoints;
mod error;
mod signer;
mod validator;

use std::sync::Arc;

use axum::routing::get;

use crate::auth::JwtVerifier;
use crate::config::{load_env_file, GatewayConfig, GatewayState, ENV_FILE, SERVICE_NAME};
use crate::endpoints::{handle_get_object, handle_put_object};
use crate::signer::S3UrlSigner;

/// ルーターを構築する。
///
/// `/` も登録し、パラメータ欠落として `MissingParameter` を返させる。
fn build_router(state: Arc<GatewayState>) -> axum::Router {
    axum::Router::new()
        .route("/", get(handle_get_object).put(handle_put_object))
        .route("/{*path}", get(handle_get_object).put(handle_put_object))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// エントリポイント
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    if load_env_file(ENV_FILE) {
        tracing::info!(path = ENV_FILE, "環境変数ファイルを読み込みました");
    }
    let config = GatewayConfig::from_env()?;
    if config.uses_default_secret() {
        tracing::warn!("JWT_SECRETが未設定です。既定のシークレットを使用します（開発環境用）");
    }
    tracing::info!(
        region = %config.storage.region,
        expiry_secs = config.expiry_secs,
        credentials_required = config.credentials_required,
        sse_kms = config.sse_kms_key_id.is_some(),
        signing_timeout_secs = config.signing_timeout.as_secs(),
        "設定を読み込みました"
    );

    let signer = S3UrlSigner::from_config(&config.storage)?;
    let verifier = JwtVerifier::new(config.jwt_secret.as_bytes());
    let addr = format!("0.0.0.0:{}", config.port);

    let state = Arc::new(GatewayState {
        config,
        signer: Box::new(signer),
        verifier: Box::new(verifier),
    });

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("{} を {} で起動します", SERVICE_NAME, addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// テスト
// ---------------------------------------------------------------------------
