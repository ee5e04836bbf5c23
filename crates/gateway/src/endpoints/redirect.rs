//! # GET/PUT /{bucket}/{key...}
//!
//! 署名付きURLへのリダイレクト。
//!
//! 処理順序:
//! 1. ベアラートークンの解決・検証（クレームはログに出力）
//! 2. パスからバケット・キーを取り出す
//! 3. 署名リクエストを構築し、署名器に送る（タイムアウト付き、再試行なし）
//! 4. `307 Temporary Redirect` + `Cache-Control: max-age=<有効期限>`

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use s3url_types::{ServerSideEncryption, SigningRequest, Verb};

use crate::auth::authorize;
use crate::config::{GatewayConfig, GatewayState};
use crate::error::GatewayError;
use crate::validator::{parse_object_path, resolve_credential, ObjectLocation};

/// GET — 取得用署名付きURLへリダイレクトする。
pub async fn handle_get_object(
    State(state): State<Arc<GatewayState>>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, GatewayError> {
    request_redirect(&state, Verb::Retrieve, &uri, &headers, &query).await
}

/// PUT — 格納用署名付きURLへリダイレクトする。
/// リクエストボディは読まない（307によりクライアントが署名付きURLへ再送する）。
pub async fn handle_put_object(
    State(state): State<Arc<GatewayState>>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, GatewayError> {
    request_redirect(&state, Verb::Store, &uri, &headers, &query).await
}

/// 署名リクエストを構築する。
///
/// SSE-KMSパラメータは `Store` かつキーIDが設定されている場合のみ付与する。
pub fn build_signing_request(
    location: ObjectLocation,
    verb: Verb,
    config: &GatewayConfig,
) -> SigningRequest {
    let server_side_encryption = match (verb, &config.sse_kms_key_id) {
        (Verb::Store, Some(key_id)) => Some(ServerSideEncryption::kms(key_id.clone())),
        _ => None,
    };

    SigningRequest {
        container_id: location.container_id,
        object_id: location.object_id,
        verb,
        expiry_secs: config.expiry_secs,
        server_side_encryption,
    }
}

/// 検証・署名・リダイレクト応答の構築を行う。
pub async fn request_redirect(
    state: &GatewayState,
    verb: Verb,
    uri: &Uri,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> Result<Response, GatewayError> {
    let credential = resolve_credential(headers, query);
    let claims = authorize(
        state.verifier.as_ref(),
        state.config.credentials_required,
        credential.as_deref(),
    )?;
    if let Some(claims) = claims {
        tracing::info!(claims = %serde_json::Value::Object(claims), "ベアラートークンのクレーム");
    }

    let location = parse_object_path(uri.path())?;
    let request = build_signing_request(location, verb, &state.config);

    let timeout = state.config.signing_timeout;
    let url = match tokio::time::timeout(timeout, state.signer.presign(&request)).await {
        Ok(result) => result.inspect_err(|e| {
            tracing::warn!(
                bucket = %request.container_id,
                key = %request.object_id,
                verb = %verb,
                error = %e,
                "署名付きURL生成に失敗"
            );
        })?,
        Err(_) => {
            tracing::warn!(
                bucket = %request.container_id,
                key = %request.object_id,
                timeout_secs = timeout.as_secs(),
                "署名付きURL生成がタイムアウト"
            );
            return Err(GatewayError::SigningTimeout(timeout.as_secs()));
        }
    };

    tracing::info!(
        bucket = %request.container_id,
        key = %request.object_id,
        verb = %verb,
        expiry_secs = request.expiry_secs,
        sse = request.server_side_encryption.is_some(),
        "署名付きURLへリダイレクト"
    );

    redirect_response(&url, request.expiry_secs)
}

/// `307 Temporary Redirect` 応答を構築する。メソッドとボディは保持される。
fn redirect_response(url: &str, max_age_secs: u32) -> Result<Response, GatewayError> {
    let location = HeaderValue::from_str(url)
        .map_err(|e| GatewayError::Internal(format!("署名付きURLをLocationに設定できません: {e}")))?;
    let cache_control = HeaderValue::from_str(&format!("max-age={max_age_secs}"))
        .map_err(|e| GatewayError::Internal(format!("Cache-Controlの構築に失敗: {e}")))?;

    Ok((
        StatusCode::TEMPORARY_REDIRECT,
        [
            (header::LOCATION, location),
            (header::CACHE_CONTROL, cache_control),
        ],
    )
        .into_response())
}
