//! # リクエスト検証
//!
//! パスからバケット・キーを取り出し、ベアラートークンをヘッダー・クエリ・Cookieの
//! 優先順で解決する。

use std::collections::HashMap;

use axum::http::{header, HeaderMap};
use percent_encoding::percent_decode_str;

use crate::error::GatewayError;

/// トークンを受け付けるクエリパラメータ名・Cookie名
pub const TOKEN_PARAM: &str = "token";

/// 検証済みのオブジェクト位置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    /// バケット名（デコード済み）
    pub container_id: String,
    /// オブジェクトキー（デコード済み）
    pub object_id: String,
}

/// 未デコードのURIパスを `/{bucket}/{key...}` として解釈する。
///
/// バケットは `[A-Za-z0-9_.-]+`、キーは残り全体。どちらかが空、
/// またはパターンに一致しない場合は `MissingParameter`。
pub fn parse_object_path(path: &str) -> Result<ObjectLocation, GatewayError> {
    let rest = path
        .strip_prefix('/')
        .ok_or(GatewayError::MissingParameter)?;
    let (container_raw, object_raw) = rest
        .split_once('/')
        .ok_or(GatewayError::MissingParameter)?;

    if container_raw.is_empty() || !container_raw.bytes().all(is_container_byte) {
        return Err(GatewayError::MissingParameter);
    }

    let container_id = decode_component(container_raw)?;
    let object_id = decode_component(object_raw)?;
    if object_id.is_empty() {
        return Err(GatewayError::MissingParameter);
    }

    Ok(ObjectLocation {
        container_id,
        object_id,
    })
}

fn is_container_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-')
}

fn decode_component(raw: &str) -> Result<String, GatewayError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| GatewayError::BadRequest(format!("パスのデコードに失敗: {e}")))
}

/// ベアラートークンを解決する。
///
/// 優先順位:
/// 1. `Authorization: Bearer <token>`（スキームは大文字小文字を区別）
/// 2. クエリパラメータ `token`
/// 3. Cookie `token`
///
/// 最初に見つかった空でない値を返す。
pub fn resolve_credential(headers: &HeaderMap, query: &HashMap<String, String>) -> Option<String> {
    bearer_from_header(headers)
        .or_else(|| {
            query
                .get(TOKEN_PARAM)
                .filter(|token| !token.is_empty())
                .cloned()
        })
        .or_else(|| token_from_cookies(headers))
}

fn bearer_from_header(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split(' ');
    if parts.next() != Some("Bearer") {
        return None;
    }
    parts
        .next()
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn token_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| name.trim() == TOKEN_PARAM && !value.trim().is_empty())
        .map(|(_, value)| {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            percent_decode_str(value).decode_utf8_lossy().into_owned()
        })
}
