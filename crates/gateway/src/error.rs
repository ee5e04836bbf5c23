//! # Gateway エラー型
//!
//! すべてのリクエストエラーはここでHTTPレスポンスに変換される。

use axum::http::StatusCode;
use s3url_types::MISSING_PARAMETER_MESSAGE;

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// バケットまたはキーのパスパラメータが欠落
    #[error("ERROR: {}", MISSING_PARAMETER_MESSAGE)]
    MissingParameter,
    /// 不正なリクエスト（パスのデコード失敗等）
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),
    /// ベアラートークンが必要だが未提示、またはトークンが不正
    #[error("認証に失敗: {0}")]
    Unauthorized(String),
    /// 署名付きURLの生成に失敗
    #[error("署名付きURL生成に失敗: {0}")]
    SigningFailure(String),
    /// 署名付きURLの生成がタイムアウト
    #[error("署名付きURL生成が{0}秒以内に完了しませんでした")]
    SigningTimeout(u64),
    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            GatewayError::MissingParameter | GatewayError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatewayError::SigningFailure(_) => StatusCode::BAD_GATEWAY,
            GatewayError::SigningTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
