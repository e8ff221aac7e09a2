use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// アプリケーションエラー
///
/// 不正な形式の認証コードはエラーではなく「不一致」として扱うため、ここには含まない。
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    #[error("二要素認証が設定されていません")]
    NotConfigured,

    #[error("ストレージに接続できません")]
    StoreUnavailable(#[from] sqlx::Error),

    #[error("安全な乱数生成器が利用できません")]
    RandomSource(#[source] rand::Error),

    #[error("QRコード生成エラー: {0}")]
    QrRender(String),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::NotConfigured => (
                StatusCode::NOT_FOUND,
                "このユーザーの二要素認証は設定されていません".to_string(),
            ),
            Self::StoreUnavailable(e) => {
                tracing::error!(error = ?e, "ストレージエラー");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "ストレージが利用できません".to_string(),
                )
            }
            Self::RandomSource(e) => {
                tracing::error!(error = %e, "乱数生成器エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::QrRender(e) => {
                tracing::error!(error = %e, "QRコード生成エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "内部エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
