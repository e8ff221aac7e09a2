use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::state::AppState;

/// ルートレスポンス
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

/// GET /
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "2FA backend running",
    })
}

/// ヘルスチェックレスポンス
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// ヘルスチェックハンドラー
///
/// GET /api/health
///
/// サービスの稼働状況を返す。
/// ロードバランサーやモニタリングツールから呼び出される。
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// ストア疎通チェックレスポンス
#[derive(Debug, Serialize)]
pub struct StoreHealthResponse {
    pub status: &'static str,
    pub store: &'static str,
}

/// GET /api/health/store
///
/// 資格情報ストアへの疎通を確認する。失敗時は 503。
pub async fn store_health(
    State(state): State<AppState>,
) -> (StatusCode, Json<StoreHealthResponse>) {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(StoreHealthResponse {
                status: "ok",
                store: "connected",
            }),
        ),
        Err(e) => {
            tracing::warn!(error = ?e, "ストア疎通チェック失敗");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(StoreHealthResponse {
                    status: "degraded",
                    store: "unavailable",
                }),
            )
        }
    }
}
