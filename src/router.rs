use axum::{
    Router,
    routing::{get, post},
};
use http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::handlers;
use crate::state::AppState;

/// Router の構築
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .route("/", get(handlers::root))
        .route("/api/health", get(handlers::health_check))
        .route("/api/health/store", get(handlers::store_health))
        // 二要素認証
        .route("/2fa/setup", post(handlers::setup_2fa))
        .route("/2fa/verify", post(handlers::verify_2fa))
        .route("/2fa/status", get(handlers::status_2fa))
        .route("/2fa/disable", post(handlers::disable_2fa))
        .layer(cors)
        .with_state(state)
}

/// CORS レイヤー（許可オリジン未指定なら全許可）
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = ?e, origin = %origin, "不正な CORS オリジンを無視");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}
