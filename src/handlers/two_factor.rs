use axum::{
    Json,
    extract::{Query, State},
};
use garde::Validate;
use serde::Deserialize;

use crate::error::AppError;
use crate::services::{DisableOutcome, Provisioning, StatusReport, VerifyOutcome};
use crate::state::AppState;

// === 2FA Setup ===

#[derive(Debug, Deserialize, Validate)]
pub struct SetupRequest {
    #[garde(length(bytes, min = 1, max = 256))]
    pub user_id: String,
    /// 省略時は設定の既定発行者名
    #[garde(length(bytes, min = 1, max = 256))]
    pub issuer: Option<String>,
    /// 省略時は user_id
    #[garde(length(bytes, min = 1, max = 256))]
    pub label: Option<String>,
}

/// POST /2fa/setup
///
/// シークレット発行（既存があれば再利用）、QRコード返却
///
/// # Security
/// - シークレット平文はログ出力禁止
pub async fn setup_2fa(
    State(state): State<AppState>,
    Json(request): Json<SetupRequest>,
) -> Result<Json<Provisioning>, AppError> {
    validate(&request)?;

    let provisioning = state
        .two_factor_service
        .provision(
            &request.user_id,
            request.issuer.as_deref(),
            request.label.as_deref(),
        )
        .await?;

    Ok(Json(provisioning))
}

// === 2FA Verify ===

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyRequest {
    #[garde(length(bytes, min = 1, max = 256))]
    pub user_id: String,
    /// 形式はここでは検証しない（不正な形式は不一致として扱う）
    #[garde(skip)]
    pub code: String,
}

/// POST /2fa/verify
///
/// 認証コード検証（初回成功で有効化）
///
/// # Security
/// - コードはログ出力禁止
pub async fn verify_2fa(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyOutcome>, AppError> {
    validate(&request)?;

    let outcome = state
        .two_factor_service
        .verify(&request.user_id, &request.code)
        .await?;

    Ok(Json(outcome))
}

// === 2FA Status ===

#[derive(Debug, Deserialize, Validate)]
pub struct StatusQuery {
    #[garde(length(bytes, min = 1, max = 256))]
    pub user_id: String,
}

/// GET /2fa/status?user_id=...
///
/// 設定状況の照会（シークレットは返さない）
pub async fn status_2fa(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusReport>, AppError> {
    validate(&query)?;

    let report = state.two_factor_service.status(&query.user_id).await?;

    Ok(Json(report))
}

// === 2FA Disable ===

#[derive(Debug, Deserialize, Validate)]
pub struct DisableRequest {
    #[garde(length(bytes, min = 1, max = 256))]
    pub user_id: String,
}

/// POST /2fa/disable
///
/// 2FA無効化。未設定なら 404
pub async fn disable_2fa(
    State(state): State<AppState>,
    Json(request): Json<DisableRequest>,
) -> Result<Json<DisableOutcome>, AppError> {
    validate(&request)?;

    let outcome = state.two_factor_service.disable(&request.user_id).await?;

    Ok(Json(outcome))
}

// === Helper Functions ===

fn validate<T: Validate<Context = ()>>(value: &T) -> Result<(), AppError> {
    value
        .validate()
        .map_err(|report| AppError::Validation(report.to_string()))
}
