use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::repositories::{AuditSink, CredentialStore};
use crate::services::TwoFactorService;
use crate::totp::TotpParams;

/// アプリケーション共有状態
///
/// axum の State として全ハンドラーで共有される。
/// Clone は必須（axum が内部で clone するため）。
#[derive(Clone)]
pub struct AppState {
    /// アプリケーション設定（Arc で共有）
    pub config: Arc<Config>,
    /// 資格情報ストア（ヘルスチェック用）
    pub store: Arc<dyn CredentialStore>,
    /// 2FAサービス
    pub two_factor_service: TwoFactorService,
}

impl AppState {
    /// 新しい AppState を作成
    ///
    /// TOTP パラメータが不正な場合はエラー。
    pub fn new(
        store: Arc<dyn CredentialStore>,
        audit: Arc<dyn AuditSink>,
        config: Config,
    ) -> Result<Self, AppError> {
        let config = Arc::new(config);

        let params = TotpParams::new(
            config.totp_step_secs,
            config.totp_digits,
            config.totp_window,
        )?;

        tracing::info!(
            step_secs = params.step_secs(),
            digits = params.digits(),
            window = params.window(),
            "TOTP パラメータ"
        );

        let two_factor_service = TwoFactorService::new(
            store.clone(),
            audit,
            params,
            config.totp_default_issuer.clone(),
        );

        Ok(Self {
            config,
            store,
            two_factor_service,
        })
    }
}
