use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use time::OffsetDateTime;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::AppError;
use crate::models::{AuditAction, AuditEvent, CredentialUpsert};
use crate::repositories::{AuditSink, CredentialStore};
use crate::services::qr;
use crate::totp::{CredentialState, TotpParams, codec, engine};

const LOCK_STRIPES: usize = 64;

/// プロビジョニング結果（シークレットを返すのはここだけ）
#[derive(Debug, Serialize)]
pub struct Provisioning {
    pub user_id: String,
    pub issuer: String,
    pub label: String,
    pub secret: String,
    pub otpauth_url: String,
    pub qr_data_url: String,
    pub enabled: bool,
}

/// 検証結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VerifyOutcome {
    pub success: bool,
    pub verified: bool,
    pub enabled: bool,
}

/// 状態照会の結果。シークレットは含まない
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub user_id: String,
    pub enabled: bool,
    pub configured: bool,
    pub state: CredentialState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// 無効化結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisableOutcome {
    pub success: bool,
    pub enabled: bool,
}

/// ユーザー単位の排他ロック（ストライプ方式）
///
/// 同一 `user_id` の読み込み→書き込みをプロセス内で直列化する。
/// 異なるユーザーが同じストライプに割り当てられた場合は互いに待たされる。
struct UserLocks {
    stripes: Vec<Mutex<()>>,
}

impl UserLocks {
    fn new() -> Self {
        Self {
            stripes: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    fn stripe_index(&self, user_id: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        user_id.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }

    async fn lock(&self, user_id: &str) -> MutexGuard<'_, ()> {
        self.stripes[self.stripe_index(user_id)].lock().await
    }
}

/// 二要素認証サービス
///
/// # Security
/// - シークレットと認証コードはログに出力しない
/// - `enabled = true` にするのは検証成功時のみ
#[derive(Clone)]
pub struct TwoFactorService {
    store: Arc<dyn CredentialStore>,
    audit: Arc<dyn AuditSink>,
    params: TotpParams,
    default_issuer: String,
    locks: Arc<UserLocks>,
}

impl TwoFactorService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        audit: Arc<dyn AuditSink>,
        params: TotpParams,
        default_issuer: String,
    ) -> Self {
        Self {
            store,
            audit,
            params,
            default_issuer,
            locks: Arc::new(UserLocks::new()),
        }
    }

    /// シークレットを発行（既存があれば再利用）
    ///
    /// 既存の資格情報がある場合はシークレットと有効状態をそのまま返し、
    /// issuer と label のみ更新する。途中で設定を中断したユーザーが再試行しても
    /// 同じ QR コードが得られる。
    pub async fn provision(
        &self,
        user_id: &str,
        issuer: Option<&str>,
        label: Option<&str>,
    ) -> Result<Provisioning, AppError> {
        let issuer = issuer.unwrap_or(&self.default_issuer).to_string();
        let label = label.unwrap_or(user_id).to_string();

        let _guard = self.locks.lock(user_id).await;

        let existing = self
            .store
            .find_by_user_id(user_id)
            .await?
            .filter(|credential| !credential.secret.is_empty());

        let (secret, enabled, created) = match existing {
            Some(credential) => (credential.secret, credential.enabled, false),
            None => (codec::generate_secret()?, false, true),
        };

        let otpauth_url = codec::build_provisioning_uri(&secret, &label, &issuer);
        let qr_data_url = qr::data_url(&otpauth_url)?;

        self.store
            .upsert(&CredentialUpsert {
                user_id: user_id.to_string(),
                secret: secret.clone(),
                issuer: issuer.clone(),
                label: label.clone(),
                enabled,
            })
            .await?;

        if created {
            self.audit
                .record(AuditEvent::secret_created(user_id, &issuer, &label, &secret));
            tracing::info!(user_id = %user_id, "2FAシークレット発行");
        } else {
            tracing::info!(user_id = %user_id, enabled, "既存の2FAシークレットを再利用");
        }

        Ok(Provisioning {
            user_id: user_id.to_string(),
            issuer,
            label,
            secret,
            otpauth_url,
            qr_data_url,
            enabled,
        })
    }

    /// 現在時刻で認証コードを検証
    pub async fn verify(&self, user_id: &str, code: &str) -> Result<VerifyOutcome, AppError> {
        self.verify_at(user_id, code, OffsetDateTime::now_utc())
            .await
    }

    /// 指定時刻で認証コードを検証
    ///
    /// 一致した場合のみ有効化する。不一致（不正な形式を含む）はエラーではなく
    /// `success: false` を返し、状態は変更しない。
    ///
    /// # Errors
    /// 資格情報がなければ [`AppError::NotConfigured`]。
    pub async fn verify_at(
        &self,
        user_id: &str,
        code: &str,
        now: OffsetDateTime,
    ) -> Result<VerifyOutcome, AppError> {
        let _guard = self.locks.lock(user_id).await;

        let credential = self
            .store
            .find_by_user_id(user_id)
            .await?
            .ok_or(AppError::NotConfigured)?;

        if !engine::verify(&credential.secret, code, now, &self.params) {
            self.audit.record(AuditEvent::new(
                user_id,
                AuditAction::VerifyFailure,
                json!({}),
            ));
            tracing::info!(user_id = %user_id, "2FAコード不一致");

            return Ok(VerifyOutcome {
                success: false,
                verified: false,
                enabled: credential.enabled,
            });
        }

        if !self.store.set_enabled(user_id, true, Some(now)).await? {
            return Err(AppError::NotConfigured);
        }

        let previous = credential.state();
        let next = previous.on_verified();

        self.audit.record(AuditEvent::new(
            user_id,
            AuditAction::VerifySuccess,
            json!({ "previous_state": previous }),
        ));
        tracing::info!(user_id = %user_id, ?previous, "2FA有効化完了");

        Ok(VerifyOutcome {
            success: true,
            verified: true,
            enabled: next.is_enabled(),
        })
    }

    /// 状態照会（シークレットは返さない）
    pub async fn status(&self, user_id: &str) -> Result<StatusReport, AppError> {
        let credential = self.store.find_by_user_id(user_id).await?;
        let state = credential
            .as_ref()
            .map_or(CredentialState::Unprovisioned, |credential| credential.state());

        let (issuer, label) = match credential {
            Some(credential) => (Some(credential.issuer), Some(credential.label)),
            None => (None, None),
        };

        Ok(StatusReport {
            user_id: user_id.to_string(),
            enabled: state.is_enabled(),
            configured: state.is_configured(),
            state,
            issuer,
            label,
        })
    }

    /// 2FA無効化（シークレットは保持する）
    ///
    /// # Errors
    /// 資格情報がなければ [`AppError::NotConfigured`]。
    pub async fn disable(&self, user_id: &str) -> Result<DisableOutcome, AppError> {
        let _guard = self.locks.lock(user_id).await;

        let credential = self
            .store
            .find_by_user_id(user_id)
            .await?
            .ok_or(AppError::NotConfigured)?;

        let previous = credential.state();
        let next = previous.on_disabled();

        if !self.store.set_enabled(user_id, next.is_enabled(), None).await? {
            return Err(AppError::NotConfigured);
        }

        self.audit.record(AuditEvent::new(
            user_id,
            AuditAction::Disable,
            json!({ "previous_state": previous }),
        ));
        tracing::info!(user_id = %user_id, ?previous, "2FA無効化完了");

        Ok(DisableOutcome {
            success: true,
            enabled: next.is_enabled(),
        })
    }
}
