use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::models::{CredentialUpsert, TwoFactorCredential};
use crate::repositories::CredentialStore;

/// プロセス内メモリの資格情報ストア
///
/// ローカル実行とテスト用。プロセス終了で内容は消える。
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    credentials: Arc<RwLock<HashMap<String, TwoFactorCredential>>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_user_id(
        &self,
        user_id: &str,
    ) -> Result<Option<TwoFactorCredential>, AppError> {
        Ok(self.credentials.read().await.get(user_id).cloned())
    }

    async fn upsert(
        &self,
        credential: &CredentialUpsert,
    ) -> Result<TwoFactorCredential, AppError> {
        let now = OffsetDateTime::now_utc();
        let mut credentials = self.credentials.write().await;

        let (created_at, last_verified_at) = credentials
            .get(&credential.user_id)
            .map(|existing| (existing.created_at, existing.last_verified_at))
            .unwrap_or((now, None));

        let stored = TwoFactorCredential {
            user_id: credential.user_id.clone(),
            secret: credential.secret.clone(),
            issuer: credential.issuer.clone(),
            label: credential.label.clone(),
            enabled: credential.enabled,
            last_verified_at,
            created_at,
            updated_at: now,
        };
        credentials.insert(stored.user_id.clone(), stored.clone());

        Ok(stored)
    }

    async fn set_enabled(
        &self,
        user_id: &str,
        enabled: bool,
        verified_at: Option<OffsetDateTime>,
    ) -> Result<bool, AppError> {
        let mut credentials = self.credentials.write().await;
        let Some(credential) = credentials.get_mut(user_id) else {
            return Ok(false);
        };

        credential.enabled = enabled;
        if verified_at.is_some() {
            credential.last_verified_at = verified_at;
        }
        credential.updated_at = OffsetDateTime::now_utc();

        Ok(true)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
