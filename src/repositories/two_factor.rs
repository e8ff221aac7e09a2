use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::error::AppError;
use crate::models::{CredentialUpsert, TwoFactorCredential};
use crate::repositories::CredentialStore;

/// PostgreSQL の `two_factor_credentials` テーブル
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_user_id(
        &self,
        user_id: &str,
    ) -> Result<Option<TwoFactorCredential>, AppError> {
        let credential = sqlx::query_as::<_, TwoFactorCredential>(
            r#"
            SELECT user_id, secret, issuer, label, enabled, last_verified_at, created_at, updated_at
            FROM two_factor_credentials
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credential)
    }

    async fn upsert(
        &self,
        credential: &CredentialUpsert,
    ) -> Result<TwoFactorCredential, AppError> {
        let credential = sqlx::query_as::<_, TwoFactorCredential>(
            r#"
            INSERT INTO two_factor_credentials (user_id, secret, issuer, label, enabled)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE
            SET secret = EXCLUDED.secret,
                issuer = EXCLUDED.issuer,
                label = EXCLUDED.label,
                enabled = EXCLUDED.enabled,
                updated_at = NOW()
            RETURNING user_id, secret, issuer, label, enabled, last_verified_at, created_at, updated_at
            "#,
        )
        .bind(&credential.user_id)
        .bind(&credential.secret)
        .bind(&credential.issuer)
        .bind(&credential.label)
        .bind(credential.enabled)
        .fetch_one(&self.pool)
        .await?;

        Ok(credential)
    }

    async fn set_enabled(
        &self,
        user_id: &str,
        enabled: bool,
        verified_at: Option<OffsetDateTime>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE two_factor_credentials
            SET enabled = $2,
                last_verified_at = COALESCE($3, last_verified_at),
                updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(enabled)
        .bind(verified_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // `cargo test -- --ignored` と DATABASE_URL で実行。テストごとに新しいDBへマイグレーションを適用する

    fn upsert_request(user_id: &str, secret: &str, enabled: bool) -> CredentialUpsert {
        CredentialUpsert {
            user_id: user_id.to_string(),
            secret: secret.to_string(),
            issuer: "Acme".to_string(),
            label: user_id.to_string(),
            enabled,
        }
    }

    fn verified_at() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn test_upsert_inserts_then_replaces(pool: PgPool) {
        let store = PgCredentialStore::new(pool);

        let created = store
            .upsert(&upsert_request("alice", "JBSWY3DPEHPK3PXP", false))
            .await
            .unwrap();
        assert_eq!(created.secret, "JBSWY3DPEHPK3PXP");
        assert!(!created.enabled);
        assert!(created.last_verified_at.is_none());

        let mut replacement = upsert_request("alice", "GEZDGNBVGY3TQOJQ", true);
        replacement.label = "Alice: work".to_string();
        let replaced = store.upsert(&replacement).await.unwrap();

        assert_eq!(replaced.secret, "GEZDGNBVGY3TQOJQ");
        assert_eq!(replaced.label, "Alice: work");
        assert!(replaced.enabled);
        assert_eq!(replaced.created_at, created.created_at);

        let found = store.find_by_user_id("alice").await.unwrap().unwrap();
        assert_eq!(found.secret, "GEZDGNBVGY3TQOJQ");
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn test_set_enabled_keeps_last_verified_at_when_none(pool: PgPool) {
        let store = PgCredentialStore::new(pool);
        store
            .upsert(&upsert_request("alice", "JBSWY3DPEHPK3PXP", false))
            .await
            .unwrap();

        assert!(store.set_enabled("alice", true, Some(verified_at())).await.unwrap());
        let active = store.find_by_user_id("alice").await.unwrap().unwrap();
        assert!(active.enabled);
        assert_eq!(active.last_verified_at, Some(verified_at()));

        // 無効化は検証時刻を渡さない
        assert!(store.set_enabled("alice", false, None).await.unwrap());
        let disabled = store.find_by_user_id("alice").await.unwrap().unwrap();
        assert!(!disabled.enabled);
        assert_eq!(disabled.last_verified_at, Some(verified_at()));
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn test_upsert_keeps_last_verified_at(pool: PgPool) {
        let store = PgCredentialStore::new(pool);
        store
            .upsert(&upsert_request("alice", "JBSWY3DPEHPK3PXP", false))
            .await
            .unwrap();
        store
            .set_enabled("alice", false, Some(verified_at()))
            .await
            .unwrap();

        let refreshed = store
            .upsert(&upsert_request("alice", "JBSWY3DPEHPK3PXP", false))
            .await
            .unwrap();

        assert_eq!(refreshed.last_verified_at, Some(verified_at()));
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn test_missing_user(pool: PgPool) {
        let store = PgCredentialStore::new(pool);

        assert!(store.find_by_user_id("ghost").await.unwrap().is_none());
        assert!(!store.set_enabled("ghost", true, Some(verified_at())).await.unwrap());
        store.ping().await.unwrap();
    }
}
