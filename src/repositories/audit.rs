use sqlx::PgPool;
use uuid::Uuid;

use crate::models::AuditEvent;

/// 監査ログの送信先
///
/// 送信は投げっぱなし（fire-and-forget）。
/// 配送は最大1回で保証はなく、失敗しても呼び出し元には伝わらない。
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// PostgreSQL の `two_factor_audit` テーブルへ非同期で書き込む
///
/// tokio ランタイム上から呼び出すこと。
#[derive(Clone)]
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AuditSink for PgAuditSink {
    fn record(&self, event: AuditEvent) {
        let pool = self.pool.clone();

        tokio::spawn(async move {
            let result = sqlx::query(
                r#"
                INSERT INTO two_factor_audit (id, user_id, action, metadata)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&event.user_id)
            .bind(event.action.as_str())
            .bind(&event.metadata)
            .execute(&pool)
            .await;

            if let Err(e) = result {
                tracing::warn!(
                    error = ?e,
                    user_id = %event.user_id,
                    action = event.action.as_str(),
                    "監査ログの書き込みに失敗（破棄）"
                );
            }
        });
    }
}

/// 構造化ログとして出力する（memory バックエンド用）
#[derive(Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            target: "otpgate::audit",
            user_id = %event.user_id,
            action = event.action.as_str(),
            metadata = %event.metadata,
            "監査イベント"
        );
    }
}
