pub mod audit;
pub mod memory;
pub mod two_factor;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::error::AppError;
use crate::models::{CredentialUpsert, TwoFactorCredential};

pub use audit::{AuditSink, PgAuditSink, TracingAuditSink};
pub use memory::InMemoryCredentialStore;
pub use two_factor::PgCredentialStore;

/// 二要素認証の資格情報ストア（`user_id` がキー）
///
/// 同一 `user_id` への読み込み→書き込みの直列化は呼び出し側の責務。
/// 接続できない場合は [`AppError::StoreUnavailable`] を返し、
/// 「未設定」として扱ってはならない。
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// ユーザーIDで資格情報を検索
    async fn find_by_user_id(
        &self,
        user_id: &str,
    ) -> Result<Option<TwoFactorCredential>, AppError>;

    /// 資格情報を挿入、または置き換え
    ///
    /// 既存レコードの `last_verified_at` と `created_at` は保持する。
    async fn upsert(&self, credential: &CredentialUpsert)
    -> Result<TwoFactorCredential, AppError>;

    /// 有効フラグを更新
    ///
    /// `verified_at` が `Some` の場合は `last_verified_at` も更新する。
    ///
    /// # Returns
    /// 該当レコードが存在したかどうか
    async fn set_enabled(
        &self,
        user_id: &str,
        enabled: bool,
        verified_at: Option<OffsetDateTime>,
    ) -> Result<bool, AppError>;

    /// 疎通確認
    async fn ping(&self) -> Result<(), AppError>;
}
