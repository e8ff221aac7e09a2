use std::fmt;

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::totp::CredentialState;

/// ユーザーの二要素認証（TOTP）資格情報
///
/// `user_id` ごとに最大1件。シークレットは Base32 で保存される。
/// 平文シークレットはログに出力禁止（Debug でも伏せる）。
#[derive(Clone, FromRow, Serialize)]
pub struct TwoFactorCredential {
    pub user_id: String,
    #[serde(skip)]
    pub secret: String,
    pub issuer: String,
    pub label: String,
    pub enabled: bool,
    /// 最後に検証成功した時刻。一度も成功していなければ `None`
    pub last_verified_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TwoFactorCredential {
    pub fn state(&self) -> CredentialState {
        CredentialState::from_record(self.enabled, self.last_verified_at.is_some())
    }
}

impl fmt::Debug for TwoFactorCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwoFactorCredential")
            .field("user_id", &self.user_id)
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("label", &self.label)
            .field("enabled", &self.enabled)
            .field("last_verified_at", &self.last_verified_at)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// upsert 用の入力
///
/// `last_verified_at` は検証時にのみ更新されるため含まない。
#[derive(Clone)]
pub struct CredentialUpsert {
    pub user_id: String,
    pub secret: String,
    pub issuer: String,
    pub label: String,
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> TwoFactorCredential {
        let now = OffsetDateTime::now_utc();
        TwoFactorCredential {
            user_id: "alice".to_string(),
            secret: "JBSWY3DPEHPK3PXP".to_string(),
            issuer: "Flames 2FA".to_string(),
            label: "alice".to_string(),
            enabled: false,
            last_verified_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_secret_is_never_serialized_or_debugged() {
        let credential = credential();

        let json = serde_json::to_value(&credential).unwrap();
        assert!(json.get("secret").is_none());
        assert_eq!(json["user_id"], "alice");

        let debug = format!("{credential:?}");
        assert!(!debug.contains("JBSWY3DPEHPK3PXP"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_state() {
        let mut credential = credential();
        assert_eq!(credential.state(), CredentialState::PendingConfirmation);

        credential.enabled = true;
        credential.last_verified_at = Some(OffsetDateTime::now_utc());
        assert_eq!(credential.state(), CredentialState::Active);

        credential.enabled = false;
        assert_eq!(credential.state(), CredentialState::Disabled);
    }
}
