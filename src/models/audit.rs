use serde_json::{Value, json};

/// 監査ログのアクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    CreateSecret,
    VerifySuccess,
    VerifyFailure,
    Disable,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateSecret => "create_secret",
            Self::VerifySuccess => "verify_success",
            Self::VerifyFailure => "verify_failure",
            Self::Disable => "disable",
        }
    }
}

/// 監査イベント
///
/// メタデータにシークレット全体を含めてはならない（末尾4文字のみ）。
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub user_id: String,
    pub action: AuditAction,
    pub metadata: Value,
}

impl AuditEvent {
    pub fn new(user_id: &str, action: AuditAction, metadata: Value) -> Self {
        Self {
            user_id: user_id.to_string(),
            action,
            metadata,
        }
    }

    /// シークレット新規作成
    pub fn secret_created(user_id: &str, issuer: &str, label: &str, secret: &str) -> Self {
        let tail_start = secret.len().saturating_sub(4);
        let secret_tail = secret.get(tail_start..).unwrap_or_default();

        Self::new(
            user_id,
            AuditAction::CreateSecret,
            json!({
                "issuer": issuer,
                "label": label,
                "secret_tail": secret_tail,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_created_keeps_only_tail() {
        let event =
            AuditEvent::secret_created("alice", "Flames 2FA", "alice", "JBSWY3DPEHPK3PXP");
        assert_eq!(event.action.as_str(), "create_secret");
        assert_eq!(event.metadata["secret_tail"], "3PXP");
        assert!(!event.metadata.to_string().contains("JBSWY3DP"));
    }

    #[test]
    fn test_secret_created_short_secret() {
        let event = AuditEvent::secret_created("bob", "x", "y", "AB");
        assert_eq!(event.metadata["secret_tail"], "AB");
    }
}
