use serde::Serialize;

/// 二要素認証の資格情報の状態
///
/// ```text
/// Unprovisioned -> PendingConfirmation -(verify)-> Active -(disable)-> Disabled
///                                                     ^                    |
///                                                     +------(verify)------+
/// ```
///
/// `enabled = true` になるのは検証成功時のみ。
/// 無効化してもシークレットは残るため、再検証だけで再有効化できる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialState {
    Unprovisioned,
    PendingConfirmation,
    Active,
    Disabled,
}

impl CredentialState {
    /// 保存済みレコードのフラグから状態を導出
    ///
    /// 無効化済みと確認待ちは、過去に検証成功したかどうかで区別する。
    pub fn from_record(enabled: bool, ever_verified: bool) -> Self {
        match (enabled, ever_verified) {
            (true, _) => Self::Active,
            (false, true) => Self::Disabled,
            (false, false) => Self::PendingConfirmation,
        }
    }

    /// 検証成功による遷移
    pub fn on_verified(self) -> Self {
        match self {
            Self::Unprovisioned => Self::Unprovisioned,
            Self::PendingConfirmation | Self::Active | Self::Disabled => Self::Active,
        }
    }

    /// 明示的な無効化による遷移
    pub fn on_disabled(self) -> Self {
        match self {
            Self::Active | Self::Disabled => Self::Disabled,
            other => other,
        }
    }

    pub fn is_enabled(self) -> bool {
        self == Self::Active
    }

    pub fn is_configured(self) -> bool {
        self != Self::Unprovisioned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_record() {
        assert_eq!(
            CredentialState::from_record(false, false),
            CredentialState::PendingConfirmation
        );
        assert_eq!(CredentialState::from_record(true, true), CredentialState::Active);
        assert_eq!(
            CredentialState::from_record(false, true),
            CredentialState::Disabled
        );
    }

    #[test]
    fn test_lifecycle() {
        let pending = CredentialState::PendingConfirmation;
        assert!(!pending.is_enabled());

        let active = pending.on_verified();
        assert_eq!(active, CredentialState::Active);
        assert!(active.is_enabled());

        let disabled = active.on_disabled();
        assert_eq!(disabled, CredentialState::Disabled);
        assert!(!disabled.is_enabled());
        assert!(disabled.is_configured());

        assert_eq!(disabled.on_verified(), CredentialState::Active);
    }

    #[test]
    fn test_disable_does_not_activate_or_skip_confirmation() {
        assert_eq!(
            CredentialState::PendingConfirmation.on_disabled(),
            CredentialState::PendingConfirmation
        );
        assert_eq!(
            CredentialState::Unprovisioned.on_disabled(),
            CredentialState::Unprovisioned
        );
        assert_eq!(
            CredentialState::Unprovisioned.on_verified(),
            CredentialState::Unprovisioned
        );
        assert!(!CredentialState::Unprovisioned.is_configured());
    }
}
