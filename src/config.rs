use secrecy::SecretBox;
use serde::Deserialize;

/// 資格情報ストアのバックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    /// プロセス内メモリ（ローカル実行・テスト用、再起動で消える）
    Memory,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    /// postgres バックエンドでは必須
    #[serde(default)]
    pub database_url: Option<SecretBox<String>>,
    #[serde(default = "default_store_backend")]
    pub store_backend: StoreBackend,
    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    // 2FA (TOTP) 設定
    /// リクエストで issuer が省略された場合の発行者名（認証アプリに表示される）
    #[serde(default = "default_totp_issuer")]
    pub totp_default_issuer: String,
    #[serde(default = "default_totp_step_secs")]
    pub totp_step_secs: u64,
    #[serde(default = "default_totp_digits")]
    pub totp_digits: u32,
    /// 前後に許容する時間ステップ数
    #[serde(default = "default_totp_window")]
    pub totp_window: u64,

    /// CORS 許可オリジン（カンマ区切り、空なら全許可）
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_TOTP_ISSUER: &str = "Flames 2FA";
const DEFAULT_TOTP_STEP_SECS: u64 = 30;
const DEFAULT_TOTP_DIGITS: u32 = 6;
const DEFAULT_TOTP_WINDOW: u64 = 1;

fn default_store_backend() -> StoreBackend {
    StoreBackend::Postgres
}

fn default_database_max_connections() -> u32 {
    DEFAULT_DATABASE_MAX_CONNECTIONS
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_totp_issuer() -> String {
    DEFAULT_TOTP_ISSUER.to_string()
}

fn default_totp_step_secs() -> u64 {
    DEFAULT_TOTP_STEP_SECS
}

fn default_totp_digits() -> u32 {
    DEFAULT_TOTP_DIGITS
}

fn default_totp_window() -> u64 {
    DEFAULT_TOTP_WINDOW
}

impl Config {
    pub fn load() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// 環境変数以外の入力（テスト等）から読み込む
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(vars(&[])).unwrap();
        assert!(config.database_url.is_none());
        assert_eq!(config.store_backend, StoreBackend::Postgres);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.totp_default_issuer, "Flames 2FA");
        assert_eq!(config.totp_step_secs, 30);
        assert_eq!(config.totp_digits, 6);
        assert_eq!(config.totp_window, 1);
        assert!(config.cors_allowed_origins.is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/otp"),
            ("STORE_BACKEND", "memory"),
            ("PORT", "9000"),
            ("TOTP_DEFAULT_ISSUER", "Acme"),
            ("TOTP_WINDOW", "2"),
            (
                "CORS_ALLOWED_ORIGINS",
                "https://a.example,https://b.example",
            ),
        ]))
        .unwrap();

        assert_eq!(
            config.database_url.unwrap().expose_secret(),
            "postgres://localhost/otp"
        );
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.port, 9000);
        assert_eq!(config.totp_default_issuer, "Acme");
        assert_eq!(config.totp_window, 2);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_invalid_port() {
        assert!(Config::from_vars(vars(&[("PORT", "not-a-port")])).is_err());
    }
}
