use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{defaults, envconfig::EnvConfig, validate};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub logging: LoggingConfig,
    pub database: Option<DatabaseConfig>,
    pub auth: Option<AuthConfig>,
    pub google: Option<GoogleConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        <Self as EnvConfig>::from_env()
    }

    pub fn database(&self) -> Result<&DatabaseConfig> {
        self.database
            .as_ref()
            .context("database config is required (APP_DATABASE__URL)")
    }

    pub fn auth(&self) -> Result<&AuthConfig> {
        self.auth
            .as_ref()
            .context("auth config is required (APP_AUTH__JWT_SECRET)")
    }

    pub fn google(&self) -> Result<&GoogleConfig> {
        self.google
            .as_ref()
            .context("google config is required (APP_GOOGLE__CLIENT_ID, APP_GOOGLE__CLIENT_SECRET)")
    }
}

impl EnvConfig for AppConfig {
    fn validate(&self) -> Result<()> {
        validate::validate(self)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    pub host: String,
    pub port: u16,
    /// Take the client address from `X-Forwarded-For` when present.
    pub trust_proxy: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: defaults::DEFAULT_HOST.to_string(),
            port: defaults::DEFAULT_PORT as u16,
            trust_proxy: defaults::DEFAULT_TRUST_PROXY,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub rust_log: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rust_log: defaults::DEFAULT_RUST_LOG.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_db_min_idle")]
    pub min_idle: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// `iss` claim of identity tokens; falls back to the public host.
    #[serde(default)]
    pub issuer: Option<String>,
    /// `aud` claim of identity tokens; falls back to the public host.
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default = "default_cookie_secure")]
    pub cookie_secure: bool,
}

impl AuthConfig {
    pub fn issuer_or<'a>(&'a self, host: &'a str) -> &'a str {
        self.issuer.as_deref().unwrap_or(host)
    }

    pub fn audience_or<'a>(&'a self, host: &'a str) -> &'a str {
        self.audience.as_deref().unwrap_or(host)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_google_token_url")]
    pub token_url: String,
    #[serde(default = "default_google_profile_url")]
    pub profile_url: String,
    #[serde(default = "default_google_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_db_max_connections() -> u32 {
    defaults::DEFAULT_DB_MAX_CONNECTIONS as u32
}

fn default_db_min_idle() -> u32 {
    defaults::DEFAULT_DB_MIN_IDLE as u32
}

fn default_cookie_secure() -> bool {
    defaults::DEFAULT_COOKIE_SECURE
}

fn default_google_token_url() -> String {
    defaults::DEFAULT_GOOGLE_TOKEN_URL.to_string()
}

fn default_google_profile_url() -> String {
    defaults::DEFAULT_GOOGLE_PROFILE_URL.to_string()
}

fn default_google_timeout_secs() -> u64 {
    defaults::DEFAULT_GOOGLE_TIMEOUT_SECS as u64
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, AuthConfig};
    use crate::config::EnvConfig;

    #[test]
    fn overrides_fill_nested_sections() {
        let cfg = AppConfig::from_sources(&[
            ("general.port", "8080"),
            ("auth.jwt_secret", "override-secret"),
            ("auth.cookie_secure", "false"),
        ])
        .expect("config should load");

        assert_eq!(cfg.general.port, 8080);
        let auth = cfg.auth().expect("auth section should be present");
        assert_eq!(auth.jwt_secret, "override-secret");
        assert!(!auth.cookie_secure);
    }

    #[test]
    fn issuer_and_audience_fall_back_to_host() {
        let auth = AuthConfig {
            jwt_secret: "secret".to_string(),
            issuer: None,
            audience: Some("https://app.example".to_string()),
            cookie_secure: true,
        };

        assert_eq!(auth.issuer_or("https://api.example"), "https://api.example");
        assert_eq!(auth.audience_or("https://api.example"), "https://app.example");
    }

    #[test]
    fn missing_sections_are_reported_by_accessor() {
        let cfg = AppConfig::default();
        let err = cfg.google().expect_err("google section should be missing");
        assert!(err.to_string().contains("APP_GOOGLE__CLIENT_ID"));
    }
}
