use anyhow::{Result, bail};

use super::AppConfig;

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.general.host.trim().is_empty() {
        errors.push("general.host must not be empty".to_string());
    }

    if let Some(database) = cfg.database.as_ref() {
        if database.url.trim().is_empty() {
            errors.push("database.url must not be empty".to_string());
        }

        if database.min_idle > database.max_connections {
            errors.push(format!(
                "database.min_idle ({}) must be <= database.max_connections ({})",
                database.min_idle, database.max_connections
            ));
        }
    }

    if let Some(auth) = cfg.auth.as_ref() {
        if auth.jwt_secret.trim().is_empty() {
            errors.push("auth.jwt_secret must not be empty".to_string());
        }

        if matches!(auth.issuer.as_deref(), Some(issuer) if issuer.trim().is_empty()) {
            errors.push("auth.issuer must not be empty when set".to_string());
        }

        if matches!(auth.audience.as_deref(), Some(audience) if audience.trim().is_empty()) {
            errors.push("auth.audience must not be empty when set".to_string());
        }
    }

    if let Some(google) = cfg.google.as_ref() {
        if google.client_id.trim().is_empty() {
            errors.push("google.client_id must not be empty".to_string());
        }

        if google.client_secret.trim().is_empty() {
            errors.push("google.client_secret must not be empty".to_string());
        }

        for (name, url) in [
            ("google.token_url", &google.token_url),
            ("google.profile_url", &google.profile_url),
        ] {
            if reqwest::Url::parse(url).is_err() {
                errors.push(format!("{name} must be an absolute URL (got {url:?})"));
            }
        }

        if google.timeout_secs == 0 {
            errors.push("google.timeout_secs must be > 0".to_string());
        }
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}

#[cfg(test)]
mod tests {
    use crate::config::{AppConfig, AuthConfig, DatabaseConfig, GoogleConfig};

    use super::validate;

    fn google(token_url: &str) -> GoogleConfig {
        GoogleConfig {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            token_url: token_url.to_string(),
            profile_url: "https://people.googleapis.com/v1/people/me".to_string(),
            timeout_secs: 10,
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_problem_into_one_error() {
        let cfg = AppConfig {
            database: Some(DatabaseConfig {
                url: " ".to_string(),
                max_connections: 1,
                min_idle: 4,
            }),
            auth: Some(AuthConfig {
                jwt_secret: String::new(),
                issuer: Some(String::new()),
                audience: None,
                cookie_secure: true,
            }),
            ..AppConfig::default()
        };

        let message = validate(&cfg).expect_err("config should be rejected").to_string();

        assert!(message.contains("database.url must not be empty"));
        assert!(message.contains("database.min_idle (4) must be <= database.max_connections (1)"));
        assert!(message.contains("auth.jwt_secret must not be empty"));
        assert!(message.contains("auth.issuer must not be empty when set"));
    }

    #[test]
    fn rejects_relative_google_endpoints() {
        let cfg = AppConfig {
            google: Some(google("/token")),
            ..AppConfig::default()
        };

        let message = validate(&cfg).expect_err("config should be rejected").to_string();
        assert!(message.contains("google.token_url must be an absolute URL"));
    }

    #[test]
    fn accepts_complete_google_section() {
        let cfg = AppConfig {
            google: Some(google("https://oauth2.googleapis.com/token")),
            ..AppConfig::default()
        };

        assert!(validate(&cfg).is_ok());
    }
}
