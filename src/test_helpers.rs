//! Fixtures shared by unit tests and the HTTP tests under `tests/`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{Router, middleware};
use sea_orm::DatabaseConnection;

use crate::{
    auth::TokenMinter,
    config::{AppConfig, AuthConfig, GeneralConfig},
    identity::{ExchangedTokens, IdentityError, IdentityProvider, Profile},
    middleware::{catch_panic_layer, json_error_middleware},
    routes::router,
    state::AppState,
};

pub const TEST_JWT_SECRET: &str = "test-secret";
pub const TEST_HOST: &str = "https://api.test";

/// Identity provider that answers every call with canned results.
#[derive(Debug, Clone)]
pub struct StaticIdentityProvider {
    exchange: Result<ExchangedTokens, IdentityError>,
    profile: Result<Profile, IdentityError>,
}

impl StaticIdentityProvider {
    pub fn new(profile: Profile) -> Self {
        Self {
            exchange: Ok(ExchangedTokens {
                access_token: "test-access-token".to_string(),
                id_token: None,
                expires_in: Some(3599),
            }),
            profile: Ok(profile),
        }
    }

    pub fn alice() -> Self {
        Self::new(Profile {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            photo_url: Some("https://photos.example/alice.png".to_string()),
        })
    }

    pub fn failing_exchange(err: IdentityError) -> Self {
        Self {
            exchange: Err(err),
            ..Self::alice()
        }
    }

    pub fn failing_profile(err: IdentityError) -> Self {
        Self {
            profile: Err(err),
            ..Self::alice()
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn exchange_code(
        &self,
        _code: &str,
        _redirect_uri: &str,
    ) -> Result<ExchangedTokens, IdentityError> {
        self.exchange.clone()
    }

    async fn fetch_profile(&self, _access_token: &str) -> Result<Profile, IdentityError> {
        self.profile.clone()
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        general: GeneralConfig {
            host: TEST_HOST.to_string(),
            port: 0,
            trust_proxy: true,
        },
        auth: Some(AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_string(),
            issuer: None,
            audience: None,
            cookie_secure: true,
        }),
        ..AppConfig::default()
    }
}

pub fn test_minter() -> TokenMinter {
    TokenMinter::new(TEST_JWT_SECRET.as_bytes(), TEST_HOST, TEST_HOST)
}

pub fn test_state(
    db: DatabaseConnection,
    identity: impl IdentityProvider + 'static,
) -> Arc<AppState> {
    AppState::new(test_config(), db, Arc::new(identity), test_minter())
}

/// Full router with the same middleware stack `main` installs.
pub fn test_router(db: DatabaseConnection, identity: impl IdentityProvider + 'static) -> Router {
    router(test_state(db, identity))
        .layer(middleware::from_fn(json_error_middleware))
        .layer(catch_panic_layer())
}

/// Debug rendering of every statement a mock connection saw, quotes unescaped.
pub fn statement_log(db: DatabaseConnection) -> String {
    format!("{:?}", db.into_transaction_log()).replace("\\\"", "\"")
}
