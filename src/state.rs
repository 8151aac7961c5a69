use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{auth::TokenMinter, config::AppConfig, identity::IdentityProvider};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DatabaseConnection,
    pub identity: Arc<dyn IdentityProvider>,
    pub tokens: TokenMinter,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DatabaseConnection,
        identity: Arc<dyn IdentityProvider>,
        tokens: TokenMinter,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            db,
            identity,
            tokens,
        })
    }
}
