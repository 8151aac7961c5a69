use sea_orm::DatabaseConnection;

use crate::{
    auth::TokenMinter,
    db::dao::DaoContext,
    identity::IdentityProvider,
    services::{session_service::SessionService, user_service::UserService},
    state::AppState,
};

/// Builds services on top of one connection. Cheap to create per request.
#[derive(Clone)]
pub struct ServiceContext {
    daos: DaoContext,
}

impl ServiceContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self {
            daos: DaoContext::new(db),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(&state.db)
    }

    pub fn user(&self) -> UserService {
        UserService::new(self.daos.user())
    }

    pub fn session<'a>(
        &self,
        identity: &'a dyn IdentityProvider,
        tokens: &'a TokenMinter,
    ) -> SessionService<'a> {
        SessionService::new(self.user(), self.daos.credential(), identity, tokens)
    }
}
