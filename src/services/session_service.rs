//! Login, refresh-token rotation and logout.
//!
//! A credential row is `ACTIVE` until its revocation columns are written,
//! after which it is terminal. Rotation revokes the presented row and inserts
//! its successor in one transaction, so a rotated token can never be
//! exchanged twice.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{AuthError, IssuedTokens, TokenMinter, UserClaims},
    db::dao::{CredentialDao, DaoLayerError, NewCredential, Revocation},
    db::entities::{credential, user},
    identity::IdentityProvider,
    services::user_service::UserService,
};

pub struct SessionService<'a> {
    users: UserService,
    credentials: CredentialDao,
    identity: &'a dyn IdentityProvider,
    tokens: &'a TokenMinter,
}

impl<'a> SessionService<'a> {
    pub fn new(
        users: UserService,
        credentials: CredentialDao,
        identity: &'a dyn IdentityProvider,
        tokens: &'a TokenMinter,
    ) -> Self {
        Self {
            users,
            credentials,
            identity,
            tokens,
        }
    }

    /// Exchanges `code`, resolves the local user and stores one new credential.
    pub async fn login(
        &self,
        code: &str,
        redirect_uri: &str,
        client_ip: &str,
    ) -> Result<IssuedTokens, AuthError> {
        let exchanged = self.identity.exchange_code(code, redirect_uri).await?;
        let profile = self.identity.fetch_profile(&exchanged.access_token).await?;
        let user = self.users.find_or_create(&profile).await?;

        let issued = self.tokens.mint(&claims_for(&user))?;
        self.credentials
            .insert(new_credential(&issued, user.id, client_ip))
            .await?;

        info!(user_id = %user.id, client_ip, "user logged in");
        Ok(issued)
    }

    pub async fn refresh(
        &self,
        refresh_token: &str,
        client_ip: &str,
    ) -> Result<IssuedTokens, AuthError> {
        let now = Utc::now().fixed_offset();
        let record = self
            .credentials
            .find_by_token(refresh_token)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        if !record.is_active_at(now) {
            if record.is_revoked() {
                warn!(
                    user_id = %record.user_id,
                    client_ip,
                    replaced_by_present = record.replaced_by.is_some(),
                    "revoked refresh token presented"
                );
            } else {
                warn!(user_id = %record.user_id, client_ip, "expired refresh token presented");
            }
            return Err(AuthError::RefreshTokenExpired);
        }

        let user = self
            .users
            .find_by_id(record.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let issued = self.tokens.mint(&claims_for(&user))?;
        let revocation = Revocation {
            at: now,
            by_ip: client_ip.to_string(),
        };
        match self
            .credentials
            .rotate(
                refresh_token,
                &revocation,
                new_credential(&issued, user.id, client_ip),
            )
            .await
        {
            Ok(_) => {}
            Err(DaoLayerError::Conflict { .. }) => {
                warn!(user_id = %user.id, client_ip, "refresh token rotated concurrently");
                return Err(AuthError::RefreshTokenExpired);
            }
            Err(err) => return Err(err.into()),
        }

        info!(user_id = %user.id, client_ip, "refresh token rotated");
        Ok(issued)
    }

    /// Revokes every active credential `user_id` holds from `client_ip`.
    pub async fn revoke_all(
        &self,
        client_ip: &str,
        user_id: Uuid,
    ) -> Result<Vec<credential::Model>, AuthError> {
        let revocation = Revocation {
            at: Utc::now().fixed_offset(),
            by_ip: client_ip.to_string(),
        };
        let revoked = self
            .credentials
            .revoke_active_for(user_id, client_ip, &revocation)
            .await?;

        info!(%user_id, client_ip, revoked = revoked.len(), "credentials revoked");
        Ok(revoked)
    }
}

fn claims_for(user: &user::Model) -> UserClaims {
    UserClaims {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
    }
}

fn new_credential(issued: &IssuedTokens, user_id: Uuid, client_ip: &str) -> NewCredential {
    NewCredential {
        refresh_token: issued.refresh_token.clone(),
        user_id,
        created_by_ip: client_ip.to_string(),
        expiry_date: issued.refresh_token_expires_at.fixed_offset(),
    }
}
