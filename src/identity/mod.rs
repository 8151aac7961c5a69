//! Federated identity: authorization-code exchange and profile lookup.
//!
//! Provider failures are decoded into [`IdentityError`] here so the session
//! layer never sees raw upstream payloads.

mod google;

use async_trait::async_trait;
use axum::http::StatusCode;

pub use google::GoogleIdentityProvider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangedTokens {
    pub access_token: String,
    pub id_token: Option<String>,
    /// Seconds until `access_token` expires, when the provider says.
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("Required parameter 'code' is expired or invalid")]
    InvalidGrant,
    #[error("Required parameter 'redirectUri' is invalid")]
    InvalidRedirect,
    #[error("Error while exchanging code for token")]
    UpstreamExchange,
    #[error("{message}")]
    UpstreamProfile { status: StatusCode, message: String },
}

impl IdentityError {
    pub fn status(&self) -> StatusCode {
        match self {
            IdentityError::InvalidGrant | IdentityError::InvalidRedirect => {
                StatusCode::BAD_REQUEST
            }
            IdentityError::UpstreamExchange => StatusCode::INTERNAL_SERVER_ERROR,
            IdentityError::UpstreamProfile { status, .. } => *status,
        }
    }

    /// Error name shown to clients; `None` means the status reason phrase.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            IdentityError::InvalidGrant => Some("Invalid Grant"),
            IdentityError::InvalidRedirect => Some("Invalid Request"),
            IdentityError::UpstreamExchange => Some("Exchange Token Error"),
            IdentityError::UpstreamProfile { .. } => None,
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<ExchangedTokens, IdentityError>;

    async fn fetch_profile(&self, access_token: &str) -> Result<Profile, IdentityError>;
}
