use axum::http::StatusCode;

use crate::{db::dao::DaoLayerError, error::AppError, identity::IdentityError};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("Required parameter \"refresh_token\" is invalid")]
    InvalidRefreshToken,
    #[error("Required parameter \"refresh_token\" is expired")]
    RefreshTokenExpired,
    #[error("User is not found")]
    UserNotFound,
    #[error("Authentication token is missing")]
    MissingToken,
    #[error("Authentication token is invalid")]
    InvalidToken,
    #[error("Authentication is expired")]
    TokenExpired,
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("storage failure: {0}")]
    Storage(#[from] DaoLayerError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Identity(inner) => {
                let mut app = AppError::new(inner.status(), inner.to_string());
                if let Some(name) = inner.name() {
                    app = app.named(name);
                }
                if matches!(inner, IdentityError::UpstreamProfile { .. }) {
                    app = app.at("fetch_profile");
                }
                app
            }
            AuthError::InvalidRefreshToken
            | AuthError::RefreshTokenExpired
            | AuthError::UserNotFound => AppError::bad_request(err.to_string()),
            AuthError::MissingToken | AuthError::InvalidToken => {
                AppError::new(StatusCode::UNAUTHORIZED, err.to_string()).named("INVALID_TOKEN")
            }
            AuthError::TokenExpired => {
                AppError::new(StatusCode::UNAUTHORIZED, err.to_string()).named("TOKEN_EXPIRED")
            }
            AuthError::Signing(_) | AuthError::Storage(_) => {
                tracing::error!(error = %err, "session operation failed");
                AppError::internal()
            }
        }
    }
}
