use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who a session belongs to. Embedded in, and recovered from, identity tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserClaims {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Registered plus private claims of an identity token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64, // unix seconds
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub id_token: String,
    pub id_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
}
