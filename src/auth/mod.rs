mod error;
pub mod tokens;
mod types;

pub use error::AuthError;
pub use tokens::{JwtKeys, TokenMinter};
pub use types::{IdentityClaims, IssuedTokens, UserClaims};
