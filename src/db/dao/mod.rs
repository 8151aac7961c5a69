pub mod base;
pub mod base_traits;
mod context;
pub mod credential_dao;
pub mod error;
pub mod user_dao;

pub use base::DaoBase;
pub use base_traits::{HasCreatedAtColumn, HasIdActiveModel, TimestampedActiveModel};
pub use context::DaoContext;
pub use credential_dao::{CredentialDao, NewCredential, Revocation};
pub use error::{DaoLayerError, DaoResult};
pub use user_dao::UserDao;
