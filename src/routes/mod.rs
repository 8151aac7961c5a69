pub mod auth;
mod entry;
pub mod extract;

pub use entry::{API_PREFIX, router};
pub use extract::{AuthUser, ClientIp, RequiredFields, ValidatedJson};
