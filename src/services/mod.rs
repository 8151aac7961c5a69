pub mod context;
pub mod session_service;
pub mod user_service;

pub use context::ServiceContext;
pub use session_service::SessionService;
pub use user_service::UserService;
