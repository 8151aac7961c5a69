#[allow(unused_imports)]
pub mod prelude {
    pub use super::credential::Entity as Credential;
    pub use super::user::Entity as User;
}

pub mod credential;
pub mod user;
