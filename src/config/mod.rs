pub mod configs;
pub mod defaults;
pub mod envconfig;
pub mod validate;

pub use configs::{
    AppConfig, AuthConfig, DatabaseConfig, GeneralConfig, GoogleConfig, LoggingConfig,
};
pub use envconfig::EnvConfig;
