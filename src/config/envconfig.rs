use std::path::Path;

use ::config as config_rs;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Typed configuration read from `APP_`-prefixed environment variables.
///
/// Nested sections use `__`, so `APP_GOOGLE__CLIENT_ID` lands in
/// `google.client_id`.
pub trait EnvConfig: Sized + DeserializeOwned {
    const PREFIX: &'static str = "APP";
    const SEPARATOR: &'static str = "__";

    fn load_dotenv() {
        let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        let _ = dotenvy::from_filename(manifest_dir.join(".env")).or_else(|_| dotenvy::dotenv());
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn from_env() -> Result<Self> {
        Self::load_dotenv();
        Self::from_sources(&[])
    }

    /// Environment first, then `overrides` (dotted `section.key` paths) on top.
    fn from_sources(overrides: &[(&str, &str)]) -> Result<Self> {
        let mut builder = config_rs::Config::builder().add_source(
            config_rs::Environment::with_prefix(Self::PREFIX)
                .prefix_separator("_")
                .separator(Self::SEPARATOR)
                .try_parsing(true),
        );

        for (key, value) in overrides {
            builder = builder
                .set_override(*key, *value)
                .with_context(|| format!("invalid config override for {key}"))?;
        }

        let cfg = builder
            .build()
            .context("failed to read environment variables for config")?
            .try_deserialize::<Self>()
            .context("failed to deserialize environment into config")?;

        cfg.validate()?;
        Ok(cfg)
    }
}
