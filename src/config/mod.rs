//! Typed application configuration.
//!
//! Settings come from environment variables (with an optional `.env` file
//! for development), read through the `config` crate. Variables carry the
//! `DEALDESK` prefix and use double underscores between nesting levels, so
//! `DEALDESK__SERVER__PORT=3000` sets `server.port`. Every section has
//! working defaults; the binary runs keyless with in-memory adapters when
//! the optional services are left unconfigured.
//!
//! ```no_run
//! use dealdesk::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Listening on {}", config.server.bind_addr());
//! ```

mod catalog;
mod error;
mod inference;
mod lead_store;
mod server;
mod session;

pub use catalog::CatalogConfig;
pub use error::{ConfigError, ValidationError};
pub use inference::InferenceConfig;
pub use lead_store::LeadStoreConfig;
pub use server::ServerConfig;
pub use session::SessionConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration (bind address, logging, CORS)
    #[serde(default)]
    pub server: ServerConfig,

    /// Listing catalog configuration
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Inference provider configuration (Gemini)
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Session lifecycle configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Lead store configuration (PostgreSQL)
    #[serde(default)]
    pub lead_store: LeadStoreConfig,
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// Reads a `.env` file when one exists, then deserializes all
    /// `DEALDESK__*` variables into the typed sections.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value cannot be parsed into the
    /// expected type.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("DEALDESK")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Run semantic validation across every section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.catalog.validate()?;
        self.inference.validate()?;
        self.session.validate()?;
        self.lead_store.validate()?;
        Ok(())
    }
}
