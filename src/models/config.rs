//! Configuration model loaded from external sources.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
/// Settings shared by the maintenance binaries.
pub struct ServerConfig {
    pub database_url: String,
    /// Page size used when a caller does not specify one.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    crate::pagination::DEFAULT_ITEMS_PER_PAGE
}

impl ServerConfig {
    /// Loads configuration from an optional `config.yaml` overlaid with
    /// `TRIBUTA_`-prefixed environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("TRIBUTA"))
            .build()?
            .try_deserialize()
    }
}
