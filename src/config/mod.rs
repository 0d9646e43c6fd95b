use dotenvy::dotenv;
use serde::Deserialize;

use crate::error::Result;

fn default_max_connections() -> u32 {
    5
}

fn default_notification_queue_depth() -> usize {
    256
}

/// Configuration for the service
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Connection pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Capacity of the notification dispatch queue; drafts beyond it are
    /// dropped rather than blocking the caller
    #[serde(default = "default_notification_queue_depth")]
    pub notification_queue_depth: usize,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize environment variables into Config struct
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenv().ok();

        // Parse environment variables into Config struct
        let config = envy::from_env::<Config>()?;

        Ok(config)
    }

    /// Get a direct reference to the database URL
    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

/// Initialize environment variables and load configuration
pub fn init() -> Result<Config> {
    Config::load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_knobs_fall_back_to_defaults() {
        let config = envy::from_iter::<_, Config>(vec![(
            "DATABASE_URL".to_owned(),
            "postgres://localhost/escrow".to_owned(),
        )])
        .unwrap();

        assert_eq!(config.database_url(), "postgres://localhost/escrow");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.notification_queue_depth, 256);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert!(envy::from_iter::<_, Config>(Vec::new()).is_err());
    }
}
