//! Configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the backend can start with zero
//! configuration for local development.

use std::path::PathBuf;

use chrono::Duration;

/// Backend configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Filesystem path of the snapshot database.
    /// Env: `SNAPSHOT_PATH`
    /// Default: `None` (platform data directory).
    pub snapshot_path: Option<PathBuf>,

    /// Session token lifetime.
    /// Env: `TOKEN_TTL_HOURS`
    /// Default: 24 hours.
    pub token_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            token_ttl: Duration::hours(24),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("SNAPSHOT_PATH") {
            config.snapshot_path = Some(PathBuf::from(path));
        }

        if let Ok(val) = std::env::var("TOKEN_TTL_HOURS") {
            match val.parse::<i64>() {
                Ok(hours) if hours > 0 => config.token_ttl = Duration::hours(hours),
                _ => {
                    tracing::warn!(value = %val, "Invalid TOKEN_TTL_HOURS, using default");
                }
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.snapshot_path.is_none());
        assert_eq!(config.token_ttl, Duration::hours(24));
    }
}
