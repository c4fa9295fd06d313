//! Tracing initialization

use tracing_subscriber::EnvFilter;

use crate::{config::Config, error::Result};

/// Initialize JSON tracing filtered by `service.log_level`
///
/// An already-installed global subscriber is left in place.
pub fn init_tracing(config: &Config) -> Result<()> {
    let log_level = config.service.log_level.clone();

    let installed = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();

    match installed {
        Ok(()) => {
            tracing::info!("Tracing initialized for service: {}", config.service.name);
        }
        Err(e) => {
            tracing::debug!("Tracing subscriber already installed: {}", e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        let config = Config::default();
        assert!(init_tracing(&config).is_ok());
        assert!(init_tracing(&config).is_ok());
    }

    #[test]
    fn test_init_tracing_with_invalid_level() {
        let mut config = Config::default();
        config.service.log_level = "not a [filter".to_string();
        assert!(init_tracing(&config).is_ok());
    }
}
