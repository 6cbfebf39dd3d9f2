use anyhow::{bail, Result};
use ::config::{Config, Environment, File};
use engine::{EngineConfig, StatusThresholds};
use sea_orm::Database;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::schemas::AppState;

/// Runtime settings, layered from defaults, an optional `famfin.toml` and
/// `FAMFIN_*` environment variables.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    pub near_limit_threshold: f64,
    pub critical_threshold: f64,
    pub call_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("database_url", "sqlite://famfin.db?mode=rwc")?
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("near_limit_threshold", 80.0)?
            .set_default("critical_threshold", 90.0)?
            .set_default("call_timeout_secs", 10)?
            .set_default("request_timeout_secs", 30)?
            .add_source(File::with_name("famfin").required(false))
            .add_source(Environment::with_prefix("FAMFIN"))
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.near_limit_threshold <= self.critical_threshold && self.critical_threshold <= 100.0) {
            bail!(
                "Invalid thresholds: near limit {} must not exceed critical {}, which must not exceed 100",
                self.near_limit_threshold,
                self.critical_threshold
            );
        }
        if self.call_timeout_secs == 0 || self.request_timeout_secs == 0 {
            bail!("Timeouts must be at least one second");
        }
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            thresholds: StatusThresholds {
                near_limit: self.near_limit_threshold,
                critical: self.critical_threshold,
            },
            call_timeout: Some(Duration::from_secs(self.call_timeout_secs)),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Connect to the database and build the shared application state
pub async fn initialize_app_state(config: &AppConfig) -> Result<AppState> {
    info!("Connecting to database: {}", config.database_url);
    let db = Database::connect(&config.database_url).await?;

    let engine = engine::default_engine(db.clone(), config.engine_config(), None);

    Ok(AppState {
        db,
        engine: Arc::new(engine),
        request_timeout: config.request_timeout(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            bind_address: "127.0.0.1:3000".to_string(),
            near_limit_threshold: 80.0,
            critical_threshold: 90.0,
            call_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }

    #[test]
    fn test_default_thresholds_are_valid() {
        assert!(sample().validate().is_ok());

        let engine = sample().engine_config();
        assert_eq!(engine.thresholds, StatusThresholds::default());
        assert_eq!(engine.call_timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_inverted_thresholds_are_rejected() {
        let config = AppConfig {
            near_limit_threshold: 95.0,
            ..sample()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            critical_threshold: 120.0,
            ..sample()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeouts_are_rejected() {
        let config = AppConfig {
            call_timeout_secs: 0,
            ..sample()
        };
        assert!(config.validate().is_err());
    }
}
