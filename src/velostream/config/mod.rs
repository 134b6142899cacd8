//! Foreign-key join configuration
//!
//! Configuration can come from a YAML document or from a flat properties map, the
//! same way sources and sinks are configured:
//!
//! ```rust
//! use velostream_fkjoin::velostream::config::ForeignKeyJoinConfig;
//! use std::collections::HashMap;
//! use std::time::Duration;
//!
//! let mut props = HashMap::new();
//! props.insert("join.grace.period.ms".to_string(), "5000".to_string());
//! props.insert("join.num.partitions".to_string(), "12".to_string());
//!
//! let config = ForeignKeyJoinConfig::from_properties(&props).unwrap();
//! assert_eq!(config.grace_period(), Some(Duration::from_secs(5)));
//! assert_eq!(config.num_partitions, 12);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const GRACE_PERIOD_MS: &str = "join.grace.period.ms";
pub const NUM_PARTITIONS: &str = "join.num.partitions";
pub const APPLICATION_ID: &str = "application.id";

const DEFAULT_APPLICATION_ID: &str = "velostream-fkjoin";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for property '{key}': {reason}")]
    InvalidProperty {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForeignKeyJoinConfig {
    pub application_id: String,
    /// Versioned-join grace period; `None` disables temporal validation
    pub grace_period_ms: Option<u64>,
    /// Partition count shared by the subscription topic and the foreign table
    pub num_partitions: u32,
}

impl Default for ForeignKeyJoinConfig {
    fn default() -> Self {
        Self {
            application_id: DEFAULT_APPLICATION_ID.to_string(),
            grace_period_ms: None,
            num_partitions: 1,
        }
    }
}

impl ForeignKeyJoinConfig {
    pub fn from_properties(props: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(id) = props.get(APPLICATION_ID) {
            config.application_id = id.clone();
        }
        if let Some(raw) = props.get(GRACE_PERIOD_MS) {
            config.grace_period_ms = Some(parse_property(GRACE_PERIOD_MS, raw)?);
        }
        if let Some(raw) = props.get(NUM_PARTITIONS) {
            config.num_partitions = parse_property(NUM_PARTITIONS, raw)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Durations beyond `u64::MAX` milliseconds saturate
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period_ms = Some(u64::try_from(grace_period.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn grace_period(&self) -> Option<Duration> {
        self.grace_period_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_partitions == 0 {
            return Err(ConfigError::InvalidProperty {
                key: NUM_PARTITIONS.to_string(),
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_property<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidProperty {
            key: key.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
}
