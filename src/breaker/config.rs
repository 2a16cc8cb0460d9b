//! # Circuit breaker configuration.
//!
//! [`BreakerConfig`] keeps the raw environment-style strings so that a bad value
//! is reported when the breaker is built, not when the environment is read.
//!
//! | env var                     | default | meaning                                  |
//! |-----------------------------|---------|------------------------------------------|
//! | `CB_MAX_FAILURES_THRESHOLD` | `"3"`   | failures tolerated before opening        |
//! | `CB_RESET_TIMEOUT`          | `"60"`  | seconds an open breaker waits to probe   |

use std::time::Duration;

use envconfig::Envconfig;

use crate::error::ConfigError;

/// Raw circuit breaker configuration.
#[derive(Envconfig, Clone, Debug, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Number of failures tolerated; the breaker opens once the count exceeds it.
    #[envconfig(from = "CB_MAX_FAILURES_THRESHOLD", default = "3")]
    pub max_failures_threshold: String,

    /// Length of the open period, in whole seconds.
    #[envconfig(from = "CB_RESET_TIMEOUT", default = "60")]
    pub reset_timeout: String,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            max_failures_threshold: "3".to_string(),
            reset_timeout: "60".to_string(),
        }
    }
}

impl BreakerConfig {
    /// Parses the raw values.
    pub fn parse(&self) -> Result<BreakerSettings, ConfigError> {
        let reset_secs = parse_number("CB_RESET_TIMEOUT", &self.reset_timeout)?;
        let failure_limit = parse_number("CB_MAX_FAILURES_THRESHOLD", &self.max_failures_threshold)?;
        Ok(BreakerSettings {
            failure_limit,
            reset_timeout: Duration::from_secs(reset_secs),
        })
    }
}

fn parse_number(field: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|source| ConfigError::InvalidNumber {
        field,
        value: value.to_string(),
        source,
    })
}

/// Parsed circuit breaker settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BreakerSettings {
    /// Failures tolerated before the breaker opens (strictly more are needed).
    pub failure_limit: u64,
    /// How long the breaker stays open before a probe is allowed.
    pub reset_timeout: Duration,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_limit: 3,
            reset_timeout: Duration::from_secs(60),
        }
    }
}

impl TryFrom<&BreakerConfig> for BreakerSettings {
    type Error = ConfigError;

    fn try_from(cfg: &BreakerConfig) -> Result<Self, Self::Error> {
        cfg.parse()
    }
}
