//! Engine configuration.
//!
//! Settings are read from the environment:
//!
//! | Variable                    | Default | Meaning                                  |
//! |-----------------------------|---------|------------------------------------------|
//! | `REGISTER_LOG_LEVEL`        | `info`  | `debug`, `info`, `warn` or `error`       |
//! | `REGISTER_LOG_TIMESTAMPS`   | `true`  | prefix log lines with a UTC timestamp    |
//! | `REGISTER_SCRATCH_CAPACITY` | `1024`  | condition scratch pool size in bytes     |
//! | `REGISTER_MEMPOOL_READS`    | `false` | conditions read registers through the mempool |

use crate::condition::scratch::DEFAULT_CAPACITY;
use crate::storage::ReadFlags;
use crate::utils::log::{self, Level};
use register_derive::Error;
use std::env;

pub const LOG_LEVEL: &str = "REGISTER_LOG_LEVEL";
pub const LOG_TIMESTAMPS: &str = "REGISTER_LOG_TIMESTAMPS";
pub const SCRATCH_CAPACITY: &str = "REGISTER_SCRATCH_CAPACITY";
pub const MEMPOOL_READS: &str = "REGISTER_MEMPOOL_READS";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
    #[error("scratch capacity {0} must be a non-zero multiple of 8")]
    Capacity(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub log_level: Level,
    pub log_timestamps: bool,
    /// Bytes of scratch memory each executed condition gets.
    pub scratch_capacity: usize,
    /// View conditions read registers through.
    pub read_flags: ReadFlags,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Level::Info,
            log_timestamps: true,
            scratch_capacity: DEFAULT_CAPACITY,
            read_flags: ReadFlags::Default,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(LOG_LEVEL) {
            config.log_level = value.parse().map_err(|_| invalid(LOG_LEVEL, &value))?;
        }
        if let Some(value) = lookup(LOG_TIMESTAMPS) {
            config.log_timestamps = flag(LOG_TIMESTAMPS, &value)?;
        }
        if let Some(value) = lookup(SCRATCH_CAPACITY) {
            let capacity: usize = value
                .trim()
                .parse()
                .map_err(|_| invalid(SCRATCH_CAPACITY, &value))?;
            if capacity == 0 || capacity % 8 != 0 {
                return Err(ConfigError::Capacity(capacity));
            }
            config.scratch_capacity = capacity;
        }
        if let Some(value) = lookup(MEMPOOL_READS) {
            if flag(MEMPOOL_READS, &value)? {
                config.read_flags = ReadFlags::Mempool;
            }
        }

        Ok(config)
    }

    /// Applies the log settings process-wide.
    pub fn install_logging(&self) {
        log::set_level(self.log_level);
        log::set_timestamps(self.log_timestamps);
    }
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}

fn flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}
