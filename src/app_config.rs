use crate::errors::{ErrorKind, Result};
use crate::sync::driver::StreamingPolicy;
use std::env;
use std::str::FromStr;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AppConfig {
    /// Connection string of the destination database
    pub database_url: Option<String>,
    pub database_pool_size: u32,
    /// Rows per page when reading the destination table
    pub batch_size: i64,
    /// Refuse to run when an adapter buffers its full result set
    pub require_streaming: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: None,
            database_pool_size: 4,
            batch_size: 1_000,
            require_streaming: false,
        }
    }
}

impl AppConfig {
    /// Reads the configuration from the environment, falling back to the defaults.
    pub fn from_env() -> Result<AppConfig> {
        AppConfig::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<AppConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let config = AppConfig {
            database_url: lookup("DATABASE_URL"),
            database_pool_size: parse_var(&lookup, "DATABASE_POOL_SIZE")?
                .unwrap_or(defaults.database_pool_size),
            batch_size: parse_var(&lookup, "SYNC_BATCH_SIZE")?.unwrap_or(defaults.batch_size),
            require_streaming: lookup("SYNC_REQUIRE_STREAMING")
                .map(|v| v == "true")
                .unwrap_or(defaults.require_streaming),
        };
        if config.database_pool_size < 1 {
            return Err(ErrorKind::InvalidConfig(
                "DATABASE_POOL_SIZE must be at least 1".into(),
            )
            .into());
        }

        Ok(config)
    }

    pub fn streaming_policy(&self) -> StreamingPolicy {
        if self.require_streaming {
            StreamingPolicy::Require
        } else {
            StreamingPolicy::Warn
        }
    }
}

pub fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| ErrorKind::InvalidConfig(format!("{} has an invalid value: {}", key, value)).into())
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => parse_value(key, &value).map(Some),
        None => Ok(None),
    }
}
