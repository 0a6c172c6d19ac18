//! Database configuration.
//!
//! Loaded either from the environment (with `.env` support) or from a TOML
//! file:
//!
//! ```toml
//! [database]
//! url = "${DATABASE_URL}"
//! max_pool_size = 8
//! slow_query_ms = 250
//! ```

use crate::error::{DbError, DbResult};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_MAX_POOL_SIZE: usize = 16;
const DEFAULT_LOG_SQL_MAX_LENGTH: usize = 200;

/// Connection and logging settings.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Postgres connection URL.
    pub url: String,
    /// Maximum pooled connections.
    pub max_pool_size: usize,
    /// Statements slower than this are logged at `warn`.
    pub slow_query_threshold: Option<Duration>,
    /// Truncate logged SQL to this many bytes. `None` disables truncation.
    pub log_sql_max_length: Option<usize>,
}

impl DbConfig {
    /// Create a configuration with defaults for everything but the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
            slow_query_threshold: None,
            log_sql_max_length: Some(DEFAULT_LOG_SQL_MAX_LENGTH),
        }
    }

    /// Set the maximum pool size.
    pub fn max_pool_size(mut self, size: usize) -> Self {
        self.max_pool_size = size;
        self
    }

    /// Set the slow-query threshold.
    pub fn slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    /// Read the configuration from environment variables.
    ///
    /// A `.env` file in the working directory (or a parent) is loaded first if
    /// present. `DATABASE_URL` is required; `DATABASE_MAX_POOL_SIZE`,
    /// `DATABASE_SLOW_QUERY_MS` and `DATABASE_LOG_SQL_MAX_LENGTH` are optional.
    pub fn from_env() -> DbResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DbResult<Self> {
        let url = lookup("DATABASE_URL")
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| DbError::Config("DATABASE_URL is not set".to_string()))?;

        let mut config = Self::new(url);
        if let Some(v) = lookup("DATABASE_MAX_POOL_SIZE") {
            config.max_pool_size = parse_number("DATABASE_MAX_POOL_SIZE", &v)?;
        }
        if let Some(v) = lookup("DATABASE_SLOW_QUERY_MS") {
            let ms: u64 = parse_number("DATABASE_SLOW_QUERY_MS", &v)?;
            config.slow_query_threshold = Some(Duration::from_millis(ms));
        }
        if let Some(v) = lookup("DATABASE_LOG_SQL_MAX_LENGTH") {
            let len: usize = parse_number("DATABASE_LOG_SQL_MAX_LENGTH", &v)?;
            config.log_sql_max_length = (len > 0).then_some(len);
        }
        config.validate()?;
        Ok(config)
    }

    /// Read the configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DbError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse the configuration from TOML text.
    ///
    /// `${VAR}` references in `database.url` are expanded from the environment.
    pub fn from_toml_str(raw: &str) -> DbResult<Self> {
        let file: ConfigFile = toml::from_str(raw)
            .map_err(|e| DbError::Config(format!("failed to parse config: {e}")))?;
        let db = file.database;

        let config = Self {
            url: expand_env(&db.url)?,
            max_pool_size: db.max_pool_size.unwrap_or(DEFAULT_MAX_POOL_SIZE),
            slow_query_threshold: db.slow_query_ms.map(Duration::from_millis),
            log_sql_max_length: match db.log_sql_max_length {
                Some(0) => None,
                Some(n) => Some(n),
                None => Some(DEFAULT_LOG_SQL_MAX_LENGTH),
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> DbResult<()> {
        if self.url.trim().is_empty() {
            return Err(DbError::Config("database url is empty".to_string()));
        }
        if self.max_pool_size == 0 {
            return Err(DbError::Config("max_pool_size must be > 0".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    database: DatabaseSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DatabaseSection {
    url: String,
    max_pool_size: Option<usize>,
    slow_query_ms: Option<u64>,
    log_sql_max_length: Option<usize>,
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> DbResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| DbError::Config(format!("{key} must be a number, got {value:?}")))
}

fn expand_env(value: &str) -> DbResult<String> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| DbError::Config(format!("unclosed ${{ in {value:?}")))?;
        let name = &after[..end];
        let var = std::env::var(name)
            .map_err(|_| DbError::Config(format!("environment variable {name} is not set")))?;
        out.push_str(&var);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
