//! Runtime configuration for the inventory core.
//!
//! # Responsibility
//! - Collect database, logging, home-company and search settings from
//!   `MOLDTRACK_*` environment variables.
//! - Validate values before any component is started.
//!
//! # Invariants
//! - Unset or blank variables fall back to defaults.
//! - Set but malformed variables are rejected, never silently ignored.
//! - A relative log directory is resolved against the working directory.

use crate::catalog::JoinOptions;
use crate::logging::{default_log_level, normalize_level};
use crate::model::normalize_key;
use crate::search::debounce::{DEFAULT_DELAY, MAX_DELAY, MIN_DELAY};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DB_PATH: &str = "MOLDTRACK_DB";
pub const ENV_LOG_DIR: &str = "MOLDTRACK_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "MOLDTRACK_LOG_LEVEL";
pub const ENV_HOME_COMPANY: &str = "MOLDTRACK_HOME_COMPANY";
pub const ENV_DEBOUNCE_MS: &str = "MOLDTRACK_DEBOUNCE_MS";
pub const ENV_RESULT_LIMIT: &str = "MOLDTRACK_RESULT_LIMIT";

pub const DEFAULT_DB_FILE: &str = "moldtrack.sqlite3";

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key}=`{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Effective core settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    /// Log directory; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub log_level: &'static str,
    /// Company that owns the warehouse.
    pub home_company_id: Option<String>,
    pub search_debounce: Duration,
    /// Maximum search results; `None` is unbounded.
    pub result_limit: Option<usize>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            log_dir: None,
            log_level: default_log_level(),
            home_company_id: None,
            search_debounce: DEFAULT_DELAY,
            result_limit: None,
        }
    }
}

impl CoreConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }

        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(resolve_log_dir(Path::new(&dir))?);
        }

        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level =
                normalize_level(&level).map_err(|reason| invalid(ENV_LOG_LEVEL, &level, &reason))?;
        }

        config.home_company_id = read(ENV_HOME_COMPANY)
            .as_deref()
            .and_then(normalize_key)
            .map(str::to_string);

        if let Some(raw) = read(ENV_DEBOUNCE_MS) {
            let millis = raw
                .parse::<u64>()
                .map_err(|err| invalid(ENV_DEBOUNCE_MS, &raw, &err.to_string()))?;
            let delay = Duration::from_millis(millis);
            if delay < MIN_DELAY || delay > MAX_DELAY {
                return Err(invalid(
                    ENV_DEBOUNCE_MS,
                    &raw,
                    &format!(
                        "expected {}..={} milliseconds",
                        MIN_DELAY.as_millis(),
                        MAX_DELAY.as_millis()
                    ),
                ));
            }
            config.search_debounce = delay;
        }

        if let Some(raw) = read(ENV_RESULT_LIMIT) {
            let limit = raw
                .parse::<usize>()
                .map_err(|err| invalid(ENV_RESULT_LIMIT, &raw, &err.to_string()))?;
            // 0 means unbounded
            config.result_limit = (limit > 0).then_some(limit);
        }

        Ok(config)
    }

    pub fn join_options(&self) -> JoinOptions {
        JoinOptions {
            home_company_id: self.home_company_id.clone(),
        }
    }
}

/// Returns `dir` as an absolute path, joining relative paths onto the
/// current working directory.
pub fn resolve_log_dir(dir: &Path) -> Result<PathBuf, ConfigError> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|err| {
        invalid(ENV_LOG_DIR, &dir.display().to_string(), &err.to_string())
    })?;
    Ok(cwd.join(dir))
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
