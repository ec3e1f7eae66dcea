//! Store configuration loading.
//!
//! # Responsibility
//! - Describe database, pool, edit-policy and logging settings.
//! - Layer defaults, an optional JSON file and `ROOMKEEP_*` variables.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid config.
//! - Later layers win: environment over file over defaults.
//! - `pool_capacity` is at least 1 after loading.

use crate::db::pool::DEFAULT_POOL_CAPACITY;
use crate::db::{DEFAULT_BUSY_TIMEOUT, DEFAULT_CHECKOUT_TIMEOUT};
use crate::logging::default_log_level;
use crate::service::room_service::BedDetailsPolicy;
use figment::providers::{Env, Format, Json, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_DB_PATH: &str = "roomkeep.sqlite3";

/// Environment prefix; `ROOMKEEP_BUSY_TIMEOUT_MS` overrides `busyTimeoutMs`.
pub const ENV_PREFIX: &str = "ROOMKEEP_";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    /// A layer could not be parsed or a value has the wrong type.
    Extract(Box<figment::Error>),
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Extract(err) => write!(f, "invalid configuration: {err}"),
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for `{key}`"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Extract(err) => Some(err.as_ref()),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(value: figment::Error) -> Self {
        Self::Extract(Box::new(value))
    }
}

/// Settings for [`crate::RoomStore`] and process logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub pool_capacity: usize,
    pub busy_timeout_ms: u64,
    /// Longest wait for a free pooled connection.
    pub checkout_timeout_ms: u64,
    pub bed_policy: BedDetailsPolicy,
    /// Prefix applied to stored upload paths, e.g. a CDN origin.
    pub attachment_base_uri: Option<String>,
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            pool_capacity: DEFAULT_POOL_CAPACITY,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT.as_millis() as u64,
            checkout_timeout_ms: DEFAULT_CHECKOUT_TIMEOUT.as_millis() as u64,
            bed_policy: BedDetailsPolicy::default(),
            attachment_base_uri: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl StoreConfig {
    /// Builds the layered provider: defaults, then `path` if given, then
    /// `ROOMKEEP_*` environment variables.
    pub fn figment(path: Option<&Path>) -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(StoreConfig::default()));
        let figment = match path {
            Some(path) => figment.merge(Json::file(path)),
            None => figment,
        };
        figment.merge(
            Env::prefixed(ENV_PREFIX)
                .map(|key| env_key_to_field(key.as_str()).into())
                .lowercase(false),
        )
    }

    /// Loads the layered configuration and validates it.
    ///
    /// A named file that does not exist is an error rather than an empty layer.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            std::fs::metadata(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
        Self::extract_from(Self::figment(path))
    }

    /// Parses a JSON config document over the defaults, without environment.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Self::extract_from(
            Figment::new()
                .merge(Serialized::defaults(StoreConfig::default()))
                .merge(Json::string(text)),
        )
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn checkout_timeout(&self) -> Duration {
        Duration::from_millis(self.checkout_timeout_ms)
    }

    fn extract_from(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "poolCapacity",
                value: self.pool_capacity.to_string(),
            });
        }
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "dbPath",
                value: String::new(),
            });
        }
        Ok(())
    }
}

/// `DB_PATH` / `db_path` -> `dbPath`.
fn env_key_to_field(key: &str) -> String {
    let mut field = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '_' {
            upper_next = !field.is_empty();
        } else if upper_next {
            field.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            field.push(ch.to_ascii_lowercase());
        }
    }
    field
}
