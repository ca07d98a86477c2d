use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://dummyjson.com";
const DEFAULT_API_TOKEN: &str = "06b29b7253af4813a22d9af34498dee5";
const DEFAULT_DATABASE_URL: &str = "sqlite://tododash.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_WATCH_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// What a delete does to a record that may still exist remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Drop the overlay entry only. A remote copy shows up again on the next read.
    #[default]
    Forget,
    /// Also remember the id and hide it from every merged read.
    Tombstone,
}

/// How the dashboard treats an owner filter that is not a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnparseableOwnerFilter {
    #[default]
    MatchNothing,
    NoFilter,
}

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_token: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: DEFAULT_API_TOKEN.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Zero disables the storage watcher.
    pub watch_interval: Duration,
    pub delete_policy: DeletePolicy,
    pub owner_filter: UnparseableOwnerFilter,
    /// Run without the remote service; everything stays in the overlay.
    pub offline: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let remote = RemoteConfig {
            base_url: get("TODO_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_token: get("TODO_API_TOKEN").unwrap_or_else(|| DEFAULT_API_TOKEN.to_string()),
        };

        let raw_addr = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr.parse().map_err(|_| ConfigError::Invalid {
            key: "BIND_ADDR",
            value: raw_addr.clone(),
        })?;

        let watch_interval_ms = match get("OVERLAY_WATCH_INTERVAL_MS") {
            Some(raw) => parse_u64("OVERLAY_WATCH_INTERVAL_MS", &raw)?,
            None => DEFAULT_WATCH_INTERVAL_MS,
        };

        let tombstones = parse_flag("OVERLAY_DELETE_TOMBSTONES", get("OVERLAY_DELETE_TOMBSTONES"))?;
        let delete_policy = if tombstones {
            DeletePolicy::Tombstone
        } else {
            DeletePolicy::Forget
        };

        let owner_filter = match get("OWNER_FILTER_UNPARSEABLE").as_deref() {
            None | Some("match_nothing") => UnparseableOwnerFilter::MatchNothing,
            Some("no_filter") => UnparseableOwnerFilter::NoFilter,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "OWNER_FILTER_UNPARSEABLE",
                    value: other.to_string(),
                });
            }
        };

        let offline = parse_flag("TODO_API_OFFLINE", get("TODO_API_OFFLINE"))?;

        Ok(Self {
            remote,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_addr,
            watch_interval: Duration::from_millis(watch_interval_ms),
            delete_policy,
            owner_filter,
            offline,
        })
    }
}

fn parse_flag(key: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    match raw.as_deref() {
        None | Some("false") | Some("0") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some(other) => Err(ConfigError::Invalid {
            key,
            value: other.to_string(),
        }),
    }
}

fn parse_u64(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}
