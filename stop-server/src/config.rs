//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::domain::{DomainError, MAX_SCAN_INTERVAL_SECS, ScanInterval};
use crate::setup::SetupInput;
use crate::upstream::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, HeaderProfile, StopClientConfig};

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Default snapshot cache TTL in seconds.
pub const DEFAULT_SNAPSHOT_TTL_SECS: u64 = 600;

/// Shortest accepted snapshot TTL: two of the longest scan intervals, so a
/// snapshot outlives the next poll even when that poll runs late.
pub const MIN_SNAPSHOT_TTL_SECS: u64 = 2 * MAX_SCAN_INTERVAL_SECS;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}: expected a number, got {value:?}")]
    NotANumber { var: &'static str, value: String },

    #[error("{var}: invalid value")]
    Domain {
        var: &'static str,
        #[source]
        source: DomainError,
    },

    #[error("{var}: unknown header profile {value:?} (expected giromilano or chrome)")]
    UnknownHeaderProfile { var: &'static str, value: String },

    #[error("{var}: invalid socket address {value:?}")]
    BindAddr { var: &'static str, value: String },

    #[error("{var}: must be greater than zero")]
    Zero { var: &'static str },

    #[error("{var}: {value} s is shorter than the minimum of {min} s")]
    TooShort {
        var: &'static str,
        value: u64,
        min: u64,
    },
}

/// Everything `main` needs to start the server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Stops configured at startup.
    pub stop_ids: Vec<String>,
    pub scan_interval: ScanInterval,
    pub client: StopClientConfig,

    /// Serve fixtures from this directory instead of the live upstream.
    pub mock_dir: Option<PathBuf>,

    pub cache: CacheConfig,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through an arbitrary lookup.
    ///
    /// Unset and empty variables take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let stop_ids = get("STOP_IDS")
            .map(|ids| {
                ids.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let scan_interval = match get("STOP_SCAN_INTERVAL") {
            Some(value) => {
                let secs = parse_number("STOP_SCAN_INTERVAL", &value)?;
                ScanInterval::new(secs).map_err(|source| ConfigError::Domain {
                    var: "STOP_SCAN_INTERVAL",
                    source,
                })?
            }
            None => ScanInterval::default(),
        };

        let base_url = get("STOP_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = match get("STOP_API_TIMEOUT") {
            Some(value) => positive("STOP_API_TIMEOUT", parse_number("STOP_API_TIMEOUT", &value)?)?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let header_profile = match get("STOP_HEADER_PROFILE") {
            Some(name) => HeaderProfile::by_name(name.trim()).ok_or(
                ConfigError::UnknownHeaderProfile {
                    var: "STOP_HEADER_PROFILE",
                    value: name,
                },
            )?,
            None => HeaderProfile::default(),
        };

        let ttl_secs = match get("SNAPSHOT_TTL") {
            Some(value) => at_least(
                "SNAPSHOT_TTL",
                parse_number("SNAPSHOT_TTL", &value)?,
                MIN_SNAPSHOT_TTL_SECS,
            )?,
            None => DEFAULT_SNAPSHOT_TTL_SECS,
        };

        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = SocketAddr::from_str(bind_addr.trim()).map_err(|_| {
            ConfigError::BindAddr {
                var: "BIND_ADDR",
                value: bind_addr.clone(),
            }
        })?;

        Ok(Self {
            stop_ids,
            scan_interval,
            client: StopClientConfig::new()
                .with_base_url(base_url)
                .with_timeout(timeout_secs)
                .with_header_profile(header_profile),
            mock_dir: get("STOP_MOCK_DIR").map(PathBuf::from),
            cache: CacheConfig {
                ttl: Duration::from_secs(ttl_secs),
            },
            bind_addr,
        })
    }

    /// Setup inputs for the startup stops.
    pub fn startup_stops(&self) -> Vec<SetupInput> {
        self.stop_ids
            .iter()
            .map(|id| SetupInput::new(id.as_str()).with_scan_interval(self.scan_interval.secs()))
            .collect()
    }
}

fn parse_number(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::NotANumber {
        var,
        value: value.to_string(),
    })
}

fn positive(var: &'static str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        Err(ConfigError::Zero { var })
    } else {
        Ok(value)
    }
}

fn at_least(var: &'static str, value: u64, min: u64) -> Result<u64, ConfigError> {
    if value < min {
        Err(ConfigError::TooShort { var, value, min })
    } else {
        Ok(value)
    }
}
