//! Service configuration from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite database file. Parent directories are created on startup.
    pub db_path: PathBuf,
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Fixed seed for reviewer selection. Seeded from OS entropy when unset.
    pub reviewer_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("review-roster.db"),
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            reviewer_seed: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    ///
    /// Unset and blank variables fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let db_path = get("DB_PATH").map(PathBuf::from).unwrap_or(defaults.db_path);
        let bind_addr = parse_var(get("BIND_ADDR"), "BIND_ADDR")?.unwrap_or(defaults.bind_addr);
        let port = parse_var(get("PORT"), "PORT")?.unwrap_or(defaults.port);
        let reviewer_seed = parse_var(get("REVIEWER_SEED"), "REVIEWER_SEED")?;

        Ok(Self {
            db_path,
            bind_addr,
            port,
            reviewer_seed,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(
    value: Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::Invalid { var, value: v.clone() })
        })
        .transpose()
}
