//! # Application State
//!
//! Shared, read-only state handed to every request handler through `Arc`.
//! Catalogues arrive with each request, so the only shared piece is the server
//! configuration.
//!
//! ## Environment
//!
//! - `RELOPT_BIND_ADDR`: socket address to listen on (default `0.0.0.0:3000`).
//! - `RELOPT_MAX_RELATIONS`: largest number of base relations a plan may scan
//!   (default 8).

use relopt_core::OptimiserConfig;
use std::net::SocketAddr;

pub const BIND_ADDR_VAR: &str = "RELOPT_BIND_ADDR";
pub const MAX_RELATIONS_VAR: &str = "RELOPT_MAX_RELATIONS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid RELOPT_BIND_ADDR {value:?}: {source}")]
    BindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid RELOPT_MAX_RELATIONS {value:?}: {source}")]
    MaxRelations {
        value: String,
        source: std::num::ParseIntError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub optimiser: OptimiserConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            optimiser: OptimiserConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from the defaults, overridden by whatever `lookup`
    /// returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(BIND_ADDR_VAR) {
            config.bind_addr = value
                .parse()
                .map_err(|source| ConfigError::BindAddr { value, source })?;
        }
        if let Some(value) = lookup(MAX_RELATIONS_VAR) {
            config.optimiser.max_relations = value
                .parse()
                .map_err(|source| ConfigError::MaxRelations { value, source })?;
        }
        Ok(config)
    }
}

pub struct AppState {
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.optimiser.max_relations, 8);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            (BIND_ADDR_VAR, "127.0.0.1:8080"),
            (MAX_RELATIONS_VAR, "5"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.optimiser.max_relations, 5);
    }

    #[test]
    fn test_invalid_values() {
        let err = ServerConfig::from_lookup(lookup(&[(MAX_RELATIONS_VAR, "many")])).unwrap_err();
        assert!(matches!(err, ConfigError::MaxRelations { .. }));

        let err = ServerConfig::from_lookup(lookup(&[(BIND_ADDR_VAR, "nowhere")])).unwrap_err();
        assert!(err.to_string().starts_with("invalid RELOPT_BIND_ADDR \"nowhere\""));
    }
}
