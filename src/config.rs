//! We can have a little hard-coded config, and whatever else comes out of
//! the environment.
use anyhow::{Context, Result};
use std::{env, net::SocketAddr};

/// Result cap when a listing request doesn't ask for one.
pub const DEFAULT_LIMIT: i64 = 20;
pub const MIN_LIMIT: i64 = 1;
pub const MAX_LIMIT: i64 = 100;

/// The diagnostic endpoint only reports this many collection names.
pub const DIAGNOSTIC_COLLECTIONS_MAX: usize = 10;

#[derive(Clone, Debug, Default)]
pub struct Config {
    pub database_url: Option<String>,
    pub database_name: Option<String>,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = match non_empty_var("PORT") {
            Some(p) => p.parse().context("PORT must be a valid port number")?,
            None => 8000,
        };
        let max_connections = match non_empty_var("DATABASE_MAX_CONNECTIONS") {
            Some(n) => n
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            None => 10,
        };

        Ok(Self {
            database_url: non_empty_var("DATABASE_URL"),
            database_name: non_empty_var("DATABASE_NAME"),
            host: non_empty_var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            max_connections,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}", self.host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr() {
        let config = Config {
            host: "127.0.0.1".into(),
            port: 8000,
            ..Default::default()
        };
        assert_eq!(config.addr().unwrap().to_string(), "127.0.0.1:8000");
    }

    #[test]
    fn test_bad_host() {
        let config = Config {
            host: "not a host".into(),
            port: 8000,
            ..Default::default()
        };
        assert!(config.addr().is_err());
    }
}
