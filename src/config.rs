use std::env;
use std::time::Duration;

use crate::constants::{DEFAULT_SERVER_PORT, PROBE_TIMEOUT_MS, REQUEST_TIMEOUT_MS};

/// Backend configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    /// Empty means any origin
    pub allowed_origins: Vec<String>,
    /// Directory co-hosted as static files, if any
    pub static_dir: Option<String>,
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = match env::var("SERVER_PORT") {
            Ok(port) => port.parse().map_err(|_| "Invalid SERVER_PORT")?,
            Err(_) => DEFAULT_SERVER_PORT,
        };

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./users.json".to_string());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .map(|list| parse_list(&list))
            .unwrap_or_default()
            .into_iter()
            .filter(|origin| origin != "*")
            .collect();

        let static_dir = env::var("STATIC_DIR").ok().filter(|dir| !dir.is_empty());

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        Ok(Config {
            server_host,
            server_port,
            database_path,
            allowed_origins,
            static_dir,
            environment,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Sync layer configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend, e.g. `http://localhost:3000`
    pub api_base: String,
    pub probe_timeout: Duration,
    pub request_timeout: Duration,
    /// Run the liveness probe before every backend attempt
    pub probe_before_call: bool,
    /// Hosts besides loopback that are known to run the backend
    pub backend_hosts: Vec<String>,
    /// File backing the local mirror; in-memory when `None`
    pub mirror_path: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: format!("http://localhost:{}", DEFAULT_SERVER_PORT),
            probe_timeout: Duration::from_millis(PROBE_TIMEOUT_MS),
            request_timeout: Duration::from_millis(REQUEST_TIMEOUT_MS),
            probe_before_call: false,
            backend_hosts: Vec::new(),
            mirror_path: None,
        }
    }
}

impl ClientConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            ..Default::default()
        }
    }

    /// Load configuration from `AIWALLET_*` environment variables
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let api_base = env::var("AIWALLET_API_BASE").unwrap_or(defaults.api_base);

        let probe_timeout = match env::var("AIWALLET_PROBE_TIMEOUT_MS") {
            Ok(ms) => Duration::from_millis(
                ms.parse()
                    .map_err(|_| "Invalid AIWALLET_PROBE_TIMEOUT_MS")?,
            ),
            Err(_) => defaults.probe_timeout,
        };

        let request_timeout = match env::var("AIWALLET_REQUEST_TIMEOUT_MS") {
            Ok(ms) => Duration::from_millis(
                ms.parse()
                    .map_err(|_| "Invalid AIWALLET_REQUEST_TIMEOUT_MS")?,
            ),
            Err(_) => defaults.request_timeout,
        };

        let probe_before_call = match env::var("AIWALLET_PROBE_BEFORE_CALL") {
            Ok(flag) => flag
                .parse()
                .map_err(|_| "Invalid AIWALLET_PROBE_BEFORE_CALL")?,
            Err(_) => defaults.probe_before_call,
        };

        let backend_hosts = env::var("AIWALLET_BACKEND_HOSTS")
            .map(|list| parse_list(&list))
            .unwrap_or_default();

        let mirror_path = env::var("AIWALLET_MIRROR_PATH")
            .ok()
            .filter(|p| !p.is_empty());

        Ok(ClientConfig {
            api_base,
            probe_timeout,
            request_timeout,
            probe_before_call,
            backend_hosts,
            mirror_path,
        })
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_trims_and_skips_blanks() {
        assert_eq!(
            parse_list(" http://a.test , ,http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn test_client_defaults_match_documented_bounds() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base, "http://localhost:3000");
        assert_eq!(config.probe_timeout, Duration::from_millis(1000));
        assert_eq!(config.request_timeout, Duration::from_millis(3000));
        assert!(!config.probe_before_call);
    }
}
