//! Server configuration
//!
//! Loaded from environment variables, falling back to defaults that match a
//! local development setup (front-end and API both on port 8000).

use crate::error::{AppError, Result};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:8000,http://127.0.0.1:8000";
pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query2.finance.yahoo.com";
pub const DEFAULT_YAHOO_COOKIE_URL: &str = "https://fc.yahoo.com";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Upstream (Yahoo Finance) connection settings
#[derive(Debug, Clone, PartialEq)]
pub struct YahooConfig {
    pub base_url: String,
    pub cookie_url: String,
    pub user_agent: String,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            cookie_url: DEFAULT_YAHOO_COOKIE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: String,
    pub allowed_origins: Vec<String>,
    pub yahoo: YahooConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            static_dir: DEFAULT_STATIC_DIR.to_string(),
            allowed_origins: parse_origins(DEFAULT_ALLOWED_ORIGINS),
            yahoo: YahooConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string());

        let host = get("OPTIONS_API_HOST").unwrap_or(defaults.host);
        if host.is_empty() {
            return Err(AppError::Config("OPTIONS_API_HOST must not be empty".to_string()));
        }

        let port = match get("OPTIONS_API_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| AppError::Config(format!("Invalid OPTIONS_API_PORT '{}': {}", raw, e)))?,
            None => defaults.port,
        };

        let allowed_origins = get("OPTIONS_API_ALLOWED_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or(defaults.allowed_origins);

        Ok(Self {
            host,
            port,
            static_dir: get("OPTIONS_API_STATIC_DIR").unwrap_or(defaults.static_dir),
            allowed_origins,
            yahoo: YahooConfig {
                base_url: get("YAHOO_BASE_URL")
                    .map(|u| u.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.yahoo.base_url),
                cookie_url: get("YAHOO_COOKIE_URL").unwrap_or(defaults.yahoo.cookie_url),
                user_agent: get("YAHOO_USER_AGENT").unwrap_or(defaults.yahoo.user_agent),
            },
        })
    }

    /// `host:port` string for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Split a comma-separated origin list, dropping blanks
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
