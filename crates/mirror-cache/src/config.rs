//! Environment-based configuration for the cache backend.

use std::env;

/// Cache backend connection configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub host: String,
    pub port: u16,
    /// Optional auth credential; when set, the client authenticates on
    /// connect.
    pub auth: Option<String>,
}

impl CacheConfig {
    /// Load configuration from `REDIS_HOST`, `REDIS_PORT` and
    /// `REDIS_AUTH` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            host: env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("REDIS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(6379),
            auth: env::var("REDIS_AUTH").ok(),
        }
    }

    /// Connection URL, with the credential embedded when configured.
    #[must_use]
    pub fn url(&self) -> String {
        match &self.auth {
            Some(auth) => format!("redis://:{auth}@{}:{}", self.host, self.port),
            None => format!("redis://{}:{}", self.host, self.port),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            auth: None,
        }
    }
}
