//! API Configuration Module
//!
//! Server, CORS and seeding settings loaded from environment variables with
//! development-friendly defaults.

use crate::error::{ApiError, ApiResult};
use std::net::SocketAddr;
use std::path::PathBuf;

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind host (default: 0.0.0.0).
    pub bind_host: String,

    /// Bind port (default: 3000).
    pub port: u16,

    /// Allowed CORS origins. Empty means allow all origins (dev mode).
    /// Example: "https://rmt.example.org,https://*.rmt.example.org"
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    /// JSON seed file for the in-memory store.
    pub seed_file: Option<PathBuf>,

    /// Deployment environment name (development, production, ...).
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400,
            seed_file: None,
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `RMT_API_BIND`: Bind host (default: 0.0.0.0)
    /// - `PORT` / `RMT_API_PORT`: Bind port (default: 3000)
    /// - `RMT_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `RMT_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `RMT_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `RMT_SEED_FILE`: Path of the JSON seed file
    /// - `RMT_ENVIRONMENT`: Deployment environment (default: development)
    pub fn from_env() -> ApiResult<Self> {
        let defaults = Self::default();

        let bind_host = std::env::var("RMT_API_BIND").unwrap_or(defaults.bind_host);

        let port = match std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("RMT_API_PORT").ok())
        {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", raw)))?,
            None => defaults.port,
        };

        let cors_origins = std::env::var("RMT_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_allow_credentials = std::env::var("RMT_CORS_ALLOW_CREDENTIALS")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        let cors_max_age_secs = std::env::var("RMT_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let seed_file = std::env::var("RMT_SEED_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let environment = std::env::var("RMT_ENVIRONMENT")
            .map(|s| s.to_lowercase())
            .unwrap_or(defaults.environment);

        Ok(Self {
            bind_host,
            port,
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
            seed_file,
            environment,
        })
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "production" | "prod")
    }

    /// Production deployments must name their CORS origins explicitly.
    pub fn validate_for_production(&self) -> ApiResult<()> {
        if self.is_production() && self.cors_origins.is_empty() {
            return Err(ApiError::invalid_input(
                "CORS origins not configured for production. Set RMT_CORS_ORIGINS.",
            ));
        }
        Ok(())
    }

    /// Socket address the server binds to.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            // Wildcard subdomains: *.rmt.example.org
            if let Some(pattern) = allowed.strip_prefix("*.") {
                if let Some(origin_domain) = origin.strip_prefix("https://") {
                    return origin_domain.ends_with(&format!(".{}", pattern))
                        || origin_domain == pattern;
                }
            }
            false
        })
    }
}
