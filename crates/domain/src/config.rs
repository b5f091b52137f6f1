//! Configuration management

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub refresh: RefreshConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the OAuth token server
    pub auth_base_url: String,
    /// Base URL of the record service (login + loadRecords endpoints)
    pub service_base_url: String,
    /// Pre-shared value for the token endpoint's Authorization header
    #[serde(skip_serializing)]
    pub auth_header: String,
    /// API client identifier sent on every service call
    pub client_id: String,
    /// Service login user name (NOMUSU)
    pub username: String,
    /// Internal user id (INTERNO)
    pub internal_id: String,
    /// Per-request HTTP timeout in seconds
    pub timeout_secs: u64,
}

/// Background session refresh configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    pub interval_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                auth_base_url: "https://api.energisa.io".to_string(),
                service_base_url: "https://dev-api.energisa.io/sankhya".to_string(),
                auth_header: String::new(),
                client_id: String::new(),
                username: String::new(),
                internal_id: String::new(),
                timeout_secs: 30,
            },
            refresh: RefreshConfig { interval_seconds: 120 },
        }
    }
}
