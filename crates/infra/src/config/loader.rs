//! Configuration loader
//!
//! Loads application configuration from environment variables or a JSON
//! file.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the required credentials are missing, falls back to a config file
//!
//! ## Environment Variables
//! - `PROSPECTOR_AUTH_HEADER`: Pre-shared Authorization header for the token
//!   endpoint (required)
//! - `PROSPECTOR_CLIENT_ID`: API client identifier (required)
//! - `PROSPECTOR_LOGIN_USER`: Service login user name (required)
//! - `PROSPECTOR_LOGIN_INTERNAL_ID`: Internal user id (required)
//! - `PROSPECTOR_AUTH_BASE_URL`: Token server base URL (optional)
//! - `PROSPECTOR_SERVICE_BASE_URL`: Record service base URL (optional)
//! - `PROSPECTOR_HTTP_TIMEOUT_SECS`: Per-request timeout (optional)
//! - `PROSPECTOR_REFRESH_INTERVAL_SECS`: Session refresh interval (optional)
//!
//! ## File Locations
//! The loader probes `./prospector.json` and `./config.json`, then the same
//! names next to the executable.

use std::path::PathBuf;

use prospector_domain::{Config, ProspectorError, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `ProspectorError::Config` when neither source yields a complete
/// configuration.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// The four credential variables are required; URLs and timings fall back to
/// the defaults in [`Config::default`].
///
/// # Errors
/// Returns `ProspectorError::Config` if required variables are missing or
/// numeric values do not parse.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.api.auth_header = env_var("PROSPECTOR_AUTH_HEADER")?;
    config.api.client_id = env_var("PROSPECTOR_CLIENT_ID")?;
    config.api.username = env_var("PROSPECTOR_LOGIN_USER")?;
    config.api.internal_id = env_var("PROSPECTOR_LOGIN_INTERNAL_ID")?;

    if let Ok(url) = std::env::var("PROSPECTOR_AUTH_BASE_URL") {
        config.api.auth_base_url = url;
    }
    if let Ok(url) = std::env::var("PROSPECTOR_SERVICE_BASE_URL") {
        config.api.service_base_url = url;
    }
    if let Some(timeout) = env_u64("PROSPECTOR_HTTP_TIMEOUT_SECS")? {
        config.api.timeout_secs = timeout;
    }
    if let Some(interval) = env_u64("PROSPECTOR_REFRESH_INTERVAL_SECS")? {
        config.refresh.interval_seconds = interval;
    }

    Ok(config)
}

/// Load configuration from a JSON file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `ProspectorError::Config` when the file is missing or does not
/// parse.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ProspectorError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ProspectorError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ProspectorError::Config(format!("Failed to read config file: {}", e)))?;

    serde_json::from_str(&contents)
        .map_err(|e| ProspectorError::Config(format!("Invalid JSON format: {}", e)))
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("prospector.json"));
        candidates.push(cwd.join("config.json"));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.push(exe_dir.join("prospector.json"));
            candidates.push(exe_dir.join("config.json"));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `ProspectorError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        ProspectorError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional numeric environment variable
///
/// # Errors
/// Returns `ProspectorError::Config` when the variable is set but does not
/// parse as an integer.
fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Err(_) => Ok(None),
        Ok(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ProspectorError::Config(format!("Invalid value for {}: {}", key, e))),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const REQUIRED: &[&str] = &[
        "PROSPECTOR_AUTH_HEADER",
        "PROSPECTOR_CLIENT_ID",
        "PROSPECTOR_LOGIN_USER",
        "PROSPECTOR_LOGIN_INTERNAL_ID",
    ];

    const OPTIONAL: &[&str] = &[
        "PROSPECTOR_AUTH_BASE_URL",
        "PROSPECTOR_SERVICE_BASE_URL",
        "PROSPECTOR_HTTP_TIMEOUT_SECS",
        "PROSPECTOR_REFRESH_INTERVAL_SECS",
    ];

    fn clear_env() {
        for key in REQUIRED.iter().chain(OPTIONAL) {
            std::env::remove_var(key);
        }
    }

    fn set_required() {
        std::env::set_var("PROSPECTOR_AUTH_HEADER", "Basic xyz");
        std::env::set_var("PROSPECTOR_CLIENT_ID", "client-123");
        std::env::set_var("PROSPECTOR_LOGIN_USER", "SVC_USER");
        std::env::set_var("PROSPECTOR_LOGIN_INTERNAL_ID", "42");
    }

    #[test]
    fn test_load_from_env_required_only_uses_defaults() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required();

        let config = load_from_env().expect("config");
        assert_eq!(config.api.auth_header, "Basic xyz");
        assert_eq!(config.api.client_id, "client-123");
        assert_eq!(config.api.username, "SVC_USER");
        assert_eq!(config.api.internal_id, "42");
        // Defaults survive
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.refresh.interval_seconds, 120);

        clear_env();
    }

    #[test]
    fn test_load_from_env_overrides() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required();
        std::env::set_var("PROSPECTOR_AUTH_BASE_URL", "http://localhost:1");
        std::env::set_var("PROSPECTOR_SERVICE_BASE_URL", "http://localhost:2");
        std::env::set_var("PROSPECTOR_HTTP_TIMEOUT_SECS", "7");
        std::env::set_var("PROSPECTOR_REFRESH_INTERVAL_SECS", "33");

        let config = load_from_env().expect("config");
        assert_eq!(config.api.auth_base_url, "http://localhost:1");
        assert_eq!(config.api.service_base_url, "http://localhost:2");
        assert_eq!(config.api.timeout_secs, 7);
        assert_eq!(config.refresh.interval_seconds, 33);

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let err = load_from_env().expect_err("must fail");
        assert!(matches!(err, ProspectorError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required();
        std::env::set_var("PROSPECTOR_HTTP_TIMEOUT_SECS", "not-a-number");

        let err = load_from_env().expect_err("must fail");
        assert!(matches!(err, ProspectorError::Config(_)), "Should be a Config error");

        clear_env();
    }

    #[test]
    fn test_load_from_file_json() {
        let json_content = r#"{
            "api": {
                "auth_base_url": "http://auth.local",
                "service_base_url": "http://svc.local",
                "auth_header": "Basic abc",
                "client_id": "cid",
                "username": "user",
                "internal_id": "9",
                "timeout_secs": 12
            },
            "refresh": { "interval_seconds": 60 }
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();

        let config = load_from_file(Some(temp_file.path().to_path_buf())).expect("config");
        assert_eq!(config.api.auth_base_url, "http://auth.local");
        assert_eq!(config.api.timeout_secs, 12);
        assert_eq!(config.refresh.interval_seconds, 60);
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/config.json")));
        assert!(result.is_err(), "Should fail when file not found");
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(br#"{ "this is": "not valid json" "#).unwrap();

        let result = load_from_file(Some(temp_file.path().to_path_buf()));
        assert!(result.is_err(), "Should fail with invalid JSON");
    }
}
