//! Credential acquisition and refresh
//!
//! The login sequence has two steps with a strict order:
//! 1. `authenticate` — OAuth client-credentials grant against the token
//!    server, yielding a bearer token and its lifetime.
//! 2. `login` — service login with that token, yielding a `JSESSIONID`
//!    session cookie.
//!
//! The token from step 1 is held privately until step 2 succeeds; only then
//! is a complete [`SessionSnapshot`] published to the store. A failed login
//! therefore leaves the previously published snapshot untouched.

use async_trait::async_trait;
use prospector_core::SessionRefresher;
use prospector_domain::{ApiConfig, ProspectorError, SessionSnapshot};
use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::auth::session::SessionStore;
use crate::http::HttpClient;

const SESSION_COOKIE: &str = "JSESSIONID";
const LOGIN_SERVICE: &str = "MobileLoginSP.login";

/// Authentication failures
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token endpoint rejected the request: {0}")]
    TokenEndpoint(String),

    #[error("token endpoint response did not contain an access token")]
    MissingToken,

    #[error("service login failed: {0}")]
    LoginFailed(String),

    #[error("login response did not set a {SESSION_COOKIE} cookie")]
    MissingSession,

    #[error("login requires a prior successful authenticate call")]
    NotAuthenticated,
}

impl From<AuthError> for ProspectorError {
    fn from(err: AuthError) -> Self {
        ProspectorError::Auth(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: i64,
}

#[derive(Debug, Serialize)]
struct LoginRequest {
    #[serde(rename = "serviceName")]
    service_name: &'static str,
    #[serde(rename = "requestBody")]
    request_body: LoginBody,
}

#[derive(Debug, Serialize)]
struct LoginBody {
    #[serde(rename = "NOMUSU")]
    username: WrappedValue,
    #[serde(rename = "INTERNO")]
    internal_id: WrappedValue,
    #[serde(rename = "KEEPCONNECTED")]
    keep_connected: WrappedValue,
}

/// The service wraps every scalar as `{"$": value}`.
#[derive(Debug, Serialize)]
struct WrappedValue {
    #[serde(rename = "$")]
    value: String,
}

impl WrappedValue {
    fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}

/// Token awaiting a successful service login
#[derive(Debug, Clone)]
struct PendingToken {
    access_token: String,
    expires_in: i64,
}

/// Performs the two-step login sequence and publishes session snapshots
///
/// The manager is the only writer of its [`SessionStore`]; clone the store
/// (not the manager) to hand read access to other components.
pub struct CredentialManager {
    http: HttpClient,
    config: ApiConfig,
    store: SessionStore,
    pending: Mutex<Option<PendingToken>>,
}

impl CredentialManager {
    #[must_use]
    pub fn new(http: HttpClient, config: ApiConfig, store: SessionStore) -> Self {
        Self { http, config, store, pending: Mutex::new(None) }
    }

    /// Read access to the session store this manager publishes into.
    #[must_use]
    pub fn store(&self) -> SessionStore {
        self.store.clone()
    }

    /// Obtain a bearer token from the OAuth token server.
    ///
    /// The token is held internally until [`login`](Self::login) completes;
    /// nothing is published to the store here.
    ///
    /// # Errors
    /// Returns `ProspectorError::Auth` when the endpoint rejects the request
    /// or omits the access token, `ProspectorError::Network` on transport
    /// failure.
    pub async fn authenticate(&self) -> Result<(), ProspectorError> {
        let url = format!("{}/oauth/access-token", self.config.auth_base_url);
        debug!(%url, "requesting access token");

        let request = self
            .http
            .request(Method::POST, &url)
            .header("Authorization", &self.config.auth_header)
            .json(&serde_json::json!({ "grant_type": "client_credentials" }));

        let response = self.http.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenEndpoint(format!("status {status}: {body}")).into());
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| AuthError::TokenEndpoint(format!("invalid JSON body: {err}")))?;

        let access_token = token.access_token.ok_or(AuthError::MissingToken)?;
        info!(expires_in = token.expires_in, "access token acquired");

        *self.pending.lock().await =
            Some(PendingToken { access_token, expires_in: token.expires_in });
        Ok(())
    }

    /// Log into the record service with the pending token and publish the
    /// resulting snapshot.
    ///
    /// Returns the raw login response body for callers that want to inspect
    /// service-specific fields.
    ///
    /// # Errors
    /// Returns `ProspectorError::Auth` when no token is pending, the service
    /// rejects the login, or no session cookie is issued.
    pub async fn login(&self) -> Result<serde_json::Value, ProspectorError> {
        let pending = self
            .pending
            .lock()
            .await
            .clone()
            .ok_or(AuthError::NotAuthenticated)?;

        let url = format!("{}/v1/login?outputType=json", self.config.service_base_url);
        debug!(%url, "logging into record service");

        let body = LoginRequest {
            service_name: LOGIN_SERVICE,
            request_body: LoginBody {
                username: WrappedValue::new(&self.config.username),
                internal_id: WrappedValue::new(&self.config.internal_id),
                keep_connected: WrappedValue::new("S"),
            },
        };

        let request = self
            .http
            .request(Method::POST, &url)
            .header("Authorization", format!("Bearer {}", pending.access_token))
            .header("access_token", &pending.access_token)
            .header("client_id", &self.config.client_id)
            .json(&body);

        let response = self.http.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::LoginFailed(format!("status {status}: {body}")).into());
        }

        let session_id =
            extract_session_cookie(response.headers()).ok_or(AuthError::MissingSession)?;
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|err| AuthError::LoginFailed(format!("invalid JSON body: {err}")))?;

        let snapshot =
            SessionSnapshot::new(pending.access_token, pending.expires_in, session_id);
        self.store.publish(snapshot).await;
        *self.pending.lock().await = None;
        info!("session established");

        Ok(payload)
    }
}

#[async_trait]
impl SessionRefresher for CredentialManager {
    /// Run the full authenticate + login cycle.
    async fn refresh(&self) -> prospector_domain::Result<()> {
        self.authenticate().await?;
        self.login().await?;
        Ok(())
    }
}

/// Pull the session id out of the response's `Set-Cookie` headers.
fn extract_session_cookie(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(SET_COOKIE) {
        let Ok(raw) = header.to_str() else { continue };
        let first_segment = raw.split(';').next().unwrap_or_default();
        if let Some((name, value)) = first_segment.split_once('=') {
            if name.trim() == SESSION_COOKIE && !value.trim().is_empty() {
                return Some(value.trim().to_string());
            }
        }
    }
    None
}
