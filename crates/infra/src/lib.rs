//! # Prospector Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - HTTP client wrapper (timeout, retry, backoff)
//! - Credential manager and shared session store
//! - Background session refresh scheduler
//! - Remote record query client (loadRecords)
//! - Environment configuration loader
//! - CSV row source/sink
//!
//! ## Architecture
//! - Implements traits defined in `prospector-core`
//! - Contains all "impure" code (network, filesystem)

pub mod auth;
pub mod config;
pub mod http;
pub mod io;
pub mod queries;
pub mod scheduling;

// Re-export commonly used items
pub use auth::{AuthError, CredentialManager, SessionStore};
pub use http::HttpClient;
pub use io::{CsvRowSink, CsvRowSource};
pub use queries::RecordClient;
pub use scheduling::{RefreshScheduler, RefreshSchedulerConfig, SchedulerError};
