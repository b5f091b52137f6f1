//! HTTP client infrastructure
//!
//! Thin wrapper over `reqwest` adding per-request timeout and bounded retry
//! with exponential backoff. All remote calls in this crate go through it.

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
