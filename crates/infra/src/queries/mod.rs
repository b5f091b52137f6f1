//! Remote record queries
//!
//! Client for the `loadrecords` service endpoint plus the small helpers that
//! keep its quirks contained: filter expression builders (with literal
//! escaping and numeric validation) and the fieldset abstraction that hides
//! the positional `f0..fN` response keys.

pub mod client;
pub mod fieldset;
pub mod filter;

pub use client::RecordClient;
pub use fieldset::Fieldset;
