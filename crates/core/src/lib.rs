//! # Prospector Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits)
//! - The row enrichment pipeline service
//!
//! ## Architecture Principles
//! - Only depends on `prospector-domain`
//! - No HTTP, filesystem, or runtime code
//! - All external dependencies via traits

pub mod pipeline;
pub mod ports;

pub use pipeline::{EnrichmentPipeline, PipelineSummary};
pub use ports::{RecordLookup, RowSink, RowSource, SessionRefresher};
