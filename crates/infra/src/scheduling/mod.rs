//! Background session refresh
//!
//! Interval-based scheduler that re-runs the login cycle so long jobs never
//! work with an expired session.

pub mod error;
pub mod refresh_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use refresh_scheduler::{RefreshScheduler, RefreshSchedulerConfig};
