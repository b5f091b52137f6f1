//! Row input/output
//!
//! CSV-backed implementations of the row source and sink ports.

pub mod csv;

pub use csv::{CsvRowSink, CsvRowSource};
