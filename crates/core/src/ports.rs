//! Infrastructure ports
//!
//! Traits implemented by the infra crate and by test doubles. The pipeline
//! and scheduler only ever see these interfaces.

use async_trait::async_trait;
use prospector_domain::{InputRow, QueryResult, Result, RowOutcome};

/// Remote record lookups, one per dependent query
///
/// Every operation returns a [`QueryResult`] and never an `Err`: transport
/// failures, parse failures, and empty result sets are all captured as a
/// descriptive message in `QueryResult::error`.
#[async_trait]
pub trait RecordLookup: Send + Sync {
    /// Look up a party record by tax identifier (CPF/CNPJ) and return its
    /// prospect code.
    async fn find_prospect_code(&self, tax_id: &str) -> QueryResult;

    /// Look up the service-order record for a prospect and return its
    /// negotiation number. Uses the first record when the API returns a
    /// collection.
    async fn find_negotiation_number(&self, prospect_code: &str) -> QueryResult;

    /// Look up all installation records for a prospect and return their
    /// numbers joined with `;` in response order.
    async fn find_installation_numbers(&self, prospect_code: &str) -> QueryResult;
}

/// Renews the shared session credentials
///
/// Implemented by the credential manager (authenticate + login); the refresh
/// scheduler drives it in the background.
#[async_trait]
pub trait SessionRefresher: Send + Sync {
    /// Run one full login cycle and publish the resulting session.
    async fn refresh(&self) -> Result<()>;
}

/// Ordered source of input rows
pub trait RowSource: Send {
    /// Column names of the input, in order.
    fn headers(&self) -> &[String];

    /// Next row, or `None` when exhausted.
    ///
    /// # Errors
    /// Returns `ProspectorError::Io` when the underlying reader fails.
    fn next_row(&mut self) -> Result<Option<InputRow>>;
}

/// Sink accepting each input row together with its enrichment outcome
pub trait RowSink: Send {
    /// Write one row with its outcome columns appended.
    ///
    /// # Errors
    /// Returns `ProspectorError::Io` when the underlying writer fails.
    fn write(&mut self, row: &InputRow, outcome: &RowOutcome) -> Result<()>;

    /// Flush any buffered output. Called once after the last row.
    ///
    /// # Errors
    /// Returns `ProspectorError::Io` when the flush fails.
    fn finish(&mut self) -> Result<()>;
}
