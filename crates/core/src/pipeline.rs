//! Row enrichment pipeline
//!
//! Runs the dependent lookups for each input row: the prospect lookup gates
//! the negotiation and installation lookups, which are attempted
//! independently of each other. Failures stay on the row they belong to;
//! the pipeline itself only fails on row source/sink errors.

use std::sync::Arc;

use prospector_domain::{InputRow, Result, RowOutcome};
use tracing::{debug, info, warn};

use crate::ports::{RecordLookup, RowSink, RowSource};

/// Row error for a blank tax identifier. Kept verbatim for output
/// compatibility with the original spreadsheet flow.
const MISSING_TAX_ID: &str = "CPF_CNPJ não informado";

/// Counters reported after a pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Rows read from the source
    pub rows: usize,
    /// Rows that finished without any lookup error
    pub enriched: usize,
    /// Rows carrying at least one error message
    pub failed: usize,
}

/// Sequential row enrichment over a [`RecordLookup`]
///
/// Rows are processed one at a time; there is no parallel row processing.
/// The background refresh task is the only concurrent activity during a run.
pub struct EnrichmentPipeline {
    lookup: Arc<dyn RecordLookup>,
}

impl EnrichmentPipeline {
    #[must_use]
    pub fn new(lookup: Arc<dyn RecordLookup>) -> Self {
        Self { lookup }
    }

    /// Drain the source, enrich every row, and hand each result to the sink.
    ///
    /// Always produces a complete output row set: per-row lookup failures are
    /// recorded on the row and processing continues.
    ///
    /// # Errors
    /// Returns an error only when the row source or sink fails.
    pub async fn run(
        &self,
        source: &mut dyn RowSource,
        sink: &mut dyn RowSink,
    ) -> Result<PipelineSummary> {
        let mut summary = PipelineSummary::default();

        while let Some(row) = source.next_row()? {
            let outcome = self.process_row(&row).await;

            summary.rows += 1;
            if outcome.is_clean() {
                summary.enriched += 1;
            } else {
                summary.failed += 1;
                warn!(tax_id = %row.tax_id, errors = %outcome.errors, "row finished with errors");
            }

            sink.write(&row, &outcome)?;
        }

        sink.finish()?;
        info!(
            rows = summary.rows,
            enriched = summary.enriched,
            failed = summary.failed,
            "enrichment run complete"
        );
        Ok(summary)
    }

    /// Enrich a single row.
    ///
    /// Lookup order: prospect code first; when it yields a value, the
    /// negotiation and installation lookups both run regardless of each
    /// other's outcome. Errors accumulate on the row, never abort it.
    async fn process_row(&self, row: &InputRow) -> RowOutcome {
        let mut outcome = RowOutcome::default();

        let tax_id = row.tax_id.trim();
        if tax_id.is_empty() {
            outcome.push_error(MISSING_TAX_ID);
            return outcome;
        }

        debug!(tax_id, "looking up prospect");
        let prospect = self.lookup.find_prospect_code(tax_id).await;
        if prospect.is_err() {
            outcome.push_error(&prospect.error);
        }
        if prospect.value.is_empty() {
            // No prospect: downstream lookups have nothing to key on.
            return outcome;
        }
        outcome.prospect_code = prospect.value.clone();

        let negotiation = self.lookup.find_negotiation_number(&prospect.value).await;
        if negotiation.is_err() {
            outcome.push_error(&negotiation.error);
        } else {
            outcome.negotiation_number = negotiation.value;
        }

        let installations = self.lookup.find_installation_numbers(&prospect.value).await;
        if installations.is_err() {
            outcome.push_error(&installations.error);
        } else {
            outcome.installation_numbers = installations.value;
        }

        outcome
    }
}
