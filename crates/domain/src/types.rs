//! Core data types shared across the workspace
//!
//! A `SessionSnapshot` is the unit of credential state: it is built in one
//! piece from a successful authenticate+login cycle and published atomically,
//! so readers never observe a bearer token from one cycle paired with a
//! session id from another.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credentials from one completed login cycle
///
/// Immutable once built. The token and session id always belong to the same
/// cycle; partial states (token without session) never leave the credential
/// manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// OAuth bearer token authorizing API calls
    pub access_token: String,

    /// Absolute expiration timestamp (UTC), computed from `expires_in` at
    /// token acquisition time
    pub expires_at: DateTime<Utc>,

    /// Server-issued session identifier (JSESSIONID cookie value)
    pub session_id: String,
}

impl SessionSnapshot {
    /// Create a snapshot with `expires_at` calculated from a token lifetime
    /// in seconds.
    #[must_use]
    pub fn new(access_token: String, expires_in: i64, session_id: String) -> Self {
        Self {
            access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in),
            session_id,
        }
    }

    /// Check whether the token is expired or will expire within the given
    /// threshold.
    #[must_use]
    pub fn is_expired(&self, threshold_seconds: i64) -> bool {
        Utc::now() + chrono::Duration::seconds(threshold_seconds) >= self.expires_at
    }

    /// Seconds until the token expires (negative once past expiry).
    #[must_use]
    pub fn seconds_until_expiry(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds()
    }
}

/// Outcome of a single remote lookup
///
/// Exactly one of `value`/`error` is meaningful: a non-empty `value` is a
/// successful lookup, a non-empty `error` is a captured failure. Both empty
/// means "nothing found, no failure". Lookups report through this type
/// instead of raising; transport faults never cross the query boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub value: String,
    pub error: String,
}

impl QueryResult {
    /// Successful lookup.
    #[must_use]
    pub fn ok(value: impl Into<String>) -> Self {
        Self { value: value.into(), error: String::new() }
    }

    /// Captured failure with a descriptive message.
    #[must_use]
    pub fn err(message: impl Into<String>) -> Self {
        Self { value: String::new(), error: message.into() }
    }

    /// True when the lookup failed.
    #[must_use]
    pub fn is_err(&self) -> bool {
        !self.error.is_empty()
    }
}

/// Enriched output for one input row
///
/// Errors accumulate append-only: a row can carry up to three messages (tax
/// id check, prospect lookup, and the two downstream lookups), joined with
/// `"; "`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowOutcome {
    pub prospect_code: String,
    pub negotiation_number: String,
    /// `;`-joined installation numbers in response order
    pub installation_numbers: String,
    pub errors: String,
}

impl RowOutcome {
    /// Append an error message, never replacing earlier ones.
    pub fn push_error(&mut self, message: &str) {
        if !self.errors.is_empty() {
            self.errors.push_str("; ");
        }
        self.errors.push_str(message);
    }

    /// True when no lookup on this row failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// One row from the row source
///
/// `fields` is the full original record in column order; `tax_id` is the
/// extracted CPF/CNPJ value. Original columns pass through to the sink
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputRow {
    pub tax_id: String,
    pub fields: Vec<String>,
}
