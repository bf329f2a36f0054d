// crates/archmap-core/src/core/time.rs
// ============================================================================
// Module: Archmap Time Model
// Description: Canonical timestamp representation for spans and read surfaces.
// Purpose: Provide deterministic, replayable time values across Archmap records.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Archmap uses explicit time values embedded in spans to keep analysis
//! deterministic. The core engine never reads wall-clock time directly; hosts
//! supply timestamps on the ingest path and when stamping read documents.
//! Timestamps are unix-epoch milliseconds on the wire and render as RFC 3339
//! UTC on the read surface.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Canonical timestamp used in span records and read documents.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads wall-clock time.
/// - Millisecond resolution; monotonicity is a caller responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix-epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix-epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Returns the signed millisecond difference `self - other`.
    #[must_use]
    pub const fn millis_since(self, other: Self) -> i64 {
        self.0 - other.0
    }

    /// Renders the timestamp as an RFC 3339 UTC string.
    ///
    /// Values outside the representable datetime range render as the raw
    /// millisecond count, which keeps the read surface total.
    #[must_use]
    pub fn to_rfc3339(self) -> String {
        let nanos = i128::from(self.0) * 1_000_000;
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .ok()
            .and_then(|datetime| datetime.format(&Rfc3339).ok())
            .unwrap_or_else(|| self.0.to_string())
    }
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Self(value)
    }
}
