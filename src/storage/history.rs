//! Scan history records.

use serde::{Deserialize, Serialize};

/// One past scan result.
///
/// Rows are written by the scanner UI; this crate only reads them and
/// retrofits `id` and `format` onto rows from older schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Unique, never reused identity assigned in insertion order.
    pub id: i64,
    /// Scanned payload.
    pub value: Option<String>,
    /// Creation time as stored by the producer.
    pub timestamp: Option<String>,
    /// Payload encoding tag. Empty for rows predating the column.
    pub format: Option<String>,
}

impl HistoryRecord {
    /// Returns the format tag, treating a missing one as empty.
    #[must_use]
    pub fn format_or_empty(&self) -> &str {
        self.format.as_deref().unwrap_or_default()
    }
}
