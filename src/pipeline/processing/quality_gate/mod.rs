use serde::Serialize;
use tracing::{info, warn};

use crate::constants::{CORRUPT_RATINGS, RATING_COLUMN};
use crate::error::Result;
use crate::observability::metrics;
use crate::types::JoinedTable;

/// Counts of rows removed by the expected data-quality policies
///
/// These are anticipated defects in the source catalog. They are filtered
/// and counted here instead of being raised as errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataQualityReport {
    /// Rows whose rating holds a duration ("66 min", ...)
    pub corrupt_ratings_dropped: usize,
    /// Rows whose `type` is neither "Movie" nor "TV Show"
    pub unresolved_kinds_dropped: usize,
    /// Rows with a null in a tracked column
    pub incomplete_rows_dropped: usize,
}

impl DataQualityReport {
    pub fn total_dropped(&self) -> usize {
        self.corrupt_ratings_dropped + self.unresolved_kinds_dropped + self.incomplete_rows_dropped
    }

    pub fn record_corrupt_ratings(&mut self, count: usize) {
        self.corrupt_ratings_dropped += count;
        metrics::quality_gate::corrupt_ratings_dropped(count);
    }

    pub fn record_unresolved_kinds(&mut self, count: usize) {
        self.unresolved_kinds_dropped += count;
        metrics::quality_gate::unresolved_kinds_dropped(count);
    }

    pub fn record_incomplete_rows(&mut self, count: usize) {
        self.incomplete_rows_dropped += count;
        metrics::quality_gate::incomplete_rows_dropped(count);
    }

    /// Log a one-line summary, escalating to a warning when anything was dropped
    pub fn log_summary(&self) {
        if self.total_dropped() == 0 {
            info!("Quality gate: no rows dropped");
        } else {
            warn!(
                corrupt_ratings = self.corrupt_ratings_dropped,
                unresolved_kinds = self.unresolved_kinds_dropped,
                incomplete_rows = self.incomplete_rows_dropped,
                "Quality gate dropped {} rows",
                self.total_dropped()
            );
        }
    }
}

/// True for the known rating values that are really durations
pub fn is_corrupt_rating(value: &str) -> bool {
    CORRUPT_RATINGS.contains(&value.trim())
}

/// Remove rows whose `rating` cell is a known-corrupt value
///
/// Returns the filtered table and the number of rows removed. Null ratings
/// are not corrupt and are kept.
pub fn exclude_corrupt_ratings(table: &JoinedTable) -> Result<(JoinedTable, usize)> {
    let rating_index = table.column_index(RATING_COLUMN)?;
    let filtered = table.filter(|row| {
        !row.values[rating_index]
            .as_text()
            .map(is_corrupt_rating)
            .unwrap_or(false)
    });
    let dropped = table.len() - filtered.len();
    Ok((filtered, dropped))
}
