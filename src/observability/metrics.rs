//! Simple metrics module for the catalog pipeline
//!
//! Metrics are recorded through the `metrics` facade. `init` installs an
//! in-process Prometheus recorder; nothing is served or pushed, the rendered
//! snapshot is only available through `snapshot`.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::fmt;

use crate::error::{CatalogError, Result};

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Ingestion metrics
    IngestionRowsLoaded,
    IngestionLoadErrors,

    // Normalize metrics
    NormalizeSentinelsFilled,
    NormalizeNarrowRowsEmitted,
    NormalizeSnapshotsBuilt,

    // Quality Gate metrics
    QualityGateCorruptRatingsDropped,
    QualityGateUnresolvedKindsDropped,
    QualityGateIncompleteRowsDropped,

    // Aggregate metrics
    AggregateReportsBuilt,
    AggregateFormatErrors,
    AggregateLookups,
}

impl MetricName {
    /// Get the metric name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::IngestionRowsLoaded => "catalog_ingestion_rows_loaded_total",
            MetricName::IngestionLoadErrors => "catalog_ingestion_load_errors_total",

            MetricName::NormalizeSentinelsFilled => "catalog_normalize_sentinels_filled_total",
            MetricName::NormalizeNarrowRowsEmitted => "catalog_normalize_narrow_rows_emitted_total",
            MetricName::NormalizeSnapshotsBuilt => "catalog_normalize_snapshots_built_total",

            MetricName::QualityGateCorruptRatingsDropped => {
                "catalog_quality_gate_corrupt_ratings_dropped_total"
            }
            MetricName::QualityGateUnresolvedKindsDropped => {
                "catalog_quality_gate_unresolved_kinds_dropped_total"
            }
            MetricName::QualityGateIncompleteRowsDropped => {
                "catalog_quality_gate_incomplete_rows_dropped_total"
            }

            MetricName::AggregateReportsBuilt => "catalog_aggregate_reports_built_total",
            MetricName::AggregateFormatErrors => "catalog_aggregate_format_errors_total",
            MetricName::AggregateLookups => "catalog_aggregate_lookups_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Install the in-process recorder. Calling it twice is a no-op.
pub fn init() -> Result<()> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| CatalogError::Config(format!("Failed to install Prometheus recorder: {}", e)))?;

    let _ = METRICS_HANDLE.set(handle);
    Ok(())
}

/// Render everything recorded so far in Prometheus text format
pub fn snapshot() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

pub mod ingestion {
    use super::MetricName;

    pub fn rows_loaded(count: usize) {
        ::metrics::counter!(MetricName::IngestionRowsLoaded.as_str()).increment(count as u64);
    }

    pub fn load_failed(reason: &'static str) {
        ::metrics::counter!(MetricName::IngestionLoadErrors.as_str(), "reason" => reason).increment(1);
    }
}

pub mod normalize {
    use super::MetricName;

    /// Record how many nulls were replaced by a sentinel in a column
    pub fn sentinels_filled(column: &str, count: usize) {
        ::metrics::counter!(
            MetricName::NormalizeSentinelsFilled.as_str(),
            "column" => column.to_string()
        )
        .increment(count as u64);
    }

    pub fn narrow_rows_emitted(attribute: &str, count: usize) {
        ::metrics::counter!(
            MetricName::NormalizeNarrowRowsEmitted.as_str(),
            "attribute" => attribute.to_string()
        )
        .increment(count as u64);
    }

    pub fn snapshot_built() {
        ::metrics::counter!(MetricName::NormalizeSnapshotsBuilt.as_str()).increment(1);
    }
}

pub mod quality_gate {
    use super::MetricName;

    pub fn corrupt_ratings_dropped(count: usize) {
        ::metrics::counter!(MetricName::QualityGateCorruptRatingsDropped.as_str())
            .increment(count as u64);
    }

    pub fn unresolved_kinds_dropped(count: usize) {
        ::metrics::counter!(MetricName::QualityGateUnresolvedKindsDropped.as_str())
            .increment(count as u64);
    }

    pub fn incomplete_rows_dropped(count: usize) {
        ::metrics::counter!(MetricName::QualityGateIncompleteRowsDropped.as_str())
            .increment(count as u64);
    }
}

pub mod aggregate {
    use super::MetricName;

    pub fn report_built() {
        ::metrics::counter!(MetricName::AggregateReportsBuilt.as_str()).increment(1);
    }

    pub fn format_error(column: &str) {
        ::metrics::counter!(
            MetricName::AggregateFormatErrors.as_str(),
            "column" => column.to_string()
        )
        .increment(1);
    }

    pub fn lookup_performed(field: &'static str) {
        ::metrics::counter!(MetricName::AggregateLookups.as_str(), "field" => field).increment(1);
    }
}
