use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{error, info, instrument};

use crate::app::ports::ReportOutputPort;
use crate::config::ReportConfig;
use crate::constants::{CATEGORY_COLUMN, COUNTRY_SENTINEL, RATING_COLUMN};
use crate::error::{CatalogError, Result as CatalogResult};
use crate::observability::metrics;
use crate::pipeline::processing::aggregate::{
    coerce_added_years, coerce_duration_to_minutes_or_seasons, coerce_integers, cross_tab,
    drop_incomplete, histogram, join, partition_by_kind, value_counts, CrossTab, DurationTable,
    Histogram,
};
use crate::pipeline::processing::quality_gate::{is_corrupt_rating, DataQualityReport};
use crate::pipeline::storage::CatalogSnapshot;
use crate::types::Kind;

/// Every aggregate table the presentation layer consumes
#[derive(Debug, Clone, Serialize)]
pub struct CatalogReport {
    pub record_count: usize,
    /// Titles per kind label
    pub kind_counts: BTreeMap<String, usize>,
    /// (id, minutes)
    pub movie_durations: DurationTable,
    pub movie_duration_histogram: Histogram,
    /// (id, seasons)
    pub show_durations: DurationTable,
    pub show_season_counts: BTreeMap<i64, usize>,
    /// (category, rating) -> count
    pub ratings_by_category: CrossTab,
    pub release_year_counts: BTreeMap<i64, usize>,
    pub added_year_counts: BTreeMap<i64, usize>,
    /// Most frequent production countries, largest first
    pub country_counts: Vec<(String, usize)>,
    pub data_quality: DataQualityReport,
    /// Aggregates that hit a malformed value and were left empty
    pub failed_aggregates: Vec<AggregateFailure>,
}

/// A `FormatError` confined to one aggregate of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateFailure {
    pub aggregate: &'static str,
    /// Row that could not be parsed
    pub id: Option<String>,
    pub error: String,
}

/// Keep a format error inside the aggregate that raised it
///
/// The aggregate falls back to its empty value and the failure is recorded.
/// Every other error is returned unchanged.
fn isolate<T: Default>(
    aggregate: &'static str,
    result: CatalogResult<T>,
    failures: &mut Vec<AggregateFailure>,
) -> CatalogResult<T> {
    match result {
        Err(err @ CatalogError::Format { .. }) => {
            error!(aggregate, "Aggregate failed: {}", err);
            let id = match &err {
                CatalogError::Format { id, .. } => id.clone(),
                _ => None,
            };
            failures.push(AggregateFailure {
                aggregate,
                id,
                error: err.to_string(),
            });
            Ok(T::default())
        }
        other => other,
    }
}

/// Use case for computing the catalog report and handing it to the outputs
pub struct ReportUseCase {
    config: ReportConfig,
    outputs: Vec<Box<dyn ReportOutputPort>>,
}

impl ReportUseCase {
    pub fn new(config: ReportConfig, outputs: Vec<Box<dyn ReportOutputPort>>) -> Self {
        Self { config, outputs }
    }

    /// Compute every aggregate from the snapshot
    #[instrument(skip_all, fields(records = snapshot.len()))]
    pub fn build(&self, snapshot: &CatalogSnapshot) -> CatalogResult<CatalogReport> {
        let mut data_quality = DataQualityReport::default();
        let mut failed_aggregates = Vec::new();

        // durations, split by kind
        let types_durations = join(snapshot.types()?, snapshot.durations()?)?;
        let (movies, shows) = partition_by_kind(&types_durations)?;
        data_quality.record_unresolved_kinds(types_durations.len() - movies.len() - shows.len());

        let complete_movies = drop_incomplete(&movies);
        let complete_shows = drop_incomplete(&shows);
        data_quality.record_incomplete_rows(
            (movies.len() - complete_movies.len()) + (shows.len() - complete_shows.len()),
        );

        let movie_durations = isolate(
            "movie_durations",
            coerce_duration_to_minutes_or_seasons(&complete_movies),
            &mut failed_aggregates,
        )?;
        let show_durations = isolate(
            "show_durations",
            coerce_duration_to_minutes_or_seasons(&complete_shows),
            &mut failed_aggregates,
        )?;

        let edges = self.config.duration_bin_edges()?;
        let movie_duration_histogram = histogram(&movie_durations.amounts(), &edges)?;
        let show_season_counts = value_counts(&show_durations.amounts());

        // ratings by category
        let ratings = snapshot.ratings()?;
        data_quality.record_corrupt_ratings(
            ratings
                .rows()
                .iter()
                .filter(|row| row.value.as_text().map(is_corrupt_rating).unwrap_or(false))
                .count(),
        );
        let categories_ratings = join(snapshot.categories()?, ratings)?;
        let ratings_by_category = cross_tab(&categories_ratings, CATEGORY_COLUMN, RATING_COLUMN)?;

        // years
        let release_years: Vec<i64> = isolate(
            "release_year_counts",
            coerce_integers(snapshot.release_years()?),
            &mut failed_aggregates,
        )?
        .into_iter()
        .map(|(_, year)| year)
        .collect();
        let added_years: Vec<i64> = isolate(
            "added_year_counts",
            coerce_added_years(snapshot.dates_added()?),
            &mut failed_aggregates,
        )?
        .into_iter()
        .map(|(_, year)| year)
        .collect();

        let report = CatalogReport {
            record_count: snapshot.len(),
            kind_counts: self.kind_counts(snapshot)?,
            movie_durations,
            movie_duration_histogram,
            show_durations,
            show_season_counts,
            ratings_by_category,
            release_year_counts: value_counts(&release_years),
            added_year_counts: value_counts(&added_years),
            country_counts: self.country_counts(snapshot)?,
            data_quality,
            failed_aggregates,
        };

        metrics::aggregate::report_built();
        report.data_quality.log_summary();
        info!(
            "Report built: {} movies, {} shows, {} categories",
            report.movie_durations.len(),
            report.show_durations.len(),
            report.ratings_by_category.counts.len()
        );
        Ok(report)
    }

    /// Build the report and write it to every output
    pub fn run(&mut self, snapshot: &CatalogSnapshot) -> Result<CatalogReport> {
        let report = self.build(snapshot).context("Failed to build catalog report")?;

        for output in self.outputs.iter_mut() {
            output
                .write_report(&report)
                .with_context(|| format!("Failed to write report to {} output", output.name()))?;
            info!("Report written to {} output", output.name());
        }

        Ok(report)
    }

    fn kind_counts(&self, snapshot: &CatalogSnapshot) -> CatalogResult<BTreeMap<String, usize>> {
        let mut counts = BTreeMap::new();
        for row in snapshot.types()?.rows() {
            if let Some(kind) = row.value.as_text().and_then(Kind::parse) {
                *counts.entry(kind.label().to_string()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    fn country_counts(&self, snapshot: &CatalogSnapshot) -> CatalogResult<Vec<(String, usize)>> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for row in snapshot.countries()?.rows() {
            match row.value.as_text() {
                Some(country) if !country.is_empty() && country != COUNTRY_SENTINEL => {
                    *counts.entry(country).or_insert(0) += 1;
                }
                _ => {}
            }
        }

        let mut ranked: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(country, count)| (country.to_string(), count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(self.config.top_countries);
        Ok(ranked)
    }
}
