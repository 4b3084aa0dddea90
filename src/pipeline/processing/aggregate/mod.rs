//! Joins, type-specific cleaning and grouped counts over the narrow tables
//!
//! Nothing here keeps state: each function reads immutable tables and returns
//! a fresh result. Anticipated defects (corrupt ratings, unknown kinds, nulls)
//! are filtered by documented policies; unanticipated ones (a duration that is
//! not a number, an empty join side) are returned as errors.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use crate::constants::{DATE_ADDED_FORMAT, DURATION_COLUMN, RATING_COLUMN, TYPE_COLUMN};
use crate::error::{CatalogError, Result};
use crate::observability::metrics;
use crate::pipeline::processing::quality_gate::exclude_corrupt_ratings;
use crate::types::{JoinedRow, JoinedTable, Kind, NarrowTable};

/// Inner join of two narrow tables on id
///
/// Rows are emitted in left-table order; an id with several matches on the
/// right (an exploded table) yields one row per match, in right-table order.
pub fn join(left: &NarrowTable, right: &NarrowTable) -> Result<JoinedTable> {
    if left.is_empty() || right.is_empty() {
        return Err(CatalogError::Join(format!(
            "cannot join '{}' ({} rows) with '{}' ({} rows): empty side",
            left.attribute(),
            left.len(),
            right.attribute(),
            right.len()
        )));
    }

    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (position, row) in right.rows().iter().enumerate() {
        index.entry(row.id.as_str()).or_default().push(position);
    }

    let mut rows = Vec::new();
    for left_row in left.rows() {
        if let Some(matches) = index.get(left_row.id.as_str()) {
            for &position in matches {
                rows.push(JoinedRow {
                    id: left_row.id.clone(),
                    values: vec![left_row.value.clone(), right.rows()[position].value.clone()],
                });
            }
        }
    }

    let right_name = if right.attribute() == left.attribute() {
        format!("{}_right", right.attribute())
    } else {
        right.attribute().to_string()
    };

    Ok(JoinedTable::new(
        vec![left.attribute().to_string(), right_name],
        rows,
    ))
}

/// Split "90 min" into (90, "min") on the first whitespace boundary
///
/// The amount must be an integer. The unit is kept as written and may be
/// empty ("90" parses as (90, "")).
pub fn parse_duration(raw: &str) -> Result<(i64, String)> {
    let trimmed = raw.trim();
    let (amount, unit) = match trimmed.split_once(char::is_whitespace) {
        Some((amount, unit)) => (amount, unit.trim_start()),
        None => (trimmed, ""),
    };

    let amount = amount.parse::<i64>().map_err(|e| {
        CatalogError::format(None, DURATION_COLUMN, raw, format!("amount is not an integer: {}", e))
    })?;

    Ok((amount, unit.to_string()))
}

/// Split a (type, duration) join into its movie and TV show rows
///
/// Rows whose kind is neither label are dropped from both halves. That drop
/// is policy, not an error; callers can count it as
/// `input.len() - movies.len() - shows.len()`.
pub fn partition_by_kind(table: &JoinedTable) -> Result<(JoinedTable, JoinedTable)> {
    let kind_index = table.column_index(TYPE_COLUMN)?;
    let kind_of = |row: &JoinedRow| row.values[kind_index].as_text().and_then(Kind::parse);

    let movies = table.filter(|row| kind_of(row) == Some(Kind::Movie));
    let shows = table.filter(|row| kind_of(row) == Some(Kind::TvShow));

    let unresolved = table.len() - movies.len() - shows.len();
    if unresolved > 0 {
        debug!("Dropped {} rows with an unresolvable kind", unresolved);
    }

    Ok((movies, shows))
}

/// Remove rows holding a null in any column
pub fn drop_incomplete(table: &JoinedTable) -> JoinedTable {
    table.filter(|row| row.values.iter().all(|cell| !cell.is_null()))
}

/// One (id, amount) row of a duration table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DurationRow {
    pub id: String,
    pub amount: i64,
}

/// Integer durations keyed by id; minutes for movies, seasons for shows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DurationTable {
    pub rows: Vec<DurationRow>,
}

impl DurationTable {
    pub fn amounts(&self) -> Vec<i64> {
        self.rows.iter().map(|r| r.amount).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Keep only the integer amount of every duration
///
/// Expects nulls to be gone already (`drop_incomplete`). Any duration that
/// does not parse fails the whole conversion with an error naming the row.
pub fn coerce_duration_to_minutes_or_seasons(table: &JoinedTable) -> Result<DurationTable> {
    let duration_index = table.column_index(DURATION_COLUMN)?;
    let mut rows = Vec::with_capacity(table.len());

    for row in table.rows() {
        let cell = &row.values[duration_index];
        let raw = cell.as_text().ok_or_else(|| {
            metrics::aggregate::format_error(DURATION_COLUMN);
            CatalogError::format(Some(&row.id), DURATION_COLUMN, &cell.to_string(), "expected a single text value")
        })?;

        let (amount, _unit) = parse_duration(raw).map_err(|_| {
            metrics::aggregate::format_error(DURATION_COLUMN);
            CatalogError::format(Some(&row.id), DURATION_COLUMN, raw, "amount is not an integer")
        })?;

        rows.push(DurationRow {
            id: row.id.clone(),
            amount,
        });
    }

    Ok(DurationTable { rows })
}

/// Coerce a scalar narrow table to integers, skipping nulls
pub fn coerce_integers(narrow: &NarrowTable) -> Result<Vec<(String, i64)>> {
    let mut values = Vec::with_capacity(narrow.len());

    for row in narrow.rows() {
        if row.value.is_null() {
            continue;
        }
        let raw = row.value.to_string();
        let parsed = row
            .value
            .as_text()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .ok_or_else(|| {
                metrics::aggregate::format_error(narrow.attribute());
                CatalogError::format(Some(&row.id), narrow.attribute(), &raw, "not an integer")
            })?;
        values.push((row.id.clone(), parsed));
    }

    Ok(values)
}

/// Year of every `date_added` value ("September 9, 2019"), skipping nulls
pub fn coerce_added_years(narrow: &NarrowTable) -> Result<Vec<(String, i64)>> {
    let mut values = Vec::with_capacity(narrow.len());

    for row in narrow.rows() {
        if row.value.is_null() {
            continue;
        }
        let raw = row.value.to_string();
        let date = row
            .value
            .as_text()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_ADDED_FORMAT).ok())
            .ok_or_else(|| {
                metrics::aggregate::format_error(narrow.attribute());
                CatalogError::format(Some(&row.id), narrow.attribute(), &raw, "not a \"Month day, year\" date")
            })?;
        values.push((row.id.clone(), i64::from(date.year())));
    }

    Ok(values)
}

/// Counts over half-open bins `[edges[i], edges[i + 1])`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Histogram {
    pub edges: Vec<i64>,
    pub counts: Vec<usize>,
    /// Values below the first edge or at/above the last edge
    pub out_of_range: usize,
}

/// One bin of a histogram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bin {
    pub lower: i64,
    pub upper: i64,
    pub count: usize,
}

impl Histogram {
    pub fn bins(&self) -> impl Iterator<Item = Bin> + '_ {
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(pair, &count)| Bin {
                lower: pair[0],
                upper: pair[1],
                count,
            })
    }

    /// Count of the bin starting at `lower`
    pub fn count_at(&self, lower: i64) -> Option<usize> {
        self.bins().find(|b| b.lower == lower).map(|b| b.count)
    }

    pub fn total_binned(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Bin `values` over strictly increasing `edges`
///
/// Values outside `[first edge, last edge)` are excluded from every bin and
/// counted in `out_of_range`; nothing is clamped into the end bins.
pub fn histogram(values: &[i64], edges: &[i64]) -> Result<Histogram> {
    if edges.len() < 2 || edges.windows(2).any(|w| w[0] >= w[1]) {
        return Err(CatalogError::Config(format!(
            "histogram edges must be at least two strictly increasing values, got {:?}",
            edges
        )));
    }

    let mut counts = vec![0usize; edges.len() - 1];
    let mut out_of_range = 0;
    let (first, last) = (edges[0], edges[edges.len() - 1]);

    for &value in values {
        if value < first || value >= last {
            out_of_range += 1;
            continue;
        }
        let bin = edges.partition_point(|&edge| edge <= value) - 1;
        counts[bin] += 1;
    }

    Ok(Histogram {
        edges: edges.to_vec(),
        counts,
        out_of_range,
    })
}

/// One bucket per distinct value, ascending
pub fn value_counts(values: &[i64]) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
}

/// Count matrix indexed by two categorical keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrossTab {
    pub row_key: String,
    pub col_key: String,
    /// row value -> column value -> count
    pub counts: BTreeMap<String, BTreeMap<String, usize>>,
    /// Rows removed before grouping because their rating was corrupt
    pub excluded_corrupt: usize,
}

impl CrossTab {
    pub fn get(&self, row: &str, col: &str) -> usize {
        self.counts
            .get(row)
            .and_then(|cols| cols.get(col))
            .copied()
            .unwrap_or(0)
    }

    pub fn row_keys(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn col_keys(&self) -> BTreeSet<&str> {
        self.counts
            .values()
            .flat_map(|cols| cols.keys().map(String::as_str))
            .collect()
    }

    pub fn total(&self) -> usize {
        self.counts.values().flat_map(|cols| cols.values()).sum()
    }

    /// Sum of each row, largest first (ties by key)
    pub fn row_totals(&self) -> Vec<(&str, usize)> {
        let mut totals: Vec<(&str, usize)> = self
            .counts
            .iter()
            .map(|(row, cols)| (row.as_str(), cols.values().sum()))
            .collect();
        totals.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        totals
    }
}

/// Group rows by (`row_key`, `col_key`) and count them
///
/// When the table carries a `rating` column, rows with a corrupt rating are
/// removed first, before any grouping. Rows with a null in either key are
/// not counted.
pub fn cross_tab(table: &JoinedTable, row_key: &str, col_key: &str) -> Result<CrossTab> {
    let row_index = table.column_index(row_key)?;
    let col_index = table.column_index(col_key)?;

    let (table, excluded_corrupt) = if table.column_index(RATING_COLUMN).is_ok() {
        exclude_corrupt_ratings(table)?
    } else {
        (table.clone(), 0)
    };

    let mut counts: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    for row in table.rows() {
        let (Some(row_value), Some(col_value)) =
            (row.values[row_index].as_key(), row.values[col_index].as_key())
        else {
            continue;
        };
        *counts
            .entry(row_value)
            .or_default()
            .entry(col_value)
            .or_insert(0) += 1;
    }

    Ok(CrossTab {
        row_key: row_key.to_string(),
        col_key: col_key.to_string(),
        counts,
        excluded_corrupt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CATEGORY_COLUMN;
    use crate::types::{Cell, NarrowRow};

    fn narrow(attribute: &str, rows: Vec<(&str, Cell)>) -> NarrowTable {
        NarrowTable::new(
            attribute,
            rows.into_iter()
                .map(|(id, value)| NarrowRow { id: id.to_string(), value })
                .collect(),
        )
    }

    fn duration_edges() -> Vec<i64> {
        (0..200).step_by(10).collect()
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("90 min").unwrap(), (90, "min".to_string()));
        assert_eq!(parse_duration("3 Seasons").unwrap(), (3, "Seasons".to_string()));
        assert_eq!(parse_duration("1 Season").unwrap(), (1, "Season".to_string()));
        assert_eq!(parse_duration("45").unwrap(), (45, String::new()));
    }

    #[test]
    fn test_parse_duration_rejects_non_integer() {
        assert!(matches!(
            parse_duration("abc min"),
            Err(CatalogError::Format { .. })
        ));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("1.5 min").is_err());
    }

    #[test]
    fn test_join_duplicates_rows_for_exploded_side() {
        let ratings = narrow(RATING_COLUMN, vec![("s1", Cell::text("PG")), ("s2", Cell::text("R"))]);
        let categories = narrow(
            CATEGORY_COLUMN,
            vec![
                ("s1", Cell::text("Dramas")),
                ("s1", Cell::text("Comedies")),
                ("s3", Cell::text("Horror Movies")),
            ],
        );

        let joined = join(&categories, &ratings).unwrap();

        assert_eq!(joined.columns(), &[CATEGORY_COLUMN.to_string(), RATING_COLUMN.to_string()]);
        assert_eq!(joined.len(), 2);
        assert!(joined.rows().iter().all(|r| r.id == "s1"));
        assert_eq!(joined.rows()[1].values, vec![Cell::text("Comedies"), Cell::text("PG")]);
    }

    #[test]
    fn test_join_empty_side_is_error() {
        let ratings = narrow(RATING_COLUMN, vec![("s1", Cell::text("PG"))]);
        let empty = narrow(CATEGORY_COLUMN, vec![]);
        assert!(matches!(join(&ratings, &empty), Err(CatalogError::Join(_))));
        assert!(matches!(join(&empty, &ratings), Err(CatalogError::Join(_))));
    }

    #[test]
    fn test_partition_drops_unknown_kinds() {
        let types = narrow(
            TYPE_COLUMN,
            vec![
                ("s1", Cell::text("Movie")),
                ("s2", Cell::text("TV Show")),
                ("s3", Cell::text("Documentary")),
                ("s4", Cell::Null),
            ],
        );
        let durations = narrow(
            DURATION_COLUMN,
            vec![
                ("s1", Cell::text("90 min")),
                ("s2", Cell::text("2 Seasons")),
                ("s3", Cell::text("n/a")),
                ("s4", Cell::text("10 min")),
            ],
        );

        let joined = join(&types, &durations).unwrap();
        let (movies, shows) = partition_by_kind(&joined).unwrap();

        assert_eq!(movies.len(), 1);
        assert_eq!(movies.rows()[0].id, "s1");
        assert_eq!(shows.len(), 1);
        assert_eq!(shows.rows()[0].id, "s2");
    }

    #[test]
    fn test_drop_incomplete_then_coerce() {
        let types = narrow(
            TYPE_COLUMN,
            vec![("s1", Cell::text("Movie")), ("s2", Cell::text("Movie"))],
        );
        let durations = narrow(DURATION_COLUMN, vec![("s1", Cell::text("125 min")), ("s2", Cell::Null)]);

        let joined = join(&types, &durations).unwrap();
        let complete = drop_incomplete(&joined);
        assert_eq!(complete.len(), 1);

        let minutes = coerce_duration_to_minutes_or_seasons(&complete).unwrap();
        assert_eq!(minutes.rows, vec![DurationRow { id: "s1".to_string(), amount: 125 }]);
    }

    #[test]
    fn test_coerce_error_names_the_row() {
        let types = narrow(TYPE_COLUMN, vec![("s7", Cell::text("Movie"))]);
        let durations = narrow(DURATION_COLUMN, vec![("s7", Cell::text("abc min"))]);
        let joined = join(&types, &durations).unwrap();

        match coerce_duration_to_minutes_or_seasons(&joined) {
            Err(CatalogError::Format { id, value, .. }) => {
                assert_eq!(id.as_deref(), Some("s7"));
                assert_eq!(value, "abc min");
            }
            other => panic!("expected a format error, got {:?}", other),
        }
    }

    #[test]
    fn test_histogram_excludes_out_of_range() {
        let hist = histogram(&[5, 15, 25, 195], &duration_edges()).unwrap();

        assert_eq!(hist.counts.len(), 19);
        assert_eq!(hist.count_at(0), Some(1));
        assert_eq!(hist.count_at(10), Some(1));
        assert_eq!(hist.count_at(20), Some(1));
        assert_eq!(hist.count_at(180), Some(0));
        assert_eq!(hist.count_at(190), None);
        assert_eq!(hist.total_binned(), 3);
        assert_eq!(hist.out_of_range, 1);
    }

    #[test]
    fn test_histogram_edges_are_half_open() {
        let hist = histogram(&[0, 10, 189, 190, -1], &duration_edges()).unwrap();
        assert_eq!(hist.count_at(0), Some(1));
        assert_eq!(hist.count_at(10), Some(1));
        assert_eq!(hist.count_at(180), Some(1));
        assert_eq!(hist.out_of_range, 2);
    }

    #[test]
    fn test_histogram_rejects_bad_edges() {
        assert!(histogram(&[1], &[10]).is_err());
        assert!(histogram(&[1], &[0, 10, 10]).is_err());
    }

    #[test]
    fn test_value_counts_sorted_ascending() {
        let counts = value_counts(&[2021, 2019, 2021, 1993]);
        let pairs: Vec<(i64, usize)> = counts.into_iter().collect();
        assert_eq!(pairs, vec![(1993, 1), (2019, 1), (2021, 2)]);
    }

    #[test]
    fn test_cross_tab_excludes_corrupt_ratings_before_grouping() {
        let categories = narrow(
            CATEGORY_COLUMN,
            vec![
                ("s1", Cell::text("Dramas")),
                ("s2", Cell::text("Dramas")),
                ("s3", Cell::text("Comedies")),
                ("s4", Cell::text("Dramas")),
            ],
        );
        let ratings = narrow(
            RATING_COLUMN,
            vec![
                ("s1", Cell::text("TV-MA")),
                ("s2", Cell::text("66 min")),
                ("s3", Cell::text("PG")),
                ("s4", Cell::Null),
            ],
        );

        let joined = join(&categories, &ratings).unwrap();
        let tab = cross_tab(&joined, CATEGORY_COLUMN, RATING_COLUMN).unwrap();

        assert_eq!(tab.excluded_corrupt, 1);
        assert!(!tab.col_keys().contains("66 min"));
        assert_eq!(tab.get("Dramas", "TV-MA"), 1);
        assert_eq!(tab.get("Comedies", "PG"), 1);
        assert_eq!(tab.total(), 2);
        assert_eq!(tab.row_totals(), vec![("Comedies", 1), ("Dramas", 1)]);
    }

    #[test]
    fn test_coerce_integers_and_added_years() {
        let years = narrow(
            "release_year",
            vec![("s1", Cell::text("2020")), ("s2", Cell::Null)],
        );
        assert_eq!(coerce_integers(&years).unwrap(), vec![("s1".to_string(), 2020)]);

        let bad = narrow("release_year", vec![("s9", Cell::text("20x0"))]);
        assert!(matches!(coerce_integers(&bad), Err(CatalogError::Format { .. })));

        let added = narrow(
            "date_added",
            vec![("s1", Cell::text(" September 9, 2019")), ("s2", Cell::Null)],
        );
        assert_eq!(coerce_added_years(&added).unwrap(), vec![("s1".to_string(), 2019)]);
    }
}
