//! Normalization of the wide catalog table into narrow per-attribute tables
//!
//! The raw file packs several values into one field ("Ama Qamata, Khosi
//! Ngema") and leaves people/country fields empty when unknown. The steps here
//! fill those gaps with sentinels, split the packed fields into lists and
//! project every attribute into an (id, value) table, exploding the list
//! columns so each element gets its own row.
//!
//! Every function takes its input by reference and returns a new table.

use tracing::{debug, info, instrument};

use crate::config::NormalizeConfig;
use crate::constants::{
    CAST_COLUMN, COUNTRY_COLUMN, COUNTRY_SENTINEL, DIRECTOR_COLUMN, ID_COLUMN, MULTIVALUE_COLUMNS,
    PEOPLE_SENTINEL, REQUIRED_COLUMNS,
};
use crate::error::{CatalogError, Result};
use crate::observability::metrics;
use crate::pipeline::storage::CatalogSnapshot;
use crate::types::{CatalogTable, Cell, NarrowRow, NarrowTable};

/// Replace null cells of `column` with `sentinel`; other cells are kept as they are
pub fn fill_missing(table: &CatalogTable, column: &str, sentinel: &str) -> Result<CatalogTable> {
    let filled = table.column(column)?.iter().filter(|c| c.is_null()).count();
    metrics::normalize::sentinels_filled(column, filled);
    debug!("Filling {} missing '{}' values with {:?}", filled, column, sentinel);

    table.map_column(column, |cell| match cell {
        Cell::Null => Cell::text(sentinel),
        other => other.clone(),
    })
}

/// Turn every text cell of `column` into the ordered list of its `separator`-delimited parts
///
/// A cell without the separator becomes a one-element list. Nulls stay null
/// and cells that are already lists are left alone.
pub fn split_multivalue(table: &CatalogTable, column: &str, separator: &str) -> Result<CatalogTable> {
    if separator.is_empty() {
        return Err(CatalogError::Config(
            "multi-value separator must not be empty".to_string(),
        ));
    }

    table.map_column(column, |cell| match cell {
        Cell::Text(s) => Cell::list(s.split(separator)),
        other => other.clone(),
    })
}

/// Trim leading and trailing whitespace from every element
pub fn strip_whitespace(sequence: &[String]) -> Vec<String> {
    sequence.iter().map(|item| item.trim().to_string()).collect()
}

/// Apply `strip_whitespace` to the list cells of `column` (text cells are trimmed too)
pub fn strip_column(table: &CatalogTable, column: &str) -> Result<CatalogTable> {
    table.map_column(column, |cell| match cell {
        Cell::List(items) => Cell::List(strip_whitespace(items)),
        Cell::Text(s) => Cell::text(s.trim()),
        Cell::Null => Cell::Null,
    })
}

/// Project the table onto (id, `column`), one row per source row
pub fn project(table: &CatalogTable, column: &str) -> Result<NarrowTable> {
    let values = table.column(column)?;
    let rows = table
        .ids()
        .into_iter()
        .zip(values)
        .map(|(id, value)| NarrowRow {
            id: id.to_string(),
            value: value.clone(),
        })
        .collect();

    Ok(NarrowTable::new(column, rows))
}

/// Emit one row per (id, element) for list cells
///
/// Empty lists contribute no rows. Text and null cells pass through as a
/// single row. Ids keep their relative order and elements keep list order.
pub fn explode(narrow: &NarrowTable) -> NarrowTable {
    let mut rows = Vec::with_capacity(narrow.len());

    for row in narrow.rows() {
        match &row.value {
            Cell::List(items) => {
                rows.extend(items.iter().map(|item| NarrowRow {
                    id: row.id.clone(),
                    value: Cell::text(item.as_str()),
                }));
            }
            scalar => rows.push(NarrowRow {
                id: row.id.clone(),
                value: scalar.clone(),
            }),
        }
    }

    NarrowTable::new(narrow.attribute(), rows)
}

/// Run the full normalization and build the catalog snapshot
///
/// Steps, in order:
/// 1. fill `country` with "None" and `director`/`cast` with "no data"
/// 2. split `director`, `cast`, `country` and `listed_in` on the separator
/// 3. trim the elements of the configured columns (`country` by default)
/// 4. project every attribute and explode the multi-valued ones
#[instrument(skip_all, fields(rows = table.len()))]
pub fn normalize(table: &CatalogTable, config: &NormalizeConfig) -> Result<CatalogSnapshot> {
    let mut working = fill_missing(table, COUNTRY_COLUMN, COUNTRY_SENTINEL)?;
    working = fill_missing(&working, DIRECTOR_COLUMN, PEOPLE_SENTINEL)?;
    working = fill_missing(&working, CAST_COLUMN, PEOPLE_SENTINEL)?;

    for column in MULTIVALUE_COLUMNS {
        working = split_multivalue(&working, column, &config.separator)?;
    }
    for column in &config.trim_columns {
        working = strip_column(&working, column)?;
    }

    let mut tables = Vec::with_capacity(REQUIRED_COLUMNS.len() - 1);
    for column in REQUIRED_COLUMNS.iter().filter(|c| **c != ID_COLUMN) {
        let projected = project(&working, column)?;
        let narrow = if MULTIVALUE_COLUMNS.contains(column) {
            explode(&projected)
        } else {
            projected
        };
        metrics::normalize::narrow_rows_emitted(column, narrow.len());
        debug!("Narrow table '{}' has {} rows", column, narrow.len());
        tables.push(narrow);
    }

    let ids = working.ids().into_iter().map(str::to_string).collect();
    let snapshot = CatalogSnapshot::new(ids, tables);

    metrics::normalize::snapshot_built();
    info!(
        "Normalized {} records into {} narrow tables",
        snapshot.len(),
        snapshot.attributes().count()
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CATEGORY_COLUMN;
    use std::collections::BTreeSet;

    fn table(rows: Vec<(&str, Cell)>) -> CatalogTable {
        CatalogTable::new(
            vec![ID_COLUMN.to_string(), COUNTRY_COLUMN.to_string()],
            rows.into_iter()
                .map(|(id, cell)| vec![Cell::text(id), cell])
                .collect(),
        )
        .unwrap()
    }

    fn full_table() -> CatalogTable {
        let columns = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        let row = |fields: [&str; 12]| -> Vec<Cell> { fields.iter().map(|f| Cell::from_field(f)).collect() };
        CatalogTable::new(
            columns,
            vec![
                row([
                    "s1", "Movie", "Sankofa", "Haile Gerima",
                    "Kofi Ghanaba, Oyafunmike Ogunlano", "United States, Ghana, Burkina Faso",
                    "September 24, 2021", "1993", "TV-MA", "125 min",
                    "Dramas, Independent Movies, International Movies", "On a photo shoot",
                ]),
                row([
                    "s2", "TV Show", "Kota Factory", "", "Mayur More", "",
                    "September 24, 2021", "2021", "TV-MA", "2 Seasons",
                    "International TV Shows", "In a city of coaching centers",
                ]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_fill_missing_only_touches_nulls() {
        let source = table(vec![("s1", Cell::Null), ("s2", Cell::text("India"))]);
        let filled = fill_missing(&source, COUNTRY_COLUMN, COUNTRY_SENTINEL).unwrap();

        let column = filled.column(COUNTRY_COLUMN).unwrap();
        assert_eq!(column[0], &Cell::text("None"));
        assert_eq!(column[1], &Cell::text("India"));
        // source untouched
        assert_eq!(source.column(COUNTRY_COLUMN).unwrap()[0], &Cell::Null);
    }

    #[test]
    fn test_fill_missing_is_idempotent() {
        let source = table(vec![("s1", Cell::Null), ("s2", Cell::text("India"))]);
        let once = fill_missing(&source, COUNTRY_COLUMN, COUNTRY_SENTINEL).unwrap();
        let twice = fill_missing(&once, COUNTRY_COLUMN, COUNTRY_SENTINEL).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_split_without_separator_yields_single_element() {
        let source = table(vec![("s1", Cell::text("India")), ("s2", Cell::Null)]);
        let split = split_multivalue(&source, COUNTRY_COLUMN, ",").unwrap();

        let column = split.column(COUNTRY_COLUMN).unwrap();
        assert_eq!(column[0], &Cell::list(["India"]));
        assert_eq!(column[1], &Cell::Null);
    }

    #[test]
    fn test_split_keeps_order_and_whitespace() {
        let source = table(vec![("s1", Cell::text("United States, Ghana,Burkina Faso"))]);
        let split = split_multivalue(&source, COUNTRY_COLUMN, ",").unwrap();

        assert_eq!(
            split.column(COUNTRY_COLUMN).unwrap()[0],
            &Cell::list(["United States", " Ghana", "Burkina Faso"])
        );
    }

    #[test]
    fn test_split_rejects_empty_separator() {
        let source = table(vec![("s1", Cell::text("India"))]);
        assert!(split_multivalue(&source, COUNTRY_COLUMN, "").is_err());
    }

    #[test]
    fn test_strip_whitespace() {
        let stripped = strip_whitespace(&[" USA".to_string(), "France ".to_string()]);
        assert_eq!(stripped, vec!["USA".to_string(), "France".to_string()]);
    }

    #[test]
    fn test_project_carries_lists_whole() {
        let source = table(vec![("s1", Cell::list(["USA", "France"]))]);
        let projected = project(&source, COUNTRY_COLUMN).unwrap();

        assert_eq!(projected.attribute(), COUNTRY_COLUMN);
        assert_eq!(projected.len(), 1);
        assert_eq!(projected.rows()[0].value, Cell::list(["USA", "France"]));
    }

    #[test]
    fn test_explode_row_counts_follow_list_lengths() {
        let narrow = NarrowTable::new(
            COUNTRY_COLUMN,
            vec![
                NarrowRow { id: "s1".to_string(), value: Cell::list(["USA", "France", "Chile"]) },
                NarrowRow { id: "s2".to_string(), value: Cell::List(Vec::new()) },
                NarrowRow { id: "s3".to_string(), value: Cell::list(["India"]) },
                NarrowRow { id: "s4".to_string(), value: Cell::Null },
            ],
        );

        let exploded = explode(&narrow);

        let values: Vec<&Cell> = exploded.values_for("s1");
        assert_eq!(values, vec![&Cell::text("USA"), &Cell::text("France"), &Cell::text("Chile")]);
        assert!(exploded.values_for("s2").is_empty());
        assert_eq!(exploded.values_for("s3"), vec![&Cell::text("India")]);
        assert_eq!(exploded.values_for("s4"), vec![&Cell::Null]);

        let ids: Vec<&str> = exploded.rows().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s1", "s1", "s3", "s4"]);
    }

    #[test]
    fn test_normalize_builds_every_narrow_table() {
        let source = full_table();
        let snapshot = normalize(&source, &NormalizeConfig::default()).unwrap();

        assert_eq!(snapshot.attributes().count(), 11);

        let raw_ids: BTreeSet<&str> = source.ids().into_iter().collect();
        for attribute in snapshot.attributes() {
            let table = snapshot.table(attribute).unwrap();
            let ids: BTreeSet<&str> = table.rows().iter().map(|r| r.id.as_str()).collect();
            assert_eq!(ids, raw_ids, "ids of '{}' differ from the raw table", attribute);
        }
    }

    #[test]
    fn test_normalize_fills_and_trims_countries_only() {
        let snapshot = normalize(&full_table(), &NormalizeConfig::default()).unwrap();

        let countries = snapshot.countries().unwrap();
        assert_eq!(
            countries.values_for("s1"),
            vec![&Cell::text("United States"), &Cell::text("Ghana"), &Cell::text("Burkina Faso")]
        );
        assert_eq!(countries.values_for("s2"), vec![&Cell::text("None")]);

        assert_eq!(
            snapshot.directors().unwrap().values_for("s2"),
            vec![&Cell::text("no data")]
        );

        // categories are split but keep their leading spaces
        assert_eq!(
            snapshot.table(CATEGORY_COLUMN).unwrap().values_for("s1"),
            vec![
                &Cell::text("Dramas"),
                &Cell::text(" Independent Movies"),
                &Cell::text(" International Movies"),
            ]
        );
    }

    #[test]
    fn test_normalize_can_trim_extra_columns() {
        let config = NormalizeConfig {
            trim_columns: vec![COUNTRY_COLUMN.to_string(), CATEGORY_COLUMN.to_string()],
            ..NormalizeConfig::default()
        };
        let snapshot = normalize(&full_table(), &config).unwrap();

        assert_eq!(
            snapshot.categories().unwrap().values_for("s1")[1],
            &Cell::text("Independent Movies")
        );
    }
}
