use std::collections::BTreeMap;

use crate::constants::{
    CATEGORY_COLUMN, COUNTRY_COLUMN, DATE_ADDED_COLUMN, DIRECTOR_COLUMN, DURATION_COLUMN,
    RATING_COLUMN, RELEASE_YEAR_COLUMN, TITLE_COLUMN, TYPE_COLUMN,
};
use crate::error::{CatalogError, Result};
use crate::types::NarrowTable;

/// Immutable in-memory snapshot of the normalized catalog
///
/// Holds the record ids in source order plus one narrow table per attribute.
/// Built once by the normalizer; every query reads from it without mutation,
/// so a snapshot can be shared freely between report and lookup runs.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    ids: Vec<String>,
    tables: BTreeMap<String, NarrowTable>,
}

impl CatalogSnapshot {
    pub fn new(ids: Vec<String>, tables: Vec<NarrowTable>) -> Self {
        let tables = tables
            .into_iter()
            .map(|t| (t.attribute().to_string(), t))
            .collect();
        Self { ids, tables }
    }

    /// Record ids in source order
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn table(&self, attribute: &str) -> Result<&NarrowTable> {
        self.tables
            .get(attribute)
            .ok_or_else(|| CatalogError::missing_column(attribute))
    }

    pub fn types(&self) -> Result<&NarrowTable> {
        self.table(TYPE_COLUMN)
    }

    pub fn titles(&self) -> Result<&NarrowTable> {
        self.table(TITLE_COLUMN)
    }

    pub fn directors(&self) -> Result<&NarrowTable> {
        self.table(DIRECTOR_COLUMN)
    }

    pub fn countries(&self) -> Result<&NarrowTable> {
        self.table(COUNTRY_COLUMN)
    }

    pub fn dates_added(&self) -> Result<&NarrowTable> {
        self.table(DATE_ADDED_COLUMN)
    }

    pub fn release_years(&self) -> Result<&NarrowTable> {
        self.table(RELEASE_YEAR_COLUMN)
    }

    pub fn ratings(&self) -> Result<&NarrowTable> {
        self.table(RATING_COLUMN)
    }

    pub fn durations(&self) -> Result<&NarrowTable> {
        self.table(DURATION_COLUMN)
    }

    pub fn categories(&self) -> Result<&NarrowTable> {
        self.table(CATEGORY_COLUMN)
    }
}
