use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

use crate::constants::{CAST_COLUMN, CATEGORY_COLUMN, DIRECTOR_COLUMN, PEOPLE_SENTINEL, TITLE_COLUMN};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::processing::aggregate::coerce_integers;
use crate::pipeline::storage::CatalogSnapshot;
use crate::types::Kind;

/// Attribute a lookup runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupField {
    Title,
    Actor,
    Director,
    Category,
}

impl LookupField {
    /// Narrow table holding the field's values
    pub fn attribute(&self) -> &'static str {
        match self {
            LookupField::Title => TITLE_COLUMN,
            LookupField::Actor => CAST_COLUMN,
            LookupField::Director => DIRECTOR_COLUMN,
            LookupField::Category => CATEGORY_COLUMN,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LookupField::Title => "title",
            LookupField::Actor => "actor",
            LookupField::Director => "director",
            LookupField::Category => "category",
        }
    }
}

impl fmt::Display for LookupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Short description of a matched title
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleSummary {
    pub id: String,
    pub kind: Option<Kind>,
    pub title: String,
    pub release_year: Option<i64>,
}

impl fmt::Display for TitleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.kind.map(|k| k.label()).unwrap_or("?");
        match self.release_year {
            Some(year) => write!(f, "{:<6} {:<8} {} ({})", self.id, kind, self.title, year),
            None => write!(f, "{:<6} {:<8} {}", self.id, kind, self.title),
        }
    }
}

/// Attribute lookups over the normalized snapshot
///
/// Matching is a case-insensitive substring test on the trimmed value. The
/// "no data" sentinel never matches and an empty query matches nothing.
pub struct LookupUseCase<'a> {
    snapshot: &'a CatalogSnapshot,
    titles: HashMap<&'a str, &'a str>,
    kinds: HashMap<&'a str, Kind>,
    years: HashMap<String, i64>,
}

impl<'a> LookupUseCase<'a> {
    pub fn new(snapshot: &'a CatalogSnapshot) -> Result<Self> {
        let titles = snapshot
            .titles()?
            .rows()
            .iter()
            .filter_map(|row| row.value.as_text().map(|t| (row.id.as_str(), t)))
            .collect();

        let kinds = snapshot
            .types()?
            .rows()
            .iter()
            .filter_map(|row| {
                row.value
                    .as_text()
                    .and_then(Kind::parse)
                    .map(|k| (row.id.as_str(), k))
            })
            .collect();

        let years = coerce_integers(snapshot.release_years()?)?
            .into_iter()
            .collect();

        Ok(Self {
            snapshot,
            titles,
            kinds,
            years,
        })
    }

    /// Titles whose `field` contains `query`, unique per id, in catalog order
    pub fn lookup(&self, field: LookupField, query: &str) -> Result<Vec<TitleSummary>> {
        metrics::aggregate::lookup_performed(field.label());

        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let matched: HashSet<&str> = self
            .snapshot
            .table(field.attribute())?
            .rows()
            .iter()
            .filter(|row| {
                row.value
                    .as_key()
                    .map(|value| {
                        let value = value.trim();
                        value != PEOPLE_SENTINEL && value.to_lowercase().contains(&needle)
                    })
                    .unwrap_or(false)
            })
            .map(|row| row.id.as_str())
            .collect();

        let results: Vec<TitleSummary> = self
            .snapshot
            .ids()
            .iter()
            .filter(|id| matched.contains(id.as_str()))
            .map(|id| self.summarize(id))
            .collect();

        debug!("Lookup {}={:?} matched {} titles", field, query, results.len());
        Ok(results)
    }

    fn summarize(&self, id: &str) -> TitleSummary {
        TitleSummary {
            id: id.to_string(),
            kind: self.kinds.get(id).copied(),
            title: self.titles.get(id).copied().unwrap_or_default().to_string(),
            release_year: self.years.get(id).copied(),
        }
    }
}
