use crate::constants::{ID_COLUMN, MOVIE_KIND, TV_SHOW_KIND};
use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single table cell
///
/// Raw CSV fields load as `Text` or `Null` (empty field). Splitting a
/// multi-valued column turns `Text` cells into `List` cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Text(String),
    List(Vec<String>),
}

impl Cell {
    /// Build a cell from a raw CSV field, treating the empty field as null
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            Cell::Null
        } else {
            Cell::Text(field.to_string())
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Cell::List(values.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Grouping key for this cell; lists are rendered comma-joined, nulls have no key
    pub fn as_key(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::List(items) => Some(items.join(",")),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "NaN"),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// Catalog entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Kind {
    Movie,
    TvShow,
}

impl Kind {
    /// Resolve a raw `type` value; anything other than the two known labels is unresolvable
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            MOVIE_KIND => Some(Kind::Movie),
            TV_SHOW_KIND => Some(Kind::TvShow),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Kind::Movie => MOVIE_KIND,
            Kind::TvShow => TV_SHOW_KIND,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The wide catalog table as read from the source file
///
/// Column order follows the file header. The id column is guaranteed to hold
/// a non-empty `Text` cell in every row. Every transformation returns a new
/// table and leaves `self` untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl CatalogTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        let table = Self { columns, rows };
        let id_index = table.column_index(ID_COLUMN)?;

        for (row_number, row) in table.rows.iter().enumerate() {
            if row.len() != table.columns.len() {
                return Err(CatalogError::InvalidRecord(format!(
                    "row {} has {} cells, expected {}",
                    row_number,
                    row.len(),
                    table.columns.len()
                )));
            }
            if row[id_index].as_text().is_none() {
                return Err(CatalogError::InvalidRecord(format!(
                    "row {} has no {}",
                    row_number, ID_COLUMN
                )));
            }
        }

        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| CatalogError::missing_column(name))
    }

    /// Record ids in row order
    pub fn ids(&self) -> Vec<&str> {
        // `new` guarantees a text id in every row
        let id_index = self.column_index(ID_COLUMN).unwrap_or(0);
        self.rows
            .iter()
            .filter_map(|row| row[id_index].as_text())
            .collect()
    }

    /// Cells of one column in row order
    pub fn column(&self, name: &str) -> Result<Vec<&Cell>> {
        let index = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Return a copy of the table with `f` applied to every cell of `name`
    pub fn map_column<F>(&self, name: &str, f: F) -> Result<CatalogTable>
    where
        F: Fn(&Cell) -> Cell,
    {
        let index = self.column_index(name)?;
        if name == ID_COLUMN {
            return Err(CatalogError::InvalidRecord(format!(
                "the {} column cannot be rewritten",
                ID_COLUMN
            )));
        }

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut new_row = row.clone();
                new_row[index] = f(&row[index]);
                new_row
            })
            .collect();

        Ok(CatalogTable {
            columns: self.columns.clone(),
            rows,
        })
    }
}

/// One (id, value) row of a narrow table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NarrowRow {
    pub id: String,
    pub value: Cell,
}

/// Projection of the catalog onto one attribute, keyed by record id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NarrowTable {
    attribute: String,
    rows: Vec<NarrowRow>,
}

impl NarrowTable {
    pub fn new(attribute: impl Into<String>, rows: Vec<NarrowRow>) -> Self {
        Self {
            attribute: attribute.into(),
            rows,
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn rows(&self) -> &[NarrowRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values recorded for a single id, in row order
    pub fn values_for(&self, id: &str) -> Vec<&Cell> {
        self.rows
            .iter()
            .filter(|row| row.id == id)
            .map(|row| &row.value)
            .collect()
    }
}

/// One row of a joined table; `values` line up with the table's columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinedRow {
    pub id: String,
    pub values: Vec<Cell>,
}

/// Result of joining narrow tables on id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinedTable {
    columns: Vec<String>,
    rows: Vec<JoinedRow>,
}

impl JoinedTable {
    pub fn new(columns: Vec<String>, rows: Vec<JoinedRow>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[JoinedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| CatalogError::missing_column(name))
    }

    /// Keep the rows matching `keep`, preserving order
    pub fn filter<F>(&self, keep: F) -> JoinedTable
    where
        F: Fn(&JoinedRow) -> bool,
    {
        JoinedTable {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }
}
