// Pipeline ingestion: reading the catalog CSV into a wide table

use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use crate::constants::REQUIRED_COLUMNS;
use crate::error::{CatalogError, Result};
use crate::observability::metrics;
use crate::types::{Cell, CatalogTable};

/// Check that every required column is present in the header row
pub fn check_schema(headers: &[String]) -> Result<()> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h == *required))
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::Schema { missing })
    }
}

/// Read a record set from any CSV source
///
/// Empty fields load as `Cell::Null`; every other field is carried verbatim
/// as `Cell::Text` (no trimming happens here). Fails with a schema error when
/// a required column is absent.
pub fn load<R: Read>(source: R) -> Result<CatalogTable> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(source);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if let Err(e) = check_schema(&headers) {
        metrics::ingestion::load_failed("schema");
        return Err(e);
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| {
            metrics::ingestion::load_failed("csv");
            CatalogError::from(e)
        })?;
        rows.push(record.iter().map(Cell::from_field).collect::<Vec<_>>());
    }

    let table = CatalogTable::new(headers, rows).inspect_err(|e| {
        metrics::ingestion::load_failed("record");
        warn!("Rejected catalog source: {}", e);
    })?;

    metrics::ingestion::rows_loaded(table.len());
    debug!("Loaded {} rows with {} columns", table.len(), table.columns().len());
    Ok(table)
}

/// Read the catalog from a file on disk
#[instrument(skip(path), fields(path = %path.display()))]
pub fn load_path(path: &Path) -> Result<CatalogTable> {
    let file = File::open(path)?;
    let table = load(file)?;
    info!("Loaded {} catalog rows", table.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{COUNTRY_COLUMN, ID_COLUMN, RATING_COLUMN};

    const HEADER: &str = "show_id,type,title,director,cast,country,date_added,release_year,rating,duration,listed_in,description";

    #[test]
    fn test_load_reads_rows_and_nulls() {
        let csv_text = format!(
            "{}\ns1,Movie,Dick Johnson Is Dead,Kirsten Johnson,,United States,\"September 25, 2021\",2020,PG-13,90 min,Documentaries,A film\n",
            HEADER
        );

        let table = load(csv_text.as_bytes()).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.ids(), vec!["s1"]);
        assert_eq!(table.column("cast").unwrap()[0], &Cell::Null);
        assert_eq!(
            table.column(COUNTRY_COLUMN).unwrap()[0],
            &Cell::text("United States")
        );
        assert_eq!(table.column(RATING_COLUMN).unwrap()[0], &Cell::text("PG-13"));
    }

    #[test]
    fn test_load_keeps_quoted_commas_in_one_cell() {
        let csv_text = format!(
            "{}\ns2,TV Show,Blood & Water,,\"Ama Qamata, Khosi Ngema\",South Africa,\"September 24, 2021\",2021,TV-MA,2 Seasons,\"International TV Shows, TV Dramas\",Desc\n",
            HEADER
        );

        let table = load(csv_text.as_bytes()).unwrap();

        assert_eq!(
            table.column("cast").unwrap()[0],
            &Cell::text("Ama Qamata, Khosi Ngema")
        );
    }

    #[test]
    fn test_load_missing_column_is_schema_error() {
        let csv_text = "show_id,type,title\ns1,Movie,Title\n";

        match load(csv_text.as_bytes()) {
            Err(CatalogError::Schema { missing }) => {
                assert!(missing.contains(&"duration".to_string()));
                assert!(missing.contains(&"listed_in".to_string()));
                assert!(!missing.contains(&ID_COLUMN.to_string()));
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_rejects_empty_id() {
        let csv_text = format!("{}\n,Movie,T,,,,,2020,PG,90 min,Dramas,D\n", HEADER);
        let err = load(csv_text.as_bytes()).unwrap_err();

        assert!(matches!(err, CatalogError::InvalidRecord(_)));
        assert!(err.to_string().starts_with("Schema error:"));
    }

    #[test]
    fn test_load_empty_file_has_no_rows() {
        let table = load(format!("{}\n", HEADER).as_bytes()).unwrap();
        assert!(table.is_empty());
    }
}
