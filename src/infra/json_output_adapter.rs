use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::app::ports::ReportOutputPort;
use crate::app::report_use_case::CatalogReport;

pub const REPORT_FILE_NAME: &str = "catalog_report.json";

/// Writes the whole report as pretty JSON
pub struct JsonReportOutputAdapter {
    file_path: PathBuf,
}

impl JsonReportOutputAdapter {
    pub fn new(output_dir: &Path) -> Result<Self> {
        fs::create_dir_all(output_dir)?;
        Ok(Self {
            file_path: output_dir.join(REPORT_FILE_NAME),
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

impl ReportOutputPort for JsonReportOutputAdapter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn write_report(&mut self, report: &CatalogReport) -> Result<()> {
        let file = File::create(&self.file_path)
            .with_context(|| format!("Failed to create {}", self.file_path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, report)?;
        writeln!(writer)?;
        writer.flush()?;

        info!("Report JSON written to {}", self.file_path.display());
        Ok(())
    }
}
