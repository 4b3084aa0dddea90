use anyhow::Result;

use crate::app::report_use_case::CatalogReport;

/// Destination for a finished report (console, chart files, ...)
pub trait ReportOutputPort {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn write_report(&mut self, report: &CatalogReport) -> Result<()>;
}
