use anyhow::Result;
use std::io::{self, Stdout, Write};

use crate::app::ports::ReportOutputPort;
use crate::app::report_use_case::CatalogReport;
use crate::presentation::chart::{render_preview, render_report};

/// Prints every chart, a preview of show durations and the quality summary
pub struct ConsoleReportOutputAdapter<W: Write> {
    writer: W,
    width: usize,
    preview_rows: usize,
}

impl ConsoleReportOutputAdapter<Stdout> {
    pub fn stdout(width: usize, preview_rows: usize) -> Self {
        Self::new(io::stdout(), width, preview_rows)
    }
}

impl<W: Write> ConsoleReportOutputAdapter<W> {
    pub fn new(writer: W, width: usize, preview_rows: usize) -> Self {
        Self {
            writer,
            width,
            preview_rows,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportOutputPort for ConsoleReportOutputAdapter<W> {
    fn name(&self) -> &'static str {
        "console"
    }

    fn write_report(&mut self, report: &CatalogReport) -> Result<()> {
        let w = &mut self.writer;

        writeln!(w, "📊 Catalog report: {} titles", report.record_count)?;
        for (kind, count) in &report.kind_counts {
            writeln!(w, "   {}: {}", kind, count)?;
        }
        writeln!(w)?;

        for chart in render_report(report, self.width) {
            writeln!(w, "{}", chart.render())?;
        }

        writeln!(
            w,
            "First {} show durations (seasons):",
            self.preview_rows.min(report.show_durations.len())
        )?;
        write!(w, "{}", render_preview(&report.show_durations, self.preview_rows))?;
        writeln!(w)?;

        let quality = &report.data_quality;
        if quality.total_dropped() > 0 {
            writeln!(w, "⚠️  Rows dropped by the quality gate:")?;
            writeln!(w, "   corrupt ratings: {}", quality.corrupt_ratings_dropped)?;
            writeln!(w, "   unresolved kinds: {}", quality.unresolved_kinds_dropped)?;
            writeln!(w, "   incomplete rows: {}", quality.incomplete_rows_dropped)?;
        } else {
            writeln!(w, "✅ No rows dropped by the quality gate")?;
        }
        for failure in &report.failed_aggregates {
            writeln!(w, "⚠️  {} left empty: {}", failure.aggregate, failure.error)?;
        }

        w.flush()?;
        Ok(())
    }
}
