use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::app::ports::ReportOutputPort;
use crate::app::report_use_case::CatalogReport;
use crate::config::ReportConfig;
use crate::presentation::plot::{draw_png, ensure_font, plots_for};

/// File-based implementation of ReportOutputPort
/// Draws one PNG chart per artifact into the output directory
pub struct FileChartOutputAdapter {
    output_dir: PathBuf,
    size: (u32, u32),
    labelled: bool,
}

impl FileChartOutputAdapter {
    pub fn new(output_dir: impl Into<PathBuf>, config: &ReportConfig) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).with_context(|| {
            format!("Failed to create output directory {}", output_dir.display())
        })?;

        info!("Writing chart artifacts to {}", output_dir.display());
        Ok(Self {
            output_dir,
            size: (config.image_width, config.image_height),
            labelled: ensure_font(config.chart_font.as_deref()),
        })
    }
}

impl ReportOutputPort for FileChartOutputAdapter {
    fn name(&self) -> &'static str {
        "chart files"
    }

    fn write_report(&mut self, report: &CatalogReport) -> Result<()> {
        for plot in plots_for(report) {
            let path = self.output_dir.join(plot.file_name());
            draw_png(&plot, &path, self.size, self.labelled)?;
        }
        Ok(())
    }
}
