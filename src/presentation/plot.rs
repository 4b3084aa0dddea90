//! PNG charts drawn with plotters
//!
//! Labels need a TrueType font. Fonts are registered once per process from
//! the configured path or a list of common system locations. Without one, or
//! when labelled drawing fails, the chart is drawn with bars only.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::app::report_use_case::CatalogReport;

const FONT_FAMILY: &str = "sans-serif";
const MAX_X_LABELS: usize = 20;

const SYSTEM_FONTS: [&str; 7] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static FONT_LOADED: OnceCell<bool> = OnceCell::new();

/// What a plot draws
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Figure {
    /// Adjacent bars over `[edges[i], edges[i + 1])`
    Histogram { edges: Vec<i64>, counts: Vec<usize> },
    /// One bar per label, in the order given
    Bars(Vec<(String, usize)>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plot {
    pub name: &'static str,
    pub title: String,
    pub x_desc: &'static str,
    pub y_desc: &'static str,
    pub figure: Figure,
}

impl Plot {
    pub fn file_name(&self) -> String {
        format!("{}.png", self.name)
    }
}

fn keyed_bars(counts: &BTreeMap<i64, usize>) -> Figure {
    Figure::Bars(counts.iter().map(|(k, v)| (k.to_string(), *v)).collect())
}

/// One plot per chart artifact of the report
pub fn plots_for(report: &CatalogReport) -> Vec<Plot> {
    let histogram = &report.movie_duration_histogram;
    let categories = report
        .ratings_by_category
        .row_totals()
        .into_iter()
        .map(|(category, total)| (category.to_string(), total))
        .collect();

    vec![
        Plot {
            name: "movie_lengths",
            title: format!("Movie lengths ({} movies)", report.movie_durations.len()),
            x_desc: "minutes",
            y_desc: "movies",
            figure: Figure::Histogram {
                edges: histogram.edges.clone(),
                counts: histogram.counts.clone(),
            },
        },
        Plot {
            name: "show_seasons",
            title: format!("TV show seasons ({} shows)", report.show_durations.len()),
            x_desc: "seasons",
            y_desc: "shows",
            figure: keyed_bars(&report.show_season_counts),
        },
        Plot {
            name: "ratings_by_category",
            title: "Rated titles per category".to_string(),
            x_desc: "category",
            y_desc: "titles",
            figure: Figure::Bars(categories),
        },
        Plot {
            name: "release_years",
            title: "Titles by release year".to_string(),
            x_desc: "year",
            y_desc: "titles",
            figure: keyed_bars(&report.release_year_counts),
        },
        Plot {
            name: "countries",
            title: format!("Top {} production countries", report.country_counts.len()),
            x_desc: "country",
            y_desc: "titles",
            figure: Figure::Bars(report.country_counts.clone()),
        },
        Plot {
            name: "added_years",
            title: "Titles by year added".to_string(),
            x_desc: "year",
            y_desc: "titles",
            figure: keyed_bars(&report.added_year_counts),
        },
    ]
}

fn try_register(path: &Path) -> bool {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    // plotters keeps a 'static reference to registered font data
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    match register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
        Ok(()) => {
            info!("Chart font loaded from {}", path.display());
            true
        }
        Err(_) => {
            warn!("Unusable chart font {}: invalid font data", path.display());
            false
        }
    }
}

/// Register a label font, returning whether one is available
///
/// Only the first call does any work; later calls report its outcome.
pub fn ensure_font(configured: Option<&Path>) -> bool {
    *FONT_LOADED.get_or_init(|| {
        let candidates = configured
            .map(Path::to_path_buf)
            .into_iter()
            .chain(SYSTEM_FONTS.iter().map(PathBuf::from));

        for path in candidates {
            if try_register(&path) {
                return true;
            }
        }
        warn!("No chart font found, charts are drawn without labels");
        false
    })
}

fn y_top(max: usize) -> u32 {
    let max = u32::try_from(max).unwrap_or(u32::MAX / 2);
    max + max / 10 + 1
}

fn draw_histogram(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    plot: &Plot,
    edges: &[i64],
    counts: &[usize],
    labelled: bool,
) -> Result<()> {
    let (first, last) = match (edges.first(), edges.last()) {
        (Some(first), Some(last)) if first < last => (*first, *last),
        _ => return Ok(()),
    };
    let top = y_top(counts.iter().copied().max().unwrap_or(0));

    let mut builder = ChartBuilder::on(root);
    builder.margin(20);
    if labelled {
        builder
            .caption(&plot.title, (FONT_FAMILY, 28))
            .x_label_area_size(40)
            .y_label_area_size(50);
    }
    let mut chart = builder.build_cartesian_2d(first..last, 0u32..top)?;

    if labelled {
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(plot.x_desc)
            .y_desc(plot.y_desc)
            .draw()?;
    }

    chart.draw_series(edges.windows(2).zip(counts).map(|(pair, &count)| {
        Rectangle::new([(pair[0], 0u32), (pair[1], count as u32)], BLUE.mix(0.8).filled())
    }))?;
    Ok(())
}

fn draw_bars(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    plot: &Plot,
    bars: &[(String, usize)],
    labelled: bool,
) -> Result<()> {
    let slots = i32::try_from(bars.len().max(1)).unwrap_or(i32::MAX);
    let top = y_top(bars.iter().map(|(_, count)| *count).max().unwrap_or(0));

    let mut builder = ChartBuilder::on(root);
    builder.margin(20);
    if labelled {
        builder
            .caption(&plot.title, (FONT_FAMILY, 28))
            .x_label_area_size(60)
            .y_label_area_size(50);
    }
    let mut chart = builder.build_cartesian_2d(0i32..slots, 0u32..top)?;

    if labelled {
        let label_of = |x: &i32| {
            usize::try_from(*x)
                .ok()
                .and_then(|i| bars.get(i))
                .map(|(label, _)| label.clone())
                .unwrap_or_default()
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(bars.len().clamp(1, MAX_X_LABELS))
            .x_label_formatter(&label_of)
            .x_desc(plot.x_desc)
            .y_desc(plot.y_desc)
            .draw()?;
    }

    chart.draw_series(bars.iter().enumerate().map(|(i, (_, count))| {
        let x = i as i32;
        Rectangle::new([(x, 0u32), (x + 1, *count as u32)], BLUE.mix(0.8).filled())
    }))?;
    Ok(())
}

fn draw(plot: &Plot, path: &Path, size: (u32, u32), labelled: bool) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    match &plot.figure {
        Figure::Histogram { edges, counts } => draw_histogram(&root, plot, edges, counts, labelled)?,
        Figure::Bars(bars) => draw_bars(&root, plot, bars, labelled)?,
    }

    root.present()?;
    Ok(())
}

/// Draw `plot` into a PNG at `path`
///
/// Falls back to an unlabelled chart when labels cannot be drawn.
pub fn draw_png(plot: &Plot, path: &Path, size: (u32, u32), labelled: bool) -> Result<()> {
    if labelled {
        match draw(plot, path, size, true) {
            Ok(()) => return Ok(()),
            Err(e) => warn!("Labelled chart {} failed, drawing bars only: {:#}", plot.name, e),
        }
    }

    draw(plot, path, size, false)
        .with_context(|| format!("Failed to draw chart {}", path.display()))?;
    debug!("Drew {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PNG_MAGIC: [u8; 4] = [0x89, b'P', b'N', b'G'];

    fn bars_plot() -> Plot {
        Plot {
            name: "countries",
            title: "Top countries".to_string(),
            x_desc: "country",
            y_desc: "titles",
            figure: Figure::Bars(vec![("United States".to_string(), 3), ("Ghana".to_string(), 1)]),
        }
    }

    #[test]
    fn test_unlabelled_bars_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("countries.png");

        draw_png(&bars_plot(), &path, (320, 200), false).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes[..4], PNG_MAGIC);
    }

    #[test]
    fn test_histogram_png_with_available_font() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("movie_lengths.png");
        let plot = Plot {
            name: "movie_lengths",
            title: "Movie lengths".to_string(),
            x_desc: "minutes",
            y_desc: "movies",
            figure: Figure::Histogram {
                edges: (0..200).step_by(10).collect(),
                counts: vec![1; 19],
            },
        };

        let labelled = ensure_font(None);
        draw_png(&plot, &path, (320, 200), labelled).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes[..4], PNG_MAGIC);
    }

    #[test]
    fn test_empty_bars_still_draw() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.png");
        let plot = Plot {
            figure: Figure::Bars(Vec::new()),
            ..bars_plot()
        };

        draw_png(&plot, &path, (320, 200), false).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_file_name_is_png() {
        assert_eq!(bars_plot().file_name(), "countries.png");
    }
}
