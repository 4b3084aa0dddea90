use std::fmt::Write;

use crate::app::report_use_case::CatalogReport;
use crate::pipeline::processing::aggregate::{CrossTab, DurationTable, Histogram};

const BAR: char = '█';

/// A chart rendered as text for the console
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chart {
    pub name: &'static str,
    pub title: String,
    pub body: String,
}

impl Chart {
    pub fn render(&self) -> String {
        format!("{}\n{}\n{}", self.title, "=".repeat(self.title.chars().count()), self.body)
    }
}

/// Bar scaled so that `max` fills `width` cells; non-zero counts get at least one
fn bar(count: usize, max: usize, width: usize) -> String {
    if count == 0 || max == 0 {
        return String::new();
    }
    let cells = ((count * width) / max).max(1);
    std::iter::repeat(BAR).take(cells).collect()
}

/// Horizontal bar chart over labelled counts, in the order given
pub fn render_counts<L: AsRef<str>>(rows: &[(L, usize)], width: usize) -> String {
    let max = rows.iter().map(|(_, count)| *count).max().unwrap_or(0);
    let label_width = rows
        .iter()
        .map(|(label, _)| label.as_ref().chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (label, count) in rows {
        let _ = writeln!(
            out,
            "{:<label_width$} | {} {}",
            label.as_ref(),
            bar(*count, max, width),
            count,
            label_width = label_width
        );
    }
    out
}

pub fn render_histogram(histogram: &Histogram, width: usize) -> String {
    let rows: Vec<(String, usize)> = histogram
        .bins()
        .map(|bin| (format!("[{:>4}, {:>4})", bin.lower, bin.upper), bin.count))
        .collect();

    let mut out = render_counts(&rows, width);
    if histogram.out_of_range > 0 {
        let _ = writeln!(out, "out of range: {}", histogram.out_of_range);
    }
    out
}

/// Categories by total titles, each followed by its rating breakdown
pub fn render_cross_tab(tab: &CrossTab, width: usize) -> String {
    let totals = tab.row_totals();
    let mut out = render_counts(&totals, width);

    out.push('\n');
    for (row, _) in &totals {
        let breakdown: Vec<String> = tab
            .counts
            .get(*row)
            .map(|cols| cols.iter().map(|(col, n)| format!("{} {}", col, n)).collect())
            .unwrap_or_default();
        let _ = writeln!(out, "{}: {}", row, breakdown.join(", "));
    }
    if tab.excluded_corrupt > 0 {
        let _ = writeln!(out, "excluded corrupt ratings: {}", tab.excluded_corrupt);
    }
    out
}

/// First `limit` rows of a duration table
pub fn render_preview(table: &DurationTable, limit: usize) -> String {
    let mut out = String::new();
    for row in table.rows.iter().take(limit) {
        let _ = writeln!(out, "{:<8} {}", row.id, row.amount);
    }
    if table.len() > limit {
        let _ = writeln!(out, "... {} more", table.len() - limit);
    }
    out
}

/// Every chart artifact for a report
pub fn render_report(report: &CatalogReport, width: usize) -> Vec<Chart> {
    let seasons: Vec<(String, usize)> = report
        .show_season_counts
        .iter()
        .map(|(seasons, count)| (seasons.to_string(), *count))
        .collect();
    let release_years: Vec<(String, usize)> = report
        .release_year_counts
        .iter()
        .map(|(year, count)| (year.to_string(), *count))
        .collect();
    let added_years: Vec<(String, usize)> = report
        .added_year_counts
        .iter()
        .map(|(year, count)| (year.to_string(), *count))
        .collect();

    vec![
        Chart {
            name: "movie_lengths",
            title: format!("Movie lengths in minutes ({} movies)", report.movie_durations.len()),
            body: render_histogram(&report.movie_duration_histogram, width),
        },
        Chart {
            name: "show_seasons",
            title: format!("TV show seasons ({} shows)", report.show_durations.len()),
            body: render_counts(&seasons, width),
        },
        Chart {
            name: "ratings_by_category",
            title: "Ratings by category".to_string(),
            body: render_cross_tab(&report.ratings_by_category, width),
        },
        Chart {
            name: "release_years",
            title: "Titles by release year".to_string(),
            body: render_counts(&release_years, width),
        },
        Chart {
            name: "countries",
            title: format!("Top {} production countries", report.country_counts.len()),
            body: render_counts(&report.country_counts, width),
        },
        Chart {
            name: "added_years",
            title: "Titles by year added".to_string(),
            body: render_counts(&added_years, width),
        },
    ]
}
