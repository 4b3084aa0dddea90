use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{
    COUNTRY_COLUMN, DEFAULT_SEPARATOR, DURATION_BIN_START, DURATION_BIN_STEP, DURATION_BIN_STOP,
};
use crate::error::{CatalogError, Result};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Environment variable that overrides the configuration file location
pub const CONFIG_PATH_ENV: &str = "CATALOG_STATS_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub normalize: NormalizeConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Catalog CSV to read when no path is given on the command line
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Separator used by the multi-valued columns
    pub separator: String,
    /// Multi-valued columns whose elements are whitespace-trimmed after splitting
    pub trim_columns: Vec<String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            trim_columns: vec![COUNTRY_COLUMN.to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Where chart artifacts are written
    pub output_dir: PathBuf,
    pub duration_bin_start: i64,
    /// Exclusive upper bound used to generate the bin edges
    pub duration_bin_stop: i64,
    pub duration_bin_step: i64,
    /// Widest bar in a text chart, in characters
    pub chart_width: usize,
    /// Number of countries kept in the country chart
    pub top_countries: usize,
    /// Number of show durations printed as a preview
    pub show_preview_rows: usize,
    /// PNG chart size in pixels
    pub image_width: u32,
    pub image_height: u32,
    /// TrueType font for chart labels; common system fonts are tried when unset
    pub chart_font: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            duration_bin_start: DURATION_BIN_START,
            duration_bin_stop: DURATION_BIN_STOP,
            duration_bin_step: DURATION_BIN_STEP,
            chart_width: 60,
            top_countries: 10,
            show_preview_rows: 25,
            image_width: 1024,
            image_height: 640,
            chart_font: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file_name: String,
    /// Default filter directive when RUST_LOG is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_name: "catalog_stats.log".to_string(),
            filter: "catalog_stats=info".to_string(),
        }
    }
}

impl ReportConfig {
    /// Bin edges `start, start + step, ...` below `stop`
    pub fn duration_bin_edges(&self) -> Result<Vec<i64>> {
        if self.duration_bin_step <= 0 {
            return Err(CatalogError::Config(format!(
                "duration_bin_step must be positive, got {}",
                self.duration_bin_step
            )));
        }
        if self.duration_bin_stop <= self.duration_bin_start {
            return Err(CatalogError::Config(format!(
                "duration_bin_stop ({}) must be greater than duration_bin_start ({})",
                self.duration_bin_stop, self.duration_bin_start
            )));
        }

        let edges: Vec<i64> = (self.duration_bin_start..self.duration_bin_stop)
            .step_by(self.duration_bin_step as usize)
            .collect();
        if edges.len() < 2 {
            return Err(CatalogError::Config(format!(
                "duration bins {}..{} step {} give fewer than two edges",
                self.duration_bin_start, self.duration_bin_stop, self.duration_bin_step
            )));
        }
        Ok(edges)
    }
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Otherwise `CATALOG_STATS_CONFIG` or
    /// `config.toml` is read when present, and defaults are used when not.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let path = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        match path {
            Some(path) => Self::from_file(&path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))
            }
            None => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            CatalogError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.report.duration_bin_edges()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.normalize.separator, ",");
        assert_eq!(config.normalize.trim_columns, vec!["country".to_string()]);

        let edges = config.report.duration_bin_edges().unwrap();
        assert_eq!(edges.len(), 20);
        assert_eq!(edges.first(), Some(&0));
        assert_eq!(edges.last(), Some(&190));
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
            [report]
            chart_width = 30

            [normalize]
            trim_columns = ["country", "listed_in"]
            "#,
        )
        .unwrap();

        assert_eq!(config.report.chart_width, 30);
        assert_eq!(config.report.show_preview_rows, 25);
        assert_eq!(config.normalize.trim_columns.len(), 2);
        assert_eq!(config.logging.file_name, "catalog_stats.log");
    }

    #[test]
    fn test_non_positive_step_is_rejected() {
        let result = Config::from_toml("[report]\nduration_bin_step = 0\n");
        assert!(matches!(result, Err(CatalogError::Config(_))));
    }

    #[test]
    fn test_single_edge_bin_range_is_rejected() {
        let result = Config::from_toml(
            "[report]\nduration_bin_start = 0\nduration_bin_stop = 10\nduration_bin_step = 10\n",
        );
        assert!(matches!(result, Err(CatalogError::Config(_))));

        let config = Config::from_toml(
            "[report]\nduration_bin_start = 0\nduration_bin_stop = 11\nduration_bin_step = 10\n",
        )
        .unwrap();
        assert_eq!(config.report.duration_bin_edges().unwrap(), vec![0, 10]);
    }

    #[test]
    fn test_explicit_file_is_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[input]\npath = \"netflix_titles.csv\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.input.path, Some(PathBuf::from("netflix_titles.csv")));
    }

    #[test]
    fn test_missing_explicit_file_is_config_error() {
        let result = Config::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(CatalogError::Config(_))));
    }
}
