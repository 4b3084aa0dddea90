use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Schema error: missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Schema error: {0}")]
    InvalidRecord(String),

    #[error("Format error in column '{column}' for id {}: cannot parse {value:?} ({reason})", .id.as_deref().unwrap_or("<none>"))]
    Format {
        id: Option<String>,
        column: String,
        value: String,
        reason: String,
    },

    #[error("Join error: {0}")]
    Join(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line editor error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    pub fn format(
        id: Option<&str>,
        column: &str,
        value: &str,
        reason: impl Into<String>,
    ) -> Self {
        CatalogError::Format {
            id: id.map(str::to_string),
            column: column.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing_column(column: &str) -> Self {
        CatalogError::Schema {
            missing: vec![column.to_string()],
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
