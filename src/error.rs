use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid pattern in {context}: {source}")]
    Pattern {
        context: String,
        #[source]
        source: regex::Error,
    },

    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Line {line}: expected {expected} columns ({fields}), found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
        fields: String,
    },

    #[error("Line {line}: cannot parse date '{value}'")]
    InvalidDate { line: usize, value: String },

    #[error("Line {line}: cannot parse amount '{value}'")]
    InvalidAmount { line: usize, value: String },

    #[error("Template error: {0}")]
    Template(String),
}

impl LedgerError {
    pub fn pattern(context: impl Into<String>, source: regex::Error) -> Self {
        Self::Pattern {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
