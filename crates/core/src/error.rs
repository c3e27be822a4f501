//! Batch-level error types.
//!
//! Only structural problems are errors: a table that cannot be read, a required column that
//! is absent, or configuration that cannot be used. Problems confined to a single result
//! row are recorded as [`crate::RowWarning`] values on that row's record instead.

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{table} table is empty")]
    EmptyTable { table: &'static str },
    #[error(
        "{table} table is missing required column '{field}' (looked for: {aliases})",
        aliases = aliases.join(", ")
    )]
    MissingColumn {
        table: &'static str,
        field: &'static str,
        aliases: Vec<&'static str>,
    },
    #[error("failed to read table {path}: {source}", path = path.display())]
    TableRead {
        path: std::path::PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to read workbook {path}: {source}", path = path.display())]
    WorkbookRead {
        path: std::path::PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("workbook {path} has no '{sheet}' sheet", path = path.display())]
    MissingSheet {
        path: std::path::PathBuf,
        sheet: &'static str,
    },
    #[error("failed to parse table: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize report: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("invalid vocabulary: {0}")]
    InvalidVocabulary(String),
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
