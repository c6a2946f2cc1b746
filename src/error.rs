use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Failures while loading one of the input tables. All of them abort the run.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unavailable: {path}: {source}")]
    Unavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{table} table is missing required column(s): {}", columns.join(", "))]
    MissingColumns {
        table: &'static str,
        columns: Vec<String>,
    },
    #[error("{table} table, row {row}: {reason}")]
    MalformedRow {
        table: &'static str,
        row: usize,
        reason: String,
    },
    #[error("csv read error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv export error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the census place-table download.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {code} from {url}")]
    Status { code: u16, url: String },
    #[error("unexpected response shape: {0}")]
    Shape(String),
}
