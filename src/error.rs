// ⚠️ Error taxonomy for the ETL run
// One variant per failing stage; nothing is recovered locally.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    /// Unreachable host, transport failure or non-2xx status
    #[error("network error: {0}")]
    Network(String),

    /// Malformed HTML table, non-numeric cell or malformed rate file
    #[error("parse error: {0}")]
    Parse(String),

    /// File read/write failure (rate table, output CSV, progress log)
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Table replace/insert failure
    #[error("storage error: {0}")]
    Storage(#[source] rusqlite::Error),

    /// Query execution failure against the store
    #[error("query failed `{query}`: {source}")]
    Query {
        query: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl EtlError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        EtlError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Short stage label used in progress-log lines and CLI output
    pub fn kind(&self) -> &'static str {
        match self {
            EtlError::Network(_) => "NetworkError",
            EtlError::Parse(_) => "ParseError",
            EtlError::Io { .. } => "IOError",
            EtlError::Storage(_) => "StorageError",
            EtlError::Query { .. } => "QueryError",
            EtlError::Config(_) => "ConfigError",
        }
    }
}

impl From<rusqlite::Error> for EtlError {
    fn from(err: rusqlite::Error) -> Self {
        EtlError::Storage(err)
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
