use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PairError {
    #[error("{source_name}: required field '{field}' is missing")]
    MissingField { source_name: String, field: String },

    #[error("invalid axis mapping: {0}")]
    InvalidAxisMapping(String),

    #[error("{source_name}: field '{field}' holds {value}, outside the 32 bit id range")]
    IdOutOfRange { source_name: String, field: String, value: i64 },

    #[error("ROOT error: {0}")]
    Root(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported phase space source '{}', expected .root, .db, .sqlite or .sqlite3", .0.display())]
    UnsupportedSource(PathBuf),

    #[error("failed to build export thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("summary serialization failed: {0}")]
    Summary(#[from] serde_json::Error),
}

impl PairError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PairError::Io { path: path.into(), source }
    }

    pub fn missing_field(source_name: impl Into<String>, field: impl Into<String>) -> Self {
        PairError::MissingField {
            source_name: source_name.into(),
            field: field.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PairError>;
