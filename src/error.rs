use std::path::PathBuf;
use thiserror::Error;

/// All possible errors in a lookup
#[derive(Error, Debug)]
pub enum LocateError {
    #[error("must provide search string on cmd line")]
    Usage,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Cannot read config file {}: {source}", .path.display())]
    ConfigFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed config file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Cannot connect to database: {0}")]
    Connect(#[source] BackendError),

    #[error("Query failed: {0}")]
    Query(#[source] BackendError),

    #[error("Cannot read path from row: {0}")]
    Row(#[source] BackendError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Driver error from whichever backend served the lookup
#[derive(Error, Debug)]
pub enum BackendError {
    #[error(transparent)]
    Postgres(#[from] postgres::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl LocateError {
    /// Process exit status for this error class
    pub fn exit_code(&self) -> i32 {
        match self {
            LocateError::Io(_) => 1,
            LocateError::Usage => 2,
            LocateError::Config(_)
            | LocateError::ConfigFile { .. }
            | LocateError::ConfigParse { .. } => 3,
            LocateError::Connect(_) => 4,
            LocateError::Query(_) => 5,
            LocateError::Row(_) => 6,
        }
    }

    /// True when stdout was closed by the reader, e.g. `fslocate foo | head`
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, LocateError::Io(e) if e.kind() == std::io::ErrorKind::BrokenPipe)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, LocateError>;
