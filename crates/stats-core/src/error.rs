use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// All errors produced by the usage-stats crates.
#[derive(Error, Debug)]
pub enum StatsError {
    /// The external usage command could not be started at all.
    #[error("Failed to start usage source `{command}`: {source}")]
    SourceSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The external usage command ran but exited unsuccessfully.
    #[error("Usage source `{command}` failed ({status}): {stderr}")]
    SourceFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// The external usage command did not finish in time.
    #[error("Usage source `{command}` timed out after {timeout:?}")]
    SourceTimeout { command: String, timeout: Duration },

    /// The external usage command produced output that is not usage JSON.
    #[error("Failed to parse usage source output: {0}")]
    SourceParse(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written to disk.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed or serialised.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the usage-stats crates.
pub type Result<T> = std::result::Result<T, StatsError>;
