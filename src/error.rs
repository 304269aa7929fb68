use std::{io, path::PathBuf};

use thiserror::Error;

/// Failure to turn the raw bytes of a file into its parsed form.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("file is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("line {line}: {message}")]
    Ini { line: usize, message: String },
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("unknown bundle \"{0}\"")]
    UnknownBundle(String),
    #[error("\"{0}\" is not in the manifest")]
    UnknownAsset(String),
}

