//! Error types for the inventory and favorites engine
//!
//! Every error here is recoverable: a failed decode keeps the previous
//! inventory, a failed load starts with an empty store, and a failed tool
//! invocation is logged and followed by a refresh.

use std::path::PathBuf;
use thiserror::Error;

/// Malformed or empty dump text
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer than two lines (header plus the trailing line)
    #[error("dump has {lines} line(s), expected a header and a trailing line")]
    TooShort { lines: usize },

    /// A data row does not have as many cells as the header
    #[error("row {line} has {found} cells, header has {expected}")]
    RowWidth {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// Raw bytes could not be decoded as UTF-16LE
    #[error("dump is not valid UTF-16LE text")]
    Encoding,
}

/// Favorites persistence failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read favorites from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write favorites to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures invoking the external audio tool
#[derive(Debug, Error)]
pub enum ToolError {
    /// The process could not be started at all
    #[error("failed to launch {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but reported failure
    #[error("{program} exited with {status}")]
    Exit { program: String, status: String },
}

/// Why a refresh kept the previous inventory
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
