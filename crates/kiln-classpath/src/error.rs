//! Classpath error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or querying a classpath.
#[derive(Debug, Error)]
pub enum ClasspathError {
    /// A declared archive could not be opened or its catalog could not be read.
    ///
    /// This is a build-configuration error and aborts resolver construction.
    #[error("Cannot open archive {}: {source}", .path.display())]
    ArchiveOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No tier (directories, archive index, parent) produced the type's bytes.
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    /// File I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),
}
