//! Classpath entry classification.

use std::path::{Path, PathBuf};

/// File extensions recognized as archive containers.
pub const ARCHIVE_EXTENSIONS: &[&str] = &["jar", "zip"];

/// A single classpath entry, classified at resolver construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathEntry {
    /// A directory probed on demand for `directory/name`.
    Directory(PathBuf),

    /// A zip-format container whose entries are indexed up front.
    Archive(PathBuf),
}

impl PathEntry {
    /// Classify a declared path.
    ///
    /// Returns `None` for paths that are neither an existing directory nor an
    /// existing regular file with an archive extension. Such entries are
    /// skipped, as with any classpath that names a missing location.
    pub fn classify(path: &Path) -> Option<Self> {
        if path.is_dir() {
            return Some(PathEntry::Directory(path.to_path_buf()));
        }
        if path.is_file() && has_archive_extension(path) {
            return Some(PathEntry::Archive(path.to_path_buf()));
        }
        None
    }

    /// The filesystem path of this entry.
    pub fn path(&self) -> &Path {
        match self {
            PathEntry::Directory(p) | PathEntry::Archive(p) => p,
        }
    }
}

fn has_archive_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ARCHIVE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}
