//! Resource locators.

use std::fmt;
use std::path::PathBuf;

/// A reference to a resource that does not require opening it.
///
/// Renders as a URL-style string:
/// - `file:///abs/dir/x/Y.class`
/// - `jar:file:/abs/lib.jar!/x/Y.class`
/// - `embedded:/x/Y.class`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// A regular file on disk.
    File(PathBuf),

    /// An entry inside an archive container.
    ArchiveEntry { archive: PathBuf, entry: String },

    /// An in-memory resource held by an embedded source.
    Embedded(String),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::File(path) => {
                let path = path.to_string_lossy().replace('\\', "/");
                if path.starts_with('/') {
                    write!(f, "file://{}", path)
                } else {
                    write!(f, "file:///{}", path)
                }
            }
            Locator::ArchiveEntry { archive, entry } => {
                write!(f, "jar:file:{}!/{}", archive.display(), entry)
            }
            Locator::Embedded(name) => write!(f, "embedded:/{}", name),
        }
    }
}
