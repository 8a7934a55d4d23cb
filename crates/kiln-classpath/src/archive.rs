//! Archive containers
//!
//! An [`Archive`] wraps an open zip container for the lifetime of the
//! resolver. The catalog is read once at open time; entry reads go through a
//! per-archive mutex because zip random access needs exclusive use of the
//! underlying file cursor.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::ClasspathError;

/// Upper bound on the buffer reserved from an entry's declared size.
const MAX_PREALLOC: u64 = 1 << 20;

/// An opened, read-only archive container.
pub struct Archive {
    path: PathBuf,
    names: Vec<String>,
    zip: Mutex<ZipArchive<File>>,
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("path", &self.path)
            .field("entries", &self.names.len())
            .finish()
    }
}

impl Archive {
    /// Open an archive and read its catalog.
    ///
    /// Any failure here is a configuration error naming the archive path.
    pub fn open(path: &Path) -> Result<Self, ClasspathError> {
        let file = File::open(path).map_err(|source| ClasspathError::ArchiveOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let zip = ZipArchive::new(file).map_err(|e| ClasspathError::ArchiveOpen {
            path: path.to_path_buf(),
            source: zip_to_io(e),
        })?;

        // Directory entries carry no content
        let names = zip
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_owned)
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            names,
            zip: Mutex::new(zip),
        })
    }

    /// Path of the container file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of all file entries, in catalog order.
    pub fn entry_names(&self) -> &[String] {
        &self.names
    }

    /// Read an entry fully into memory.
    pub fn read_entry(&self, name: &str) -> io::Result<Vec<u8>> {
        let mut zip = self.zip.lock();
        let mut entry = zip.by_name(name).map_err(zip_to_io)?;
        let mut bytes = Vec::with_capacity(entry.size().min(MAX_PREALLOC) as usize);
        entry.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

fn zip_to_io(err: ZipError) -> io::Error {
    match err {
        ZipError::Io(e) => e,
        ZipError::FileNotFound => io::Error::new(io::ErrorKind::NotFound, err),
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}
