//! Embedded resource source
//!
//! A [`ResourceSource`] over a fixed name → content map, used as the parent
//! tier beneath a classpath (for example the runtime image shipped in the
//! home directory):
//! - **DiskBacked**: content lives in a file, read on demand
//! - **Inline**: content held in memory
//!
//! Names are normalized the same way as classpath lookups.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::locator::Locator;
use crate::name::normalize_name;
use crate::source::{ResourceSource, ResourceStream};

/// A single embedded resource.
#[derive(Debug, Clone)]
pub enum EmbeddedEntry {
    /// Content lives on disk.
    DiskBacked(PathBuf),

    /// Content held in memory.
    Inline(Vec<u8>),
}

/// A flat, immutable map of resources.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedResources {
    entries: HashMap<String, EmbeddedEntry>,
}

impl EmbeddedResources {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a source from in-memory `(name, bytes)` pairs.
    pub fn from_inline<I, N>(items: I) -> Self
    where
        I: IntoIterator<Item = (N, Vec<u8>)>,
        N: AsRef<str>,
    {
        let entries = items
            .into_iter()
            .map(|(name, data)| (normalize_name(name.as_ref()), EmbeddedEntry::Inline(data)))
            .collect();
        Self { entries }
    }

    /// Register every regular file under `base_dir`, named relative to it.
    ///
    /// A missing directory yields an empty source.
    pub fn from_dir(base_dir: &Path) -> Self {
        let mut files = Vec::new();
        collect_all_files(base_dir, &mut files);

        let mut entries = HashMap::new();
        for path in files {
            let relative = path
                .strip_prefix(base_dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            entries.insert(relative, EmbeddedEntry::DiskBacked(path));
        }
        Self { entries }
    }

    /// Check if a resource is present.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&normalize_name(name))
    }

    /// Resource names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of resources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no resources.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceSource for EmbeddedResources {
    fn open_stream(&self, name: &str) -> Option<ResourceStream> {
        match self.entries.get(&normalize_name(name))? {
            EmbeddedEntry::DiskBacked(path) => File::open(path).ok().map(ResourceStream::File),
            EmbeddedEntry::Inline(data) => Some(ResourceStream::from_bytes(data.clone())),
        }
    }

    fn resolve_locator(&self, name: &str) -> Option<Locator> {
        let name = normalize_name(name);
        match self.entries.get(&name)? {
            EmbeddedEntry::DiskBacked(path) => Some(Locator::File(path.clone())),
            EmbeddedEntry::Inline(_) => Some(Locator::Embedded(name)),
        }
    }
}

/// Recursively collect all files in a directory.
fn collect_all_files(dir: &Path, results: &mut Vec<PathBuf>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_all_files(&path, results);
            } else if path.is_file() {
                results.push(path);
            }
        }
    }
}
