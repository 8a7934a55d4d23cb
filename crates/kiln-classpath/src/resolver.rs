//! Layered resource resolver
//!
//! Resolution order for every query:
//! 1. classpath directories, in declaration order (first regular file wins)
//! 2. the archive index (first archive declaring a name wins)
//! 3. the parent source
//!
//! A tier that matches but fails with an I/O error is treated as a miss and
//! the next tier is tried. Only construction errors and an exhausted
//! `load_type_bytes` are reported to the caller.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::archive::Archive;
use crate::entry::PathEntry;
use crate::error::ClasspathError;
use crate::locator::Locator;
use crate::name::{is_contained, normalize_name, type_resource_name};
use crate::source::{NoParent, ResourceSource, ResourceStream};

/// Resolves resources over directories and archives, in front of a parent source.
///
/// Built once before analysis; all queries take `&self` and may run
/// concurrently. Archive handles stay open until the resolver is dropped.
pub struct ResourceResolver<P = NoParent> {
    /// Classified entries in declaration order.
    entries: Vec<PathEntry>,

    /// Directory probe list, in declaration order.
    directories: Vec<PathBuf>,

    /// Opened archives, in declaration order.
    archives: Vec<Archive>,

    /// Resource name → index into `archives`.
    index: HashMap<String, usize>,

    /// The source this resolver decorates.
    parent: P,
}

impl<P> std::fmt::Debug for ResourceResolver<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceResolver")
            .field("directories", &self.directories)
            .field("archives", &self.archives)
            .field("indexed", &self.index.len())
            .finish()
    }
}

impl ResourceResolver<NoParent> {
    /// Build a resolver with no parent source.
    pub fn standalone<I, T>(paths: I) -> Result<Self, ClasspathError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<Path>,
    {
        Self::new(paths, NoParent)
    }
}

impl<P: ResourceSource> ResourceResolver<P> {
    /// Classify `paths`, open every archive and index its entries.
    ///
    /// Fails if any declared archive cannot be opened. Paths that are neither
    /// a directory nor an archive file are skipped.
    pub fn new<I, T>(paths: I, parent: P) -> Result<Self, ClasspathError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<Path>,
    {
        let mut entries = Vec::new();
        let mut directories = Vec::new();
        let mut archives = Vec::new();
        let mut index = HashMap::new();

        for path in paths {
            let path = path.as_ref();
            let Some(entry) = PathEntry::classify(path) else {
                debug!(path = %path.display(), "skipping classpath entry");
                continue;
            };

            match &entry {
                PathEntry::Directory(dir) => {
                    debug!(path = %dir.display(), "classpath directory");
                    directories.push(dir.clone());
                }
                PathEntry::Archive(file) => {
                    let archive = Archive::open(file)?;
                    let slot = archives.len();
                    let mut added = 0usize;
                    for name in archive.entry_names() {
                        if !index.contains_key(name) {
                            index.insert(name.clone(), slot);
                            added += 1;
                        }
                    }
                    debug!(
                        path = %file.display(),
                        entries = archive.entry_names().len(),
                        added,
                        "classpath archive"
                    );
                    archives.push(archive);
                }
            }
            entries.push(entry);
        }

        info!(
            directories = directories.len(),
            archives = archives.len(),
            resources = index.len(),
            "classpath indexed"
        );

        Ok(Self {
            entries,
            directories,
            archives,
            index,
            parent,
        })
    }

    /// Open a resource as a byte stream.
    ///
    /// Falls through to the parent source when neither directories nor
    /// archives yield the resource.
    pub fn open_stream(&self, name: &str) -> Option<ResourceStream> {
        let name = normalize_name(name);

        for file in self.directory_candidates(&name) {
            match File::open(&file) {
                Ok(f) => return Some(ResourceStream::File(f)),
                Err(e) => debug!(path = %file.display(), error = %e, "directory read failed"),
            }
        }

        if let Some(bytes) = self.read_indexed(&name) {
            return Some(ResourceStream::from_bytes(bytes));
        }

        self.parent.open_stream(&name)
    }

    /// Locate a resource without opening it.
    pub fn resolve_locator(&self, name: &str) -> Option<Locator> {
        let name = normalize_name(name);

        if let Some(file) = self.directory_candidates(&name).next() {
            return Some(Locator::File(std::path::absolute(&file).unwrap_or(file)));
        }

        if let Some(archive) = self.owner_of(&name) {
            return Some(Locator::ArchiveEntry {
                archive: archive.path().to_path_buf(),
                entry: name,
            });
        }

        self.parent.resolve_locator(&name)
    }

    /// Read the bytes defining `type_name` (e.g. `x.y.Z` → `x/y/Z.class`).
    ///
    /// Unlike the other queries, exhausting every tier is an error.
    pub fn load_type_bytes(&self, type_name: &str) -> Result<Vec<u8>, ClasspathError> {
        let name = type_resource_name(type_name);

        for file in self.directory_candidates(&name) {
            match fs::read(&file) {
                Ok(bytes) => return Ok(bytes),
                Err(e) => debug!(path = %file.display(), error = %e, "directory read failed"),
            }
        }

        if let Some(bytes) = self.read_indexed(&name) {
            return Ok(bytes);
        }

        self.parent
            .find_type_bytes(type_name)
            .ok_or_else(|| ClasspathError::TypeNotFound(type_name.to_string()))
    }

    /// The archive the index assigns `name` to, if any.
    pub fn owner_of(&self, name: &str) -> Option<&Archive> {
        let slot = *self.index.get(name)?;
        self.archives.get(slot)
    }

    /// Classified entries, in declaration order.
    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    /// Opened archives, in declaration order.
    pub fn archives(&self) -> &[Archive] {
        &self.archives
    }

    /// Number of names served from archives.
    pub fn index_len(&self) -> usize {
        self.index.len()
    }

    /// Names served from archives, sorted.
    pub fn indexed_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.index.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The source consulted after directories and archives.
    pub fn parent(&self) -> &P {
        &self.parent
    }

    /// Regular files named `name` under each directory, in declaration order.
    fn directory_candidates<'a>(&'a self, name: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
        let contained = is_contained(name);
        self.directories
            .iter()
            .filter(move |_| contained)
            .map(move |dir| dir.join(name))
            .filter(|file| file.is_file())
    }

    fn read_indexed(&self, name: &str) -> Option<Vec<u8>> {
        let archive = self.owner_of(name)?;
        match archive.read_entry(name) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!(
                    archive = %archive.path().display(),
                    entry = name,
                    error = %e,
                    "archive read failed"
                );
                None
            }
        }
    }
}

impl<P: ResourceSource> ResourceSource for ResourceResolver<P> {
    fn open_stream(&self, name: &str) -> Option<ResourceStream> {
        ResourceResolver::open_stream(self, name)
    }

    fn resolve_locator(&self, name: &str) -> Option<Locator> {
        ResourceResolver::resolve_locator(self, name)
    }

    fn find_type_bytes(&self, type_name: &str) -> Option<Vec<u8>> {
        self.load_type_bytes(type_name).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedded::EmbeddedResources;
    use std::io::Write;

    fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_skips_unclassifiable_entries() {
        let temp = tempfile::tempdir().unwrap();
        let notes = temp.path().join("notes.txt");
        fs::write(&notes, b"ignored").unwrap();

        let resolver =
            ResourceResolver::standalone([temp.path().join("missing"), notes]).unwrap();
        assert!(resolver.entries().is_empty());
        assert_eq!(resolver.index_len(), 0);
    }

    #[test]
    fn test_names_are_normalized() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("x")).unwrap();
        fs::write(temp.path().join("x/Y.class"), b"dir").unwrap();

        let resolver = ResourceResolver::standalone([temp.path()]).unwrap();
        let bytes = resolver.open_stream("./x/Y.class").unwrap().into_bytes().unwrap();
        assert_eq!(bytes, b"dir");
        assert!(resolver.resolve_locator("/x/Y.class").is_some());
    }

    #[test]
    fn test_parent_traversal_never_leaves_directory() {
        let temp = tempfile::tempdir().unwrap();
        let cp = temp.path().join("cp");
        fs::create_dir_all(&cp).unwrap();
        fs::write(temp.path().join("secret.txt"), b"secret").unwrap();

        let resolver = ResourceResolver::standalone([&cp]).unwrap();
        assert!(resolver.open_stream("../secret.txt").is_none());
        assert!(resolver.resolve_locator("../secret.txt").is_none());
    }

    #[test]
    fn test_owner_and_indexed_names() {
        let temp = tempfile::tempdir().unwrap();
        let a = temp.path().join("a.jar");
        let b = temp.path().join("b.jar");
        write_jar(&a, &[("x/Y.class", b"a")]);
        write_jar(&b, &[("x/Y.class", b"b"), ("q/R.properties", b"r")]);

        let resolver = ResourceResolver::standalone([&a, &b]).unwrap();
        assert_eq!(resolver.archives().len(), 2);
        assert_eq!(resolver.indexed_names(), vec!["q/R.properties", "x/Y.class"]);
        assert_eq!(resolver.owner_of("x/Y.class").unwrap().path(), a.as_path());
        assert_eq!(resolver.owner_of("q/R.properties").unwrap().path(), b.as_path());
        assert!(resolver.owner_of("missing").is_none());
    }

    #[test]
    fn test_stacked_resolvers() {
        let temp = tempfile::tempdir().unwrap();
        let jar = temp.path().join("lib.jar");
        write_jar(&jar, &[("lib/A.class", b"lib")]);

        let image = EmbeddedResources::from_inline([("lang/Core.class", b"core".to_vec())]);
        let lower = ResourceResolver::new([&jar], image).unwrap();
        let upper = ResourceResolver::new(Vec::<PathBuf>::new(), lower).unwrap();

        assert_eq!(upper.load_type_bytes("lib.A").unwrap(), b"lib");
        assert_eq!(upper.load_type_bytes("lang.Core").unwrap(), b"core");
        assert!(matches!(
            upper.load_type_bytes("nope.Missing"),
            Err(ClasspathError::TypeNotFound(name)) if name == "nope.Missing"
        ));
    }
}
