//! Integration tests for layered classpath resolution

use kiln_classpath::{
    ClasspathError, EmbeddedResources, Locator, ResourceResolver, ResourceSource, ResourceStream,
};
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Parent source that answers every lookup and counts how often it is asked.
#[derive(Default)]
struct CountingParent {
    opens: AtomicUsize,
    locates: AtomicUsize,
}

impl ResourceSource for CountingParent {
    fn open_stream(&self, name: &str) -> Option<ResourceStream> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Some(ResourceStream::from_bytes(format!("parent:{}", name).into_bytes()))
    }

    fn resolve_locator(&self, name: &str) -> Option<Locator> {
        self.locates.fetch_add(1, Ordering::SeqCst);
        Some(Locator::Embedded(name.to_string()))
    }

    fn find_type_bytes(&self, _type_name: &str) -> Option<Vec<u8>> {
        None
    }
}

fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    for (name, data) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

fn write_stored_jar(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    for (name, data) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

/// Overwrite the first occurrence of `needle` in place, keeping the file open
/// handles of a resolver valid.
fn corrupt(path: &Path, needle: &[u8]) {
    let content = fs::read(path).unwrap();
    let offset = content
        .windows(needle.len())
        .position(|w| w == needle)
        .expect("payload not found in archive");
    let mut file = OpenOptions::new().write(true).open(path).unwrap();
    file.seek(SeekFrom::Start(offset as u64)).unwrap();
    file.write_all(&[needle[0] ^ 0xFF]).unwrap();
}

fn write_file(root: &Path, name: &str, data: &[u8]) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, data).unwrap();
}

fn read(stream: Option<ResourceStream>) -> Vec<u8> {
    stream.expect("resource not found").into_bytes().unwrap()
}

/// dirA, archive1.jar, archive2.jar with overlapping entries.
struct Scenario {
    _temp: TempDir,
    dir_a: PathBuf,
    archive1: PathBuf,
    archive2: PathBuf,
}

impl Scenario {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let dir_a = temp.path().join("dirA");
        let archive1 = temp.path().join("archive1.jar");
        let archive2 = temp.path().join("archive2.jar");

        write_file(&dir_a, "x/Y.class", b"dirA:Y");
        write_jar(&archive1, &[("x/Y.class", b"a1:Y"), ("z/W.class", b"a1:W")]);
        write_jar(&archive2, &[("x/Y.class", b"a2:Y"), ("q/R.properties", b"a2:R")]);

        Self {
            _temp: temp,
            dir_a,
            archive1,
            archive2,
        }
    }

    fn classpath(&self) -> Vec<PathBuf> {
        vec![self.dir_a.clone(), self.archive1.clone(), self.archive2.clone()]
    }
}

#[test]
fn test_example_scenario() {
    let scenario = Scenario::new();
    let resolver = ResourceResolver::new(scenario.classpath(), CountingParent::default()).unwrap();

    assert_eq!(resolver.load_type_bytes("x.Y").unwrap(), b"dirA:Y");
    assert_eq!(read(resolver.open_stream("z/W.class")), b"a1:W");
    assert_eq!(read(resolver.open_stream("q/R.properties")), b"a2:R");
    assert_eq!(read(resolver.open_stream("missing")), b"parent:missing");
    assert_eq!(resolver.parent().opens.load(Ordering::SeqCst), 1);
}

#[test]
fn test_directory_only_resource() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "meta/config.edn", b"{:a 1}");

    let resolver = ResourceResolver::standalone([temp.path()]).unwrap();
    assert_eq!(read(resolver.open_stream("meta/config.edn")), b"{:a 1}");

    match resolver.resolve_locator("meta/config.edn") {
        Some(Locator::File(path)) => {
            assert!(path.is_absolute());
            assert_eq!(fs::read(&path).unwrap(), b"{:a 1}");
        }
        other => panic!("expected file locator, got {:?}", other),
    }
    assert!(resolver
        .resolve_locator("meta/config.edn")
        .unwrap()
        .to_string()
        .starts_with("file://"));
}

#[test]
fn test_first_declared_archive_wins() {
    let temp = TempDir::new().unwrap();
    let a = temp.path().join("a.jar");
    let b = temp.path().join("b.jar");
    write_jar(&a, &[("x/Y.class", b"A")]);
    write_jar(&b, &[("x/Y.class", b"B")]);

    let resolver = ResourceResolver::standalone([&a, &b]).unwrap();
    assert_eq!(read(resolver.open_stream("x/Y.class")), b"A");
    assert_eq!(resolver.load_type_bytes("x.Y").unwrap(), b"A");
    assert_eq!(
        resolver.resolve_locator("x/Y.class"),
        Some(Locator::ArchiveEntry {
            archive: a.clone(),
            entry: "x/Y.class".to_string(),
        })
    );

    let reversed = ResourceResolver::standalone([&b, &a]).unwrap();
    assert_eq!(read(reversed.open_stream("x/Y.class")), b"B");
}

#[test]
fn test_directory_shadows_archive_regardless_of_order() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("classes");
    let jar = temp.path().join("lib.jar");
    write_file(&dir, "x/Y.class", b"dir");
    write_jar(&jar, &[("x/Y.class", b"jar")]);

    for classpath in [vec![dir.clone(), jar.clone()], vec![jar.clone(), dir.clone()]] {
        let resolver = ResourceResolver::standalone(&classpath).unwrap();
        assert_eq!(read(resolver.open_stream("x/Y.class")), b"dir");
        assert_eq!(resolver.load_type_bytes("x.Y").unwrap(), b"dir");
        assert!(matches!(
            resolver.resolve_locator("x/Y.class"),
            Some(Locator::File(_))
        ));
    }
}

#[test]
fn test_first_declared_directory_wins() {
    let temp = TempDir::new().unwrap();
    let first = temp.path().join("first");
    let second = temp.path().join("second");
    write_file(&first, "r.txt", b"first");
    write_file(&second, "r.txt", b"second");
    write_file(&second, "only.txt", b"second-only");

    let resolver = ResourceResolver::standalone([&first, &second]).unwrap();
    assert_eq!(read(resolver.open_stream("r.txt")), b"first");
    assert_eq!(read(resolver.open_stream("only.txt")), b"second-only");
}

#[test]
fn test_missing_resource_consults_parent_once() {
    let scenario = Scenario::new();
    let resolver = ResourceResolver::new(scenario.classpath(), CountingParent::default()).unwrap();

    assert_eq!(read(resolver.open_stream("no/such/thing")), b"parent:no/such/thing");
    assert_eq!(resolver.parent().opens.load(Ordering::SeqCst), 1);

    assert_eq!(
        resolver.resolve_locator("no/such/thing"),
        Some(Locator::Embedded("no/such/thing".to_string()))
    );
    assert_eq!(resolver.parent().locates.load(Ordering::SeqCst), 1);

    // Hits never reach the parent
    let _ = resolver.open_stream("z/W.class").unwrap();
    let _ = resolver.resolve_locator("x/Y.class").unwrap();
    assert_eq!(resolver.parent().opens.load(Ordering::SeqCst), 1);
    assert_eq!(resolver.parent().locates.load(Ordering::SeqCst), 1);
}

#[test]
fn test_load_type_bytes_not_found() {
    let scenario = Scenario::new();
    let resolver = ResourceResolver::new(scenario.classpath(), CountingParent::default()).unwrap();

    match resolver.load_type_bytes("no.Such") {
        Err(ClasspathError::TypeNotFound(name)) => assert_eq!(name, "no.Such"),
        other => panic!("expected TypeNotFound, got {:?}", other),
    }
}

#[test]
fn test_unreadable_archive_is_fatal() {
    let temp = TempDir::new().unwrap();
    let good = temp.path().join("good.jar");
    let bad = temp.path().join("bad.jar");
    write_jar(&good, &[("a.txt", b"a")]);
    fs::write(&bad, b"not a zip archive").unwrap();

    match ResourceResolver::standalone([&good, &bad]) {
        Err(ClasspathError::ArchiveOpen { path, .. }) => assert_eq!(path, bad),
        other => panic!("expected ArchiveOpen, got {:?}", other),
    }

    let message = ResourceResolver::standalone([&bad]).unwrap_err().to_string();
    assert!(message.contains("bad.jar"), "message should name the archive: {}", message);
}

#[test]
fn test_repeated_queries_are_identical() {
    let scenario = Scenario::new();
    let resolver = ResourceResolver::new(scenario.classpath(), CountingParent::default()).unwrap();

    for name in ["x/Y.class", "z/W.class", "q/R.properties", "missing"] {
        let first = read(resolver.open_stream(name));
        let second = read(resolver.open_stream(name));
        assert_eq!(first, second, "open_stream({})", name);
        assert_eq!(
            resolver.resolve_locator(name),
            resolver.resolve_locator(name),
            "resolve_locator({})",
            name
        );
    }
    for ty in ["x.Y", "z.W"] {
        assert_eq!(
            resolver.load_type_bytes(ty).unwrap(),
            resolver.load_type_bytes(ty).unwrap()
        );
    }
}

#[test]
fn test_directory_added_after_construction_is_seen() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("classes");
    fs::create_dir_all(&dir).unwrap();

    let resolver = ResourceResolver::standalone([&dir]).unwrap();
    assert!(resolver.open_stream("late.txt").is_none());

    write_file(&dir, "late.txt", b"late");
    assert_eq!(read(resolver.open_stream("late.txt")), b"late");
}

#[test]
fn test_archive_read_failure_falls_through_to_parent() {
    let temp = TempDir::new().unwrap();
    let jar = temp.path().join("lib.jar");
    write_stored_jar(
        &jar,
        &[("r.txt", b"archive-text"), ("x/Y.class", b"archive-class")],
    );
    let parent = EmbeddedResources::from_inline([
        ("r.txt", b"parent".to_vec()),
        ("x/Y.class", b"parent-class".to_vec()),
    ]);
    let resolver = ResourceResolver::new([&jar], parent).unwrap();
    assert_eq!(read(resolver.open_stream("r.txt")), b"archive-text");

    // Entry checksums no longer match
    corrupt(&jar, b"archive-text");
    corrupt(&jar, b"archive-class");

    assert_eq!(read(resolver.open_stream("r.txt")), b"parent");
    assert_eq!(resolver.load_type_bytes("x.Y").unwrap(), b"parent-class");
}

#[cfg(unix)]
#[test]
fn test_directory_read_failure_falls_through_to_archive() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("classes");
    write_file(&dir, "r.txt", b"dir");
    write_file(&dir, "x/Y.class", b"dir-class");
    let jar = temp.path().join("lib.jar");
    write_jar(&jar, &[("r.txt", b"archive"), ("x/Y.class", b"archive-class")]);

    for name in ["r.txt", "x/Y.class"] {
        fs::set_permissions(dir.join(name), fs::Permissions::from_mode(0o000)).unwrap();
    }
    // Permission bits do not stop a privileged user
    if File::open(dir.join("r.txt")).is_ok() {
        return;
    }

    let resolver = ResourceResolver::standalone([&dir, &jar]).unwrap();
    assert_eq!(read(resolver.open_stream("r.txt")), b"archive");
    assert_eq!(resolver.load_type_bytes("x.Y").unwrap(), b"archive-class");
}
