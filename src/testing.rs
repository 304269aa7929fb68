//! Fixtures shared by the unit tests, integration tests and benchmarks.

use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, SystemTime},
};

use parking_lot::Mutex;

use crate::{assets::Environment, cached_file::FileSystem};

pub const EXAMPLE_BUNDLES: &str = "
[bundles]
app_js =
  app.bundle.js
  vendor.bundle.js
app_css = app.css
";

pub const EXAMPLE_MANIFEST: &str = r#"{
    "app.bundle.js": "app.bundle.js?abcdef",
    "vendor.bundle.js": "vendor.bundle.js?1234",
    "app.css": "app.css?5678"
}"#;

struct MemoryFile {
    modified: SystemTime,
    contents: Vec<u8>,
}

/// In-memory files whose modification times only move when told to.
///
/// Clones share the same files, so a test can keep one handle and give
/// another to the code under test.
#[derive(Clone, Default)]
pub struct MemoryFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MemoryFile>>>,
    reads: Arc<AtomicUsize>,
}

fn mtime(seconds: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(seconds)
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>, modified: u64) -> Self {
        self.files.lock().insert(
            path.as_ref().to_path_buf(),
            MemoryFile {
                modified: mtime(modified),
                contents: contents.as_ref().to_vec(),
            },
        );
        self
    }

    /// Replace a file's contents, keeping its modification time.
    pub fn write(&self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) {
        let mut files = self.files.lock();
        let file = files
            .entry(path.as_ref().to_path_buf())
            .or_insert_with(|| MemoryFile {
                modified: SystemTime::UNIX_EPOCH,
                contents: Vec::new(),
            });
        file.contents = contents.as_ref().to_vec();
    }

    /// Set a file's modification time, in seconds since the epoch.
    pub fn touch(&self, path: impl AsRef<Path>, modified: u64) {
        if let Some(file) = self.files.lock().get_mut(path.as_ref()) {
            file.modified = mtime(modified);
        }
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        self.files.lock().remove(path.as_ref());
    }

    /// How many times file contents have been read.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

impl FileSystem for MemoryFileSystem {
    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        self.files
            .lock()
            .get(path)
            .map(|file| file.modified)
            .ok_or_else(|| not_found(path))
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let contents = self
            .files
            .lock()
            .get(path)
            .map(|file| file.contents.clone())
            .ok_or_else(|| not_found(path))?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(contents)
    }
}

/// A file system holding `bundles.ini` and `manifest.json` with the example
/// contents, both modified at t=100.
pub fn example_file_system() -> MemoryFileSystem {
    MemoryFileSystem::new()
        .with_file("bundles.ini", EXAMPLE_BUNDLES, 100)
        .with_file("manifest.json", EXAMPLE_MANIFEST, 100)
}

/// An environment serving the example files under `/assets`.
pub fn example_environment(file_system: &MemoryFileSystem, auto_reload: bool) -> Environment {
    Environment::with_file_system(
        "/assets",
        "bundles.ini",
        "manifest.json",
        auto_reload,
        Arc::new(file_system.clone()),
    )
}
