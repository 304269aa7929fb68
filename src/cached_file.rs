//! Lazily parsed files that can pick up changes on disk.
//!
//! A [`CachedFile`] parses its file on the first [`CachedFile::load`] and
//! hands back the same parsed value afterwards. With auto-reload enabled it
//! checks the file's modification time on every load and parses it again
//! once the file is newer than the cached copy.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use log::{debug, info};

use crate::error::{AssetError, ParseError};

/// The two filesystem calls a [`CachedFile`] needs. Nothing is ever written.
pub trait FileSystem: Send + Sync {
    fn modified(&self, path: &Path) -> io::Result<SystemTime>;
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads straight from the local disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        fs::metadata(path)?.modified()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}

pub type Loader<T> = Box<dyn Fn(&[u8]) -> Result<T, ParseError> + Send + Sync>;

struct Cached<T> {
    modified: SystemTime,
    content: T,
}

pub struct CachedFile<T> {
    path: PathBuf,
    loader: Loader<T>,
    auto_reload: bool,
    file_system: Arc<dyn FileSystem>,
    cached: Option<Cached<T>>,
}

impl<T> CachedFile<T> {
    pub fn new<L>(path: impl Into<PathBuf>, loader: L, auto_reload: bool) -> Self
    where
        L: Fn(&[u8]) -> Result<T, ParseError> + Send + Sync + 'static,
    {
        Self {
            path: path.into(),
            loader: Box::new(loader),
            auto_reload,
            file_system: Arc::new(LocalFileSystem),
            cached: None,
        }
    }

    /// Swap the filesystem the file is read through.
    pub fn with_file_system(mut self, file_system: Arc<dyn FileSystem>) -> Self {
        self.file_system = file_system;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn auto_reload(&self) -> bool {
        self.auto_reload
    }

    pub fn is_loaded(&self) -> bool {
        self.cached.is_some()
    }

    /// Return the parsed content, parsing the file first if needed.
    ///
    /// A failed read or parse leaves the previously cached content in place.
    pub fn load(&mut self) -> Result<&T, AssetError> {
        let cached = match self.cached.take() {
            // Once loaded, a file without auto-reload is never looked at again.
            Some(cached) if !self.auto_reload => cached,
            Some(cached) => match self.reload_if_newer(&cached) {
                Ok(fresh) => fresh.unwrap_or(cached),
                Err(e) => {
                    self.cached = Some(cached);
                    return Err(e);
                }
            },
            None => self.read()?,
        };
        Ok(&self.cached.insert(cached).content)
    }

    fn read(&self) -> Result<Cached<T>, AssetError> {
        let modified = self.modified()?;
        let content = self.parse()?;
        Ok(Cached { modified, content })
    }

    fn reload_if_newer(&self, cached: &Cached<T>) -> Result<Option<Cached<T>>, AssetError> {
        if self.modified()? <= cached.modified {
            return Ok(None);
        }
        let fresh = self.read()?;
        info!("{} changed on disk, reloaded", self.path.display());
        Ok(Some(fresh))
    }

    fn modified(&self) -> Result<SystemTime, AssetError> {
        self.file_system
            .modified(&self.path)
            .map_err(|source| AssetError::Io {
                path: self.path.clone(),
                source,
            })
    }

    fn parse(&self) -> Result<T, AssetError> {
        debug!("Parsing {}", self.path.display());
        let bytes = self
            .file_system
            .read(&self.path)
            .map_err(|source| AssetError::Io {
                path: self.path.clone(),
                source,
            })?;
        (self.loader)(&bytes).map_err(|source| AssetError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}
