use std::{collections::HashMap, path::PathBuf};

use serde::Deserialize;

use crate::{cached_file::CachedFile, error::ParseError};

/// Maps asset filenames to their cache-busted names, e.g.
/// `app.bundle.js` to `app.bundle.js?abcdef`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Manifest(HashMap<String, String>);

impl Manifest {
    /// The cache-busted name stored for `filename`, used verbatim in URLs.
    pub fn get(&self, filename: &str) -> Option<&str> {
        self.0.get(filename).map(String::as_str)
    }

    /// The cache-buster of `filename`: everything after the first `?` of its
    /// stored name, which is the query string of its URL. Entries without a
    /// `?` have no token.
    pub fn token(&self, filename: &str) -> Option<&str> {
        self.get(filename)?.split_once('?').map(|(_, token)| token)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

pub fn parse_manifest(bytes: &[u8]) -> Result<Manifest, ParseError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// A cached JSON manifest.
pub fn manifest_file(path: impl Into<PathBuf>, auto_reload: bool) -> CachedFile<Manifest> {
    CachedFile::new(path, parse_manifest, auto_reload)
}
