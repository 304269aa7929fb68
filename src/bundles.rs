//! Bundle definitions, read from the `[bundles]` section of an INI file:
//!
//! ```ini
//! [bundles]
//! app_js =
//!   app.bundle.js
//!   vendor.bundle.js
//! ```

use std::{collections::HashMap, path::PathBuf};

use crate::{cached_file::CachedFile, error::ParseError};

pub const BUNDLES_SECTION: &str = "bundles";

/// Section whose keys every other section inherits.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Bundle names mapped to their files, in the order they were listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundles(HashMap<String, Vec<String>>);

impl Bundles {
    /// Names are matched case-insensitively.
    pub fn files(&self, name: &str) -> Option<&[String]> {
        self.0.get(&name.to_lowercase()).map(Vec::as_slice)
    }

    /// All bundle names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.0.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn ini_error(line: usize, message: impl Into<String>) -> ParseError {
    ParseError::Ini {
        line,
        message: message.into(),
    }
}

fn split_files(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|file| !file.is_empty())
        .map(str::to_string)
}

pub fn parse_bundles(bytes: &[u8]) -> Result<Bundles, ParseError> {
    let text = std::str::from_utf8(bytes)?;

    let mut sections: HashMap<String, HashMap<String, Vec<String>>> = HashMap::new();
    let mut section: Option<String> = None;
    // Indentation and key of the value whose files are being read.
    let mut current: Option<(usize, String)> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with(['#', ';']) {
            continue;
        }
        let indent = raw.len() - raw.trim_start().len();

        if let (Some((key_indent, key)), Some(name)) = (&current, &section) {
            if indent > *key_indent {
                if let Some(files) = sections.get_mut(name).and_then(|keys| keys.get_mut(key)) {
                    files.extend(split_files(trimmed));
                }
                continue;
            }
        }

        if let Some(name) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            let name = name.trim().to_string();
            if sections.contains_key(&name) {
                return Err(ini_error(line, format!("duplicate section [{name}]")));
            }
            sections.insert(name.clone(), HashMap::new());
            section = Some(name);
            current = None;
            continue;
        }

        let Some(name) = &section else {
            return Err(ini_error(line, "key before the first section header"));
        };
        let Some((key, value)) = trimmed.split_once(['=', ':']) else {
            return Err(ini_error(line, format!("expected `key = value`, found \"{trimmed}\"")));
        };
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            return Err(ini_error(line, "empty key"));
        }
        let keys = sections.entry(name.clone()).or_default();
        if keys.contains_key(&key) {
            return Err(ini_error(line, format!("duplicate key \"{key}\" in [{name}]")));
        }
        keys.insert(key.clone(), split_files(value).collect());
        current = Some((indent, key));
    }

    // Keys under [DEFAULT] show up in every section unless the section sets them.
    let Some(mut bundles) = sections.remove(BUNDLES_SECTION) else {
        return Ok(Bundles::default());
    };
    for (key, files) in sections.remove(DEFAULT_SECTION).unwrap_or_default() {
        bundles.entry(key).or_insert(files);
    }
    Ok(Bundles(bundles))
}

/// A cached bundle configuration file.
pub fn bundle_file(path: impl Into<PathBuf>, auto_reload: bool) -> CachedFile<Bundles> {
    CachedFile::new(path, parse_bundles, auto_reload)
}
