//! Maps asset bundle names to cache-busted URLs.
//!
//! Two files drive everything: an INI file grouping asset files into named
//! bundles, and a JSON manifest mapping each asset to its cache-busted name.
//! Both are parsed lazily and, with auto-reload, again whenever they change.

pub mod assets;
pub mod bundles;
pub mod cached_file;
pub mod conf;
pub mod error;
pub mod manifest;
pub mod routes;
pub mod templates;
pub mod testing;

pub use assets::{Environment, SharedEnvironment};
pub use error::{AssetError, ParseError};
