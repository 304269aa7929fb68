//! Resolves bundle names to cache-busted asset URLs.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, warn};
use parking_lot::Mutex;
use url::Url;

use crate::{
    bundles::{Bundles, bundle_file},
    cached_file::{CachedFile, FileSystem, LocalFileSystem},
    error::AssetError,
    manifest::{Manifest, manifest_file},
};

/// An [`Environment`] behind a lock, for handing to request handlers and
/// template functions. The caches inside are not synchronized themselves.
pub type SharedEnvironment = Arc<Mutex<Environment>>;

pub struct Environment {
    assets_base_url: String,
    /// Path portion of the base URL, used to recognise asset request paths.
    mount_path: String,
    bundle_file: CachedFile<Bundles>,
    manifest_file: CachedFile<Manifest>,
}

fn mount_path(assets_base_url: &str) -> String {
    let path = match Url::parse(assets_base_url) {
        Ok(url) => url.path().to_string(),
        Err(_) => assets_base_url.to_string(),
    };
    path.trim_end_matches('/').to_string()
}

impl Environment {
    pub fn new(
        assets_base_url: impl Into<String>,
        bundle_config_path: impl Into<PathBuf>,
        manifest_path: impl Into<PathBuf>,
        auto_reload: bool,
    ) -> Self {
        Self::with_file_system(
            assets_base_url,
            bundle_config_path,
            manifest_path,
            auto_reload,
            Arc::new(LocalFileSystem),
        )
    }

    /// Like [`Environment::new`], reading both files through `file_system`.
    pub fn with_file_system(
        assets_base_url: impl Into<String>,
        bundle_config_path: impl Into<PathBuf>,
        manifest_path: impl Into<PathBuf>,
        auto_reload: bool,
        file_system: Arc<dyn FileSystem>,
    ) -> Self {
        let assets_base_url = assets_base_url.into();
        Self {
            mount_path: mount_path(&assets_base_url),
            assets_base_url,
            bundle_file: bundle_file(bundle_config_path, auto_reload)
                .with_file_system(file_system.clone()),
            manifest_file: manifest_file(manifest_path, auto_reload)
                .with_file_system(file_system),
        }
    }

    pub fn shared(self) -> SharedEnvironment {
        Arc::new(Mutex::new(self))
    }

    pub fn assets_base_url(&self) -> &str {
        &self.assets_base_url
    }

    /// The path assets are served under, without a trailing slash.
    /// Empty when assets live at the root.
    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    /// The files of a bundle, in the order they are listed.
    pub fn files(&mut self, bundle: &str) -> Result<Vec<String>, AssetError> {
        self.bundle_file
            .load()?
            .files(bundle)
            .map(<[String]>::to_vec)
            .ok_or_else(|| AssetError::UnknownBundle(bundle.to_string()))
    }

    /// Names of every configured bundle, sorted.
    pub fn bundles(&mut self) -> Result<Vec<String>, AssetError> {
        Ok(self
            .bundle_file
            .load()?
            .names()
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    /// The cache-busted URL of a single asset.
    pub fn url(&mut self, filename: &str) -> Result<String, AssetError> {
        let manifest = self.manifest_file.load()?;
        busted_url(&self.assets_base_url, manifest, filename)
    }

    /// The cache-busted URLs of every file in a bundle, in bundle order.
    pub fn urls(&mut self, bundle: &str) -> Result<Vec<String>, AssetError> {
        let files = self.files(bundle)?;
        let manifest = self.manifest_file.load()?;
        files
            .iter()
            .map(|filename| busted_url(&self.assets_base_url, manifest, filename))
            .collect()
    }

    /// The directory holding the manifest, which is where assets are served from.
    pub fn asset_root(&self) -> &Path {
        self.manifest_file.path().parent().unwrap_or(Path::new(""))
    }

    /// Whether `query` is the current cache-buster of the asset at `path`.
    ///
    /// `path` may be a bare filename or carry the base URL (or its path) as a
    /// prefix. Unknown files, wrong tokens and an unreadable manifest all
    /// count as invalid.
    pub fn check_cache_buster(&mut self, path: &str, query: &str) -> bool {
        let filename = self.asset_name(path);
        let manifest = match self.manifest_file.load() {
            Ok(v) => v,
            Err(e) => {
                warn!("Cannot check cache-buster of \"{}\": {}", filename, e);
                return false;
            }
        };

        match manifest.token(filename) {
            Some(token) if token == query => true,
            Some(_) => {
                debug!("Stale cache-buster \"{}\" for \"{}\"", query, filename);
                false
            }
            None => {
                debug!("\"{}\" has no cache-buster in the manifest", filename);
                false
            }
        }
    }

    /// Strip the base URL, or its path, from a request path.
    fn asset_name<'p>(&self, path: &'p str) -> &'p str {
        [self.assets_base_url.trim_end_matches('/'), self.mount_path.as_str()]
            .into_iter()
            .find_map(|prefix| path.strip_prefix(prefix)?.strip_prefix('/'))
            .unwrap_or(path)
            .trim_start_matches('/')
    }
}

fn busted_url(base_url: &str, manifest: &Manifest, filename: &str) -> Result<String, AssetError> {
    let busted = manifest
        .get(filename)
        .ok_or_else(|| AssetError::UnknownAsset(filename.to_string()))?;
    Ok(format!("{}/{}", base_url.trim_end_matches('/'), busted))
}

#[cfg(test)]
mod tests {
    use std::{path::Path, sync::Arc};

    use super::Environment;
    use crate::{
        error::AssetError,
        testing::{MemoryFileSystem, example_environment, example_file_system},
    };

    #[test]
    fn test_files_lists_bundle_files() {
        let fs = example_file_system();
        let mut env = example_environment(&fs, false);

        assert_eq!(
            env.files("app_js").unwrap(),
            ["app.bundle.js", "vendor.bundle.js"]
        );
        assert!(matches!(
            env.files("missing"),
            Err(AssetError::UnknownBundle(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_bundles_lists_names() {
        let fs = example_file_system();
        let mut env = example_environment(&fs, false);

        assert_eq!(env.bundles().unwrap(), ["app_css", "app_js"]);
    }

    #[test]
    fn test_url_returns_cache_busted_url() {
        let fs = example_file_system();
        let mut env = example_environment(&fs, false);

        assert_eq!(env.url("app.bundle.js").unwrap(), "/assets/app.bundle.js?abcdef");
        assert_eq!(env.url("vendor.bundle.js").unwrap(), "/assets/vendor.bundle.js?1234");
        assert!(matches!(
            env.url("nope.js"),
            Err(AssetError::UnknownAsset(name)) if name == "nope.js"
        ));
    }

    #[test]
    fn test_urls_generates_bundle_urls_in_order() {
        let fs = example_file_system();
        let mut env = example_environment(&fs, false);

        assert_eq!(
            env.urls("app_js").unwrap(),
            ["/assets/app.bundle.js?abcdef", "/assets/vendor.bundle.js?1234"]
        );

        fs.write("bundles.ini", "[bundles]\napp_js = vendor.bundle.js app.bundle.js");
        let mut env = example_environment(&fs, false);
        assert_eq!(
            env.urls("app_js").unwrap(),
            ["/assets/vendor.bundle.js?1234", "/assets/app.bundle.js?abcdef"]
        );
    }

    #[test]
    fn test_urls_fails_on_files_missing_from_manifest() {
        let fs = example_file_system();
        fs.write("bundles.ini", "[bundles]\napp_js = app.bundle.js ghost.js");
        let mut env = example_environment(&fs, false);

        assert!(matches!(env.urls("app_js"), Err(AssetError::UnknownAsset(name)) if name == "ghost.js"));
    }

    #[test]
    fn test_absolute_base_url() {
        let fs = example_file_system();
        let mut env = Environment::with_file_system(
            "https://cdn.example.com/static/",
            "bundles.ini",
            "manifest.json",
            false,
            Arc::new(fs.clone()),
        );

        assert_eq!(env.mount_path(), "/static");
        assert_eq!(
            env.url("app.css").unwrap(),
            "https://cdn.example.com/static/app.css?5678"
        );
        assert!(env.check_cache_buster("/static/app.css", "5678"));
        assert!(env.check_cache_buster("https://cdn.example.com/static/app.css", "5678"));
    }

    #[test]
    fn test_reloads_manifest_on_change() {
        for auto_reload in [true, false] {
            let fs = MemoryFileSystem::new()
                .with_file("bundles.ini", "[bundles]\napp_js = \n  app.bundle.js", 100)
                .with_file("manifest.json", r#"{"app.bundle.js":"app.bundle.js?oldhash"}"#, 100);
            let mut env = example_environment(&fs, auto_reload);

            // The first call reads and caches the manifest.
            env.urls("app_js").unwrap();

            fs.write("manifest.json", r#"{"app.bundle.js":"app.bundle.js?newhash"}"#);
            assert_eq!(env.urls("app_js").unwrap(), ["/assets/app.bundle.js?oldhash"]);

            fs.touch("manifest.json", 101);
            let expected = match auto_reload {
                true => "/assets/app.bundle.js?newhash",
                false => "/assets/app.bundle.js?oldhash",
            };
            assert_eq!(env.urls("app_js").unwrap(), [expected], "auto_reload = {auto_reload}");
        }
    }

    #[test]
    fn test_check_cache_buster() {
        let fs = example_file_system();
        let mut env = example_environment(&fs, false);

        let params = [
            ("/assets/app.bundle.js", "abcdef", true),
            ("app.bundle.js", "abcdef", true),
            ("vendor.bundle.js", "1234", true),
            ("/assets/app.bundle.js", "wrong", false),
            ("/assets/app.bundle.js", "", false),
            ("vendor.bundle.js", "abcdef", false),
            ("/assets/does-not-exist.js", "whatever", false),
            ("/assetsapp.bundle.js", "abcdef", false),
        ];
        for (path, query, valid) in params {
            assert_eq!(env.check_cache_buster(path, query), valid, "{path}?{query}");
        }
    }

    #[test]
    fn test_check_cache_buster_accepts_every_manifest_token() {
        let fs = example_file_system();
        let mut env = example_environment(&fs, false);

        for (filename, token) in [
            ("app.bundle.js", "abcdef"),
            ("vendor.bundle.js", "1234"),
            ("app.css", "5678"),
        ] {
            assert!(env.check_cache_buster(&format!("/assets/{filename}"), token));
            assert!(!env.check_cache_buster(&format!("/assets/{filename}"), "x"));
        }
    }

    #[test]
    fn test_generated_urls_pass_check_cache_buster() {
        let fs = MemoryFileSystem::new()
            .with_file("bundles.ini", "[bundles]\nall = b.js", 100)
            .with_file("manifest.json", r#"{"b.js": "b.js?v=1?def"}"#, 100);
        let mut env = example_environment(&fs, false);

        let url = env.url("b.js").unwrap();
        assert_eq!(url, "/assets/b.js?v=1?def");

        // Everything after the first `?` is the query a server receives.
        let (path, query) = url.split_once('?').unwrap();
        assert_eq!(query, "v=1?def");
        assert!(env.check_cache_buster(path, query));
        assert!(!env.check_cache_buster(path, "def"));
    }

    #[test]
    fn test_check_cache_buster_without_manifest() {
        let fs = MemoryFileSystem::new();
        let mut env = example_environment(&fs, true);

        assert!(!env.check_cache_buster("/assets/app.bundle.js", "abcdef"));
        assert!(matches!(env.url("app.bundle.js"), Err(AssetError::Io { .. })));
    }

    #[test]
    fn test_asset_root() {
        let env = Environment::new("/assets", "bundles.ini", "/some_path/file.name", false);
        assert_eq!(env.asset_root(), Path::new("/some_path"));

        let env = Environment::new("/assets", "bundles.ini", "manifest.json", false);
        assert_eq!(env.asset_root(), Path::new(""));
    }
}
