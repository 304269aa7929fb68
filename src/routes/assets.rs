//! Serving cache-busted assets.
//!
//! Asset requests only reach the files on disk when their query string is
//! the asset's current cache-buster. Anything else is a 404.

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use actix_web::{
    HttpRequest, HttpResponse,
    http::header::{CacheControl, CacheDirective},
    web,
};
use log::{debug, error, warn};

use crate::{assets::SharedEnvironment, routes::RouteSharedData};

/// Route segment holding the requested path below the asset mount point.
pub const TAIL: &str = "tail";

/// Produces the response for an asset request that passed validation.
pub trait StaticFileServer {
    fn serve(&self, req: &HttpRequest) -> HttpResponse;
}

/// Serves files from a directory on disk.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    cache_max_age: Option<u32>,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache_max_age: None,
        }
    }

    /// Send `Cache-Control: public, max-age=<seconds>` with every file.
    pub fn with_cache_max_age(mut self, seconds: Option<u32>) -> Self {
        self.cache_max_age = seconds;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file a subpath points at, if it stays inside the root.
    pub fn resolve(&self, subpath: &str) -> Option<PathBuf> {
        let relative = Path::new(subpath);
        let inside_root = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if subpath.is_empty() || !inside_root {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl StaticFileServer for StaticFiles {
    fn serve(&self, req: &HttpRequest) -> HttpResponse {
        let subpath = req.match_info().query(TAIL);
        let Some(path) = self.resolve(subpath).filter(|p| p.is_file()) else {
            debug!("No asset file for \"{}\"", subpath);
            return HttpResponse::NotFound().finish();
        };

        let body = match fs::read(&path) {
            Ok(v) => v,
            Err(e) => {
                error!("Error reading asset {:?}: {}", path, e);
                return HttpResponse::InternalServerError().finish();
            }
        };

        let mut response = HttpResponse::Ok();
        response.content_type(mime_guess::from_path(&path).first_or_octet_stream());
        if let Some(age) = self.cache_max_age {
            response.insert_header(CacheControl(vec![
                CacheDirective::Public,
                CacheDirective::MaxAge(age),
            ]));
        }
        response.body(body)
    }
}

/// Checks the cache-buster of each request before handing it to a
/// [`StaticFileServer`].
pub struct AssetsView<S: StaticFileServer = StaticFiles> {
    environment: SharedEnvironment,
    static_files: S,
}

impl AssetsView<StaticFiles> {
    /// Serve files from the environment's asset root.
    pub fn new(environment: SharedEnvironment, cache_max_age: Option<u32>) -> Self {
        let root = environment.lock().asset_root().to_path_buf();
        Self::with_server(
            environment,
            StaticFiles::new(root).with_cache_max_age(cache_max_age),
        )
    }
}

impl<S: StaticFileServer> AssetsView<S> {
    pub fn with_server(environment: SharedEnvironment, static_files: S) -> Self {
        Self {
            environment,
            static_files,
        }
    }

    pub fn environment(&self) -> &SharedEnvironment {
        &self.environment
    }

    pub fn handle(&self, req: &HttpRequest) -> HttpResponse {
        let valid = {
            let mut environment = self.environment.lock();
            // The route tail is percent-decoded, unlike `req.path()`.
            let path = match req.match_info().get(TAIL) {
                Some(tail) => format!("{}/{}", environment.mount_path(), tail),
                None => req.path().to_string(),
            };
            environment.check_cache_buster(&path, req.query_string())
        };
        if !valid {
            warn!(
                "Rejected asset request {}?{}",
                req.path(),
                req.query_string()
            );
            return HttpResponse::NotFound().finish();
        }
        self.static_files.serve(req)
    }
}

/// A view serving the environment's assets without cache headers.
pub fn assets_view(environment: SharedEnvironment) -> AssetsView {
    AssetsView::new(environment, None)
}

pub async fn get_asset<S: StaticFileServer + 'static>(
    data: web::Data<RouteSharedData<S>>,
    req: HttpRequest,
) -> HttpResponse {
    data.assets.handle(&req)
}
