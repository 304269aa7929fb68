use log::{error, info};
use minijinja::{Environment, Error, ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{assets::SharedEnvironment, error::AssetError};

pub const TEMPLATE_INDEX: &str = "index.html";

#[derive(Serialize, Deserialize)]
pub struct TemplateServerContext {
    pub name: String,
    pub base_url: String,
    pub version: String,
}

fn checked_add_template<'a>(env: &mut Environment<'a>, entry: &'a str, data: &'a str) {
    match env.add_template(entry, data) {
        Ok(_) => {
            info!("Added template {}", entry)
        }
        Err(e) => {
            error!("Error adding template for \"{}\": {}", entry, e)
        }
    }
}

fn lookup_error(e: AssetError) -> Error {
    Error::new(ErrorKind::InvalidOperation, "asset lookup failed").with_source(e)
}

/// Make `asset_urls(bundle)` and `asset_url(filename)` callable from templates.
///
/// ```jinja
/// {% for url in asset_urls("app_js") %}
///   <script src="{{ url }}"></script>
/// {% endfor %}
/// ```
pub fn add_asset_functions(env: &mut Environment<'_>, assets: SharedEnvironment) {
    let bundle_assets = assets.clone();
    env.add_function("asset_urls", move |bundle: String| {
        bundle_assets.lock().urls(&bundle).map_err(lookup_error)
    });
    env.add_function("asset_url", move |filename: String| {
        assets.lock().url(&filename).map_err(lookup_error)
    });
}

pub fn templates_from_builtin(assets: SharedEnvironment) -> Environment<'static> {
    let mut env = Environment::new();

    checked_add_template(&mut env, TEMPLATE_INDEX, include_str!("index.jinja"));
    add_asset_functions(&mut env, assets);

    env
}
