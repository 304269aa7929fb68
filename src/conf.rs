use std::path::PathBuf;

use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};

use crate::{assets::Environment, templates::TemplateServerContext};

fn default_name() -> String {
    "Assetshelf".to_string()
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_base_url() -> String {
    "/assets".to_string()
}

fn default_bundles() -> PathBuf {
    PathBuf::from("bundles.ini")
}

fn default_manifest() -> PathBuf {
    PathBuf::from("manifest.json")
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServerConfigGeneral {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Also write logs to this file.
    pub log_file: Option<String>,
}

impl Default for ServerConfigGeneral {
    fn default() -> Self {
        Self {
            name: default_name(),
            bind: default_bind(),
            port: default_port(),
            log_file: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServerConfigAssets {
    /// Prefix of every generated asset URL. Its path is where assets are served.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_bundles")]
    pub bundles: PathBuf,
    /// Assets are served from the directory holding the manifest.
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
    #[serde(default)]
    pub auto_reload: bool,
    pub cache_max_age: Option<u32>,
}

impl Default for ServerConfigAssets {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            bundles: default_bundles(),
            manifest: default_manifest(),
            auto_reload: false,
            cache_max_age: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub general: ServerConfigGeneral,
    #[serde(default)]
    pub assets: ServerConfigAssets,
}

impl ServerConfig {
    /// Read the configuration from an optional file, then from `ASSETS__*`
    /// environment variables (e.g. `ASSETS__ASSETS__AUTO_RELOAD=true`).
    pub fn load(file: Option<&str>) -> Result<Self, ConfigError> {
        let mut settings_builder = Config::builder();
        if let Some(path) = file {
            settings_builder = settings_builder.add_source(File::with_name(path));
        }
        settings_builder
            .add_source(
                config::Environment::with_prefix("ASSETS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn environment(&self) -> Environment {
        Environment::new(
            self.assets.base_url.clone(),
            self.assets.bundles.clone(),
            self.assets.manifest.clone(),
            self.assets.auto_reload,
        )
    }

    pub fn template_server_context(&self) -> TemplateServerContext {
        TemplateServerContext {
            name: self.general.name.to_string(),
            base_url: self.assets.base_url.to_string(),
            version: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}
