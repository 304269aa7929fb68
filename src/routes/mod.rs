use actix_web::web::{self, ServiceConfig};
use minijinja::Environment;

use crate::{
    conf::ServerConfig,
    routes::assets::{AssetsView, StaticFileServer, StaticFiles},
    templates::templates_from_builtin,
};

pub mod assets;
pub mod server;

/// This serves as state for the Actix server.
pub struct RouteSharedData<S: StaticFileServer = StaticFiles> {
    pub config: ServerConfig,
    pub jinja: Environment<'static>,
    pub assets: AssetsView<S>,
}

/* -------------------------------------------------------------------------- */
/*                                Registration                                */
/* -------------------------------------------------------------------------- */

/// Register default routes for the server to an Actix configuration.
fn register_routes_to_config<'a, S: StaticFileServer + 'static>(
    config: &'a mut ServiceConfig,
    mount_path: &str,
) -> &'a mut ServiceConfig {
    config
        .route("/", web::get().to(server::get_index::<S>))
        .route(
            &format!("{}/{{{}:.*}}", mount_path, assets::TAIL),
            web::get().to(assets::get_asset::<S>),
        )
}

/// Serve the assets configured in `server_config` from disk.
pub fn setup_service_config<'a>(
    web_config: &'a mut ServiceConfig,
    server_config: &ServerConfig,
) -> &'a mut ServiceConfig {
    let environment = server_config.environment().shared();
    let assets = AssetsView::new(environment, server_config.assets.cache_max_age);
    setup_service_config_with(web_config, server_config, assets)
}

/// Serve assets through an existing view.
pub fn setup_service_config_with<'a, S: StaticFileServer + 'static>(
    web_config: &'a mut ServiceConfig,
    server_config: &ServerConfig,
    assets: AssetsView<S>,
) -> &'a mut ServiceConfig {
    let mount_path = assets.environment().lock().mount_path().to_string();
    web_config.app_data(web::Data::new(RouteSharedData {
        config: server_config.clone(),
        jinja: templates_from_builtin(assets.environment().clone()),
        assets,
    }));
    web_config.configure(|f| {
        register_routes_to_config::<S>(f, &mount_path);
    });

    web_config
}
