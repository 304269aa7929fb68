use actix_web::{HttpResponse, Responder, http::header::ContentType, web};
use log::{debug, error};
use minijinja::context;

use crate::{
    routes::{RouteSharedData, assets::StaticFileServer},
    templates::TEMPLATE_INDEX,
};

/// Lists every bundle with its current URLs.
pub async fn get_index<S: StaticFileServer + 'static>(
    data: web::Data<RouteSharedData<S>>,
) -> impl Responder {
    debug!("Index requested");

    // Rendering calls back into the environment, so the lock must be released first.
    let bundles = data.assets.environment().lock().bundles();
    let bundles = match bundles {
        Ok(v) => v,
        Err(e) => {
            error!("Failed to list bundles: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    let rendered = data.jinja.get_template(TEMPLATE_INDEX).and_then(|tp| {
        tp.render(context! {
            server => data.config.template_server_context(),
            bundles => bundles,
        })
    });
    match rendered {
        Ok(body) => HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(body),
        Err(e) => {
            error!("Failed to render index: {:#}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
