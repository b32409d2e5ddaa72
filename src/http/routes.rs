use crate::error::GameError;
use crate::http;
use actix_web::web;

/// Mount every HTTP sub-module under `/api`.
///
/// Body and path extraction failures are reported with the same
/// `{ "message" }` shape as every other error.
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(
                web::JsonConfig::default()
                    .error_handler(|err, _req| GameError::bad_request(err.to_string()).into()),
            )
            .app_data(
                web::PathConfig::default()
                    .error_handler(|err, _req| GameError::bad_request(err.to_string()).into()),
            )
            .configure(http::auth::init_routes)
            .configure(http::characters::init_routes)
            .configure(http::inventory::init_routes)
            .configure(http::classes::init_routes)
            .configure(http::items::init_routes)
            .configure(http::shop::init_routes)
            .configure(http::health::init_routes),
    );
}
