//! # ri-api
//!
//! The web routing and orchestration layer for Rusty-Inbox.

pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::{error::InternalError, web, HttpResponse};
use ri_core::error::AppError;

use crate::error::ApiError;

/// JSON bodies above this size are rejected.
pub const MAX_JSON_BODY: usize = 16 * 1024;

/// Malformed bodies and queries get the same JSON error shape as everything else.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_JSON_BODY)
        .error_handler(|err, _req| {
            let detail = err.to_string();
            InternalError::from_response(err, bad_request(detail)).into()
        })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let detail = err.to_string();
        InternalError::from_response(err, bad_request(detail)).into()
    })
}

fn bad_request(detail: String) -> HttpResponse {
    use actix_web::ResponseError;
    ApiError(AppError::ValidationError(detail)).error_response()
}

/// Configures the routes for the inbox.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the API under different paths if needed (e.g., /api/v1/).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .route("/health", web::get().to(handlers::health))
        .service(
            web::scope("/api")
                // Public surface
                .service(web::resource("/messages").route(web::post().to(handlers::submit_message)))
                .service(web::resource("/replies").route(web::get().to(handlers::recent_replies)))
                // Operator surface, gated per call by the session token
                .service(
                    web::scope("/operator")
                        .service(web::resource("/login").route(web::post().to(handlers::login)))
                        .service(web::resource("/logout").route(web::post().to(handlers::logout)))
                        .service(web::resource("/stats").route(web::get().to(handlers::stats)))
                        .service(web::resource("/messages").route(web::get().to(handlers::list_messages)))
                        .service(
                            web::resource("/messages/{id}")
                                .route(web::get().to(handlers::get_message))
                                .route(web::delete().to(handlers::delete_message)),
                        )
                        .service(web::resource("/messages/{id}/read").route(web::post().to(handlers::mark_read)))
                        .service(web::resource("/messages/{id}/reply").route(web::put().to(handlers::reply))),
                ),
        );
}
