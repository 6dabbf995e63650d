//! rusty-inbox/crates/ri-api/src/middleware.rs Middleware
//!
//! Custom middleware for security, logging, and traffic control.

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};

// Access log without the peer address ("%a"): submitters stay anonymous.
// "request-line" status-code response-size time-taken
pub fn standard_middleware() -> Logger {
    Logger::new("\"%r\" %s %b %T")
}

// Configures CORS (Cross-Origin Resource Sharing)
// The UI is served separately from the API.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(3600)
}

// The API only serves JSON, so nothing may be framed or sniffed.
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .add((header::REFERRER_POLICY, "no-referrer"))
        .add((header::X_FRAME_OPTIONS, "DENY"))
        .add((header::CONTENT_SECURITY_POLICY, "default-src 'none'; frame-ancestors 'none'"))
}
