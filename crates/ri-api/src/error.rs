//! HTTP mapping for `AppError`.
//!
//! Store and auth infrastructure failures are logged here and reach the
//! client only as a generic message.

use std::fmt;

use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use ri_core::error::AppError;
use serde_json::json;

#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match &self.0 {
            AppError::Store(detail) => {
                tracing::error!(error = %detail, "request failed in the message store");
                "something went wrong, please try again".to_string()
            }
            AppError::Auth(detail) => {
                tracing::error!(error = %detail, "operator authentication is unavailable");
                "authentication is temporarily unavailable".to_string()
            }
            other => other.to_string(),
        };

        let mut response = HttpResponse::build(self.status_code());
        if matches!(self.0, AppError::Unauthorized(_)) {
            response.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        response.json(json!({ "error": message }))
    }
}
