//! Mapping of domain failures onto HTTP responses.
//!
//! Only lookup and storage failures end up here; validation problems are
//! rendered back into the form by the handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domain::CoreError;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] CoreError);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self.0 {
            CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            CoreError::InvalidId(_) => StatusCode::BAD_REQUEST,
            CoreError::AlreadyExists => StatusCode::CONFLICT,
            CoreError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self.0 {
            CoreError::NotFound { .. } => {
                warn!(err = %self.0, "lookup failed");
                http_common::json_error_with_message("not_found", &self.0.to_string())
            }
            CoreError::InvalidId(msg) => {
                warn!(err = %msg, "bad id in path");
                http_common::json_error_with_message("invalid_id", msg)
            }
            CoreError::AlreadyExists => http_common::json_err("conflict"),
            CoreError::Repository(_) => {
                error!(err = ?self.0, "repository error");
                http_common::json_err("internal")
            }
        };
        (status, Json(body)).into_response()
    }
}
