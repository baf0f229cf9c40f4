use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use portal_core::DirectoryError;
use tracing::{debug, error};

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

/// Failure of an HTTP request.
///
/// Only messages we wrote ourselves reach the client; store failures become
/// an opaque "internal error".
#[derive(Debug)]
pub enum AppError {
    /// The request body could not be decoded.
    BadRequest(String),
    Directory(DirectoryError),
}

impl From<DirectoryError> for AppError {
    fn from(value: DirectoryError) -> Self {
        Self::Directory(value)
    }
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::Directory(err) => match err {
                DirectoryError::InvalidInput(message) => {
                    (StatusCode::BAD_REQUEST, message.clone())
                }
                DirectoryError::AliasExists(_) => {
                    (StatusCode::CONFLICT, "alias already exists".to_string())
                }
                DirectoryError::AliasNotFound(_) => {
                    (StatusCode::NOT_FOUND, "alias not found".to_string())
                }
                DirectoryError::UrlNotFound(_) => {
                    (StatusCode::NOT_FOUND, "url not found".to_string())
                }
                DirectoryError::StoreUnavailable | DirectoryError::Internal => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                ),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            error!(error = ?self, "request failed");
        } else {
            debug!(error = ?self, %status, "request rejected");
        }

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
