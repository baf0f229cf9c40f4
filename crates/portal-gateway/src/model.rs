mod url;

pub use self::url::*;

use serde::Serialize;

pub const STATUS_OK: &str = "OK";
pub const STATUS_ERROR: &str = "Error";

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: STATUS_OK }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR,
            error: error.into(),
        }
    }
}
