use crate::model::StatusResponse;
use axum::Json;

pub async fn health_handler() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}
