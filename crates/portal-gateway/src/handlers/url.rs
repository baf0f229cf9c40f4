use crate::app::is_reserved;
use crate::error::{AppError, Result};
use crate::model::{
    CreateAliasRequest, CreateAliasResponse, LookupResponse, StatusResponse, UpdateAliasRequest,
    UpdateAliasResponse, STATUS_OK,
};
use crate::state::{AppState, LookupMode};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use portal_core::{CreateParams, DirectoryError};
use tracing::{debug, error};
use url::Url;

fn decode<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        debug!(error = %rejection, "failed to decode request body");
        AppError::BadRequest("failed to decode request".to_string())
    })
}

/// Aliases that would be shadowed by fixed routes can't be stored.
fn ensure_routable(alias: Option<&str>) -> Result<()> {
    match alias {
        Some(alias) if is_reserved(alias) => Err(DirectoryError::InvalidInput(format!(
            "alias '{}' is reserved",
            alias
        ))
        .into()),
        _ => Ok(()),
    }
}

pub async fn create_alias_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateAliasRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateAliasResponse>)> {
    let request = decode(payload)?;
    ensure_routable(request.alias.as_deref())?;

    let created = state
        .directory()
        .create(CreateParams {
            url: request.url,
            alias: request.alias,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateAliasResponse {
            status: STATUS_OK,
            alias: created.alias.into_string(),
        }),
    ))
}

pub async fn lookup_handler(
    Path(alias): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let url = state.directory().lookup(&alias).await?;

    match state.lookup_mode() {
        LookupMode::Json => Ok(Json(LookupResponse {
            status: STATUS_OK,
            url,
        })
        .into_response()),
        LookupMode::Redirect => {
            let location = location_header(&url)?;
            Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
        }
    }
}

/// Builds a `Location` value. Non-ASCII URLs are sent in their
/// percent-encoded serialization, since `HeaderValue` would accept raw UTF-8.
fn location_header(url: &str) -> Result<HeaderValue> {
    if url.is_ascii() {
        if let Ok(value) = HeaderValue::from_str(url) {
            return Ok(value);
        }
    }

    Url::parse(url)
        .ok()
        .and_then(|parsed| HeaderValue::from_str(parsed.as_str()).ok())
        .ok_or_else(|| {
            error!(url, "stored url cannot be used as a Location header");
            AppError::Directory(DirectoryError::Internal)
        })
}

pub async fn update_alias_handler(
    Path(alias): Path<String>,
    State(state): State<AppState>,
    payload: std::result::Result<Json<UpdateAliasRequest>, JsonRejection>,
) -> Result<Json<UpdateAliasResponse>> {
    let request = decode(payload)?;
    ensure_routable(request.new_alias.as_deref())?;

    let renamed = state
        .directory()
        .update(&alias, request.new_alias.as_deref())
        .await?;

    Ok(Json(UpdateAliasResponse {
        status: STATUS_OK,
        alias: renamed.into_string(),
    }))
}

pub async fn delete_alias_handler(
    Path(alias): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>> {
    state.directory().delete(&alias).await?;
    Ok(Json(StatusResponse::ok()))
}
