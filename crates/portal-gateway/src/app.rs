use axum::body::Body;
use axum::http::{HeaderName, Method, Request};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info_span;

use crate::handlers::{
    create_alias_handler, delete_alias_handler, health_handler, lookup_handler,
    update_alias_handler,
};
use crate::metrics::{metrics_handler, track_metrics};
use crate::state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// First path segments taken by fixed routes. An alias equal to one of these
/// would never be reachable through `GET /{alias}`.
pub const RESERVED_ALIASES: &[&str] = &["url", "health", "metrics"];

pub fn is_reserved(alias: &str) -> bool {
    RESERVED_ALIASES.contains(&alias)
}

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or_default();
                    info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id,
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_headers(Any)
                    .allow_methods([
                        Method::GET,
                        Method::POST,
                        Method::PUT,
                        Method::DELETE,
                        Method::OPTIONS,
                    ]),
            );

        Router::new()
            .route("/health", get(health_handler))
            .route("/url", post(create_alias_handler))
            .route(
                "/url/{alias}",
                put(update_alias_handler).delete(delete_alias_handler),
            )
            .route("/metrics", get(metrics_handler))
            .route("/{alias}", get(lookup_handler))
            .route_layer(from_fn_with_state(state.clone(), track_metrics))
            .layer(middleware)
            .with_state(state)
    }
}
