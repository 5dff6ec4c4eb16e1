pub mod config;
pub mod error;
pub mod geo;
pub mod geocoding;
pub mod gpx_export;
pub mod models;
pub mod path_provider;
pub mod route_builder;
pub mod segmenter;

use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::RouteError;
use crate::geocoding::Geocoder;
use crate::gpx_export::encode_route_as_gpx;
use crate::models::{ApiError, GpxExport, RouteRequest};
use crate::path_provider::PathSource;
use crate::route_builder::RouteBuilder;

pub struct AppState<G, P> {
    pub builder: Arc<RouteBuilder<G, P>>,
}

impl<G, P> AppState<G, P> {
    pub fn new(builder: RouteBuilder<G, P>) -> Self {
        Self {
            builder: Arc::new(builder),
        }
    }
}

// Derive would require `G: Clone` and `P: Clone`.
impl<G, P> Clone for AppState<G, P> {
    fn clone(&self) -> Self {
        Self {
            builder: Arc::clone(&self.builder),
        }
    }
}

pub fn create_router<G, P>(state: AppState<G, P>) -> Router
where
    G: Geocoder + 'static,
    P: PathSource + 'static,
{
    Router::new()
        .route("/api/route", post(route_handler::<G, P>))
        .route("/api/route/gpx", post(gpx_handler::<G, P>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn route_handler<G: Geocoder, P: PathSource>(
    State(state): State<AppState<G, P>>,
    Json(req): Json<RouteRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let routes = state
        .builder
        .build_route(&req.origin, &req.destination, req.interval)
        .await
        .map_err(error_response)?;
    Ok(Json(routes))
}

async fn gpx_handler<G: Geocoder, P: PathSource>(
    State(state): State<AppState<G, P>>,
    Json(req): Json<RouteRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let route = state
        .builder
        .build_route_option(&req.origin, &req.destination, req.interval)
        .await
        .map_err(error_response)?;
    let gpx_base64 = encode_route_as_gpx(&route).map_err(error_response)?;
    Ok(Json(GpxExport { gpx_base64, route }))
}

fn error_response(err: RouteError) -> (StatusCode, Json<ApiError>) {
    let status = match &err {
        RouteError::LocationNotFound { .. } => StatusCode::NOT_FOUND,
        RouteError::InvalidInterval(_) => StatusCode::BAD_REQUEST,
        RouteError::Gpx(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("request failed: {err}");
    } else {
        tracing::debug!("request rejected: {err}");
    }
    (
        status,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}
