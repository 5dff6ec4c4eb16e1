use std::{fmt, future::Future, time::Duration};

use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::models::{Coordinate, PathResult};

/// A walking-route service, tried in configuration order.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingBackend {
    /// OSRM-compatible `/route/v1/{profile}` endpoint.
    Osrm { base_url: String, profile: String },
    /// OpenRouteService `foot-walking` directions.
    OpenRouteService { base_url: String, api_key: String },
}

impl fmt::Display for RoutingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingBackend::Osrm { base_url, .. } => write!(f, "OSRM ({base_url})"),
            RoutingBackend::OpenRouteService { base_url, .. } => {
                write!(f, "OpenRouteService ({base_url})")
            }
        }
    }
}

impl RoutingBackend {
    /// Provider name shown to users, without the endpoint.
    pub fn label(&self) -> &'static str {
        match self {
            RoutingBackend::Osrm { .. } => "OSRM",
            RoutingBackend::OpenRouteService { .. } => "OpenRouteService",
        }
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("backend answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to parse backend response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("backend returned no usable route")]
    NoRoute,
}

/// Source of walking paths. `None` means no path could be obtained and the
/// caller should fall back to a straight-line estimate.
pub trait PathSource: Send + Sync {
    fn get_walking_path(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> impl Future<Output = Option<PathResult>> + Send;
}

#[derive(Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    geometry: LineString,
    distance: f64,
    duration: f64,
}

#[derive(Deserialize)]
struct LineString {
    /// GeoJSON positions, `[lng, lat]` with an optional elevation.
    coordinates: Vec<Vec<f64>>,
}

#[derive(Deserialize)]
struct OrsResponse {
    #[serde(default)]
    features: Vec<OrsFeature>,
}

#[derive(Deserialize)]
struct OrsFeature {
    geometry: LineString,
    properties: OrsProperties,
}

#[derive(Deserialize)]
struct OrsProperties {
    summary: OrsSummary,
}

// ORS leaves out zero-valued summary fields.
#[derive(Deserialize)]
struct OrsSummary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

pub struct PathProvider {
    client: Client,
    backends: Vec<RoutingBackend>,
}

impl PathProvider {
    pub fn new(backends: Vec<RoutingBackend>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, backends })
    }

    pub fn backends(&self) -> &[RoutingBackend] {
        &self.backends
    }

    async fn request_path(
        &self,
        backend: &RoutingBackend,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<PathResult, BackendError> {
        match backend {
            RoutingBackend::Osrm { base_url, profile } => {
                let url = format!(
                    "{base_url}/route/v1/{profile}/{},{};{},{}",
                    start.lng, start.lat, end.lng, end.lat
                );
                let response = self
                    .client
                    .get(&url)
                    .query(&[("overview", "full"), ("geometries", "geojson")])
                    .send()
                    .await?;
                let body = read_success(response).await?;
                let parsed: OsrmResponse = serde_json::from_str(&body)?;
                if parsed.code != "Ok" {
                    return Err(BackendError::NoRoute);
                }
                let route = parsed.routes.into_iter().next().ok_or(BackendError::NoRoute)?;
                path_result(
                    route.geometry,
                    route.distance,
                    route.duration,
                    backend.label().to_string(),
                )
            }
            RoutingBackend::OpenRouteService { base_url, api_key } => {
                let url = format!("{base_url}/v2/directions/foot-walking/geojson");
                let body = json!({
                    "coordinates": [[start.lng, start.lat], [end.lng, end.lat]]
                });
                let response = self
                    .client
                    .post(&url)
                    .header("Authorization", api_key)
                    .json(&body)
                    .send()
                    .await?;
                let body = read_success(response).await?;
                let parsed: OrsResponse = serde_json::from_str(&body)?;
                let feature = parsed
                    .features
                    .into_iter()
                    .next()
                    .ok_or(BackendError::NoRoute)?;
                let summary = feature.properties.summary;
                path_result(
                    feature.geometry,
                    summary.distance,
                    summary.duration,
                    backend.label().to_string(),
                )
            }
        }
    }
}

impl PathSource for PathProvider {
    async fn get_walking_path(&self, start: Coordinate, end: Coordinate) -> Option<PathResult> {
        for backend in &self.backends {
            match self.request_path(backend, start, end).await {
                Ok(path) => {
                    tracing::debug!(
                        "{backend} returned {} points over {:.0} m",
                        path.coordinates.len(),
                        path.total_distance_meters
                    );
                    return Some(path);
                }
                Err(err) => tracing::warn!("{backend} failed, trying next backend: {err}"),
            }
        }
        tracing::info!(
            "no walking path from {} backend(s), falling back to a straight line",
            self.backends.len()
        );
        None
    }
}

async fn read_success(response: Response) -> Result<String, BackendError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(BackendError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

fn path_result(
    geometry: LineString,
    distance_meters: f64,
    duration_seconds: f64,
    source: String,
) -> Result<PathResult, BackendError> {
    let coordinates: Vec<Coordinate> = geometry
        .coordinates
        .iter()
        .filter_map(|position| match position.as_slice() {
            [lng, lat, ..] => Some(Coordinate::new(*lat, *lng)),
            _ => None,
        })
        .collect();
    if coordinates.len() < 2
        || coordinates.len() != geometry.coordinates.len()
        || !distance_meters.is_finite()
        || distance_meters < 0.0
    {
        return Err(BackendError::NoRoute);
    }
    Ok(PathResult {
        coordinates,
        total_distance_meters: distance_meters,
        total_duration_seconds: duration_seconds.max(0.0),
        source,
    })
}
