use thiserror::Error;

/// Failures surfaced to callers of the route pipeline.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("could not find \"{query}\"; try a more specific place name")]
    LocationNotFound { query: String },
    #[error("rest interval must be a positive number of kilometers, got {0}")]
    InvalidInterval(f64),
    #[error("failed to build GPX document: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
}

impl RouteError {
    pub fn location_not_found(query: impl Into<String>) -> Self {
        Self::LocationNotFound {
            query: query.into(),
        }
    }
}

/// Failures while wiring up the service from its configuration.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("failed to create geocoder client: {0}")]
    Geocoder(#[from] crate::geocoding::GeocodeError),
    #[error("failed to create routing client: {0}")]
    Routing(#[from] crate::path_provider::BackendError),
}
