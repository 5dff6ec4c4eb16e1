pub use shared::{
    ApiError, Coordinate, GpxExport, RouteOption, RouteRequest, Stop, StopRole, default_interval_km,
};

/// A user-supplied place turned into a coordinate with display names.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub coordinate: Coordinate,
    pub short_name: String,
    pub display_name: String,
}

/// Walking path returned by a routing backend.
///
/// The first and last coordinates are the path's own endpoints, which the
/// backend may have snapped away from the requested origin and destination.
#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    pub coordinates: Vec<Coordinate>,
    pub total_distance_meters: f64,
    pub total_duration_seconds: f64,
    /// Name of the backend that produced the path.
    pub source: String,
}
