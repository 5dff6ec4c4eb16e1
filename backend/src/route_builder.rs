use crate::config::ServiceConfig;
use crate::error::{RouteError, SetupError};
use crate::geo::{distance_km, format_duration, format_km, walking_duration_seconds};
use crate::geocoding::{Geocoder, LocationResolver, NominatimGeocoder};
use crate::models::{ResolvedLocation, RouteOption};
use crate::path_provider::{PathProvider, PathSource};
use crate::segmenter::{SegmentInput, Segmenter};

pub const ORIGIN_LABEL: &str = "Current location";
pub const DESTINATION_LABEL: &str = "Specified destination";

/// Resolves both endpoints, fetches a walking path and cuts it into stops.
pub struct RouteBuilder<G, P> {
    resolver: LocationResolver<G>,
    paths: P,
    max_named_stops: usize,
}

impl RouteBuilder<NominatimGeocoder, PathProvider> {
    pub fn from_config(config: &ServiceConfig) -> Result<Self, SetupError> {
        let geocoder = NominatimGeocoder::new(&config.geocoder)?;
        let paths = PathProvider::new(config.backends.clone(), config.routing_timeout)?;
        tracing::info!(
            "routing backends in order: {}",
            paths
                .backends()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(Self::new(
            LocationResolver::new(geocoder, config.geocoder.preferred_region.clone()),
            paths,
            config.max_named_stops,
        ))
    }
}

impl<G: Geocoder, P: PathSource> RouteBuilder<G, P> {
    pub fn new(resolver: LocationResolver<G>, paths: P, max_named_stops: usize) -> Self {
        Self {
            resolver,
            paths,
            max_named_stops,
        }
    }

    /// Builds the route options for one request.
    ///
    /// The list always holds exactly one option, see [`Self::build_route_option`].
    pub async fn build_route(
        &self,
        origin_text: &str,
        destination_text: &str,
        interval_km: f64,
    ) -> Result<Vec<RouteOption>, RouteError> {
        let route = self
            .build_route_option(origin_text, destination_text, interval_km)
            .await?;
        Ok(vec![route])
    }

    /// Builds the single route: along the real walking path when a backend
    /// answered, a straight-line estimate otherwise. Only an unresolvable
    /// endpoint or a bad interval is an error.
    pub async fn build_route_option(
        &self,
        origin_text: &str,
        destination_text: &str,
        interval_km: f64,
    ) -> Result<RouteOption, RouteError> {
        if !(interval_km.is_finite() && interval_km > 0.0) {
            return Err(RouteError::InvalidInterval(interval_km));
        }

        let origin = self.resolver.resolve_input(origin_text, ORIGIN_LABEL).await?;
        let destination = self
            .resolver
            .resolve_input(destination_text, DESTINATION_LABEL)
            .await?;

        let segmenter = Segmenter::new(&self.resolver, self.max_named_stops);
        let route = match self
            .paths
            .get_walking_path(origin.coordinate, destination.coordinate)
            .await
        {
            Some(path) => {
                let stops = segmenter
                    .segment(
                        &origin,
                        &destination,
                        SegmentInput::AlongPath(&path),
                        interval_km,
                    )
                    .await;
                RouteOption {
                    id: route_id(),
                    name: route_name(&origin, &destination),
                    description: format!(
                        "Walking route from {} to {} following {}, \
                         with a rest stop about every {}.",
                        origin.display_name,
                        destination.display_name,
                        path.source,
                        format_km(interval_km)
                    ),
                    total_distance: format_km(path.total_distance_meters / 1_000.0),
                    estimated_duration: format_duration(path.total_duration_seconds),
                    stops,
                    path: Some(path.coordinates),
                }
            }
            None => {
                let total_km = distance_km(origin.coordinate, destination.coordinate);
                let stops = segmenter
                    .segment(
                        &origin,
                        &destination,
                        SegmentInput::StraightLine,
                        interval_km,
                    )
                    .await;
                RouteOption {
                    id: route_id(),
                    name: route_name(&origin, &destination),
                    description: format!(
                        "Straight-line estimate from {} to {}: no walking path was \
                         available, so rest points are spread along a straight line \
                         and are not real waypoints.",
                        origin.display_name, destination.display_name
                    ),
                    total_distance: format_km(total_km),
                    estimated_duration: format_duration(walking_duration_seconds(total_km)),
                    stops,
                    path: None,
                }
            }
        };

        tracing::info!(
            "built route {:?}: {} over {} stops",
            route.name,
            route.total_distance,
            route.stops.len()
        );
        Ok(route)
    }
}

fn route_id() -> String {
    "route-1".to_string()
}

fn route_name(origin: &ResolvedLocation, destination: &ResolvedLocation) -> String {
    format!("{} → {}", origin.short_name, destination.short_name)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geo::path_length_meters;
    use crate::geocoding::tests::{place, FakeGeocoder};
    use crate::geocoding::{Address, ROUTE_POINT_FALLBACK};
    use crate::models::{Coordinate, PathResult, StopRole};

    const METERS_PER_DEGREE: f64 = 6_371_000.0 * std::f64::consts::PI / 180.0;

    /// Path source answering with a fixed path, or nothing.
    pub(crate) struct FixedPath(pub Option<PathResult>);

    impl PathSource for FixedPath {
        async fn get_walking_path(
            &self,
            _start: Coordinate,
            _end: Coordinate,
        ) -> Option<PathResult> {
            self.0.clone()
        }
    }

    fn named(name: &str, coordinate: Coordinate) -> crate::geocoding::Place {
        place(
            coordinate.lat,
            coordinate.lng,
            &format!("{name}, Taipei, Taiwan"),
            Address {
                tourism: Some(name.to_string()),
                country_code: Some("tw".into()),
                ..Default::default()
            },
        )
    }

    /// "A" and "B" resolve to points `km` apart on the same meridian.
    pub(crate) fn geocoder_with_a_and_b(km: f64) -> FakeGeocoder {
        let a = Coordinate::new(25.0, 121.5);
        let b = Coordinate::new(25.0 + km * 1_000.0 / METERS_PER_DEGREE, 121.5);
        FakeGeocoder::default()
            .with_place("A", named("A", a))
            .with_place("B", named("B", b))
    }

    fn builder(
        geocoder: FakeGeocoder,
        path: Option<PathResult>,
    ) -> RouteBuilder<FakeGeocoder, FixedPath> {
        RouteBuilder::new(
            LocationResolver::new(geocoder, Some("tw".into())),
            FixedPath(path),
            10,
        )
    }

    #[tokio::test]
    async fn straight_line_fallback_end_to_end() {
        // 5.02 km with a 1 km interval: floor gives 5 rest points, leftover rounds to 0.
        let routes = builder(geocoder_with_a_and_b(5.02), None)
            .build_route("A", "B", 1.0)
            .await
            .unwrap();

        assert_eq!(routes.len(), 1);
        let route = &routes[0];
        assert!(route.has_valid_stop_roles());
        assert_eq!(route.rest_stop_count(), 5);
        assert_eq!(route.stops.len(), 7);
        assert_eq!(route.stops.last().unwrap().distance_from_previous, "0 km");
        assert!(route.path.is_none());
        assert!(route.description.starts_with("Straight-line estimate"));
        assert_eq!(route.total_distance, "5.0 km");
        assert_eq!(route.estimated_duration, "1 h 15 min");
        assert_eq!(route.name, "A → B");
        assert_eq!(route.stops[0].name, "A");
    }

    #[tokio::test]
    async fn real_path_is_segmented_and_returned() {
        let geocoder = geocoder_with_a_and_b(3.0);
        let coordinates: Vec<Coordinate> = (0..=36)
            .map(|i| Coordinate::new(25.0 + (i as f64 * 100.0 + 5.0) / METERS_PER_DEGREE, 121.5))
            .collect();
        let path = PathResult {
            total_distance_meters: path_length_meters(&coordinates),
            total_duration_seconds: 2_520.0,
            coordinates: coordinates.clone(),
            source: "OSRM".into(),
        };

        let routes = builder(geocoder, Some(path))
            .build_route("A", "B", 0.97)
            .await
            .unwrap();

        let route = &routes[0];
        assert!(route.has_valid_stop_roles());
        // 3.6 km in 100 m steps: stops land on the 1, 2 and 3 km vertices.
        assert_eq!(route.rest_stop_count(), 3);
        assert_eq!(route.path.as_deref(), Some(coordinates.as_slice()));
        assert_eq!(route.total_distance, "3.6 km");
        assert_eq!(route.estimated_duration, "42 min");
        assert!(route.description.contains("following OSRM,"));
        assert!(!route.description.contains("http"));
        assert_eq!(route.stops[1].name, ROUTE_POINT_FALLBACK);
        assert_eq!(route.stops[2].distance_from_previous, "1.0 km");
        assert_eq!(route.stops[4].distance_from_previous, "0.6 km");
    }

    #[tokio::test]
    async fn route_list_wraps_the_single_option() {
        let builder = builder(geocoder_with_a_and_b(2.5), None);
        let option = builder.build_route_option("A", "B", 1.0).await.unwrap();
        let routes = builder.build_route("A", "B", 1.0).await.unwrap();
        assert_eq!(routes, vec![option]);

        assert!(matches!(
            builder.build_route_option("Nowhere", "B", 1.0).await,
            Err(RouteError::LocationNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_endpoint_is_fatal() {
        let err = builder(geocoder_with_a_and_b(1.0), None)
            .build_route("A", "Nowhere", 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::LocationNotFound { ref query } if query == "Nowhere"));
    }

    #[tokio::test]
    async fn invalid_interval_is_rejected() {
        let builder = builder(geocoder_with_a_and_b(1.0), None);
        for interval in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                builder.build_route("A", "B", interval).await,
                Err(RouteError::InvalidInterval(_))
            ));
        }
    }

    #[tokio::test]
    async fn same_origin_and_destination() {
        let routes = builder(geocoder_with_a_and_b(1.0), None)
            .build_route("A", "A", 1.5)
            .await
            .unwrap();
        let route = &routes[0];
        assert_eq!(route.stops.len(), 2);
        assert_eq!(route.stops[0].role, StopRole::Start);
        assert_eq!(route.stops[1].role, StopRole::End);
        assert_eq!(route.total_distance, "0 km");
        assert_eq!(route.stops[1].distance_from_previous, "0 km");
    }

    #[tokio::test]
    async fn literal_coordinates_get_generic_labels() {
        let routes = builder(FakeGeocoder::default(), None)
            .build_route("25.0330,121.5654", "25.0421, 121.5080", 1.0)
            .await
            .unwrap();
        let route = &routes[0];
        assert_eq!(route.stops[0].name, ORIGIN_LABEL);
        assert_eq!(route.stops.last().unwrap().name, DESTINATION_LABEL);
        assert_eq!(route.name, format!("{ORIGIN_LABEL} → {DESTINATION_LABEL}"));
    }
}
