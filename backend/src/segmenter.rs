use crate::geo::{distance_km, distance_meters, format_km, interpolate};
use crate::geocoding::{Geocoder, LocationResolver};
use crate::models::{Coordinate, PathResult, ResolvedLocation, Stop, StopRole};

/// A rest stop this close to the end of the path would duplicate the end stop.
pub const END_SUPPRESSION_METERS: f64 = 500.0;

/// Upper bound on interior stops for straight-line estimates.
pub const MAX_STRAIGHT_LINE_STOPS: usize = 8;

/// What the segmenter walks along.
#[derive(Debug, Clone, Copy)]
pub enum SegmentInput<'a> {
    /// A real walking path from a routing backend.
    AlongPath(&'a PathResult),
    /// No path available, stops are spread on the straight line.
    StraightLine,
}

/// Rest stop position on a path, with the distance walked to reach it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    pub coordinate: Coordinate,
    pub distance_m: f64,
}

pub struct Segmenter<'a, G> {
    resolver: &'a LocationResolver<G>,
    max_named_stops: usize,
}

impl<'a, G: Geocoder> Segmenter<'a, G> {
    pub fn new(resolver: &'a LocationResolver<G>, max_named_stops: usize) -> Self {
        Self {
            resolver,
            max_named_stops,
        }
    }

    /// Splits the leg into start, rest and end stops.
    ///
    /// The result always starts with the start stop and ends with the end
    /// stop, even when no rest stop fits.
    pub async fn segment(
        &self,
        origin: &ResolvedLocation,
        destination: &ResolvedLocation,
        input: SegmentInput<'_>,
        interval_km: f64,
    ) -> Vec<Stop> {
        let mut stops = vec![Stop {
            name: origin.short_name.clone(),
            description: format!("Starting point: {}", origin.display_name),
            distance_from_previous: format_km(0.0),
            coordinate: origin.coordinate,
            role: StopRole::Start,
        }];

        let last_leg_km = match input {
            SegmentInput::AlongPath(path) => {
                self.rest_stops_along(path, interval_km, &mut stops).await
            }
            SegmentInput::StraightLine => straight_line_rest_stops(
                origin.coordinate,
                destination.coordinate,
                interval_km,
                &mut stops,
            ),
        };

        stops.push(Stop {
            name: destination.short_name.clone(),
            description: format!("Destination: {}", destination.display_name),
            distance_from_previous: format_km(last_leg_km),
            coordinate: destination.coordinate,
            role: StopRole::End,
        });
        stops
    }

    /// Mode A. Returns the distance left between the last rest stop and the
    /// end of the path, in kilometers.
    async fn rest_stops_along(
        &self,
        path: &PathResult,
        interval_km: f64,
        stops: &mut Vec<Stop>,
    ) -> f64 {
        let boundaries = path_boundaries(
            &path.coordinates,
            path.total_distance_meters,
            interval_km * 1_000.0,
        );

        let mut attributed_m = 0.0;
        for (idx, boundary) in boundaries.iter().enumerate() {
            let number = idx + 1;
            let name = if idx < self.max_named_stops {
                self.resolver.reverse_resolve_name(boundary.coordinate).await
            } else {
                format!("Rest stop {number}")
            };
            stops.push(Stop {
                name,
                description: format!(
                    "Rest stop {number}, about {} from the start",
                    format_km(boundary.distance_m / 1_000.0)
                ),
                distance_from_previous: format_km(
                    (boundary.distance_m - attributed_m) / 1_000.0,
                ),
                coordinate: boundary.coordinate,
                role: StopRole::Rest,
            });
            attributed_m = boundary.distance_m;
        }

        if boundaries.len() > self.max_named_stops {
            tracing::debug!(
                "named {} of {} rest stops, the rest got generic names",
                self.max_named_stops,
                boundaries.len()
            );
        }

        // The backend's total can disagree with the summed polyline.
        ((path.total_distance_meters - attributed_m) / 1_000.0).max(0.0)
    }
}

/// Single left-to-right pass over the polyline emitting one boundary per
/// interval crossed.
///
/// A boundary sits at the ending coordinate of the segment where the walked
/// distance first reaches it. When one segment crosses several boundaries,
/// all but the last are placed at their interpolated position inside it. The
/// last one is interpolated too when the segment ends within
/// [`END_SUPPRESSION_METERS`] of `total_m`, so no rest stop lands on the end.
/// Boundaries closer than [`END_SUPPRESSION_METERS`] to `total_m` are skipped.
pub fn path_boundaries(path: &[Coordinate], total_m: f64, interval_m: f64) -> Vec<Boundary> {
    let mut boundaries = Vec::new();
    if !(interval_m.is_finite() && interval_m > 0.0) {
        return boundaries;
    }

    let mut covered = 0.0;
    let mut next_target = interval_m;
    let mut crossed = Vec::new();

    for w in path.windows(2) {
        let segment = distance_meters(w[0], w[1]);
        let reached = covered + segment;

        crossed.clear();
        while reached >= next_target && total_m - next_target >= END_SUPPRESSION_METERS {
            crossed.push(next_target);
            next_target += interval_m;
        }

        if let Some((&last, earlier)) = crossed.split_last() {
            let inside = |target: f64| {
                let t = if segment > 0.0 { (target - covered) / segment } else { 1.0 };
                Boundary {
                    coordinate: w[0].interpolate(w[1], t),
                    distance_m: target,
                }
            };
            boundaries.extend(earlier.iter().map(|&target| inside(target)));
            boundaries.push(if total_m - reached < END_SUPPRESSION_METERS {
                inside(last)
            } else {
                Boundary {
                    coordinate: w[1],
                    distance_m: reached,
                }
            });
        }

        covered = reached;
    }

    boundaries
}

/// Number of interior stops for a straight-line leg, `floor(total / interval)`
/// clamped to `[0, MAX_STRAIGHT_LINE_STOPS]`.
pub fn straight_line_stop_count(total_km: f64, interval_km: f64) -> usize {
    if !(interval_km.is_finite() && interval_km > 0.0 && total_km.is_finite()) {
        return 0;
    }
    ((total_km / interval_km).floor().max(0.0) as usize).min(MAX_STRAIGHT_LINE_STOPS)
}

/// Mode B. Returns the leftover distance for the end stop, rounded to one
/// decimal.
fn straight_line_rest_stops(
    origin: Coordinate,
    destination: Coordinate,
    interval_km: f64,
    stops: &mut Vec<Stop>,
) -> f64 {
    let total_km = distance_km(origin, destination);
    let count = straight_line_stop_count(total_km, interval_km);
    // Points are spread evenly, which differs from the interval once clamped.
    let spacing_km = total_km / (count + 1) as f64;

    stops.extend(
        interpolate(origin, destination, count)
            .into_iter()
            .enumerate()
            .map(|(idx, coordinate)| Stop {
                name: format!("Rest point {}", idx + 1),
                description: "Straight-line estimate, not a real waypoint".to_string(),
                distance_from_previous: format_km(spacing_km),
                coordinate,
                role: StopRole::Rest,
            }),
    );

    let leftover = total_km - count as f64 * interval_km;
    ((leftover * 10.0).round() / 10.0).max(0.0)
}
