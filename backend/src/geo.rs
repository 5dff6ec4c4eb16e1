use crate::models::Coordinate;

pub const EARTH_RADIUS_KM: f64 = 6_371.0;
pub const EARTH_RADIUS_M: f64 = EARTH_RADIUS_KM * 1_000.0;

/// Walking pace used when no routing backend gave us a duration.
pub const WALKING_MINUTES_PER_KM: f64 = 15.0;

/// Great-circle distance in kilometers.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    EARTH_RADIUS_KM * central_angle(a, b)
}

/// Great-circle distance in meters, used for path accumulation.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    EARTH_RADIUS_M * central_angle(a, b)
}

fn central_angle(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlng = (dlng / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlng * sin_dlng;
    // Rounding can push h slightly above 1 for antipodal points.
    2.0 * h.sqrt().min(1.0).asin()
}

/// `count` points evenly spaced by fraction between `a` and `b`, endpoints
/// excluded, ordered from `a` towards `b`.
///
/// The blend is linear in lat/lng, so points drift off the great circle on
/// long legs. Only the straight-line fallback uses it.
pub fn interpolate(a: Coordinate, b: Coordinate, count: usize) -> Vec<Coordinate> {
    let steps = (count + 1) as f64;
    (1..=count)
        .map(|i| a.interpolate(b, i as f64 / steps))
        .collect()
}

pub fn path_length_meters(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|w| distance_meters(w[0], w[1])).sum()
}

/// One decimal, two below 0.1 km so short legs don't read as zero.
pub fn format_km(km: f64) -> String {
    if km < 0.005 || !km.is_finite() {
        "0 km".to_string()
    } else if km < 0.095 {
        format!("{km:.2} km")
    } else {
        format!("{km:.1} km")
    }
}

pub fn format_duration(seconds: f64) -> String {
    let minutes = (seconds.max(0.0) / 60.0).round() as u64;
    let (hours, minutes) = (minutes / 60, minutes % 60);
    match (hours, minutes) {
        (0, m) => format!("{m} min"),
        (h, 0) => format!("{h} h"),
        (h, m) => format!("{h} h {m} min"),
    }
}

/// Duration estimate for a distance walked at the fixed heuristic pace.
pub fn walking_duration_seconds(km: f64) -> f64 {
    km * WALKING_MINUTES_PER_KM * 60.0
}
