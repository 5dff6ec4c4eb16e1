use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use geo_types::Point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};

use crate::error::RouteError;
use crate::models::{Coordinate, RouteOption, StopRole};

const CREATOR: &str = "restwalk";

/// Serializes a route as a base64 GPX 1.1 document.
///
/// Every stop becomes a named waypoint. The track follows the walking path
/// when there is one, otherwise it joins the stops in order.
pub fn encode_route_as_gpx(route: &RouteOption) -> Result<String, RouteError> {
    let mut gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(CREATOR.into()),
        ..Default::default()
    };

    gpx.waypoints = route
        .stops
        .iter()
        .map(|stop| {
            let mut waypoint = to_waypoint(&stop.coordinate);
            waypoint.name = Some(stop.name.clone());
            waypoint.description = Some(stop.description.clone());
            waypoint.type_ = Some(role_label(stop.role).to_string());
            waypoint
        })
        .collect();

    let mut track = Track {
        name: Some(route.name.clone()),
        description: Some(route.description.clone()),
        ..Default::default()
    };
    let mut segment = TrackSegment::new();
    match &route.path {
        Some(path) => segment.points.extend(path.iter().map(to_waypoint)),
        None => segment
            .points
            .extend(route.stops.iter().map(|stop| to_waypoint(&stop.coordinate))),
    }
    track.segments.push(segment);
    gpx.tracks.push(track);

    let mut buffer = Vec::new();
    gpx::write(&gpx, &mut buffer)?;
    Ok(BASE64.encode(buffer))
}

fn to_waypoint(coord: &Coordinate) -> Waypoint {
    Waypoint::new(Point::new(coord.lng, coord.lat))
}

fn role_label(role: StopRole) -> &'static str {
    match role {
        StopRole::Start => "start",
        StopRole::Rest => "rest",
        StopRole::End => "end",
    }
}
