use serde::{Deserialize, Serialize};

/// WGS-84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    /// Linear blend in lat/lng space, `t = 0` is `self` and `t = 1` is `other`.
    pub fn interpolate(self, other: Self, t: f64) -> Self {
        Self {
            lat: self.lat + (other.lat - self.lat) * t,
            lng: self.lng + (other.lng - self.lng) * t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopRole {
    Start,
    Rest,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub name: String,
    pub description: String,
    /// Display string such as "0.8 km"; not meant to be parsed back.
    pub distance_from_previous: String,
    pub coordinate: Coordinate,
    pub role: StopRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOption {
    pub id: String,
    pub name: String,
    pub description: String,
    pub total_distance: String,
    pub estimated_duration: String,
    pub stops: Vec<Stop>,
    /// Full walking path, only present when a routing backend answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Coordinate>>,
}

impl RouteOption {
    /// True when the stop list starts with the start stop, ends with the end
    /// stop and only holds rest stops in between.
    pub fn has_valid_stop_roles(&self) -> bool {
        let n = self.stops.len();
        n >= 2
            && self.stops.iter().enumerate().all(|(idx, stop)| {
                let expected = match idx {
                    0 => StopRole::Start,
                    i if i == n - 1 => StopRole::End,
                    _ => StopRole::Rest,
                };
                stop.role == expected
            })
    }

    pub fn rest_stop_count(&self) -> usize {
        self.stops
            .iter()
            .filter(|stop| stop.role == StopRole::Rest)
            .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub origin: String,
    pub destination: String,
    /// Spacing between rest stops, in kilometers.
    #[serde(default = "default_interval_km")]
    pub interval: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpxExport {
    pub gpx_base64: String,
    pub route: RouteOption,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}

pub fn default_interval_km() -> f64 {
    1.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(role: StopRole) -> Stop {
        Stop {
            name: "x".into(),
            description: String::new(),
            distance_from_previous: "0 km".into(),
            coordinate: Coordinate::new(25.0, 121.5),
            role,
        }
    }

    fn route(stops: Vec<Stop>) -> RouteOption {
        RouteOption {
            id: "route-1".into(),
            name: "a → b".into(),
            description: String::new(),
            total_distance: "1.0 km".into(),
            estimated_duration: "15 min".into(),
            stops,
            path: None,
        }
    }

    #[test]
    fn coordinate_bounds() {
        assert!(Coordinate::new(90.0, -180.0).is_valid());
        assert!(!Coordinate::new(90.1, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 180.5).is_valid());
    }

    #[test]
    fn interpolate_midpoint() {
        let mid = Coordinate::new(0.0, 0.0).interpolate(Coordinate::new(10.0, 20.0), 0.5);
        assert_eq!(mid, Coordinate::new(5.0, 10.0));
    }

    #[test]
    fn stop_roles_validation() {
        assert!(route(vec![stop(StopRole::Start), stop(StopRole::End)]).has_valid_stop_roles());
        assert!(
            route(vec![
                stop(StopRole::Start),
                stop(StopRole::Rest),
                stop(StopRole::End)
            ])
            .has_valid_stop_roles()
        );
        assert!(!route(vec![stop(StopRole::Start)]).has_valid_stop_roles());
        assert!(
            !route(vec![
                stop(StopRole::Start),
                stop(StopRole::End),
                stop(StopRole::End)
            ])
            .has_valid_stop_roles()
        );
    }

    #[test]
    fn route_option_json_field_names() {
        let json = serde_json::to_value(route(vec![stop(StopRole::Start), stop(StopRole::End)]))
            .unwrap();
        assert_eq!(json["totalDistance"], "1.0 km");
        assert_eq!(json["estimatedDuration"], "15 min");
        assert_eq!(json["stops"][0]["role"], "start");
        assert_eq!(json["stops"][1]["distanceFromPrevious"], "0 km");
        assert_eq!(json["stops"][1]["coordinate"]["lng"], 121.5);
        assert!(json.get("path").is_none());
    }

    #[test]
    fn route_request_defaults_interval() {
        let req: RouteRequest =
            serde_json::from_str(r#"{"origin":"Taipei 101","destination":"Ximending"}"#).unwrap();
        assert_eq!(req.interval, 1.5);
    }
}
