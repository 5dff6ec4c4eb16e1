use std::future::Future;

use reqwest::{header::ACCEPT_LANGUAGE, Client, RequestBuilder, Response};
use serde::Deserialize;
use thiserror::Error;

use crate::config::GeocoderConfig;
use crate::error::RouteError;
use crate::models::{Coordinate, ResolvedLocation};

/// Name given to path points whose reverse lookup failed or came back empty.
pub const ROUTE_POINT_FALLBACK: &str = "Point along the route";

const SEARCH_LIMIT: &str = "5";

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("geocoder answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to parse geocoder response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Structured address fields of a geocoding result.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Address {
    pub tourism: Option<String>,
    pub building: Option<String>,
    pub amenity: Option<String>,
    pub shop: Option<String>,
    pub leisure: Option<String>,
    pub road: Option<String>,
    pub neighbourhood: Option<String>,
    pub suburb: Option<String>,
    pub city_district: Option<String>,
    pub village: Option<String>,
    pub town: Option<String>,
    pub city: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub coordinate: Coordinate,
    pub name: Option<String>,
    pub display_name: String,
    pub address: Address,
}

/// Geocoding collaborator: free text to candidates, coordinate to place.
pub trait Geocoder: Send + Sync {
    /// Candidates ranked by the provider, best first. Empty when nothing matched.
    fn forward_geocode(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<Place>, GeocodeError>> + Send;

    fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> impl Future<Output = Result<Option<Place>, GeocodeError>> + Send;
}

/// Client for a Nominatim-compatible search API.
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    language: Option<String>,
}

#[derive(Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    address: Address,
}

impl NominatimPlace {
    fn into_place(self) -> Option<Place> {
        let coordinate = Coordinate::new(self.lat.parse().ok()?, self.lon.parse().ok()?);
        coordinate.is_valid().then(|| Place {
            coordinate,
            name: self.name.filter(|name| !name.trim().is_empty()),
            display_name: self.display_name,
            address: self.address,
        })
    }
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            language: config.language.clone(),
        })
    }

    fn get(&self, endpoint: &str) -> RequestBuilder {
        let request = self.client.get(format!("{}/{endpoint}", self.base_url));
        match &self.language {
            Some(language) => request.header(ACCEPT_LANGUAGE, language),
            None => request,
        }
    }

    async fn read_success(response: Response) -> Result<String, GeocodeError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GeocodeError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

impl Geocoder for NominatimGeocoder {
    async fn forward_geocode(&self, query: &str) -> Result<Vec<Place>, GeocodeError> {
        tracing::debug!("forward geocoding {query:?}");
        let response = self
            .get("search")
            .query(&[
                ("q", query),
                ("format", "jsonv2"),
                ("addressdetails", "1"),
                ("limit", SEARCH_LIMIT),
            ])
            .send()
            .await?;
        let body = Self::read_success(response).await?;
        let places: Vec<NominatimPlace> = serde_json::from_str(&body)?;
        Ok(places
            .into_iter()
            .filter_map(NominatimPlace::into_place)
            .collect())
    }

    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<Option<Place>, GeocodeError> {
        let response = self
            .get("reverse")
            .query(&[
                ("lat", coordinate.lat.to_string()),
                ("lon", coordinate.lng.to_string()),
                ("format", "jsonv2".to_string()),
                ("addressdetails", "1".to_string()),
                ("zoom", "18".to_string()),
            ])
            .send()
            .await?;
        let body = Self::read_success(response).await?;
        // Nominatim reports "nothing here" as a 200 with an `error` field.
        let value: serde_json::Value = serde_json::from_str(&body)?;
        if let Some(error) = value.get("error") {
            tracing::debug!("reverse geocoding {coordinate:?} found nothing: {error}");
            return Ok(None);
        }
        let place: NominatimPlace = serde_json::from_value(value)?;
        Ok(place.into_place())
    }
}

/// Turns user input into coordinates and coordinates into display names.
pub struct LocationResolver<G> {
    geocoder: G,
    preferred_region: Option<String>,
}

impl<G: Geocoder> LocationResolver<G> {
    pub fn new(geocoder: G, preferred_region: Option<String>) -> Self {
        Self {
            geocoder,
            preferred_region: preferred_region.map(|region| region.to_lowercase()),
        }
    }

    #[cfg(test)]
    pub(crate) fn geocoder(&self) -> &G {
        &self.geocoder
    }

    /// Resolves free text or a literal `"lat,lng"` pair.
    ///
    /// Literal coordinates keep `label` as their short name, since the user
    /// gave a position rather than a place.
    pub async fn resolve_input(
        &self,
        text: &str,
        label: &str,
    ) -> Result<ResolvedLocation, RouteError> {
        let query = text.trim();
        if query.is_empty() {
            return Err(RouteError::location_not_found(text));
        }

        if let Some(coordinate) = parse_coordinate_literal(query) {
            tracing::debug!("{query:?} is a literal coordinate");
            return Ok(ResolvedLocation {
                coordinate,
                short_name: label.to_string(),
                display_name: self.reverse_resolve_name(coordinate).await,
            });
        }

        let candidates = match self.geocoder.forward_geocode(query).await {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!("geocoding {query:?} failed: {err}");
                return Err(RouteError::location_not_found(query));
            }
        };

        let place = select_candidate(&candidates, self.preferred_region.as_deref())
            .ok_or_else(|| RouteError::location_not_found(query))?;
        tracing::debug!(
            "resolved {query:?} to {} ({} candidates)",
            place.display_name,
            candidates.len()
        );

        Ok(ResolvedLocation {
            coordinate: place.coordinate,
            short_name: derive_short_name(place, query),
            display_name: if place.display_name.is_empty() {
                query.to_string()
            } else {
                place.display_name.clone()
            },
        })
    }

    /// Best-effort place name for a point on the route. Never fails.
    pub async fn reverse_resolve_name(&self, coordinate: Coordinate) -> String {
        match self.geocoder.reverse_geocode(coordinate).await {
            Ok(Some(place)) => address_short_name(&place.address)
                .or_else(|| raw_label(&place))
                .unwrap_or_else(|| ROUTE_POINT_FALLBACK.to_string()),
            Ok(None) => ROUTE_POINT_FALLBACK.to_string(),
            Err(err) => {
                tracing::warn!("reverse geocoding {coordinate:?} failed: {err}");
                ROUTE_POINT_FALLBACK.to_string()
            }
        }
    }
}

/// Parses `"lat,lng"` when both parts are numbers inside WGS-84 bounds.
pub fn parse_coordinate_literal(text: &str) -> Option<Coordinate> {
    let (lat, lng) = text.split_once(',')?;
    let coordinate = Coordinate::new(lat.trim().parse().ok()?, lng.trim().parse().ok()?);
    (coordinate.lat.is_finite() && coordinate.lng.is_finite() && coordinate.is_valid())
        .then_some(coordinate)
}

fn select_candidate<'a>(
    candidates: &'a [Place],
    preferred_region: Option<&str>,
) -> Option<&'a Place> {
    preferred_region
        .and_then(|region| {
            candidates.iter().find(|place| {
                place
                    .address
                    .country_code
                    .as_deref()
                    .is_some_and(|code| code.eq_ignore_ascii_case(region))
            })
        })
        .or_else(|| candidates.first())
}

/// Point of interest, then road, then locality.
pub fn address_short_name(address: &Address) -> Option<String> {
    [
        &address.tourism,
        &address.building,
        &address.amenity,
        &address.shop,
        &address.leisure,
        &address.road,
        &address.neighbourhood,
        &address.suburb,
        &address.city_district,
        &address.village,
        &address.town,
        &address.city,
    ]
    .into_iter()
    .flatten()
    .map(|value| value.trim())
    .find(|value| !value.is_empty())
    .map(str::to_string)
}

fn raw_label(place: &Place) -> Option<String> {
    place.name.clone().or_else(|| {
        place
            .display_name
            .split(',')
            .map(str::trim)
            .find(|part| !part.is_empty())
            .map(str::to_string)
    })
}

fn derive_short_name(place: &Place, query: &str) -> String {
    address_short_name(&place.address)
        .or_else(|| raw_label(place))
        .unwrap_or_else(|| query.to_string())
}
