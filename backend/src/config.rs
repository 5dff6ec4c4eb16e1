use std::{net::SocketAddr, time::Duration};

use thiserror::Error;

use crate::path_provider::RoutingBackend;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_OSRM_URLS: &str =
    "https://routing.openstreetmap.de/routed-foot,https://router.project-osrm.org";
pub const DEFAULT_OSRM_PROFILE: &str = "foot";
pub const DEFAULT_ORS_URL: &str = "https://api.openrouteservice.org";
pub const DEFAULT_PREFERRED_REGION: &str = "tw";
pub const DEFAULT_MAX_NAMED_STOPS: usize = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid {expected}: {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Country code whose candidates win over the provider's top result.
    pub preferred_region: Option<String>,
    pub language: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub geocoder: GeocoderConfig,
    /// Routing backends, tried in this order.
    pub backends: Vec<RoutingBackend>,
    pub routing_timeout: Duration,
    /// Rest stops beyond this count get a generic name instead of a lookup.
    pub max_named_stops: usize,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any key lookup, `from_env` passes the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let bind_addr = parse_var(
            "RESTWALK_BIND_ADDR",
            var("RESTWALK_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            "socket address",
        )?;
        let timeout_secs: u64 = match var("RESTWALK_HTTP_TIMEOUT_SECS") {
            Some(value) => parse_var("RESTWALK_HTTP_TIMEOUT_SECS", value, "number of seconds")?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let max_named_stops = match var("RESTWALK_MAX_NAMED_STOPS") {
            Some(value) => parse_var("RESTWALK_MAX_NAMED_STOPS", value, "stop count")?,
            None => DEFAULT_MAX_NAMED_STOPS,
        };
        let timeout = Duration::from_secs(timeout_secs);

        // An explicitly empty region disables the preference.
        let preferred_region = match lookup("RESTWALK_PREFERRED_REGION") {
            Some(region) if region.trim().is_empty() => None,
            Some(region) => Some(region.trim().to_lowercase()),
            None => Some(DEFAULT_PREFERRED_REGION.to_string()),
        };

        let geocoder = GeocoderConfig {
            base_url: trim_url(
                var("RESTWALK_NOMINATIM_URL").unwrap_or_else(|| DEFAULT_NOMINATIM_URL.into()),
            ),
            user_agent: var("RESTWALK_USER_AGENT")
                .unwrap_or_else(|| format!("restwalk/{}", env!("CARGO_PKG_VERSION"))),
            preferred_region,
            language: var("RESTWALK_LANGUAGE"),
            timeout,
        };

        let profile =
            var("RESTWALK_OSRM_PROFILE").unwrap_or_else(|| DEFAULT_OSRM_PROFILE.to_string());
        let mut backends: Vec<RoutingBackend> = var("RESTWALK_OSRM_URLS")
            .unwrap_or_else(|| DEFAULT_OSRM_URLS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(|url| RoutingBackend::Osrm {
                base_url: trim_url(url.to_string()),
                profile: profile.clone(),
            })
            .collect();
        if let Some(api_key) = var("ORS_API_KEY") {
            backends.push(RoutingBackend::OpenRouteService {
                base_url: trim_url(var("ORS_URL").unwrap_or_else(|| DEFAULT_ORS_URL.into())),
                api_key,
            });
        }

        Ok(Self {
            bind_addr,
            geocoder,
            backends,
            routing_timeout: timeout,
            max_named_stops,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    name: &'static str,
    value: String,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        expected,
        value,
    })
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
