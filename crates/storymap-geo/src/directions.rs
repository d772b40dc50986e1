//! Directions client: route lookup between places.
//!
//! A pure pass-through for presentation. Routes are never merged into a
//! map's place set.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::geocode::GeoError;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Travel mode accepted by the directions service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Transit,
    Bicycling,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Driving => "driving",
            Self::Walking => "walking",
            Self::Transit => "transit",
            Self::Bicycling => "bicycling",
        }
    }
}

/// A computed route between two places.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub distance: String,
    pub duration: String,
    pub start_address: String,
    pub end_address: String,
    pub steps: Vec<RouteStep>,
    /// Encoded overview polyline, passed through for rendering.
    pub polyline: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteStep {
    pub instruction: String,
    pub distance: String,
    pub duration: String,
}

/// Client for the directions endpoint.
pub struct DirectionsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<WireRoute>,
}

#[derive(Deserialize)]
struct WireRoute {
    #[serde(default)]
    legs: Vec<WireLeg>,
    overview_polyline: WirePolyline,
}

#[derive(Deserialize)]
struct WirePolyline {
    #[serde(default)]
    points: String,
}

#[derive(Deserialize)]
struct WireLeg {
    distance: WireText,
    duration: WireText,
    #[serde(default)]
    start_address: String,
    #[serde(default)]
    end_address: String,
    #[serde(default)]
    steps: Vec<WireStep>,
}

#[derive(Deserialize)]
struct WireStep {
    html_instructions: String,
    distance: WireText,
    duration: WireText,
}

#[derive(Deserialize)]
struct WireText {
    text: String,
}

impl DirectionsClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Look up a route. `Ok(None)` when the service cannot find one.
    pub async fn route(
        &self,
        origin: (f64, f64),
        destination: (f64, f64),
        waypoints: &[(f64, f64)],
        mode: TravelMode,
    ) -> Result<Option<Route>, GeoError> {
        let url = format!("{}/directions/json", self.base_url);
        let origin_param = format!("{},{}", origin.0, origin.1);
        let destination_param = format!("{},{}", destination.0, destination.1);

        let mut query = vec![
            ("origin", origin_param),
            ("destination", destination_param),
            ("mode", mode.as_str().to_string()),
            ("key", self.api_key.clone()),
        ];
        if !waypoints.is_empty() {
            query.push(("waypoints", waypoints_param(waypoints)));
        }

        let resp = self
            .client
            .get(&url)
            .query(&query)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeoError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: DirectionsResponse = resp.json().await?;
        if parsed.status != "OK" || parsed.routes.is_empty() {
            warn!(status = %parsed.status, "no route found");
            return Ok(None);
        }

        let mut routes = parsed.routes;
        let route = routes.remove(0);
        let Some(leg) = route.legs.into_iter().next() else {
            warn!("route without legs");
            return Ok(None);
        };

        info!(distance = %leg.distance.text, duration = %leg.duration.text, "route found");
        Ok(Some(Route {
            distance: leg.distance.text,
            duration: leg.duration.text,
            start_address: leg.start_address,
            end_address: leg.end_address,
            steps: leg
                .steps
                .into_iter()
                .map(|s| RouteStep {
                    instruction: s.html_instructions,
                    distance: s.distance.text,
                    duration: s.duration.text,
                })
                .collect(),
            polyline: route.overview_polyline.points,
        }))
    }
}

/// Waypoints are passed with route optimisation enabled.
fn waypoints_param(waypoints: &[(f64, f64)]) -> String {
    let coords: Vec<String> = waypoints
        .iter()
        .map(|(lat, lng)| format!("{lat},{lng}"))
        .collect();
    format!("optimize:true|{}", coords.join("|"))
}
