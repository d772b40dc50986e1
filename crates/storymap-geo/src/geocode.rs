//! Geocoding client: place name to coordinates.
//!
//! Resolution policy: zero results is a valid outcome (`Confidence::Failed`,
//! never an error), one result is exact, several results trust the service's
//! own ranking and take the first as approximate. Transient transport
//! failures are retried a bounded number of times with doubling backoff
//! before an error surfaces.

use std::time::Duration;

use serde::Deserialize;
use storymap_core::{Confidence, RawMention, ResolvedMention};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_millis(250);

/// Client for the geocoding endpoint.
pub struct GeoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    /// Optional locality hint appended to every query ("Paris, France").
    locality_bias: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
    #[serde(default)]
    formatted_address: String,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl GeoClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point the client at a non-default endpoint (tests, proxies).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            locality_bias: None,
        }
    }

    pub fn with_locality_bias(mut self, bias: impl Into<String>) -> Self {
        self.locality_bias = Some(bias.into());
        self
    }

    /// Resolve one mention to coordinates.
    ///
    /// A resolution that finds nothing is `Ok` with `Confidence::Failed`;
    /// only transport-level problems (after retries) are errors.
    pub async fn resolve(&self, mention: &RawMention) -> Result<ResolvedMention, GeoError> {
        let query = self.build_query(&mention.text);

        let response = self.geocode_with_retry(&query).await?;
        let mut results = response.results;
        if response.status == "ZERO_RESULTS" || results.is_empty() {
            warn!(name = %mention.text, "geocoding found no match");
            return Ok(ResolvedMention::failed(mention.clone()));
        }

        let confidence = if results.len() == 1 {
            Confidence::Exact
        } else {
            // Trust the upstream ranking; the first result wins.
            Confidence::Approximate
        };
        let top = results.remove(0);

        debug!(
            name = %mention.text,
            lat = top.geometry.location.lat,
            lng = top.geometry.location.lng,
            confidence = ?confidence,
            "resolved mention"
        );
        Ok(ResolvedMention {
            mention: mention.clone(),
            lat: top.geometry.location.lat,
            lng: top.geometry.location.lng,
            formatted_address: top.formatted_address,
            confidence,
            place_types: top.types,
        })
    }

    /// Resolve a batch sequentially.
    ///
    /// Per-mention failures (no match) never abort the batch; a transport
    /// error does, leaving the caller's map untouched.
    pub async fn resolve_batch(
        &self,
        mentions: &[RawMention],
    ) -> Result<Vec<ResolvedMention>, GeoError> {
        let mut resolved = Vec::with_capacity(mentions.len());
        for mention in mentions {
            resolved.push(self.resolve(mention).await?);
        }
        let failed = resolved
            .iter()
            .filter(|r| r.confidence == Confidence::Failed)
            .count();
        info!(
            total = mentions.len(),
            failed,
            "geocoding batch finished"
        );
        Ok(resolved)
    }

    fn build_query(&self, text: &str) -> String {
        match &self.locality_bias {
            Some(bias) => format!("{text}, {bias}"),
            None => text.to_string(),
        }
    }

    async fn geocode_with_retry(&self, query: &str) -> Result<GeocodeResponse, GeoError> {
        let mut backoff = BACKOFF_BASE;
        let mut attempt = 1;
        loop {
            match self.geocode_once(query).await {
                Ok(response) => return Ok(response),
                Err(err) if attempt < MAX_ATTEMPTS && is_transient(&err) => {
                    warn!(query, attempt, error = %err, "geocoding attempt failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn geocode_once(&self, query: &str) -> Result<GeocodeResponse, GeoError> {
        let url = format!("{}/geocode/json", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("address", query), ("key", self.api_key.as_str())])
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

        Ok(resp.json().await?)
    }
}

/// Worth retrying: connection-level failures and server-side errors.
fn is_transient(err: &GeoError) -> bool {
    match err {
        GeoError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
        GeoError::Server { status, .. } => *status >= 500,
        GeoError::Json(_) => false,
    }
}
