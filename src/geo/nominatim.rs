//! Nominatim / OpenStreetMap geocoder client.
//!
//! The public instance allows **1 request per second**; callers go through
//! [`RateLimiter`](super::RateLimiter). Every request carries a timeout.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use super::lookup::{GeocodeError, LocationGeocoder};
use super::GeoPoint;
use crate::config::GeocoderConfig;
use std::time::Duration;

/// Blocking free-form search client.
pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Build a client with the configured user agent and request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

impl LocationGeocoder for NominatimGeocoder {
    fn lookup(&self, location: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("q", location), ("format", "jsonv2"), ("limit", "1")])
            .send()?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        let body: serde_json::Value = resp.error_for_status()?.json()?;
        parse_response(&body)
    }
}

/// Parses a Nominatim JSON search response.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeoPoint>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let coordinate = |key: &str| {
        first[key]
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| GeocodeError::Parse {
                message: format!("Missing {key} in Nominatim response"),
            })
    };

    Ok(Some(GeoPoint::new(coordinate("lat")?, coordinate("lon")?)))
}
