//! `ArcGIS` `GeocodeServer` client.
//!
//! Calls `findAddressCandidates` with a free-text `SingleLine` address and
//! asks for a single location:
//!
//! `GET {base_url}/findAddressCandidates?SingleLine=...&maxLocations=1&outSR=...&f=json`
//!
//! See <https://developers.arcgis.com/rest/geocode/find-address-candidates/>

use std::time::Duration;

use async_trait::async_trait;
use parcel_map_parcel_models::GeocodeCandidate;

use crate::{AddressLocator, GeocodeError};

/// Address locator backed by an `ArcGIS` `GeocodeServer`.
#[derive(Debug, Clone)]
pub struct ArcGisLocator {
    client: reqwest::Client,
    base_url: String,
    out_wkid: u32,
    timeout: Duration,
}

impl ArcGisLocator {
    /// Creates a locator client.
    ///
    /// `base_url` is the `GeocodeServer` URL; `out_wkid` is the spatial
    /// reference candidate locations are returned in.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        out_wkid: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            out_wkid,
            timeout,
        }
    }
}

#[async_trait]
impl AddressLocator for ArcGisLocator {
    async fn find_best_candidate(
        &self,
        single_line: &str,
    ) -> Result<Option<GeocodeCandidate>, GeocodeError> {
        let url = format!(
            "{}/findAddressCandidates",
            self.base_url.trim_end_matches('/')
        );
        let out_sr = self.out_wkid.to_string();

        log::debug!("Geocoding '{single_line}' via {url}");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("SingleLine", single_line),
                ("outFields", "*"),
                ("maxLocations", "1"),
                ("outSR", out_sr.as_str()),
                ("f", "json"),
            ])
            .timeout(self.timeout)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(GeocodeError::Status {
                status: resp.status().as_u16(),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Parses a `findAddressCandidates` response, keeping the top-scoring
/// candidate.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeocodeCandidate>, GeocodeError> {
    if let Some(error) = body.get("error") {
        return Err(GeocodeError::Service {
            code: error
                .get("code")
                .and_then(serde_json::Value::as_i64)
                .unwrap_or_default(),
            message: error
                .get("message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }

    let candidates = body
        .get("candidates")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Locator response missing 'candidates' array".to_string(),
        })?;

    let score = |c: &serde_json::Value| {
        c.get("score")
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(0.0)
    };

    let Some(best) = candidates
        .iter()
        .max_by(|a, b| score(a).total_cmp(&score(b)))
    else {
        return Ok(None);
    };

    let x = best
        .pointer("/location/x")
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Candidate missing location.x".to_string(),
        })?;
    let y = best
        .pointer("/location/y")
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Candidate missing location.y".to_string(),
        })?;

    let matched_address = best
        .get("address")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(Some(GeocodeCandidate {
        x,
        y,
        matched_address,
        score: score(best),
    }))
}
