//! `reqwest`-backed [`FeatureService`] for a single `ArcGIS` layer.

use std::time::Duration;

use async_trait::async_trait;

use crate::response::parse_response;
use crate::{ArcGisError, FeatureQuery, FeatureService, FeatureSet};

/// Queries one `ArcGIS` layer over HTTP.
///
/// Every request carries its own timeout, so a slow layer never holds up
/// calls to other layers sharing the same [`reqwest::Client`] pool.
#[derive(Debug, Clone)]
pub struct ArcGisFeatureService {
    client: reqwest::Client,
    layer_url: String,
    timeout: Duration,
    label: String,
}

impl ArcGisFeatureService {
    /// Creates a client for the layer at `layer_url` (without `/query`).
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        layer_url: impl Into<String>,
        timeout: Duration,
        label: impl Into<String>,
    ) -> Self {
        Self {
            client,
            layer_url: layer_url.into(),
            timeout,
            label: label.into(),
        }
    }

    /// The layer's `/query` endpoint.
    #[must_use]
    pub fn query_url(&self) -> String {
        format!("{}/query", self.layer_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl FeatureService for ArcGisFeatureService {
    async fn query(&self, query: &FeatureQuery) -> Result<FeatureSet, ArcGisError> {
        let url = self.query_url();
        let params = query.to_params();
        log::debug!("{}: GET {url} {params:?}", self.label);

        let resp = self
            .client
            .get(&url)
            .query(&params)
            .timeout(self.timeout)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ArcGisError::Status {
                status: resp.status().as_u16(),
            });
        }

        let body = resp.text().await?;
        let json: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| ArcGisError::Parse {
                message: format!("Failed to parse ArcGIS response: {e}"),
            })?;

        let set = parse_response(&json)?;
        log::debug!("{}: {} features", self.label, set.len());
        Ok(set)
    }
}
