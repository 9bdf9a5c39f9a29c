#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `ArcGIS` REST feature-layer query client.
//!
//! Parcel and zoning data both live behind `ArcGIS` `FeatureServer` /
//! `MapServer` layers that share one calling convention: an attribute
//! `where` clause or a spatial `geometry` filter, `outFields`,
//! `returnGeometry`, a record cap and an output spatial reference.
//!
//! [`FeatureService`] is the seam the resolver talks to. A call that
//! fails (transport error, timeout, non-2xx, `error` body, malformed
//! JSON) returns `Err`; a call that succeeds with nothing in it returns an
//! empty [`FeatureSet`]. Callers decide which of those is fatal.

pub mod client;
pub mod query;
pub mod response;

use async_trait::async_trait;
use thiserror::Error;

pub use client::ArcGisFeatureService;
pub use query::{FeatureQuery, QueryFilter};
pub use response::{FeatureSet, RawFeature};

/// Errors from `ArcGIS` feature-layer queries.
#[derive(Debug, Error)]
pub enum ArcGisError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("ArcGIS returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Server answered 200 with an `error` object.
    #[error("ArcGIS service error {code}: {message}")]
    Service {
        /// `ArcGIS` error code.
        code: i64,
        /// `ArcGIS` error message.
        message: String,
    },

    /// Response body did not have the expected shape.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}

impl ArcGisError {
    /// Whether the failure was a request timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}

/// A queryable feature layer.
#[async_trait]
pub trait FeatureService: Send + Sync {
    /// Runs `query` against the layer.
    ///
    /// # Errors
    ///
    /// Returns [`ArcGisError`] if the layer could not be queried. An
    /// empty result is `Ok`.
    async fn query(&self, query: &FeatureQuery) -> Result<FeatureSet, ArcGisError>;
}
