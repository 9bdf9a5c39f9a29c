#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address geocoding for parcel resolution.
//!
//! Turns a one-line address into the best [`GeocodeCandidate`] an
//! `ArcGIS` `GeocodeServer` can find. The candidate's coordinates stay in
//! the locator's native spatial reference so they can seed a spatial
//! parcel query without reprojection.
//!
//! Geocoding is best-effort: callers treat every [`GeocodeError`] as
//! "no candidate" and carry on with attribute searches.
//!
//! Also provides [`address`] utilities for lot-number addresses.

pub mod address;
pub mod locator;

use async_trait::async_trait;
use parcel_map_parcel_models::GeocodeCandidate;
use thiserror::Error;

pub use locator::ArcGisLocator;

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Locator answered with a non-success status.
    #[error("Locator returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Locator answered 200 with an `error` object.
    #[error("Locator error {code}: {message}")]
    Service {
        /// `ArcGIS` error code.
        code: i64,
        /// `ArcGIS` error message.
        message: String,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}

/// A single-line address locator.
#[async_trait]
pub trait AddressLocator: Send + Sync {
    /// Returns the best candidate for `single_line`, or `None` when the
    /// locator matched nothing.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the locator could not be queried.
    async fn find_best_candidate(
        &self,
        single_line: &str,
    ) -> Result<Option<GeocodeCandidate>, GeocodeError>;
}
