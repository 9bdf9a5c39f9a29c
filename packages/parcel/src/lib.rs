#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Parcel resolution for a property address or municipality.
//!
//! [`ParcelResolver::resolve`] runs a strictly sequential chain against
//! three untrusted upstream services configured in the
//! [`service_registry`]:
//!
//! 1. **Address locator**: best-effort geocode of the one-line address.
//!    Failure is logged and absorbed.
//! 2. **Parcel layer**: three search tiers ([`SearchTier`]) tried in
//!    order until one returns features: lot-number attribute search,
//!    point-in-parcel search at the geocoded location, then the largest
//!    parcels in the town. A transport failure here is fatal.
//! 3. **Zoning layer**: only when a parcel lies in unorganized territory
//!    or a plantation, fetch zoning districts intersecting the parcels'
//!    envelope. Failure is logged and absorbed.
//!
//! The result is assembled into a `GeoJSON` `FeatureCollection` by
//! [`assemble`].

pub mod assemble;
pub mod disambiguate;
pub mod resolver;
pub mod search;
pub mod service_registry;
pub mod zoning;

use parcel_map_arcgis::ArcGisError;
use thiserror::Error;

pub use parcel_map_parcel_models::SearchTier;
pub use resolver::ParcelResolver;

/// Errors that end a resolution.
///
/// Geocoding and zoning failures never appear here; only the parcel
/// layer is mandatory.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Neither a full street address nor a place name was supplied.
    #[error("Insufficient address information")]
    InsufficientAddressInformation,

    /// Every search tier ran cleanly and found nothing.
    #[error("No parcel data found")]
    NoParcelDataFound,

    /// The parcel layer could not be queried.
    #[error("Parcel service unavailable: {0}")]
    UpstreamServiceUnavailable(#[source] ArcGisError),

    /// Anything else.
    #[error("Unexpected error: {message}")]
    Unexpected {
        /// Description of what went wrong.
        message: String,
    },
}

impl ResolveError {
    /// HTTP status equivalent.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InsufficientAddressInformation => 400,
            Self::NoParcelDataFound => 404,
            Self::UpstreamServiceUnavailable(_) => 503,
            Self::Unexpected { .. } => 500,
        }
    }

    /// Short, user-facing error message.
    #[must_use]
    pub const fn summary(&self) -> &'static str {
        match self {
            Self::InsufficientAddressInformation => "Insufficient address information",
            Self::NoParcelDataFound => "No parcel data found",
            Self::UpstreamServiceUnavailable(_) => "Parcel service temporarily unavailable",
            Self::Unexpected { .. } => "Failed to resolve parcel data",
        }
    }

    /// Longer hint telling the caller what to do next.
    #[must_use]
    pub const fn details(&self) -> &'static str {
        match self {
            Self::InsufficientAddressInformation => {
                "Add a street address with city and state, or a place name, to this property."
            }
            Self::NoParcelDataFound => {
                "The parcel dataset has no records for this address or town."
            }
            Self::UpstreamServiceUnavailable(_) => {
                "The parcel data service did not respond. Please try again later."
            }
            Self::Unexpected { .. } => "An unexpected error occurred while resolving parcels.",
        }
    }
}

impl From<serde_json::Error> for ResolveError {
    fn from(e: serde_json::Error) -> Self {
        Self::Unexpected {
            message: e.to_string(),
        }
    }
}
