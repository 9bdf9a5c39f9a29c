#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the parcel map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the resolver's types so the API contract can evolve on its own.

use geojson::FeatureCollection;
use parcel_map_parcel_models::ResolutionMetadata;
use serde::{Deserialize, Serialize};

/// Successful parcel lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiParcelResponse {
    /// Always `true`.
    pub success: bool,
    /// Parcels, then zoning districts.
    pub geojson: FeatureCollection,
    /// How the resolution went.
    pub metadata: ResolutionMetadata,
}

impl ApiParcelResponse {
    /// Wraps a resolved collection and its metadata.
    #[must_use]
    pub const fn new(geojson: FeatureCollection, metadata: ResolutionMetadata) -> Self {
        Self {
            success: true,
            geojson,
            metadata,
        }
    }
}

/// Error body shared by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Always `false`.
    pub success: bool,
    /// Short, human-readable message.
    pub error: String,
    /// What the caller should do about it.
    pub details: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: details.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}
