//! Upstream service configuration for a parcel resolver deployment.
//!
//! A deployment is one TOML document naming the address locator, the
//! parcel layer and the zoning layer, plus search thresholds and the
//! lot-search disambiguation strategy.

use serde::{Deserialize, Serialize};

/// Full configuration for one deployment (e.g. the State of Maine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Unique identifier (e.g., `"maine"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// State appended to bare place names before geocoding.
    pub default_state: String,
    /// Address locator (`GeocodeServer`).
    pub locator: LocatorConfig,
    /// Cadastral parcel layer (`FeatureServer` / `MapServer` layer).
    pub parcels: ParcelLayerConfig,
    /// Zoning overlay layer.
    pub zoning: ZoningLayerConfig,
    /// Search tier thresholds and caps.
    #[serde(default)]
    pub search: SearchConfig,
    /// Lot-search tie-break strategy.
    #[serde(default)]
    pub disambiguation: DisambiguationConfig,
    /// Outbound HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
}

/// Address locator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// `GeocodeServer` base URL (without `/findAddressCandidates`).
    pub url: String,
    /// Spatial reference of returned candidate locations. Also declared
    /// as `inSR` on the spatial parcel query.
    #[serde(default = "default_locator_wkid")]
    pub wkid: u32,
    /// Per-request timeout.
    #[serde(default = "default_short_timeout")]
    pub timeout_secs: u64,
}

/// Parcel layer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelLayerConfig {
    /// Layer URL (without `/query`).
    pub url: String,
    /// Per-request timeout.
    #[serde(default = "default_parcel_timeout")]
    pub timeout_secs: u64,
}

/// Zoning layer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoningLayerConfig {
    /// Layer URL (without `/query`).
    pub url: String,
    /// Per-request timeout.
    #[serde(default = "default_short_timeout")]
    pub timeout_secs: u64,
    /// Spatial reference the envelope filter is sent in. Layers that only
    /// accept planar input use a Web Mercator wkid here.
    #[serde(default = "default_envelope_wkid")]
    pub envelope_wkid: u32,
}

/// Search tier thresholds and record caps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Geocode score that must be exceeded for the spatial tier to run.
    #[serde(default = "default_min_score")]
    pub spatial_min_score: f64,
    /// Record cap for the lot tier.
    #[serde(default = "default_small_cap")]
    pub lot_max_records: u32,
    /// Record cap for the spatial tier.
    #[serde(default = "default_small_cap")]
    pub spatial_max_records: u32,
    /// Record cap for the town tier.
    #[serde(default = "default_town_cap")]
    pub town_max_records: u32,
    /// Record cap for the zoning overlay.
    #[serde(default = "default_small_cap")]
    pub zoning_max_records: u32,
    /// `TOWN` substrings marking unorganized territory (case-sensitive).
    #[serde(default = "default_zoning_tokens")]
    pub zoning_trigger_tokens: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            spatial_min_score: default_min_score(),
            lot_max_records: default_small_cap(),
            spatial_max_records: default_small_cap(),
            town_max_records: default_town_cap(),
            zoning_max_records: default_small_cap(),
            zoning_trigger_tokens: default_zoning_tokens(),
        }
    }
}

/// How to narrow multiple lot-search candidates, tagged by `type` in TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisambiguationConfig {
    /// Prefer the candidate whose `PROP_LOC` names the input street.
    #[default]
    StreetName,
    /// Prefer the candidate whose `PROP_LOC` contains any keyword.
    Keywords {
        /// Case-insensitive keywords.
        keywords: Vec<String>,
    },
    /// Never narrow; return every lot-search candidate.
    None,
}

/// Outbound HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Idle connections kept per upstream host.
    #[serde(default = "default_pool_size")]
    pub pool_max_idle_per_host: usize,
    /// TCP connect timeout.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// `User-Agent` header sent upstream.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: default_pool_size(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

const fn default_locator_wkid() -> u32 {
    26919
}

const fn default_envelope_wkid() -> u32 {
    4326
}

const fn default_short_timeout() -> u64 {
    10
}

const fn default_parcel_timeout() -> u64 {
    15
}

const fn default_min_score() -> f64 {
    80.0
}

const fn default_small_cap() -> u32 {
    10
}

const fn default_town_cap() -> u32 {
    50
}

fn default_zoning_tokens() -> Vec<String> {
    ["UT", "Unorganized", "Plantation"]
        .into_iter()
        .map(String::from)
        .collect()
}

const fn default_pool_size() -> usize {
    16
}

const fn default_connect_timeout() -> u64 {
    5
}

fn default_user_agent() -> String {
    format!("parcel-map/{}", env!("CARGO_PKG_VERSION"))
}
