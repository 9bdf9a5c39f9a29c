#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Parcel, zoning and resolution types for the parcel map resolver.
//!
//! Upstream parcel and zoning layers are third-party `ArcGIS` services
//! whose attribute schemas the application does not control. Attributes
//! are therefore modeled as a handful of typed fields the resolver
//! actually inspects (`TOWN`, `MAP_BK_LOT`, `PROP_LOC`, ...) plus a
//! residual map that carries every other upstream field through
//! untouched.

pub mod config;

use std::collections::BTreeMap;

use parcel_map_spatial::Ring;
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Upstream attribute field names the resolver queries and inspects.
pub mod fields {
    /// Municipality name on parcel records.
    pub const TOWN: &str = "TOWN";
    /// Combined map / book / lot identifier.
    pub const MAP_BK_LOT: &str = "MAP_BK_LOT";
    /// Property location (situs address).
    pub const PROP_LOC: &str = "PROP_LOC";
    /// Parcel acreage, used to order town-wide results.
    pub const ACREAGE: &str = "ACREAGE";

    /// Owner name on layers that lack `OWNER`.
    pub const OWNER_NAME: &str = "OWNER_NAME";
    /// Computed acreage on layers that lack `ACREAGE`.
    pub const CALC_ACRES: &str = "CALC_ACRES";
    /// Zone code on layers that lack `ZONE_CODE`.
    pub const ZONE: &str = "ZONE";
    /// Zone description on layers that lack `ZONE_DESC`.
    pub const DESCRIPTION: &str = "DESCRIPTION";
}

/// What the caller knows about where a property is.
///
/// Either a full street address (street + city + state) or a place
/// (municipality) name must be present for resolution to proceed.
/// Blank strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatorInput {
    /// Street address, e.g. `"Lot 45 Winter Street"`.
    pub street_address: Option<String>,
    /// City or town name.
    pub city: Option<String>,
    /// State name or abbreviation.
    pub state: Option<String>,
    /// Municipality name used when no street address is known.
    pub place_name: Option<String>,
}

impl LocatorInput {
    /// Trimmed, non-empty street address.
    #[must_use]
    pub fn street_address(&self) -> Option<&str> {
        non_blank(self.street_address.as_deref())
    }

    /// Trimmed, non-empty city.
    #[must_use]
    pub fn city(&self) -> Option<&str> {
        non_blank(self.city.as_deref())
    }

    /// Trimmed, non-empty state.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        non_blank(self.state.as_deref())
    }

    /// Trimmed, non-empty place name.
    #[must_use]
    pub fn place_name(&self) -> Option<&str> {
        non_blank(self.place_name.as_deref())
    }

    /// Returns `(street, city, state)` when all three are present.
    #[must_use]
    pub fn full_address(&self) -> Option<(&str, &str, &str)> {
        Some((self.street_address()?, self.city()?, self.state()?))
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// The best address-locator candidate for a search string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeCandidate {
    /// X in the locator's native spatial reference.
    pub x: f64,
    /// Y in the locator's native spatial reference.
    pub y: f64,
    /// Address the locator matched.
    pub matched_address: String,
    /// Match confidence, 0-100.
    pub score: f64,
}

/// Polygon geometry as ordered linear rings.
///
/// The first ring is the outer boundary; any further rings are holes and
/// are passed through without interpretation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// Rings of `[x, y]` vertices.
    pub rings: Vec<Ring>,
}

/// Known cadastral attributes plus every other upstream field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParcelAttributes {
    /// Municipality (may carry an unorganized-territory marker).
    #[serde(
        rename = "TOWN",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub town: Option<String>,
    /// Map / book / lot identifier.
    #[serde(
        rename = "MAP_BK_LOT",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub map_bk_lot: Option<String>,
    /// Property location (situs address).
    #[serde(
        rename = "PROP_LOC",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub prop_loc: Option<String>,
    /// Owner of record.
    #[serde(
        rename = "OWNER",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub owner: Option<String>,
    /// Parcel area in acres.
    #[serde(
        rename = "ACREAGE",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub acreage: Option<f64>,
    /// Assessed land value.
    #[serde(
        rename = "LAND_VAL",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub land_value: Option<f64>,
    /// Assessed building value.
    #[serde(
        rename = "BLDG_VAL",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub building_value: Option<f64>,
    /// Total assessed value.
    #[serde(
        rename = "TOTAL_VAL",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_value: Option<f64>,
    /// Every other upstream field, keyed by its original name.
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl ParcelAttributes {
    /// Fills absent known fields from their secondary upstream names.
    ///
    /// The secondary fields stay in [`Self::other`].
    pub fn fill_aliases(&mut self) {
        if self.owner.is_none() {
            self.owner = self.other.get(fields::OWNER_NAME).and_then(string_value);
        }
        if self.acreage.is_none() {
            self.acreage = self.other.get(fields::CALC_ACRES).and_then(number_value);
        }
    }
}

/// A cadastral parcel polygon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParcelFeature {
    /// Cadastral attributes.
    pub attributes: ParcelAttributes,
    /// Parcel boundary.
    pub geometry: Polygon,
}

/// Known zoning attributes plus every other upstream field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoningAttributes {
    /// Zone code, e.g. `"M-GN"`.
    #[serde(
        rename = "ZONE_CODE",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub zone_code: Option<String>,
    /// Human-readable zone description.
    #[serde(
        rename = "ZONE_DESC",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub zone_description: Option<String>,
    /// Every other upstream field, keyed by its original name.
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl ZoningAttributes {
    /// Fills absent known fields from their secondary upstream names.
    ///
    /// The secondary fields stay in [`Self::other`].
    pub fn fill_aliases(&mut self) {
        if self.zone_code.is_none() {
            self.zone_code = self.other.get(fields::ZONE).and_then(string_value);
        }
        if self.zone_description.is_none() {
            self.zone_description = self.other.get(fields::DESCRIPTION).and_then(string_value);
        }
    }
}

/// A zoning district polygon overlapping resolved parcels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoningFeature {
    /// Zoning attributes.
    pub attributes: ZoningAttributes,
    /// District boundary.
    pub geometry: Polygon,
}

/// Which dataset a resolved feature came from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureSource {
    /// Municipal cadastral parcel layer.
    Parcel,
    /// Land Use Planning Commission zoning layer.
    Lupc,
}

/// A feature in a resolution result.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedFeature {
    /// A cadastral parcel.
    Parcel(ParcelFeature),
    /// A zoning district.
    Zoning(ZoningFeature),
}

impl ResolvedFeature {
    /// The dataset this feature came from.
    #[must_use]
    pub const fn source(&self) -> FeatureSource {
        match self {
            Self::Parcel(_) => FeatureSource::Parcel,
            Self::Zoning(_) => FeatureSource::Lupc,
        }
    }

    /// The feature's polygon.
    #[must_use]
    pub const fn geometry(&self) -> &Polygon {
        match self {
            Self::Parcel(f) => &f.geometry,
            Self::Zoning(f) => &f.geometry,
        }
    }
}

/// Parcel search tiers, tried in order until one yields features.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SearchTier {
    /// Lot-number attribute search within the town.
    Lot,
    /// Parcels intersecting the geocoded point.
    Spatial,
    /// Largest parcels in the town.
    Town,
    /// No tiers left to try.
    Exhausted,
}

impl SearchTier {
    /// The tier every resolution starts with.
    pub const FIRST: Self = Self::Lot;

    /// Transition after running `self`.
    ///
    /// Any non-empty result ends the chain; an empty result advances to
    /// the next tier.
    #[must_use]
    pub const fn next(self, prior_empty: bool) -> Self {
        if !prior_empty {
            return Self::Exhausted;
        }
        match self {
            Self::Lot => Self::Spatial,
            Self::Spatial => Self::Town,
            Self::Town | Self::Exhausted => Self::Exhausted,
        }
    }
}

/// The search parameters a resolution ran with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Street address as supplied.
    pub street_address: Option<String>,
    /// City as supplied.
    pub city: Option<String>,
    /// State as supplied.
    pub state: Option<String>,
    /// Place name as supplied.
    pub place_name: Option<String>,
    /// Single-line string sent to the address locator.
    pub search_text: String,
    /// Town used for attribute searches.
    pub town: Option<String>,
}

/// Summary of how a resolution went.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMetadata {
    /// Whether the address locator returned a candidate.
    pub geocoded: bool,
    /// Locator match score, when geocoded.
    pub geocode_score: Option<f64>,
    /// Locator matched address, when geocoded.
    pub matched_address: Option<String>,
    /// Number of parcel features returned.
    pub parcel_count: usize,
    /// Number of zoning features returned.
    pub zoning_count: usize,
    /// The tier that produced the parcels.
    pub search_tier: SearchTier,
    /// Original search parameters.
    pub search_params: SearchParams,
}

/// Outcome of a successful resolution: parcels first, then zoning.
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelResolution {
    /// Resolved features in output order.
    pub features: Vec<ResolvedFeature>,
    /// Resolution summary.
    pub metadata: ResolutionMetadata,
}

impl ParcelResolution {
    /// Iterates the parcel features only.
    pub fn parcels(&self) -> impl Iterator<Item = &ParcelFeature> {
        self.features.iter().filter_map(|f| match f {
            ResolvedFeature::Parcel(p) => Some(p),
            ResolvedFeature::Zoning(_) => None,
        })
    }

    /// Iterates the zoning features only.
    pub fn zoning(&self) -> impl Iterator<Item = &ZoningFeature> {
        self.features.iter().filter_map(|f| match f {
            ResolvedFeature::Zoning(z) => Some(z),
            ResolvedFeature::Parcel(_) => None,
        })
    }
}

/// Reads a string attribute that upstream may publish as a number.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_value(&serde_json::Value::deserialize(deserializer)?))
}

fn string_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            None
        }
    }
}

/// Reads a numeric attribute that upstream may publish as a string.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number_value(&serde_json::Value::deserialize(deserializer)?))
}

fn number_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_count_as_absent() {
        let input = LocatorInput {
            street_address: Some("   ".to_string()),
            city: Some("Madawaska".to_string()),
            state: Some("ME".to_string()),
            place_name: Some(String::new()),
        };
        assert!(input.street_address().is_none());
        assert!(input.full_address().is_none());
        assert!(input.place_name().is_none());
        assert_eq!(input.city(), Some("Madawaska"));
    }

    #[test]
    fn parcel_attributes_keep_unknown_fields() {
        let raw = serde_json::json!({
            "TOWN": "Madawaska",
            "MAP_BK_LOT": 4512,
            "PROP_LOC": "45 WINTER ST",
            "OWNER_NAME": "DOE JOHN",
            "ACREAGE": "12.5",
            "TOTAL_VAL": 180_000,
            "LAND_VAL": null,
            "OBJECTID": 77,
            "COUNTY": "Aroostook"
        });
        let mut attrs: ParcelAttributes = serde_json::from_value(raw).unwrap();
        attrs.fill_aliases();
        assert_eq!(attrs.town.as_deref(), Some("Madawaska"));
        assert_eq!(attrs.map_bk_lot.as_deref(), Some("4512"));
        assert_eq!(attrs.owner.as_deref(), Some("DOE JOHN"));
        assert_eq!(attrs.acreage, Some(12.5));
        assert_eq!(attrs.total_value, Some(180_000.0));
        assert_eq!(attrs.land_value, None);
        assert_eq!(attrs.other.get("OBJECTID"), Some(&serde_json::json!(77)));
        assert_eq!(
            attrs.other.get("COUNTY"),
            Some(&serde_json::json!("Aroostook"))
        );
        assert!(!attrs.other.contains_key("TOWN"));
    }

    #[test]
    fn zoning_attributes_accept_aliases() {
        let raw = serde_json::json!({
            "ZONE": "M-GN",
            "DESCRIPTION": "General Management",
            "SHAPE_Area": 1.5
        });
        let mut attrs: ZoningAttributes = serde_json::from_value(raw).unwrap();
        attrs.fill_aliases();
        assert_eq!(attrs.zone_code.as_deref(), Some("M-GN"));
        assert_eq!(attrs.zone_description.as_deref(), Some("General Management"));
        assert_eq!(attrs.other.len(), 3);
    }

    #[test]
    fn primary_and_secondary_names_together() {
        let raw = serde_json::json!({
            "TOWN": "Madawaska",
            "ACREAGE": 12.5,
            "CALC_ACRES": 12.47,
            "OWNER": "DOE JANE",
            "OWNER_NAME": "DOE J"
        });
        let mut attrs: ParcelAttributes = serde_json::from_value(raw).unwrap();
        attrs.fill_aliases();
        assert_eq!(attrs.acreage, Some(12.5));
        assert_eq!(attrs.owner.as_deref(), Some("DOE JANE"));
        assert_eq!(attrs.other.get("CALC_ACRES"), Some(&serde_json::json!(12.47)));
        assert_eq!(attrs.other.get("OWNER_NAME"), Some(&serde_json::json!("DOE J")));

        let raw = serde_json::json!({
            "ZONE_CODE": "D-RS",
            "ZONE": "RS",
            "DESCRIPTION": "Residential Development"
        });
        let mut zoning: ZoningAttributes = serde_json::from_value(raw).unwrap();
        zoning.fill_aliases();
        assert_eq!(zoning.zone_code.as_deref(), Some("D-RS"));
        assert_eq!(
            zoning.zone_description.as_deref(),
            Some("Residential Development")
        );
        assert_eq!(zoning.other.get("ZONE"), Some(&serde_json::json!("RS")));
    }

    #[test]
    fn tier_transitions() {
        assert_eq!(SearchTier::Lot.next(true), SearchTier::Spatial);
        assert_eq!(SearchTier::Spatial.next(true), SearchTier::Town);
        assert_eq!(SearchTier::Town.next(true), SearchTier::Exhausted);
        assert_eq!(SearchTier::Exhausted.next(true), SearchTier::Exhausted);
        for tier in [SearchTier::Lot, SearchTier::Spatial, SearchTier::Town] {
            assert_eq!(tier.next(false), SearchTier::Exhausted);
        }
    }

    #[test]
    fn feature_source_names() {
        assert_eq!(FeatureSource::Parcel.as_ref(), "PARCEL");
        assert_eq!(FeatureSource::Lupc.to_string(), "LUPC");
        assert_eq!(
            serde_json::to_value(FeatureSource::Lupc).unwrap(),
            serde_json::json!("LUPC")
        );
    }
}
