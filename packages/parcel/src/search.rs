//! Search-key derivation and per-tier query planning.
//!
//! Everything here is pure: given the caller's input, the geocode
//! outcome and the search configuration, decide what each tier would ask
//! the parcel layer, or that it should be skipped.

use parcel_map_arcgis::FeatureQuery;
use parcel_map_arcgis::query::{contains_pattern, quote_literal};
use parcel_map_geocoder::address::{
    build_one_line_address, build_place_query, lot_number, mentions_lot,
};
use parcel_map_parcel_models::config::SearchConfig;
use parcel_map_parcel_models::{GeocodeCandidate, LocatorInput, SearchTier, fields};
use parcel_map_spatial::WGS84_WKID;

/// The locator query and the town used for attribute searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchKey {
    /// Single-line locator query.
    pub text: String,
    /// Town for attribute searches.
    pub town: String,
}

impl SearchKey {
    /// Derives the search key, preferring the full street address.
    ///
    /// Returns `None` when the input has neither a full street address
    /// nor a place name.
    #[must_use]
    pub fn from_input(input: &LocatorInput, default_state: &str) -> Option<Self> {
        if let Some((street, city, state)) = input.full_address() {
            return Some(Self {
                text: build_one_line_address(street, city, state),
                town: city.to_string(),
            });
        }

        input.place_name().map(|place| Self {
            text: build_place_query(place, default_state),
            town: place.to_string(),
        })
    }
}

/// What a tier needs to know to plan its query.
#[derive(Debug, Clone, Copy)]
pub struct TierContext<'a> {
    /// Street address, if the caller supplied one.
    pub street_address: Option<&'a str>,
    /// Town for attribute searches.
    pub town: Option<&'a str>,
    /// Geocode outcome.
    pub geocode: Option<&'a GeocodeCandidate>,
    /// Spatial reference of the geocode coordinates.
    pub locator_wkid: u32,
    /// Thresholds and caps.
    pub search: &'a SearchConfig,
}

/// Plans the parcel query for `tier`, or `None` when the tier does not
/// apply to this input.
#[must_use]
pub fn plan_tier(tier: SearchTier, ctx: &TierContext<'_>) -> Option<FeatureQuery> {
    match tier {
        SearchTier::Lot => {
            let street = ctx.street_address.filter(|s| mentions_lot(s))?;
            let town = ctx.town?;
            let lot = lot_number(street)?;
            let clause = format!(
                "{} = {} AND {} LIKE {}",
                fields::TOWN,
                quote_literal(town),
                fields::MAP_BK_LOT,
                contains_pattern(lot),
            );
            Some(
                FeatureQuery::where_clause(clause)
                    .max_records(ctx.search.lot_max_records)
                    .out_wkid(WGS84_WKID),
            )
        }
        SearchTier::Spatial => {
            let geocode = ctx
                .geocode
                .filter(|g| g.score > ctx.search.spatial_min_score)?;
            Some(
                FeatureQuery::intersecting_point(geocode.x, geocode.y, ctx.locator_wkid)
                    .max_records(ctx.search.spatial_max_records)
                    .out_wkid(WGS84_WKID),
            )
        }
        SearchTier::Town => {
            let town = ctx.town?;
            let clause = format!("{} = {}", fields::TOWN, quote_literal(town));
            Some(
                FeatureQuery::where_clause(clause)
                    .max_records(ctx.search.town_max_records)
                    .order_by(format!("{} DESC", fields::ACREAGE))
                    .out_wkid(WGS84_WKID),
            )
        }
        SearchTier::Exhausted => None,
    }
}
