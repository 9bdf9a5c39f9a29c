//! Address analysis for parcel lookups.
//!
//! Rural Maine addresses often identify land by lot rather than by house
//! number: `"Lot 45 Winter Street"`, `"LOT 12 RT 1"`. This module builds
//! one-line locator queries and pulls the lot number and street-name
//! tokens out of such addresses.

use regex::Regex;
use std::sync::LazyLock;

/// Regex for the standalone word "lot" in any case.
static LOT_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blot\b").expect("valid regex"));

/// Regex for the first run of ASCII digits.
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

/// Words that never identify a particular street.
static NON_NAME_WORDS: &[&str] = &[
    "LOT", "UNIT", "APT", "NO", "ST", "STREET", "RD", "ROAD", "AVE", "AVENUE", "LN", "LANE", "DR",
    "DRIVE", "WAY", "CT", "COURT", "CIR", "CIRCLE", "PL", "PLACE", "HWY", "HIGHWAY", "RT", "RTE",
    "ROUTE", "TER", "TERRACE", "BLVD", "PKWY", "N", "S", "E", "W", "NE", "NW", "SE", "SW", "NORTH",
    "SOUTH", "EAST", "WEST", "OF", "THE",
];

/// Builds a one-line address string from components.
#[must_use]
pub fn build_one_line_address(street: &str, city: &str, state: &str) -> String {
    format!("{street}, {city}, {state}")
}

/// Builds a one-line query for a bare municipality.
#[must_use]
pub fn build_place_query(place: &str, state: &str) -> String {
    format!("{place}, {state}")
}

/// Whether the street address contains the word "lot".
#[must_use]
pub fn mentions_lot(street: &str) -> bool {
    LOT_WORD_RE.is_match(street)
}

/// The first integer in the street address, taken as a lot number.
#[must_use]
pub fn lot_number(street: &str) -> Option<&str> {
    NUMBER_RE.find(street).map(|m| m.as_str())
}

/// Upper-cased street-name words: everything except numbers, "lot",
/// directionals and street-type suffixes.
///
/// `"Lot 45 Winter Street"` yields `["WINTER"]`.
#[must_use]
pub fn street_name_tokens(street: &str) -> Vec<String> {
    street
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_uppercase)
        .filter(|t| !t.chars().any(|c| c.is_ascii_digit()))
        .filter(|t| t.len() > 1 && !NON_NAME_WORDS.contains(&t.as_str()))
        .collect()
}
