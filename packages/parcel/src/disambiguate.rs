//! Tie-breaking when a lot-number search returns several parcels.
//!
//! `MAP_BK_LOT LIKE '%45%'` routinely matches lots 45, 145 and 450 in the
//! same town. A [`ParcelDisambiguator`] marks candidates it prefers; the
//! set is narrowed only when exactly one candidate is preferred, and
//! returned unchanged otherwise.

use parcel_map_geocoder::address::street_name_tokens;
use parcel_map_parcel_models::ParcelFeature;
use parcel_map_parcel_models::config::DisambiguationConfig;

/// Decides whether a lot-search candidate is the one the caller meant.
pub trait ParcelDisambiguator: Send + Sync {
    /// Whether `parcel` is preferred for the caller's `street_address`.
    fn prefers(&self, street_address: &str, parcel: &ParcelFeature) -> bool;
}

/// Prefers candidates whose `PROP_LOC` has a whole word matching a
/// street-name word from the caller's address.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreetNameDisambiguator;

impl ParcelDisambiguator for StreetNameDisambiguator {
    fn prefers(&self, street_address: &str, parcel: &ParcelFeature) -> bool {
        let Some(location) = parcel.attributes.prop_loc.as_deref() else {
            return false;
        };
        let location = location.to_uppercase();
        let words: Vec<&str> = location
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        street_name_tokens(street_address)
            .iter()
            .any(|token| words.contains(&token.as_str()))
    }
}

/// Prefers candidates whose `PROP_LOC` contains any configured keyword
/// (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct KeywordDisambiguator {
    keywords: Vec<String>,
}

impl KeywordDisambiguator {
    /// Creates a disambiguator for `keywords`.
    #[must_use]
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|k| k.trim().to_uppercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }
}

impl ParcelDisambiguator for KeywordDisambiguator {
    fn prefers(&self, _street_address: &str, parcel: &ParcelFeature) -> bool {
        let Some(location) = parcel.attributes.prop_loc.as_deref() else {
            return false;
        };
        let location = location.to_uppercase();
        self.keywords.iter().any(|k| location.contains(k.as_str()))
    }
}

/// Never prefers anything, so lot-search results are returned as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDisambiguation;

impl ParcelDisambiguator for NoDisambiguation {
    fn prefers(&self, _street_address: &str, _parcel: &ParcelFeature) -> bool {
        false
    }
}

/// Builds the disambiguator selected in configuration.
#[must_use]
pub fn from_config(config: &DisambiguationConfig) -> Box<dyn ParcelDisambiguator> {
    match config {
        DisambiguationConfig::StreetName => Box::new(StreetNameDisambiguator),
        DisambiguationConfig::Keywords { keywords } => Box::new(KeywordDisambiguator::new(keywords)),
        DisambiguationConfig::None => Box::new(NoDisambiguation),
    }
}

/// Narrows `candidates` to the single preferred parcel, if there is
/// exactly one; otherwise returns them unchanged.
#[must_use]
pub fn narrow(
    disambiguator: &dyn ParcelDisambiguator,
    street_address: &str,
    mut candidates: Vec<ParcelFeature>,
) -> Vec<ParcelFeature> {
    if candidates.len() <= 1 {
        return candidates;
    }

    let preferred: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, p)| disambiguator.prefers(street_address, p))
        .map(|(i, _)| i)
        .collect();

    if let [only] = preferred[..] {
        log::info!(
            "Narrowed {} lot candidates to {:?}",
            candidates.len(),
            candidates[only].attributes.map_bk_lot
        );
        return vec![candidates.swap_remove(only)];
    }

    candidates
}

#[cfg(test)]
mod tests {
    use parcel_map_parcel_models::ParcelAttributes;

    use super::*;

    fn parcel(map_bk_lot: &str, prop_loc: Option<&str>) -> ParcelFeature {
        ParcelFeature {
            attributes: ParcelAttributes {
                town: Some("Madawaska".to_string()),
                map_bk_lot: Some(map_bk_lot.to_string()),
                prop_loc: prop_loc.map(String::from),
                ..ParcelAttributes::default()
            },
            ..ParcelFeature::default()
        }
    }

    #[test]
    fn street_name_narrows_to_single_match() {
        let candidates = vec![
            parcel("012-045", Some("45 MAIN ST")),
            parcel("012-145", Some("WINTER ST")),
        ];
        let narrowed = narrow(&StreetNameDisambiguator, "Lot 45 Winter Street", candidates);
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].attributes.map_bk_lot.as_deref(), Some("012-145"));
    }

    #[test]
    fn keeps_all_when_several_match() {
        let candidates = vec![
            parcel("012-045", Some("WINTER ST")),
            parcel("012-145", Some("WINTER ST EXT")),
            parcel("012-450", None),
        ];
        let narrowed = narrow(&StreetNameDisambiguator, "Lot 45 Winter Street", candidates);
        assert_eq!(narrowed.len(), 3);
    }

    #[test]
    fn keeps_all_when_none_match() {
        let candidates = vec![parcel("1", Some("MAIN ST")), parcel("2", Some("ELM ST"))];
        let narrowed = narrow(&StreetNameDisambiguator, "Lot 4 Winter Street", candidates);
        assert_eq!(narrowed.len(), 2);
    }

    #[test]
    fn street_names_match_whole_words_only() {
        let d = StreetNameDisambiguator;
        assert!(!d.prefers("Lot 3 Main Street", &parcel("1", Some("12 MAINE ST"))));
        assert!(!d.prefers("Lot 3 Elm Street", &parcel("1", Some("ELMWOOD RD"))));
        assert!(d.prefers("Lot 3 Elm Street", &parcel("1", Some("3 elm st."))));

        let candidates = vec![
            parcel("012-003", Some("MAINE ST")),
            parcel("012-103", Some("MAIN ST")),
        ];
        let narrowed = narrow(&d, "Lot 3 Main Street", candidates);
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].attributes.map_bk_lot.as_deref(), Some("012-103"));
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let d = KeywordDisambiguator::new(&["winter".to_string(), "  ".to_string()]);
        assert!(d.prefers("anything", &parcel("1", Some("45 Winter St"))));
        assert!(!d.prefers("anything", &parcel("1", Some("45 Main St"))));
        assert!(!d.prefers("anything", &parcel("1", None)));
    }

    #[test]
    fn none_never_narrows() {
        let candidates = vec![parcel("1", Some("WINTER ST")), parcel("2", Some("MAIN ST"))];
        let d = from_config(&DisambiguationConfig::None);
        assert_eq!(narrow(d.as_ref(), "Lot 1 Winter St", candidates).len(), 2);
    }

    #[test]
    fn single_candidate_is_untouched() {
        let candidates = vec![parcel("1", Some("MAIN ST"))];
        let narrowed = narrow(&StreetNameDisambiguator, "Lot 1 Winter St", candidates);
        assert_eq!(narrowed.len(), 1);
    }
}
