//! Zoning overlay for parcels in unorganized territory.
//!
//! Maine's unorganized territories and plantations are zoned by the Land
//! Use Planning Commission rather than by a town, so when any resolved
//! parcel sits in one, the resolver also fetches LUPC zoning districts
//! overlapping the parcels.

use parcel_map_arcgis::FeatureQuery;
use parcel_map_parcel_models::ParcelFeature;
use parcel_map_spatial::{Envelope, WGS84_WKID, bounding_envelope, is_web_mercator};

/// Whether any parcel's `TOWN` contains one of `tokens` (case-sensitive).
#[must_use]
pub fn needs_overlay(parcels: &[ParcelFeature], tokens: &[String]) -> bool {
    parcels.iter().any(|p| {
        p.attributes
            .town
            .as_deref()
            .is_some_and(|town| tokens.iter().any(|t| town.contains(t.as_str())))
    })
}

/// Union envelope of every vertex of every parcel, in WGS84.
#[must_use]
pub fn parcel_envelope(parcels: &[ParcelFeature]) -> Option<Envelope> {
    bounding_envelope(parcels.iter().map(|p| p.geometry.rings.as_slice()))
}

/// Plans the zoning query for `envelope` (WGS84).
///
/// The envelope is forward-projected when the zoning layer only accepts
/// Web Mercator input.
#[must_use]
pub fn plan_query(envelope: Envelope, envelope_wkid: u32, max_records: u32) -> FeatureQuery {
    let envelope = if is_web_mercator(envelope_wkid) {
        envelope.to_projected()
    } else {
        envelope
    };

    FeatureQuery::intersecting_envelope(envelope, envelope_wkid)
        .max_records(max_records)
        .out_wkid(WGS84_WKID)
}

#[cfg(test)]
mod tests {
    use parcel_map_arcgis::QueryFilter;
    use parcel_map_parcel_models::config::SearchConfig;
    use parcel_map_parcel_models::{ParcelAttributes, Polygon};

    use super::*;

    fn parcel(town: Option<&str>, rings: Vec<Vec<[f64; 2]>>) -> ParcelFeature {
        ParcelFeature {
            attributes: ParcelAttributes {
                town: town.map(String::from),
                ..ParcelAttributes::default()
            },
            geometry: Polygon { rings },
        }
    }

    #[test]
    fn triggers_on_marker_tokens() {
        let tokens = SearchConfig::default().zoning_trigger_tokens;
        for town in ["T15 R6 WELS UT", "Unorganized Territory", "Cyr Plantation"] {
            assert!(needs_overlay(&[parcel(Some(town), vec![])], &tokens), "{town}");
        }
    }

    #[test]
    fn organized_towns_do_not_trigger() {
        let tokens = SearchConfig::default().zoning_trigger_tokens;
        let parcels = vec![
            parcel(Some("Madawaska"), vec![]),
            parcel(Some("Fort Kent"), vec![]),
            parcel(None, vec![]),
        ];
        assert!(!needs_overlay(&parcels, &tokens));
        // Tokens are literal and case-sensitive.
        assert!(!needs_overlay(&[parcel(Some("cyr plantation"), vec![])], &tokens));
    }

    #[test]
    fn one_marked_parcel_is_enough() {
        let tokens = SearchConfig::default().zoning_trigger_tokens;
        let parcels = vec![
            parcel(Some("Madawaska"), vec![]),
            parcel(Some("Hamlin Plantation"), vec![]),
        ];
        assert!(needs_overlay(&parcels, &tokens));
    }

    #[test]
    fn envelope_covers_all_parcels() {
        let parcels = vec![
            parcel(None, vec![vec![[-68.2, 47.1], [-68.1, 47.3], [-68.2, 47.1]]]),
            parcel(None, vec![vec![[-68.5, 47.0], [-68.4, 47.2], [-68.5, 47.0]]]),
        ];
        let env = parcel_envelope(&parcels).unwrap();
        assert_eq!(
            env,
            Envelope {
                xmin: -68.5,
                ymin: 47.0,
                xmax: -68.1,
                ymax: 47.3,
            }
        );
    }

    #[test]
    fn projects_envelope_for_web_mercator_layers() {
        let env = Envelope {
            xmin: -68.5,
            ymin: 47.0,
            xmax: -68.1,
            ymax: 47.3,
        };
        let geographic = plan_query(env, 4326, 10);
        assert_eq!(
            geographic.filter,
            QueryFilter::Envelope {
                envelope: env,
                wkid: 4326
            }
        );

        let planar = plan_query(env, 3857, 10);
        let QueryFilter::Envelope { envelope, wkid } = planar.filter else {
            panic!("expected envelope filter");
        };
        assert_eq!(wkid, 3857);
        assert!(envelope.xmin < -7_000_000.0);
        assert!(envelope.ymin > 5_000_000.0);
        assert_eq!(planar.out_wkid, 4326);
    }
}
