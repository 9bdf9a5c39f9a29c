//! `GeoJSON` assembly for resolution results.
//!
//! Each feature's properties are the upstream attribute map, under its
//! original field names, with a fixed set of camelCase fields layered on
//! top so map clients do not have to know the upstream schema.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use parcel_map_parcel_models::{ParcelResolution, ResolvedFeature};
use parcel_map_spatial::{Ring, bounding_envelope};

/// Builds the `FeatureCollection` for a resolution: parcels first, then
/// zoning, with a collection-level `bbox`.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] if attributes cannot be serialized.
pub fn to_feature_collection(
    resolution: &ParcelResolution,
) -> Result<FeatureCollection, serde_json::Error> {
    let features = resolution
        .features
        .iter()
        .map(to_feature)
        .collect::<Result<Vec<_>, _>>()?;

    let bbox = bounding_envelope(
        resolution
            .features
            .iter()
            .map(|f| f.geometry().rings.as_slice()),
    )
    .map(|env| vec![env.xmin, env.ymin, env.xmax, env.ymax]);

    Ok(FeatureCollection {
        bbox,
        features,
        foreign_members: None,
    })
}

fn to_feature(feature: &ResolvedFeature) -> Result<Feature, serde_json::Error> {
    let rings = &feature.geometry().rings;
    let geometry = (!rings.is_empty()).then(|| Geometry::new(Value::Polygon(to_positions(rings))));

    Ok(Feature {
        bbox: None,
        geometry,
        id: None,
        properties: Some(properties(feature)?),
        foreign_members: None,
    })
}

fn properties(feature: &ResolvedFeature) -> Result<JsonObject, serde_json::Error> {
    let mut props = match feature {
        ResolvedFeature::Parcel(p) => into_object(serde_json::to_value(&p.attributes)?),
        ResolvedFeature::Zoning(z) => into_object(serde_json::to_value(&z.attributes)?),
    };

    props.insert(
        "source".to_string(),
        serde_json::Value::String(feature.source().to_string()),
    );

    match feature {
        ResolvedFeature::Parcel(p) => {
            let a = &p.attributes;
            props.insert("mapBkLot".to_string(), serde_json::json!(a.map_bk_lot));
            props.insert("town".to_string(), serde_json::json!(a.town));
            props.insert("owner".to_string(), serde_json::json!(a.owner));
            props.insert("address".to_string(), serde_json::json!(a.prop_loc));
            props.insert("acreage".to_string(), serde_json::json!(a.acreage));
            props.insert("landValue".to_string(), serde_json::json!(a.land_value));
            props.insert(
                "buildingValue".to_string(),
                serde_json::json!(a.building_value),
            );
            props.insert("totalValue".to_string(), serde_json::json!(a.total_value));
        }
        ResolvedFeature::Zoning(z) => {
            let a = &z.attributes;
            props.insert("zoneCode".to_string(), serde_json::json!(a.zone_code));
            props.insert(
                "zoneDescription".to_string(),
                serde_json::json!(a.zone_description),
            );
        }
    }

    Ok(props)
}

fn into_object(value: serde_json::Value) -> JsonObject {
    match value {
        serde_json::Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}

fn to_positions(rings: &[Ring]) -> Vec<Vec<Vec<f64>>> {
    rings
        .iter()
        .map(|ring| ring.iter().map(|&[x, y]| vec![x, y]).collect())
        .collect()
}
