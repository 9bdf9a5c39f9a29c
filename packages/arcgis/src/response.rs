//! Parsing of `ArcGIS` `/query` JSON responses (`f=json`).

use parcel_map_spatial::Ring;

use crate::ArcGisError;

/// One feature as returned by the layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeature {
    /// Attribute map, keyed by upstream field name.
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// Polygon rings (empty when geometry was not returned).
    pub rings: Vec<Ring>,
}

/// The features returned by one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    /// Returned features, in server order.
    pub features: Vec<RawFeature>,
    /// Spatial reference of the returned geometry, if reported.
    pub wkid: Option<u32>,
    /// Whether the server truncated the result at its transfer limit.
    pub exceeded_transfer_limit: bool,
}

impl FeatureSet {
    /// Whether the query matched nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Number of returned features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }
}

/// Parses a `/query` response body.
///
/// # Errors
///
/// Returns [`ArcGisError::Service`] if the body carries an `error` object
/// and [`ArcGisError::Parse`] if it has no `features` array or a ring
/// vertex is not numeric.
pub fn parse_response(body: &serde_json::Value) -> Result<FeatureSet, ArcGisError> {
    // ArcGIS reports most failures as 200 + { "error": {...} }
    if let Some(error) = body.get("error") {
        return Err(ArcGisError::Service {
            code: error
                .get("code")
                .and_then(serde_json::Value::as_i64)
                .unwrap_or_default(),
            message: error
                .get("message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }

    let features = body
        .get("features")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| ArcGisError::Parse {
            message: "No features array in ArcGIS response".to_string(),
        })?;

    let features = features
        .iter()
        .map(parse_feature)
        .collect::<Result<Vec<_>, _>>()?;

    let wkid = body
        .get("spatialReference")
        .and_then(|sr| sr.get("latestWkid").or_else(|| sr.get("wkid")))
        .and_then(serde_json::Value::as_u64)
        .and_then(|w| u32::try_from(w).ok());

    let exceeded_transfer_limit = body
        .get("exceededTransferLimit")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);

    Ok(FeatureSet {
        features,
        wkid,
        exceeded_transfer_limit,
    })
}

fn parse_feature(feature: &serde_json::Value) -> Result<RawFeature, ArcGisError> {
    let attributes = feature
        .get("attributes")
        .and_then(serde_json::Value::as_object)
        .cloned()
        .unwrap_or_default();

    let Some(rings) = feature
        .pointer("/geometry/rings")
        .and_then(serde_json::Value::as_array)
    else {
        return Ok(RawFeature {
            attributes,
            rings: Vec::new(),
        });
    };

    let rings = rings
        .iter()
        .map(parse_ring)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RawFeature { attributes, rings })
}

/// Parses one ring, keeping `x`/`y` and dropping any `z`/`m` values.
fn parse_ring(ring: &serde_json::Value) -> Result<Ring, ArcGisError> {
    let vertices = ring.as_array().ok_or_else(|| ArcGisError::Parse {
        message: "ring is not an array".to_string(),
    })?;

    vertices
        .iter()
        .map(|vertex| {
            let x = vertex.get(0).and_then(serde_json::Value::as_f64);
            let y = vertex.get(1).and_then(serde_json::Value::as_f64);
            match (x, y) {
                (Some(x), Some(y)) => Ok([x, y]),
                _ => Err(ArcGisError::Parse {
                    message: format!("invalid ring vertex: {vertex}"),
                }),
            }
        })
        .collect()
}
