//! Query construction for `ArcGIS` layer `/query` requests.

use parcel_map_spatial::{Envelope, WGS84_WKID};

/// Which features a query selects.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    /// SQL-92 attribute filter, e.g. `TOWN = 'Madawaska'`.
    Where(String),
    /// Features intersecting a point given in `wkid`.
    Point {
        /// X in `wkid` units.
        x: f64,
        /// Y in `wkid` units.
        y: f64,
        /// Spatial reference of the point.
        wkid: u32,
    },
    /// Features intersecting an envelope given in `wkid`.
    Envelope {
        /// The envelope.
        envelope: Envelope,
        /// Spatial reference of the envelope.
        wkid: u32,
    },
}

/// A single `/query` request.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureQuery {
    /// Selection filter.
    pub filter: QueryFilter,
    /// Comma-separated output fields (`*` for all).
    pub out_fields: String,
    /// Whether to return geometry.
    pub return_geometry: bool,
    /// Maximum number of records to return.
    pub max_records: u32,
    /// Optional `orderByFields`, e.g. `ACREAGE DESC`.
    pub order_by: Option<String>,
    /// Output spatial reference.
    pub out_wkid: u32,
}

impl FeatureQuery {
    fn new(filter: QueryFilter) -> Self {
        Self {
            filter,
            out_fields: "*".to_string(),
            return_geometry: true,
            max_records: 10,
            order_by: None,
            out_wkid: WGS84_WKID,
        }
    }

    /// Selects features matching an attribute `where` clause.
    #[must_use]
    pub fn where_clause(clause: impl Into<String>) -> Self {
        Self::new(QueryFilter::Where(clause.into()))
    }

    /// Selects features intersecting a point.
    #[must_use]
    pub fn intersecting_point(x: f64, y: f64, wkid: u32) -> Self {
        Self::new(QueryFilter::Point { x, y, wkid })
    }

    /// Selects features intersecting an envelope.
    #[must_use]
    pub fn intersecting_envelope(envelope: Envelope, wkid: u32) -> Self {
        Self::new(QueryFilter::Envelope { envelope, wkid })
    }

    /// Sets the record cap.
    #[must_use]
    pub const fn max_records(mut self, max_records: u32) -> Self {
        self.max_records = max_records;
        self
    }

    /// Sets `orderByFields`.
    #[must_use]
    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    /// Sets the output spatial reference.
    #[must_use]
    pub const fn out_wkid(mut self, wkid: u32) -> Self {
        self.out_wkid = wkid;
        self
    }

    /// Query-string parameters for this request (`f=json` included).
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(12);

        match &self.filter {
            QueryFilter::Where(clause) => {
                params.push(("where", clause.clone()));
            }
            QueryFilter::Point { x, y, wkid } => {
                let geometry = serde_json::json!({
                    "x": x,
                    "y": y,
                    "spatialReference": { "wkid": wkid },
                });
                params.push(("where", "1=1".to_string()));
                params.push(("geometry", geometry.to_string()));
                params.push(("geometryType", "esriGeometryPoint".to_string()));
                params.push(("inSR", wkid.to_string()));
                params.push(("spatialRel", "esriSpatialRelIntersects".to_string()));
            }
            QueryFilter::Envelope { envelope, wkid } => {
                let geometry = serde_json::json!({
                    "xmin": envelope.xmin,
                    "ymin": envelope.ymin,
                    "xmax": envelope.xmax,
                    "ymax": envelope.ymax,
                    "spatialReference": { "wkid": wkid },
                });
                params.push(("where", "1=1".to_string()));
                params.push(("geometry", geometry.to_string()));
                params.push(("geometryType", "esriGeometryEnvelope".to_string()));
                params.push(("inSR", wkid.to_string()));
                params.push(("spatialRel", "esriSpatialRelIntersects".to_string()));
            }
        }

        params.push(("outFields", self.out_fields.clone()));
        params.push(("returnGeometry", self.return_geometry.to_string()));
        params.push(("resultRecordCount", self.max_records.to_string()));
        if let Some(order_by) = &self.order_by {
            params.push(("orderByFields", order_by.clone()));
        }
        params.push(("outSR", self.out_wkid.to_string()));
        params.push(("f", "json".to_string()));

        params
    }
}

/// Quotes a string as an SQL literal, doubling embedded single quotes.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Builds a `LIKE` pattern literal matching `value` anywhere.
#[must_use]
pub fn contains_pattern(value: &str) -> String {
    quote_literal(&format!("%{value}%"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn quotes_literals() {
        assert_eq!(quote_literal("Madawaska"), "'Madawaska'");
        assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
        assert_eq!(contains_pattern("45"), "'%45%'");
    }

    #[test]
    fn where_query_params() {
        let query = FeatureQuery::where_clause("TOWN = 'Madawaska'")
            .max_records(50)
            .order_by("ACREAGE DESC");
        let params = query.to_params();
        assert_eq!(param(&params, "where"), Some("TOWN = 'Madawaska'"));
        assert_eq!(param(&params, "resultRecordCount"), Some("50"));
        assert_eq!(param(&params, "orderByFields"), Some("ACREAGE DESC"));
        assert_eq!(param(&params, "outSR"), Some("4326"));
        assert_eq!(param(&params, "returnGeometry"), Some("true"));
        assert_eq!(param(&params, "f"), Some("json"));
        assert!(param(&params, "geometry").is_none());
    }

    #[test]
    fn point_query_declares_input_reference() {
        let params = FeatureQuery::intersecting_point(512_000.5, 5_230_000.25, 26919).to_params();
        assert_eq!(param(&params, "geometryType"), Some("esriGeometryPoint"));
        assert_eq!(param(&params, "inSR"), Some("26919"));
        assert_eq!(
            param(&params, "spatialRel"),
            Some("esriSpatialRelIntersects")
        );
        let geometry: serde_json::Value =
            serde_json::from_str(param(&params, "geometry").unwrap()).unwrap();
        assert_eq!(geometry["x"], serde_json::json!(512_000.5));
        assert_eq!(geometry["spatialReference"]["wkid"], serde_json::json!(26919));
        assert!(param(&params, "orderByFields").is_none());
    }

    #[test]
    fn envelope_query_params() {
        let envelope = Envelope {
            xmin: -68.4,
            ymin: 46.9,
            xmax: -67.5,
            ymax: 47.2,
        };
        let params = FeatureQuery::intersecting_envelope(envelope, 4326).to_params();
        assert_eq!(param(&params, "geometryType"), Some("esriGeometryEnvelope"));
        let geometry: serde_json::Value =
            serde_json::from_str(param(&params, "geometry").unwrap()).unwrap();
        assert_eq!(geometry["xmin"], serde_json::json!(-68.4));
        assert_eq!(geometry["ymax"], serde_json::json!(47.2));
    }
}
