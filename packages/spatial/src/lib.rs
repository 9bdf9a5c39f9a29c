#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate reprojection and envelope math for parcel polygons.
//!
//! Parcel and zoning layers publish geometry either in WGS84 (EPSG:4326)
//! or in spherical Web Mercator (EPSG:3857 / ESRI 102100). The functions
//! here convert between the two using the sphere half-circumference
//! [`WEB_MERCATOR_HALF_EXTENT`] and compute the union bounding envelope
//! used to scope the zoning overlay query.

use std::f64::consts::{FRAC_PI_2, PI};

use geo::{BoundingRect, MultiPoint};
use serde::{Deserialize, Serialize};

/// Half the circumference of the Web Mercator sphere, in meters.
pub const WEB_MERCATOR_HALF_EXTENT: f64 = 20_037_508.34;

/// Well-known ID for geographic WGS84 coordinates.
pub const WGS84_WKID: u32 = 4326;

/// Well-known IDs that all denote spherical Web Mercator.
pub const WEB_MERCATOR_WKIDS: &[u32] = &[3857, 102_100, 102_113, 900_913];

/// A single linear ring of `[x, y]` vertices.
pub type Ring = Vec<[f64; 2]>;

/// Returns `true` if `wkid` identifies spherical Web Mercator.
#[must_use]
pub fn is_web_mercator(wkid: u32) -> bool {
    WEB_MERCATOR_WKIDS.contains(&wkid)
}

/// Converts a Web Mercator coordinate to WGS84 `(longitude, latitude)`
/// in degrees.
#[must_use]
pub fn projected_to_geographic(x: f64, y: f64) -> (f64, f64) {
    let longitude = x / WEB_MERCATOR_HALF_EXTENT * 180.0;
    let latitude_raw = y / WEB_MERCATOR_HALF_EXTENT * 180.0;
    let latitude = 180.0 / PI * (2.0 * (latitude_raw * PI / 180.0).exp().atan() - FRAC_PI_2);
    (longitude, latitude)
}

/// Converts WGS84 degrees to a Web Mercator `(x, y)` coordinate.
///
/// Exact inverse of [`projected_to_geographic`] for latitudes inside the
/// Web Mercator validity band (roughly ±85°).
#[must_use]
pub fn geographic_to_projected(longitude: f64, latitude: f64) -> (f64, f64) {
    let x = longitude * WEB_MERCATOR_HALF_EXTENT / 180.0;
    let y = ((90.0 + latitude) * PI / 360.0).tan().ln() / (PI / 180.0);
    (x, y * WEB_MERCATOR_HALF_EXTENT / 180.0)
}

/// Maps every vertex of every ring from Web Mercator to WGS84.
///
/// Ring order, vertex order and winding are preserved.
#[must_use]
pub fn project_polygon(rings: &[Ring]) -> Vec<Ring> {
    rings
        .iter()
        .map(|ring| {
            ring.iter()
                .map(|&[x, y]| {
                    let (lon, lat) = projected_to_geographic(x, y);
                    [lon, lat]
                })
                .collect()
        })
        .collect()
}

/// An axis-aligned bounding box, serialized in the `ArcGIS` envelope
/// shape (`xmin`, `ymin`, `xmax`, `ymax`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Minimum x (west).
    pub xmin: f64,
    /// Minimum y (south).
    pub ymin: f64,
    /// Maximum x (east).
    pub xmax: f64,
    /// Maximum y (north).
    pub ymax: f64,
}

impl Envelope {
    /// Forward-projects a WGS84 envelope to Web Mercator.
    #[must_use]
    pub fn to_projected(&self) -> Self {
        let (xmin, ymin) = geographic_to_projected(self.xmin, self.ymin);
        let (xmax, ymax) = geographic_to_projected(self.xmax, self.ymax);
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }
}

/// Computes the union bounding envelope of every vertex in every ring of
/// every supplied polygon.
///
/// Returns `None` when there are no vertices at all.
#[must_use]
pub fn bounding_envelope<'a, I>(polygons: I) -> Option<Envelope>
where
    I: IntoIterator<Item = &'a [Ring]>,
{
    let points: MultiPoint<f64> = polygons
        .into_iter()
        .flatten()
        .flatten()
        .map(|&[x, y]| (x, y))
        .collect::<Vec<_>>()
        .into();

    points.bounding_rect().map(|rect| Envelope {
        xmin: rect.min().x,
        ymin: rect.min().y,
        xmax: rect.max().x,
        ymax: rect.max().y,
    })
}
