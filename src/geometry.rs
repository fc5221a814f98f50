//! Geometry helpers: bounds accumulation, padding, outline GeoJSON and
//! floor-plan georeferencing.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::FLOOR_PLAN_CORNERS;
use crate::types::LatLng;

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Axis-aligned geographic box.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LngLatBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LngLatBounds {
    /// Degenerate box around one point; grow it with [`extend`](Self::extend).
    pub fn from_point(p: LatLng) -> Self {
        Self {
            south_west: p,
            north_east: p,
        }
    }

    pub fn extend(mut self, p: LatLng) -> Self {
        self.south_west.lat = self.south_west.lat.min(p.lat);
        self.south_west.lng = self.south_west.lng.min(p.lng);
        self.north_east.lat = self.north_east.lat.max(p.lat);
        self.north_east.lng = self.north_east.lng.max(p.lng);
        self
    }

    /// Inflate both corners by `degrees` on each axis.
    pub fn padded(self, degrees: f64) -> Self {
        Self {
            south_west: LatLng::new(
                self.south_west.lat - degrees,
                self.south_west.lng - degrees,
            ),
            north_east: LatLng::new(
                self.north_east.lat + degrees,
                self.north_east.lng + degrees,
            ),
        }
    }

    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.south_west.lat
            && p.lat <= self.north_east.lat
            && p.lng >= self.south_west.lng
            && p.lng <= self.north_east.lng
    }

    /// `[[west, south], [east, north]]`, the usual map-library layout.
    pub fn to_lng_lat(self) -> [[f64; 2]; 2] {
        [self.south_west.to_lng_lat(), self.north_east.to_lng_lat()]
    }
}

/// Bounding box over every corner, inflated by `padding_degrees`.
///
/// Returns `None` for an empty corner list.  A zero padding returns the raw box.
pub fn padded_bounds(corners: &[LatLng], padding_degrees: f64) -> Option<LngLatBounds> {
    let (first, rest) = corners.split_first()?;
    let bounds = rest
        .iter()
        .fold(LngLatBounds::from_point(*first), |acc, c| acc.extend(*c));

    if padding_degrees == 0.0 {
        return Some(bounds);
    }
    Some(bounds.padded(padding_degrees))
}

// ---------------------------------------------------------------------------
// GeoJSON
// ---------------------------------------------------------------------------

/// Building outline as a GeoJSON `Feature` with a single-ring `Polygon`.
///
/// The ring is emitted as delivered; renderers close it implicitly.
pub fn building_outline(name: &str, corners: &[LatLng]) -> serde_json::Value {
    let ring: Vec<[f64; 2]> = corners.iter().map(|c| c.to_lng_lat()).collect();
    json!({
        "type": "Feature",
        "properties": { "name": name },
        "geometry": {
            "type": "Polygon",
            "coordinates": [ring],
        },
    })
}

// ---------------------------------------------------------------------------
// Floor plan
// ---------------------------------------------------------------------------

/// The four image corners (top-left, top-right, bottom-right, bottom-left)
/// taken from the building's first four corner points.
pub fn floor_plan_coordinates(corners: &[LatLng]) -> Option<[LatLng; FLOOR_PLAN_CORNERS]> {
    if corners.len() < FLOOR_PLAN_CORNERS {
        return None;
    }
    Some([corners[0], corners[1], corners[2], corners[3]])
}
