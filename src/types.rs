//! Core building-map types shared across all modules.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

pub type BuildingId = u64;
pub type FloorId = u64;
pub type PoiId = u64;
pub type CategoryId = u64;

// ---------------------------------------------------------------------------
// Basic geo
// ---------------------------------------------------------------------------

/// A WGS84 coordinate.  Rendering surfaces take `[lng, lat]` pairs; use
/// [`LatLng::to_lng_lat`] at that boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn to_lng_lat(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

// ---------------------------------------------------------------------------
// Building model
// ---------------------------------------------------------------------------

/// The active building.  Replaced wholesale on reload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Building {
    pub id: BuildingId,
    pub name: String,
    /// Geographic anchor point (camera centre, building marker).
    pub location: LatLng,
    /// Boundary corners in delivery order.  A closed polygon when ≥ 3.
    pub corners: Vec<LatLng>,
    /// Opaque custom fields, passed through untouched.
    #[serde(default)]
    pub custom_fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Floor {
    pub id: FloorId,
    pub building_id: BuildingId,
    /// Ordering key; basements are negative.
    pub level: i32,
    /// May be empty – the UI falls back to `Floor <level>`.
    pub name: String,
    /// Floor-plan raster image, if any.
    pub map_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Poi {
    pub id: PoiId,
    pub name: String,
    /// Free-text description shown in the popup.
    pub info: String,
    pub floor_id: FloorId,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub location: LatLng,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoiCategory {
    pub id: CategoryId,
    pub name: Option<String>,
    pub icon_url: String,
    pub selected_icon_url: String,
    pub visible: bool,
}

/// Everything one load produces.  Applied to the store in a single step.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingData {
    pub building: Building,
    pub floors: Vec<Floor>,
    pub pois: Vec<Poi>,
    pub categories: Vec<PoiCategory>,
}
