//! Compile-time map configuration and the per-building [`MapOptions`].
//!
//! None of these are runtime flags.  The binary's settings file only chooses
//! which dataset and building to load.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::{self, LngLatBounds};
use crate::types::{Building, BuildingId, LatLng};

// ---------------------------------------------------------------------------
// Building / service
// ---------------------------------------------------------------------------

pub const BUILDING_ID: BuildingId = 7033;

/// Prefix for category icon paths delivered without a host.
pub const ICON_ASSET_DOMAIN: &str = "https://dashboard.situm.com";

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

pub const STYLE_URL: &str = "https://demotiles.maplibre.org/style.json";
pub const DEFAULT_ZOOM: f64 = 18.0;
pub const MIN_ZOOM: f64 = 10.0;
pub const MAX_ZOOM: f64 = 22.0;

/// Screen padding used by the fit-to-building on ready.
pub const BOUNDS_PADDING_PX: u32 = 80;
/// Geographic margin added around the corner bounding box.
pub const BOUNDS_PADDING_DEGREES: f64 = 0.0008;

pub const POI_FLY_TO_ZOOM: f64 = 20.0;
pub const POI_FLY_TO_DURATION: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// Markers / layers
// ---------------------------------------------------------------------------

pub const MARKER_SIZE: u32 = 32;
pub const POPUP_OFFSET: u32 = 30;
pub const BUILDING_MARKER_COLOR: &str = "#2563eb";

pub const BUILDING_FILL_COLOR: &str = "#088";
pub const BUILDING_FILL_OPACITY: f64 = 0.1;
pub const BUILDING_BORDER_WIDTH: f64 = 2.0;
pub const FLOOR_PLAN_OPACITY: f64 = 0.85;

/// Corners required to georeference a floor-plan image.
pub const FLOOR_PLAN_CORNERS: usize = 4;

// ---------------------------------------------------------------------------
// UI
// ---------------------------------------------------------------------------

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

// ---------------------------------------------------------------------------
// Map construction options
// ---------------------------------------------------------------------------

/// Everything a rendering surface needs at construction time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapOptions {
    pub style_url: String,
    pub center: LatLng,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Camera may not leave this box.  `None` when the building has no corners.
    pub max_bounds: Option<LngLatBounds>,
    pub navigation_control: bool,
}

impl MapOptions {
    pub fn for_building(building: &Building) -> Self {
        Self {
            center: building.location,
            max_bounds: geometry::padded_bounds(&building.corners, BOUNDS_PADDING_DEGREES),
            ..Default::default()
        }
    }
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            style_url: STYLE_URL.into(),
            center: LatLng::new(0.0, 0.0),
            zoom: DEFAULT_ZOOM,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            max_bounds: None,
            navigation_control: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn building(corners: Vec<LatLng>) -> Building {
        Building {
            id: BUILDING_ID,
            name: "Test Building".into(),
            location: LatLng::new(40.416775, -3.70379),
            corners,
            custom_fields: Default::default(),
        }
    }

    #[test]
    fn options_center_on_anchor_with_padded_bounds() {
        let opts = MapOptions::for_building(&building(vec![
            LatLng::new(40.416775, -3.70379),
            LatLng::new(40.417, -3.7035),
        ]));
        assert_eq!(opts.center, LatLng::new(40.416775, -3.70379));
        assert_eq!(opts.zoom, DEFAULT_ZOOM);
        let b = opts.max_bounds.expect("bounds");
        assert!((b.south_west.lat - (40.416775 - BOUNDS_PADDING_DEGREES)).abs() < 1e-12);
        assert!((b.north_east.lng - (-3.7035 + BOUNDS_PADDING_DEGREES)).abs() < 1e-12);
    }

    #[test]
    fn no_corners_means_no_camera_constraint() {
        let opts = MapOptions::for_building(&building(vec![]));
        assert!(opts.max_bounds.is_none());
    }
}
