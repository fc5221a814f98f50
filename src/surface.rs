//! Outbound interface to the rendering surface (map, layers, markers, popups).
//!
//! The controller owns exactly one [`MapSurface`] per mounted view and is its
//! only caller.  Implementations wrap a real map library; [`crate::recording`]
//! provides an in-memory one.
//!
//! ## Identifiers
//!
//! Sources and layers are addressed by the string ids in [`ids`].  Markers
//! are addressed by the [`MarkerId`] the surface returns from
//! [`MapSurface::add_marker`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::{
    MapOptions, BUILDING_BORDER_WIDTH, BUILDING_FILL_COLOR, BUILDING_FILL_OPACITY,
    FLOOR_PLAN_CORNERS, FLOOR_PLAN_OPACITY,
};
use crate::events::SurfaceEventSink;
use crate::geometry::LngLatBounds;
use crate::types::LatLng;

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Surface-assigned marker handle.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct MarkerId(pub u64);

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "marker#{}", self.0)
    }
}

/// Where the surface is mounted (element id, window handle name, …).
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Sources and layers
// ---------------------------------------------------------------------------

/// Source and layer identifiers.
pub mod ids {
    pub const BUILDING_OUTLINE_SOURCE: &str = "building-outline";
    pub const BUILDING_FILL_LAYER: &str = "building-fill";
    pub const BUILDING_BORDER_LAYER: &str = "building-border";

    pub const FLOOR_PLAN_SOURCE: &str = "floor-plan";
    pub const FLOOR_PLAN_LAYER: &str = "floor-plan-layer";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceSpec {
    /// GeoJSON feature or feature collection.
    Geojson { data: serde_json::Value },
    /// Raster image pinned to four corners (TL, TR, BR, BL).
    Image {
        url: String,
        coordinates: [LatLng; FLOOR_PLAN_CORNERS],
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Fill,
    Line,
    Raster,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub id: String,
    pub kind: LayerKind,
    pub source: String,
    pub paint: serde_json::Value,
}

impl LayerSpec {
    pub fn building_fill() -> Self {
        Self {
            id: ids::BUILDING_FILL_LAYER.into(),
            kind: LayerKind::Fill,
            source: ids::BUILDING_OUTLINE_SOURCE.into(),
            paint: json!({
                "fill-color": BUILDING_FILL_COLOR,
                "fill-opacity": BUILDING_FILL_OPACITY,
            }),
        }
    }

    pub fn building_border() -> Self {
        Self {
            id: ids::BUILDING_BORDER_LAYER.into(),
            kind: LayerKind::Line,
            source: ids::BUILDING_OUTLINE_SOURCE.into(),
            paint: json!({
                "line-color": BUILDING_FILL_COLOR,
                "line-width": BUILDING_BORDER_WIDTH,
            }),
        }
    }

    pub fn floor_plan() -> Self {
        Self {
            id: ids::FLOOR_PLAN_LAYER.into(),
            kind: LayerKind::Raster,
            source: ids::FLOOR_PLAN_SOURCE.into(),
            paint: json!({
                "raster-opacity": FLOOR_PLAN_OPACITY,
                "raster-fade-duration": 0,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Markers and camera
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerKind {
    /// Library default pin in the given colour.
    Pin { color: String },
    /// Clickable element showing `icon_url`, `size` px square.
    Icon { icon_url: String, size: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopupSpec {
    pub text: String,
    /// Vertical offset from the marker anchor, px.
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub position: LatLng,
    pub kind: MarkerKind,
    /// Popup toggled by clicking the marker.
    pub popup: Option<PopupSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyTo {
    pub center: LatLng,
    pub zoom: f64,
    pub duration: Duration,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("map surface could not be created in '{container}': {reason}")]
    Create { container: String, reason: String },
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Imperative map API.  Calls on missing ids are no-ops.
pub trait MapSurface {
    fn add_source(&mut self, id: &str, source: SourceSpec);
    fn remove_source(&mut self, id: &str);
    fn has_source(&self, id: &str) -> bool;

    fn add_layer(&mut self, layer: LayerSpec);
    fn remove_layer(&mut self, id: &str);
    fn has_layer(&self, id: &str) -> bool;

    fn fit_bounds(&mut self, bounds: LngLatBounds, padding_px: u32, max_zoom: f64);
    /// Instant pan, zoom unchanged.
    fn set_center(&mut self, center: LatLng);
    fn fly_to(&mut self, camera: FlyTo);

    fn add_marker(&mut self, marker: MarkerSpec) -> MarkerId;
    fn remove_marker(&mut self, id: MarkerId);
    fn set_marker_position(&mut self, id: MarkerId, position: LatLng);
    fn set_marker_icon(&mut self, id: MarkerId, icon_url: &str);

    /// Opening/closing reports back through the sink given at construction.
    fn open_popup(&mut self, id: MarkerId);
    fn close_popup(&mut self, id: MarkerId);
    fn is_popup_open(&self, id: MarkerId) -> bool;

    /// Release the underlying map instance.
    fn destroy(self);
}

/// Builds surfaces.  The controller calls this once per initialisation.
pub trait SurfaceFactory {
    type Surface: MapSurface;

    fn create(
        &mut self,
        container: &ContainerId,
        options: &MapOptions,
        events: SurfaceEventSink,
    ) -> Result<Self::Surface, SurfaceError>;
}
