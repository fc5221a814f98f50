//! Cartography service payloads.
//!
//! This module owns **every shape that crosses the fetch boundary** between
//! the external cartography service and the core.  Nothing here is used past
//! [`crate::fetch`]: payloads are converted into [`crate::types`] on arrival.
//!
//! ## Normalization rules
//!
//! 1. Upstream JSON is camelCase; snake_case spellings are accepted as aliases.
//! 2. The floor-plan image reference may arrive as `maps.mapUrl`,
//!    `maps.map_url`, `mapUrl` or `map_url`.  It is stored as
//!    [`Floor::map_url`] only.
//! 3. A POI's category id/name may be flat (`categoryId`, `categoryName`) or
//!    taken from the first entry of its embedded `categories` list.  Flat
//!    values win.
//! 4. Category visibility is upstream's `public` flag, defaulting to `true`.

use serde::{Deserialize, Serialize};

use crate::types::{
    Building, BuildingData, BuildingId, CategoryId, Floor, FloorId, LatLng, Poi, PoiCategory,
    PoiId,
};

// ---------------------------------------------------------------------------
// Building  (GET building by id)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingPayload {
    pub id: BuildingId,
    #[serde(default)]
    pub name: String,
    pub location: LatLng,
    #[serde(default)]
    pub corners: Vec<LatLng>,
    #[serde(default, alias = "custom_fields")]
    pub custom_fields: serde_json::Map<String, serde_json::Value>,
}

impl From<BuildingPayload> for Building {
    fn from(p: BuildingPayload) -> Self {
        Building {
            id: p.id,
            name: p.name,
            location: p.location,
            corners: p.corners,
            custom_fields: p.custom_fields,
        }
    }
}

// ---------------------------------------------------------------------------
// Floors  (GET floors by building)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorMaps {
    #[serde(default, alias = "map_url")]
    pub map_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorPayload {
    pub id: FloorId,
    #[serde(alias = "building_id")]
    pub building_id: BuildingId,
    #[serde(default)]
    pub level: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub maps: Option<FloorMaps>,
    /// Flat spelling used by some service versions.
    #[serde(default, alias = "map_url")]
    pub map_url: Option<String>,
}

impl From<FloorPayload> for Floor {
    fn from(p: FloorPayload) -> Self {
        let map_url = p
            .maps
            .and_then(|m| m.map_url)
            .or(p.map_url)
            .filter(|url| !url.is_empty());
        Floor {
            id: p.id,
            building_id: p.building_id,
            level: p.level,
            name: p.name,
            map_url,
        }
    }
}

// ---------------------------------------------------------------------------
// POI categories  (GET poi categories)
// ---------------------------------------------------------------------------

fn visible_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoiCategoryPayload {
    pub id: CategoryId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "icon_url")]
    pub icon_url: String,
    #[serde(default, alias = "selected_icon_url")]
    pub selected_icon_url: String,
    #[serde(default = "visible_by_default", alias = "visible")]
    pub public: bool,
}

impl From<PoiCategoryPayload> for PoiCategory {
    fn from(p: PoiCategoryPayload) -> Self {
        PoiCategory {
            id: p.id,
            name: p.name,
            icon_url: p.icon_url,
            selected_icon_url: p.selected_icon_url,
            visible: p.public,
        }
    }
}

// ---------------------------------------------------------------------------
// POIs  (GET pois by building)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoiPayload {
    pub id: PoiId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub info: String,
    #[serde(alias = "floor_id")]
    pub floor_id: FloorId,
    #[serde(default, alias = "category_id")]
    pub category_id: Option<CategoryId>,
    #[serde(default, alias = "category_name")]
    pub category_name: Option<String>,
    /// Categories embedded by the service; only the first is meaningful.
    #[serde(default)]
    pub categories: Vec<PoiCategoryPayload>,
    pub location: LatLng,
}

impl PoiPayload {
    /// First embedded category, normalized.
    pub fn embedded_category(&self) -> Option<PoiCategory> {
        self.categories.first().cloned().map(PoiCategory::from)
    }
}

impl From<PoiPayload> for Poi {
    fn from(p: PoiPayload) -> Self {
        let embedded = p.categories.into_iter().next();
        let category_id = p.category_id.or(embedded.as_ref().map(|c| c.id));
        let category_name = p.category_name.or(embedded.and_then(|c| c.name));
        Poi {
            id: p.id,
            name: p.name,
            info: p.info,
            floor_id: p.floor_id,
            category_id,
            category_name,
            location: p.location,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset file
// ---------------------------------------------------------------------------

/// A saved copy of everything the service returns for one building.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetPayload {
    pub building: BuildingPayload,
    #[serde(default)]
    pub floors: Vec<FloorPayload>,
    #[serde(default)]
    pub pois: Vec<PoiPayload>,
    #[serde(default, alias = "poiCategories", alias = "poi_categories")]
    pub categories: Vec<PoiCategoryPayload>,
}

/// Normalize one building's payloads.  Categories only known through a POI's
/// embedded list are appended after the explicit ones.
pub fn normalize(
    building: BuildingPayload,
    floors: Vec<FloorPayload>,
    pois: Vec<PoiPayload>,
    categories: Vec<PoiCategoryPayload>,
) -> BuildingData {
    let mut categories: Vec<PoiCategory> = categories.into_iter().map(Into::into).collect();
    for embedded in pois.iter().filter_map(PoiPayload::embedded_category) {
        if !categories.iter().any(|c| c.id == embedded.id) {
            categories.push(embedded);
        }
    }

    BuildingData {
        building: building.into(),
        floors: floors.into_iter().map(Into::into).collect(),
        pois: pois.into_iter().map(Into::into).collect(),
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn floor(v: serde_json::Value) -> Floor {
        serde_json::from_value::<FloorPayload>(v).unwrap().into()
    }

    #[test]
    fn floor_image_key_variants_normalize() {
        let nested_camel = floor(json!({"id": 1, "buildingId": 7, "maps": {"mapUrl": "a.png"}}));
        let nested_snake = floor(json!({"id": 1, "buildingId": 7, "maps": {"map_url": "b.png"}}));
        let flat_camel = floor(json!({"id": 1, "buildingId": 7, "mapUrl": "c.png"}));
        let flat_snake = floor(json!({"id": 1, "building_id": 7, "map_url": "d.png"}));

        assert_eq!(nested_camel.map_url.as_deref(), Some("a.png"));
        assert_eq!(nested_snake.map_url.as_deref(), Some("b.png"));
        assert_eq!(flat_camel.map_url.as_deref(), Some("c.png"));
        assert_eq!(flat_snake.map_url.as_deref(), Some("d.png"));
    }

    #[test]
    fn floor_without_image_has_none() {
        let f = floor(json!({"id": 3, "buildingId": 7, "level": -1, "maps": {"mapUrl": ""}}));
        assert_eq!(f.map_url, None);
        assert_eq!(f.level, -1);
        assert_eq!(f.name, "");
    }

    #[test]
    fn poi_category_from_embedded_list() {
        let p: PoiPayload = serde_json::from_value(json!({
            "id": 10, "name": "Lift", "floorId": 1,
            "location": {"lat": 1.0, "lng": 2.0},
            "categories": [{
                "id": 4, "name": "Access",
                "iconUrl": "/i.png", "selectedIconUrl": "/s.png"
            }]
        }))
        .unwrap();
        let cat = p.embedded_category().unwrap();
        assert!(cat.visible);
        assert_eq!(cat.icon_url, "/i.png");

        let poi: Poi = p.into();
        assert_eq!(poi.category_id, Some(4));
        assert_eq!(poi.category_name.as_deref(), Some("Access"));
        assert_eq!(poi.info, "");
    }

    #[test]
    fn flat_category_fields_win() {
        let poi: Poi = serde_json::from_value::<PoiPayload>(json!({
            "id": 3, "name": "Meeting Room", "floorId": 2, "categoryId": 9,
            "categoryName": "meeting", "location": {"lat": 0.0, "lng": 0.0},
            "categories": [{"id": 4, "name": "Access"}]
        }))
        .unwrap()
        .into();
        assert_eq!(poi.category_id, Some(9));
        assert_eq!(poi.category_name.as_deref(), Some("meeting"));
    }

    #[test]
    fn public_flag_maps_to_visible() {
        let c: PoiCategory = serde_json::from_value::<PoiCategoryPayload>(json!({
            "id": 1, "iconUrl": "/icons/access.png", "selectedIconUrl": "/icons/accessSelected.png",
            "public": false
        }))
        .unwrap()
        .into();
        assert!(!c.visible);
        assert_eq!(c.selected_icon_url, "/icons/accessSelected.png");
    }

    #[test]
    fn normalize_appends_unknown_embedded_categories() {
        let ds: DatasetPayload = serde_json::from_value(json!({
            "building": {"id": 7033, "name": "B", "location": {"lat": 0.0, "lng": 0.0}},
            "poiCategories": [{"id": 1, "iconUrl": "/a.png", "selectedIconUrl": "/b.png"}],
            "pois": [
                {"id": 1, "floorId": 1, "location": {"lat": 0.0, "lng": 0.0},
                 "categories": [{"id": 1, "iconUrl": "/other.png"}]},
                {"id": 2, "floorId": 1, "location": {"lat": 0.0, "lng": 0.0},
                 "categories": [{"id": 2, "iconUrl": "/c.png"}]}
            ]
        }))
        .unwrap();
        let data = normalize(ds.building, ds.floors, ds.pois, ds.categories);
        let ids: Vec<_> = data.categories.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(data.categories[0].icon_url, "/a.png");
        assert!(data.building.corners.is_empty());
    }
}
