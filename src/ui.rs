//! Presentational view-models: app header/status, floor selector, POI list.
//!
//! Each is computed from a store snapshot and carries no state of its own.
//! `Display` renders the plain-text form the headless binary prints.

use std::fmt;

use crate::store::BuildingStore;
use crate::types::{Floor, FloorId, Poi, PoiId};

// ---------------------------------------------------------------------------
// App status
// ---------------------------------------------------------------------------

/// Top-level screen, in priority order: loading, error, empty, ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppView {
    Loading,
    Error(String),
    NoBuilding,
    Ready { title: String },
}

pub fn app_view(store: &BuildingStore) -> AppView {
    let st = store.snapshot();
    if st.is_loading {
        return AppView::Loading;
    }
    if let Some(message) = st.error {
        return AppView::Error(message);
    }
    match st.building {
        None => AppView::NoBuilding,
        Some(b) => AppView::Ready {
            title: b.name.clone(),
        },
    }
}

impl fmt::Display for AppView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppView::Loading => write!(f, "Loading building data..."),
            AppView::Error(message) => write!(f, "Error fetching building data: {message}"),
            AppView::NoBuilding => write!(f, "No building data available"),
            AppView::Ready { title } => write!(f, "{title}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Floor selector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorOption {
    /// `None` is "All Floors".
    pub floor_id: Option<FloorId>,
    pub label: String,
    pub title: Option<String>,
    pub selected: bool,
}

/// "All Floors" first, then floors from highest level to lowest.  Empty when
/// there are no floors (the selector is hidden).
pub fn floor_options(floors: &[Floor], selected: Option<FloorId>) -> Vec<FloorOption> {
    if floors.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&Floor> = floors.iter().collect();
    sorted.sort_by(|a, b| b.level.cmp(&a.level));

    let mut options = Vec::with_capacity(floors.len() + 1);
    options.push(FloorOption {
        floor_id: None,
        label: "All Floors".into(),
        title: None,
        selected: selected.is_none(),
    });
    options.extend(sorted.into_iter().map(|floor| FloorOption {
        floor_id: Some(floor.id),
        label: floor_label(floor),
        title: Some(format!("Floor {}: {}", floor.level, floor.name)),
        selected: selected == Some(floor.id),
    }));
    options
}

pub fn floor_label(floor: &Floor) -> String {
    if floor.name.is_empty() {
        format!("Floor {}", floor.level)
    } else {
        floor.name.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorSelectorView {
    pub options: Vec<FloorOption>,
}

pub fn floor_selector(store: &BuildingStore) -> FloorSelectorView {
    FloorSelectorView {
        options: floor_options(&store.floors(), store.selected_floor_id()),
    }
}

impl fmt::Display for FloorSelectorView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.options.is_empty() {
            return Ok(());
        }
        writeln!(f, "Filter by Floor")?;
        for option in &self.options {
            let mark = if option.selected { '*' } else { ' ' };
            writeln!(f, " [{mark}] {}", option.label)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// POI list
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoiListItem {
    pub poi_id: PoiId,
    pub name: String,
    pub info: String,
    pub category_name: Option<String>,
    pub selected: bool,
}

impl PoiListItem {
    fn new(poi: &Poi, selected: Option<PoiId>) -> Self {
        Self {
            poi_id: poi.id,
            name: poi.name.clone(),
            info: poi.info.clone(),
            category_name: poi.category_name.clone(),
            selected: selected == Some(poi.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoiListView {
    Empty,
    Items(Vec<PoiListItem>),
}

impl PoiListView {
    pub fn len(&self) -> usize {
        match self {
            PoiListView::Empty => 0,
            PoiListView::Items(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The filtered POIs, in source order, with the selection flagged.
pub fn poi_list(store: &BuildingStore) -> PoiListView {
    let pois = store.filtered_pois();
    if pois.is_empty() {
        return PoiListView::Empty;
    }
    let selected = store.selected_poi_id();
    PoiListView::Items(pois.iter().map(|p| PoiListItem::new(p, selected)).collect())
}

impl fmt::Display for PoiListView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoiListView::Empty => writeln!(f, "No POIs found"),
            PoiListView::Items(items) => {
                for item in items {
                    let mark = if item.selected { '>' } else { ' ' };
                    write!(f, "{mark} {}", item.name)?;
                    if let Some(category) = &item.category_name {
                        write!(f, " ({category})")?;
                    }
                    if !item.info.is_empty() {
                        write!(f, " - {}", item.info)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
        }
    }
}
