//! `MapController` – keeps one rendering surface a function of store state.
//!
//! ## Lifecycle
//!
//! ```text
//!                 mount + building           surface Loaded
//!  Uninitialized ──────────────────► Initializing ───────────► Ready
//!        ▲                                 │                     │
//!        └──── unmount / building cleared / building replaced ───┘
//! ```
//!
//! Store changes and surface notifications are queued as [`MapEvent`]s and
//! applied by [`MapController::process`], one at a time, each handler reading
//! fresh state from the store.  Nothing touches layers or markers before
//! `Loaded`; everything that arrives earlier is applied in one sync on the
//! ready transition.
//!
//! ## Selection
//!
//! Store → map: the selected POI's popup opens, every other popup closes, the
//! camera flies to the POI.  Map → store: a popup opening selects its POI, a
//! popup closing clears the selection if it still points at that POI.  Both
//! directions are idempotent, so the echo of one side's change stops at the
//! other.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::{
    MapOptions, BOUNDS_PADDING_DEGREES, BOUNDS_PADDING_PX, FLOOR_PLAN_CORNERS, MAX_ZOOM,
    POI_FLY_TO_DURATION, POI_FLY_TO_ZOOM,
};
use crate::events::{EventQueue, MapEvent, SurfaceEvent, SurfaceEventSink};
use crate::geometry::{building_outline, floor_plan_coordinates, padded_bounds};
use crate::markers::{building_marker, poi_marker, MarkerIcons};
use crate::store::{BuildingStore, StoreEvent, SubscriptionId};
use crate::surface::{
    ids, ContainerId, FlyTo, LayerSpec, MapSurface, MarkerId, SourceSpec, SurfaceFactory,
};
use crate::types::{Building, BuildingId, FloorId, LatLng, Poi, PoiCategory, PoiId};

/// Minimum corners for an outline polygon.
const OUTLINE_MIN_CORNERS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initializing,
    Ready,
}

/// Map events a store change implies.
pub fn map_events_for(event: &StoreEvent) -> &'static [MapEvent] {
    use MapEvent::*;
    match event {
        StoreEvent::BuildingChanged => &[BuildingChanged],
        StoreEvent::FloorsChanged => &[FloorChanged],
        StoreEvent::SelectedFloorChanged => &[FloorChanged, PoiSetChanged],
        StoreEvent::PoisChanged
        | StoreEvent::CategoriesChanged
        | StoreEvent::SearchQueryChanged => &[PoiSetChanged],
        StoreEvent::SelectedPoiChanged => &[SelectionChanged],
        StoreEvent::DataLoaded | StoreEvent::Reset => &[
            BuildingChanged,
            FloorChanged,
            PoiSetChanged,
            SelectionChanged,
        ],
        StoreEvent::LoadingChanged | StoreEvent::ErrorChanged => &[],
    }
}

// ---------------------------------------------------------------------------
// Per-surface state
// ---------------------------------------------------------------------------

struct PoiMarker {
    id: MarkerId,
    icons: MarkerIcons,
}

#[derive(Debug, Clone, PartialEq)]
struct FloorPlan {
    floor_id: FloorId,
    url: String,
    coordinates: [LatLng; FLOOR_PLAN_CORNERS],
}

/// Everything tied to one surface instance.  Dropped as a unit on teardown.
struct Mounted<S> {
    surface: S,
    generation: u64,
    ready: bool,

    building_id: BuildingId,
    building_location: LatLng,
    building_corners: Vec<LatLng>,
    building_marker: Option<MarkerId>,

    /// Floor plan currently on the surface.
    floor_plan: Option<FloorPlan>,

    poi_markers: HashMap<PoiId, PoiMarker>,
    marker_to_poi: HashMap<MarkerId, PoiId>,
    /// Inputs of the current marker set, compared by identity.
    rendered_pois: Option<Arc<Vec<Poi>>>,
    rendered_categories: Option<Arc<Vec<PoiCategory>>>,

    /// Last selection the camera/popups were driven to.
    applied_selection: Option<Option<PoiId>>,
}

impl<S: MapSurface> Mounted<S> {
    fn new(surface: S, generation: u64, building: &Building) -> Self {
        Self {
            surface,
            generation,
            ready: false,
            building_id: building.id,
            building_location: building.location,
            building_corners: building.corners.clone(),
            building_marker: None,
            floor_plan: None,
            poi_markers: HashMap::new(),
            marker_to_poi: HashMap::new(),
            rendered_pois: None,
            rendered_categories: None,
            applied_selection: None,
        }
    }

    fn marker_for(&self, poi_id: PoiId) -> Option<MarkerId> {
        self.poi_markers.get(&poi_id).map(|m| m.id)
    }

    /// Outline source and its two layers; skipped below the corner minimum.
    fn draw_outline(&mut self, building: &Building) {
        if building.corners.len() < OUTLINE_MIN_CORNERS {
            debug!(
                "[map] building {} has {} corners; no outline",
                building.id,
                building.corners.len()
            );
            return;
        }
        self.surface.add_source(
            ids::BUILDING_OUTLINE_SOURCE,
            SourceSpec::Geojson {
                data: building_outline(&building.name, &building.corners),
            },
        );
        self.surface.add_layer(LayerSpec::building_fill());
        self.surface.add_layer(LayerSpec::building_border());
    }

    fn remove_outline(&mut self) {
        for layer in [ids::BUILDING_BORDER_LAYER, ids::BUILDING_FILL_LAYER] {
            if self.surface.has_layer(layer) {
                self.surface.remove_layer(layer);
            }
        }
        if self.surface.has_source(ids::BUILDING_OUTLINE_SOURCE) {
            self.surface.remove_source(ids::BUILDING_OUTLINE_SOURCE);
        }
    }

    fn fit_building(&mut self, building: &Building) {
        if let Some(bounds) = padded_bounds(&building.corners, BOUNDS_PADDING_DEGREES) {
            self.surface.fit_bounds(bounds, BOUNDS_PADDING_PX, MAX_ZOOM);
        }
    }

    fn remove_poi_markers(&mut self) {
        // Forget the mapping first: removal may report popup closes, and those
        // must not reach the store.
        self.marker_to_poi.clear();
        for (_, marker) in self.poi_markers.drain() {
            self.surface.remove_marker(marker.id);
        }
        self.rendered_pois = None;
        self.rendered_categories = None;
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct MapController<F: SurfaceFactory> {
    store: Arc<BuildingStore>,
    factory: F,
    queue: EventQueue,
    subscription: Option<SubscriptionId>,
    container: Option<ContainerId>,
    mounted: Option<Mounted<F::Surface>>,
    next_generation: u64,
}

impl<F: SurfaceFactory> MapController<F> {
    /// Subscribe to `store`.  Nothing is created until [`mount`](Self::mount).
    pub fn attach(store: Arc<BuildingStore>, factory: F) -> Self {
        let queue = EventQueue::new();
        let feed = queue.clone();
        let subscription = store.subscribe(move |event| {
            for map_event in map_events_for(event) {
                feed.push(*map_event);
            }
        });
        Self {
            store,
            factory,
            queue,
            subscription: Some(subscription),
            container: None,
            mounted: None,
            next_generation: 1,
        }
    }

    // -----------------------------------------------------------------------
    // Mount / unmount
    // -----------------------------------------------------------------------

    /// The view's container exists.  Starts initialization if a building is
    /// already loaded.
    pub fn mount(&mut self, container: ContainerId) {
        debug!("[map] mount '{}'", container.as_str());
        self.container = Some(container);
        self.ensure_initialized();
    }

    /// The view's container is gone.  Safe at any phase, any number of times.
    pub fn unmount(&mut self) {
        if self.container.take().is_some() {
            debug!("[map] unmount");
        }
        self.teardown("unmounted");
    }

    // -----------------------------------------------------------------------
    // Event pump
    // -----------------------------------------------------------------------

    /// Apply queued events until the queue is empty.  Returns how many were
    /// handled.
    pub fn process(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.queue.pop() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    pub fn handle(&mut self, event: MapEvent) {
        match event {
            MapEvent::BuildingChanged => self.sync_building(),
            MapEvent::FloorChanged => self.sync_floor(),
            MapEvent::PoiSetChanged => self.sync_pois(),
            MapEvent::SelectionChanged => self.sync_selection(),
            MapEvent::Surface { generation, event } => {
                let current = self.mounted.as_ref().map(|m| m.generation);
                if current != Some(generation) {
                    debug!("[map] stale surface event {:?} from #{}", event, generation);
                    return;
                }
                match event {
                    SurfaceEvent::Loaded => self.on_loaded(),
                    SurfaceEvent::PopupOpened(marker) => self.on_popup_opened(marker),
                    SurfaceEvent::PopupClosed(marker) => self.on_popup_closed(marker),
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        match &self.mounted {
            None => Phase::Uninitialized,
            Some(m) if m.ready => Phase::Ready,
            Some(_) => Phase::Initializing,
        }
    }

    pub fn surface(&self) -> Option<&F::Surface> {
        self.mounted.as_ref().map(|m| &m.surface)
    }

    /// Direct surface access, e.g. to simulate user input.  Events the
    /// surface emits are handled on the next [`process`](Self::process).
    pub fn surface_mut(&mut self) -> Option<&mut F::Surface> {
        self.mounted.as_mut().map(|m| &mut m.surface)
    }

    /// Generation of the live surface, if any.
    pub fn generation(&self) -> Option<u64> {
        self.mounted.as_ref().map(|m| m.generation)
    }

    pub fn marker_for_poi(&self, poi_id: PoiId) -> Option<MarkerId> {
        self.mounted.as_ref().and_then(|m| m.marker_for(poi_id))
    }

    pub fn building_marker(&self) -> Option<MarkerId> {
        self.mounted.as_ref().and_then(|m| m.building_marker)
    }

    pub fn poi_marker_count(&self) -> usize {
        self.mounted.as_ref().map_or(0, |m| m.poi_markers.len())
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn store(&self) -> &Arc<BuildingStore> {
        &self.store
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    // -----------------------------------------------------------------------
    // Building / lifecycle
    // -----------------------------------------------------------------------

    fn ensure_initialized(&mut self) {
        if self.mounted.is_some() {
            return;
        }
        let Some(container) = &self.container else {
            debug!("[map] no container; initialization deferred");
            return;
        };
        let Some(building) = self.store.building() else {
            debug!("[map] no building; initialization deferred");
            return;
        };

        let generation = self.next_generation;
        self.next_generation += 1;
        let options = MapOptions::for_building(&building);
        let sink = SurfaceEventSink::new(self.queue.clone(), generation);

        match self.factory.create(container, &options, sink) {
            Ok(surface) => {
                info!(
                    "[map] surface #{} initializing for building {} '{}'",
                    generation, building.id, building.name
                );
                self.mounted = Some(Mounted::new(surface, generation, &building));
            }
            Err(e) => warn!("[map] {}", e),
        }
    }

    fn teardown(&mut self, reason: &str) {
        let Some(mut m) = self.mounted.take() else {
            return;
        };
        if m.ready {
            m.remove_poi_markers();
            if let Some(marker) = m.building_marker.take() {
                m.surface.remove_marker(marker);
            }
        }
        let generation = m.generation;
        m.surface.destroy();
        info!("[map] surface #{} released ({})", generation, reason);
    }

    fn sync_building(&mut self) {
        let building = self.store.building();
        let mounted_id = self.mounted.as_ref().map(|m| m.building_id);
        match (building, mounted_id) {
            (None, None) => {}
            (None, Some(_)) => self.teardown("building cleared"),
            (Some(b), Some(id)) if id == b.id => self.follow_building(&b),
            (Some(_), Some(_)) => {
                self.teardown("building replaced");
                self.ensure_initialized();
            }
            (Some(_), None) => self.ensure_initialized(),
        }
    }

    /// Same building id with new data.  A moved anchor pans and moves the
    /// pin, keeping the zoom.  New corners redraw the outline, refit the
    /// camera and re-pin the floor plan.
    fn follow_building(&mut self, building: &Building) {
        let Some(m) = self.mounted.as_mut() else {
            return;
        };
        let moved = m.building_location != building.location;
        let reshaped = m.building_corners != building.corners;
        if !moved && !reshaped {
            return;
        }
        m.building_location = building.location;
        if reshaped {
            m.building_corners = building.corners.clone();
        }
        if !m.ready {
            return;
        }

        if moved {
            debug!("[map] building moved to {}; panning", building.location);
            m.surface.set_center(building.location);
            if let Some(marker) = m.building_marker {
                m.surface.set_marker_position(marker, building.location);
            }
        }
        if reshaped {
            debug!("[map] building {} corners changed; redrawing", building.id);
            m.remove_outline();
            m.draw_outline(building);
            m.fit_building(building);
            self.sync_floor();
        }
    }

    fn on_loaded(&mut self) {
        let Some(m) = self.mounted.as_mut() else {
            return;
        };
        if m.ready {
            return;
        }
        let Some(building) = self.store.building() else {
            return;
        };
        m.ready = true;
        info!("[map] surface #{} ready", m.generation);

        m.fit_building(&building);
        m.draw_outline(&building);

        m.building_marker = Some(m.surface.add_marker(building_marker(&building)));

        self.sync_floor();
        self.sync_pois();
        self.sync_selection();
    }

    // -----------------------------------------------------------------------
    // Floor plan
    // -----------------------------------------------------------------------

    fn sync_floor(&mut self) {
        let Some(m) = self.mounted.as_mut().filter(|m| m.ready) else {
            return;
        };

        let building = self.store.building();
        let wanted = self.store.selected_floor().and_then(|floor| {
            Some(FloorPlan {
                floor_id: floor.id,
                url: floor.map_url?,
                coordinates: floor_plan_coordinates(&building.as_ref()?.corners)?,
            })
        });
        if wanted == m.floor_plan {
            return;
        }

        if m.surface.has_layer(ids::FLOOR_PLAN_LAYER) {
            m.surface.remove_layer(ids::FLOOR_PLAN_LAYER);
        }
        if m.surface.has_source(ids::FLOOR_PLAN_SOURCE) {
            m.surface.remove_source(ids::FLOOR_PLAN_SOURCE);
        }
        m.floor_plan = None;

        let Some(plan) = wanted else {
            debug!("[map] no floor plan for current floor");
            return;
        };
        m.surface.add_source(
            ids::FLOOR_PLAN_SOURCE,
            SourceSpec::Image {
                url: plan.url.clone(),
                coordinates: plan.coordinates,
            },
        );
        m.surface.add_layer(LayerSpec::floor_plan());
        debug!("[map] floor plan for floor {} -> {}", plan.floor_id, plan.url);
        m.floor_plan = Some(plan);
    }

    // -----------------------------------------------------------------------
    // POI markers
    // -----------------------------------------------------------------------

    fn sync_pois(&mut self) {
        let Some(m) = self.mounted.as_mut().filter(|m| m.ready) else {
            return;
        };

        let pois = self.store.filtered_pois();
        let categories = self.store.poi_categories();
        let same_pois = m.rendered_pois.as_ref().is_some_and(|r| Arc::ptr_eq(r, &pois));
        let same_categories = m
            .rendered_categories
            .as_ref()
            .is_some_and(|r| Arc::ptr_eq(r, &categories));
        if same_pois && same_categories {
            return;
        }

        m.remove_poi_markers();

        for poi in pois.iter() {
            let category = poi
                .category_id
                .and_then(|id| categories.iter().find(|c| c.id == id));
            let icons = MarkerIcons::for_category(category);
            let id = m.surface.add_marker(poi_marker(poi, &icons));
            m.marker_to_poi.insert(id, poi.id);
            m.poi_markers.insert(poi.id, PoiMarker { id, icons });
        }
        debug!("[map] {} POI markers placed", m.poi_markers.len());

        m.rendered_pois = Some(pois);
        m.rendered_categories = Some(categories);

        // Keep the selection visible across rebuilds without moving the camera.
        if let Some(marker) = self.store.selected_poi_id().and_then(|id| m.marker_for(id)) {
            m.surface.open_popup(marker);
        }
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    fn sync_selection(&mut self) {
        let Some(m) = self.mounted.as_mut().filter(|m| m.ready) else {
            return;
        };

        let selected = self.store.selected_poi_id();
        if m.applied_selection == Some(selected) {
            return;
        }
        m.applied_selection = Some(selected);

        let target = selected.and_then(|id| m.marker_for(id));
        for marker in m.poi_markers.values() {
            if Some(marker.id) != target && m.surface.is_popup_open(marker.id) {
                m.surface.close_popup(marker.id);
            }
        }

        let Some(poi_id) = selected else {
            return;
        };
        let Some(marker) = target else {
            debug!("[map] POI {} has no marker; camera unchanged", poi_id);
            return;
        };
        if !m.surface.is_popup_open(marker) {
            m.surface.open_popup(marker);
        }
        if let Some(poi) = self.store.poi_by_id(poi_id) {
            m.surface.fly_to(FlyTo {
                center: poi.location,
                zoom: POI_FLY_TO_ZOOM,
                duration: POI_FLY_TO_DURATION,
            });
        }
    }

    fn on_popup_opened(&mut self, marker: MarkerId) {
        let Some(m) = self.mounted.as_mut() else {
            return;
        };
        let Some(&poi_id) = m.marker_to_poi.get(&marker) else {
            return;
        };
        if let Some(pm) = m.poi_markers.get(&poi_id) {
            m.surface.set_marker_icon(marker, &pm.icons.selected_icon_url);
        }
        if self.store.selected_poi_id() != Some(poi_id) {
            self.store.set_selected_poi_id(Some(poi_id));
        }
    }

    fn on_popup_closed(&mut self, marker: MarkerId) {
        let Some(m) = self.mounted.as_mut() else {
            return;
        };
        let Some(&poi_id) = m.marker_to_poi.get(&marker) else {
            return;
        };
        if let Some(pm) = m.poi_markers.get(&poi_id) {
            m.surface.set_marker_icon(marker, &pm.icons.icon_url);
        }
        if self.store.selected_poi_id() == Some(poi_id) {
            self.store.set_selected_poi_id(None);
        }
    }
}

impl<F: SurfaceFactory> Drop for MapController<F> {
    fn drop(&mut self) {
        self.teardown("controller dropped");
        if let Some(id) = self.subscription.take() {
            self.store.unsubscribe(id);
        }
    }
}
