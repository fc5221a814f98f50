//! `BuildingStore` – the single authoritative state container.
//!
//! Constructed once per application instance and shared as
//! `Arc<BuildingStore>`.  Every mutator replaces its field(s) under the write
//! lock, releases it, then notifies listeners synchronously in subscription
//! order.  Listeners may read or mutate the store from inside the callback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::debug;
use parking_lot::{Mutex, RwLock};

use crate::filter::FilterCache;
use crate::types::{
    Building, BuildingData, CategoryId, Floor, FloorId, Poi, PoiCategory, PoiId,
};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Plain snapshot of everything the store holds.  Cheap to clone: collections
/// are shared.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub building: Option<Arc<Building>>,
    pub floors: Arc<Vec<Floor>>,
    pub pois: Arc<Vec<Poi>>,
    pub poi_categories: Arc<Vec<PoiCategory>>,

    /// `None` means all floors.
    pub selected_floor_id: Option<FloorId>,
    pub selected_poi_id: Option<PoiId>,
    pub search_query: String,

    pub is_loading: bool,
    pub error: Option<String>,
}

/// What a mutation touched.  One event per mutator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    BuildingChanged,
    FloorsChanged,
    PoisChanged,
    CategoriesChanged,
    SelectedFloorChanged,
    SelectedPoiChanged,
    SearchQueryChanged,
    LoadingChanged,
    ErrorChanged,
    /// Building, floors, POIs and categories replaced together; filters and
    /// selection reset.
    DataLoaded,
    /// Every field back to its initial value.
    Reset,
}

pub type Listener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct SubscriptionId(u64);

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct BuildingStore {
    state: RwLock<StoreState>,
    cache: Mutex<FilterCache>,
    listeners: RwLock<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

impl Default for BuildingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildingStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            cache: Mutex::new(FilterCache::new()),
            listeners: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    pub fn subscribe(
        &self,
        listener: impl Fn(&StoreEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    // -----------------------------------------------------------------------
    // Mutators
    // -----------------------------------------------------------------------

    pub fn set_building(&self, building: Building) {
        self.update(StoreEvent::BuildingChanged, |st| {
            st.building = Some(Arc::new(building))
        });
    }

    pub fn set_floors(&self, floors: Vec<Floor>) {
        self.update(StoreEvent::FloorsChanged, |st| st.floors = Arc::new(floors));
    }

    pub fn set_pois(&self, pois: Vec<Poi>) {
        self.update(StoreEvent::PoisChanged, |st| st.pois = Arc::new(pois));
    }

    pub fn set_poi_categories(&self, categories: Vec<PoiCategory>) {
        self.update(StoreEvent::CategoriesChanged, |st| {
            st.poi_categories = Arc::new(categories)
        });
    }

    pub fn set_selected_floor_id(&self, id: Option<FloorId>) {
        self.update(StoreEvent::SelectedFloorChanged, |st| {
            st.selected_floor_id = id
        });
    }

    pub fn set_selected_poi_id(&self, id: Option<PoiId>) {
        self.update(StoreEvent::SelectedPoiChanged, |st| st.selected_poi_id = id);
    }

    /// Committed as given; debouncing belongs to the input surface.
    pub fn set_search_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.update(StoreEvent::SearchQueryChanged, |st| st.search_query = query);
    }

    pub fn set_loading(&self, is_loading: bool) {
        self.update(StoreEvent::LoadingChanged, |st| st.is_loading = is_loading);
    }

    pub fn set_error(&self, error: Option<String>) {
        self.update(StoreEvent::ErrorChanged, |st| st.error = error);
    }

    /// Replace building, floors, POIs and categories in one step.  The first
    /// floor becomes the selected one; query and POI selection are cleared.
    pub fn apply_building_data(&self, data: BuildingData) {
        let BuildingData {
            building,
            floors,
            pois,
            categories,
        } = data;
        self.update(StoreEvent::DataLoaded, |st| {
            st.selected_floor_id = floors.first().map(|f| f.id);
            st.selected_poi_id = None;
            st.search_query.clear();
            st.building = Some(Arc::new(building));
            st.floors = Arc::new(floors);
            st.pois = Arc::new(pois);
            st.poi_categories = Arc::new(categories);
        });
    }

    pub fn reset(&self) {
        self.update(StoreEvent::Reset, |st| *st = StoreState::default());
    }

    fn update(&self, event: StoreEvent, apply: impl FnOnce(&mut StoreState)) {
        {
            let mut st = self.state.write();
            apply(&mut st);
        }
        debug!("[store] {:?}", event);
        self.notify(&event);
    }

    fn notify(&self, event: &StoreEvent) {
        // Snapshot so listeners can (un)subscribe from inside the callback.
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn snapshot(&self) -> StoreState {
        self.state.read().clone()
    }

    pub fn building(&self) -> Option<Arc<Building>> {
        self.state.read().building.clone()
    }

    pub fn floors(&self) -> Arc<Vec<Floor>> {
        self.state.read().floors.clone()
    }

    pub fn pois(&self) -> Arc<Vec<Poi>> {
        self.state.read().pois.clone()
    }

    pub fn poi_categories(&self) -> Arc<Vec<PoiCategory>> {
        self.state.read().poi_categories.clone()
    }

    pub fn selected_floor_id(&self) -> Option<FloorId> {
        self.state.read().selected_floor_id
    }

    pub fn selected_poi_id(&self) -> Option<PoiId> {
        self.state.read().selected_poi_id
    }

    pub fn search_query(&self) -> String {
        self.state.read().search_query.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    // -----------------------------------------------------------------------
    // Derived
    // -----------------------------------------------------------------------

    /// POIs on the selected floor matching the search query.
    ///
    /// Returns the identical `Arc` until the POI list, selected floor or
    /// query changes.
    pub fn filtered_pois(&self) -> Arc<Vec<Poi>> {
        let (pois, floor, query) = {
            let st = self.state.read();
            (st.pois.clone(), st.selected_floor_id, st.search_query.clone())
        };
        self.cache.lock().get(&pois, floor, &query)
    }

    /// Times the filtered view was actually recomputed.
    pub fn filter_computations(&self) -> u64 {
        self.cache.lock().computations()
    }

    pub fn floor_by_id(&self, id: FloorId) -> Option<Floor> {
        self.state.read().floors.iter().find(|f| f.id == id).cloned()
    }

    pub fn poi_by_id(&self, id: PoiId) -> Option<Poi> {
        self.state.read().pois.iter().find(|p| p.id == id).cloned()
    }

    pub fn poi_category_by_id(&self, id: CategoryId) -> Option<PoiCategory> {
        self.state
            .read()
            .poi_categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub fn selected_floor(&self) -> Option<Floor> {
        self.selected_floor_id().and_then(|id| self.floor_by_id(id))
    }

    pub fn selected_poi(&self) -> Option<Poi> {
        self.selected_poi_id().and_then(|id| self.poi_by_id(id))
    }
}

impl std::fmt::Debug for BuildingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildingStore")
            .field("state", &*self.state.read())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
