//! Derived POI view: floor + search filtering with a per-store memo.
//!
//! [`FilterCache::get`] returns the *same* `Arc` while its three inputs are
//! unchanged.  Consumers compare with `Arc::ptr_eq` to skip re-rendering.

use std::sync::Arc;

use crate::types::{FloorId, Poi};

/// `pois` restricted to `floor` (all when `None`) and to entries whose name
/// or category name contains `query` case-insensitively (all when blank).
/// Source order is kept.
pub fn filter_pois(pois: &[Poi], floor: Option<FloorId>, query: &str) -> Vec<Poi> {
    let needle = query.trim().to_lowercase();
    pois.iter()
        .filter(|poi| floor.map_or(true, |f| poi.floor_id == f))
        .filter(|poi| needle.is_empty() || matches_query(poi, &needle))
        .cloned()
        .collect()
}

fn matches_query(poi: &Poi, needle: &str) -> bool {
    poi.name.to_lowercase().contains(needle)
        || poi
            .category_name
            .as_deref()
            .is_some_and(|c| c.to_lowercase().contains(needle))
}

// ---------------------------------------------------------------------------
// Memo
// ---------------------------------------------------------------------------

struct Entry {
    /// Held (not just its address) so the allocation cannot be reused by a
    /// different POI list while cached.
    pois: Arc<Vec<Poi>>,
    floor: Option<FloorId>,
    query: String,
    result: Arc<Vec<Poi>>,
}

/// Last inputs + last result.  One per store instance.
#[derive(Default)]
pub struct FilterCache {
    last: Option<Entry>,
    computations: u64,
}

impl FilterCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &mut self,
        pois: &Arc<Vec<Poi>>,
        floor: Option<FloorId>,
        query: &str,
    ) -> Arc<Vec<Poi>> {
        if let Some(e) = &self.last {
            if Arc::ptr_eq(&e.pois, pois) && e.floor == floor && e.query == query {
                return e.result.clone();
            }
        }

        let result = Arc::new(filter_pois(pois, floor, query));
        self.computations += 1;
        self.last = Some(Entry {
            pois: pois.clone(),
            floor,
            query: query.to_string(),
            result: result.clone(),
        });
        result
    }

    /// How many times the filter actually ran.
    pub fn computations(&self) -> u64 {
        self.computations
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

impl std::fmt::Debug for FilterCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterCache")
            .field("cached", &self.last.is_some())
            .field("computations", &self.computations)
            .finish()
    }
}
