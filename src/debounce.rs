//! Search input debounce.
//!
//! Keystrokes go to [`SearchDebouncer::input`]; only the last value is
//! committed to the store, [`SEARCH_DEBOUNCE`] after it was typed.  Requires
//! a Tokio runtime.
//!
//! Loading a building or resetting the store drops any uncommitted value, so
//! a keystroke typed against the previous building never lands in the new one.

use std::sync::Arc;
use std::time::Duration;

use log::trace;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::config::SEARCH_DEBOUNCE;
use crate::store::{BuildingStore, StoreEvent, SubscriptionId};

/// State shared with the store listener.
struct SearchBox {
    /// What the search box shows right now (committed or not).
    text: Mutex<String>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl SearchBox {
    fn cancel(&self) {
        if let Some(task) = self.pending.lock().take() {
            task.abort();
        }
    }
}

pub struct SearchDebouncer {
    store: Arc<BuildingStore>,
    delay: Duration,
    search: Arc<SearchBox>,
    subscription: SubscriptionId,
}

impl SearchDebouncer {
    pub fn new(store: Arc<BuildingStore>) -> Self {
        Self::with_delay(store, SEARCH_DEBOUNCE)
    }

    pub fn with_delay(store: Arc<BuildingStore>, delay: Duration) -> Self {
        let search = Arc::new(SearchBox {
            text: Mutex::new(store.search_query()),
            pending: Mutex::new(None),
        });

        let listener = search.clone();
        let subscription = store.subscribe(move |event| {
            // Both events leave the store with an empty query.
            if matches!(event, StoreEvent::DataLoaded | StoreEvent::Reset) {
                listener.cancel();
                listener.text.lock().clear();
            }
        });

        Self {
            store,
            delay,
            search,
            subscription,
        }
    }

    /// Restart the timer with `text` as the value to commit.
    pub fn input(&self, text: impl Into<String>) {
        let text = text.into();
        *self.search.text.lock() = text.clone();

        let store = self.store.clone();
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            trace!("[debounce] committing {:?}", text);
            store.set_search_query(text);
        });

        if let Some(previous) = self.search.pending.lock().replace(task) {
            previous.abort();
        }
    }

    /// Empty the box and commit `""` immediately.
    pub fn clear(&self) {
        self.cancel();
        self.search.text.lock().clear();
        self.store.set_search_query("");
    }

    /// Drop any uncommitted value.
    pub fn cancel(&self) {
        self.search.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.search
            .pending
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub fn text(&self) -> String {
        self.search.text.lock().clone()
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.store.unsubscribe(self.subscription);
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Building, BuildingData, LatLng};
    use tokio::time::sleep;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn only_last_value_is_committed_after_delay() {
        let store = Arc::new(BuildingStore::new());
        let search = SearchDebouncer::new(store.clone());

        search.input("c");
        sleep(ms(100)).await;
        search.input("co");
        sleep(ms(100)).await;
        search.input("coffee");
        assert_eq!(search.text(), "coffee");

        sleep(ms(299)).await;
        assert_eq!(store.search_query(), "");
        assert!(search.is_pending());

        sleep(ms(2)).await;
        assert_eq!(store.search_query(), "coffee");
        assert!(!search.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_commits_immediately_and_cancels_pending() {
        let store = Arc::new(BuildingStore::new());
        store.set_search_query("room");
        let search = SearchDebouncer::new(store.clone());
        assert_eq!(search.text(), "room");

        search.input("roomx");
        search.clear();
        assert_eq!(store.search_query(), "");

        sleep(ms(500)).await;
        assert_eq!(store.search_query(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn building_load_drops_pending_input() {
        let store = Arc::new(BuildingStore::new());
        let search = SearchDebouncer::new(store.clone());

        search.input("coffee");
        sleep(ms(100)).await;
        store.apply_building_data(BuildingData {
            building: Building {
                id: 8000,
                name: "Annex".into(),
                location: LatLng::new(40.0, -3.0),
                corners: vec![],
                custom_fields: Default::default(),
            },
            floors: vec![],
            pois: vec![],
            categories: vec![],
        });

        assert!(!search.is_pending());
        assert_eq!(search.text(), "");
        sleep(ms(500)).await;
        assert_eq!(store.search_query(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn reset_drops_pending_input() {
        let store = Arc::new(BuildingStore::new());
        let search = SearchDebouncer::new(store.clone());

        search.input("lift");
        store.reset();
        sleep(ms(500)).await;

        assert_eq!(store.search_query(), "");
        assert_eq!(search.text(), "");

        // Typing afterwards works as before.
        search.input("room");
        sleep(ms(301)).await;
        assert_eq!(store.search_query(), "room");
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_cancels_pending_commit() {
        let store = Arc::new(BuildingStore::new());
        {
            let search = SearchDebouncer::new(store.clone());
            search.input("lift");
            assert_eq!(store.listener_count(), 1);
        }
        sleep(ms(500)).await;
        assert_eq!(store.search_query(), "");
        assert_eq!(store.listener_count(), 0);
    }
}
