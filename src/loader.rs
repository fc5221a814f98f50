//! Load orchestration: fetch → store, guarded by a liveness flag.
//!
//! The consumer that started a load owns its [`Liveness`].  Once cancelled
//! (view torn down), a result that arrives later is dropped without touching
//! the store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::task::JoinHandle;

use crate::fetch::{load_building_data, CartographyClient, FetchError};
use crate::store::BuildingStore;
use crate::types::BuildingId;

/// Shared "is the consumer still there" flag.  Starts alive.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Data (or the error) was written to the store.
    Applied,
    /// The consumer went away first; the store was not touched.
    Discarded,
}

pub struct BuildingLoader<C: ?Sized> {
    client: Arc<C>,
    store: Arc<BuildingStore>,
}

impl<C: ?Sized> Clone for BuildingLoader<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            store: self.store.clone(),
        }
    }
}

impl<C> BuildingLoader<C>
where
    C: CartographyClient + ?Sized + 'static,
{
    pub fn new(client: Arc<C>, store: Arc<BuildingStore>) -> Self {
        Self { client, store }
    }

    /// Run one load to completion.
    ///
    /// Sets loading and clears the previous error, then either applies the
    /// whole data set or records the error message.  Previous data is left
    /// in place on failure.
    pub async fn load(
        &self,
        building_id: BuildingId,
        liveness: &Liveness,
    ) -> Result<LoadOutcome, FetchError> {
        if !liveness.is_alive() {
            return Ok(LoadOutcome::Discarded);
        }

        self.store.set_loading(true);
        self.store.set_error(None);

        let result = load_building_data(self.client.as_ref(), building_id).await;

        if !liveness.is_alive() {
            debug!("[loader] building {} result discarded (consumer gone)", building_id);
            return Ok(LoadOutcome::Discarded);
        }

        match result {
            Ok(data) => {
                self.store.apply_building_data(data);
                self.store.set_loading(false);
                info!("[loader] building {} applied", building_id);
                Ok(LoadOutcome::Applied)
            }
            Err(e) => {
                warn!("[loader] building {} failed: {}", building_id, e);
                self.store.set_error(Some(e.to_string()));
                self.store.set_loading(false);
                Err(e)
            }
        }
    }

    /// Run [`load`](Self::load) on the runtime.  Dropping the handle cancels
    /// the load's effect on the store.
    pub fn spawn(&self, building_id: BuildingId) -> LoadHandle {
        let liveness = Liveness::new();
        let loader = self.clone();
        let task_liveness = liveness.clone();
        let task = tokio::spawn(async move { loader.load(building_id, &task_liveness).await });
        LoadHandle {
            liveness,
            task: Some(task),
        }
    }
}

/// An in-flight spawned load.
pub struct LoadHandle {
    liveness: Liveness,
    task: Option<JoinHandle<Result<LoadOutcome, FetchError>>>,
}

impl LoadHandle {
    pub fn liveness(&self) -> &Liveness {
        &self.liveness
    }

    /// Mark the load stale.  The fetch itself may still finish.
    pub fn cancel(&self) {
        self.liveness.cancel();
    }

    /// Wait for the load.  A task that did not run to completion counts as
    /// discarded.
    pub async fn join(mut self) -> Result<LoadOutcome, FetchError> {
        let Some(task) = self.task.take() else {
            return Ok(LoadOutcome::Discarded);
        };
        match task.await {
            Ok(result) => result,
            Err(e) => {
                warn!("[loader] load task ended abnormally: {}", e);
                Ok(LoadOutcome::Discarded)
            }
        }
    }
}

impl Drop for LoadHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.liveness.cancel();
        }
    }
}
