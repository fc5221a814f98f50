//! Indoor Map
//!
//! Building map core: one state store, a memoized POI view, and a controller
//! that keeps a rendering surface (layers, markers, popups) in step with it.
//!
//! ## Architecture
//!
//! ```text
//! CartographyClient (fetch.rs)  ← external service, payloads in protocol.rs
//!   └── BuildingLoader (loader.rs)         ← liveness-guarded load
//!         └── BuildingStore (store.rs)     ← single source of truth
//!               ├── FilterCache (filter.rs)        ← derived POI view
//!               ├── SearchDebouncer (debounce.rs)  ← search box → store
//!               ├── views (ui.rs)                  ← header, floors, list
//!               └── MapController (map_sync.rs)    ← store ⇄ surface
//!                     └── MapSurface (surface.rs)  ← rendering library
//! ```
//!
//! The controller only ever talks to the surface through the
//! [`surface::MapSurface`] trait.  [`recording::RecordingSurface`] is an
//! in-memory implementation used by the tests and the headless binary.

pub mod config;
pub mod debounce;
pub mod events;
pub mod fetch;
pub mod filter;
pub mod geometry;
pub mod loader;
pub mod map_sync;
pub mod markers;
pub mod protocol;
pub mod recording;
pub mod store;
pub mod surface;
pub mod types;
pub mod ui;

// Convenience re-exports
pub use config::MapOptions;
pub use debounce::SearchDebouncer;
pub use events::{EventQueue, MapEvent, SurfaceEvent, SurfaceEventSink};
pub use fetch::{load_building_data, CartographyClient, CartographyDataset, FetchError};
pub use loader::{BuildingLoader, LoadHandle, LoadOutcome, Liveness};
pub use map_sync::{MapController, Phase};
pub use recording::{RecordingFactory, RecordingSurface, SurfaceOp};
pub use store::{BuildingStore, StoreEvent, StoreState, SubscriptionId};
pub use surface::{ContainerId, MapSurface, MarkerId, SurfaceError, SurfaceFactory};
pub use types::{Building, BuildingData, Floor, LatLng, Poi, PoiCategory};
