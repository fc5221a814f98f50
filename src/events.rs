//! Events driving the map synchronisation controller.
//!
//! Two producers feed one queue:
//!
//! ```text
//! BuildingStore listener ──► MapEvent::{BuildingChanged, FloorChanged, …}
//!                                      │
//! rendering surface ──► SurfaceEventSink ──► MapEvent::Surface { generation, … }
//!                                      ▼
//!                               EventQueue  ──►  MapController::process()
//! ```
//!
//! Producers only push.  All handling happens when the controller drains the
//! queue, so a handler that writes to the store (popup → selection) never
//! re-enters the controller; the resulting store event is simply queued
//! behind it.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::surface::MarkerId;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Notifications a rendering surface reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// Style and tiles loaded; sources/layers/markers may now be added.
    Loaded,
    /// A marker popup opened (user click or programmatic).
    PopupOpened(MarkerId),
    /// A marker popup closed (user, programmatic, or marker removal).
    PopupClosed(MarkerId),
}

/// A single unit of work for the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEvent {
    /// Building replaced, cleared, or its location changed.
    BuildingChanged,
    /// Selected floor (or the floor list) changed.
    FloorChanged,
    /// Any input of the filtered POI view, or the categories, changed.
    PoiSetChanged,
    /// Selected POI changed, from any origin.
    SelectionChanged,
    /// Surface notification, tagged with the surface instance it came from.
    Surface { generation: u64, event: SurfaceEvent },
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// FIFO shared between producers and the controller.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    inner: Arc<Mutex<VecDeque<MapEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: MapEvent) {
        self.inner.lock().push_back(event);
    }

    pub fn pop(&self) -> Option<MapEvent> {
        self.inner.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

/// Handed to a surface at construction.  Stamps every event with the
/// generation of the surface that produced it, so events from a torn-down
/// surface are recognisable after a remount.
#[derive(Debug, Clone)]
pub struct SurfaceEventSink {
    queue: EventQueue,
    generation: u64,
}

impl SurfaceEventSink {
    pub fn new(queue: EventQueue, generation: u64) -> Self {
        Self { queue, generation }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn emit(&self, event: SurfaceEvent) {
        self.queue.push(MapEvent::Surface {
            generation: self.generation,
            event,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_is_fifo() {
        let q = EventQueue::new();
        q.push(MapEvent::FloorChanged);
        q.push(MapEvent::SelectionChanged);
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some(MapEvent::FloorChanged));
        assert_eq!(q.pop(), Some(MapEvent::SelectionChanged));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn sink_tags_generation() {
        let q = EventQueue::new();
        let sink = SurfaceEventSink::new(q.clone(), 7);
        sink.emit(SurfaceEvent::Loaded);
        assert_eq!(
            q.pop(),
            Some(MapEvent::Surface {
                generation: 7,
                event: SurfaceEvent::Loaded
            })
        );
    }

    #[test]
    fn clones_share_one_queue() {
        let q = EventQueue::new();
        let other = q.clone();
        other.push(MapEvent::BuildingChanged);
        assert!(!q.is_empty());
        q.clear();
        assert!(other.is_empty());
    }
}
