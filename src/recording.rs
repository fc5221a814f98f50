//! In-memory [`MapSurface`] that journals every call.
//!
//! Behaves like a real map library where it matters to the controller:
//! popups report open/close through the event sink (also when toggled
//! programmatically or when their marker is removed), and sources/layers can
//! be queried.  The journal outlives the surface so teardown can be audited.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::config::MapOptions;
use crate::events::{SurfaceEvent, SurfaceEventSink};
use crate::geometry::LngLatBounds;
use crate::surface::{
    ContainerId, FlyTo, LayerSpec, MapSurface, MarkerId, MarkerKind, MarkerSpec, SourceSpec,
    SurfaceError, SurfaceFactory,
};
use crate::types::LatLng;

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// One surface call, as recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Create { container: String, options: MapOptions },
    AddSource { id: String },
    RemoveSource { id: String },
    AddLayer { id: String },
    RemoveLayer { id: String },
    FitBounds { bounds: LngLatBounds, padding_px: u32 },
    SetCenter { center: LatLng },
    FlyTo(FlyTo),
    AddMarker { id: MarkerId, position: LatLng },
    RemoveMarker { id: MarkerId },
    MoveMarker { id: MarkerId, position: LatLng },
    SetMarkerIcon { id: MarkerId, icon_url: String },
    OpenPopup { id: MarkerId },
    ClosePopup { id: MarkerId },
    Destroy,
}

impl SurfaceOp {
    /// True for operations that touch sources, layers or markers.
    pub fn is_layer_or_marker_op(&self) -> bool {
        matches!(
            self,
            SurfaceOp::AddSource { .. }
                | SurfaceOp::RemoveSource { .. }
                | SurfaceOp::AddLayer { .. }
                | SurfaceOp::RemoveLayer { .. }
                | SurfaceOp::AddMarker { .. }
                | SurfaceOp::RemoveMarker { .. }
                | SurfaceOp::MoveMarker { .. }
                | SurfaceOp::SetMarkerIcon { .. }
                | SurfaceOp::OpenPopup { .. }
                | SurfaceOp::ClosePopup { .. }
        )
    }
}

/// Shared, append-only operation log.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    ops: Arc<Mutex<Vec<SurfaceOp>>>,
}

impl Journal {
    fn record(&self, op: SurfaceOp) {
        self.ops.lock().push(op);
    }

    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.ops.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.ops.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.lock().is_empty()
    }

    pub fn count(&self, pred: impl Fn(&SurfaceOp) -> bool) -> usize {
        self.ops.lock().iter().filter(|op| pred(op)).count()
    }

    pub fn clear(&self) {
        self.ops.lock().clear();
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RecordingFactory {
    journal: Journal,
    created: Arc<AtomicU64>,
    fail_next: Option<String>,
    ready_on_create: bool,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    /// Number of surfaces built so far (shared with clones of the counter).
    pub fn created(&self) -> Arc<AtomicU64> {
        self.created.clone()
    }

    /// Surfaces report `Loaded` as soon as they are built, like a map whose
    /// style is already cached.
    pub fn ready_on_create(mut self) -> Self {
        self.ready_on_create = true;
        self
    }

    /// Make the next `create` fail with `reason`.
    pub fn fail_next(&mut self, reason: impl Into<String>) {
        self.fail_next = Some(reason.into());
    }
}

impl SurfaceFactory for RecordingFactory {
    type Surface = RecordingSurface;

    fn create(
        &mut self,
        container: &ContainerId,
        options: &MapOptions,
        events: SurfaceEventSink,
    ) -> Result<RecordingSurface, SurfaceError> {
        if let Some(reason) = self.fail_next.take() {
            return Err(SurfaceError::Create {
                container: container.as_str().to_string(),
                reason,
            });
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        self.journal.record(SurfaceOp::Create {
            container: container.as_str().to_string(),
            options: options.clone(),
        });
        debug!(
            "[recording] surface #{} created in '{}'",
            events.generation(),
            container.as_str()
        );
        if self.ready_on_create {
            events.emit(SurfaceEvent::Loaded);
        }
        Ok(RecordingSurface {
            journal: self.journal.clone(),
            events,
            sources: BTreeMap::new(),
            layers: Vec::new(),
            markers: HashMap::new(),
            next_marker: 1,
            center: options.center,
            zoom: options.zoom,
        })
    }
}

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedMarker {
    pub spec: MarkerSpec,
    pub position: LatLng,
    /// Icon currently shown (changes on popup open/close).
    pub icon_url: Option<String>,
    pub popup_open: bool,
}

#[derive(Debug)]
pub struct RecordingSurface {
    journal: Journal,
    events: SurfaceEventSink,
    sources: BTreeMap<String, SourceSpec>,
    /// Draw order.
    layers: Vec<LayerSpec>,
    markers: HashMap<MarkerId, RecordedMarker>,
    next_marker: u64,
    center: LatLng,
    zoom: f64,
}

impl RecordingSurface {
    /// The sink this surface reports through; tests use it to play the
    /// library's part (`Loaded`).
    pub fn events(&self) -> SurfaceEventSink {
        self.events.clone()
    }

    /// Simulate a user click: toggles the marker's popup.
    pub fn click_marker(&mut self, id: MarkerId) {
        if self.is_popup_open(id) {
            self.close_popup(id);
        } else {
            self.open_popup(id);
        }
    }

    pub fn source(&self, id: &str) -> Option<&SourceSpec> {
        self.sources.get(id)
    }

    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.id.as_str()).collect()
    }

    pub fn marker(&self, id: MarkerId) -> Option<&RecordedMarker> {
        self.markers.get(&id)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn open_popups(&self) -> Vec<MarkerId> {
        let mut open: Vec<_> = self
            .markers
            .iter()
            .filter(|(_, m)| m.popup_open)
            .map(|(id, _)| *id)
            .collect();
        open.sort_by_key(|id| id.0);
        open
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }
}

impl MapSurface for RecordingSurface {
    fn add_source(&mut self, id: &str, source: SourceSpec) {
        self.journal.record(SurfaceOp::AddSource { id: id.into() });
        self.sources.insert(id.into(), source);
    }

    fn remove_source(&mut self, id: &str) {
        if self.sources.remove(id).is_some() {
            self.journal.record(SurfaceOp::RemoveSource { id: id.into() });
        }
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn add_layer(&mut self, layer: LayerSpec) {
        self.journal.record(SurfaceOp::AddLayer {
            id: layer.id.clone(),
        });
        self.layers.push(layer);
    }

    fn remove_layer(&mut self, id: &str) {
        let before = self.layers.len();
        self.layers.retain(|l| l.id != id);
        if self.layers.len() != before {
            self.journal.record(SurfaceOp::RemoveLayer { id: id.into() });
        }
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l.id == id)
    }

    fn fit_bounds(&mut self, bounds: LngLatBounds, padding_px: u32, max_zoom: f64) {
        self.journal.record(SurfaceOp::FitBounds { bounds, padding_px });
        self.center = LatLng::new(
            (bounds.south_west.lat + bounds.north_east.lat) / 2.0,
            (bounds.south_west.lng + bounds.north_east.lng) / 2.0,
        );
        self.zoom = self.zoom.min(max_zoom);
    }

    fn set_center(&mut self, center: LatLng) {
        self.journal.record(SurfaceOp::SetCenter { center });
        self.center = center;
    }

    fn fly_to(&mut self, camera: FlyTo) {
        self.journal.record(SurfaceOp::FlyTo(camera));
        self.center = camera.center;
        self.zoom = camera.zoom;
    }

    fn add_marker(&mut self, marker: MarkerSpec) -> MarkerId {
        let id = MarkerId(self.next_marker);
        self.next_marker += 1;
        self.journal.record(SurfaceOp::AddMarker {
            id,
            position: marker.position,
        });
        let icon_url = match &marker.kind {
            MarkerKind::Icon { icon_url, .. } => Some(icon_url.clone()),
            MarkerKind::Pin { .. } => None,
        };
        self.markers.insert(
            id,
            RecordedMarker {
                position: marker.position,
                spec: marker,
                icon_url,
                popup_open: false,
            },
        );
        id
    }

    fn remove_marker(&mut self, id: MarkerId) {
        if let Some(m) = self.markers.remove(&id) {
            self.journal.record(SurfaceOp::RemoveMarker { id });
            if m.popup_open {
                self.events.emit(SurfaceEvent::PopupClosed(id));
            }
        }
    }

    fn set_marker_position(&mut self, id: MarkerId, position: LatLng) {
        if let Some(m) = self.markers.get_mut(&id) {
            m.position = position;
            self.journal.record(SurfaceOp::MoveMarker { id, position });
        }
    }

    fn set_marker_icon(&mut self, id: MarkerId, icon_url: &str) {
        if let Some(m) = self.markers.get_mut(&id) {
            m.icon_url = Some(icon_url.to_string());
            self.journal.record(SurfaceOp::SetMarkerIcon {
                id,
                icon_url: icon_url.to_string(),
            });
        }
    }

    fn open_popup(&mut self, id: MarkerId) {
        let Some(m) = self.markers.get_mut(&id) else {
            return;
        };
        if m.spec.popup.is_none() || m.popup_open {
            return;
        }
        m.popup_open = true;
        self.journal.record(SurfaceOp::OpenPopup { id });
        self.events.emit(SurfaceEvent::PopupOpened(id));
    }

    fn close_popup(&mut self, id: MarkerId) {
        let Some(m) = self.markers.get_mut(&id) else {
            return;
        };
        if !m.popup_open {
            return;
        }
        m.popup_open = false;
        self.journal.record(SurfaceOp::ClosePopup { id });
        self.events.emit(SurfaceEvent::PopupClosed(id));
    }

    fn is_popup_open(&self, id: MarkerId) -> bool {
        self.markers.get(&id).is_some_and(|m| m.popup_open)
    }

    fn destroy(self) {
        self.journal.record(SurfaceOp::Destroy);
        debug!("[recording] surface #{} destroyed", self.events.generation());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventQueue, MapEvent};
    use crate::surface::PopupSpec;

    fn surface() -> (RecordingSurface, EventQueue, Journal) {
        let mut factory = RecordingFactory::new();
        let q = EventQueue::new();
        let s = factory
            .create(
                &ContainerId::new("map"),
                &MapOptions::default(),
                SurfaceEventSink::new(q.clone(), 1),
            )
            .unwrap();
        (s, q, factory.journal())
    }

    fn with_popup() -> MarkerSpec {
        MarkerSpec {
            position: LatLng::new(1.0, 2.0),
            kind: MarkerKind::Icon {
                icon_url: "a.png".into(),
                size: 32,
            },
            popup: Some(PopupSpec {
                text: "hi".into(),
                offset: 30,
            }),
        }
    }

    #[test]
    fn click_toggles_popup_and_reports() {
        let (mut s, q, _) = surface();
        let m = s.add_marker(with_popup());

        s.click_marker(m);
        assert!(s.is_popup_open(m));
        s.click_marker(m);
        assert!(!s.is_popup_open(m));

        let surface_events: Vec<_> = std::iter::from_fn(|| q.pop()).collect();
        assert_eq!(
            surface_events,
            vec![
                MapEvent::Surface {
                    generation: 1,
                    event: SurfaceEvent::PopupOpened(m)
                },
                MapEvent::Surface {
                    generation: 1,
                    event: SurfaceEvent::PopupClosed(m)
                },
            ]
        );
    }

    #[test]
    fn removing_marker_with_open_popup_reports_close() {
        let (mut s, q, _) = surface();
        let m = s.add_marker(with_popup());
        s.open_popup(m);
        q.clear();

        s.remove_marker(m);
        assert_eq!(s.marker_count(), 0);
        assert_eq!(
            q.pop(),
            Some(MapEvent::Surface {
                generation: 1,
                event: SurfaceEvent::PopupClosed(m)
            })
        );
    }

    #[test]
    fn journal_survives_destroy() {
        let (mut s, _, journal) = surface();
        s.add_layer(LayerSpec::building_fill());
        s.destroy();
        let ops = journal.ops();
        assert!(matches!(ops.first(), Some(SurfaceOp::Create { .. })));
        assert_eq!(ops.last(), Some(&SurfaceOp::Destroy));
    }

    #[test]
    fn ready_on_create_reports_loaded() {
        let mut factory = RecordingFactory::new().ready_on_create();
        let q = EventQueue::new();
        factory
            .create(
                &ContainerId::new("map"),
                &MapOptions::default(),
                SurfaceEventSink::new(q.clone(), 4),
            )
            .unwrap();
        assert_eq!(
            q.pop(),
            Some(MapEvent::Surface {
                generation: 4,
                event: SurfaceEvent::Loaded
            })
        );
    }

    #[test]
    fn failing_factory_reports_container() {
        let mut factory = RecordingFactory::new();
        factory.fail_next("no webgl");
        let err = factory
            .create(
                &ContainerId::new("map"),
                &MapOptions::default(),
                SurfaceEventSink::new(EventQueue::new(), 1),
            )
            .unwrap_err();
        assert!(err.to_string().contains("no webgl"));
        assert_eq!(factory.created().load(Ordering::SeqCst), 0);
    }
}
