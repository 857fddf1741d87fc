//! Marker reconciler
//!
//! Keeps the markers on a map surface in step with the current pair of input
//! collections (music capsules, nearby listeners) and routes marker taps to a
//! caller-supplied activation callback.
//!
//! Every `reconcile` releases all markers it owns and rebuilds from scratch.
//! Capsules are placed before listeners, so listeners paint on top on
//! surfaces that render in call order.
//!
//! States: `Unbound -> Idle <-> MarkersRendered -> Unbound`. Only binding
//! leaves `Unbound`; `set_center` and `reconcile` are no-ops there.

use mcap_common::{Coordinate, ItemKind, MusicCapsule, NearbyListener, SelectableItem};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::surface::{MapSurface, MarkerActivation, MarkerHandle, MarkerSpec, MarkerStyle};

/// Receives the item behind an activated marker
pub type ActivationCallback = Arc<dyn Fn(SelectableItem) + Send + Sync>;

/// What the UI should show in place of the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapAvailability {
    /// No binding attempted since creation or the last teardown
    Unknown,
    /// A surface is being opened
    Pending,
    Available,
    /// The platform cannot host a map; show the fallback panel
    Unavailable,
}

/// Lifecycle state of the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilerState {
    Unbound,
    Idle,
    MarkersRendered,
}

/// Result of a binding attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    Bound,
    /// A surface was already bound; the new one was ignored
    AlreadyBound,
    Unavailable,
    /// The map was torn down while the surface was opening
    Discarded,
}

/// Token tying an asynchronous surface open to the binding epoch it started in
#[must_use = "pass the ticket to finish_bind once the surface has opened"]
#[derive(Debug)]
pub struct BindTicket {
    epoch: u64,
}

/// An input record left off the map
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub kind: ItemKind,
    pub id: String,
    pub reason: String,
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// False when the reconciler was unbound and did nothing
    pub applied: bool,
    pub capsules: usize,
    pub listeners: usize,
    /// Markers from the previous pass that were released
    pub released: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl ReconcileReport {
    pub fn rendered(&self) -> usize {
        self.capsules + self.listeners
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MarkerKey {
    kind: ItemKind,
    id: String,
}

struct BoundSurface {
    surface: Box<dyn MapSurface>,
    center: Coordinate,
    viewer_marker: Option<MarkerHandle>,
    markers: HashMap<MarkerKey, MarkerHandle>,
}

/// Owns the markers for one map surface
pub struct MarkerReconciler {
    bound: Option<BoundSurface>,
    availability: MapAvailability,
    /// Bumped by every teardown; stale bind tickets compare unequal
    epoch: u64,
    zoom: u8,
    on_activate: ActivationCallback,
}

impl MarkerReconciler {
    pub fn new(zoom: u8, on_activate: ActivationCallback) -> Self {
        Self {
            bound: None,
            availability: MapAvailability::Unknown,
            epoch: 0,
            zoom,
            on_activate,
        }
    }

    pub fn state(&self) -> ReconcilerState {
        match &self.bound {
            None => ReconcilerState::Unbound,
            Some(bound) if bound.markers.is_empty() => ReconcilerState::Idle,
            Some(_) => ReconcilerState::MarkersRendered,
        }
    }

    pub fn availability(&self) -> MapAvailability {
        self.availability
    }

    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    /// Item markers currently owned (the viewer marker is not counted)
    pub fn marker_count(&self) -> usize {
        self.bound.as_ref().map_or(0, |b| b.markers.len())
    }

    pub fn has_viewer_marker(&self) -> bool {
        self.bound
            .as_ref()
            .is_some_and(|b| b.viewer_marker.is_some())
    }

    pub fn center(&self) -> Option<Coordinate> {
        self.bound.as_ref().map(|b| b.center)
    }

    /// Whether the marker for item `id` of `kind` is currently on the map
    pub fn contains(&self, kind: ItemKind, id: &str) -> bool {
        self.bound.as_ref().is_some_and(|b| {
            b.markers.contains_key(&MarkerKey {
                kind,
                id: id.to_string(),
            })
        })
    }

    /// Raw surface id of the marker for item `id` of `kind`
    ///
    /// Lets a caller route a click to exactly one record even when titles
    /// or ids repeat across kinds.
    pub fn marker_id(&self, kind: ItemKind, id: &str) -> Option<u64> {
        let key = MarkerKey {
            kind,
            id: id.to_string(),
        };
        self.bound
            .as_ref()
            .and_then(|b| b.markers.get(&key))
            .map(MarkerHandle::raw)
    }

    /// Bind to an already-open surface
    ///
    /// Centers the viewport on `center` and draws the viewer's marker when
    /// `viewer` is known. A second call while bound changes nothing, and the
    /// second surface is dropped without `release`: providers may hand out
    /// views of one shared surface, and releasing the duplicate would tear
    /// down the bound one. Once the map was reported unavailable the
    /// reconciler stays unbound and releases any surface it is given.
    pub fn initialize(
        &mut self,
        mut surface: Box<dyn MapSurface>,
        center: Coordinate,
        viewer: Option<Coordinate>,
    ) -> BindOutcome {
        if self.bound.is_some() {
            debug!("Reconciler already bound, ignoring second surface");
            return BindOutcome::AlreadyBound;
        }
        if self.availability == MapAvailability::Unavailable {
            warn!("Map already reported unavailable, releasing late surface");
            surface.release();
            return BindOutcome::Unavailable;
        }

        let center = match center.validate() {
            Ok(()) => center,
            Err(e) => {
                warn!("Invalid initial center {}: {}, using fallback", center, e);
                Coordinate::fallback()
            }
        };

        if let Err(e) = surface.set_viewport_center(center, self.zoom) {
            warn!("Failed to set initial viewport: {}", e);
        }

        let viewer_marker = viewer.and_then(|position| {
            if let Err(e) = position.validate() {
                warn!("Ignoring invalid viewer position {}: {}", position, e);
                return None;
            }
            let spec = MarkerSpec {
                coordinate: position,
                style: MarkerStyle::Viewer,
                title: "You are here".to_string(),
            };
            match surface.create_marker(spec, None) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!("Failed to draw viewer marker: {}", e);
                    None
                }
            }
        });

        info!(
            "Map surface bound at {} (zoom {}, viewer marker: {})",
            center,
            self.zoom,
            viewer_marker.is_some()
        );
        self.bound = Some(BoundSurface {
            surface,
            center,
            viewer_marker,
            markers: HashMap::new(),
        });
        self.availability = MapAvailability::Available;
        BindOutcome::Bound
    }

    /// Start an asynchronous bind
    ///
    /// Hand the ticket back to [`finish_bind`](Self::finish_bind) when the
    /// surface has opened. A teardown in between invalidates the ticket.
    pub fn begin_bind(&mut self) -> BindTicket {
        if self.bound.is_none() && self.availability != MapAvailability::Unavailable {
            self.availability = MapAvailability::Pending;
        }
        BindTicket { epoch: self.epoch }
    }

    /// Complete an asynchronous bind started with `begin_bind`
    pub fn finish_bind(
        &mut self,
        ticket: BindTicket,
        opened: Result<Box<dyn MapSurface>>,
        center: Coordinate,
        viewer: Option<Coordinate>,
    ) -> BindOutcome {
        if ticket.epoch != self.epoch {
            info!("Map torn down while the surface was opening, discarding it");
            if let Ok(mut surface) = opened {
                surface.release();
            }
            return BindOutcome::Discarded;
        }

        match opened {
            Ok(surface) => self.initialize(surface, center, viewer),
            Err(e) => {
                if self.bound.is_some() {
                    warn!("Second surface failed to open, keeping the bound one: {}", e);
                    return BindOutcome::AlreadyBound;
                }
                warn!("Map unavailable: {}", e);
                self.availability = MapAvailability::Unavailable;
                BindOutcome::Unavailable
            }
        }
    }

    /// Move the viewport; markers are untouched
    pub fn set_center(&mut self, center: Coordinate) {
        let Some(bound) = self.bound.as_mut() else {
            debug!("set_center while unbound, ignoring");
            return;
        };
        if let Err(e) = center.validate() {
            warn!("Ignoring invalid center {}: {}", center, e);
            return;
        }
        match bound.surface.set_viewport_center(center, self.zoom) {
            Ok(()) => bound.center = center,
            Err(e) => warn!("Failed to recenter map: {}", e),
        }
    }

    /// Replace every marker with markers for `capsules` then `listeners`
    ///
    /// Records without a usable coordinate, or repeating an id already placed
    /// in this pass, are skipped and listed in the report.
    pub fn reconcile(
        &mut self,
        capsules: &[MusicCapsule],
        listeners: &[NearbyListener],
    ) -> ReconcileReport {
        let Some(bound) = self.bound.as_mut() else {
            debug!("reconcile while unbound, ignoring");
            return ReconcileReport::default();
        };
        let on_activate = &self.on_activate;

        let mut report = ReconcileReport {
            applied: true,
            released: release_markers(bound),
            ..ReconcileReport::default()
        };

        for capsule in capsules {
            if place(bound, on_activate, capsule.clone().into(), &mut report) {
                report.capsules += 1;
            }
        }
        for listener in listeners {
            if place(bound, on_activate, listener.clone().into(), &mut report) {
                report.listeners += 1;
            }
        }

        info!(
            "Reconciled markers: {} capsules, {} listeners, {} skipped, {} released",
            report.capsules,
            report.listeners,
            report.skipped.len(),
            report.released
        );
        report
    }

    /// Release every marker and unbind. Safe to call repeatedly.
    ///
    /// Also cancels any bind still in flight. Returns the number of item
    /// markers released.
    pub fn teardown(&mut self) -> usize {
        self.epoch += 1;
        if self.availability != MapAvailability::Unavailable {
            self.availability = MapAvailability::Unknown;
        }

        let Some(mut bound) = self.bound.take() else {
            return 0;
        };
        let released = release_markers(&mut bound);
        if let Some(handle) = bound.viewer_marker.take() {
            if let Err(e) = bound.surface.remove_marker(handle) {
                warn!("Failed to remove viewer marker: {}", e);
            }
        }
        bound.surface.release();
        info!("Map torn down, released {} markers", released);
        released
    }
}

impl Drop for MarkerReconciler {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Remove all item markers; failures are logged and the handle dropped
fn release_markers(bound: &mut BoundSurface) -> usize {
    let mut released = 0;
    for (key, handle) in bound.markers.drain() {
        match bound.surface.remove_marker(handle) {
            Ok(()) => released += 1,
            Err(e) => warn!("Failed to remove {} '{}' marker: {}", key.kind, key.id, e),
        }
    }
    released
}

/// Create the marker for one item; false if it was skipped
fn place(
    bound: &mut BoundSurface,
    on_activate: &ActivationCallback,
    item: SelectableItem,
    report: &mut ReconcileReport,
) -> bool {
    let kind = item.kind();
    let mut skip = |error: Error| {
        warn!("Skipping {} '{}': {}", kind, item.id(), error);
        report.skipped.push(SkippedRecord {
            kind,
            id: item.id().to_string(),
            reason: error.to_string(),
        });
        false
    };
    let malformed = |reason: String| Error::MalformedRecord {
        id: item.id().to_string(),
        reason,
    };

    let coordinate = match item.marker_position() {
        Ok(coordinate) => coordinate,
        Err(e) => return skip(malformed(e.to_string())),
    };

    let key = MarkerKey {
        kind,
        id: item.id().to_string(),
    };
    if bound.markers.contains_key(&key) {
        return skip(malformed("duplicate id in this pass".to_string()));
    }

    let spec = MarkerSpec {
        coordinate,
        style: MarkerStyle::for_kind(kind),
        title: item.display_title().to_string(),
    };
    let callback = on_activate.clone();
    let activated = item.clone();
    let activation: MarkerActivation = Arc::new(move || callback(activated.clone()));

    match bound.surface.create_marker(spec, Some(activation)) {
        Ok(handle) => {
            debug!("Placed {} '{}' at {}", kind, key.id, coordinate);
            bound.markers.insert(key, handle);
            true
        }
        Err(e) => skip(e),
    }
}
