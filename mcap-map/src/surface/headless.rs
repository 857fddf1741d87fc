//! In-memory map surface
//!
//! Keeps markers in a table instead of drawing them. Clones share state, so a
//! caller can hand one clone to the reconciler and inspect or tap markers
//! through another.

use futures::future::{self, BoxFuture};
use mcap_common::Coordinate;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use super::{
    MapSurface, MarkerActivation, MarkerHandle, MarkerSpec, MarkerStyle, SurfaceCapability,
    SurfaceProvider,
};
use crate::error::{Error, Result};

/// Read-only view of one live marker
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSnapshot {
    /// Backend marker id; increases with creation order
    pub id: u64,
    pub coordinate: Coordinate,
    pub style: MarkerStyle,
    pub title: String,
}

struct HeadlessMarker {
    spec: MarkerSpec,
    activation: Option<MarkerActivation>,
}

#[derive(Default)]
struct HeadlessState {
    next_id: u64,
    /// Keyed by id, so iteration order is paint order
    markers: BTreeMap<u64, HeadlessMarker>,
    viewport: Option<(Coordinate, u8)>,
    created: u64,
    removed: u64,
    released: bool,
}

/// Map surface that records everything in memory
#[derive(Clone, Default)]
pub struct HeadlessSurface {
    inner: Arc<Mutex<HeadlessState>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, HeadlessState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn live_count(&self) -> usize {
        self.state().markers.len()
    }

    /// Live markers in paint order
    pub fn markers(&self) -> Vec<MarkerSnapshot> {
        self.state()
            .markers
            .iter()
            .map(|(id, marker)| MarkerSnapshot {
                id: *id,
                coordinate: marker.spec.coordinate,
                style: marker.spec.style,
                title: marker.spec.title.clone(),
            })
            .collect()
    }

    pub fn markers_with_style(&self, style: MarkerStyle) -> Vec<MarkerSnapshot> {
        self.markers()
            .into_iter()
            .filter(|m| m.style == style)
            .collect()
    }

    /// Current viewport center and zoom, if one was ever set
    pub fn viewport(&self) -> Option<(Coordinate, u8)> {
        self.state().viewport
    }

    /// Total markers ever created
    pub fn created_count(&self) -> u64 {
        self.state().created
    }

    /// Total markers ever removed
    pub fn removed_count(&self) -> u64 {
        self.state().removed
    }

    pub fn is_released(&self) -> bool {
        self.state().released
    }

    /// Simulate a click on marker `id`
    ///
    /// Returns false if the marker does not exist or is not interactive.
    /// The callback runs after the internal lock is dropped, so it may call
    /// back into the surface.
    pub fn tap(&self, id: u64) -> bool {
        let activation = self
            .state()
            .markers
            .get(&id)
            .and_then(|m| m.activation.clone());
        match activation {
            Some(activation) => {
                debug!("Headless surface: tap on marker {}", id);
                activation();
                true
            }
            None => false,
        }
    }

    /// Simulate a click on the first live marker with the given title
    pub fn tap_title(&self, title: &str) -> bool {
        let id = self
            .markers()
            .into_iter()
            .find(|m| m.title == title)
            .map(|m| m.id);
        id.map(|id| self.tap(id)).unwrap_or(false)
    }
}

impl MapSurface for HeadlessSurface {
    fn create_marker(
        &mut self,
        spec: MarkerSpec,
        on_activate: Option<MarkerActivation>,
    ) -> Result<MarkerHandle> {
        let mut state = self.state();
        if state.released {
            return Err(Error::Surface("surface already released".to_string()));
        }
        let id = state.next_id;
        state.next_id += 1;
        state.created += 1;
        debug!(
            "Headless surface: marker {} ({}) at {}",
            id, spec.style, spec.coordinate
        );
        state.markers.insert(
            id,
            HeadlessMarker {
                spec,
                activation: on_activate,
            },
        );
        Ok(MarkerHandle::from_raw(id))
    }

    fn remove_marker(&mut self, handle: MarkerHandle) -> Result<()> {
        let mut state = self.state();
        match state.markers.remove(&handle.raw()) {
            Some(_) => {
                state.removed += 1;
                Ok(())
            }
            None => Err(Error::Surface(format!("unknown marker {}", handle.raw()))),
        }
    }

    fn set_viewport_center(&mut self, center: Coordinate, zoom: u8) -> Result<()> {
        let mut state = self.state();
        if state.released {
            return Err(Error::Surface("surface already released".to_string()));
        }
        state.viewport = Some((center, zoom));
        Ok(())
    }

    fn release(&mut self) {
        self.state().released = true;
    }
}

/// Provider that opens a [`HeadlessSurface`] immediately
#[derive(Clone, Default)]
pub struct HeadlessProvider {
    surface: HeadlessSurface,
}

impl HeadlessProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider whose `open` hands out clones of `surface`
    pub fn with_surface(surface: HeadlessSurface) -> Self {
        Self { surface }
    }

    /// Shared view of the surface this provider opens
    pub fn surface(&self) -> HeadlessSurface {
        self.surface.clone()
    }
}

impl SurfaceProvider for HeadlessProvider {
    fn capability(&self) -> SurfaceCapability {
        SurfaceCapability::Available
    }

    /// Reopening after a release starts over with an empty viewport
    fn open(&self) -> BoxFuture<'static, Result<Box<dyn MapSurface>>> {
        {
            let mut state = self.surface.state();
            if state.released {
                state.released = false;
                state.viewport = None;
            }
        }
        let surface: Box<dyn MapSurface> = Box::new(self.surface.clone());
        Box::pin(future::ready(Ok(surface)))
    }
}
