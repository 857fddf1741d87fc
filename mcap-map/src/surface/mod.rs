//! Map surface abstraction
//!
//! The reconciler talks to a map library only through [`MapSurface`]:
//! create a marker, remove a marker, move the viewport. Which library sits
//! behind it is fixed when the binary is built. The `embedded-map` feature
//! links [`HeadlessSurface`]. Without it, [`default_provider`] hands out a
//! stub that always reports itself unavailable.

mod headless;
mod unavailable;

pub use headless::{HeadlessProvider, HeadlessSurface, MarkerSnapshot};
pub use unavailable::UnavailableProvider;

use futures::future::BoxFuture;
use mcap_common::{Coordinate, ItemKind};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;

/// Opaque handle to a marker living on a map surface
///
/// Handles are neither `Clone` nor `Copy`: whoever holds one is the only
/// party that can release it.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct MarkerHandle(u64);

impl MarkerHandle {
    /// Wrap a backend-specific marker id. Only surface backends call this.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Callback a surface invokes when its marker is clicked or tapped
pub type MarkerActivation = Arc<dyn Fn() + Send + Sync>;

/// Visual style of a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerStyle {
    /// Music capsule pin
    Capsule,
    /// Nearby listener
    Listener,
    /// The viewer's own position
    Viewer,
}

/// Icon drawn inside a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Glyph {
    MusicNote,
    People,
    Dot,
}

/// Everything a backend needs to draw a marker icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyleDescriptor {
    pub glyph: Glyph,
    /// CSS hex fill color
    pub fill: &'static str,
    /// Icon is a `size_px` square anchored at its centre
    pub size_px: u16,
    pub css_class: &'static str,
    /// Whether the marker reacts to clicks
    pub interactive: bool,
}

impl StyleDescriptor {
    pub fn anchor_px(&self) -> (u16, u16) {
        (self.size_px / 2, self.size_px / 2)
    }
}

impl MarkerStyle {
    pub fn for_kind(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Capsule => MarkerStyle::Capsule,
            ItemKind::Listener => MarkerStyle::Listener,
        }
    }

    pub fn descriptor(self) -> StyleDescriptor {
        match self {
            MarkerStyle::Capsule => StyleDescriptor {
                glyph: Glyph::MusicNote,
                fill: "#FF6B35",
                size_px: 40,
                css_class: "capsule-marker",
                interactive: true,
            },
            MarkerStyle::Listener => StyleDescriptor {
                glyph: Glyph::People,
                fill: "#00CED1",
                size_px: 32,
                css_class: "user-marker",
                interactive: true,
            },
            MarkerStyle::Viewer => StyleDescriptor {
                glyph: Glyph::Dot,
                fill: "#007AFF",
                size_px: 20,
                css_class: "user-location-marker",
                interactive: false,
            },
        }
    }
}

impl fmt::Display for MarkerStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerStyle::Capsule => write!(f, "capsule"),
            MarkerStyle::Listener => write!(f, "listener"),
            MarkerStyle::Viewer => write!(f, "viewer"),
        }
    }
}

/// Marker placement request
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub coordinate: Coordinate,
    pub style: MarkerStyle,
    /// Tooltip text
    pub title: String,
}

/// Imperative map surface operations
pub trait MapSurface: Send {
    /// Place a marker. `on_activate` is invoked on every click/tap.
    fn create_marker(
        &mut self,
        spec: MarkerSpec,
        on_activate: Option<MarkerActivation>,
    ) -> Result<MarkerHandle>;

    /// Remove a marker previously returned by `create_marker`
    fn remove_marker(&mut self, handle: MarkerHandle) -> Result<()>;

    fn set_viewport_center(&mut self, center: Coordinate, zoom: u8) -> Result<()>;

    /// Tear down the surface itself. Called once, after all markers are removed.
    fn release(&mut self) {}
}

/// Whether this build can host a map surface at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceCapability {
    Available,
    Unavailable,
}

/// Factory for map surfaces; opening may take a while
pub trait SurfaceProvider: Send + Sync {
    fn capability(&self) -> SurfaceCapability;

    fn open(&self) -> BoxFuture<'static, Result<Box<dyn MapSurface>>>;
}

/// Provider for this build's map backend
#[cfg(feature = "embedded-map")]
pub fn default_provider() -> Arc<dyn SurfaceProvider> {
    Arc::new(HeadlessProvider::new())
}

/// Provider for this build's map backend
#[cfg(not(feature = "embedded-map"))]
pub fn default_provider() -> Arc<dyn SurfaceProvider> {
    Arc::new(UnavailableProvider::new(
        "built without the embedded-map feature",
    ))
}
