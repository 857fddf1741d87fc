//! # Music Capsule Map Library (mcap-map)
//!
//! Map view for location-pinned music capsules and nearby listeners.
//!
//! **Purpose:** Keep the markers on an external map surface consistent with
//! the current capsule/listener collections, and route marker taps to the
//! detail sheet.
//!
//! **Architecture:** A [`MarkerReconciler`](reconciler::MarkerReconciler)
//! owns every marker handle and rebuilds them on each reconciliation. The
//! map library itself sits behind [`MapSurface`](surface::MapSurface); the
//! backend is chosen at build time by the `embedded-map` feature.

pub mod error;
pub mod favorites;
pub mod filter;
pub mod location;
pub mod reconciler;
pub mod screen;
pub mod selection;
pub mod surface;
pub mod upload;

pub use error::{Error, Result};
pub use reconciler::{
    ActivationCallback, BindOutcome, MapAvailability, MarkerReconciler, ReconcileReport,
    ReconcilerState,
};
pub use screen::{MapHandle, MapScreen};
