//! # Music Capsule Common Library
//!
//! Shared code for the music capsule map including:
//! - Geographic coordinates
//! - Data model (music capsules, nearby listeners, selectable items)
//! - In-memory catalog (demo data source)
//! - Event types (MapEvent enum) and EventBus
//! - Configuration loading
//! - Utility functions

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod geo;
pub mod models;
pub mod time;
pub mod uuid_utils;

pub use catalog::Catalog;
pub use error::{Error, Result};
pub use geo::Coordinate;
pub use models::{ItemKind, MusicCapsule, NearbyListener, SelectableItem};
