//! Event types for the map event system
//!
//! Provides the shared event definitions and the EventBus the map screen
//! broadcasts on. Selection views, loggers and tests subscribe to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::geo::Coordinate;
use crate::models::{ItemKind, SelectableItem};

/// Map event types
///
/// Events are broadcast via EventBus and serialize with a `type` tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MapEvent {
    /// A map surface was bound and centered
    SurfaceBound {
        center: Coordinate,
        /// Whether the viewer's own marker was drawn
        viewer_marker: bool,
        timestamp: DateTime<Utc>,
    },

    /// The platform cannot host a map surface
    ///
    /// Triggers:
    /// - UI: Show the "map unavailable" fallback panel
    SurfaceUnavailable {
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A surface finished opening after the map was torn down and was dropped
    BindDiscarded { timestamp: DateTime<Utc> },

    /// Markers were rebuilt from a fresh input pair
    MarkersReconciled {
        capsules: usize,
        listeners: usize,
        skipped: usize,
        /// Markers released from the previous pass
        released: usize,
        timestamp: DateTime<Utc>,
    },

    /// One input record could not be placed on the map
    RecordSkipped {
        kind: ItemKind,
        id: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A marker was tapped
    ///
    /// Triggers:
    /// - UI: Open the player sheet or listener card for `item`
    MarkerActivated {
        item: SelectableItem,
        timestamp: DateTime<Utc>,
    },

    /// The detail sheet was closed
    SelectionCleared { timestamp: DateTime<Utc> },

    /// A capsule was added to or removed from favorites
    FavoriteToggled {
        capsule_id: String,
        favorited: bool,
        timestamp: DateTime<Utc>,
    },

    /// All markers released and the surface unbound
    TornDown { timestamp: DateTime<Utc> },
}

impl MapEvent {
    /// Event name as used in the serialized `type` tag
    pub fn name(&self) -> &'static str {
        match self {
            MapEvent::SurfaceBound { .. } => "SurfaceBound",
            MapEvent::SurfaceUnavailable { .. } => "SurfaceUnavailable",
            MapEvent::BindDiscarded { .. } => "BindDiscarded",
            MapEvent::MarkersReconciled { .. } => "MarkersReconciled",
            MapEvent::RecordSkipped { .. } => "RecordSkipped",
            MapEvent::MarkerActivated { .. } => "MarkerActivated",
            MapEvent::SelectionCleared { .. } => "SelectionCleared",
            MapEvent::FavoriteToggled { .. } => "FavoriteToggled",
            MapEvent::TornDown { .. } => "TornDown",
        }
    }
}

/// Broadcast channel for map events
///
/// Cloning shares the same underlying channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MapEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    ///
    /// # Examples
    ///
    /// ```
    /// use mcap_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<MapEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: MapEvent) -> Result<usize, broadcast::error::SendError<MapEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: MapEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
