//! Data model shared by the catalog, the map and the selection views
//!
//! Field names serialize in camelCase so catalog files keep the shape the
//! mobile client produced (`youtubeId`, `uploadedAt`, `isListening`, ...).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geo::Coordinate;
use crate::{Error, Result};

/// A user-submitted, location-tagged music capsule (point of interest)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicCapsule {
    /// Unique capsule id
    pub id: String,
    /// Song title
    pub title: String,
    /// Performing artist
    pub artist: String,
    /// YouTube video id (media reference)
    pub youtube_id: String,
    /// Thumbnail image URL
    pub thumbnail: String,
    /// Where the capsule was dropped. `None` marks a malformed record.
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
    /// Free-text tags, without the leading `#`
    #[serde(default)]
    pub hashtags: Vec<String>,
    /// Human readable location label
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Display name of the uploader
    pub uploaded_by: String,
    /// Upload date
    pub uploaded_at: NaiveDate,
}

/// A nearby listener's live position and listening activity (peer presence)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyListener {
    pub id: String,
    /// Display name
    pub name: String,
    /// Avatar image URL
    pub avatar: String,
    /// Last reported position. `None` marks a malformed record.
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
    /// "Song - Artist" label of what the listener is playing
    pub current_song: String,
    pub location: String,
    pub is_listening: bool,
}

/// Discriminates the two kinds of selectable map items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Capsule,
    Listener,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Capsule => write!(f, "capsule"),
            ItemKind::Listener => write!(f, "listener"),
        }
    }
}

/// Anything a map marker can stand for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectableItem {
    Capsule(MusicCapsule),
    Listener(NearbyListener),
}

impl SelectableItem {
    pub fn kind(&self) -> ItemKind {
        match self {
            SelectableItem::Capsule(_) => ItemKind::Capsule,
            SelectableItem::Listener(_) => ItemKind::Listener,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            SelectableItem::Capsule(capsule) => &capsule.id,
            SelectableItem::Listener(listener) => &listener.id,
        }
    }

    /// Title shown on the marker tooltip: song title or listener name
    pub fn display_title(&self) -> &str {
        match self {
            SelectableItem::Capsule(capsule) => &capsule.title,
            SelectableItem::Listener(listener) => &listener.name,
        }
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            SelectableItem::Capsule(capsule) => capsule.coordinate,
            SelectableItem::Listener(listener) => listener.coordinate,
        }
    }

    /// Position to place a marker at, or why the record cannot be placed
    ///
    /// A record needs a non-blank id and a present, in-range coordinate.
    pub fn marker_position(&self) -> Result<Coordinate> {
        if self.id().trim().is_empty() {
            return Err(Error::InvalidInput(format!("{} has a blank id", self.kind())));
        }
        let coordinate = self.coordinate().ok_or_else(|| {
            Error::InvalidInput(format!("{} '{}' has no coordinate", self.kind(), self.id()))
        })?;
        coordinate.validate()?;
        Ok(coordinate)
    }

    pub fn as_capsule(&self) -> Option<&MusicCapsule> {
        match self {
            SelectableItem::Capsule(capsule) => Some(capsule),
            SelectableItem::Listener(_) => None,
        }
    }
}

impl From<MusicCapsule> for SelectableItem {
    fn from(capsule: MusicCapsule) -> Self {
        SelectableItem::Capsule(capsule)
    }
}

impl From<NearbyListener> for SelectableItem {
    fn from(listener: NearbyListener) -> Self {
        SelectableItem::Listener(listener)
    }
}
