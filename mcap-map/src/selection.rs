//! Detail view for an activated marker
//!
//! Capsules open a player sheet with the YouTube embed; listeners open a
//! card showing what they are playing.

use chrono::NaiveDate;
use mcap_common::{MusicCapsule, NearbyListener, SelectableItem};
use serde::Serialize;

/// Rendered content of the bottom sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum SelectionDetail {
    Player {
        capsule_id: String,
        title: String,
        artist: String,
        embed_url: String,
        thumbnail: String,
        hashtags: Vec<String>,
        location: String,
        description: Option<String>,
        uploaded_by: String,
        uploaded_at: NaiveDate,
        favorited: bool,
    },
    ListenerCard {
        listener_id: String,
        name: String,
        avatar: String,
        /// "Listening to: <song>" or "Not listening"
        activity: String,
        location: String,
    },
}

impl SelectionDetail {
    pub fn for_item(item: &SelectableItem, auto_play: bool, favorited: bool) -> Self {
        match item {
            SelectableItem::Capsule(capsule) => Self::player(capsule, auto_play, favorited),
            SelectableItem::Listener(listener) => Self::listener_card(listener),
        }
    }

    fn player(capsule: &MusicCapsule, auto_play: bool, favorited: bool) -> Self {
        SelectionDetail::Player {
            capsule_id: capsule.id.clone(),
            title: capsule.title.clone(),
            artist: capsule.artist.clone(),
            embed_url: embed_url(&capsule.youtube_id, auto_play),
            thumbnail: capsule.thumbnail.clone(),
            hashtags: capsule.hashtags.clone(),
            location: capsule.location.clone(),
            description: capsule.description.clone(),
            uploaded_by: capsule.uploaded_by.clone(),
            uploaded_at: capsule.uploaded_at,
            favorited,
        }
    }

    fn listener_card(listener: &NearbyListener) -> Self {
        let activity = if listener.is_listening {
            format!("Listening to: {}", listener.current_song)
        } else {
            "Not listening".to_string()
        };
        SelectionDetail::ListenerCard {
            listener_id: listener.id.clone(),
            name: listener.name.clone(),
            avatar: listener.avatar.clone(),
            activity,
            location: listener.location.clone(),
        }
    }

    /// One-line heading for the sheet
    pub fn heading(&self) -> String {
        match self {
            SelectionDetail::Player { title, artist, .. } if artist.is_empty() => title.clone(),
            SelectionDetail::Player { title, artist, .. } => format!("{} - {}", title, artist),
            SelectionDetail::ListenerCard { name, activity, .. } => format!("{} · {}", name, activity),
        }
    }
}

/// YouTube embed URL with player chrome trimmed down
pub fn embed_url(youtube_id: &str, auto_play: bool) -> String {
    format!(
        "https://www.youtube.com/embed/{}?autoplay={}&controls=1&rel=0&modestbranding=1",
        youtube_id,
        u8::from(auto_play)
    )
}
