//! In-memory catalog of music capsules and nearby listeners
//!
//! The catalog is the data source for the map. It ships with a built-in demo
//! dataset around Taipei and can load the same shape from a JSON file.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::geo::Coordinate;
use crate::models::{MusicCapsule, NearbyListener};
use crate::{Error, Result};

/// Capsules, nearby listeners and the viewer's favorites
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub capsules: Vec<MusicCapsule>,
    #[serde(default)]
    pub nearby_listeners: Vec<NearbyListener>,
    /// Ids of favorited capsules, in display order
    #[serde(default)]
    pub favorites: Vec<String>,
}

impl Catalog {
    /// Load a catalog from a JSON file
    ///
    /// Records without a coordinate are kept; the map skips them when drawing.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let catalog: Catalog = serde_json::from_str(&content)?;

        let unplaced = catalog
            .capsules
            .iter()
            .filter(|c| c.coordinate.is_none())
            .count()
            + catalog
                .nearby_listeners
                .iter()
                .filter(|l| l.coordinate.is_none())
                .count();
        if unplaced > 0 {
            warn!("Catalog {} has {} record(s) without a coordinate", path.display(), unplaced);
        }

        info!(
            "Loaded catalog from {}: {} capsules, {} nearby listeners",
            path.display(),
            catalog.capsules.len(),
            catalog.nearby_listeners.len()
        );
        Ok(catalog)
    }

    /// Look up a capsule by id
    pub fn capsule(&self, id: &str) -> Option<&MusicCapsule> {
        self.capsules.iter().find(|c| c.id == id)
    }

    /// Look up a nearby listener by id
    pub fn listener(&self, id: &str) -> Option<&NearbyListener> {
        self.nearby_listeners.iter().find(|l| l.id == id)
    }

    /// Favorited capsules in favorites order; unknown ids are ignored
    pub fn favorite_capsules(&self) -> Vec<MusicCapsule> {
        self.favorites
            .iter()
            .filter_map(|id| self.capsule(id).cloned())
            .collect()
    }

    /// Append a new capsule, rejecting duplicate ids
    pub fn add_capsule(&mut self, capsule: MusicCapsule) -> Result<()> {
        if self.capsule(&capsule.id).is_some() {
            return Err(Error::InvalidInput(format!(
                "capsule '{}' already exists",
                capsule.id
            )));
        }
        info!("Added capsule '{}' ({})", capsule.id, capsule.title);
        self.capsules.push(capsule);
        Ok(())
    }

    /// Built-in demo dataset: five capsules and three listeners in Taipei
    pub fn demo() -> Self {
        let capsules = vec![
            demo_capsule(
                "1",
                "告白氣球",
                "周杰倫",
                "bu7uwy6hUzI",
                "https://images.pexels.com/photos/1105666/pexels-photo-1105666.jpeg?auto=compress&cs=tinysrgb&w=150",
                (25.0330, 121.5654),
                &["流行", "抒情", "愛情"],
                "台北市信義區",
                "在這個美好的午後，想起了初戀的甜蜜",
                "音樂愛好者",
                15,
            ),
            demo_capsule(
                "2",
                "漂向北方",
                "黃明志 ft. 王力宏",
                "VkDy8H2h8F8",
                "https://images.pexels.com/photos/1916821/pexels-photo-1916821.jpeg?auto=compress&cs=tinysrgb&w=150",
                (25.0478, 121.5318),
                &["嘻哈", "勵志", "夢想"],
                "台北市中山區",
                "追夢路上的心聲",
                "說唱愛好者",
                14,
            ),
            demo_capsule(
                "3",
                "小幸運",
                "田馥甄",
                "YjUGgaO3A_8",
                "https://images.pexels.com/photos/1540406/pexels-photo-1540406.jpeg?auto=compress&cs=tinysrgb&w=150",
                (25.0418, 121.5753),
                &["抒情", "電影", "溫暖"],
                "台北市松山區",
                "我們的小幸運",
                "電影音樂迷",
                13,
            ),
            demo_capsule(
                "4",
                "演員",
                "薛之謙",
                "Nt6kKhlX8vU",
                "https://images.pexels.com/photos/1763075/pexels-photo-1763075.jpeg?auto=compress&cs=tinysrgb&w=150",
                (25.0138, 121.5452),
                &["抒情", "傷感", "愛情"],
                "台北市大安區",
                "簡單的劇情，內心戲太足",
                "抒情王子",
                12,
            ),
            demo_capsule(
                "5",
                "海闊天空",
                "Beyond",
                "qu_FSptjRic",
                "https://images.pexels.com/photos/1034662/pexels-photo-1034662.jpeg?auto=compress&cs=tinysrgb&w=150",
                (25.0268, 121.5171),
                &["搖滾", "經典", "勵志"],
                "台北市萬華區",
                "永遠的經典，永不放棄的精神",
                "搖滾青年",
                11,
            ),
        ];

        let nearby_listeners = vec![
            demo_listener(
                "u1",
                "小明",
                "https://images.pexels.com/photos/1239291/pexels-photo-1239291.jpeg?auto=compress&cs=tinysrgb&w=100",
                (25.0320, 121.5630),
                "晴天 - 周杰倫",
                "台北市信義區",
            ),
            demo_listener(
                "u2",
                "小美",
                "https://images.pexels.com/photos/774909/pexels-photo-774909.jpeg?auto=compress&cs=tinysrgb&w=100",
                (25.0450, 121.5300),
                "後來 - 劉若英",
                "台北市中山區",
            ),
            demo_listener(
                "u3",
                "小華",
                "https://images.pexels.com/photos/1043471/pexels-photo-1043471.jpeg?auto=compress&cs=tinysrgb&w=100",
                (25.0400, 121.5700),
                "稻香 - 周杰倫",
                "台北市松山區",
            ),
        ];

        Self {
            capsules,
            nearby_listeners,
            favorites: vec!["1".to_string(), "3".to_string(), "5".to_string()],
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn demo_capsule(
    id: &str,
    title: &str,
    artist: &str,
    youtube_id: &str,
    thumbnail: &str,
    (latitude, longitude): (f64, f64),
    hashtags: &[&str],
    location: &str,
    description: &str,
    uploaded_by: &str,
    january_day: u32,
) -> MusicCapsule {
    MusicCapsule {
        id: id.to_string(),
        title: title.to_string(),
        artist: artist.to_string(),
        youtube_id: youtube_id.to_string(),
        thumbnail: thumbnail.to_string(),
        coordinate: Some(Coordinate::new(latitude, longitude)),
        hashtags: hashtags.iter().map(|t| t.to_string()).collect(),
        location: location.to_string(),
        description: Some(description.to_string()),
        uploaded_by: uploaded_by.to_string(),
        uploaded_at: NaiveDate::from_ymd_opt(2024, 1, january_day).unwrap_or_default(),
    }
}

fn demo_listener(
    id: &str,
    name: &str,
    avatar: &str,
    (latitude, longitude): (f64, f64),
    current_song: &str,
    location: &str,
) -> NearbyListener {
    NearbyListener {
        id: id.to_string(),
        name: name.to_string(),
        avatar: avatar.to_string(),
        coordinate: Some(Coordinate::new(latitude, longitude)),
        current_song: current_song.to_string(),
        location: location.to_string(),
        is_listening: true,
    }
}
