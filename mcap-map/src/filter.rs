//! Capsule search and map mode

use mcap_common::{ItemKind, MusicCapsule, NearbyListener};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which layer the map shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapMode {
    /// Music capsules matching the search query
    #[default]
    Capsules,
    /// Nearby listeners
    Nearby,
}

impl MapMode {
    /// Split the catalog into the reconciler's input pair for this mode
    pub fn inputs<'a>(
        self,
        filtered_capsules: &'a [MusicCapsule],
        listeners: &'a [NearbyListener],
    ) -> (&'a [MusicCapsule], &'a [NearbyListener]) {
        match self {
            MapMode::Capsules => (filtered_capsules, &[]),
            MapMode::Nearby => (&[], listeners),
        }
    }

    /// Kind of record this mode puts on the map
    pub fn item_kind(self) -> ItemKind {
        match self {
            MapMode::Capsules => ItemKind::Capsule,
            MapMode::Nearby => ItemKind::Listener,
        }
    }
}

impl fmt::Display for MapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapMode::Capsules => write!(f, "capsules"),
            MapMode::Nearby => write!(f, "nearby"),
        }
    }
}

impl FromStr for MapMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "capsules" => Ok(MapMode::Capsules),
            "nearby" => Ok(MapMode::Nearby),
            other => Err(format!("unknown map mode '{}'", other)),
        }
    }
}

/// Capsules whose title, artist or any hashtag contains `query`
///
/// Matching is case-insensitive. A blank query matches everything.
pub fn filter_capsules(capsules: &[MusicCapsule], query: &str) -> Vec<MusicCapsule> {
    let query = query.trim();
    if query.is_empty() {
        return capsules.to_vec();
    }
    let needle = query.to_lowercase();
    capsules
        .iter()
        .filter(|c| matches_query(c, &needle))
        .cloned()
        .collect()
}

fn matches_query(capsule: &MusicCapsule, needle: &str) -> bool {
    capsule.title.to_lowercase().contains(needle)
        || capsule.artist.to_lowercase().contains(needle)
        || capsule
            .hashtags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcap_common::Catalog;

    fn ids(capsules: &[MusicCapsule]) -> Vec<&str> {
        capsules.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_blank_query_returns_all() {
        let catalog = Catalog::demo();
        assert_eq!(filter_capsules(&catalog.capsules, "").len(), 5);
        assert_eq!(filter_capsules(&catalog.capsules, "   ").len(), 5);
    }

    #[test]
    fn test_matches_hashtag() {
        let catalog = Catalog::demo();
        let result = filter_capsules(&catalog.capsules, "抒情");
        assert_eq!(ids(&result), vec!["1", "3", "4"]);
    }

    #[test]
    fn test_matches_artist_case_insensitive() {
        let catalog = Catalog::demo();
        assert_eq!(ids(&filter_capsules(&catalog.capsules, "beyond")), vec!["5"]);
        assert_eq!(ids(&filter_capsules(&catalog.capsules, "BEYOND")), vec!["5"]);
    }

    #[test]
    fn test_matches_title_and_trims_query() {
        let catalog = Catalog::demo();
        assert_eq!(ids(&filter_capsules(&catalog.capsules, " 小幸運 ")), vec!["3"]);
    }

    #[test]
    fn test_no_match() {
        let catalog = Catalog::demo();
        assert!(filter_capsules(&catalog.capsules, "jazz").is_empty());
    }

    #[test]
    fn test_mode_inputs() {
        let catalog = Catalog::demo();
        let (capsules, listeners) =
            MapMode::Capsules.inputs(&catalog.capsules, &catalog.nearby_listeners);
        assert_eq!((capsules.len(), listeners.len()), (5, 0));

        let (capsules, listeners) =
            MapMode::Nearby.inputs(&catalog.capsules, &catalog.nearby_listeners);
        assert_eq!((capsules.len(), listeners.len()), (0, 3));
    }

    #[test]
    fn test_mode_item_kind() {
        assert_eq!(MapMode::Capsules.item_kind(), ItemKind::Capsule);
        assert_eq!(MapMode::Nearby.item_kind(), ItemKind::Listener);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("Nearby".parse::<MapMode>(), Ok(MapMode::Nearby));
        assert_eq!("capsules".parse::<MapMode>(), Ok(MapMode::Capsules));
        assert!("heatmap".parse::<MapMode>().is_err());
        assert_eq!(MapMode::default(), MapMode::Capsules);
    }
}
