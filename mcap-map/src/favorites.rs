//! The viewer's favorite capsules

use mcap_common::MusicCapsule;
use tracing::debug;

/// Ordered list of favorited capsules, most recently added last
#[derive(Debug, Clone, Default)]
pub struct Favorites {
    capsules: Vec<MusicCapsule>,
}

impl Favorites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from existing capsules, dropping repeated ids
    pub fn from_capsules(capsules: impl IntoIterator<Item = MusicCapsule>) -> Self {
        let mut favorites = Self::new();
        for capsule in capsules {
            favorites.add(capsule);
        }
        favorites
    }

    pub fn contains(&self, id: &str) -> bool {
        self.capsules.iter().any(|c| c.id == id)
    }

    /// Add a capsule; false if it was already a favorite
    pub fn add(&mut self, capsule: MusicCapsule) -> bool {
        if self.contains(&capsule.id) {
            return false;
        }
        debug!("Favorited capsule '{}'", capsule.id);
        self.capsules.push(capsule);
        true
    }

    /// Remove by id, returning the removed capsule
    pub fn remove(&mut self, id: &str) -> Option<MusicCapsule> {
        let index = self.capsules.iter().position(|c| c.id == id)?;
        debug!("Unfavorited capsule '{}'", id);
        Some(self.capsules.remove(index))
    }

    /// Flip favorite status; returns true if the capsule is now a favorite
    pub fn toggle(&mut self, capsule: &MusicCapsule) -> bool {
        if self.remove(&capsule.id).is_some() {
            false
        } else {
            self.add(capsule.clone())
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MusicCapsule> {
        self.capsules.iter()
    }

    pub fn len(&self) -> usize {
        self.capsules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capsules.is_empty()
    }
}
