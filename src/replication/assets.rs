//! Appearance and dialogue data, by actor identity.

use bevy::prelude::*;
use std::collections::{BTreeMap, HashMap};

use super::payload::Appearance;

/// Content authored for an actor by an installed content pack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorContent {
    pub appearance: Appearance,
    pub dialogue: BTreeMap<String, String>,
    pub schedule: Option<String>,
}

/// Installed content, read by the host when it builds a payload.
#[derive(Resource, Debug, Clone, Default)]
pub struct ContentLibrary {
    by_identity: HashMap<String, ActorContent>,
}

impl ContentLibrary {
    pub fn insert(&mut self, identity: impl Into<String>, content: ActorContent) {
        self.by_identity.insert(identity.into(), content);
    }

    pub fn content_for(&self, identity: &str) -> Option<&ActorContent> {
        self.by_identity.get(identity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedAssets {
    pub appearance: Appearance,
    pub dialogue: BTreeMap<String, String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum AssetLookup<'a> {
    Found(&'a CachedAssets),
    /// Nothing usable is cached; the caller substitutes a placeholder.
    Missing,
}

/// Assets received with a payload, served when the host asks for them by
/// identity name.
#[derive(Resource, Debug, Clone, Default)]
pub struct AssetCache {
    by_identity: HashMap<String, CachedAssets>,
}

impl AssetCache {
    /// Returns whether the cached value changed.
    pub fn store(&mut self, identity: &str, assets: CachedAssets) -> bool {
        if self.by_identity.get(identity) == Some(&assets) {
            return false;
        }
        self.by_identity.insert(identity.to_string(), assets);
        true
    }

    pub fn lookup(&self, identity: &str) -> AssetLookup<'_> {
        match self.by_identity.get(identity) {
            Some(assets) if !assets.appearance.is_empty() => AssetLookup::Found(assets),
            _ => AssetLookup::Missing,
        }
    }

    pub fn dialogue_line(&self, identity: &str, key: &str) -> Option<&str> {
        self.by_identity
            .get(identity)
            .and_then(|assets| assets.dialogue.get(key))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_identity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_identity.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_identity.clear();
    }
}
