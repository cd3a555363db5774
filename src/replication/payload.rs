//! The actor definition shipped from host to followers, and the local
//! definition table it is applied to.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::PayloadError;
use crate::npcs::actor::{DefaultLocation, LittleNpc, HOME_REGION};
use crate::shared::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeClass {
    Adult,
    Teen,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeTile {
    pub location: String,
    pub tile: TilePoint,
}

/// Host-recognized descriptive attributes of an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disposition {
    pub age: AgeClass,
    pub gender: Gender,
    pub can_romance: bool,
    pub home_region: String,
    pub birthday: GameDate,
    pub home: HomeTile,
    pub display_name: String,
}

impl Disposition {
    pub fn for_actor(npc: &LittleNpc) -> Self {
        Self {
            age: AgeClass::Child,
            gender: npc.gender,
            can_romance: false,
            home_region: HOME_REGION.to_string(),
            birthday: npc.birthday,
            home: HomeTile {
                location: npc.home.clone(),
                tile: npc.bed,
            },
            display_name: npc.display_name.clone(),
        }
    }

    pub fn default_location(&self) -> DefaultLocation {
        DefaultLocation::new(self.home.location.clone(), self.home.tile)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    pub sprite_sheet: Vec<u8>,
    pub portrait: Vec<u8>,
}

impl Appearance {
    pub fn is_empty(&self) -> bool {
        self.sprite_sheet.is_empty() && self.portrait.is_empty()
    }
}

/// Everything a follower needs to recreate the host's actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPayload {
    pub identity: String,
    pub disposition: Disposition,
    pub schedule_source: Option<String>,
    pub appearance: Appearance,
    pub dialogue: BTreeMap<String, String>,
}

impl TransferPayload {
    pub fn encode(&self) -> Result<Vec<u8>, PayloadError> {
        serde_json::to_vec(self).map_err(|source| PayloadError::Encode {
            identity: self.identity.clone(),
            source,
        })
    }

    /// Decode a payload delivered for `identity`.
    pub fn decode(identity: &str, bytes: &[u8]) -> Result<Self, PayloadError> {
        let payload: Self = serde_json::from_slice(bytes).map_err(|source| PayloadError::Decode {
            identity: identity.to_string(),
            source,
        })?;
        if payload.identity != identity {
            return Err(PayloadError::IdentityMismatch {
                expected: identity.to_string(),
                found: payload.identity,
            });
        }
        Ok(payload)
    }
}

/// A locally known character definition. Content packs may supply one with
/// extra fields of their own; only the disposition fields are ours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcDefinition {
    pub age: AgeClass,
    pub gender: Gender,
    pub can_romance: bool,
    pub home_region: String,
    pub birthday: GameDate,
    pub home: Option<HomeTile>,
    pub display_name: String,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl NpcDefinition {
    pub fn from_disposition(disposition: &Disposition) -> Self {
        Self {
            age: disposition.age,
            gender: disposition.gender,
            can_romance: disposition.can_romance,
            home_region: disposition.home_region.clone(),
            birthday: disposition.birthday,
            home: Some(disposition.home.clone()),
            display_name: disposition.display_name.clone(),
            extra: BTreeMap::new(),
        }
    }

    /// Overwrite the controlled fields, leaving `extra` as provided.
    /// Returns whether anything changed.
    pub fn apply_disposition(&mut self, disposition: &Disposition) -> bool {
        let before = self.clone();
        self.age = disposition.age;
        self.gender = disposition.gender;
        self.can_romance = disposition.can_romance;
        self.home_region = disposition.home_region.clone();
        self.birthday = disposition.birthday;
        self.home = Some(disposition.home.clone());
        self.display_name = disposition.display_name.clone();
        *self != before
    }

    pub fn default_location(&self) -> Option<DefaultLocation> {
        self.home
            .as_ref()
            .map(|home| DefaultLocation::new(home.location.clone(), home.tile))
    }
}

/// Character definitions by identity name.
#[derive(Resource, Debug, Clone, Default)]
pub struct NpcDefinitions {
    map: HashMap<String, NpcDefinition>,
}

impl NpcDefinitions {
    pub fn get(&self, identity: &str) -> Option<&NpcDefinition> {
        self.map.get(identity)
    }

    pub fn get_mut(&mut self, identity: &str) -> Option<&mut NpcDefinition> {
        self.map.get_mut(identity)
    }

    /// Register a definition, e.g. from an installed content pack.
    pub fn insert(&mut self, identity: impl Into<String>, definition: NpcDefinition) {
        self.map.insert(identity.into(), definition);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
