//! Live actor lookup by slot, and the session's stable slot assignment.

use bevy::prelude::*;
use std::collections::BTreeMap;

use crate::shared::ChildSlot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredActor {
    pub entity: Entity,
    pub identity: String,
    pub display_name: String,
}

/// The live LittleNPC, if any, for each of the two slots.
#[derive(Debug, Clone, Default)]
pub struct ActorRegistry {
    slots: [Option<RegisteredActor>; 2],
}

impl ActorRegistry {
    pub fn get(&self, slot: ChildSlot) -> Option<&RegisteredActor> {
        self.slots[slot.index()].as_ref()
    }

    pub fn by_identity(&self, identity: &str) -> Option<(ChildSlot, &RegisteredActor)> {
        self.iter().find(|(_, actor)| actor.identity == identity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChildSlot, &RegisteredActor)> {
        ChildSlot::ALL
            .into_iter()
            .filter_map(|slot| self.get(slot).map(|actor| (slot, actor)))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn register(&mut self, slot: ChildSlot, actor: RegisteredActor) {
        self.slots[slot.index()] = Some(actor);
    }

    pub(crate) fn clear(&mut self) {
        self.slots = Default::default();
    }
}

/// Which slot each child holds. A child keeps its slot for the whole
/// session, so the first and second actor never swap identities when a
/// child is added or ages into conversion.
#[derive(Debug, Clone, Default)]
pub struct SlotAssignments {
    by_name: BTreeMap<String, ChildSlot>,
}

impl SlotAssignments {
    pub fn slot_of(&self, child_name: &str) -> Option<ChildSlot> {
        self.by_name.get(child_name).copied()
    }

    fn free_slot(&self) -> Option<ChildSlot> {
        ChildSlot::ALL
            .into_iter()
            .find(|slot| !self.by_name.values().any(|taken| taken == slot))
    }

    /// Give every candidate without a slot the first free one, oldest child
    /// first. Candidates are `(name, days_old)`. Returns the names left
    /// without a slot.
    pub fn assign<'a>(&mut self, candidates: &[(&'a str, u32)]) -> Vec<&'a str> {
        let mut ordered = candidates.to_vec();
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let mut skipped = Vec::new();
        for (name, _) in ordered {
            if self.by_name.contains_key(name) {
                continue;
            }
            match self.free_slot() {
                Some(slot) => {
                    self.by_name.insert(name.to_string(), slot);
                }
                None => skipped.push(name),
            }
        }
        skipped
    }

    pub fn clear(&mut self) {
        self.by_name.clear();
    }
}
