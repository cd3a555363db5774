//! The session-scoped context owning every piece of per-day conversion
//! state. Other domains receive it as a read-only resource; only the
//! conversion systems mutate it.

use bevy::prelude::*;
use std::collections::BTreeMap;

use crate::shared::{ChildSlot, TilePoint};

use super::registry::{ActorRegistry, RegisteredActor, SlotAssignments};

/// Where the day is in the conversion cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionPhase {
    #[default]
    PreConversion,
    /// Children are hidden; waiting out the tick delay.
    Converting,
    Converted,
    Reverting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingEntry {
    pub actor: Entity,
    pub child: Entity,
}

/// One-to-one actor ↔ child relation for the current day.
#[derive(Debug, Clone, Default)]
pub struct ConversionMapping {
    entries: BTreeMap<ChildSlot, MappingEntry>,
}

impl ConversionMapping {
    pub fn get(&self, slot: ChildSlot) -> Option<&MappingEntry> {
        self.entries.get(&slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChildSlot, &MappingEntry)> {
        self.entries.iter().map(|(slot, entry)| (*slot, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_child(&self, child: Entity) -> bool {
        self.entries.values().any(|e| e.child == child)
    }

    pub fn contains_actor(&self, actor: Entity) -> bool {
        self.entries.values().any(|e| e.actor == actor)
    }

    /// Refuses an entry whose slot, child or actor is already mapped.
    fn insert(&mut self, slot: ChildSlot, entry: MappingEntry) -> bool {
        if self.entries.contains_key(&slot)
            || self.contains_child(entry.child)
            || self.contains_actor(entry.actor)
        {
            return false;
        }
        self.entries.insert(slot, entry);
        true
    }

    fn drain(&mut self) -> Vec<(ChildSlot, MappingEntry)> {
        std::mem::take(&mut self.entries).into_iter().collect()
    }
}

/// A child hidden at day start, waiting to be converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingConversion {
    pub slot: ChildSlot,
    pub child: Entity,
    pub bed: TilePoint,
}

#[derive(Resource, Debug, Default)]
pub struct LittleNpcSession {
    phase: ConversionPhase,
    countdown: Option<u32>,
    pending: Vec<PendingConversion>,
    mapping: ConversionMapping,
    registry: ActorRegistry,
    slots: SlotAssignments,
}

impl LittleNpcSession {
    pub fn phase(&self) -> ConversionPhase {
        self.phase
    }

    pub fn mapping(&self) -> &ConversionMapping {
        &self.mapping
    }

    pub fn registry(&self) -> &ActorRegistry {
        &self.registry
    }

    pub fn slots(&self) -> &SlotAssignments {
        &self.slots
    }

    pub fn pending(&self) -> &[PendingConversion] {
        &self.pending
    }

    /// Whether `child` is hidden for today, converted or about to be.
    pub fn is_tracking_child(&self, child: Entity) -> bool {
        self.mapping.contains_child(child) || self.pending.iter().any(|p| p.child == child)
    }

    pub(super) fn slots_mut(&mut self) -> &mut SlotAssignments {
        &mut self.slots
    }

    pub(super) fn begin_day(&mut self, pending: Vec<PendingConversion>, delay_ticks: u32) {
        self.phase = ConversionPhase::Converting;
        self.countdown = (!pending.is_empty()).then_some(delay_ticks.max(1));
        self.pending = pending;
    }

    /// Count one tick down. True on the tick conversion should run.
    pub(super) fn tick(&mut self) -> bool {
        match self.countdown.as_mut() {
            Some(left) if *left > 1 => {
                *left -= 1;
                false
            }
            Some(_) => {
                self.countdown = None;
                true
            }
            None => false,
        }
    }

    pub(super) fn take_pending(&mut self) -> Vec<PendingConversion> {
        std::mem::take(&mut self.pending)
    }

    pub(super) fn record(
        &mut self,
        slot: ChildSlot,
        entry: MappingEntry,
        actor: RegisteredActor,
    ) -> bool {
        if !self.mapping.insert(slot, entry) {
            return false;
        }
        self.registry.register(slot, actor);
        true
    }

    pub(super) fn mark_converted(&mut self) {
        self.phase = ConversionPhase::Converted;
    }

    /// Hand over every tracked entry for reversal and forget them.
    pub(super) fn begin_revert(&mut self) -> Vec<(ChildSlot, MappingEntry)> {
        self.phase = ConversionPhase::Reverting;
        self.registry.clear();
        self.mapping.drain()
    }

    /// Reset all per-day state, whatever phase the day was in.
    pub(super) fn finish_revert(&mut self) {
        self.phase = ConversionPhase::PreConversion;
        self.countdown = None;
        self.pending.clear();
        self.registry.clear();
        self.mapping = ConversionMapping::default();
    }

    pub(super) fn end_session(&mut self) {
        self.finish_revert();
        self.slots.clear();
    }
}
