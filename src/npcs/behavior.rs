//! Per-category behavior strategy.
//!
//! The host dispatches arrival, warp and disembark decisions through
//! [`ActorBehavior`]. Which implementation an actor gets is fixed by its
//! [`ActorCategory`] when it is spawned; nothing is patched globally.

use rand::rngs::StdRng;

use crate::config::LittleNpcConfig;
use crate::shared::*;

use super::actor::{ActorCategory, LittleNpc, Pathing, ScheduleState};
use super::pathing::Pathfinder;

/// Mutable view of one actor handed to a behavior.
pub struct ActorView<'a> {
    pub npc: &'a LittleNpc,
    pub placement: &'a mut Placement,
    pub schedule: &'a mut ScheduleState,
    pub pathing: &'a mut Pathing,
}

/// World state a behavior may read, plus the planner and home randomness.
pub struct WorldView<'a> {
    pub locations: &'a Locations,
    pub clock: &'a GameClock,
    pub config: &'a LittleNpcConfig,
    pub pathfinder: &'a dyn Pathfinder,
    pub rng: &'a mut StdRng,
}

pub trait ActorBehavior: Send + Sync {
    /// Pick the target of a warp the actor is crossing.
    fn resolve_warp(&self, _actor: &ActorView, _locations: &Locations, warp: &Warp) -> Warp {
        warp.clone()
    }

    /// The actor walked into its own home.
    fn arrive_at_home(&self, actor: &mut ActorView, _world: &mut WorldView) {
        actor.pathing.temporary = None;
    }

    /// The actor is about to leave for a new scheduled path.
    fn prepare_to_disembark(&self, actor: &mut ActorView, _world: &mut WorldView) {
        actor.schedule.end_of_route_behavior = None;
    }
}

/// What the host does for any villager.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBehavior;

impl ActorBehavior for NativeBehavior {}

/// Overrides for converted children; implemented in `overrides.rs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LittleNpcBehavior;

static NATIVE: NativeBehavior = NativeBehavior;
static LITTLE_NPC: LittleNpcBehavior = LittleNpcBehavior;

pub fn behavior_for(category: ActorCategory) -> &'static dyn ActorBehavior {
    match category {
        ActorCategory::Villager => &NATIVE,
        ActorCategory::LittleNpc => &LITTLE_NPC,
    }
}
