//! NPC domain plugin for LittleNPCs.
//!
//! Owns the converted-child actor: its schedule, its movement through the
//! world, and the behavior overrides that let it leave and re-enter its
//! home. Communicates with the other domains through shared resources and
//! events only.

use bevy::prelude::*;
use crate::shared::*;

pub mod actor;
pub mod behavior;
pub mod curfew;
pub mod dialogue;
pub mod overrides;
pub mod pathing;
pub mod schedule;
pub mod schedule_driver;
pub mod schedule_parser;

use curfew::curfew_and_wander;
use overrides::handle_arrivals;
use pathing::{advance_actors, ActivePathfinder};
use schedule_driver::{activate_schedules, check_schedule};
use schedule_parser::ActiveScheduleParser;

pub struct NpcPlugin;

impl Plugin for NpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ActivePathfinder>()
            .init_resource::<ActiveScheduleParser>();

        app.add_systems(
            Update,
            (
                // Parse schedules as definitions land, then queue/start paths
                (activate_schedules, check_schedule)
                    .chain()
                    .in_set(LittleNpcSet::Schedule),
                // Arrival overrides and in-home curfew/wander
                (handle_arrivals, curfew_and_wander)
                    .chain()
                    .in_set(LittleNpcSet::Behavior),
                // One tile per frame along active paths
                advance_actors.in_set(LittleNpcSet::Movement),
            ),
        );
    }
}
