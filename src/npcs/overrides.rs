//! Arrival, warp and disembark handling for converted children.
//!
//! The host only special-cases married spouses in these three places. A
//! LittleNPC gets the same treatment through [`LittleNpcBehavior`] without
//! pretending to be a spouse.

use bevy::prelude::*;

use crate::config::LittleNpcConfig;
use crate::shared::*;

use super::actor::{ActorCategory, LittleNpc, Pathing, ScheduleState, BUS_STOP, BUS_STOP_START};
use super::behavior::{behavior_for, ActorBehavior, ActorView, LittleNpcBehavior, WorldView};
use super::pathing::{
    ActivePathfinder, PathController, NORMAL_TOLERANCE, RELAXED_TOLERANCE, TIGHT_TOLERANCE,
};

impl ActorBehavior for LittleNpcBehavior {
    fn resolve_warp(&self, actor: &ActorView, locations: &Locations, warp: &Warp) -> Warp {
        let mut resolved = warp.clone();
        let following = actor.pathing.on_schedule_path();

        if following {
            match locations.get(&actor.placement.location).map(|l| l.kind) {
                Some(kind) if kind.is_home() => {
                    resolved = warp.retarget(BUS_STOP, BUS_STOP_START);
                }
                Some(LocationKind::BusStop) if warp.x <= 0 => {
                    if let Some(home) = locations.get(&actor.npc.home) {
                        resolved = warp.retarget(home.name.clone(), home.entry);
                    }
                }
                _ => {}
            }
        }

        let into_home = locations
            .get(&resolved.target)
            .is_some_and(|target| target.is_home());
        if into_home {
            match locations.home_of(actor.npc.parent_id) {
                Some(home) => resolved = resolved.retarget(home.name.clone(), home.entry),
                None => warn!(
                    "[LittleNPCs] No home owned by {} for {}; using warp target {}",
                    actor.npc.parent_id, actor.npc.identity, resolved.target
                ),
            }
        }
        resolved
    }

    fn arrive_at_home(&self, actor: &mut ActorView, world: &mut WorldView) {
        actor.pathing.halt();
        let Some(home) = world.locations.get(&actor.npc.home) else {
            warn!(
                "[LittleNPCs] {} arrived at missing home {}",
                actor.npc.identity, actor.npc.home
            );
            return;
        };
        actor.placement.location = home.name.clone();
        actor.placement.tile = home.entry;

        let curfew_reached = world.config.do_children_have_curfew
            && world.clock.time_of_day >= world.config.curfew_time;
        if curfew_reached {
            actor.schedule.ignore_today = true;
        }
        let destination = if curfew_reached {
            Some(actor.npc.bed)
        } else {
            home.random_open_point(world.rng)
        };

        let start = home.entry;
        let mut planned = destination.and_then(|goal| {
            PathController::plan(world.pathfinder, home, start, goal, NORMAL_TOLERANCE, false)
        });
        if planned.is_none() {
            planned = home.random_open_point(world.rng).and_then(|goal| {
                PathController::plan(world.pathfinder, home, start, goal, RELAXED_TOLERANCE, false)
            });
        }
        if planned.is_none() {
            actor.pathing.destroy_objects_underfoot = true;
            planned = home.random_open_point(world.rng).and_then(|goal| {
                PathController::plan(world.pathfinder, home, start, goal, RELAXED_TOLERANCE, true)
            });
        }
        if planned.is_none() {
            warn!(
                "[LittleNPCs] {} found no path inside {} and stays at the door",
                actor.npc.identity, home.name
            );
        }
        actor.pathing.controller = planned;
    }

    fn prepare_to_disembark(&self, actor: &mut ActorView, world: &mut WorldView) {
        actor.schedule.end_of_route_behavior = None;
        actor.pathing.halt();

        let Some(here) = world.locations.get(&actor.placement.location) else {
            return;
        };
        match here.kind {
            kind if kind.is_home() => {
                let to_door = here.exit_warp().and_then(|door| {
                    PathController::plan(
                        world.pathfinder,
                        here,
                        actor.placement.tile,
                        door.tile(),
                        TIGHT_TOLERANCE,
                        actor.pathing.destroy_objects_underfoot,
                    )
                });
                match to_door {
                    Some(mut controller) if controller.has_remaining_steps() => {
                        controller.schedule = true;
                        actor.pathing.temporary = Some(controller);
                        actor.schedule.follow_schedule = true;
                    }
                    _ => {
                        warn!(
                            "[LittleNPCs] {} cannot reach the door of {}; schedule cleared for today",
                            actor.npc.identity, here.name
                        );
                        actor.schedule.clear();
                        actor.schedule.follow_schedule = false;
                    }
                }
            }
            LocationKind::Farm => {
                actor.schedule.clear();
                actor.schedule.follow_schedule = false;
            }
            _ => actor.schedule.follow_schedule = true,
        }
    }
}

/// Host system: run the arrival override for every actor that walked into
/// its home this frame or the last.
#[allow(clippy::too_many_arguments)]
pub fn handle_arrivals(
    session: Res<Session>,
    clock: Res<GameClock>,
    config: Res<LittleNpcConfig>,
    pathfinder: Res<ActivePathfinder>,
    locations: Res<Locations>,
    mut rng: ResMut<HomeRng>,
    mut arrivals: EventReader<ArrivedAtHomeEvent>,
    mut actors: Query<(
        &LittleNpc,
        &ActorCategory,
        &mut Placement,
        &mut Pathing,
        &mut ScheduleState,
    )>,
) {
    if !session.role.is_host() {
        arrivals.clear();
        return;
    }
    for event in arrivals.read() {
        let Ok((npc, category, mut placement, mut pathing, mut schedule)) = actors.get_mut(event.actor)
        else {
            continue;
        };
        let mut view = ActorView {
            npc,
            placement: &mut placement,
            schedule: &mut schedule,
            pathing: &mut pathing,
        };
        let mut world = WorldView {
            locations: &locations,
            clock: &clock,
            config: &config,
            pathfinder: pathfinder.0.as_ref(),
            rng: &mut rng.0,
        };
        behavior_for(*category).arrive_at_home(&mut view, &mut world);
        info!(
            "[LittleNPCs/{}] {} is home at {}",
            session.role.tag(),
            npc.identity,
            clock.time_of_day
        );
    }
}
