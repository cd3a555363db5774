//! Host-side schedule driving: activation when a definition is applied, and
//! the per-tick check that queues and starts scheduled paths.

use bevy::prelude::*;

use crate::config::LittleNpcConfig;
use crate::replication::payload::NpcDefinitions;
use crate::shared::*;

use super::actor::{
    ActorCategory, DefaultLocation, LittleNpc, Pathing, ScheduleState, BUS_STOP,
    BUS_STOP_HOME_WARP,
};
use super::behavior::{behavior_for, ActorView, WorldView};
use super::pathing::{start_route, ActivePathfinder};
use super::schedule::{SchedulePathDescription, ScheduleAdapter};
use super::schedule_parser::ActiveScheduleParser;

/// Host system: parse the schedule of every actor whose definition was just
/// applied. This is the only place scheduling is switched on.
pub fn activate_schedules(
    session: Res<Session>,
    parser: Res<ActiveScheduleParser>,
    locations: Res<Locations>,
    definitions: Res<NpcDefinitions>,
    mut applied: EventReader<ActorDefinitionAppliedEvent>,
    mut actors: Query<(&mut LittleNpc, &mut ScheduleState)>,
) {
    if !session.role.is_host() {
        applied.clear();
        return;
    }
    let adapter = ScheduleAdapter::new(parser.0.as_ref(), &locations);

    for event in applied.read() {
        let Some((mut npc, mut state)) = actors
            .iter_mut()
            .find(|(npc, _)| npc.identity == event.identity)
        else {
            debug!(
                "[LittleNPCs/{}] Definition for {} applied with no live actor",
                session.role.tag(),
                event.identity
            );
            continue;
        };
        let Some(raw) = event.schedule_source.as_deref() else {
            info!(
                "[LittleNPCs/{}] {} has no schedule today",
                session.role.tag(),
                npc.identity
            );
            state.clear();
            continue;
        };

        let recovery = definitions
            .get(&npc.identity)
            .and_then(|d| d.default_location())
            .unwrap_or_else(|| DefaultLocation::new(npc.home.clone(), npc.bed));
        if adapter.apply(&mut npc, &mut state, raw, &recovery).is_ok() {
            info!(
                "[LittleNPCs/{}] Schedule active for {}",
                session.role.tag(),
                npc.identity
            );
        }
    }
}

/// Route that sends an actor out of the world through the bus-stop boundary
/// warp, which resolves back into its home.
fn curfew_recall(locations: &Locations, from: &str) -> Option<SchedulePathDescription> {
    let route = locations.route_between(from, BUS_STOP)?;
    Some(SchedulePathDescription {
        route,
        target: BUS_STOP_HOME_WARP,
        facing: Facing::Left,
        end_behavior: None,
    })
}

/// Host system: on every clock change, queue the entry due now (or the
/// curfew recall) and start the next queued path if none is running.
#[allow(clippy::too_many_arguments)]
pub fn check_schedule(
    session: Res<Session>,
    clock: Res<GameClock>,
    config: Res<LittleNpcConfig>,
    pathfinder: Res<ActivePathfinder>,
    locations: Res<Locations>,
    mut rng: ResMut<HomeRng>,
    mut ticks: EventReader<TimeOfDayChangedEvent>,
    mut actors: Query<(
        &LittleNpc,
        &ActorCategory,
        &mut Placement,
        &mut Pathing,
        &mut ScheduleState,
    )>,
) {
    if !session.role.is_host() {
        ticks.clear();
        return;
    }
    let tag = session.role.tag();

    for tick in ticks.read() {
        let time = tick.time;
        for (npc, category, mut placement, mut pathing, mut schedule) in actors.iter_mut() {
            if schedule.ignore_today {
                continue;
            }

            let away = placement.location != npc.home;
            if config.do_children_have_curfew && time == config.curfew_time && away {
                schedule.queued.clear();
                match curfew_recall(&locations, &placement.location) {
                    Some(recall) => {
                        info!("[LittleNPCs/{}] Curfew: sending {} home", tag, npc.identity);
                        schedule.queued.push_back((time, recall));
                    }
                    None => warn!(
                        "[LittleNPCs/{}] Curfew: no route home for {} from {}",
                        tag, npc.identity, placement.location
                    ),
                }
            } else if time > schedule.last_attempted {
                let due = schedule
                    .table
                    .as_ref()
                    .and_then(|table| table.entries.get(&time))
                    .cloned();
                if let Some(entry) = due {
                    schedule.queued.push_back((time, entry));
                }
            }
            schedule.last_attempted = time;

            if pathing.schedule_path_active() {
                continue;
            }
            let Some((due_at, directions)) = schedule.queued.pop_front() else {
                continue;
            };
            debug!(
                "[LittleNPCs/{}] {} leaves for {:?} (due {})",
                tag,
                npc.identity,
                directions.destination(),
                due_at
            );
            schedule.directions = Some(directions.clone());

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
            behavior_for(*category).prepare_to_disembark(&mut view, &mut world);

            if schedule.directions.is_none() || pathing.temporary.is_some() {
                // Cleared, or walking to the door first.
                continue;
            }
            let destroy = pathing.destroy_objects_underfoot;
            pathing.controller = start_route(
                pathfinder.0.as_ref(),
                &locations,
                &placement,
                &directions,
                destroy,
            );
            if pathing.controller.is_none() {
                warn!(
                    "[LittleNPCs/{}] {} has no path to {:?} from {}",
                    tag,
                    npc.identity,
                    directions.destination(),
                    placement.location
                );
                schedule.directions = None;
            }
        }
    }
}
