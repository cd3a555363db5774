//! Curfew and wander behavior while an actor is inside its home.
//!
//! Replaces the host's idle child behavior. The decision itself is a pure
//! function of the actor's situation so it can be reasoned about tick by
//! tick; the system only gathers inputs and carries out the action.

use bevy::prelude::*;

use crate::config::LittleNpcConfig;
use crate::shared::*;

use super::actor::{LittleNpc, Pathing, ScheduleState};
use super::pathing::{ActivePathfinder, PathController, NORMAL_TOLERANCE, TIGHT_TOLERANCE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurfewState {
    #[default]
    Idle,
    Wandering,
    GoingToBed,
    FollowingSchedule,
}

#[derive(Component, Debug, Clone, Default)]
pub struct CurfewWander {
    pub state: CurfewState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurfewAction {
    None,
    PathToBed,
    Wander,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurfewDecision {
    pub state: CurfewState,
    pub action: CurfewAction,
}

impl CurfewDecision {
    fn stay(state: CurfewState) -> Self {
        Self {
            state,
            action: CurfewAction::None,
        }
    }
}

/// Everything the decision looks at for one actor on one tick.
#[derive(Debug, Clone, Copy)]
pub struct CurfewInputs {
    pub time: u32,
    pub previous: CurfewState,
    /// A schedule path is active and still has steps.
    pub schedule_path_active: bool,
    /// Any path at all is active.
    pub path_active: bool,
    pub has_entry_now: bool,
    pub at_home: bool,
    pub at_bed: bool,
}

pub fn decide(inputs: &CurfewInputs, config: &LittleNpcConfig) -> CurfewDecision {
    if inputs.schedule_path_active {
        return CurfewDecision::stay(CurfewState::FollowingSchedule);
    }
    if !inputs.at_home {
        return CurfewDecision::stay(CurfewState::Idle);
    }

    let bedtime = config.bedtime();
    if inputs.time >= bedtime {
        if inputs.at_bed {
            return CurfewDecision::stay(CurfewState::Idle);
        }
        if inputs.previous == CurfewState::GoingToBed && inputs.path_active {
            return CurfewDecision::stay(CurfewState::GoingToBed);
        }
        return CurfewDecision {
            state: CurfewState::GoingToBed,
            action: CurfewAction::PathToBed,
        };
    }

    let may_wander = !inputs.path_active
        && config.do_children_wander
        && !inputs.has_entry_now
        && is_hour_boundary(inputs.time)
        && inputs.time < bedtime;
    if may_wander {
        return CurfewDecision {
            state: CurfewState::Wandering,
            action: CurfewAction::Wander,
        };
    }

    if inputs.path_active && inputs.previous == CurfewState::Wandering {
        CurfewDecision::stay(CurfewState::Wandering)
    } else {
        CurfewDecision::stay(CurfewState::Idle)
    }
}

/// Host system: evaluate every actor that is inside its own home.
#[allow(clippy::too_many_arguments)]
pub fn curfew_and_wander(
    session: Res<Session>,
    config: Res<LittleNpcConfig>,
    pathfinder: Res<ActivePathfinder>,
    locations: Res<Locations>,
    mut rng: ResMut<HomeRng>,
    mut ticks: EventReader<TimeOfDayChangedEvent>,
    mut actors: Query<(
        &LittleNpc,
        &Placement,
        &mut Pathing,
        &ScheduleState,
        &mut CurfewWander,
    )>,
) {
    if !session.role.is_host() {
        ticks.clear();
        return;
    }

    for tick in ticks.read() {
        for (npc, placement, mut pathing, schedule, mut curfew) in actors.iter_mut() {
            if placement.location != npc.home {
                continue;
            }
            let Some(home) = locations.get(&npc.home) else {
                continue;
            };

            let inputs = CurfewInputs {
                time: tick.time,
                previous: curfew.state,
                schedule_path_active: pathing.schedule_path_active(),
                path_active: !pathing.is_idle(),
                has_entry_now: schedule.has_entry_at(tick.time),
                at_home: true,
                at_bed: placement.tile == npc.bed,
            };
            let decision = decide(&inputs, &config);
            let destroy = pathing.destroy_objects_underfoot;

            match decision.action {
                CurfewAction::None => {}
                CurfewAction::PathToBed => {
                    pathing.controller = PathController::plan(
                        pathfinder.0.as_ref(),
                        home,
                        placement.tile,
                        npc.bed,
                        TIGHT_TOLERANCE,
                        destroy,
                    );
                    if pathing.controller.is_none() {
                        warn!(
                            "[LittleNPCs/{}] {} cannot reach its bed at {}",
                            session.role.tag(),
                            npc.identity,
                            npc.bed
                        );
                    } else {
                        debug!("[LittleNPCs/{}] {} is going to bed", session.role.tag(), npc.identity);
                    }
                }
                CurfewAction::Wander => {
                    pathing.controller = home.random_open_point(&mut rng.0).and_then(|goal| {
                        PathController::plan(
                            pathfinder.0.as_ref(),
                            home,
                            placement.tile,
                            goal,
                            NORMAL_TOLERANCE,
                            destroy,
                        )
                    });
                    if pathing.controller.is_none() {
                        curfew.state = CurfewState::Idle;
                        continue;
                    }
                }
            }
            curfew.state = decision.state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(time: u32) -> CurfewInputs {
        CurfewInputs {
            time,
            previous: CurfewState::Idle,
            schedule_path_active: false,
            path_active: false,
            has_entry_now: false,
            at_home: true,
            at_bed: false,
        }
    }

    #[test]
    fn test_wanders_on_hour_boundary_at_home() {
        let decision = decide(&inputs(1400), &LittleNpcConfig::default());
        assert_eq!(decision.state, CurfewState::Wandering);
        assert_eq!(decision.action, CurfewAction::Wander);
    }

    #[test]
    fn test_no_wander_off_hour_boundary() {
        let decision = decide(&inputs(1410), &LittleNpcConfig::default());
        assert_eq!(decision, CurfewDecision::stay(CurfewState::Idle));
    }

    #[test]
    fn test_never_wanders_when_entry_due_now() {
        let mut at_entry = inputs(1400);
        at_entry.has_entry_now = true;
        assert_ne!(
            decide(&at_entry, &LittleNpcConfig::default()).state,
            CurfewState::Wandering
        );
    }

    #[test]
    fn test_never_wanders_outside_home() {
        let config = LittleNpcConfig::default();
        for time in [900, 1000, 1400, 1800] {
            let mut away = inputs(time);
            away.at_home = false;
            assert_ne!(decide(&away, &config).state, CurfewState::Wandering);
        }
    }

    #[test]
    fn test_no_wander_when_disabled() {
        let config = LittleNpcConfig {
            do_children_wander: false,
            ..Default::default()
        };
        assert_eq!(decide(&inputs(1400), &config).state, CurfewState::Idle);
    }

    #[test]
    fn test_bed_preempts_wander_at_curfew() {
        let config = LittleNpcConfig {
            curfew_time: 2200,
            ..Default::default()
        };
        let decision = decide(&inputs(2200), &config);
        assert_eq!(decision.state, CurfewState::GoingToBed);
        assert_eq!(decision.action, CurfewAction::PathToBed);
    }

    #[test]
    fn test_late_evening_bedtime_without_curfew() {
        let config = LittleNpcConfig {
            do_children_have_curfew: false,
            curfew_time: 1900,
            ..Default::default()
        };
        assert_eq!(decide(&inputs(2000), &config).state, CurfewState::Wandering);
        assert_eq!(decide(&inputs(2200), &config).state, CurfewState::GoingToBed);
    }

    #[test]
    fn test_at_bed_after_curfew_stays_idle() {
        let mut in_bed = inputs(2000);
        in_bed.at_bed = true;
        assert_eq!(
            decide(&in_bed, &LittleNpcConfig::default()),
            CurfewDecision::stay(CurfewState::Idle)
        );
    }

    #[test]
    fn test_bed_path_not_reissued_while_walking() {
        let mut walking = inputs(2000);
        walking.previous = CurfewState::GoingToBed;
        walking.path_active = true;
        assert_eq!(
            decide(&walking, &LittleNpcConfig::default()).action,
            CurfewAction::None
        );
    }

    #[test]
    fn test_schedule_path_preempts_everything() {
        let mut busy = inputs(2200);
        busy.schedule_path_active = true;
        busy.path_active = true;
        assert_eq!(
            decide(&busy, &LittleNpcConfig::default()),
            CurfewDecision::stay(CurfewState::FollowingSchedule)
        );
    }
}
