//! Tile path planning and per-frame movement along planned paths.
//!
//! Path planning itself belongs to the host; `Pathfinder` is the seam and
//! `GridPathfinder` the breadth-first stand-in used when the host does not
//! install its own.

use bevy::prelude::*;
use std::collections::{HashMap, VecDeque};

use crate::shared::*;

use super::actor::{ActorCategory, LittleNpc, Pathing, ScheduleState};
use super::behavior::{behavior_for, ActorView};
use super::schedule::SchedulePathDescription;

/// Arrival tolerances, as chessboard distance from the goal tile.
pub const TIGHT_TOLERANCE: u32 = 0;
pub const NORMAL_TOLERANCE: u32 = 1;
pub const RELAXED_TOLERANCE: u32 = 3;

pub trait Pathfinder: Send + Sync + 'static {
    /// Tiles to walk from `start` (exclusive) until within `tolerance` of
    /// `goal`. An empty path means the start already counts as arrived.
    fn find_path(
        &self,
        location: &Location,
        start: TilePoint,
        goal: TilePoint,
        tolerance: u32,
        destroy_objects: bool,
    ) -> Option<VecDeque<TilePoint>>;
}

#[derive(Resource)]
pub struct ActivePathfinder(pub Box<dyn Pathfinder>);

impl Default for ActivePathfinder {
    fn default() -> Self {
        Self(Box::new(GridPathfinder::default()))
    }
}

/// Breadth-first search over a location's open tiles. Warp tiles are only
/// entered as the final step, so a path never crosses a warp by accident.
#[derive(Debug, Clone, Copy)]
pub struct GridPathfinder {
    pub max_explored: usize,
}

impl Default for GridPathfinder {
    fn default() -> Self {
        Self { max_explored: 8192 }
    }
}

impl Pathfinder for GridPathfinder {
    fn find_path(
        &self,
        location: &Location,
        start: TilePoint,
        goal: TilePoint,
        tolerance: u32,
        destroy_objects: bool,
    ) -> Option<VecDeque<TilePoint>> {
        if start.chebyshev(goal) <= tolerance {
            return Some(VecDeque::new());
        }

        let mut came_from: HashMap<TilePoint, TilePoint> = HashMap::new();
        let mut frontier = VecDeque::from([start]);
        came_from.insert(start, start);

        while let Some(current) = frontier.pop_front() {
            if came_from.len() > self.max_explored {
                return None;
            }
            for next in current.neighbors() {
                if came_from.contains_key(&next) || !location.is_walkable(next, destroy_objects) {
                    continue;
                }
                let arrived = next.chebyshev(goal) <= tolerance;
                if location.warp_at(next).is_some() && !arrived {
                    continue;
                }
                came_from.insert(next, current);
                if arrived {
                    let mut path = VecDeque::new();
                    let mut cursor = next;
                    while cursor != start {
                        path.push_front(cursor);
                        cursor = came_from[&cursor];
                    }
                    return Some(path);
                }
                frontier.push_back(next);
            }
        }
        None
    }
}

/// An in-progress walk inside one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathController {
    pub location: String,
    pub path: VecDeque<TilePoint>,
    /// Goal of this leg: a warp tile, or the route's final target.
    pub goal: TilePoint,
    /// Tile the whole route ends on.
    pub route_target: TilePoint,
    pub final_facing: Facing,
    /// Set when the walk belongs to the actor's schedule.
    pub schedule: bool,
    /// Locations still to enter after this one, in order.
    pub remaining_route: VecDeque<String>,
    pub end_behavior: Option<String>,
}

impl PathController {
    /// Plan a walk to `goal` inside `location`. Fails when the planner finds
    /// nothing or the path ends off the map.
    pub fn plan(
        pathfinder: &dyn Pathfinder,
        location: &Location,
        start: TilePoint,
        goal: TilePoint,
        tolerance: u32,
        destroy_objects: bool,
    ) -> Option<Self> {
        let path = pathfinder.find_path(location, start, goal, tolerance, destroy_objects)?;
        if path.back().is_some_and(|last| !location.is_tile_on_map(*last)) {
            return None;
        }
        Some(Self {
            location: location.name.clone(),
            path,
            goal,
            route_target: goal,
            final_facing: Facing::Down,
            schedule: false,
            remaining_route: VecDeque::new(),
            end_behavior: None,
        })
    }

    /// Plan the leg of a scheduled route that starts where `at` stands: to
    /// the warp leading to the next route location, or to `target` once no
    /// locations remain.
    #[allow(clippy::too_many_arguments)]
    pub fn plan_route_leg(
        pathfinder: &dyn Pathfinder,
        locations: &Locations,
        at: &Placement,
        remaining_route: VecDeque<String>,
        target: TilePoint,
        final_facing: Facing,
        end_behavior: Option<String>,
        destroy_objects: bool,
    ) -> Option<Self> {
        let location = locations.get(&at.location)?;
        let goal = match remaining_route.front() {
            None => target,
            Some(next) => location.warps.iter().find(|w| &w.target == next)?.tile(),
        };
        let mut controller = Self::plan(
            pathfinder,
            location,
            at.tile,
            goal,
            TIGHT_TOLERANCE,
            destroy_objects,
        )?;
        controller.route_target = target;
        controller.schedule = true;
        controller.remaining_route = remaining_route;
        controller.final_facing = final_facing;
        controller.end_behavior = end_behavior;
        Some(controller)
    }

    pub fn has_remaining_steps(&self) -> bool {
        !self.path.is_empty()
    }

    pub fn next_step(&mut self) -> Option<TilePoint> {
        self.path.pop_front()
    }
}

/// Start walking `directions` from wherever `at` stands. The parsed route is
/// used from the current location onwards; if the actor is off the route, a
/// fresh route to the destination is looked up.
pub fn start_route(
    pathfinder: &dyn Pathfinder,
    locations: &Locations,
    at: &Placement,
    directions: &SchedulePathDescription,
    destroy_objects: bool,
) -> Option<PathController> {
    let destination = directions.destination()?;
    let remaining: VecDeque<String> = match directions.route.iter().position(|l| *l == at.location) {
        Some(index) => directions.route[index + 1..].iter().cloned().collect(),
        None => locations
            .route_between(&at.location, destination)?
            .into_iter()
            .skip(1)
            .collect(),
    };
    PathController::plan_route_leg(
        pathfinder,
        locations,
        at,
        remaining,
        directions.target,
        directions.facing,
        directions.end_behavior.clone(),
        destroy_objects,
    )
}

/// Host system: advance every actor one tile along its active path, crossing
/// warps through the actor's behavior strategy.
pub fn advance_actors(
    session: Res<Session>,
    pathfinder: Res<ActivePathfinder>,
    mut locations: ResMut<Locations>,
    mut arrivals: EventWriter<ArrivedAtHomeEvent>,
    mut actors: Query<(
        Entity,
        &LittleNpc,
        &ActorCategory,
        &mut Placement,
        &mut Pathing,
        &mut ScheduleState,
    )>,
) {
    if !session.role.is_host() {
        return;
    }
    let tag = session.role.tag();

    for (entity, npc, category, mut placement, mut pathing, mut schedule) in actors.iter_mut() {
        let on_temporary = pathing.temporary.is_some();
        let step = {
            let active = if on_temporary {
                pathing.temporary.as_mut()
            } else {
                pathing.controller.as_mut()
            };
            match active {
                Some(controller) => controller.next_step(),
                None => continue,
            }
        };

        let Some(tile) = step else {
            finish_path(&mut pathing, &mut placement, &mut schedule, on_temporary);
            continue;
        };
        placement.tile = tile;

        let Some(warp) = locations
            .get(&placement.location)
            .and_then(|l| l.warp_at(tile))
            .cloned()
        else {
            continue;
        };

        let resolved = {
            let view = ActorView {
                npc,
                placement: &mut placement,
                schedule: &mut schedule,
                pathing: &mut pathing,
            };
            behavior_for(*category).resolve_warp(&view, &locations, &warp)
        };
        if !locations.move_character(entity, &resolved.target) {
            warn!(
                "[LittleNPCs/{}] {} crossed a warp to unknown location {}",
                tag, npc.identity, resolved.target
            );
            pathing.halt();
            continue;
        }
        debug!(
            "[LittleNPCs/{}] {} warped {} -> {} {}",
            tag,
            npc.identity,
            placement.location,
            resolved.target,
            resolved.target_tile()
        );
        placement.location = resolved.target.clone();
        placement.tile = resolved.target_tile();

        let entered_home = locations
            .get(&placement.location)
            .is_some_and(|l| l.is_home());
        let destroy = pathing.destroy_objects_underfoot;

        if on_temporary {
            // Left the house for a scheduled path: pick up the directions.
            pathing.temporary = None;
            if !entered_home {
                if let Some(directions) = schedule.directions.clone() {
                    pathing.controller =
                        start_route(pathfinder.0.as_ref(), &locations, &placement, &directions, destroy);
                    if pathing.controller.is_none() {
                        warn!(
                            "[LittleNPCs/{}] {} could not plan a route to {:?} from {}",
                            tag,
                            npc.identity,
                            directions.destination(),
                            placement.location
                        );
                        schedule.directions = None;
                    }
                }
            }
        } else if let Some(mut controller) = pathing.controller.take() {
            if controller.remaining_route.front() == Some(&placement.location) {
                controller.remaining_route.pop_front();
            }
            if controller.schedule && !entered_home {
                pathing.controller = PathController::plan_route_leg(
                    pathfinder.0.as_ref(),
                    &locations,
                    &placement,
                    controller.remaining_route,
                    controller.route_target,
                    controller.final_facing,
                    controller.end_behavior,
                    destroy,
                );
                if pathing.controller.is_none() {
                    warn!(
                        "[LittleNPCs/{}] {} lost its route in {}",
                        tag, npc.identity, placement.location
                    );
                    schedule.directions = None;
                }
            }
        }

        if placement.location == npc.home {
            schedule.directions = None;
            arrivals.send(ArrivedAtHomeEvent { actor: entity });
        }
    }
}

fn finish_path(
    pathing: &mut Pathing,
    placement: &mut Placement,
    schedule: &mut ScheduleState,
    on_temporary: bool,
) {
    if on_temporary {
        pathing.temporary = None;
        return;
    }
    if let Some(controller) = pathing.controller.take() {
        placement.facing = controller.final_facing;
        if controller.schedule {
            schedule.directions = None;
            schedule.end_of_route_behavior = controller.end_behavior;
        }
    }
}
