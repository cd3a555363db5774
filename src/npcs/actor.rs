//! The LittleNPC actor: identity, disposition-derived defaults, and the
//! per-actor state components driven by the other npc systems.

use bevy::prelude::*;
use std::collections::VecDeque;

use crate::shared::*;

use super::pathing::PathController;
use super::schedule::{SchedulePathDescription, ScheduleTable};

/// Bus stop used as the synthetic start of every LittleNPC route.
pub const BUS_STOP: &str = "BusStop";
/// Tile an actor stands on when its schedule arithmetic begins.
pub const BUS_STOP_START: TilePoint = TilePoint::new(0, 23);
/// Boundary warp tile leading from the bus stop back towards home.
pub const BUS_STOP_HOME_WARP: TilePoint = TilePoint::new(-1, 23);
/// Region recorded in every LittleNPC disposition.
pub const HOME_REGION: &str = "Town";

/// Identity name of an actor: unique per slot, child and farmer, so two
/// farmers' children never collide in one multiplayer session.
pub fn identity_name(slot: ChildSlot, child_name: &str, player_id: u64) -> String {
    let sanitized = child_name.replace(' ', "_");
    format!("{}{}{}", slot.prefix(), sanitized, player_id)
}

/// Birthday of a child `days_old` days old on `today`. Falls back to
/// spring 1 when the arithmetic leaves the calendar.
pub fn birthday_for(today: GameDate, days_old: u32) -> GameDate {
    match today.add_days(-i64::from(days_old)) {
        Ok(date) => date,
        Err(e) => {
            debug!("[LittleNPCs] {}; using default birthday.", e);
            GameDate::default_birthday()
        }
    }
}

/// Default map and tile of an actor; the schedule parser measures routes
/// from here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultLocation {
    pub map: String,
    pub tile: TilePoint,
}

impl DefaultLocation {
    pub fn new(map: impl Into<String>, tile: TilePoint) -> Self {
        Self {
            map: map.into(),
            tile,
        }
    }

    pub fn bus_stop() -> Self {
        Self::new(BUS_STOP, BUS_STOP_START)
    }
}

/// Host-visible category of a character. Chosen once at spawn time and
/// used to pick the behavior strategy the host dispatches through.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorCategory {
    Villager,
    LittleNpc,
}

/// A converted child. Lives for one simulated day and is never persisted.
#[derive(Component, Debug, Clone)]
pub struct LittleNpc {
    pub slot: ChildSlot,
    pub identity: String,
    pub display_name: String,
    pub gender: Gender,
    pub birthday: GameDate,
    pub age_in_days: u32,
    /// Farmer whose child this is.
    pub parent_id: u64,
    /// Name of the parent's home location.
    pub home: String,
    /// Assigned bed tile inside `home`.
    pub bed: TilePoint,
    /// Hat taken from the child for the day.
    pub hat: Option<Hat>,
    pub defaults: DefaultLocation,
}

impl LittleNpc {
    pub fn from_child(
        slot: ChildSlot,
        child: &ChildRecord,
        bed: TilePoint,
        player_id: u64,
        today: GameDate,
    ) -> Self {
        Self {
            slot,
            identity: identity_name(slot, &child.name, player_id),
            display_name: child.name.clone(),
            gender: child.gender,
            birthday: birthday_for(today, child.days_old),
            age_in_days: child.days_old,
            parent_id: player_id,
            home: child.home.clone(),
            bed,
            hat: child.hat.clone(),
            defaults: DefaultLocation::new(child.home.clone(), bed),
        }
    }
}

/// Schedule bookkeeping for one actor.
#[derive(Component, Debug, Clone, Default)]
pub struct ScheduleState {
    pub table: Option<ScheduleTable>,
    /// Whether the last parse of this actor's schedule succeeded.
    pub parsed_ok: bool,
    pub queued: VecDeque<(u32, SchedulePathDescription)>,
    pub last_attempted: u32,
    pub ignore_today: bool,
    pub follow_schedule: bool,
    pub directions: Option<SchedulePathDescription>,
    /// End-of-route animation currently playing, if any.
    pub end_of_route_behavior: Option<String>,
}

impl ScheduleState {
    pub fn has_entry_at(&self, time: u32) -> bool {
        self.table
            .as_ref()
            .is_some_and(|table| table.entries.contains_key(&time))
    }

    /// Drop the rest of today's schedule.
    pub fn clear(&mut self) {
        self.table = None;
        self.queued.clear();
        self.directions = None;
    }
}

/// Path controllers of one actor.
#[derive(Component, Debug, Clone, Default)]
pub struct Pathing {
    pub controller: Option<PathController>,
    /// Short transitional path, e.g. from the bedroom to the front door.
    pub temporary: Option<PathController>,
    pub destroy_objects_underfoot: bool,
}

impl Pathing {
    pub fn is_idle(&self) -> bool {
        self.controller.is_none() && self.temporary.is_none()
    }

    /// True while a schedule-driven path still has steps to walk.
    pub fn schedule_path_active(&self) -> bool {
        self.temporary
            .as_ref()
            .is_some_and(|c| c.schedule && c.has_remaining_steps())
            || self
                .controller
                .as_ref()
                .is_some_and(|c| c.schedule && c.has_remaining_steps())
    }

    /// True while any controller belongs to the schedule, finished or not.
    pub fn on_schedule_path(&self) -> bool {
        self.temporary.as_ref().is_some_and(|c| c.schedule)
            || self.controller.as_ref().is_some_and(|c| c.schedule)
    }

    pub fn halt(&mut self) {
        self.controller = None;
        self.temporary = None;
    }
}
