//! Schedule adaptation for actors that have no bed of their own.
//!
//! The host's generic parser understands `bed` only for villagers with a
//! native home, and it measures every route from the actor's default
//! location. A LittleNPC lives inside a farmer's home, which is not on the
//! public route graph, so before parsing:
//!
//! * every `bed` destination becomes the bus-stop boundary warp, which
//!   resolves back into the actor's home when crossed;
//! * the default location is swapped for the bus-stop start tile for the
//!   duration of the parse, and restored afterwards whatever the outcome.

use bevy::prelude::*;
use std::collections::BTreeMap;
use std::ops::Deref;

use crate::error::ScheduleError;
use crate::shared::*;

use super::actor::{DefaultLocation, LittleNpc, ScheduleState, BUS_STOP, BUS_STOP_HOME_WARP};
use super::schedule_parser::ScheduleParser;

pub const BED_TOKEN: &str = "bed";

/// One route the actor walks when its scheduled time arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulePathDescription {
    /// Locations walked through, starting location included.
    pub route: Vec<String>,
    pub target: TilePoint,
    pub facing: Facing,
    pub end_behavior: Option<String>,
}

impl SchedulePathDescription {
    pub fn destination(&self) -> Option<&str> {
        self.route.last().map(String::as_str)
    }
}

/// Time of day → route. Immutable once parsed for the day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleTable {
    pub entries: BTreeMap<u32, SchedulePathDescription>,
}

/// Destination that replaces a trailing `bed` token.
pub fn bed_destination() -> String {
    format!(
        "{} {} {} {}",
        BUS_STOP,
        BUS_STOP_HOME_WARP.x,
        BUS_STOP_HOME_WARP.y,
        Facing::Left.index()
    )
}

/// Replace `bed` at the end of every `/`-separated entry with the bus-stop
/// boundary destination. Other entries are returned untouched.
pub fn rewrite_bed_tokens(raw: &str) -> String {
    raw.split('/')
        .map(|segment| {
            let trimmed = segment.trim_end();
            match trimmed.strip_suffix(BED_TOKEN) {
                Some(head) if head.is_empty() || head.ends_with(char::is_whitespace) => {
                    format!("{}{}", head, bed_destination())
                }
                _ => segment.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Holds a temporary default location and puts the original back on drop,
/// so the swap is undone on every exit path, unwinding included.
struct DefaultLocationGuard<'a> {
    slot: &'a mut DefaultLocation,
    saved: Option<DefaultLocation>,
}

impl<'a> DefaultLocationGuard<'a> {
    fn substitute(slot: &'a mut DefaultLocation, temporary: DefaultLocation) -> Self {
        let saved = std::mem::replace(slot, temporary);
        Self {
            slot,
            saved: Some(saved),
        }
    }
}

impl Deref for DefaultLocationGuard<'_> {
    type Target = DefaultLocation;

    fn deref(&self) -> &DefaultLocation {
        self.slot
    }
}

impl Drop for DefaultLocationGuard<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            *self.slot = saved;
        }
    }
}

/// Brackets a generic [`ScheduleParser`] so it accepts a LittleNPC.
pub struct ScheduleAdapter<'a> {
    parser: &'a dyn ScheduleParser,
    locations: &'a Locations,
}

impl<'a> ScheduleAdapter<'a> {
    pub fn new(parser: &'a dyn ScheduleParser, locations: &'a Locations) -> Self {
        Self { parser, locations }
    }

    /// Parse `raw` into `state.table`.
    ///
    /// On failure the actor's default location is reset to `recovery` (its
    /// disposition home), `state.parsed_ok` is cleared, the schedule stays
    /// empty for the day, and the parser's error is returned unchanged.
    pub fn apply(
        &self,
        npc: &mut LittleNpc,
        state: &mut ScheduleState,
        raw: &str,
        recovery: &DefaultLocation,
    ) -> Result<(), ScheduleError> {
        let rewritten = rewrite_bed_tokens(raw);

        let result = {
            let start = DefaultLocationGuard::substitute(&mut npc.defaults, DefaultLocation::bus_stop());
            self.parser.parse(&rewritten, &start, self.locations)
        };

        state.parsed_ok = result.is_ok();
        match result {
            Ok(table) => {
                debug!(
                    "[LittleNPCs] Parsed {} schedule entries for {}",
                    table.entries.len(),
                    npc.identity
                );
                state.table = Some(table);
                state.queued.clear();
                state.last_attempted = 0;
                Ok(())
            }
            Err(e) => {
                npc.defaults = recovery.clone();
                state.table = None;
                warn!(
                    "[LittleNPCs] Schedule for {} could not be parsed ({}); default location reset to {} {}",
                    npc.identity, e, recovery.map, recovery.tile
                );
                Err(e)
            }
        }
    }
}
