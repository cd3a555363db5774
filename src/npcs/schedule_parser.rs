//! The generic schedule parser seam.
//!
//! Raw schedules are `/`-separated entries of the form
//! `TIME LOCATION X Y [FACING] [BEHAVIOR]`. Each entry's route is measured
//! from the previous entry's destination, and the first one from the
//! actor's default location.

use bevy::prelude::*;

use crate::error::ScheduleError;
use crate::shared::*;

use super::actor::DefaultLocation;
use super::schedule::{SchedulePathDescription, ScheduleTable};

pub trait ScheduleParser: Send + Sync + 'static {
    fn parse(
        &self,
        raw: &str,
        start: &DefaultLocation,
        locations: &Locations,
    ) -> Result<ScheduleTable, ScheduleError>;
}

/// The parser the host uses for every character.
#[derive(Resource)]
pub struct ActiveScheduleParser(pub Box<dyn ScheduleParser>);

impl Default for ActiveScheduleParser {
    fn default() -> Self {
        Self(Box::new(RouteScheduleParser))
    }
}

/// Parser that resolves routes over the public location graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteScheduleParser;

struct Segment<'a> {
    time: u32,
    location: &'a str,
    target: TilePoint,
    facing: Facing,
    end_behavior: Option<String>,
}

fn parse_number(segment: &str, value: &str) -> Result<i32, ScheduleError> {
    value.parse::<i32>().map_err(|_| ScheduleError::InvalidNumber {
        segment: segment.to_string(),
        value: value.to_string(),
    })
}

fn parse_segment(segment: &str) -> Result<Segment<'_>, ScheduleError> {
    let fields: Vec<&str> = segment.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(ScheduleError::MissingField {
            segment: segment.to_string(),
        });
    }

    let time = fields[0]
        .parse::<u32>()
        .ok()
        .filter(|t| is_valid_time(*t))
        .ok_or_else(|| ScheduleError::InvalidTime {
            segment: segment.to_string(),
            time: fields[0].to_string(),
        })?;
    let target = TilePoint::new(
        parse_number(segment, fields[2])?,
        parse_number(segment, fields[3])?,
    );

    let mut rest = fields[4..].iter();
    let mut facing = Facing::Down;
    let mut end_behavior = None;
    if let Some(first) = rest.next() {
        match first.parse::<u32>() {
            Ok(index) => {
                facing = Facing::from_index(index).ok_or_else(|| ScheduleError::InvalidNumber {
                    segment: segment.to_string(),
                    value: first.to_string(),
                })?;
                end_behavior = rest.next().map(|s| s.to_string());
            }
            Err(_) => end_behavior = Some(first.to_string()),
        }
    }
    // A quoted end-of-route message may follow; the host shows it, not us.
    if end_behavior.as_deref().is_some_and(|b| b.starts_with('"')) {
        end_behavior = None;
    }

    Ok(Segment {
        time,
        location: fields[1],
        target,
        facing,
        end_behavior,
    })
}

impl ScheduleParser for RouteScheduleParser {
    fn parse(
        &self,
        raw: &str,
        start: &DefaultLocation,
        locations: &Locations,
    ) -> Result<ScheduleTable, ScheduleError> {
        let mut table = ScheduleTable::default();
        let mut from = start.map.clone();
        let mut previous_time: Option<u32> = None;

        for segment in raw.split('/').map(str::trim).filter(|s| !s.is_empty()) {
            let entry = parse_segment(segment)?;
            if previous_time.is_some_and(|prev| entry.time <= prev) {
                return Err(ScheduleError::OutOfOrder {
                    segment: segment.to_string(),
                    time: entry.time,
                });
            }
            if locations.get(entry.location).is_none() {
                return Err(ScheduleError::UnknownLocation {
                    segment: segment.to_string(),
                    location: entry.location.to_string(),
                });
            }
            let route = locations
                .route_between(&from, entry.location)
                .ok_or_else(|| ScheduleError::NoRoute {
                    segment: segment.to_string(),
                    from: from.clone(),
                    to: entry.location.to_string(),
                })?;

            table.entries.insert(
                entry.time,
                SchedulePathDescription {
                    route,
                    target: entry.target,
                    facing: entry.facing,
                    end_behavior: entry.end_behavior,
                },
            );
            from = entry.location.to_string();
            previous_time = Some(entry.time);
        }

        if table.entries.is_empty() {
            return Err(ScheduleError::Empty);
        }
        Ok(table)
    }
}
