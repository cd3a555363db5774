//! Error types for the LittleNPCs domains.
//!
//! None of these ever escape to the host as a failure: every caller logs and
//! recovers, because nothing here may abort the session or block a save.

use thiserror::Error;

use crate::shared::GameDate;

#[derive(Debug, Error)]
pub enum DateError {
    #[error("{0} is not a valid calendar date")]
    InvalidDate(GameDate),
    #[error("shifting {date} by {offset} days lands before spring 1, year 1")]
    BeforeFirstDay { date: GameDate, offset: i64 },
    #[error("shifting by {offset} days overflows the calendar")]
    Overflow { offset: i64 },
    #[error("day count {total} exceeds the representable year range")]
    YearOverflow { total: u64 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("schedule text is empty")]
    Empty,
    #[error("segment {segment:?}: invalid time {time:?}")]
    InvalidTime { segment: String, time: String },
    #[error("segment {segment:?}: expected `TIME LOCATION X Y [FACING] [BEHAVIOR]`")]
    MissingField { segment: String },
    #[error("segment {segment:?}: invalid number {value:?}")]
    InvalidNumber { segment: String, value: String },
    #[error("segment {segment:?}: unknown location {location:?}")]
    UnknownLocation { segment: String, location: String },
    #[error("segment {segment:?}: no route from {from:?} to {to:?}")]
    NoRoute {
        segment: String,
        from: String,
        to: String,
    },
    #[error("segment {segment:?}: time {time} is not after the previous entry")]
    OutOfOrder { segment: String, time: u32 },
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("could not encode payload for {identity}: {source}")]
    Encode {
        identity: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not decode payload for {identity}: {source}")]
    Decode {
        identity: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("payload names {found} but was delivered for {expected}")]
    IdentityMismatch { expected: String, found: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("could not read save {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse save {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
