//! Shared components, resources, events, and system sets for LittleNPCs.
//!
//! This is the type contract between the host simulation and the domain
//! plugins. Every domain imports from here; no domain reaches into another
//! domain's internals directly.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use crate::error::DateError;

// ═══════════════════════════════════════════════════════════════════════
// SYSTEM SETS: fixed order inside Update
// ═══════════════════════════════════════════════════════════════════════

/// Ordering of the LittleNPCs systems within a frame. Chained, so events
/// written by an earlier set are read by a later set in the same frame.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LittleNpcSet {
    Lifecycle,
    Replication,
    Schedule,
    Behavior,
    Movement,
}

// ═══════════════════════════════════════════════════════════════════════
// TIME OF DAY: integer HHMM form (930 = 9:30 AM, 2600 = 2:00 AM)
// ═══════════════════════════════════════════════════════════════════════

pub const DAY_START_TIME: u32 = 600;
pub const DAY_END_TIME: u32 = 2600;

/// Bedtime used by the curfew/wander machine when curfew is disabled.
pub const LATE_EVENING_BEDTIME: u32 = 2200;

pub fn is_valid_time(time: u32) -> bool {
    (DAY_START_TIME..=DAY_END_TIME).contains(&time) && time % 100 < 60
}

pub fn is_hour_boundary(time: u32) -> bool {
    time % 100 == 0
}

// ═══════════════════════════════════════════════════════════════════════
// CALENDAR
// ═══════════════════════════════════════════════════════════════════════

pub const DAYS_PER_SEASON: u32 = 28;
pub const DAYS_PER_YEAR: u32 = DAYS_PER_SEASON * 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub fn index(self) -> u32 {
        match self {
            Season::Spring => 0,
            Season::Summer => 1,
            Season::Fall => 2,
            Season::Winter => 3,
        }
    }

    pub fn from_index(index: u32) -> Self {
        match index % 4 {
            0 => Season::Spring,
            1 => Season::Summer,
            2 => Season::Fall,
            _ => Season::Winter,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
            Season::Winter => "winter",
        }
    }
}

/// A calendar date. Day is 1-28, year starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameDate {
    pub year: u32,
    pub season: Season,
    pub day: u32,
}

impl Default for GameDate {
    fn default() -> Self {
        Self::default_birthday()
    }
}

impl GameDate {
    pub fn new(day: u32, season: Season, year: u32) -> Self {
        Self { year, season, day }
    }

    /// Spring 1 of year 1; used when birthday arithmetic leaves the calendar.
    pub fn default_birthday() -> Self {
        Self::new(1, Season::Spring, 1)
    }

    pub fn is_valid(&self) -> bool {
        self.year >= 1 && (1..=DAYS_PER_SEASON).contains(&self.day)
    }

    /// Zero-based count of days since spring 1, year 1.
    pub fn total_days(&self) -> u64 {
        (u64::from(self.year) - 1) * u64::from(DAYS_PER_YEAR)
            + u64::from(self.season.index()) * u64::from(DAYS_PER_SEASON)
            + u64::from(self.day)
            - 1
    }

    pub fn from_total_days(total: u64) -> Result<Self, DateError> {
        let year = total / u64::from(DAYS_PER_YEAR) + 1;
        let in_year = total % u64::from(DAYS_PER_YEAR);
        let year = u32::try_from(year).map_err(|_| DateError::YearOverflow { total })?;
        Ok(Self {
            year,
            season: Season::from_index((in_year / u64::from(DAYS_PER_SEASON)) as u32),
            day: (in_year % u64::from(DAYS_PER_SEASON)) as u32 + 1,
        })
    }

    /// Shift the date by `offset` days. Fails when the result would fall
    /// before spring 1, year 1 or past the representable range.
    pub fn add_days(&self, offset: i64) -> Result<Self, DateError> {
        if !self.is_valid() {
            return Err(DateError::InvalidDate(*self));
        }
        let total = i64::try_from(self.total_days()).map_err(|_| DateError::Overflow { offset })?;
        let shifted = total
            .checked_add(offset)
            .ok_or(DateError::Overflow { offset })?;
        if shifted < 0 {
            return Err(DateError::BeforeFirstDay { date: *self, offset });
        }
        Self::from_total_days(shifted as u64)
    }
}

impl fmt::Display for GameDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}, year {}", self.season.name(), self.day, self.year)
    }
}

/// The host's clock: current time of day and date.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct GameClock {
    pub time_of_day: u32,
    pub date: GameDate,
}

impl Default for GameClock {
    fn default() -> Self {
        Self {
            time_of_day: DAY_START_TIME,
            date: GameDate::new(1, Season::Spring, 1),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SESSION
// ═══════════════════════════════════════════════════════════════════════

/// Whether this process is authoritative for world state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HostRole {
    #[default]
    Host,
    Follower,
}

impl HostRole {
    pub fn is_host(self) -> bool {
        self == HostRole::Host
    }

    /// Log tag distinguishing host and client output in a shared log.
    pub fn tag(self) -> &'static str {
        match self {
            HostRole::Host => "Host",
            HostRole::Follower => "Client",
        }
    }
}

/// Process-level facts about the running session.
#[derive(Resource, Debug, Clone, Default)]
pub struct Session {
    pub role: HostRole,
    /// Unique multiplayer id of the local farmer.
    pub player_id: u64,
    /// False while sitting on the title screen or loading a save.
    pub world_ready: bool,
}

/// Randomness used for open-point selection inside homes.
#[derive(Resource, Debug)]
pub struct HomeRng(pub StdRng);

impl Default for HomeRng {
    fn default() -> Self {
        Self(StdRng::from_entropy())
    }
}

impl HomeRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// GEOMETRY
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct TilePoint {
    pub x: i32,
    pub y: i32,
}

impl TilePoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chessboard distance, the metric used for arrival tolerance.
    pub fn chebyshev(self, other: TilePoint) -> u32 {
        (self.x - other.x).unsigned_abs().max((self.y - other.y).unsigned_abs())
    }

    pub fn neighbors(self) -> [TilePoint; 4] {
        [
            TilePoint::new(self.x, self.y - 1),
            TilePoint::new(self.x + 1, self.y),
            TilePoint::new(self.x, self.y + 1),
            TilePoint::new(self.x - 1, self.y),
        ]
    }
}

impl fmt::Display for TilePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Facing {
    Up,
    Right,
    #[default]
    Down,
    Left,
}

impl Facing {
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Facing::Up),
            1 => Some(Facing::Right),
            2 => Some(Facing::Down),
            3 => Some(Facing::Left),
            _ => None,
        }
    }

    pub fn index(self) -> u32 {
        match self {
            Facing::Up => 0,
            Facing::Right => 1,
            Facing::Down => 2,
            Facing::Left => 3,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// PEOPLE
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

/// Logical index of a convertible child. Stable for the whole session,
/// independent of the order children sit in any host list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChildSlot {
    First,
    Second,
}

impl ChildSlot {
    pub const ALL: [ChildSlot; 2] = [ChildSlot::First, ChildSlot::Second];

    pub fn index(self) -> usize {
        match self {
            ChildSlot::First => 0,
            ChildSlot::Second => 1,
        }
    }

    /// Only indices 0 and 1 name a slot.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ChildSlot::First),
            1 => Some(ChildSlot::Second),
            _ => None,
        }
    }

    /// Prefix of the actor identity name for this slot.
    pub fn prefix(self) -> &'static str {
        match self {
            ChildSlot::First => "FirstLittleNPC",
            ChildSlot::Second => "SecondLittleNPC",
        }
    }
}

impl fmt::Display for ChildSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hat {
    pub id: String,
}

/// A host-owned child. The core only toggles `invisible`, moves `hat`
/// to and from the actor, and repositions the child to its bed.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildRecord {
    pub name: String,
    pub gender: Gender,
    pub days_old: u32,
    pub hat: Option<Hat>,
    /// Name of the home location the child belongs to.
    pub home: String,
    pub invisible: bool,
}

impl ChildRecord {
    pub fn age_in_years(&self) -> u32 {
        self.days_old / DAYS_PER_YEAR
    }
}

/// Where a character currently stands.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub location: String,
    pub tile: TilePoint,
    pub facing: Facing,
}

impl Placement {
    pub fn new(location: impl Into<String>, tile: TilePoint) -> Self {
        Self {
            location: location.into(),
            tile,
            facing: Facing::Down,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Friendship {
    pub points: i32,
    pub gifts_this_week: u8,
    pub talked_today: bool,
}

/// The local farmer's friendship table, keyed by character name.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Friendships {
    pub entries: HashMap<String, Friendship>,
}

impl Friendships {
    /// Move the entry stored under `from` to `to`, removing the old key so
    /// the character is never listed twice. Returns whether an entry moved.
    pub fn migrate(&mut self, from: &str, to: &str) -> bool {
        match self.entries.remove(from) {
            Some(friendship) => {
                self.entries.insert(to.to_string(), friendship);
                true
            }
            None => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// LOCATIONS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationKind {
    FarmHouse,
    Cabin,
    BusStop,
    Farm,
    Town,
}

impl LocationKind {
    pub fn is_home(self) -> bool {
        matches!(self, LocationKind::FarmHouse | LocationKind::Cabin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warp {
    pub x: i32,
    pub y: i32,
    pub target: String,
    pub target_x: i32,
    pub target_y: i32,
}

impl Warp {
    pub fn new(tile: TilePoint, target: impl Into<String>, target_tile: TilePoint) -> Self {
        Self {
            x: tile.x,
            y: tile.y,
            target: target.into(),
            target_x: target_tile.x,
            target_y: target_tile.y,
        }
    }

    pub fn tile(&self) -> TilePoint {
        TilePoint::new(self.x, self.y)
    }

    pub fn target_tile(&self) -> TilePoint {
        TilePoint::new(self.target_x, self.target_y)
    }

    /// Same source tile, different destination.
    pub fn retarget(&self, target: impl Into<String>, target_tile: TilePoint) -> Self {
        Self::new(self.tile(), target, target_tile)
    }
}

#[derive(Debug, Clone)]
pub struct Location {
    pub name: String,
    pub kind: LocationKind,
    /// Farmer owning this location; only meaningful for homes.
    pub owner: Option<u64>,
    /// Tile a character lands on when entering through the front door.
    pub entry: TilePoint,
    pub warps: Vec<Warp>,
    pub open_tiles: Vec<TilePoint>,
    /// Tiles holding objects; passable only for actors allowed to destroy them.
    pub obstacles: HashSet<TilePoint>,
    /// Bed tile per child slot, in slot order.
    pub child_beds: Vec<TilePoint>,
    /// Characters currently inside this location.
    pub characters: Vec<Entity>,
}

impl Location {
    pub fn new(name: impl Into<String>, kind: LocationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            owner: None,
            entry: TilePoint::default(),
            warps: Vec::new(),
            open_tiles: Vec::new(),
            obstacles: HashSet::new(),
            child_beds: Vec::new(),
            characters: Vec::new(),
        }
    }

    pub fn with_owner(mut self, owner: u64) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_entry(mut self, entry: TilePoint) -> Self {
        self.entry = entry;
        self
    }

    pub fn with_warp(mut self, warp: Warp) -> Self {
        self.warps.push(warp);
        self
    }

    /// Mark every tile in the inclusive rectangle as open floor.
    pub fn with_open_area(mut self, from: TilePoint, to: TilePoint) -> Self {
        for y in from.y.min(to.y)..=from.y.max(to.y) {
            for x in from.x.min(to.x)..=from.x.max(to.x) {
                let tile = TilePoint::new(x, y);
                if !self.open_tiles.contains(&tile) {
                    self.open_tiles.push(tile);
                }
            }
        }
        self
    }

    pub fn with_obstacle(mut self, tile: TilePoint) -> Self {
        self.obstacles.insert(tile);
        self
    }

    pub fn with_child_beds(mut self, beds: impl IntoIterator<Item = TilePoint>) -> Self {
        self.child_beds.extend(beds);
        self
    }

    pub fn is_home(&self) -> bool {
        self.kind.is_home()
    }

    pub fn warp_at(&self, tile: TilePoint) -> Option<&Warp> {
        self.warps.iter().find(|w| w.tile() == tile)
    }

    /// The front-door warp leading out of this location.
    pub fn exit_warp(&self) -> Option<&Warp> {
        self.warps.first()
    }

    pub fn is_tile_on_map(&self, tile: TilePoint) -> bool {
        self.open_tiles.contains(&tile) || self.warp_at(tile).is_some()
    }

    pub fn is_walkable(&self, tile: TilePoint, destroy_objects: bool) -> bool {
        if self.warp_at(tile).is_some() {
            return true;
        }
        self.open_tiles.contains(&tile) && (destroy_objects || !self.obstacles.contains(&tile))
    }

    pub fn child_bed(&self, slot: ChildSlot) -> Option<TilePoint> {
        self.child_beds.get(slot.index()).copied()
    }

    pub fn random_open_point(&self, rng: &mut StdRng) -> Option<TilePoint> {
        let free: Vec<TilePoint> = self
            .open_tiles
            .iter()
            .copied()
            .filter(|t| !self.obstacles.contains(t))
            .collect();
        free.choose(rng).copied()
    }
}

/// Every loaded location, keyed by name.
#[derive(Resource, Debug, Clone, Default)]
pub struct Locations {
    pub map: HashMap<String, Location>,
}

impl Locations {
    pub fn insert(&mut self, location: Location) {
        self.map.insert(location.name.clone(), location);
    }

    pub fn get(&self, name: &str) -> Option<&Location> {
        self.map.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Location> {
        self.map.get_mut(name)
    }

    /// The specific home belonging to `owner`. A session may hold one
    /// farmhouse and several cabins; the farmhouse wins if both match.
    pub fn home_of(&self, owner: u64) -> Option<&Location> {
        let mut homes = self
            .map
            .values()
            .filter(|l| l.is_home() && l.owner == Some(owner));
        let first = homes.next()?;
        if first.kind == LocationKind::FarmHouse {
            return Some(first);
        }
        Some(
            homes
                .find(|l| l.kind == LocationKind::FarmHouse)
                .unwrap_or(first),
        )
    }

    pub fn location_of(&self, entity: Entity) -> Option<&str> {
        self.map
            .values()
            .find(|l| l.characters.contains(&entity))
            .map(|l| l.name.as_str())
    }

    /// Add a character to a location's roster. Returns false if the
    /// location does not exist.
    pub fn place_character(&mut self, entity: Entity, location: &str) -> bool {
        match self.map.get_mut(location) {
            Some(loc) => {
                if !loc.characters.contains(&entity) {
                    loc.characters.push(entity);
                }
                true
            }
            None => false,
        }
    }

    /// Remove a character from whichever location holds it, searching all
    /// of them. Returns the name of the location it was found in.
    pub fn remove_character(&mut self, entity: Entity) -> Option<String> {
        let mut found = None;
        for location in self.map.values_mut() {
            let before = location.characters.len();
            location.characters.retain(|e| *e != entity);
            if location.characters.len() != before && found.is_none() {
                found = Some(location.name.clone());
            }
        }
        found
    }

    pub fn move_character(&mut self, entity: Entity, to: &str) -> bool {
        self.remove_character(entity);
        self.place_character(entity, to)
    }

    /// Sequence of locations a scheduled character walks through from
    /// `from` to `to`, both included. Homes are private and are never part
    /// of a public route.
    pub fn route_between(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let start = self.map.get(from)?;
        let goal = self.map.get(to)?;
        if start.is_home() || goal.is_home() {
            return None;
        }
        if from == to {
            return Some(vec![from.to_string()]);
        }

        let mut previous: HashMap<&str, &str> = HashMap::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(start.name.as_str());
        previous.insert(start.name.as_str(), "");

        while let Some(current) = queue.pop_front() {
            if current == to {
                let mut route = vec![current.to_string()];
                let mut cursor = current;
                while let Some(&prev) = previous.get(cursor) {
                    if prev.is_empty() {
                        break;
                    }
                    route.push(prev.to_string());
                    cursor = prev;
                }
                route.reverse();
                return Some(route);
            }
            let Some(location) = self.map.get(current) else {
                continue;
            };
            for warp in &location.warps {
                let Some(next) = self.map.get(&warp.target) else {
                    continue;
                };
                if next.is_home() || previous.contains_key(next.name.as_str()) {
                    continue;
                }
                previous.insert(next.name.as_str(), current);
                queue.push_back(next.name.as_str());
            }
        }
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════
// HOST LIFECYCLE EVENTS: sent by the host exactly once per occurrence
// ═══════════════════════════════════════════════════════════════════════

#[derive(Event, Debug, Clone)]
pub struct DayStartedEvent;

/// Fixed periodic tick, once per real second.
#[derive(Event, Debug, Clone)]
pub struct OneSecondTickEvent;

/// The clock advanced by ten minutes.
#[derive(Event, Debug, Clone)]
pub struct TimeOfDayChangedEvent {
    pub time: u32,
}

#[derive(Event, Debug, Clone)]
pub struct PreSaveEvent;

#[derive(Event, Debug, Clone)]
pub struct ReturnedToTitleEvent;

/// The local player entered a new location.
#[derive(Event, Debug, Clone)]
pub struct PlayerWarpedEvent {
    pub location: String,
}

/// A follower process joined the session (host side).
#[derive(Event, Debug, Clone)]
pub struct FollowerJoinedEvent {
    pub peer: u64,
}

// ═══════════════════════════════════════════════════════════════════════
// TRANSPORT + INTERNAL EVENTS
// ═══════════════════════════════════════════════════════════════════════

/// Replication message: one encoded actor definition. The host writes it;
/// the transport delivers it to every process, the host included.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ActorDefinedEvent {
    pub identity: String,
    pub payload: Vec<u8>,
}

/// A child was converted into a live actor this frame (host only).
#[derive(Event, Debug, Clone)]
pub struct ActorConvertedEvent {
    pub slot: ChildSlot,
    pub actor: Entity,
}

/// A replicated definition was applied locally. Carries the raw schedule
/// text so the host can activate scheduling from here and nowhere else.
#[derive(Event, Debug, Clone)]
pub struct ActorDefinitionAppliedEvent {
    pub identity: String,
    pub schedule_source: Option<String>,
}

/// An actor crossed a warp into its own home.
#[derive(Event, Debug, Clone)]
pub struct ArrivedAtHomeEvent {
    pub actor: Entity,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_world() -> Locations {
        let mut locations = Locations::default();
        locations.insert(
            Location::new("FarmHouse", LocationKind::FarmHouse)
                .with_owner(7)
                .with_warp(Warp::new(TilePoint::new(3, 9), "Farm", TilePoint::new(64, 15))),
        );
        locations.insert(
            Location::new("Farm", LocationKind::Farm)
                .with_warp(Warp::new(TilePoint::new(79, 17), "BusStop", TilePoint::new(0, 23))),
        );
        locations.insert(
            Location::new("BusStop", LocationKind::BusStop)
                .with_warp(Warp::new(TilePoint::new(-1, 23), "Farm", TilePoint::new(78, 17)))
                .with_warp(Warp::new(TilePoint::new(34, 23), "Town", TilePoint::new(0, 54))),
        );
        locations.insert(
            Location::new("Town", LocationKind::Town)
                .with_warp(Warp::new(TilePoint::new(-1, 54), "BusStop", TilePoint::new(33, 23))),
        );
        locations
    }

    #[test]
    fn test_add_days_backwards_across_year() {
        let today = GameDate::new(3, Season::Spring, 2);
        let birthday = today.add_days(-5).unwrap();
        assert_eq!(birthday, GameDate::new(26, Season::Winter, 1));
    }

    #[test]
    fn test_add_days_before_first_day_fails() {
        let today = GameDate::new(10, Season::Spring, 1);
        assert!(matches!(
            today.add_days(-10),
            Err(DateError::BeforeFirstDay { .. })
        ));
        assert_eq!(
            today.add_days(-9).unwrap(),
            GameDate::new(1, Season::Spring, 1)
        );
    }

    #[test]
    fn test_add_days_extreme_offset_fails() {
        let today = GameDate::new(1, Season::Summer, 3);
        assert!(today.add_days(i64::MAX).is_err());
    }

    #[test]
    fn test_time_helpers() {
        assert!(is_valid_time(930));
        assert!(!is_valid_time(960));
        assert!(!is_valid_time(2700));
        assert!(is_hour_boundary(1800));
        assert!(!is_hour_boundary(1810));
    }

    #[test]
    fn test_route_between_skips_homes() {
        let locations = small_world();
        assert_eq!(
            locations.route_between("BusStop", "Town"),
            Some(vec!["BusStop".to_string(), "Town".to_string()])
        );
        assert_eq!(locations.route_between("FarmHouse", "Town"), None);
        assert_eq!(
            locations.route_between("Farm", "Town"),
            Some(vec!["Farm".to_string(), "BusStop".to_string(), "Town".to_string()])
        );
    }

    #[test]
    fn test_remove_character_searches_all_locations() {
        let mut locations = small_world();
        let entity = Entity::from_raw(42);
        assert!(locations.place_character(entity, "Town"));
        assert_eq!(locations.location_of(entity), Some("Town"));
        assert_eq!(locations.remove_character(entity), Some("Town".to_string()));
        assert_eq!(locations.remove_character(entity), None);
    }

    #[test]
    fn test_home_of_prefers_owner() {
        let mut locations = small_world();
        locations.insert(Location::new("Cabin_b", LocationKind::Cabin).with_owner(9));
        assert_eq!(locations.home_of(9).map(|l| l.name.as_str()), Some("Cabin_b"));
        assert_eq!(locations.home_of(7).map(|l| l.name.as_str()), Some("FarmHouse"));
        assert!(locations.home_of(1).is_none());
    }

    #[test]
    fn test_friendship_migrate_removes_old_key() {
        let mut friendships = Friendships::default();
        friendships.entries.insert(
            "Lily".into(),
            Friendship {
                points: 250,
                ..Default::default()
            },
        );
        assert!(friendships.migrate("Lily", "FirstLittleNPCLily7"));
        assert!(!friendships.entries.contains_key("Lily"));
        assert_eq!(friendships.entries["FirstLittleNPCLily7"].points, 250);
        assert!(!friendships.migrate("Lily", "elsewhere"));
    }
}
