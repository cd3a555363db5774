//! Headless integration tests for LittleNPCs.
//!
//! These drive the full plugin inside a Bevy `App` with `MinimalPlugins`,
//! sending the host's lifecycle events by hand and ticking with
//! `app.update()`. Nothing here needs a window or GPU.
//!
//! Run with: `cargo test --test headless`

use bevy::prelude::*;
use littlenpcs::config::LittleNpcConfig;
use littlenpcs::conversion::hooks::{SocialEntry, SocialListing};
use littlenpcs::conversion::session::LittleNpcSession;
use littlenpcs::conversion::tokens::{resolve_info, InfoSource};
use littlenpcs::npcs::actor::{LittleNpc, Pathing, ScheduleState};
use littlenpcs::npcs::curfew::CurfewWander;
use littlenpcs::npcs::dialogue::substitute_kid_names;
use littlenpcs::replication::assets::{ActorContent, AssetCache, AssetLookup, ContentLibrary};
use littlenpcs::replication::payload::{Appearance, NpcDefinitions};
use littlenpcs::replication::ReplicationState;
use littlenpcs::shared::*;
use littlenpcs::LittleNpcsPlugin;
use std::collections::BTreeMap;

const HOST_ID: u64 = 1;
const LILY: &str = "FirstLittleNPCLily1";
const BO: &str = "SecondLittleNPCBo1";

// ─────────────────────────────────────────────────────────────────────────────
// Test App Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Farmhouse → farm → bus stop → town, wired the way the host lays them out.
fn seed_locations() -> Locations {
    let mut locations = Locations::default();
    locations.insert(
        Location::new("FarmHouse", LocationKind::FarmHouse)
            .with_owner(HOST_ID)
            .with_entry(TilePoint::new(3, 8))
            .with_open_area(TilePoint::new(1, 1), TilePoint::new(6, 8))
            .with_warp(Warp::new(TilePoint::new(3, 9), "Farm", TilePoint::new(64, 15)))
            .with_child_beds([TilePoint::new(2, 2), TilePoint::new(5, 2)]),
    );
    locations.insert(
        Location::new("Farm", LocationKind::Farm)
            .with_open_area(TilePoint::new(60, 10), TilePoint::new(78, 20))
            .with_warp(Warp::new(TilePoint::new(64, 9), "FarmHouse", TilePoint::new(3, 8)))
            .with_warp(Warp::new(TilePoint::new(79, 17), "BusStop", TilePoint::new(0, 23))),
    );
    locations.insert(
        Location::new("BusStop", LocationKind::BusStop)
            .with_open_area(TilePoint::new(0, 20), TilePoint::new(33, 25))
            .with_warp(Warp::new(TilePoint::new(-1, 23), "Farm", TilePoint::new(78, 17)))
            .with_warp(Warp::new(TilePoint::new(34, 23), "Town", TilePoint::new(0, 54))),
    );
    locations.insert(
        Location::new("Town", LocationKind::Town)
            .with_open_area(TilePoint::new(0, 0), TilePoint::new(20, 55))
            .with_warp(Warp::new(TilePoint::new(-1, 54), "BusStop", TilePoint::new(33, 23))),
    );
    locations
}

fn lily_content() -> ActorContent {
    ActorContent {
        appearance: Appearance {
            sprite_sheet: vec![7; 32],
            portrait: vec![3; 16],
        },
        dialogue: BTreeMap::from([("Introduction".into(), "I'm Lily!".into())]),
        schedule: Some("610 bed/900 Town 10 5 2".into()),
    }
}

fn child(name: &str, gender: Gender, days_old: u32) -> (ChildRecord, Placement) {
    (
        ChildRecord {
            name: name.into(),
            gender,
            days_old,
            hat: None,
            home: "FarmHouse".into(),
            invisible: false,
        },
        Placement::new("FarmHouse", TilePoint::new(4, 5)),
    )
}

/// Host app with the plugin, a seeded world, and three convertible children
/// plus a baby.
fn build_host_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);

    app.insert_resource(Session {
        role: HostRole::Host,
        player_id: HOST_ID,
        world_ready: true,
    })
    .insert_resource(seed_locations())
    .insert_resource(HomeRng::seeded(42))
    .insert_resource(LittleNpcConfig::default());

    let mut content = ContentLibrary::default();
    content.insert(LILY, lily_content());
    app.insert_resource(content);

    app.add_plugins(LittleNpcsPlugin);

    let world = app.world_mut();
    let (mut lily, placement) = child("Lily", Gender::Female, 250);
    lily.hat = Some(Hat { id: "cowboy".into() });
    world.spawn((lily, placement));
    world.spawn(child("Bo", Gender::Male, 100));
    world.spawn(child("Tiny", Gender::Female, 90));
    world.spawn(child("Pip", Gender::Male, 10));

    world.resource_mut::<Friendships>().entries.insert(
        "Lily".into(),
        Friendship {
            points: 750,
            gifts_this_week: 1,
            talked_today: true,
        },
    );
    app
}

fn build_follower_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(Session {
        role: HostRole::Follower,
        player_id: 2,
        world_ready: true,
    });
    app.add_plugins(LittleNpcsPlugin);
    app
}

/// Day start followed by the conversion delay.
fn run_conversion(app: &mut App) {
    app.world_mut().send_event(DayStartedEvent);
    app.update();
    for _ in 0..LittleNpcConfig::default().conversion_delay_ticks {
        app.world_mut().send_event(OneSecondTickEvent);
        app.update();
    }
}

fn set_time(app: &mut App, time: u32) {
    app.world_mut().resource_mut::<GameClock>().time_of_day = time;
    app.world_mut().send_event(TimeOfDayChangedEvent { time });
}

fn actor_count(app: &mut App) -> usize {
    let mut query = app.world_mut().query::<&LittleNpc>();
    query.iter(app.world()).count()
}

fn child_named(app: &mut App, name: &str) -> ChildRecord {
    let mut query = app.world_mut().query::<&ChildRecord>();
    query
        .iter(app.world())
        .find(|c| c.name == name)
        .cloned()
        .expect("child exists")
}

fn actor_state(app: &mut App, identity: &str) -> (Placement, ScheduleState) {
    let mut query = app
        .world_mut()
        .query::<(&LittleNpc, &Placement, &ScheduleState)>();
    query
        .iter(app.world())
        .find(|(npc, _, _)| npc.identity == identity)
        .map(|(_, placement, schedule)| (placement.clone(), schedule.clone()))
        .expect("actor exists")
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversion lifecycle
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_three_convertible_children_fill_two_slots() {
    let mut app = build_host_app();
    run_conversion(&mut app);

    assert_eq!(actor_count(&mut app), 2);
    let context = app.world().resource::<LittleNpcSession>();
    assert_eq!(context.mapping().len(), 2);
    assert_eq!(
        context.registry().get(ChildSlot::First).map(|a| a.identity.as_str()),
        Some(LILY)
    );
    assert_eq!(
        context.registry().get(ChildSlot::Second).map(|a| a.identity.as_str()),
        Some(BO)
    );
    assert_eq!(context.slots().slot_of("Tiny"), None);

    assert!(child_named(&mut app, "Lily").invisible);
    assert!(child_named(&mut app, "Bo").invisible);
    assert!(!child_named(&mut app, "Tiny").invisible, "third child stays a child");
    assert!(!child_named(&mut app, "Pip").invisible, "baby is never converted");
}

#[test]
fn test_actor_borrows_hat_and_friendship_for_the_day() {
    let mut app = build_host_app();
    run_conversion(&mut app);

    let lily = child_named(&mut app, "Lily");
    assert_eq!(lily.hat, None);
    let friendships = app.world().resource::<Friendships>();
    assert!(!friendships.entries.contains_key("Lily"));
    assert_eq!(friendships.entries[LILY].points, 750);

    let mut query = app.world_mut().query::<(&LittleNpc, &Pathing, &CurfewWander)>();
    let (npc, _, _) = query
        .iter(app.world())
        .find(|(npc, _, _)| npc.identity == LILY)
        .expect("Lily's actor has movement components");
    assert_eq!(npc.hat, Some(Hat { id: "cowboy".into() }));
    assert_eq!(npc.bed, TilePoint::new(2, 2));
}

#[test]
fn test_pre_save_restores_children_exactly() {
    let mut app = build_host_app();
    let before = child_named(&mut app, "Lily");
    let friendship_before = app.world().resource::<Friendships>().entries["Lily"];
    run_conversion(&mut app);

    app.world_mut().send_event(PreSaveEvent);
    app.update();

    assert!(app.world().resource::<LittleNpcSession>().mapping().is_empty());
    assert_eq!(actor_count(&mut app), 0);
    assert_eq!(child_named(&mut app, "Lily").name, before.name);
    assert_eq!(child_named(&mut app, "Lily").gender, before.gender);
    assert_eq!(child_named(&mut app, "Lily").hat, before.hat);
    assert!(!child_named(&mut app, "Lily").invisible);

    let friendships = app.world().resource::<Friendships>();
    assert_eq!(friendships.entries["Lily"], friendship_before);
    assert!(!friendships.entries.contains_key(LILY));

    let locations = app.world().resource::<Locations>();
    assert!(locations.map.values().all(|l| l.characters.is_empty()));
}

#[test]
fn test_pre_save_during_delay_unhides_children() {
    let mut app = build_host_app();
    app.world_mut().send_event(DayStartedEvent);
    app.update();
    assert!(child_named(&mut app, "Lily").invisible);

    app.world_mut().send_event(PreSaveEvent);
    app.update();
    assert!(!child_named(&mut app, "Lily").invisible);
    assert!(!child_named(&mut app, "Bo").invisible);

    // The delay was cancelled with the day.
    app.world_mut().send_event(OneSecondTickEvent);
    app.update();
    app.world_mut().send_event(OneSecondTickEvent);
    app.update();
    assert_eq!(actor_count(&mut app), 0);
}

#[test]
fn test_leaked_mapping_cleared_at_day_start() {
    let mut app = build_host_app();
    run_conversion(&mut app);

    // A new day without a save in between.
    run_conversion(&mut app);

    assert_eq!(actor_count(&mut app), 2, "leftover actors were replaced, not duplicated");
    assert_eq!(app.world().resource::<LittleNpcSession>().mapping().len(), 2);
    let friendships = app.world().resource::<Friendships>();
    assert_eq!(friendships.entries.len(), 1);
    assert_eq!(friendships.entries[LILY].points, 750);
}

#[test]
fn test_return_to_title_ends_session() {
    let mut app = build_host_app();
    run_conversion(&mut app);

    app.world_mut().send_event(ReturnedToTitleEvent);
    app.update();

    let context = app.world().resource::<LittleNpcSession>();
    assert!(context.mapping().is_empty());
    assert!(context.registry().is_empty());
    assert_eq!(context.slots().slot_of("Lily"), None);
    assert_eq!(app.world().resource::<ReplicationState>().retained().count(), 0);
    assert_eq!(actor_count(&mut app), 0);
}

#[test]
fn test_player_warp_rehides_tracked_children() {
    let mut app = build_host_app();
    run_conversion(&mut app);

    // Loading the location makes the host show every child again.
    let mut query = app.world_mut().query::<&mut ChildRecord>();
    for mut child in query.iter_mut(app.world_mut()) {
        child.invisible = false;
    }
    app.world_mut().send_event(PlayerWarpedEvent {
        location: "FarmHouse".into(),
    });
    app.update();

    assert!(child_named(&mut app, "Lily").invisible);
    assert!(child_named(&mut app, "Bo").invisible);
    assert!(!child_named(&mut app, "Tiny").invisible);
}

#[test]
fn test_social_listing_drops_hidden_children() {
    let mut app = build_host_app();
    let mut query = app.world_mut().query::<(Entity, &ChildRecord)>();
    let entries: Vec<SocialEntry> = query
        .iter(app.world())
        .map(|(entity, child)| SocialEntry {
            name: child.name.clone(),
            character: Some(entity),
        })
        .collect();
    app.insert_resource(SocialListing { entries });

    run_conversion(&mut app);

    let mut names: Vec<String> = app
        .world()
        .resource::<SocialListing>()
        .entries
        .iter()
        .map(|e| e.name.clone())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Pip".to_string(), "Tiny".to_string()]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry consumers
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_tokens_and_dialogue_read_live_actors() {
    let mut app = build_host_app();
    run_conversion(&mut app);

    let info = resolve_info(app.world(), ChildSlot::First).expect("slot 0 is occupied");
    assert_eq!(info.identity, LILY);
    assert_eq!(info.source, InfoSource::LittleNpc);
    assert_eq!(info.age_years, 2);
    assert_eq!(info.bed, Some(TilePoint::new(2, 2)));

    let registry = app.world().resource::<LittleNpcSession>().registry();
    assert_eq!(
        substitute_kid_names("%kid1, tell %kid2 dinner is ready.", registry),
        "Lily, tell Bo dinner is ready."
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Replication
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_host_sends_each_definition_once() {
    let mut app = build_host_app();
    run_conversion(&mut app);

    let state = app.world().resource::<ReplicationState>();
    let retained: Vec<&str> = state.retained().map(|(identity, _)| identity).collect();
    assert_eq!(retained, vec![LILY, BO]);
    assert!(state.was_sent(LILY));

    // The host applies its own payloads like any follower.
    let definitions = app.world().resource::<NpcDefinitions>();
    assert_eq!(definitions.len(), 2);
    assert_eq!(definitions.get(LILY).map(|d| d.display_name.as_str()), Some("Lily"));
    assert!(matches!(
        app.world().resource::<AssetCache>().lookup(BO),
        AssetLookup::Missing
    ));
}

#[test]
fn test_follower_applies_replayed_payloads_once() {
    let mut host = build_host_app();
    run_conversion(&mut host);
    let payloads: Vec<ActorDefinedEvent> = host
        .world()
        .resource::<ReplicationState>()
        .retained()
        .map(|(identity, bytes)| ActorDefinedEvent {
            identity: identity.to_string(),
            payload: bytes.to_vec(),
        })
        .collect();

    let mut follower = build_follower_app();
    for event in &payloads {
        follower.world_mut().send_event(event.clone());
    }
    follower.update();
    let once = follower.world().resource::<NpcDefinitions>().get(LILY).cloned();

    // Late-join replay delivers everything again.
    for event in &payloads {
        follower.world_mut().send_event(event.clone());
    }
    follower.update();

    let definitions = follower.world().resource::<NpcDefinitions>();
    assert_eq!(definitions.len(), 2);
    assert_eq!(definitions.get(LILY).cloned(), once);
    assert!(matches!(
        follower.world().resource::<AssetCache>().lookup(LILY),
        AssetLookup::Found(_)
    ));
    assert_eq!(
        follower.world().resource::<AssetCache>().dialogue_line(LILY, "Introduction"),
        Some("I'm Lily!")
    );
}

#[test]
fn test_late_join_replays_retained_definitions() {
    let mut app = build_host_app();
    run_conversion(&mut app);

    app.world_mut().send_event(FollowerJoinedEvent { peer: 77 });
    app.update();

    let events = app.world().resource::<Events<ActorDefinedEvent>>();
    let replayed: Vec<&str> = events
        .iter_current_update_events()
        .map(|e| e.identity.as_str())
        .collect();
    assert_eq!(replayed, vec![LILY, BO]);
    assert_eq!(app.world().resource::<NpcDefinitions>().len(), 2);
}

#[test]
fn test_follower_never_activates_schedules() {
    let mut host = build_host_app();
    run_conversion(&mut host);
    let payload = host
        .world()
        .resource::<ReplicationState>()
        .retained()
        .find(|(identity, _)| *identity == LILY)
        .map(|(_, bytes)| bytes.to_vec())
        .expect("Lily's payload was retained");

    let mut follower = build_follower_app();
    let (lily, _) = child("Lily", Gender::Female, 250);
    let npc = LittleNpc::from_child(
        ChildSlot::First,
        &lily,
        TilePoint::new(2, 2),
        HOST_ID,
        GameClock::default().date,
    );
    follower.world_mut().spawn((
        npc,
        Placement::new("FarmHouse", TilePoint::new(2, 2)),
        ScheduleState::default(),
        Pathing::default(),
    ));
    follower.world_mut().send_event(ActorDefinedEvent {
        identity: LILY.into(),
        payload,
    });
    follower.update();

    let (_, schedule) = actor_state(&mut follower, LILY);
    assert!(schedule.table.is_none());
    assert_eq!(follower.world().resource::<NpcDefinitions>().len(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Scheduling and movement
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_schedule_active_after_definition_applied() {
    let mut app = build_host_app();
    run_conversion(&mut app);

    let (placement, schedule) = actor_state(&mut app, LILY);
    assert_eq!(placement.location, "FarmHouse");
    assert_eq!(placement.tile, TilePoint::new(2, 2));
    assert!(schedule.parsed_ok);
    let table = schedule.table.expect("Lily has a schedule");
    assert_eq!(table.entries.keys().copied().collect::<Vec<_>>(), vec![610, 900]);
    assert_eq!(table.entries[&610].target, TilePoint::new(-1, 23));
    assert_eq!(table.entries[&900].target, TilePoint::new(10, 5));

    let (_, bo) = actor_state(&mut app, BO);
    assert!(bo.table.is_none());
}

#[test]
fn test_scheduled_walk_to_town_and_curfew_home() {
    let mut app = build_host_app();
    run_conversion(&mut app);

    set_time(&mut app, 900);
    let mut arrived = false;
    for _ in 0..400 {
        app.update();
        let (placement, _) = actor_state(&mut app, LILY);
        if placement.location == "Town" && placement.tile == TilePoint::new(10, 5) {
            arrived = true;
            break;
        }
    }
    assert!(arrived, "Lily should walk out of the house and into town");
    for _ in 0..3 {
        app.update();
    }
    let (placement, _) = actor_state(&mut app, LILY);
    assert_eq!(placement.facing, Facing::Down);

    // Curfew: the recall route ends on the bus-stop boundary warp, which
    // lands in the farmhouse instead of on the farm.
    set_time(&mut app, 1900);
    let mut home = false;
    for _ in 0..400 {
        app.update();
        let (placement, schedule) = actor_state(&mut app, LILY);
        assert_ne!(placement.location, "Farm", "boundary warp must resolve home");
        if placement.location == "FarmHouse" && schedule.ignore_today {
            home = true;
            break;
        }
    }
    assert!(home, "Lily should be recalled home and stop following her schedule");

    let locations = app.world().resource::<Locations>();
    assert!(locations.get("Town").is_some_and(|l| l.characters.is_empty()));
    assert_eq!(locations.get("FarmHouse").map(|l| l.characters.len()), Some(2));
}
