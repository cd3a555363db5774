//! Headless one-day simulation: a farmhouse with three children, driven
//! through day start, a full clock, and the pre-save revert.
//!
//! Usage: `littlenpcs-sim [CONFIG.ron]`

use bevy::log::LogPlugin;
use bevy::prelude::*;
use std::path::PathBuf;

use littlenpcs::config::{LittleNpcConfig, CONFIG_FILE_NAME};
use littlenpcs::conversion::session::LittleNpcSession;
use littlenpcs::npcs::actor::LittleNpc;
use littlenpcs::replication::assets::{ActorContent, ContentLibrary};
use littlenpcs::shared::*;
use littlenpcs::LittleNpcsPlugin;

const FARMER_ID: u64 = 1;
/// Frames simulated per ten in-game minutes.
const FRAMES_PER_STEP: usize = 24;

fn seed_locations() -> Locations {
    let mut locations = Locations::default();
    locations.insert(
        Location::new("FarmHouse", LocationKind::FarmHouse)
            .with_owner(FARMER_ID)
            .with_entry(TilePoint::new(3, 8))
            .with_open_area(TilePoint::new(1, 1), TilePoint::new(8, 8))
            .with_obstacle(TilePoint::new(6, 4))
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
            .with_open_area(TilePoint::new(0, 0), TilePoint::new(40, 60))
            .with_warp(Warp::new(TilePoint::new(-1, 54), "BusStop", TilePoint::new(33, 23))),
    );
    locations
}

fn seed_content() -> ContentLibrary {
    let mut content = ContentLibrary::default();
    content.insert(
        "FirstLittleNPCJas1",
        ActorContent {
            schedule: Some("610 bed/900 Town 12 20 2/1300 Town 30 8 1 square_dance/1700 bed".into()),
            ..Default::default()
        },
    );
    content.insert(
        "SecondLittleNPCVincent1",
        ActorContent {
            schedule: Some("1000 Town 6 40 0/1500 bed".into()),
            ..Default::default()
        },
    );
    content
}

fn spawn_children(world: &mut World) {
    let children = [
        ("Jas", Gender::Female, 300),
        ("Vincent", Gender::Male, 150),
        ("Leo", Gender::Male, 95),
    ];
    for (name, gender, days_old) in children {
        world.spawn((
            ChildRecord {
                name: name.to_string(),
                gender,
                days_old,
                hat: None,
                home: "FarmHouse".into(),
                invisible: false,
            },
            Placement::new("FarmHouse", TilePoint::new(4, 6)),
        ));
    }
}

/// Next clock value ten minutes after `time`.
fn next_time(time: u32) -> u32 {
    let next = time + 10;
    if next % 100 >= 60 {
        next + 40
    } else {
        next
    }
}

fn report(app: &mut App) {
    let time = app.world().resource::<GameClock>().time_of_day;
    let mut query = app.world_mut().query::<(&LittleNpc, &Placement)>();
    for (npc, placement) in query.iter(app.world()) {
        info!(
            "[LittleNPCs/Sim] {} {} is in {} at {}",
            time, npc.display_name, placement.location, placement.tile
        );
    }
}

fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(LogPlugin::default())
        .insert_resource(Session {
            role: HostRole::Host,
            player_id: FARMER_ID,
            world_ready: true,
        })
        .insert_resource(seed_locations())
        .insert_resource(seed_content())
        .insert_resource(LittleNpcConfig::load_or_default(&config_path))
        .add_plugins(LittleNpcsPlugin);
    spawn_children(app.world_mut());

    app.world_mut().send_event(DayStartedEvent);
    app.update();
    let delay = app.world().resource::<LittleNpcConfig>().conversion_delay_ticks;
    for _ in 0..delay {
        app.world_mut().send_event(OneSecondTickEvent);
        app.update();
    }
    let converted = app.world().resource::<LittleNpcSession>().mapping().len();
    info!("[LittleNPCs/Sim] {} child(ren) converted", converted);

    let mut time = DAY_START_TIME;
    while time < DAY_END_TIME {
        time = next_time(time);
        app.world_mut().resource_mut::<GameClock>().time_of_day = time;
        app.world_mut().send_event(TimeOfDayChangedEvent { time });
        for _ in 0..FRAMES_PER_STEP {
            app.update();
        }
        if is_hour_boundary(time) {
            report(&mut app);
        }
    }

    app.world_mut().send_event(PreSaveEvent);
    app.update();
    let left = app.world().resource::<LittleNpcSession>().mapping().len();
    info!("[LittleNPCs/Sim] Day over; {} conversion(s) left before save", left);
}
