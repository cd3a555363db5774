//! LittleNPCs library crate: turns a farmer's older children into scheduled
//! town actors for the day and gives them back before every save.
//!
//! The host game drives everything through the lifecycle events in
//! [`shared`]; add [`LittleNpcsPlugin`] to its `App`. The binary crate
//! (`main.rs`) is a headless day simulation built on the same plugin.

pub mod shared;
pub mod error;
pub mod config;
pub mod npcs;
pub mod conversion;
pub mod replication;
pub mod save;

use bevy::prelude::*;

use config::LittleNpcConfig;
use save::LoadedSave;
use shared::*;

pub struct LittleNpcsPlugin;

impl Plugin for LittleNpcsPlugin {
    fn build(&self, app: &mut App) {
        app
            // Shared resources; anything the host inserted first is kept.
            .init_resource::<Session>()
            .init_resource::<GameClock>()
            .init_resource::<Locations>()
            .init_resource::<Friendships>()
            .init_resource::<HomeRng>()
            .init_resource::<LittleNpcConfig>()
            .init_resource::<LoadedSave>()
            // Host lifecycle
            .add_event::<DayStartedEvent>()
            .add_event::<OneSecondTickEvent>()
            .add_event::<TimeOfDayChangedEvent>()
            .add_event::<PreSaveEvent>()
            .add_event::<ReturnedToTitleEvent>()
            .add_event::<PlayerWarpedEvent>()
            .add_event::<FollowerJoinedEvent>()
            // Replication transport
            .add_event::<ActorDefinedEvent>()
            // Internal
            .add_event::<ActorConvertedEvent>()
            .add_event::<ActorDefinitionAppliedEvent>()
            .add_event::<ArrivedAtHomeEvent>();

        app.configure_sets(
            Update,
            (
                LittleNpcSet::Lifecycle,
                LittleNpcSet::Replication,
                LittleNpcSet::Schedule,
                LittleNpcSet::Behavior,
                LittleNpcSet::Movement,
            )
                .chain(),
        );

        app.add_plugins(conversion::ConversionPlugin)
            .add_plugins(replication::ReplicationPlugin)
            .add_plugins(npcs::NpcPlugin);
    }
}
