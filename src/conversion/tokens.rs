//! Read-only per-slot attributes for the host's templating layer.
//!
//! Answers come from the live actor if there is one, else from the matching
//! convertible child, else (no world loaded) from the selected save file.

use bevy::prelude::*;

use crate::config::LittleNpcConfig;
use crate::npcs::actor::{birthday_for, identity_name, LittleNpc};
use crate::save::LoadedSave;
use crate::shared::*;

use super::registry::SlotAssignments;
use super::session::LittleNpcSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoSource {
    LittleNpc,
    Child,
    SaveGame,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LittleNpcInfo {
    pub identity: String,
    pub display_name: String,
    pub gender: Gender,
    pub birthday: GameDate,
    pub bed: Option<TilePoint>,
    pub age_years: u32,
    pub source: InfoSource,
}

impl LittleNpcInfo {
    fn from_actor(npc: &LittleNpc) -> Self {
        Self {
            identity: npc.identity.clone(),
            display_name: npc.display_name.clone(),
            gender: npc.gender,
            birthday: npc.birthday,
            bed: Some(npc.bed),
            age_years: npc.age_in_days / DAYS_PER_YEAR,
            source: InfoSource::LittleNpc,
        }
    }
}

/// Token values for `slot`, or `None` when nothing occupies it.
pub fn resolve_info(world: &World, slot: ChildSlot) -> Option<LittleNpcInfo> {
    let session = world.get_resource::<Session>()?;
    if session.world_ready {
        from_live_world(world, session, slot)
    } else {
        from_save(world, slot)
    }
}

fn from_live_world(world: &World, session: &Session, slot: ChildSlot) -> Option<LittleNpcInfo> {
    let context = world.get_resource::<LittleNpcSession>()?;
    if let Some(npc) = context
        .registry()
        .get(slot)
        .and_then(|actor| world.get::<LittleNpc>(actor.entity))
    {
        return Some(LittleNpcInfo::from_actor(npc));
    }

    let config = world.get_resource::<LittleNpcConfig>()?;
    let clock = world.get_resource::<GameClock>()?;
    let locations = world.get_resource::<Locations>();
    let child = world
        .iter_entities()
        .filter_map(|entity| entity.get::<ChildRecord>())
        .find(|child| {
            child.days_old >= config.age_when_kids_are_modified
                && context.slots().slot_of(&child.name) == Some(slot)
        })?;
    let bed = locations
        .and_then(|l| l.get(&child.home))
        .and_then(|home| home.child_bed(slot));

    Some(LittleNpcInfo {
        identity: identity_name(slot, &child.name, session.player_id),
        display_name: child.name.clone(),
        gender: child.gender,
        birthday: birthday_for(clock.date, child.days_old),
        bed,
        age_years: child.age_in_years(),
        source: InfoSource::Child,
    })
}

fn from_save(world: &World, slot: ChildSlot) -> Option<LittleNpcInfo> {
    let snapshot = world.get_resource::<LoadedSave>()?.snapshot.as_ref()?;
    let threshold = world
        .get_resource::<LittleNpcConfig>()
        .map(|c| c.age_when_kids_are_modified)
        .unwrap_or_else(|| LittleNpcConfig::default().age_when_kids_are_modified);

    let convertible = snapshot.convertible_children(threshold);
    let mut slots = SlotAssignments::default();
    let by_age: Vec<(&str, u32)> = convertible
        .iter()
        .map(|c| (c.name.as_str(), c.days_old))
        .collect();
    slots.assign(&by_age);
    let child = convertible
        .into_iter()
        .find(|c| slots.slot_of(&c.name) == Some(slot))?;

    Some(LittleNpcInfo {
        identity: identity_name(slot, &child.name, snapshot.player_id),
        display_name: child.name.clone(),
        gender: child.gender,
        birthday: birthday_for(snapshot.date, child.days_old),
        bed: snapshot.child_beds.get(slot.index()).copied(),
        age_years: child.days_old / DAYS_PER_YEAR,
        source: InfoSource::SaveGame,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::SaveSnapshot;
    use crate::save::SavedChild;

    fn snapshot() -> SaveSnapshot {
        SaveSnapshot {
            version: 1,
            player_id: 5,
            date: GameDate::new(10, Season::Fall, 3),
            children: vec![
                SavedChild {
                    name: "Bo".into(),
                    gender: Gender::Male,
                    days_old: 100,
                    home: "FarmHouse".into(),
                },
                SavedChild {
                    name: "Lily Rose".into(),
                    gender: Gender::Female,
                    days_old: 250,
                    home: "FarmHouse".into(),
                },
            ],
            child_beds: vec![TilePoint::new(22, 4)],
        }
    }

    fn title_screen_world() -> World {
        let mut world = World::new();
        world.insert_resource(Session::default());
        world.insert_resource(LittleNpcConfig::default());
        world.insert_resource(LoadedSave {
            path: None,
            snapshot: Some(snapshot()),
        });
        world
    }

    #[test]
    fn test_tokens_from_save_when_world_not_ready() {
        let world = title_screen_world();

        let first = resolve_info(&world, ChildSlot::First).unwrap();
        assert_eq!(first.identity, "FirstLittleNPCLily_Rose5");
        assert_eq!(first.age_years, 2);
        assert_eq!(first.bed, Some(TilePoint::new(22, 4)));
        assert_eq!(first.source, InfoSource::SaveGame);

        let second = resolve_info(&world, ChildSlot::Second).unwrap();
        assert_eq!(second.display_name, "Bo");
        assert_eq!(second.bed, None);
        assert_eq!(second.birthday, GameDate::new(22, Season::Fall, 2));
    }

    #[test]
    fn test_no_save_means_no_tokens() {
        let mut world = title_screen_world();
        world.insert_resource(LoadedSave::default());
        assert!(resolve_info(&world, ChildSlot::First).is_none());
    }

    #[test]
    fn test_tokens_from_child_before_conversion() {
        let mut world = World::new();
        world.insert_resource(Session {
            world_ready: true,
            player_id: 9,
            ..Default::default()
        });
        world.insert_resource(LittleNpcConfig::default());
        world.insert_resource(GameClock::default());
        let mut context = LittleNpcSession::default();
        context.slots_mut().assign(&[("Bo", 90)]);
        world.insert_resource(context);
        world.spawn(ChildRecord {
            name: "Bo".into(),
            gender: Gender::Male,
            days_old: 90,
            hat: None,
            home: "FarmHouse".into(),
            invisible: true,
        });

        let info = resolve_info(&world, ChildSlot::First).unwrap();
        assert_eq!(info.identity, "FirstLittleNPCBo9");
        assert_eq!(info.source, InfoSource::Child);
        assert!(resolve_info(&world, ChildSlot::Second).is_none());
    }
}
