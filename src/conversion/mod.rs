//! Conversion domain plugin: the daily child → LittleNPC cycle.
//!
//! Day start hides every convertible child and schedules the conversion a
//! few one-second ticks later, once the host has finished loading. Pre-save
//! and return-to-title undo everything, so nothing but the child records
//! ever reaches a save.

use bevy::prelude::*;
use crate::config::LittleNpcConfig;
use crate::npcs::actor::{ActorCategory, LittleNpc, Pathing, ScheduleState};
use crate::npcs::curfew::CurfewWander;
use crate::shared::*;

pub mod hooks;
pub mod registry;
pub mod session;
pub mod tokens;

use hooks::{filter_social_listing, SocialListing};
use registry::RegisteredActor;
use session::{LittleNpcSession, MappingEntry, PendingConversion};

pub struct ConversionPlugin;

impl Plugin for ConversionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LittleNpcSession>()
            .init_resource::<SocialListing>();

        app.add_systems(
            Update,
            (
                // Undo first: a save and a new day can land in one frame
                revert_conversions,
                start_day,
                tick_conversion,
                rehide_on_warp,
                filter_social_listing,
            )
                .chain()
                .in_set(LittleNpcSet::Lifecycle),
        );
    }
}

/// Host children that may be hidden or converted, but never actors.
type ChildQuery<'w, 's> = Query<
    'w,
    's,
    (Entity, &'static mut ChildRecord, &'static mut Placement),
    Without<LittleNpc>,
>;

type ActorQuery<'w, 's> = Query<'w, 's, &'static LittleNpc, Without<ChildRecord>>;

/// Give every child back what its actor borrowed and remove the actors.
/// Failures are logged and skipped; this runs right before a save and
/// must never stop it.
fn revert_entries(
    entries: Vec<(ChildSlot, MappingEntry)>,
    children: &mut ChildQuery,
    actors: &ActorQuery,
    commands: &mut Commands,
    friendships: &mut Friendships,
    locations: &mut Locations,
    tag: &str,
) {
    for (slot, entry) in entries {
        let actor = actors.get(entry.actor).ok();
        match children.get_mut(entry.child) {
            Ok((_, mut child, _)) => {
                match actor {
                    Some(npc) => {
                        child.hat = npc.hat.clone();
                        friendships.migrate(&npc.identity, &child.name);
                    }
                    None => warn!(
                        "[LittleNPCs/{}] Actor for slot {} is gone; {} keeps no hat",
                        tag, slot, child.name
                    ),
                }
                child.invisible = false;
            }
            Err(_) => warn!(
                "[LittleNPCs/{}] Child for slot {} no longer exists",
                tag, slot
            ),
        }

        match locations.remove_character(entry.actor) {
            Some(location) => debug!(
                "[LittleNPCs/{}] Removed slot {} actor from {}",
                tag, slot, location
            ),
            None => error!(
                "[LittleNPCs/{}] Slot {} actor was not found in any location",
                tag, slot
            ),
        }
        if let Some(mut entity) = commands.get_entity(entry.actor) {
            entity.despawn();
        }
    }
}

/// System: reverse every conversion before a save or on return to title.
#[allow(clippy::too_many_arguments)]
pub fn revert_conversions(
    mut pre_save: EventReader<PreSaveEvent>,
    mut to_title: EventReader<ReturnedToTitleEvent>,
    session: Res<Session>,
    mut context: ResMut<LittleNpcSession>,
    mut locations: ResMut<Locations>,
    mut friendships: ResMut<Friendships>,
    mut commands: Commands,
    mut children: ChildQuery,
    actors: ActorQuery,
) {
    let saving = pre_save.read().count() > 0;
    let leaving = to_title.read().count() > 0;
    if !saving && !leaving {
        return;
    }
    let tag = session.role.tag();

    let pending: Vec<PendingConversion> = context.pending().to_vec();
    for hidden in &pending {
        if let Ok((_, mut child, _)) = children.get_mut(hidden.child) {
            child.invisible = false;
        }
    }

    let entries = context.begin_revert();
    let reverted = entries.len();
    revert_entries(
        entries,
        &mut children,
        &actors,
        &mut commands,
        &mut friendships,
        &mut locations,
        tag,
    );

    if leaving {
        context.end_session();
    } else {
        context.finish_revert();
    }
    info!(
        "[LittleNPCs/{}] {}: reverted {} actor(s), mapping cleared",
        tag,
        if leaving { "Return to title" } else { "Pre-save" },
        reverted
    );
}

/// System: hide every convertible child and start the conversion delay.
#[allow(clippy::too_many_arguments)]
pub fn start_day(
    mut day_started: EventReader<DayStartedEvent>,
    session: Res<Session>,
    config: Res<LittleNpcConfig>,
    mut context: ResMut<LittleNpcSession>,
    mut locations: ResMut<Locations>,
    mut friendships: ResMut<Friendships>,
    mut rng: ResMut<HomeRng>,
    mut commands: Commands,
    mut children: ChildQuery,
    actors: ActorQuery,
) {
    if day_started.read().count() == 0 || !session.role.is_host() {
        return;
    }
    let tag = session.role.tag();

    if !context.mapping().is_empty() {
        error!(
            "[LittleNPCs/{}] {} conversion(s) leaked from the previous day; clearing",
            tag,
            context.mapping().len()
        );
        let leaked = context.begin_revert();
        revert_entries(
            leaked,
            &mut children,
            &actors,
            &mut commands,
            &mut friendships,
            &mut locations,
            tag,
        );
    }
    context.finish_revert();

    let Some(home) = locations.home_of(session.player_id) else {
        warn!("[LittleNPCs/{}] Farmer {} has no home", tag, session.player_id);
        return;
    };

    let candidates: Vec<(Entity, String, u32)> = children
        .iter()
        .filter(|(_, child, _)| {
            child.home == home.name && child.days_old >= config.age_when_kids_are_modified
        })
        .map(|(entity, child, _)| (entity, child.name.clone(), child.days_old))
        .collect();
    let by_age: Vec<(&str, u32)> = candidates
        .iter()
        .map(|(_, name, days)| (name.as_str(), *days))
        .collect();
    for name in context.slots_mut().assign(&by_age) {
        info!(
            "[LittleNPCs/{}] {} is convertible but both slots are taken; skipped",
            tag, name
        );
    }

    let mut pending = Vec::new();
    for (entity, name, _) in &candidates {
        let Some(slot) = context.slots().slot_of(name) else {
            continue;
        };
        let bed = match home.child_bed(slot) {
            Some(bed) => bed,
            None => match home.random_open_point(&mut rng.0) {
                Some(tile) => {
                    warn!(
                        "[LittleNPCs/{}] No bed for slot {} in {}; {} sleeps at {}",
                        tag, slot, home.name, name, tile
                    );
                    tile
                }
                None => {
                    warn!(
                        "[LittleNPCs/{}] No bed or open floor for {} in {}; not converted",
                        tag, name, home.name
                    );
                    continue;
                }
            },
        };
        if let Ok((_, mut child, mut placement)) = children.get_mut(*entity) {
            *placement = Placement::new(home.name.clone(), bed);
            child.invisible = true;
        }
        pending.push(PendingConversion {
            slot,
            child: *entity,
            bed,
        });
    }
    pending.sort_by_key(|p| p.slot);

    info!(
        "[LittleNPCs/{}] Day start: {} child(ren) hidden until conversion",
        tag,
        pending.len()
    );
    context.begin_day(pending, config.conversion_delay_ticks);
}

/// System: after the delay, turn each hidden child into a live actor.
#[allow(clippy::too_many_arguments)]
pub fn tick_conversion(
    mut ticks: EventReader<OneSecondTickEvent>,
    session: Res<Session>,
    clock: Res<GameClock>,
    mut context: ResMut<LittleNpcSession>,
    mut locations: ResMut<Locations>,
    mut friendships: ResMut<Friendships>,
    mut commands: Commands,
    mut children: ChildQuery,
    actors: ActorQuery,
    mut converted: EventWriter<ActorConvertedEvent>,
) {
    if !session.role.is_host() {
        ticks.clear();
        return;
    }
    let tag = session.role.tag();

    for _ in ticks.read() {
        if !context.tick() {
            continue;
        }

        if !context.mapping().is_empty() {
            error!(
                "[LittleNPCs/{}] Mapping not empty before conversion; clearing leaked entries",
                tag
            );
            let leaked = context.begin_revert();
            revert_entries(
                leaked,
                &mut children,
                &actors,
                &mut commands,
                &mut friendships,
                &mut locations,
                tag,
            );
        }

        for pending in context.take_pending() {
            let Ok((_, mut child, _)) = children.get_mut(pending.child) else {
                warn!(
                    "[LittleNPCs/{}] Child for slot {} vanished before conversion",
                    tag, pending.slot
                );
                continue;
            };
            let npc = LittleNpc::from_child(
                pending.slot,
                &child,
                pending.bed,
                session.player_id,
                clock.date,
            );
            child.hat = None;
            if friendships.migrate(&child.name, &npc.identity) {
                debug!(
                    "[LittleNPCs/{}] Friendship moved {} -> {}",
                    tag, child.name, npc.identity
                );
            }

            let identity = npc.identity.clone();
            let display_name = npc.display_name.clone();
            let home = npc.home.clone();
            let actor = commands
                .spawn((
                    Placement::new(home.clone(), pending.bed),
                    ActorCategory::LittleNpc,
                    ScheduleState::default(),
                    Pathing::default(),
                    CurfewWander::default(),
                    npc,
                ))
                .id();

            let entry = MappingEntry {
                actor,
                child: pending.child,
            };
            let registered = RegisteredActor {
                entity: actor,
                identity,
                display_name,
            };
            if !context.record(pending.slot, entry, registered) {
                error!(
                    "[LittleNPCs/{}] Slot {} is already mapped; dropping duplicate actor",
                    tag, pending.slot
                );
                commands.entity(actor).despawn();
                continue;
            }
            if !locations.place_character(actor, &home) {
                warn!("[LittleNPCs/{}] Home {} is not loaded", tag, home);
            }
            info!(
                "[LittleNPCs/{}] Converted {} into slot {} actor",
                tag, child.name, pending.slot
            );
            converted.send(ActorConvertedEvent {
                slot: pending.slot,
                actor,
            });
        }
        context.mark_converted();
    }
}

/// System: the host re-shows children when a location loads; hide tracked
/// ones again when the player walks in.
pub fn rehide_on_warp(
    mut warps: EventReader<PlayerWarpedEvent>,
    session: Res<Session>,
    context: Res<LittleNpcSession>,
    mut children: ChildQuery,
) {
    for warp in warps.read() {
        for (entity, mut child, placement) in children.iter_mut() {
            if placement.location == warp.location
                && context.is_tracking_child(entity)
                && !child.invisible
            {
                child.invisible = true;
                debug!(
                    "[LittleNPCs/{}] Re-hid {} in {}",
                    session.role.tag(),
                    child.name,
                    warp.location
                );
            }
        }
    }
}
