//! Replication domain plugin: host → follower actor definitions.
//!
//! The host encodes one `TransferPayload` per actor per day and emits it as an
//! `ActorDefinedEvent`. Every process, the host included, runs the apply
//! handler; a digest of the last applied bytes makes repeated delivery a
//! no-op, so late-join replays are safe.

use bevy::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::{Hash, Hasher};

use crate::npcs::actor::LittleNpc;
use crate::shared::*;

pub mod assets;
pub mod payload;

use assets::{AssetCache, CachedAssets, ContentLibrary};
use payload::{Disposition, NpcDefinition, NpcDefinitions, TransferPayload};

pub struct ReplicationPlugin;

impl Plugin for ReplicationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ReplicationState>()
            .init_resource::<NpcDefinitions>()
            .init_resource::<AssetCache>()
            .init_resource::<ContentLibrary>();

        app.add_systems(
            Update,
            (
                reset_replication_day,
                send_actor_definitions,
                replay_for_late_joiners,
                apply_actor_definitions,
            )
                .chain()
                .in_set(LittleNpcSet::Replication),
        );
    }
}

/// Per-day replication bookkeeping.
#[derive(Resource, Debug, Default)]
pub struct ReplicationState {
    /// Host: identities whose payload went out today.
    sent_today: HashSet<String>,
    /// Host: today's encoded payloads, kept for followers that join late.
    retained: BTreeMap<String, Vec<u8>>,
    /// Every process: digest of the last payload applied per identity.
    applied: HashMap<String, u64>,
}

impl ReplicationState {
    pub fn retained(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.retained
            .iter()
            .map(|(identity, bytes)| (identity.as_str(), bytes.as_slice()))
    }

    pub fn was_sent(&self, identity: &str) -> bool {
        self.sent_today.contains(identity)
    }

    fn reset(&mut self) {
        self.sent_today.clear();
        self.retained.clear();
        self.applied.clear();
    }
}

fn digest(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

/// What applying a payload did to local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Registered,
    Updated,
    Unchanged,
}

/// Build the payload the host ships for `npc`. Without installed content the
/// appearance is empty and the actor has no schedule.
pub fn build_payload(npc: &LittleNpc, content: &ContentLibrary) -> TransferPayload {
    let authored = content.content_for(&npc.identity);
    TransferPayload {
        identity: npc.identity.clone(),
        disposition: Disposition::for_actor(npc),
        schedule_source: authored.and_then(|c| c.schedule.clone()),
        appearance: authored.map(|c| c.appearance.clone()).unwrap_or_default(),
        dialogue: authored.map(|c| c.dialogue.clone()).unwrap_or_default(),
    }
}

/// Register or update the local definition and cache the assets.
pub fn apply_payload(
    definitions: &mut NpcDefinitions,
    cache: &mut AssetCache,
    payload: &TransferPayload,
) -> ApplyOutcome {
    let outcome = match definitions.get_mut(&payload.identity) {
        Some(existing) => {
            if existing.apply_disposition(&payload.disposition) {
                ApplyOutcome::Updated
            } else {
                ApplyOutcome::Unchanged
            }
        }
        None => {
            definitions.insert(
                payload.identity.clone(),
                NpcDefinition::from_disposition(&payload.disposition),
            );
            ApplyOutcome::Registered
        }
    };

    let assets_changed = cache.store(
        &payload.identity,
        CachedAssets {
            appearance: payload.appearance.clone(),
            dialogue: payload.dialogue.clone(),
        },
    );
    if outcome == ApplyOutcome::Unchanged && assets_changed {
        ApplyOutcome::Updated
    } else {
        outcome
    }
}

/// Host system: encode and emit the definition of each newly converted actor,
/// once per identity per day.
pub fn send_actor_definitions(
    session: Res<Session>,
    content: Res<ContentLibrary>,
    mut state: ResMut<ReplicationState>,
    mut converted: EventReader<ActorConvertedEvent>,
    actors: Query<&LittleNpc>,
    mut defined: EventWriter<ActorDefinedEvent>,
) {
    if !session.role.is_host() {
        converted.clear();
        return;
    }
    let tag = session.role.tag();

    for event in converted.read() {
        let Ok(npc) = actors.get(event.actor) else {
            warn!(
                "[LittleNPCs/{}] Slot {} actor vanished before its definition was sent",
                tag, event.slot
            );
            continue;
        };
        if state.sent_today.contains(&npc.identity) {
            continue;
        }

        let payload = build_payload(npc, &content);
        if payload.appearance.is_empty() {
            debug!(
                "[LittleNPCs/{}] No appearance content for {}; followers use placeholders",
                tag, npc.identity
            );
        }
        let bytes = match payload.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("[LittleNPCs/{}] {}", tag, e);
                continue;
            }
        };

        info!(
            "[LittleNPCs/{}] Sending definition for {} ({} bytes)",
            tag,
            npc.identity,
            bytes.len()
        );
        state.sent_today.insert(npc.identity.clone());
        state.retained.insert(npc.identity.clone(), bytes.clone());
        defined.send(ActorDefinedEvent {
            identity: npc.identity.clone(),
            payload: bytes,
        });
    }
}

/// Host system: re-emit today's definitions when a follower joins.
pub fn replay_for_late_joiners(
    session: Res<Session>,
    state: Res<ReplicationState>,
    mut joined: EventReader<FollowerJoinedEvent>,
    mut defined: EventWriter<ActorDefinedEvent>,
) {
    if !session.role.is_host() {
        joined.clear();
        return;
    }
    for event in joined.read() {
        if state.retained.is_empty() {
            continue;
        }
        info!(
            "[LittleNPCs/{}] Follower {} joined; replaying {} definition(s)",
            session.role.tag(),
            event.peer,
            state.retained.len()
        );
        for (identity, bytes) in state.retained() {
            defined.send(ActorDefinedEvent {
                identity: identity.to_string(),
                payload: bytes.to_vec(),
            });
        }
    }
}

/// System (every process): apply received definitions exactly once each.
pub fn apply_actor_definitions(
    session: Res<Session>,
    mut state: ResMut<ReplicationState>,
    mut definitions: ResMut<NpcDefinitions>,
    mut cache: ResMut<AssetCache>,
    mut defined: EventReader<ActorDefinedEvent>,
    mut applied: EventWriter<ActorDefinitionAppliedEvent>,
) {
    let tag = session.role.tag();

    for event in defined.read() {
        let hash = digest(&event.payload);
        if state.applied.get(&event.identity) == Some(&hash) {
            debug!(
                "[LittleNPCs/{}] Definition for {} already applied",
                tag, event.identity
            );
            continue;
        }

        let payload = match TransferPayload::decode(&event.identity, &event.payload) {
            Ok(payload) => payload,
            Err(e) => {
                error!("[LittleNPCs/{}] Skipping definition: {}", tag, e);
                continue;
            }
        };

        let outcome = apply_payload(&mut definitions, &mut cache, &payload);
        info!(
            "[LittleNPCs/{}] Applied definition for {}: {:?}",
            tag, payload.identity, outcome
        );
        state.applied.insert(payload.identity.clone(), hash);
        applied.send(ActorDefinitionAppliedEvent {
            identity: payload.identity,
            schedule_source: payload.schedule_source,
        });
    }
}

/// System: a new day, a save, or a return to title ends the replication day.
pub fn reset_replication_day(
    mut day_started: EventReader<DayStartedEvent>,
    mut pre_save: EventReader<PreSaveEvent>,
    mut to_title: EventReader<ReturnedToTitleEvent>,
    mut state: ResMut<ReplicationState>,
) {
    let starting = day_started.read().count() > 0;
    let saving = pre_save.read().count() > 0;
    let leaving = to_title.read().count() > 0;
    if starting || saving || leaving {
        state.reset();
    }
}
