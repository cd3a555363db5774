//! Read-only inspection of the host's save file.
//!
//! The host's save format is authoritative and LittleNPCs never writes to
//! it. When no world is loaded (title screen, loading) the token facility
//! answers from the snapshot read here.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SnapshotError;
use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// PUBLIC TYPES
// ═══════════════════════════════════════════════════════════════════════

pub const SNAPSHOT_VERSION: u32 = 1;

/// A child as it appears in the save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedChild {
    pub name: String,
    pub gender: Gender,
    pub days_old: u32,
    pub home: String,
}

/// The subset of a save file LittleNPCs reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveSnapshot {
    pub version: u32,
    pub player_id: u64,
    pub date: GameDate,
    #[serde(default)]
    pub children: Vec<SavedChild>,
    /// Bed tile per child slot in the farmer's home.
    #[serde(default)]
    pub child_beds: Vec<TilePoint>,
}

impl SaveSnapshot {
    pub fn from_json(text: &str, path: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(text).map_err(|source| SnapshotError::Parse {
            path: path.to_string(),
            source,
        })?;
        if snapshot.version != SNAPSHOT_VERSION {
            warn!(
                "[LittleNPCs] Save {} has version {} but {} is expected. Reading anyway.",
                path, snapshot.version, SNAPSHOT_VERSION
            );
        }
        Ok(snapshot)
    }

    /// Children at least `min_days_old` days old, oldest first.
    pub fn convertible_children(&self, min_days_old: u32) -> Vec<&SavedChild> {
        let mut children: Vec<&SavedChild> = self
            .children
            .iter()
            .filter(|c| c.days_old >= min_days_old)
            .collect();
        children.sort_by(|a, b| b.days_old.cmp(&a.days_old).then_with(|| a.name.cmp(&b.name)));
        children
    }
}

pub fn read_snapshot(path: &Path) -> Result<SaveSnapshot, SnapshotError> {
    let text = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.display().to_string(),
        source,
    })?;
    SaveSnapshot::from_json(&text, &path.display().to_string())
}

/// The save currently selected on the title screen, if any.
#[derive(Resource, Debug, Clone, Default)]
pub struct LoadedSave {
    pub path: Option<PathBuf>,
    pub snapshot: Option<SaveSnapshot>,
}

impl LoadedSave {
    /// Read the save at `path`. A missing or unreadable file leaves the
    /// snapshot empty and is logged, never propagated.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let snapshot = match read_snapshot(&path) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("[LittleNPCs] {}", e);
                None
            }
        };
        Self {
            path: Some(path),
            snapshot,
        }
    }
}
