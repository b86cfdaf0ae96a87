use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use super::memory::CandidateStore;
use super::models::Candidate;
use super::{Result, StoreError};

/// Durable projection of the live interview session: which candidate and
/// question the countdown was bound to when the snapshot was taken. Whether
/// `time_remaining` is honored on resume is a policy decision made by the
/// orchestrator, not by this module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedInterview {
    pub candidate_id: Uuid,
    pub current_question_index: u32,
    pub time_remaining: u32,
}

/// On-disk layout. Only candidate records and the interview projection are
/// persisted; UI state (search, sort, selection) is ephemeral per session
/// and never part of the snapshot.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub interview: Option<PersistedInterview>,
}

pub fn save_snapshot(
    path: &Path,
    store: &CandidateStore,
    interview: Option<PersistedInterview>,
) -> Result<()> {
    let snapshot = Snapshot {
        candidates: store.list(),
        interview,
    };
    let body = serde_json::to_vec_pretty(&snapshot)
        .map_err(|e| StoreError::SnapshotWrite(e.to_string()))?;

    // Write-then-rename so a crash mid-write never truncates the snapshot.
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body).map_err(|e| StoreError::SnapshotWrite(e.to_string()))?;
    fs::rename(&tmp, path).map_err(|e| StoreError::SnapshotWrite(e.to_string()))?;

    info!("💾 Snapshot saved to {}", path.display());
    Ok(())
}

/// Loads a snapshot into the store. A missing file is a fresh start, not an
/// error; a corrupt file is.
pub fn load_snapshot(path: &Path, store: &CandidateStore) -> Result<Option<PersistedInterview>> {
    if !path.exists() {
        warn!("No snapshot at {}, starting fresh", path.display());
        return Ok(None);
    }
    let body = fs::read(path).map_err(|e| StoreError::SnapshotRead(e.to_string()))?;
    let snapshot: Snapshot =
        serde_json::from_slice(&body).map_err(|e| StoreError::SnapshotRead(e.to_string()))?;

    let count = snapshot.candidates.len();
    for candidate in snapshot.candidates {
        store.upsert(candidate);
    }
    info!("📂 Loaded {} candidate(s) from {}", count, path.display());
    Ok(snapshot.interview)
}
