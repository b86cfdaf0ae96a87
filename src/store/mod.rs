pub mod models;
pub mod memory;
pub mod persist;

pub use models::{Candidate, CandidateStatus, Difficulty, Message, Question, Role, QUESTION_COUNT};
pub use memory::{CandidateStore, StoreSubscription};
pub use persist::{load_snapshot, save_snapshot, PersistedInterview, Snapshot};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Candidate not found: {0}")]
    CandidateNotFound(String),
    #[error("Snapshot read failed: {0}")]
    SnapshotRead(String),
    #[error("Snapshot write failed: {0}")]
    SnapshotWrite(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
