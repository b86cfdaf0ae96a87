pub mod engine;
pub mod questions;
pub mod answers;
pub mod timer;

pub use engine::InterviewEngine;
pub use questions::{difficulty_for_index, missing_field_prompt, missing_fields, Field};
pub use answers::{AnswerSubmission, SubmissionOrigin, NO_ANSWER_SENTINEL};
pub use timer::{Tick, TimerController, TimerState};

use thiserror::Error;

use crate::ai::AiError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum InterviewError {
    /// Rejected input; no state was mutated.
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Candidate not found: {0}")]
    CandidateNotFound(String),
    /// Transport failure talking to the generation backend. The current
    /// step was aborted with durable state unchanged; safe to retry.
    #[error("Generation backend unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Store failure: {0}")]
    Store(String),
}

impl From<AiError> for InterviewError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::Service(msg) => InterviewError::ServiceUnavailable(msg),
        }
    }
}

impl From<StoreError> for InterviewError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CandidateNotFound(id) => InterviewError::CandidateNotFound(id),
            other => InterviewError::Store(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, InterviewError>;
