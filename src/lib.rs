//! Chrono Interviewer - timed AI-powered technical interview orchestrator.
//!
//! The library runs a six-question interview (2 easy, 2 medium, 2 hard)
//! with per-question countdowns, auto-submission on expiry, AI-backed
//! scoring and a final evaluation. The [`interview::InterviewEngine`]
//! coordinates the candidate record store, the question sequencer, the
//! timer controller, the AI gateway and the tab sync broadcaster; the
//! record store is the single source of truth throughout.

pub mod ai;
pub mod conf;
pub mod interview;
pub mod resume;
pub mod store;
pub mod sync;

pub use conf::{ResumePolicy, Settings};
pub use interview::{InterviewEngine, InterviewError};
