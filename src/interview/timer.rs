use log::{info, warn};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

/// Serializable mirror of the live countdown, shaped for observer surfaces
/// and for the persisted interview projection. Ephemeral: the candidate
/// record store is the durable source of truth and wins on resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerState {
    pub is_active: bool,
    pub current_question_index: u32,
    pub time_remaining: u32,
    pub is_timer_running: bool,
}

impl TimerState {
    pub fn idle() -> Self {
        Self {
            is_active: false,
            current_question_index: 0,
            time_remaining: 0,
            is_timer_running: false,
        }
    }
}

/// Outcome of feeding one tick into the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No countdown bound to this candidate, or counting is halted.
    Idle,
    /// Countdown decremented; seconds remaining.
    Running(u32),
    /// The countdown just reached zero. Reported exactly once.
    TimeUp,
    /// Reached zero earlier but the auto-submission has not committed yet,
    /// so the initiating tick source should retry it.
    ExpiredPending,
}

#[derive(Debug, Clone)]
struct Binding {
    candidate_id: Uuid,
    question_index: u32,
    time_limit: u32,
    time_remaining: u32,
    is_running: bool,
    expired: bool,
}

/// Details of a countdown handed to the submission path. `time_remaining`
/// is preserved by `stop`, so `time_limit - time_remaining` is the elapsed
/// time; on the timeout path it is zero and the elapsed time equals the
/// full limit.
#[derive(Debug, Clone, Copy)]
pub struct BoundQuestion {
    pub question_index: u32,
    pub time_limit: u32,
    pub time_remaining: u32,
}

/// Per-question countdown. Cooperative and clock-free: one external tick
/// source (1 tick/second) drives it, and it counts for at most one question
/// at a time. All state here is a live projection; durable candidate data
/// is owned by the record store.
#[derive(Debug, Default)]
pub struct TimerController {
    binding: Option<Binding>,
}

impl TimerController {
    pub fn new() -> Self {
        Self { binding: None }
    }

    /// Binds the countdown to a question and starts counting from the full
    /// limit. The sequential flow guarantees any previous countdown has
    /// already been stopped or consumed; a still-running one is a
    /// programming error.
    pub fn start(&mut self, candidate_id: Uuid, question_index: u32, limit: u32) {
        debug_assert!(
            self.binding.as_ref().map_or(true, |b| !b.is_running),
            "timer started while already running for question {}",
            self.binding.as_ref().map(|b| b.question_index).unwrap_or(0),
        );
        info!(
            "⏱️ Timer started: question {} ({}s) for candidate {}",
            question_index + 1,
            limit,
            candidate_id
        );
        self.binding = Some(Binding {
            candidate_id,
            question_index,
            time_limit: limit,
            time_remaining: limit,
            is_running: true,
            expired: false,
        });
    }

    /// Like [`start`] but beginning from a restored remainder, used by the
    /// preserve-elapsed resume policy. Falls back to the full limit when
    /// the remainder is implausible (zero or above the limit).
    ///
    /// [`start`]: TimerController::start
    pub fn start_with_remaining(
        &mut self,
        candidate_id: Uuid,
        question_index: u32,
        limit: u32,
        remaining: u32,
    ) {
        self.start(candidate_id, question_index, limit);
        if remaining > 0 && remaining <= limit {
            if let Some(binding) = self.binding.as_mut() {
                binding.time_remaining = remaining;
            }
        } else {
            warn!(
                "Restored remainder {}s out of range for a {}s question, restarting full",
                remaining, limit
            );
        }
    }

    /// Feeds one tick. Decrements only while running; reports expiry once
    /// and then `ExpiredPending` until the binding is consumed.
    pub fn tick(&mut self, candidate_id: &Uuid) -> Tick {
        let Some(binding) = self.binding.as_mut() else {
            return Tick::Idle;
        };
        if binding.candidate_id != *candidate_id {
            return Tick::Idle;
        }
        if !binding.is_running {
            return if binding.expired { Tick::ExpiredPending } else { Tick::Idle };
        }

        binding.time_remaining = binding.time_remaining.saturating_sub(1);
        if binding.time_remaining == 0 {
            binding.is_running = false;
            binding.expired = true;
            info!("⏰ Time up on question {}", binding.question_index + 1);
            Tick::TimeUp
        } else {
            Tick::Running(binding.time_remaining)
        }
    }

    /// The candidate and question the countdown is currently bound to,
    /// regardless of whether it is still counting. Feeds the persisted
    /// interview projection.
    pub fn active(&self) -> Option<(Uuid, BoundQuestion)> {
        self.binding.as_ref().map(|b| {
            (
                b.candidate_id,
                BoundQuestion {
                    question_index: b.question_index,
                    time_limit: b.time_limit,
                    time_remaining: b.time_remaining,
                },
            )
        })
    }

    /// The countdown bound to this candidate, if any. Used as the stale
    /// guard: a submission whose bound index no longer matches the
    /// candidate record is a no-op.
    pub fn bound(&self, candidate_id: &Uuid) -> Option<BoundQuestion> {
        self.binding
            .as_ref()
            .filter(|b| b.candidate_id == *candidate_id)
            .map(|b| BoundQuestion {
                question_index: b.question_index,
                time_limit: b.time_limit,
                time_remaining: b.time_remaining,
            })
    }

    /// Halts counting without clearing `time_remaining`, so the elapsed
    /// time computation stays valid for the submission about to happen.
    pub fn stop(&mut self) {
        if let Some(binding) = self.binding.as_mut() {
            binding.is_running = false;
        }
    }

    /// Restarts counting after an aborted submission. An expired countdown
    /// stays expired; the pending auto-submission is retried instead.
    pub fn resume(&mut self) {
        if let Some(binding) = self.binding.as_mut() {
            if !binding.expired {
                binding.is_running = true;
            }
        }
    }

    /// Consumes the binding once a submission for it has committed. The
    /// first of a timeout/manual race to reach this point wins; the second
    /// finds nothing and becomes a no-op.
    pub fn consume(&mut self, candidate_id: &Uuid, question_index: u32) -> Option<BoundQuestion> {
        match self.binding.as_ref() {
            Some(b) if b.candidate_id == *candidate_id && b.question_index == question_index => {
                let bound = BoundQuestion {
                    question_index: b.question_index,
                    time_limit: b.time_limit,
                    time_remaining: b.time_remaining,
                };
                self.binding = None;
                Some(bound)
            }
            _ => None,
        }
    }

    pub fn state(&self) -> TimerState {
        match self.binding.as_ref() {
            Some(b) => TimerState {
                is_active: true,
                current_question_index: b.question_index,
                time_remaining: b.time_remaining,
                is_timer_running: b.is_running,
            },
            None => TimerState::idle(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_and_reports_time_up_once() {
        let id = Uuid::new_v4();
        let mut timer = TimerController::new();
        timer.start(id, 0, 3);

        assert_eq!(timer.tick(&id), Tick::Running(2));
        assert_eq!(timer.tick(&id), Tick::Running(1));
        assert_eq!(timer.tick(&id), Tick::TimeUp);
        assert_eq!(timer.tick(&id), Tick::ExpiredPending);
        assert_eq!(timer.state().time_remaining, 0);
        assert!(!timer.state().is_timer_running);
    }

    #[test]
    fn stop_preserves_remaining_for_elapsed_computation() {
        let id = Uuid::new_v4();
        let mut timer = TimerController::new();
        timer.start(id, 2, 90);
        timer.tick(&id);
        timer.tick(&id);
        timer.stop();

        let bound = timer.bound(&id).unwrap();
        assert_eq!(bound.time_remaining, 88);
        assert_eq!(bound.time_limit - bound.time_remaining, 2);
        assert_eq!(timer.tick(&id), Tick::Idle);
    }

    #[test]
    fn consume_is_first_wins() {
        let id = Uuid::new_v4();
        let mut timer = TimerController::new();
        timer.start(id, 1, 30);
        timer.stop();

        assert!(timer.consume(&id, 1).is_some());
        assert!(timer.consume(&id, 1).is_none());
        assert_eq!(timer.tick(&id), Tick::Idle);
    }

    #[test]
    fn consume_requires_matching_index() {
        let id = Uuid::new_v4();
        let mut timer = TimerController::new();
        timer.start(id, 1, 30);
        assert!(timer.consume(&id, 0).is_none());
        assert!(timer.bound(&id).is_some());
    }

    #[test]
    fn ticks_for_other_candidates_are_ignored() {
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut timer = TimerController::new();
        timer.start(id, 0, 30);
        assert_eq!(timer.tick(&other), Tick::Idle);
        assert_eq!(timer.state().time_remaining, 30);
    }

    #[test]
    fn resume_does_not_revive_an_expired_countdown() {
        let id = Uuid::new_v4();
        let mut timer = TimerController::new();
        timer.start(id, 0, 1);
        assert_eq!(timer.tick(&id), Tick::TimeUp);
        timer.resume();
        assert_eq!(timer.tick(&id), Tick::ExpiredPending);
    }

    #[test]
    fn restored_remainder_is_validated() {
        let id = Uuid::new_v4();
        let mut timer = TimerController::new();
        timer.start_with_remaining(id, 3, 90, 41);
        assert_eq!(timer.state().time_remaining, 41);

        let mut timer = TimerController::new();
        timer.start_with_remaining(id, 3, 90, 400);
        assert_eq!(timer.state().time_remaining, 90);
    }
}
