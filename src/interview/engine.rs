use std::collections::HashMap;
use std::sync::Arc;

use log::{info, warn};
use parking_lot::Mutex;
use uuid::Uuid;
use validator::validate_email;

use crate::ai::{AiGateway, TextGenerator};
use crate::conf::ResumePolicy;
use crate::resume::ExtractedResume;
use crate::store::{
    Candidate, CandidateStatus, CandidateStore, Message, PersistedInterview, QUESTION_COUNT,
};
use crate::sync::TabSync;

use super::answers::{AnswerSubmission, SubmissionOrigin};
use super::questions::{
    build_question, difficulty_for_index, missing_field_prompt, missing_fields, question_marker,
    Field,
};
use super::timer::{Tick, TimerController, TimerState};
use super::{InterviewError, Result};

const INTRO_MESSAGE: &str = "Great! Let's begin your Full Stack (React/Node) interview. \
     You'll answer 6 questions: 2 Easy, 2 Medium, and 2 Hard. \
     Each question has a time limit. Good luck!";

const ANSWER_RECORDED_MESSAGE: &str = "Answer recorded. Moving to the next question...";

const TIME_UP_MESSAGE: &str = "Time's up! Submitting your answer...";

/// The interview session orchestrator. Owns the countdown, the answer
/// drafts and the broadcast hints; the candidate record store remains the
/// single source of truth for everything durable.
///
/// All mutating operations are serialized through one gate, so a timer
/// expiry and a manual submission racing for the same question funnel into
/// the same path and the first to run wins - the loser finds the countdown
/// already consumed and becomes a no-op.
pub struct InterviewEngine<G> {
    store: Arc<CandidateStore>,
    gateway: AiGateway<G>,
    sync: Arc<TabSync>,
    timer: Mutex<TimerController>,
    drafts: Mutex<HashMap<Uuid, String>>,
    resume_policy: ResumePolicy,
    restored: Mutex<Option<PersistedInterview>>,
    ops: tokio::sync::Mutex<()>,
}

impl<G: TextGenerator> InterviewEngine<G> {
    pub fn new(
        store: Arc<CandidateStore>,
        gateway: AiGateway<G>,
        sync: Arc<TabSync>,
        resume_policy: ResumePolicy,
    ) -> Self {
        Self {
            store,
            gateway,
            sync,
            timer: Mutex::new(TimerController::new()),
            drafts: Mutex::new(HashMap::new()),
            resume_policy,
            restored: Mutex::new(None),
            ops: tokio::sync::Mutex::new(()),
        }
    }

    /// Feeds the interview projection loaded from a snapshot. Only the
    /// preserve-elapsed policy reads it; under restart-full the durable
    /// candidate record alone decides what resumes.
    pub fn with_restored_interview(self, restored: Option<PersistedInterview>) -> Self {
        *self.restored.lock() = restored;
        self
    }

    /// Creates a candidate from an extracted resume. Pre-filled contact
    /// fields come from the extractor; if any are missing the candidate
    /// enters info collection, otherwise the interview begins immediately.
    pub async fn register_candidate(&self, resume: ExtractedResume) -> Result<Candidate> {
        let _guard = self.ops.lock().await;

        let mut candidate = Candidate::new(resume.text);
        candidate.name = resume.name.unwrap_or_default();
        candidate.email = resume.email.unwrap_or_default();
        candidate.phone = resume.phone.unwrap_or_default();
        let candidate_id = candidate.id;

        let missing = missing_fields(&candidate);
        if !missing.is_empty() {
            candidate
                .messages
                .push(Message::assistant(missing_field_prompt(&missing)));
        }
        info!(
            "🎬 Registered candidate {} ({} field(s) missing)",
            candidate_id,
            missing.len()
        );
        self.store.upsert(candidate);
        self.sync.candidate_update(&candidate_id);

        if missing.is_empty() {
            self.begin_interview(&candidate_id).await
        } else {
            Ok(self.store.get(&candidate_id)?)
        }
    }

    /// Records one collected contact field. Each completion re-evaluates
    /// the missing set: while fields remain the next prompt is appended;
    /// once the set is empty the interview transitions to in-progress and
    /// question 1 is requested.
    pub async fn collect_field(
        &self,
        candidate_id: &Uuid,
        field: Field,
        value: &str,
    ) -> Result<Candidate> {
        let _guard = self.ops.lock().await;

        let candidate = self.store.get(candidate_id)?;
        if candidate.status != CandidateStatus::InfoCollection {
            return Err(InterviewError::Validation(
                "Candidate is not collecting info".to_string(),
            ));
        }

        let value = value.trim().to_string();
        validate_field(field, &value)?;

        let snapshot = self.store.update(candidate_id, |c| {
            match field {
                Field::Name => c.name = value.clone(),
                Field::Email => c.email = value.clone(),
                Field::Phone => c.phone = value.clone(),
            }
            c.messages.push(Message::user(value.clone()));
        })?;
        self.sync.candidate_update(candidate_id);

        let missing = missing_fields(&snapshot);
        if missing.is_empty() {
            return self.begin_interview(candidate_id).await;
        }

        let prompt = missing_field_prompt(&missing);
        let snapshot = self.store.update(candidate_id, |c| {
            c.messages.push(Message::assistant(prompt.clone()));
        })?;
        if let Some(message) = snapshot.messages.last() {
            self.sync.new_message(candidate_id, message);
        }
        Ok(snapshot)
    }

    /// Starts - or resumes - the interview. Covers the welcome-back flow
    /// and every retry case: transition from completed info collection,
    /// re-request of a question whose generation failed, restart of the
    /// countdown for a live question, and re-run of a failed summary.
    pub async fn start_interview(&self, candidate_id: &Uuid) -> Result<Candidate> {
        let _guard = self.ops.lock().await;

        let candidate = self.store.get(candidate_id)?;
        match candidate.status {
            CandidateStatus::InfoCollection => {
                let missing = missing_fields(&candidate);
                if missing.is_empty() {
                    self.begin_interview(candidate_id).await
                } else {
                    let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
                    Err(InterviewError::Validation(format!(
                        "Missing candidate fields: {}",
                        names.join(", ")
                    )))
                }
            }
            CandidateStatus::Completed => Err(InterviewError::Validation(
                "Interview already completed".to_string(),
            )),
            CandidateStatus::InProgress => {
                let index = candidate.current_question_index as usize;
                if index >= QUESTION_COUNT {
                    self.finalize_interview(candidate_id).await
                } else if candidate.questions.len() == index {
                    self.ask_next_question(candidate_id).await
                } else {
                    self.restart_timer_for(&candidate);
                    Ok(candidate)
                }
            }
        }
    }

    /// Manual submission of the current answer.
    pub async fn submit_answer(&self, candidate_id: &Uuid, answer_text: &str) -> Result<Candidate> {
        let _guard = self.ops.lock().await;
        self.submit_internal(candidate_id, AnswerSubmission::manual(answer_text))
            .await
    }

    /// Feeds one second of wall-clock time into the session. On expiry the
    /// current draft (or the no-answer sentinel) is auto-submitted through
    /// the same path as a manual submission; if that submission fails with
    /// a transport error the next tick retries it.
    pub async fn on_tick(&self, candidate_id: &Uuid) -> Result<Candidate> {
        let _guard = self.ops.lock().await;

        let outcome = self.timer.lock().tick(candidate_id);
        match outcome {
            Tick::Idle => Ok(self.store.get(candidate_id)?),
            Tick::Running(_) => {
                self.sync.interview_state(&self.timer.lock().state());
                Ok(self.store.get(candidate_id)?)
            }
            Tick::TimeUp => {
                let snapshot = self.store.update(candidate_id, |c| {
                    c.messages.push(Message::system(TIME_UP_MESSAGE));
                })?;
                if let Some(message) = snapshot.messages.last() {
                    self.sync.new_message(candidate_id, message);
                }
                self.auto_submit(candidate_id).await
            }
            Tick::ExpiredPending => self.auto_submit(candidate_id).await,
        }
    }

    /// Updates the candidate's in-progress answer text. The buffer is
    /// ephemeral; the timeout path consumes it.
    pub fn update_draft(&self, candidate_id: &Uuid, text: &str) {
        self.drafts
            .lock()
            .insert(*candidate_id, text.to_string());
    }

    pub fn candidate(&self, candidate_id: &Uuid) -> Result<Candidate> {
        Ok(self.store.get(candidate_id)?)
    }

    pub fn candidates(&self) -> Vec<Candidate> {
        self.store.list()
    }

    /// Non-terminal sessions, newest first - the welcome-back list.
    pub fn unfinished(&self) -> Vec<Candidate> {
        self.store
            .list()
            .into_iter()
            .filter(|c| !c.is_completed())
            .collect()
    }

    pub fn timer_state(&self) -> TimerState {
        self.timer.lock().state()
    }

    /// Durable projection of the live countdown for snapshotting.
    pub fn interview_projection(&self) -> Option<PersistedInterview> {
        self.timer.lock().active().map(|(candidate_id, bound)| PersistedInterview {
            candidate_id,
            current_question_index: bound.question_index,
            time_remaining: bound.time_remaining,
        })
    }

    // ---- internal steps (operation gate held by the public entry point) ----

    async fn begin_interview(&self, candidate_id: &Uuid) -> Result<Candidate> {
        let snapshot = self.store.update(candidate_id, |c| {
            c.status = CandidateStatus::InProgress;
            c.messages.push(Message::assistant(INTRO_MESSAGE));
        })?;
        info!("🚀 Interview started for candidate {}", candidate_id);
        self.sync.candidate_update(candidate_id);
        if let Some(message) = snapshot.messages.last() {
            self.sync.new_message(candidate_id, message);
        }
        self.ask_next_question(candidate_id).await
    }

    async fn ask_next_question(&self, candidate_id: &Uuid) -> Result<Candidate> {
        let candidate = self.store.get(candidate_id)?;
        let index = candidate.current_question_index;
        debug_assert!(
            (index as usize) < QUESTION_COUNT,
            "asked for question {} of {}",
            index + 1,
            QUESTION_COUNT
        );
        debug_assert_eq!(
            candidate.questions.len(),
            index as usize,
            "question slots must stay dense"
        );

        let difficulty = difficulty_for_index(index);
        let previous: Vec<String> = candidate.questions.iter().map(|q| q.text.clone()).collect();

        let generated = self.gateway.generate_question(difficulty, &previous).await?;

        // The response may have been in flight while the session moved on;
        // apply it only if this question slot is still the one to fill.
        let current = self.store.get(candidate_id)?;
        if current.status != CandidateStatus::InProgress
            || current.current_question_index != index
            || current.questions.len() != index as usize
        {
            warn!("Discarding stale generated question for candidate {}", candidate_id);
            return Ok(current);
        }

        let question = build_question(generated.question, difficulty);
        let limit = question.time_limit;
        let snapshot = self.store.update(candidate_id, |c| {
            c.messages.push(Message::system(question_marker(index, difficulty)));
            c.messages.push(Message::assistant(question.text.clone()));
            c.questions.push(question.clone());
        })?;

        self.timer.lock().start(*candidate_id, index, limit);

        self.sync.candidate_update(candidate_id);
        for message in snapshot.messages.iter().rev().take(2).rev() {
            self.sync.new_message(candidate_id, message);
        }
        self.sync.interview_state(&self.timer.lock().state());

        info!(
            "❓ Question {}/{} ({}) asked, {}s on the clock",
            index + 1,
            QUESTION_COUNT,
            difficulty.as_str(),
            limit
        );
        Ok(snapshot)
    }

    async fn auto_submit(&self, candidate_id: &Uuid) -> Result<Candidate> {
        let draft = self.drafts.lock().get(candidate_id).cloned();
        self.submit_internal(candidate_id, AnswerSubmission::timeout(draft))
            .await
    }

    async fn submit_internal(
        &self,
        candidate_id: &Uuid,
        submission: AnswerSubmission,
    ) -> Result<Candidate> {
        let candidate = self.store.get(candidate_id)?;
        match candidate.status {
            CandidateStatus::InfoCollection => {
                return Err(InterviewError::Validation(
                    "No interview in progress".to_string(),
                ));
            }
            // A submission landing after completion lost the race; absorb it.
            CandidateStatus::Completed => return Ok(candidate),
            CandidateStatus::InProgress => {}
        }

        let index = candidate.current_question_index;
        let bound = match self.timer.lock().bound(candidate_id) {
            Some(bound) if bound.question_index == index => bound,
            _ => {
                info!(
                    "Ignoring {} submission for candidate {}: question already advanced",
                    origin_label(&submission),
                    candidate_id
                );
                return Ok(candidate);
            }
        };

        let question = match candidate.questions.get(index as usize) {
            Some(question) => question.clone(),
            None => {
                warn!("Countdown bound to a question that was never recorded");
                return Ok(candidate);
            }
        };

        // Halt the countdown, keeping the remainder so elapsed time stays
        // computable. On the timeout path the remainder is zero and the
        // elapsed time equals the full limit.
        self.timer.lock().stop();
        let time_taken = bound.time_limit - bound.time_remaining;

        let scored = match self
            .gateway
            .score_answer(&question.text, &submission.text, question.difficulty)
            .await
        {
            Ok(scored) => scored,
            Err(err) => {
                // Step aborted with durable state untouched; the countdown
                // resumes so the question stays answerable.
                self.timer.lock().resume();
                return Err(err.into());
            }
        };

        // The scoring response may be stale if the session moved on while
        // it was in flight.
        let current = self.store.get(candidate_id)?;
        if current.status != CandidateStatus::InProgress
            || current.current_question_index != index
            || current
                .questions
                .get(index as usize)
                .map(|q| q.id != question.id)
                .unwrap_or(true)
        {
            warn!("Discarding stale scoring response for candidate {}", candidate_id);
            return Ok(current);
        }

        // First of (timeout, manual) to consume the countdown wins; the
        // other submission sees no binding and bows out above.
        if self.timer.lock().consume(candidate_id, index).is_none() {
            return Ok(current);
        }

        let answer_text = submission.text.clone();
        let is_manual = submission.origin == SubmissionOrigin::Manual;
        let snapshot = self.store.update(candidate_id, |c| {
            if let Some(q) = c.questions.get_mut(index as usize) {
                q.user_answer = answer_text.clone();
                q.score = scored.score;
                q.feedback = scored.feedback.clone();
                q.time_taken = time_taken;
            }
            if is_manual {
                c.messages.push(Message::user(answer_text.clone()));
            }
            c.messages.push(Message::assistant(ANSWER_RECORDED_MESSAGE));
            c.current_question_index = index + 1;
        })?;
        self.drafts.lock().remove(candidate_id);

        info!(
            "📝 Question {}/{} answered ({}, {}s, scored {}/10)",
            index + 1,
            QUESTION_COUNT,
            origin_label(&submission),
            time_taken,
            scored.score
        );
        self.sync.candidate_update(candidate_id);
        if let Some(message) = snapshot.messages.last() {
            self.sync.new_message(candidate_id, message);
        }

        if (index as usize) + 1 < QUESTION_COUNT {
            self.ask_next_question(candidate_id).await
        } else {
            self.finalize_interview(candidate_id).await
        }
    }

    async fn finalize_interview(&self, candidate_id: &Uuid) -> Result<Candidate> {
        let candidate = self.store.get(candidate_id)?;
        debug_assert_eq!(candidate.questions.len(), QUESTION_COUNT);
        debug_assert_eq!(candidate.current_question_index as usize, QUESTION_COUNT);

        let summary = self.gateway.final_summary(&candidate.questions).await?;

        let current = self.store.get(candidate_id)?;
        if current.status != CandidateStatus::InProgress {
            return Ok(current);
        }

        let mut breakdown = String::from("Interview Complete!\n\n");
        breakdown.push_str(&format!("Final Score: {}/100\n\n", summary.final_score));
        breakdown.push_str("Question-by-question breakdown:\n\n");
        for (idx, q) in current.questions.iter().enumerate() {
            breakdown.push_str(&format!(
                "Q{} ({}): {}/10\n",
                idx + 1,
                q.difficulty.as_str(),
                q.score
            ));
        }
        breakdown.push_str(&format!("\n{}", summary.summary));

        let snapshot = self.store.update(candidate_id, |c| {
            c.complete(summary.final_score, summary.summary.clone());
            c.messages.push(Message::assistant(breakdown.clone()));
        })?;

        info!(
            "🏁 Interview completed for candidate {}: {}/100",
            candidate_id, summary.final_score
        );
        self.sync.candidate_update(candidate_id);
        if let Some(message) = snapshot.messages.last() {
            self.sync.new_message(candidate_id, message);
        }
        Ok(snapshot)
    }

    /// Welcome-back countdown restart for a question that was live when the
    /// process stopped. Elapsed time is not durable, so the default policy
    /// grants the full limit again; preserve-elapsed trusts the snapshot.
    fn restart_timer_for(&self, candidate: &Candidate) {
        let index = candidate.current_question_index;
        let Some(question) = candidate.questions.get(index as usize) else {
            return;
        };

        {
            // Already bound to this question - still counting, stopped for a
            // submission in flight, or awaiting its pending auto-submission.
            // Nothing to restart.
            let timer = self.timer.lock();
            if let Some((bound_id, bound)) = timer.active() {
                if bound_id == candidate.id && bound.question_index == index {
                    return;
                }
            }
        }

        let restored = self.restored.lock().take();
        let mut timer = self.timer.lock();
        match (self.resume_policy, restored) {
            (ResumePolicy::PreserveElapsed, Some(saved))
                if saved.candidate_id == candidate.id
                    && saved.current_question_index == index =>
            {
                timer.start_with_remaining(
                    candidate.id,
                    index,
                    question.time_limit,
                    saved.time_remaining,
                );
            }
            _ => timer.start(candidate.id, index, question.time_limit),
        }
        drop(timer);
        self.sync.interview_state(&self.timer.lock().state());
    }
}

fn origin_label(submission: &AnswerSubmission) -> &'static str {
    match submission.origin {
        SubmissionOrigin::Manual => "manual",
        SubmissionOrigin::Timeout => "timeout",
    }
}

fn validate_field(field: Field, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(InterviewError::Validation(format!(
            "{} cannot be empty",
            field.display_name()
        )));
    }
    match field {
        Field::Email if !validate_email(value) => Err(InterviewError::Validation(format!(
            "'{}' is not a valid email address",
            value
        ))),
        Field::Phone if value.chars().filter(|c| c.is_ascii_digit()).count() < 7 => {
            Err(InterviewError::Validation(format!(
                "'{}' is not a valid phone number",
                value
            )))
        }
        _ => Ok(()),
    }
}
