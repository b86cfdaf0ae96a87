use serde::{Serialize, Deserialize};

/// Recorded when the countdown expires with nothing typed.
pub const NO_ANSWER_SENTINEL: &str = "(No answer provided)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionOrigin {
    /// The candidate pressed submit.
    Manual,
    /// The timer expired and the orchestrator submitted on their behalf.
    Timeout,
}

/// An answer on its way into the scoring path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub text: String,
    pub origin: SubmissionOrigin,
}

impl AnswerSubmission {
    pub fn manual(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: SubmissionOrigin::Manual,
        }
    }

    /// Timeout submission from whatever partial draft exists; the sentinel
    /// stands in when the draft is empty.
    pub fn timeout(draft: Option<String>) -> Self {
        let text = draft.map(|d| d.trim().to_string()).unwrap_or_default();
        Self {
            text: if text.is_empty() {
                NO_ANSWER_SENTINEL.to_string()
            } else {
                text
            },
            origin: SubmissionOrigin::Timeout,
        }
    }
}
