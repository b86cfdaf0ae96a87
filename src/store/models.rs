use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Number of questions in a full interview: 2 easy, 2 medium, 2 hard.
pub const QUESTION_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateStatus {
    InfoCollection,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Per-question time limit in seconds. Fixed by tier, never mutated
    /// after the question record is created.
    pub fn time_limit(&self) -> u32 {
        match self {
            Difficulty::Easy => 30,
            Difficulty::Medium => 90,
            Difficulty::Hard => 180,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Immutable transcript entry. Append-only; never edited or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// One asked question, including the recorded answer once it is scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    pub difficulty: Difficulty,
    pub user_answer: String,
    /// 0-10, set when the answer is scored.
    pub score: u8,
    pub feedback: String,
    /// Seconds, determined solely by difficulty.
    pub time_limit: u32,
    /// Seconds spent; equals `time_limit` exactly on the timeout path.
    pub time_taken: u32,
}

impl Question {
    pub fn new(text: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            difficulty,
            user_answer: String::new(),
            score: 0,
            feedback: String::new(),
            time_limit: difficulty.time_limit(),
            time_taken: 0,
        }
    }
}

/// One interview attempt. The candidate record store is the single source
/// of truth for everything in here; live countdown state lives in the
/// timer controller and is only a projection of this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    /// Empty string means "not yet known" for the three contact fields.
    pub name: String,
    pub email: String,
    pub phone: String,
    pub resume_text: String,
    pub messages: Vec<Message>,
    pub questions: Vec<Question>,
    /// Index of the active/next question, in `[0, 6]`.
    pub current_question_index: u32,
    /// 0-100, set only on completion.
    pub final_score: u8,
    pub summary: String,
    pub status: CandidateStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Candidate {
    pub fn new(resume_text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            resume_text: resume_text.into(),
            messages: Vec::new(),
            questions: Vec::new(),
            current_question_index: 0,
            final_score: 0,
            summary: String::new(),
            status: CandidateStatus::InfoCollection,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// The question currently awaiting an answer, if one has been asked.
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index as usize)
    }

    pub fn is_completed(&self) -> bool {
        self.status == CandidateStatus::Completed
    }

    /// Stamps the terminal state. `completed_at` is set exactly once.
    pub fn complete(&mut self, final_score: u8, summary: impl Into<String>) {
        self.status = CandidateStatus::Completed;
        self.final_score = final_score;
        self.summary = summary.into();
        if self.completed_at.is_none() {
            self.completed_at = Some(Utc::now());
        }
    }
}
