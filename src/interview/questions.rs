use serde::{Serialize, Deserialize};

use crate::store::{Candidate, Difficulty, Question, QUESTION_COUNT};

/// Contact fields collected before the interview can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Phone,
}

impl Field {
    /// Human-readable name used in chat prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            Field::Name => "full name",
            Field::Email => "email address",
            Field::Phone => "phone number",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
        }
    }
}

/// Difficulty tier for a question slot. The sequence is fixed: two easy,
/// two medium, two hard. Indices past the end map to hard so a caller bug
/// degrades instead of panicking; the engine asserts the bound itself.
pub fn difficulty_for_index(index: u32) -> Difficulty {
    match index {
        0 | 1 => Difficulty::Easy,
        2 | 3 => Difficulty::Medium,
        _ => Difficulty::Hard,
    }
}

/// Builds the record for a freshly generated question: blank answer, zero
/// score, and the time limit fixed by its tier.
pub fn build_question(text: impl Into<String>, difficulty: Difficulty) -> Question {
    Question::new(text, difficulty)
}

/// Fields still missing from the candidate record, in collection order.
pub fn missing_fields(candidate: &Candidate) -> Vec<Field> {
    let mut missing = Vec::new();
    if candidate.name.trim().is_empty() {
        missing.push(Field::Name);
    }
    if candidate.email.trim().is_empty() {
        missing.push(Field::Email);
    }
    if candidate.phone.trim().is_empty() {
        missing.push(Field::Phone);
    }
    missing
}

/// Chat prompt asking for the missing fields, worded by how many remain.
pub fn missing_field_prompt(missing: &[Field]) -> String {
    let names: Vec<&str> = missing.iter().map(|f| f.display_name()).collect();
    match names.len() {
        0 => String::new(),
        1 => format!("I need your {} to continue. Please provide it:", names[0]),
        2 => format!(
            "I need your {} and {} to continue. Let's start with your {}:",
            names[0], names[1], names[0]
        ),
        _ => format!(
            "I need a few more details: {}, and {}. Let's start with your {}:",
            names[..names.len() - 1].join(", "),
            names[names.len() - 1],
            names[0]
        ),
    }
}

/// System marker shown in the transcript ahead of each question.
pub fn question_marker(index: u32, difficulty: Difficulty) -> String {
    format!("Question {}/{} - {}", index + 1, QUESTION_COUNT, difficulty.label())
}
