use log::{info, warn};
use serde::Deserialize;

use crate::store::{Difficulty, Question};

use super::repair::parse_with_repair;
use super::{Result, TextGenerator};

/// Structured result of question generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQuestion {
    pub question: String,
}

/// Structured result of scoring one answer. Score is clamped to 0-10.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredAnswer {
    pub score: u8,
    pub feedback: String,
}

/// Structured result of the final evaluation. Score is clamped to 0-100.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalSummary {
    pub final_score: u8,
    pub summary: String,
}

#[derive(Deserialize)]
struct QuestionBody {
    question: String,
}

#[derive(Deserialize)]
struct ScoreBody {
    #[serde(default)]
    score: f64,
    #[serde(default)]
    feedback: String,
}

#[derive(Deserialize)]
struct SummaryBody {
    #[serde(default, rename = "finalScore")]
    final_score: f64,
    #[serde(default)]
    summary: String,
}

/// Wraps the three generation operations against a plain text-completion
/// backend. Malformed bodies are repaired or defaulted and never surface as
/// errors; transport failures propagate so the caller can retry the step
/// with durable state untouched.
pub struct AiGateway<G> {
    backend: G,
}

impl<G: TextGenerator> AiGateway<G> {
    pub fn new(backend: G) -> Self {
        Self { backend }
    }

    pub async fn generate_question(
        &self,
        difficulty: Difficulty,
        previous_questions: &[String],
    ) -> Result<GeneratedQuestion> {
        let time_limit = difficulty.time_limit();
        let prompt = format!(
            "You are an expert Full Stack React/Node.js interviewer. Generate a single {difficulty} technical interview question.\n\
             \n\
             Time Limit: {time_limit} seconds\n\
             Question Complexity: {difficulty} level\n\
             \n\
             Requirements:\n\
             - Question should test practical Full Stack React/Node.js knowledge\n\
             - Difficulty: {difficulty} (easy=basic concepts, medium=practical implementation, hard=advanced/complex scenarios)\n\
             - Avoid questions similar to: {previous}\n\
             - Keep questions concise but comprehensive\n\
             - IMPORTANT: Your entire response must be a valid JSON object like {{\"question\": \"your question here\"}}\n\
             \n\
             Generate a {difficulty} Full Stack React/Node question that can be answered within {time_limit} seconds. Respond ONLY with valid JSON.",
            difficulty = difficulty.as_str(),
            time_limit = time_limit,
            previous = previous_questions.join(", "),
        );

        info!("🤖 Generating {} question ({} asked so far)", difficulty.as_str(), previous_questions.len());
        let raw = self.backend.complete(&prompt).await?;

        // The "avoid similar" hint is best-effort; the response is not
        // checked for novelty.
        let body = parse_with_repair(&raw, |cleaned| {
            warn!("Question response was not JSON, using cleaned text as the question");
            QuestionBody {
                question: cleaned.to_string(),
            }
        });

        Ok(GeneratedQuestion {
            question: body.question,
        })
    }

    pub async fn score_answer(
        &self,
        question: &str,
        answer: &str,
        difficulty: Difficulty,
    ) -> Result<ScoredAnswer> {
        let expectations = match difficulty {
            Difficulty::Easy => "Basic understanding and correct terminology",
            Difficulty::Medium => "Practical knowledge and implementation details",
            Difficulty::Hard => "Advanced concepts, edge cases, and best practices",
        };
        let prompt = format!(
            "You are an expert Full Stack React/Node.js interviewer evaluating candidate answers.\n\
             \n\
             Scoring Guidelines:\n\
             - Score from 0-10 based on correctness, completeness, and understanding\n\
             - {difficulty} level expectations: {expectations}\n\
             - Provide constructive feedback (2-3 sentences)\n\
             - IMPORTANT: Your entire response must be a valid JSON object like {{\"score\": 8, \"feedback\": \"Good answer with some minor issues.\"}}\n\
             \n\
             Question: {question}\n\
             \n\
             Answer: {answer}\n\
             \n\
             Evaluate this {difficulty} level answer. Respond ONLY with valid JSON.",
            difficulty = difficulty.as_str(),
            expectations = expectations,
            question = question,
            answer = answer,
        );

        let raw = self.backend.complete(&prompt).await?;

        let body = parse_with_repair(&raw, |cleaned| {
            warn!("Score response was not JSON, defaulting to a neutral score");
            ScoreBody {
                score: 5.0,
                feedback: if cleaned.is_empty() {
                    "No specific feedback provided.".to_string()
                } else {
                    cleaned.to_string()
                },
            }
        });

        let scored = ScoredAnswer {
            score: clamp_score(body.score, 10),
            feedback: if body.feedback.trim().is_empty() {
                "No feedback available".to_string()
            } else {
                body.feedback
            },
        };
        info!("🧠 Answer scored {}/10", scored.score);
        Ok(scored)
    }

    pub async fn final_summary(&self, questions: &[Question]) -> Result<FinalSummary> {
        let results = questions
            .iter()
            .enumerate()
            .map(|(idx, q)| {
                format!(
                    "Q{} ({}): {}\nAnswer: {}\nScore: {}/10",
                    idx + 1,
                    q.difficulty.as_str(),
                    q.text,
                    q.user_answer,
                    q.score
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "You are an expert Full Stack React/Node.js interviewer providing final candidate evaluation.\n\
             \n\
             Based on the interview performance:\n\
             - Calculate overall score (0-100) based on individual question scores\n\
             - Provide comprehensive summary (3-4 sentences) covering overall technical competency, strengths and areas for improvement, and a recommendation for the hiring decision\n\
             - IMPORTANT: Your entire response must be a valid JSON object like {{\"finalScore\": 85, \"summary\": \"Candidate performed well overall...\"}}\n\
             \n\
             Interview Results:\n\
             \n\
             {results}\n\
             \n\
             Provide final evaluation. Respond ONLY with valid JSON.",
            results = results,
        );

        let raw = self.backend.complete(&prompt).await?;

        let body = parse_with_repair(&raw, |cleaned| {
            warn!("Summary response was not JSON, defaulting to a neutral final score");
            SummaryBody {
                final_score: 50.0,
                summary: if cleaned.is_empty() {
                    "No summary available.".to_string()
                } else {
                    cleaned.to_string()
                },
            }
        });

        let summary = FinalSummary {
            final_score: clamp_score(body.final_score, 100),
            summary: if body.summary.trim().is_empty() {
                "No summary available".to_string()
            } else {
                body.summary
            },
        };
        info!("📊 Final evaluation ready: {}/100", summary.final_score);
        Ok(summary)
    }
}

fn clamp_score(value: f64, max: u8) -> u8 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let rounded = value.round();
    if rounded >= max as f64 {
        max
    } else {
        rounded as u8
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use parking_lot::Mutex;

    use crate::ai::{AiError, CompletionFuture};

    use super::*;

    /// Scripted backend: pops one canned reply per call.
    struct ScriptedBackend {
        replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<std::result::Result<&str, &str>>) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(String::from).map_err(String::from))
                        .collect(),
                ),
            }
        }
    }

    impl TextGenerator for ScriptedBackend {
        fn complete<'a>(&'a self, _prompt: &'a str) -> CompletionFuture<'a> {
            let next = self.replies.lock().pop_front();
            Box::pin(async move {
                match next {
                    Some(Ok(reply)) => Ok(reply),
                    Some(Err(err)) => Err(AiError::Service(err)),
                    None => Err(AiError::Service("script exhausted".to_string())),
                }
            })
        }
    }

    #[tokio::test]
    async fn question_json_wrapped_in_prose_is_extracted() {
        let gateway = AiGateway::new(ScriptedBackend::new(vec![Ok(
            r#"Sure! {"question": "Explain closures"} Hope that helps!"#,
        )]));
        let generated = gateway
            .generate_question(Difficulty::Easy, &[])
            .await
            .unwrap();
        assert_eq!(generated.question, "Explain closures");
    }

    #[tokio::test]
    async fn braceless_question_reply_becomes_the_question() {
        let gateway = AiGateway::new(ScriptedBackend::new(vec![Ok(
            "What is the difference between props and state?",
        )]));
        let generated = gateway
            .generate_question(Difficulty::Easy, &[])
            .await
            .unwrap();
        assert_eq!(
            generated.question,
            "What is the difference between props and state?"
        );
    }

    #[tokio::test]
    async fn unparseable_score_reply_defaults_to_neutral() {
        let gateway = AiGateway::new(ScriptedBackend::new(vec![Ok(
            "The answer shows reasonable understanding overall.",
        )]));
        let scored = gateway
            .score_answer("Q", "A", Difficulty::Medium)
            .await
            .unwrap();
        assert_eq!(scored.score, 5);
        assert_eq!(
            scored.feedback,
            "The answer shows reasonable understanding overall."
        );
    }

    #[tokio::test]
    async fn scores_are_clamped_to_range() {
        let gateway = AiGateway::new(ScriptedBackend::new(vec![
            Ok(r#"{"score": 14, "feedback": "overshoot"}"#),
            Ok(r#"{"score": -3, "feedback": "undershoot"}"#),
        ]));
        let high = gateway.score_answer("Q", "A", Difficulty::Easy).await.unwrap();
        assert_eq!(high.score, 10);
        let low = gateway.score_answer("Q", "A", Difficulty::Easy).await.unwrap();
        assert_eq!(low.score, 0);
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let gateway = AiGateway::new(ScriptedBackend::new(vec![Err("connection refused")]));
        let result = gateway.generate_question(Difficulty::Hard, &[]).await;
        assert!(matches!(result, Err(AiError::Service(_))));
    }

    #[tokio::test]
    async fn summary_defaults_when_reply_is_prose() {
        let gateway = AiGateway::new(ScriptedBackend::new(vec![Ok(
            "Overall the candidate did fine.",
        )]));
        let summary = gateway.final_summary(&[]).await.unwrap();
        assert_eq!(summary.final_score, 50);
        assert_eq!(summary.summary, "Overall the candidate did fine.");
    }
}
