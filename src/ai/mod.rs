pub mod repair;
pub mod gateway;
pub mod gemini;

pub use gateway::{AiGateway, FinalSummary, GeneratedQuestion, ScoredAnswer};
pub use gemini::GeminiClient;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// Transport-level failures only. A malformed response body is never an
/// error here - the repair pipeline absorbs it into a neutral default.
#[derive(Error, Debug)]
pub enum AiError {
    #[error("Generation backend unavailable: {0}")]
    Service(String),
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        AiError::Service(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AiError>;

pub type CompletionFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// The generation backend boundary: one prompt in, one text blob out. No
/// structured API is assumed; callers run the response through the repair
/// pipeline to get structured data back.
pub trait TextGenerator: Send + Sync {
    fn complete<'a>(&'a self, prompt: &'a str) -> CompletionFuture<'a>;
}
