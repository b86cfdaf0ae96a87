//! Resume intake boundary. Byte-level PDF/DOCX parsing lives behind the
//! [`ResumeExtractor`] trait and is provided by an external collaborator;
//! this module ships the plain-text implementation plus the contact-field
//! sniffing applied to whatever text comes back.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Deserialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResumeError {
    #[error("Unsupported resume format: {0}")]
    UnsupportedFormat(String),
    #[error("Failed to extract text from file: {0}")]
    ExtractionFailed(String),
}

pub type Result<T> = std::result::Result<T, ResumeError>;

/// Raw text plus whatever contact fields could be sniffed out of it. A
/// `None` field means the info-collection step has to ask for it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedResume {
    pub text: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// File-format boundary: bytes + mime type in, text out.
pub trait ResumeExtractor: Send + Sync {
    fn extract_text(&self, file_bytes: &[u8], mime_type: &str) -> Result<String>;

    /// Extracts text and runs contact-field sniffing over it.
    fn extract(&self, file_bytes: &[u8], mime_type: &str) -> Result<ExtractedResume> {
        let text = self.extract_text(file_bytes, mime_type)?;
        Ok(extract_contact_fields(&text))
    }
}

/// Accepts `text/plain` only; binary document formats are an external
/// concern and come back as `UnsupportedFormat` here.
pub struct PlainTextExtractor;

impl ResumeExtractor for PlainTextExtractor {
    fn extract_text(&self, file_bytes: &[u8], mime_type: &str) -> Result<String> {
        if mime_type != "text/plain" {
            return Err(ResumeError::UnsupportedFormat(mime_type.to_string()));
        }
        String::from_utf8(file_bytes.to_vec())
            .map_err(|e| ResumeError::ExtractionFailed(e.to_string()))
    }
}

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+?[1-9]?[\d\s\-\(\)]{7,15}").unwrap());
static NAME_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z\s]+$").unwrap());

/// Regex sniffing for email and phone, plus the first-line heuristic for
/// the name (short, letters-and-spaces-only first line).
pub fn extract_contact_fields(text: &str) -> ExtractedResume {
    let email = EMAIL.find(text).map(|m| m.as_str().to_string());
    let phone = PHONE.find(text).map(|m| m.as_str().trim().to_string());

    let name = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .filter(|line| line.len() < 50 && NAME_LINE.is_match(line))
        .map(str::to_string);

    ExtractedResume {
        text: text.to_string(),
        name,
        email,
        phone,
    }
}
