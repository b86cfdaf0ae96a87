use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:json)?").unwrap());

// First non-nested {...} substring; nested objects fail the inner parse and
// drop through to the fallback.
static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^{}]*\}").unwrap());

/// Strips markdown code fences and surrounding whitespace.
pub fn clean_response(raw: &str) -> String {
    CODE_FENCE.replace_all(raw, "").trim().to_string()
}

/// Turns an amorphous backend reply into structured data, degrading rather
/// than failing:
///
/// 1. strict parse of the cleaned, trimmed text;
/// 2. parse of the first `{...}` substring found in it;
/// 3. the caller's default builder, fed the cleaned text.
///
/// Backends wrap JSON in prose or code fences often enough that failing the
/// whole interview on a formatting slip is not an option.
pub fn parse_with_repair<T, F>(raw: &str, fallback: F) -> T
where
    T: DeserializeOwned,
    F: FnOnce(&str) -> T,
{
    let cleaned = clean_response(raw);

    if let Ok(parsed) = serde_json::from_str::<T>(&cleaned) {
        return parsed;
    }

    if let Some(object) = JSON_OBJECT.find(&cleaned) {
        if let Ok(parsed) = serde_json::from_str::<T>(object.as_str()) {
            return parsed;
        }
    }

    fallback(&cleaned)
}
