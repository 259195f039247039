//! JSON recovery from noisy LLM output.
//!
//! Models are instructed to return raw JSON but routinely wrap it in
//! markdown fences or commentary. Recovery is lenient pattern-matching, not
//! a JSON-in-text parser: strip fences, try a direct parse, then fall back
//! to the first-`{`..last-`}` substring. Failure costs one attempt upstream,
//! so a malformed candidate is acceptable.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

static FENCE_RE: OnceLock<Regex> = OnceLock::new();

fn fence_re() -> &'static Regex {
    FENCE_RE.get_or_init(|| {
        Regex::new(r"(?is)```(?:json)?\s*(.*?)\s*```").expect("fence regex is valid")
    })
}

/// Recover a single JSON value from arbitrary model output.
///
/// Returns `None` when no parseable JSON can be found. Never an error: the
/// caller treats this as one failed attempt.
pub fn extract_json(raw: &str) -> Option<Value> {
    let cleaned = strip_code_fences(raw);

    if let Ok(value) = serde_json::from_str(&cleaned) {
        return Some(value);
    }

    if let Some(candidate) = braced_candidate(&cleaned) {
        if let Ok(value) = serde_json::from_str(candidate) {
            return Some(value);
        }
    }

    tracing::error!("Failed to parse JSON after extraction attempts.\nOriginal text:\n{raw}");
    None
}

/// Replace ```json ... ``` and ``` ... ``` fences with their contents.
fn strip_code_fences(text: &str) -> String {
    fence_re().replace_all(text, "$1").trim().to_string()
}

/// The substring spanning the first `{` through the last `}`, if any.
fn braced_candidate(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start < end {
        Some(text[start..=end].trim())
    } else {
        None
    }
}
