//! Response sanitising: strip incidental Markdown from structuring output.
//!
//! Structuring models wrap JSON in ` ```json ... ``` ` fences despite being
//! told not to, sometimes with a language tag, sometimes bare, sometimes
//! only on one side. Every fence marker is removed wherever it appears,
//! then surrounding whitespace is trimmed.
//!
//! ## What is *not* stripped
//!
//! Prose around the JSON ("here is your json: {...}") is left in place and
//! fails to parse downstream. Guessing where the JSON starts would hide a
//! model that ignores its instructions.
//!
//! ## Idempotence
//!
//! After one pass the text holds no run of three backticks. Matching is
//! leftmost-first, so the character just before any removed marker is not a
//! backtick, and joining the remaining pieces cannot form a new run. A
//! second pass therefore finds nothing to do.

use once_cell::sync::Lazy;
use regex::Regex;

/// A fence marker: three backticks, an optional language tag, trailing
/// blanks and at most one line break.
static RE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[A-Za-z0-9_+-]*[ \t]*(?:\r?\n)?").unwrap());

/// Apply sanitising to raw structuring output.
pub fn sanitize(raw: &str) -> String {
    let without_fences = RE_FENCE.replace_all(raw, "");
    trim_surrounding(&without_fences).to_string()
}

/// Trim whitespace plus a byte-order mark, which some gateways prepend.
fn trim_surrounding(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}
