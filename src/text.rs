//! Word counting and whitespace normalization.
//!
//! Every other component leans on these two functions: chunk sizes are
//! word counts, the variation/chunking thresholds are word counts, and the
//! diff engine's round-trip guarantee is "modulo normalized whitespace".
//!
//! ## Why Words, Not Bytes?
//!
//! Edit backends bill and limit by tokens, and words are the stable proxy
//! a user can reason about ("about 500 words per request"). Byte budgets
//! drift wildly between scripts; word budgets don't.

use once_cell::sync::Lazy;
use regex::Regex;

static CRLF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n?").expect("static pattern"));
static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("static pattern"));
static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").expect("static pattern"));

/// Count the words in a text.
///
/// A word is a maximal run of non-whitespace. Empty and whitespace-only
/// input count zero.
///
/// ```rust
/// assert_eq!(stet::count_words("Hello,  world!\n"), 2);
/// assert_eq!(stet::count_words("   "), 0);
/// ```
#[must_use]
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Normalize whitespace while keeping paragraph structure.
///
/// - `\r\n` and bare `\r` become `\n`
/// - runs of 3+ newlines collapse to a single blank line (`\n\n`)
/// - runs of spaces/tabs collapse to one space
///
/// Paragraph breaks (blank lines) survive; everything cosmetic does not.
///
/// ```rust
/// let raw = "One.\r\n\r\n\r\n\r\nTwo\t\tthree.";
/// assert_eq!(stet::normalize(raw), "One.\n\nTwo three.");
/// ```
#[must_use]
pub fn normalize(text: &str) -> String {
    let text = CRLF.replace_all(text, "\n");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    SPACE_RUNS.replace_all(&text, " ").into_owned()
}
