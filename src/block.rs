//! Block classification: heading, quoted speech, or plain paragraph.
//!
//! The chunker never looks at raw text directly. It looks at *blocks* —
//! paragraph-granularity units — and the classification drives its hard
//! constraints:
//!
//! - a **heading** always starts a fresh chunk and is never split
//! - **speech** is never split inside an open quotation
//! - a **paragraph** is the default and carries no constraint
//!
//! ## Rule Order Matters
//!
//! Rules run in a fixed order and the first match wins:
//!
//! ```text
//! 1. Heading patterns   (single-line blocks only)
//! 2. Speech             (opening glyph ... matching closing glyph)
//! 3. Paragraph          (everything else)
//! ```
//!
//! A one-line block like `"CHAPTER ONE"` (quoted *and* shouty) classifies
//! as a heading because heading rules are checked first.
//!
//! ## Heading Heuristics
//!
//! Three pattern families, matched case-by-case:
//!
//! ```text
//! Chapter 7            keyword + number
//! Part IV: The Fall    keyword + roman numeral + subtitle
//! Book The Long Road   keyword + up to 5 Title-Case words
//! Epilogue             bare structural word
//! THE GATHERING STORM  all-caps line, 3-60 chars
//! ```
//!
//! These are heuristics: a short all-caps exclamation can misclassify as a
//! heading. The cost of a false positive is a chunk boundary in an odd
//! place, not data loss.

use once_cell::sync::Lazy;
use regex::Regex;

/// The structural category of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// A chapter/section heading. Starts a chunk, never split.
    Heading,
    /// A block wrapped in quotation glyphs. Never split mid-quote.
    Speech,
    /// Anything else.
    Paragraph,
}

/// A classified, paragraph-granularity unit of text.
///
/// Blocks borrow from the source document; the chunker turns runs of them
/// back into owned [`Chunk`](crate::Chunk)s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    /// The structural category.
    pub kind: BlockKind,
    /// The block text, trimmed of surrounding whitespace.
    pub text: &'a str,
    /// Byte offset of `text` in the source document.
    pub offset: usize,
}

// Keyword + digits or roman numerals, optional `: subtitle` tail.
static HEADING_NUMBERED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(chapter|part|section|volume|book)\s+(\d+|[ivxlcdm]+)\s*([:.\u{2013}\u{2014}-]\s*\S.*)?$")
        .expect("static pattern")
});

// Keyword + 1-5 Title-Case words. Word case is significant here, so the
// case-insensitive group covers only the keyword.
static HEADING_TITLED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?i:chapter|part|section|volume|book)\s+[A-Z][\w'\u{2019}-]*(?:\s+[A-Z][\w'\u{2019}-]*){0,4}\s*(:\s*\S.*)?$",
    )
    .expect("static pattern")
});

// Bare structural words that head front/back matter.
static HEADING_BARE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(prologue|epilogue|introduction|preface|foreword|afterword|interlude|appendix)\s*([:.]\s*\S.*)?$",
    )
    .expect("static pattern")
});

/// Opening quote glyphs and their closing partners.
const QUOTE_PAIRS: [(char, char); 6] = [
    ('"', '"'),
    ('\u{201C}', '\u{201D}'), // “ ”
    ('\u{2018}', '\u{2019}'), // ‘ ’
    ('\u{00AB}', '\u{00BB}'), // « »
    ('\u{201F}', '\u{201D}'), // ‟ ”
    ('\u{201B}', '\u{2019}'), // ‛ ’
];

/// Classify one block of text.
///
/// The block is expected to be trimmed; internal newlines are allowed and
/// disqualify the heading rules (a heading is a single line).
///
/// ```rust
/// use stet::{classify, BlockKind};
///
/// assert_eq!(classify("Chapter 12: The Storm"), BlockKind::Heading);
/// assert_eq!(classify("\u{201C}Run!\u{201D}"), BlockKind::Speech);
/// assert_eq!(classify("It was a quiet morning."), BlockKind::Paragraph);
/// ```
#[must_use]
pub fn classify(block: &str) -> BlockKind {
    if is_heading(block) {
        BlockKind::Heading
    } else if is_speech(block) {
        BlockKind::Speech
    } else {
        BlockKind::Paragraph
    }
}

/// Whether a block matches any heading pattern.
///
/// Multi-line blocks never do: headings are single lines by definition.
#[must_use]
pub fn is_heading(block: &str) -> bool {
    if block.contains('\n') {
        return false;
    }
    let line = block.trim();
    if line.is_empty() {
        return false;
    }

    HEADING_NUMBERED.is_match(line)
        || HEADING_TITLED.is_match(line)
        || HEADING_BARE.is_match(line)
        || is_shout_line(line)
}

/// All-caps-or-punctuation span of 3-60 characters with at least one letter.
fn is_shout_line(line: &str) -> bool {
    let chars = line.chars().count();
    if !(3..=60).contains(&chars) {
        return false;
    }
    line.chars().any(char::is_alphabetic) && !line.chars().any(char::is_lowercase)
}

/// Whether a block starts with an opening quote glyph and ends with its
/// matching closer.
#[must_use]
pub fn is_speech(block: &str) -> bool {
    let mut chars = block.trim().chars();
    let (Some(first), Some(last)) = (chars.next(), chars.next_back()) else {
        return false;
    };
    QUOTE_PAIRS
        .iter()
        .any(|&(open, close)| first == open && last == close)
}

/// Running quotation depth across text fragments.
///
/// Curly and guillemet quotes nest (open increments, close decrements);
/// the ambiguous straight quote `"` toggles. The chunker uses this to keep
/// merging sentences of an oversized speech block until every quotation
/// closes, even when that overshoots the size bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoteBalance {
    depth: usize,
    straight_open: bool,
}

impl QuoteBalance {
    /// A balance with no open quotations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a fragment of text through the balance.
    pub fn feed(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                '"' => self.straight_open = !self.straight_open,
                '\u{201C}' | '\u{00AB}' | '\u{201F}' | '\u{201B}' => self.depth += 1,
                '\u{201D}' | '\u{00BB}' => self.depth = self.depth.saturating_sub(1),
                // U+2018/U+2019 are not tracked: closing ’ doubles as the
                // apostrophe in contractions and would never re-balance.
                _ => {}
            }
        }
    }

    /// Whether every quotation seen so far has closed.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.depth == 0 && !self.straight_open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_headings() {
        assert!(is_heading("Chapter 1"));
        assert!(is_heading("chapter 42"));
        assert!(is_heading("Part IV"));
        assert!(is_heading("VOLUME III"));
        assert!(is_heading("Section 2: Methods"));
        assert!(is_heading("Book II - The Return"));
    }

    #[test]
    fn test_titled_headings() {
        assert!(is_heading("Chapter The Long Road Home"));
        assert!(is_heading("Part One"));
        // Six title-case words is past the limit and not all-caps
        assert!(!is_heading("Chapter the quick brown fox jumps over"));
    }

    #[test]
    fn test_bare_headings() {
        assert!(is_heading("Prologue"));
        assert!(is_heading("EPILOGUE"));
        assert!(is_heading("Introduction: How We Got Here"));
    }

    #[test]
    fn test_shout_lines() {
        assert!(is_heading("THE GATHERING STORM"));
        assert!(is_heading("PART THE FIRST!"));
        assert!(!is_heading("OK")); // under 3 chars
        assert!(!is_heading("NOT a heading"));
        assert!(!is_heading("1234")); // no letters
    }

    #[test]
    fn test_multiline_never_heading() {
        assert!(!is_heading("CHAPTER ONE\nIt begins."));
        assert_eq!(classify("CHAPTER ONE\nIt begins."), BlockKind::Paragraph);
    }

    #[test]
    fn test_speech() {
        assert!(is_speech("\"Hello there.\""));
        assert!(is_speech("\u{201C}Hello there.\u{201D}"));
        assert!(is_speech("\u{00AB}Bonjour.\u{00BB}"));
        assert!(!is_speech("\"Unterminated"));
        assert!(!is_speech("plain text"));
        // Mismatched pair
        assert!(!is_speech("\u{201C}mixed\""));
    }

    #[test]
    fn test_heading_wins_over_speech() {
        // All-caps and fully quoted: heading rules run first
        assert_eq!(classify("\"CHAPTER ONE\""), BlockKind::Heading);
    }

    #[test]
    fn test_classify_default() {
        assert_eq!(classify("Just an ordinary sentence."), BlockKind::Paragraph);
    }

    #[test]
    fn test_quote_balance_straight() {
        let mut bal = QuoteBalance::new();
        bal.feed("\"He said");
        assert!(!bal.is_balanced());
        bal.feed(" hello.\"");
        assert!(bal.is_balanced());
    }

    #[test]
    fn test_quote_balance_curly_nested() {
        let mut bal = QuoteBalance::new();
        bal.feed("\u{201C}She said \u{2018}go\u{2019}"); // ‘ ’ pair doesn't close “
        assert!(!bal.is_balanced());
        bal.feed("\u{201D}");
        assert!(bal.is_balanced());
    }
}
