//! Sentence segmentation with byte offsets.
//!
//! Only the chunker uses this, and only for one job: cutting an oversized
//! block at boundaries that don't butcher the prose.
//!
//! ## The Hard Part
//!
//! Sentence detection seems simple until you encounter:
//!
//! ```text
//! "Dr. Smith went to Washington D.C. on Jan. 15th."
//!     ^                          ^       ^
//!     Not a sentence end (abbreviation)
//! ```
//!
//! We use Unicode Standard Annex #29 (UAX #29) sentence segmentation,
//! which handles abbreviations, decimal numbers, ellipses, and URLs far
//! better than a period-scanner would.

use unicode_segmentation::UnicodeSegmentation;

/// Split text into sentences, each with its byte offset in the input.
///
/// Sentences keep their trailing whitespace (UAX #29 boundary semantics),
/// so concatenating the returned slices in order reproduces the input
/// exactly. Whitespace-only segments are dropped.
///
/// ```rust
/// let sents = stet::sentence::sentences("One. Two. Three.");
/// assert_eq!(sents.len(), 3);
/// assert_eq!(sents[0], (0, "One. "));
/// assert_eq!(sents[1], (5, "Two. "));
/// ```
#[must_use]
pub fn sentences(text: &str) -> Vec<(usize, &str)> {
    text.split_sentence_bounds()
        .scan(0usize, |offset, s| {
            let start = *offset;
            *offset += s.len();
            Some((start, s))
        })
        .filter(|(_, s)| !s.trim().is_empty())
        .collect()
}
