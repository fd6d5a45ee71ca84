//! Structure-respecting chunking for long documents.
//!
//! ## The Problem
//!
//! Edit backends are length-limited. Documents aren't. You need to split
//! a manuscript into pieces small enough to send independently, but the
//! pieces have to respect the document's own structure:
//!
//! - A heading glued to the tail of the previous scene confuses the edit
//! - A quotation split across two requests gets two incompatible rewrites
//! - A 40-word runt chunk at the end wastes a whole backend call
//!
//! ## The Algorithm
//!
//! Blocks are classified ([`classify`](crate::classify)) and accumulated
//! into a pending buffer against a [`ChunkBudget`]:
//!
//! ```text
//! walk blocks:
//!   heading    -> flush buffer, heading starts the next chunk
//!                 (a heading is never split, even when oversized)
//!   oversized  -> flush buffer, split the block at sentence boundaries;
//!                 speech keeps merging until its quotation closes
//!   otherwise  -> flush first if the block won't fit, then accumulate
//! flush the tail
//! rebalance:   a runt final chunk merges into its predecessor when the
//!              combined size stays under budget.merge_limit()
//! ```
//!
//! Chunking is total: any well-formed UTF-8 input produces chunks, and a
//! pathological block bigger than every bound is emitted oversized rather
//! than dropped. Empty input produces no chunks.
//!
//! ## Offsets
//!
//! Each chunk records the byte span of its text in the input string, and
//! `chunk.text` is exactly `input[chunk.start..chunk.end]`. Gaps between
//! consecutive chunks are pure whitespace (the block separators), so the
//! chunk sequence reconstructs the input modulo normalized whitespace.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::block::{classify, Block, BlockKind, QuoteBalance};
use crate::budget::ChunkBudget;
use crate::sentence::sentences;
use crate::text::count_words;

/// A bounded-size segment of a document, ready for independent dispatch.
///
/// ## Byte Offsets
///
/// `start` and `end` are byte offsets into the chunker's input:
///
/// ```rust
/// use stet::{ChunkBudget, StructuralChunker};
///
/// let text = "A short document.";
/// let chunks = StructuralChunker::new(ChunkBudget::default()).chunk(text);
/// assert_eq!(&text[chunks[0].start..chunks[0].end], chunks[0].text);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The chunk text.
    pub text: String,
    /// Byte offset where this chunk starts in the input.
    pub start: usize,
    /// Byte offset where this chunk ends (exclusive) in the input.
    pub end: usize,
    /// Zero-based index of this chunk in the sequence.
    pub index: usize,
}

impl Chunk {
    /// Create a new chunk.
    #[must_use]
    pub fn new(text: impl Into<String>, start: usize, end: usize, index: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            index,
        }
    }

    /// The number of words in this chunk, recomputed from the text.
    ///
    /// Never cached: a chunk whose text changes would silently carry a
    /// stale count otherwise.
    #[must_use]
    pub fn word_count(&self) -> usize {
        count_words(&self.text)
    }

    /// The length of this chunk in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether this chunk is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The byte span of this chunk in the input.
    #[must_use]
    pub fn span(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

impl std::fmt::Display for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunk {{ index: {}, span: {}..{}, words: {} }}",
            self.index,
            self.start,
            self.end,
            self.word_count()
        )
    }
}

// Block separator: a newline followed by at least one more (possibly
// space-padded) newline. Tolerates CRLF and 3+ newline runs, so the
// chunker accepts un-normalized input without shifting offsets.
static BLOCK_SEP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\r?\n)(?:[ \t]*\r?\n)+").expect("static pattern"));

/// Structure-respecting chunker.
///
/// ## Example
///
/// ```rust
/// use stet::{ChunkBudget, StructuralChunker};
///
/// let chunker = StructuralChunker::new(ChunkBudget::new(40, 10));
/// let text = "Chapter 1\n\nA first scene with a few words.\n\nMore prose here.";
/// let chunks = chunker.chunk(text);
///
/// assert!(chunks[0].text.starts_with("Chapter 1"));
/// ```
#[derive(Debug, Clone)]
pub struct StructuralChunker {
    budget: ChunkBudget,
}

impl StructuralChunker {
    /// Create a chunker with the given budget.
    #[must_use]
    pub fn new(budget: ChunkBudget) -> Self {
        Self { budget }
    }

    /// The budget this chunker works against.
    #[must_use]
    pub const fn budget(&self) -> ChunkBudget {
        self.budget
    }

    /// Split a document into chunks.
    ///
    /// Total over well-formed UTF-8: never fails, never drops text.
    /// Empty or whitespace-only input yields an empty vec.
    #[must_use]
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let blocks = parse_blocks(text);
        if blocks.is_empty() {
            return vec![];
        }

        let max = self.budget.max();
        let mut chunks: Vec<Chunk> = Vec::new();
        // Pending buffer: byte span of accumulated blocks plus their
        // running word count. Blocks in the buffer are contiguous, so a
        // flush is a single slice of the input.
        let mut buf: Option<(usize, usize)> = None;
        let mut buf_words = 0usize;

        let mut flush = |buf: &mut Option<(usize, usize)>, buf_words: &mut usize,
                         chunks: &mut Vec<Chunk>| {
            if let Some((start, end)) = buf.take() {
                chunks.push(Chunk::new(&text[start..end], start, end, chunks.len()));
                *buf_words = 0;
            }
        };

        for block in &blocks {
            let words = count_words(block.text);
            let span = (block.offset, block.offset + block.text.len());

            match block.kind {
                BlockKind::Heading => {
                    flush(&mut buf, &mut buf_words, &mut chunks);
                    if words > max {
                        // Emitted verbatim, never split.
                        chunks.push(Chunk::new(block.text, span.0, span.1, chunks.len()));
                    } else {
                        buf = Some(span);
                        buf_words = words;
                    }
                }
                BlockKind::Speech | BlockKind::Paragraph if words > max => {
                    flush(&mut buf, &mut buf_words, &mut chunks);
                    self.split_oversized(text, block, words, &mut chunks);
                }
                BlockKind::Speech | BlockKind::Paragraph => {
                    if buf.is_some() && buf_words + words > max {
                        flush(&mut buf, &mut buf_words, &mut chunks);
                    }
                    buf = match buf {
                        Some((start, _)) => Some((start, span.1)),
                        None => Some(span),
                    };
                    buf_words += words;
                }
            }
        }
        flush(&mut buf, &mut buf_words, &mut chunks);

        self.rebalance(text, &mut chunks);

        for (i, chunk) in chunks.iter_mut().enumerate() {
            chunk.index = i;
        }
        chunks
    }

    /// Split one oversized block at sentence boundaries.
    ///
    /// Sub-chunks aim at an even division of the block (`ceil(words /
    /// target)` pieces) so a 1200-word block at target 500 becomes three
    /// ~400-word chunks instead of 600 + 600 + runt. Speech blocks keep
    /// merging sentences while a quotation is open, even past the bound.
    fn split_oversized(&self, text: &str, block: &Block<'_>, words: usize, out: &mut Vec<Chunk>) {
        let pieces = words.div_ceil(self.budget.target()).max(1);
        let aim = words.div_ceil(pieces);
        let track_quotes = block.kind == BlockKind::Speech;

        let sents = sentences(block.text);
        if sents.is_empty() {
            out.push(Chunk::new(
                block.text,
                block.offset,
                block.offset + block.text.len(),
                out.len(),
            ));
            return;
        }

        let mut balance = QuoteBalance::new();
        let mut start: Option<usize> = None;
        let mut end = 0usize;
        let mut acc = 0usize;

        let mut emit = |start: &mut Option<usize>, end: usize, acc: &mut usize,
                        out: &mut Vec<Chunk>| {
            if let Some(s) = start.take() {
                // Sentence segments keep trailing whitespace; trim it off
                // the span so chunk text stays an exact slice.
                let raw = &block.text[s..end];
                let trimmed = raw.trim_end();
                let abs_start = block.offset + s;
                let abs_end = abs_start + trimmed.len();
                if !trimmed.is_empty() {
                    out.push(Chunk::new(trimmed, abs_start, abs_end, out.len()));
                }
                *acc = 0;
            }
        };

        for (off, s) in sents {
            let s_words = count_words(s);
            if start.is_some()
                && acc + s_words > aim
                && (!track_quotes || balance.is_balanced())
            {
                emit(&mut start, end, &mut acc, out);
            }
            if start.is_none() {
                start = Some(off);
            }
            end = off + s.len();
            acc += s_words;
            if track_quotes {
                balance.feed(s);
            }
        }
        emit(&mut start, end, &mut acc, out);
    }

    /// Merge a runt final chunk into its predecessor if the result stays
    /// within the merge limit.
    fn rebalance(&self, text: &str, chunks: &mut Vec<Chunk>) {
        if chunks.len() < 2 {
            return;
        }
        let last = &chunks[chunks.len() - 1];
        let prev = &chunks[chunks.len() - 2];
        // A heading-led chunk never merges backward: the heading must stay
        // a chunk's first line.
        if crate::block::is_heading(last.text.lines().next().unwrap_or("")) {
            return;
        }
        let last_words = last.word_count();
        if last_words >= self.budget.min() {
            return;
        }
        if prev.word_count() + last_words > self.budget.merge_limit() {
            return;
        }
        let start = prev.start;
        let end = last.end;
        chunks.truncate(chunks.len() - 2);
        chunks.push(Chunk::new(&text[start..end], start, end, chunks.len()));
    }
}

impl Default for StructuralChunker {
    fn default() -> Self {
        Self::new(ChunkBudget::default())
    }
}

/// Split text into classified blocks on blank-line boundaries.
fn parse_blocks(text: &str) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut pos = 0;
    for sep in BLOCK_SEP.find_iter(text) {
        push_block(text, pos, sep.start(), &mut blocks);
        pos = sep.end();
    }
    push_block(text, pos, text.len(), &mut blocks);
    blocks
}

fn push_block<'a>(text: &'a str, start: usize, end: usize, out: &mut Vec<Block<'a>>) {
    let raw = &text[start..end];
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    let lead = raw.len() - raw.trim_start().len();
    out.push(Block {
        kind: classify(trimmed),
        text: trimmed,
        offset: start + lead,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_empty_input() {
        let chunker = StructuralChunker::default();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("  \n\n \n ").is_empty());
    }

    #[test]
    fn test_single_small_block() {
        let chunker = StructuralChunker::default();
        let chunks = chunker.chunk("Just a few words here.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Just a few words here.");
        assert_eq!(chunks[0].start, 0);
    }

    #[test]
    fn test_heading_starts_new_chunk() {
        let chunker = StructuralChunker::new(ChunkBudget::new(100, 20));
        let text = format!("{}\n\nChapter 2\n\n{}", words(30), words(30));
        let chunks = chunker.chunk(&text);

        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].text.starts_with("Chapter 2"));
    }

    #[test]
    fn test_heading_flushes_even_under_target() {
        let chunker = StructuralChunker::new(ChunkBudget::new(500, 100));
        let text = format!("{}\n\nPART II\n\n{}", words(10), words(10));
        let chunks = chunker.chunk(&text);

        // Without the heading this would be one 20-word chunk.
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].word_count(), 10);
        assert!(chunks[1].text.starts_with("PART II"));
    }

    #[test]
    fn test_accumulation_respects_max() {
        let chunker = StructuralChunker::new(ChunkBudget::new(50, 10));
        let paras: Vec<String> = (0..6).map(|_| words(25)).collect();
        let text = paras.join("\n\n");
        let chunks = chunker.chunk(&text);

        for chunk in &chunks {
            assert!(chunk.word_count() <= 60, "oversized: {chunk}");
        }
        let total: usize = chunks.iter().map(Chunk::word_count).sum();
        assert_eq!(total, 150);
    }

    #[test]
    fn test_oversized_paragraph_split_at_sentences() {
        let chunker = StructuralChunker::new(ChunkBudget::new(20, 5));
        // 12 sentences x 5 words = 60 words in one block
        let text = (0..12)
            .map(|i| format!("Sentence number {i} has five."))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = chunker.chunk(&text);

        assert!(chunks.len() >= 3);
        for chunk in &chunks {
            assert!(chunk.word_count() <= 25, "oversized: {chunk}");
            // Sub-chunks stay exact slices
            assert_eq!(&text[chunk.start..chunk.end], chunk.text);
        }
    }

    #[test]
    fn test_oversized_speech_keeps_quotes_closed() {
        let chunker = StructuralChunker::new(ChunkBudget::new(10, 2));
        // One long quotation spanning several sentences, then a short one.
        let text = "\"First part of the speech. Still going on here. And on and still on.\" \"Done now.\"";
        let chunks = chunker.chunk(text);

        for chunk in &chunks {
            let quotes = chunk.text.matches('"').count();
            assert_eq!(quotes % 2, 0, "chunk ends mid-quote: {:?}", chunk.text);
        }
    }

    #[test]
    fn test_even_split_of_large_block() {
        // 1200 words as 60 twenty-word sentences in a single block:
        // ceil(1200/500) = 3 pieces aiming at 400 words each.
        let chunker = StructuralChunker::default();
        let sentence = "The quick brown fox jumps over the lazy dog while nineteen more words trail along behind it in step today.";
        assert_eq!(count_words(sentence), 20);
        let text = std::iter::repeat(sentence).take(60).collect::<Vec<_>>().join(" ");
        let chunks = chunker.chunk(&text);

        assert_eq!(chunks.len(), 3);
        for chunk in &chunks {
            let wc = chunk.word_count();
            assert!((400..=600).contains(&wc), "out of band: {wc}");
        }
    }

    #[test]
    fn test_rebalancing_merges_runt() {
        let chunker = StructuralChunker::new(ChunkBudget::new(50, 10));
        // 55 + 8 won't accumulate (63 > max 60) but rebalances (63 <= 65)
        let text = format!("{}\n\n{}", words(55), words(8));
        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].word_count(), 63);
    }

    #[test]
    fn test_rebalancing_never_buries_heading() {
        let chunker = StructuralChunker::new(ChunkBudget::new(50, 10));
        // Trailing heading-led chunk is a runt, but merging would put the
        // heading mid-chunk.
        let text = format!("{}\n\nChapter 2\n\n{}", words(20), words(5));
        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].text.starts_with("Chapter 2"));
    }

    #[test]
    fn test_rebalancing_leaves_heavy_pair_alone() {
        let chunker = StructuralChunker::new(ChunkBudget::new(50, 10));
        // 58 + 30: merging would hit 88 > merge_limit (65)
        let text = format!("{}\n\n{}", words(58), words(30));
        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].word_count(), 30);
    }

    #[test]
    fn test_indices_sequential() {
        let chunker = StructuralChunker::new(ChunkBudget::new(20, 5));
        let text = (0..8).map(|_| words(15)).collect::<Vec<_>>().join("\n\n");
        let chunks = chunker.chunk(&text);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }

    #[test]
    fn test_chunk_text_is_exact_slice() {
        let chunker = StructuralChunker::new(ChunkBudget::new(30, 10));
        let text = format!(
            "Chapter 1\n\n{}\n\n\"{}\"\n\n{}",
            words(25),
            words(20),
            words(28)
        );
        for chunk in chunker.chunk(&text) {
            assert_eq!(&text[chunk.start..chunk.end], chunk.text);
        }
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let chunker = StructuralChunker::new(ChunkBudget::new(40, 10));
        let text = format!("Chapter 1\n\n{}\n\n{}", words(60), words(35));
        assert_eq!(chunker.chunk(&text), chunker.chunk(&text));
    }
}
