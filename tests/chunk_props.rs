//! Property-based tests for structural chunking.
//!
//! These verify the invariants the rest of the pipeline relies on:
//! - Coverage: no word is dropped, duplicated, or reordered
//! - Ordered: chunk offsets are monotonic and non-overlapping
//! - Exact slices: each chunk's text matches its span in the input
//! - Heading isolation: a heading only ever opens a chunk
//! - Speech integrity: no chunk ends inside a quotation
//! - Rebalancing: a runt final chunk exists only when merging would
//!   overflow the merge limit (or a heading pins it in place)

use proptest::prelude::*;
use stet::{classify, is_heading, BlockKind, Chunk, ChunkBudget, StructuralChunker};

// =============================================================================
// Test Generators
// =============================================================================

const WORDS: &[&str] = &[
    "the", "quick", "brown", "fox", "jumps", "over", "lazy", "dogs", "while", "rain", "falls",
    "softly", "against", "windows", "and", "nobody", "notices", "anything",
];

const HEADINGS: &[&str] = &[
    "Chapter 1",
    "Chapter 12: The Storm",
    "PART TWO",
    "Epilogue",
    "Section 4",
];

/// A plain paragraph of lowercase words (never classifies as heading).
fn paragraph() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS), 5..60)
        .prop_map(|words| words.join(" "))
}

/// A quoted speech block using straight quotes.
fn speech() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS), 4..40)
        .prop_map(|words| format!("\"{}\"", words.join(" ")))
}

fn heading() -> impl Strategy<Value = String> {
    prop::sample::select(HEADINGS).prop_map(str::to_owned)
}

/// A document of blank-line-separated blocks in canonical whitespace.
fn document() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![4 => paragraph(), 2 => speech(), 1 => heading()],
        1..12,
    )
    .prop_map(|blocks| blocks.join("\n\n"))
}

fn budget() -> ChunkBudget {
    ChunkBudget::new(50, 15)
}

// =============================================================================
// Invariant Helpers
// =============================================================================

fn words_of(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

fn chunks_ordered(chunks: &[Chunk]) -> bool {
    chunks
        .windows(2)
        .all(|w| w[0].end <= w[1].start && w[0].start < w[1].start)
}

fn chunk_text_matches(chunks: &[Chunk], text: &str) -> bool {
    chunks
        .iter()
        .all(|c| text.get(c.start..c.end) == Some(c.text.as_str()))
}

/// Every block after a chunk's first must be a non-heading.
fn headings_only_lead(chunk: &Chunk) -> bool {
    chunk
        .text
        .split("\n\n")
        .skip(1)
        .all(|block| classify(block.trim()) != BlockKind::Heading)
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn chunking_preserves_every_word(text in document()) {
        let chunks = StructuralChunker::new(budget()).chunk(&text);
        let rejoined: Vec<&str> = chunks.iter().flat_map(|c| words_of(&c.text)).collect();
        prop_assert_eq!(rejoined, words_of(&text));
    }

    #[test]
    fn chunks_are_ordered_and_disjoint(text in document()) {
        let chunks = StructuralChunker::new(budget()).chunk(&text);
        prop_assert!(chunks_ordered(&chunks));
    }

    #[test]
    fn chunk_text_is_exact_slice(text in document()) {
        let chunks = StructuralChunker::new(budget()).chunk(&text);
        prop_assert!(chunk_text_matches(&chunks, &text));
    }

    #[test]
    fn assemble_reconstructs_canonical_input(text in document()) {
        // Generator output is already whitespace-canonical and contains
        // no oversized blocks, so rejoining chunks with a blank line
        // reproduces the input byte for byte.
        let chunks = StructuralChunker::new(budget()).chunk(&text);
        let rejoined = stet::assemble(chunks.iter().map(|c| c.text.as_str()));
        prop_assert_eq!(rejoined, text);
    }

    #[test]
    fn headings_open_chunks(text in document()) {
        let chunks = StructuralChunker::new(budget()).chunk(&text);
        for chunk in &chunks {
            prop_assert!(headings_only_lead(chunk), "buried heading in: {:?}", chunk.text);
        }
    }

    #[test]
    fn no_chunk_ends_mid_quotation(text in document()) {
        let chunks = StructuralChunker::new(budget()).chunk(&text);
        for chunk in &chunks {
            let quotes = chunk.text.matches('"').count();
            prop_assert_eq!(quotes % 2, 0, "odd quote count in: {:?}", chunk.text);
        }
    }

    #[test]
    fn final_chunk_respects_rebalancing(text in document()) {
        let b = budget();
        let chunks = StructuralChunker::new(b).chunk(&text);
        if chunks.len() >= 2 {
            let last = &chunks[chunks.len() - 1];
            let prev = &chunks[chunks.len() - 2];
            let heading_pinned = is_heading(last.text.lines().next().unwrap_or(""));
            prop_assert!(
                last.word_count() >= b.min()
                    || prev.word_count() + last.word_count() > b.merge_limit()
                    || heading_pinned,
                "unmerged runt: {} words",
                last.word_count()
            );
        }
    }

    #[test]
    fn chunking_is_deterministic(text in document()) {
        let chunker = StructuralChunker::new(budget());
        prop_assert_eq!(chunker.chunk(&text), chunker.chunk(&text));
    }

    #[test]
    fn word_counts_within_bounds_absent_constraints(text in paragraph()) {
        // A single plain paragraph under 60 words never exceeds max.
        let chunks = StructuralChunker::new(budget()).chunk(&text);
        for chunk in &chunks {
            prop_assert!(chunk.word_count() <= budget().max());
        }
    }
}

// =============================================================================
// Edge Cases
// =============================================================================

#[test]
fn empty_input_yields_no_chunks() {
    let chunker = StructuralChunker::new(budget());
    assert!(chunker.chunk("").is_empty());
    assert!(chunker.chunk("\n\n\n").is_empty());
}

#[test]
fn pathological_block_is_emitted_not_dropped() {
    // A single unsplittable run far beyond every bound.
    let text = "word ".repeat(500);
    let text = text.trim();
    let chunks = StructuralChunker::new(ChunkBudget::new(50, 10)).chunk(text);
    let total: usize = chunks.iter().map(Chunk::word_count).sum();
    assert_eq!(total, 500);
}

#[test]
fn oversized_heading_is_verbatim() {
    // Six words against a three-word bound: emitted whole, never split.
    let long = "Chapter Alpha Beta Gamma Delta Epsilon";
    assert!(is_heading(long));
    let chunks = StructuralChunker::new(ChunkBudget::new(2, 1)).chunk(long);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, long);
}

#[test]
fn crlf_input_chunks_without_offset_drift() {
    let text = "First paragraph here.\r\n\r\nSecond paragraph there.";
    let chunks = StructuralChunker::new(ChunkBudget::new(4, 0)).chunk(text);
    assert_eq!(chunks.len(), 2);
    for chunk in &chunks {
        assert_eq!(&text[chunk.start..chunk.end], chunk.text);
    }
}
