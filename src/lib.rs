//! # stet
//!
//! AI-assisted editing for long documents: structural chunking,
//! multi-model edit dispatch, and tracked changes.
//!
//! *stet* — the proofreader's mark for "let it stand": reject the edit,
//! keep the original.
//!
//! ## The Problem
//!
//! Text-editing backends are length-limited. Manuscripts aren't. Sending
//! a 90,000-word draft for an AI edit means answering three questions:
//!
//! - **Where do you cut?** Naive splits land mid-quotation or glue a
//!   chapter heading to the wrong scene. Cuts have to respect document
//!   structure.
//! - **What if a call fails?** Backends rate-limit, time out, and
//!   occasionally return garbage. One bad call out of two hundred must
//!   not sink the document.
//! - **Who approves the result?** Nobody accepts 90,000 machine-edited
//!   words blind. The edit has to come back as discrete, individually
//!   accept/reject-able changes.
//!
//! This crate is those three answers as one pipeline:
//!
//! ```text
//! raw text ──> StructuralChunker ──> chunks
//!                                      │
//!                            Dispatcher (fallback, ≤4 concurrent,
//!                                      │  fail-open per chunk)
//!                                      ▼
//!              assemble <── per-chunk edited text
//!                 │
//!                 ▼
//!       ReviewDocument::new(original, edited)
//!                 │
//!        accept / reject per change group
//!                 │
//!                 ▼
//!             clean text
//! ```
//!
//! ## Chunking
//!
//! Blocks are classified as headings, quoted speech, or plain paragraphs
//! ([`classify`]), then accumulated against a [`ChunkBudget`] (default
//! 500 words ± 100). Two hard constraints survive any budget pressure:
//! a heading is never split and always starts its chunk, and speech is
//! never cut inside an open quotation. See [`StructuralChunker`].
//!
//! ## Dispatch
//!
//! [`Dispatcher`] tries each model in preference order and keeps the
//! last error when all fail. Short inputs can fan out up to five
//! temperature-laddered variations; any input can instead run a
//! three-step self-refinement chain. Long documents are chunked and
//! dispatched with bounded concurrency, failed chunks keeping their
//! original text (fail-open). The backend itself sits behind the
//! [`EditBackend`] trait — [`HttpBackend`] in production, a scripted
//! fake in tests.
//!
//! ## Tracked Changes
//!
//! [`diff_words`] computes a deterministic word-level diff, and
//! [`ReviewDocument`] folds it into alternating unchanged text and
//! [`ChangeGroup`]s. Accept/reject are terminal and idempotent; pending
//! groups display optimistically (the edit shows until rejected);
//! [`ReviewDocument::clean_text`] reconstructs the current text at any
//! resolution state.
//!
//! ## Quick Start
//!
//! ```rust
//! use stet::{ChunkBudget, ReviewDocument, StructuralChunker};
//!
//! // Chunk a document for dispatch
//! let chunker = StructuralChunker::new(ChunkBudget::default());
//! let chunks = chunker.chunk("Chapter 1\n\nIt was a dark and stormy night.");
//! assert_eq!(chunks.len(), 1);
//!
//! // Review an edit as tracked changes
//! let mut doc = ReviewDocument::new(
//!     "It was a dark and stormy night.",
//!     "The night was dark and stormy.",
//! );
//! doc.accept_all();
//! assert_eq!(doc.clean_text(), "The night was dark and stormy.");
//! ```
//!
//! Dispatching requires an async runtime and a backend:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use stet::{Dispatcher, EditOptions, HttpBackend};
//!
//! # async fn run() -> stet::Result<()> {
//! let backend = HttpBackend::new("https://edit.example/v1/edit", Duration::from_secs(60));
//! let dispatcher = Dispatcher::new(Arc::new(backend));
//!
//! let models = vec!["editor-large".to_string(), "editor-small".to_string()];
//! let edited = dispatcher
//!     .edit_document(&manuscript(), "Tighten the prose.", &models, &EditOptions::default())
//!     .await?;
//!
//! if !edited.is_complete() {
//!     eprintln!("chunks kept unedited: {:?}", edited.fallback_chunks);
//! }
//! # Ok(())
//! # }
//! # fn manuscript() -> String { String::new() }
//! ```
//!
//! ## What This Crate Does Not Do
//!
//! No storage (callers hand in `(original, edited)` pairs and take away
//! `(original, clean)` pairs), no HTTP service surface, no rendering,
//! and no promise that the AI's edit is any good — only that every word
//! of it is individually revocable.

mod backend;
mod block;
mod budget;
mod chunk;
mod diff;
mod dispatch;
mod error;
mod review;
pub mod sentence;
mod text;

pub use backend::{EditBackend, EditRequest, HttpBackend};
pub use block::{classify, is_heading, is_speech, Block, BlockKind, QuoteBalance};
pub use budget::ChunkBudget;
pub use chunk::{Chunk, StructuralChunker};
pub use diff::{diff_words, DiffPart};
pub use dispatch::{
    assemble, Dispatcher, EditOptions, EditedDocument, MAX_CONCURRENT_CHUNKS, MAX_VARIATIONS,
    VARIATION_WORD_LIMIT,
};
pub use error::{Error, Result};
pub use review::{ChangeGroup, ChangeState, ReviewDocument, ReviewNode, ReviewStats};
pub use text::{count_words, normalize};
