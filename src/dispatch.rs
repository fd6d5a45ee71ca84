//! Edit orchestration: fallback, variations, refinement, chunked dispatch.
//!
//! ## Fallback
//!
//! The caller supplies models in preference order. A model fails on a
//! transport error, a backend-reported error, or empty content after
//! trimming; the dispatcher then advances to the next model. Exhausting
//! the list surfaces the **last** error — by then the first model's
//! error is stale, the last one describes the state of the world.
//!
//! ## Variations
//!
//! For short inputs the dispatcher can fan out N concurrent calls to the
//! same model at an ascending temperature ladder (0.6, 0.7, 0.8 …) and
//! return the deduplicated survivors — several candidate edits for the
//! price of one round trip. Long inputs degrade to a single call: five
//! concurrent edits of a novel is money on fire.
//!
//! ## Self-Refinement
//!
//! An alternative to the single call: a fixed three-step chain on one
//! model — edit, self-review against the original, final polish — each
//! step feeding the next at a slightly higher temperature. One step's
//! failure aborts the chain with that step's error.
//!
//! ## Chunked Documents
//!
//! ```text
//! document ──> chunks ──> ≤4 concurrent edit calls ──> slots ──> join
//!                              │
//!                         a failed chunk keeps its
//!                         original text (fail-open)
//! ```
//!
//! A single bad chunk must not sink a 200-chunk manuscript. Failed
//! chunks fall back to their original text, the aggregate keeps every
//! chunk in order, and the indexes of fallen-back chunks are reported so
//! a caller can surface them.

use std::sync::Arc;

use futures::future;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::backend::{EditBackend, EditRequest};
use crate::budget::ChunkBudget;
use crate::chunk::StructuralChunker;
use crate::error::{Error, Result};
use crate::text::{count_words, normalize};

/// Hard cap on concurrent variation calls.
pub const MAX_VARIATIONS: usize = 5;

/// Hard cap on concurrent chunk calls for one document.
pub const MAX_CONCURRENT_CHUNKS: usize = 4;

/// Inputs above this word count never fan out variations.
pub const VARIATION_WORD_LIMIT: usize = 1000;

// Variation temperature ladder: 0.6, 0.7, 0.8, ... capped at 1.0.
const VARIATION_BASE_TEMPERATURE: f32 = 0.6;
const VARIATION_TEMPERATURE_STEP: f32 = 0.1;

// Refinement temperature deltas over the base, capped at 1.0.
const REVIEW_TEMPERATURE_DELTA: f32 = 0.1;
const POLISH_TEMPERATURE_DELTA: f32 = 0.2;

/// Tunable knobs for an edit request.
///
/// Everything else — the temperature ladder, refinement deltas, and
/// concurrency caps — is a fixed constant of the design.
#[derive(Debug, Clone)]
pub struct EditOptions {
    /// Number of candidate edits to request (clamped to 1..=5). `1`
    /// disables variation mode.
    pub variations: usize,
    /// Replace the single call with the three-step refinement chain.
    pub refine: bool,
    /// Sampling temperature for plain and refinement edits.
    pub base_temperature: f32,
    /// Word count above which a document is chunked.
    pub large_document_threshold: usize,
    /// Chunk sizing for large documents.
    pub budget: ChunkBudget,
}

impl Default for EditOptions {
    fn default() -> Self {
        Self {
            variations: 1,
            refine: false,
            base_temperature: 0.7,
            large_document_threshold: 1000,
            budget: ChunkBudget::default(),
        }
    }
}

/// The outcome of a whole-document edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedDocument {
    /// The edited text, chunks rejoined in order.
    pub text: String,
    /// How many chunks the document was dispatched as.
    pub chunk_count: usize,
    /// Indexes of chunks whose edit failed and kept their original text.
    pub fallback_chunks: Vec<usize>,
}

impl EditedDocument {
    /// Whether every chunk was edited successfully.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.fallback_chunks.is_empty()
    }
}

/// Join per-chunk results back into one document.
///
/// Pure: preserves order, drops nothing, separates chunks with a blank
/// line. With the fail-open policy upstream, the output always reflects
/// exactly as many chunks as went in.
#[must_use]
pub fn assemble<I, S>(results: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    results
        .into_iter()
        .map(|s| s.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Dispatches edit calls to a backend with fallback across models.
///
/// Holds nothing but the backend handle; every call is parameterized by
/// the caller, so one dispatcher serves any number of documents.
#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn EditBackend>,
}

impl Dispatcher {
    /// Create a dispatcher over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn EditBackend>) -> Self {
        Self { backend }
    }

    /// One validated backend call: trims the result and treats empty
    /// content as a failure even when the backend reported success.
    async fn call(
        &self,
        model: &str,
        instruction: &str,
        text: &str,
        temperature: f32,
    ) -> Result<String> {
        let req = EditRequest {
            model: model.to_owned(),
            instruction: instruction.to_owned(),
            text: text.to_owned(),
            temperature,
        };
        let content = self.backend.edit(&req).await?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(Error::ModelCall {
                model: model.to_owned(),
                reason: "empty content".to_owned(),
            });
        }
        Ok(trimmed.to_owned())
    }

    /// Edit one piece of text, falling back across `models` in order.
    ///
    /// With `opts.refine`, the single call becomes the three-step
    /// refinement chain.
    ///
    /// # Errors
    ///
    /// [`Error::AllModelsExhausted`] carrying the last failure when
    /// every model fails.
    ///
    /// # Panics
    ///
    /// Panics if `models` is empty.
    pub async fn edit(
        &self,
        text: &str,
        instruction: &str,
        models: &[String],
        opts: &EditOptions,
    ) -> Result<String> {
        assert!(!models.is_empty(), "model preference order must not be empty");
        if opts.refine {
            return self.edit_refined(text, instruction, models, opts).await;
        }

        let mut last: Option<Error> = None;
        for model in models {
            match self.call(model, instruction, text, opts.base_temperature).await {
                Ok(edited) => return Ok(edited),
                Err(e) => {
                    debug!(model = %model, error = %e, "model failed, advancing");
                    last = Some(e);
                }
            }
        }
        Err(exhausted(last))
    }

    /// Edit with the fixed three-step refinement chain.
    ///
    /// Step 1 (the initial edit) runs through the normal fallback; the
    /// model that produced it is pinned for the self-review and final
    /// polish steps, whose failures abort the chain.
    async fn edit_refined(
        &self,
        text: &str,
        instruction: &str,
        models: &[String],
        opts: &EditOptions,
    ) -> Result<String> {
        let base = opts.base_temperature;

        let mut last: Option<Error> = None;
        let mut first_pass: Option<(&str, String)> = None;
        for model in models {
            match self.call(model, instruction, text, base).await {
                Ok(draft) => {
                    first_pass = Some((model.as_str(), draft));
                    break;
                }
                Err(e) => {
                    debug!(model = %model, error = %e, "refinement base edit failed, advancing");
                    last = Some(e);
                }
            }
        }
        let Some((model, draft)) = first_pass else {
            return Err(exhausted(last));
        };

        let reviewed = self
            .call(
                model,
                &self_review_prompt(text, instruction),
                &draft,
                (base + REVIEW_TEMPERATURE_DELTA).min(1.0),
            )
            .await?;

        self.call(
            model,
            &final_polish_prompt(text, instruction),
            &reviewed,
            (base + POLISH_TEMPERATURE_DELTA).min(1.0),
        )
        .await
    }

    /// Generate candidate edits at ascending temperatures.
    ///
    /// Below [`VARIATION_WORD_LIMIT`] words, fans out
    /// `opts.variations.clamp(1, 5)` concurrent calls per model and
    /// returns the deduplicated survivors; a model whose every call
    /// fails is abandoned for the next one. Above the limit (or with
    /// `variations <= 1`) this degrades to a single [`edit`](Self::edit)
    /// call.
    ///
    /// # Errors
    ///
    /// [`Error::AllModelsExhausted`] when every call on every model
    /// fails.
    ///
    /// # Panics
    ///
    /// Panics if `models` is empty.
    pub async fn edit_variations(
        &self,
        text: &str,
        instruction: &str,
        models: &[String],
        opts: &EditOptions,
    ) -> Result<Vec<String>> {
        assert!(!models.is_empty(), "model preference order must not be empty");
        let n = opts.variations.clamp(1, MAX_VARIATIONS);
        if n == 1 || count_words(text) > VARIATION_WORD_LIMIT {
            let single = self.edit(text, instruction, models, opts).await?;
            return Ok(vec![single]);
        }

        let mut last: Option<Error> = None;
        for model in models {
            let calls = (0..n).map(|i| {
                let temperature =
                    (VARIATION_BASE_TEMPERATURE + VARIATION_TEMPERATURE_STEP * i as f32).min(1.0);
                self.call(model, instruction, text, temperature)
            });

            let mut survivors: Vec<String> = Vec::new();
            for result in future::join_all(calls).await {
                match result {
                    Ok(candidate) => {
                        if !survivors.contains(&candidate) {
                            survivors.push(candidate);
                        }
                    }
                    Err(e) => last = Some(e),
                }
            }
            if !survivors.is_empty() {
                debug!(model = %model, count = survivors.len(), "variations generated");
                return Ok(survivors);
            }
            debug!(model = %model, "all variation calls failed, advancing");
        }
        Err(exhausted(last))
    }

    /// Edit a whole document, chunking when it exceeds the threshold.
    ///
    /// Small documents go out as one call and surface failures verbatim.
    /// Large documents are chunked, dispatched with at most
    /// [`MAX_CONCURRENT_CHUNKS`] calls in flight, and reassembled in
    /// order once every call has settled; a failed chunk keeps its
    /// original text (fail-open) and is reported in
    /// [`EditedDocument::fallback_chunks`].
    ///
    /// # Errors
    ///
    /// [`Error::AllModelsExhausted`] only for a failed *unchunked* edit;
    /// chunked edits absorb per-chunk failures.
    ///
    /// # Panics
    ///
    /// Panics if `models` is empty.
    pub async fn edit_document(
        &self,
        text: &str,
        instruction: &str,
        models: &[String],
        opts: &EditOptions,
    ) -> Result<EditedDocument> {
        let document = normalize(text);

        if count_words(&document) <= opts.large_document_threshold {
            let edited = self.edit(&document, instruction, models, opts).await?;
            return Ok(EditedDocument {
                text: edited,
                chunk_count: 1,
                fallback_chunks: Vec::new(),
            });
        }

        let chunks = StructuralChunker::new(opts.budget).chunk(&document);
        info!(chunks = chunks.len(), "dispatching chunked document");

        // Each task writes into its own slot; aggregation runs only
        // after the stream is fully drained.
        let mut slots: Vec<Option<String>> = vec![None; chunks.len()];
        let mut fallback_chunks = Vec::new();

        let tasks = chunks.iter().map(|chunk| {
            let fut = self.edit(&chunk.text, instruction, models, opts);
            async move { (chunk.index, fut.await) }
        });
        let settled: Vec<(usize, Result<String>)> = stream::iter(tasks)
            .buffer_unordered(MAX_CONCURRENT_CHUNKS)
            .collect()
            .await;

        for (index, result) in settled {
            match result {
                Ok(edited) => slots[index] = Some(edited),
                Err(e) => {
                    warn!(chunk = index, error = %e, "chunk edit failed, keeping original text");
                    fallback_chunks.push(index);
                }
            }
        }
        fallback_chunks.sort_unstable();

        let text = assemble(
            chunks
                .iter()
                .map(|chunk| slots[chunk.index].as_deref().unwrap_or(&chunk.text)),
        );
        Ok(EditedDocument {
            text,
            chunk_count: chunks.len(),
            fallback_chunks,
        })
    }
}

fn exhausted(last: Option<Error>) -> Error {
    Error::AllModelsExhausted {
        last: Box::new(last.unwrap_or(Error::ModelCall {
            model: String::new(),
            reason: "no attempts were made".to_owned(),
        })),
    }
}

fn self_review_prompt(original: &str, instruction: &str) -> String {
    format!(
        "You previously edited a passage with this instruction: {instruction}\n\
         Review your edit below against the original. Fix anything that drifted \
         from the original meaning and return the corrected edit only.\n\n\
         Original passage:\n{original}"
    )
}

fn final_polish_prompt(original: &str, instruction: &str) -> String {
    format!(
        "Final pass. The passage below is your reviewed edit (instruction: \
         {instruction}). Polish the prose without changing meaning and return \
         the final text only.\n\n\
         Original passage for reference:\n{original}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_joins_in_order() {
        let out = assemble(["first chunk", "second chunk", "third"]);
        assert_eq!(out, "first chunk\n\nsecond chunk\n\nthird");
    }

    #[test]
    fn test_assemble_keeps_count() {
        let chunks = vec!["a"; 7];
        let out = assemble(chunks.iter());
        assert_eq!(out.split("\n\n").count(), 7);
    }

    #[test]
    fn test_default_options() {
        let opts = EditOptions::default();
        assert_eq!(opts.variations, 1);
        assert!(!opts.refine);
        assert_eq!(opts.large_document_threshold, 1000);
    }

    #[test]
    fn test_temperature_ladder_caps_at_one() {
        let temps: Vec<f32> = (0..MAX_VARIATIONS)
            .map(|i| (VARIATION_BASE_TEMPERATURE + VARIATION_TEMPERATURE_STEP * i as f32).min(1.0))
            .collect();
        assert!((temps[0] - 0.6).abs() < 1e-6);
        assert!(temps.iter().all(|t| *t <= 1.0));
        // Ladder ascends until the cap
        assert!(temps.windows(2).all(|w| w[1] >= w[0]));
    }
}
