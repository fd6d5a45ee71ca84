//! Error types for stet.

/// Errors that can occur while dispatching edits or resolving changes.
///
/// Chunking and diffing are total over well-formed UTF-8 and never produce
/// an error; everything here comes from the edit backend or from misuse of
/// the change-group state machine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A single backend call failed: transport error, reported error, or
    /// empty content where the contract requires text.
    #[error("model call failed for '{model}': {reason}")]
    ModelCall {
        /// The model that was asked for the edit.
        model: String,
        /// Why the call was treated as a failure.
        reason: String,
    },

    /// Every model in the preference order failed. Carries the last
    /// underlying error, not the first.
    #[error("all models exhausted, last error: {last}")]
    AllModelsExhausted {
        /// The error from the final attempt.
        #[source]
        last: Box<Error>,
    },

    /// An accept/reject was issued against a group already resolved the
    /// other way. Terminal states only change by re-diffing.
    #[error("change group {id} is already resolved")]
    GroupResolved {
        /// The id of the offending group.
        id: usize,
    },
}

/// Result type for stet operations.
pub type Result<T> = std::result::Result<T, Error>;
