//! Error types for lifting-flow.

/// Errors reported to callers of the evaluation engine.
///
/// Broken invariants (malformed stage descriptors, unbalanced or re-entrant
/// call stacks) are not represented here: they panic, because they indicate a
/// bug in the filter table or the dependency graph rather than bad input.
#[derive(Debug, thiserror::Error)]
pub enum LiftingError {
    /// Returned when a wavelet identifier or name is not in the filter table.
    #[error("unknown wavelet: {0}")]
    UnknownWavelet(String),

    /// Returned when an array is read outside `0..len`.
    #[error("index {index} out of range for array '{array}' of length {len}")]
    IndexOutOfRange {
        /// Name of the array being read.
        array: String,
        /// Requested index.
        index: usize,
        /// Length of the array.
        len: usize,
    },

    /// Returned when a slot has no value and its array has no rule to compute one.
    #[error("slot {index} of array '{array}' has no value and no rule to compute it")]
    Unresolvable {
        /// Name of the array being read.
        array: String,
        /// Index of the unresolved slot.
        index: usize,
    },

    /// Returned when a transform chain is built from too few samples.
    #[error("input too short: got {len} samples, need at least {min}")]
    InputTooShort {
        /// Number of samples provided.
        len: usize,
        /// Minimum number of samples required.
        min: usize,
    },

    /// Returned when a lifted sample does not fit in an `i64`.
    #[error("lifting overflowed i64 at index {index} (reading array '{array}')")]
    Overflow {
        /// Name of the array the stage was reading.
        array: String,
        /// Index of the sample being updated.
        index: usize,
    },

    /// Returned when nested computations exceed the configured call depth.
    #[error("call depth {depth} exceeds the configured maximum")]
    CallDepthExceeded {
        /// Depth the rejected call would have had.
        depth: usize,
    },

    /// Returned when a session record cannot be written.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when a session record or configuration cannot be (de)serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
