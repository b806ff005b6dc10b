use thiserror::Error;

/// Errors produced internally while associating a detection.
///
/// Per spec.md §7 none of these ever escape the public `associate` call:
/// they are caught at the orchestrator boundary, logged, and answered
/// with a freshly created track. They exist so the fallback path has a
/// typed reason to log rather than a generic `unreachable!()`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GtmError {
    /// A detection is missing a field mandatory per spec.md §3
    /// (after timestamp defaulting).
    #[error("detection is missing mandatory field: {0}")]
    InvalidInput(&'static str),

    /// `embedding` was present but not of length `feature_dim`.
    ///
    /// Handled internally by the similarity kernel (returns 0.0), this
    /// variant exists only so the condition can be logged with a
    /// specific cause at the call site that first observes it.
    #[error("embedding has dimension {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Any other unexpected condition encountered while matching or
    /// updating a track.
    #[error("internal fault during association: {0}")]
    InternalFault(String),
}
