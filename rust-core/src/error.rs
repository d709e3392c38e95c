//! Error taxonomy for sampling, precompute and transform operations

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, TransformError>;

/// Errors surfaced by grid construction, precomputation and transforms
///
/// All operations validate their parameters before any computation begins;
/// partial results are never returned. Operations are deterministic pure
/// functions, so nothing is retried internally.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Bad bandlimit, unrecognized sampling scheme, array shape that does
    /// not match the grid, or a precompute bundle keyed for a different
    /// transform.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A requested array is too large to address. Precompute kernels scale
    /// as O(L^3) (and O(N L^3) for rotation-group transforms), so this is a
    /// hard ceiling rather than a cache-eviction event.
    #[error("allocation of {elements} f64 elements is not feasible")]
    OutOfMemory { elements: u128 },
}

impl TransformError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        TransformError::InvalidParameter(msg.into())
    }
}
