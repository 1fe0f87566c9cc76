//! Error types for geometry engine operations.

use thiserror::Error;

/// Result type for geometry engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors reported by a geometry engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The point set is empty.
    #[error("point set is empty")]
    EmptyPointSet,

    /// A point lacks the oriented normal the operation needs.
    #[error("point {index} has no usable normal")]
    MissingNormal {
        /// Ordinal of the first offending point.
        index: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {reason}")]
    InvalidParameter {
        /// Description of why the parameter is invalid.
        reason: String,
    },

    /// No segment carries enough points to support a planar face.
    #[error("no segment supports a planar face ({segments} segments examined)")]
    NoSupportingSegments {
        /// Number of segments present in the point set.
        segments: usize,
    },

    /// Reconstruction finished without producing any face.
    #[error("reconstruction produced an empty surface")]
    EmptySurface,
}

impl EngineError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }
}
