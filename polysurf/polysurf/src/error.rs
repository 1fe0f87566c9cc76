//! Error types for each pipeline stage.

use polysurf_engine::EngineError;
use polysurf_io::{LoadError, SaveError};
use thiserror::Error;

use crate::pipeline::PipelineStage;

/// Errors found while validating pipeline options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Shapes are not pre-assigned and no detection method was chosen.
    #[error("shapes are not assigned and no detection method is configured")]
    MissingDetectionConfig,

    /// A user detail level lacks one or more weights.
    #[error("user detail level is missing weights: {missing}")]
    MissingDetailParameters {
        /// Comma separated names of the missing weights.
        missing: String,
    },

    /// A parameter is present but outside its valid range.
    #[error("invalid parameter: {reason}")]
    InvalidParameter {
        /// Description of why the parameter is invalid.
        reason: String,
    },
}

impl From<EngineError> for ConfigError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidParameter { reason } => Self::InvalidParameter { reason },
            other => Self::InvalidParameter {
                reason: other.to_string(),
            },
        }
    }
}

/// Errors from the shape detection stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectionError {
    /// RANSAC reported no shape.
    #[error("shape detection found no shapes")]
    NoShapesFound,
}

/// Errors from the reconstruction stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconstructionError {
    /// The polygonal solver failed; carries the engine's diagnostic.
    #[error("polygonal reconstruction failed: {message}")]
    SolverFailed {
        /// Engine diagnostic.
        message: String,
    },

    /// Poisson reconstruction failed.
    #[error("poisson reconstruction failed: {reason}")]
    PoissonFailed {
        /// Engine diagnostic.
        reason: String,
    },
}

/// The first failure of a pipeline run, tagged by the stage that raised it.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Options were rejected before any I/O.
    #[error("configuration rejected")]
    Config(#[from] ConfigError),

    /// The input could not be loaded.
    #[error("loading input failed")]
    Load(#[from] LoadError),

    /// Shape detection failed.
    #[error("shape detection failed")]
    Detection(#[from] DetectionError),

    /// Reconstruction failed.
    #[error("reconstruction failed")]
    Reconstruction(#[from] ReconstructionError),

    /// The output could not be saved.
    #[error("saving output failed")]
    Save(#[from] SaveError),
}

impl PipelineError {
    /// The last stage the run completed before failing.
    #[must_use]
    pub const fn last_completed_stage(&self) -> PipelineStage {
        match self {
            Self::Config(_) => PipelineStage::Start,
            Self::Load(_) => PipelineStage::Validated,
            Self::Detection(_) => PipelineStage::Loaded,
            Self::Reconstruction(_) => PipelineStage::ShapesResolved,
            Self::Save(_) => PipelineStage::Reconstructed,
        }
    }

    /// Short name of the failing stage's error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Load(_) => "load",
            Self::Detection(_) => "detection",
            Self::Reconstruction(_) => "reconstruction",
            Self::Save(_) => "save",
        }
    }
}
