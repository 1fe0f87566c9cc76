//! Declarative pipeline options and their validation.
//!
//! [`PipelineOptions`] is what callers build (or deserialize from JSON).
//! [`validate`] checks it once, before any I/O, and returns [`ValidOptions`],
//! the only form the pipeline runs from.
//!
//! # Example
//!
//! ```
//! use polysurf::config::{
//!     validate, DetailLevel, DetectionConfig, PipelineOptions, ReconstructionConfig,
//! };
//! use polysurf::ConfigError;
//! use polysurf_io::FileFormat;
//!
//! let options = PipelineOptions::new(FileFormat::Xyz, FileFormat::Off);
//! assert_eq!(validate(&options), Err(ConfigError::MissingDetectionConfig));
//!
//! let options = options
//!     .with_detection(DetectionConfig::Ransac)
//!     .with_reconstruction(ReconstructionConfig::Polygonal {
//!         detail: DetailLevel::Most,
//!     });
//! assert!(validate(&options).is_ok());
//! ```

use polysurf_engine::RegionGrowingParams;
use polysurf_io::FileFormat;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::reconstruct::ReconstructionMethod;

/// How shapes are detected when they are not already assigned.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionConfig {
    /// RANSAC plane detection with engine defaults.
    Ransac,
    /// Region growing with explicit tolerances.
    RegionGrowing(RegionGrowingParams),
    /// No detection. Only valid when shapes are already assigned.
    #[default]
    None,
}

impl DetectionConfig {
    /// Short method name for logs and reports.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ransac => "ransac",
            Self::RegionGrowing(_) => "region_growing",
            Self::None => "none",
        }
    }
}

/// Level of detail of a polygonal reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "preset", rename_all = "snake_case")]
pub enum DetailLevel {
    /// Favour fitting the data closely.
    Most,
    /// Engine defaults.
    #[default]
    Normal,
    /// Favour simpler models.
    Less,
    /// Favour the simplest models.
    Least,
    /// Caller supplied weights. All three must be present.
    User {
        /// Data fitting weight.
        #[serde(default)]
        fitting: Option<f64>,
        /// Point coverage weight.
        #[serde(default)]
        coverage: Option<f64>,
        /// Model complexity weight.
        #[serde(default)]
        complexity: Option<f64>,
    },
}

impl DetailLevel {
    /// A user level with all three weights set.
    #[must_use]
    pub const fn user(fitting: f64, coverage: f64, complexity: f64) -> Self {
        Self::User {
            fitting: Some(fitting),
            coverage: Some(coverage),
            complexity: Some(complexity),
        }
    }
}

/// Which reconstruction runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconstructionConfig {
    /// Polygonal reconstruction from detected planes.
    Polygonal {
        /// Level of detail.
        #[serde(default)]
        detail: DetailLevel,
    },
    /// Poisson surface reconstruction.
    Poisson,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self::Polygonal {
            detail: DetailLevel::Normal,
        }
    }
}

/// Everything a pipeline run needs to know, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Format of the input point set.
    pub input_format: FileFormat,
    /// Format of the output mesh.
    pub output_format: FileFormat,
    /// Whether the input already carries segment indices.
    #[serde(default)]
    pub shapes_already_assigned: bool,
    /// Detection method. Required unless shapes are already assigned.
    #[serde(default)]
    pub detection: DetectionConfig,
    /// Reconstruction method.
    #[serde(default)]
    pub reconstruction: ReconstructionConfig,
}

impl PipelineOptions {
    /// Options with no detection and default polygonal reconstruction.
    #[must_use]
    pub fn new(input_format: FileFormat, output_format: FileFormat) -> Self {
        Self {
            input_format,
            output_format,
            shapes_already_assigned: false,
            detection: DetectionConfig::None,
            reconstruction: ReconstructionConfig::default(),
        }
    }

    /// Mark whether the input already carries segment indices.
    #[must_use]
    pub const fn with_shapes_assigned(mut self, assigned: bool) -> Self {
        self.shapes_already_assigned = assigned;
        self
    }

    /// Set the detection method.
    #[must_use]
    pub const fn with_detection(mut self, detection: DetectionConfig) -> Self {
        self.detection = detection;
        self
    }

    /// Set the reconstruction method.
    #[must_use]
    pub const fn with_reconstruction(mut self, reconstruction: ReconstructionConfig) -> Self {
        self.reconstruction = reconstruction;
        self
    }
}

/// Options that passed [`validate`].
///
/// Detection is [`DetectionConfig::None`] exactly when shapes are already
/// assigned, and polygonal detail levels are resolved to concrete weights.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidOptions {
    input_format: FileFormat,
    output_format: FileFormat,
    shapes_already_assigned: bool,
    detection: DetectionConfig,
    reconstruction: ReconstructionMethod,
}

impl ValidOptions {
    /// Format of the input point set.
    #[must_use]
    pub const fn input_format(&self) -> FileFormat {
        self.input_format
    }

    /// Format of the output mesh.
    #[must_use]
    pub const fn output_format(&self) -> FileFormat {
        self.output_format
    }

    /// Whether detection is skipped because the input carries shapes.
    #[must_use]
    pub const fn shapes_already_assigned(&self) -> bool {
        self.shapes_already_assigned
    }

    /// Detection method to run.
    #[must_use]
    pub const fn detection(&self) -> &DetectionConfig {
        &self.detection
    }

    /// Reconstruction to run.
    #[must_use]
    pub const fn reconstruction(&self) -> &ReconstructionMethod {
        &self.reconstruction
    }
}

/// Check `options` and resolve them for a run.
///
/// Detection settings are ignored when shapes are already assigned.
///
/// # Errors
///
/// - [`ConfigError::MissingDetectionConfig`] if shapes are not assigned and
///   detection is [`DetectionConfig::None`]
/// - [`ConfigError::MissingDetailParameters`] if a user detail level lacks a
///   weight
/// - [`ConfigError::InvalidParameter`] if region growing tolerances or user
///   weights are out of range
pub fn validate(options: &PipelineOptions) -> Result<ValidOptions, ConfigError> {
    let detection = if options.shapes_already_assigned {
        DetectionConfig::None
    } else {
        match options.detection {
            DetectionConfig::None => return Err(ConfigError::MissingDetectionConfig),
            DetectionConfig::RegionGrowing(params) => {
                params.validate()?;
                DetectionConfig::RegionGrowing(params)
            }
            DetectionConfig::Ransac => DetectionConfig::Ransac,
        }
    };

    let reconstruction = ReconstructionMethod::from_config(&options.reconstruction)?;

    Ok(ValidOptions {
        input_format: options.input_format,
        output_format: options.output_format,
        shapes_already_assigned: options.shapes_already_assigned,
        detection,
        reconstruction,
    })
}
