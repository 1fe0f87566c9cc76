//! The load, detect, reconstruct, save orchestrator.
//!
//! A run moves through a fixed sequence of stages:
//!
//! ```text
//! Start -> Validated -> Loaded -> ShapesResolved -> Reconstructed -> Saved
//! ```
//!
//! The first failure ends the run. The returned [`PipelineError`] carries the
//! failing stage's error unchanged.
//!
//! # Example
//!
//! ```no_run
//! use polysurf::config::{DetectionConfig, PipelineOptions};
//! use polysurf::Pipeline;
//! use polysurf_engine::ScanEngine;
//! use polysurf_io::FileFormat;
//!
//! let options = PipelineOptions::new(FileFormat::Xyz, FileFormat::Off)
//!     .with_detection(DetectionConfig::Ransac);
//! let pipeline = Pipeline::new(ScanEngine::new(), &options).unwrap();
//! let report = pipeline.run("scan.xyz", "scan.out.off").unwrap();
//! println!("{report}");
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use polysurf_engine::GeometryEngine;
use polysurf_io::{load_points, save_mesh, save_points, FileFormat, SaveError};
use polysurf_types::{PointSet, SurfaceMesh};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{validate, DetectionConfig, PipelineOptions, ValidOptions};
use crate::detect::{detect, DetectionSummary};
use crate::error::PipelineError;
use crate::reconstruct::reconstruct;

/// Where a run is in the stage sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineStage {
    /// Nothing has run.
    Start,
    /// Options passed validation.
    Validated,
    /// The input point set is in memory.
    Loaded,
    /// Every point carries its final segment index.
    ShapesResolved,
    /// A surface mesh was built.
    Reconstructed,
    /// The mesh was written.
    Saved,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Validated => "validated",
            Self::Loaded => "loaded",
            Self::ShapesResolved => "shapes resolved",
            Self::Reconstructed => "reconstructed",
            Self::Saved => "saved",
        };
        f.write_str(name)
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    /// Input path.
    pub input: PathBuf,
    /// Mesh output path.
    pub output: PathBuf,
    /// Annotated point output path, if one was written.
    pub segments_output: Option<PathBuf>,
    /// Number of points loaded.
    pub points: usize,
    /// Detection method that ran (`none` when shapes were given).
    pub detection_method: &'static str,
    /// Shapes and assigned points after detection.
    pub detection: DetectionSummary,
    /// Reconstruction method that ran.
    pub reconstruction_method: &'static str,
    /// Vertices in the saved mesh.
    pub vertices: usize,
    /// Faces in the saved mesh.
    pub faces: usize,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} -> {}", self.input.display(), self.output.display())?;
        writeln!(
            f,
            "  points:     {} ({} in {} shapes, detection: {})",
            self.points,
            self.detection.assigned_points,
            self.detection.shapes,
            self.detection_method
        )?;
        write!(
            f,
            "  surface:    {} vertices, {} faces ({})",
            self.vertices, self.faces, self.reconstruction_method
        )?;
        if let Some(segments) = &self.segments_output {
            write!(f, "\n  segments:   {}", segments.display())?;
        }
        Ok(())
    }
}

/// One input file and where its results go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Point set to load.
    pub input: PathBuf,
    /// Mesh to write.
    pub output: PathBuf,
    /// Optional annotated point set to write after detection.
    pub segments: Option<PathBuf>,
}

impl Job {
    /// A job writing only the mesh.
    #[must_use]
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            segments: None,
        }
    }

    /// A job writing its mesh next to the input as `<input>.out.<ext>`.
    #[must_use]
    pub fn beside_input(input: impl Into<PathBuf>, format: FileFormat) -> Self {
        let input = input.into();
        let output = default_output_path(&input, format);
        Self {
            input,
            output,
            segments: None,
        }
    }

    /// Also write the annotated point set to `path`.
    #[must_use]
    pub fn with_segments(mut self, path: impl Into<PathBuf>) -> Self {
        self.segments = Some(path.into());
        self
    }
}

/// `<input>.out.<ext>` for the given output format.
///
/// ```
/// use polysurf::pipeline::default_output_path;
/// use polysurf_io::FileFormat;
/// use std::path::Path;
///
/// assert_eq!(
///     default_output_path(Path::new("data/scan.xyz"), FileFormat::Off),
///     Path::new("data/scan.xyz.out.off")
/// );
/// ```
#[must_use]
pub fn default_output_path(input: &Path, format: FileFormat) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".out.");
    name.push(format.extension());
    PathBuf::from(name)
}

/// A validated pipeline bound to a geometry engine.
#[derive(Debug, Clone)]
pub struct Pipeline<E> {
    engine: E,
    options: ValidOptions,
}

impl<E: GeometryEngine> Pipeline<E> {
    /// Validate `options` and bind them to `engine`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if validation fails.
    pub fn new(engine: E, options: &PipelineOptions) -> Result<Self, PipelineError> {
        let valid = validate(options)?;
        if options.shapes_already_assigned && options.detection != DetectionConfig::None {
            warn!(
                detection = options.detection.name(),
                "Shapes are given; detection settings ignored"
            );
        }
        debug!(
            stage = %PipelineStage::Validated,
            detection = valid.detection().name(),
            reconstruction = valid.reconstruction().name(),
            "Options validated"
        );
        Ok(Self::from_valid(engine, valid))
    }

    /// Bind already validated options to `engine`.
    #[must_use]
    pub const fn from_valid(engine: E, options: ValidOptions) -> Self {
        Self { engine, options }
    }

    /// The validated options.
    #[must_use]
    pub const fn options(&self) -> &ValidOptions {
        &self.options
    }

    /// The geometry engine.
    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Load `input`, detect, reconstruct and save the mesh to `output`.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure.
    pub fn run(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<PipelineReport, PipelineError> {
        self.run_job(&Job::new(input.as_ref(), output.as_ref()))
    }

    /// Run a single [`Job`].
    ///
    /// The annotated point set, when requested, is written after the mesh. Its
    /// format is checked before anything is written, and the mesh is removed
    /// again if writing the points fails.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure.
    pub fn run_job(&self, job: &Job) -> Result<PipelineReport, PipelineError> {
        info!(input = %job.input.display(), "Pipeline started");

        let mut points = load_points(&job.input, self.options.input_format())?;
        info!(points = points.len(), stage = %PipelineStage::Loaded, "Input loaded");

        let (detection, mesh) = self.reconstruct_points(&mut points)?;

        let segments = job
            .segments
            .as_ref()
            .map(|path| (path, FileFormat::from_path(path).unwrap_or(FileFormat::Ply)));
        if let Some((_, format)) = segments {
            if !format.can_save_points() {
                return Err(SaveError::UnsupportedFormat {
                    format,
                    what: "point sets",
                }
                .into());
            }
        }

        save_mesh(&mesh, &job.output, self.options.output_format())?;

        if let Some((path, format)) = segments {
            if let Err(err) = save_points(&points, path, format) {
                if let Err(e) = fs::remove_file(&job.output) {
                    warn!(output = %job.output.display(), error = %e, "Failed to remove mesh");
                }
                return Err(err.into());
            }
            debug!(path = %path.display(), %format, "Annotated points saved");
        }
        info!(
            output = %job.output.display(),
            stage = %PipelineStage::Saved,
            "Mesh saved"
        );

        Ok(PipelineReport {
            input: job.input.clone(),
            output: job.output.clone(),
            segments_output: job.segments.clone(),
            points: points.len(),
            detection_method: self.options.detection().name(),
            detection,
            reconstruction_method: self.options.reconstruction().name(),
            vertices: mesh.vertex_count(),
            faces: mesh.face_count(),
        })
    }

    /// Detect shapes in an in-memory point set and reconstruct a mesh.
    ///
    /// Segment indices of `points` are rewritten by detection.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Detection`] or
    /// [`PipelineError::Reconstruction`].
    pub fn reconstruct_points(
        &self,
        points: &mut PointSet,
    ) -> Result<(DetectionSummary, SurfaceMesh), PipelineError> {
        let detection = detect(&self.engine, points, self.options.detection())?;
        debug!(
            stage = %PipelineStage::ShapesResolved,
            shapes = detection.shapes,
            given = self.options.shapes_already_assigned(),
            "Shapes resolved"
        );

        let mesh = reconstruct(&self.engine, points, self.options.reconstruction())?;
        info!(
            method = self.options.reconstruction().name(),
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            stage = %PipelineStage::Reconstructed,
            "Surface reconstructed"
        );
        Ok((detection, mesh))
    }
}

impl<E: GeometryEngine + Sync> Pipeline<E> {
    /// Run independent jobs in parallel.
    ///
    /// Each job owns its point set and mesh; one job's failure does not stop
    /// the others. Results come back in job order.
    pub fn run_batch(&self, jobs: &[Job]) -> Vec<Result<PipelineReport, PipelineError>> {
        info!(jobs = jobs.len(), "Batch started");
        let results: Vec<_> = jobs.par_iter().map(|job| self.run_job(job)).collect();
        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(jobs = jobs.len(), failed, "Batch finished");
        results
    }
}

/// Validate `options` and run one file through `engine`.
///
/// # Errors
///
/// Returns the first stage failure, starting with validation.
pub fn run<E: GeometryEngine>(
    engine: E,
    options: &PipelineOptions,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<PipelineReport, PipelineError> {
    Pipeline::new(engine, options)?.run(input, output)
}
