//! Point cloud to surface pipeline.
//!
//! A run validates its options, loads an oriented point set, optionally
//! detects planar shapes, reconstructs a surface and saves it:
//!
//! - [`config`] - declarative options and the pure [`validate`] step
//! - [`detect`](mod@detect) - RANSAC or region growing, written back as segment indices
//! - [`reconstruct`](mod@reconstruct) - detail presets, polygonal or Poisson dispatch
//! - [`pipeline`] - the staged orchestrator and the parallel batch runner
//!
//! Every geometric decision is delegated to a
//! [`GeometryEngine`](polysurf_engine::GeometryEngine); the pipeline only
//! sequences calls and carries errors.
//!
//! # Example
//!
//! ```no_run
//! use polysurf::config::{DetailLevel, PipelineOptions, ReconstructionConfig};
//! use polysurf::run;
//! use polysurf_engine::ScanEngine;
//! use polysurf_io::FileFormat;
//!
//! // Input already carries segment indices
//! let options = PipelineOptions::new(FileFormat::Ply, FileFormat::Off)
//!     .with_shapes_assigned(true)
//!     .with_reconstruction(ReconstructionConfig::Polygonal {
//!         detail: DetailLevel::Less,
//!     });
//!
//! match run(ScanEngine::new(), &options, "building.ply", "building.off") {
//!     Ok(report) => println!("{report}"),
//!     Err(e) => eprintln!("{} failed after {}: {e}", e.kind(), e.last_completed_stage()),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod detect;
mod error;
pub mod pipeline;
pub mod reconstruct;

pub use config::{validate, PipelineOptions, ValidOptions};
pub use detect::{detect, DetectionSummary};
pub use error::{ConfigError, DetectionError, PipelineError, ReconstructionError};
pub use pipeline::{run, Job, Pipeline, PipelineReport, PipelineStage};
pub use reconstruct::{reconstruct, resolve_detail, ReconstructionMethod};
