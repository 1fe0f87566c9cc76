//! Command line arguments and their conversion into pipeline options.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use polysurf::config::{DetailLevel, DetectionConfig, PipelineOptions, ReconstructionConfig};
use polysurf::Job;
use polysurf_engine::RegionGrowingParams;
use polysurf_io::FileFormat;

/// Reconstruct surfaces from oriented point clouds.
///
/// Loads each input, detects planar shapes unless they are given, builds a
/// surface and writes it next to the input as `<input>.out.<ext>` unless an
/// output path is given.
#[derive(Debug, Parser)]
#[command(name = "polysurf", version, about, long_about = None)]
pub struct Cli {
    /// Input point files (PLY or XYZ)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Input format (default: from the inputs' extensions, which must agree)
    #[arg(long)]
    pub informat: Option<FileFormat>,

    /// Output mesh format
    #[arg(long)]
    pub outformat: Option<FileFormat>,

    /// Output mesh path (single input only)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write the annotated points after detection (single input only)
    #[arg(long, value_name = "PATH")]
    pub segments_out: Option<PathBuf>,

    /// Whether the input carries shapes (`planes`) or bare points
    #[arg(long, value_enum)]
    pub given: Option<Given>,

    /// Shape detection method
    #[arg(long = "shdetection", value_enum)]
    pub detection: Option<DetectionArg>,

    /// Region growing neighbourhood radius
    #[arg(long)]
    pub search_radius: Option<f64>,

    /// Region growing maximum point to plane distance
    #[arg(long)]
    pub max_distance: Option<f64>,

    /// Region growing maximum normal deviation in degrees
    #[arg(long)]
    pub max_angle: Option<f64>,

    /// Region growing minimum region size
    #[arg(long)]
    pub min_region_size: Option<usize>,

    /// Reconstruction method
    #[arg(long, value_enum)]
    pub method: Option<MethodArg>,

    /// Level of detail for polygonal reconstruction
    #[arg(long, value_enum)]
    pub lod: Option<LodArg>,

    /// User level of detail: data fitting weight
    #[arg(long)]
    pub fitting: Option<f64>,

    /// User level of detail: coverage weight
    #[arg(long)]
    pub coverage: Option<f64>,

    /// User level of detail: complexity weight
    #[arg(long)]
    pub complexity: Option<f64>,

    /// JSON pipeline options; flags override its fields
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Random seed for RANSAC
    #[arg(long)]
    pub seed: Option<u64>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// What the input file carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Given {
    /// Points with segment indices.
    Planes,
    /// Bare oriented points.
    Points,
}

/// Detection method names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DetectionArg {
    /// RANSAC plane detection.
    Ransac,
    /// Region growing.
    #[value(name = "region_growing", alias = "region-growing")]
    RegionGrowing,
    /// No detection.
    None,
}

/// Reconstruction method names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    /// Polygonal reconstruction.
    Polygonal,
    /// Poisson reconstruction.
    Poisson,
}

/// Level of detail names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LodArg {
    /// Most detail.
    Most,
    /// Engine defaults.
    Normal,
    /// Less detail.
    Less,
    /// Least detail.
    Least,
    /// Weights from `--fitting`, `--coverage` and `--complexity`.
    User,
}

impl Cli {
    /// Build pipeline options from the config file (if any) and the flags.
    ///
    /// Options are not validated here.
    pub fn options(&self) -> Result<PipelineOptions> {
        let base = self.config.as_deref().map(read_config).transpose()?;

        let input_format = match (self.informat, &base) {
            (Some(format), _) => format,
            (None, Some(base)) => base.input_format,
            (None, None) => self.inferred_input_format()?,
        };
        let output_format = self
            .outformat
            .or_else(|| base.as_ref().map(|b| b.output_format))
            .unwrap_or(FileFormat::Off);

        let mut options = base.unwrap_or_else(|| PipelineOptions::new(input_format, output_format));
        options.input_format = input_format;
        options.output_format = output_format;

        if let Some(given) = self.given {
            options.shapes_already_assigned = given == Given::Planes;
        }
        options.detection = self.detection(options.detection);
        options.reconstruction = self.reconstruction(options.reconstruction);
        Ok(options)
    }

    /// One job per input.
    pub fn jobs(&self, output_format: FileFormat) -> Result<Vec<Job>> {
        if self.inputs.len() > 1 && (self.output.is_some() || self.segments_out.is_some()) {
            bail!("--output and --segments-out take a single input");
        }

        Ok(self
            .inputs
            .iter()
            .map(|input| {
                let job = match &self.output {
                    Some(output) => Job::new(input, output),
                    None => Job::beside_input(input, output_format),
                };
                match &self.segments_out {
                    Some(segments) => job.with_segments(segments),
                    None => job,
                }
            })
            .collect())
    }

    /// One format for every input, read from the extensions.
    fn inferred_input_format(&self) -> Result<FileFormat> {
        let mut inferred: Option<(FileFormat, &Path)> = None;
        for input in &self.inputs {
            let format = FileFormat::from_path(input).with_context(|| {
                format!(
                    "cannot tell the format of {} from its extension; pass --informat",
                    input.display()
                )
            })?;
            match inferred {
                None => inferred = Some((format, input.as_path())),
                Some((first, first_path)) if first != format => bail!(
                    "inputs mix {first} ({}) and {format} ({}) files; run them separately or pass --informat",
                    first_path.display(),
                    input.display()
                ),
                Some(_) => {}
            }
        }
        inferred
            .map(|(format, _)| format)
            .context("no input files given")
    }

    fn detection(&self, base: DetectionConfig) -> DetectionConfig {
        match (self.detection, base) {
            (Some(DetectionArg::Ransac), _) => DetectionConfig::Ransac,
            (Some(DetectionArg::None), _) => DetectionConfig::None,
            (Some(DetectionArg::RegionGrowing), DetectionConfig::RegionGrowing(params))
            | (None, DetectionConfig::RegionGrowing(params)) => {
                DetectionConfig::RegionGrowing(self.region_params(params))
            }
            (Some(DetectionArg::RegionGrowing), _) => {
                DetectionConfig::RegionGrowing(self.region_params(RegionGrowingParams::default()))
            }
            (None, other) => other,
        }
    }

    fn region_params(&self, mut params: RegionGrowingParams) -> RegionGrowingParams {
        if let Some(radius) = self.search_radius {
            params.search_radius = radius;
        }
        if let Some(distance) = self.max_distance {
            params.max_distance_to_plane = distance;
        }
        if let Some(angle) = self.max_angle {
            params.max_angle_degrees = angle;
        }
        if let Some(size) = self.min_region_size {
            params.min_region_size = size;
        }
        params
    }

    fn reconstruction(&self, base: ReconstructionConfig) -> ReconstructionConfig {
        let base_detail = match base {
            ReconstructionConfig::Polygonal { detail } => detail,
            ReconstructionConfig::Poisson => DetailLevel::Normal,
        };
        let detail = self.detail().unwrap_or(base_detail);

        match (self.method, base) {
            (Some(MethodArg::Poisson), _) => ReconstructionConfig::Poisson,
            (Some(MethodArg::Polygonal), _) | (None, ReconstructionConfig::Polygonal { .. }) => {
                ReconstructionConfig::Polygonal { detail }
            }
            (None, ReconstructionConfig::Poisson) => ReconstructionConfig::Poisson,
        }
    }

    fn detail(&self) -> Option<DetailLevel> {
        let has_weights =
            self.fitting.is_some() || self.coverage.is_some() || self.complexity.is_some();
        let level = match self.lod {
            Some(LodArg::Most) => DetailLevel::Most,
            Some(LodArg::Normal) => DetailLevel::Normal,
            Some(LodArg::Less) => DetailLevel::Less,
            Some(LodArg::Least) => DetailLevel::Least,
            Some(LodArg::User) => self.user_detail(),
            None if has_weights => self.user_detail(),
            None => return None,
        };
        Some(level)
    }

    const fn user_detail(&self) -> DetailLevel {
        DetailLevel::User {
            fitting: self.fitting,
            coverage: self.coverage,
            complexity: self.complexity,
        }
    }
}

fn read_config(path: &Path) -> Result<PipelineOptions> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}
