//! The geometry engine interface consumed by the pipeline.

use polysurf_types::{PointSet, SurfaceMesh};

use crate::error::EngineResult;
use crate::params::{DetailWeights, RegionGrowingParams};

/// A partition of point ordinals into shapes. The position of a group is its
/// shape id.
pub type Partition = Vec<Vec<usize>>;

/// Numerical back end for shape detection and surface reconstruction.
///
/// The pipeline only sequences calls to an engine; every geometric decision
/// happens behind this trait. [`ScanEngine`](crate::ScanEngine) is the
/// built-in implementation.
pub trait GeometryEngine {
    /// Detect planes with RANSAC over all of `points`.
    ///
    /// Returns `None` when no shape is found.
    fn detect_planes_ransac(&self, points: &PointSet) -> Option<Partition>;

    /// Partition `points` into planar regions by region growing.
    ///
    /// An empty partition is a valid result.
    fn grow_regions(&self, points: &PointSet, params: &RegionGrowingParams) -> Partition;

    /// Build a polygonal surface from segmented points.
    ///
    /// `None` weights select the engine's own defaults.
    ///
    /// # Errors
    ///
    /// Returns an error describing why no surface could be built.
    fn reconstruct_polygonal(
        &self,
        points: &PointSet,
        weights: Option<DetailWeights>,
    ) -> EngineResult<SurfaceMesh>;

    /// Build a surface from oriented points at the given sampling `spacing`.
    ///
    /// # Errors
    ///
    /// Returns an error describing why no surface could be built.
    fn reconstruct_poisson(&self, points: &PointSet, spacing: f64) -> EngineResult<SurfaceMesh>;

    /// Mean distance from each point to its `k` nearest neighbours.
    fn average_spacing(&self, points: &PointSet, k: usize) -> f64;
}

impl<E: GeometryEngine + ?Sized> GeometryEngine for &E {
    fn detect_planes_ransac(&self, points: &PointSet) -> Option<Partition> {
        (**self).detect_planes_ransac(points)
    }

    fn grow_regions(&self, points: &PointSet, params: &RegionGrowingParams) -> Partition {
        (**self).grow_regions(points, params)
    }

    fn reconstruct_polygonal(
        &self,
        points: &PointSet,
        weights: Option<DetailWeights>,
    ) -> EngineResult<SurfaceMesh> {
        (**self).reconstruct_polygonal(points, weights)
    }

    fn reconstruct_poisson(&self, points: &PointSet, spacing: f64) -> EngineResult<SurfaceMesh> {
        (**self).reconstruct_poisson(points, spacing)
    }

    fn average_spacing(&self, points: &PointSet, k: usize) -> f64 {
        (**self).average_spacing(points, k)
    }
}
