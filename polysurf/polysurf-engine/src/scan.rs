//! Built-in geometry engine.

use polysurf_types::{PointSet, SurfaceMesh};
use tracing::debug;

use crate::engine::{GeometryEngine, Partition};
use crate::error::EngineResult;
use crate::params::{DetailWeights, RegionGrowingParams, ScanEngineParams};
use crate::{implicit, polygonal, ransac, region_growing, spatial};

/// Geometry engine implemented in this crate.
///
/// Plane detection and region growing are complete implementations. Polygonal
/// reconstruction emits one convex face per segment and does not solve a face
/// selection problem, so detail weights are accepted but do not change the
/// output. Poisson reconstruction polygonises a signed distance field rather
/// than solving the Poisson equation.
///
/// # Example
///
/// ```
/// use polysurf_engine::{GeometryEngine, ScanEngine};
/// use polysurf_types::{PointRecord, PointSet, Point3, Vector3};
///
/// let points: PointSet = (0..5)
///     .flat_map(|i| (0..5).map(move |j| (i, j)))
///     .map(|(i, j)| PointRecord::new(Point3::new(f64::from(i), f64::from(j), 0.0), Vector3::z()))
///     .collect();
///
/// let engine = ScanEngine::new();
/// let planes = engine.detect_planes_ransac(&points).unwrap();
/// assert_eq!(planes.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScanEngine {
    params: ScanEngineParams,
}

impl ScanEngine {
    /// Engine with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with the given parameters.
    #[must_use]
    pub const fn with_params(params: ScanEngineParams) -> Self {
        Self { params }
    }

    /// Current parameters.
    #[must_use]
    pub const fn params(&self) -> &ScanEngineParams {
        &self.params
    }
}

impl GeometryEngine for ScanEngine {
    fn detect_planes_ransac(&self, points: &PointSet) -> Option<Partition> {
        let shapes = ransac::detect_planes(points, &self.params);
        (!shapes.is_empty()).then_some(shapes)
    }

    fn grow_regions(&self, points: &PointSet, params: &RegionGrowingParams) -> Partition {
        region_growing::grow_regions(points, params)
    }

    fn reconstruct_polygonal(
        &self,
        points: &PointSet,
        weights: Option<DetailWeights>,
    ) -> EngineResult<SurfaceMesh> {
        let weights = weights.unwrap_or(self.params.default_weights);
        debug!(%weights, "Face selection weights");
        polygonal::reconstruct(points, weights, self.params.polygonal_min_support)
    }

    fn reconstruct_poisson(&self, points: &PointSet, spacing: f64) -> EngineResult<SurfaceMesh> {
        implicit::reconstruct(points, spacing, &self.params)
    }

    fn average_spacing(&self, points: &PointSet, k: usize) -> f64 {
        spatial::average_spacing(points, k)
    }
}
