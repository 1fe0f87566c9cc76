//! Shape detection stage.

use polysurf_engine::GeometryEngine;
use polysurf_types::{PointSet, SegmentIndexMap};
use tracing::{debug, info, warn};

use crate::config::DetectionConfig;
use crate::error::DetectionError;

/// What a detection pass produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DetectionSummary {
    /// Number of shapes reported by the engine.
    pub shapes: usize,
    /// Points that ended up with a segment index.
    pub assigned_points: usize,
}

/// Detect shapes in `points` and write their segment indices.
///
/// Every point is re-indexed: members of shape `k` get `k`, all others
/// [`UNASSIGNED`](polysurf_types::UNASSIGNED). [`DetectionConfig::None`]
/// leaves the points untouched.
///
/// Region growing accepts an empty partition, leaving every point
/// unassigned. RANSAC does not.
///
/// # Errors
///
/// Returns [`DetectionError::NoShapesFound`] if RANSAC finds no shape.
pub fn detect<E: GeometryEngine + ?Sized>(
    engine: &E,
    points: &mut PointSet,
    config: &DetectionConfig,
) -> Result<DetectionSummary, DetectionError> {
    let partition = match config {
        DetectionConfig::None => {
            debug!("Shape detection skipped");
            return Ok(DetectionSummary {
                shapes: points.segment_count(),
                assigned_points: points.assigned_count(),
            });
        }
        DetectionConfig::Ransac => match engine.detect_planes_ransac(points) {
            Some(partition) if !partition.is_empty() => partition,
            _ => return Err(DetectionError::NoShapesFound),
        },
        DetectionConfig::RegionGrowing(params) => {
            let regions = engine.grow_regions(points, params);
            if regions.is_empty() {
                warn!(points = points.len(), "Region growing found no regions");
            }
            regions
        }
    };

    let map = SegmentIndexMap::build(points.len(), &partition);
    map.apply_to(points);

    let summary = DetectionSummary {
        shapes: partition.len(),
        assigned_points: map.assigned_count(),
    };
    info!(
        method = config.name(),
        shapes = summary.shapes,
        assigned = summary.assigned_points,
        unassigned = points.len() - summary.assigned_points,
        "Shape detection complete"
    );
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};
    use polysurf_engine::{
        DetailWeights, EngineError, EngineResult, Partition, RegionGrowingParams,
    };
    use polysurf_types::{PointRecord, SurfaceMesh, UNASSIGNED};

    /// Engine that returns canned partitions.
    struct Canned {
        ransac: Option<Partition>,
        regions: Partition,
    }

    impl GeometryEngine for Canned {
        fn detect_planes_ransac(&self, _: &PointSet) -> Option<Partition> {
            self.ransac.clone()
        }

        fn grow_regions(&self, _: &PointSet, _: &RegionGrowingParams) -> Partition {
            self.regions.clone()
        }

        fn reconstruct_polygonal(
            &self,
            _: &PointSet,
            _: Option<DetailWeights>,
        ) -> EngineResult<SurfaceMesh> {
            Err(EngineError::EmptySurface)
        }

        fn reconstruct_poisson(&self, _: &PointSet, _: f64) -> EngineResult<SurfaceMesh> {
            Err(EngineError::EmptySurface)
        }

        fn average_spacing(&self, _: &PointSet, _: usize) -> f64 {
            0.0
        }
    }

    fn points(n: usize, segment: i32) -> PointSet {
        (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let x = i as f64;
                PointRecord::with_segment(Point3::new(x, 0.0, 0.0), Vector3::z(), segment)
            })
            .collect()
    }

    fn indices(points: &PointSet) -> Vec<i32> {
        points.iter().map(PointRecord::segment_index).collect()
    }

    #[test]
    fn ransac_partition_is_applied() {
        let engine = Canned {
            ransac: Some(vec![vec![0, 2], vec![1]]),
            regions: Vec::new(),
        };
        let mut pts = points(4, 7);
        let summary = detect(&engine, &mut pts, &DetectionConfig::Ransac).unwrap();

        assert_eq!(indices(&pts), vec![0, 1, 0, UNASSIGNED]);
        assert_eq!(
            summary,
            DetectionSummary {
                shapes: 2,
                assigned_points: 3
            }
        );
    }

    #[test]
    fn ransac_without_shapes_fails() {
        for ransac in [None, Some(Vec::new())] {
            let engine = Canned {
                ransac,
                regions: Vec::new(),
            };
            let mut pts = points(3, UNASSIGNED);
            assert_eq!(
                detect(&engine, &mut pts, &DetectionConfig::Ransac),
                Err(DetectionError::NoShapesFound)
            );
        }
    }

    #[test]
    fn empty_region_growing_unassigns_everything() {
        let engine = Canned {
            ransac: None,
            regions: Vec::new(),
        };
        let mut pts = points(5, 3);
        let config = DetectionConfig::RegionGrowing(RegionGrowingParams::default());
        let summary = detect(&engine, &mut pts, &config).unwrap();

        assert_eq!(summary.shapes, 0);
        assert!(indices(&pts).iter().all(|&s| s == UNASSIGNED));
    }

    #[test]
    fn none_leaves_points_alone() {
        let engine = Canned {
            ransac: None,
            regions: Vec::new(),
        };
        let mut pts = points(3, 1);
        let summary = detect(&engine, &mut pts, &DetectionConfig::None).unwrap();

        assert_eq!(indices(&pts), vec![1, 1, 1]);
        assert_eq!(summary.shapes, 1);
        assert_eq!(summary.assigned_points, 3);
    }
}
