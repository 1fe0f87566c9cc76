//! RANSAC plane extraction.
//!
//! Planes are extracted one at a time: sample candidate planes through three
//! random unclaimed points, keep the candidate with the most inliers, refine
//! it by least squares, claim its inliers, repeat until no candidate reaches
//! the minimum support.

use polysurf_types::PointSet;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use tracing::debug;

use crate::params::ScanEngineParams;
use crate::plane::Plane;

/// Inlier test shared by candidate scoring and refinement.
struct InlierTest<'a> {
    points: &'a PointSet,
    epsilon: f64,
    normal_threshold: Option<f64>,
}

impl InlierTest<'_> {
    fn accepts(&self, plane: &Plane, ordinal: usize) -> bool {
        let record = &self.points[ordinal];
        if plane.signed_distance(&record.position).abs() > self.epsilon {
            return false;
        }
        match self.normal_threshold {
            Some(threshold) => {
                let n = record.normal;
                n.dot(&plane.normal).abs() >= threshold * n.norm()
            }
            None => true,
        }
    }

    fn collect(&self, plane: &Plane, candidates: &[usize]) -> Vec<usize> {
        candidates
            .iter()
            .copied()
            .filter(|&i| self.accepts(plane, i))
            .collect()
    }
}

/// Extract planar shapes from `points`.
///
/// Returns one ordinal list per shape, in extraction order. Normals are only
/// consulted when every point has one.
pub(crate) fn detect_planes(points: &PointSet, params: &ScanEngineParams) -> Vec<Vec<usize>> {
    let n = points.len();
    let diagonal = points.bounds().diagonal();
    if n < 3 || diagonal <= 0.0 {
        return Vec::new();
    }

    let test = InlierTest {
        points,
        epsilon: params.ransac_epsilon_ratio * diagonal,
        normal_threshold: points
            .has_normals()
            .then_some(params.ransac_normal_threshold),
    };
    let min_points = params.ransac_min_points(n);
    let max_shapes = params.ransac_max_shapes.unwrap_or(usize::MAX);

    debug!(
        points = n,
        epsilon = test.epsilon,
        min_points,
        iterations = params.ransac_iterations,
        "Starting RANSAC plane detection"
    );

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut remaining: Vec<usize> = (0..n).collect();
    let mut shapes = Vec::new();

    while remaining.len() >= min_points.max(3) && shapes.len() < max_shapes {
        let mut best: Vec<usize> = Vec::new();
        let mut best_plane = None;

        for _ in 0..params.ransac_iterations {
            let picked = sample(&mut rng, remaining.len(), 3);
            let (a, b, c) = (
                remaining[picked.index(0)],
                remaining[picked.index(1)],
                remaining[picked.index(2)],
            );
            let Some(plane) = Plane::through(
                &points[a].position,
                &points[b].position,
                &points[c].position,
            ) else {
                continue;
            };

            let inliers = test.collect(&plane, &remaining);
            if inliers.len() > best.len() {
                best = inliers;
                best_plane = Some(plane);
            }
        }

        let Some(plane) = best_plane else { break };
        if best.len() < min_points {
            break;
        }

        // Least-squares refinement, kept only if it does not lose support
        if let Some(refined) = Plane::fit(best.iter().map(|&i| &points[i].position)) {
            let refit = test.collect(&refined, &remaining);
            if refit.len() >= best.len() {
                best = refit;
            }
        } else {
            debug!(normal = ?plane.normal, "Refinement skipped for degenerate support");
        }

        let mut claimed = vec![false; n];
        for &i in &best {
            claimed[i] = true;
        }
        remaining.retain(|&i| !claimed[i]);

        debug!(
            shape = shapes.len(),
            support = best.len(),
            remaining = remaining.len(),
            "Extracted plane"
        );
        shapes.push(best);
    }

    shapes
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};
    use polysurf_types::PointRecord;

    /// Two perpendicular 6x6 patches: z = 0 and x = 10.
    fn two_planes() -> PointSet {
        let mut records = Vec::new();
        for i in 0..6 {
            for j in 0..6 {
                let (u, v) = (f64::from(i), f64::from(j));
                records.push(PointRecord::new(Point3::new(u, v, 0.0), Vector3::z()));
            }
        }
        for i in 0..6 {
            for j in 0..6 {
                let (u, v) = (f64::from(i), f64::from(j));
                records.push(PointRecord::new(Point3::new(10.0, u, v + 1.0), Vector3::x()));
            }
        }
        PointSet::from(records)
    }

    #[test]
    fn finds_both_planes() {
        let points = two_planes();
        let shapes = detect_planes(&points, &ScanEngineParams::default());

        assert_eq!(shapes.len(), 2);
        let mut sizes: Vec<usize> = shapes.iter().map(Vec::len).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![36, 36]);

        // No ordinal claimed twice
        let mut all: Vec<usize> = shapes.concat();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 72);
    }

    #[test]
    fn seeded_detection_is_reproducible() {
        let points = two_planes();
        let params = ScanEngineParams::default().with_seed(7);
        assert_eq!(detect_planes(&points, &params), detect_planes(&points, &params));
    }

    #[test]
    fn max_shapes_limits_output() {
        let points = two_planes();
        let params = ScanEngineParams::default().with_ransac_max_shapes(Some(1));
        assert_eq!(detect_planes(&points, &params).len(), 1);
    }

    #[test]
    fn collinear_points_yield_nothing() {
        let points: PointSet = (0..10)
            .map(|i| PointRecord::new(Point3::new(f64::from(i), 0.0, 0.0), Vector3::z()))
            .collect();
        assert!(detect_planes(&points, &ScanEngineParams::default()).is_empty());
    }

    #[test]
    fn too_few_points_yield_nothing() {
        let points: PointSet = (0..2)
            .map(|i| PointRecord::new(Point3::new(f64::from(i), 1.0, 0.0), Vector3::z()))
            .collect();
        assert!(detect_planes(&points, &ScanEngineParams::default()).is_empty());
    }
}
