//! KD-tree helpers and point spacing estimation.

use kiddo::{ImmutableKdTree, SquaredEuclidean};
use nalgebra::Point3;
use polysurf_types::PointSet;
use rayon::prelude::*;

/// Build a KD-tree over the positions of `points`, keyed by ordinal.
///
/// The immutable tree accepts any number of points sharing a coordinate,
/// which planar and duplicated scans produce.
pub(crate) fn build_kdtree(points: &PointSet) -> ImmutableKdTree<f64, 3> {
    let positions: Vec<[f64; 3]> = points.positions().map(query).collect();
    ImmutableKdTree::new_from_slice(&positions)
}

#[inline]
pub(crate) fn query(p: &Point3<f64>) -> [f64; 3] {
    [p.x, p.y, p.z]
}

/// Mean distance from each point to its `k` nearest neighbours.
///
/// Returns 0 when there are fewer than two points or `k` is zero.
///
/// # Example
///
/// ```
/// use polysurf_engine::average_spacing;
/// use polysurf_types::{PointRecord, PointSet, Point3, Vector3};
///
/// let points: PointSet = (0..4)
///     .map(|i| PointRecord::new(Point3::new(f64::from(i), 0.0, 0.0), Vector3::z()))
///     .collect();
///
/// // Each point's nearest neighbour is exactly 1 away
/// assert!((average_spacing(&points, 1) - 1.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn average_spacing(points: &PointSet, k: usize) -> f64 {
    if points.len() < 2 || k == 0 {
        return 0.0;
    }

    let tree = build_kdtree(points);
    let k = k.min(points.len() - 1);
    #[allow(clippy::cast_precision_loss)]
    let (k_f, n_f) = (k as f64, points.len() as f64);

    let total: f64 = points
        .as_slice()
        .par_iter()
        .map(|record| {
            let neighbours = tree.nearest_n::<SquaredEuclidean>(&query(&record.position), k + 1);
            // First hit is the point itself
            let sum: f64 = neighbours.iter().skip(1).map(|n| n.distance.sqrt()).sum();
            sum / k_f
        })
        .sum();

    total / n_f
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use polysurf_types::PointRecord;

    fn grid(n: u32, step: f64) -> PointSet {
        (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .map(|(i, j)| {
                PointRecord::new(
                    Point3::new(f64::from(i) * step, f64::from(j) * step, 0.0),
                    Vector3::z(),
                )
            })
            .collect()
    }

    #[test]
    fn degenerate_inputs_give_zero() {
        assert_relative_eq!(average_spacing(&PointSet::default(), 6), 0.0);
        assert_relative_eq!(average_spacing(&grid(1, 1.0), 6), 0.0);
        assert_relative_eq!(average_spacing(&grid(3, 1.0), 0), 0.0);
    }

    #[test]
    fn nearest_neighbour_on_grid() {
        // Every point of a regular grid has a neighbour exactly `step` away
        let points = grid(4, 0.5);
        assert_relative_eq!(average_spacing(&points, 1), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn k_is_clamped_to_point_count() {
        let points: PointSet = [0.0, 2.0]
            .iter()
            .map(|&x| PointRecord::new(Point3::new(x, 0.0, 0.0), Vector3::z()))
            .collect();
        assert_relative_eq!(average_spacing(&points, 6), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn flat_grid_larger_than_a_bucket() {
        let points = grid(30, 1.0);
        assert_relative_eq!(average_spacing(&points, 1), 1.0, epsilon = 1e-12);
        assert!(average_spacing(&points, 6) > 1.0);
    }

    #[test]
    fn many_identical_points() {
        let points: PointSet = (0..100)
            .map(|_| PointRecord::new(Point3::new(1.0, 2.0, 3.0), Vector3::z()))
            .collect();
        assert_relative_eq!(average_spacing(&points, 6), 0.0);

        let tree = build_kdtree(&points);
        let hits = tree.within::<SquaredEuclidean>(&[1.0, 2.0, 3.0], 1e-6);
        assert_eq!(hits.len(), 100);
    }

    #[test]
    fn kdtree_keys_are_ordinals() {
        let points = grid(3, 1.0);
        let tree = build_kdtree(&points);
        let hit = tree.nearest_one::<SquaredEuclidean>(&[2.0, 1.0, 0.0]);
        assert_eq!(hit.item, 7);
    }
}
