//! Region growing plane detection.

use kiddo::SquaredEuclidean;
use polysurf_types::PointSet;
use tracing::{debug, warn};

use crate::params::RegionGrowingParams;
use crate::plane::Plane;
use crate::spatial::{build_kdtree, query};

/// Partition `points` into planar regions.
///
/// Seeds are visited in ordinal order. A region grows breadth-first through
/// sphere neighbourhoods, re-fitting its plane each time it doubles in size.
/// Regions below `min_region_size` release their points, which later seeds
/// may claim. Points without a usable normal neither seed nor join a region.
pub(crate) fn grow_regions(points: &PointSet, params: &RegionGrowingParams) -> Vec<Vec<usize>> {
    if let Err(e) = params.validate() {
        warn!(error = %e, "Region growing skipped");
        return Vec::new();
    }
    if points.is_empty() {
        return Vec::new();
    }

    let tree = build_kdtree(points);
    let radius_sq = params.search_radius * params.search_radius;
    let min_cos = params.min_normal_cosine();

    let accepts = |plane: &Plane, ordinal: usize| {
        let record = &points[ordinal];
        if !record.has_normal() {
            return false;
        }
        let n = record.normal;
        plane.signed_distance(&record.position).abs() <= params.max_distance_to_plane
            && n.dot(&plane.normal).abs() >= min_cos * n.norm()
    };

    let mut claimed = vec![false; points.len()];
    let mut regions = Vec::new();
    let mut rejected = 0usize;

    for seed in 0..points.len() {
        if claimed[seed] || !points[seed].has_normal() {
            continue;
        }
        let Some(mut plane) = Plane::from_point_normal(&points[seed].position, &points[seed].normal)
        else {
            continue;
        };

        claimed[seed] = true;
        let mut region = vec![seed];
        let mut last_fit = 1usize;
        let mut cursor = 0usize;

        while cursor < region.len() {
            let current = region[cursor];
            cursor += 1;

            let neighbours =
                tree.within::<SquaredEuclidean>(&query(&points[current].position), radius_sq);
            for neighbour in neighbours {
                #[allow(clippy::cast_possible_truncation)]
                let j = neighbour.item as usize;
                if !claimed[j] && accepts(&plane, j) {
                    claimed[j] = true;
                    region.push(j);
                }
            }

            if region.len() >= 3 && region.len() >= 2 * last_fit {
                if let Some(fitted) = Plane::fit(region.iter().map(|&i| &points[i].position)) {
                    // Keep the seed's orientation
                    plane = if fitted.normal.dot(&plane.normal) < 0.0 {
                        fitted.flipped()
                    } else {
                        fitted
                    };
                }
                last_fit = region.len();
            }
        }

        if region.len() >= params.min_region_size {
            region.sort_unstable();
            regions.push(region);
        } else {
            for &i in &region {
                claimed[i] = false;
            }
            // The seed stays visited through loop order
            rejected += 1;
        }
    }

    debug!(
        regions = regions.len(),
        rejected,
        unassigned = claimed.iter().filter(|&&c| !c).count(),
        "Region growing finished"
    );
    regions
}
