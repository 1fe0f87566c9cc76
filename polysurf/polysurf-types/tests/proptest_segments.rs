//! Property-based tests for segment index maps.

#![allow(clippy::unwrap_used, clippy::cast_possible_truncation)]

use polysurf_types::{PointRecord, PointSet, SegmentIndexMap, UNASSIGNED};
use proptest::prelude::*;

use nalgebra::{Point3, Vector3};

/// Random disjoint partition of a subset of `0..n`: each ordinal is either
/// dropped or sent to one of `k` groups.
fn partition_strategy() -> impl Strategy<Value = (usize, Vec<Vec<usize>>)> {
    (1usize..64, 0usize..8).prop_flat_map(|(n, k)| {
        prop::collection::vec(prop::option::of(0..k.max(1)), n).prop_map(move |slots| {
            let mut groups = vec![Vec::new(); k];
            for (ordinal, slot) in slots.into_iter().enumerate() {
                if let (Some(g), true) = (slot, k > 0) {
                    groups[g].push(ordinal);
                }
            }
            (n, groups)
        })
    })
}

fn point_set(n: usize) -> PointSet {
    (0..n)
        .map(|i| PointRecord::new(Point3::new(i as f64, 0.0, 0.0), Vector3::z()))
        .collect()
}

proptest! {
    #[test]
    fn every_point_gets_one_id_in_range((n, groups) in partition_strategy()) {
        let mut points = point_set(n);
        SegmentIndexMap::build(n, &groups).apply_to(&mut points);

        prop_assert_eq!(points.len(), n);
        for record in &points {
            let id = record.segment_index();
            prop_assert!(id == UNASSIGNED || (id >= 0 && (id as usize) < groups.len()));
        }
    }

    #[test]
    fn groups_plus_unassigned_cover_all_points((n, groups) in partition_strategy()) {
        let mut points = point_set(n);
        SegmentIndexMap::build(n, &groups).apply_to(&mut points);

        let mut seen = vec![0usize; n];
        for (g, group) in groups.iter().enumerate() {
            for &ordinal in group {
                prop_assert_eq!(points[ordinal].segment_index(), g as i32);
                seen[ordinal] += 1;
            }
        }
        for (ordinal, count) in seen.iter().enumerate() {
            if *count == 0 {
                prop_assert_eq!(points[ordinal].segment_index(), UNASSIGNED);
            } else {
                prop_assert_eq!(*count, 1);
            }
        }
    }

    #[test]
    fn lookup_matches_applied_ids((n, groups) in partition_strategy()) {
        let map = SegmentIndexMap::build(n, &groups);
        let mut points = point_set(n);
        map.apply_to(&mut points);

        for ordinal in 0..n {
            prop_assert_eq!(map.lookup(ordinal), points[ordinal].segment_index());
        }
        prop_assert_eq!(map.lookup(n), UNASSIGNED);
    }
}
