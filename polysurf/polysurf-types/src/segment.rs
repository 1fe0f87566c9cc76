//! Ordinal to segment id mapping produced by a detection run.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::point::{is_segment_id, PointSet, UNASSIGNED};

/// Maps each point ordinal to the id of the shape that claimed it.
///
/// Built from a partition of point ordinals into groups, where the position of
/// a group in the partition is its segment id. Ordinals no group lists map to
/// [`UNASSIGNED`].
///
/// Groups are expected to be disjoint. When they overlap, the group listed
/// last wins.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentIndexMap {
    indices: Vec<i32>,
}

impl SegmentIndexMap {
    /// Build a map over `point_count` ordinals from `groups`.
    ///
    /// Ordinals at or beyond `point_count` are ignored.
    ///
    /// # Example
    ///
    /// ```
    /// use polysurf_types::SegmentIndexMap;
    ///
    /// let map = SegmentIndexMap::build(4, &[vec![3, 1], vec![0]]);
    /// assert_eq!(map.lookup(1), 0);
    /// assert_eq!(map.lookup(0), 1);
    /// assert_eq!(map.lookup(2), -1);
    /// ```
    #[must_use]
    pub fn build<G: AsRef<[usize]>>(point_count: usize, groups: &[G]) -> Self {
        let mut indices = vec![UNASSIGNED; point_count];
        for (g, group) in groups.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let id = g as i32;
            for &ordinal in group.as_ref() {
                if let Some(slot) = indices.get_mut(ordinal) {
                    *slot = id;
                }
            }
        }
        Self { indices }
    }

    /// Segment id of `ordinal`, or [`UNASSIGNED`] when it was never claimed
    /// or lies outside the map.
    #[inline]
    #[must_use]
    pub fn lookup(&self, ordinal: usize) -> i32 {
        self.indices.get(ordinal).copied().unwrap_or(UNASSIGNED)
    }

    /// Number of ordinals covered.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the map covers no ordinals.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of ordinals that carry a segment id.
    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.indices.iter().filter(|&&id| is_segment_id(id)).count()
    }

    /// Write the mapped id into every point of `points`.
    ///
    /// Points beyond the map's length become [`UNASSIGNED`].
    pub fn apply_to(&self, points: &mut PointSet) {
        for ordinal in 0..points.len() {
            points.set_segment_index(ordinal, self.lookup(ordinal));
        }
    }
}
