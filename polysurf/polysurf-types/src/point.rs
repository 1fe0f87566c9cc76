//! Oriented point records and the point set that flows through the pipeline.

use std::ops::Index;

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Aabb;

/// Segment index of a point that belongs to no detected shape.
pub const UNASSIGNED: i32 = -1;

/// Whether `segment` names a shape. Any negative id counts as unassigned.
#[inline]
#[must_use]
pub const fn is_segment_id(segment: i32) -> bool {
    segment >= 0
}

/// A single oriented sample with its shape membership.
///
/// Position and normal are fixed once loaded; only the segment index is
/// rewritten, by detection stages.
///
/// # Example
///
/// ```
/// use polysurf_types::{PointRecord, UNASSIGNED};
/// use nalgebra::{Point3, Vector3};
///
/// let mut p = PointRecord::new(Point3::origin(), Vector3::z());
/// assert_eq!(p.segment_index(), UNASSIGNED);
///
/// p.set_segment_index(3);
/// assert!(p.is_assigned());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointRecord {
    /// Position in 3D space.
    pub position: Point3<f64>,
    /// Oriented normal. Zero when the source carried no normal.
    pub normal: Vector3<f64>,
    segment_index: i32,
}

impl PointRecord {
    /// Create an unassigned record.
    #[inline]
    #[must_use]
    pub const fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            position,
            normal,
            segment_index: UNASSIGNED,
        }
    }

    /// Create a record that already carries a segment id.
    #[inline]
    #[must_use]
    pub const fn with_segment(position: Point3<f64>, normal: Vector3<f64>, segment: i32) -> Self {
        Self {
            position,
            normal,
            segment_index: segment,
        }
    }

    /// Segment id, or [`UNASSIGNED`].
    #[inline]
    #[must_use]
    pub const fn segment_index(&self) -> i32 {
        self.segment_index
    }

    /// Overwrite the segment id.
    #[inline]
    pub fn set_segment_index(&mut self, segment: i32) {
        self.segment_index = segment;
    }

    /// Whether the point belongs to a segment.
    #[inline]
    #[must_use]
    pub const fn is_assigned(&self) -> bool {
        is_segment_id(self.segment_index)
    }

    /// Whether the normal is usable (finite and non-zero).
    #[inline]
    #[must_use]
    pub fn has_normal(&self) -> bool {
        let len = self.normal.norm();
        len.is_finite() && len > 1e-12
    }
}

/// Ordered collection of [`PointRecord`]s.
///
/// Insertion order is the identity used by every index-based lookup, so the
/// set exposes no operation that adds, removes or reorders records after
/// construction. Segment indices are the only mutable state.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointSet {
    records: Vec<PointRecord>,
}

impl PointSet {
    /// Number of points.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set holds no points.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `ordinal`.
    #[inline]
    #[must_use]
    pub fn get(&self, ordinal: usize) -> Option<&PointRecord> {
        self.records.get(ordinal)
    }

    /// Iterate records in ordinal order.
    pub fn iter(&self) -> std::slice::Iter<'_, PointRecord> {
        self.records.iter()
    }

    /// All records as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[PointRecord] {
        &self.records
    }

    /// Iterate positions in ordinal order.
    pub fn positions(&self) -> impl Iterator<Item = &Point3<f64>> + '_ {
        self.records.iter().map(|r| &r.position)
    }

    /// Set the segment id of one point.
    ///
    /// Returns `false` when `ordinal` is out of range.
    pub fn set_segment_index(&mut self, ordinal: usize, segment: i32) -> bool {
        match self.records.get_mut(ordinal) {
            Some(record) => {
                record.set_segment_index(segment);
                true
            }
            None => false,
        }
    }

    /// Reset every segment id to [`UNASSIGNED`].
    pub fn clear_segments(&mut self) {
        for record in &mut self.records {
            record.set_segment_index(UNASSIGNED);
        }
    }

    /// Number of points carrying a segment id.
    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_assigned()).count()
    }

    /// Number of distinct segment ids present.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        let mut ids: Vec<i32> = self
            .records
            .iter()
            .filter(|r| r.is_assigned())
            .map(PointRecord::segment_index)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Ordinals grouped by segment id, ordered by ascending id.
    ///
    /// Unassigned points are left out.
    #[must_use]
    pub fn segments(&self) -> Vec<(i32, Vec<usize>)> {
        let mut groups: std::collections::BTreeMap<i32, Vec<usize>> =
            std::collections::BTreeMap::new();
        for (i, record) in self.records.iter().enumerate() {
            if record.is_assigned() {
                groups.entry(record.segment_index()).or_default().push(i);
            }
        }
        groups.into_iter().collect()
    }

    /// Whether every point has a usable normal.
    #[must_use]
    pub fn has_normals(&self) -> bool {
        !self.records.is_empty() && self.records.iter().all(PointRecord::has_normal)
    }

    /// Bounding box of all positions.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.positions())
    }
}

impl From<Vec<PointRecord>> for PointSet {
    fn from(records: Vec<PointRecord>) -> Self {
        Self { records }
    }
}

impl FromIterator<PointRecord> for PointSet {
    fn from_iter<I: IntoIterator<Item = PointRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl Index<usize> for PointSet {
    type Output = PointRecord;

    fn index(&self, ordinal: usize) -> &PointRecord {
        &self.records[ordinal]
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a PointRecord;
    type IntoIter = std::slice::Iter<'a, PointRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
