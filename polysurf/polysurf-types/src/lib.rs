//! Core data types for the polysurf reconstruction pipeline.
//!
//! Every stage of the pipeline exchanges the types defined here:
//!
//! - [`PointRecord`] - a position, an oriented normal and a segment index
//! - [`PointSet`] - the ordered collection of records; ordinal = identity
//! - [`SegmentIndexMap`] - ordinal to segment id lookup built from a detection partition
//! - [`SurfaceMesh`] - polygonal output of a reconstruction
//! - [`Aabb`] - axis-aligned bounding box used for tolerances and grids
//!
//! # Example
//!
//! ```
//! use polysurf_types::{PointRecord, PointSet, SegmentIndexMap};
//! use nalgebra::{Point3, Vector3};
//!
//! let mut points: PointSet = (0..4)
//!     .map(|i| PointRecord::new(Point3::new(f64::from(i), 0.0, 0.0), Vector3::z()))
//!     .collect();
//!
//! // Two detected planes, point 3 unassigned
//! let map = SegmentIndexMap::build(points.len(), &[vec![0, 1], vec![2]]);
//! map.apply_to(&mut points);
//!
//! assert_eq!(points.get(1).map(PointRecord::segment_index), Some(0));
//! assert_eq!(points.get(3).map(PointRecord::segment_index), Some(-1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![allow(clippy::module_name_repetitions)]

mod bounds;
mod mesh;
mod point;
mod segment;

pub use bounds::Aabb;
pub use mesh::SurfaceMesh;
pub use point::{is_segment_id, PointRecord, PointSet, UNASSIGNED};
pub use segment::SegmentIndexMap;

// Re-export nalgebra types used in the public API
pub use nalgebra::{Point3, Vector3};
