//! Geometry engines for the polysurf pipeline.
//!
//! The pipeline talks to its numerical back end through the
//! [`GeometryEngine`] trait: RANSAC plane detection, region growing,
//! polygonal reconstruction, Poisson-style reconstruction and point spacing.
//! [`ScanEngine`] implements the trait with:
//!
//! - **RANSAC** - iterative plane extraction with seeded sampling
//! - **Region growing** - sphere neighbourhoods with plane distance and angle tests
//! - **Polygonal** - one convex face per segment on its least-squares plane
//! - **Implicit** - signed distance field polygonised by marching tetrahedra
//!
//! # Example
//!
//! ```
//! use polysurf_engine::{GeometryEngine, RegionGrowingParams, ScanEngine};
//! use polysurf_types::{PointRecord, PointSet, Point3, Vector3};
//!
//! let points: PointSet = (0..5)
//!     .flat_map(|i| (0..5).map(move |j| (i, j)))
//!     .map(|(i, j)| PointRecord::new(Point3::new(f64::from(i), f64::from(j), 0.0), Vector3::z()))
//!     .collect();
//!
//! let engine = ScanEngine::new();
//! let regions = engine.grow_regions(&points, &RegionGrowingParams::new(1.5, 0.1, 20.0, 3));
//! assert_eq!(regions.len(), 1);
//! assert_eq!(regions[0].len(), 25);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)] // pa/pb/pc, ac/ad/bd/bc

mod engine;
mod error;
mod implicit;
mod params;
mod plane;
mod polygonal;
mod ransac;
mod region_growing;
mod scan;
mod spatial;

pub use engine::{GeometryEngine, Partition};
pub use error::{EngineError, EngineResult};
pub use params::{DetailWeights, RegionGrowingParams, ScanEngineParams};
pub use plane::Plane;
pub use scan::ScanEngine;
pub use spatial::average_spacing;
