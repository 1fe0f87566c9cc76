//! Polygonal surface produced by reconstruction.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Aabb;

/// An indexed polygon mesh.
///
/// Polygonal reconstruction yields one planar polygon per supporting shape,
/// while implicit reconstruction yields triangles, so faces are stored as
/// variable-length index lists.
///
/// # Winding Order
///
/// Faces use counter-clockwise winding when viewed from outside.
///
/// # Example
///
/// ```
/// use polysurf_types::{SurfaceMesh, Point3};
///
/// let mut mesh = SurfaceMesh::new();
/// let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
/// let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
/// let c = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
/// let d = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
/// mesh.faces.push(vec![a, b, c, d]);
///
/// assert_eq!(mesh.face_count(), 1);
/// assert_eq!(mesh.triangulate().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SurfaceMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3<f64>>,
    /// Polygon faces as indices into `vertices`.
    pub faces: Vec<Vec<u32>>,
}

impl SurfaceMesh {
    /// Create an empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh from vertices and faces.
    #[inline]
    #[must_use]
    pub const fn from_parts(vertices: Vec<Point3<f64>>, faces: Vec<Vec<u32>>) -> Self {
        Self { vertices, faces }
    }

    /// Append a vertex and return its index.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_vertex(&mut self, position: Point3<f64>) -> u32 {
        self.vertices.push(position);
        (self.vertices.len() - 1) as u32
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of polygon faces.
    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Whether the mesh has no faces.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Whether every face has at least three corners and references an
    /// existing vertex.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let n = self.vertices.len();
        self.faces
            .iter()
            .all(|f| f.len() >= 3 && f.iter().all(|&i| (i as usize) < n))
    }

    /// Fan-triangulate every face.
    ///
    /// Faces are assumed convex, which holds for every face this crate's
    /// producers emit.
    #[must_use]
    pub fn triangulate(&self) -> Vec<[u32; 3]> {
        let mut triangles = Vec::new();
        for face in &self.faces {
            for i in 1..face.len().saturating_sub(1) {
                triangles.push([face[0], face[i], face[i + 1]]);
            }
        }
        triangles
    }

    /// Total surface area over all faces.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        self.triangulate()
            .iter()
            .filter_map(|&[a, b, c]| {
                let a = self.vertices.get(a as usize)?;
                let b = self.vertices.get(b as usize)?;
                let c = self.vertices.get(c as usize)?;
                let cross: Vector3<f64> = (b - a).cross(&(c - a));
                Some(cross.norm() * 0.5)
            })
            .sum()
    }

    /// Bounding box of the vertices.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter())
    }
}
