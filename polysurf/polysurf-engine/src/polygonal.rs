//! Planar polygon reconstruction from segmented points.
//!
//! Each segment contributes one convex face: the hull of its points projected
//! onto the segment's least-squares plane. Faces are wound counter-clockwise
//! around the plane normal, which is oriented to agree with the points'
//! normals when they are present.

use nalgebra::{Point2, Point3, Vector3};
use polysurf_types::{PointSet, SurfaceMesh};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::params::DetailWeights;
use crate::plane::Plane;

pub(crate) fn reconstruct(
    points: &PointSet,
    weights: DetailWeights,
    min_support: usize,
) -> EngineResult<SurfaceMesh> {
    if points.is_empty() {
        return Err(EngineError::EmptyPointSet);
    }

    let segments = points.segments();
    debug!(segments = segments.len(), %weights, "Starting polygonal reconstruction");

    let mut mesh = SurfaceMesh::new();
    for (id, ordinals) in &segments {
        if ordinals.len() < min_support.max(3) {
            debug!(segment = id, support = ordinals.len(), "Segment too small for a face");
            continue;
        }
        let Some(mut plane) = Plane::fit(ordinals.iter().map(|&i| &points[i].position)) else {
            continue;
        };

        let mean_normal: Vector3<f64> = ordinals.iter().map(|&i| points[i].normal).sum();
        if mean_normal.dot(&plane.normal) < 0.0 {
            plane = plane.flipped();
        }

        let projected: Vec<Point3<f64>> = ordinals
            .iter()
            .map(|&i| plane.project(&points[i].position))
            .collect();
        let hull = face_outline(&plane, &projected);
        if hull.len() < 3 {
            debug!(segment = id, "Degenerate segment outline");
            continue;
        }

        let face = hull.iter().map(|&k| mesh.add_vertex(projected[k])).collect();
        mesh.faces.push(face);
    }

    if mesh.is_empty() {
        return Err(EngineError::NoSupportingSegments {
            segments: segments.len(),
        });
    }

    debug!(
        faces = mesh.face_count(),
        vertices = mesh.vertex_count(),
        "Polygonal reconstruction complete"
    );
    Ok(mesh)
}

/// Indices into `on_plane` of its convex hull, counter-clockwise around the
/// plane normal.
fn face_outline(plane: &Plane, on_plane: &[Point3<f64>]) -> Vec<usize> {
    let (u, v) = plane.basis();
    let flat: Vec<Point2<f64>> = on_plane
        .iter()
        .map(|p| Point2::new(p.coords.dot(&u), p.coords.dot(&v)))
        .collect();
    convex_hull(&flat)
}

fn cross(o: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Andrew's monotone chain. Returns counter-clockwise hull indices without
/// collinear points.
pub(crate) fn convex_hull(points: &[Point2<f64>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| {
        points[a]
            .x
            .total_cmp(&points[b].x)
            .then(points[a].y.total_cmp(&points[b].y))
    });
    order.dedup_by(|a, b| points[*a] == points[*b]);
    if order.len() < 3 {
        return order;
    }

    let mut hull: Vec<usize> = Vec::with_capacity(order.len() * 2);
    // Lower hull
    for &i in &order {
        while hull.len() >= 2
            && cross(&points[hull[hull.len() - 2]], &points[hull[hull.len() - 1]], &points[i]) <= 0.0
        {
            hull.pop();
        }
        hull.push(i);
    }
    // Upper hull
    let lower_len = hull.len() + 1;
    for &i in order.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(&points[hull[hull.len() - 2]], &points[hull[hull.len() - 1]], &points[i]) <= 0.0
        {
            hull.pop();
        }
        hull.push(i);
    }
    hull.pop();
    hull
}
