//! Implicit surface reconstruction from oriented points.
//!
//! The implicit function at `x` is the mean signed distance
//! `n_i · (x - p_i)` to the nearest oriented samples, so it is negative
//! behind the surface and positive in front of it. The function is sampled on
//! a regular grid whose cell size is the requested spacing (coarsened when the
//! grid would exceed the cell budget) and polygonised with marching
//! tetrahedra. Grid vertices farther than two cells from every sample are left
//! undefined, which keeps the surface close to the data.

use std::collections::HashMap;

use kiddo::SquaredEuclidean;
use nalgebra::{Point3, Vector3};
use polysurf_types::{Aabb, PointSet, SurfaceMesh};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::params::ScanEngineParams;
use crate::spatial::{build_kdtree, query};

/// Cube corner offsets.
const CORNERS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [1, 1, 1],
    [0, 1, 1],
];

/// Six tetrahedra around the 0-6 diagonal. Neighbouring cubes split their
/// shared faces along the same diagonal, so the result is conforming.
const TETRAHEDRA: [[usize; 4]; 6] = [
    [0, 1, 2, 6],
    [0, 2, 3, 6],
    [0, 3, 7, 6],
    [0, 7, 4, 6],
    [0, 4, 5, 6],
    [0, 5, 1, 6],
];

/// Sampling lattice over the padded bounding box.
struct Grid {
    origin: Point3<f64>,
    cell: f64,
    dims: [usize; 3],
}

impl Grid {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn covering(bounds: &Aabb, spacing: f64, max_cells: usize) -> Self {
        let size = bounds.size();
        let cells_along = |cell: f64| -> [usize; 3] {
            [
                (size.x / cell).ceil().max(1.0) as usize,
                (size.y / cell).ceil().max(1.0) as usize,
                (size.z / cell).ceil().max(1.0) as usize,
            ]
        };

        let mut cell = spacing;
        let mut counts = cells_along(cell);
        while counts.iter().product::<usize>() > max_cells.max(1) {
            let ratio = counts.iter().product::<usize>() as f64 / max_cells.max(1) as f64;
            cell *= ratio.cbrt().max(1.01);
            counts = cells_along(cell);
        }

        Self {
            origin: bounds.min,
            cell,
            dims: [counts[0] + 1, counts[1] + 1, counts[2] + 1],
        }
    }

    fn vertex_count(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    fn index(&self, i: usize, j: usize, k: usize) -> usize {
        i + self.dims[0] * (j + self.dims[1] * k)
    }

    #[allow(clippy::cast_precision_loss)]
    fn position(&self, index: usize) -> Point3<f64> {
        let i = index % self.dims[0];
        let j = (index / self.dims[0]) % self.dims[1];
        let k = index / (self.dims[0] * self.dims[1]);
        self.origin + Vector3::new(i as f64, j as f64, k as f64) * self.cell
    }
}

pub(crate) fn reconstruct(
    points: &PointSet,
    spacing: f64,
    params: &ScanEngineParams,
) -> EngineResult<SurfaceMesh> {
    if points.is_empty() {
        return Err(EngineError::EmptyPointSet);
    }
    if !(spacing.is_finite() && spacing > 0.0) {
        return Err(EngineError::invalid(format!(
            "spacing must be positive, got {spacing}"
        )));
    }
    if let Some(index) = points.iter().position(|r| !r.has_normal()) {
        return Err(EngineError::MissingNormal { index });
    }

    let normals: Vec<Vector3<f64>> = points.iter().map(|r| r.normal.normalize()).collect();
    let grid = Grid::covering(
        &points.bounds().expanded(2.0 * spacing),
        spacing,
        params.implicit_max_cells,
    );
    debug!(
        spacing,
        cell = grid.cell,
        dims = ?grid.dims,
        "Sampling implicit function"
    );

    let tree = build_kdtree(points);
    let k = params.implicit_neighbors.clamp(1, points.len());
    let reach_sq = (2.0 * grid.cell).powi(2);

    let values: Vec<Option<f64>> = (0..grid.vertex_count())
        .into_par_iter()
        .map(|index| {
            let x = grid.position(index);
            let nearest = tree.nearest_n::<SquaredEuclidean>(&query(&x), k);
            let closest = nearest.first()?;
            if closest.distance > reach_sq {
                return None;
            }
            let sum: f64 = nearest
                .iter()
                .map(|n| {
                    #[allow(clippy::cast_possible_truncation)]
                    let i = n.item as usize;
                    normals[i].dot(&(x - points[i].position))
                })
                .sum();
            #[allow(clippy::cast_precision_loss)]
            let mean = sum / nearest.len() as f64;
            Some(mean)
        })
        .collect();

    let mesh = polygonise(&grid, &values);
    if mesh.is_empty() {
        return Err(EngineError::EmptySurface);
    }

    debug!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "Implicit reconstruction complete"
    );
    Ok(mesh)
}

/// Extract the zero level set of `values` as triangles.
fn polygonise(grid: &Grid, values: &[Option<f64>]) -> SurfaceMesh {
    let mut mesh = SurfaceMesh::new();
    let mut edge_vertices: HashMap<(usize, usize), u32> = HashMap::new();

    let mut crossing = |mesh: &mut SurfaceMesh, a: (usize, f64), b: (usize, f64)| -> u32 {
        // Crossings exactly on a lattice vertex are keyed by that vertex
        let key = if a.1 == 0.0 {
            (a.0, a.0)
        } else if b.1 == 0.0 {
            (b.0, b.0)
        } else if a.0 < b.0 {
            (a.0, b.0)
        } else {
            (b.0, a.0)
        };
        *edge_vertices.entry(key).or_insert_with(|| {
            let t = a.1 / (a.1 - b.1);
            let pa = grid.position(a.0);
            let pb = grid.position(b.0);
            mesh.add_vertex(pa + (pb - pa) * t)
        })
    };

    for k in 0..grid.dims[2] - 1 {
        for j in 0..grid.dims[1] - 1 {
            for i in 0..grid.dims[0] - 1 {
                let mut cube = [(0usize, 0.0f64); 8];
                let mut defined = true;
                for (slot, offset) in cube.iter_mut().zip(CORNERS.iter()) {
                    let index = grid.index(i + offset[0], j + offset[1], k + offset[2]);
                    match values[index] {
                        Some(v) => *slot = (index, v),
                        None => {
                            defined = false;
                            break;
                        }
                    }
                }
                if !defined {
                    continue;
                }

                for tet in TETRAHEDRA {
                    let corners = tet.map(|c| cube[c]);
                    let (inside, outside): (Vec<&(usize, f64)>, Vec<&(usize, f64)>) =
                        corners.iter().partition(|(_, v)| *v < 0.0);

                    let triangles: Vec<[u32; 3]> = match (inside.len(), outside.len()) {
                        (1, 3) | (3, 1) => {
                            let (lone, rest) = if inside.len() == 1 {
                                (inside[0], &outside)
                            } else {
                                (outside[0], &inside)
                            };
                            vec![[
                                crossing(&mut mesh, *lone, *rest[0]),
                                crossing(&mut mesh, *lone, *rest[1]),
                                crossing(&mut mesh, *lone, *rest[2]),
                            ]]
                        }
                        (2, 2) => {
                            let ac = crossing(&mut mesh, *inside[0], *outside[0]);
                            let ad = crossing(&mut mesh, *inside[0], *outside[1]);
                            let bd = crossing(&mut mesh, *inside[1], *outside[1]);
                            let bc = crossing(&mut mesh, *inside[1], *outside[0]);
                            vec![[ac, ad, bd], [ac, bd, bc]]
                        }
                        _ => continue,
                    };

                    // Face normals point from negative to positive values
                    let centroid = |set: &[&(usize, f64)]| -> Vector3<f64> {
                        let sum: Vector3<f64> =
                            set.iter().map(|(idx, _)| grid.position(*idx).coords).sum();
                        #[allow(clippy::cast_precision_loss)]
                        let n = set.len() as f64;
                        sum / n
                    };
                    let outward = centroid(outside.as_slice()) - centroid(inside.as_slice());

                    for [a, b, c] in triangles {
                        let (pa, pb, pc) = (
                            mesh.vertices[a as usize],
                            mesh.vertices[b as usize],
                            mesh.vertices[c as usize],
                        );
                        let normal = (pb - pa).cross(&(pc - pa));
                        if normal.norm_squared() < 1e-24 {
                            continue;
                        }
                        if normal.dot(&outward) < 0.0 {
                            mesh.faces.push(vec![a, c, b]);
                        } else {
                            mesh.faces.push(vec![a, b, c]);
                        }
                    }
                }
            }
        }
    }

    mesh
}
