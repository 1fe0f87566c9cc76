//! PLY support.
//!
//! Point sets load from the `vertex` element: `x`, `y`, `z` are required,
//! `nx`, `ny`, `nz` and an integer `segment_index` are optional. Points without
//! a `segment_index` load unassigned.
//!
//! Meshes and annotated point sets are written as ASCII PLY.

use std::io::{BufRead, Write};
use std::path::Path;

use nalgebra::{Point3, Vector3};
use ply_rs::parser::Parser;
use ply_rs::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs::writer::Writer;
use polysurf_types::{PointRecord, PointSet, SurfaceMesh, UNASSIGNED};

use crate::error::{LoadError, LoadResult};

/// Name of the per-vertex property carrying shape membership.
pub const SEGMENT_PROPERTY: &str = "segment_index";

const HEADER_COMMENT: &str = "Generated by polysurf";

/// Parse a PLY point set from `reader`.
///
/// `path` is only used in error messages.
///
/// # Errors
///
/// Returns [`LoadError::ParseFailed`] if the header or payload is malformed,
/// there is no `vertex` element, a vertex lacks a coordinate, or the file
/// holds no points.
pub fn read_ply_points<R: BufRead>(reader: &mut R, path: &Path) -> LoadResult<PointSet> {
    let parser = Parser::<DefaultElement>::new();

    let header = parser
        .read_header(reader)
        .map_err(|e| LoadError::parse(path, format!("invalid PLY header: {e}")))?;
    let payload = parser
        .read_payload(reader, &header)
        .map_err(|e| LoadError::parse(path, format!("invalid PLY payload: {e}")))?;

    let vertices = payload
        .get("vertex")
        .ok_or_else(|| LoadError::parse(path, "no vertex element"))?;
    if vertices.is_empty() {
        return Err(LoadError::parse(path, "no points found"));
    }

    let mut records = Vec::with_capacity(vertices.len());
    for (i, element) in vertices.iter().enumerate() {
        let coord = |key: &str| {
            scalar_f64(element, key)
                .ok_or_else(|| LoadError::parse(path, format!("vertex {i} has no {key} value")))
        };
        let position = Point3::new(coord("x")?, coord("y")?, coord("z")?);

        let normal = match (
            scalar_f64(element, "nx"),
            scalar_f64(element, "ny"),
            scalar_f64(element, "nz"),
        ) {
            (Some(nx), Some(ny), Some(nz)) => Vector3::new(nx, ny, nz),
            _ => Vector3::zeros(),
        };

        let segment = scalar_i32(element, SEGMENT_PROPERTY).unwrap_or(UNASSIGNED);
        records.push(PointRecord::with_segment(position, normal, segment));
    }

    Ok(PointSet::from(records))
}

/// Read a numeric property as `f64`.
fn scalar_f64(element: &DefaultElement, key: &str) -> Option<f64> {
    match element.get(key)? {
        Property::Double(v) => Some(*v),
        Property::Float(v) => Some(f64::from(*v)),
        Property::Int(v) => Some(f64::from(*v)),
        Property::UInt(v) => Some(f64::from(*v)),
        Property::Short(v) => Some(f64::from(*v)),
        Property::UShort(v) => Some(f64::from(*v)),
        Property::Char(v) => Some(f64::from(*v)),
        Property::UChar(v) => Some(f64::from(*v)),
        _ => None,
    }
}

/// Read an integer property as `i32`.
fn scalar_i32(element: &DefaultElement, key: &str) -> Option<i32> {
    match element.get(key)? {
        Property::Int(v) => Some(*v),
        Property::UInt(v) => i32::try_from(*v).ok(),
        Property::Short(v) => Some(i32::from(*v)),
        Property::UShort(v) => Some(i32::from(*v)),
        Property::Char(v) => Some(i32::from(*v)),
        Property::UChar(v) => Some(i32::from(*v)),
        _ => None,
    }
}

fn scalar_def(name: &str, scalar: ScalarType) -> PropertyDef {
    PropertyDef::new(name.to_string(), PropertyType::Scalar(scalar))
}

fn new_ascii_ply() -> Ply<DefaultElement> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::Ascii;
    ply.header.comments.push(HEADER_COMMENT.to_string());
    ply
}

/// Write `mesh` as ASCII PLY with a `vertex` and a `face` element.
///
/// # Errors
///
/// Propagates errors from `writer`.
pub fn write_ply_mesh<W: Write>(mesh: &SurfaceMesh, writer: &mut W) -> std::io::Result<()> {
    let mut ply = new_ascii_ply();

    let mut vertex_def = ElementDef::new("vertex".to_string());
    for axis in ["x", "y", "z"] {
        vertex_def.properties.add(scalar_def(axis, ScalarType::Double));
    }
    vertex_def.count = mesh.vertex_count();
    ply.header.elements.add(vertex_def);

    let mut face_def = ElementDef::new("face".to_string());
    face_def.properties.add(PropertyDef::new(
        "vertex_indices".to_string(),
        PropertyType::List(ScalarType::UChar, ScalarType::Int),
    ));
    face_def.count = mesh.face_count();
    ply.header.elements.add(face_def);

    let vertex_elements = mesh
        .vertices
        .iter()
        .map(|v| {
            let mut element = DefaultElement::new();
            element.insert("x".to_string(), Property::Double(v.x));
            element.insert("y".to_string(), Property::Double(v.y));
            element.insert("z".to_string(), Property::Double(v.z));
            element
        })
        .collect();
    ply.payload.insert("vertex".to_string(), vertex_elements);

    let face_elements = mesh
        .faces
        .iter()
        .map(|face| {
            let mut element = DefaultElement::new();
            #[allow(clippy::cast_possible_wrap)]
            let indices = face.iter().map(|&i| i as i32).collect();
            element.insert("vertex_indices".to_string(), Property::ListInt(indices));
            element
        })
        .collect();
    ply.payload.insert("face".to_string(), face_elements);

    Writer::new().write_ply(writer, &mut ply)?;
    Ok(())
}

/// Write `points` as ASCII PLY with normals and a `segment_index` property.
///
/// The output loads back through [`read_ply_points`] with segment ids intact.
///
/// # Errors
///
/// Propagates errors from `writer`.
pub fn write_ply_points<W: Write>(points: &PointSet, writer: &mut W) -> std::io::Result<()> {
    let mut ply = new_ascii_ply();

    let mut vertex_def = ElementDef::new("vertex".to_string());
    for name in ["x", "y", "z", "nx", "ny", "nz"] {
        vertex_def.properties.add(scalar_def(name, ScalarType::Double));
    }
    vertex_def
        .properties
        .add(scalar_def(SEGMENT_PROPERTY, ScalarType::Int));
    vertex_def.count = points.len();
    ply.header.elements.add(vertex_def);

    let elements = points
        .iter()
        .map(|record| {
            let p = record.position;
            let n = record.normal;
            let mut element = DefaultElement::new();
            element.insert("x".to_string(), Property::Double(p.x));
            element.insert("y".to_string(), Property::Double(p.y));
            element.insert("z".to_string(), Property::Double(p.z));
            element.insert("nx".to_string(), Property::Double(n.x));
            element.insert("ny".to_string(), Property::Double(n.y));
            element.insert("nz".to_string(), Property::Double(n.z));
            element.insert(
                SEGMENT_PROPERTY.to_string(),
                Property::Int(record.segment_index()),
            );
            element
        })
        .collect();
    ply.payload.insert("vertex".to_string(), elements);

    Writer::new().write_ply(writer, &mut ply)?;
    Ok(())
}
