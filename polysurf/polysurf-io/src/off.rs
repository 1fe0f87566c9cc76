//! OFF (Object File Format) mesh writer.

use std::io::Write;

use polysurf_types::SurfaceMesh;

/// Write `mesh` as ASCII OFF.
///
/// # Errors
///
/// Propagates errors from `writer`.
pub fn write_off<W: Write>(mesh: &SurfaceMesh, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "OFF")?;
    writeln!(writer, "{} {} 0", mesh.vertex_count(), mesh.face_count())?;

    for v in &mesh.vertices {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }

    for face in &mesh.faces {
        write!(writer, "{}", face.len())?;
        for index in face {
            write!(writer, " {index}")?;
        }
        writeln!(writer)?;
    }

    Ok(())
}
