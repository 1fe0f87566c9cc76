//! Point set and mesh file I/O for polysurf.
//!
//! | Format | Load points | Save mesh | Save points |
//! |--------|-------------|-----------|-------------|
//! | PLY    | yes (`segment_index` optional) | yes | yes (with `segment_index`) |
//! | XYZ    | yes (`x y z nx ny nz`) | no | yes |
//! | OFF    | no | yes | no |
//!
//! Unsupported combinations are recognized and rejected with an
//! `UnsupportedFormat` error rather than an unknown-format error.
//!
//! # Example
//!
//! ```no_run
//! use polysurf_io::{load_points, save_mesh, FileFormat};
//! use polysurf_types::SurfaceMesh;
//!
//! let points = load_points("scan.xyz", FileFormat::Xyz).unwrap();
//! println!("loaded {} points", points.len());
//!
//! save_mesh(&SurfaceMesh::new(), "model.off", FileFormat::Off).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod format;
pub mod off;
pub mod ply;
pub mod xyz;

pub use error::{LoadError, LoadResult, SaveError, SaveResult};
pub use format::{FileFormat, UnknownFormat};

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use polysurf_types::{PointSet, SurfaceMesh};
use tracing::debug;

/// Load an oriented point set from `path`.
///
/// # Errors
///
/// - [`LoadError::NotFound`] if `path` is not an existing regular file
/// - [`LoadError::Unopenable`] if the file cannot be opened
/// - [`LoadError::UnsupportedFormat`] for [`FileFormat::Off`]
/// - [`LoadError::ParseFailed`] if the content is invalid
pub fn load_points<P: AsRef<Path>>(path: P, format: FileFormat) -> LoadResult<PointSet> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|source| LoadError::Unopenable {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);

    let points = match format {
        FileFormat::Ply => ply::read_ply_points(&mut reader, path)?,
        FileFormat::Xyz => xyz::read_xyz(reader, path)?,
        FileFormat::Off => return Err(LoadError::UnsupportedFormat { format }),
    };

    debug!(path = %path.display(), %format, points = points.len(), "Loaded point set");
    Ok(points)
}

/// Save `mesh` to `path`.
///
/// The format is checked before the file is created, so an unsupported
/// format leaves the filesystem untouched.
///
/// # Errors
///
/// - [`SaveError::UnsupportedFormat`] for [`FileFormat::Xyz`]
/// - [`SaveError::Unopenable`] if the file cannot be created
/// - [`SaveError::WriteFailed`] if writing fails
pub fn save_mesh<P: AsRef<Path>>(mesh: &SurfaceMesh, path: P, format: FileFormat) -> SaveResult<()> {
    let path = path.as_ref();
    match format {
        FileFormat::Ply => write_file(path, |w| ply::write_ply_mesh(mesh, w))?,
        FileFormat::Off => write_file(path, |w| off::write_off(mesh, w))?,
        FileFormat::Xyz => {
            return Err(SaveError::UnsupportedFormat {
                format,
                what: "meshes",
            })
        }
    }

    debug!(
        path = %path.display(),
        %format,
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "Saved mesh"
    );
    Ok(())
}

/// Save an annotated point set to `path`.
///
/// PLY output carries each point's `segment_index`, so it can be loaded back
/// as a point set with shapes already assigned. XYZ output carries positions
/// and normals only.
///
/// # Errors
///
/// - [`SaveError::UnsupportedFormat`] for [`FileFormat::Off`]
/// - [`SaveError::Unopenable`] if the file cannot be created
/// - [`SaveError::WriteFailed`] if writing fails
pub fn save_points<P: AsRef<Path>>(points: &PointSet, path: P, format: FileFormat) -> SaveResult<()> {
    let path = path.as_ref();
    match format {
        FileFormat::Ply => write_file(path, |w| ply::write_ply_points(points, w))?,
        FileFormat::Xyz => write_file(path, |w| xyz::write_xyz(points, w))?,
        FileFormat::Off => {
            return Err(SaveError::UnsupportedFormat {
                format,
                what: "point sets",
            })
        }
    }

    debug!(path = %path.display(), %format, points = points.len(), "Saved point set");
    Ok(())
}

/// Create `path` and run `write` against a buffered writer.
fn write_file<F>(path: &Path, write: F) -> SaveResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let file = File::create(path).map_err(|source| SaveError::Unopenable {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    write(&mut writer)
        .and_then(|()| writer.flush())
        .map_err(|source| SaveError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })
}
