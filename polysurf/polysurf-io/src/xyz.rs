//! XYZ point set support.
//!
//! One point per line: `x y z nx ny nz`, separated by whitespace. Lines with
//! only `x y z` load with a zero normal. Blank lines and lines starting with
//! `#` or `//` are skipped.

use std::io::{BufRead, Write};
use std::path::Path;

use nalgebra::{Point3, Vector3};
use polysurf_types::{PointRecord, PointSet};

use crate::error::{LoadError, LoadResult};

/// Parse an XYZ point set from `reader`.
///
/// `path` is only used in error messages.
///
/// # Errors
///
/// Returns [`LoadError::ParseFailed`] if a line has fewer than three values,
/// a value is not a number, or the input holds no points.
pub fn read_xyz<R: BufRead>(reader: R, path: &Path) -> LoadResult<PointSet> {
    let mut records = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| LoadError::parse(path, format!("read error: {e}")))?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }

        let values = line
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|e| LoadError::parse(path, format!("line {}: {e}", line_no + 1)))?;

        if values.len() < 3 {
            return Err(LoadError::parse(
                path,
                format!(
                    "line {}: expected at least 3 values, got {}",
                    line_no + 1,
                    values.len()
                ),
            ));
        }

        let position = Point3::new(values[0], values[1], values[2]);
        let normal = if values.len() >= 6 {
            Vector3::new(values[3], values[4], values[5])
        } else {
            Vector3::zeros()
        };
        records.push(PointRecord::new(position, normal));
    }

    if records.is_empty() {
        return Err(LoadError::parse(path, "no points found"));
    }

    Ok(PointSet::from(records))
}

/// Write `points` as XYZ lines with normals.
///
/// # Errors
///
/// Propagates errors from `writer`.
pub fn write_xyz<W: Write>(points: &PointSet, writer: &mut W) -> std::io::Result<()> {
    for record in points {
        let p = record.position;
        let n = record.normal;
        writeln!(writer, "{} {} {} {} {} {}", p.x, p.y, p.z, n.x, n.y, n.z)?;
    }
    Ok(())
}
