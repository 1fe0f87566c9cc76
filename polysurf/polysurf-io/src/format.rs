//! File format identifiers.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// File formats the pipeline recognizes.
///
/// Not every format is supported in every direction: points load from PLY and
/// XYZ, meshes save to PLY and OFF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Polygon File Format (ASCII).
    Ply,
    /// Whitespace separated `x y z nx ny nz` lines.
    Xyz,
    /// Object File Format.
    Off,
}

impl FileFormat {
    /// All recognized formats.
    pub const ALL: [Self; 3] = [Self::Ply, Self::Xyz, Self::Off];

    /// Detect the format from a file extension (case-insensitive).
    ///
    /// # Example
    ///
    /// ```
    /// use polysurf_io::FileFormat;
    ///
    /// assert_eq!(FileFormat::from_extension("PLY"), Some(FileFormat::Ply));
    /// assert_eq!(FileFormat::from_extension("pts"), Some(FileFormat::Xyz));
    /// assert_eq!(FileFormat::from_extension("stl"), None);
    /// ```
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "ply" => Some(Self::Ply),
            "xyz" | "pts" | "txt" => Some(Self::Xyz),
            "off" => Some(Self::Off),
            _ => None,
        }
    }

    /// Detect the format from a file path.
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Canonical file extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Ply => "ply",
            Self::Xyz => "xyz",
            Self::Off => "off",
        }
    }

    /// Whether point sets can be loaded from this format.
    #[must_use]
    pub const fn can_load_points(self) -> bool {
        matches!(self, Self::Ply | Self::Xyz)
    }

    /// Whether meshes can be saved in this format.
    #[must_use]
    pub const fn can_save_mesh(self) -> bool {
        matches!(self, Self::Ply | Self::Off)
    }

    /// Whether point sets can be saved in this format.
    #[must_use]
    pub const fn can_save_points(self) -> bool {
        matches!(self, Self::Ply | Self::Xyz)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ply => "PLY",
            Self::Xyz => "XYZ",
            Self::Off => "OFF",
        };
        f.write_str(name)
    }
}

/// Error returned when parsing an unknown format name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown file format: {0} (expected ply, xyz or off)")]
pub struct UnknownFormat(pub String);

impl FromStr for FileFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ply" => Ok(Self::Ply),
            "xyz" => Ok(Self::Xyz),
            "off" => Ok(Self::Off),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn from_path_detection() {
        assert_eq!(FileFormat::from_path("scan.xyz"), Some(FileFormat::Xyz));
        assert_eq!(FileFormat::from_path("dir/model.OFF"), Some(FileFormat::Off));
        assert_eq!(FileFormat::from_path("no_extension"), None);
    }

    #[test]
    fn parse_names() {
        assert_eq!("Ply".parse::<FileFormat>().unwrap(), FileFormat::Ply);
        assert!("obj".parse::<FileFormat>().is_err());
    }

    #[test]
    fn capabilities() {
        assert!(FileFormat::Xyz.can_save_points());
        assert!(!FileFormat::Off.can_save_points());
        assert!(FileFormat::Xyz.can_load_points());
        assert!(!FileFormat::Off.can_load_points());
        assert!(FileFormat::Off.can_save_mesh());
        assert!(!FileFormat::Xyz.can_save_mesh());
    }

    #[test]
    fn serde_lowercase() {
        let json = serde_json::to_string(&FileFormat::Off).unwrap();
        assert_eq!(json, "\"off\"");
        let back: FileFormat = serde_json::from_str("\"xyz\"").unwrap();
        assert_eq!(back, FileFormat::Xyz);
    }

    #[test]
    fn extension_round_trip() {
        for format in FileFormat::ALL {
            assert_eq!(FileFormat::from_extension(format.extension()), Some(format));
        }
    }
}
