//! Parameters consumed by geometry engines.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Objective weights for polygonal reconstruction.
///
/// Face selection trades off how well faces fit the points (`fitting`), how
/// much of each face is backed by points (`coverage`) and how many sharp edges
/// the model has (`complexity`). Engines treat the values as relative; they
/// are not required to sum to 1.
///
/// # Example
///
/// ```
/// use polysurf_engine::DetailWeights;
///
/// let w = DetailWeights::new(0.5, 0.5, 0.5);
/// assert!(w.validate().is_ok());
/// assert!((w.sum() - 1.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetailWeights {
    /// Weight of the data fitting term.
    pub fitting: f64,
    /// Weight of the point coverage term.
    pub coverage: f64,
    /// Weight of the model complexity term.
    pub complexity: f64,
}

impl DetailWeights {
    /// Weights a polygonal reconstructor falls back to when none are supplied.
    pub const ENGINE_DEFAULT: Self = Self::new(0.43, 0.27, 0.30);

    /// Create a weight triple.
    #[must_use]
    pub const fn new(fitting: f64, coverage: f64, complexity: f64) -> Self {
        Self {
            fitting,
            coverage,
            complexity,
        }
    }

    /// Sum of the three weights.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.fitting + self.coverage + self.complexity
    }

    /// Weights as a `[fitting, coverage, complexity]` array.
    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.fitting, self.coverage, self.complexity]
    }

    /// Check that every weight is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidParameter`] naming the first bad weight.
    pub fn validate(&self) -> EngineResult<()> {
        for (name, value) in [
            ("fitting", self.fitting),
            ("coverage", self.coverage),
            ("complexity", self.complexity),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::invalid(format!(
                    "{name} weight must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for DetailWeights {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "fitting {:.2}, coverage {:.2}, complexity {:.2}",
            self.fitting, self.coverage, self.complexity
        )
    }
}

/// Region growing tolerances.
///
/// A region starts at a seed point and absorbs neighbours within
/// `search_radius` that lie within `max_distance_to_plane` of the region's
/// fitted plane and whose normal deviates from it by at most
/// `max_angle_degrees`. Regions smaller than `min_region_size` are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionGrowingParams {
    /// Radius of the neighbourhood sphere.
    pub search_radius: f64,
    /// Maximum point to plane distance.
    pub max_distance_to_plane: f64,
    /// Maximum normal deviation in degrees, in (0, 90].
    pub max_angle_degrees: f64,
    /// Minimum number of points in a kept region.
    pub min_region_size: usize,
}

impl Default for RegionGrowingParams {
    fn default() -> Self {
        Self {
            search_radius: 1.0,
            max_distance_to_plane: 1.0,
            max_angle_degrees: 25.0,
            min_region_size: 3,
        }
    }
}

impl RegionGrowingParams {
    /// Create parameters from the four tolerances.
    #[must_use]
    pub const fn new(
        search_radius: f64,
        max_distance_to_plane: f64,
        max_angle_degrees: f64,
        min_region_size: usize,
    ) -> Self {
        Self {
            search_radius,
            max_distance_to_plane,
            max_angle_degrees,
            min_region_size,
        }
    }

    /// Set the neighbourhood radius.
    #[must_use]
    pub const fn with_search_radius(mut self, radius: f64) -> Self {
        self.search_radius = radius;
        self
    }

    /// Set the plane distance tolerance.
    #[must_use]
    pub const fn with_max_distance_to_plane(mut self, distance: f64) -> Self {
        self.max_distance_to_plane = distance;
        self
    }

    /// Set the normal angle tolerance in degrees.
    #[must_use]
    pub const fn with_max_angle_degrees(mut self, degrees: f64) -> Self {
        self.max_angle_degrees = degrees;
        self
    }

    /// Set the minimum region size.
    #[must_use]
    pub const fn with_min_region_size(mut self, size: usize) -> Self {
        self.min_region_size = size;
        self
    }

    /// Cosine of the angle tolerance.
    #[must_use]
    pub fn min_normal_cosine(&self) -> f64 {
        self.max_angle_degrees.to_radians().cos()
    }

    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidParameter`] if the radius or distance is
    /// not positive, the angle is outside (0, 90], or the minimum region size
    /// is zero.
    pub fn validate(&self) -> EngineResult<()> {
        if !(self.search_radius.is_finite() && self.search_radius > 0.0) {
            return Err(EngineError::invalid(format!(
                "search radius must be positive, got {}",
                self.search_radius
            )));
        }
        if !(self.max_distance_to_plane.is_finite() && self.max_distance_to_plane > 0.0) {
            return Err(EngineError::invalid(format!(
                "max distance to plane must be positive, got {}",
                self.max_distance_to_plane
            )));
        }
        if !(self.max_angle_degrees > 0.0 && self.max_angle_degrees <= 90.0) {
            return Err(EngineError::invalid(format!(
                "max angle must be in (0, 90] degrees, got {}",
                self.max_angle_degrees
            )));
        }
        if self.min_region_size == 0 {
            return Err(EngineError::invalid("min region size must be at least 1"));
        }
        Ok(())
    }
}

/// Tuning of the built-in [`ScanEngine`](crate::ScanEngine).
#[derive(Debug, Clone)]
pub struct ScanEngineParams {
    /// RANSAC inlier distance as a fraction of the bounding box diagonal.
    /// Default: 0.01
    pub ransac_epsilon_ratio: f64,

    /// Minimum |cos| between a point normal and a candidate plane normal.
    /// Default: 0.9
    pub ransac_normal_threshold: f64,

    /// Minimum shape support as a fraction of the point count. Default: 0.01
    pub ransac_min_points_ratio: f64,

    /// Candidate planes sampled per extracted shape. Default: 500
    pub ransac_iterations: usize,

    /// Stop after this many shapes. Default: no limit
    pub ransac_max_shapes: Option<usize>,

    /// Seed for candidate sampling, so detection is reproducible. Default: 42
    pub seed: u64,

    /// Minimum number of points a segment needs to yield a face. Default: 3
    pub polygonal_min_support: usize,

    /// Weights used when polygonal reconstruction is called without any.
    pub default_weights: DetailWeights,

    /// Nearest samples blended into each implicit function value. Default: 4
    pub implicit_neighbors: usize,

    /// Upper bound on implicit sampling grid cells. Default: 2 000 000
    pub implicit_max_cells: usize,
}

impl Default for ScanEngineParams {
    fn default() -> Self {
        Self {
            ransac_epsilon_ratio: 0.01,
            ransac_normal_threshold: 0.9,
            ransac_min_points_ratio: 0.01,
            ransac_iterations: 500,
            ransac_max_shapes: None,
            seed: 42,
            polygonal_min_support: 3,
            default_weights: DetailWeights::ENGINE_DEFAULT,
            implicit_neighbors: 4,
            implicit_max_cells: 2_000_000,
        }
    }
}

impl ScanEngineParams {
    /// Create default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fewer RANSAC samples and a coarser grid budget.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            ransac_iterations: 100,
            implicit_neighbors: 1,
            implicit_max_cells: 250_000,
            ..Default::default()
        }
    }

    /// More RANSAC samples and a larger grid budget.
    #[must_use]
    pub fn high_quality() -> Self {
        Self {
            ransac_iterations: 2000,
            implicit_neighbors: 8,
            implicit_max_cells: 16_000_000,
            ..Default::default()
        }
    }

    /// Set the RANSAC seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the RANSAC inlier distance ratio.
    #[must_use]
    pub const fn with_ransac_epsilon_ratio(mut self, ratio: f64) -> Self {
        self.ransac_epsilon_ratio = ratio;
        self
    }

    /// Set the RANSAC iterations per shape.
    #[must_use]
    pub const fn with_ransac_iterations(mut self, iterations: usize) -> Self {
        self.ransac_iterations = iterations;
        self
    }

    /// Limit the number of RANSAC shapes.
    #[must_use]
    pub const fn with_ransac_max_shapes(mut self, max: Option<usize>) -> Self {
        self.ransac_max_shapes = max;
        self
    }

    /// Set the implicit grid cell budget.
    #[must_use]
    pub const fn with_implicit_max_cells(mut self, cells: usize) -> Self {
        self.implicit_max_cells = cells;
        self
    }

    /// Minimum RANSAC shape support for `point_count` points.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn ransac_min_points(&self, point_count: usize) -> usize {
        ((point_count as f64 * self.ransac_min_points_ratio).ceil() as usize).max(3)
    }
}
