//! Detail presets and reconstruction dispatch.
//!
//! Polygonal reconstruction takes three objective weights. Named detail levels
//! map to fixed weight triples:
//!
//! | Level    | Fitting | Coverage | Complexity |
//! |----------|---------|----------|------------|
//! | `Most`   | 0.80    | 0.15     | 0.05       |
//! | `Normal` | engine default              |||
//! | `Less`   | 0.30    | 0.20     | 0.50       |
//! | `Least`  | 0.20    | 0.10     | 0.70       |
//!
//! User weights are passed through as given.

use polysurf_engine::{DetailWeights, GeometryEngine};
use polysurf_types::{PointSet, SurfaceMesh};
use tracing::debug;

use crate::config::{DetailLevel, ReconstructionConfig};
use crate::error::{ConfigError, ReconstructionError};

/// Weights for [`DetailLevel::Most`].
pub const MOST: DetailWeights = DetailWeights::new(0.8, 0.15, 0.05);

/// Weights for [`DetailLevel::Less`].
pub const LESS: DetailWeights = DetailWeights::new(0.3, 0.2, 0.5);

/// Weights for [`DetailLevel::Least`].
pub const LEAST: DetailWeights = DetailWeights::new(0.2, 0.1, 0.7);

/// Neighbourhood size used to estimate point spacing for Poisson.
pub const POISSON_SPACING_NEIGHBORS: usize = 6;

/// Resolve a detail level to concrete weights.
///
/// `Normal` resolves to `None`, leaving the choice to the engine.
///
/// # Errors
///
/// - [`ConfigError::MissingDetailParameters`] listing every absent user weight
/// - [`ConfigError::InvalidParameter`] for a negative or non-finite user weight
///
/// # Example
///
/// ```
/// use polysurf::config::DetailLevel;
/// use polysurf::reconstruct::{resolve_detail, MOST};
///
/// assert_eq!(resolve_detail(&DetailLevel::Most), Ok(Some(MOST)));
/// assert_eq!(resolve_detail(&DetailLevel::Normal), Ok(None));
/// ```
pub fn resolve_detail(level: &DetailLevel) -> Result<Option<DetailWeights>, ConfigError> {
    match *level {
        DetailLevel::Most => Ok(Some(MOST)),
        DetailLevel::Normal => Ok(None),
        DetailLevel::Less => Ok(Some(LESS)),
        DetailLevel::Least => Ok(Some(LEAST)),
        DetailLevel::User {
            fitting: Some(fitting),
            coverage: Some(coverage),
            complexity: Some(complexity),
        } => {
            let weights = DetailWeights::new(fitting, coverage, complexity);
            weights.validate()?;
            Ok(Some(weights))
        }
        DetailLevel::User {
            fitting,
            coverage,
            complexity,
        } => {
            let missing: Vec<&str> = [
                ("fitting", fitting),
                ("coverage", coverage),
                ("complexity", complexity),
            ]
            .into_iter()
            .filter_map(|(name, value)| value.is_none().then_some(name))
            .collect();
            Err(ConfigError::MissingDetailParameters {
                missing: missing.join(", "),
            })
        }
    }
}

/// A reconstruction ready to run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReconstructionMethod {
    /// Polygonal reconstruction; `None` selects the engine's weights.
    Polygonal {
        /// Resolved weights.
        weights: Option<DetailWeights>,
    },
    /// Poisson reconstruction at the estimated point spacing.
    Poisson,
}

impl ReconstructionMethod {
    /// Resolve a configured reconstruction.
    ///
    /// # Errors
    ///
    /// Propagates [`resolve_detail`] errors.
    pub fn from_config(config: &ReconstructionConfig) -> Result<Self, ConfigError> {
        match config {
            ReconstructionConfig::Polygonal { detail } => Ok(Self::Polygonal {
                weights: resolve_detail(detail)?,
            }),
            ReconstructionConfig::Poisson => Ok(Self::Poisson),
        }
    }

    /// Short method name for logs and reports.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Polygonal { .. } => "polygonal",
            Self::Poisson => "poisson",
        }
    }
}

/// Run `method` on `points`.
///
/// # Errors
///
/// - [`ReconstructionError::SolverFailed`] with the engine's diagnostic when
///   polygonal reconstruction fails
/// - [`ReconstructionError::PoissonFailed`] when Poisson reconstruction fails
pub fn reconstruct<E: GeometryEngine + ?Sized>(
    engine: &E,
    points: &PointSet,
    method: &ReconstructionMethod,
) -> Result<SurfaceMesh, ReconstructionError> {
    match *method {
        ReconstructionMethod::Polygonal { weights } => {
            debug!(
                weights = weights.map_or_else(|| "engine default".to_string(), |w| w.to_string()),
                "Polygonal reconstruction"
            );
            engine
                .reconstruct_polygonal(points, weights)
                .map_err(|e| ReconstructionError::SolverFailed {
                    message: e.to_string(),
                })
        }
        ReconstructionMethod::Poisson => {
            let spacing = engine.average_spacing(points, POISSON_SPACING_NEIGHBORS);
            debug!(spacing, "Poisson reconstruction");
            engine
                .reconstruct_poisson(points, spacing)
                .map_err(|e| ReconstructionError::PoissonFailed {
                    reason: e.to_string(),
                })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_fixed() {
        assert_eq!(resolve_detail(&DetailLevel::Most).unwrap(), Some(MOST));
        assert_eq!(resolve_detail(&DetailLevel::Less).unwrap(), Some(LESS));
        assert_eq!(resolve_detail(&DetailLevel::Least).unwrap(), Some(LEAST));
        assert_eq!(resolve_detail(&DetailLevel::Normal).unwrap(), None);
    }

    #[test]
    fn presets_lean_towards_simplicity() {
        assert!(MOST.fitting > LESS.fitting && LESS.fitting > LEAST.fitting);
        assert!(MOST.complexity < LESS.complexity && LESS.complexity < LEAST.complexity);
    }

    #[test]
    fn user_weights_pass_through() {
        let level = DetailLevel::user(0.5, 0.5, 0.5);
        assert_eq!(
            resolve_detail(&level).unwrap(),
            Some(DetailWeights::new(0.5, 0.5, 0.5))
        );
    }

    #[test]
    fn missing_user_weights_are_listed() {
        let level = DetailLevel::User {
            fitting: None,
            coverage: Some(0.1),
            complexity: None,
        };
        assert_eq!(
            resolve_detail(&level),
            Err(ConfigError::MissingDetailParameters {
                missing: "fitting, complexity".to_string()
            })
        );
    }

    #[test]
    fn negative_user_weight_is_invalid() {
        let level = DetailLevel::user(0.5, -0.1, 0.5);
        assert!(matches!(
            resolve_detail(&level),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn nan_user_weight_is_invalid() {
        let level = DetailLevel::user(f64::NAN, 0.1, 0.5);
        assert!(matches!(
            resolve_detail(&level),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn method_from_config() {
        assert_eq!(
            ReconstructionMethod::from_config(&ReconstructionConfig::Poisson).unwrap(),
            ReconstructionMethod::Poisson
        );
        assert_eq!(
            ReconstructionMethod::from_config(&ReconstructionConfig::default()).unwrap(),
            ReconstructionMethod::Polygonal { weights: None }
        );
    }
}
