//! Configuration types for manifolds and fields.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::compute::InterpolationScheme;

use super::FieldInitializer;

/// Manifold description, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ManifoldConfig {
    /// 2D lattice.
    InterpolatedRectangle {
        /// Nodes per axis (at least 2 each).
        nodes: [usize; 2],
        /// Distance between neighbouring nodes.
        step_size: f64,
        /// Wrap opposite edges instead of mirroring (zero flux).
        #[serde(default)]
        toroidal: bool,
        #[serde(default)]
        interpolation: InterpolationScheme,
    },
    /// 3D lattice.
    InterpolatedRectangularPrism {
        nodes: [usize; 3],
        step_size: f64,
        #[serde(default)]
        toroidal: bool,
        #[serde(default)]
        interpolation: InterpolationScheme,
    },
    /// Spherical surface of a point-like body.
    TinySphere { radius: f64 },
    /// Solid interior of a point-like body.
    TinyBall { radius: f64 },
}

impl Default for ManifoldConfig {
    fn default() -> Self {
        ManifoldConfig::InterpolatedRectangularPrism {
            nodes: [21, 21, 21],
            step_size: 0.5,
            toroidal: false,
            interpolation: InterpolationScheme::Trilinear,
        }
    }
}

fn validate_grid(nodes: &[usize], step_size: f64) -> Result<(), ConfigError> {
    if let Some(&n) = nodes.iter().find(|&&n| n < 2) {
        return Err(ConfigError::InvalidNodes(n));
    }
    if !(step_size.is_finite() && step_size > 0.0) {
        return Err(ConfigError::InvalidStepSize(step_size));
    }
    Ok(())
}

impl ManifoldConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ManifoldConfig::InterpolatedRectangle {
                nodes, step_size, ..
            } => validate_grid(nodes, *step_size),
            ManifoldConfig::InterpolatedRectangularPrism {
                nodes, step_size, ..
            } => validate_grid(nodes, *step_size),
            ManifoldConfig::TinySphere { radius } | ManifoldConfig::TinyBall { radius } => {
                if radius.is_finite() && *radius > 0.0 {
                    Ok(())
                } else {
                    Err(ConfigError::InvalidRadius(*radius))
                }
            }
        }
    }
}

/// One field: where it lives and how it starts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldConfig {
    pub manifold: ManifoldConfig,
    pub initializer: FieldInitializer,
    /// Optional path for a plain-text dump of the initial values.
    #[serde(default)]
    pub dump: Option<PathBuf>,
}

impl FieldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.manifold.validate()
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Each grid axis needs at least 2 nodes, got {0}")]
    InvalidNodes(usize),
    #[error("Step size must be positive, got {0}")]
    InvalidStepSize(f64),
    #[error("Radius must be positive, got {0}")]
    InvalidRadius(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(FieldConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let bad_nodes = ManifoldConfig::InterpolatedRectangle {
            nodes: [1, 5],
            step_size: 1.0,
            toroidal: false,
            interpolation: InterpolationScheme::Trilinear,
        };
        assert!(matches!(bad_nodes.validate(), Err(ConfigError::InvalidNodes(1))));

        let bad_step = ManifoldConfig::InterpolatedRectangularPrism {
            nodes: [3, 3, 3],
            step_size: -0.5,
            toroidal: true,
            interpolation: InterpolationScheme::Trilinear,
        };
        assert!(matches!(bad_step.validate(), Err(ConfigError::InvalidStepSize(_))));

        assert!(matches!(
            ManifoldConfig::TinySphere { radius: 0.0 }.validate(),
            Err(ConfigError::InvalidRadius(_))
        ));
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"{
            "manifold": {"type": "InterpolatedRectangle", "nodes": [4, 5], "step_size": 0.25},
            "initializer": {"type": "Const", "value": 1.5}
        }"#;
        let config: FieldConfig = serde_json::from_str(json).unwrap();
        match config.manifold {
            ManifoldConfig::InterpolatedRectangle {
                toroidal,
                interpolation,
                ..
            } => {
                assert!(!toroidal);
                assert_eq!(interpolation, InterpolationScheme::Trilinear);
            }
            other => panic!("unexpected manifold {:?}", other),
        }
        assert!(config.dump.is_none());
    }
}
