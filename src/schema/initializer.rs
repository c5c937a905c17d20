//! Field initializers and the factory that builds them.
//!
//! An initializer produces the starting value of every element of a field:
//! spatial kinds from the node's coordinates, `Explicit` from its position in
//! the array. The factory is passed to [`ScalarField::initialize`] explicitly;
//! there is no process-wide registry.
//!
//! [`ScalarField::initialize`]: crate::compute::ScalarField::initialize

use serde::{Deserialize, Serialize};

use crate::compute::FieldError;

/// Initializer selector used with positional parameter arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InitializerKind {
    Const,
    Linear,
    Gaussian,
    Explicit,
}

/// Rule producing a field's initial values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FieldInitializer {
    /// Same value everywhere.
    Const { value: f64 },
    /// Linear ramp along `axis` through `(x1, c1)` and `(x2, c2)`.
    Linear {
        c1: f64,
        c2: f64,
        x1: f64,
        x2: f64,
        axis: usize,
    },
    /// `amplitude * exp(-Σ (x_a - center_a)² / (2 sigma_a²))`; only the
    /// manifold's own axes contribute.
    Gaussian {
        amplitude: f64,
        center: [f64; 3],
        sigma: [f64; 3],
    },
    /// One value per array element.
    Explicit { values: Vec<f64> },
}

impl Default for FieldInitializer {
    fn default() -> Self {
        FieldInitializer::Const { value: 0.0 }
    }
}

fn expect_len(kind: InitializerKind, params: &[f64], expected: usize) -> Result<(), FieldError> {
    if params.len() != expected {
        return Err(FieldError::InitializerParameters {
            kind,
            expected,
            found: params.len(),
        });
    }
    Ok(())
}

impl FieldInitializer {
    pub fn kind(&self) -> InitializerKind {
        match self {
            FieldInitializer::Const { .. } => InitializerKind::Const,
            FieldInitializer::Linear { .. } => InitializerKind::Linear,
            FieldInitializer::Gaussian { .. } => InitializerKind::Gaussian,
            FieldInitializer::Explicit { .. } => InitializerKind::Explicit,
        }
    }

    /// Build from a positional parameter array:
    ///
    /// - `Const`: `[value]`
    /// - `Linear`: `[c1, c2, x1, x2, axis]`
    /// - `Gaussian`: `[amplitude, cx, cy, cz, sx, sy, sz]`
    /// - `Explicit`: the values themselves
    pub fn from_parameters(kind: InitializerKind, params: &[f64]) -> Result<Self, FieldError> {
        let initializer = match kind {
            InitializerKind::Const => {
                expect_len(kind, params, 1)?;
                FieldInitializer::Const { value: params[0] }
            }
            InitializerKind::Linear => {
                expect_len(kind, params, 5)?;
                let axis = params[4];
                if axis.fract() != 0.0 || !(0.0..3.0).contains(&axis) {
                    return Err(FieldError::InvalidInitializer {
                        kind,
                        reason: format!("axis must be 0, 1 or 2, got {axis}"),
                    });
                }
                FieldInitializer::Linear {
                    c1: params[0],
                    c2: params[1],
                    x1: params[2],
                    x2: params[3],
                    axis: axis as usize,
                }
            }
            InitializerKind::Gaussian => {
                expect_len(kind, params, 7)?;
                FieldInitializer::Gaussian {
                    amplitude: params[0],
                    center: [params[1], params[2], params[3]],
                    sigma: [params[4], params[5], params[6]],
                }
            }
            InitializerKind::Explicit => FieldInitializer::Explicit {
                values: params.to_vec(),
            },
        };
        initializer.validate()?;
        Ok(initializer)
    }

    /// Reject parameter combinations that cannot be evaluated.
    pub fn validate(&self) -> Result<(), FieldError> {
        let reason = match self {
            FieldInitializer::Linear { x1, x2, .. } if x1 == x2 => {
                Some("x1 and x2 must differ".to_string())
            }
            FieldInitializer::Gaussian { sigma, .. }
                if sigma.iter().any(|&s| !(s > 0.0 && s.is_finite())) =>
            {
                Some(format!("sigma must be positive, got {sigma:?}"))
            }
            _ => None,
        };
        match reason {
            Some(reason) => Err(FieldError::InvalidInitializer {
                kind: self.kind(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Value for array element `index` located at `point`.
    ///
    /// `Explicit` reads `index` (the caller checks the length); the other
    /// kinds read `point`.
    pub fn sample(&self, index: usize, point: &[f64]) -> f64 {
        match self {
            FieldInitializer::Const { value } => *value,
            FieldInitializer::Linear {
                c1,
                c2,
                x1,
                x2,
                axis,
            } => c1 + (point[*axis] - x1) * (c2 - c1) / (x2 - x1),
            FieldInitializer::Gaussian {
                amplitude,
                center,
                sigma,
            } => {
                let exponent: f64 = point
                    .iter()
                    .zip(center.iter().zip(sigma))
                    .map(|(x, (c, s))| (x - c).powi(2) / (2.0 * s * s))
                    .sum();
                amplitude * (-exponent).exp()
            }
            FieldInitializer::Explicit { values } => values[index],
        }
    }
}

/// Source of initializers for [`ScalarField::initialize`].
///
/// [`ScalarField::initialize`]: crate::compute::ScalarField::initialize
pub trait InitializerFactory {
    fn create(&self, kind: InitializerKind, params: &[f64]) -> Result<FieldInitializer, FieldError>;
}

/// Factory providing all four initializer kinds.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardInitializerFactory;

impl InitializerFactory for StandardInitializerFactory {
    fn create(&self, kind: InitializerKind, params: &[f64]) -> Result<FieldInitializer, FieldError> {
        FieldInitializer::from_parameters(kind, params)
    }
}

/// Factory limited to a fixed set of kinds; anything else is unavailable.
#[derive(Debug, Clone)]
pub struct RestrictedInitializerFactory {
    allowed: Vec<InitializerKind>,
}

impl RestrictedInitializerFactory {
    pub fn new(allowed: impl IntoIterator<Item = InitializerKind>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }
}

impl InitializerFactory for RestrictedInitializerFactory {
    fn create(&self, kind: InitializerKind, params: &[f64]) -> Result<FieldInitializer, FieldError> {
        if !self.allowed.contains(&kind) {
            return Err(FieldError::InitializerUnavailable(kind));
        }
        FieldInitializer::from_parameters(kind, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_lengths_checked() {
        for (kind, params) in [
            (InitializerKind::Const, vec![]),
            (InitializerKind::Linear, vec![0.0, 1.0, 0.0, 1.0]),
            (InitializerKind::Gaussian, vec![1.0, 0.0, 0.0, 0.0, 1.0, 1.0]),
        ] {
            assert!(
                matches!(
                    FieldInitializer::from_parameters(kind, &params),
                    Err(FieldError::InitializerParameters { .. })
                ),
                "{:?} accepted {} parameters",
                kind,
                params.len()
            );
        }
    }

    #[test]
    fn test_linear_sample() {
        let init = FieldInitializer::from_parameters(InitializerKind::Linear, &[1.0, 3.0, 2.0, 4.0, 1.0])
            .unwrap();
        assert_eq!(init.sample(0, &[100.0, 3.0]), 2.0);
        assert_eq!(init.sample(0, &[0.0, 2.0, 9.0]), 1.0);
    }

    #[test]
    fn test_linear_rejects_bad_axis_and_degenerate_span() {
        assert!(matches!(
            FieldInitializer::from_parameters(InitializerKind::Linear, &[0.0, 1.0, 0.0, 1.0, 1.5]),
            Err(FieldError::InvalidInitializer { .. })
        ));
        assert!(matches!(
            FieldInitializer::from_parameters(InitializerKind::Linear, &[0.0, 1.0, 2.0, 2.0, 0.0]),
            Err(FieldError::InvalidInitializer { .. })
        ));
    }

    #[test]
    fn test_gaussian_sample() {
        let init = FieldInitializer::from_parameters(
            InitializerKind::Gaussian,
            &[2.0, 1.0, 1.0, 50.0, 0.5, 0.5, 0.5],
        )
        .unwrap();
        // z is ignored for 2D points
        assert!((init.sample(0, &[1.0, 1.0]) - 2.0).abs() < 1e-12);
        let off = init.sample(0, &[1.5, 1.0]);
        assert!((off - 2.0 * (-0.5f64).exp()).abs() < 1e-12, "got {}", off);
    }

    #[test]
    fn test_gaussian_rejects_degenerate_sigma() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(
                    FieldInitializer::from_parameters(
                        InitializerKind::Gaussian,
                        &[1.0, 0.0, 0.0, 0.0, 1.0, bad, 1.0],
                    ),
                    Err(FieldError::InvalidInitializer { .. })
                ),
                "sigma {} accepted",
                bad
            );
        }
    }

    #[test]
    fn test_explicit_reads_index() {
        let init = FieldInitializer::from_parameters(InitializerKind::Explicit, &[4.0, 5.0, 6.0]).unwrap();
        assert_eq!(init.sample(2, &[0.0, 0.0]), 6.0);
    }

    #[test]
    fn test_restricted_factory() {
        let factory = RestrictedInitializerFactory::new([InitializerKind::Const]);
        assert!(factory.create(InitializerKind::Const, &[1.0]).is_ok());
        assert!(matches!(
            factory.create(InitializerKind::Gaussian, &[1.0; 7]),
            Err(FieldError::InitializerUnavailable(InitializerKind::Gaussian))
        ));
    }

    #[test]
    fn test_serde_tagged_form() {
        let json = r#"{"type":"Linear","c1":0.0,"c2":1.0,"x1":0.0,"x2":2.0,"axis":0}"#;
        let init: FieldInitializer = serde_json::from_str(json).unwrap();
        assert_eq!(init.kind(), InitializerKind::Linear);
        assert_eq!(init.sample(0, &[1.0, 0.0]), 0.5);
    }
}
