//! Error type shared by manifold and field operations.

use crate::schema::{ConfigError, InitializerKind};

use super::ManifoldId;

/// Faults raised by manifold, interpolator and field operations.
///
/// All of these are programmer-facing: a failing operation leaves its
/// output untouched except where an in-place loop had already written.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("expected {expected} coordinates, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("axis {axis} is outside [0, {dim})")]
    AxisOutOfRange { axis: usize, dim: usize },

    #[error("fields live on different manifolds ({left} vs {right})")]
    ManifoldMismatch { left: ManifoldId, right: ManifoldId },

    #[error("division by zero")]
    DivisionByZero,

    #[error("{operation} is not supported on {manifold}")]
    Unsupported {
        operation: &'static str,
        manifold: &'static str,
    },

    #[error("{kind:?} initializer is not supported on {manifold}")]
    UnsupportedInitializer {
        kind: InitializerKind,
        manifold: &'static str,
    },

    #[error("{kind:?} initializer expects {expected} parameters, got {found}")]
    InitializerParameters {
        kind: InitializerKind,
        expected: usize,
        found: usize,
    },

    #[error("{kind:?} initializer is invalid: {reason}")]
    InvalidInitializer {
        kind: InitializerKind,
        reason: String,
    },

    #[error("initializer factory does not provide {0:?}")]
    InitializerUnavailable(InitializerKind),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("transform refers to a pose whose owner has been dropped")]
    DetachedTransform,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
