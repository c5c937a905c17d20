//! Compute module - Manifolds, stencils and field algebra.

mod error;
mod interpolator;
mod local_matrix;
mod manifold;
mod moment;
mod nodes;
mod scalar_field;
mod transform;

pub use error::*;
pub use interpolator::*;
pub use local_matrix::*;
pub use manifold::*;
pub use moment::*;
pub use nodes::*;
pub use scalar_field::*;
pub use transform::*;
