//! Scalar fields over heterogeneous spatial domains.
//!
//! This crate represents quantities such as molecular concentration over
//! regular 2D/3D lattices and over point-like bodies (a membrane or cytosol
//! approximated as a tiny sphere or ball), and provides the differential and
//! boundary-coupling operators a reaction-diffusion driver needs.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration and field initializer types
//! - `compute`: Manifolds, interpolators, transforms and scalar fields
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use field_manifold::{
//!     compute::{BoundaryPolicy, InterpolationScheme, Manifold, ScalarField, Transform},
//!     schema::{InitializerKind, StandardInitializerFactory},
//! };
//! use nalgebra::Vector3;
//!
//! let ecs = Arc::new(
//!     Manifold::interpolated_rectangular_prism(
//!         [21, 21, 21],
//!         0.5,
//!         BoundaryPolicy::ZeroFlux,
//!         InterpolationScheme::Trilinear,
//!     )
//!     .unwrap(),
//! );
//! let mut conc = ScalarField::new(ecs);
//! conc.initialize(&StandardInitializerFactory, InitializerKind::Const, &[1.0])
//!     .unwrap();
//!
//! // Sample the medium onto a cell membrane sitting at (5, 5, 5).
//! let membrane = Arc::new(Manifold::tiny_sphere(0.5).unwrap());
//! let mut surface = ScalarField::new(membrane);
//! let at_cell = Transform::translation_only(Vector3::new(5.0, 5.0, 5.0));
//! surface.restrict(&conc, &at_cell).unwrap();
//!
//! let diffusion = conc.laplacian().unwrap();
//! println!("total: {}", diffusion.integrate().unwrap());
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{FieldError, Manifold, ScalarField, Transform};
pub use schema::{FieldConfig, FieldInitializer, InitializerKind, ManifoldConfig};
