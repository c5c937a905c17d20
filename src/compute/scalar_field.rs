//! Scalar fields bound to a manifold.
//!
//! A [`ScalarField`] owns one array of values sized to its manifold and
//! shares the manifold through an `Arc`. Two method families exist:
//!
//! - pure: `try_add`, `try_sub`, `try_mul`, `try_div`, `scaled` and the
//!   `std::ops` operators return a new field;
//! - in place: `add_in_place`, `sub_in_place`, `mul_in_place`,
//!   `scale_in_place`, `reset` overwrite `self`.
//!
//! The operators panic when the operands live on different manifolds; use
//! the `try_*` forms to get a [`FieldError`] instead.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::{Add, Div, Index, Mul, Sub};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::schema::{FieldConfig, FieldInitializer, InitializerFactory, InitializerKind};

use super::{FieldError, Manifold, ManifoldId, Transform};

/// Values of one physical quantity over a manifold.
#[derive(Debug, Clone)]
pub struct ScalarField {
    manifold: Arc<Manifold>,
    values: Vec<f64>,
}

impl ScalarField {
    /// Zero field on `manifold`.
    pub fn new(manifold: Arc<Manifold>) -> Self {
        let values = vec![0.0; manifold.array_size()];
        Self { manifold, values }
    }

    /// Field with explicit values; the length must match the manifold.
    pub fn from_values(manifold: Arc<Manifold>, values: Vec<f64>) -> Result<Self, FieldError> {
        if values.len() != manifold.array_size() {
            return Err(FieldError::DimensionMismatch {
                expected: manifold.array_size(),
                found: values.len(),
            });
        }
        Ok(Self { manifold, values })
    }

    /// Build the manifold and field described by `config`.
    pub fn from_config(config: &FieldConfig) -> Result<Self, FieldError> {
        let manifold = Arc::new(Manifold::from_config(&config.manifold)?);
        let mut field = Self::new(manifold);
        field.initialize_with(&config.initializer)?;
        Ok(field)
    }

    #[inline]
    pub fn manifold(&self) -> &Arc<Manifold> {
        &self.manifold
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Mutable view of the values; the length is fixed.
    #[inline]
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn ensure_same_manifold(&self, other: &ScalarField) -> Result<(), FieldError> {
        self.manifold.ensure_owns(other)
    }

    fn with_values(&self, values: Vec<f64>) -> Self {
        Self {
            manifold: Arc::clone(&self.manifold),
            values,
        }
    }

    /// Populate every element using an initializer obtained from `factory`.
    pub fn initialize(
        &mut self,
        factory: &dyn InitializerFactory,
        kind: InitializerKind,
        parameters: &[f64],
    ) -> Result<(), FieldError> {
        let initializer = factory.create(kind, parameters)?;
        self.initialize_with(&initializer)
    }

    /// Populate every element from an already-built initializer.
    pub fn initialize_with(&mut self, initializer: &FieldInitializer) -> Result<(), FieldError> {
        let manifold = Arc::clone(&self.manifold);
        manifold.initialize(initializer, &mut self.values)
    }

    /// Overwrite this field with `src`'s values.
    pub fn reset(&mut self, src: &ScalarField) -> Result<(), FieldError> {
        self.ensure_same_manifold(src)?;
        self.values.copy_from_slice(&src.values);
        Ok(())
    }

    pub fn value(&self, point: &[f64]) -> Result<f64, FieldError> {
        self.manifold.value(point, self)
    }

    pub fn gradient(&self, point: &[f64]) -> Result<Vec<f64>, FieldError> {
        self.manifold.grad(point, self)
    }

    pub fn laplacian(&self) -> Result<ScalarField, FieldError> {
        Ok(self.with_values(self.manifold.laplacian(self)?))
    }

    /// Source term on this field's manifold coupling in `flux` from an
    /// adjacent boundary manifold.
    pub fn diffusion_flux_term(
        &self,
        flux: &ScalarField,
        transform: &Transform,
    ) -> Result<ScalarField, FieldError> {
        Ok(self.with_values(self.manifold.diffusion_flux_term(flux, transform)?))
    }

    pub fn integrate(&self) -> Result<f64, FieldError> {
        self.manifold.integrate(self)
    }

    /// Overwrite this (boundary) field with `from` sampled through `transform`.
    pub fn restrict(&mut self, from: &ScalarField, transform: &Transform) -> Result<(), FieldError> {
        let manifold = Arc::clone(&self.manifold);
        manifold.restrict(from, transform, self)
    }

    /// Pin this field to `boundary`'s values at the nearest nodes.
    pub fn dirichlet_bc(
        &mut self,
        boundary: &ScalarField,
        transform: &Transform,
    ) -> Result<(), FieldError> {
        let manifold = Arc::clone(&self.manifold);
        manifold.dirichlet_bc(boundary, transform, self)
    }

    pub fn scaled(&self, factor: f64) -> ScalarField {
        self.with_values(self.values.iter().map(|v| v * factor).collect())
    }

    pub fn try_add(&self, other: &ScalarField) -> Result<ScalarField, FieldError> {
        self.ensure_same_manifold(other)?;
        Ok(self.with_values(
            self.values.iter().zip(&other.values).map(|(a, b)| a + b).collect(),
        ))
    }

    pub fn try_sub(&self, other: &ScalarField) -> Result<ScalarField, FieldError> {
        self.ensure_same_manifold(other)?;
        Ok(self.with_values(
            self.values.iter().zip(&other.values).map(|(a, b)| a - b).collect(),
        ))
    }

    /// Field product as defined by the manifold (element-wise on grids,
    /// first-order product rule on bodies).
    pub fn try_mul(&self, other: &ScalarField) -> Result<ScalarField, FieldError> {
        Ok(self.with_values(self.manifold.multiply(self, other)?))
    }

    /// Field quotient as defined by the manifold.
    pub fn try_div(&self, other: &ScalarField) -> Result<ScalarField, FieldError> {
        Ok(self.with_values(self.manifold.divide(self, other)?))
    }

    pub fn add_in_place(&mut self, other: &ScalarField) -> Result<(), FieldError> {
        self.ensure_same_manifold(other)?;
        for (a, b) in self.values.iter_mut().zip(&other.values) {
            *a += b;
        }
        Ok(())
    }

    pub fn sub_in_place(&mut self, other: &ScalarField) -> Result<(), FieldError> {
        self.ensure_same_manifold(other)?;
        for (a, b) in self.values.iter_mut().zip(&other.values) {
            *a -= b;
        }
        Ok(())
    }

    pub fn mul_in_place(&mut self, other: &ScalarField) -> Result<(), FieldError> {
        self.values = self.manifold.multiply(self, other)?;
        Ok(())
    }

    pub fn scale_in_place(&mut self, factor: f64) {
        for v in &mut self.values {
            *v *= factor;
        }
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        FieldSnapshot {
            manifold: self.manifold.name().to_string(),
            manifold_id: self.manifold.id(),
            values: self.values.clone(),
        }
    }

    /// Debug dump: one value per line, plain text.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), FieldError> {
        let path = path.as_ref();
        let mut out = BufWriter::new(File::create(path)?);
        for v in &self.values {
            writeln!(out, "{v}")?;
        }
        out.flush()?;
        log::debug!("wrote {} values to {}", self.values.len(), path.display());
        Ok(())
    }
}

impl Index<usize> for ScalarField {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}

/// Serializable copy of a field's values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub manifold: String,
    pub manifold_id: ManifoldId,
    pub values: Vec<f64>,
}

fn unwrap_op(result: Result<ScalarField, FieldError>) -> ScalarField {
    result.unwrap_or_else(|e| panic!("{e}"))
}

impl Add for &ScalarField {
    type Output = ScalarField;

    /// # Panics
    /// If the operands live on different manifolds.
    fn add(self, rhs: Self) -> ScalarField {
        unwrap_op(self.try_add(rhs))
    }
}

impl Sub for &ScalarField {
    type Output = ScalarField;

    /// # Panics
    /// If the operands live on different manifolds.
    fn sub(self, rhs: Self) -> ScalarField {
        unwrap_op(self.try_sub(rhs))
    }
}

impl Mul for &ScalarField {
    type Output = ScalarField;

    /// # Panics
    /// If the operands live on different manifolds.
    fn mul(self, rhs: Self) -> ScalarField {
        unwrap_op(self.try_mul(rhs))
    }
}

impl Div for &ScalarField {
    type Output = ScalarField;

    /// # Panics
    /// If the operands live on different manifolds or the divisor has a zero
    /// element (grids) or zero mean (bodies).
    fn div(self, rhs: Self) -> ScalarField {
        unwrap_op(self.try_div(rhs))
    }
}

impl Mul<f64> for &ScalarField {
    type Output = ScalarField;

    fn mul(self, factor: f64) -> ScalarField {
        self.scaled(factor)
    }
}

impl Mul<&ScalarField> for f64 {
    type Output = ScalarField;

    fn mul(self, field: &ScalarField) -> ScalarField {
        field.scaled(self)
    }
}
