//! Moment-expansion manifolds for point-like bodies.
//!
//! A field on a tiny body is four coefficients: the mean value followed by
//! the three components of a first-order gradient. Everything here is closed
//! form; there is no lattice and no stencil.

use std::f64::consts::PI;

use nalgebra::Vector3;

use super::FieldError;

/// Number of coefficients stored for a moment-expansion field.
pub const MOMENT_ARRAY_SIZE: usize = 4;

fn checked_radius(radius: f64) -> Result<f64, FieldError> {
    if radius.is_finite() && radius > 0.0 {
        Ok(radius)
    } else {
        Err(FieldError::InvalidGeometry(format!(
            "radius must be positive, got {radius}"
        )))
    }
}

#[inline]
fn gradient(values: &[f64]) -> Vector3<f64> {
    Vector3::new(values[1], values[2], values[3])
}

/// First-order product rule: `(a0 b0, a0 ∇b + ∇a b0)`.
pub fn moment_product(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![a[0] * b[0]; MOMENT_ARRAY_SIZE];
    for i in 1..MOMENT_ARRAY_SIZE {
        out[i] = a[0] * b[i] + a[i] * b[0];
    }
    out
}

/// First-order quotient rule: `(a0 / b0, (∇a b0 - a0 ∇b) / b0²)`.
pub fn moment_quotient(a: &[f64], b: &[f64]) -> Result<Vec<f64>, FieldError> {
    if b[0] == 0.0 {
        return Err(FieldError::DivisionByZero);
    }
    let b0_sq = b[0] * b[0];
    let mut out = vec![a[0] / b[0]; MOMENT_ARRAY_SIZE];
    for i in 1..MOMENT_ARRAY_SIZE {
        out[i] = (a[i] * b[0] - a[0] * b[i]) / b0_sq;
    }
    Ok(out)
}

/// Laplacian shared by both bodies: zero mean, gradient scaled by `factor`.
fn scaled_gradient(values: &[f64], factor: f64) -> Vec<f64> {
    let mut out = vec![0.0; MOMENT_ARRAY_SIZE];
    for i in 1..MOMENT_ARRAY_SIZE {
        out[i] = factor * values[i];
    }
    out
}

/// Spherical surface (e.g. a cell membrane) of a given radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TinySphere {
    radius: f64,
}

impl TinySphere {
    pub fn new(radius: f64) -> Result<Self, FieldError> {
        Ok(Self {
            radius: checked_radius(radius)?,
        })
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn area(&self) -> f64 {
        4.0 * PI * self.radius * self.radius
    }

    /// `mean + r (x̂ · ∇)`; the centre itself reports the mean.
    pub fn value(&self, x: &Vector3<f64>, values: &[f64]) -> f64 {
        let norm = x.norm();
        if norm == 0.0 {
            return values[0];
        }
        values[0] + self.radius * (x / norm).dot(&gradient(values))
    }

    pub fn laplacian(&self, values: &[f64]) -> Vec<f64> {
        scaled_gradient(values, -2.0 / (self.radius * self.radius))
    }

    /// The gradient terms integrate to zero over the surface.
    pub fn integrate(&self, values: &[f64]) -> f64 {
        values[0] * self.area()
    }
}

/// Solid ball (e.g. a cytosol) of a given radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TinyBall {
    radius: f64,
}

impl TinyBall {
    pub fn new(radius: f64) -> Result<Self, FieldError> {
        Ok(Self {
            radius: checked_radius(radius)?,
        })
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn area(&self) -> f64 {
        4.0 * PI * self.radius * self.radius
    }

    pub fn volume(&self) -> f64 {
        4.0 / 3.0 * PI * self.radius.powi(3)
    }

    /// `mean + x · ∇` inside the ball, zero outside.
    pub fn value(&self, x: &Vector3<f64>, values: &[f64]) -> f64 {
        if x.norm() > self.radius {
            return 0.0;
        }
        values[0] + x.dot(&gradient(values))
    }

    pub fn laplacian(&self, values: &[f64]) -> Vec<f64> {
        scaled_gradient(values, -5.0 / (self.radius * self.radius))
    }

    pub fn integrate(&self, values: &[f64]) -> f64 {
        values[0] * self.volume()
    }

    /// Couple a flux given on this ball's bounding sphere into the ball:
    /// mean scaled by `3/r`, gradient terms by `5/r³`.
    pub fn diffusion_flux_term(
        &self,
        boundary: &TinySphere,
        flux: &[f64],
    ) -> Result<Vec<f64>, FieldError> {
        if (boundary.radius() - self.radius).abs() > 1e-12 * self.radius {
            return Err(FieldError::InvalidGeometry(format!(
                "flux sphere radius {} does not bound ball of radius {}",
                boundary.radius(),
                self.radius
            )));
        }
        let r = self.radius;
        let mut out = scaled_gradient(flux, 5.0 / r.powi(3));
        out[0] = 3.0 / r * flux[0];
        Ok(out)
    }
}
