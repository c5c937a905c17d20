//! Spatial domains that scalar fields live on.
//!
//! [`Manifold`] is a tagged union over the four supported domains. Every
//! operator that combines fields checks that each operand was created
//! against this exact instance (compared by [`ManifoldId`]).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::schema::{FieldInitializer, InitializerKind, ManifoldConfig};

use super::{
    BoundaryPolicy, FieldError, InterpolatedNodes, InterpolationScheme, LocalMatrix,
    MOMENT_ARRAY_SIZE, ScalarField, TinyBall, TinySphere, Transform, moment_product,
    moment_quotient,
};

static NEXT_MANIFOLD_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique manifold identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ManifoldId(u64);

impl ManifoldId {
    fn next() -> Self {
        Self(NEXT_MANIFOLD_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ManifoldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "manifold#{}", self.0)
    }
}

/// The concrete domain behind a [`Manifold`].
#[derive(Debug)]
pub enum ManifoldKind {
    InterpolatedRectangle(InterpolatedNodes),
    InterpolatedRectangularPrism(InterpolatedNodes),
    TinySphere(TinySphere),
    TinyBall(TinyBall),
}

/// A spatial domain with a fixed field array size.
#[derive(Debug)]
pub struct Manifold {
    id: ManifoldId,
    kind: ManifoldKind,
}

const ORIGIN: [[f64; 3]; 1] = [[0.0; 3]];

impl Manifold {
    fn from_kind(kind: ManifoldKind) -> Self {
        let manifold = Self {
            id: ManifoldId::next(),
            kind,
        };
        log::debug!(
            "created {} {} (dim {}, array size {})",
            manifold.name(),
            manifold.id,
            manifold.dim(),
            manifold.array_size()
        );
        manifold
    }

    pub fn interpolated_rectangle(
        nodes: [usize; 2],
        step_size: f64,
        boundary: BoundaryPolicy,
        scheme: InterpolationScheme,
    ) -> Result<Self, FieldError> {
        let grid = InterpolatedNodes::new(&nodes, step_size, boundary, scheme)?;
        Ok(Self::from_kind(ManifoldKind::InterpolatedRectangle(grid)))
    }

    pub fn interpolated_rectangular_prism(
        nodes: [usize; 3],
        step_size: f64,
        boundary: BoundaryPolicy,
        scheme: InterpolationScheme,
    ) -> Result<Self, FieldError> {
        let grid = InterpolatedNodes::new(&nodes, step_size, boundary, scheme)?;
        Ok(Self::from_kind(ManifoldKind::InterpolatedRectangularPrism(grid)))
    }

    pub fn tiny_sphere(radius: f64) -> Result<Self, FieldError> {
        Ok(Self::from_kind(ManifoldKind::TinySphere(TinySphere::new(radius)?)))
    }

    pub fn tiny_ball(radius: f64) -> Result<Self, FieldError> {
        Ok(Self::from_kind(ManifoldKind::TinyBall(TinyBall::new(radius)?)))
    }

    pub fn from_config(config: &ManifoldConfig) -> Result<Self, FieldError> {
        config.validate()?;
        match *config {
            ManifoldConfig::InterpolatedRectangle {
                nodes,
                step_size,
                toroidal,
                interpolation,
            } => Self::interpolated_rectangle(nodes, step_size, boundary_for(toroidal), interpolation),
            ManifoldConfig::InterpolatedRectangularPrism {
                nodes,
                step_size,
                toroidal,
                interpolation,
            } => Self::interpolated_rectangular_prism(
                nodes,
                step_size,
                boundary_for(toroidal),
                interpolation,
            ),
            ManifoldConfig::TinySphere { radius } => Self::tiny_sphere(radius),
            ManifoldConfig::TinyBall { radius } => Self::tiny_ball(radius),
        }
    }

    #[inline]
    pub fn id(&self) -> ManifoldId {
        self.id
    }

    pub fn kind(&self) -> &ManifoldKind {
        &self.kind
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            ManifoldKind::InterpolatedRectangle(_) => "interpolated rectangle",
            ManifoldKind::InterpolatedRectangularPrism(_) => "interpolated rectangular prism",
            ManifoldKind::TinySphere(_) => "tiny sphere",
            ManifoldKind::TinyBall(_) => "tiny ball",
        }
    }

    /// The lattice manifold, if this is a grid.
    pub fn nodes(&self) -> Option<&InterpolatedNodes> {
        match &self.kind {
            ManifoldKind::InterpolatedRectangle(g) | ManifoldKind::InterpolatedRectangularPrism(g) => {
                Some(g)
            }
            _ => None,
        }
    }

    /// Rebuild a grid's precomputed Laplacian stencil from scratch; bodies
    /// have nothing to rebuild. Needs exclusive access, so call it before
    /// sharing the manifold (or through `Arc::get_mut`).
    pub fn reinit(&mut self) {
        match &mut self.kind {
            ManifoldKind::InterpolatedRectangle(g) | ManifoldKind::InterpolatedRectangularPrism(g) => {
                g.reinit();
                log::debug!("reinitialized stencils of {}", self.id);
            }
            ManifoldKind::TinySphere(_) | ManifoldKind::TinyBall(_) => {}
        }
    }

    pub fn dim(&self) -> usize {
        match &self.kind {
            ManifoldKind::InterpolatedRectangle(_) | ManifoldKind::TinySphere(_) => 2,
            ManifoldKind::InterpolatedRectangularPrism(_) | ManifoldKind::TinyBall(_) => 3,
        }
    }

    /// Number of coordinates in a query point: the lattice dimension for
    /// grids, three for bodies embedded in space.
    pub fn point_dim(&self) -> usize {
        match self.nodes() {
            Some(g) => g.lattice().dim(),
            None => 3,
        }
    }

    pub fn array_size(&self) -> usize {
        match self.nodes() {
            Some(g) => g.lattice().array_size(),
            None => MOMENT_ARRAY_SIZE,
        }
    }

    fn check_axis(&self, axis: usize) -> Result<(), FieldError> {
        if axis >= self.dim() {
            return Err(FieldError::AxisOutOfRange {
                axis,
                dim: self.dim(),
            });
        }
        Ok(())
    }

    fn check_point(&self, point: &[f64]) -> Result<(), FieldError> {
        if point.len() != self.point_dim() {
            return Err(FieldError::DimensionMismatch {
                expected: self.point_dim(),
                found: point.len(),
            });
        }
        Ok(())
    }

    /// Fail unless `field` was created against this manifold.
    pub fn ensure_owns(&self, field: &ScalarField) -> Result<(), FieldError> {
        let other = field.manifold().id();
        if other != self.id {
            return Err(FieldError::ManifoldMismatch {
                left: self.id,
                right: other,
            });
        }
        Ok(())
    }

    /// Physical length along `axis`; bodies report their radius.
    pub fn extent(&self, axis: usize) -> Result<f64, FieldError> {
        self.check_axis(axis)?;
        Ok(match &self.kind {
            ManifoldKind::InterpolatedRectangle(g) | ManifoldKind::InterpolatedRectangularPrism(g) => {
                g.lattice().extent(axis)
            }
            ManifoldKind::TinySphere(s) => s.radius(),
            ManifoldKind::TinyBall(b) => b.radius(),
        })
    }

    /// Lattice spacing; bodies have none.
    pub fn step_size(&self) -> Option<f64> {
        self.nodes().map(|g| g.lattice().step_size())
    }

    /// Node count along `axis`; bodies report a single node.
    pub fn nodes_per_side(&self, axis: usize) -> Result<usize, FieldError> {
        self.check_axis(axis)?;
        Ok(self
            .nodes()
            .map_or(1, |g| g.lattice().nodes_per_side(axis)))
    }

    /// Exchange points used for boundary coupling, in this manifold's frame.
    /// Grids expose every node; bodies expose their centre.
    pub fn principal_points(&self) -> &[[f64; 3]] {
        match self.nodes() {
            Some(g) => g.principal_points(),
            None => &ORIGIN,
        }
    }

    /// Field value at the `k`-th principal point.
    pub fn principal_value(&self, k: usize, field: &ScalarField) -> Result<f64, FieldError> {
        self.ensure_owns(field)?;
        Ok(match self.nodes() {
            Some(_) => field.values()[k],
            None => field.values()[0],
        })
    }

    pub fn area(&self) -> f64 {
        match &self.kind {
            ManifoldKind::InterpolatedRectangle(g) | ManifoldKind::InterpolatedRectangularPrism(g) => {
                g.area()
            }
            ManifoldKind::TinySphere(s) => s.area(),
            ManifoldKind::TinyBall(b) => b.area(),
        }
    }

    pub fn volume(&self) -> f64 {
        match &self.kind {
            ManifoldKind::InterpolatedRectangle(g) | ManifoldKind::InterpolatedRectangularPrism(g) => {
                g.volume()
            }
            ManifoldKind::TinySphere(_) => 0.0,
            ManifoldKind::TinyBall(b) => b.volume(),
        }
    }

    /// Measure of one lattice cell; a body is a single element, so its
    /// voxel volume is its volume.
    pub fn voxel_volume(&self) -> f64 {
        match self.nodes() {
            Some(g) => g.voxel_volume(),
            None => self.volume(),
        }
    }

    pub fn value(&self, point: &[f64], field: &ScalarField) -> Result<f64, FieldError> {
        self.ensure_owns(field)?;
        self.check_point(point)?;
        let values = field.values();
        Ok(match &self.kind {
            ManifoldKind::InterpolatedRectangle(g) | ManifoldKind::InterpolatedRectangularPrism(g) => {
                g.value(point, values)
            }
            ManifoldKind::TinySphere(s) => s.value(&Vector3::from_column_slice(point), values),
            ManifoldKind::TinyBall(b) => b.value(&Vector3::from_column_slice(point), values),
        })
    }

    /// Gradient at `point`: one component per lattice axis for grids, the
    /// three stored gradient coefficients for bodies.
    pub fn grad(&self, point: &[f64], field: &ScalarField) -> Result<Vec<f64>, FieldError> {
        self.ensure_owns(field)?;
        self.check_point(point)?;
        Ok(match self.nodes() {
            Some(g) => g.grad(point, field.values()),
            None => field.values()[1..MOMENT_ARRAY_SIZE].to_vec(),
        })
    }

    pub fn multiply(&self, a: &ScalarField, b: &ScalarField) -> Result<Vec<f64>, FieldError> {
        self.ensure_owns(a)?;
        self.ensure_owns(b)?;
        Ok(match self.nodes() {
            Some(_) => a.values().iter().zip(b.values()).map(|(x, y)| x * y).collect(),
            None => moment_product(a.values(), b.values()),
        })
    }

    pub fn divide(&self, a: &ScalarField, b: &ScalarField) -> Result<Vec<f64>, FieldError> {
        self.ensure_owns(a)?;
        self.ensure_owns(b)?;
        match self.nodes() {
            Some(_) => a
                .values()
                .iter()
                .zip(b.values())
                .map(|(&x, &y)| {
                    if y == 0.0 {
                        Err(FieldError::DivisionByZero)
                    } else {
                        Ok(x / y)
                    }
                })
                .collect(),
            None => moment_quotient(a.values(), b.values()),
        }
    }

    pub fn laplacian(&self, field: &ScalarField) -> Result<Vec<f64>, FieldError> {
        self.ensure_owns(field)?;
        let values = field.values();
        Ok(match &self.kind {
            ManifoldKind::InterpolatedRectangle(g) | ManifoldKind::InterpolatedRectangularPrism(g) => {
                g.laplacian(values)
            }
            ManifoldKind::TinySphere(s) => s.laplacian(values),
            ManifoldKind::TinyBall(b) => b.laplacian(values),
        })
    }

    /// Precomputed Laplacian stencil row for `node` (grids only).
    pub fn laplacian_stencil(&self, node: usize) -> Result<&[LocalMatrix], FieldError> {
        let grid = self.nodes().ok_or(FieldError::Unsupported {
            operation: "Laplacian stencil",
            manifold: self.name(),
        })?;
        if node >= grid.lattice().array_size() {
            return Err(FieldError::InvalidGeometry(format!(
                "node {node} outside array of size {}",
                grid.lattice().array_size()
            )));
        }
        Ok(grid.interpolator().laplacian(node))
    }

    pub fn local_to_index_array(&self, point: &[f64]) -> Result<Vec<usize>, FieldError> {
        self.nodes()
            .ok_or(FieldError::Unsupported {
                operation: "index conversion",
                manifold: self.name(),
            })?
            .local_to_index_array(point)
    }

    pub fn index_array_to_local(&self, indices: &[usize]) -> Result<Vec<f64>, FieldError> {
        self.nodes()
            .ok_or(FieldError::Unsupported {
                operation: "index conversion",
                manifold: self.name(),
            })?
            .index_array_to_local(indices)
    }

    /// Source term on this manifold produced by `flux`, which lives on an
    /// adjacent boundary manifold embedded here through `transform`.
    ///
    /// Grids deposit `2 * flux / step` at the node nearest each of the
    /// boundary's principal points. This is exact only when boundary and
    /// interior principal points coincide one-to-one; with a finer boundary
    /// several points land on one node and their deposits add up.
    pub fn diffusion_flux_term(
        &self,
        flux: &ScalarField,
        transform: &Transform,
    ) -> Result<Vec<f64>, FieldError> {
        let source = flux.manifold();
        log::trace!("flux term {} -> {}", source.id(), self.id);

        match &self.kind {
            ManifoldKind::InterpolatedRectangle(g) | ManifoldKind::InterpolatedRectangularPrism(g) => {
                let dim = g.lattice().dim();
                let scale = 2.0 / g.lattice().step_size();
                let mut out = vec![0.0; self.array_size()];
                for (k, p) in source.principal_points().iter().enumerate() {
                    let q = transform.to_parent(&Vector3::from(*p))?;
                    match g.lattice().nearest_node(&q.as_slice()[..dim]) {
                        Some(node) => out[node] += scale * source.principal_value(k, flux)?,
                        None => log::warn!(
                            "principal point {:?} of {} maps outside {}; flux dropped",
                            p,
                            source.id(),
                            self.id
                        ),
                    }
                }
                Ok(out)
            }
            ManifoldKind::TinyBall(ball) => match source.kind() {
                ManifoldKind::TinySphere(sphere) => ball.diffusion_flux_term(sphere, flux.values()),
                _ => Err(FieldError::Unsupported {
                    operation: "flux from a non-sphere boundary",
                    manifold: self.name(),
                }),
            },
            ManifoldKind::TinySphere(_) => Err(FieldError::Unsupported {
                operation: "diffusion flux term",
                manifold: self.name(),
            }),
        }
    }

    pub fn integrate(&self, field: &ScalarField) -> Result<f64, FieldError> {
        self.ensure_owns(field)?;
        let values = field.values();
        Ok(match &self.kind {
            ManifoldKind::InterpolatedRectangle(g) | ManifoldKind::InterpolatedRectangularPrism(g) => {
                g.integrate(values)
            }
            ManifoldKind::TinySphere(s) => s.integrate(values),
            ManifoldKind::TinyBall(b) => b.integrate(values),
        })
    }

    /// Project `from` (an interior field) onto `to`, a field on this
    /// manifold, which is embedded in `from`'s frame through `transform`.
    ///
    /// Grids sample `from` at every node mapped into the interior frame, so
    /// this manifold should be no finer than the interior. Bodies sample the
    /// value and gradient at the transform's translation.
    pub fn restrict(
        &self,
        from: &ScalarField,
        transform: &Transform,
        to: &mut ScalarField,
    ) -> Result<(), FieldError> {
        self.ensure_owns(to)?;
        let interior = from.manifold();
        let point_dim = interior.point_dim();
        log::trace!("restrict {} -> {}", interior.id(), self.id);

        match self.nodes() {
            Some(g) => {
                let mut sampled = Vec::with_capacity(self.array_size());
                for p in g.principal_points() {
                    let q = transform.to_parent(&Vector3::from(*p))?;
                    sampled.push(interior.value(&q.as_slice()[..point_dim], from)?);
                }
                to.values_mut().copy_from_slice(&sampled);
            }
            None => {
                let t = transform.translation()?;
                let point = &t.as_slice()[..point_dim];
                let mean = interior.value(point, from)?;
                let mut grad = Vector3::zeros();
                for (a, g) in interior.grad(point, from)?.into_iter().enumerate() {
                    grad[a] = g;
                }
                let grad = transform.rotate_to_local(&grad)?;
                let values = to.values_mut();
                values[0] = mean;
                values[1..MOMENT_ARRAY_SIZE].copy_from_slice(grad.as_slice());
            }
        }
        Ok(())
    }

    /// Pin `field` (on this manifold) to `boundary`'s values by overwriting
    /// the node nearest each of the boundary's principal points.
    ///
    /// The same one-to-one caveat as [`Manifold::diffusion_flux_term`]
    /// applies; when several points share a node the last write wins.
    pub fn dirichlet_bc(
        &self,
        boundary: &ScalarField,
        transform: &Transform,
        field: &mut ScalarField,
    ) -> Result<(), FieldError> {
        self.ensure_owns(field)?;
        let grid = self.nodes().ok_or(FieldError::Unsupported {
            operation: "Dirichlet boundary condition",
            manifold: self.name(),
        })?;
        let source = boundary.manifold();
        let dim = grid.lattice().dim();
        log::trace!("dirichlet {} -> {}", source.id(), self.id);

        for (k, p) in source.principal_points().iter().enumerate() {
            let q = transform.to_parent(&Vector3::from(*p))?;
            match grid.lattice().nearest_node(&q.as_slice()[..dim]) {
                Some(node) => field.values_mut()[node] = source.principal_value(k, boundary)?,
                None => log::warn!(
                    "principal point {:?} of {} maps outside {}; value ignored",
                    p,
                    source.id(),
                    self.id
                ),
            }
        }
        Ok(())
    }

    /// Fill `values` (an array for this manifold) from `initializer`.
    ///
    /// Bodies accept only a constant.
    pub fn initialize(
        &self,
        initializer: &FieldInitializer,
        values: &mut [f64],
    ) -> Result<(), FieldError> {
        initializer.validate()?;
        let Some(grid) = self.nodes() else {
            return match initializer {
                FieldInitializer::Const { value } => {
                    values.fill(0.0);
                    values[0] = *value;
                    Ok(())
                }
                other => Err(FieldError::UnsupportedInitializer {
                    kind: other.kind(),
                    manifold: self.name(),
                }),
            };
        };

        let dim = grid.lattice().dim();
        match initializer {
            FieldInitializer::Explicit { values: explicit } if explicit.len() != values.len() => {
                Err(FieldError::InitializerParameters {
                    kind: InitializerKind::Explicit,
                    expected: values.len(),
                    found: explicit.len(),
                })
            }
            FieldInitializer::Linear { axis, .. } if *axis >= dim => {
                Err(FieldError::AxisOutOfRange { axis: *axis, dim })
            }
            _ => {
                for (n, (v, p)) in values.iter_mut().zip(grid.principal_points()).enumerate() {
                    *v = initializer.sample(n, &p[..dim]);
                }
                Ok(())
            }
        }
    }
}

fn boundary_for(toroidal: bool) -> BoundaryPolicy {
    if toroidal {
        BoundaryPolicy::Toroidal
    } else {
        BoundaryPolicy::ZeroFlux
    }
}
