//! Grid manifolds backed by a regular lattice of nodes.
//!
//! Interpolation and derivative math is delegated to the configured
//! [`Interpolator`]; this type owns the outside-is-zero policy, quadrature,
//! and nearest-node boundary coupling.

use rayon::prelude::*;

use super::{
    BoundaryPolicy, FieldError, InterpolationScheme, Interpolator, Lattice, apply_row,
    build_interpolator,
};

/// Lattice manifold: an interpolated rectangle (2D) or rectangular prism (3D).
#[derive(Debug)]
pub struct InterpolatedNodes {
    lattice: Lattice,
    interpolator: Box<dyn Interpolator>,
    principal_points: Vec<[f64; 3]>,
}

impl InterpolatedNodes {
    pub fn new(
        nodes: &[usize],
        step_size: f64,
        boundary: BoundaryPolicy,
        scheme: InterpolationScheme,
    ) -> Result<Self, FieldError> {
        let lattice = Lattice::new(nodes, step_size, boundary)?;
        let interpolator = build_interpolator(scheme, lattice)?;
        let principal_points = (0..lattice.array_size())
            .map(|n| lattice.node_position(n))
            .collect();

        Ok(Self {
            lattice,
            interpolator,
            principal_points,
        })
    }

    #[inline]
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn interpolator(&self) -> &dyn Interpolator {
        self.interpolator.as_ref()
    }

    /// Recompute the interpolator's precomputed stencils from scratch.
    pub fn reinit(&mut self) {
        self.interpolator.init(self.lattice);
    }

    /// Node coordinates, in array order.
    pub fn principal_points(&self) -> &[[f64; 3]] {
        &self.principal_points
    }

    pub fn check_point(&self, point: &[f64]) -> Result<(), FieldError> {
        if point.len() != self.lattice.dim() {
            return Err(FieldError::DimensionMismatch {
                expected: self.lattice.dim(),
                found: point.len(),
            });
        }
        Ok(())
    }

    /// Interpolated value; zero outside the lattice.
    pub fn value(&self, point: &[f64], values: &[f64]) -> f64 {
        if !self.lattice.contains(point) {
            return 0.0;
        }
        apply_row(&self.interpolator.interpolation(point), values)
    }

    /// Gradient of the interpolant; zero outside the lattice.
    pub fn grad(&self, point: &[f64], values: &[f64]) -> Vec<f64> {
        if !self.lattice.contains(point) {
            return vec![0.0; self.lattice.dim()];
        }
        self.interpolator
            .gradient(point)
            .iter()
            .map(|row| apply_row(row, values))
            .collect()
    }

    pub fn laplacian(&self, values: &[f64]) -> Vec<f64> {
        (0..self.lattice.array_size())
            .into_par_iter()
            .map(|node| apply_row(self.interpolator.laplacian(node), values))
            .collect()
    }

    /// Midpoint quadrature: the interpolant at each voxel centroid times the
    /// voxel volume.
    pub fn integrate(&self, values: &[f64]) -> f64 {
        let dim = self.lattice.dim();
        let h = self.lattice.step_size();
        let mut cells = [1usize; 3];
        for (a, c) in cells.iter_mut().enumerate().take(dim) {
            *c = self.lattice.nodes_per_side(a) - 1;
        }

        let mut sum = 0.0;
        let mut centroid = vec![0.0; dim];
        for c in 0..cells.iter().product::<usize>() {
            let idx = [c % cells[0], (c / cells[0]) % cells[1], c / (cells[0] * cells[1])];
            for (a, x) in centroid.iter_mut().enumerate() {
                *x = (idx[a] as f64 + 0.5) * h;
            }
            sum += apply_row(&self.interpolator.interpolation(&centroid), values);
        }

        sum * self.voxel_volume()
    }

    pub fn voxel_volume(&self) -> f64 {
        self.lattice.step_size().powi(self.lattice.dim() as i32)
    }

    /// Rectangle: enclosed area. Prism: surface area.
    pub fn area(&self) -> f64 {
        let l = |a| self.lattice.extent(a);
        match self.lattice.dim() {
            2 => l(0) * l(1),
            3 => 2.0 * (l(0) * l(1) + l(1) * l(2) + l(2) * l(0)),
            _ => 0.0,
        }
    }

    /// Prism: enclosed volume. Rectangle: zero.
    pub fn volume(&self) -> f64 {
        match self.lattice.dim() {
            3 => (0..3).map(|a| self.lattice.extent(a)).product(),
            _ => 0.0,
        }
    }

    /// Lower-corner node indices of the cell containing `point`.
    pub fn local_to_index_array(&self, point: &[f64]) -> Result<Vec<usize>, FieldError> {
        self.check_point(point)?;
        let (idx, _) = self.lattice.lower_corner(point);
        Ok(idx[..self.lattice.dim()].to_vec())
    }

    /// Coordinates of the node at `indices`.
    pub fn index_array_to_local(&self, indices: &[usize]) -> Result<Vec<f64>, FieldError> {
        let dim = self.lattice.dim();
        if indices.len() != dim {
            return Err(FieldError::DimensionMismatch {
                expected: dim,
                found: indices.len(),
            });
        }
        if let Some(axis) = (0..dim).find(|&a| indices[a] >= self.lattice.nodes_per_side(a)) {
            return Err(FieldError::InvalidGeometry(format!(
                "node index {} exceeds {} nodes on axis {axis}",
                indices[axis],
                self.lattice.nodes_per_side(axis)
            )));
        }
        let h = self.lattice.step_size();
        Ok(indices.iter().map(|&i| i as f64 * h).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prism(boundary: BoundaryPolicy) -> InterpolatedNodes {
        InterpolatedNodes::new(&[5, 4, 6], 0.5, boundary, InterpolationScheme::Trilinear).unwrap()
    }

    fn linear_values(nodes: &InterpolatedNodes, a: f64, b: f64) -> Vec<f64> {
        nodes
            .principal_points()
            .iter()
            .map(|p| a * p[0] + b)
            .collect()
    }

    #[test]
    fn test_linear_field_reproduced() {
        let nodes = prism(BoundaryPolicy::ZeroFlux);
        let values = linear_values(&nodes, 3.0, -1.0);

        for point in [[0.0, 0.0, 0.0], [1.3, 0.7, 2.1], [2.0, 1.5, 2.5], [0.25, 1.5, 0.0]] {
            let v = nodes.value(&point, &values);
            assert!((v - (3.0 * point[0] - 1.0)).abs() < 1e-12, "value at {:?}: {}", point, v);
            let g = nodes.grad(&point, &values);
            assert!((g[0] - 3.0).abs() < 1e-12, "gradient at {:?}: {:?}", point, g);
            assert!(g[1].abs() < 1e-12 && g[2].abs() < 1e-12);
        }
    }

    #[test]
    fn test_outside_is_zero() {
        let nodes = prism(BoundaryPolicy::ZeroFlux);
        let values = vec![1.0; nodes.lattice().array_size()];
        assert_eq!(nodes.value(&[-0.1, 0.0, 0.0], &values), 0.0);
        assert_eq!(nodes.value(&[0.0, 1.6, 0.0], &values), 0.0);
        assert_eq!(nodes.grad(&[3.0, 0.0, 0.0], &values), vec![0.0; 3]);
    }

    #[test]
    fn test_integrate_constant_and_linear() {
        let nodes = prism(BoundaryPolicy::ZeroFlux);
        let volume = 2.0 * 1.5 * 2.5;
        assert!((nodes.volume() - volume).abs() < 1e-12);

        let constant = vec![2.0; nodes.lattice().array_size()];
        assert!((nodes.integrate(&constant) - 2.0 * volume).abs() < 1e-10);

        // midpoint rule is exact for linear profiles
        let linear = linear_values(&nodes, 1.0, 0.0);
        assert!((nodes.integrate(&linear) - 1.0 * volume).abs() < 1e-10);
    }

    #[test]
    fn test_rectangle_measures() {
        let rect =
            InterpolatedNodes::new(&[3, 5], 0.5, BoundaryPolicy::ZeroFlux, InterpolationScheme::Trilinear)
                .unwrap();
        assert!((rect.area() - 2.0).abs() < 1e-12);
        assert_eq!(rect.volume(), 0.0);
        assert!((rect.voxel_volume() - 0.25).abs() < 1e-12);
        let values = vec![3.0; 15];
        assert!((rect.integrate(&values) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_index_conversions() {
        let nodes = prism(BoundaryPolicy::ZeroFlux);
        assert_eq!(nodes.local_to_index_array(&[0.6, 1.5, 0.1]).unwrap(), vec![1, 2, 0]);
        assert_eq!(nodes.index_array_to_local(&[4, 3, 5]).unwrap(), vec![2.0, 1.5, 2.5]);
        assert!(matches!(
            nodes.local_to_index_array(&[0.6, 1.5]),
            Err(FieldError::DimensionMismatch { expected: 3, found: 2 })
        ));
        assert!(nodes.index_array_to_local(&[5, 0, 0]).is_err());
    }

    #[test]
    fn test_laplacian_differs_by_boundary_policy() {
        let toroidal = prism(BoundaryPolicy::Toroidal);
        let mirrored = prism(BoundaryPolicy::ZeroFlux);
        let values: Vec<f64> = toroidal
            .principal_points()
            .iter()
            .map(|p| p[0] * p[0] + 0.5 * p[1])
            .collect();

        let a = toroidal.laplacian(&values);
        let b = mirrored.laplacian(&values);
        assert!((a[0] - b[0]).abs() > 1e-6, "boundary policies agree at node 0: {} vs {}", a[0], b[0]);
    }

    #[test]
    fn test_reinit_is_idempotent() {
        let mut nodes = prism(BoundaryPolicy::Toroidal);
        let before = nodes.interpolator().laplacian(0).to_vec();
        nodes.reinit();
        assert_eq!(nodes.interpolator().laplacian(0), before.as_slice());
    }
}
