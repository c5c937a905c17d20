//! Lattice geometry and stencil-producing interpolators.
//!
//! A [`Lattice`] is a regular grid of nodes spaced `step` apart, with node
//! `i` along an axis sitting at coordinate `i * step`. Values are stored one
//! per node, axis 0 varying fastest.
//!
//! An [`Interpolator`] turns a query point into sparse stencil rows
//! (interpolation weights, gradient weights) and keeps one precomputed
//! Laplacian row per node.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{FieldError, LocalMatrix};

/// How the Laplacian stencil treats neighbours past the lattice edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoundaryPolicy {
    /// Mirror onto the same-side interior neighbour (no flux across the edge).
    #[default]
    ZeroFlux,
    /// Wrap to the opposite edge. The first and last node of an axis are the
    /// same physical point, so node 0's minus neighbour is node `n - 2`.
    Toroidal,
}

/// Interpolation scheme for grid manifolds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterpolationScheme {
    #[default]
    Trilinear,
    /// Reserved; constructing a tricubic interpolator is rejected.
    Tricubic,
}

/// Regular lattice geometry shared by a grid manifold and its interpolator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    dim: usize,
    nodes: [usize; 3],
    step: f64,
    boundary: BoundaryPolicy,
}

impl Lattice {
    /// Create a lattice with `nodes.len()` axes (1 to 3).
    pub fn new(nodes: &[usize], step: f64, boundary: BoundaryPolicy) -> Result<Self, FieldError> {
        if nodes.is_empty() || nodes.len() > 3 {
            return Err(FieldError::InvalidGeometry(format!(
                "lattice must have 1 to 3 axes, got {}",
                nodes.len()
            )));
        }
        if let Some(&n) = nodes.iter().find(|&&n| n < 2) {
            return Err(FieldError::InvalidGeometry(format!(
                "each axis needs at least 2 nodes, got {n}"
            )));
        }
        if !(step.is_finite() && step > 0.0) {
            return Err(FieldError::InvalidGeometry(format!(
                "step size must be positive, got {step}"
            )));
        }

        let mut all = [1usize; 3];
        all[..nodes.len()].copy_from_slice(nodes);
        Ok(Self {
            dim: nodes.len(),
            nodes: all,
            step,
            boundary,
        })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn step_size(&self) -> f64 {
        self.step
    }

    #[inline]
    pub fn boundary(&self) -> BoundaryPolicy {
        self.boundary
    }

    /// Node count along `axis`; axes past `dim` report 1.
    #[inline]
    pub fn nodes_per_side(&self, axis: usize) -> usize {
        self.nodes[axis]
    }

    /// Total number of nodes.
    #[inline]
    pub fn array_size(&self) -> usize {
        self.nodes.iter().product()
    }

    /// Physical length along `axis`.
    #[inline]
    pub fn extent(&self, axis: usize) -> f64 {
        (self.nodes[axis] - 1) as f64 * self.step
    }

    /// Convert per-axis node indices into the linear array index.
    #[inline]
    pub fn flat_index(&self, idx: &[usize; 3]) -> usize {
        idx[0] + self.nodes[0] * (idx[1] + self.nodes[1] * idx[2])
    }

    /// Convert a linear array index into per-axis node indices.
    #[inline]
    pub fn multi_index(&self, flat: usize) -> [usize; 3] {
        let i = flat % self.nodes[0];
        let rest = flat / self.nodes[0];
        [i, rest % self.nodes[1], rest / self.nodes[1]]
    }

    /// Coordinates of a node, padded with zeros past `dim`.
    pub fn node_position(&self, flat: usize) -> [f64; 3] {
        let idx = self.multi_index(flat);
        let mut p = [0.0; 3];
        for a in 0..self.dim {
            p[a] = idx[a] as f64 * self.step;
        }
        p
    }

    fn tolerance(&self) -> f64 {
        self.step * 1e-9
    }

    /// Whether `point` (length `dim`) lies within the lattice support.
    pub fn contains(&self, point: &[f64]) -> bool {
        let tol = self.tolerance();
        (0..self.dim).all(|a| point[a] >= -tol && point[a] <= self.extent(a) + tol)
    }

    /// Lower-corner node of the cell enclosing `point`, and the fractional
    /// offset within that cell.
    ///
    /// Points on the upper boundary land in the last cell with offset 1, so
    /// the cell's upper corner never indexes past the array.
    pub fn lower_corner(&self, point: &[f64]) -> ([usize; 3], [f64; 3]) {
        let mut idx = [0usize; 3];
        let mut frac = [0.0; 3];
        for a in 0..self.dim {
            let x = point[a] / self.step;
            let last_cell = self.nodes[a] - 2;
            let i = (x.floor().max(0.0) as usize).min(last_cell);
            idx[a] = i;
            frac[a] = (x - i as f64).clamp(0.0, 1.0);
        }
        (idx, frac)
    }

    /// Node closest to `point`, or `None` when the point is more than half a
    /// step outside the lattice or not finite.
    pub fn nearest_node(&self, point: &[f64]) -> Option<usize> {
        let half = 0.5 * self.step;
        let mut idx = [0usize; 3];
        for a in 0..self.dim {
            if !point[a].is_finite() || point[a] < -half || point[a] > self.extent(a) + half {
                return None;
            }
            let i = (point[a] / self.step).round().max(0.0) as usize;
            idx[a] = i.min(self.nodes[a] - 1);
        }
        Some(self.flat_index(&idx))
    }

    /// Minus and plus neighbours of node `i` along `axis`, per the boundary
    /// policy.
    pub fn neighbours(&self, axis: usize, i: usize) -> (usize, usize) {
        let n = self.nodes[axis];
        let minus = match (i, self.boundary) {
            (0, BoundaryPolicy::Toroidal) => n - 2,
            (0, BoundaryPolicy::ZeroFlux) => 1,
            _ => i - 1,
        };
        let plus = if i == n - 1 {
            match self.boundary {
                BoundaryPolicy::Toroidal => 1,
                BoundaryPolicy::ZeroFlux => n - 2,
            }
        } else {
            i + 1
        };
        (minus, plus)
    }
}

/// Stencil provider for a grid manifold.
///
/// Query points passed to `interpolation` and `gradient` must lie inside
/// the lattice; the manifold applies the outside-is-zero policy first.
pub trait Interpolator: fmt::Debug + Send + Sync {
    /// (Re)compute the precomputed stencils for `lattice`.
    fn init(&mut self, lattice: Lattice);

    fn lattice(&self) -> &Lattice;

    /// Interpolation weights at `point`.
    fn interpolation(&self, point: &[f64]) -> Vec<LocalMatrix>;

    /// One weight row per axis giving the partial derivatives at `point`.
    fn gradient(&self, point: &[f64]) -> Vec<Vec<LocalMatrix>>;

    /// Precomputed Laplacian row for `node`: the centre entry first, then the
    /// minus and plus neighbour for each axis in order.
    fn laplacian(&self, node: usize) -> &[LocalMatrix];
}

/// Multilinear interpolation on a `D`-dimensional lattice.
#[derive(Debug, Clone)]
pub struct Trilinear<const D: usize> {
    lattice: Lattice,
    laplacian: Vec<LocalMatrix>,
}

/// Bilinear interpolation on rectangles.
pub type Trilinear2D = Trilinear<2>;
/// Trilinear interpolation on rectangular prisms.
pub type Trilinear3D = Trilinear<3>;

impl<const D: usize> Trilinear<D> {
    const ROW: usize = 2 * D + 1;
    const CORNERS: usize = 1 << D;

    pub fn new(lattice: Lattice) -> Self {
        debug_assert_eq!(lattice.dim(), D, "lattice dimension must match interpolator");
        let mut interpolator = Self {
            lattice,
            laplacian: Vec::new(),
        };
        interpolator.init(lattice);
        interpolator
    }

    fn build_laplacian(lattice: &Lattice) -> Vec<LocalMatrix> {
        let inv_h2 = 1.0 / (lattice.step_size() * lattice.step_size());
        let size = lattice.array_size();
        let mut rows = Vec::with_capacity(size * Self::ROW);

        for node in 0..size {
            let idx = lattice.multi_index(node);
            rows.push(LocalMatrix::new(node, -2.0 * D as f64 * inv_h2));
            for axis in 0..D {
                let (minus, plus) = lattice.neighbours(axis, idx[axis]);
                let mut m = idx;
                m[axis] = minus;
                let mut p = idx;
                p[axis] = plus;
                rows.push(LocalMatrix::new(lattice.flat_index(&m), inv_h2));
                rows.push(LocalMatrix::new(lattice.flat_index(&p), inv_h2));
            }
        }

        rows
    }

    /// Linear index and per-axis lower/upper choice of each cell corner.
    fn corners(&self, base: &[usize; 3]) -> impl Iterator<Item = (usize, [bool; D])> + '_ {
        let base = *base;
        (0..Self::CORNERS).map(move |c| {
            let mut upper = [false; D];
            let mut idx = base;
            for (a, up) in upper.iter_mut().enumerate() {
                *up = c & (1 << a) != 0;
                if *up {
                    idx[a] += 1;
                }
            }
            (self.lattice.flat_index(&idx), upper)
        })
    }
}

#[inline]
fn axis_weight(upper: bool, frac: f64) -> f64 {
    if upper { frac } else { 1.0 - frac }
}

impl<const D: usize> Interpolator for Trilinear<D> {
    fn init(&mut self, lattice: Lattice) {
        self.laplacian = Self::build_laplacian(&lattice);
        self.lattice = lattice;
        log::debug!(
            "built {}-point Laplacian stencil over {} nodes ({:?})",
            Self::ROW,
            lattice.array_size(),
            lattice.boundary()
        );
    }

    fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    fn interpolation(&self, point: &[f64]) -> Vec<LocalMatrix> {
        let (base, frac) = self.lattice.lower_corner(point);
        self.corners(&base)
            .map(|(index, upper)| {
                let w = (0..D).map(|a| axis_weight(upper[a], frac[a])).product();
                LocalMatrix::new(index, w)
            })
            .collect()
    }

    fn gradient(&self, point: &[f64]) -> Vec<Vec<LocalMatrix>> {
        let (base, frac) = self.lattice.lower_corner(point);
        let inv_h = 1.0 / self.lattice.step_size();

        (0..D)
            .map(|k| {
                self.corners(&base)
                    .map(|(index, upper)| {
                        let sign = if upper[k] { inv_h } else { -inv_h };
                        let w: f64 = (0..D)
                            .filter(|&a| a != k)
                            .map(|a| axis_weight(upper[a], frac[a]))
                            .product();
                        LocalMatrix::new(index, sign * w)
                    })
                    .collect()
            })
            .collect()
    }

    fn laplacian(&self, node: usize) -> &[LocalMatrix] {
        let start = node * Self::ROW;
        &self.laplacian[start..start + Self::ROW]
    }
}

/// Build the interpolator for `scheme` over `lattice`.
pub fn build_interpolator(
    scheme: InterpolationScheme,
    lattice: Lattice,
) -> Result<Box<dyn Interpolator>, FieldError> {
    match (scheme, lattice.dim()) {
        (InterpolationScheme::Trilinear, 2) => Ok(Box::new(Trilinear2D::new(lattice))),
        (InterpolationScheme::Trilinear, 3) => Ok(Box::new(Trilinear3D::new(lattice))),
        (InterpolationScheme::Trilinear, d) => Err(FieldError::InvalidGeometry(format!(
            "no trilinear interpolator for {d}D lattices"
        ))),
        (InterpolationScheme::Tricubic, _) => Err(FieldError::Unsupported {
            operation: "tricubic interpolation",
            manifold: "interpolated nodes",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::apply_row;

    fn lattice_3d(boundary: BoundaryPolicy) -> Lattice {
        Lattice::new(&[5, 4, 3], 0.5, boundary).unwrap()
    }

    #[test]
    fn test_lattice_rejects_bad_geometry() {
        assert!(Lattice::new(&[1, 4], 1.0, BoundaryPolicy::ZeroFlux).is_err());
        assert!(Lattice::new(&[3, 4], 0.0, BoundaryPolicy::ZeroFlux).is_err());
        assert!(Lattice::new(&[], 1.0, BoundaryPolicy::ZeroFlux).is_err());
        assert!(Lattice::new(&[2, 2, 2, 2], 1.0, BoundaryPolicy::ZeroFlux).is_err());
    }

    #[test]
    fn test_index_round_trip() {
        let lattice = lattice_3d(BoundaryPolicy::ZeroFlux);
        assert_eq!(lattice.array_size(), 60);
        for flat in 0..lattice.array_size() {
            assert_eq!(lattice.flat_index(&lattice.multi_index(flat)), flat);
        }
        // axis 0 varies fastest
        assert_eq!(lattice.multi_index(1), [1, 0, 0]);
        assert_eq!(lattice.multi_index(5), [0, 1, 0]);
        assert_eq!(lattice.multi_index(20), [0, 0, 1]);
    }

    #[test]
    fn test_lower_corner_clamps_upper_boundary() {
        let lattice = lattice_3d(BoundaryPolicy::ZeroFlux);
        let (idx, frac) = lattice.lower_corner(&[2.0, 1.5, 1.0]);
        assert_eq!(idx, [3, 2, 1]);
        assert!((frac[0] - 1.0).abs() < 1e-12);
        assert!((frac[1] - 1.0).abs() < 1e-12);
        assert!((frac[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_nearest_node() {
        let lattice = lattice_3d(BoundaryPolicy::ZeroFlux);
        assert_eq!(lattice.nearest_node(&[0.6, 0.1, 0.0]), Some(1));
        assert_eq!(lattice.nearest_node(&[2.2, 1.5, 1.0]), Some(lattice.flat_index(&[4, 3, 2])));
        assert_eq!(lattice.nearest_node(&[-0.3, 0.0, 0.0]), None);
        assert_eq!(lattice.nearest_node(&[f64::NAN, 0.0, 0.0]), None);
        assert_eq!(lattice.nearest_node(&[0.0, f64::INFINITY, 0.0]), None);
    }

    #[test]
    fn test_interpolation_weights_sum_to_one() {
        let interp = Trilinear3D::new(lattice_3d(BoundaryPolicy::ZeroFlux));
        let row = interp.interpolation(&[0.7, 1.1, 0.2]);
        assert_eq!(row.len(), 8);
        let sum: f64 = row.iter().map(|e| e.coefficient).sum();
        assert!((sum - 1.0).abs() < 1e-12, "weights sum to {}", sum);
    }

    #[test]
    fn test_gradient_weights_sum_to_zero() {
        let interp = Trilinear2D::new(Lattice::new(&[4, 4], 1.0, BoundaryPolicy::ZeroFlux).unwrap());
        for row in interp.gradient(&[1.3, 2.6]) {
            assert_eq!(row.len(), 4);
            let sum: f64 = row.iter().map(|e| e.coefficient).sum();
            assert!(sum.abs() < 1e-12, "gradient weights sum to {}", sum);
        }
    }

    #[test]
    fn test_laplacian_row_layout() {
        let lattice = lattice_3d(BoundaryPolicy::ZeroFlux);
        let interp = Trilinear3D::new(lattice);
        let node = lattice.flat_index(&[2, 1, 1]);
        let row = interp.laplacian(node);
        assert_eq!(row.len(), 7);
        assert_eq!(row[0].index, node);
        assert!((row[0].coefficient + 6.0 / 0.25).abs() < 1e-12);
        assert_eq!(row[1].index, lattice.flat_index(&[1, 1, 1]));
        assert_eq!(row[2].index, lattice.flat_index(&[3, 1, 1]));
        assert_eq!(row[5].index, lattice.flat_index(&[2, 1, 0]));
        assert_eq!(row[6].index, lattice.flat_index(&[2, 1, 2]));
    }

    #[test]
    fn test_edge_neighbours_by_policy() {
        let toroidal = lattice_3d(BoundaryPolicy::Toroidal);
        assert_eq!(toroidal.neighbours(0, 0), (3, 1));
        assert_eq!(toroidal.neighbours(0, 4), (3, 1));

        let mirrored = lattice_3d(BoundaryPolicy::ZeroFlux);
        assert_eq!(mirrored.neighbours(0, 0), (1, 1));
        assert_eq!(mirrored.neighbours(0, 4), (3, 3));
    }

    #[test]
    fn test_laplacian_of_quadratic_is_exact_inside() {
        let lattice = Lattice::new(&[6, 6], 0.25, BoundaryPolicy::ZeroFlux).unwrap();
        let interp = Trilinear2D::new(lattice);
        let values: Vec<f64> = (0..lattice.array_size())
            .map(|n| {
                let p = lattice.node_position(n);
                p[0] * p[0] + 3.0 * p[1] * p[1]
            })
            .collect();
        let node = lattice.flat_index(&[2, 3, 0]);
        let lap = apply_row(interp.laplacian(node), &values);
        assert!((lap - 8.0).abs() < 1e-9, "got {}", lap);
    }

    #[test]
    fn test_reinit_replaces_stencil() {
        let mut interp = Trilinear2D::new(Lattice::new(&[4, 4], 1.0, BoundaryPolicy::ZeroFlux).unwrap());
        assert_eq!(interp.laplacian(0)[1].index, 1);
        interp.init(Lattice::new(&[4, 4], 1.0, BoundaryPolicy::Toroidal).unwrap());
        assert_eq!(interp.laplacian(0)[1].index, 2);
        assert_eq!(interp.lattice().boundary(), BoundaryPolicy::Toroidal);
    }

    #[test]
    fn test_tricubic_is_rejected() {
        let lattice = Lattice::new(&[4, 4], 1.0, BoundaryPolicy::ZeroFlux).unwrap();
        assert!(matches!(
            build_interpolator(InterpolationScheme::Tricubic, lattice),
            Err(FieldError::Unsupported { .. })
        ));
        assert!(build_interpolator(InterpolationScheme::Trilinear, lattice).is_ok());
    }
}
