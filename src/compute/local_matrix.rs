//! Sparse stencil entries.
//!
//! One row of a sparse operator is a slice of [`LocalMatrix`] entries;
//! applying the row to a field array is a dot product over the referenced
//! indices.

/// A single `(index, coefficient)` entry of a sparse stencil row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalMatrix {
    /// Linear index into the field array.
    pub index: usize,
    /// Weight applied to the value at `index`.
    pub coefficient: f64,
}

impl LocalMatrix {
    #[inline]
    pub const fn new(index: usize, coefficient: f64) -> Self {
        Self { index, coefficient }
    }
}

/// Apply one stencil row to a field array.
#[inline]
pub fn apply_row(row: &[LocalMatrix], values: &[f64]) -> f64 {
    row.iter().map(|e| e.coefficient * values[e.index]).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_row() {
        let values = [1.0, 2.0, 4.0, 8.0];
        let row = [
            LocalMatrix::new(0, 0.5),
            LocalMatrix::new(3, -1.0),
            LocalMatrix::new(3, 0.25),
        ];
        let result = apply_row(&row, &values);
        assert!((result - (0.5 - 8.0 + 2.0)).abs() < 1e-12, "got {}", result);
    }

    #[test]
    fn test_apply_empty_row() {
        assert_eq!(apply_row(&[], &[1.0, 2.0]), 0.0);
    }
}
