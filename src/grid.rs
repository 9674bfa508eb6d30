use ndarray::Array3;

use crate::{field::ScalarField, types::Value};

/// A cubic sampling volume `[min, max)³` with a fixed lattice spacing.
///
/// Cells are never materialised; the lattice is implicit, and a cell is
/// identified by its integer index `(i, j, k)` along the three axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridBounds {
    /// Lower corner of the volume on all three axes.
    pub min: Value,
    /// Upper corner of the volume on all three axes.
    pub max: Value,
    /// Edge length of one cell.
    pub step: Value,
}

impl GridBounds {
    pub fn new(min: Value, max: Value, step: Value) -> Self {
        Self { min, max, step }
    }

    /// Number of cells along each axis: `floor((max − min) / step)`.
    ///
    /// Degenerate parameters (`step ≤ 0`, `max ≤ min`, non-finite values)
    /// yield zero cells, so extraction over them produces an empty mesh
    /// rather than an error.
    pub fn cells_per_axis(&self) -> usize {
        if !self.min.is_finite() || !self.max.is_finite() || !self.step.is_finite() {
            return 0;
        }
        if self.step <= 0.0 || self.max <= self.min {
            return 0;
        }
        ((self.max - self.min) / self.step) as usize
    }

    /// World-space position of the lattice corner `(i, j, k)`.
    #[inline]
    pub fn corner(&self, i: usize, j: usize, k: usize) -> [Value; 3] {
        [
            self.min + i as Value * self.step,
            self.min + j as Value * self.step,
            self.min + k as Value * self.step,
        ]
    }
}

/// Scalar field values captured at every lattice corner of a [`GridBounds`].
///
/// A grid with `n` cells per axis stores `(n + 1)³` corner samples, indexed
/// `[i, j, k]` along x, y, z. Sampling once up front means each corner is
/// evaluated a single time instead of once per adjacent cell, and detaches
/// extraction from the field itself, which may not be `Send`.
#[derive(Clone, Debug)]
pub struct SampledGrid {
    bounds: GridBounds,
    cells: usize,
    values: Array3<Value>,
}

impl SampledGrid {
    /// Evaluates `field` at every lattice corner of `bounds`.
    pub fn from_field<F>(field: &F, bounds: GridBounds) -> Self
    where
        F: ScalarField + ?Sized,
    {
        let cells = bounds.cells_per_axis();
        let corners = cells + 1;
        let values = Array3::from_shape_fn((corners, corners, corners), |(i, j, k)| {
            let [x, y, z] = bounds.corner(i, j, k);
            field.sample(x, y, z)
        });
        Self {
            bounds,
            cells,
            values,
        }
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    /// Number of cells along each axis.
    pub fn cells_per_axis(&self) -> usize {
        self.cells
    }

    /// Sampled value at lattice corner `(i, j, k)`.
    #[inline]
    pub fn value(&self, i: usize, j: usize, k: usize) -> Value {
        self.values[[i, j, k]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Sphere;

    #[test]
    fn cell_count_floors() {
        assert_eq!(GridBounds::new(0.0, 1.0, 0.3).cells_per_axis(), 3);
        assert_eq!(GridBounds::new(-2.0, 2.0, 0.5).cells_per_axis(), 8);
    }

    #[test]
    fn degenerate_bounds_have_no_cells() {
        assert_eq!(GridBounds::new(0.0, 1.0, 0.0).cells_per_axis(), 0);
        assert_eq!(GridBounds::new(0.0, 1.0, -0.5).cells_per_axis(), 0);
        assert_eq!(GridBounds::new(1.0, 1.0, 0.1).cells_per_axis(), 0);
        assert_eq!(GridBounds::new(2.0, 1.0, 0.1).cells_per_axis(), 0);
        assert_eq!(GridBounds::new(0.0, f32::INFINITY, 0.1).cells_per_axis(), 0);
        assert_eq!(GridBounds::new(0.0, 1.0, f32::NAN).cells_per_axis(), 0);
    }

    #[test]
    fn corners_sample_the_field() {
        let bounds = GridBounds::new(-1.0, 1.0, 1.0);
        let grid = SampledGrid::from_field(&Sphere, bounds);
        assert_eq!(grid.cells_per_axis(), 2);
        // Corner (0, 0, 0) sits at (-1, -1, -1).
        assert_eq!(grid.value(0, 0, 0), 3.0);
        // Corner (1, 1, 1) sits at the origin.
        assert_eq!(grid.value(1, 1, 1), 0.0);
        assert_eq!(grid.value(2, 2, 2), 3.0);
    }
}
