//! Grid contract used by the boundary conditions
//!
//! Boundary conditions only need a handful of facts about the discretized
//! domain: the number of axes, which of them wrap around, and the geometry
//! needed to place boundary points. [`Grid`] captures exactly that, and
//! [`CartesianGrid`] provides a uniform, cell-centred implementation.

use crate::local::Side;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

/// Shared handle to a grid. Boundaries compare grids by identity of this handle.
pub type GridRef = Arc<dyn Grid>;

/// Geometric information a boundary condition needs from its grid.
///
/// All coordinates refer to a cell-centred discretization: cell `i` of an
/// axis with bounds `(lo, hi)` and spacing `dx` is centred at
/// `lo + (i + 0.5) * dx`.
pub trait Grid: Debug + Send + Sync {
    /// Number of axes of the grid
    fn num_axes(&self) -> usize;

    /// Number of tensor components per rank (the embedding dimension)
    fn dim(&self) -> usize {
        self.num_axes()
    }

    /// Periodicity flag for every axis
    fn periodic(&self) -> &[bool];

    /// Number of interior cells along every axis
    fn shape(&self) -> &[usize];

    /// Cell spacing along every axis
    fn discretization(&self) -> &[f64];

    /// Lower and upper coordinate of every axis
    fn axes_bounds(&self) -> &[(f64, f64)];

    /// Coordinate of the centre of interior cell `index` along `axis`
    fn cell_coordinate(&self, axis: usize, index: usize) -> f64 {
        let (lo, _) = self.axes_bounds()[axis];
        lo + (index as f64 + 0.5) * self.discretization()[axis]
    }

    /// Coordinate of the boundary on `side` of `axis`
    fn boundary_coordinate(&self, axis: usize, side: Side) -> f64 {
        let (lo, hi) = self.axes_bounds()[axis];
        match side {
            Side::Low => lo,
            Side::High => hi,
        }
    }

    /// Shape of a full data array (including one ghost layer per side)
    /// for a field of tensor rank `rank`
    fn full_shape(&self, rank: usize) -> Vec<usize> {
        let mut shape = vec![self.dim(); rank];
        shape.extend(self.shape().iter().map(|n| n + 2));
        shape
    }

    /// Shape of the boundary of `axis` (the grid shape without that axis)
    fn boundary_shape(&self, axis: usize) -> Vec<usize> {
        self.shape()
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != axis)
            .map(|(_, &n)| n)
            .collect()
    }
}

/// Returns `true` if both handles point to the same grid instance.
#[inline]
pub fn same_grid(a: &GridRef, b: &GridRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Errors raised while constructing a grid
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("grid needs at least one axis")]
    NoAxes,
    #[error(
        "grid definition mismatch: {bounds} bounds, {shape} shape entries, \
         {periodic} periodicity flags"
    )]
    LengthMismatch {
        bounds: usize,
        shape: usize,
        periodic: usize,
    },
    #[error("axis {axis} needs at least one cell")]
    EmptyAxis { axis: usize },
    #[error("axis {axis} has invalid bounds ({lo}, {hi})")]
    InvalidBounds { axis: usize, lo: f64, hi: f64 },
}

/// Uniform Cartesian grid with cell-centred support points
#[derive(Debug, Clone, PartialEq)]
pub struct CartesianGrid {
    bounds: Vec<(f64, f64)>,
    shape: Vec<usize>,
    periodic: Vec<bool>,
    spacing: Vec<f64>,
}

impl CartesianGrid {
    /// Create a grid from axis bounds, cell counts and periodicity flags
    pub fn new(
        bounds: Vec<(f64, f64)>,
        shape: Vec<usize>,
        periodic: Vec<bool>,
    ) -> Result<Self, GridError> {
        if shape.is_empty() {
            return Err(GridError::NoAxes);
        }
        if bounds.len() != shape.len() || periodic.len() != shape.len() {
            return Err(GridError::LengthMismatch {
                bounds: bounds.len(),
                shape: shape.len(),
                periodic: periodic.len(),
            });
        }

        let mut spacing = Vec::with_capacity(shape.len());
        for (axis, (&(lo, hi), &n)) in bounds.iter().zip(&shape).enumerate() {
            if n == 0 {
                return Err(GridError::EmptyAxis { axis });
            }
            if !(lo.is_finite() && hi.is_finite() && hi > lo) {
                return Err(GridError::InvalidBounds { axis, lo, hi });
            }
            spacing.push((hi - lo) / n as f64);
        }

        Ok(Self {
            bounds,
            shape,
            periodic,
            spacing,
        })
    }

    /// Grid on the unit hypercube `[0, 1]^n`
    pub fn unit(shape: Vec<usize>, periodic: Vec<bool>) -> Result<Self, GridError> {
        let bounds = vec![(0.0, 1.0); shape.len()];
        Self::new(bounds, shape, periodic)
    }

    /// Wrap the grid in a shared handle
    pub fn into_shared(self) -> GridRef {
        Arc::new(self)
    }
}

impl Grid for CartesianGrid {
    fn num_axes(&self) -> usize {
        self.shape.len()
    }

    fn periodic(&self) -> &[bool] {
        &self.periodic
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn discretization(&self) -> &[f64] {
        &self.spacing
    }

    fn axes_bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cartesian_geometry() {
        let grid = CartesianGrid::new(vec![(0.0, 2.0), (-1.0, 1.0)], vec![4, 8], vec![false, true])
            .unwrap();
        assert_eq!(grid.num_axes(), 2);
        assert_eq!(grid.dim(), 2);
        assert_relative_eq!(grid.discretization()[0], 0.5);
        assert_relative_eq!(grid.discretization()[1], 0.25);
        assert_relative_eq!(grid.cell_coordinate(0, 0), 0.25);
        assert_relative_eq!(grid.cell_coordinate(1, 7), 0.875);
        assert_relative_eq!(grid.boundary_coordinate(1, Side::Low), -1.0);
        assert_eq!(grid.full_shape(0), vec![6, 10]);
        assert_eq!(grid.full_shape(1), vec![2, 6, 10]);
        assert_eq!(grid.boundary_shape(0), vec![8]);
    }

    #[test]
    fn test_invalid_grids() {
        assert_eq!(CartesianGrid::unit(vec![], vec![]), Err(GridError::NoAxes));
        assert!(matches!(
            CartesianGrid::unit(vec![3, 3], vec![false]),
            Err(GridError::LengthMismatch { .. })
        ));
        assert_eq!(
            CartesianGrid::unit(vec![3, 0], vec![false, false]),
            Err(GridError::EmptyAxis { axis: 1 })
        );
        assert!(matches!(
            CartesianGrid::new(vec![(1.0, 0.0)], vec![3], vec![false]),
            Err(GridError::InvalidBounds { axis: 0, .. })
        ));
    }

    #[test]
    fn test_grid_identity() {
        let grid = CartesianGrid::unit(vec![4], vec![false]).unwrap();
        let a = grid.clone().into_shared();
        let b = grid.into_shared();
        assert!(same_grid(&a, &a.clone()));
        assert!(!same_grid(&a, &b));
    }
}
