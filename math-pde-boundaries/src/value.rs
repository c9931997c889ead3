//! Value data attached to a boundary condition
//!
//! A value is either the same tensor at every boundary point, an array that
//! varies along the boundary, or a callable evaluated at the boundary points.

use crate::error::{BoundaryError, Result};
use crate::grid::Grid;
use ndarray::{ArrayD, Axis, Dimension, IxDyn};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Callable boundary value `f(coordinates, t)`
pub type ValueExpression = Arc<dyn Fn(&[f64], f64) -> f64 + Send + Sync>;

/// Data of a boundary condition
#[derive(Clone)]
pub enum BoundaryValue {
    /// Same tensor (of `ndim == rank`) at every boundary point
    Uniform(ArrayD<f64>),
    /// Tensor components followed by the boundary shape
    Varying { rank: usize, data: ArrayD<f64> },
    /// Scalar function of the boundary point coordinates and time
    Expression(ValueExpression),
}

impl BoundaryValue {
    /// Scalar value for a scalar field
    pub fn scalar(value: f64) -> Self {
        BoundaryValue::Uniform(ArrayD::from_elem(IxDyn(&[]), value))
    }

    /// Uniform value for a field of tensor rank `rank`, every component equal to `value`
    pub fn filled(grid: &dyn Grid, rank: usize, value: f64) -> Self {
        BoundaryValue::Uniform(ArrayD::from_elem(IxDyn(&vec![grid.dim(); rank]), value))
    }

    /// Interpret `array` as value data for the boundary of `axis`.
    ///
    /// A 0-dimensional array is broadcast to all tensor components. Otherwise
    /// the array must either be a single tensor of rank `rank` or a tensor of
    /// rank `rank` for every boundary point.
    pub fn from_array(
        array: ArrayD<f64>,
        grid: &dyn Grid,
        axis: usize,
        rank: usize,
        help: &str,
    ) -> Result<Self> {
        if array.ndim() == 0 {
            let value = array.iter().next().copied().unwrap_or(0.0);
            return Ok(Self::filled(grid, rank, value));
        }

        let boundary_dims = grid.boundary_shape(axis).len();
        let value = if array.ndim() == rank {
            BoundaryValue::Uniform(array)
        } else if array.ndim() == rank + boundary_dims {
            BoundaryValue::Varying { rank, data: array }
        } else {
            return Err(BoundaryError::Rank {
                axis: Some(axis),
                side: None,
                expected: rank,
                actual: array.ndim(),
            });
        };
        value.validate(grid, axis, help)?;
        Ok(value)
    }

    /// Check that the stored data fits the boundary of `axis` on `grid`.
    ///
    /// Every tensor extent must equal `grid.dim()` and varying data must end
    /// with the boundary shape of `axis`.
    pub fn validate(&self, grid: &dyn Grid, axis: usize, help: &str) -> Result<()> {
        let boundary_shape = grid.boundary_shape(axis);
        let (data, rank, spatial_dims) = match self {
            BoundaryValue::Uniform(data) => (data, data.ndim(), 0),
            BoundaryValue::Varying { rank, data } => (data, *rank, boundary_shape.len()),
            BoundaryValue::Expression(_) => return Ok(()),
        };
        let dim = grid.dim();
        if data.ndim() != rank + spatial_dims {
            return Err(BoundaryError::bc_data(
                format!(
                    "Boundary value of shape {:?} does not match rank {rank} on the \
                     boundary shape {boundary_shape:?} of axis {axis}",
                    data.shape()
                ),
                help,
            ));
        }

        let (tensor, spatial) = data.shape().split_at(rank);
        if tensor.iter().any(|&n| n != dim) {
            return Err(BoundaryError::bc_data(
                format!(
                    "Boundary value of shape {:?} does not match {dim} tensor components",
                    data.shape()
                ),
                help,
            ));
        }
        if spatial_dims > 0 && spatial != boundary_shape.as_slice() {
            return Err(BoundaryError::bc_data(
                format!(
                    "Boundary value of shape {:?} does not match the boundary shape \
                     {boundary_shape:?} of axis {axis}",
                    data.shape()
                ),
                help,
            ));
        }
        Ok(())
    }

    /// Tensor rank of the value data
    pub fn rank(&self) -> usize {
        match self {
            BoundaryValue::Uniform(data) => data.ndim(),
            BoundaryValue::Varying { rank, .. } => *rank,
            BoundaryValue::Expression(_) => 0,
        }
    }

    /// Returns `true` if the value needs to be re-evaluated on every call
    pub fn is_time_dependent(&self) -> bool {
        matches!(self, BoundaryValue::Expression(_))
    }

    /// Returns `true` if every stored value is zero
    pub fn is_zero(&self) -> bool {
        match self {
            BoundaryValue::Uniform(data) | BoundaryValue::Varying { data, .. } => {
                data.iter().all(|&v| v == 0.0)
            }
            BoundaryValue::Expression(_) => false,
        }
    }

    /// Select one tensor component, reducing the rank by `indices.len()`
    pub fn extract_component(&self, indices: &[usize], dim: usize, help: &str) -> Result<Self> {
        if indices.is_empty() {
            return Ok(self.clone());
        }
        let rank = self.rank();
        if indices.len() > rank {
            return Err(BoundaryError::Rank {
                axis: None,
                side: None,
                expected: indices.len(),
                actual: rank,
            });
        }
        if let Some(&index) = indices.iter().find(|&&i| i >= dim) {
            return Err(BoundaryError::bc_data(
                format!("Component index {index} out of range for {dim} components"),
                help,
            ));
        }

        let select = |data: &ArrayD<f64>| {
            let mut view = data.view();
            for &index in indices {
                view = view.index_axis_move(Axis(0), index);
            }
            view.to_owned()
        };
        Ok(match self {
            BoundaryValue::Uniform(data) => BoundaryValue::Uniform(select(data)),
            BoundaryValue::Varying { rank, data } => BoundaryValue::Varying {
                rank: rank - indices.len(),
                data: select(data),
            },
            BoundaryValue::Expression(_) => unreachable!("expressions have rank 0"),
        })
    }

    /// Ghost offset `scale * value` laid out like the ghost layer of `axis`.
    ///
    /// The layout is the tensor components followed by the boundary shape.
    /// Expressions have no stored data and yield `None`.
    pub(crate) fn offset_field(
        &self,
        grid: &dyn Grid,
        axis: usize,
        scale: f64,
    ) -> Option<ArrayD<f64>> {
        match self {
            BoundaryValue::Uniform(data) => {
                let rank = data.ndim();
                let mut shape = vec![grid.dim(); rank];
                shape.extend(grid.boundary_shape(axis));
                Some(ArrayD::from_shape_fn(IxDyn(&shape), |index| {
                    scale * data[&index.slice()[..rank]]
                }))
            }
            BoundaryValue::Varying { data, .. } => Some(data.mapv(|v| scale * v)),
            BoundaryValue::Expression(_) => None,
        }
    }

    /// Feed the configuration into `state`; expressions hash by identity
    pub fn hash_into<H: Hasher>(&self, state: &mut H) {
        match self {
            BoundaryValue::Uniform(data) => {
                0u8.hash(state);
                hash_array(data, state);
            }
            BoundaryValue::Varying { rank, data } => {
                1u8.hash(state);
                rank.hash(state);
                hash_array(data, state);
            }
            BoundaryValue::Expression(func) => {
                2u8.hash(state);
                (Arc::as_ptr(func) as *const () as usize).hash(state);
            }
        }
    }
}

fn hash_array<H: Hasher>(data: &ArrayD<f64>, state: &mut H) {
    data.shape().hash(state);
    for &v in data.iter() {
        float_bits(v).hash(state);
    }
}

/// Bits of `v` with `-0.0` folded into `0.0`, so values that compare equal hash equally
pub(crate) fn float_bits(v: f64) -> u64 {
    if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() }
}

impl PartialEq for BoundaryValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (BoundaryValue::Uniform(a), BoundaryValue::Uniform(b)) => a == b,
            (
                BoundaryValue::Varying { rank: ra, data: a },
                BoundaryValue::Varying { rank: rb, data: b },
            ) => ra == rb && a == b,
            (BoundaryValue::Expression(a), BoundaryValue::Expression(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for BoundaryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryValue::Uniform(data) => f.debug_tuple("Uniform").field(data).finish(),
            BoundaryValue::Varying { rank, data } => f
                .debug_struct("Varying")
                .field("rank", rank)
                .field("shape", &data.shape())
                .finish(),
            BoundaryValue::Expression(_) => f.write_str("Expression(..)"),
        }
    }
}

impl fmt::Display for BoundaryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryValue::Uniform(data) if data.ndim() == 0 => {
                write!(f, "{}", data.iter().next().copied().unwrap_or(0.0))
            }
            BoundaryValue::Uniform(data) => {
                let values: Vec<f64> = data.iter().copied().collect();
                write!(f, "{values:?}")
            }
            BoundaryValue::Varying { data, .. } => write!(f, "<array {:?}>", data.shape()),
            BoundaryValue::Expression(_) => f.write_str("<expression>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CartesianGrid;
    use ndarray::{arr1, arr2};
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(value: &BoundaryValue) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash_into(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_scalar_is_broadcast_to_rank() {
        let grid = CartesianGrid::unit(vec![4, 5], vec![false, false]).unwrap();
        let scalar = ArrayD::from_elem(IxDyn(&[]), 3.0);
        let value = BoundaryValue::from_array(scalar, &grid, 0, 1, "").unwrap();
        assert_eq!(value.rank(), 1);
        assert_eq!(value, BoundaryValue::filled(&grid, 1, 3.0));
    }

    #[test]
    fn test_varying_value_shape() {
        let grid = CartesianGrid::unit(vec![4, 3], vec![false, false]).unwrap();
        let along_axis0 = arr1(&[1.0, 2.0, 3.0]).into_dyn();
        let value = BoundaryValue::from_array(along_axis0.clone(), &grid, 0, 0, "").unwrap();
        assert!(matches!(value, BoundaryValue::Varying { rank: 0, .. }));

        // the boundary of axis 1 has 4 points, not 3
        let err = BoundaryValue::from_array(along_axis0, &grid, 1, 0, "").unwrap_err();
        assert!(err.is_bc_data_error());

        // a 2x2 tensor is rank 2, not rank 1 for this grid
        let tensor = arr2(&[[1.0, 0.0], [0.0, 1.0]]).into_dyn();
        let err = BoundaryValue::from_array(tensor, &grid, 0, 0, "").unwrap_err();
        assert!(err.is_rank_error());
    }

    #[test]
    fn test_extract_component() {
        let grid = CartesianGrid::unit(vec![4, 3], vec![false, false]).unwrap();
        let tensor = arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn();
        let value = BoundaryValue::from_array(tensor, &grid, 0, 2, "").unwrap();

        let row = value.extract_component(&[1], 2, "").unwrap();
        assert_eq!(row.rank(), 1);
        assert_eq!(row, BoundaryValue::Uniform(arr1(&[3.0, 4.0]).into_dyn()));

        let entry = value.extract_component(&[0, 1], 2, "").unwrap();
        assert_eq!(entry, BoundaryValue::scalar(2.0));

        assert!(value.extract_component(&[0, 0, 0], 2, "").unwrap_err().is_rank_error());
        assert!(value.extract_component(&[2], 2, "").unwrap_err().is_bc_data_error());
    }

    #[test]
    fn test_offset_field_layout() {
        let grid = CartesianGrid::unit(vec![4, 3], vec![false, false]).unwrap();
        let value = BoundaryValue::Uniform(arr1(&[1.0, -1.0]).into_dyn());
        let offset = value.offset_field(&grid, 0, 2.0).unwrap();
        assert_eq!(offset.shape(), &[2, 3]);
        assert_eq!(offset[[0, 2]], 2.0);
        assert_eq!(offset[[1, 0]], -2.0);

        let varying = BoundaryValue::Varying {
            rank: 0,
            data: arr1(&[1.0, 2.0, 3.0, 4.0]).into_dyn(),
        };
        let offset = varying.offset_field(&grid, 1, 0.5).unwrap();
        assert_eq!(offset.as_slice().unwrap(), &[0.5, 1.0, 1.5, 2.0]);

        let func: ValueExpression = Arc::new(|_: &[f64], _: f64| 1.0);
        assert!(BoundaryValue::Expression(func).offset_field(&grid, 0, 1.0).is_none());
    }

    #[test]
    fn test_hash_tracks_content() {
        let a = BoundaryValue::scalar(1.0);
        let b = BoundaryValue::scalar(2.0);
        assert_eq!(hash_of(&a), hash_of(&a.clone()));
        assert_ne!(hash_of(&a), hash_of(&b));

        let func: ValueExpression = Arc::new(|x: &[f64], t: f64| x[0] + t);
        let e = BoundaryValue::Expression(func.clone());
        assert_eq!(e, e.clone());
        assert_eq!(hash_of(&e), hash_of(&BoundaryValue::Expression(func)));
        assert_ne!(e, BoundaryValue::Expression(Arc::new(|_: &[f64], _: f64| 0.0)));
    }
}
