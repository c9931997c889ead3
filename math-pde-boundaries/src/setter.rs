//! Ghost-cell setters
//!
//! Setters are assembled once from validated boundary conditions and then
//! invoked at every solver step. All coefficient tables are precomputed when
//! a setter is built; applying it only creates array views over the caller's
//! buffer and writes the ghost layers in place.
//!
//! The full data array holds the tensor components first and the grid axes
//! last, with one ghost layer on both ends of every grid axis.

use crate::local::Side;
use crate::value::ValueExpression;
use ndarray::{ArrayD, ArrayViewMutD, Axis, Slice, Zip};
use std::fmt;

/// Extra arguments available to ghost-cell setters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SetterArgs {
    /// Current simulation time, used by time-dependent boundary values
    pub t: f64,
}

/// How a ghost layer is computed from the interior
pub(crate) enum GhostRule {
    /// Copy the interior cell at the opposite end of the axis
    Copy { sign: f64 },
    /// `offset + f1 * a + f2 * b`
    Linear {
        f1: f64,
        f2: f64,
        offset: ArrayD<f64>,
    },
    /// `scale * func(x, t) + f1 * a + f2 * b`
    Expression {
        func: ValueExpression,
        scale: f64,
        f1: f64,
        f2: f64,
        coords: Vec<f64>,
        points: ArrayD<usize>,
    },
}

/// Setter for the ghost layer on one side of one axis
pub struct SideGhostSetter {
    num_axes: usize,
    axis: usize,
    side: Side,
    rule: GhostRule,
}

impl SideGhostSetter {
    pub(crate) fn new(num_axes: usize, axis: usize, side: Side, rule: GhostRule) -> Self {
        Self {
            num_axes,
            axis,
            side,
            rule,
        }
    }

    /// Setter copying the opposite interior edge (`sign = -1` flips it)
    pub(crate) fn periodic(num_axes: usize, axis: usize, side: Side, sign: f64) -> Self {
        Self::new(num_axes, axis, side, GhostRule::Copy { sign })
    }

    pub fn axis(&self) -> usize {
        self.axis
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Write the ghost layer into `data_full`.
    ///
    /// Only the part of the layer lying within the interior range of all other
    /// grid axes is written; corner cells are left untouched.
    ///
    /// # Panics
    ///
    /// Panics if `data_full` does not have the layout of a full data array for
    /// the grid the setter was built for.
    pub fn apply(&self, data_full: &mut ArrayViewMutD<'_, f64>, args: Option<&SetterArgs>) {
        let ndim = data_full.ndim();
        assert!(
            ndim >= self.num_axes,
            "data array has {ndim} dimensions, but the grid has {} axes",
            self.num_axes
        );
        let rank = ndim - self.num_axes;
        let axis = Axis(rank + self.axis);
        let len = data_full.len_of(axis);
        assert!(len >= 3, "axis {} of the data array lacks ghost cells", self.axis);
        let last = len - 2;

        let view = data_full.slice_each_axis_mut(|desc| {
            let i = desc.axis.index();
            if i < rank || i == axis.index() {
                Slice::from(..)
            } else {
                Slice::new(1, Some(-1), 1)
            }
        });

        // `inner[k]` is the full-array index `k + shift`
        let (ghost, inner, shift) = match self.side {
            Side::Low => {
                let (ghost, inner) = view.split_at(axis, 1);
                (ghost, inner, 1)
            }
            Side::High => {
                let (inner, ghost) = view.split_at(axis, len - 1);
                (ghost, inner, 0)
            }
        };
        let mut ghost = ghost.index_axis_move(axis, 0);
        let cell = |full: usize| inner.index_axis(axis, full - shift);
        let (adjacent, next) = match self.side {
            Side::Low => (1, 2),
            Side::High => (last, last.saturating_sub(1)),
        };

        match &self.rule {
            GhostRule::Copy { sign } => {
                let source = match self.side {
                    Side::Low => cell(last),
                    Side::High => cell(1),
                };
                Zip::from(&mut ghost)
                    .and(&source)
                    .for_each(|g, &s| *g = sign * s);
            }
            GhostRule::Linear { f1, f2, offset } => {
                assert_eq!(
                    offset.shape(),
                    ghost.shape(),
                    "boundary value does not fit the ghost layer of axis {}",
                    self.axis
                );
                let a = cell(adjacent);
                if *f2 == 0.0 {
                    Zip::from(&mut ghost)
                        .and(&a)
                        .and(offset)
                        .for_each(|g, &a, &o| *g = o + f1 * a);
                } else {
                    let b = cell(next);
                    Zip::from(&mut ghost)
                        .and(&a)
                        .and(&b)
                        .and(offset)
                        .for_each(|g, &a, &b, &o| *g = o + f1 * a + f2 * b);
                }
            }
            GhostRule::Expression {
                func,
                scale,
                f1,
                f2,
                coords,
                points,
            } => {
                assert_eq!(rank, 0, "expression values only apply to scalar fields");
                let t = args.map_or(0.0, |args| args.t);
                let n = self.num_axes;
                let value = |p: usize| scale * (**func)(&coords[p * n..(p + 1) * n], t);
                let a = cell(adjacent);
                if *f2 == 0.0 {
                    Zip::from(&mut ghost)
                        .and(&a)
                        .and(points)
                        .for_each(|g, &a, &p| *g = value(p) + f1 * a);
                } else {
                    let b = cell(next);
                    Zip::from(&mut ghost)
                        .and(&a)
                        .and(&b)
                        .and(points)
                        .for_each(|g, &a, &b, &p| *g = value(p) + f1 * a + f2 * b);
                }
            }
        }
    }
}

impl fmt::Debug for SideGhostSetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = match self.rule {
            GhostRule::Copy { .. } => "copy",
            GhostRule::Linear { .. } => "linear",
            GhostRule::Expression { .. } => "expression",
        };
        f.debug_struct("SideGhostSetter")
            .field("axis", &self.axis)
            .field("side", &self.side)
            .field("rule", &rule)
            .finish()
    }
}

/// Setter for both ghost layers of one axis
#[derive(Debug)]
pub struct AxisGhostSetter {
    low: SideGhostSetter,
    high: SideGhostSetter,
}

impl AxisGhostSetter {
    pub fn new(low: SideGhostSetter, high: SideGhostSetter) -> Self {
        debug_assert_eq!(low.axis, high.axis);
        Self { low, high }
    }

    pub fn axis(&self) -> usize {
        self.low.axis
    }

    #[inline]
    pub fn apply(&self, data_full: &mut ArrayViewMutD<'_, f64>, args: Option<&SetterArgs>) {
        self.low.apply(data_full, args);
        self.high.apply(data_full, args);
    }
}

/// Composed setter for the ghost cells of all axes
///
/// Built once by [`make_ghost_cell_setter`](crate::BoundarySet::make_ghost_cell_setter)
/// and applied unchanged at every step. Axes are processed in order; each one
/// reads interior cells only, so the order does not change the result.
///
/// Applying the setter only creates array views. The views use [`ndarray::IxDyn`],
/// which stores up to four dimensions inline; full arrays with more dimensions
/// (for instance a rank-2 tensor field on a 3D grid) allocate their view shapes
/// on the heap at every call.
#[derive(Debug)]
pub struct GhostCellSetter {
    interior_shape: Box<[usize]>,
    axes: Box<[AxisGhostSetter]>,
}

impl GhostCellSetter {
    pub(crate) fn new(interior_shape: &[usize], axes: Vec<AxisGhostSetter>) -> Self {
        Self {
            interior_shape: interior_shape.into(),
            axes: axes.into_boxed_slice(),
        }
    }

    /// Number of composed axis setters
    pub fn num_axes(&self) -> usize {
        self.axes.len()
    }

    /// Set all ghost cells of `data_full` in place.
    ///
    /// # Panics
    ///
    /// Panics if the grid axes of `data_full` do not have the interior shape of
    /// the grid plus one ghost layer per side.
    pub fn apply(&self, data_full: &mut ArrayViewMutD<'_, f64>, args: Option<&SetterArgs>) {
        let shape = data_full.shape();
        let ndim = self.interior_shape.len();
        assert!(
            shape.len() >= ndim
                && shape[shape.len() - ndim..]
                    .iter()
                    .zip(self.interior_shape.iter())
                    .all(|(&full, &inner)| full == inner + 2),
            "data array of shape {shape:?} does not match grid shape {:?} with ghost cells",
            self.interior_shape
        );
        for setter in self.axes.iter() {
            setter.apply(data_full, args);
        }
    }

    /// Turn the setter into a plain closure
    pub fn into_fn(
        self,
    ) -> impl Fn(&mut ArrayViewMutD<'_, f64>, Option<&SetterArgs>) + Send + Sync {
        move |data_full: &mut ArrayViewMutD<'_, f64>, args: Option<&SetterArgs>| {
            self.apply(data_full, args)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, ArrayD, IxDyn, arr1};

    fn copy_setter(axis: usize, side: Side) -> SideGhostSetter {
        SideGhostSetter::periodic(2, axis, side, 1.0)
    }

    #[test]
    fn test_periodic_copy_in_2d() {
        let mut data = Array2::from_shape_fn((4, 5), |(i, j)| (10 * i + j) as f64);
        let mut view = data.view_mut().into_dyn();
        copy_setter(0, Side::Low).apply(&mut view, None);
        copy_setter(0, Side::High).apply(&mut view, None);

        // interior rows are 1 and 2
        for j in 1..4 {
            assert_eq!(data[[0, j]], data[[2, j]]);
            assert_eq!(data[[3, j]], data[[1, j]]);
        }
        // corners untouched
        assert_eq!(data[[0, 0]], 0.0);
        assert_eq!(data[[3, 4]], 34.0);
    }

    #[test]
    fn test_linear_rule_on_tensor_field() {
        // rank-1 field with 2 components on a 1D grid of 3 cells
        let mut data = ArrayD::zeros(IxDyn(&[2, 5]));
        data[[0, 1]] = 1.0;
        data[[1, 1]] = 2.0;
        let offset = arr1(&[10.0, 20.0]).into_dyn();
        let setter = SideGhostSetter::new(
            1,
            0,
            Side::Low,
            GhostRule::Linear {
                f1: -1.0,
                f2: 0.0,
                offset,
            },
        );
        setter.apply(&mut data.view_mut(), None);
        assert_eq!(data[[0, 0]], 9.0);
        assert_eq!(data[[1, 0]], 18.0);
    }

    #[test]
    #[should_panic(expected = "does not match grid shape")]
    fn test_wrong_shape_fails_loudly() {
        let setter = GhostCellSetter::new(&[3], vec![]);
        let mut data = ArrayD::<f64>::zeros(IxDyn(&[4]));
        setter.apply(&mut data.view_mut(), None);
    }
}
