//! Boundary condition on one side of one axis
//!
//! A [`BoundaryCondition`] fixes the ghost layer just outside the domain on
//! either the low or the high end of an axis. All supported kinds are linear
//! in the adjacent interior values:
//!
//! ```text
//! ghost = scale * value + f1 * a + f2 * b
//! ```
//!
//! where `a` is the interior cell next to the boundary and `b` the one after
//! it. Derivatives are taken along the outward normal on both sides.

use crate::data::{AutoFamily, BoundaryData, ConditionData, ValueData, periodic_keyword};
use crate::error::{BoundaryError, Result};
use crate::grid::{Grid, GridRef, same_grid};
use crate::setter::{GhostRule, SetterArgs, SideGhostSetter};
use crate::value::{BoundaryValue, ValueExpression, float_bits};
use ndarray::{ArrayD, ArrayViewMutD, Dimension, IxDyn};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Side of an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Low,
    High,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Low => f.write_str("low"),
            Side::High => f.write_str("high"),
        }
    }
}

/// Kind of a non-periodic boundary condition
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConditionKind {
    /// Imposed value
    Dirichlet,
    /// Imposed outward derivative
    Neumann,
    /// Imposed second derivative
    Curvature,
    /// Robin condition `∂ₙc + γc = β`; the value data holds `β`
    Mixed { gamma: f64 },
}

impl ConditionKind {
    /// Name used in configuration data
    pub fn name(&self) -> &'static str {
        match self {
            ConditionKind::Dirichlet => "dirichlet",
            ConditionKind::Neumann => "neumann",
            ConditionKind::Curvature => "curvature",
            ConditionKind::Mixed { .. } => "mixed",
        }
    }

    /// Coefficients `(scale, f1, f2)` of the ghost rule for spacing `dx`
    pub fn coefficients(&self, dx: f64) -> (f64, f64, f64) {
        match *self {
            ConditionKind::Dirichlet => (2.0, -1.0, 0.0),
            ConditionKind::Neumann => (dx, 1.0, 0.0),
            ConditionKind::Curvature => (dx * dx, 2.0, -1.0),
            ConditionKind::Mixed { gamma } => {
                let denom = 2.0 + dx * gamma;
                (2.0 * dx / denom, (2.0 - dx * gamma) / denom, 0.0)
            }
        }
    }

    /// Number of interior cells the ghost rule reads
    pub fn stencil_width(&self) -> usize {
        match self {
            ConditionKind::Curvature => 2,
            _ => 1,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "dirichlet" | "value" => Some(ConditionKind::Dirichlet),
            "neumann" | "derivative" => Some(ConditionKind::Neumann),
            "curvature" => Some(ConditionKind::Curvature),
            _ => None,
        }
    }
}

/// Boundary condition for one side of one axis
#[derive(Clone)]
pub struct BoundaryCondition {
    grid: GridRef,
    axis: usize,
    side: Side,
    kind: ConditionKind,
    value: BoundaryValue,
}

impl BoundaryCondition {
    /// Create a condition, validating it against the grid.
    pub fn new(
        grid: GridRef,
        axis: usize,
        side: Side,
        kind: ConditionKind,
        value: BoundaryValue,
    ) -> Result<Self> {
        if axis >= grid.num_axes() {
            return Err(BoundaryError::bc_data(
                format!("Axis {axis} does not exist on a grid with {} axes", grid.num_axes()),
                Self::help(),
            ));
        }
        value.validate(&*grid, axis, &Self::help())?;
        if grid.shape()[axis] < kind.stencil_width() {
            return Err(BoundaryError::bc_data(
                format!(
                    "A {} condition needs {} interior cells along axis {axis}, but the grid has {}",
                    kind.name(),
                    kind.stencil_width(),
                    grid.shape()[axis]
                ),
                Self::help(),
            ));
        }
        if let ConditionKind::Mixed { gamma } = kind {
            let denom = 2.0 + grid.discretization()[axis] * gamma;
            if !gamma.is_finite() || denom == 0.0 {
                return Err(BoundaryError::bc_data(
                    format!("Mixed coefficient {gamma} is degenerate on axis {axis}"),
                    Self::help(),
                ));
            }
        }
        Ok(Self {
            grid,
            axis,
            side,
            kind,
            value,
        })
    }

    /// Create a condition whose scalar value is `func(coordinates, t)`.
    ///
    /// The coordinates are those of the boundary point, `t` is taken from
    /// [`SetterArgs`] when the ghost cells are set.
    pub fn with_expression<F>(
        grid: GridRef,
        axis: usize,
        side: Side,
        kind: ConditionKind,
        func: F,
    ) -> Result<Self>
    where
        F: Fn(&[f64], f64) -> f64 + Send + Sync + 'static,
    {
        let func: ValueExpression = Arc::new(func);
        Self::new(grid, axis, side, kind, BoundaryValue::Expression(func))
    }

    /// Create a condition from configuration data for a field of tensor rank `rank`
    pub fn from_data(
        grid: &GridRef,
        axis: usize,
        side: Side,
        data: &BoundaryData,
        rank: usize,
    ) -> Result<Self> {
        match data {
            BoundaryData::Keyword(keyword) => Self::from_keyword(grid, axis, side, keyword, rank),
            BoundaryData::Condition(condition) => {
                Self::from_condition(grid, axis, side, condition, rank)
            }
            BoundaryData::Sequence(_) => Err(BoundaryError::bc_data(
                format!("Unsupported format for the {side} boundary of axis {axis}: `{data}`"),
                Self::help(),
            )),
        }
    }

    fn from_keyword(
        grid: &GridRef,
        axis: usize,
        side: Side,
        keyword: &str,
        rank: usize,
    ) -> Result<Self> {
        let Some(kind) = ConditionKind::from_name(keyword) else {
            let message = if periodic_keyword(keyword).is_some()
                || AutoFamily::from_keyword(keyword).is_some()
            {
                format!("`{keyword}` applies to a whole axis and cannot be set on one side")
            } else {
                format!("Unknown boundary condition `{keyword}`")
            };
            return Err(BoundaryError::bc_data(message, Self::help()));
        };
        let value = BoundaryValue::filled(grid.as_ref(), rank, 0.0);
        Self::new(grid.clone(), axis, side, kind, value)
    }

    fn from_condition(
        grid: &GridRef,
        axis: usize,
        side: Side,
        condition: &ConditionData,
        rank: usize,
    ) -> Result<Self> {
        let conflict = || {
            BoundaryError::bc_data(
                format!("Boundary condition `{condition:?}` mixes several kinds"),
                Self::help(),
            )
        };

        let (kind, value) = if let Some(name) = condition.kind.as_deref() {
            if condition.derivative.is_some()
                || condition.curvature.is_some()
                || condition.mixed.is_some()
            {
                return Err(conflict());
            }
            match name {
                "mixed" | "robin" => {
                    let gamma = condition
                        .value
                        .as_ref()
                        .and_then(ValueData::as_scalar)
                        .ok_or_else(|| {
                            BoundaryError::bc_data(
                                "A mixed condition needs a scalar coefficient in `value`",
                                Self::help(),
                            )
                        })?;
                    (ConditionKind::Mixed { gamma }, condition.constant.as_ref())
                }
                _ => match ConditionKind::from_name(name) {
                    Some(kind) => (kind, condition.value.as_ref()),
                    None => return Self::from_keyword(grid, axis, side, name, rank),
                },
            }
        } else {
            let candidates = [
                (ConditionKind::Dirichlet, condition.value.as_ref()),
                (ConditionKind::Neumann, condition.derivative.as_ref()),
                (ConditionKind::Curvature, condition.curvature.as_ref()),
            ];
            let mut given = candidates.into_iter().filter(|(_, v)| v.is_some());
            match (condition.mixed, given.next(), given.next()) {
                (Some(gamma), None, _) => {
                    (ConditionKind::Mixed { gamma }, condition.constant.as_ref())
                }
                (None, Some(single), None) => single,
                (None, None, _) => {
                    return Err(BoundaryError::bc_data(
                        "Boundary condition mapping does not name a condition",
                        Self::help(),
                    ));
                }
                _ => return Err(conflict()),
            }
        };

        if condition.constant.is_some() && !matches!(kind, ConditionKind::Mixed { .. }) {
            return Err(BoundaryError::bc_data(
                "`const` is only supported by mixed conditions",
                Self::help(),
            ));
        }

        let value = match value {
            Some(data) => {
                let array = data
                    .to_array()
                    .map_err(|e| BoundaryError::bc_data(e, Self::help()))?;
                BoundaryValue::from_array(array, grid.as_ref(), axis, rank, &Self::help())
                    .map_err(|e| locate(e, axis, side))?
            }
            None => BoundaryValue::filled(grid.as_ref(), rank, 0.0),
        };
        Self::new(grid.clone(), axis, side, kind, value)
    }

    /// Accepted formats of a single condition
    pub fn help() -> String {
        "Possible boundary conditions are 'dirichlet', 'neumann' and 'curvature' \
         (all with vanishing values) or mappings like {'value': V}, {'derivative': D}, \
         {'curvature': C}, {'mixed': G, 'const': B} and {'type': T, 'value': V}"
            .to_string()
    }

    pub fn grid(&self) -> &GridRef {
        &self.grid
    }

    pub fn axis(&self) -> usize {
        self.axis
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn kind(&self) -> ConditionKind {
        self.kind
    }

    pub fn value(&self) -> &BoundaryValue {
        &self.value
    }

    /// Fail with a rank error unless the value data has tensor rank `rank`
    pub fn check_value_rank(&self, rank: usize) -> Result<()> {
        let actual = self.value.rank();
        if actual != rank {
            return Err(BoundaryError::rank(self.axis, self.side, rank, actual));
        }
        Ok(())
    }

    /// Condition for one tensor component of the field
    pub fn extract_component(&self, indices: &[usize]) -> Result<Self> {
        let value = self
            .value
            .extract_component(indices, self.grid.dim(), &Self::help())
            .map_err(|e| locate(e, self.axis, self.side))?;
        Ok(Self {
            value,
            ..self.clone()
        })
    }

    /// Setter writing the ghost layer governed by this condition
    pub fn make_ghost_cell_setter(&self) -> SideGhostSetter {
        let dx = self.grid.discretization()[self.axis];
        let (scale, f1, f2) = self.kind.coefficients(dx);
        let rule = match self.value.offset_field(self.grid.as_ref(), self.axis, scale) {
            Some(offset) => GhostRule::Linear { f1, f2, offset },
            None => {
                let (coords, points) = self.boundary_points();
                let BoundaryValue::Expression(func) = &self.value else {
                    unreachable!("only expressions lack stored data")
                };
                GhostRule::Expression {
                    func: func.clone(),
                    scale,
                    f1,
                    f2,
                    coords,
                    points,
                }
            }
        };
        SideGhostSetter::new(self.grid.num_axes(), self.axis, self.side, rule)
    }

    /// Set the ghost layer of this condition in `data_full`
    pub fn set_ghost_cells(
        &self,
        data_full: &mut ArrayViewMutD<'_, f64>,
        args: Option<&SetterArgs>,
    ) {
        self.make_ghost_cell_setter().apply(data_full, args);
    }

    /// Coordinates of all boundary points (flattened, `num_axes` per point)
    /// and the table mapping boundary positions to point numbers.
    fn boundary_points(&self) -> (Vec<f64>, ArrayD<usize>) {
        let grid: &dyn Grid = self.grid.as_ref();
        let num_axes = grid.num_axes();
        let boundary_shape = grid.boundary_shape(self.axis);
        let count: usize = boundary_shape.iter().product();

        let mut coords = Vec::with_capacity(count * num_axes);
        for index in ndarray::indices(IxDyn(&boundary_shape)) {
            let mut others = index.slice().iter();
            for axis in 0..num_axes {
                if axis == self.axis {
                    coords.push(grid.boundary_coordinate(axis, self.side));
                } else {
                    let i = others.next().copied().unwrap_or(0);
                    coords.push(grid.cell_coordinate(axis, i));
                }
            }
        }
        let points = ArrayD::from_shape_fn(IxDyn(&boundary_shape), {
            let shape = boundary_shape.clone();
            move |index| {
                index
                    .slice()
                    .iter()
                    .zip(&shape)
                    .fold(0, |acc, (&i, &n)| acc * n + i)
            }
        });
        (coords, points)
    }

    /// Feed the configuration into `state`
    pub fn hash_into<H: Hasher>(&self, state: &mut H) {
        self.axis.hash(state);
        self.side.hash(state);
        self.kind.name().hash(state);
        if let ConditionKind::Mixed { gamma } = self.kind {
            float_bits(gamma).hash(state);
        }
        self.value.hash_into(state);
    }

    /// Value that changes whenever the configuration changes
    pub fn cache_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash_into(&mut hasher);
        hasher.finish()
    }
}

/// Attach the location of a condition to a rank error
fn locate(err: BoundaryError, axis: usize, side: Side) -> BoundaryError {
    match err {
        BoundaryError::Rank {
            expected, actual, ..
        } => BoundaryError::rank(axis, side, expected, actual),
        other => other,
    }
}

impl PartialEq for BoundaryCondition {
    fn eq(&self, other: &Self) -> bool {
        same_grid(&self.grid, &other.grid)
            && self.axis == other.axis
            && self.side == other.side
            && self.kind == other.kind
            && self.value == other.value
    }
}

impl fmt::Debug for BoundaryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundaryCondition")
            .field("axis", &self.axis)
            .field("side", &self.side)
            .field("kind", &self.kind)
            .field("value", &self.value)
            .finish()
    }
}

impl fmt::Display for BoundaryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ConditionKind::Dirichlet => write!(f, "{{\"value\": {}}}", self.value),
            ConditionKind::Neumann => write!(f, "{{\"derivative\": {}}}", self.value),
            ConditionKind::Curvature => write!(f, "{{\"curvature\": {}}}", self.value),
            ConditionKind::Mixed { gamma } => {
                write!(f, "{{\"mixed\": {gamma}, \"const\": {}}}", self.value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CartesianGrid;
    use approx::assert_relative_eq;
    use ndarray::{Array1, arr1};

    fn line(n: usize) -> GridRef {
        CartesianGrid::new(vec![(0.0, 1.0)], vec![n], vec![false])
            .unwrap()
            .into_shared()
    }

    fn ghosts(bc: &BoundaryCondition, interior: &[f64]) -> Array1<f64> {
        let mut full = Array1::zeros(interior.len() + 2);
        full.slice_mut(ndarray::s![1..-1]).assign(&arr1(interior));
        let mut view = full.view_mut().into_dyn();
        bc.set_ghost_cells(&mut view, None);
        full
    }

    fn build(
        grid: &GridRef,
        side: Side,
        data: impl Into<BoundaryData>,
        rank: usize,
    ) -> Result<BoundaryCondition> {
        BoundaryCondition::from_data(grid, 0, side, &data.into(), rank)
    }

    #[test]
    fn test_keyword_conditions() {
        let grid = line(4);
        let bc = build(&grid, Side::Low, "dirichlet", 0).unwrap();
        assert_eq!(bc.kind(), ConditionKind::Dirichlet);
        assert!(bc.value().is_zero());
        assert_eq!(bc.to_string(), r#"{"value": 0}"#);

        let bc = build(&grid, Side::High, "derivative", 1).unwrap();
        assert_eq!(bc.kind(), ConditionKind::Neumann);
        assert_eq!(bc.value().rank(), 1);

        let err = build(&grid, Side::Low, "periodic", 0).unwrap_err();
        assert!(err.is_bc_data_error());
        let err = build(&grid, Side::Low, "wall", 0).unwrap_err();
        assert!(err.to_string().contains("Unknown boundary condition `wall`"));
    }

    #[test]
    fn test_mapping_conditions() {
        let grid = line(4);
        let bc = build(&grid, Side::Low, ConditionData::derivative(2.0), 0).unwrap();
        assert_eq!(bc.kind(), ConditionKind::Neumann);
        assert_eq!(bc.value(), &BoundaryValue::scalar(2.0));

        let typed = ConditionData::typed("mixed", Some(3.0.into()));
        let typed = ConditionData {
            constant: Some(1.0.into()),
            ..typed
        };
        let bc = build(&grid, Side::Low, typed, 0).unwrap();
        assert_eq!(bc.kind(), ConditionKind::Mixed { gamma: 3.0 });
        assert_eq!(bc.value(), &BoundaryValue::scalar(1.0));

        let both = ConditionData {
            derivative: Some(1.0.into()),
            ..ConditionData::value(1.0)
        };
        let err = build(&grid, Side::Low, both, 0).unwrap_err();
        assert!(err.to_string().contains("mixes several kinds"));

        let empty = BoundaryData::Condition(ConditionData::default());
        assert!(build(&grid, Side::Low, empty, 0).is_err());

        let stray = ConditionData {
            constant: Some(1.0.into()),
            ..ConditionData::value(1.0)
        };
        assert!(build(&grid, Side::Low, stray, 0).is_err());
    }

    #[test]
    fn test_curvature_needs_two_cells() {
        let err = build(&line(1), Side::Low, "curvature", 0).unwrap_err();
        assert!(err.is_bc_data_error());
        assert!(build(&line(2), Side::Low, "curvature", 0).is_ok());
    }

    #[test]
    fn test_ghost_values() {
        let grid = line(4);
        let interior = [1.0, 2.0, 4.0, 8.0];

        let dirichlet = build(&grid, Side::Low, ConditionData::value(3.0), 0).unwrap();
        assert_relative_eq!(ghosts(&dirichlet, &interior)[0], 5.0);

        let neumann = build(&grid, Side::High, ConditionData::derivative(2.0), 0).unwrap();
        assert_relative_eq!(ghosts(&neumann, &interior)[5], 8.5);

        let curvature = build(&grid, Side::High, ConditionData::curvature(16.0), 0).unwrap();
        // 2 * 8 - 4 + 0.25^2 * 16
        assert_relative_eq!(ghosts(&curvature, &interior)[5], 13.0);

        let mixed = build(&grid, Side::Low, ConditionData::mixed(2.0, 1.0), 0).unwrap();
        let ghost = ghosts(&mixed, &interior)[0];
        // boundary value and outward derivative satisfy the Robin relation
        let boundary = (ghost + interior[0]) / 2.0;
        let derivative = (ghost - interior[0]) / 0.25;
        assert_relative_eq!(derivative + 2.0 * boundary, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_expression_uses_time() {
        let grid = line(4);
        let kind = ConditionKind::Dirichlet;
        let bc = BoundaryCondition::with_expression(grid, 0, Side::High, kind, |x, t| x[0] + t)
            .unwrap();
        assert!(bc.value().is_time_dependent());

        let mut full = Array1::zeros(6);
        let mut view = full.view_mut().into_dyn();
        bc.set_ghost_cells(&mut view, Some(&SetterArgs { t: 2.0 }));
        assert_relative_eq!(full[5], 6.0);
    }

    #[test]
    fn test_check_rank_and_extract() {
        let grid = CartesianGrid::unit(vec![3, 3], vec![false, false]).unwrap().into_shared();
        let data = ConditionData::value(vec![1.0, 2.0]);
        let bc = BoundaryCondition::from_data(&grid, 1, Side::High, &data.into(), 1).unwrap();
        assert!(bc.check_value_rank(1).is_ok());

        let err = bc.check_value_rank(0).unwrap_err();
        assert_eq!(err, BoundaryError::rank(1, Side::High, 0, 1));

        let y = bc.extract_component(&[1]).unwrap();
        assert_eq!(y.value(), &BoundaryValue::scalar(2.0));
        assert_eq!(y.axis(), 1);

        let err = y.extract_component(&[0]).unwrap_err();
        assert_eq!(err.axis(), Some(1));
    }

    #[test]
    fn test_clone_equality_and_hash() {
        let grid = line(4);
        let bc = build(&grid, Side::Low, ConditionData::value(1.0), 0).unwrap();
        let copy = bc.clone();
        assert_eq!(bc, copy);
        assert_eq!(bc.cache_hash(), copy.cache_hash());

        let other = build(&grid, Side::High, ConditionData::value(1.0), 0).unwrap();
        assert_ne!(bc, other);
        assert_ne!(bc.cache_hash(), other.cache_hash());

        let elsewhere = build(&line(4), Side::Low, ConditionData::value(1.0), 0).unwrap();
        assert_ne!(bc, elsewhere);
    }

    #[test]
    fn test_value_must_fit_grid() {
        let grid = CartesianGrid::unit(vec![4, 3], vec![false, false])
            .unwrap()
            .into_shared();
        let make = |side, value| {
            BoundaryCondition::new(grid.clone(), 0, side, ConditionKind::Dirichlet, value)
        };

        // one tensor component on a two-dimensional grid
        let uniform = BoundaryValue::Uniform(arr1(&[1.0]).into_dyn());
        assert!(make(Side::Low, uniform).unwrap_err().is_bc_data_error());

        // the boundary of axis 0 has 3 points
        let data = arr1(&[1.0, 2.0, 3.0, 4.0]).into_dyn();
        let varying = BoundaryValue::Varying { rank: 0, data };
        assert!(make(Side::High, varying).unwrap_err().is_bc_data_error());

        // varying data without the boundary axes
        let data = ArrayD::zeros(IxDyn(&[2]));
        let varying = BoundaryValue::Varying { rank: 1, data };
        assert!(make(Side::Low, varying).unwrap_err().is_bc_data_error());

        let data = ArrayD::zeros(IxDyn(&[2, 3]));
        let bc = make(Side::Low, BoundaryValue::Varying { rank: 1, data }).unwrap();
        let mut full = ArrayD::zeros(IxDyn(&grid.full_shape(1)));
        bc.set_ghost_cells(&mut full.view_mut(), None);
        assert!(full.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_signed_zero_hashes_like_zero() {
        let grid = line(4);
        let make = |v: f64| {
            let kind = ConditionKind::Mixed { gamma: v };
            BoundaryCondition::new(grid.clone(), 0, Side::Low, kind, BoundaryValue::scalar(v))
                .unwrap()
        };
        assert_eq!(make(0.0), make(-0.0));
        assert_eq!(make(0.0).cache_hash(), make(-0.0).cache_hash());
    }
}
