//! Boundary conditions for all axes of a grid
//!
//! [`BoundarySet`] bundles one [`BoundaryAxis`] per grid axis. It is the
//! entry point for solvers: [`BoundarySet::from_data`] normalizes the
//! user-facing specification, and [`BoundarySet::make_ghost_cell_setter`]
//! produces the routine called at every step.

use crate::axis::BoundaryAxis;
use crate::data::{AutoFamily, BoundaryData, BoundaryInput};
use crate::error::{BoundaryError, Result};
use crate::grid::{Grid, GridRef, same_grid};
use crate::setter::{GhostCellSetter, SetterArgs};
use ndarray::ArrayViewMutD;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Index;

/// Normalization rule: per-axis boundaries, or `None` if the rule does not apply
type NormalizationRule = fn(&GridRef, &BoundaryData, usize) -> Option<Result<Vec<BoundaryAxis>>>;

/// Rules tried in order by [`BoundarySet::from_data`]; the first match wins.
///
/// The per-axis rule precedes the `(low, high)` shorthand, so a two-entry
/// sequence on a two-axis grid always describes the two axes.
const NORMALIZATION_RULES: [(&str, NormalizationRule); 3] = [
    ("same for all axes", same_for_all_axes),
    ("one entry per axis", one_entry_per_axis),
    ("low/high pair of a single axis", low_high_pair),
];

fn same_for_all_axes(
    grid: &GridRef,
    data: &BoundaryData,
    rank: usize,
) -> Option<Result<Vec<BoundaryAxis>>> {
    match data {
        BoundaryData::Keyword(_) | BoundaryData::Condition(_) => Some(
            (0..grid.num_axes())
                .map(|axis| BoundaryAxis::from_data(grid, axis, data, rank))
                .collect(),
        ),
        BoundaryData::Sequence(_) => None,
    }
}

fn one_entry_per_axis(
    grid: &GridRef,
    data: &BoundaryData,
    rank: usize,
) -> Option<Result<Vec<BoundaryAxis>>> {
    match data {
        BoundaryData::Sequence(items) if items.len() == grid.num_axes() => Some(
            items
                .iter()
                .enumerate()
                .map(|(axis, item)| BoundaryAxis::from_data(grid, axis, item, rank))
                .collect(),
        ),
        _ => None,
    }
}

fn low_high_pair(
    grid: &GridRef,
    data: &BoundaryData,
    rank: usize,
) -> Option<Result<Vec<BoundaryAxis>>> {
    match data {
        BoundaryData::Sequence(items) if grid.num_axes() == 1 && items.len() == 2 => {
            Some(BoundaryAxis::from_data(grid, 0, data, rank).map(|axis| vec![axis]))
        }
        _ => None,
    }
}

/// Validated boundary conditions for every axis of a grid
///
/// The set is immutable once built. Clones share the grid handle and copy
/// all value data.
#[derive(Debug, Clone)]
pub struct BoundarySet {
    grid: GridRef,
    axes: Vec<BoundaryAxis>,
}

impl BoundarySet {
    /// Bundle per-axis boundaries, checking them against their grid.
    ///
    /// The axes must be non-empty, defined on the same grid, ordered like the
    /// grid axes and match the periodicity of the grid.
    pub fn new(axes: Vec<BoundaryAxis>) -> Result<Self> {
        let Some(first) = axes.first() else {
            return Err(BoundaryError::bc_data(
                "List of boundaries must not be empty",
                Self::help(),
            ));
        };
        let grid = first.grid().clone();

        if axes.len() != grid.num_axes() {
            return Err(BoundaryError::bc_data(
                format!(
                    "Need boundary conditions for {} axes, got {}",
                    grid.num_axes(),
                    axes.len()
                ),
                Self::help(),
            ));
        }

        for (axis, boundary) in axes.iter().enumerate() {
            if !same_grid(boundary.grid(), &grid) {
                return Err(BoundaryError::bc_data(
                    "Boundaries are not defined on the same grid",
                    Self::help(),
                ));
            }
            if boundary.axis() != axis {
                return Err(BoundaryError::bc_data(
                    "Boundaries need to be ordered like the respective axes",
                    Self::help(),
                ));
            }
            let grid_periodic = grid.periodic()[axis];
            if boundary.periodic() != grid_periodic {
                return Err(BoundaryError::periodicity(
                    axis,
                    format!(
                        "periodicity of the boundary conditions is not compatible with the grid \
                         ({} != {grid_periodic})",
                        boundary.periodic()
                    ),
                ));
            }
        }

        log::debug!("Built boundary conditions for {} axes", axes.len());
        Ok(Self { grid, axes })
    }

    /// Create the boundaries of `grid` for a field of tensor rank `rank`.
    ///
    /// An existing set is returned unchanged after checking its grid and rank.
    /// Raw data is either a specification used for every axis, one
    /// specification per axis, or a `(low, high)` pair on a one-axis grid.
    /// The keywords `natural`/`auto_periodic_neumann`, `auto_periodic_dirichlet`
    /// and `auto_periodic_curvature` select `periodic` on periodic axes and
    /// the respective vanishing condition elsewhere.
    pub fn from_data(
        grid: &GridRef,
        boundaries: impl Into<BoundaryInput>,
        rank: usize,
    ) -> Result<Self> {
        let data = match boundaries.into() {
            BoundaryInput::Set(set) => {
                if !same_grid(&set.grid, grid) {
                    return Err(BoundaryError::bc_data(
                        "Boundaries are defined on a different grid",
                        Self::help(),
                    ));
                }
                set.check_value_rank(rank)?;
                return Ok(set);
            }
            BoundaryInput::Data(data) => data,
        };

        let data = match data.as_keyword().and_then(AutoFamily::from_keyword) {
            Some(family) => {
                let expanded = BoundaryData::Sequence(family.expand(grid.periodic()));
                log::debug!("Expanded `{data}` to {expanded}");
                expanded
            }
            None => data,
        };

        for (name, rule) in NORMALIZATION_RULES {
            if let Some(axes) = rule(grid, &data, rank) {
                log::debug!("Boundary data `{data}` read as {name}");
                return Self::new(axes?);
            }
        }

        Err(BoundaryError::bc_data(
            format!("Unsupported boundary format: `{data}`"),
            Self::help(),
        ))
    }

    /// Accepted formats for the boundaries of a grid
    pub fn help() -> String {
        format!(
            "Boundary conditions for each axis are set using a list: [bc_x, bc_y, bc_z]. \
             If the associated axis is periodic, the boundary condition needs to be set \
             to 'periodic'. Otherwise, {}",
            BoundaryAxis::help()
        )
    }

    pub fn grid(&self) -> &GridRef {
        &self.grid
    }

    /// Boundaries of all axes, in axis order
    pub fn axes(&self) -> &[BoundaryAxis] {
        &self.axes
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    /// Always `false`: a validated set covers at least one axis
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BoundaryAxis> {
        self.axes.iter()
    }

    /// Periodicity of every axis, as defined by the grid
    pub fn periodic(&self) -> &[bool] {
        self.grid.periodic()
    }

    /// Fail with a rank error unless all values have tensor rank `rank`
    pub fn check_value_rank(&self, rank: usize) -> Result<()> {
        self.axes
            .iter()
            .try_for_each(|boundary| boundary.check_value_rank(rank))
    }

    /// Boundaries of one tensor component of the field
    ///
    /// One index selects a vector component, two a tensor component.
    pub fn extract_component(&self, indices: &[usize]) -> Result<Self> {
        let axes = self
            .axes
            .iter()
            .map(|boundary| boundary.extract_component(indices))
            .collect::<Result<Vec<_>>>()?;
        Self::new(axes)
    }

    /// Set the ghost cells of all axes in `data_full`, in axis order
    pub fn set_ghost_cells(
        &self,
        data_full: &mut ArrayViewMutD<'_, f64>,
        args: Option<&SetterArgs>,
    ) {
        for boundary in &self.axes {
            boundary.set_ghost_cells(data_full, args);
        }
    }

    /// Compose the setters of all axes into one routine
    pub fn make_ghost_cell_setter(&self) -> GhostCellSetter {
        let setters = self
            .axes
            .iter()
            .map(BoundaryAxis::make_ghost_cell_setter)
            .collect();
        log::debug!("Composed ghost cell setter for {} axes", self.axes.len());
        GhostCellSetter::new(self.grid.shape(), setters)
    }

    /// Value that changes whenever the configuration changes
    pub fn cache_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for boundary in &self.axes {
            boundary.cache_hash().hash(&mut hasher);
        }
        hasher.finish()
    }
}

impl PartialEq for BoundarySet {
    fn eq(&self, other: &Self) -> bool {
        same_grid(&self.grid, &other.grid) && self.axes == other.axes
    }
}

impl Index<usize> for BoundarySet {
    type Output = BoundaryAxis;

    fn index(&self, axis: usize) -> &BoundaryAxis {
        &self.axes[axis]
    }
}

impl<'a> IntoIterator for &'a BoundarySet {
    type Item = &'a BoundaryAxis;
    type IntoIter = std::slice::Iter<'a, BoundaryAxis>;

    fn into_iter(self) -> Self::IntoIter {
        self.axes.iter()
    }
}

impl fmt::Display for BoundarySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, boundary) in self.axes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{boundary}")?;
        }
        f.write_str("]")
    }
}
