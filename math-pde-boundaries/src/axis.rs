//! Boundary conditions of a single axis
//!
//! A non-periodic axis carries a [`BoundaryPair`] with independent low and
//! high conditions. A periodic axis carries a single [`PeriodicAxis`] that
//! governs both ghost layers.

use crate::data::{AutoFamily, BoundaryData, PERIODIC, periodic_keyword};
use crate::error::{BoundaryError, Result};
use crate::grid::{Grid, GridRef, same_grid};
use crate::local::{BoundaryCondition, Side};
use crate::setter::{AxisGhostSetter, SetterArgs, SideGhostSetter};
use ndarray::ArrayViewMutD;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Periodic (or anti-periodic) boundary of one axis
#[derive(Clone)]
pub struct PeriodicAxis {
    grid: GridRef,
    axis: usize,
    flip_sign: bool,
}

impl PeriodicAxis {
    pub fn new(grid: GridRef, axis: usize, flip_sign: bool) -> Result<Self> {
        if axis >= grid.num_axes() {
            return Err(BoundaryError::bc_data(
                format!("Axis {axis} does not exist on a grid with {} axes", grid.num_axes()),
                BoundaryAxis::help(),
            ));
        }
        Ok(Self {
            grid,
            axis,
            flip_sign,
        })
    }

    /// Returns `true` if the ghost cells take the negated wrapped values
    pub fn flip_sign(&self) -> bool {
        self.flip_sign
    }

    fn make_ghost_cell_setter(&self) -> AxisGhostSetter {
        let sign = if self.flip_sign { -1.0 } else { 1.0 };
        let num_axes = self.grid.num_axes();
        AxisGhostSetter::new(
            SideGhostSetter::periodic(num_axes, self.axis, Side::Low, sign),
            SideGhostSetter::periodic(num_axes, self.axis, Side::High, sign),
        )
    }
}

impl PartialEq for PeriodicAxis {
    fn eq(&self, other: &Self) -> bool {
        same_grid(&self.grid, &other.grid)
            && self.axis == other.axis
            && self.flip_sign == other.flip_sign
    }
}

impl fmt::Debug for PeriodicAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodicAxis")
            .field("axis", &self.axis)
            .field("flip_sign", &self.flip_sign)
            .finish()
    }
}

impl fmt::Display for PeriodicAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.flip_sign {
            f.write_str("\"anti-periodic\"")
        } else {
            f.write_str("\"periodic\"")
        }
    }
}

/// Independent conditions on the low and high side of a non-periodic axis
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPair {
    low: BoundaryCondition,
    high: BoundaryCondition,
}

impl BoundaryPair {
    /// Couple two conditions; both must belong to the same axis of the same grid.
    pub fn new(low: BoundaryCondition, high: BoundaryCondition) -> Result<Self> {
        if !same_grid(low.grid(), high.grid()) {
            return Err(BoundaryError::bc_data(
                "Low and high boundary are not defined on the same grid",
                BoundaryAxis::help(),
            ));
        }
        if low.axis() != high.axis() {
            return Err(BoundaryError::bc_data(
                format!(
                    "Low and high boundary refer to different axes ({} and {})",
                    low.axis(),
                    high.axis()
                ),
                BoundaryAxis::help(),
            ));
        }
        if low.side() != Side::Low || high.side() != Side::High {
            return Err(BoundaryError::bc_data(
                "Boundary pair needs a low and a high condition, in this order",
                BoundaryAxis::help(),
            ));
        }
        Ok(Self { low, high })
    }

    /// Create the pair from data: one condition for both sides or `[low, high]`
    pub fn from_data(
        grid: &GridRef,
        axis: usize,
        data: &BoundaryData,
        rank: usize,
    ) -> Result<Self> {
        let (low, high) = match data {
            BoundaryData::Sequence(items) => match items.as_slice() {
                [low, high] => (low, high),
                _ => {
                    return Err(BoundaryError::bc_data(
                        format!(
                            "Expected a pair [low, high] for axis {axis}, got {} entries",
                            items.len()
                        ),
                        BoundaryAxis::help(),
                    ));
                }
            },
            _ => (data, data),
        };
        Self::new(
            BoundaryCondition::from_data(grid, axis, Side::Low, low, rank)?,
            BoundaryCondition::from_data(grid, axis, Side::High, high, rank)?,
        )
    }

    pub fn low(&self) -> &BoundaryCondition {
        &self.low
    }

    pub fn high(&self) -> &BoundaryCondition {
        &self.high
    }

    /// Condition on `side`
    pub fn get(&self, side: Side) -> &BoundaryCondition {
        match side {
            Side::Low => &self.low,
            Side::High => &self.high,
        }
    }
}

impl fmt::Display for BoundaryPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.low.kind() == self.high.kind() && self.low.value() == self.high.value() {
            write!(f, "{}", self.low)
        } else {
            write!(f, "({}, {})", self.low, self.high)
        }
    }
}

/// Boundary conditions of one axis
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryAxis {
    Pair(BoundaryPair),
    Periodic(PeriodicAxis),
}

impl BoundaryAxis {
    /// Build the boundaries of `axis` from data.
    ///
    /// Periodic keywords are only accepted on periodic axes and vice versa;
    /// a mismatch is reported as a periodicity error. The `auto_periodic_*`
    /// keywords resolve against the periodicity of the axis.
    pub fn from_data(
        grid: &GridRef,
        axis: usize,
        data: &BoundaryData,
        rank: usize,
    ) -> Result<Self> {
        if axis >= grid.num_axes() {
            return Err(BoundaryError::bc_data(
                format!("Axis {axis} does not exist on a grid with {} axes", grid.num_axes()),
                Self::help(),
            ));
        }
        let periodic = grid.periodic()[axis];

        if let Some(family) = data.as_keyword().and_then(AutoFamily::from_keyword) {
            let keyword = if periodic { PERIODIC } else { family.keyword() };
            return Self::from_data(grid, axis, &BoundaryData::from(keyword), rank);
        }

        match (requested_periodicity(data), periodic) {
            (Some(flip_sign), true) => {
                PeriodicAxis::new(grid.clone(), axis, flip_sign).map(BoundaryAxis::Periodic)
            }
            (Some(_), false) => Err(BoundaryError::periodicity(
                axis,
                format!("axis {axis} of the grid is not periodic, but the condition `{data}` is"),
            )),
            (None, true) => Err(BoundaryError::periodicity(
                axis,
                format!(
                    "axis {axis} of the grid is periodic, so its condition must be `periodic`, \
                     not `{data}`"
                ),
            )),
            (None, false) => {
                BoundaryPair::from_data(grid, axis, data, rank).map(BoundaryAxis::Pair)
            }
        }
    }

    /// Accepted formats for the boundaries of one axis
    pub fn help() -> String {
        format!(
            "The boundary conditions for an axis are either a single condition used \
             for both sides or a pair [low, high]. {}",
            BoundaryCondition::help()
        )
    }

    pub fn grid(&self) -> &GridRef {
        match self {
            BoundaryAxis::Pair(pair) => pair.low.grid(),
            BoundaryAxis::Periodic(periodic) => &periodic.grid,
        }
    }

    pub fn axis(&self) -> usize {
        match self {
            BoundaryAxis::Pair(pair) => pair.low.axis(),
            BoundaryAxis::Periodic(periodic) => periodic.axis,
        }
    }

    /// Returns `true` for the shared periodic condition
    pub fn periodic(&self) -> bool {
        matches!(self, BoundaryAxis::Periodic(_))
    }

    /// The low/high pair, if the axis is not periodic
    pub fn as_pair(&self) -> Option<&BoundaryPair> {
        match self {
            BoundaryAxis::Pair(pair) => Some(pair),
            BoundaryAxis::Periodic(_) => None,
        }
    }

    /// Fail with a rank error unless both sides carry values of tensor rank `rank`
    pub fn check_value_rank(&self, rank: usize) -> Result<()> {
        match self {
            BoundaryAxis::Pair(pair) => {
                pair.low.check_value_rank(rank)?;
                pair.high.check_value_rank(rank)
            }
            BoundaryAxis::Periodic(_) => Ok(()),
        }
    }

    /// Boundaries for one tensor component of the field
    pub fn extract_component(&self, indices: &[usize]) -> Result<Self> {
        match self {
            BoundaryAxis::Pair(pair) => Ok(BoundaryAxis::Pair(BoundaryPair {
                low: pair.low.extract_component(indices)?,
                high: pair.high.extract_component(indices)?,
            })),
            BoundaryAxis::Periodic(periodic) => Ok(BoundaryAxis::Periodic(periodic.clone())),
        }
    }

    /// Setter writing both ghost layers of this axis
    pub fn make_ghost_cell_setter(&self) -> AxisGhostSetter {
        match self {
            BoundaryAxis::Pair(pair) => AxisGhostSetter::new(
                pair.low.make_ghost_cell_setter(),
                pair.high.make_ghost_cell_setter(),
            ),
            BoundaryAxis::Periodic(periodic) => periodic.make_ghost_cell_setter(),
        }
    }

    /// Set both ghost layers of this axis in `data_full`
    pub fn set_ghost_cells(
        &self,
        data_full: &mut ArrayViewMutD<'_, f64>,
        args: Option<&SetterArgs>,
    ) {
        self.make_ghost_cell_setter().apply(data_full, args);
    }

    /// Value that changes whenever the configuration changes
    pub fn cache_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        match self {
            BoundaryAxis::Pair(pair) => {
                0u8.hash(&mut hasher);
                pair.low.hash_into(&mut hasher);
                pair.high.hash_into(&mut hasher);
            }
            BoundaryAxis::Periodic(periodic) => {
                1u8.hash(&mut hasher);
                periodic.axis.hash(&mut hasher);
                periodic.flip_sign.hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}

/// Returns `Some(flip_sign)` if `data` asks for a periodic axis
fn requested_periodicity(data: &BoundaryData) -> Option<bool> {
    match data {
        BoundaryData::Keyword(keyword) => periodic_keyword(keyword),
        BoundaryData::Condition(condition) => condition.periodic(),
        BoundaryData::Sequence(items) => match items.as_slice() {
            [low, high] => {
                let low = requested_periodicity(low)?;
                (requested_periodicity(high)? == low).then_some(low)
            }
            _ => None,
        },
    }
}

impl fmt::Display for BoundaryAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryAxis::Pair(pair) => fmt::Display::fmt(pair, f),
            BoundaryAxis::Periodic(periodic) => fmt::Display::fmt(periodic, f),
        }
    }
}
