//! Boundary conditions for finite-difference PDE grids
//!
//! This crate turns loosely written boundary specifications into validated,
//! per-axis boundary conditions and compiles them into ghost-cell setters
//! that a time-stepping loop calls before every evaluation of spatial
//! derivatives.
//!
//! # Features
//!
//! - **Flexible input**: keywords, mappings, `(low, high)` pairs and per-axis lists
//! - **Validation**: axis count, axis order, grid identity and periodicity
//! - **Tensor fields**: rank checks and component extraction
//! - **Ghost cells**: Dirichlet, Neumann, mixed, curvature and (anti-)periodic
//!   conditions with uniform, spatially varying or time-dependent values
//!
//! # Example
//!
//! ```
//! use math_pde_boundaries::{BoundarySet, CartesianGrid, Grid, SetterArgs};
//! use ndarray::ArrayD;
//!
//! let grid = CartesianGrid::unit(vec![8, 8], vec![false, true])
//!     .unwrap()
//!     .into_shared();
//! let bcs = BoundarySet::from_data(&grid, "auto_periodic_neumann", 0).unwrap();
//!
//! let setter = bcs.make_ghost_cell_setter();
//! let mut data = ArrayD::<f64>::zeros(grid.full_shape(0));
//! setter.apply(&mut data.view_mut(), Some(&SetterArgs { t: 0.0 }));
//! ```

pub mod axes;
pub mod axis;
pub mod config;
pub mod data;
pub mod error;
pub mod grid;
pub mod local;
pub mod setter;
pub mod value;

pub use axes::BoundarySet;
pub use axis::{BoundaryAxis, BoundaryPair, PeriodicAxis};
pub use config::{BoundaryConfig, ConfigError};
pub use data::{BoundaryData, BoundaryInput, ConditionData, ValueData};
pub use error::{BoundaryError, Result};
pub use grid::{CartesianGrid, Grid, GridError, GridRef, same_grid};
pub use local::{BoundaryCondition, ConditionKind, Side};
pub use setter::{AxisGhostSetter, GhostCellSetter, SetterArgs, SideGhostSetter};
pub use value::{BoundaryValue, ValueExpression};
