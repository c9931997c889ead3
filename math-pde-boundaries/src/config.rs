//! JSON configuration of boundary conditions
//!
//! ```json
//! {
//!   "rank": 0,
//!   "bc": [{"value": 1.0}, "periodic"]
//! }
//! ```

use crate::axes::BoundarySet;
use crate::data::BoundaryData;
use crate::error::BoundaryError;
use crate::grid::GridRef;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or applying a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Boundary(#[from] BoundaryError),
}

/// Boundary conditions of one field as stored in a configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryConfig {
    /// Tensor rank of the field
    #[serde(default)]
    pub rank: usize,
    /// Boundary specification
    #[serde(default = "default_bc")]
    pub bc: BoundaryData,
}

fn default_bc() -> BoundaryData {
    BoundaryData::from("auto_periodic_neumann")
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            rank: 0,
            bc: default_bc(),
        }
    }
}

impl BoundaryConfig {
    pub fn new(bc: impl Into<BoundaryData>, rank: usize) -> Self {
        Self {
            rank,
            bc: bc.into(),
        }
    }

    /// Parse a configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Save configuration to JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Build the boundary conditions for `grid`
    pub fn build(&self, grid: &GridRef) -> Result<BoundarySet, ConfigError> {
        Ok(BoundarySet::from_data(grid, self.bc.clone(), self.rank)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CartesianGrid;

    #[test]
    fn test_defaults() {
        let config = BoundaryConfig::from_json("{}").unwrap();
        assert_eq!(config, BoundaryConfig::default());

        let grid = CartesianGrid::unit(vec![4, 4], vec![true, false])
            .unwrap()
            .into_shared();
        let bcs = config.build(&grid).unwrap();
        assert!(bcs[0].periodic());
        assert!(!bcs[1].periodic());
    }

    #[test]
    fn test_vector_field_config() {
        let config = BoundaryConfig::from_json(
            r#"{"rank": 1, "bc": [{"value": [1.0, 0.0]}, {"derivative": [0, 0]}]}"#,
        )
        .unwrap();
        let grid = CartesianGrid::unit(vec![4, 4], vec![false, false])
            .unwrap()
            .into_shared();
        let bcs = config.build(&grid).unwrap();
        assert!(bcs.check_value_rank(1).is_ok());
    }

    #[test]
    fn test_build_reports_boundary_errors() {
        let config = BoundaryConfig::new("periodic", 0);
        let grid = CartesianGrid::unit(vec![4], vec![false]).unwrap().into_shared();
        match config.build(&grid) {
            Err(ConfigError::Boundary(err)) => assert!(err.is_periodicity_error()),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_file_round_trip() {
        let config = BoundaryConfig::new(vec!["dirichlet", "neumann"], 0);
        let path = std::env::temp_dir().join(format!(
            "math-pde-boundaries-config-{}.json",
            std::process::id()
        ));
        config.to_file(&path).unwrap();
        let loaded = BoundaryConfig::from_file(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);

        assert!(matches!(
            BoundaryConfig::from_file(&path),
            Err(ConfigError::Io(_))
        ));
        assert!(matches!(
            BoundaryConfig::from_json("{\"rank\": -1}"),
            Err(ConfigError::Json(_))
        ));
    }
}
