//! Error types for boundary condition construction and validation.
//!
//! All errors are raised while a boundary set is being configured. An
//! already validated [`BoundarySet`](crate::BoundarySet) never produces one
//! of these during ghost-cell updates.

use crate::local::Side;
use thiserror::Error;

/// Errors that can occur while building or validating boundary conditions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundaryError {
    /// The boundary specification has an unsupported shape or count.
    #[error("{message}. {help}")]
    BcData {
        /// What was wrong with the data
        message: String,
        /// Generated description of the accepted formats
        help: String,
    },

    /// The periodicity of the boundaries contradicts the grid.
    #[error("periodicity mismatch on axis {axis}: {message}")]
    Periodicity {
        /// Axis on which the mismatch was found
        axis: usize,
        /// Details of the mismatch
        message: String,
    },

    /// The value data of a boundary has the wrong tensor rank.
    #[error("{}", rank_message(.axis, .side, *.expected, *.actual))]
    Rank {
        /// Axis of the offending boundary, if known
        axis: Option<usize>,
        /// Side of the offending boundary, if known
        side: Option<Side>,
        /// Rank required by the field
        expected: usize,
        /// Rank found in the value data
        actual: usize,
    },
}

/// A specialized `Result` type for boundary operations.
pub type Result<T> = std::result::Result<T, BoundaryError>;

fn rank_message(
    axis: &Option<usize>,
    side: &Option<Side>,
    expected: usize,
    actual: usize,
) -> String {
    let location = match (axis, side) {
        (Some(axis), Some(side)) => format!(" at the {side} side of axis {axis}"),
        (Some(axis), None) => format!(" on axis {axis}"),
        _ => String::new(),
    };
    format!("boundary value{location} has rank {actual}, but rank {expected} is required")
}

impl BoundaryError {
    /// Create a data error carrying the given help text.
    pub fn bc_data(message: impl Into<String>, help: impl Into<String>) -> Self {
        BoundaryError::BcData {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a periodicity error for `axis`.
    pub fn periodicity(axis: usize, message: impl Into<String>) -> Self {
        BoundaryError::Periodicity {
            axis,
            message: message.into(),
        }
    }

    /// Create a rank error for one side of an axis.
    pub fn rank(axis: usize, side: Side, expected: usize, actual: usize) -> Self {
        BoundaryError::Rank {
            axis: Some(axis),
            side: Some(side),
            expected,
            actual,
        }
    }

    /// Returns `true` if the specification itself was malformed.
    pub fn is_bc_data_error(&self) -> bool {
        matches!(self, BoundaryError::BcData { .. })
    }

    /// Returns `true` if this is a periodicity mismatch.
    pub fn is_periodicity_error(&self) -> bool {
        matches!(self, BoundaryError::Periodicity { .. })
    }

    /// Returns `true` if this is a tensor rank mismatch.
    pub fn is_rank_error(&self) -> bool {
        matches!(self, BoundaryError::Rank { .. })
    }

    /// Axis the error refers to, if any.
    pub fn axis(&self) -> Option<usize> {
        match self {
            BoundaryError::BcData { .. } => None,
            BoundaryError::Periodicity { axis, .. } => Some(*axis),
            BoundaryError::Rank { axis, .. } => *axis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BoundaryError::periodicity(1, "grid is periodic");
        assert_eq!(
            err.to_string(),
            "periodicity mismatch on axis 1: grid is periodic"
        );

        let err = BoundaryError::rank(0, Side::High, 1, 0);
        assert_eq!(
            err.to_string(),
            "boundary value at the high side of axis 0 has rank 0, but rank 1 is required"
        );
    }

    #[test]
    fn test_bc_data_includes_help() {
        let err = BoundaryError::bc_data("Unsupported boundary format", "Use a list.");
        assert_eq!(err.to_string(), "Unsupported boundary format. Use a list.");
        assert!(err.axis().is_none());
    }

    #[test]
    fn test_categories() {
        let data = BoundaryError::bc_data("x", "y");
        let periodic = BoundaryError::periodicity(2, "x");
        let rank = BoundaryError::rank(0, Side::Low, 0, 1);

        assert!(data.is_bc_data_error());
        assert!(!data.is_periodicity_error());
        assert!(periodic.is_periodicity_error());
        assert!(!periodic.is_bc_data_error());
        assert!(rank.is_rank_error());
        assert_eq!(periodic.axis(), Some(2));
        assert_eq!(rank.axis(), Some(0));
    }
}
