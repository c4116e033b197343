//! Error type shared by every operator in the crate.
//!
//! Validation happens eagerly, before any arithmetic: an operator either
//! rejects its inputs with a `FieldError` or runs to completion. Floating-point
//! anomalies in the data itself (NaN, Inf) are not errors and propagate through
//! the arithmetic unchanged.

use crate::core_types::Axis;

/// Failure modes of grid operators, geometry resolution and variable lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldError {
    /// Operands of an operator do not share the same shape
    ShapeMismatch {
        /// Operator that rejected the input
        operation: &'static str,
        /// Shape required by the first operand
        expected: String,
        /// Shape that was supplied
        found: String,
    },
    /// A flat buffer does not hold exactly `nx * ny * nz` samples
    LengthMismatch {
        /// Sample count implied by the shape
        expected: usize,
        /// Length of the supplied buffer
        found: usize,
    },
    /// Zero, non-finite or unresolvable spacing along an axis
    DegenerateSpacing {
        /// Axis with the bad spacing
        axis: Axis,
        /// Offending spacing value
        spacing: f32,
    },
    /// Axis too short for the stencil that must run along it
    InsufficientExtent {
        /// Axis being differenced
        axis: Axis,
        /// Number of samples along the axis
        length: usize,
        /// Minimum number of samples the stencil reads
        required: usize,
    },
    /// Sub-region bounds are inverted or fall outside the source grid
    InvalidExtent(String),
    /// Requested variable is not available at the timestep
    MissingVariable {
        /// Variable name
        name: String,
        /// Timestep that was queried
        timestep: usize,
    },
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldError::ShapeMismatch {
                operation,
                expected,
                found,
            } => write!(f, "{operation}: shape mismatch, expected {expected}, found {found}"),
            FieldError::LengthMismatch { expected, found } => {
                write!(f, "buffer holds {found} samples, shape requires {expected}")
            }
            FieldError::DegenerateSpacing { axis, spacing } => {
                write!(f, "degenerate spacing {spacing} along axis {axis}")
            }
            FieldError::InsufficientExtent {
                axis,
                length,
                required,
            } => write!(
                f,
                "axis {axis} has {length} samples, stencil requires at least {required}"
            ),
            FieldError::InvalidExtent(msg) => write!(f, "invalid sub-region extent: {msg}"),
            FieldError::MissingVariable { name, timestep } => {
                write!(f, "variable '{name}' does not exist at timestep {timestep}")
            }
        }
    }
}

impl std::error::Error for FieldError {}

/// Convenience alias used throughout the crate.
pub type FieldResult<T> = Result<T, FieldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_axis_and_counts() {
        let err = FieldError::InsufficientExtent {
            axis: Axis::Z,
            length: 4,
            required: 7,
        };
        assert_eq!(
            err.to_string(),
            "axis z has 4 samples, stencil requires at least 7"
        );
    }

    #[test]
    fn test_missing_variable_message() {
        let err = FieldError::MissingVariable {
            name: "QICE".to_string(),
            timestep: 3,
        };
        assert!(err.to_string().contains("QICE"));
        assert!(err.to_string().contains('3'));
    }
}
