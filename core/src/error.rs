use thiserror::Error;

use crate::types::Dim;

pub type Result<T> = std::result::Result<T, NoiseError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NoiseError {
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: Dim, found: Dim },

    #[error("invalid range [{min}, {max}]")]
    InvalidRange { min: f64, max: f64 },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("graph validation failed with {} violation(s):{}", .0.len(), list_violations(.0))]
    GraphValidation(Vec<Violation>),
}

/// One problem found while assembling a graph. `node` is the index of the
/// offending node in the graph description, when there is one.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub node: Option<usize>,
    pub error: NoiseError,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.node {
            Some(idx) => write!(f, "node #{idx}: {}", self.error),
            None => write!(f, "graph: {}", self.error),
        }
    }
}

fn list_violations(violations: &[Violation]) -> String {
    violations.iter().map(|v| format!("\n  - {v}")).collect()
}

pub(crate) fn invalid(msg: impl Into<String>) -> NoiseError {
    NoiseError::InvalidParameter(msg.into())
}

// Children of one node must all agree with the node's own dimensionality
pub(crate) fn check_dim(expected: Dim, found: Dim) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(NoiseError::DimensionMismatch { expected, found })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_validation_lists_every_violation() {
        let err = NoiseError::GraphValidation(vec![
            Violation {
                node: Some(3),
                error: NoiseError::InvalidRange { min: 1.0, max: 1.0 },
            },
            Violation {
                node: None,
                error: NoiseError::DimensionMismatch {
                    expected: Dim::D3,
                    found: Dim::D2,
                },
            },
        ]);
        let text = err.to_string();
        assert!(text.contains("2 violation(s)"));
        assert!(text.contains("node #3: invalid range [1, 1]"));
        assert!(text.contains("graph: dimension mismatch: expected 3D, found 2D"));
    }
}
