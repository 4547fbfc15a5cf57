//! Matrix axis model

use serde::{Deserialize, Serialize};

/// A named, ordered sequence of version identifiers.
///
/// The axis is immutable once parsed and is consumed exactly once per run:
/// every value spawns one independent job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixAxis {
    /// Axis name as declared in the workflow (e.g. "python")
    pub name: String,

    /// Version values, in declaration order
    pub values: Vec<String>,
}

impl MatrixAxis {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Number of jobs this axis expands into
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Substitution key for step command templates (`{{ matrix.<axis> }}`)
    pub fn variable_key(&self) -> String {
        format!("matrix.{}", self.name)
    }

    /// Environment variable carrying the value into each step
    pub fn env_key(&self) -> String {
        format!(
            "MATRIX_{}",
            self.name.to_uppercase().replace(['-', '.'], "_")
        )
    }
}
