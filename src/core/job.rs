//! Job domain model - one matrix value bound to the step sequence

use crate::core::{JobState, Step};
use std::collections::HashMap;

/// One execution context bound to a single matrix value.
///
/// Created when the run starts, finalized when its steps complete or one
/// fails. Jobs never share mutable state with each other.
#[derive(Debug, Clone)]
pub struct Job {
    /// Position of this job's value on the axis (stable report ordering)
    pub index: usize,

    /// The matrix value this job is bound to
    pub value: String,

    /// Substitution variables visible to this job's steps
    pub variables: HashMap<String, String>,

    /// Environment exported to every step of this job
    pub env: HashMap<String, String>,

    /// Ordered step sequence
    pub steps: Vec<Step>,

    /// Runtime state
    pub state: JobState,
}

impl Job {
    pub fn new(
        index: usize,
        value: String,
        variables: HashMap<String, String>,
        env: HashMap<String, String>,
        steps: Vec<Step>,
    ) -> Self {
        Self {
            index,
            value,
            variables,
            env,
            steps,
            state: JobState::new(),
        }
    }
}
