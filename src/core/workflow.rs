//! Workflow domain model

use crate::core::{
    config::{ProvisionConfig, Trigger, WorkflowConfig},
    step::{Step, StepDefaults},
    Job, MatrixAxis,
};
use std::collections::HashMap;

/// A workflow definition: a trigger, a matrix axis, and an ordered step
/// sequence shared by every job the axis expands into.
#[derive(Debug, Clone)]
pub struct Workflow {
    /// Workflow name
    pub name: String,

    /// Event this workflow runs on
    pub trigger: Trigger,

    /// The matrix axis
    pub axis: MatrixAxis,

    /// Variables substituted into step commands
    pub variables: HashMap<String, String>,

    /// Environment exported to every step of every job
    pub env: HashMap<String, String>,

    /// Per-version environment provisioning
    pub provision: Option<ProvisionConfig>,

    /// Ordered step sequence
    pub steps: Vec<Step>,
}

impl Workflow {
    /// Create a workflow from configuration
    pub fn from_config(config: &WorkflowConfig) -> Self {
        let defaults = StepDefaults {
            timeout_secs: config.default_timeout_secs,
        };

        let steps = config
            .steps
            .iter()
            .map(|step_config| Step::from_config(step_config, &defaults))
            .collect();

        Workflow {
            name: config.name.clone(),
            trigger: config.trigger,
            axis: config.axis(),
            variables: config.variables.clone(),
            env: config.env.clone(),
            provision: config.provision.clone(),
            steps,
        }
    }

    /// Check whether this workflow runs on the given event
    pub fn handles(&self, event: Trigger) -> bool {
        self.trigger == event
    }

    /// Get a step by ID
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Expand the matrix axis into jobs, one per value, in axis order.
    ///
    /// Each job gets the workflow variables plus `matrix.<axis>` bound to
    /// its value, and the workflow env plus `MATRIX_<AXIS>` exported.
    pub fn expand_matrix(&self) -> Vec<Job> {
        self.axis
            .values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                let mut variables = self.variables.clone();
                variables.insert(self.axis.variable_key(), value.clone());

                let mut env = self.env.clone();
                env.insert(self.axis.env_key(), value.clone());

                Job::new(index, value.clone(), variables, env, self.steps.clone())
            })
            .collect()
    }
}
