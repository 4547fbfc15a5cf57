//! Step domain model

use crate::core::config::StepConfig;
use std::collections::HashMap;

/// A single command invocation within a job
#[derive(Debug, Clone)]
pub struct Step {
    /// Unique step identifier
    pub id: String,

    /// Human-readable step name
    pub name: String,

    /// Shell command template (`{{ matrix.<axis> }}` and workflow variables)
    pub command_template: String,

    /// Environment exported for this step only (values may use templates)
    pub env: HashMap<String, String>,

    /// Timeout in seconds; no timeout when None
    pub timeout_secs: Option<u64>,
}

/// Workflow-level defaults applied to steps that don't override them
#[derive(Debug, Clone, Default)]
pub struct StepDefaults {
    pub timeout_secs: Option<u64>,
}

impl Step {
    /// Create a step from a step config
    pub fn from_config(config: &StepConfig, defaults: &StepDefaults) -> Self {
        Step {
            id: config.id.clone(),
            name: config.name.clone(),
            command_template: config.run.clone(),
            env: config.env.clone(),
            timeout_secs: config.timeout_secs.or(defaults.timeout_secs),
        }
    }

    /// Render the command line with variable substitution
    pub fn render_command(&self, variables: &HashMap<String, String>) -> String {
        render_template(&self.command_template, variables)
    }

    /// Render this step's environment values with variable substitution
    pub fn render_env(&self, variables: &HashMap<String, String>) -> HashMap<String, String> {
        self.env
            .iter()
            .map(|(key, value)| (key.clone(), render_template(value, variables)))
            .collect()
    }
}

/// Replace `{{ name }}` placeholders with values from the variable map
pub fn render_template(template: &str, variables: &HashMap<String, String>) -> String {
    let mut rendered = template.to_string();

    for (key, value) in variables {
        let placeholder = format!("{{{{ {} }}}}", key);
        rendered = rendered.replace(&placeholder, value);
    }

    rendered
}
