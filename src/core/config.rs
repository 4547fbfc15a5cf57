//! Workflow configuration from YAML

use crate::core::{MatrixAxis, Workflow};
use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Shape a version identifier on the matrix axis must have
const VERSION_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9._-]*$";

/// Placeholder syntax in command and env templates
const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}";

/// Starter workflow written by `whisker init`: install the package, smoke
/// check its version command, then lint, packaging-check and test across
/// two interpreter versions.
pub const STARTER_WORKFLOW: &str = r#"name: "Package CI"
on: push

matrix:
  python: ["3.6", "3.7"]

variables:
  package: "mypkg"

provision:
  interpreter: "python{{ matrix.python }}"
  venv: true

steps:
  - id: "install"
    name: "Install package"
    run: "pip install ."

  - id: "smoke"
    name: "Version check"
    run: "{{ package }} --version"

  - id: "tools"
    name: "Install lint and test tooling"
    run: "pip install flake8 pytest"

  - id: "lint"
    name: "Style check"
    run: "flake8 --max-line-length 88 --ignore E203,E501"

  - id: "package-check"
    name: "Packaging self-check"
    run: "python setup.py check -m -s"

  - id: "test"
    name: "Test suite"
    run: "pytest"
"#;

/// Event that starts a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    /// A push to the source repository
    Push,
}

/// Top-level workflow configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Workflow name
    pub name: String,

    /// Event that triggers this workflow
    #[serde(rename = "on")]
    pub trigger: Trigger,

    /// The matrix: one axis name mapped to its ordered version values
    pub matrix: HashMap<String, Vec<String>>,

    /// Variables substituted into step commands and env values
    #[serde(default)]
    pub variables: HashMap<String, String>,

    /// Environment exported to every step of every job
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Per-version environment provisioning
    #[serde(default)]
    pub provision: Option<ProvisionConfig>,

    /// Ordered step sequence
    pub steps: Vec<StepConfig>,

    /// Default timeout for steps (in seconds)
    #[serde(default)]
    pub default_timeout_secs: Option<u64>,
}

/// Per-version environment provisioning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// Interpreter template, e.g. `python{{ matrix.python }}`
    pub interpreter: String,

    /// Create a virtualenv and prepend its bin directory to PATH
    #[serde(default = "default_venv")]
    pub venv: bool,
}

fn default_venv() -> bool {
    true
}

/// Step configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Unique step identifier
    pub id: String,

    /// Human-readable step name
    pub name: String,

    /// Shell command to run
    pub run: String,

    /// Environment for this step only (overrides workflow env)
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Timeout for this step (overrides workflow default)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl WorkflowConfig {
    /// Load workflow configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse workflow configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: WorkflowConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the workflow configuration
    pub fn validate(&self) -> Result<()> {
        // Exactly one matrix axis with at least one value
        if self.matrix.len() != 1 {
            anyhow::bail!(
                "Workflow must declare exactly one matrix axis, found {}",
                self.matrix.len()
            );
        }

        let version_re = Regex::new(VERSION_PATTERN).expect("version pattern compiles");
        let (axis_name, values) = self
            .matrix
            .iter()
            .next()
            .map(|(name, values)| (name.clone(), values.clone()))
            .unwrap_or_default();

        if values.is_empty() {
            anyhow::bail!("Matrix axis '{}' has no values", axis_name);
        }

        let mut seen_values = HashSet::new();
        for value in &values {
            if !version_re.is_match(value) {
                anyhow::bail!(
                    "Matrix axis '{}' has a malformed value: '{}'",
                    axis_name,
                    value
                );
            }
            if !seen_values.insert(value) {
                anyhow::bail!("Duplicate matrix value: {}", value);
            }
        }

        // Step ids are unique and every step has a command
        if self.steps.is_empty() {
            anyhow::bail!("Workflow has no steps");
        }

        let mut seen_ids = HashSet::new();
        for step in &self.steps {
            if !seen_ids.insert(&step.id) {
                anyhow::bail!("Duplicate step ID: {}", step.id);
            }
            if step.run.trim().is_empty() {
                anyhow::bail!("Step '{}' has an empty run command", step.id);
            }
        }

        // Every template placeholder must resolve to a known variable
        let mut known: HashSet<String> = self.variables.keys().cloned().collect();
        known.insert(format!("matrix.{}", axis_name));

        let placeholder_re = Regex::new(PLACEHOLDER_PATTERN).expect("placeholder pattern compiles");
        let check = |owner: &str, template: &str| -> Result<()> {
            for capture in placeholder_re.captures_iter(template) {
                let name = &capture[1];
                if !known.contains(name) {
                    anyhow::bail!(
                        "{} references unknown variable '{{{{ {} }}}}'",
                        owner,
                        name
                    );
                }
            }
            Ok(())
        };

        for step in &self.steps {
            check(&format!("Step '{}'", step.id), &step.run)?;
            for value in step.env.values() {
                check(&format!("Step '{}' env", step.id), value)?;
            }
        }
        for value in self.env.values() {
            check("Workflow env", value)?;
        }
        if let Some(provision) = &self.provision {
            check("Provision interpreter", &provision.interpreter)?;
        }

        Ok(())
    }

    /// The single configured matrix axis
    pub fn axis(&self) -> MatrixAxis {
        self.matrix
            .iter()
            .next()
            .map(|(name, values)| MatrixAxis::new(name.clone(), values.clone()))
            .unwrap_or_else(|| MatrixAxis::new("", Vec::new()))
    }

    /// Convert config to a Workflow domain model
    pub fn to_workflow(&self) -> Workflow {
        Workflow::from_config(self)
    }
}
