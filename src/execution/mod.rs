//! Matrix run execution

pub mod engine;
pub mod job_runner;
pub mod provision;
pub mod report;

pub use engine::{EventHandler, ExecutionEvent, RunEngine};
pub use job_runner::JobRunner;
pub use provision::{JobEnv, ProvisionError, Provisioner};
pub use report::{JobReport, RunReport, StepReport};
