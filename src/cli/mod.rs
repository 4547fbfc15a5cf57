//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{HistoryCommand, InitCommand, ListCommand, RunCommand, ValidateCommand};

/// Matrix CI runner for push-triggered pipelines
#[derive(Debug, Parser, Clone)]
#[command(name = "whisker")]
#[command(author = "Whisker Contributors")]
#[command(version = "0.1.0")]
#[command(about = "A matrix CI runner for push-triggered pipelines", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a workflow's matrix
    Run(RunCommand),

    /// Validate a workflow configuration
    Validate(ValidateCommand),

    /// Write a starter workflow file
    Init(InitCommand),

    /// List workflows with recorded runs
    List(ListCommand),

    /// Show run history
    History(HistoryCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}

use std::ffi::OsString;
