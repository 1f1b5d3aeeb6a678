//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    calc::CalcArgs, completions::CompletionsArgs, explain::ExplainArgs, init::InitArgs,
    list::ListArgs, new::NewArgs, validate::ValidateArgs,
};

#[derive(Parser)]
#[command(name = "yld")]
#[command(author, version, about = "Tessera Yield Toolkit")]
#[command(long_about = "Projects multi-year semiconductor die yield per production stage from plain-text YAML process data.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .yld/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Read every entity from a single YAML or JSON document instead of a project
    #[arg(long, short = 'd', global = true, env = "YLD_DOCUMENT", conflicts_with = "project")]
    pub document: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new yld project
    Init(InitArgs),

    /// Project a scenario: one row per (year, chip) with stage and total yields
    Calc(CalcArgs),

    /// Show the audit trail behind one (year, chip) row
    Explain(ExplainArgs),

    /// List entities of one kind, or the yield formula library
    List(ListArgs),

    /// Create a new entity file from a template
    New(NewArgs),

    /// Validate project files against schemas and check references
    Validate(ValidateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table for lists, YAML for single items
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Aligned columns (for terminals)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just keys, one per line
    Id,
}
