//! CLI argument definitions for icdcheck.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};

#[derive(Parser)]
#[command(
    name = "icdcheck",
    version,
    about = "Validate tabular data files against an interface control document",
    long_about = "Validate delimited, fixed width, or spreadsheet data files against\n\
                  an interface control document (ICD): a tabular file declaring the\n\
                  data format, the typed fields, and cross row checks."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate data files against an ICD.
    Validate(ValidateArgs),

    /// List the registered field type and check type tags.
    Formats,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the ICD file (delimited text or spreadsheet).
    #[arg(value_name = "ICD")]
    pub icd: PathBuf,

    /// Data files to validate.
    #[arg(value_name = "DATA", required = true)]
    pub data: Vec<PathBuf>,

    /// Write a JSON run report to this path (single data file only).
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Write <data>.accepted.csv and <data>.rejected.csv next to each
    /// data file; rejected rows carry the reason as a trailing column.
    #[arg(long = "split")]
    pub split: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
