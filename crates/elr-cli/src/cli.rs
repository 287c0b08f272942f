//! CLI argument definitions for the ELR router.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "elr",
    version,
    about = "ELR router - Validate routing catalogs and route lab reports to receivers",
    long_about = "Validate a routing catalog and route electronic lab reports.\n\n\
                  A catalog is a TOML manifest of schemas, value sets, lookup tables,\n\
                  organizations and receivers. Reports are CSV files in a catalog schema."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

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
    /// Load and validate a catalog, then summarize it.
    Validate(ValidateArgs),

    /// Route a CSV report to the catalog's receivers.
    Route(RouteArgs),

    /// Show when a receiver's next batch goes out.
    NextBatch(NextBatchArgs),

    /// List the available filter functions.
    Filters,

    /// List the available mapper functions.
    Mappers,
}

#[derive(Parser)]
pub struct ValidateArgs {
    /// Catalog manifest (TOML).
    #[arg(long = "catalog", value_name = "PATH")]
    pub catalog: PathBuf,
}

#[derive(Parser)]
pub struct RouteArgs {
    /// Catalog manifest (TOML).
    #[arg(long = "catalog", value_name = "PATH")]
    pub catalog: PathBuf,

    /// CSV report whose header names schema elements.
    #[arg(long = "input", value_name = "CSV")]
    pub input: PathBuf,

    /// Schema the input report is written in.
    #[arg(long = "schema", value_name = "NAME")]
    pub schema: String,

    /// Route to this receiver only (`organization.receiver`).
    #[arg(long = "receiver", value_name = "FULLNAME")]
    pub receiver: Option<String>,

    /// Element default overrides, as `element=value` (repeatable).
    #[arg(long = "default", value_name = "ELEMENT=VALUE", value_parser = parse_default)]
    pub defaults: Vec<(String, String)>,

    /// Write each delivered report to `<DIR>/<receiver>.csv`.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Parser)]
pub struct NextBatchArgs {
    /// Catalog manifest (TOML).
    #[arg(long = "catalog", value_name = "PATH")]
    pub catalog: PathBuf,

    /// Receiver full name (`organization.receiver`).
    #[arg(long = "receiver", value_name = "FULLNAME")]
    pub receiver: String,

    /// Minimum number of seconds before the batch.
    #[arg(long = "min-secs", value_name = "N", default_value_t = 10)]
    pub min_secs: i64,
}

fn parse_default(text: &str) -> Result<(String, String), String> {
    let (element, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected ELEMENT=VALUE, got {text:?}"))?;
    let element = element.trim();
    if element.is_empty() {
        return Err(format!("missing element name in {text:?}"));
    }
    Ok((element.to_string(), value.to_string()))
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
