//! CLI argument definitions for the rowfeed importer.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "rowfeed",
    version,
    about = "rowfeed - schema-driven CSV import",
    long_about = "Import CSV files through a declarative column schema.\n\n\
                  Headers are matched flexibly against declared columns, rows are\n\
                  parsed and classified, and outcomes are reported per policy."
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
    /// Import a CSV file and report row outcomes.
    Import(ImportArgs),

    /// Show how schema columns resolve against a file's header row.
    Headers(HeadersArgs),
}

#[derive(Parser)]
pub struct ImportArgs {
    /// Path to the CSV file to import.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Path to the schema configuration (JSON).
    #[arg(long = "schema", value_name = "PATH")]
    pub schema: PathBuf,

    /// Print imported rows instead of just the summary counts.
    #[arg(long = "show-rows")]
    pub show_rows: bool,
}

#[derive(Parser)]
pub struct HeadersArgs {
    /// Path to the CSV file to inspect.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Path to the schema configuration (JSON).
    #[arg(long = "schema", value_name = "PATH")]
    pub schema: PathBuf,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
