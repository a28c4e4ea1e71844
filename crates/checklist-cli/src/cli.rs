//! CLI argument definitions for the checklist importer.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "checklist",
    version,
    about = "Import ACEF taxonomic checklists into a staging store",
    long_about = "Import taxonomic checklists in the Annual Checklist Exchange Format.\n\n\
                  Discovers the data files of a source folder, stages names, usages and\n\
                  references, and resolves parent, synonym and reference relations."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
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
    /// Import a source folder and print the import summary.
    Import(ImportArgs),

    /// List the data files discovered in a source folder.
    Schema(SchemaArgs),
}

/// Reader flags shared by all commands.
#[derive(Args, Clone)]
pub struct ReaderArgs {
    /// Path to the source folder.
    #[arg(value_name = "FOLDER")]
    pub folder: PathBuf,

    /// Term prefix header names are resolved against first.
    #[arg(long = "prefix", value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Share of unknown header columns that triggers a warning.
    #[arg(long = "unknown-ratio", value_name = "RATIO")]
    pub unknown_ratio: Option<f64>,
}

#[derive(Parser)]
pub struct ImportArgs {
    #[command(flatten)]
    pub reader: ReaderArgs,

    /// Keep the staging store in this directory (default: in memory).
    #[arg(long = "store-dir", value_name = "DIR")]
    pub store_dir: Option<PathBuf>,

    /// Nodes processed per batch during relation resolution.
    #[arg(long = "batch-size", value_name = "N")]
    pub batch_size: Option<usize>,

    /// Nomenclatural code of all names, e.g. botanical or zoological.
    #[arg(long = "code", value_name = "CODE")]
    pub code: Option<String>,

    /// Print the summary as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct SchemaArgs {
    #[command(flatten)]
    pub reader: ReaderArgs,
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
