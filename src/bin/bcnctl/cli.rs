//! # Cli
//!
//! This module contains everything needed for parsing the CLI arguments for
//! bcnctl.

use clap::{Parser, ValueEnum};

/// Struct containing the CLI configuration for bcnctl.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// The path to the network description file.
    #[arg(index = 1)]
    pub file: std::path::PathBuf,

    /// How to solve the network.
    #[arg(value_enum, short, long, default_value_t = Mode::default())]
    pub mode: Mode,

    /// Horizon bound for the search. Defaults to the number of network
    /// states.
    #[arg(long)]
    pub t_max: Option<usize>,

    /// Specify the log level.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    pub verbosity: LogLevel,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }
}

/// Enum for choosing the solving strategy.
#[derive(ValueEnum, Clone, Copy, Default, Debug)]
pub enum Mode {
    /// Decompose the network into strongly connected blocks and stitch the
    /// per-block solutions together.
    #[default]
    Large,

    /// Search the full state space as a single block.
    Small,
}

/// Enum for specifying the log level of bcnctl.
#[derive(ValueEnum, Clone, Default, Debug)]
pub enum LogLevel {
    /// The default log level. Only critical errors will be logged.
    #[default]
    #[value(alias("0"))]
    Error,

    /// Also log warnings.
    #[value(alias("1"))]
    Warn,

    /// Also log information about the general progress of the search.
    #[value(alias("2"))]
    Info,

    /// Log everything which happens internally during the search.
    #[value(alias("3"))]
    Debug,

    /// Log extra information.
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}
