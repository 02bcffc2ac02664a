//! Common CLI types shared across commands

use std::fmt;

use log::{LevelFilter, Record};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty format - colored, human-optimized
    #[default]
    Pretty,
    /// Table format - one row per operation or problem
    Table,
    /// JSON format - structured for scripts/APIs
    Json,
}

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Layout of log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Level and message
    #[default]
    Plain,
    /// Timestamp, level, module and message
    Detailed,
}

impl LogFormat {
    /// Render `record` in the detailed layout.
    pub fn detailed_line(timestamp: impl fmt::Display, record: &Record<'_>) -> String {
        format!(
            "{} | {} | {}: {}",
            timestamp,
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}
