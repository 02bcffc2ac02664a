//! Global CLI options shared across all commands

use log::LevelFilter;

use crate::cli::{Cli, LogFormat, LogLevel, OutputFormat};

/// Global CLI options passed to all command handlers.
///
/// Captures the flag/env layer once in `main.rs`; config file values are
/// resolved later in `CommandContext`.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    /// Output format (pretty, table, json)
    pub format: OutputFormat,

    /// Custom config file path (defaults to ~/.cxmgmt/config.yaml)
    pub config: Option<String>,

    /// Explicit log level, if one was given
    pub log_level: Option<LogLevel>,

    /// Log line layout
    pub log_format: LogFormat,

    /// Force debug logging
    pub debug: bool,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            log_level: cli.log_level,
            log_format: cli.log_format,
            debug: cli.debug,
        }
    }

    /// Get config path as `Option<&str>`.
    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }

    /// Level to log at, or `None` to defer to `RUST_LOG`.
    ///
    /// `--debug` wins over `--log-level`. Without either flag and without
    /// `RUST_LOG`, logging defaults to `info`.
    pub fn log_filter(&self, rust_log_set: bool) -> Option<LevelFilter> {
        if self.debug {
            return Some(LevelFilter::Debug);
        }
        match self.log_level {
            Some(level) => Some(level.into()),
            None if rust_log_set => None,
            None => Some(LevelFilter::Info),
        }
    }
}
