//! CLI command definitions and handlers

use std::path::PathBuf;

use clap::{Parser, Subcommand};
pub use clap_complete::Shell;

use completions::data_dir_completer;

pub mod args;
pub mod completions;
pub mod context;
pub mod extract;
pub mod update;
pub mod validate;

pub use args::{GlobalOptions, LogFormat, LogLevel, OutputFormat};
pub use context::CommandContext;

/// cxmgmt - manage Access Control teams and users as code
#[derive(Parser, Debug)]
#[command(name = "cxmgmt")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "CXMGMT_FORMAT",
        default_value = "pretty",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "CXMGMT_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Log level (error, warn, info, debug, trace) [default: info]
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        hide_possible_values = true
    )]
    pub log_level: Option<LogLevel>,

    /// Log line layout (plain, detailed)
    #[arg(
        long = "log-format",
        global = true,
        default_value = "plain",
        hide_possible_values = true
    )]
    pub log_format: LogFormat,

    /// Enable debug logging
    #[arg(long, global = true, env = "CXMGMT_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the teams and users on the server to a data directory
    Extract {
        /// Directory to write to
        #[arg(short = 'd', long = "data-dir", default_value = ".", add = data_dir_completer())]
        data_dir: PathBuf,
    },

    /// Make the server match a data directory
    Update {
        /// Directory to read from
        #[arg(short = 'd', long = "data-dir", default_value = ".", add = data_dir_completer())]
        data_dir: PathBuf,

        /// Print the planned operations without applying them
        #[arg(long)]
        dry_run: bool,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Check a data directory for problems
    Validate {
        /// Directory to read from
        #[arg(short = 'd', long = "data-dir", default_value = ".", add = data_dir_completer())]
        data_dir: PathBuf,

        /// Look up users missing from the users file in the directory
        /// behind their authentication provider and add them
        #[arg(short = 'r', long)]
        retrieve_user_entries: bool,
    },

    /// Generate shell completions
    #[command(after_help = "\
Static completions (subcommands/flags only):
  bash:   cxmgmt completion bash > /etc/bash_completion.d/cxmgmt
  zsh:    cxmgmt completion zsh > \"${fpath[1]}/_cxmgmt\"
  fish:   cxmgmt completion fish > ~/.config/fish/completions/cxmgmt.fish

Dynamic completions (includes data directory paths):
  bash:   echo 'source <(COMPLETE=bash cxmgmt)' >> ~/.bashrc
  zsh:    echo 'source <(COMPLETE=zsh cxmgmt)' >> ~/.zshrc
  fish:   echo 'COMPLETE=fish cxmgmt | source' >> ~/.config/fish/config.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
