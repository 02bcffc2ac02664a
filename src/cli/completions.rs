//! Shell completions for the cxmgmt CLI
//!
//! Static scripts come from `cxmgmt completion <shell>`. Dynamic completion
//! (`COMPLETE=<shell> cxmgmt`) additionally completes data directory paths.

use std::io;

use clap::CommandFactory;
use clap_complete::engine::{ArgValueCompleter, PathCompleter};
use clap_complete::Shell;

use crate::cli::Cli;

/// Completer for `--data-dir` arguments.
pub fn data_dir_completer() -> ArgValueCompleter {
    ArgValueCompleter::new(PathCompleter::dir())
}

/// Write a static completion script for `shell` to stdout.
pub fn generate(shell: Shell) {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut io::stdout());
}
