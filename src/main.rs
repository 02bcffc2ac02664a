//! cxmgmt - manage Access Control teams and users as code

use std::io::Write;

use clap::{CommandFactory, Parser};
use clap_complete::CompleteEnv;

mod cli;
mod client;
mod config;
mod directory;
mod error;
mod model;
mod output;
mod reconcile;
mod store;

use cli::{Cli, Commands, GlobalOptions, LogFormat};
use error::{Error, Result};

#[tokio::main]
async fn main() {
    CompleteEnv::with_factory(Cli::command).complete();

    let cli = Cli::parse();
    let opts = GlobalOptions::from_cli(&cli);
    init_logging(&opts);

    if let Err(err) = run(cli.command, &opts).await {
        report(&err);
        std::process::exit(1);
    }
}

fn init_logging(opts: &GlobalOptions) {
    let rust_log_set = std::env::var_os("RUST_LOG").is_some();
    let mut builder = env_logger::Builder::from_default_env();
    if let Some(level) = opts.log_filter(rust_log_set) {
        builder.filter_level(level);
    }
    match opts.log_format {
        LogFormat::Plain => {
            builder.format_timestamp(None).format_target(false);
        }
        LogFormat::Detailed => {
            builder.format(|buf, record| {
                writeln!(buf, "{}", LogFormat::detailed_line(buf.timestamp(), record))
            });
        }
    }
    builder.init();
}

fn report(err: &Error) {
    eprintln!("Error: {}", err);
    for problem in err.diagnostics() {
        eprintln!("  • [{}] {}", problem.category(), problem);
    }
}

async fn run(command: Commands, opts: &GlobalOptions) -> Result<()> {
    match command {
        Commands::Extract { data_dir } => cli::extract::run(opts, &data_dir).await,
        Commands::Update {
            data_dir,
            dry_run,
            yes,
        } => cli::update::run(opts, &data_dir, dry_run, yes).await,
        Commands::Validate {
            data_dir,
            retrieve_user_entries,
        } => cli::validate::run(opts, &data_dir, retrieve_user_entries).await,
        Commands::Completion { shell } => {
            cli::completions::generate(shell);
            Ok(())
        }
    }
}
