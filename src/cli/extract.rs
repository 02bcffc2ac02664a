//! `extract`: write the server's teams and users to a data directory

use std::path::Path;

use colored::Colorize;
use log::warn;
use serde::Serialize;

use crate::cli::{CommandContext, GlobalOptions, OutputFormat};
use crate::error::Result;
use crate::output::json::format_json;
use crate::reconcile::load_actual;
use crate::store;

#[derive(Debug, Serialize)]
struct ExtractSummary {
    data_dir: String,
    teams: usize,
    users: usize,
}

pub async fn run(opts: &GlobalOptions, data_dir: &Path) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let (actual, _) = load_actual(ctx.client.as_ref()).await?;
    if actual.is_empty() {
        warn!("Access Control returned no teams or users");
    }
    store::write_tree(data_dir, &actual)?;

    let summary = ExtractSummary {
        data_dir: data_dir.display().to_string(),
        teams: actual.team_count(),
        users: actual.user_count(),
    };
    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&summary)?),
        _ => eprintln!(
            "{} Extracted {} team(s) and {} user(s) to {}",
            "✓".green(),
            summary.teams,
            summary.users,
            summary.data_dir
        ),
    }
    Ok(())
}
