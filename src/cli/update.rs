//! `update`: make the server match a data directory

use std::path::Path;

use colored::Colorize;
use dialoguer::Confirm;
use log::info;

use crate::cli::{CommandContext, GlobalOptions, OutputFormat};
use crate::error::Result;
use crate::output::{self, Formattable, OperationList};
use crate::reconcile::{self, Operation, apply};

/// Operations that remove something from the server.
fn destructive(operations: &[Operation]) -> usize {
    operations
        .iter()
        .filter(|op| {
            matches!(
                op,
                Operation::DeleteTeam { .. }
                    | Operation::DeleteUser { .. }
                    | Operation::UpdateTeamMembership { roles: None, .. }
            )
        })
        .count()
}

pub async fn run(opts: &GlobalOptions, data_dir: &Path, dry_run: bool, yes: bool) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let client = ctx.client.as_ref();

    info!("Planning update from {}", data_dir.display());
    let plan = reconcile::plan(data_dir, client).await?;

    if dry_run {
        if ctx.format != OutputFormat::Json {
            eprintln!("{}", "DRY RUN - no changes will be made".yellow());
            eprintln!();
        }
        return output::print(&OperationList(&plan.operations), ctx.format);
    }

    if plan.is_empty() {
        if ctx.format == OutputFormat::Json {
            return output::print(&OperationList(&plan.operations), ctx.format);
        }
        eprintln!("{} Access Control already matches {}", "✓".green(), data_dir.display());
        return Ok(());
    }

    // Confirmation prompt unless --yes
    if !yes {
        eprintln!("{}", OperationList(&plan.operations).format(OutputFormat::Pretty)?);
        let removals = destructive(&plan.operations);
        if removals > 0 {
            eprintln!();
            eprintln!(
                "{} {} of these operation(s) delete from the server",
                "⚠".yellow(),
                removals
            );
        }
        eprintln!();

        let confirm = Confirm::new()
            .with_prompt("Apply these changes?")
            .default(false)
            .interact()?;

        if !confirm {
            eprintln!("Cancelled.");
            return Ok(());
        }
    }

    let report = apply(plan.operations, client, &plan.catalog, &plan.actual).await;
    output::print(&report, ctx.format)?;
    report.into_result().map(|_| ())
}
