//! `validate`: check a data directory, optionally filling in users from
//! the directory behind their authentication provider

use std::path::Path;

use log::info;

use crate::cli::{CommandContext, GlobalOptions};
use crate::client::Catalog;
use crate::directory::AccessControlDirectory;
use crate::error::{Error, Result};
use crate::output;
use crate::reconcile::{ValidationReport, validate};
use crate::store;

pub async fn run(opts: &GlobalOptions, data_dir: &Path, retrieve_user_entries: bool) -> Result<()> {
    info!("Validating {}", data_dir.display());
    let mut ws = store::read_workspace(data_dir).map_err(Error::Validation)?;

    let report = if retrieve_user_entries {
        let ctx = CommandContext::new(opts)?;
        let client = ctx.client.as_ref();
        let catalog = Catalog::fetch(client).await?;
        let directory = AccessControlDirectory::new(client, &catalog);
        validate(&mut ws, Some(&directory), Some(&catalog)).await?
    } else {
        validate(&mut ws, None, None).await?
    };

    finish(report, opts)
}

fn finish(report: ValidationReport, opts: &GlobalOptions) -> Result<()> {
    output::print(&report, opts.format)?;
    if report.is_valid() {
        Ok(())
    } else {
        Err(Error::Other(format!(
            "{} problem(s) found in the data directory",
            report.problems.len()
        )))
    }
}
