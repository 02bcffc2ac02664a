//! Reconciliation of a data directory with the Access Control service
//!
//! `load` turns files and remote records into [`Tree`](crate::model::Tree)s,
//! `diff` compares them, `apply` executes the result, and `validate` checks
//! a data directory without touching the remote state.

use std::path::Path;

use log::info;

use crate::client::{AccessControlApi, Catalog};
use crate::error::Result;
use crate::model::Tree;

pub mod apply;
pub mod diff;
pub mod load;
pub mod validate;

pub use apply::{ApplyReport, Status, apply};
pub use diff::{Operation, diff};
pub use load::{load_actual, load_desired};
pub use validate::{ValidationReport, validate};

/// Everything `update` needs to apply a change set.
#[derive(Debug)]
pub struct Plan {
    pub operations: Vec<Operation>,
    pub actual: Tree,
    pub catalog: Catalog,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Load both sides and diff them.
///
/// The desired state is validated against the remote catalog, so an
/// unknown role or provider fails here, before anything is written.
pub async fn plan(root: &Path, client: &dyn AccessControlApi) -> Result<Plan> {
    let (actual, catalog) = load_actual(client).await?;
    let desired = load_desired(root, Some(&catalog))?;
    let operations = diff(&desired, &actual);
    info!("{} operation(s) needed", operations.len());
    Ok(Plan {
        operations,
        actual,
        catalog,
    })
}
