//! Rendering of plans, apply reports and validation reports
//!
//! Every printable result implements [`Formattable`]; `--format` picks the
//! rendering.

use crate::cli::OutputFormat;
use crate::error::Result;

pub mod formatters;
pub mod json;
pub mod report;
pub mod table;

pub use report::OperationList;

/// A result that can be rendered as pretty text, a table or JSON.
pub trait Formattable {
    fn format(&self, format: OutputFormat) -> Result<String>;
}

/// Render `data` and print it to stdout.
pub fn print<T: Formattable>(data: &T, format: OutputFormat) -> Result<()> {
    let output = data.format(format)?;
    println!("{}", output);
    Ok(())
}
