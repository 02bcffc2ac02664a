//! Shared CLI argument types

mod common;
mod global;

pub use common::{LogFormat, LogLevel, OutputFormat};
pub use global::GlobalOptions;
