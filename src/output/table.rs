//! Table output formatting

use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Rows},
};

/// Format rows as a rounded table with centered headers
pub fn format_table<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return "Nothing to show.".to_string();
    }

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    table.to_string()
}
