//! Reusable formatting utilities for CLI output

use colored::{ColoredString, Colorize};

use crate::reconcile::{Operation, Status};

/// Marker shown before an operation: `+` adds, `~` changes, `-` removes.
pub fn operation_marker(operation: &Operation) -> ColoredString {
    match operation {
        Operation::CreateTeam { .. } | Operation::CreateUser { .. } => "+".green(),
        Operation::UpdateTeamMembership { roles: Some(_), .. } => "+".green(),
        Operation::UpdateTeam { .. } | Operation::UpdateUser { .. } => "~".yellow(),
        Operation::DeleteTeam { .. }
        | Operation::DeleteUser { .. }
        | Operation::UpdateTeamMembership { roles: None, .. } => "-".red(),
    }
}

pub fn status_marker(status: Status) -> ColoredString {
    match status {
        Status::Applied => "✓".green(),
        Status::Failed => "✗".red(),
        Status::Skipped => "○".dimmed(),
    }
}

/// Short label for a status, used in tables.
pub fn status_label(status: Status) -> &'static str {
    match status {
        Status::Applied => "applied",
        Status::Failed => "failed",
        Status::Skipped => "skipped",
    }
}

/// What an operation acts on: a team, a user, or a user within a team.
pub fn operation_target(operation: &Operation) -> String {
    match operation {
        Operation::UpdateTeamMembership { team, user, .. } => format!("{} in {}", user, team),
        other => match (other.team(), other.user_key()) {
            (Some(team), _) => team.to_string(),
            (None, Some(user)) => user.to_string(),
            (None, None) => String::new(),
        },
    }
}

/// Extra detail for an operation: changed attributes, roles, former name.
pub fn operation_detail(operation: &Operation) -> String {
    match operation {
        Operation::UpdateTeam { previous_name, .. } => format!("was {}", previous_name),
        Operation::UpdateUser { changes, .. } => changes.join(", "),
        Operation::UpdateTeamMembership {
            roles: Some(roles), ..
        } => roles.iter().cloned().collect::<Vec<_>>().join(", "),
        _ => String::new(),
    }
}

/// `1 team`, `2 teams`
pub fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{} {}", n, noun)
    } else {
        format!("{} {}s", n, noun)
    }
}
