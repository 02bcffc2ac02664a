//! Diff engine
//!
//! Compares a desired tree with an actual tree and produces the operations
//! that turn one into the other, already in the order they must be applied.

use std::collections::BTreeSet;
use std::fmt;

use log::debug;
use serde::Serialize;

use crate::model::{Tree, User, UserKey, depth};

/// Apply phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    DeleteUsers,
    RemoveMemberships,
    DeleteTeams,
    CreateTeams,
    CreateUsers,
    SetMemberships,
    UpdateTeams,
    UpdateUsers,
}

/// One change to the remote state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Operation {
    CreateTeam {
        full_name: String,
        name: String,
    },
    /// Change of a team's name that keeps its identity (case only).
    UpdateTeam {
        full_name: String,
        name: String,
        previous_name: String,
    },
    DeleteTeam {
        full_name: String,
    },
    CreateUser {
        user: User,
        /// Full names of the teams the user belongs to
        teams: Vec<String>,
    },
    UpdateUser {
        user: User,
        changes: Vec<&'static str>,
        teams: Vec<String>,
    },
    DeleteUser {
        user: User,
    },
    /// Add a membership or change its roles (`Some`), or remove it (`None`).
    UpdateTeamMembership {
        team: String,
        user: UserKey,
        roles: Option<BTreeSet<String>>,
    },
}

impl Operation {
    pub fn phase(&self) -> Phase {
        match self {
            Operation::DeleteUser { .. } => Phase::DeleteUsers,
            Operation::UpdateTeamMembership { roles: None, .. } => Phase::RemoveMemberships,
            Operation::DeleteTeam { .. } => Phase::DeleteTeams,
            Operation::CreateTeam { .. } => Phase::CreateTeams,
            Operation::CreateUser { .. } => Phase::CreateUsers,
            Operation::UpdateTeamMembership { roles: Some(_), .. } => Phase::SetMemberships,
            Operation::UpdateTeam { .. } => Phase::UpdateTeams,
            Operation::UpdateUser { .. } => Phase::UpdateUsers,
        }
    }

    /// Sort key placing parents before children on create and after them
    /// on delete.
    pub fn order_key(&self) -> (Phase, isize) {
        let within = match self {
            Operation::CreateTeam { full_name, .. } => depth(full_name) as isize,
            Operation::DeleteTeam { full_name } => -(depth(full_name) as isize),
            _ => 0,
        };
        (self.phase(), within)
    }

    /// Full name of the team the operation acts on, if any.
    pub fn team(&self) -> Option<&str> {
        match self {
            Operation::CreateTeam { full_name, .. }
            | Operation::UpdateTeam { full_name, .. }
            | Operation::DeleteTeam { full_name } => Some(full_name),
            Operation::UpdateTeamMembership { team, .. } => Some(team),
            _ => None,
        }
    }

    /// Identity of the user the operation acts on, if any.
    pub fn user_key(&self) -> Option<UserKey> {
        match self {
            Operation::CreateUser { user, .. }
            | Operation::UpdateUser { user, .. }
            | Operation::DeleteUser { user } => Some(user.key()),
            Operation::UpdateTeamMembership { user, .. } => Some(user.clone()),
            _ => None,
        }
    }

    /// Short verb for display.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::CreateTeam { .. } => "create team",
            Operation::UpdateTeam { .. } => "update team",
            Operation::DeleteTeam { .. } => "delete team",
            Operation::CreateUser { .. } => "create user",
            Operation::UpdateUser { .. } => "update user",
            Operation::DeleteUser { .. } => "delete user",
            Operation::UpdateTeamMembership { roles: Some(_), .. } => "set membership",
            Operation::UpdateTeamMembership { roles: None, .. } => "remove membership",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateTeam { full_name, .. } => write!(f, "Create team {}", full_name),
            Operation::UpdateTeam {
                full_name,
                previous_name,
                ..
            } => write!(f, "Rename team {} (was {})", full_name, previous_name),
            Operation::DeleteTeam { full_name } => write!(f, "Delete team {}", full_name),
            Operation::CreateUser { user, .. } => write!(f, "Create user {}", user.key()),
            Operation::UpdateUser { user, changes, .. } => {
                write!(f, "Update user {} ({})", user.key(), changes.join(", "))
            }
            Operation::DeleteUser { user } => write!(f, "Delete user {}", user.key()),
            Operation::UpdateTeamMembership {
                team,
                user,
                roles: Some(roles),
            } => {
                if roles.is_empty() {
                    write!(f, "Add {} to {}", user, team)
                } else {
                    let roles: Vec<&str> = roles.iter().map(String::as_str).collect();
                    write!(f, "Add {} to {} as {}", user, team, roles.join(", "))
                }
            }
            Operation::UpdateTeamMembership {
                team,
                user,
                roles: None,
            } => write!(f, "Remove {} from {}", user, team),
        }
    }
}

fn team_names(tree: &Tree, key: &UserKey) -> Vec<String> {
    tree.teams_of(key)
        .into_iter()
        .map(|t| t.full_name.clone())
        .collect()
}

/// Compute the operations that make `actual` match `desired`.
///
/// Neither tree is modified. Equal entities produce nothing, so diffing a
/// tree against itself yields an empty list.
pub fn diff(desired: &Tree, actual: &Tree) -> Vec<Operation> {
    let mut delete_users = Vec::new();
    let mut remove_memberships = Vec::new();
    let mut delete_teams = Vec::new();
    let mut create_teams = Vec::new();
    let mut create_users = Vec::new();
    let mut set_memberships = Vec::new();
    let mut update_teams = Vec::new();
    let mut update_users = Vec::new();

    for team in desired.teams_top_down() {
        match actual.team(&team.full_name) {
            None => create_teams.push(Operation::CreateTeam {
                full_name: team.full_name.clone(),
                name: team.name.clone(),
            }),
            Some(current) if current.name != team.name => {
                update_teams.push(Operation::UpdateTeam {
                    full_name: team.full_name.clone(),
                    name: team.name.clone(),
                    previous_name: current.name.clone(),
                })
            }
            Some(_) => {}
        }
    }
    for team in actual.teams_bottom_up() {
        if desired.team(&team.full_name).is_none() {
            delete_teams.push(Operation::DeleteTeam {
                full_name: team.full_name.clone(),
            });
        }
    }

    for user in desired.users() {
        let key = user.key();
        match actual.user(&key) {
            None => create_users.push(Operation::CreateUser {
                user: user.clone(),
                teams: team_names(desired, &key),
            }),
            Some(current) => {
                let changes = user.changed_attributes(current);
                if !changes.is_empty() {
                    debug!("{} differs in {:?}", key, changes);
                    let mut user = user.clone();
                    user.id = current.id;
                    update_users.push(Operation::UpdateUser {
                        user,
                        changes,
                        teams: team_names(desired, &key),
                    });
                }
            }
        }
    }
    for user in actual.users() {
        if !desired.contains_user(&user.key()) {
            delete_users.push(Operation::DeleteUser { user: user.clone() });
        }
    }

    let wanted = desired.memberships();
    let current = actual.memberships();
    for ((team_key, user_key), (team, membership)) in &wanted {
        let unchanged = current
            .get(&(team_key.clone(), user_key.clone()))
            .is_some_and(|(_, existing)| existing.roles == membership.roles);
        if !unchanged {
            set_memberships.push(Operation::UpdateTeamMembership {
                team: team.full_name.clone(),
                user: user_key.clone(),
                roles: Some(membership.roles.clone()),
            });
        }
    }
    for ((team_key, user_key), (team, _)) in &current {
        // Deleting a user removes its memberships.
        if !desired.contains_user(user_key) {
            continue;
        }
        if !wanted.contains_key(&(team_key.clone(), user_key.clone())) {
            remove_memberships.push(Operation::UpdateTeamMembership {
                team: team.full_name.clone(),
                user: user_key.clone(),
                roles: None,
            });
        }
    }

    let operations: Vec<Operation> = delete_users
        .into_iter()
        .chain(remove_memberships)
        .chain(delete_teams)
        .chain(create_teams)
        .chain(create_users)
        .chain(set_memberships)
        .chain(update_teams)
        .chain(update_users)
        .collect();
    debug!("Diff produced {} operation(s)", operations.len());
    operations
}
