//! Validation rules for the desired state
//!
//! Every rule runs to completion; problems are collected, never thrown.
//! Checks against reference data only run when a catalog is supplied.

use std::collections::HashSet;

use log::{debug, info};
use serde::Serialize;

use crate::client::Catalog;
use crate::directory::{self, DirectoryLookup};
use crate::error::{ModelError, Result};
use crate::model::{Tree, UserKey};
use crate::store::{LoadedTeam, UserReference, Workspace};

use super::load;

/// Result of validating a data directory.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub teams: usize,
    pub users: usize,
    /// Users appended to the users file from the directory
    pub added: Vec<UserKey>,
    #[serde(serialize_with = "serialize_problems")]
    pub problems: Vec<ModelError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }
}

fn serialize_problems<S>(problems: &[ModelError], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    #[derive(Serialize)]
    struct Problem {
        category: String,
        path: String,
        message: String,
    }

    serializer.collect_seq(problems.iter().map(|p| Problem {
        category: p.category().to_string(),
        path: p.path().display().to_string(),
        message: p.to_string(),
    }))
}

/// Keys of the users declared in the users file.
fn declared_users(ws: &Workspace) -> HashSet<UserKey> {
    ws.users
        .users
        .iter()
        .filter_map(|e| ws.users.provider_of(e).map(|p| UserKey::new(&e.username, p)))
        .collect()
}

/// Team references with no matching users file entry, in file order.
pub fn unmatched_references(ws: &Workspace) -> Vec<(&LoadedTeam, &UserReference)> {
    let declared = declared_users(ws);
    ws.teams
        .iter()
        .flat_map(|team| team.file.users.iter().map(move |r| (team, r)))
        .filter(|(_, r)| {
            !declared.contains(&UserKey::new(&r.username, &r.authentication_provider_name))
        })
        .collect()
}

/// Every reference resolves to a user, and every user belongs to a team.
pub fn check_references(ws: &Workspace) -> Vec<ModelError> {
    let mut problems: Vec<ModelError> = unmatched_references(ws)
        .into_iter()
        .map(|(team, r)| ModelError::MissingUser {
            path: team.path.clone(),
            team: team.full_name.clone(),
            username: r.username.clone(),
            provider: r.authentication_provider_name.clone(),
        })
        .collect();

    let referenced: HashSet<UserKey> = ws
        .teams
        .iter()
        .flat_map(|t| t.file.users.iter())
        .map(|r| UserKey::new(&r.username, &r.authentication_provider_name))
        .collect();
    for entry in &ws.users.users {
        let Some(provider) = ws.users.provider_of(entry) else {
            continue;
        };
        if !referenced.contains(&UserKey::new(&entry.username, provider)) {
            problems.push(ModelError::NoTeam {
                path: ws.users_path.clone(),
                username: entry.username.clone(),
                provider: provider.to_string(),
            });
        }
    }

    problems
}

/// Role and authentication provider names exist on the server.
pub fn check_catalog(ws: &Workspace, tree: &Tree, catalog: &Catalog) -> Vec<ModelError> {
    let mut problems = Vec::new();

    for user in tree.users() {
        if !catalog.is_provider(&user.authentication_provider_name) {
            problems.push(ModelError::InvalidAuthenticationProvider {
                path: ws.users_path.clone(),
                username: user.username.clone(),
                provider: user.authentication_provider_name.clone(),
            });
        }
        for role in user.roles.iter().filter(|r| !catalog.is_role(r)) {
            problems.push(ModelError::InvalidRole {
                path: ws.users_path.clone(),
                username: user.username.clone(),
                role: role.clone(),
            });
        }
    }

    for team in tree.teams_top_down() {
        let path = team.source.clone().unwrap_or_default();
        for member in &team.members {
            if !catalog.is_provider(&member.authentication_provider_name) {
                problems.push(ModelError::InvalidAuthenticationProvider {
                    path: path.clone(),
                    username: member.username.clone(),
                    provider: member.authentication_provider_name.clone(),
                });
            }
            for role in member.roles.iter().filter(|r| !catalog.is_role(r)) {
                problems.push(ModelError::InvalidRole {
                    path: path.clone(),
                    username: member.username.clone(),
                    role: role.clone(),
                });
            }
        }
    }

    problems
}

/// Build the desired tree and run every offline rule, plus the catalog
/// rules when a catalog is given.
pub fn validate_workspace(ws: &Workspace, catalog: Option<&Catalog>) -> (Tree, Vec<ModelError>) {
    let (tree, mut problems) = load::build_desired(ws);
    problems.extend(check_references(ws));
    if let Some(catalog) = catalog {
        problems.extend(check_catalog(ws, &tree, catalog));
    }
    debug!("Validation found {} problem(s)", problems.len());
    (tree, problems)
}

/// Validate a workspace, optionally resolving unmatched references through
/// a directory first. Users found in the directory are saved to the users
/// file before the rules run.
pub async fn validate(
    ws: &mut Workspace,
    lookup: Option<&dyn DirectoryLookup>,
    catalog: Option<&Catalog>,
) -> Result<ValidationReport> {
    let mut added = Vec::new();
    let mut directory_problems = Vec::new();

    if let Some(lookup) = lookup {
        let enrichment = directory::enrich(ws, lookup).await?;
        if !enrichment.added.is_empty() {
            ws.save_users()?;
            info!(
                "Added {} user(s) to {}",
                enrichment.added.len(),
                ws.users_path.display()
            );
        }
        added = enrichment.added;
        directory_problems = enrichment.problems;
    }

    let (tree, problems) = validate_workspace(ws, catalog);

    // A reference the directory could not resolve is reported once.
    let unresolved: HashSet<(String, UserKey)> = directory_problems
        .iter()
        .filter_map(|p| match p {
            ModelError::MissingDirectoryUser {
                team,
                username,
                provider,
                ..
            } => Some((team.clone(), UserKey::new(username, provider))),
            _ => None,
        })
        .collect();
    let mut all = directory_problems;
    all.extend(problems.into_iter().filter(|p| match p {
        ModelError::MissingUser {
            team,
            username,
            provider,
            ..
        } => !unresolved.contains(&(team.clone(), UserKey::new(username, provider))),
        _ => true,
    }));

    Ok(ValidationReport {
        teams: tree.team_count(),
        users: tree.user_count(),
        added,
        problems: all,
    })
}
