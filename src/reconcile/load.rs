//! Desired and actual state loading
//!
//! Both sides end up as a [`Tree`] so the diff never has to care where a
//! team or user came from.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use log::{debug, info, warn};

use crate::client::{AccessControlApi, Catalog};
use crate::client::models::RemoteUser;
use crate::error::{Error, ModelError, Result};
use crate::model::{Membership, Team, Tree, User, UserKey, parent_full_name, resolve_user};
use crate::store::{self, Workspace};

use super::validate;

/// Build the desired tree from a workspace.
///
/// Returns the tree together with every structural problem found: duplicate
/// teams, users listed twice in the users file or in one team, teams
/// without a parent, users missing a mandatory attribute. Users that fail resolution are left out of the tree.
pub fn build_desired(ws: &Workspace) -> (Tree, Vec<ModelError>) {
    let mut tree = Tree::new();
    let mut problems = Vec::new();

    for loaded in &ws.teams {
        if let Some(first) = tree.team(&loaded.full_name) {
            problems.push(ModelError::DuplicateTeam {
                path: loaded.path.clone(),
                full_name: loaded.full_name.clone(),
                first: first.source.clone().unwrap_or_default(),
            });
            continue;
        }

        let mut team = Team::new(&loaded.name, &loaded.full_name);
        team.defaults = loaded.file.defaults();
        team.source = Some(loaded.path.clone());
        let default_roles = loaded.file.default_roles.as_ref();
        for reference in &loaded.file.users {
            let membership = reference.membership(default_roles);
            if team.members.iter().any(|m| m.key() == membership.key()) {
                warn!(
                    "{} is listed more than once in {}",
                    membership.key(),
                    loaded.full_name
                );
                problems.push(ModelError::DuplicateUser {
                    path: loaded.path.clone(),
                    username: reference.username.clone(),
                    provider: reference.authentication_provider_name.clone(),
                });
                continue;
            }
            team.members.push(membership);
        }
        tree.insert_team(team);
    }

    for team in tree.teams_top_down() {
        let Some(parent) = parent_full_name(&team.full_name) else {
            continue;
        };
        if tree.team(&parent).is_none() {
            problems.push(ModelError::InvalidTeamFile {
                path: team.source.clone().unwrap_or_default(),
                reason: format!("parent team {} is not defined", parent),
            });
        }
    }

    let global = ws.users.defaults();
    let mut seen: HashSet<UserKey> = HashSet::new();
    for entry in &ws.users.users {
        let provider = ws.users.provider_of(entry);
        let username = entry.username.to_lowercase();

        // Directory entries only inherit from the users file defaults.
        let synthesized = provider
            .is_some_and(|p| ws.synthesized.contains(&UserKey::new(&entry.username, p)));
        let scope_teams: Vec<&Team> = if synthesized {
            Vec::new()
        } else {
            tree.teams_top_down()
                .into_iter()
                .filter(|t| {
                    t.members.iter().any(|m| {
                        m.username.to_lowercase() == username
                            && provider.is_none_or(|p| p == m.authentication_provider_name)
                    })
                })
                .collect()
        };
        let scopes = scope_teams
            .iter()
            .map(|t| &t.defaults)
            .chain(std::iter::once(&global));

        let resolved = resolve_user(&entry.profile(), &entry.own(), scopes);
        let key = match &resolved {
            Ok(user) => user.key(),
            Err(missing) => {
                for &attribute in &missing.attributes {
                    problems.push(ModelError::MissingMandatoryAttribute {
                        path: ws.users_path.clone(),
                        username: missing.username.clone(),
                        attribute,
                    });
                }
                match provider {
                    Some(p) => UserKey::new(&entry.username, p),
                    None => continue,
                }
            }
        };

        if !seen.insert(key.clone()) {
            problems.push(ModelError::DuplicateUser {
                path: ws.users_path.clone(),
                username: entry.username.clone(),
                provider: key.provider().to_string(),
            });
            continue;
        }
        if let Ok(user) = resolved {
            tree.insert_user(user);
        }
    }

    debug!(
        "Desired state has {} team(s) and {} user(s)",
        tree.team_count(),
        tree.user_count()
    );
    (tree, problems)
}

/// Load and fully validate the desired state below `root`.
///
/// Any problem, structural or referential, fails the load with every
/// problem attached.
pub fn load_desired(root: &Path, catalog: Option<&Catalog>) -> Result<Tree> {
    let ws = store::read_workspace(root).map_err(Error::Validation)?;
    let (tree, problems) = validate::validate_workspace(&ws, catalog);
    if problems.is_empty() {
        Ok(tree)
    } else {
        Err(Error::Validation(problems))
    }
}

/// Fetch the actual state and the reference data used to translate it.
pub async fn load_actual(client: &dyn AccessControlApi) -> Result<(Tree, Catalog)> {
    info!("Retrieving teams and users from Access Control");
    let catalog = Catalog::fetch(client).await?;
    let remote_teams = client.list_teams().await?;
    let remote_users = client.list_users().await?;

    let mut tree = Tree::new();
    let mut names_by_id: HashMap<u64, String> = HashMap::new();
    for remote in remote_teams {
        debug!("Team {} ({})", remote.full_name, remote.id);
        names_by_id.insert(remote.id, remote.full_name.clone());
        let mut team = Team::new(remote.name, remote.full_name);
        team.id = Some(remote.id);
        tree.insert_team(team);
    }

    for remote in remote_users {
        let user = to_model_user(&remote, &catalog)?;
        debug!("User {} ({})", user.key(), remote.id);

        for membership in remote.memberships() {
            let Some(full_name) = names_by_id.get(&membership.team_id) else {
                warn!(
                    "{} is a member of unknown team {}",
                    user.username, membership.team_id
                );
                continue;
            };
            let roles = membership
                .role_ids
                .iter()
                .map(|&id| catalog.role_name(id).map(str::to_string))
                .collect::<Result<Vec<_>>>()?;
            if let Some(team) = tree.team_mut(full_name) {
                team.members.push(
                    Membership::new(&user.username, &user.authentication_provider_name)
                        .with_roles(roles),
                );
            }
        }
        tree.insert_user(user);
    }

    info!(
        "Access Control has {} team(s) and {} user(s)",
        tree.team_count(),
        tree.user_count()
    );
    Ok((tree, catalog))
}

fn to_model_user(remote: &RemoteUser, catalog: &Catalog) -> Result<User> {
    let roles = remote
        .role_ids
        .iter()
        .map(|&id| catalog.role_name(id).map(str::to_string))
        .collect::<Result<_>>()?;

    Ok(User {
        id: Some(remote.id),
        username: remote.username.clone(),
        authentication_provider_name: catalog
            .provider_name(remote.authentication_provider_id)?
            .to_string(),
        email: remote.email.clone(),
        first_name: remote.first_name.clone(),
        last_name: remote.last_name.clone(),
        active: remote.active,
        locale_id: remote.locale_id,
        allowed_ip_list: remote.allowed_ip_list.iter().cloned().collect(),
        roles,
        cell_phone_number: remote.cell_phone_number.clone(),
        country: remote.country.clone(),
        expiration_date: remote.expiration_date.clone(),
        job_title: remote.job_title.clone(),
        other: remote.other.clone(),
        phone_number: remote.phone_number.clone(),
    })
}
