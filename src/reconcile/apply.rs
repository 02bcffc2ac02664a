//! Apply engine
//!
//! Executes an operation list against the remote service one operation at a
//! time. A failure never stops the run; it only causes the operations that
//! depend on the failed one to be skipped.

use std::collections::{HashMap, HashSet};

use log::{error, info, warn};
use serde::Serialize;

use super::diff::Operation;
use crate::client::models::{CreateUserRequest, UpdateUserRequest};
use crate::client::{AccessControlApi, Catalog};
use crate::error::{Error, Result};
use crate::model::{Tree, User, UserKey, is_within, parent_full_name, team_key};

/// Final state of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Applied,
    /// The remote call failed
    Failed,
    /// Not attempted because an operation it depends on failed
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationOutcome {
    pub operation: Operation,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Per-operation results of an apply run, in execution order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyReport {
    pub outcomes: Vec<OperationOutcome>,
}

impl ApplyReport {
    fn count(&self, status: Status) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn applied(&self) -> usize {
        self.count(Status::Applied)
    }

    pub fn failed(&self) -> usize {
        self.count(Status::Failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(Status::Skipped)
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.skipped() == 0
    }

    /// Convert an unsuccessful report into an error.
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Apply {
                failed: self.failed(),
                skipped: self.skipped(),
            })
        }
    }
}

/// Remote ids known so far, and what has failed.
struct Engine<'a> {
    client: &'a dyn AccessControlApi,
    catalog: &'a Catalog,
    team_ids: HashMap<String, u64>,
    user_ids: HashMap<UserKey, u64>,
    failed_teams: Vec<String>,
    failed_users: HashSet<UserKey>,
}

impl<'a> Engine<'a> {
    fn new(client: &'a dyn AccessControlApi, catalog: &'a Catalog, actual: &Tree) -> Self {
        Self {
            client,
            catalog,
            team_ids: actual
                .teams()
                .filter_map(|t| t.id.map(|id| (t.key(), id)))
                .collect(),
            user_ids: actual
                .users()
                .filter_map(|u| u.id.map(|id| (u.key(), id)))
                .collect(),
            failed_teams: Vec::new(),
            failed_users: HashSet::new(),
        }
    }

    /// Why `operation` cannot run, if something it needs failed.
    fn blocked_by(&self, operation: &Operation) -> Option<String> {
        if let Some(team) = operation.team() {
            let key = team_key(team);
            let failed = self.failed_teams.iter().find(|f| is_within(&key, f));
            if let Some(failed) = failed {
                return Some(format!("team {} was not created", failed));
            }
        }
        match operation {
            Operation::UpdateTeamMembership { user, .. } if self.failed_users.contains(user) => {
                Some(format!("user {} was not created", user))
            }
            _ => None,
        }
    }

    fn team_id(&self, full_name: &str) -> Result<u64> {
        self.team_ids.get(&team_key(full_name)).copied().ok_or_else(|| {
            Error::Other(format!("No id known for team {}", full_name))
        })
    }

    fn user_id(&self, user: &User) -> Result<u64> {
        let key = user.key();
        user.id
            .or_else(|| self.user_ids.get(&key).copied())
            .ok_or_else(|| Error::Other(format!("No id known for user {}", key)))
    }

    fn attributes(&self, user: &User, teams: &[String]) -> Result<UpdateUserRequest> {
        Ok(UpdateUserRequest {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            active: user.active,
            locale_id: user.locale_id,
            allowed_ip_list: user.allowed_ip_list.iter().cloned().collect(),
            role_ids: self.catalog.role_ids(&user.roles)?,
            team_ids: teams
                .iter()
                .filter_map(|t| self.team_ids.get(&team_key(t)).copied())
                .collect(),
            cell_phone_number: user.cell_phone_number.clone(),
            country: user.country.clone(),
            expiration_date: user.expiration_date.clone(),
            job_title: user.job_title.clone(),
            other: user.other.clone(),
            phone_number: user.phone_number.clone(),
        })
    }

    async fn execute(&mut self, operation: &Operation) -> Result<()> {
        match operation {
            Operation::CreateTeam { full_name, name } => {
                let parent = parent_full_name(full_name).ok_or_else(|| {
                    Error::Other(format!("Cannot create root team {}", full_name))
                })?;
                let parent_id = self.team_id(&parent)?;
                let id = self.client.create_team(parent_id, name).await?;
                self.team_ids.insert(team_key(full_name), id);
            }
            Operation::UpdateTeam {
                full_name, name, ..
            } => {
                let id = self.team_id(full_name)?;
                let parent_id = match parent_full_name(full_name) {
                    Some(parent) => self.team_id(&parent)?,
                    None => 0,
                };
                self.client.update_team(id, name, parent_id).await?;
            }
            Operation::DeleteTeam { full_name } => {
                let id = self.team_id(full_name)?;
                self.client.delete_team(id).await?;
                self.team_ids.remove(&team_key(full_name));
            }
            Operation::CreateUser { user, teams } => {
                let request = CreateUserRequest {
                    username: user.username.clone(),
                    password: String::new(),
                    authentication_provider_id: self
                        .catalog
                        .provider_id(&user.authentication_provider_name)?,
                    attributes: self.attributes(user, teams)?,
                };
                let id = self.client.create_user(request).await?;
                self.user_ids.insert(user.key(), id);
            }
            Operation::UpdateUser { user, teams, .. } => {
                let id = self.user_id(user)?;
                let request = self.attributes(user, teams)?;
                self.client.update_user(id, request).await?;
            }
            Operation::DeleteUser { user } => {
                let id = self.user_id(user)?;
                self.client.delete_user(id).await?;
                self.user_ids.remove(&user.key());
            }
            Operation::UpdateTeamMembership { team, user, roles } => {
                let team_id = self.team_id(team)?;
                let user_id = self
                    .user_ids
                    .get(user)
                    .copied()
                    .ok_or_else(|| Error::Other(format!("No id known for user {}", user)))?;
                match roles {
                    Some(roles) => {
                        let role_ids = self.catalog.role_ids(roles)?;
                        self.client
                            .set_team_membership(team_id, user_id, role_ids)
                            .await?;
                    }
                    None => {
                        self.client
                            .remove_team_membership(team_id, user_id)
                            .await?;
                    }
                }
            }
        }
        Ok(())
    }

    fn record_failure(&mut self, operation: &Operation) {
        match operation {
            Operation::CreateTeam { full_name, .. } => {
                self.failed_teams.push(team_key(full_name));
            }
            Operation::CreateUser { user, .. } => {
                self.failed_users.insert(user.key());
            }
            _ => {}
        }
    }
}

/// Apply `operations` in phase order.
///
/// Ids start from `actual` and grow as teams and users are created. Role
/// and provider names are translated through `catalog`.
pub async fn apply(
    mut operations: Vec<Operation>,
    client: &dyn AccessControlApi,
    catalog: &Catalog,
    actual: &Tree,
) -> ApplyReport {
    operations.sort_by_key(Operation::order_key);

    let mut engine = Engine::new(client, catalog, actual);
    let mut report = ApplyReport::default();

    for operation in operations {
        if let Some(reason) = engine.blocked_by(&operation) {
            warn!("Skipping: {} ({})", operation, reason);
            engine.record_failure(&operation);
            report.outcomes.push(OperationOutcome {
                operation,
                status: Status::Skipped,
                message: Some(reason),
            });
            continue;
        }

        info!("{}", operation);
        let outcome = match engine.execute(&operation).await {
            Ok(()) => OperationOutcome {
                operation,
                status: Status::Applied,
                message: None,
            },
            Err(e) => {
                error!("{} failed: {}", operation, e);
                engine.record_failure(&operation);
                OperationOutcome {
                    operation,
                    status: Status::Failed,
                    message: Some(e.to_string()),
                }
            }
        };
        report.outcomes.push(outcome);
    }

    info!(
        "Applied {} operation(s), {} failed, {} skipped",
        report.applied(),
        report.failed(),
        report.skipped()
    );
    report
}
