//! Mock Access Control client for testing
//!
//! Holds server state in memory and applies mutations to it, so a test can
//! run an update and then diff again against the result. Write operations
//! enforce the same constraints the server does: parents must exist, teams
//! with children or members cannot be deleted, identities are unique.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::AccessControlApi;
use super::fixtures;
use super::models::{
    AuthenticationProvider, CreateUserRequest, DirectoryEntry, LdapServer, RemoteMembership,
    RemoteTeam, RemoteUser, Role, UpdateUserRequest,
};
use crate::error::{ApiError, Result};

/// A write the mock should reject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// `create_team` for a team with this name
    CreateTeam(String),
    /// `create_user` for this username
    CreateUser(String),
    /// `delete_team` for this id
    DeleteTeam(u64),
    /// `update_user` for this id
    UpdateUser(u64),
}

/// A recorded call, for ordering assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub method: &'static str,
    pub target: String,
}

/// Tracks API call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub list_teams: usize,
    pub list_users: usize,
    pub list_roles: usize,
    pub list_authentication_providers: usize,
    pub list_ldap_servers: usize,
    pub search_ldap_user_entries: usize,
    pub create_team: usize,
    pub update_team: usize,
    pub delete_team: usize,
    pub create_user: usize,
    pub update_user: usize,
    pub delete_user: usize,
    pub set_team_membership: usize,
    pub remove_team_membership: usize,
}

impl CallCounts {
    /// Number of write calls made.
    pub fn writes(&self) -> usize {
        self.create_team
            + self.update_team
            + self.delete_team
            + self.create_user
            + self.update_user
            + self.delete_user
            + self.set_team_membership
            + self.remove_team_membership
    }
}

#[derive(Debug, Default)]
struct State {
    teams: BTreeMap<u64, RemoteTeam>,
    users: BTreeMap<u64, RemoteUser>,
    roles: Vec<Role>,
    providers: Vec<AuthenticationProvider>,
    ldap_servers: Vec<LdapServer>,
    directory: HashMap<u64, Vec<DirectoryEntry>>,
    next_id: u64,
}

impl State {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn team(&self, id: u64) -> Result<&RemoteTeam> {
        self.teams
            .get(&id)
            .ok_or_else(|| ApiError::NotFound(format!("Teams/{}", id)).into())
    }

    fn user_mut(&mut self, id: u64) -> Result<&mut RemoteUser> {
        self.users
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound(format!("Users/{}", id)).into())
    }

    /// Recompute `full_name` for every team below `id`.
    fn refresh_full_names(&mut self, id: u64) {
        let Some(parent) = self.teams.get(&id).map(|t| t.full_name.clone()) else {
            return;
        };
        let children: Vec<u64> = self
            .teams
            .values()
            .filter(|t| t.parent_id == Some(id))
            .map(|t| t.id)
            .collect();
        for child in children {
            if let Some(team) = self.teams.get_mut(&child) {
                team.full_name = format!("{}/{}", parent, team.name);
            }
            self.refresh_full_names(child);
        }
    }

    fn check_user_request(&self, request: &UpdateUserRequest) -> Result<()> {
        for role_id in &request.role_ids {
            if !self.roles.iter().any(|r| r.id == *role_id) {
                return Err(ApiError::BadRequest(format!("Unknown role id {}", role_id)).into());
            }
        }
        for team_id in &request.team_ids {
            self.team(*team_id)?;
        }
        Ok(())
    }
}

/// Mock API client for testing.
///
/// # Example
/// ```ignore
/// let mock = MockAccessControlClient::new()
///     .with_teams(vec![RemoteTeamBuilder::new(1, "/CxServer").build()])
///     .await;
///
/// let teams = mock.list_teams().await?;
/// assert_eq!(teams.len(), 1);
/// ```
pub struct MockAccessControlClient {
    state: Arc<Mutex<State>>,
    /// Writes to reject
    failures: Arc<Mutex<Vec<Failure>>>,
    /// Error to return (if any) - consumed on first use
    error: Arc<Mutex<Option<ApiError>>>,
    call_count: Arc<Mutex<CallCounts>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl Default for MockAccessControlClient {
    fn default() -> Self {
        let state = State {
            roles: fixtures::roles(),
            providers: fixtures::providers(),
            ldap_servers: fixtures::ldap_servers(),
            next_id: 100,
            ..State::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            failures: Arc::new(Mutex::new(Vec::new())),
            error: Arc::new(Mutex::new(None)),
            call_count: Arc::new(Mutex::new(CallCounts::default())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockAccessControlClient {
    /// Create a mock with the fixture reference data and no teams or users.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_teams(self, teams: Vec<RemoteTeam>) -> Self {
        {
            let mut state = self.state.lock().await;
            for team in teams {
                state.teams.insert(team.id, team);
            }
        }
        self
    }

    pub async fn with_users(self, users: Vec<RemoteUser>) -> Self {
        {
            let mut state = self.state.lock().await;
            for user in users {
                state.users.insert(user.id, user);
            }
        }
        self
    }

    /// Entries returned by directory searches on an LDAP server.
    pub async fn with_directory(self, ldap_server_id: u64, entries: Vec<DirectoryEntry>) -> Self {
        self.state
            .lock()
            .await
            .directory
            .insert(ldap_server_id, entries);
        self
    }

    pub async fn with_failure(self, failure: Failure) -> Self {
        self.failures.lock().await.push(failure);
        self
    }

    /// Configure an error to return on the next call.
    pub async fn with_error(self, error: ApiError) -> Self {
        *self.error.lock().await = Some(error);
        self
    }

    pub async fn call_counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }

    /// Write calls in the order they were made.
    pub async fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().await.clone()
    }

    pub async fn teams(&self) -> Vec<RemoteTeam> {
        self.state.lock().await.teams.values().cloned().collect()
    }

    pub async fn users(&self) -> Vec<RemoteUser> {
        self.state.lock().await.users.values().cloned().collect()
    }

    async fn check_error(&self) -> Result<()> {
        if let Some(err) = self.error.lock().await.take() {
            return Err(err.into());
        }
        Ok(())
    }

    async fn check_failure(&self, failure: Failure) -> Result<()> {
        if self.failures.lock().await.contains(&failure) {
            return Err(ApiError::ServerError(format!("injected failure: {:?}", failure)).into());
        }
        Ok(())
    }

    async fn record(&self, method: &'static str, target: impl Into<String>) {
        self.calls.lock().await.push(MockCall {
            method,
            target: target.into(),
        });
    }
}

#[async_trait]
impl AccessControlApi for MockAccessControlClient {
    async fn list_teams(&self) -> Result<Vec<RemoteTeam>> {
        self.call_count.lock().await.list_teams += 1;
        self.check_error().await?;
        Ok(self.teams().await)
    }

    async fn list_users(&self) -> Result<Vec<RemoteUser>> {
        self.call_count.lock().await.list_users += 1;
        self.check_error().await?;
        Ok(self.users().await)
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        self.call_count.lock().await.list_roles += 1;
        self.check_error().await?;
        Ok(self.state.lock().await.roles.clone())
    }

    async fn list_authentication_providers(&self) -> Result<Vec<AuthenticationProvider>> {
        self.call_count.lock().await.list_authentication_providers += 1;
        self.check_error().await?;
        Ok(self.state.lock().await.providers.clone())
    }

    async fn list_ldap_servers(&self) -> Result<Vec<LdapServer>> {
        self.call_count.lock().await.list_ldap_servers += 1;
        self.check_error().await?;
        Ok(self.state.lock().await.ldap_servers.clone())
    }

    async fn search_ldap_user_entries(
        &self,
        ldap_server_id: u64,
        username: &str,
    ) -> Result<Vec<DirectoryEntry>> {
        self.call_count.lock().await.search_ldap_user_entries += 1;
        self.check_error().await?;
        let pattern = username.to_lowercase();
        let state = self.state.lock().await;
        Ok(state
            .directory
            .get(&ldap_server_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.username.to_lowercase().contains(&pattern))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create_team(&self, parent_id: u64, name: &str) -> Result<u64> {
        self.call_count.lock().await.create_team += 1;
        self.check_error().await?;
        self.check_failure(Failure::CreateTeam(name.to_string()))
            .await?;

        let mut state = self.state.lock().await;
        let parent = state.team(parent_id)?.full_name.clone();
        let full_name = format!("{}/{}", parent, name);
        if state.teams.values().any(|t| t.full_name == full_name) {
            return Err(ApiError::BadRequest(format!("Team {} already exists", full_name)).into());
        }
        let id = state.allocate_id();
        state.teams.insert(
            id,
            RemoteTeam {
                id,
                name: name.to_string(),
                full_name: full_name.clone(),
                parent_id: Some(parent_id),
            },
        );
        drop(state);
        self.record("create_team", full_name).await;
        Ok(id)
    }

    async fn update_team(&self, id: u64, name: &str, parent_id: u64) -> Result<()> {
        self.call_count.lock().await.update_team += 1;
        self.check_error().await?;

        let mut state = self.state.lock().await;
        let parent = state.team(parent_id)?.full_name.clone();
        let team = state
            .teams
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound(format!("Teams/{}", id)))?;
        team.name = name.to_string();
        team.parent_id = Some(parent_id);
        team.full_name = format!("{}/{}", parent, name);
        let full_name = team.full_name.clone();
        state.refresh_full_names(id);
        drop(state);
        self.record("update_team", full_name).await;
        Ok(())
    }

    async fn delete_team(&self, id: u64) -> Result<()> {
        self.call_count.lock().await.delete_team += 1;
        self.check_error().await?;
        self.check_failure(Failure::DeleteTeam(id)).await?;

        let mut state = self.state.lock().await;
        let full_name = state.team(id)?.full_name.clone();
        if state.teams.values().any(|t| t.parent_id == Some(id)) {
            return Err(ApiError::BadRequest(format!("Team {} has child teams", full_name)).into());
        }
        if state.users.values().any(|u| u.team_ids.contains(&id)) {
            return Err(ApiError::BadRequest(format!("Team {} has members", full_name)).into());
        }
        state.teams.remove(&id);
        drop(state);
        self.record("delete_team", full_name).await;
        Ok(())
    }

    async fn create_user(&self, request: CreateUserRequest) -> Result<u64> {
        self.call_count.lock().await.create_user += 1;
        self.check_error().await?;
        self.check_failure(Failure::CreateUser(request.username.clone()))
            .await?;

        let mut state = self.state.lock().await;
        if !state
            .providers
            .iter()
            .any(|p| p.id == request.authentication_provider_id)
        {
            return Err(ApiError::BadRequest("Unknown authentication provider".to_string()).into());
        }
        if state.users.values().any(|u| {
            u.username.eq_ignore_ascii_case(&request.username)
                && u.authentication_provider_id == request.authentication_provider_id
        }) {
            return Err(
                ApiError::BadRequest(format!("User {} already exists", request.username)).into(),
            );
        }
        state.check_user_request(&request.attributes)?;

        let id = state.allocate_id();
        let attributes = request.attributes;
        state.users.insert(
            id,
            RemoteUser {
                id,
                username: request.username.clone(),
                email: attributes.email,
                first_name: attributes.first_name,
                last_name: attributes.last_name,
                active: attributes.active,
                locale_id: attributes.locale_id,
                allowed_ip_list: attributes.allowed_ip_list,
                authentication_provider_id: request.authentication_provider_id,
                role_ids: attributes.role_ids,
                team_memberships: attributes
                    .team_ids
                    .iter()
                    .map(|&team_id| RemoteMembership {
                        team_id,
                        role_ids: Vec::new(),
                    })
                    .collect(),
                team_ids: attributes.team_ids,
                cell_phone_number: attributes.cell_phone_number,
                country: attributes.country,
                expiration_date: attributes.expiration_date,
                job_title: attributes.job_title,
                other: attributes.other,
                phone_number: attributes.phone_number,
            },
        );
        drop(state);
        self.record("create_user", request.username).await;
        Ok(id)
    }

    async fn update_user(&self, id: u64, request: UpdateUserRequest) -> Result<()> {
        self.call_count.lock().await.update_user += 1;
        self.check_error().await?;
        self.check_failure(Failure::UpdateUser(id)).await?;

        let mut state = self.state.lock().await;
        state.check_user_request(&request)?;
        let user = state.user_mut(id)?;
        user.email = request.email;
        user.first_name = request.first_name;
        user.last_name = request.last_name;
        user.active = request.active;
        user.locale_id = request.locale_id;
        user.allowed_ip_list = request.allowed_ip_list;
        user.role_ids = request.role_ids;
        user.cell_phone_number = request.cell_phone_number;
        user.country = request.country;
        user.expiration_date = request.expiration_date;
        user.job_title = request.job_title;
        user.other = request.other;
        user.phone_number = request.phone_number;

        // Keep the roles of retained memberships.
        let previous = std::mem::take(&mut user.team_memberships);
        user.team_memberships = request
            .team_ids
            .iter()
            .map(|&team_id| {
                previous
                    .iter()
                    .find(|m| m.team_id == team_id)
                    .cloned()
                    .unwrap_or(RemoteMembership {
                        team_id,
                        role_ids: Vec::new(),
                    })
            })
            .collect();
        user.team_ids = request.team_ids;
        let username = user.username.clone();
        drop(state);
        self.record("update_user", username).await;
        Ok(())
    }

    async fn delete_user(&self, id: u64) -> Result<()> {
        self.call_count.lock().await.delete_user += 1;
        self.check_error().await?;

        let removed = self.state.lock().await.users.remove(&id);
        let user = removed.ok_or_else(|| ApiError::NotFound(format!("Users/{}", id)))?;
        self.record("delete_user", user.username).await;
        Ok(())
    }

    async fn set_team_membership(
        &self,
        team_id: u64,
        user_id: u64,
        role_ids: Vec<u64>,
    ) -> Result<()> {
        self.call_count.lock().await.set_team_membership += 1;
        self.check_error().await?;

        let mut state = self.state.lock().await;
        let team = state.team(team_id)?.full_name.clone();
        let user = state.user_mut(user_id)?;
        match user.team_memberships.iter_mut().find(|m| m.team_id == team_id) {
            Some(membership) => membership.role_ids = role_ids,
            None => {
                user.team_ids.push(team_id);
                user.team_memberships
                    .push(RemoteMembership { team_id, role_ids });
            }
        }
        let target = format!("{} {}", team, user.username);
        drop(state);
        self.record("set_team_membership", target).await;
        Ok(())
    }

    async fn remove_team_membership(&self, team_id: u64, user_id: u64) -> Result<()> {
        self.call_count.lock().await.remove_team_membership += 1;
        self.check_error().await?;

        let mut state = self.state.lock().await;
        let team = state.team(team_id)?.full_name.clone();
        let user = state.user_mut(user_id)?;
        if !user.team_ids.contains(&team_id) {
            return Err(ApiError::NotFound(format!("Teams/{}/Users/{}", team_id, user_id)).into());
        }
        user.team_ids.retain(|&id| id != team_id);
        user.team_memberships.retain(|m| m.team_id != team_id);
        let target = format!("{} {}", team, user.username);
        drop(state);
        self.record("remove_team_membership", target).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fixtures::{RemoteTeamBuilder, RemoteUserBuilder};

    async fn seeded() -> MockAccessControlClient {
        MockAccessControlClient::new()
            .with_teams(vec![
                RemoteTeamBuilder::new(1, "/CxServer").build(),
                RemoteTeamBuilder::new(2, "/CxServer/SP").parent(1).build(),
            ])
            .await
            .with_users(vec![RemoteUserBuilder::new(3, "alice").member_of(2, vec![]).build()])
            .await
    }

    #[tokio::test]
    async fn test_create_team_under_parent() {
        let mock = seeded().await;
        let id = mock.create_team(2, "Company").await.unwrap();
        let teams = mock.teams().await;
        let created = teams.iter().find(|t| t.id == id).unwrap();
        assert_eq!(created.full_name, "/CxServer/SP/Company");
        assert_eq!(mock.call_counts().await.create_team, 1);
    }

    #[tokio::test]
    async fn test_create_team_missing_parent() {
        let mock = seeded().await;
        let result = mock.create_team(99, "Orphan").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_delete_team_with_members_is_rejected() {
        let mock = seeded().await;
        assert!(mock.delete_team(1).await.is_err(), "has children");
        assert!(mock.delete_team(2).await.is_err(), "has members");

        mock.remove_team_membership(2, 3).await.unwrap();
        mock.delete_team(2).await.unwrap();
        mock.delete_team(1).await.unwrap();
        assert!(mock.teams().await.is_empty());
    }

    #[tokio::test]
    async fn test_rename_updates_descendants() {
        let mock = seeded().await;
        mock.create_team(2, "Company").await.unwrap();
        mock.update_team(2, "Sales", 1).await.unwrap();
        let names: Vec<String> = mock.teams().await.into_iter().map(|t| t.full_name).collect();
        assert!(names.contains(&"/CxServer/Sales/Company".to_string()));
    }

    #[tokio::test]
    async fn test_set_membership_roles() {
        let mock = seeded().await;
        mock.set_team_membership(2, 3, vec![fixtures::ROLE_SCANNER])
            .await
            .unwrap();
        let alice = mock.users().await.remove(0);
        assert_eq!(alice.memberships()[0].role_ids, vec![fixtures::ROLE_SCANNER]);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let mock = seeded()
            .await
            .with_failure(Failure::CreateTeam("Broken".to_string()))
            .await;
        assert!(mock.create_team(1, "Broken").await.is_err());
        assert!(mock.create_team(1, "Fine").await.is_ok());
    }

    #[tokio::test]
    async fn test_one_shot_error() {
        let mock = seeded().await.with_error(ApiError::Unauthorized).await;
        assert!(mock.list_teams().await.is_err());
        assert_eq!(mock.list_teams().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_directory_search_is_case_insensitive() {
        let mock = MockAccessControlClient::new()
            .with_directory(
                fixtures::LDAP_CORP,
                vec![fixtures::directory_entry("TestUser", None)],
            )
            .await;
        let entries = mock
            .search_ldap_user_entries(fixtures::LDAP_CORP, "testuser")
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
    }
}
