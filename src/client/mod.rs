//! Access Control API client
//!
//! [`AccessControlApi`] is the seam between the reconciliation engine and
//! the remote service. [`AccessControlClient`] talks REST over HTTP; tests
//! use the in-memory mock.

use async_trait::async_trait;

use crate::error::Result;

pub mod access_control;
pub mod catalog;
#[cfg(test)]
pub mod fixtures;
#[cfg(test)]
pub mod mock;
pub mod models;

pub use access_control::AccessControlClient;
pub use catalog::Catalog;
#[cfg(test)]
pub use mock::MockAccessControlClient;

use models::{
    AuthenticationProvider, CreateUserRequest, DirectoryEntry, LdapServer, RemoteTeam, RemoteUser,
    Role, UpdateUserRequest,
};

/// Access Control API operations
#[async_trait]
pub trait AccessControlApi: Send + Sync {
    // ========================================================================
    // Read Operations
    // ========================================================================

    /// List every team.
    async fn list_teams(&self) -> Result<Vec<RemoteTeam>>;

    /// List every user, with team memberships.
    async fn list_users(&self) -> Result<Vec<RemoteUser>>;

    async fn list_roles(&self) -> Result<Vec<Role>>;

    async fn list_authentication_providers(&self) -> Result<Vec<AuthenticationProvider>>;

    async fn list_ldap_servers(&self) -> Result<Vec<LdapServer>>;

    /// Search an LDAP server for entries whose username contains `username`.
    async fn search_ldap_user_entries(
        &self,
        ldap_server_id: u64,
        username: &str,
    ) -> Result<Vec<DirectoryEntry>>;

    // ========================================================================
    // Write Operations
    // ========================================================================

    /// Create a team below `parent_id`, returning the new team's id.
    async fn create_team(&self, parent_id: u64, name: &str) -> Result<u64>;

    async fn update_team(&self, id: u64, name: &str, parent_id: u64) -> Result<()>;

    /// Delete a team. The server rejects teams that still have children.
    async fn delete_team(&self, id: u64) -> Result<()>;

    /// Create a user, returning the new user's id.
    async fn create_user(&self, request: CreateUserRequest) -> Result<u64>;

    /// Replace a user's attributes.
    async fn update_user(&self, id: u64, request: UpdateUserRequest) -> Result<()>;

    async fn delete_user(&self, id: u64) -> Result<()>;

    /// Add a user to a team, or replace the roles it holds there.
    async fn set_team_membership(&self, team_id: u64, user_id: u64, role_ids: Vec<u64>)
    -> Result<()>;

    async fn remove_team_membership(&self, team_id: u64, user_id: u64) -> Result<()>;
}
