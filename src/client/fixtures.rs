//! Test fixtures and builders for API and model types
//!
//! Provides builder patterns for creating test data with sensible defaults.
//! Import via `use crate::client::fixtures::*` in test modules.

#![allow(dead_code)]

use super::Catalog;
use super::models::{
    AuthenticationProvider, DirectoryEntry, LdapServer, RemoteMembership, RemoteTeam, RemoteUser,
    Role,
};
use crate::model::{Membership, Team, User};

pub const ROLE_SAST_ADMIN: u64 = 1;
pub const ROLE_SCANNER: u64 = 2;
pub const ROLE_REVIEWER: u64 = 3;

pub const PROVIDER_APPLICATION: u64 = 1;
pub const PROVIDER_CORP: u64 = 2;

pub const LDAP_CORP: u64 = 10;

pub fn roles() -> Vec<Role> {
    [
        (ROLE_SAST_ADMIN, "SAST Admin"),
        (ROLE_SCANNER, "Scanner"),
        (ROLE_REVIEWER, "Reviewer"),
    ]
    .into_iter()
    .map(|(id, name)| Role {
        id,
        name: name.to_string(),
        description: None,
    })
    .collect()
}

pub fn providers() -> Vec<AuthenticationProvider> {
    vec![
        AuthenticationProvider {
            id: PROVIDER_APPLICATION,
            name: "Application".to_string(),
            provider_type: Some("Application".to_string()),
            provider_id: None,
        },
        AuthenticationProvider {
            id: PROVIDER_CORP,
            name: "CorpDirectory".to_string(),
            provider_type: Some("LDAP".to_string()),
            provider_id: Some(LDAP_CORP),
        },
    ]
}

pub fn ldap_servers() -> Vec<LdapServer> {
    vec![LdapServer {
        id: LDAP_CORP,
        name: "CorpDirectory".to_string(),
    }]
}

/// Catalog matching the mock client's reference data.
pub fn catalog() -> Catalog {
    Catalog::new(roles(), providers(), ldap_servers())
}

// ============================================================================
// RemoteTeamBuilder
// ============================================================================

/// Builder for creating test RemoteTeam instances.
///
/// # Example
/// ```ignore
/// let team = RemoteTeamBuilder::new(5, "/CxServer/SP").parent(1).build();
/// ```
#[derive(Debug, Clone)]
pub struct RemoteTeamBuilder {
    id: u64,
    full_name: String,
    parent_id: Option<u64>,
}

impl RemoteTeamBuilder {
    pub fn new(id: u64, full_name: impl Into<String>) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            parent_id: None,
        }
    }

    pub fn parent(mut self, parent_id: u64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn build(self) -> RemoteTeam {
        RemoteTeam {
            id: self.id,
            name: crate::model::last_segment(&self.full_name).to_string(),
            full_name: self.full_name,
            parent_id: self.parent_id,
        }
    }
}

// ============================================================================
// RemoteUserBuilder
// ============================================================================

/// Builder for creating test RemoteUser instances.
///
/// Defaults to an active Application user with locale 1 and no roles.
#[derive(Debug, Clone)]
pub struct RemoteUserBuilder {
    user: RemoteUser,
}

impl RemoteUserBuilder {
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            user: RemoteUser {
                id,
                email: format!("{}@example.com", username),
                first_name: username.clone(),
                last_name: username.clone(),
                username,
                active: true,
                locale_id: 1,
                allowed_ip_list: Vec::new(),
                authentication_provider_id: PROVIDER_APPLICATION,
                role_ids: Vec::new(),
                team_ids: Vec::new(),
                team_memberships: Vec::new(),
                cell_phone_number: None,
                country: None,
                expiration_date: None,
                job_title: None,
                other: None,
                phone_number: None,
            },
        }
    }

    pub fn provider(mut self, provider_id: u64) -> Self {
        self.user.authentication_provider_id = provider_id;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.user.active = active;
        self
    }

    pub fn roles(mut self, role_ids: Vec<u64>) -> Self {
        self.user.role_ids = role_ids;
        self
    }

    /// Add a membership holding the given roles.
    pub fn member_of(mut self, team_id: u64, role_ids: Vec<u64>) -> Self {
        self.user.team_ids.push(team_id);
        self.user
            .team_memberships
            .push(RemoteMembership { team_id, role_ids });
        self
    }

    pub fn build(self) -> RemoteUser {
        self.user
    }
}

pub fn directory_entry(username: &str, email: Option<&str>) -> DirectoryEntry {
    DirectoryEntry {
        username: username.to_string(),
        email: email.map(str::to_string),
        first_name: None,
        last_name: None,
    }
}

// ============================================================================
// Model builders
// ============================================================================

/// A resolved user matching [`RemoteUserBuilder`]'s defaults.
pub fn user(username: &str, provider: &str) -> User {
    User {
        id: None,
        username: username.to_string(),
        authentication_provider_name: provider.to_string(),
        email: format!("{}@example.com", username),
        first_name: username.to_string(),
        last_name: username.to_string(),
        active: true,
        locale_id: 1,
        allowed_ip_list: Default::default(),
        roles: Default::default(),
        cell_phone_number: None,
        country: None,
        expiration_date: None,
        job_title: None,
        other: None,
        phone_number: None,
    }
}

/// A team with the given members, each holding `roles` there.
pub fn team(full_name: &str, members: &[(&str, &str)], roles: &[&str]) -> Team {
    let mut team = Team::new(crate::model::last_segment(full_name), full_name);
    team.members = members
        .iter()
        .map(|(username, provider)| {
            Membership::new(*username, *provider).with_roles(roles.iter().copied())
        })
        .collect();
    team
}
