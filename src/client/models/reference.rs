//! Reference data: roles, authentication providers and LDAP servers

use serde::{Deserialize, Serialize};

/// Access Control role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: u64,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Authentication provider (Application, Windows domain, LDAP, SAML...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationProvider {
    pub id: u64,
    pub name: String,

    /// Provider kind, e.g. `Application` or `LDAP`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<String>,

    /// Id of the backing server for external providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<u64>,
}

/// Configured LDAP server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LdapServer {
    pub id: u64,
    pub name: String,
}

/// A user entry found in a directory search.
///
/// Any attribute other than the username may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub username: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,
}
