//! User models

use serde::{Deserialize, Serialize};

/// A user as listed by `GET Users`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteUser {
    pub id: u64,

    #[serde(rename = "userName")]
    pub username: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub active: bool,

    #[serde(default)]
    pub locale_id: u32,

    #[serde(default, rename = "allowedIps")]
    pub allowed_ip_list: Vec<String>,

    pub authentication_provider_id: u64,

    #[serde(default)]
    pub role_ids: Vec<u64>,

    /// Teams the user belongs to
    #[serde(default)]
    pub team_ids: Vec<u64>,

    /// Per-team roles. Servers that do not report these leave the list
    /// empty and membership falls back to `team_ids` with no roles.
    #[serde(default)]
    pub team_memberships: Vec<RemoteMembership>,

    #[serde(default)]
    pub cell_phone_number: Option<String>,

    #[serde(default)]
    pub country: Option<String>,

    #[serde(default)]
    pub expiration_date: Option<String>,

    #[serde(default)]
    pub job_title: Option<String>,

    #[serde(default)]
    pub other: Option<String>,

    #[serde(default)]
    pub phone_number: Option<String>,
}

impl RemoteUser {
    /// Memberships of this user, one per team.
    pub fn memberships(&self) -> Vec<RemoteMembership> {
        if !self.team_memberships.is_empty() {
            return self.team_memberships.clone();
        }
        self.team_ids
            .iter()
            .map(|&team_id| RemoteMembership {
                team_id,
                role_ids: Vec::new(),
            })
            .collect()
    }
}

/// Membership of a user in one team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMembership {
    pub team_id: u64,

    #[serde(default)]
    pub role_ids: Vec<u64>,
}

/// Body of `PUT Users/{id}`, also embedded in [`CreateUserRequest`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub active: bool,
    pub locale_id: u32,

    #[serde(rename = "allowedIps")]
    pub allowed_ip_list: Vec<String>,

    pub role_ids: Vec<u64>,
    pub team_ids: Vec<u64>,

    pub cell_phone_number: Option<String>,
    pub country: Option<String>,
    pub expiration_date: Option<String>,
    pub job_title: Option<String>,
    pub other: Option<String>,
    pub phone_number: Option<String>,
}

/// Body of `POST Users`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(rename = "userName")]
    pub username: String,

    /// Empty for externally authenticated users
    pub password: String,

    pub authentication_provider_id: u64,

    #[serde(flatten)]
    pub attributes: UpdateUserRequest,
}

/// Body of `PUT Teams/{tid}/Users/{uid}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRequest {
    pub role_ids: Vec<u64>,
}
