//! YAML schema for team files and the users file

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{Defaults, Membership, UserProfile};

/// One team file.
///
/// `name` and `full_name` are mandatory; they are optional here so that a
/// missing one is reported as such instead of as a generic parse error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeamFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_active: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_allowed_ip_list: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_authentication_provider_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_locale_id: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_roles: Option<Vec<String>>,

    #[serde(default)]
    pub users: Vec<UserReference>,
}

impl TeamFile {
    /// The `default_*` values of this team.
    pub fn defaults(&self) -> Defaults {
        Defaults {
            active: self.default_active,
            allowed_ip_list: to_set(&self.default_allowed_ip_list),
            authentication_provider_name: self.default_authentication_provider_name.clone(),
            locale_id: self.default_locale_id,
            roles: to_set(&self.default_roles),
        }
    }
}

/// A reference from a team to a user, with the roles held in that team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserReference {
    pub username: String,
    pub authentication_provider_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

impl UserReference {
    /// Membership for this reference; roles fall back to the team's `default_roles`.
    pub fn membership(&self, team_default_roles: Option<&Vec<String>>) -> Membership {
        let roles = self.roles.as_ref().or(team_default_roles);
        Membership::new(&self.username, &self.authentication_provider_name)
            .with_roles(roles.into_iter().flatten().cloned())
    }
}

impl From<&Membership> for UserReference {
    fn from(m: &Membership) -> Self {
        Self {
            username: m.username.clone(),
            authentication_provider_name: m.authentication_provider_name.clone(),
            roles: if m.roles.is_empty() {
                None
            } else {
                Some(m.roles.iter().cloned().collect())
            },
        }
    }
}

/// The users file: every user plus file-level defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsersFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_active: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_allowed_ip_list: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_authentication_provider_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_locale_id: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_roles: Option<Vec<String>>,

    #[serde(default)]
    pub users: Vec<UserEntry>,
}

impl UsersFile {
    pub fn defaults(&self) -> Defaults {
        Defaults {
            active: self.default_active,
            allowed_ip_list: to_set(&self.default_allowed_ip_list),
            authentication_provider_name: self.default_authentication_provider_name.clone(),
            locale_id: self.default_locale_id,
            roles: to_set(&self.default_roles),
        }
    }

    /// Authentication provider of an entry, falling back to the file default.
    pub fn provider_of<'a>(&'a self, entry: &'a UserEntry) -> Option<&'a str> {
        entry
            .authentication_provider_name
            .as_deref()
            .or(self.default_authentication_provider_name.as_deref())
    }
}

/// One user in the users file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserEntry {
    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_provider_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_ip_list: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale_id: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_phone_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl UserEntry {
    /// Inheritable values set on the entry itself.
    pub fn own(&self) -> Defaults {
        Defaults {
            active: self.active,
            allowed_ip_list: to_set(&self.allowed_ip_list),
            authentication_provider_name: self.authentication_provider_name.clone(),
            locale_id: self.locale_id,
            roles: to_set(&self.roles),
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            cell_phone_number: self.cell_phone_number.clone(),
            country: self.country.clone(),
            expiration_date: self.expiration_date.clone(),
            job_title: self.job_title.clone(),
            other: self.other.clone(),
            phone_number: self.phone_number.clone(),
        }
    }
}

impl From<&crate::model::User> for UserEntry {
    fn from(user: &crate::model::User) -> Self {
        Self {
            username: user.username.clone(),
            email: Some(user.email.clone()),
            first_name: Some(user.first_name.clone()),
            last_name: Some(user.last_name.clone()),
            authentication_provider_name: Some(user.authentication_provider_name.clone()),
            active: Some(user.active),
            allowed_ip_list: from_set(&user.allowed_ip_list),
            locale_id: Some(user.locale_id),
            roles: from_set(&user.roles),
            cell_phone_number: user.cell_phone_number.clone(),
            country: user.country.clone(),
            expiration_date: user.expiration_date.clone(),
            job_title: user.job_title.clone(),
            other: user.other.clone(),
            phone_number: user.phone_number.clone(),
        }
    }
}

fn to_set(list: &Option<Vec<String>>) -> Option<BTreeSet<String>> {
    list.as_ref().map(|l| l.iter().cloned().collect())
}

fn from_set(set: &BTreeSet<String>) -> Option<Vec<String>> {
    if set.is_empty() {
        None
    } else {
        Some(set.iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_team_file() {
        let yaml = r#"
name: SP
full_name: /CxServer/SP
default_roles: [Scanner]
users:
  - username: alice
    authentication_provider_name: Application
  - username: bob
    authentication_provider_name: CorpDirectory
    roles: [Reviewer, Scanner]
"#;
        let team: TeamFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(team.full_name.as_deref(), Some("/CxServer/SP"));
        assert_eq!(team.users.len(), 2);

        let default_roles = team.default_roles.as_ref();
        let alice = team.users[0].membership(default_roles);
        assert_eq!(alice.roles.iter().collect::<Vec<_>>(), vec!["Scanner"]);
        let bob = team.users[1].membership(default_roles);
        assert_eq!(bob.roles.len(), 2);
    }

    #[test]
    fn test_team_file_rejects_unknown_fields() {
        let yaml = "name: SP\nfull_name: /CxServer/SP\ndefault_colour: blue\n";
        assert!(serde_yaml::from_str::<TeamFile>(yaml).is_err());
    }

    #[test]
    fn test_user_reference_requires_provider() {
        let yaml = "name: SP\nfull_name: /CxServer/SP\nusers:\n  - username: alice\n";
        assert!(serde_yaml::from_str::<TeamFile>(yaml).is_err());
    }

    #[test]
    fn test_parse_users_file_with_defaults() {
        let yaml = r#"
default_active: true
default_authentication_provider_name: Application
default_locale_id: 1
users:
  - username: admin
    email: admin@example.com
    first_name: Admin
    last_name: Admin
    roles: [SAST Admin]
"#;
        let users: UsersFile = serde_yaml::from_str(yaml).unwrap();
        let defaults = users.defaults();
        assert_eq!(defaults.active, Some(true));
        assert_eq!(defaults.locale_id, Some(1));
        assert_eq!(users.provider_of(&users.users[0]), Some("Application"));
        assert!(users.users[0].own().roles.unwrap().contains("SAST Admin"));
    }

    #[test]
    fn test_empty_optional_values_are_not_written() {
        let entry = UserEntry {
            username: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            ..UserEntry::default()
        };
        let yaml = serde_yaml::to_string(&entry).unwrap();
        assert!(yaml.contains("username: alice"));
        assert!(!yaml.contains("country"));
        assert!(!yaml.contains("roles"));
    }
}
