//! Team and user model shared by the desired and actual state
//!
//! Teams live in an arena keyed by their normalized full path. Each team
//! caches the key of its parent, so top-down and bottom-up traversal is a
//! sort by depth rather than a pointer walk.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

pub mod defaults;

pub use defaults::{Defaults, UserProfile, resolve_user};

/// Normalize a team path for identity comparison.
pub fn team_key(full_name: &str) -> String {
    full_name.to_lowercase()
}

/// Full name of the parent of `full_name`, or `None` for a root team.
pub fn parent_full_name(full_name: &str) -> Option<String> {
    let trimmed = full_name.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => None,
        Some(idx) => Some(trimmed[..idx].to_string()),
    }
}

/// Last segment of a team path.
pub fn last_segment(full_name: &str) -> &str {
    full_name
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(full_name)
}

/// Whether the team with key `key` is `ancestor` or lies below it.
pub fn is_within(key: &str, ancestor: &str) -> bool {
    key == ancestor
        || (key.starts_with(ancestor) && key.as_bytes().get(ancestor.len()) == Some(&b'/'))
}

/// Number of segments in a team path (`/A` is 1, `/A/B` is 2).
pub fn depth(full_name: &str) -> usize {
    full_name.split('/').filter(|s| !s.is_empty()).count()
}

/// Identity of a user: username (case-insensitive) plus authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct UserKey {
    username: String,
    provider: String,
}

impl UserKey {
    pub fn new(username: &str, provider: &str) -> Self {
        Self {
            username: username.to_lowercase(),
            provider: provider.to_string(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.provider)
    }
}

/// A user's membership of a team, with the roles it holds there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Membership {
    pub username: String,
    pub authentication_provider_name: String,
    pub roles: BTreeSet<String>,
}

impl Membership {
    pub fn new(username: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            authentication_provider_name: provider.into(),
            roles: BTreeSet::new(),
        }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn key(&self) -> UserKey {
        UserKey::new(&self.username, &self.authentication_provider_name)
    }
}

/// An Access Control team.
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub name: String,
    pub full_name: String,
    /// Key of the parent team, `None` for the root.
    pub parent: Option<String>,
    /// Remote identifier, known only for teams read from the server.
    pub id: Option<u64>,
    pub defaults: Defaults,
    pub members: Vec<Membership>,
    /// File the team was read from.
    pub source: Option<PathBuf>,
}

impl Team {
    pub fn new(name: impl Into<String>, full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        Self {
            name: name.into(),
            parent: parent_full_name(&full_name).map(|p| team_key(&p)),
            full_name,
            id: None,
            defaults: Defaults::default(),
            members: Vec::new(),
            source: None,
        }
    }

    pub fn key(&self) -> String {
        team_key(&self.full_name)
    }

    pub fn depth(&self) -> usize {
        depth(&self.full_name)
    }

}

/// An Access Control user after default resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    #[serde(skip)]
    pub id: Option<u64>,
    pub username: String,
    pub authentication_provider_name: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub active: bool,
    pub locale_id: u32,
    pub allowed_ip_list: BTreeSet<String>,
    pub roles: BTreeSet<String>,
    pub cell_phone_number: Option<String>,
    pub country: Option<String>,
    pub expiration_date: Option<String>,
    pub job_title: Option<String>,
    pub other: Option<String>,
    pub phone_number: Option<String>,
}

impl User {
    pub fn key(&self) -> UserKey {
        UserKey::new(&self.username, &self.authentication_provider_name)
    }

    /// Names of the attributes whose values differ from `other`.
    ///
    /// Identity (username and provider) and the remote id are not compared.
    pub fn changed_attributes(&self, other: &User) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.email != other.email {
            changed.push("email");
        }
        if self.first_name != other.first_name {
            changed.push("first_name");
        }
        if self.last_name != other.last_name {
            changed.push("last_name");
        }
        if self.active != other.active {
            changed.push("active");
        }
        if self.locale_id != other.locale_id {
            changed.push("locale_id");
        }
        if self.allowed_ip_list != other.allowed_ip_list {
            changed.push("allowed_ip_list");
        }
        if self.roles != other.roles {
            changed.push("roles");
        }
        if self.cell_phone_number != other.cell_phone_number {
            changed.push("cell_phone_number");
        }
        if self.country != other.country {
            changed.push("country");
        }
        if self.expiration_date != other.expiration_date {
            changed.push("expiration_date");
        }
        if self.job_title != other.job_title {
            changed.push("job_title");
        }
        if self.other != other.other {
            changed.push("other");
        }
        if self.phone_number != other.phone_number {
            changed.push("phone_number");
        }
        changed
    }
}

/// A complete set of teams and users, either desired or actual.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    teams: BTreeMap<String, Team>,
    users: BTreeMap<UserKey, User>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a team, returning the team previously stored under the same path.
    pub fn insert_team(&mut self, team: Team) -> Option<Team> {
        self.teams.insert(team.key(), team)
    }

    /// Insert a user, returning the user previously stored under the same identity.
    pub fn insert_user(&mut self, user: User) -> Option<User> {
        self.users.insert(user.key(), user)
    }

    pub fn team(&self, full_name: &str) -> Option<&Team> {
        self.teams.get(&team_key(full_name))
    }

    pub fn team_mut(&mut self, full_name: &str) -> Option<&mut Team> {
        self.teams.get_mut(&team_key(full_name))
    }

    pub fn user(&self, key: &UserKey) -> Option<&User> {
        self.users.get(key)
    }

    pub fn contains_user(&self, key: &UserKey) -> bool {
        self.users.contains_key(key)
    }

    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        self.teams.values()
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    /// Teams ordered so that every parent precedes its children.
    pub fn teams_top_down(&self) -> Vec<&Team> {
        let mut teams: Vec<&Team> = self.teams.values().collect();
        teams.sort_by(|a, b| a.depth().cmp(&b.depth()).then_with(|| a.key().cmp(&b.key())));
        teams
    }

    /// Teams ordered so that every child precedes its parent.
    pub fn teams_bottom_up(&self) -> Vec<&Team> {
        let mut teams = self.teams_top_down();
        teams.reverse();
        teams
    }

    /// Every (team key, user key) membership in the tree.
    pub fn memberships(&self) -> BTreeMap<(String, UserKey), (&Team, &Membership)> {
        let mut map = BTreeMap::new();
        for team in self.teams.values() {
            for member in &team.members {
                map.insert((team.key(), member.key()), (team, member));
            }
        }
        map
    }

    /// Keys of the teams a user belongs to, in top-down order.
    pub fn teams_of(&self, key: &UserKey) -> Vec<&Team> {
        self.teams_top_down()
            .into_iter()
            .filter(|t| t.members.iter().any(|m| &m.key() == key))
            .collect()
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty() && self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_full_name() {
        assert_eq!(parent_full_name("/CxServer"), None);
        assert_eq!(parent_full_name("/CxServer/SP"), Some("/CxServer".to_string()));
        assert_eq!(
            parent_full_name("/CxServer/SP/Company/Users"),
            Some("/CxServer/SP/Company".to_string())
        );
    }

    #[test]
    fn test_last_segment_and_depth() {
        assert_eq!(last_segment("/CxServer/SP"), "SP");
        assert_eq!(last_segment("/CxServer"), "CxServer");
        assert_eq!(depth("/CxServer"), 1);
        assert_eq!(depth("/CxServer/SP/Company"), 3);
    }

    #[test]
    fn test_team_caches_parent_key() {
        let team = Team::new("Users", "/CxServer/SP/Users");
        assert_eq!(team.parent.as_deref(), Some("/cxserver/sp"));
        assert!(Team::new("CxServer", "/CxServer").parent.is_none());
    }

    #[test]
    fn test_is_within() {
        let key = Team::new("Users", "/CxServer/SP/Users").key();
        assert!(is_within(&key, "/cxserver"));
        assert!(is_within(&key, "/cxserver/sp"));
        assert!(is_within(&key, "/cxserver/sp/users"));
        assert!(!is_within("/cxserver/spx", "/cxserver/sp"));
        assert!(!is_within("/cxserver", "/cxserver/sp"));
    }

    #[test]
    fn test_user_key_ignores_username_case() {
        assert_eq!(
            UserKey::new("Admin", "Application"),
            UserKey::new("admin", "Application")
        );
        assert_ne!(
            UserKey::new("admin", "Application"),
            UserKey::new("admin", "CorpDirectory")
        );
    }

    #[test]
    fn test_top_down_orders_parents_first() {
        let mut tree = Tree::new();
        tree.insert_team(Team::new("Deep", "/A/B/Deep"));
        tree.insert_team(Team::new("A", "/A"));
        tree.insert_team(Team::new("B", "/A/B"));
        tree.insert_team(Team::new("A B", "/A B"));

        let order: Vec<&str> = tree
            .teams_top_down()
            .iter()
            .map(|t| t.full_name.as_str())
            .collect();
        assert_eq!(order, vec!["/A", "/A B", "/A/B", "/A/B/Deep"]);

        let reverse: Vec<&str> = tree
            .teams_bottom_up()
            .iter()
            .map(|t| t.full_name.as_str())
            .collect();
        assert_eq!(reverse.first(), Some(&"/A/B/Deep"));
        assert_eq!(reverse.last(), Some(&"/A"));
    }

    #[test]
    fn test_team_lookup_is_case_insensitive() {
        let mut tree = Tree::new();
        tree.insert_team(Team::new("SP", "/CxServer/SP"));
        assert!(tree.team("/cxserver/sp").is_some());
        assert!(tree.insert_team(Team::new("sp", "/CxServer/sp")).is_some());
    }
}
