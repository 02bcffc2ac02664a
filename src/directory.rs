//! Directory lookup for users referenced by teams but missing from the users file
//!
//! When a team lists a user the users file does not know, the user can be
//! looked up in the directory behind its authentication provider and a
//! users file entry synthesized from what the directory returns.

use std::collections::HashSet;

use async_trait::async_trait;
use log::{debug, info, warn};

use crate::client::models::DirectoryEntry;
use crate::client::{AccessControlApi, Catalog};
use crate::error::{ModelError, Result};
use crate::model::UserKey;
use crate::store::{UserEntry, Workspace};

/// Source of directory entries.
#[async_trait]
pub trait DirectoryLookup: Send + Sync {
    /// Find `username` (case-insensitive) in the directory of `provider_name`.
    async fn lookup_user(&self, provider_name: &str, username: &str)
    -> Result<Option<DirectoryEntry>>;
}

/// Looks users up through the Access Control LDAP user-entry search.
pub struct AccessControlDirectory<'a> {
    client: &'a dyn AccessControlApi,
    catalog: &'a Catalog,
}

impl<'a> AccessControlDirectory<'a> {
    pub fn new(client: &'a dyn AccessControlApi, catalog: &'a Catalog) -> Self {
        Self { client, catalog }
    }
}

#[async_trait]
impl DirectoryLookup for AccessControlDirectory<'_> {
    async fn lookup_user(
        &self,
        provider_name: &str,
        username: &str,
    ) -> Result<Option<DirectoryEntry>> {
        let Ok(server_id) = self.catalog.ldap_server_id(provider_name) else {
            debug!("{} has no LDAP server to search", provider_name);
            return Ok(None);
        };
        debug!("Searching {} for {}", provider_name, username);
        let entries = self
            .client
            .search_ldap_user_entries(server_id, username)
            .await?;
        Ok(entries
            .into_iter()
            .find(|e| e.username.eq_ignore_ascii_case(username)))
    }
}

/// Build a users file entry from a directory entry.
///
/// Missing attributes fall back to `<username>@<provider>` for the email
/// and to the username for both names. `active` and `locale_id` are left
/// unset; they may only come from the users file defaults.
pub fn synthesize(
    username: &str,
    provider_name: &str,
    entry: &DirectoryEntry,
    default_provider: Option<&str>,
) -> UserEntry {
    UserEntry {
        username: username.to_string(),
        email: Some(
            entry
                .email
                .clone()
                .unwrap_or_else(|| format!("{}@{}", username, provider_name)),
        ),
        first_name: Some(
            entry
                .first_name
                .clone()
                .unwrap_or_else(|| username.to_string()),
        ),
        last_name: Some(
            entry
                .last_name
                .clone()
                .unwrap_or_else(|| username.to_string()),
        ),
        authentication_provider_name: if default_provider == Some(provider_name) {
            None
        } else {
            Some(provider_name.to_string())
        },
        ..UserEntry::default()
    }
}

/// Outcome of [`enrich`].
#[derive(Debug, Default)]
pub struct Enrichment {
    /// Users appended to the users file
    pub added: Vec<UserKey>,
    /// References the directory could not resolve
    pub problems: Vec<ModelError>,
}

/// Resolve every unmatched team reference against the directory.
///
/// Found users are appended to `ws.users` and remembered in
/// `ws.synthesized`; the caller decides whether to save. Each unmatched
/// user is looked up once even if several teams reference it.
pub async fn enrich(ws: &mut Workspace, lookup: &dyn DirectoryLookup) -> Result<Enrichment> {
    let mut enrichment = Enrichment::default();
    let mut attempted: HashSet<UserKey> = HashSet::new();

    let missing: Vec<(std::path::PathBuf, String, String, String)> =
        crate::reconcile::validate::unmatched_references(ws)
            .into_iter()
            .map(|(team, reference)| {
                (
                    team.path.clone(),
                    team.full_name.clone(),
                    reference.username.clone(),
                    reference.authentication_provider_name.clone(),
                )
            })
            .collect();

    for (path, team, username, provider) in missing {
        let key = UserKey::new(&username, &provider);
        if !attempted.insert(key.clone()) {
            continue;
        }

        match lookup.lookup_user(&provider, &username).await? {
            Some(entry) => {
                info!("Adding {} from {} to the users file", username, provider);
                let default_provider = ws.users.default_authentication_provider_name.clone();
                ws.users.users.push(synthesize(
                    &username,
                    &provider,
                    &entry,
                    default_provider.as_deref(),
                ));
                ws.synthesized.insert(key.clone());
                enrichment.added.push(key);
            }
            None => {
                warn!("Cannot find {} in {}", username, provider);
                enrichment.problems.push(ModelError::MissingDirectoryUser {
                    path,
                    team,
                    username,
                    provider,
                });
            }
        }
    }

    Ok(enrichment)
}
