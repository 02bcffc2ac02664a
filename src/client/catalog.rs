//! Reference data lookups
//!
//! The files name roles and authentication providers; the server speaks in
//! ids. The catalog translates in both directions. Names compare exactly.

use log::debug;

use super::AccessControlApi;
use super::models::{AuthenticationProvider, LdapServer, Role};
use crate::error::{ApiError, Result};

/// Roles, authentication providers and LDAP servers known to the server.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    roles: Vec<Role>,
    providers: Vec<AuthenticationProvider>,
    ldap_servers: Vec<LdapServer>,
}

impl Catalog {
    pub fn new(
        roles: Vec<Role>,
        providers: Vec<AuthenticationProvider>,
        ldap_servers: Vec<LdapServer>,
    ) -> Self {
        Self {
            roles,
            providers,
            ldap_servers,
        }
    }

    /// Fetch all reference data from the server.
    pub async fn fetch(client: &dyn AccessControlApi) -> Result<Self> {
        let roles = client.list_roles().await?;
        let providers = client.list_authentication_providers().await?;
        let ldap_servers = client.list_ldap_servers().await?;
        debug!(
            "Catalog has {} role(s), {} provider(s), {} LDAP server(s)",
            roles.len(),
            providers.len(),
            ldap_servers.len()
        );
        Ok(Self::new(roles, providers, ldap_servers))
    }

    pub fn is_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.name == name)
    }

    pub fn is_provider(&self, name: &str) -> bool {
        self.providers.iter().any(|p| p.name == name)
    }

    pub fn role_id(&self, name: &str) -> Result<u64> {
        self.roles
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.id)
            .ok_or_else(|| unknown("role", name))
    }

    pub fn role_name(&self, id: u64) -> Result<&str> {
        self.roles
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.name.as_str())
            .ok_or_else(|| unknown("role id", &id.to_string()))
    }

    /// Ids of a set of role names, failing on the first unknown name.
    pub fn role_ids<'a, I>(&self, names: I) -> Result<Vec<u64>>
    where
        I: IntoIterator<Item = &'a String>,
    {
        names.into_iter().map(|n| self.role_id(n)).collect()
    }

    pub fn provider_id(&self, name: &str) -> Result<u64> {
        self.providers
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.id)
            .ok_or_else(|| unknown("authentication provider", name))
    }

    pub fn provider_name(&self, id: u64) -> Result<&str> {
        self.providers
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.as_str())
            .ok_or_else(|| unknown("authentication provider id", &id.to_string()))
    }

    /// Id of the LDAP server backing an authentication provider.
    ///
    /// LDAP providers share their name with the server they use.
    pub fn ldap_server_id(&self, provider_name: &str) -> Result<u64> {
        self.ldap_servers
            .iter()
            .find(|s| s.name == provider_name)
            .map(|s| s.id)
            .ok_or_else(|| unknown("LDAP server", provider_name))
    }
}

fn unknown(kind: &'static str, name: &str) -> crate::error::Error {
    ApiError::UnknownReference {
        kind,
        name: name.to_string(),
    }
    .into()
}
