//! Default resolution for inheritable user attributes
//!
//! A user's effective `active`, `allowed_ip_list`,
//! `authentication_provider_name`, `locale_id` and `roles` come from the
//! first layer that sets them: the user entry itself, then the teams that
//! reference the user (top-down), then the users file defaults.

use std::collections::BTreeSet;

use super::User;

/// One layer of inheritable values.
///
/// Used both for a user's own values and for `default_*` fields of a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Defaults {
    pub active: Option<bool>,
    pub allowed_ip_list: Option<BTreeSet<String>>,
    pub authentication_provider_name: Option<String>,
    pub locale_id: Option<u32>,
    pub roles: Option<BTreeSet<String>>,
}

impl Defaults {
    /// Fill each unset value of `self` from `scope`.
    pub fn or(mut self, scope: &Defaults) -> Self {
        if self.active.is_none() {
            self.active = scope.active;
        }
        if self.allowed_ip_list.is_none() {
            self.allowed_ip_list = scope.allowed_ip_list.clone();
        }
        if self.authentication_provider_name.is_none() {
            self.authentication_provider_name = scope.authentication_provider_name.clone();
        }
        if self.locale_id.is_none() {
            self.locale_id = scope.locale_id;
        }
        if self.roles.is_none() {
            self.roles = scope.roles.clone();
        }
        self
    }

    /// Merge layers, nearest first.
    pub fn layered<'a, I>(own: &Defaults, scopes: I) -> Defaults
    where
        I: IntoIterator<Item = &'a Defaults>,
    {
        scopes
            .into_iter()
            .fold(own.clone(), |resolved, scope| resolved.or(scope))
    }
}

/// Non-inheritable user attributes as read from a file or a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub cell_phone_number: Option<String>,
    pub country: Option<String>,
    pub expiration_date: Option<String>,
    pub job_title: Option<String>,
    pub other: Option<String>,
    pub phone_number: Option<String>,
}

/// Mandatory attributes still unset after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingAttributes {
    pub username: String,
    pub attributes: Vec<&'static str>,
}

/// Resolve a user from its profile, its own values and the enclosing scopes.
///
/// Scopes are given nearest first. The result is a fully populated [`User`],
/// or the list of mandatory attributes that no layer provides.
pub fn resolve_user<'a, I>(
    profile: &UserProfile,
    own: &Defaults,
    scopes: I,
) -> Result<User, MissingAttributes>
where
    I: IntoIterator<Item = &'a Defaults>,
{
    let resolved = Defaults::layered(own, scopes);

    let mut missing = Vec::new();
    if profile.email.is_none() {
        missing.push("email");
    }
    if profile.first_name.is_none() {
        missing.push("first_name");
    }
    if profile.last_name.is_none() {
        missing.push("last_name");
    }
    if resolved.authentication_provider_name.is_none() {
        missing.push("authentication_provider_name");
    }
    if resolved.active.is_none() {
        missing.push("active");
    }
    if resolved.locale_id.is_none() {
        missing.push("locale_id");
    }

    match (
        &profile.email,
        &profile.first_name,
        &profile.last_name,
        resolved.authentication_provider_name,
        resolved.active,
        resolved.locale_id,
    ) {
        (Some(email), Some(first), Some(last), Some(provider), Some(active), Some(locale_id)) => {
            Ok(User {
                id: None,
                username: profile.username.clone(),
                authentication_provider_name: provider,
                email: email.clone(),
                first_name: first.clone(),
                last_name: last.clone(),
                active,
                locale_id,
                allowed_ip_list: resolved.allowed_ip_list.unwrap_or_default(),
                roles: resolved.roles.unwrap_or_default(),
                cell_phone_number: profile.cell_phone_number.clone(),
                country: profile.country.clone(),
                expiration_date: profile.expiration_date.clone(),
                job_title: profile.job_title.clone(),
                other: profile.other.clone(),
                phone_number: profile.phone_number.clone(),
            })
        }
        _ => Err(MissingAttributes {
            username: profile.username.clone(),
            attributes: missing,
        }),
    }
}
