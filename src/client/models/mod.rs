//! Access Control API data models
//!
//! Wire types exchanged with the `/cxrestapi/auth` endpoints, organized by
//! resource type.

mod auth;
mod reference;
mod team;
mod user;

pub use auth::AccessToken;
pub use reference::{AuthenticationProvider, DirectoryEntry, LdapServer, Role};
pub use team::{CreateTeamRequest, RemoteTeam, UpdateTeamRequest};
#[cfg(test)]
pub use user::RemoteMembership;
pub use user::{CreateUserRequest, MembershipRequest, RemoteUser, UpdateUserRequest};
