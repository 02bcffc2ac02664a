//! Error types for cxmgmt

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for cxmgmt operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Every problem found while validating the data directory.
    #[error("Validation failed with {} problem(s)", .0.len())]
    Validation(Vec<ModelError>),

    /// One or more operations failed or were skipped during apply.
    #[error("{failed} operation(s) failed and {skipped} were skipped")]
    Apply { failed: usize, skipped: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Interactive prompt error: {0}")]
    Dialoguer(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Operation failed: {0}")]
    Other(String),
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        Error::Dialoguer(err.to_string())
    }
}

impl Error {
    /// Diagnostics collected alongside the error, if any.
    pub fn diagnostics(&self) -> &[ModelError] {
        match self {
            Error::Validation(problems) => problems,
            _ => &[],
        }
    }
}

/// Access Control API errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed. Check the username and password in your configuration.")]
    Unauthorized,

    #[error("Access denied. You don't have permission to access this resource.")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded. Retry after {0:?}")]
    RateLimit(Duration),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// A role, authentication provider or LDAP server name has no remote id.
    #[error("Unknown {kind}: {name}")]
    UnknownReference { kind: &'static str, name: String },
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Network("Failed to connect to Access Control".to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(
        "Access Control credentials not configured. Set username and password in the config file or CXMGMT_USERNAME/CXMGMT_PASSWORD."
    )]
    MissingCredentials,

    #[error("Access Control base URL not configured. Set base_url or CXMGMT_BASE_URL.")]
    MissingBaseUrl,
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Broad classes of model problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProblemCategory {
    /// A team or users file is malformed or lacks a mandatory field.
    InvalidFile,
    /// A user lacks a mandatory attribute after default resolution.
    MissingMandatoryAttribute,
    /// A dangling reference or duplicate identity.
    ReferentialViolation,
}

impl fmt::Display for ProblemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProblemCategory::InvalidFile => "invalid file",
            ProblemCategory::MissingMandatoryAttribute => "missing attribute",
            ProblemCategory::ReferentialViolation => "referential violation",
        };
        f.write_str(s)
    }
}

/// Problems found in the desired-state files.
///
/// Validation collects these rather than stopping at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("{}: invalid team file: {reason}", .path.display())]
    InvalidTeamFile { path: PathBuf, reason: String },

    #[error("{}: invalid users file: {reason}", .path.display())]
    InvalidUsersFile { path: PathBuf, reason: String },

    #[error("{}: user {username} has no value for {attribute}", .path.display())]
    MissingMandatoryAttribute {
        path: PathBuf,
        username: String,
        attribute: &'static str,
    },

    #[error("{}: team {full_name} is already defined in {}", .path.display(), .first.display())]
    DuplicateTeam {
        path: PathBuf,
        full_name: String,
        first: PathBuf,
    },

    #[error("{}: user {username} ({provider}) is defined more than once", .path.display())]
    DuplicateUser {
        path: PathBuf,
        username: String,
        provider: String,
    },

    #[error("{}: team {team} references {username} ({provider}) which is not in the users file", .path.display())]
    MissingUser {
        path: PathBuf,
        team: String,
        username: String,
        provider: String,
    },

    #[error("{}: user {username} ({provider}) does not belong to any team", .path.display())]
    NoTeam {
        path: PathBuf,
        username: String,
        provider: String,
    },

    #[error("{}: team {team} references {username} which cannot be found in {provider}", .path.display())]
    MissingDirectoryUser {
        path: PathBuf,
        team: String,
        username: String,
        provider: String,
    },

    #[error("{}: role {role} of {username} does not exist", .path.display())]
    InvalidRole {
        path: PathBuf,
        username: String,
        role: String,
    },

    #[error("{}: authentication provider {provider} of {username} does not exist", .path.display())]
    InvalidAuthenticationProvider {
        path: PathBuf,
        username: String,
        provider: String,
    },
}

impl ModelError {
    /// Classify the problem.
    pub fn category(&self) -> ProblemCategory {
        match self {
            ModelError::InvalidTeamFile { .. } | ModelError::InvalidUsersFile { .. } => {
                ProblemCategory::InvalidFile
            }
            ModelError::MissingMandatoryAttribute { .. } => {
                ProblemCategory::MissingMandatoryAttribute
            }
            _ => ProblemCategory::ReferentialViolation,
        }
    }

    /// File the problem was found in.
    pub fn path(&self) -> &std::path::Path {
        match self {
            ModelError::InvalidTeamFile { path, .. }
            | ModelError::InvalidUsersFile { path, .. }
            | ModelError::MissingMandatoryAttribute { path, .. }
            | ModelError::DuplicateTeam { path, .. }
            | ModelError::DuplicateUser { path, .. }
            | ModelError::MissingUser { path, .. }
            | ModelError::NoTeam { path, .. }
            | ModelError::MissingDirectoryUser { path, .. }
            | ModelError::InvalidRole { path, .. }
            | ModelError::InvalidAuthenticationProvider { path, .. } => path,
        }
    }
}
