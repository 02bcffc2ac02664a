//! Data directory layout
//!
//! ```text
//! <data_dir>/
//!   teams/
//!     CxServer.yml
//!     CxServer/
//!       SP.yml
//!       SP/
//!         Company.yml
//!   users/
//!     users.yml
//! ```
//!
//! A team's path is implied by where its file sits below `teams/`, and must
//! agree with the `full_name` declared inside the file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use crate::error::{ModelError, Result};
use crate::model::{Tree, UserKey, last_segment};

pub mod files;

pub use files::{TeamFile, UserEntry, UserReference, UsersFile};

pub const TEAMS_DIR: &str = "teams";
pub const USERS_DIR: &str = "users";
pub const USERS_FILE: &str = "users.yml";

/// A team file that passed structural checks.
#[derive(Debug, Clone)]
pub struct LoadedTeam {
    pub path: PathBuf,
    pub name: String,
    pub full_name: String,
    pub file: TeamFile,
}

/// Everything read from a data directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub teams: Vec<LoadedTeam>,
    pub users_path: PathBuf,
    pub users: UsersFile,
    /// Users file entries added from the directory during this run
    pub synthesized: HashSet<UserKey>,
}

impl Workspace {
    /// Persist the users file, e.g. after directory enrichment.
    pub fn save_users(&self) -> Result<()> {
        write_users_file(&self.users_path, &self.users)
    }
}

/// Path of the users file below `root`.
pub fn users_file_path(root: &Path) -> PathBuf {
    root.join(USERS_DIR).join(USERS_FILE)
}

/// Read every team file and the users file below `root`.
///
/// A bad file does not stop the scan; all file problems are returned together.
pub fn read_workspace(root: &Path) -> std::result::Result<Workspace, Vec<ModelError>> {
    info!("Loading data directory {}", root.display());
    let mut problems = Vec::new();

    let teams = match read_team_dir(&root.join(TEAMS_DIR)) {
        Ok((teams, errors)) => {
            problems.extend(errors);
            teams
        }
        Err(e) => {
            problems.push(e);
            Vec::new()
        }
    };

    let users_path = users_file_path(root);
    let users = match read_users_file(&users_path) {
        Ok(users) => users,
        Err(e) => {
            problems.push(e);
            UsersFile::default()
        }
    };

    if problems.is_empty() {
        debug!(
            "Loaded {} team file(s) and {} user(s)",
            teams.len(),
            users.users.len()
        );
        Ok(Workspace {
            teams,
            users_path,
            users,
            synthesized: HashSet::new(),
        })
    } else {
        Err(problems)
    }
}

/// Read all `.yml`/`.yaml` files below the teams directory.
///
/// Returns the teams that loaded and a problem for every file that did not.
pub fn read_team_dir(
    teams_dir: &Path,
) -> std::result::Result<(Vec<LoadedTeam>, Vec<ModelError>), ModelError> {
    if !teams_dir.is_dir() {
        return Err(ModelError::InvalidTeamFile {
            path: teams_dir.to_path_buf(),
            reason: "teams directory not found".to_string(),
        });
    }

    let mut teams = Vec::new();
    let mut problems = Vec::new();

    for entry in WalkDir::new(teams_dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                problems.push(ModelError::InvalidTeamFile {
                    path: e.path().map(Path::to_path_buf).unwrap_or_default(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !is_yaml(path) {
            debug!("Skipping {} as its suffix is not recognised", path.display());
            continue;
        }
        match read_team_file(teams_dir, path) {
            Ok(team) => teams.push(team),
            Err(e) => {
                debug!("Could not load team from {}: {}", path.display(), e);
                problems.push(e);
            }
        }
    }

    Ok((teams, problems))
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yml") || e.eq_ignore_ascii_case("yaml"))
        .unwrap_or(false)
}

/// Read and check one team file.
pub fn read_team_file(teams_dir: &Path, path: &Path) -> std::result::Result<LoadedTeam, ModelError> {
    let invalid = |reason: String| ModelError::InvalidTeamFile {
        path: path.to_path_buf(),
        reason,
    };

    debug!("Loading team from {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let file: TeamFile = serde_yaml::from_str(&contents).map_err(|e| invalid(e.to_string()))?;

    let full_name = file
        .full_name
        .clone()
        .ok_or_else(|| invalid("\"full_name\" property is mandatory".to_string()))?;
    let name = file
        .name
        .clone()
        .ok_or_else(|| invalid("\"name\" property is mandatory".to_string()))?;

    if !full_name.starts_with('/') || full_name.len() < 2 {
        return Err(invalid(format!(
            "full name ({}) must start with '/' and name a team",
            full_name
        )));
    }
    if last_segment(&full_name) != name {
        return Err(invalid(format!(
            "last component of team full name ({}) does not match team name ({})",
            full_name, name
        )));
    }

    let computed = computed_full_name(teams_dir, path)
        .ok_or_else(|| invalid("file is not below the teams directory".to_string()))?;
    if computed != file_safe(&full_name) {
        return Err(invalid(format!(
            "file location implies team {} but full_name is {}",
            computed, full_name
        )));
    }

    Ok(LoadedTeam {
        path: path.to_path_buf(),
        name,
        full_name,
        file,
    })
}

/// Team path implied by a file's location below the teams directory.
fn computed_full_name(teams_dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(teams_dir).ok()?.with_extension("");
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if segments.is_empty() {
        return None;
    }
    Some(format!("/{}", segments.join("/")))
}

/// Replace runs of whitespace with `-` so a full name can be used as a path.
pub fn file_safe(full_name: &str) -> String {
    let mut out = String::with_capacity(full_name.len());
    let mut in_space = false;
    for c in full_name.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Where the file for `full_name` lives below the teams directory.
pub fn team_file_path(teams_dir: &Path, full_name: &str) -> PathBuf {
    let safe = file_safe(full_name);
    let mut path = teams_dir.to_path_buf();
    for segment in safe.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path.set_extension("yml");
    path
}

/// Read the users file.
pub fn read_users_file(path: &Path) -> std::result::Result<UsersFile, ModelError> {
    let invalid = |reason: String| ModelError::InvalidUsersFile {
        path: path.to_path_buf(),
        reason,
    };

    if !path.is_file() {
        return Err(invalid("file not found".to_string()));
    }
    let contents = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    serde_yaml::from_str(&contents).map_err(|e| invalid(e.to_string()))
}

/// Write the users file, creating its directory if needed.
pub fn write_users_file(path: &Path, users: &UsersFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_yaml::to_string(users)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Write one team file at the location implied by its full name.
pub fn write_team_file(teams_dir: &Path, team: &TeamFile) -> Result<PathBuf> {
    let full_name = team.full_name.as_deref().unwrap_or_default();
    let path = team_file_path(teams_dir, full_name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    debug!("Saving team {} to {}", full_name, path.display());
    std::fs::write(&path, serde_yaml::to_string(team)?)?;
    Ok(path)
}

/// Write a tree as a data directory below `root`.
///
/// Users are sorted by identity and written with every attribute explicit.
pub fn write_tree(root: &Path, tree: &Tree) -> Result<()> {
    let teams_dir = root.join(TEAMS_DIR);
    std::fs::create_dir_all(&teams_dir)?;

    for team in tree.teams_top_down() {
        let mut members: Vec<UserReference> = team.members.iter().map(UserReference::from).collect();
        members.sort_by(|a, b| {
            a.username
                .to_lowercase()
                .cmp(&b.username.to_lowercase())
                .then_with(|| a.authentication_provider_name.cmp(&b.authentication_provider_name))
        });
        let file = TeamFile {
            name: Some(team.name.clone()),
            full_name: Some(team.full_name.clone()),
            users: members,
            ..TeamFile::default()
        };
        let path = write_team_file(&teams_dir, &file)?;
        info!("Saved team {} to {}", team.full_name, path.display());
    }

    let users = UsersFile {
        users: tree.users().map(UserEntry::from).collect(),
        ..UsersFile::default()
    };
    let users_path = users_file_path(root);
    write_users_file(&users_path, &users)?;
    info!("Saved {} user(s) to {}", users.users.len(), users_path.display());

    Ok(())
}
