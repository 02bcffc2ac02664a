//! Team models

use serde::{Deserialize, Serialize};

/// A team as listed by `GET Teams`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTeam {
    pub id: u64,

    pub name: String,

    /// Hierarchical path, e.g. `/CxServer/SP`
    pub full_name: String,

    /// Parent team id; zero or absent for the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,
}

/// Body of `POST Teams`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    pub name: String,
    pub parent_id: u64,
}

/// Body of `PUT Teams/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamRequest {
    pub name: String,
    pub parent_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_team_deserialize() {
        let json = r#"{"id": 5, "name": "SP", "fullName": "/CxServer/SP", "parentId": 1}"#;
        let team: RemoteTeam = serde_json::from_str(json).unwrap();
        assert_eq!(team.full_name, "/CxServer/SP");
        assert_eq!(team.parent_id, Some(1));
    }

    #[test]
    fn test_root_team_without_parent() {
        let json = r#"{"id": 1, "name": "CxServer", "fullName": "/CxServer"}"#;
        let team: RemoteTeam = serde_json::from_str(json).unwrap();
        assert!(team.parent_id.is_none());
    }
}
