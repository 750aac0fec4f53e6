//! JSON seed data for the in-memory store.

use crate::StorageResult;
use rmt_core::{Artifact, ArtifactId, DocumentMeta, Group, Project, StorageError, Trace, User};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Directory and artifact records loaded at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub traces: Vec<Trace>,
    #[serde(default)]
    pub documents: Vec<DocumentMeta>,
}

impl SeedData {
    /// Parse seed data from a JSON string.
    pub fn from_json(json: &str) -> StorageResult<Self> {
        serde_json::from_str(json).map_err(|e| StorageError::InvalidSeed {
            reason: e.to_string(),
        })
    }

    /// Read and parse a seed file.
    pub fn from_path(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| StorageError::InvalidSeed {
            reason: format!("{}: {}", path.display(), e),
        })?;
        let seed = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            users = seed.users.len(),
            projects = seed.projects.len(),
            artifacts = seed.artifacts.len(),
            "Loaded seed data"
        );
        Ok(seed)
    }

    /// Check referential integrity between the seeded records.
    ///
    /// Parents and requirement types must resolve within the artifact's own
    /// project, and both ends of a trace must live in the trace's project.
    pub fn validate(&self) -> StorageResult<()> {
        let users: HashSet<_> = self.users.iter().map(|u| u.user_id).collect();
        let groups: HashSet<_> = self.groups.iter().map(|g| g.group_id).collect();
        let artifacts: HashMap<ArtifactId, &Artifact> =
            self.artifacts.iter().map(|a| (a.id(), a)).collect();

        let mut names = HashSet::new();
        for user in &self.users {
            if !names.insert(user.name.as_str()) {
                return Err(invalid(format!("duplicate user name '{}'", user.name)));
            }
        }

        for group in &self.groups {
            if let Some(member) = group.users.iter().find(|m| !users.contains(&m.user_id)) {
                return Err(invalid(format!(
                    "group '{}' lists unknown user {}",
                    group.name, member.user_id
                )));
            }
        }

        for project in &self.projects {
            if !groups.contains(&project.group_id) {
                return Err(invalid(format!(
                    "project '{}' references unknown group {}",
                    project.name, project.group_id
                )));
            }
        }

        for artifact in &self.artifacts {
            let Some(project) = self
                .projects
                .iter()
                .find(|p| p.project_id == artifact.project_id())
            else {
                return Err(invalid(format!(
                    "artifact {} references unknown project {}",
                    artifact.id(),
                    artifact.project_id()
                )));
            };
            if !artifact.kind().belongs_to(project.project_type) {
                return Err(invalid(format!(
                    "{} artifact {} cannot live in {} project '{}'",
                    artifact.kind(),
                    artifact.id(),
                    project.project_type,
                    project.name
                )));
            }
            if let (Some(parent_id), Some(parent_kind)) =
                (artifact.parent_id(), artifact.kind().parent_kind())
            {
                let parent_ok = artifacts.get(&parent_id).is_some_and(|parent| {
                    parent.kind() == parent_kind && parent.project_id() == artifact.project_id()
                });
                if !parent_ok {
                    return Err(invalid(format!(
                        "artifact {} needs a {} parent in project '{}', got {}",
                        artifact.id(),
                        parent_kind,
                        project.name,
                        parent_id
                    )));
                }
            }
            if let Artifact::Requirement(requirement) = artifact {
                if let Some(type_id) = requirement.requirement_type_id {
                    if project.requirement_type(type_id).is_none() {
                        return Err(invalid(format!(
                            "requirement {} uses requirement type {} outside project '{}'",
                            artifact.id(),
                            type_id,
                            project.name
                        )));
                    }
                }
            }
        }

        for trace in &self.traces {
            let ends = (
                artifacts.get(&trace.source_id),
                artifacts.get(&trace.target_id),
            );
            let valid = match ends {
                (Some(source), Some(target)) => {
                    trace.source_id != trace.target_id
                        && source.project_id() == trace.project_id
                        && target.project_id() == trace.project_id
                }
                _ => false,
            };
            if !valid {
                return Err(invalid(format!(
                    "invalid trace {} <-> {} in project {}",
                    trace.source_id, trace.target_id, trace.project_id
                )));
            }
        }

        Ok(())
    }
}

fn invalid(reason: String) -> StorageError {
    StorageError::InvalidSeed { reason }
}
