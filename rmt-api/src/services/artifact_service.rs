//! Artifact Service
//!
//! Create, read, update and delete for the five artifact kinds. Every lookup
//! is scoped to a project: an artifact of another project, of another kind
//! or under another parent is reported as not found.

use rmt_core::{
    Artifact, ArtifactHeader, ArtifactId, ArtifactKind, DocumentMeta, Epic, Feature, Project,
    ProjectId, Requirement, UseCase, User, UserStory,
};
use rmt_storage::{ArtifactStore, DocumentStore, Storage};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::services::load_in_project;
use crate::validation::{ArtifactDraft, DraftBody};

#[derive(Clone)]
pub struct ArtifactService {
    store: Arc<dyn Storage>,
}

impl std::fmt::Debug for ArtifactService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactService").finish_non_exhaustive()
    }
}

impl ArtifactService {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    // ========================================================================
    // GENERIC OPERATIONS
    // ========================================================================

    /// Artifact `id` of `kind` in the project.
    pub async fn get(
        &self,
        project_id: ProjectId,
        kind: ArtifactKind,
        id: ArtifactId,
    ) -> ApiResult<Artifact> {
        let artifact = load_in_project(self.store.as_ref(), project_id, id).await?;
        if artifact.kind() != kind {
            return Err(ApiError::artifact_not_found(id));
        }
        Ok(artifact)
    }

    /// Artifact `id` of `kind` that must sit under `parent_id`.
    pub async fn get_child(
        &self,
        project_id: ProjectId,
        kind: ArtifactKind,
        parent_id: ArtifactId,
        id: ArtifactId,
    ) -> ApiResult<Artifact> {
        let artifact = self.get(project_id, kind, id).await?;
        if artifact.parent_id() != Some(parent_id) {
            return Err(ApiError::artifact_not_found(id));
        }
        Ok(artifact)
    }

    /// All artifacts of `kind` in the project, oldest first.
    pub async fn list(&self, project_id: ProjectId, kind: ArtifactKind) -> ApiResult<Vec<Artifact>> {
        Ok(self.store.artifact_list(project_id, kind).await?)
    }

    /// Children of `parent_id`, oldest first.
    pub async fn list_children(&self, parent_id: ArtifactId) -> ApiResult<Vec<Artifact>> {
        Ok(self.store.artifact_list_children(parent_id).await?)
    }

    /// Persist a validated draft as a new artifact authored by `author`.
    ///
    /// User stories and use cases need `parent`, an epic or feature of the
    /// same project.
    pub async fn create(
        &self,
        project: &Project,
        author: &User,
        draft: ArtifactDraft,
        parent: Option<ArtifactId>,
    ) -> ApiResult<Artifact> {
        let kind = draft.kind();
        let parent = self.check_parent(project, kind, parent).await?;

        let mut header = ArtifactHeader::new(project.project_id, author.user_id, "");
        draft.header.apply_to(&mut header);
        let artifact = build(header, draft.body, parent)?;

        self.store.artifact_insert(&artifact).await?;
        tracing::info!(
            project_id = %project.project_id,
            artifact_id = %artifact.id(),
            kind = %kind,
            "Artifact created"
        );
        Ok(artifact)
    }

    /// Apply a validated draft to artifact `id`, keeping its identity,
    /// author, parent and creation time.
    pub async fn update(
        &self,
        project: &Project,
        id: ArtifactId,
        draft: ArtifactDraft,
        parent: Option<ArtifactId>,
    ) -> ApiResult<Artifact> {
        let kind = draft.kind();
        let existing = match parent {
            Some(parent_id) => self.get_child(project.project_id, kind, parent_id, id).await?,
            None => self.get(project.project_id, kind, id).await?,
        };

        let mut header = existing.header().clone();
        draft.header.apply_to(&mut header);
        header.touch();
        let updated = build(header, draft.body, existing.parent_id())?;

        self.store.artifact_update(&updated).await?;
        tracing::info!(
            project_id = %project.project_id,
            artifact_id = %id,
            kind = %kind,
            "Artifact updated"
        );
        Ok(updated)
    }

    /// Delete artifact `id` with its children, links, comments and document
    /// metadata. Returns false when there was nothing to delete.
    pub async fn delete(
        &self,
        project_id: ProjectId,
        kind: ArtifactKind,
        id: ArtifactId,
    ) -> ApiResult<bool> {
        match self.get(project_id, kind, id).await {
            Ok(_) => {}
            Err(e) if e.code == ErrorCode::ArtifactNotFound => return Ok(false),
            Err(e) => return Err(e),
        }

        match self.store.artifact_delete(id).await? {
            Some(report) => {
                tracing::info!(
                    %project_id,
                    artifact_id = %id,
                    kind = %kind,
                    artifacts = report.artifacts.len(),
                    traces = report.traces,
                    comments = report.comments,
                    documents = report.documents,
                    "Artifact deleted"
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Attachment metadata of an artifact.
    pub async fn get_file_list(
        &self,
        project_id: ProjectId,
        id: ArtifactId,
    ) -> ApiResult<Vec<DocumentMeta>> {
        Ok(self.store.get_file_list(project_id, id).await?)
    }

    async fn check_parent(
        &self,
        project: &Project,
        kind: ArtifactKind,
        parent: Option<ArtifactId>,
    ) -> ApiResult<Option<ArtifactId>> {
        match (kind.parent_kind(), parent) {
            (None, _) => Ok(None),
            (Some(parent_kind), Some(parent_id)) => {
                self.get(project.project_id, parent_kind, parent_id).await?;
                Ok(Some(parent_id))
            }
            (Some(parent_kind), None) => Err(ApiError::missing_field(&format!(
                "{}Id",
                parent_kind.print_segment()
            ))),
        }
    }
}

/// Assemble an artifact from a header and a validated body.
fn build(header: ArtifactHeader, body: DraftBody, parent: Option<ArtifactId>) -> ApiResult<Artifact> {
    let missing_parent = |kind: ArtifactKind| {
        ApiError::internal_error(format!("{} without a parent", kind))
    };

    Ok(match body {
        DraftBody::Requirement {
            requirement_type_id,
            source,
        } => Artifact::Requirement(Requirement {
            header,
            requirement_type_id,
            source,
        }),
        DraftBody::Feature => Artifact::Feature(Feature { header }),
        DraftBody::Epic => Artifact::Epic(Epic { header }),
        DraftBody::UserStory {
            acceptance_criteria,
        } => Artifact::UserStory(UserStory {
            header,
            epic_id: parent.ok_or_else(|| missing_parent(ArtifactKind::UserStory))?,
            acceptance_criteria,
        }),
        DraftBody::UseCase {
            actors,
            preconditions,
            flow,
            postconditions,
        } => Artifact::UseCase(UseCase {
            header,
            feature_id: parent.ok_or_else(|| missing_parent(ArtifactKind::UseCase))?,
            actors,
            preconditions,
            flow,
            postconditions,
        }),
    })
}
