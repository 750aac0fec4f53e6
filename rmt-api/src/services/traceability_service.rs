//! Traceability Service
//!
//! Maintains undirected "traced-to" links between artifacts of one project
//! and answers the "not yet traced" queries behind the link pickers.

use rmt_core::{
    Artifact, ArtifactId, ArtifactKind, ArtifactSummary, Project, ProjectId, ProjectType, Trace,
    TraceError, User,
};
use rmt_storage::{ArtifactStore, Storage, TraceInsert, TraceStore};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::services::load_in_project;

// ============================================================================
// RESULT TYPES
// ============================================================================

/// Links touching an anchor plus the artifacts at their far ends, by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Traceability {
    pub anchor_id: Option<ArtifactId>,
    pub traces: Vec<Trace>,
    pub requirements: Vec<ArtifactSummary>,
    pub features: Vec<ArtifactSummary>,
    pub epics: Vec<ArtifactSummary>,
    pub user_stories: Vec<ArtifactSummary>,
    pub use_cases: Vec<ArtifactSummary>,
}

impl Traceability {
    fn bucket_mut(&mut self, kind: ArtifactKind) -> &mut Vec<ArtifactSummary> {
        match kind {
            ArtifactKind::Requirement => &mut self.requirements,
            ArtifactKind::Feature => &mut self.features,
            ArtifactKind::Epic => &mut self.epics,
            ArtifactKind::UserStory => &mut self.user_stories,
            ArtifactKind::UseCase => &mut self.use_cases,
        }
    }
}

/// Link candidates offered for an anchor; the pair depends on the process type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NotTracedCandidates {
    #[serde(rename_all = "camelCase")]
    Agile {
        epic_list: Vec<Artifact>,
        user_story_list: Vec<Artifact>,
    },
    #[serde(rename_all = "camelCase")]
    Traditional {
        feature_list: Vec<Artifact>,
        use_case_list: Vec<Artifact>,
    },
}

/// Result of a link request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Created,
    AlreadyLinked,
}

// ============================================================================
// SERVICE
// ============================================================================

#[derive(Clone)]
pub struct TraceabilityService {
    store: Arc<dyn Storage>,
}

impl std::fmt::Debug for TraceabilityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceabilityService").finish_non_exhaustive()
    }
}

impl TraceabilityService {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Every link with `anchor` as an endpoint. Links whose far end no
    /// longer exists, or lives outside the anchor's project, are left out.
    pub async fn get_traceability(&self, anchor: ArtifactId) -> ApiResult<Traceability> {
        let mut traceability = Traceability {
            anchor_id: Some(anchor),
            ..Traceability::default()
        };
        let Some(anchor_project) = self.store.artifact_get(anchor).await?.map(|a| a.project_id())
        else {
            return Ok(traceability);
        };

        for trace in self.store.trace_list_for(anchor).await? {
            let Some(other) = trace.other_end(anchor) else {
                continue;
            };
            match self.store.artifact_get(other).await? {
                Some(artifact) if artifact.project_id() == anchor_project => {
                    traceability.bucket_mut(artifact.kind()).push(artifact.summary());
                    traceability.traces.push(trace);
                }
                Some(_) => {
                    tracing::warn!(%anchor, %other, "Skipping link into another project");
                }
                None => {
                    tracing::debug!(%anchor, %other, "Skipping link to missing artifact");
                }
            }
        }

        Ok(traceability)
    }

    /// Artifacts of `kind` in the project, minus the anchor and anything
    /// already linked to it.
    async fn not_traced(
        &self,
        project_id: ProjectId,
        anchor: ArtifactId,
        kind: ArtifactKind,
    ) -> ApiResult<Vec<Artifact>> {
        let linked: HashSet<ArtifactId> = self
            .store
            .trace_list_for(anchor)
            .await?
            .iter()
            .filter_map(|t| t.other_end(anchor))
            .collect();

        let mut candidates = self.store.artifact_list(project_id, kind).await?;
        candidates.retain(|a| a.id() != anchor && !linked.contains(&a.id()));
        Ok(candidates)
    }

    pub async fn get_not_traced_reqs(
        &self,
        project_id: ProjectId,
        anchor: ArtifactId,
    ) -> ApiResult<Vec<Artifact>> {
        self.not_traced(project_id, anchor, ArtifactKind::Requirement)
            .await
    }

    pub async fn get_not_traced_epics(
        &self,
        project_id: ProjectId,
        anchor: ArtifactId,
    ) -> ApiResult<Vec<Artifact>> {
        self.not_traced(project_id, anchor, ArtifactKind::Epic).await
    }

    pub async fn get_not_traced_user_stories(
        &self,
        project_id: ProjectId,
        anchor: ArtifactId,
    ) -> ApiResult<Vec<Artifact>> {
        self.not_traced(project_id, anchor, ArtifactKind::UserStory)
            .await
    }

    pub async fn get_not_traced_features(
        &self,
        project_id: ProjectId,
        anchor: ArtifactId,
    ) -> ApiResult<Vec<Artifact>> {
        self.not_traced(project_id, anchor, ArtifactKind::Feature)
            .await
    }

    pub async fn get_not_traced_use_cases(
        &self,
        project_id: ProjectId,
        anchor: ArtifactId,
    ) -> ApiResult<Vec<Artifact>> {
        self.not_traced(project_id, anchor, ArtifactKind::UseCase)
            .await
    }

    /// Candidates for the non-requirement pickers, chosen by process type.
    pub async fn not_traced_candidates(
        &self,
        project: &Project,
        anchor: ArtifactId,
    ) -> ApiResult<NotTracedCandidates> {
        let project_id = project.project_id;
        Ok(match project.project_type {
            ProjectType::Agile => NotTracedCandidates::Agile {
                epic_list: self.get_not_traced_epics(project_id, anchor).await?,
                user_story_list: self.get_not_traced_user_stories(project_id, anchor).await?,
            },
            ProjectType::Traditional => NotTracedCandidates::Traditional {
                feature_list: self.get_not_traced_features(project_id, anchor).await?,
                use_case_list: self.get_not_traced_use_cases(project_id, anchor).await?,
            },
        })
    }

    /// Link `source` and `target`.
    ///
    /// The source must belong to `project` (otherwise not found). Self-links,
    /// targets from another project and kinds outside the project's process
    /// type are validation failures. An existing link is left untouched.
    pub async fn link(
        &self,
        project: &Project,
        source: ArtifactId,
        target: ArtifactId,
        actor: &User,
    ) -> ApiResult<LinkOutcome> {
        if source == target {
            return Err(TraceError::SelfLink { id: source }.into());
        }

        let source_artifact = load_in_project(self.store.as_ref(), project.project_id, source).await?;
        let target_artifact = self
            .store
            .artifact_get(target)
            .await?
            .ok_or_else(|| ApiError::artifact_not_found(target))?;

        if target_artifact.project_id() != source_artifact.project_id() {
            return Err(TraceError::CrossProject {
                source_id: source,
                target_id: target,
            }
            .into());
        }

        for artifact in [&source_artifact, &target_artifact] {
            if !artifact.kind().belongs_to(project.project_type) {
                return Err(TraceError::KindNotInProcess {
                    kind: artifact.kind(),
                    project_type: project.project_type,
                    project_id: project.project_id,
                }
                .into());
            }
        }

        let trace = Trace::new(source, target, project.project_id, actor.user_id);
        let outcome = match self.store.trace_insert(&trace).await? {
            TraceInsert::Created => LinkOutcome::Created,
            TraceInsert::Existing => LinkOutcome::AlreadyLinked,
        };

        tracing::info!(
            project_id = %project.project_id,
            %source,
            %target,
            outcome = ?outcome,
            "Trace linked"
        );
        Ok(outcome)
    }

    /// Remove the link between `source` and `target`. Returns false when no
    /// such link existed.
    pub async fn unlink(
        &self,
        project: &Project,
        source: ArtifactId,
        target: ArtifactId,
    ) -> ApiResult<bool> {
        load_in_project(self.store.as_ref(), project.project_id, source).await?;
        let removed = self.store.trace_delete(source, target).await?;
        if removed {
            tracing::info!(project_id = %project.project_id, %source, %target, "Trace removed");
        }
        Ok(removed)
    }
}
