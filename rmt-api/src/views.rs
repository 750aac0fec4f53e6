//! View Models
//!
//! Every page endpoint answers with a [`View`]: the name of the page to render
//! and a model struct whose JSON keys are the ones the templates expect
//! (`project`, `projectList`, `isPM`, `traceability`, ...).

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use rmt_core::{
    Artifact, ArtifactId, ArtifactKind, Comment, Complexity, DocumentMeta, FieldError, GroupUser,
    Priority, Project, RequirementType, Risk, Scope, State,
};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::access::AccessGrant;
use crate::services::{NotTracedCandidates, Traceability};
use crate::validation::{CommentForm, TraceForm};

// ============================================================================
// ENVELOPE
// ============================================================================

/// A named page plus its model.
#[derive(Debug, Clone, Serialize)]
pub struct View<T> {
    pub view: &'static str,
    pub model: T,
}

impl<T> View<T> {
    pub fn new(view: &'static str, model: T) -> Self {
        Self { view, model }
    }
}

impl<T: Serialize> IntoResponse for View<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// A single model entry whose key depends on the artifact kind.
#[derive(Debug, Clone)]
pub struct Keyed<T> {
    pub key: &'static str,
    pub value: T,
}

impl<T> Keyed<T> {
    pub fn new(key: &'static str, value: T) -> Self {
        Self { key, value }
    }
}

impl<T: Serialize> Serialize for Keyed<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.key, &self.value)?;
        map.end()
    }
}

/// The enclosing epic or feature of a nested page, as `epicId`/`epicName`
/// or `featureId`/`featureName`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub kind: ArtifactKind,
    pub id: ArtifactId,
    pub name: String,
}

impl From<&Artifact> for ParentRef {
    fn from(parent: &Artifact) -> Self {
        Self {
            kind: parent.kind(),
            id: parent.id(),
            name: parent.name().to_string(),
        }
    }
}

impl Serialize for ParentRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let prefix = names(self.kind).object_key;
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(&format!("{}Id", prefix), &self.id)?;
        map.serialize_entry(&format!("{}Name", prefix), &self.name)?;
        map.end()
    }
}

// ============================================================================
// PER-KIND NAMES
// ============================================================================

/// View names and model keys for one artifact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindNames {
    pub dashboard: &'static str,
    pub project_dashboard: &'static str,
    pub detail: &'static str,
    pub create: &'static str,
    pub update: &'static str,
    pub object_key: &'static str,
    pub list_key: &'static str,
}

pub fn names(kind: ArtifactKind) -> KindNames {
    match kind {
        ArtifactKind::Requirement => KindNames {
            dashboard: "requirementsDashboard",
            project_dashboard: "requirementsDashboard",
            detail: "requirement",
            create: "createRequirement",
            update: "updateRequirement",
            object_key: "requirement",
            list_key: "requirementList",
        },
        ArtifactKind::Feature => KindNames {
            dashboard: "featuresDashboard",
            project_dashboard: "featuresDashboard",
            detail: "feature",
            create: "createFeature",
            update: "updateFeature",
            object_key: "feature",
            list_key: "featureList",
        },
        ArtifactKind::Epic => KindNames {
            dashboard: "epicsDashboard",
            project_dashboard: "epicsDashboard",
            detail: "epic",
            create: "createEpic",
            update: "updateEpic",
            object_key: "epic",
            list_key: "epicList",
        },
        ArtifactKind::UserStory => KindNames {
            dashboard: "userStoriesDashboard",
            project_dashboard: "userStoriesDashboardProject",
            detail: "userStory",
            create: "createUserStory",
            update: "updateUserStory",
            object_key: "userStory",
            list_key: "userStoriesList",
        },
        ArtifactKind::UseCase => KindNames {
            dashboard: "useCasesDashboard",
            project_dashboard: "useCasesDashboardProject",
            detail: "useCase",
            create: "createUseCase",
            update: "updateUseCase",
            object_key: "useCase",
            list_key: "useCasesList",
        },
    }
}

/// Canonical page of an artifact, the target of post-submit redirects.
pub fn artifact_path(artifact: &Artifact) -> String {
    let project_id = artifact.project_id();
    let id = artifact.id();
    match artifact {
        Artifact::UserStory(s) => {
            format!("/project/{}/epic/{}/userstory/{}", project_id, s.epic_id, id)
        }
        Artifact::UseCase(u) => {
            format!("/project/{}/feature/{}/usecase/{}", project_id, u.feature_id, id)
        }
        other => format!(
            "/project/{}/{}/{}",
            project_id,
            other.kind().print_segment(),
            id
        ),
    }
}

// ============================================================================
// MODELS
// ============================================================================

/// Keys present on every page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonModel {
    pub project: Project,
    pub project_list: Vec<Project>,
    /// Principal name of the caller.
    pub user: String,
    pub group: Vec<GroupUser>,
    #[serde(rename = "isPM")]
    pub is_pm: bool,
}

impl From<&AccessGrant> for CommonModel {
    fn from(grant: &AccessGrant) -> Self {
        Self {
            project: grant.project.clone(),
            project_list: grant.projects.clone(),
            user: grant.user.name.clone(),
            group: grant.group.users.clone(),
            is_pm: grant.is_pm,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardModel {
    #[serde(flatten)]
    pub common: CommonModel,
    #[serde(flatten)]
    pub list: Keyed<Vec<Artifact>>,
    #[serde(flatten)]
    pub parent: Option<ParentRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub req_types: Option<Vec<RequirementType>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailModel {
    #[serde(flatten)]
    pub common: CommonModel,
    #[serde(flatten)]
    pub object: Keyed<Artifact>,
    #[serde(flatten)]
    pub parent: Option<ParentRef>,
    pub file_list: Vec<DocumentMeta>,
    pub traceability: Traceability,
    pub trace_object: TraceForm,
    pub req_types: Vec<RequirementType>,
    pub reqs_not_traced: Vec<Artifact>,
    #[serde(flatten)]
    pub candidates: NotTracedCandidates,
    pub comments: Vec<Comment>,
    pub comment: CommentForm,
    pub is_stakeholder: bool,
}

/// Create and update pages, including re-renders after failed validation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormModel<F> {
    #[serde(flatten)]
    pub common: CommonModel,
    #[serde(flatten)]
    pub form: Keyed<F>,
    #[serde(flatten)]
    pub parent: Option<ParentRef>,
    /// Set on update pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<ArtifactId>,
    pub priority: &'static [Priority],
    pub state: &'static [State],
    pub risk: &'static [Risk],
    pub complexity: &'static [Complexity],
    pub scope: &'static [Scope],
    pub req_types: Vec<RequirementType>,
    pub errors: Vec<FieldError>,
}

impl<F> FormModel<F> {
    pub fn new(grant: &AccessGrant, kind: ArtifactKind, form: F) -> Self {
        Self {
            common: CommonModel::from(grant),
            form: Keyed::new(names(kind).object_key, form),
            parent: None,
            artifact_id: None,
            priority: Priority::ALL,
            state: State::ALL,
            risk: Risk::ALL,
            complexity: Complexity::ALL,
            scope: Scope::ALL,
            req_types: grant.project.requirement_types.clone(),
            errors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintModel {
    #[serde(flatten)]
    pub common: CommonModel,
    pub object: Artifact,
    pub traceability: Traceability,
    /// Path segment of the printed kind.
    pub trace_object: &'static str,
    pub req_types: Vec<RequirementType>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintListModel {
    #[serde(flatten)]
    pub common: CommonModel,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub object: Vec<Artifact>,
    pub req_types: Vec<RequirementType>,
}
