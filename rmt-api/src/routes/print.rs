//! Printable Document Routes
//!
//! Read-only pages that render one artifact with its traceability, or a flat
//! listing of artifacts, for printing.

use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use rmt_core::{ArtifactId, ArtifactKind, ProjectId};
use serde::Deserialize;

use crate::access::Action;
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthExtractor;
use crate::state::AppState;
use crate::views::{CommonModel, PrintListModel, PrintModel, View};

#[derive(Debug, Clone, Deserialize)]
pub struct PrintPath {
    pub project_id: ProjectId,
    pub kind: String,
    #[serde(default)]
    pub id: Option<ArtifactId>,
    #[serde(default)]
    pub child_id: Option<ArtifactId>,
}

impl PrintPath {
    fn kind(&self) -> ApiResult<ArtifactKind> {
        ArtifactKind::from_print_segment(&self.kind)
            .ok_or_else(|| ApiError::entity_not_found("Document type", &self.kind))
    }
}

/// Kind whose artifacts make up the children listing for `kind`.
fn child_listing(kind: ArtifactKind) -> Option<(ArtifactKind, ArtifactKind)> {
    match kind {
        ArtifactKind::Feature | ArtifactKind::UseCase => {
            Some((ArtifactKind::Feature, ArtifactKind::UseCase))
        }
        ArtifactKind::Epic | ArtifactKind::UserStory => {
            Some((ArtifactKind::Epic, ArtifactKind::UserStory))
        }
        ArtifactKind::Requirement => None,
    }
}

/// GET /print/:project_id/:kind/:id
pub async fn print_page(
    State(state): State<AppState>,
    auth: AuthExtractor,
    Path(path): Path<PrintPath>,
) -> ApiResult<View<PrintModel>> {
    let grant = state
        .gate
        .authorize(&auth.principal, path.project_id, Action::Read)
        .await?;
    let kind = path.kind()?;
    let id = path.id.ok_or_else(|| ApiError::missing_field("id"))?;

    let object = state.artifacts.get(path.project_id, kind, id).await?;
    let traceability = state.traceability.get_traceability(id).await?;

    Ok(View::new(
        "printPage",
        PrintModel {
            common: CommonModel::from(&grant),
            object,
            traceability,
            trace_object: kind.print_segment(),
            req_types: grant.project.requirement_types.clone(),
        },
    ))
}

/// GET /print/:project_id/:kind/list
pub async fn print_list(
    State(state): State<AppState>,
    auth: AuthExtractor,
    Path(path): Path<PrintPath>,
) -> ApiResult<View<PrintListModel>> {
    let grant = state
        .gate
        .authorize(&auth.principal, path.project_id, Action::Read)
        .await?;
    let kind = path.kind()?;
    let object = state.artifacts.list(path.project_id, kind).await?;

    Ok(View::new(
        "printListPage",
        PrintListModel {
            common: CommonModel::from(&grant),
            kind: kind.print_segment(),
            object,
            req_types: grant.project.requirement_types.clone(),
        },
    ))
}

/// GET /print/:project_id/:kind/list/:child_id
///
/// The use cases of a feature or the user stories of an epic.
pub async fn print_children(
    State(state): State<AppState>,
    auth: AuthExtractor,
    Path(path): Path<PrintPath>,
) -> ApiResult<View<PrintListModel>> {
    let grant = state
        .gate
        .authorize(&auth.principal, path.project_id, Action::Read)
        .await?;
    let kind = path.kind()?;
    let parent_id = path
        .child_id
        .ok_or_else(|| ApiError::missing_field("parentId"))?;
    let (parent_kind, child_kind) = child_listing(kind)
        .ok_or_else(|| ApiError::entity_not_found("Document type", &path.kind))?;

    let parent = state
        .artifacts
        .get(path.project_id, parent_kind, parent_id)
        .await?;
    let object = state.artifacts.list_children(parent.id()).await?;

    Ok(View::new(
        "printListPage",
        PrintListModel {
            common: CommonModel::from(&grant),
            kind: child_kind.print_segment(),
            object,
            req_types: grant.project.requirement_types.clone(),
        },
    ))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/print/:project_id/:kind/list", get(print_list))
        .route("/print/:project_id/:kind/list/:child_id", get(print_children))
        .route("/print/:project_id/:kind/:id", get(print_page))
}
