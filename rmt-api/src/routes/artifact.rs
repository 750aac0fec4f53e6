//! Artifact Page Routes
//!
//! Dashboard, detail, create, update and delete pages for every artifact
//! kind. Handlers are generic over the kind's form type; the router mounts
//! one instantiation per kind.
//!
//! Path parameters are positional: `:id` is the artifact itself for
//! top-level kinds and the enclosing epic or feature for nested kinds, whose
//! own id is then `:child_id`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use rmt_core::{Artifact, ArtifactId, ArtifactKind, ProjectId};
use serde::Deserialize;

use crate::access::{AccessGrant, Action};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::middleware::AuthExtractor;
use crate::state::AppState;
use crate::validation::{
    ArtifactForm, EpicForm, FeatureForm, RequirementForm, UseCaseForm, UserStoryForm,
};
use crate::views::{
    artifact_path, names, CommonModel, DashboardModel, DetailModel, FormModel, Keyed, ParentRef,
    View,
};

// ============================================================================
// PATH PARAMETERS
// ============================================================================

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ArtifactPath {
    pub project_id: ProjectId,
    #[serde(default)]
    pub id: Option<ArtifactId>,
    #[serde(default)]
    pub child_id: Option<ArtifactId>,
}

impl ArtifactPath {
    /// Enclosing epic or feature, for nested kinds.
    fn parent(&self, kind: ArtifactKind) -> Option<ArtifactId> {
        kind.parent_kind().and(self.id)
    }

    /// The artifact the request is about.
    fn target(&self, kind: ArtifactKind) -> ApiResult<ArtifactId> {
        let id = if kind.parent_kind().is_some() {
            self.child_id
        } else {
            self.id
        };
        id.ok_or_else(|| ApiError::missing_field("id"))
    }
}

async fn load_parent(
    state: &AppState,
    kind: ArtifactKind,
    path: &ArtifactPath,
) -> ApiResult<Option<Artifact>> {
    match (kind.parent_kind(), path.parent(kind)) {
        (Some(parent_kind), Some(parent_id)) => Ok(Some(
            state
                .artifacts
                .get(path.project_id, parent_kind, parent_id)
                .await?,
        )),
        (Some(_), None) => Err(ApiError::missing_field("id")),
        (None, _) => Ok(None),
    }
}

async fn load_target(
    state: &AppState,
    kind: ArtifactKind,
    path: &ArtifactPath,
) -> ApiResult<Artifact> {
    let id = path.target(kind)?;
    match path.parent(kind) {
        Some(parent_id) => {
            state
                .artifacts
                .get_child(path.project_id, kind, parent_id, id)
                .await
        }
        None => state.artifacts.get(path.project_id, kind, id).await,
    }
}

fn form_page<F: ArtifactForm>(
    grant: &AccessGrant,
    form: F,
    parent: Option<&Artifact>,
    artifact_id: Option<ArtifactId>,
) -> FormModel<F> {
    let mut model = FormModel::new(grant, F::KIND, form);
    model.parent = parent.map(ParentRef::from);
    model.artifact_id = artifact_id;
    model
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /project/:project_id/{kinds} or /project/:project_id/{parent}/:id/{kinds}
pub async fn dashboard<F: ArtifactForm>(
    State(state): State<AppState>,
    auth: AuthExtractor,
    Path(path): Path<ArtifactPath>,
) -> ApiResult<View<DashboardModel>> {
    let kind = F::KIND;
    let grant = state
        .gate
        .authorize(&auth.principal, path.project_id, Action::Read)
        .await?;

    let parent = load_parent(&state, kind, &path).await?;
    let list = match &parent {
        Some(parent) => state.artifacts.list_children(parent.id()).await?,
        None => state.artifacts.list(path.project_id, kind).await?,
    };

    let names = names(kind);
    Ok(View::new(
        names.dashboard,
        DashboardModel {
            common: CommonModel::from(&grant),
            list: Keyed::new(names.list_key, list),
            parent: parent.as_ref().map(ParentRef::from),
            req_types: (kind == ArtifactKind::Requirement)
                .then(|| grant.project.requirement_types.clone()),
        },
    ))
}

/// GET /project/:project_id/epics/userstories and /features/usecases
pub async fn project_dashboard<F: ArtifactForm>(
    State(state): State<AppState>,
    auth: AuthExtractor,
    Path(path): Path<ArtifactPath>,
) -> ApiResult<View<DashboardModel>> {
    let kind = F::KIND;
    let grant = state
        .gate
        .authorize(&auth.principal, path.project_id, Action::Read)
        .await?;

    let list = state.artifacts.list(path.project_id, kind).await?;
    let names = names(kind);
    Ok(View::new(
        names.project_dashboard,
        DashboardModel {
            common: CommonModel::from(&grant),
            list: Keyed::new(names.list_key, list),
            parent: None,
            req_types: None,
        },
    ))
}

/// GET detail page with traceability, link candidates, comments and files.
pub async fn detail<F: ArtifactForm>(
    State(state): State<AppState>,
    auth: AuthExtractor,
    Path(path): Path<ArtifactPath>,
) -> ApiResult<View<DetailModel>> {
    let kind = F::KIND;
    let grant = state
        .gate
        .authorize(&auth.principal, path.project_id, Action::Read)
        .await?;

    let parent = load_parent(&state, kind, &path).await?;
    let artifact = load_target(&state, kind, &path).await?;
    let id = artifact.id();

    let traceability = state.traceability.get_traceability(id).await?;
    let reqs_not_traced = state
        .traceability
        .get_not_traced_reqs(path.project_id, id)
        .await?;
    let candidates = state
        .traceability
        .not_traced_candidates(&grant.project, id)
        .await?;
    let comments = state.comments.get_comments(id).await?;
    let file_list = state.artifacts.get_file_list(path.project_id, id).await?;

    let names = names(kind);
    Ok(View::new(
        names.detail,
        DetailModel {
            common: CommonModel::from(&grant),
            object: Keyed::new(names.object_key, artifact),
            parent: parent.as_ref().map(ParentRef::from),
            file_list,
            traceability,
            trace_object: Default::default(),
            req_types: grant.project.requirement_types.clone(),
            reqs_not_traced,
            candidates,
            comments,
            comment: Default::default(),
            is_stakeholder: grant.is_stakeholder,
        },
    ))
}

/// GET blank create form.
pub async fn create_view<F: ArtifactForm>(
    State(state): State<AppState>,
    auth: AuthExtractor,
    Path(path): Path<ArtifactPath>,
) -> ApiResult<View<FormModel<F>>> {
    let grant = state
        .gate
        .authorize(&auth.principal, path.project_id, Action::Edit)
        .await?;
    let parent = load_parent(&state, F::KIND, &path).await?;

    Ok(View::new(
        names(F::KIND).create,
        form_page(&grant, F::default(), parent.as_ref(), None),
    ))
}

/// POST create form. Redirects to the new artifact, or re-renders the form
/// with field errors.
pub async fn create<F: ArtifactForm>(
    State(state): State<AppState>,
    auth: AuthExtractor,
    Path(path): Path<ArtifactPath>,
    Form(form): Form<F>,
) -> ApiResult<Response> {
    let kind = F::KIND;
    let grant = state
        .gate
        .authorize(&auth.principal, path.project_id, Action::Edit)
        .await?;
    let parent = load_parent(&state, kind, &path).await?;

    let draft = match form.validate(&grant.project) {
        Ok(draft) => draft,
        Err(errors) => {
            tracing::debug!(
                project_id = %path.project_id,
                kind = %kind,
                errors = errors.len(),
                "Create form rejected"
            );
            let mut model = form_page(&grant, form, parent.as_ref(), None);
            model.errors = errors;
            return Ok(View::new(names(kind).create, model).into_response());
        }
    };

    let artifact = state
        .artifacts
        .create(&grant.project, &grant.user, draft, parent.map(|p| p.id()))
        .await?;
    Ok(Redirect::to(&artifact_path(&artifact)).into_response())
}

/// GET update form prefilled from the stored artifact.
pub async fn update_view<F: ArtifactForm>(
    State(state): State<AppState>,
    auth: AuthExtractor,
    Path(path): Path<ArtifactPath>,
) -> ApiResult<View<FormModel<F>>> {
    let kind = F::KIND;
    let grant = state
        .gate
        .authorize(&auth.principal, path.project_id, Action::Edit)
        .await?;
    let parent = load_parent(&state, kind, &path).await?;
    let artifact = load_target(&state, kind, &path).await?;

    Ok(View::new(
        names(kind).update,
        form_page(
            &grant,
            F::from_artifact(&artifact),
            parent.as_ref(),
            Some(artifact.id()),
        ),
    ))
}

/// POST update form. Redirects to the artifact, or re-renders the form with
/// field errors.
pub async fn update<F: ArtifactForm>(
    State(state): State<AppState>,
    auth: AuthExtractor,
    Path(path): Path<ArtifactPath>,
    Form(form): Form<F>,
) -> ApiResult<Response> {
    let kind = F::KIND;
    let grant = state
        .gate
        .authorize(&auth.principal, path.project_id, Action::Edit)
        .await?;
    let parent = load_parent(&state, kind, &path).await?;
    let existing = load_target(&state, kind, &path).await?;

    let draft = match form.validate(&grant.project) {
        Ok(draft) => draft,
        Err(errors) => {
            let mut model = form_page(&grant, form, parent.as_ref(), Some(existing.id()));
            model.errors = errors;
            return Ok(View::new(names(kind).update, model).into_response());
        }
    };

    let updated = state
        .artifacts
        .update(
            &grant.project,
            existing.id(),
            draft,
            parent.map(|p| p.id()),
        )
        .await?;
    Ok(Redirect::to(&artifact_path(&updated)).into_response())
}

/// DELETE an artifact and everything hanging off it.
///
/// Answers 200 when deleted, 404 when absent and 500 when the store fails,
/// all with an empty body. Authorization failures keep their 403.
pub async fn delete<F: ArtifactForm>(
    State(state): State<AppState>,
    auth: AuthExtractor,
    Path(path): Path<ArtifactPath>,
) -> Response {
    let kind = F::KIND;
    let outcome = delete_artifact(&state, &auth.principal, kind, &path).await;

    match outcome {
        Ok(true) => StatusCode::OK.into_response(),
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(e) if e.code == ErrorCode::Forbidden => e.into_response(),
        Err(e) if e.status_code() == StatusCode::NOT_FOUND => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!(
                project_id = %path.project_id,
                kind = %kind,
                error = %e,
                "Delete failed"
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn delete_artifact(
    state: &AppState,
    principal: &str,
    kind: ArtifactKind,
    path: &ArtifactPath,
) -> ApiResult<bool> {
    state
        .gate
        .authorize(principal, path.project_id, Action::Edit)
        .await?;
    let target = load_target(state, kind, path).await?;
    state.artifacts.delete(path.project_id, kind, target.id()).await
}

// ============================================================================
// ROUTER
// ============================================================================

fn plural(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Requirement => "requirements",
        ArtifactKind::Feature => "features",
        ArtifactKind::Epic => "epics",
        ArtifactKind::UserStory => "userstories",
        ArtifactKind::UseCase => "usecases",
    }
}

fn top_level<F: ArtifactForm>(router: Router<AppState>) -> Router<AppState> {
    let one = F::KIND.print_segment();
    let many = plural(F::KIND);
    router
        .route(
            &format!("/project/:project_id/{}", many),
            get(dashboard::<F>).post(create::<F>),
        )
        .route(
            &format!("/project/:project_id/{}/create", many),
            get(create_view::<F>),
        )
        .route(
            &format!("/project/:project_id/{}/:id", one),
            get(detail::<F>).delete(delete::<F>),
        )
        .route(
            &format!("/project/:project_id/{}/update/:id", one),
            get(update_view::<F>),
        )
        .route(
            &format!("/project/:project_id/{}/:id/update", one),
            post(update::<F>),
        )
}

fn nested<F: ArtifactForm>(router: Router<AppState>) -> Router<AppState> {
    let Some(parent_kind) = F::KIND.parent_kind() else {
        return router;
    };
    let base = format!("/project/:project_id/{}/:id", parent_kind.print_segment());
    let one = F::KIND.print_segment();
    let many = plural(F::KIND);
    router
        .route(
            &format!("/project/:project_id/{}/{}", plural(parent_kind), many),
            get(project_dashboard::<F>),
        )
        .route(&format!("{}/{}", base, many), get(dashboard::<F>))
        .route(&format!("{}/{}/create", base, many), get(create_view::<F>))
        .route(&format!("{}/{}/create", base, one), post(create::<F>))
        .route(
            &format!("{}/{}/:child_id", base, one),
            get(detail::<F>).post(update::<F>).delete(delete::<F>),
        )
        .route(
            &format!("{}/{}/update/:child_id", base, one),
            get(update_view::<F>),
        )
}

/// Pages for all five artifact kinds.
pub fn create_router() -> Router<AppState> {
    let router = Router::new();
    let router = top_level::<RequirementForm>(router);
    let router = top_level::<EpicForm>(router);
    let router = top_level::<FeatureForm>(router);
    let router = nested::<UserStoryForm>(router);
    nested::<UseCaseForm>(router)
}
