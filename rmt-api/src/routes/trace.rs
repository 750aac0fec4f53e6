//! Trace Routes
//!
//! Link and unlink two artifacts of a project from the anchor's detail page.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{delete, post},
    Form, Router,
};
use rmt_core::{ArtifactId, ProjectId};
use serde::Deserialize;

use crate::access::Action;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::middleware::AuthExtractor;
use crate::services::load_in_project;
use crate::state::AppState;
use crate::validation::{TraceForm, ValidateNonEmpty};
use crate::views::artifact_path;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TracePath {
    pub project_id: ProjectId,
    pub id: ArtifactId,
    #[serde(default)]
    pub child_id: Option<ArtifactId>,
}

/// POST /project/:project_id/trace/:id
///
/// Links the anchor to `traceId` and redirects back to the anchor.
pub async fn link(
    State(state): State<AppState>,
    auth: AuthExtractor,
    Path(path): Path<TracePath>,
    Form(form): Form<TraceForm>,
) -> ApiResult<Redirect> {
    let grant = state
        .gate
        .authorize(&auth.principal, path.project_id, Action::Edit)
        .await?;

    form.trace_id.validate_non_empty("traceId")?;
    let target: ArtifactId = form
        .trace_id
        .trim()
        .parse()
        .map_err(|_| ApiError::invalid_format("traceId", "artifact id"))?;

    let anchor = load_in_project(state.store.as_ref(), path.project_id, path.id).await?;
    state
        .traceability
        .link(&grant.project, anchor.id(), target, &grant.user)
        .await?;

    Ok(Redirect::to(&artifact_path(&anchor)))
}

/// DELETE /project/:project_id/trace/:id/:child_id
///
/// 200 when the link was removed, 404 when there was none. Both bodies are
/// empty.
pub async fn unlink(
    State(state): State<AppState>,
    auth: AuthExtractor,
    Path(path): Path<TracePath>,
) -> Response {
    match remove_link(&state, &auth.principal, &path).await {
        Ok(true) => StatusCode::OK.into_response(),
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(e) if e.code == ErrorCode::Forbidden => e.into_response(),
        Err(e) if e.status_code() == StatusCode::NOT_FOUND => StatusCode::NOT_FOUND.into_response(),
        Err(e) if e.status_code() == StatusCode::BAD_REQUEST => e.into_response(),
        Err(e) => {
            tracing::error!(
                project_id = %path.project_id,
                anchor = %path.id,
                error = %e,
                "Unlink failed"
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn remove_link(state: &AppState, principal: &str, path: &TracePath) -> ApiResult<bool> {
    let grant = state
        .gate
        .authorize(principal, path.project_id, Action::Edit)
        .await?;
    let target = path
        .child_id
        .ok_or_else(|| ApiError::missing_field("targetId"))?;
    state.traceability.unlink(&grant.project, path.id, target).await
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/project/:project_id/trace/:id", post(link))
        .route("/project/:project_id/trace/:id/:child_id", delete(unlink))
}
