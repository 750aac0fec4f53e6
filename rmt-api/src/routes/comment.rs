//! Comment Routes

use axum::{
    extract::{Path, State},
    response::Redirect,
    routing::post,
    Form, Router,
};
use rmt_core::{ArtifactId, ProjectId};
use serde::Deserialize;

use crate::access::Action;
use crate::error::ApiResult;
use crate::middleware::AuthExtractor;
use crate::services::load_in_project;
use crate::state::AppState;
use crate::validation::CommentForm;
use crate::views::artifact_path;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CommentPath {
    pub project_id: ProjectId,
    pub id: ArtifactId,
}

/// POST /project/:project_id/comment/:id
///
/// Stakeholders may comment too. Redirects back to the commented artifact.
pub async fn add_comment(
    State(state): State<AppState>,
    auth: AuthExtractor,
    Path(path): Path<CommentPath>,
    Form(form): Form<CommentForm>,
) -> ApiResult<Redirect> {
    let grant = state
        .gate
        .authorize(&auth.principal, path.project_id, Action::Comment)
        .await?;

    let artifact = load_in_project(state.store.as_ref(), path.project_id, path.id).await?;
    state
        .comments
        .add_comment(&artifact, &grant.user, &form.text)
        .await?;

    Ok(Redirect::to(&artifact_path(&artifact)))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/project/:project_id/comment/:id", post(add_comment))
}
