//! Service Layer
//!
//! Business logic behind the route handlers: artifact CRUD, comments and
//! traceability. Services hold the shared store and return [`ApiResult`]s.

mod artifact_service;
mod comment_service;
mod traceability_service;

pub use artifact_service::*;
pub use comment_service::*;
pub use traceability_service::*;

use rmt_core::{Artifact, ArtifactId, ProjectId};
use rmt_storage::{ArtifactStore, Storage};

use crate::error::{ApiError, ApiResult};

/// Load an artifact that must belong to `project_id`.
///
/// An artifact of another project is reported exactly like a missing one.
pub(crate) async fn load_in_project(
    store: &dyn Storage,
    project_id: ProjectId,
    id: ArtifactId,
) -> ApiResult<Artifact> {
    match store.artifact_get(id).await? {
        Some(artifact) if artifact.project_id() == project_id => Ok(artifact),
        _ => Err(ApiError::artifact_not_found(id)),
    }
}
