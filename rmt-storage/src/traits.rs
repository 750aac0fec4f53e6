//! Async store traits consumed by the Access Gate, the Traceability Linker
//! and the artifact services.

use async_trait::async_trait;
use rmt_core::{
    Artifact, ArtifactId, ArtifactKind, Comment, DocumentMeta, Group, GroupId, Project,
    ProjectId, StorageError, Trace, User, UserId,
};

/// Result type alias for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Outcome of inserting a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceInsert {
    /// A new link was stored.
    Created,
    /// The unordered pair was already linked; nothing changed.
    Existing,
}

/// Everything removed by a cascading artifact delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionReport {
    /// The deleted artifact followed by its deleted children.
    pub artifacts: Vec<ArtifactId>,
    pub traces: usize,
    pub comments: usize,
    pub documents: usize,
}

// ============================================================================
// DIRECTORY
// ============================================================================

/// Read access to users, groups and projects.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn project_get(&self, id: ProjectId) -> StorageResult<Option<Project>>;

    async fn project_list(&self) -> StorageResult<Vec<Project>>;

    /// Resolve a principal name to a user.
    async fn user_find_by_name(&self, name: &str) -> StorageResult<Option<User>>;

    async fn user_get(&self, id: UserId) -> StorageResult<Option<User>>;

    async fn group_get(&self, id: GroupId) -> StorageResult<Option<Group>>;

    /// Every project whose group lists the user.
    async fn projects_for_user(&self, user_id: UserId) -> StorageResult<Vec<Project>>;
}

// ============================================================================
// ARTIFACTS
// ============================================================================

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Insert a new artifact. Fails if the id is already taken.
    async fn artifact_insert(&self, artifact: &Artifact) -> StorageResult<()>;

    async fn artifact_get(&self, id: ArtifactId) -> StorageResult<Option<Artifact>>;

    /// Replace a stored artifact. The kind and project cannot change.
    async fn artifact_update(&self, artifact: &Artifact) -> StorageResult<()>;

    /// Delete an artifact, its children, and every trace, comment and
    /// document attached to any of them, as one unit of work.
    ///
    /// Returns `None` when the artifact does not exist.
    async fn artifact_delete(&self, id: ArtifactId) -> StorageResult<Option<DeletionReport>>;

    /// All artifacts of a kind in a project, oldest first.
    async fn artifact_list(
        &self,
        project_id: ProjectId,
        kind: ArtifactKind,
    ) -> StorageResult<Vec<Artifact>>;

    /// Artifacts nested under `parent_id`, oldest first.
    async fn artifact_list_children(&self, parent_id: ArtifactId) -> StorageResult<Vec<Artifact>>;
}

// ============================================================================
// TRACES
// ============================================================================

#[async_trait]
pub trait TraceStore: Send + Sync {
    /// Store a link under its canonical pair. Never creates a duplicate edge.
    /// Both ends must exist in `trace.project_id` at insert time, otherwise
    /// [`StorageError::NotFound`](rmt_core::StorageError::NotFound).
    async fn trace_insert(&self, trace: &Trace) -> StorageResult<TraceInsert>;

    /// Remove the link between `a` and `b` in either orientation.
    async fn trace_delete(&self, a: ArtifactId, b: ArtifactId) -> StorageResult<bool>;

    /// Every link with `anchor` as one of its endpoints.
    async fn trace_list_for(&self, anchor: ArtifactId) -> StorageResult<Vec<Trace>>;
}

// ============================================================================
// COMMENTS & DOCUMENTS
// ============================================================================

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn comment_insert(&self, comment: &Comment) -> StorageResult<()>;

    /// Comments on an artifact, oldest first.
    async fn comment_list(&self, artifact_id: ArtifactId) -> StorageResult<Vec<Comment>>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn document_insert(&self, document: &DocumentMeta) -> StorageResult<()>;

    /// File list attached to an artifact of a project.
    async fn get_file_list(
        &self,
        project_id: ProjectId,
        artifact_id: ArtifactId,
    ) -> StorageResult<Vec<DocumentMeta>>;
}

/// Umbrella trait for a complete backing store.
pub trait Storage:
    DirectoryStore + ArtifactStore + TraceStore + CommentStore + DocumentStore
{
}

impl<T> Storage for T where
    T: DirectoryStore + ArtifactStore + TraceStore + CommentStore + DocumentStore
{
}
