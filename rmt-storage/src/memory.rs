//! In-memory reference store.
//!
//! All tables sit behind ONE lock so that a cascading delete (artifact,
//! children, links, comments, documents) is observed atomically.

use crate::{
    ArtifactStore, CommentStore, DeletionReport, DirectoryStore, DocumentStore, SeedData,
    StorageResult, TraceInsert, TraceStore,
};
use async_trait::async_trait;
use rmt_core::{
    Artifact, ArtifactId, ArtifactKind, Comment, CommentId, DocumentId, DocumentMeta,
    EntityIdType, Group, GroupId, Project, ProjectId, StorageError, Trace, User, UserId,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    groups: BTreeMap<GroupId, Group>,
    projects: BTreeMap<ProjectId, Project>,
    artifacts: BTreeMap<ArtifactId, Artifact>,
    traces: BTreeMap<(ArtifactId, ArtifactId), Trace>,
    comments: BTreeMap<CommentId, Comment>,
    documents: BTreeMap<DocumentId, DocumentMeta>,
}

/// Thread-safe in-memory implementation of every store trait.
///
/// Cloning is cheap and clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    tables: Arc<RwLock<Tables>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store populated from seed data.
    pub fn from_seed(seed: SeedData) -> StorageResult<Self> {
        seed.validate()?;
        let storage = Self::new();
        {
            let mut tables = storage.write()?;
            for user in seed.users {
                tables.users.insert(user.user_id, user);
            }
            for group in seed.groups {
                tables.groups.insert(group.group_id, group);
            }
            for project in seed.projects {
                tables.projects.insert(project.project_id, project);
            }
            for artifact in seed.artifacts {
                tables.artifacts.insert(artifact.id(), artifact);
            }
            for mut trace in seed.traces {
                let key = Trace::canonical_pair(trace.source_id, trace.target_id);
                (trace.source_id, trace.target_id) = key;
                tables.traces.insert(key, trace);
            }
            for document in seed.documents {
                tables.documents.insert(document.document_id, document);
            }
        }
        Ok(storage)
    }

    /// Simulate an outage: while set, every operation fails with
    /// [`StorageError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    // ------------------------------------------------------------------------
    // Directory administration (seeding and fixtures only)
    // ------------------------------------------------------------------------

    pub fn user_insert(&self, user: User) -> StorageResult<()> {
        let mut tables = self.write()?;
        if tables.users.values().any(|u| u.name == user.name) {
            return Err(StorageError::InsertFailed {
                entity: UserId::ENTITY_NAME,
                reason: format!("user name '{}' already taken", user.name),
            });
        }
        tables.users.insert(user.user_id, user);
        Ok(())
    }

    pub fn group_insert(&self, group: Group) -> StorageResult<()> {
        self.write()?.groups.insert(group.group_id, group);
        Ok(())
    }

    pub fn project_insert(&self, project: Project) -> StorageResult<()> {
        let mut tables = self.write()?;
        if !tables.groups.contains_key(&project.group_id) {
            return Err(StorageError::not_found(project.group_id));
        }
        tables.projects.insert(project.project_id, project);
        Ok(())
    }

    /// Number of stored artifacts of every kind.
    pub fn artifact_count(&self) -> StorageResult<usize> {
        Ok(self.read()?.artifacts.len())
    }

    /// Number of stored links.
    pub fn trace_count(&self) -> StorageResult<usize> {
        Ok(self.read()?.traces.len())
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable);
        }
        Ok(())
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, Tables>> {
        self.check_available()?;
        self.tables.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, Tables>> {
        self.check_available()?;
        self.tables.write().map_err(|_| StorageError::LockPoisoned)
    }
}

#[async_trait]
impl DirectoryStore for InMemoryStorage {
    async fn project_get(&self, id: ProjectId) -> StorageResult<Option<Project>> {
        Ok(self.read()?.projects.get(&id).cloned())
    }

    async fn project_list(&self) -> StorageResult<Vec<Project>> {
        Ok(self.read()?.projects.values().cloned().collect())
    }

    async fn user_find_by_name(&self, name: &str) -> StorageResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|user| user.name == name)
            .cloned())
    }

    async fn user_get(&self, id: UserId) -> StorageResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn group_get(&self, id: GroupId) -> StorageResult<Option<Group>> {
        Ok(self.read()?.groups.get(&id).cloned())
    }

    async fn projects_for_user(&self, user_id: UserId) -> StorageResult<Vec<Project>> {
        let tables = self.read()?;
        Ok(tables
            .projects
            .values()
            .filter(|project| {
                tables
                    .groups
                    .get(&project.group_id)
                    .is_some_and(|group| group.is_member(user_id))
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ArtifactStore for InMemoryStorage {
    async fn artifact_insert(&self, artifact: &Artifact) -> StorageResult<()> {
        let mut tables = self.write()?;
        if tables.artifacts.contains_key(&artifact.id()) {
            return Err(StorageError::InsertFailed {
                entity: ArtifactId::ENTITY_NAME,
                reason: "already exists".to_string(),
            });
        }
        tables.artifacts.insert(artifact.id(), artifact.clone());
        Ok(())
    }

    async fn artifact_get(&self, id: ArtifactId) -> StorageResult<Option<Artifact>> {
        Ok(self.read()?.artifacts.get(&id).cloned())
    }

    async fn artifact_update(&self, artifact: &Artifact) -> StorageResult<()> {
        let mut tables = self.write()?;
        let stored = tables
            .artifacts
            .get_mut(&artifact.id())
            .ok_or_else(|| StorageError::not_found(artifact.id()))?;

        if stored.kind() != artifact.kind() || stored.project_id() != artifact.project_id() {
            return Err(StorageError::UpdateFailed {
                entity: ArtifactId::ENTITY_NAME,
                id: artifact.id().as_uuid(),
                reason: "kind and project are immutable".to_string(),
            });
        }
        *stored = artifact.clone();
        Ok(())
    }

    async fn artifact_delete(&self, id: ArtifactId) -> StorageResult<Option<DeletionReport>> {
        let mut tables = self.write()?;
        if !tables.artifacts.contains_key(&id) {
            return Ok(None);
        }

        let mut doomed = vec![id];
        doomed.extend(
            tables
                .artifacts
                .values()
                .filter(|artifact| artifact.parent_id() == Some(id))
                .map(Artifact::id),
        );
        let doomed_set: BTreeSet<ArtifactId> = doomed.iter().copied().collect();

        for artifact_id in &doomed {
            tables.artifacts.remove(artifact_id);
        }

        let traces_before = tables.traces.len();
        tables
            .traces
            .retain(|(a, b), _| !doomed_set.contains(a) && !doomed_set.contains(b));

        let comments_before = tables.comments.len();
        tables
            .comments
            .retain(|_, comment| !doomed_set.contains(&comment.artifact_id));

        let documents_before = tables.documents.len();
        tables
            .documents
            .retain(|_, document| !doomed_set.contains(&document.artifact_id));

        Ok(Some(DeletionReport {
            traces: traces_before - tables.traces.len(),
            comments: comments_before - tables.comments.len(),
            documents: documents_before - tables.documents.len(),
            artifacts: doomed,
        }))
    }

    async fn artifact_list(
        &self,
        project_id: ProjectId,
        kind: ArtifactKind,
    ) -> StorageResult<Vec<Artifact>> {
        Ok(self
            .read()?
            .artifacts
            .values()
            .filter(|artifact| artifact.project_id() == project_id && artifact.kind() == kind)
            .cloned()
            .collect())
    }

    async fn artifact_list_children(&self, parent_id: ArtifactId) -> StorageResult<Vec<Artifact>> {
        Ok(self
            .read()?
            .artifacts
            .values()
            .filter(|artifact| artifact.parent_id() == Some(parent_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TraceStore for InMemoryStorage {
    async fn trace_insert(&self, trace: &Trace) -> StorageResult<TraceInsert> {
        let mut tables = self.write()?;
        for end in [trace.source_id, trace.target_id] {
            let in_project = tables
                .artifacts
                .get(&end)
                .is_some_and(|artifact| artifact.project_id() == trace.project_id);
            if !in_project {
                return Err(StorageError::not_found(end));
            }
        }
        let key = Trace::canonical_pair(trace.source_id, trace.target_id);
        if tables.traces.contains_key(&key) {
            return Ok(TraceInsert::Existing);
        }
        let mut stored = trace.clone();
        (stored.source_id, stored.target_id) = key;
        tables.traces.insert(key, stored);
        Ok(TraceInsert::Created)
    }

    async fn trace_delete(&self, a: ArtifactId, b: ArtifactId) -> StorageResult<bool> {
        let key = Trace::canonical_pair(a, b);
        Ok(self.write()?.traces.remove(&key).is_some())
    }

    async fn trace_list_for(&self, anchor: ArtifactId) -> StorageResult<Vec<Trace>> {
        let mut traces: Vec<Trace> = self
            .read()?
            .traces
            .values()
            .filter(|trace| trace.touches(anchor))
            .cloned()
            .collect();
        traces.sort_by_key(|trace| trace.created_at);
        Ok(traces)
    }
}

#[async_trait]
impl CommentStore for InMemoryStorage {
    async fn comment_insert(&self, comment: &Comment) -> StorageResult<()> {
        let mut tables = self.write()?;
        if !tables.artifacts.contains_key(&comment.artifact_id) {
            return Err(StorageError::not_found(comment.artifact_id));
        }
        tables.comments.insert(comment.comment_id, comment.clone());
        Ok(())
    }

    async fn comment_list(&self, artifact_id: ArtifactId) -> StorageResult<Vec<Comment>> {
        Ok(self
            .read()?
            .comments
            .values()
            .filter(|comment| comment.artifact_id == artifact_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStorage {
    async fn document_insert(&self, document: &DocumentMeta) -> StorageResult<()> {
        self.write()?
            .documents
            .insert(document.document_id, document.clone());
        Ok(())
    }

    async fn get_file_list(
        &self,
        project_id: ProjectId,
        artifact_id: ArtifactId,
    ) -> StorageResult<Vec<DocumentMeta>> {
        Ok(self
            .read()?
            .documents
            .values()
            .filter(|doc| doc.project_id == project_id && doc.artifact_id == artifact_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rmt_core::{
        ArtifactHeader, Epic, GroupRole, GroupUser, ProjectType, Requirement, UserStory,
    };

    struct Fixture {
        storage: InMemoryStorage,
        project: ProjectId,
        author: UserId,
    }

    fn fixture() -> Fixture {
        let storage = InMemoryStorage::new();
        let author = UserId::now_v7();
        let group = Group {
            group_id: GroupId::now_v7(),
            name: "core".into(),
            users: vec![GroupUser {
                user_id: author,
                user_name: "pm".into(),
                role: GroupRole::ProjectManager,
            }],
        };
        let project = Project {
            project_id: ProjectId::now_v7(),
            name: "Apollo".into(),
            description: None,
            project_type: ProjectType::Agile,
            group_id: group.group_id,
            requirement_types: vec![],
            created_at: Utc::now(),
        };
        let project_id = project.project_id;
        storage
            .user_insert(User {
                user_id: author,
                name: "pm".into(),
                email: None,
                created_at: Utc::now(),
            })
            .unwrap();
        storage.group_insert(group).unwrap();
        storage.project_insert(project).unwrap();
        Fixture {
            storage,
            project: project_id,
            author,
        }
    }

    fn epic(f: &Fixture, name: &str) -> Artifact {
        Artifact::Epic(Epic {
            header: ArtifactHeader::new(f.project, f.author, name),
        })
    }

    fn story(f: &Fixture, epic_id: ArtifactId, name: &str) -> Artifact {
        Artifact::UserStory(UserStory {
            header: ArtifactHeader::new(f.project, f.author, name),
            epic_id,
            acceptance_criteria: None,
        })
    }

    fn requirement(f: &Fixture, name: &str) -> Artifact {
        Artifact::Requirement(Requirement {
            header: ArtifactHeader::new(f.project, f.author, name),
            requirement_type_id: None,
            source: None,
        })
    }

    #[tokio::test]
    async fn test_artifact_insert_duplicate() {
        let f = fixture();
        let epic = epic(&f, "Checkout");
        f.storage.artifact_insert(&epic).await.unwrap();
        assert!(f.storage.artifact_insert(&epic).await.is_err());
    }

    #[tokio::test]
    async fn test_artifact_update_rejects_kind_change() {
        let f = fixture();
        let epic = epic(&f, "Checkout");
        f.storage.artifact_insert(&epic).await.unwrap();

        let mut disguised = requirement(&f, "Checkout");
        disguised.header_mut().artifact_id = epic.id();
        let err = f.storage.artifact_update(&disguised).await.unwrap_err();
        assert!(matches!(err, StorageError::UpdateFailed { .. }));
    }

    #[tokio::test]
    async fn test_trace_insert_is_deduplicated_in_both_orientations() {
        let f = fixture();
        let a = requirement(&f, "R1");
        let b = epic(&f, "E1");
        f.storage.artifact_insert(&a).await.unwrap();
        f.storage.artifact_insert(&b).await.unwrap();

        let first = Trace::new(a.id(), b.id(), f.project, f.author);
        let reversed = Trace::new(b.id(), a.id(), f.project, f.author);
        assert_eq!(f.storage.trace_insert(&first).await.unwrap(), TraceInsert::Created);
        assert_eq!(f.storage.trace_insert(&reversed).await.unwrap(), TraceInsert::Existing);
        assert_eq!(f.storage.trace_count().unwrap(), 1);

        assert!(f.storage.trace_delete(b.id(), a.id()).await.unwrap());
        assert!(!f.storage.trace_delete(a.id(), b.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_trace_insert_rechecks_endpoints() {
        let f = fixture();
        let a = requirement(&f, "R1");
        let b = epic(&f, "E1");
        f.storage.artifact_insert(&a).await.unwrap();
        f.storage.artifact_insert(&b).await.unwrap();
        f.storage.artifact_delete(b.id()).await.unwrap();

        let err = f
            .storage
            .trace_insert(&Trace::new(a.id(), b.id(), f.project, f.author))
            .await
            .unwrap_err();
        assert_eq!(err, StorageError::not_found(b.id()));

        let elsewhere = ProjectId::now_v7();
        let err = f
            .storage
            .trace_insert(&Trace::new(a.id(), a.id(), elsewhere, f.author))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(f.storage.trace_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_epic_cascades_to_stories_and_links() {
        let f = fixture();
        let epic = epic(&f, "Checkout");
        let story = story(&f, epic.id(), "Pay by card");
        let req = requirement(&f, "PCI compliance");
        for artifact in [&epic, &story, &req] {
            f.storage.artifact_insert(artifact).await.unwrap();
        }
        f.storage
            .trace_insert(&Trace::new(story.id(), req.id(), f.project, f.author))
            .await
            .unwrap();
        f.storage
            .comment_insert(&Comment {
                comment_id: CommentId::now_v7(),
                artifact_id: story.id(),
                author_id: f.author,
                author_name: "pm".into(),
                text: "needs 3DS".into(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let report = f.storage.artifact_delete(epic.id()).await.unwrap().unwrap();
        assert_eq!(report.artifacts, vec![epic.id(), story.id()]);
        assert_eq!(report.traces, 1);
        assert_eq!(report.comments, 1);

        assert!(f.storage.artifact_get(story.id()).await.unwrap().is_none());
        assert!(f.storage.trace_list_for(req.id()).await.unwrap().is_empty());
        assert!(f.storage.artifact_get(req.id()).await.unwrap().is_some());
        assert!(f.storage.artifact_delete(epic.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_projects_for_user_follows_group_membership() {
        let f = fixture();
        let outsider = UserId::now_v7();
        assert_eq!(f.storage.projects_for_user(f.author).await.unwrap().len(), 1);
        assert!(f.storage.projects_for_user(outsider).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_operation() {
        let f = fixture();
        f.storage.set_unavailable(true);
        assert_eq!(
            f.storage.project_get(f.project).await.unwrap_err(),
            StorageError::Unavailable
        );
        f.storage.set_unavailable(false);
        assert!(f.storage.project_get(f.project).await.unwrap().is_some());
    }
}
