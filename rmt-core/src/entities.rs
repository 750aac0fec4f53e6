//! Core entity structures

use crate::{
    ArtifactId, ArtifactKind, CommentId, Complexity, DocumentId, EntityIdType, GroupId, GroupRole,
    Priority, ProjectId, ProjectType, RequirementTypeId, Risk, Scope, State, Timestamp, UserId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

// ============================================================================
// DIRECTORY ENTITIES
// ============================================================================

/// A user known to the directory. `name` is the principal name supplied by
/// the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub created_at: Timestamp,
}

/// Membership entry of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupUser {
    pub user_id: UserId,
    pub user_name: String,
    pub role: GroupRole,
}

/// The team owning a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub group_id: GroupId,
    pub name: String,
    pub users: Vec<GroupUser>,
}

impl Group {
    /// Role of the user inside this group, if they are a member.
    pub fn role_of(&self, user_id: UserId) -> Option<GroupRole> {
        self.users
            .iter()
            .find(|member| member.user_id == user_id)
            .map(|member| member.role)
    }

    pub fn is_member(&self, user_id: UserId) -> bool {
        self.role_of(user_id).is_some()
    }
}

/// Project-defined classification of requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementType {
    pub requirement_type_id: RequirementTypeId,
    pub name: String,
    pub description: Option<String>,
}

/// A project and its process flavour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub project_type: ProjectType,
    pub group_id: GroupId,
    #[serde(default)]
    pub requirement_types: Vec<RequirementType>,
    pub created_at: Timestamp,
}

impl Project {
    /// Look up one of this project's requirement types.
    pub fn requirement_type(&self, id: RequirementTypeId) -> Option<&RequirementType> {
        self.requirement_types
            .iter()
            .find(|rt| rt.requirement_type_id == id)
    }
}

// ============================================================================
// ARTIFACTS
// ============================================================================

/// Fields shared by every artifact kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactHeader {
    pub artifact_id: ArtifactId,
    pub project_id: ProjectId,
    pub author_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub state: State,
    pub risk: Risk,
    pub complexity: Complexity,
    pub scope: Scope,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ArtifactHeader {
    /// Fresh header with a new id and default attributes.
    pub fn new(project_id: ProjectId, author_id: UserId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            artifact_id: ArtifactId::now_v7(),
            project_id,
            author_id,
            name: name.into(),
            description: None,
            priority: Priority::default(),
            state: State::default(),
            risk: Risk::default(),
            complexity: Complexity::default(),
            scope: Scope::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the header as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(flatten)]
    pub header: ArtifactHeader,
    pub requirement_type_id: Option<RequirementTypeId>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(flatten)]
    pub header: ArtifactHeader,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epic {
    #[serde(flatten)]
    pub header: ArtifactHeader,
}

/// User story, always nested under an epic of the same project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStory {
    #[serde(flatten)]
    pub header: ArtifactHeader,
    pub epic_id: ArtifactId,
    pub acceptance_criteria: Option<String>,
}

/// Use case, always nested under a feature of the same project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseCase {
    #[serde(flatten)]
    pub header: ArtifactHeader,
    pub feature_id: ArtifactId,
    pub actors: Option<String>,
    pub preconditions: Option<String>,
    pub flow: Option<String>,
    pub postconditions: Option<String>,
}

/// Any traceable artifact. All kinds share one id space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Artifact {
    Requirement(Requirement),
    Feature(Feature),
    Epic(Epic),
    UserStory(UserStory),
    UseCase(UseCase),
}

impl Artifact {
    pub fn header(&self) -> &ArtifactHeader {
        match self {
            Artifact::Requirement(a) => &a.header,
            Artifact::Feature(a) => &a.header,
            Artifact::Epic(a) => &a.header,
            Artifact::UserStory(a) => &a.header,
            Artifact::UseCase(a) => &a.header,
        }
    }

    pub fn header_mut(&mut self) -> &mut ArtifactHeader {
        match self {
            Artifact::Requirement(a) => &mut a.header,
            Artifact::Feature(a) => &mut a.header,
            Artifact::Epic(a) => &mut a.header,
            Artifact::UserStory(a) => &mut a.header,
            Artifact::UseCase(a) => &mut a.header,
        }
    }

    pub fn id(&self) -> ArtifactId {
        self.header().artifact_id
    }

    pub fn project_id(&self) -> ProjectId {
        self.header().project_id
    }

    pub fn name(&self) -> &str {
        &self.header().name
    }

    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::Requirement(_) => ArtifactKind::Requirement,
            Artifact::Feature(_) => ArtifactKind::Feature,
            Artifact::Epic(_) => ArtifactKind::Epic,
            Artifact::UserStory(_) => ArtifactKind::UserStory,
            Artifact::UseCase(_) => ArtifactKind::UseCase,
        }
    }

    /// Epic of a user story or feature of a use case.
    pub fn parent_id(&self) -> Option<ArtifactId> {
        match self {
            Artifact::UserStory(story) => Some(story.epic_id),
            Artifact::UseCase(use_case) => Some(use_case.feature_id),
            _ => None,
        }
    }

    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            artifact_id: self.id(),
            kind: self.kind(),
            name: self.name().to_string(),
            project_id: self.project_id(),
        }
    }
}

impl From<Requirement> for Artifact {
    fn from(value: Requirement) -> Self {
        Artifact::Requirement(value)
    }
}

impl From<Feature> for Artifact {
    fn from(value: Feature) -> Self {
        Artifact::Feature(value)
    }
}

impl From<Epic> for Artifact {
    fn from(value: Epic) -> Self {
        Artifact::Epic(value)
    }
}

impl From<UserStory> for Artifact {
    fn from(value: UserStory) -> Self {
        Artifact::UserStory(value)
    }
}

impl From<UseCase> for Artifact {
    fn from(value: UseCase) -> Self {
        Artifact::UseCase(value)
    }
}

/// Lightweight reference to an artifact, used in candidate lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub artifact_id: ArtifactId,
    pub kind: ArtifactKind,
    pub name: String,
    pub project_id: ProjectId,
}

// ============================================================================
// TRACES
// ============================================================================

/// Undirected "traced-to" link between two artifacts of the same project.
///
/// Stored under the canonical pair: `source_id < target_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    pub source_id: ArtifactId,
    pub target_id: ArtifactId,
    pub project_id: ProjectId,
    pub created_by: UserId,
    pub created_at: Timestamp,
}

impl Trace {
    /// Build a link; endpoint order is normalized.
    pub fn new(a: ArtifactId, b: ArtifactId, project_id: ProjectId, created_by: UserId) -> Self {
        let (source_id, target_id) = Self::canonical_pair(a, b);
        Self {
            source_id,
            target_id,
            project_id,
            created_by,
            created_at: Utc::now(),
        }
    }

    pub fn canonical_pair(a: ArtifactId, b: ArtifactId) -> (ArtifactId, ArtifactId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn key(&self) -> (ArtifactId, ArtifactId) {
        (self.source_id, self.target_id)
    }

    pub fn touches(&self, id: ArtifactId) -> bool {
        self.source_id == id || self.target_id == id
    }

    /// The endpoint opposite to `id`, if `id` is one of the endpoints.
    pub fn other_end(&self, id: ArtifactId) -> Option<ArtifactId> {
        if self.source_id == id {
            Some(self.target_id)
        } else if self.target_id == id {
            Some(self.source_id)
        } else {
            None
        }
    }
}

// ============================================================================
// COMMENTS & DOCUMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: CommentId,
    pub artifact_id: ArtifactId,
    pub author_id: UserId,
    pub author_name: String,
    pub text: String,
    pub created_at: Timestamp,
}

/// Metadata of a file attached to an artifact. File contents live elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub document_id: DocumentId,
    pub project_id: ProjectId,
    pub artifact_id: ArtifactId,
    pub file_name: String,
    pub content_type: Option<String>,
    pub size_bytes: u64,
    pub uploaded_at: Timestamp,
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn arb_artifact_id() -> impl Strategy<Value = ArtifactId> {
        any::<u128>().prop_map(|bits| ArtifactId::new(Uuid::from_u128(bits)))
    }

    proptest! {
        #[test]
        fn prop_canonical_pair_is_order_independent(a in arb_artifact_id(), b in arb_artifact_id()) {
            let forward = Trace::canonical_pair(a, b);
            let backward = Trace::canonical_pair(b, a);
            prop_assert_eq!(forward, backward);
            prop_assert!(forward.0 <= forward.1);
        }
    }
}
