//! RMT Test Utilities
//!
//! Shared test infrastructure for the RMT workspace:
//! - Proptest generators for ids, enumerations and form values
//! - [`fixtures::TestWorld`], a seeded store with agile and traditional
//!   projects and one user per group role
//! - Assertions on store and API outcomes

pub use rmt_storage::InMemoryStorage;

pub use rmt_core::{
    Artifact, ArtifactHeader, ArtifactId, ArtifactKind, Complexity, EntityIdType, Epic, Feature,
    Group, GroupId, GroupRole, GroupUser, Priority, Project, ProjectId, ProjectType, Requirement,
    RequirementType, RequirementTypeId, Risk, Scope, State, StorageError, Timestamp, User,
    UseCase, UserId, UserStory,
};

use chrono::Utc;

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for RMT types.

    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    pub fn arb_project_id() -> impl Strategy<Value = ProjectId> {
        arb_uuid().prop_map(ProjectId::new)
    }

    pub fn arb_artifact_id() -> impl Strategy<Value = ArtifactId> {
        arb_uuid().prop_map(ArtifactId::new)
    }

    pub fn arb_project_type() -> impl Strategy<Value = ProjectType> {
        prop::sample::select(ProjectType::ALL)
    }

    pub fn arb_group_role() -> impl Strategy<Value = GroupRole> {
        prop::sample::select(GroupRole::ALL)
    }

    /// A role, or `None` for "not a member".
    pub fn arb_membership() -> impl Strategy<Value = Option<GroupRole>> {
        prop::option::of(arb_group_role())
    }

    pub fn arb_artifact_kind() -> impl Strategy<Value = ArtifactKind> {
        prop::sample::select(ArtifactKind::ALL)
    }

    pub fn arb_priority() -> impl Strategy<Value = Priority> {
        prop::sample::select(Priority::ALL)
    }

    pub fn arb_state() -> impl Strategy<Value = State> {
        prop::sample::select(State::ALL)
    }

    pub fn arb_risk() -> impl Strategy<Value = Risk> {
        prop::sample::select(Risk::ALL)
    }

    pub fn arb_complexity() -> impl Strategy<Value = Complexity> {
        prop::sample::select(Complexity::ALL)
    }

    pub fn arb_scope() -> impl Strategy<Value = Scope> {
        prop::sample::select(Scope::ALL)
    }

    /// Artifact names that pass form validation.
    pub fn arb_artifact_name() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 ]{0,40}".prop_map(|s| s.trim_end().to_string())
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Seeded stores for API and service tests.

    use super::*;
    use rmt_storage::{ArtifactStore, TraceStore};
    use rmt_core::Trace;

    /// Principal names of the seeded users.
    pub const PM: &str = "pia";
    pub const MEMBER: &str = "max";
    pub const STAKEHOLDER: &str = "sam";
    pub const OUTSIDER: &str = "otto";

    /// `(api key, principal)` pairs matching the seeded users.
    pub const API_KEYS: &[(&str, &str)] = &[
        ("pm-key", PM),
        ("member-key", MEMBER),
        ("stakeholder-key", STAKEHOLDER),
        ("outsider-key", OUTSIDER),
        ("ghost-key", "ghost"),
    ];

    /// API key of a seeded principal.
    pub fn api_key_for(principal: &str) -> &'static str {
        API_KEYS
            .iter()
            .find(|(_, p)| *p == principal)
            .map(|(key, _)| *key)
            .unwrap_or("unknown-key")
    }

    pub fn user(name: &str) -> User {
        User {
            user_id: UserId::now_v7(),
            name: name.to_string(),
            email: Some(format!("{}@example.org", name)),
            created_at: Utc::now(),
        }
    }

    pub fn requirement_type(name: &str) -> RequirementType {
        RequirementType {
            requirement_type_id: RequirementTypeId::now_v7(),
            name: name.to_string(),
            description: None,
        }
    }

    /// Store with three projects:
    /// - `agile` and `traditional`, both owned by a group where `pia` is PM,
    ///   `max` a member and `sam` a stakeholder
    /// - `foreign`, owned by a group containing only `otto`
    ///
    /// `ghost` has an API key but no directory entry.
    pub struct TestWorld {
        pub storage: InMemoryStorage,
        pub pm: User,
        pub member: User,
        pub stakeholder: User,
        pub outsider: User,
        pub agile: Project,
        pub traditional: Project,
        pub foreign: Project,
    }

    impl TestWorld {
        pub fn new() -> Self {
            let storage = InMemoryStorage::new();
            let pm = user(PM);
            let member = user(MEMBER);
            let stakeholder = user(STAKEHOLDER);
            let outsider = user(OUTSIDER);
            for u in [&pm, &member, &stakeholder, &outsider] {
                storage.user_insert(u.clone()).expect("seed user");
            }

            let team = Group {
                group_id: GroupId::now_v7(),
                name: "Product Team".to_string(),
                users: vec![
                    member_of(&pm, GroupRole::ProjectManager),
                    member_of(&member, GroupRole::Member),
                    member_of(&stakeholder, GroupRole::Stakeholder),
                ],
            };
            let foreign_team = Group {
                group_id: GroupId::now_v7(),
                name: "Other Team".to_string(),
                users: vec![member_of(&outsider, GroupRole::ProjectManager)],
            };

            let agile = project("Mobile App", ProjectType::Agile, team.group_id);
            let traditional = project("Billing Core", ProjectType::Traditional, team.group_id);
            let foreign = project("Secret Lab", ProjectType::Agile, foreign_team.group_id);

            storage.group_insert(team).expect("seed group");
            storage.group_insert(foreign_team).expect("seed group");
            for p in [&agile, &traditional, &foreign] {
                storage.project_insert(p.clone()).expect("seed project");
            }

            Self {
                storage,
                pm,
                member,
                stakeholder,
                outsider,
                agile,
                traditional,
                foreign,
            }
        }

        fn header(&self, project: &Project, name: &str) -> ArtifactHeader {
            ArtifactHeader::new(project.project_id, self.pm.user_id, name)
        }

        async fn insert(&self, artifact: Artifact) -> Artifact {
            self.storage
                .artifact_insert(&artifact)
                .await
                .expect("insert artifact");
            artifact
        }

        pub async fn add_requirement(&self, project: &Project, name: &str) -> Artifact {
            self.insert(Artifact::Requirement(Requirement {
                header: self.header(project, name),
                requirement_type_id: project
                    .requirement_types
                    .first()
                    .map(|rt| rt.requirement_type_id),
                source: None,
            }))
            .await
        }

        pub async fn add_epic(&self, project: &Project, name: &str) -> Artifact {
            self.insert(Artifact::Epic(Epic {
                header: self.header(project, name),
            }))
            .await
        }

        pub async fn add_user_story(
            &self,
            project: &Project,
            epic_id: ArtifactId,
            name: &str,
        ) -> Artifact {
            self.insert(Artifact::UserStory(UserStory {
                header: self.header(project, name),
                epic_id,
                acceptance_criteria: None,
            }))
            .await
        }

        pub async fn add_feature(&self, project: &Project, name: &str) -> Artifact {
            self.insert(Artifact::Feature(Feature {
                header: self.header(project, name),
            }))
            .await
        }

        pub async fn add_use_case(
            &self,
            project: &Project,
            feature_id: ArtifactId,
            name: &str,
        ) -> Artifact {
            self.insert(Artifact::UseCase(UseCase {
                header: self.header(project, name),
                feature_id,
                actors: None,
                preconditions: None,
                flow: None,
                postconditions: None,
            }))
            .await
        }

        /// Store a link directly, bypassing the linker's kind checks.
        pub async fn link(&self, project: &Project, a: ArtifactId, b: ArtifactId) {
            self.storage
                .trace_insert(&Trace::new(a, b, project.project_id, self.pm.user_id))
                .await
                .expect("insert trace");
        }
    }

    impl Default for TestWorld {
        fn default() -> Self {
            Self::new()
        }
    }

    fn member_of(user: &User, role: GroupRole) -> GroupUser {
        GroupUser {
            user_id: user.user_id,
            user_name: user.name.clone(),
            role,
        }
    }

    fn project(name: &str, project_type: ProjectType, group_id: GroupId) -> Project {
        Project {
            project_id: ProjectId::now_v7(),
            name: name.to_string(),
            description: None,
            project_type,
            group_id,
            requirement_types: vec![requirement_type("Functional"), requirement_type("Quality")],
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for store outcomes.

    use super::*;

    /// Assert that a store result is a NotFound error.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &Result<T, StorageError>) {
        match result {
            Err(StorageError::NotFound { .. }) => {}
            other => panic!("Expected NotFound error, got: {:?}", other),
        }
    }

    /// Assert that two id lists contain the same ids, ignoring order.
    #[track_caller]
    pub fn assert_same_ids(actual: &[ArtifactId], expected: &[ArtifactId]) {
        let mut actual = actual.to_vec();
        let mut expected = expected.to_vec();
        actual.sort();
        expected.sort();
        assert_eq!(actual, expected, "artifact id sets differ");
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use rmt_storage::DirectoryStore;

    #[tokio::test]
    async fn test_world_membership_layout() {
        let world = TestWorld::new();
        let pm_projects = world.storage.projects_for_user(world.pm.user_id).await.unwrap();
        assert_eq!(pm_projects.len(), 2);
        let outsider_projects = world
            .storage
            .projects_for_user(world.outsider.user_id)
            .await
            .unwrap();
        assert_eq!(outsider_projects, vec![world.foreign.clone()]);
    }

    #[test]
    fn test_api_key_lookup() {
        assert_eq!(api_key_for(STAKEHOLDER), "stakeholder-key");
        assert_eq!(api_key_for("nobody"), "unknown-key");
    }
}
