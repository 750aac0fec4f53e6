//! Access Gate
//!
//! Decides whether a principal may read, comment on or edit a project's
//! artifacts, and which role they hold in the project's group. Every request
//! recomputes its grant; nothing is cached.

use crate::error::{ApiError, ApiResult};
use rmt_core::{Group, GroupRole, Project, ProjectId, User};
use rmt_storage::{DirectoryStore, Storage};
use std::fmt;
use std::sync::{Arc, Mutex};

// ============================================================================
// ACTIONS & GRANTS
// ============================================================================

/// What the caller is trying to do with a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// View dashboards, details and printable documents.
    Read,
    /// Add comments. Allowed for every group role.
    Comment,
    /// Create, update or delete artifacts and traces.
    Edit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Read => "read",
            Action::Comment => "comment",
            Action::Edit => "edit",
        })
    }
}

/// Everything a handler needs to know about an authorized caller.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub user: User,
    pub project: Project,
    /// Every project the user may access (for navigation).
    pub projects: Vec<Project>,
    pub group: Group,
    pub role: GroupRole,
    pub is_pm: bool,
    pub is_stakeholder: bool,
}

// ============================================================================
// SECURITY LOG
// ============================================================================

/// Why an access attempt was refused. Never exposed to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    UnknownUser,
    UnknownProject,
    NotAMember,
    ReadOnlyRole,
}

/// A refused access attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDenial {
    pub principal: String,
    pub project_id: ProjectId,
    pub action: Action,
    pub reason: DenialReason,
}

/// Sink for security-relevant events, injected into the gate.
pub trait SecurityLog: Send + Sync {
    fn access_denied(&self, denial: &AccessDenial);
}

/// Emits denials as structured `tracing` events under `rmt::security`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSecurityLog;

impl SecurityLog for TracingSecurityLog {
    fn access_denied(&self, denial: &AccessDenial) {
        tracing::warn!(
            target: "rmt::security",
            principal = %denial.principal,
            project_id = %denial.project_id,
            action = %denial.action,
            reason = ?denial.reason,
            "Access denied"
        );
    }
}

/// Keeps denials in memory so tests can assert on them.
#[derive(Debug, Default)]
pub struct RecordingSecurityLog {
    denials: Mutex<Vec<AccessDenial>>,
}

impl RecordingSecurityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded denials, oldest first.
    pub fn denials(&self) -> Vec<AccessDenial> {
        match self.denials.lock() {
            Ok(denials) => denials.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl SecurityLog for RecordingSecurityLog {
    fn access_denied(&self, denial: &AccessDenial) {
        match self.denials.lock() {
            Ok(mut denials) => denials.push(denial.clone()),
            Err(poisoned) => poisoned.into_inner().push(denial.clone()),
        }
    }
}

// ============================================================================
// ACCESS GATE
// ============================================================================

#[derive(Clone)]
pub struct AccessGate {
    store: Arc<dyn Storage>,
    security_log: Arc<dyn SecurityLog>,
}

impl fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGate").finish_non_exhaustive()
    }
}

impl AccessGate {
    pub fn new(store: Arc<dyn Storage>, security_log: Arc<dyn SecurityLog>) -> Self {
        Self {
            store,
            security_log,
        }
    }

    /// True iff `target` is one of `user_projects`.
    pub fn is_allowed(user_projects: &[Project], target: ProjectId) -> bool {
        user_projects.iter().any(|p| p.project_id == target)
    }

    /// Every project whose group lists the user.
    pub async fn projects_for(&self, user: &User) -> ApiResult<Vec<Project>> {
        Ok(self.store.projects_for_user(user.user_id).await?)
    }

    /// The user's role in the project's group, if they are a member.
    pub async fn role_in(&self, user: &User, project: &Project) -> ApiResult<Option<GroupRole>> {
        let group = self.store.group_get(project.group_id).await?;
        Ok(group.and_then(|g| g.role_of(user.user_id)))
    }

    pub async fn is_pm(&self, user: &User, project: &Project) -> ApiResult<bool> {
        Ok(self.role_in(user, project).await? == Some(GroupRole::ProjectManager))
    }

    pub async fn is_stakeholder(&self, user: &User, project: &Project) -> ApiResult<bool> {
        Ok(self.role_in(user, project).await? == Some(GroupRole::Stakeholder))
    }

    /// Resolve the principal and check it may perform `action` on the project.
    ///
    /// Unknown users, unknown projects and non-members all produce the same
    /// 403 so callers cannot discover which projects exist. Stakeholders may
    /// read and comment but not edit. Each denial is reported to the
    /// security log.
    pub async fn authorize(
        &self,
        principal: &str,
        project_id: ProjectId,
        action: Action,
    ) -> ApiResult<AccessGrant> {
        let deny = |reason: DenialReason| {
            self.security_log.access_denied(&AccessDenial {
                principal: principal.to_string(),
                project_id,
                action,
                reason,
            });
            ApiError::forbidden(format!("Access denied to project {}", project_id))
        };

        let Some(user) = self.store.user_find_by_name(principal).await? else {
            return Err(deny(DenialReason::UnknownUser));
        };

        let projects = self.projects_for(&user).await?;

        let Some(project) = self.store.project_get(project_id).await? else {
            return Err(deny(DenialReason::UnknownProject));
        };

        if !Self::is_allowed(&projects, project_id) {
            return Err(deny(DenialReason::NotAMember));
        }

        let group = self
            .store
            .group_get(project.group_id)
            .await?
            .ok_or_else(|| ApiError::entity_not_found("Group", project.group_id))?;

        let Some(role) = group.role_of(user.user_id) else {
            return Err(deny(DenialReason::NotAMember));
        };

        if action == Action::Edit && !role.can_edit() {
            return Err(deny(DenialReason::ReadOnlyRole));
        }

        tracing::debug!(
            principal,
            %project_id,
            %action,
            role = %role,
            "Access granted"
        );

        Ok(AccessGrant {
            is_pm: role == GroupRole::ProjectManager,
            is_stakeholder: role == GroupRole::Stakeholder,
            user,
            project,
            projects,
            group,
            role,
        })
    }
}
