//! Error types for RMT operations

use crate::{ArtifactId, ArtifactKind, EntityIdType, ProjectId, ProjectType};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Insert failed for {entity}: {reason}")]
    InsertFailed { entity: &'static str, reason: String },

    #[error("Update failed for {entity} with id {id}: {reason}")]
    UpdateFailed {
        entity: &'static str,
        id: Uuid,
        reason: String,
    },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Storage unavailable")]
    Unavailable,

    #[error("Invalid seed data: {reason}")]
    InvalidSeed { reason: String },
}

impl StorageError {
    /// Not-found error for a typed id.
    pub fn not_found<I: EntityIdType>(id: I) -> Self {
        StorageError::NotFound {
            entity: I::ENTITY_NAME,
            id: id.as_uuid(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

/// Traceability link errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TraceError {
    #[error("Artifact {id} cannot be traced to itself")]
    SelfLink { id: ArtifactId },

    #[error("Artifacts {source_id} and {target_id} belong to different projects")]
    CrossProject {
        source_id: ArtifactId,
        target_id: ArtifactId,
    },

    #[error("{kind} artifacts do not exist in {project_type} project {project_id}")]
    KindNotInProcess {
        kind: ArtifactKind,
        project_type: ProjectType,
        project_id: ProjectId,
    },
}

/// A single rejected form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all RMT errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RmtError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for RMT operations.
pub type RmtResult<T> = Result<T, RmtError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::not_found(ArtifactId::nil());
        let msg = err.to_string();
        assert!(msg.contains("Entity not found"));
        assert!(msg.contains("Artifact"));
        assert!(msg.contains("00000000-0000-0000-0000-000000000000"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_trace_error_display_cross_project() {
        let err = TraceError::CrossProject {
            source_id: ArtifactId::nil(),
            target_id: ArtifactId::nil(),
        };
        assert!(err.to_string().contains("different projects"));
    }

    #[test]
    fn test_rmt_error_from_conversions() {
        let err: RmtError = StorageError::LockPoisoned.into();
        assert!(matches!(err, RmtError::Storage(StorageError::LockPoisoned)));

        let err: RmtError = TraceError::SelfLink { id: ArtifactId::nil() }.into();
        assert!(err.to_string().starts_with("Trace error"));
    }
}
