//! Enum types for RMT entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error when parsing an enumeration from its wire name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumParseError {
    /// Enumeration being parsed (e.g. "Priority").
    pub enum_name: &'static str,
    /// The rejected input.
    pub value: String,
}

impl fmt::Display for EnumParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {}: {}", self.enum_name, self.value)
    }
}

impl std::error::Error for EnumParseError {}

/// Generates `as_str`, `ALL`, `Display` and a case-insensitive `FromStr`
/// for a fieldless enum whose serde names are SCREAMING_SNAKE_CASE.
macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire / storage representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = EnumParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
                match normalized.as_str() {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(EnumParseError {
                        enum_name: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

// ============================================================================
// PROJECT / GROUP ENUMS
// ============================================================================

/// Process flavour of a project. Determines which artifact kinds exist in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectType {
    Agile,
    Traditional,
}

wire_enum!(ProjectType {
    Agile => "AGILE",
    Traditional => "TRADITIONAL",
});

/// Role of a user inside a project's group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupRole {
    /// Full edit rights, project administration.
    ProjectManager,
    /// Read and comment only.
    Stakeholder,
    /// Regular team member with edit rights.
    #[default]
    Member,
}

wire_enum!(GroupRole {
    ProjectManager => "PROJECT_MANAGER",
    Stakeholder => "STAKEHOLDER",
    Member => "MEMBER",
});

impl GroupRole {
    /// Whether this role may create, update or delete artifacts and traces.
    pub fn can_edit(&self) -> bool {
        !matches!(self, GroupRole::Stakeholder)
    }
}

// ============================================================================
// ARTIFACT KIND
// ============================================================================

/// Discriminator for the traceable artifact kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactKind {
    Requirement,
    Feature,
    Epic,
    UserStory,
    UseCase,
}

wire_enum!(ArtifactKind {
    Requirement => "REQUIREMENT",
    Feature => "FEATURE",
    Epic => "EPIC",
    UserStory => "USER_STORY",
    UseCase => "USE_CASE",
});

impl ArtifactKind {
    /// Whether artifacts of this kind exist in projects of the given type.
    ///
    /// Requirements belong to both flavours; epics and user stories are
    /// agile-only, features and use cases traditional-only.
    pub fn belongs_to(&self, project_type: ProjectType) -> bool {
        match self {
            ArtifactKind::Requirement => true,
            ArtifactKind::Epic | ArtifactKind::UserStory => project_type == ProjectType::Agile,
            ArtifactKind::Feature | ArtifactKind::UseCase => {
                project_type == ProjectType::Traditional
            }
        }
    }

    /// Kind of the parent artifact, if this kind is nested under another one.
    pub fn parent_kind(&self) -> Option<ArtifactKind> {
        match self {
            ArtifactKind::UserStory => Some(ArtifactKind::Epic),
            ArtifactKind::UseCase => Some(ArtifactKind::Feature),
            _ => None,
        }
    }

    /// Path segment used by the printable document routes.
    pub fn print_segment(&self) -> &'static str {
        match self {
            ArtifactKind::Requirement => "requirement",
            ArtifactKind::Feature => "feature",
            ArtifactKind::Epic => "epic",
            ArtifactKind::UserStory => "userstory",
            ArtifactKind::UseCase => "usecase",
        }
    }

    /// Inverse of [`ArtifactKind::print_segment`].
    pub fn from_print_segment(segment: &str) -> Option<ArtifactKind> {
        ArtifactKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.print_segment() == segment)
    }
}

// ============================================================================
// ARTIFACT ATTRIBUTES
// ============================================================================

/// Priority of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

wire_enum!(Priority {
    Low => "LOW",
    Medium => "MEDIUM",
    High => "HIGH",
    Critical => "CRITICAL",
});

/// Lifecycle state of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    #[default]
    Proposed,
    Approved,
    InProgress,
    Implemented,
    Verified,
    Rejected,
}

wire_enum!(State {
    Proposed => "PROPOSED",
    Approved => "APPROVED",
    InProgress => "IN_PROGRESS",
    Implemented => "IMPLEMENTED",
    Verified => "VERIFIED",
    Rejected => "REJECTED",
});

/// Delivery risk of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Risk {
    #[default]
    Low,
    Medium,
    High,
}

wire_enum!(Risk {
    Low => "LOW",
    Medium => "MEDIUM",
    High => "HIGH",
});

/// Implementation complexity of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Complexity {
    #[default]
    Low,
    Medium,
    High,
}

wire_enum!(Complexity {
    Low => "LOW",
    Medium => "MEDIUM",
    High => "HIGH",
});

/// Whether an artifact concerns the system itself, its environment, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scope {
    #[default]
    Internal,
    External,
    Both,
}

wire_enum!(Scope {
    Internal => "INTERNAL",
    External => "EXTERNAL",
    Both => "BOTH",
});
