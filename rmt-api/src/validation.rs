//! Form Validation
//!
//! Artifact forms arrive as `application/x-www-form-urlencoded` bodies with
//! every enumeration as a plain string, so that a bad value becomes a field
//! error on the re-rendered form instead of an extractor rejection.
//! [`ArtifactForm::validate`] turns a form into an [`ArtifactDraft`] or the
//! full list of [`FieldError`]s.

use rmt_core::{
    Artifact, ArtifactHeader, ArtifactKind, Complexity, EnumParseError, FieldError, Priority,
    Project, RequirementTypeId, Risk, Scope, State,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ApiError, ApiResult};

/// Maximum length of an artifact name.
pub const NAME_MAX_LEN: usize = 200;

/// Maximum length of any free-text field.
pub const TEXT_MAX_LEN: usize = 5000;

// ============================================================================
// SIMPLE CHECKS
// ============================================================================

/// Trait for validating non-empty strings.
pub trait ValidateNonEmpty {
    /// # Errors
    /// Returns `ApiError::missing_field` if the value is empty or whitespace-only.
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()>;
}

impl ValidateNonEmpty for str {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        if self.trim().is_empty() {
            return Err(ApiError::missing_field(field_name));
        }
        Ok(())
    }
}

impl ValidateNonEmpty for String {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        self.as_str().validate_non_empty(field_name)
    }
}

/// Trait for validating string length.
pub trait ValidateMaxLen {
    fn validate_max_len(&self, field_name: &str, max: usize) -> ApiResult<()>;
}

impl ValidateMaxLen for str {
    fn validate_max_len(&self, field_name: &str, max: usize) -> ApiResult<()> {
        if self.chars().count() > max {
            return Err(ApiError::invalid_input(format!(
                "{} must be at most {} characters",
                field_name, max
            )));
        }
        Ok(())
    }
}

impl ValidateMaxLen for String {
    fn validate_max_len(&self, field_name: &str, max: usize) -> ApiResult<()> {
        self.as_str().validate_max_len(field_name, max)
    }
}

// ============================================================================
// FIELD CHECKER
// ============================================================================

/// Collects every field error of a form instead of stopping at the first.
#[derive(Debug, Default)]
pub struct FieldChecker {
    errors: Vec<FieldError>,
}

impl FieldChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Trimmed value of a required text field.
    pub fn required_text(&mut self, field: &str, value: &str, max: usize) -> String {
        let value = value.trim();
        if value.is_empty() {
            self.push(field, "must not be empty");
        } else if value.chars().count() > max {
            self.push(field, format!("must be at most {} characters", max));
        }
        value.to_string()
    }

    /// Optional text field; blank means absent.
    pub fn optional_text(&mut self, field: &str, value: &str, max: usize) -> Option<String> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        if value.chars().count() > max {
            self.push(field, format!("must be at most {} characters", max));
        }
        Some(value.to_string())
    }

    /// Required enumeration value, parsed from its wire name.
    pub fn enumeration<T>(&mut self, field: &str, value: &str) -> Option<T>
    where
        T: FromStr<Err = EnumParseError>,
    {
        if value.trim().is_empty() {
            self.push(field, "must not be empty");
            return None;
        }
        match value.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                self.push(field, e.to_string());
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }
}

// ============================================================================
// DRAFTS
// ============================================================================

/// Validated attributes shared by every kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftHeader {
    pub name: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub state: State,
    pub risk: Risk,
    pub complexity: Complexity,
    pub scope: Scope,
}

impl DraftHeader {
    /// Copy the validated attributes onto a stored header.
    pub fn apply_to(&self, header: &mut ArtifactHeader) {
        header.name = self.name.clone();
        header.description = self.description.clone();
        header.priority = self.priority;
        header.state = self.state;
        header.risk = self.risk;
        header.complexity = self.complexity;
        header.scope = self.scope;
    }
}

/// Validated kind-specific fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftBody {
    Requirement {
        requirement_type_id: Option<RequirementTypeId>,
        source: Option<String>,
    },
    Feature,
    Epic,
    UserStory {
        acceptance_criteria: Option<String>,
    },
    UseCase {
        actors: Option<String>,
        preconditions: Option<String>,
        flow: Option<String>,
        postconditions: Option<String>,
    },
}

impl DraftBody {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            DraftBody::Requirement { .. } => ArtifactKind::Requirement,
            DraftBody::Feature => ArtifactKind::Feature,
            DraftBody::Epic => ArtifactKind::Epic,
            DraftBody::UserStory { .. } => ArtifactKind::UserStory,
            DraftBody::UseCase { .. } => ArtifactKind::UseCase,
        }
    }
}

/// A form that passed validation, ready for create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDraft {
    pub header: DraftHeader,
    pub body: DraftBody,
}

impl ArtifactDraft {
    pub fn kind(&self) -> ArtifactKind {
        self.body.kind()
    }
}

// ============================================================================
// FORMS
// ============================================================================

/// Fields present on every artifact form. Omitted fields take the blank-form
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommonFields {
    pub name: String,
    pub description: String,
    pub priority: String,
    pub state: String,
    pub risk: String,
    pub complexity: String,
    pub scope: String,
}

/// A blank form has every enumeration preselected to its default.
impl Default for CommonFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            priority: Priority::default().to_string(),
            state: State::default().to_string(),
            risk: Risk::default().to_string(),
            complexity: Complexity::default().to_string(),
            scope: Scope::default().to_string(),
        }
    }
}

impl From<&ArtifactHeader> for CommonFields {
    fn from(header: &ArtifactHeader) -> Self {
        Self {
            name: header.name.clone(),
            description: header.description.clone().unwrap_or_default(),
            priority: header.priority.to_string(),
            state: header.state.to_string(),
            risk: header.risk.to_string(),
            complexity: header.complexity.to_string(),
            scope: header.scope.to_string(),
        }
    }
}

impl CommonFields {
    fn check(&self, check: &mut FieldChecker) -> Option<DraftHeader> {
        let name = check.required_text("name", &self.name, NAME_MAX_LEN);
        let description = check.optional_text("description", &self.description, TEXT_MAX_LEN);
        let priority = check.enumeration("priority", &self.priority);
        let state = check.enumeration("state", &self.state);
        let risk = check.enumeration("risk", &self.risk);
        let complexity = check.enumeration("complexity", &self.complexity);
        let scope = check.enumeration("scope", &self.scope);

        Some(DraftHeader {
            name,
            description,
            priority: priority?,
            state: state?,
            risk: risk?,
            complexity: complexity?,
            scope: scope?,
        })
    }
}

/// A create/update form for one artifact kind.
pub trait ArtifactForm:
    Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static
{
    const KIND: ArtifactKind;

    fn common(&self) -> &CommonFields;

    /// Check the kind-specific fields.
    fn check_body(&self, project: &Project, check: &mut FieldChecker) -> DraftBody;

    /// Prefill the form from a stored artifact of the same kind.
    fn from_artifact(artifact: &Artifact) -> Self;

    /// Validate against `project`, collecting every field error.
    fn validate(&self, project: &Project) -> Result<ArtifactDraft, Vec<FieldError>> {
        let mut check = FieldChecker::new();
        if !Self::KIND.belongs_to(project.project_type) {
            check.push(
                "kind",
                format!(
                    "{} artifacts are not part of {} projects",
                    Self::KIND,
                    project.project_type
                ),
            );
        }
        let header = self.common().check(&mut check);
        let body = self.check_body(project, &mut check);

        match header {
            Some(header) if check.is_empty() => Ok(ArtifactDraft { header, body }),
            _ => Err(check.into_errors()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementForm {
    #[serde(flatten)]
    pub common: CommonFields,
    #[serde(default)]
    pub requirement_type_id: String,
    #[serde(default)]
    pub source: String,
}

impl ArtifactForm for RequirementForm {
    const KIND: ArtifactKind = ArtifactKind::Requirement;

    fn common(&self) -> &CommonFields {
        &self.common
    }

    fn check_body(&self, project: &Project, check: &mut FieldChecker) -> DraftBody {
        let raw = self.requirement_type_id.trim();
        let requirement_type_id = if raw.is_empty() {
            None
        } else {
            match raw.parse::<RequirementTypeId>() {
                Ok(id) if project.requirement_type(id).is_some() => Some(id),
                Ok(_) => {
                    check.push("requirementTypeId", "is not a requirement type of this project");
                    None
                }
                Err(_) => {
                    check.push("requirementTypeId", "must be a valid id");
                    None
                }
            }
        };

        DraftBody::Requirement {
            requirement_type_id,
            source: check.optional_text("source", &self.source, TEXT_MAX_LEN),
        }
    }

    fn from_artifact(artifact: &Artifact) -> Self {
        match artifact {
            Artifact::Requirement(r) => Self {
                common: CommonFields::from(&r.header),
                requirement_type_id: r
                    .requirement_type_id
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
                source: r.source.clone().unwrap_or_default(),
            },
            other => Self {
                common: CommonFields::from(other.header()),
                ..Self::default()
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureForm {
    #[serde(flatten)]
    pub common: CommonFields,
}

impl ArtifactForm for FeatureForm {
    const KIND: ArtifactKind = ArtifactKind::Feature;

    fn common(&self) -> &CommonFields {
        &self.common
    }

    fn check_body(&self, _project: &Project, _check: &mut FieldChecker) -> DraftBody {
        DraftBody::Feature
    }

    fn from_artifact(artifact: &Artifact) -> Self {
        Self {
            common: CommonFields::from(artifact.header()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpicForm {
    #[serde(flatten)]
    pub common: CommonFields,
}

impl ArtifactForm for EpicForm {
    const KIND: ArtifactKind = ArtifactKind::Epic;

    fn common(&self) -> &CommonFields {
        &self.common
    }

    fn check_body(&self, _project: &Project, _check: &mut FieldChecker) -> DraftBody {
        DraftBody::Epic
    }

    fn from_artifact(artifact: &Artifact) -> Self {
        Self {
            common: CommonFields::from(artifact.header()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStoryForm {
    #[serde(flatten)]
    pub common: CommonFields,
    #[serde(default)]
    pub acceptance_criteria: String,
}

impl ArtifactForm for UserStoryForm {
    const KIND: ArtifactKind = ArtifactKind::UserStory;

    fn common(&self) -> &CommonFields {
        &self.common
    }

    fn check_body(&self, _project: &Project, check: &mut FieldChecker) -> DraftBody {
        DraftBody::UserStory {
            acceptance_criteria: check.optional_text(
                "acceptanceCriteria",
                &self.acceptance_criteria,
                TEXT_MAX_LEN,
            ),
        }
    }

    fn from_artifact(artifact: &Artifact) -> Self {
        match artifact {
            Artifact::UserStory(s) => Self {
                common: CommonFields::from(&s.header),
                acceptance_criteria: s.acceptance_criteria.clone().unwrap_or_default(),
            },
            other => Self {
                common: CommonFields::from(other.header()),
                ..Self::default()
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseCaseForm {
    #[serde(flatten)]
    pub common: CommonFields,
    #[serde(default)]
    pub actors: String,
    #[serde(default)]
    pub preconditions: String,
    #[serde(default)]
    pub flow: String,
    #[serde(default)]
    pub postconditions: String,
}

impl ArtifactForm for UseCaseForm {
    const KIND: ArtifactKind = ArtifactKind::UseCase;

    fn common(&self) -> &CommonFields {
        &self.common
    }

    fn check_body(&self, _project: &Project, check: &mut FieldChecker) -> DraftBody {
        DraftBody::UseCase {
            actors: check.optional_text("actors", &self.actors, TEXT_MAX_LEN),
            preconditions: check.optional_text("preconditions", &self.preconditions, TEXT_MAX_LEN),
            flow: check.optional_text("flow", &self.flow, TEXT_MAX_LEN),
            postconditions: check.optional_text(
                "postconditions",
                &self.postconditions,
                TEXT_MAX_LEN,
            ),
        }
    }

    fn from_artifact(artifact: &Artifact) -> Self {
        match artifact {
            Artifact::UseCase(u) => Self {
                common: CommonFields::from(&u.header),
                actors: u.actors.clone().unwrap_or_default(),
                preconditions: u.preconditions.clone().unwrap_or_default(),
                flow: u.flow.clone().unwrap_or_default(),
                postconditions: u.postconditions.clone().unwrap_or_default(),
            },
            other => Self {
                common: CommonFields::from(other.header()),
                ..Self::default()
            },
        }
    }
}

/// Body of `POST /project/:project_id/trace/:id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceForm {
    #[serde(default)]
    pub trace_id: String,
}

/// Body of `POST /project/:project_id/comment/:id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}
