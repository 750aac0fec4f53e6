//! RMT API - HTTP Layer for Requirements Management and Traceability
//!
//! Axum routes for project artifacts (requirements, features, epics, user
//! stories, use cases), their traceability links, comments and printable
//! documents. Every page answers with a named view model serialized as JSON.
//!
//! Requests are authenticated by API key or JWT; the [`AccessGate`] then
//! decides per request whether the principal may act on the project.

pub mod access;
pub mod auth;
pub mod config;
pub mod error;
pub mod macros;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod validation;
pub mod views;

// Re-export commonly used types
pub use access::{
    AccessDenial, AccessGate, AccessGrant, Action, DenialReason, RecordingSecurityLog,
    SecurityLog, TracingSecurityLog,
};
pub use auth::{
    authenticate, authenticate_api_key, authenticate_jwt, generate_jwt_token, validate_jwt_token,
    AuthConfig, AuthContext, AuthMethod, Claims,
};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{auth_middleware, AuthExtractor, AuthMiddlewareState};
pub use routes::{create_app_router, RouterBuilder};
pub use services::{
    ArtifactService, CommentService, LinkOutcome, NotTracedCandidates, Traceability,
    TraceabilityService,
};
pub use state::AppState;
pub use views::View;
