//! HTTP Routes Module
//!
//! Page and action routes for artifacts, traces, comments and printable
//! documents, plus unauthenticated health checks.

pub mod artifact;
pub mod comment;
pub mod health;
pub mod print;
pub mod trace;

use std::time::Duration;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::middleware::{auth_middleware, AuthMiddlewareState};
use crate::state::AppState;

// ============================================================================
// ROUTER BUILDER
// ============================================================================

/// Builder for the application router with authentication on every page
/// and action route.
pub struct RouterBuilder {
    state: AppState,
    api_config: ApiConfig,
    auth_state: AuthMiddlewareState,
}

impl RouterBuilder {
    /// In production, refuses to build with insecure auth or CORS settings.
    pub fn new(state: AppState, api_config: ApiConfig, auth_config: AuthConfig) -> ApiResult<Self> {
        auth_config.validate_for_production(api_config.is_production())?;
        api_config.validate_for_production()?;

        Ok(Self {
            state,
            api_config,
            auth_state: AuthMiddlewareState::new(auth_config),
        })
    }

    /// Routes that need an authenticated principal.
    fn build_protected_routes(&self) -> Router<AppState> {
        Router::new()
            .merge(artifact::create_router())
            .merge(trace::create_router())
            .merge(comment::create_router())
            .merge(print::create_router())
    }

    /// Build the complete router.
    ///
    /// Auth is a route layer, so unknown paths answer 404 rather than 401.
    /// Execution order: CORS -> request tracing -> auth -> handler.
    pub fn build(self) -> Router {
        let protected = self
            .build_protected_routes()
            .route_layer(from_fn_with_state(self.auth_state.clone(), auth_middleware));

        let cors = build_cors_layer(&self.api_config);

        Router::new()
            .merge(protected)
            .nest("/health", health::create_router())
            .with_state(self.state)
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }
}

/// Build the complete application router.
pub fn create_app_router(
    state: AppState,
    api_config: &ApiConfig,
    auth_config: AuthConfig,
) -> ApiResult<Router> {
    RouterBuilder::new(state, api_config.clone(), auth_config).map(RouterBuilder::build)
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// In production mode, only allows configured origins.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-api-key"),
        ])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any).allow_headers(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        if config.cors_allow_credentials {
            cors.allow_origin(origins).allow_credentials(true)
        } else {
            cors.allow_origin(origins)
        }
    }
}
