//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use rmt_storage::Storage;

use crate::access::{AccessGate, SecurityLog};
use crate::services::{ArtifactService, CommentService, TraceabilityService};

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub gate: AccessGate,
    pub artifacts: ArtifactService,
    pub traceability: TraceabilityService,
    pub comments: CommentService,
    pub start_time: Instant,
}

impl AppState {
    /// Wire every service to one store and one security log.
    pub fn new(store: Arc<dyn Storage>, security_log: Arc<dyn SecurityLog>) -> Self {
        Self {
            gate: AccessGate::new(store.clone(), security_log),
            artifacts: ArtifactService::new(store.clone()),
            traceability: TraceabilityService::new(store.clone()),
            comments: CommentService::new(store.clone()),
            store,
            start_time: Instant::now(),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("uptime_secs", &self.start_time.elapsed().as_secs())
            .finish_non_exhaustive()
    }
}

crate::impl_from_ref!(Arc<dyn Storage>, store);
crate::impl_from_ref!(AccessGate, gate);
crate::impl_from_ref!(ArtifactService, artifacts);
crate::impl_from_ref!(TraceabilityService, traceability);
crate::impl_from_ref!(CommentService, comments);
crate::impl_from_ref!(Instant, start_time);
