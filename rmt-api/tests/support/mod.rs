//! Shared harness for the router-level tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use rmt_api::{ApiConfig, AppState, AuthConfig, RecordingSecurityLog, RouterBuilder};
use rmt_test_utils::fixtures::{api_key_for, TestWorld, API_KEYS};
use serde_json::Value;
use tower::ServiceExt;

/// Full router over a seeded [`TestWorld`].
pub struct TestApp {
    pub world: TestWorld,
    pub router: Router,
    pub security_log: Arc<RecordingSecurityLog>,
    pub auth_config: AuthConfig,
}

/// Status, `Location` header and parsed body (`Null` when empty) of one call.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Value,
    pub raw_len: usize,
}

impl Reply {
    /// Last path segment of the redirect target.
    pub fn redirect_id(&self) -> String {
        let location = self.location.as_deref().expect("redirect location");
        location
            .rsplit('/')
            .next()
            .expect("location segment")
            .to_string()
    }

    pub fn view(&self) -> &str {
        self.body["view"].as_str().unwrap_or_default()
    }

    pub fn model(&self) -> &Value {
        &self.body["model"]
    }
}

pub fn test_auth_config() -> AuthConfig {
    let mut config = AuthConfig::default();
    for (key, principal) in API_KEYS {
        config.add_api_key(*key, *principal);
    }
    config
}

impl TestApp {
    pub fn new() -> Self {
        let world = TestWorld::new();
        let security_log = Arc::new(RecordingSecurityLog::new());
        let state = AppState::new(Arc::new(world.storage.clone()), security_log.clone());
        let auth_config = test_auth_config();
        let router = RouterBuilder::new(state, ApiConfig::default(), auth_config.clone())
            .expect("router builder")
            .build();
        Self {
            world,
            router,
            security_log,
            auth_config,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Reply {
        let response: Response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        Reply {
            status,
            location,
            body,
            raw_len: bytes.len(),
        }
    }

    pub async fn get(&self, principal: &str, uri: &str) -> Reply {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header("x-api-key", api_key_for(principal))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn delete(&self, principal: &str, uri: &str) -> Reply {
        let request = Request::builder()
            .method("DELETE")
            .uri(uri)
            .header("x-api-key", api_key_for(principal))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_form(&self, principal: &str, uri: &str, fields: &[(&str, &str)]) -> Reply {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("x-api-key", api_key_for(principal))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form_body(fields)))
            .unwrap();
        self.send(request).await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// `application/x-www-form-urlencoded` encoding of `fields`.
pub fn form_body(fields: &[(&str, &str)]) -> String {
    serde_urlencoded::to_string(fields).expect("form fields encode")
}

/// Ids of the artifacts in a JSON list.
pub fn ids(list: &Value) -> Vec<String> {
    list.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["artifact_id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
