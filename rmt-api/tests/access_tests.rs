//! Authentication and project access through the full router.
//!
//! - Requests without valid credentials are rejected with 401
//! - Every group role may read; only stakeholders are refused edits
//! - Unknown projects, foreign projects and unknown users share one 403

mod support;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use proptest::prelude::*;
use rmt_api::{generate_jwt_token, Action, DenialReason, ErrorCode};
use rmt_core::{EntityIdType, ProjectId};
use rmt_test_utils::fixtures::{MEMBER, OUTSIDER, PM, STAKEHOLDER};
use support::TestApp;

#[tokio::test]
async fn test_missing_credentials_is_unauthorized() {
    let app = TestApp::new();
    let uri = format!("/project/{}/requirements", app.world.agile.project_id);
    let request = Request::builder().uri(&uri).body(Body::empty()).unwrap();

    let reply = app.send(request).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_unknown_api_key_is_unauthorized() {
    let app = TestApp::new();
    let uri = format!("/project/{}/requirements", app.world.agile.project_id);
    let request = Request::builder()
        .uri(&uri)
        .header("x-api-key", "stolen-key")
        .body(Body::empty())
        .unwrap();

    assert_eq!(app.send(request).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bearer_token_is_accepted() {
    let app = TestApp::new();
    let token = generate_jwt_token(&app.auth_config, MEMBER).unwrap();
    let uri = format!("/project/{}/epics", app.world.agile.project_id);
    let request = Request::builder()
        .uri(&uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let reply = app.send(request).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.model()["user"], MEMBER);
}

#[tokio::test]
async fn test_unmatched_path_is_not_found_without_credentials() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/no/such/page")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_needs_no_credentials() {
    let app = TestApp::new();
    let ping = Request::builder()
        .uri("/health/ping")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(ping).await.status, StatusCode::OK);

    let ready = Request::builder()
        .uri("/health/ready")
        .body(Body::empty())
        .unwrap();
    let reply = app.send(ready).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_reports_store_outage() {
    let app = TestApp::new();
    app.world.storage.set_unavailable(true);
    let ready = Request::builder()
        .uri("/health/ready")
        .body(Body::empty())
        .unwrap();
    let reply = app.send(ready).await;
    assert_eq!(reply.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(reply.body["details"]["store"]["status"], "unhealthy");
}

#[tokio::test]
async fn test_dashboard_carries_common_model() {
    let app = TestApp::new();
    let project = &app.world.agile;
    let reply = app
        .get(PM, &format!("/project/{}/requirements", project.project_id))
        .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.view(), "requirementsDashboard");
    let model = reply.model();
    assert_eq!(model["project"]["name"], project.name.as_str());
    assert_eq!(model["projectList"].as_array().unwrap().len(), 2);
    assert_eq!(model["isPM"], true);
    assert_eq!(model["group"].as_array().unwrap().len(), 3);
    assert_eq!(model["requirementList"], serde_json::json!([]));
    assert_eq!(model["reqTypes"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_and_foreign_projects_look_alike() {
    let app = TestApp::new();
    let unknown = ProjectId::now_v7();
    let foreign = app.world.foreign.project_id;

    let a = app
        .get(MEMBER, &format!("/project/{}/epics", unknown))
        .await;
    let b = app
        .get(MEMBER, &format!("/project/{}/epics", foreign))
        .await;

    assert_eq!(a.status, StatusCode::FORBIDDEN);
    assert_eq!(b.status, StatusCode::FORBIDDEN);
    assert_eq!(a.body["code"], b.body["code"]);
    assert_eq!(
        a.body["message"],
        format!("Access denied to project {}", unknown)
    );
    assert_eq!(
        b.body["message"],
        format!("Access denied to project {}", foreign)
    );

    let reasons: Vec<_> = app
        .security_log
        .denials()
        .into_iter()
        .map(|d| d.reason)
        .collect();
    assert_eq!(
        reasons,
        vec![DenialReason::UnknownProject, DenialReason::NotAMember]
    );
}

#[tokio::test]
async fn test_principal_without_directory_entry_is_forbidden() {
    let app = TestApp::new();
    let reply = app
        .get("ghost", &format!("/project/{}/epics", app.world.agile.project_id))
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(app.security_log.denials()[0].reason, DenialReason::UnknownUser);
}

#[tokio::test]
async fn test_stakeholder_reads_but_cannot_edit() {
    let app = TestApp::new();
    let project = &app.world.agile;
    let epic = app.world.add_epic(project, "Checkout").await;

    let detail = app
        .get(
            STAKEHOLDER,
            &format!("/project/{}/epic/{}", project.project_id, epic.id()),
        )
        .await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.model()["isStakeholder"], true);
    assert_eq!(detail.model()["isPM"], false);

    let update = app
        .post_form(
            STAKEHOLDER,
            &format!("/project/{}/epic/{}/update", project.project_id, epic.id()),
            &[("name", "Renamed")],
        )
        .await;
    assert_eq!(update.status, StatusCode::FORBIDDEN);
    assert_eq!(update.body["code"], "FORBIDDEN");

    let create_view = app
        .get(
            STAKEHOLDER,
            &format!("/project/{}/epics/create", project.project_id),
        )
        .await;
    assert_eq!(create_view.status, StatusCode::FORBIDDEN);

    let delete = app
        .delete(
            STAKEHOLDER,
            &format!("/project/{}/epic/{}", project.project_id, epic.id()),
        )
        .await;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);
    assert_eq!(app.world.storage.artifact_count().unwrap(), 1);

    let denials = app.security_log.denials();
    assert_eq!(denials.len(), 3);
    assert!(denials
        .iter()
        .all(|d| d.action == Action::Edit && d.reason == DenialReason::ReadOnlyRole));
}

#[tokio::test]
async fn test_outsider_sees_own_project_only() {
    let app = TestApp::new();
    let own = app
        .get(
            OUTSIDER,
            &format!("/project/{}/epics", app.world.foreign.project_id),
        )
        .await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.model()["projectList"].as_array().unwrap().len(), 1);

    let other = app
        .get(
            OUTSIDER,
            &format!("/project/{}/epics", app.world.agile.project_id),
        )
        .await;
    assert_eq!(other.status, StatusCode::FORBIDDEN);
    assert_eq!(other.body["code"], serde_json::to_value(ErrorCode::Forbidden).unwrap());
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Target {
    Agile,
    Traditional,
    Foreign,
    Unknown,
}

fn target_strategy() -> impl Strategy<Value = Target> {
    prop_oneof![
        Just(Target::Agile),
        Just(Target::Traditional),
        Just(Target::Foreign),
        Just(Target::Unknown),
    ]
}

fn principal_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![PM, MEMBER, STAKEHOLDER, OUTSIDER, "ghost"])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    /// A dashboard opens exactly when the principal belongs to the owning
    /// group; every other combination is the same 403.
    #[test]
    fn prop_read_access_iff_membership(
        principal in principal_strategy(),
        target in target_strategy(),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let app = TestApp::new();
            let project_id = match target {
                Target::Agile => app.world.agile.project_id,
                Target::Traditional => app.world.traditional.project_id,
                Target::Foreign => app.world.foreign.project_id,
                Target::Unknown => ProjectId::now_v7(),
            };
            let member = match target {
                Target::Agile | Target::Traditional => {
                    [PM, MEMBER, STAKEHOLDER].contains(&principal)
                }
                Target::Foreign => principal == OUTSIDER,
                Target::Unknown => false,
            };

            let reply = app
                .get(principal, &format!("/project/{}/requirements", project_id))
                .await;

            if member {
                prop_assert_eq!(reply.status, StatusCode::OK);
            } else {
                prop_assert_eq!(reply.status, StatusCode::FORBIDDEN);
                prop_assert_eq!(
                    reply.body["message"].as_str().unwrap_or_default(),
                    format!("Access denied to project {}", project_id)
                );
            }
            Ok(())
        })?;
    }
}
