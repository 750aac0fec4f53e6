//! Artifact pages through the full router: create, read, update, delete for
//! every kind, nested under epics and features where required.

mod support;

use axum::http::StatusCode;
use rmt_core::{ArtifactId, EntityIdType};
use rmt_test_utils::fixtures::{MEMBER, PM};
use support::{ids, TestApp};

#[tokio::test]
async fn test_requirement_create_redirects_to_detail() {
    let app = TestApp::new();
    let project = &app.world.agile;
    let type_id = project.requirement_types[1].requirement_type_id.to_string();

    let created = app
        .post_form(
            MEMBER,
            &format!("/project/{}/requirements", project.project_id),
            &[
                ("name", "Login within two seconds"),
                ("priority", "high"),
                ("requirementTypeId", &type_id),
                ("source", "Customer workshop"),
            ],
        )
        .await;
    assert_eq!(created.status, StatusCode::SEE_OTHER);
    let id = created.redirect_id();
    assert_eq!(
        created.location.as_deref(),
        Some(format!("/project/{}/requirement/{}", project.project_id, id).as_str())
    );

    let detail = app.get(MEMBER, created.location.as_deref().unwrap()).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.view(), "requirement");
    let requirement = &detail.model()["requirement"];
    assert_eq!(requirement["name"], "Login within two seconds");
    assert_eq!(requirement["priority"], "HIGH");
    assert_eq!(requirement["requirement_type_id"], type_id.as_str());
    assert_eq!(requirement["author_id"], app.world.member.user_id.to_string().as_str());
    assert_eq!(detail.model()["traceability"]["anchorId"], id.as_str());
    assert!(detail.model()["epicList"].is_array());
    assert!(detail.model()["featureList"].is_null());

    let dashboard = app
        .get(MEMBER, &format!("/project/{}/requirements", project.project_id))
        .await;
    assert_eq!(ids(&dashboard.model()["requirementList"]), vec![id]);
}

#[tokio::test]
async fn test_invalid_form_is_rendered_again() {
    let app = TestApp::new();
    let project = &app.world.traditional;

    let reply = app
        .post_form(
            PM,
            &format!("/project/{}/features", project.project_id),
            &[("name", "   "), ("priority", "urgent"), ("description", "kept")],
        )
        .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.view(), "createFeature");
    let fields: Vec<_> = reply.model()["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(fields, vec!["name", "priority"]);
    assert_eq!(reply.model()["feature"]["description"], "kept");
    assert_eq!(reply.model()["priority"].as_array().unwrap().len(), 4);
    assert_eq!(app.world.storage.artifact_count().unwrap(), 0);
}

#[tokio::test]
async fn test_kind_outside_process_type_is_rejected() {
    let app = TestApp::new();

    let feature_in_agile = app
        .post_form(
            PM,
            &format!("/project/{}/features", app.world.agile.project_id),
            &[("name", "Billing")],
        )
        .await;
    assert_eq!(feature_in_agile.status, StatusCode::OK);
    assert_eq!(feature_in_agile.model()["errors"][0]["field"], "kind");

    let epic_in_traditional = app
        .post_form(
            PM,
            &format!("/project/{}/epics", app.world.traditional.project_id),
            &[("name", "Checkout")],
        )
        .await;
    assert_eq!(epic_in_traditional.status, StatusCode::OK);
    assert_eq!(epic_in_traditional.model()["errors"][0]["field"], "kind");

    assert_eq!(app.world.storage.artifact_count().unwrap(), 0);
}

#[tokio::test]
async fn test_agile_epic_and_user_story_pages() {
    let app = TestApp::new();
    let p = app.world.agile.project_id;

    let epic = app
        .post_form(MEMBER, &format!("/project/{}/epics", p), &[("name", "Checkout")])
        .await;
    assert_eq!(epic.status, StatusCode::SEE_OTHER);
    let epic_id = epic.redirect_id();

    let create_view = app
        .get(
            MEMBER,
            &format!("/project/{}/epic/{}/userstories/create", p, epic_id),
        )
        .await;
    assert_eq!(create_view.status, StatusCode::OK);
    assert_eq!(create_view.view(), "createUserStory");
    assert_eq!(create_view.model()["epicName"], "Checkout");
    assert_eq!(create_view.model()["userStory"]["priority"], "MEDIUM");

    let story = app
        .post_form(
            MEMBER,
            &format!("/project/{}/epic/{}/userstory/create", p, epic_id),
            &[
                ("name", "Pay by card"),
                ("acceptanceCriteria", "Given a cart, when I pay, then I get a receipt"),
            ],
        )
        .await;
    assert_eq!(story.status, StatusCode::SEE_OTHER);
    let story_id = story.redirect_id();
    assert_eq!(
        story.location.as_deref(),
        Some(format!("/project/{}/epic/{}/userstory/{}", p, epic_id, story_id).as_str())
    );

    let detail = app.get(MEMBER, story.location.as_deref().unwrap()).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.view(), "userStory");
    assert_eq!(detail.model()["userStory"]["epic_id"], epic_id.as_str());
    assert_eq!(detail.model()["epicId"], epic_id.as_str());
    assert_eq!(ids(&detail.model()["epicList"]), vec![epic_id.clone()]);

    let under_epic = app
        .get(MEMBER, &format!("/project/{}/epic/{}/userstories", p, epic_id))
        .await;
    assert_eq!(under_epic.view(), "userStoriesDashboard");
    assert_eq!(ids(&under_epic.model()["userStoriesList"]), vec![story_id.clone()]);

    let project_wide = app
        .get(MEMBER, &format!("/project/{}/epics/userstories", p))
        .await;
    assert_eq!(project_wide.view(), "userStoriesDashboardProject");
    assert_eq!(ids(&project_wide.model()["userStoriesList"]), vec![story_id]);
}

#[tokio::test]
async fn test_user_story_under_wrong_epic_is_not_found() {
    let app = TestApp::new();
    let project = &app.world.agile;
    let epic = app.world.add_epic(project, "A").await;
    let other = app.world.add_epic(project, "B").await;
    let story = app.world.add_user_story(project, epic.id(), "S").await;

    let reply = app
        .get(
            MEMBER,
            &format!(
                "/project/{}/epic/{}/userstory/{}",
                project.project_id,
                other.id(),
                story.id()
            ),
        )
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_traditional_use_case_pages() {
    let app = TestApp::new();
    let project = &app.world.traditional;
    let p = project.project_id;
    let feature = app.world.add_feature(project, "Invoicing").await;

    let created = app
        .post_form(
            PM,
            &format!("/project/{}/feature/{}/usecase/create", p, feature.id()),
            &[("name", "Issue invoice"), ("actors", "Clerk"), ("flow", "1. Open order")],
        )
        .await;
    assert_eq!(created.status, StatusCode::SEE_OTHER);
    let use_case_id = created.redirect_id();

    let detail = app.get(PM, created.location.as_deref().unwrap()).await;
    assert_eq!(detail.view(), "useCase");
    assert_eq!(detail.model()["useCase"]["actors"], "Clerk");
    assert_eq!(detail.model()["featureName"], "Invoicing");
    assert!(detail.model()["featureList"].is_array());
    assert!(detail.model()["epicList"].is_null());

    let update_view = app
        .get(
            PM,
            &format!("/project/{}/feature/{}/usecase/update/{}", p, feature.id(), use_case_id),
        )
        .await;
    assert_eq!(update_view.view(), "updateUseCase");
    assert_eq!(update_view.model()["useCase"]["flow"], "1. Open order");
    assert_eq!(update_view.model()["artifactId"], use_case_id.as_str());

    let updated = app
        .post_form(
            PM,
            &format!("/project/{}/feature/{}/usecase/{}", p, feature.id(), use_case_id),
            &[("name", "Issue invoice"), ("actors", "Clerk, Manager")],
        )
        .await;
    assert_eq!(updated.status, StatusCode::SEE_OTHER);
    assert_eq!(updated.redirect_id(), use_case_id);

    let listing = app
        .get(PM, &format!("/project/{}/features/usecases", p))
        .await;
    assert_eq!(listing.view(), "useCasesDashboardProject");
    let list = &listing.model()["useCasesList"];
    assert_eq!(list[0]["actors"], "Clerk, Manager");
    assert!(list[0]["flow"].is_null());
}

#[tokio::test]
async fn test_update_keeps_identity_and_author() {
    let app = TestApp::new();
    let project = &app.world.agile;
    let epic = app.world.add_epic(project, "Search").await;

    let update_view = app
        .get(
            MEMBER,
            &format!("/project/{}/epic/update/{}", project.project_id, epic.id()),
        )
        .await;
    assert_eq!(update_view.view(), "updateEpic");
    assert_eq!(update_view.model()["epic"]["name"], "Search");

    let updated = app
        .post_form(
            MEMBER,
            &format!("/project/{}/epic/{}/update", project.project_id, epic.id()),
            &[("name", "Full-text search"), ("state", "APPROVED")],
        )
        .await;
    assert_eq!(updated.status, StatusCode::SEE_OTHER);

    let detail = app
        .get(MEMBER, updated.location.as_deref().unwrap())
        .await;
    let stored = &detail.model()["epic"];
    assert_eq!(stored["artifact_id"], epic.id().to_string().as_str());
    assert_eq!(stored["name"], "Full-text search");
    assert_eq!(stored["state"], "APPROVED");
    assert_eq!(stored["author_id"], app.world.pm.user_id.to_string().as_str());
}

#[tokio::test]
async fn test_invalid_update_leaves_artifact_untouched() {
    let app = TestApp::new();
    let project = &app.world.agile;
    let epic = app.world.add_epic(project, "Search").await;

    let reply = app
        .post_form(
            MEMBER,
            &format!("/project/{}/epic/{}/update", project.project_id, epic.id()),
            &[("name", "")],
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.view(), "updateEpic");

    let detail = app
        .get(MEMBER, &format!("/project/{}/epic/{}", project.project_id, epic.id()))
        .await;
    assert_eq!(detail.model()["epic"]["name"], "Search");
}

#[tokio::test]
async fn test_artifact_of_other_project_is_not_found() {
    let app = TestApp::new();
    let epic = app.world.add_epic(&app.world.foreign, "Hidden").await;

    let reply = app
        .get(
            MEMBER,
            &format!("/project/{}/epic/{}", app.world.agile.project_id, epic.id()),
        )
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let delete = app
        .delete(
            MEMBER,
            &format!("/project/{}/epic/{}", app.world.agile.project_id, epic.id()),
        )
        .await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);
    assert_eq!(delete.raw_len, 0);
    assert_eq!(app.world.storage.artifact_count().unwrap(), 1);
}

#[tokio::test]
async fn test_delete_epic_cascades() {
    let app = TestApp::new();
    let project = &app.world.agile;
    let p = project.project_id;
    let epic = app.world.add_epic(project, "Checkout").await;
    let story = app.world.add_user_story(project, epic.id(), "Pay").await;
    let requirement = app.world.add_requirement(project, "PCI").await;
    app.world.link(project, story.id(), requirement.id()).await;
    app.world.link(project, epic.id(), requirement.id()).await;

    let reply = app.delete(PM, &format!("/project/{}/epic/{}", p, epic.id())).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.raw_len, 0);

    let story_page = app
        .get(PM, &format!("/project/{}/epic/{}/userstory/{}", p, epic.id(), story.id()))
        .await;
    assert_eq!(story_page.status, StatusCode::NOT_FOUND);
    assert_eq!(app.world.storage.artifact_count().unwrap(), 1);
    assert_eq!(app.world.storage.trace_count().unwrap(), 0);

    let requirement_page = app
        .get(PM, &format!("/project/{}/requirement/{}", p, requirement.id()))
        .await;
    assert_eq!(
        requirement_page.model()["traceability"]["epics"],
        serde_json::json!([])
    );

    let again = app.delete(PM, &format!("/project/{}/epic/{}", p, epic.id())).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    assert_eq!(again.raw_len, 0);
}

#[tokio::test]
async fn test_delete_nested_user_story() {
    let app = TestApp::new();
    let project = &app.world.agile;
    let epic = app.world.add_epic(project, "Checkout").await;
    let story = app.world.add_user_story(project, epic.id(), "Pay").await;

    let reply = app
        .delete(
            MEMBER,
            &format!(
                "/project/{}/epic/{}/userstory/{}",
                project.project_id,
                epic.id(),
                story.id()
            ),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(app.world.storage.artifact_count().unwrap(), 1);
}

#[tokio::test]
async fn test_delete_during_store_outage_is_server_error() {
    let app = TestApp::new();
    let project = &app.world.agile;
    let epic = app.world.add_epic(project, "Checkout").await;

    app.world.storage.set_unavailable(true);
    let reply = app
        .delete(PM, &format!("/project/{}/epic/{}", project.project_id, epic.id()))
        .await;
    app.world.storage.set_unavailable(false);

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.raw_len, 0);
    assert_eq!(app.world.storage.artifact_count().unwrap(), 1);
}

#[tokio::test]
async fn test_unknown_artifact_is_not_found() {
    let app = TestApp::new();
    let reply = app
        .get(
            MEMBER,
            &format!(
                "/project/{}/requirement/{}",
                app.world.agile.project_id,
                ArtifactId::now_v7()
            ),
        )
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["code"], "ARTIFACT_NOT_FOUND");
}

#[tokio::test]
async fn test_print_pages() {
    let app = TestApp::new();
    let project = &app.world.agile;
    let p = project.project_id;
    let epic = app.world.add_epic(project, "Checkout").await;
    let story = app.world.add_user_story(project, epic.id(), "Pay").await;
    app.world.link(project, epic.id(), story.id()).await;

    let page = app.get(MEMBER, &format!("/print/{}/epic/{}", p, epic.id())).await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.view(), "printPage");
    assert_eq!(page.model()["traceObject"], "epic");
    assert_eq!(
        page.model()["traceability"]["userStories"][0]["name"],
        "Pay"
    );

    let list = app.get(MEMBER, &format!("/print/{}/epic/list", p)).await;
    assert_eq!(list.view(), "printListPage");
    assert_eq!(list.model()["type"], "epic");
    assert_eq!(ids(&list.model()["object"]), vec![epic.id().to_string()]);

    let children = app
        .get(MEMBER, &format!("/print/{}/userstory/list/{}", p, epic.id()))
        .await;
    assert_eq!(children.status, StatusCode::OK);
    assert_eq!(children.model()["type"], "userstory");
    assert_eq!(ids(&children.model()["object"]), vec![story.id().to_string()]);

    let unknown = app.get(MEMBER, &format!("/print/{}/invoice/list", p)).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let requirement_children = app
        .get(MEMBER, &format!("/print/{}/requirement/list/{}", p, epic.id()))
        .await;
    assert_eq!(requirement_children.status, StatusCode::NOT_FOUND);
}
