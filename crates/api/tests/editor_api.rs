//! Editor session lifecycle and mutations over HTTP.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::*;
use pagewright_content::{Actor, BackendError, ContentStore, StoreOp};
use pagewright_db::models::page::UpdatePage;
use serde_json::{json, Value};

const SESSIONS: &str = "/api/v1/editor/sessions";

async fn open(app: &TestApp, token: &str, page: Option<&str>) -> (String, Value) {
    let response = post_json(&app.router, SESSIONS, Some(token), json!({ "path": page })).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let id = json["data"]["id"].as_str().unwrap().to_string();
    (id, json["data"].clone())
}

#[tokio::test]
async fn open_with_path_loads_page() {
    let app = build_test_app();
    seed_page(app.store.as_ref(), "/about", "About", &["story"]).await;

    let (_, view) = open(&app, &admin_token(1), Some("/about")).await;

    assert_eq!(view["state"], "clean");
    assert_eq!(view["page_path"], "/about");
    assert_eq!(view["working"]["page"]["title"], "About");
    assert_eq!(view["live"], true);
    assert_eq!(app.sessions.count().await, 1);
}

#[tokio::test]
async fn open_without_path_is_idle() {
    let app = build_test_app();
    let token = admin_token(1);
    let (id, view) = open(&app, &token, None).await;
    assert_eq!(view["state"], "idle");

    let response = patch_json(
        &app.router,
        &format!("{SESSIONS}/{id}/metadata"),
        Some(&token),
        json!({"title": "x"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn failed_initial_load_closes_session() {
    let app = build_test_app();
    app.store
        .fail_next(StoreOp::FindPage, BackendError::Unavailable("down".into()));

    let response = post_json(
        &app.router,
        SESSIONS,
        Some(&admin_token(1)),
        json!({"path": "/about"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(app.sessions.count().await, 0);
}

#[tokio::test]
async fn edit_save_and_undo_flow() {
    let app = build_test_app();
    seed_page(app.store.as_ref(), "/services", "Services", &["hero"]).await;
    let token = admin_token(1);
    let (id, _) = open(&app, &token, Some("/services")).await;
    let base = format!("{SESSIONS}/{id}");

    // Metadata
    let response = patch_json(
        &app.router,
        &format!("{base}/metadata"),
        Some(&token),
        json!({"title": "Our services", "meta_title": "Services | Agency"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let view = body_json(response).await["data"].clone();
    assert_eq!(view["state"], "dirty");
    assert_eq!(view["changed_fields"], json!(["title", "meta_title"]));

    // Sections
    let response = post_json(
        &app.router,
        &format!("{base}/sections"),
        Some(&token),
        json!({"section_key": "pricing", "section_type": "list", "content": "Plans"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let section = body_json(response).await["data"].clone();
    let section_id = section["id"].as_i64().unwrap();
    assert_eq!(section["display_order"], 10);

    let response = put_json(
        &app.router,
        &format!("{base}/sections/{section_id}"),
        Some(&token),
        json!({"content": "Plans and pricing"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let view = body_json(response).await["data"].clone();
    assert_eq!(view["working"]["sections"][1]["content"], "Plans and pricing");

    // Save
    let response = post_json(
        &app.router,
        &format!("{base}/save"),
        Some(&token),
        json!({"description": "New pricing section"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let version = body_json(response).await["data"].clone();
    assert_eq!(version["version_number"], 1);
    assert_eq!(version["content_data"]["page"]["title"], "Our services");

    let view = body_json(get(&app.router, &base, Some(&token)).await).await["data"].clone();
    assert_eq!(view["state"], "clean");

    // Remove then undo restores the saved state locally.
    let response = delete(
        &app.router,
        &format!("{base}/sections/{section_id}"),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let view = body_json(response).await["data"].clone();
    assert_eq!(view["working"]["sections"].as_array().unwrap().len(), 1);
    assert_eq!(view["state"], "dirty");

    let response = post_json(&app.router, &format!("{base}/undo"), Some(&token), json!({})).await;
    let view = body_json(response).await["data"].clone();
    assert_eq!(view["state"], "clean");
    assert_eq!(view["working"]["sections"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn invalid_metadata_is_rejected_without_write() {
    let app = build_test_app();
    seed_page(app.store.as_ref(), "/contact", "Contact", &[]).await;
    let token = admin_token(1);
    let (id, _) = open(&app, &token, Some("/contact")).await;
    let writes = app.store.calls(StoreOp::UpsertPage);

    let response = patch_json(
        &app.router,
        &format!("{SESSIONS}/{id}/metadata"),
        Some(&token),
        json!({"meta_title": "x".repeat(100)}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["violations"][0]["field"], "meta_title");
    assert_eq!(app.store.calls(StoreOp::UpsertPage), writes);
}

#[tokio::test]
async fn failed_write_reverts_working_copy() {
    let app = build_test_app();
    seed_page(app.store.as_ref(), "/about", "About", &[]).await;
    let token = admin_token(1);
    let (id, _) = open(&app, &token, Some("/about")).await;

    app.store
        .fail_next(StoreOp::UpsertPage, BackendError::Unavailable("down".into()));
    let response = patch_json(
        &app.router,
        &format!("{SESSIONS}/{id}/metadata"),
        Some(&token),
        json!({"title": "Lost"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let view = body_json(get(&app.router, &format!("{SESSIONS}/{id}"), Some(&token)).await)
        .await["data"]
        .clone();
    assert_eq!(view["working"]["page"]["title"], "About");
    assert_eq!(view["state"], "clean");
}

#[tokio::test]
async fn navigate_switches_page() {
    let app = build_test_app();
    seed_page(app.store.as_ref(), "/about", "About", &[]).await;
    seed_page(app.store.as_ref(), "/blog", "Blog", &[]).await;
    let token = admin_token(1);
    let (id, _) = open(&app, &token, Some("/about")).await;

    let response = put_json(
        &app.router,
        &format!("{SESSIONS}/{id}/page"),
        Some(&token),
        json!({"path": "/blog"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let view = body_json(response).await["data"].clone();
    assert_eq!(view["page_path"], "/blog");
    assert_eq!(view["working"]["page"]["title"], "Blog");
}

#[tokio::test]
async fn sessions_belong_to_their_owner() {
    let app = build_test_app();
    let (id, _) = open(&app, &admin_token(1), None).await;

    let response = get(&app.router, &format!("{SESSIONS}/{id}"), Some(&admin_token(2))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete(&app.router, &format!("{SESSIONS}/{id}"), Some(&admin_token(2))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.sessions.count().await, 1);
}

#[tokio::test]
async fn close_session() {
    let app = build_test_app();
    let token = admin_token(1);
    let (id, _) = open(&app, &token, None).await;

    let response = delete(&app.router, &format!("{SESSIONS}/{id}"), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(&app.router, &format!("{SESSIONS}/{id}"), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn remote_edit_refreshes_open_session() {
    let app = build_test_app();
    seed_page(app.store.as_ref(), "/services", "Services", &[]).await;
    let token = admin_token(1);
    let (id, _) = open(&app, &token, Some("/services")).await;

    app.store
        .upsert_page(
            &path("/services"),
            &UpdatePage {
                title: Some("Edited elsewhere".into()),
                ..Default::default()
            },
            &Actor::user(2),
        )
        .await
        .unwrap();

    let uri = format!("{SESSIONS}/{id}");
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let view = body_json(get(&app.router, &uri, Some(&token)).await).await["data"].clone();
        if view["working"]["page"]["title"] == "Edited elsewhere" {
            assert_eq!(view["state"], "clean");
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "session never refreshed");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn edit_answered_after_undo_returns_current_view() {
    let (app, gated) = build_gated_app();
    seed_page(app.store.as_ref(), "/services", "Services", &[]).await;
    let token = admin_token(1);
    let (id, _) = open(&app, &token, Some("/services")).await;
    let base = format!("{SESSIONS}/{id}");
    let upserts = app.store.calls(StoreOp::UpsertPage);

    let ack = gated.hold_upsert();
    let edit = tokio::spawn({
        let router = app.router.clone();
        let uri = format!("{base}/metadata");
        let token = token.clone();
        async move { patch_json(&router, &uri, Some(&token), json!({"title": "Mine"})).await }
    });
    wait_until(|| app.store.calls(StoreOp::UpsertPage) == upserts + 1).await;

    let response = post_json(&app.router, &format!("{base}/undo"), Some(&token), json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    ack.send(()).unwrap();
    let response = edit.await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["state"], "clean");
    assert_eq!(json["data"]["working"]["page"]["title"], "Services");
    assert!(json.get("code").is_none());
}
