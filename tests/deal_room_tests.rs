// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Deal room listing and audit log tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use investor_site::models::DealRoomAction;
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{create_test_app, post_json, send_json};

async fn admin_token(app: &axum::Router) -> String {
    let (_, body) = post_json(
        app,
        "/api/admin/login",
        json!({ "username": "admin", "password": "correct horse battery staple" }),
    )
    .await;
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_documents_listed_in_sort_order() {
    let (app, _, _) = create_test_app();
    let token = admin_token(&app).await;

    for (id, title, sort_order) in [
        ("term-sheet", "Term Sheet", 3),
        ("deck", "Investor Deck", 1),
        ("audit", "Audited Financials", 3),
    ] {
        let (status, _) = send_json(
            &app,
            "PUT",
            &format!("/api/admin/deal-room/documents/{id}"),
            json!({
                "title": title,
                "category": "financials",
                "icon_type": "pdf",
                "file_url": format!("https://files.example.com/{id}.pdf"),
                "sort_order": sort_order
            }),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send_json(&app, "GET", "/api/deal-room/documents", json!({}), None).await;
    assert_eq!(status, StatusCode::OK);

    let titles: Vec<&str> = body["documents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Investor Deck", "Audited Financials", "Term Sheet"]);
}

#[tokio::test]
async fn test_document_update_keeps_created_at() {
    let (app, state, _) = create_test_app();
    let token = admin_token(&app).await;
    let doc = |title: &str| {
        json!({ "title": title, "category": "legal", "icon_type": "document", "is_locked": true })
    };

    send_json(&app, "PUT", "/api/admin/deal-room/documents/lpa", doc("LPA draft"), Some(&token))
        .await;
    let first = state.db.get_deal_room_document("lpa").await.unwrap().unwrap();

    send_json(&app, "PUT", "/api/admin/deal-room/documents/lpa", doc("LPA final"), Some(&token))
        .await;
    let second = state.db.get_deal_room_document("lpa").await.unwrap().unwrap();

    assert_eq!(second.title, "LPA final");
    assert!(second.is_locked);
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(state.db.list_deal_room_documents().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_locked_document_listed_without_links() {
    let (app, state, _) = create_test_app();
    let token = admin_token(&app).await;

    let (status, _) = send_json(
        &app,
        "PUT",
        "/api/admin/deal-room/documents/side-letter",
        json!({
            "title": "Side Letter",
            "category": "legal",
            "icon_type": "pdf",
            "file_url": "https://files.example.com/secret.pdf",
            "pdf_url": "https://files.example.com/secret-print.pdf",
            "is_locked": true
        }),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(&app, "GET", "/api/deal-room/documents", json!({}), None).await;
    assert_eq!(status, StatusCode::OK);

    let listed = &body["documents"][0];
    assert_eq!(listed["title"], "Side Letter");
    assert_eq!(listed["is_locked"], true);
    assert!(listed["file_url"].is_null());
    assert!(listed["pdf_url"].is_null());
    assert!(!body.to_string().contains("secret"));

    // The stored record keeps its links for the admin side
    let stored = state.db.get_deal_room_document("side-letter").await.unwrap().unwrap();
    assert_eq!(
        stored.file_url.as_deref(),
        Some("https://files.example.com/secret.pdf")
    );
}

#[tokio::test]
async fn test_document_upsert_requires_admin() {
    let (app, state, _) = create_test_app();

    let (status, _) = send_json(
        &app,
        "PUT",
        "/api/admin/deal-room/documents/deck",
        json!({ "title": "Deck", "category": "presentations", "icon_type": "presentation" }),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(state.db.list_deal_room_documents().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_activity_records_client_ip_and_user_agent() {
    let (app, state, _) = create_test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/deal-room/activity")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::USER_AGENT, "Mozilla/5.0 (Macintosh)")
                .header("x-forwarded-for", "203.0.113.9, 10.0.0.2")
                .body(Body::from(
                    json!({
                        "email": "LP@Fund.example",
                        "name": "Pat",
                        "action": "download",
                        "documentId": "deck",
                        "documentName": "Investor Deck"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let log = state.db.list_deal_room_activity(10).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].email, "lp@fund.example");
    assert_eq!(log[0].action, DealRoomAction::Download);
    assert_eq!(log[0].document_id.as_deref(), Some("deck"));
    assert_eq!(log[0].ip_address, "203.0.113.9");
    assert_eq!(log[0].user_agent, "Mozilla/5.0 (Macintosh)");
}

#[tokio::test]
async fn test_activity_rejects_unknown_action() {
    let (app, state, _) = create_test_app();

    let (status, _) = post_json(
        &app,
        "/api/deal-room/activity",
        json!({ "email": "a@x.com", "name": "A", "action": "delete" }),
    )
    .await;

    assert!(status.is_client_error());
    assert!(state.db.list_deal_room_activity(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_activity_listing_newest_first() {
    let (app, _, _) = create_test_app();
    for action in ["view", "share"] {
        post_json(
            &app,
            "/api/deal-room/activity",
            json!({ "email": "a@x.com", "name": "A", "action": action }),
        )
        .await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let token = admin_token(&app).await;
    let (status, body) = send_json(
        &app,
        "GET",
        "/api/admin/deal-room/activity?limit=1",
        json!({}),
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let activity = body["activity"].as_array().unwrap();
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0]["action"], "share");
}

#[tokio::test]
async fn test_unknown_api_path_is_json_404() {
    let (app, _, _) = create_test_app();

    let (status, body) = send_json(&app, "GET", "/api/no-such-thing", json!({}), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_health() {
    let (app, _, _) = create_test_app();

    let (status, body) = send_json(&app, "GET", "/health", json!({}), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
