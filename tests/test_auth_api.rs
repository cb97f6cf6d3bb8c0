// tests/test_auth_api.rs


use axum::body::Body;
use axum::http::{ Request, StatusCode };
use chrono::Utc;
use gameplan::server::auth::{ sign, SIGNATURE_HEADER, TIMESTAMP_HEADER, USERNAME_HEADER };
use serde_json::json;
use test_helpers::{ create_test_app, create_test_app_with, TestOptions, BOT };

#[tokio::test]
async fn requests_without_a_username_are_rejected() {
    let app = create_test_app().await;
    let (status, body) = app.request("GET", "/api/chats", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication credentials were not provided.");
}

#[tokio::test]
async fn the_assistant_account_cannot_be_used_by_clients() {
    let app = create_test_app().await;
    let (status, _) = app.request("GET", "/api/chats", Some(BOT), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn signed_requests_are_verified_when_a_key_is_configured() {
    let app = create_test_app_with(TestOptions {
        api_key: Some("gateway-secret".into()),
        ..TestOptions::default()
    }).await;

    let (status, body) = app.request("GET", "/api/chats", Some("coach_kim"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing ts/sig");

    let ts = Utc::now().timestamp().to_string();
    let forged = sign("wrong-secret", &ts, "coach_kim");
    let (status, _) = app.send(
        Request::builder()
            .uri("/api/chats")
            .header(USERNAME_HEADER, "coach_kim")
            .header(TIMESTAMP_HEADER, &ts)
            .header(SIGNATURE_HEADER, forged)
            .body(Body::empty())
            .unwrap()
    ).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, chats) = app.send(
        Request::builder()
            .uri("/api/chats")
            .header(USERNAME_HEADER, "coach_kim")
            .header(TIMESTAMP_HEADER, &ts)
            .header(SIGNATURE_HEADER, sign("gateway-secret", &ts, "coach_kim"))
            .body(Body::empty())
            .unwrap()
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chats, json!([]));
}

#[tokio::test]
async fn chats_and_messages_are_private_to_participants() {
    let app = create_test_app().await;
    let chat_id = app.coach_with_chat("coach_kim").await;

    let (status, _) = app.request("GET", &format!("/api/chats/{}", chat_id), Some("intruder"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, turns) = app.request("GET", &format!("/api/messages?chat_id={}", chat_id), Some("intruder"), None).await;
    assert_eq!(turns, json!([]));

    let (status, _) = app.request("DELETE", &format!("/api/chats/{}", chat_id), Some("intruder"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.request("DELETE", &format!("/api/chats/{}", chat_id), Some("coach_kim"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn about_can_only_be_created_once() {
    let app = create_test_app().await;
    let body = json!({ "sport_coach": "Soccer", "details": "U10 girls" });

    let (status, profile) = app.request("POST", "/api/about/create", Some("coach_liv"), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(profile["specialty"], "Soccer");

    let (status, error) = app.request("POST", "/api/about/create", Some("coach_liv"), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "About already exists.");

    let (status, profile) = app.request("PATCH", "/api/about", Some("coach_liv"), Some(json!({ "bio": "U12 girls" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["bio"], "U12 girls");
    assert_eq!(profile["specialty"], "Soccer");
}
