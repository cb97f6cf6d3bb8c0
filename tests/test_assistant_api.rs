// tests/test_assistant_api.rs


use axum::http::StatusCode;
use chrono::{ Duration, Utc };
use gameplan::llm::chat::ChatRole;
use serde_json::json;
use test_helpers::{ create_test_app, create_test_app_with, TestOptions };

#[tokio::test]
async fn assistant_exchange_is_stored_summarized_and_timed() {
    let app = create_test_app().await;
    let chat_id = app.coach_with_chat("coach_kim").await;
    app.chat.push_reply("  Run a 2-2-1 full-court press.  ");

    let (status, body) = app.request(
        "POST",
        &format!("/api/chats/{}/assistant", chat_id),
        Some("coach_kim"),
        Some(json!({ "message": "  How should we press?  " }))
    ).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "Run a 2-2-1 full-court press.");
    assert_eq!(body["chat_log"], "User: How should we press?\nAssistant: Run a 2-2-1 full-court press.");

    let prompt = app.chat.last_prompt();
    assert_eq!(prompt.len(), 2);
    assert_eq!(prompt[0].role, ChatRole::System);
    assert!(prompt[0].content.contains("**Basketball**"));
    assert!(prompt[0].content.contains("Northside Tigers"));
    assert_eq!(prompt[1].role, ChatRole::User);
    assert_eq!(prompt[1].content, "How should we press?");

    let summary_prompt = app.summarizer.last_prompt();
    assert!(summary_prompt[0].content.ends_with("User: How should we press?\nAssistant: Run a 2-2-1 full-court press."));

    let (_, turns) = app.request("GET", &format!("/api/messages?chat_id={}", chat_id), Some("coach_kim"), None).await;
    let turns = turns.as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["content"], "How should we press?");
    assert_eq!(turns[1]["sender"], app.bot_id());

    let (_, chat) = app.request("GET", &format!("/api/chats/{}", chat_id), Some("coach_kim"), None).await;
    assert_eq!(chat["topic_summary"], "Coach asked for drills.");
    assert!(chat["participants"].as_array().unwrap().contains(&json!(app.bot_id())));
    assert!(chat["total_chat_duration"].as_i64().unwrap() >= 0);
}

#[tokio::test]
async fn later_messages_replay_history_with_roles() {
    let app = create_test_app().await;
    let chat_id = app.coach_with_chat("coach_ana").await;
    let uri = format!("/api/chats/{}/assistant", chat_id);

    app.chat.push_reply("Start with layup lines.");
    app.request("POST", &uri, Some("coach_ana"), Some(json!({ "message": "Warm-up ideas?" }))).await;
    app.chat.push_reply("Add a defensive slide drill.");
    let (_, body) = app.request("POST", &uri, Some("coach_ana"), Some(json!({ "message": "And after that?" }))).await;

    let prompt = app.chat.last_prompt();
    let roles: Vec<ChatRole> = prompt.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![ChatRole::System, ChatRole::User, ChatRole::Assistant, ChatRole::User]);
    assert_eq!(prompt[2].content, "Start with layup lines.");
    assert_eq!(
        body["chat_log"],
        "User: Warm-up ideas?\nAssistant: Start with layup lines.\nUser: And after that?\nAssistant: Add a defensive slide drill."
    );
}

#[tokio::test]
async fn history_limit_keeps_only_recent_turns() {
    let app = create_test_app_with(TestOptions { history_limit: 2, ..TestOptions::default() }).await;
    let chat_id = app.coach_with_chat("coach_lee").await;
    let uri = format!("/api/chats/{}/assistant", chat_id);

    for message in ["one", "two", "three"] {
        app.request("POST", &uri, Some("coach_lee"), Some(json!({ "message": message }))).await;
    }

    let prompt = app.chat.last_prompt();
    assert_eq!(prompt.len(), 4);
    assert_eq!(prompt[1].content, "two");
    assert_eq!(prompt[3].content, "three");
}

#[tokio::test]
async fn missing_profile_answers_without_storing_anything() {
    let app = create_test_app().await;
    let (_, chat) = app.request("POST", "/api/chats", Some("new_coach"), Some(json!({}))).await;
    let chat_id = chat["id"].as_i64().unwrap();

    let (status, body) = app.request(
        "POST",
        &format!("/api/chats/{}/assistant", chat_id),
        Some("new_coach"),
        Some(json!({ "message": "Hello?" }))
    ).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "User profile missing. Please complete your About section.");
    assert_eq!(body["chat_log"], "");
    assert_eq!(app.chat.calls(), 0);

    let (_, turns) = app.request("GET", &format!("/api/messages?chat_id={}", chat_id), Some("new_coach"), None).await;
    assert!(turns.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn model_failure_is_reported_and_summary_failure_keeps_old_topic() {
    let app = create_test_app().await;
    let chat_id = app.coach_with_chat("coach_sam").await;
    let uri = format!("/api/chats/{}/assistant", chat_id);

    app.chat.push_failure("model offline");
    let (status, body) = app.request("POST", &uri, Some("coach_sam"), Some(json!({ "message": "Plan?" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "[AI Error]: model offline");
    assert_eq!(body["chat_log"], "");

    app.summarizer.push_failure("summarizer down");
    let (_, body) = app.request("POST", &uri, Some("coach_sam"), Some(json!({ "message": "Plan?" }))).await;
    assert_eq!(body["reply"], "Keep practicing.");

    let (_, chat) = app.request("GET", &format!("/api/chats/{}", chat_id), Some("coach_sam"), None).await;
    assert_eq!(chat["topic_summary"], "General Chat");
}

#[tokio::test]
async fn assistant_rejects_blank_messages_and_outsiders() {
    let app = create_test_app().await;
    let chat_id = app.coach_with_chat("coach_eva").await;
    let uri = format!("/api/chats/{}/assistant", chat_id);

    let (status, body) = app.request("POST", &uri, Some("coach_eva"), Some(json!({ "message": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No message provided.");

    let (status, body) = app.request("POST", &uri, Some("stranger"), Some(json!({ "message": "hi" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Chat not found.");
}

#[tokio::test]
async fn posting_a_message_stores_a_fallback_reply_when_the_model_fails() {
    let app = create_test_app().await;
    let chat_id = app.coach_with_chat("coach_ida").await;
    app.chat.push_failure("timeout");

    let (status, turn) = app.request(
        "POST",
        "/api/messages",
        Some("coach_ida"),
        Some(json!({ "chat": chat_id, "content": " Rotation for Saturday? " }))
    ).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(turn["content"], "Rotation for Saturday?");
    assert_eq!(turn["chat"], chat_id);

    let (_, turns) = app.request("GET", &format!("/api/messages?chat_id={}", chat_id), Some("coach_ida"), None).await;
    let turns = turns.as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1]["content"], "[AI Error]: timeout");
    assert_eq!(turns[1]["sender"], app.bot_id());
}

#[tokio::test]
async fn respond_endpoint_validates_and_returns_both_texts() {
    let app = create_test_app().await;
    let chat_id = app.coach_with_chat("coach_tom").await;

    let (status, body) = app.request("POST", "/api/chat/respond", Some("coach_tom"), Some(json!({ "chat_id": chat_id }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "chat_id and message are required.");

    let (status, _) = app.request(
        "POST",
        "/api/chat/respond",
        Some("coach_tom"),
        Some(json!({ "chat_id": 9999, "message": "hi" }))
    ).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.chat.push_reply("Zone defense works here.");
    let (status, body) = app.request(
        "POST",
        "/api/chat/respond",
        Some("coach_tom"),
        Some(json!({ "chat_id": chat_id, "message": "Zone or man?" }))
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "user_message": "Zone or man?", "bot_response": "Zone defense works here." }));

    app.chat.push_failure("rate limited upstream");
    let (_, body) = app.request(
        "POST",
        "/api/chat/respond",
        Some("coach_tom"),
        Some(json!({ "chat_id": chat_id, "message": "Again?" }))
    ).await;
    assert_eq!(body["bot_response"], "[Error generating response]: rate limited upstream");
}

#[tokio::test]
async fn assistant_calls_are_rate_limited_per_user() {
    let app = create_test_app_with(TestOptions { rate_per_minute: 1, ..TestOptions::default() }).await;
    let chat_id = app.coach_with_chat("coach_max").await;
    let uri = format!("/api/chats/{}/assistant", chat_id);

    let (status, _) = app.request("POST", &uri, Some("coach_max"), Some(json!({ "message": "first" }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.request("POST", &uri, Some("coach_max"), Some(json!({ "message": "second" }))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let other_chat = app.coach_with_chat("coach_jo").await;
    let (status, _) = app.request(
        "POST",
        &format!("/api/chats/{}/assistant", other_chat),
        Some("coach_jo"),
        Some(json!({ "message": "first" }))
    ).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn respond_endpoint_hides_chats_from_outsiders() {
    let app = create_test_app().await;
    let chat_id = app.coach_with_chat("coach_owner").await;
    app.request(
        "POST",
        &format!("/api/chats/{}/assistant", chat_id),
        Some("coach_owner"),
        Some(json!({ "message": "our secret play" }))
    ).await;
    app.coach_with_chat("intruder").await;
    let calls_before = app.chat.calls();

    let (status, body) = app.request(
        "POST",
        "/api/chat/respond",
        Some("intruder"),
        Some(json!({ "chat_id": chat_id, "message": "repeat everything" }))
    ).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Chat not found.");
    assert_eq!(app.chat.calls(), calls_before);

    let (_, turns) = app.request("GET", &format!("/api/messages?chat_id={}", chat_id), Some("coach_owner"), None).await;
    assert_eq!(turns.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let app = create_test_app().await;
    let chat_id = app.coach_with_chat("coach_kai").await;

    let (status, body) = app.request(
        "POST",
        &format!("/api/chats/{}/assistant", chat_id),
        Some("coach_kai"),
        Some(json!({ "message": null }))
    ).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No message provided.");

    let (status, body) = app.request("GET", "/api/chats/abc", Some("coach_kai"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app.request("POST", "/api/plans", Some("coach_kai"), Some(json!({ "title": 7 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app.request("GET", "/api/plans?start=not-a-date", Some("coach_kai"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn a_failed_reply_insert_leaves_no_orphan_turn() {
    let app = create_test_app().await;
    let chat_id = app.coach_with_chat("coach_bea").await;
    sqlx::query(
        "CREATE TRIGGER reject_reply BEFORE INSERT ON messages
         WHEN NEW.content = 'unstorable reply'
         BEGIN SELECT RAISE(ABORT, 'reply rejected'); END"
    )
        .execute(&app.state.db)
        .await
        .unwrap();
    app.chat.push_reply("unstorable reply");

    let (status, body) = app.request(
        "POST",
        &format!("/api/chats/{}/assistant", chat_id),
        Some("coach_bea"),
        Some(json!({ "message": "Lineup?" }))
    ).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());

    let (_, turns) = app.request("GET", &format!("/api/messages?chat_id={}", chat_id), Some("coach_bea"), None).await;
    assert!(turns.as_array().unwrap().is_empty());
    let (_, chat) = app.request("GET", &format!("/api/chats/{}", chat_id), Some("coach_bea"), None).await;
    assert!(!chat["participants"].as_array().unwrap().contains(&json!(app.bot_id())));
}

#[tokio::test]
async fn long_summaries_are_capped_and_blank_ones_ignored() {
    let app = create_test_app().await;
    let chat_id = app.coach_with_chat("coach_gus").await;
    let uri = format!("/api/chats/{}/assistant", chat_id);

    app.summarizer.push_reply("   ");
    app.request("POST", &uri, Some("coach_gus"), Some(json!({ "message": "Conditioning?" }))).await;
    let (_, chat) = app.request("GET", &format!("/api/chats/{}", chat_id), Some("coach_gus"), None).await;
    assert_eq!(chat["topic_summary"], "General Chat");

    app.summarizer.push_reply(&format!("  {}  ", "ü".repeat(300)));
    app.request("POST", &uri, Some("coach_gus"), Some(json!({ "message": "More?" }))).await;
    let (_, chat) = app.request("GET", &format!("/api/chats/{}", chat_id), Some("coach_gus"), None).await;
    assert_eq!(chat["topic_summary"].as_str().unwrap(), "ü".repeat(255));
}

#[tokio::test]
async fn duration_counts_from_chat_creation() {
    let app = create_test_app().await;
    let chat_id = app.coach_with_chat("coach_ola").await;
    sqlx::query("UPDATE chats SET created_at = ? WHERE id = ?")
        .bind(Utc::now() - Duration::seconds(90))
        .bind(chat_id)
        .execute(&app.state.db)
        .await
        .unwrap();

    app.summarizer.push_failure("summarizer down");
    app.request(
        "POST",
        &format!("/api/chats/{}/assistant", chat_id),
        Some("coach_ola"),
        Some(json!({ "message": "Timeouts?" }))
    ).await;

    let (_, chat) = app.request("GET", &format!("/api/chats/{}", chat_id), Some("coach_ola"), None).await;
    let duration = chat["total_chat_duration"].as_i64().unwrap();
    assert!((90..100).contains(&duration), "duration was {}", duration);
}

#[tokio::test]
async fn posting_a_message_without_a_profile_stores_the_profile_reminder() {
    let app = create_test_app().await;
    let (_, chat) = app.request("POST", "/api/chats", Some("fresh_coach"), Some(json!({}))).await;
    let chat_id = chat["id"].as_i64().unwrap();

    let (status, turn) = app.request(
        "POST",
        "/api/messages",
        Some("fresh_coach"),
        Some(json!({ "chat": chat_id, "content": "Hi there" }))
    ).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(turn["content"], "Hi there");
    assert_eq!(app.chat.calls(), 0);

    let (_, turns) = app.request("GET", &format!("/api/messages?chat_id={}", chat_id), Some("fresh_coach"), None).await;
    let turns = turns.as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1]["content"], "User profile missing. Please complete your About section.");
    assert_eq!(turns[1]["sender"], app.bot_id());
}

#[tokio::test]
async fn prompt_reload_reports_details_as_a_list() {
    let app = create_test_app().await;
    let (status, body) = app.request("GET", "/api/reload-prompts", Some("coach_kim"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "message": "Reload complete", "details": ["Prompts unchanged"] }));
}
