mod common;

use common::TestApp;
use serde_json::{json, Value};

async fn patch_profile(app: &TestApp, body: &Value) -> reqwest::Response {
    app.client
        .patch(app.url("/profile"))
        .bearer_auth(&app.token)
        .json(body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn profile_is_created_lazily_with_free_tier() {
    let app = TestApp::spawn().await;

    let (status, profile) = app.get_json("/profile").await;
    assert_eq!(status, 200);
    assert_eq!(profile["id"], common::TEST_USER_ID);
    assert_eq!(profile["chat_count_current_month"], 0);
    assert_eq!(profile["preferred_language"], "nl");
    assert_eq!(profile["tier"]["name"], "free");
    assert_eq!(profile["tier"]["chat_limit_monthly"], 1);
    assert_eq!(profile["can_create_chat"], true);
}

#[tokio::test]
async fn exhausted_allowance_is_reported() {
    let app = TestApp::spawn().await;
    app.update_profile(|p| p.chat_count_current_month = 1).await;

    let (_, profile) = app.get_json("/profile").await;
    assert_eq!(profile["can_create_chat"], false);

    app.update_profile(|p| p.is_premium = true).await;
    let (_, profile) = app.get_json("/profile").await;
    assert_eq!(profile["can_create_chat"], true);
    assert_eq!(profile["tier"]["name"], "premium");
}

#[tokio::test]
async fn editable_fields_are_applied_and_others_ignored() {
    let app = TestApp::spawn().await;

    let response = patch_profile(
        &app,
        &json!({
            "first_name": "  Noor ",
            "preferred_language": "ar",
            "email": "Noor@Example.NL",
            "is_premium": true,
            "chat_count_current_month": 99
        }),
    )
    .await;
    assert_eq!(response.status().as_u16(), 200);

    let profile: Value = response.json().await.unwrap();
    assert_eq!(profile["first_name"], "Noor");
    assert_eq!(profile["preferred_language"], "ar");
    assert_eq!(profile["email"], "noor@example.nl");
    assert_eq!(profile["is_premium"], false);
    assert_eq!(profile["chat_count_current_month"], 0);
}

#[tokio::test]
async fn invalid_values_are_rejected() {
    let app = TestApp::spawn().await;

    let response = patch_profile(&app, &json!({ "email": "not-an-email" })).await;
    assert_eq!(response.status().as_u16(), 400);

    let response = patch_profile(&app, &json!({ "first_name": "x".repeat(51) })).await;
    assert_eq!(response.status().as_u16(), 400);

    let response = patch_profile(&app, &json!({ "preferred_language": "xx" })).await;
    assert_eq!(response.status().as_u16(), 400);
}
