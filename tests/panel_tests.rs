//! `/user` panel endpoints.

mod common;

use actix_web::http::StatusCode;
use actix_web::http::header::LOCATION;
use actix_web::test::{self, TestRequest};
use serde_json::{Value, json};

use majazamooz::storage::ConfirmStatus;

use common::setup;

#[actix_web::test]
async fn test_panel_requires_login() {
    let env = setup().await;
    let app = test_app!(env.state);

    let resp = test::call_service(&app, TestRequest::get().uri("/user/tutorials?page=2").to_request())
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get(LOCATION).unwrap(),
        "/auth/login?next=%2Fuser%2Ftutorials%3Fpage%3D2"
    );
}

#[actix_web::test]
async fn test_create_tutorial_waits_for_moderation() {
    let env = setup().await;
    let author = env.user("author").await;
    let app = test_app!(env.state);

    let req = TestRequest::post()
        .uri("/user/tutorials")
        .cookie(env.session_cookie(&author))
        .set_json(json!({
            "title": "Ownership in Rust",
            "short_description": "Moves and borrows",
            "body": "Every value has one owner."
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let data = &body["data"];
    assert_eq!(data["confirm_status"], ConfirmStatus::Waiting.as_i32());
    assert_eq!(data["slug"], "ownership-in-rust");

    let id = data["id"].as_i64().unwrap() as i32;
    assert!(env.storage.find_visible_tutorial(id).await.unwrap().is_none());

    let req = TestRequest::get()
        .uri("/user/tutorials")
        .cookie(env.session_cookie(&author))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total"], 1);
}

#[actix_web::test]
async fn test_invalid_tutorial_form() {
    let env = setup().await;
    let author = env.user("author").await;
    let app = test_app!(env.state);

    let req = TestRequest::post()
        .uri("/user/tutorials")
        .cookie(env.session_cookie(&author))
        .set_json(json!({
            "title": "x".repeat(51),
            "short_description": "",
            "body": "text"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["data"]["title"].is_array());
    assert!(body["data"]["short_description"].is_array());
}

#[actix_web::test]
async fn test_editing_sends_tutorial_back_to_moderation() {
    let env = setup().await;
    let author = env.user("author").await;
    let other = env.user("other").await;
    let tutorial = env.tutorial(&author, "editable").await;
    let app = test_app!(env.state);

    let form = json!({
        "title": "edited",
        "short_description": "still short",
        "body": "new body"
    });

    let req = TestRequest::post()
        .uri(&format!("/user/tutorials/{}", tutorial.id))
        .cookie(env.session_cookie(&other))
        .set_json(&form)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = TestRequest::post()
        .uri(&format!("/user/tutorials/{}", tutorial.id))
        .cookie(env.session_cookie(&author))
        .set_json(&form)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let stored = env.storage.find_tutorial(tutorial.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "edited");
    assert!(stored.is_edited);
    assert_eq!(stored.confirm_status, ConfirmStatus::Waiting.as_i32());
}

#[actix_web::test]
async fn test_deactivate_and_delete() {
    let env = setup().await;
    let author = env.user("author").await;
    let first = env.tutorial(&author, "first").await;
    let second = env.tutorial(&author, "second").await;
    let app = test_app!(env.state);

    let req = TestRequest::post()
        .uri(&format!("/user/tutorials/{}/delete", first.id))
        .cookie(env.session_cookie(&author))
        .set_json(json!({ "action": "deactivate" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let stored = env.storage.find_tutorial(first.id).await.unwrap().unwrap();
    assert!(!stored.is_active);
    assert!(env.storage.find_visible_tutorial(first.id).await.unwrap().is_none());

    let req = TestRequest::post()
        .uri(&format!("/user/tutorials/{}/delete", second.id))
        .cookie(env.session_cookie(&author))
        .set_json(json!({ "action": "delete" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    assert!(env.storage.find_tutorial(second.id).await.unwrap().is_none());
}

#[actix_web::test]
async fn test_profile_goals() {
    let env = setup().await;
    let user = env.user("reader").await;
    let app = test_app!(env.state);

    let req = TestRequest::post()
        .uri("/user/profile")
        .cookie(env.session_cookie(&user))
        .set_json(json!({ "first_name": " Sara ", "likes_count_goal": 40 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["first_name"], "Sara");

    let stored = env.reload(&user).await;
    assert_eq!(stored.likes_count_goal, 40);
    assert_eq!(stored.tutorials_count_goal, 0);

    let req = TestRequest::post()
        .uri("/user/profile")
        .cookie(env.session_cookie(&user))
        .set_json(json!({ "views_count_goal": -1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_relation_list_endpoints() {
    let env = setup().await;
    let author = env.user("author").await;
    let reader = env.user("reader").await;
    let tutorial = env.tutorial(&author, "popular").await;
    env.state
        .reactions
        .toggle_tutorial_like(reader.id, tutorial.id)
        .await
        .unwrap();
    env.state
        .reactions
        .record_tutorial_view(Some(reader.id), &tutorial)
        .await
        .unwrap();
    let app = test_app!(env.state);

    let req = TestRequest::get()
        .uri("/user/tutorials/liked_by_others")
        .cookie(env.session_cookie(&author))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["user_id"], reader.id);
    assert_eq!(body["data"]["items"][0]["score"], 5);

    let req = TestRequest::get()
        .uri("/user/tutorials/viewed_by_others")
        .cookie(env.session_cookie(&author))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total"], 1);

    let req = TestRequest::get()
        .uri("/user/tutorials/liked_by_me")
        .cookie(env.session_cookie(&author))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total"], 0);
}
