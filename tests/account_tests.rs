//! Registration, e-mail confirmation, login and logout.

mod common;

use actix_web::http::StatusCode;
use actix_web::http::header::LOCATION;
use actix_web::test::{self, TestRequest};
use serde_json::{Value, json};

use majazamooz::api::constants::SESSION_COOKIE_NAME;
use majazamooz::errors::MajazamoozError;
use majazamooz::services::account_service::{ChangePasswordForm, LoginForm};

use common::{PASSWORD, setup};

#[actix_web::test]
async fn test_register_then_confirm_email_once() {
    let env = setup().await;
    let app = test_app!(env.state);

    let req = TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "username": "new.user",
            "email": "New.User@Example.com",
            "password": "long enough",
            "password_confirm": "long enough"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["username"], "new.user");

    let sent = env.mailer.sent_to("new.user@example.com");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "تایید ایمیل");

    let link = sent[0]
        .body
        .lines()
        .find(|line| line.contains("/auth/confirm_email/"))
        .expect("confirmation link in body");
    let path = &link[link.find("/auth/").unwrap()..];

    let resp = test::call_service(&app, TestRequest::get().uri(path).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let user = env
        .storage
        .find_user_by_login("new.user")
        .await
        .unwrap()
        .unwrap();
    assert!(user.email_confirmed);
    assert!(!user.is_staff);

    let resp = test::call_service(&app, TestRequest::get().uri(path).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_register_reports_every_field() {
    let env = setup().await;
    env.user("taken").await;
    let app = test_app!(env.state);

    let req = TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "username": "taken",
            "email": "not-an-address",
            "password": "short",
            "password_confirm": "different"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    for field in ["username", "email", "password", "password_confirm"] {
        assert!(body["data"][field].is_array(), "missing error for {}", field);
    }
    assert!(env.mailer.sent().is_empty());
}

#[actix_web::test]
async fn test_login_sets_session_cookie() {
    let env = setup().await;
    let user = env.user("reader").await;
    let app = test_app!(env.state);

    let req = TestRequest::post()
        .uri("/auth/login?next=/user/")
        .set_json(json!({ "username_or_email": "reader@example.com", "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE_NAME)
        .expect("session cookie");
    assert!(cookie.http_only().unwrap_or(false));
    assert!(cookie.max_age().is_none());

    let claims = env.state.jwt.validate_session_token(cookie.value()).unwrap();
    assert_eq!(claims.user_id(), Some(user.id));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["redirect"], "/user/");
}

#[actix_web::test]
async fn test_remember_me_and_unsafe_next() {
    let env = setup().await;
    env.user("reader").await;
    let app = test_app!(env.state);

    let req = TestRequest::post()
        .uri("/auth/login?next=//evil.example")
        .set_json(json!({
            "username_or_email": "reader",
            "password": PASSWORD,
            "remember_me": true
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE_NAME)
        .expect("session cookie");
    assert!(cookie.max_age().is_some());

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["redirect"], "/");
}

#[actix_web::test]
async fn test_wrong_password_is_unauthorized() {
    let env = setup().await;
    env.user("reader").await;
    let app = test_app!(env.state);

    let req = TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "username_or_email": "reader", "password": "nope nope" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(
        resp.response()
            .cookies()
            .all(|c| c.name() != SESSION_COOKIE_NAME)
    );
}

#[actix_web::test]
async fn test_signed_in_user_is_asked_to_log_out_first() {
    let env = setup().await;
    let user = env.user("reader").await;
    let app = test_app!(env.state);

    let req = TestRequest::get()
        .uri("/auth/login")
        .cookie(env.session_cookie(&user))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let location = resp.headers().get(LOCATION).unwrap().to_str().unwrap();
    assert!(location.starts_with("/auth/logout_required?next="));

    // With an explicit `next` the page is shown.
    let req = TestRequest::get()
        .uri("/auth/login?next=/user/")
        .cookie(env.session_cookie(&user))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_logout_expires_cookie() {
    let env = setup().await;
    let user = env.user("reader").await;
    let app = test_app!(env.state);

    let req = TestRequest::post()
        .uri("/auth/logout")
        .cookie(env.session_cookie(&user))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE_NAME)
        .expect("expired cookie");
    assert_eq!(cookie.value(), "");
    assert_eq!(
        cookie.max_age(),
        Some(actix_web::cookie::time::Duration::ZERO)
    );
}

#[tokio::test]
async fn test_change_password() {
    let env = setup().await;
    let user = env.user("reader").await;
    let accounts = &env.state.accounts;

    let err = accounts
        .change_password(
            user.id,
            ChangePasswordForm {
                old_password: "wrong password".to_string(),
                new_password: "brand new pass".to_string(),
                new_password_confirm: "brand new pass".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, MajazamoozError::InvalidForm(_)));

    accounts
        .change_password(
            user.id,
            ChangePasswordForm {
                old_password: PASSWORD.to_string(),
                new_password: "brand new pass".to_string(),
                new_password_confirm: "brand new pass".to_string(),
            },
        )
        .await
        .unwrap();

    let login = |password: &str| LoginForm {
        username_or_email: "reader".to_string(),
        password: password.to_string(),
        remember_me: false,
    };
    assert!(accounts.login(login(PASSWORD)).await.is_err());
    let outcome = accounts.login(login("brand new pass")).await.unwrap();
    assert_eq!(outcome.user.id, user.id);
    assert!(outcome.max_age.is_none());
}

#[tokio::test]
async fn test_create_superuser() {
    let env = setup().await;
    let admin = env
        .state
        .accounts
        .create_superuser("root", "Root@Example.com", "super secret")
        .await
        .unwrap();
    assert!(admin.is_staff);
    assert!(admin.email_confirmed);
    assert_eq!(admin.email, "root@example.com");

    let err = env
        .state
        .accounts
        .create_superuser("root", "other@example.com", "super secret")
        .await
        .unwrap_err();
    assert!(matches!(err, MajazamoozError::Conflict(_)));
}
