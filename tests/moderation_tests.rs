//! Staff confirm/disprove actions and the e-mails they send.

mod common;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use serde_json::{Value, json};

use majazamooz::storage::ConfirmStatus;

use common::setup;

#[tokio::test]
async fn test_confirm_tutorials_notifies_authors() {
    let env = setup().await;
    let author = env.user("author").await;
    let first = env.waiting_tutorial(&author, "first").await;
    let second = env.waiting_tutorial(&author, "second").await;

    let report = env
        .state
        .moderation
        .confirm_tutorials(&[first.id, second.id])
        .await
        .unwrap();

    assert_eq!(report.updated, 2);
    assert_eq!(report.emails.success, 2);
    assert_eq!(report.emails.failed, 0);
    assert_eq!(report.messages[0], "2 مورد با موفقیت تایید شد");

    let sent = env.mailer.sent_to("author@example.com");
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|m| m.subject == "تایید/رد آموزش"));
    assert!(sent[0].body.contains("تایید شد"));
    assert!(sent[0].body.contains("/tutorial/"));

    let stored = env.storage.find_tutorial(first.id).await.unwrap().unwrap();
    assert_eq!(stored.confirm_status, ConfirmStatus::Confirmed.as_i32());
}

#[tokio::test]
async fn test_confirm_is_idempotent() {
    let env = setup().await;
    let author = env.user("author").await;
    let tutorial = env.tutorial(&author, "already").await;

    let report = env
        .state
        .moderation
        .confirm_tutorials(&[tutorial.id])
        .await
        .unwrap();
    assert_eq!(report.updated, 0);
    assert!(env.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_disprove_tutorial_hides_it() {
    let env = setup().await;
    let author = env.user("author").await;
    let tutorial = env.tutorial(&author, "hidden").await;

    let report = env
        .state
        .moderation
        .disprove_tutorials(&[tutorial.id])
        .await
        .unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(report.messages[0], "1 مورد با موفقیت رد شد");

    let sent = env.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("رد شد"));
    assert!(!sent[0].body.contains("/tutorial/"));

    assert!(
        env.storage
            .find_visible_tutorial(tutorial.id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_confirmed_reply_notifies_everyone_involved() {
    let env = setup().await;
    let author = env.user("author").await;
    let asker = env.user("asker").await;
    let helper = env.user("helper").await;
    let tutorial = env.tutorial(&author, "threads").await;
    let question = env.comment(&asker, &tutorial, "how?").await;
    let reply = env
        .waiting_comment(&helper, &tutorial, Some(&question), "like this")
        .await;

    let report = env
        .state
        .moderation
        .confirm_comments(&[reply.id])
        .await
        .unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(report.emails.success, 3);

    let to_helper = env.mailer.sent_to("helper@example.com");
    assert_eq!(to_helper.len(), 1);
    assert_eq!(to_helper[0].subject, "تایید/رد دیدگاه");

    let to_asker = env.mailer.sent_to("asker@example.com");
    assert_eq!(to_asker.len(), 1);
    assert_eq!(to_asker[0].subject, "پاسخ به نظر \"how?\"");
    assert!(to_asker[0].body.contains(&format!("#comment-{}", reply.id)));

    let to_author = env.mailer.sent_to("author@example.com");
    assert_eq!(to_author.len(), 1);
    assert_eq!(to_author[0].subject, "ثبت دیدگاه جدید برای آموزش شما");
}

#[tokio::test]
async fn test_disproved_comment_only_tells_its_author() {
    let env = setup().await;
    let author = env.user("author").await;
    let commenter = env.user("commenter").await;
    let tutorial = env.tutorial(&author, "spam magnet").await;
    let comment = env
        .waiting_comment(&commenter, &tutorial, None, "buy now")
        .await;

    let report = env
        .state
        .moderation
        .disprove_comments(&[comment.id])
        .await
        .unwrap();
    assert_eq!(report.updated, 1);

    let sent = env.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "commenter@example.com");
    assert!(sent[0].body.contains("رد شد"));
}

#[tokio::test]
async fn test_exam_moderation_sends_nothing() {
    let env = setup().await;
    let designer = env.staff("designer").await;
    let (exam, _) = env.exam(&designer, "quiz", 1, 0).await;

    let report = env
        .state
        .moderation
        .disprove_exams(&[exam.id])
        .await
        .unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(report.emails.success, 0);
    assert!(env.storage.find_visible_exam(exam.id).await.unwrap().is_none());
}

#[actix_web::test]
async fn test_admin_routes_require_staff() {
    let env = setup().await;
    let author = env.user("author").await;
    let staff = env.staff("moderator").await;
    let tutorial = env.waiting_tutorial(&author, "pending").await;
    let app = test_app!(env.state);

    let req = TestRequest::post()
        .uri("/admin/tutorials/confirm")
        .set_json(json!({ "ids": [tutorial.id] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let req = TestRequest::post()
        .uri("/admin/tutorials/confirm")
        .cookie(env.session_cookie(&author))
        .set_json(json!({ "ids": [tutorial.id] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = TestRequest::post()
        .uri("/admin/tutorials/confirm")
        .cookie(env.session_cookie(&staff))
        .set_json(json!({ "ids": [tutorial.id] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["updated"], 1);
    assert_eq!(env.mailer.sent().len(), 1);
}
