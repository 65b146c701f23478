//! AJAX endpoints under `/ajax`.
//!
//! Every response uses the `{"status": 1 | -1 | 0, "error"?: ..}` envelope.

use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::api::AppState;
use crate::api::constants::{AJAX_HEADER, AJAX_HEADER_VALUE};
use crate::api::middleware::{CurrentUser, LoginRequired};
use crate::errors::{MajazamoozError, Result};
use crate::services::comment_service::CommentForm;
use crate::storage::backend::relations::ToggleOutcome;

use super::types::AjaxResponse;

pub const DATABASE_ERROR_MESSAGE: &str = "خطایی در ثبت اطلاعات رخ داد";
const NOT_AJAX_MESSAGE: &str = "درخواست نامعتبر است";

#[derive(Debug, Deserialize)]
pub struct TutorialTarget {
    pub tutorial_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct CommentTarget {
    pub comment_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct ExamTarget {
    pub exam_id: i32,
}

fn ajax_json<E: Serialize>(status: StatusCode, body: AjaxResponse<E>) -> HttpResponse {
    HttpResponse::build(status).json(body)
}

fn ajax_failure(status: StatusCode, message: &str) -> HttpResponse {
    ajax_json(
        status,
        AjaxResponse {
            status: 0,
            error: Some(message.to_string()),
        },
    )
}

fn is_ajax(req: &HttpRequest) -> bool {
    req.headers()
        .get(AJAX_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == AJAX_HEADER_VALUE)
}

/// Map a service error onto the AJAX envelope.
pub fn ajax_error(err: &MajazamoozError) -> HttpResponse {
    match err {
        MajazamoozError::InvalidForm(fields) => ajax_json(
            StatusCode::OK,
            AjaxResponse {
                status: 0,
                error: Some(fields),
            },
        ),
        MajazamoozError::NotFound(msg) => ajax_failure(StatusCode::NOT_FOUND, msg),
        MajazamoozError::Forbidden(msg) => ajax_failure(StatusCode::FORBIDDEN, msg),
        MajazamoozError::Validation(msg) => ajax_failure(StatusCode::BAD_REQUEST, msg),
        other => {
            error!("AJAX request failed: {}", other);
            ajax_failure(StatusCode::OK, DATABASE_ERROR_MESSAGE)
        }
    }
}

fn toggle_response(result: Result<ToggleOutcome>) -> HttpResponse {
    match result {
        Ok(outcome) => ajax_json::<String>(
            StatusCode::OK,
            AjaxResponse {
                status: outcome.status(),
                error: None,
            },
        ),
        Err(e) => ajax_error(&e),
    }
}

// Non-AJAX requests are rejected before anything is written.
macro_rules! toggle_handler {
    ($name:ident, $body:ty, $field:ident, $method:ident) => {
        pub async fn $name(
            req: HttpRequest,
            user: CurrentUser,
            state: web::Data<AppState>,
            body: web::Json<$body>,
        ) -> HttpResponse {
            if !is_ajax(&req) {
                return ajax_failure(StatusCode::BAD_REQUEST, NOT_AJAX_MESSAGE);
            }
            let result = state.reactions.$method(user.id(), body.$field).await;
            toggle_response(result)
        }
    };
}

toggle_handler!(tutorial_like, TutorialTarget, tutorial_id, toggle_tutorial_like);
toggle_handler!(tutorial_upvote, TutorialTarget, tutorial_id, toggle_tutorial_upvote);
toggle_handler!(tutorial_downvote, TutorialTarget, tutorial_id, toggle_tutorial_downvote);
toggle_handler!(comment_like, CommentTarget, comment_id, toggle_comment_like);
toggle_handler!(comment_upvote, CommentTarget, comment_id, toggle_comment_upvote);
toggle_handler!(comment_downvote, CommentTarget, comment_id, toggle_comment_downvote);
toggle_handler!(exam_like, ExamTarget, exam_id, toggle_exam_like);

pub async fn create_comment(
    req: HttpRequest,
    user: CurrentUser,
    state: web::Data<AppState>,
    body: web::Json<CommentForm>,
) -> HttpResponse {
    if !is_ajax(&req) {
        return ajax_failure(StatusCode::BAD_REQUEST, NOT_AJAX_MESSAGE);
    }
    match state.comments.create(user.id(), body.into_inner()).await {
        Ok(comment) => {
            info!("AJAX: user {} created comment {}", user.id(), comment.id);
            ajax_json::<String>(
                StatusCode::OK,
                AjaxResponse {
                    status: 1,
                    error: None,
                },
            )
        }
        Err(e) => ajax_error(&e),
    }
}

/// Malformed bodies (missing or non-integer ids) become 400 in the AJAX envelope.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = ajax_failure(StatusCode::BAD_REQUEST, &err.to_string());
        InternalError::from_response(err, response).into()
    })
}

/// `/ajax`
pub fn ajax_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/ajax")
            .wrap(LoginRequired::user())
            .app_data(json_config())
            .route("/tutorial/like", web::post().to(tutorial_like))
            .route("/tutorial/upvote", web::post().to(tutorial_upvote))
            .route("/tutorial/downvote", web::post().to(tutorial_downvote))
            .route("/tutorial_comment/create", web::post().to(create_comment))
            .route("/tutorial_comment/like", web::post().to(comment_like))
            .route("/tutorial_comment/upvote", web::post().to(comment_upvote))
            .route("/tutorial_comment/downvote", web::post().to(comment_downvote))
            .route("/exam/like", web::post().to(exam_like)),
    );
}
