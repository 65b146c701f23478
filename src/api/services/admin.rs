//! `/admin`: staff-only moderation, content management and runtime settings.

use actix_web::{Responder, Result as ActixResult, web};

use crate::api::AppState;
use crate::api::middleware::{CurrentUser, LoginRequired};
use crate::services::admin_service::{AdminListQuery, CategoryForm, CategoryPatch, UserListQuery};
use crate::services::dto::{ExamView, QuestionAdminView};
use crate::services::exam_service::{ExamForm, ExamPatch, QuestionForm, QuestionPatch};

use super::helpers::{api_result, success_response};
use super::types::{ConfigUpdateRequest, IdsRequest};

// ============ Moderation ============

macro_rules! moderation_handler {
    ($name:ident, $method:ident) => {
        pub async fn $name(
            state: web::Data<AppState>,
            body: web::Json<IdsRequest>,
        ) -> ActixResult<impl Responder> {
            Ok(api_result(state.moderation.$method(&body.ids).await))
        }
    };
}

moderation_handler!(confirm_tutorials, confirm_tutorials);
moderation_handler!(disprove_tutorials, disprove_tutorials);
moderation_handler!(confirm_comments, confirm_comments);
moderation_handler!(disprove_comments, disprove_comments);
moderation_handler!(confirm_exams, confirm_exams);
moderation_handler!(disprove_exams, disprove_exams);

// ============ Listings ============

pub async fn list_tutorials(
    state: web::Data<AppState>,
    query: web::Query<AdminListQuery>,
) -> ActixResult<impl Responder> {
    Ok(api_result(state.admin.list_tutorials(query.into_inner()).await))
}

pub async fn list_comments(
    state: web::Data<AppState>,
    query: web::Query<AdminListQuery>,
) -> ActixResult<impl Responder> {
    Ok(api_result(state.admin.list_comments(query.into_inner()).await))
}

pub async fn list_exams(
    state: web::Data<AppState>,
    query: web::Query<AdminListQuery>,
) -> ActixResult<impl Responder> {
    Ok(api_result(state.admin.list_exams(query.into_inner()).await))
}

pub async fn list_users(
    state: web::Data<AppState>,
    query: web::Query<UserListQuery>,
) -> ActixResult<impl Responder> {
    Ok(api_result(state.admin.list_users(query.into_inner()).await))
}

// ============ Exams and questions ============

pub async fn create_exam(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<ExamForm>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state
            .exams
            .create_exam(user.id(), body.into_inner())
            .await
            .map(|e| ExamView::from(&e)),
    ))
}

pub async fn update_exam(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<ExamPatch>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state
            .exams
            .update_exam(path.into_inner(), body.into_inner())
            .await
            .map(|e| ExamView::from(&e)),
    ))
}

pub async fn create_question(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<QuestionForm>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state
            .exams
            .create_question(path.into_inner(), body.into_inner())
            .await
            .map(|q| QuestionAdminView::from(&q)),
    ))
}

pub async fn update_question(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<QuestionPatch>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state
            .exams
            .update_question(path.into_inner(), body.into_inner())
            .await
            .map(|q| QuestionAdminView::from(&q)),
    ))
}

// ============ Categories ============

pub async fn list_categories(state: web::Data<AppState>) -> ActixResult<impl Responder> {
    Ok(api_result(state.admin.list_categories().await))
}

pub async fn create_category(
    state: web::Data<AppState>,
    body: web::Json<CategoryForm>,
) -> ActixResult<impl Responder> {
    Ok(api_result(state.admin.create_category(body.into_inner()).await))
}

pub async fn update_category(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<CategoryPatch>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state
            .admin
            .update_category(path.into_inner(), body.into_inner())
            .await,
    ))
}

// ============ Runtime config ============

pub async fn get_all_configs(state: web::Data<AppState>) -> ActixResult<impl Responder> {
    Ok(success_response(state.config.get_all()))
}

pub async fn get_config(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<impl Responder> {
    Ok(api_result(state.config.get(&path)))
}

pub async fn update_config(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    body: web::Json<ConfigUpdateRequest>,
) -> ActixResult<impl Responder> {
    let changed_by = format!("admin:{}", user.0.username);
    Ok(api_result(
        state
            .config
            .update(&path, &body.value, Some(&changed_by))
            .await,
    ))
}

pub async fn get_config_history(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<impl Responder> {
    Ok(api_result(state.config.get_history(&path).await))
}

pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(LoginRequired::staff())
            .route("/tutorials", web::get().to(list_tutorials))
            .route("/tutorials/confirm", web::post().to(confirm_tutorials))
            .route("/tutorials/disprove", web::post().to(disprove_tutorials))
            .route("/comments", web::get().to(list_comments))
            .route("/comments/confirm", web::post().to(confirm_comments))
            .route("/comments/disprove", web::post().to(disprove_comments))
            .route("/exams", web::get().to(list_exams))
            .route("/exams", web::post().to(create_exam))
            .route("/exams/confirm", web::post().to(confirm_exams))
            .route("/exams/disprove", web::post().to(disprove_exams))
            .route("/exams/{id}", web::post().to(update_exam))
            .route("/exams/{id}/questions", web::post().to(create_question))
            .route("/questions/{id}", web::post().to(update_question))
            .route("/categories", web::get().to(list_categories))
            .route("/categories", web::post().to(create_category))
            .route("/categories/{id}", web::post().to(update_category))
            .route("/users", web::get().to(list_users))
            .route("/config", web::get().to(get_all_configs))
            .route("/config/{key}/history", web::get().to(get_config_history))
            .route("/config/{key}", web::get().to(get_config))
            .route("/config/{key}", web::put().to(update_config)),
    );
}
