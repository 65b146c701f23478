//! Exam listing, details and participation endpoints.

use actix_web::{Responder, Result as ActixResult, web};
use serde::Deserialize;

use crate::api::AppState;
use crate::api::middleware::{CurrentUser, LoginRequired};
use crate::services::exam_service::AnswerInput;
use crate::storage::backend::ParticipationQuery;

use super::helpers::api_result;
use super::types::PageQuery;

#[derive(Debug, Deserialize)]
pub struct ExamListQuery {
    pub search: Option<String>,
    pub page: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationState {
    #[default]
    Finalized,
    InProgress,
    Expired,
}

impl From<ParticipationState> for ParticipationQuery {
    fn from(state: ParticipationState) -> Self {
        match state {
            ParticipationState::Finalized => ParticipationQuery::Finalized,
            ParticipationState::InProgress => ParticipationQuery::InProgress,
            ParticipationState::Expired => ParticipationQuery::Expired,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ParticipationListQuery {
    #[serde(default)]
    pub state: ParticipationState,
    pub page: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct AnswersRequest {
    pub answers: Vec<AnswerInput>,
}

/// `GET /exam?search=&page=`
pub async fn list_exams(
    state: web::Data<AppState>,
    query: web::Query<ExamListQuery>,
) -> ActixResult<impl Responder> {
    let query = query.into_inner();
    Ok(api_result(
        state
            .exams
            .list(query.search, query.page.unwrap_or(1).max(1))
            .await,
    ))
}

/// `GET /exam/{slug}`; counts a view.
pub async fn exam_details(
    state: web::Data<AppState>,
    user: Option<CurrentUser>,
    path: web::Path<String>,
) -> ActixResult<impl Responder> {
    let viewer = user.as_ref().map(CurrentUser::id);
    Ok(api_result(state.exams.details(&path, viewer).await))
}

/// `POST /participation/start/{exam_id}`
pub async fn start(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
) -> ActixResult<impl Responder> {
    Ok(api_result(state.exams.start(user.id(), path.into_inner()).await))
}

/// `GET /participation?state=finalized|in_progress|expired`
pub async fn list_participations(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<ParticipationListQuery>,
) -> ActixResult<impl Responder> {
    let page = PageQuery { page: query.page }.page();
    Ok(api_result(
        state
            .exams
            .list_participations(user.id(), query.state.into(), page)
            .await,
    ))
}

/// `GET /participation/{id}`
pub async fn view_participation(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state
            .exams
            .view_participation(user.id(), path.into_inner())
            .await,
    ))
}

/// `POST /participation/{id}/answers`
pub async fn submit_answers(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<AnswersRequest>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state
            .exams
            .submit_answers(user.id(), path.into_inner(), body.into_inner().answers)
            .await,
    ))
}

/// `POST /participation/{id}/finalize`
pub async fn finalize(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state.exams.finalize(user.id(), path.into_inner()).await,
    ))
}

pub fn exam_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/exam")
            .route("", web::get().to(list_exams))
            .route("/", web::get().to(list_exams))
            .route("/{slug}", web::get().to(exam_details)),
    )
    .service(
        web::scope("/participation")
            .wrap(LoginRequired::user())
            .route("", web::get().to(list_participations))
            .route("/start/{exam_id}", web::post().to(start))
            .route("/{id}", web::get().to(view_participation))
            .route("/{id}/answers", web::post().to(submit_answers))
            .route("/{id}/finalize", web::post().to(finalize)),
    );
}
