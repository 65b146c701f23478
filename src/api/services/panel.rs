//! `/user`: the signed-in user's panel.

use actix_web::{Responder, Result as ActixResult, web};
use serde::Deserialize;

use crate::api::AppState;
use crate::api::middleware::{CurrentUser, LoginRequired};
use crate::services::RelationList;
use crate::services::account_service::{ChangePasswordForm, ProfileForm};
use crate::services::comment_service::CommentEditForm;
use crate::services::dto::{CommentView, OwnerAction, TutorialSummary, UserProfile};
use crate::services::tutorial_service::TutorialForm;

use super::helpers::{api_result, success_response};
use super::types::{MessageResponse, PageQuery};

#[derive(Debug, Deserialize)]
pub struct OwnerActionRequest {
    pub action: OwnerAction,
}

/// `GET /user`: statistics dashboard.
pub async fn panel_home(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> ActixResult<impl Responder> {
    Ok(api_result(state.statistics.panel_home(user.id()).await))
}

// ============ Profile ============

pub async fn profile(user: CurrentUser) -> ActixResult<impl Responder> {
    Ok(success_response(UserProfile::from(&user.0)))
}

pub async fn update_profile(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<ProfileForm>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state
            .accounts
            .update_profile(user.id(), body.into_inner())
            .await
            .map(|u| UserProfile::from(&u)),
    ))
}

pub async fn change_password(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<ChangePasswordForm>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state
            .accounts
            .change_password(user.id(), body.into_inner())
            .await
            .map(|_| MessageResponse {
                message: "رمز عبور با موفقیت تغییر کرد".to_string(),
            }),
    ))
}

// ============ Tutorials ============

pub async fn list_tutorials(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<PageQuery>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state.tutorials.list_own(user.id(), query.page()).await,
    ))
}

pub async fn create_tutorial(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<TutorialForm>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state
            .tutorials
            .create(user.id(), body.into_inner())
            .await
            .map(|t| TutorialSummary::new(&t, 0)),
    ))
}

pub async fn tutorial_details(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state
            .tutorials
            .owned_details(user.id(), path.into_inner())
            .await,
    ))
}

pub async fn update_tutorial(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<TutorialForm>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state
            .tutorials
            .update(user.id(), path.into_inner(), body.into_inner())
            .await
            .map(|t| TutorialSummary::new(&t, 0)),
    ))
}

pub async fn delete_tutorial(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<OwnerActionRequest>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state
            .tutorials
            .delete_or_deactivate(user.id(), path.into_inner(), body.action)
            .await,
    ))
}

// ============ Comments ============

pub async fn list_comments(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<PageQuery>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state.comments.list_own(user.id(), query.page()).await,
    ))
}

pub async fn comment_replies(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<PageQuery>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state.comments.replies_to(user.id(), query.page()).await,
    ))
}

pub async fn comment_details(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state
            .comments
            .owned_comment(user.id(), path.into_inner())
            .await
            .map(|c| CommentView::from(&c)),
    ))
}

pub async fn update_comment(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<CommentEditForm>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state
            .comments
            .update(user.id(), path.into_inner(), body.into_inner())
            .await
            .map(|c| CommentView::from(&c)),
    ))
}

pub async fn delete_comment(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<OwnerActionRequest>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state
            .comments
            .delete_or_deactivate(user.id(), path.into_inner(), body.action)
            .await,
    ))
}

// ============ Relation lists ============

async fn relation_list(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<PageQuery>,
    list: RelationList,
) -> ActixResult<actix_web::HttpResponse> {
    Ok(api_result(
        state
            .reactions
            .relation_list(user.id(), list, query.page())
            .await,
    ))
}

macro_rules! relation_list_handler {
    ($name:ident, $list:ident) => {
        pub async fn $name(
            state: web::Data<AppState>,
            user: CurrentUser,
            query: web::Query<PageQuery>,
        ) -> ActixResult<impl Responder> {
            relation_list(state, user, query, RelationList::$list).await
        }
    };
}

relation_list_handler!(tutorials_viewed_by_others, TutorialViewsByOthers);
relation_list_handler!(tutorials_liked_by_others, TutorialLikesByOthers);
relation_list_handler!(tutorials_liked_by_me, TutorialLikesByMe);
relation_list_handler!(comments_liked_by_others, CommentLikesByOthers);
relation_list_handler!(comments_liked_by_me, CommentLikesByMe);

pub fn panel_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/user")
            .wrap(LoginRequired::user())
            .route("", web::get().to(panel_home))
            .route("/", web::get().to(panel_home))
            .route("/profile", web::get().to(profile))
            .route("/profile", web::post().to(update_profile))
            .route("/password", web::post().to(change_password))
            .route("/tutorials", web::get().to(list_tutorials))
            .route("/tutorials", web::post().to(create_tutorial))
            .route(
                "/tutorials/viewed_by_others",
                web::get().to(tutorials_viewed_by_others),
            )
            .route(
                "/tutorials/liked_by_others",
                web::get().to(tutorials_liked_by_others),
            )
            .route("/tutorials/liked_by_me", web::get().to(tutorials_liked_by_me))
            .route("/tutorials/{id}", web::get().to(tutorial_details))
            .route("/tutorials/{id}", web::post().to(update_tutorial))
            .route("/tutorials/{id}/delete", web::post().to(delete_tutorial))
            .route("/comments", web::get().to(list_comments))
            .route("/comments/replies", web::get().to(comment_replies))
            .route(
                "/comments/liked_by_others",
                web::get().to(comments_liked_by_others),
            )
            .route("/comments/liked_by_me", web::get().to(comments_liked_by_me))
            .route("/comments/{id}", web::get().to(comment_details))
            .route("/comments/{id}", web::post().to(update_comment))
            .route("/comments/{id}/delete", web::post().to(delete_comment)),
    );
}
