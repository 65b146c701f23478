//! Public learning pages: home, tutorial archive and tutorial details.

use actix_web::{Responder, Result as ActixResult, web};

use crate::api::AppState;
use crate::api::middleware::CurrentUser;
use crate::services::tutorial_service::ArchiveQuery;

use super::helpers::api_result;

/// `GET /`
pub async fn home(state: web::Data<AppState>) -> ActixResult<impl Responder> {
    Ok(api_result(state.tutorials.home().await))
}

/// `GET /tutorial?category=&search=&page=`
pub async fn archive(
    state: web::Data<AppState>,
    query: web::Query<ArchiveQuery>,
) -> ActixResult<impl Responder> {
    Ok(api_result(state.tutorials.archive(query.into_inner()).await))
}

/// `GET /tutorial/category/{slug}`
pub async fn category_archive(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ArchiveQuery>,
) -> ActixResult<impl Responder> {
    let query = ArchiveQuery {
        category: Some(path.into_inner()),
        ..query.into_inner()
    };
    Ok(api_result(state.tutorials.archive(query).await))
}

/// `GET /tutorial/{slug}`; records a view.
pub async fn details(
    state: web::Data<AppState>,
    user: Option<CurrentUser>,
    path: web::Path<String>,
) -> ActixResult<impl Responder> {
    let viewer = user.as_ref().map(CurrentUser::id);
    Ok(api_result(state.tutorials.details(&path, viewer).await))
}

pub fn learning_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(home)).service(
        web::scope("/tutorial")
            .route("", web::get().to(archive))
            .route("/", web::get().to(archive))
            .route("/category/{slug}", web::get().to(category_archive))
            .route("/{slug}", web::get().to(details)),
    );
}
