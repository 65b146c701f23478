//! `/auth`: login, logout, registration and e-mail confirmation.

use actix_governor::{Governor, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError};
use actix_web::dev::ServiceRequest;
use actix_web::http::header::LOCATION;
use actix_web::{HttpRequest, HttpResponse, Responder, Result as ActixResult, web};
use governor::middleware::NoOpMiddleware;
use serde::Serialize;
use tracing::{debug, info};

use crate::api::AppState;
use crate::api::constants::LOGOUT_REQUIRED_PATH;
use crate::api::middleware::{CurrentUser, LoginRequired};
use crate::errors::MajazamoozError;
use crate::services::account_service::{LoginForm, RegisterForm};
use crate::services::dto::UserProfile;
use crate::utils::is_safe_next;

use super::helpers::{
    CookieBuilder, api_result, error_from_majazamooz, success_response, with_cookie,
};
use super::types::{MessageResponse, NextQuery, RedirectResponse};

/// Rate-limit key: the TCP peer address.
#[derive(Clone, Copy)]
pub struct LoginKeyExtractor;

impl KeyExtractor for LoginKeyExtractor {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> Result<Self::Key, Self::KeyExtractionError> {
        Ok(req
            .peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string()))
    }
}

/// One token per second, bursts of 10.
pub fn login_rate_limiter() -> Governor<LoginKeyExtractor, NoOpMiddleware> {
    let config = GovernorConfigBuilder::default()
        .seconds_per_request(1)
        .burst_size(10)
        .key_extractor(LoginKeyExtractor)
        .finish()
        .expect("Invalid rate limit config");

    debug!("Login rate limiter created: 1 req/s, burst 10");
    Governor::new(&config)
}

/// Signed-in users reaching login or register without `next` are sent to
/// the logout-required page.
fn logout_required_redirect(
    req: &HttpRequest,
    user: Option<&CurrentUser>,
    next: &NextQuery,
) -> Option<HttpResponse> {
    let has_next = next.next.as_deref().is_some_and(|n| !n.is_empty());
    if user.is_none() || has_next {
        return None;
    }
    let current = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.path().to_string());
    Some(
        HttpResponse::Found()
            .insert_header((
                LOCATION,
                format!(
                    "{}?next={}",
                    LOGOUT_REQUIRED_PATH,
                    urlencoding::encode(&current)
                ),
            ))
            .finish(),
    )
}

#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub next: Option<String>,
}

/// `GET /auth/login`
pub async fn login_page(
    req: HttpRequest,
    user: Option<CurrentUser>,
    query: web::Query<NextQuery>,
) -> ActixResult<impl Responder> {
    if let Some(redirect) = logout_required_redirect(&req, user.as_ref(), &query) {
        return Ok(redirect);
    }
    Ok(success_response(LoginPage {
        next: query.into_inner().next.filter(|n| is_safe_next(n)),
    }))
}

/// `POST /auth/login`
pub async fn login(
    req: HttpRequest,
    user: Option<CurrentUser>,
    state: web::Data<AppState>,
    query: web::Query<NextQuery>,
    body: web::Json<LoginForm>,
) -> ActixResult<impl Responder> {
    if let Some(redirect) = logout_required_redirect(&req, user.as_ref(), &query) {
        return Ok(redirect);
    }

    match state.accounts.login(body.into_inner()).await {
        Ok(outcome) => {
            let cookie =
                CookieBuilder::new(&state.auth).session_cookie(outcome.token, outcome.max_age);
            let redirect = query
                .into_inner()
                .next
                .filter(|n| is_safe_next(n))
                .unwrap_or_else(|| "/".to_string());
            info!("User {} logged in, redirecting to {}", outcome.user.id, redirect);
            Ok(with_cookie(success_response(RedirectResponse { redirect }), cookie))
        }
        Err(e) => Ok(error_from_majazamooz(&e)),
    }
}

/// `POST /auth/logout`
pub async fn logout(
    state: web::Data<AppState>,
    user: Option<CurrentUser>,
) -> ActixResult<impl Responder> {
    if let Some(user) = user {
        info!("User {} logged out", user.id());
    }
    let cookie = CookieBuilder::new(&state.auth).expired_session_cookie();
    Ok(with_cookie(
        success_response(MessageResponse {
            message: "با موفقیت از حساب کاربری خارج شدید".to_string(),
        }),
        cookie,
    ))
}

/// `GET /auth/logout_required?next=`
pub async fn logout_required(query: web::Query<NextQuery>) -> ActixResult<impl Responder> {
    Ok(success_response(LoginPage {
        next: query.into_inner().next.filter(|n| is_safe_next(n)),
    }))
}

/// `POST /auth/register`
pub async fn register(
    req: HttpRequest,
    user: Option<CurrentUser>,
    state: web::Data<AppState>,
    query: web::Query<NextQuery>,
    body: web::Json<RegisterForm>,
) -> ActixResult<impl Responder> {
    if let Some(redirect) = logout_required_redirect(&req, user.as_ref(), &query) {
        return Ok(redirect);
    }
    Ok(api_result(
        state
            .accounts
            .register(body.into_inner())
            .await
            .map(|u| UserProfile::from(&u)),
    ))
}

/// `GET /auth/confirm_email/{uid}/{token}`
pub async fn confirm_email(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ActixResult<impl Responder> {
    let (uid, token) = path.into_inner();
    Ok(api_result(
        state
            .accounts
            .confirm_email(&uid, &token)
            .await
            .map(|_| MessageResponse {
                message: "ایمیل شما با موفقیت تایید شد".to_string(),
            }),
    ))
}

/// `POST /auth/resend_confirmation`
pub async fn resend_confirmation(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> ActixResult<impl Responder> {
    if user.0.email_confirmed {
        return Ok(error_from_majazamooz(&MajazamoozError::conflict(
            "ایمیل شما قبلا تایید شده است",
        )));
    }
    Ok(api_result(
        state
            .accounts
            .send_confirmation_email(&user.0)
            .await
            .map(|sent| MessageResponse {
                message: if sent {
                    "ایمیل تایید ارسال شد".to_string()
                } else {
                    "ارسال ایمیل با خطا مواجه شد".to_string()
                },
            }),
    ))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/login", web::get().to(login_page))
            .route(
                "/login",
                web::post().to(login).wrap(login_rate_limiter()),
            )
            .route("/logout", web::post().to(logout))
            .route("/register", web::post().to(register))
            .route("/confirm_email/{uid}/{token}", web::get().to(confirm_email))
            .service(
                web::scope("")
                    .wrap(LoginRequired::user())
                    .route("/logout_required", web::get().to(logout_required))
                    .route("/resend_confirmation", web::post().to(resend_confirmation)),
            ),
    );
}
