//! Cookie session authentication.
//!
//! [`SessionAuth`] wraps the whole app: it reads the session cookie, checks
//! the JWT and loads the user into request extensions. [`LoginRequired`]
//! wraps protected scopes and turns anonymous requests away.

use actix_service::{Service, Transform};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
    body::EitherBody,
    dev::{Payload, ServiceRequest, ServiceResponse},
    http::{StatusCode, header::LOCATION},
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, trace};

use crate::api::AppState;
use crate::api::constants::{LOGIN_PATH, SESSION_COOKIE_NAME};
use crate::api::services::error_code::ErrorCode;
use crate::api::services::helpers::error_response;
use migration::entities::user;

/// The signed-in, active user of this request.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub user::Model);

impl CurrentUser {
    pub fn id(&self) -> i32 {
        self.0.id
    }
}

impl FromRequest for CurrentUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<CurrentUser>()
                .cloned()
                .ok_or_else(|| actix_web::error::ErrorUnauthorized("Login required")),
        )
    }
}

/// `/auth/login?next=<path and query>`
pub fn login_redirect_url(path_and_query: &str) -> String {
    format!(
        "{}?next={}",
        LOGIN_PATH,
        urlencoding::encode(path_and_query)
    )
}

// ============ SessionAuth ============

#[derive(Clone, Default)]
pub struct SessionAuth;

impl<S, B> Transform<S, ServiceRequest> for SessionAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct SessionAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SessionAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        Box::pin(async move {
            let token = req.cookie(SESSION_COOKIE_NAME).map(|c| c.value().to_string());
            let state = req.app_data::<web::Data<AppState>>().cloned();

            if let (Some(token), Some(state)) = (token, state) {
                match state.jwt.validate_session_token(&token) {
                    Ok(claims) => {
                        if let Some(user_id) = claims.user_id() {
                            match state.storage.find_user(user_id).await {
                                Ok(Some(user)) if user.is_active => {
                                    trace!("Session resolved to user {}", user.id);
                                    tracing::Span::current().record("user_id", user.id);
                                    req.extensions_mut().insert(CurrentUser(user));
                                }
                                Ok(_) => debug!("Session user {} missing or inactive", user_id),
                                Err(e) => debug!("Session user lookup failed: {}", e),
                            }
                        }
                    }
                    Err(e) => debug!("Session token rejected: {}", e),
                }
            }

            srv.call(req).await
        })
    }
}

// ============ LoginRequired ============

/// Anonymous requests are redirected to the login page; with `staff`, signed-in
/// non-staff users get 403.
#[derive(Clone, Copy, Default)]
pub struct LoginRequired {
    staff: bool,
}

impl LoginRequired {
    pub fn user() -> Self {
        Self { staff: false }
    }

    pub fn staff() -> Self {
        Self { staff: true }
    }
}

impl<S, B> Transform<S, ServiceRequest> for LoginRequired
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = LoginRequiredMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoginRequiredMiddleware {
            service: Rc::new(service),
            staff: self.staff,
        }))
    }
}

pub struct LoginRequiredMiddleware<S> {
    service: Rc<S>,
    staff: bool,
}

impl<S, B> Service<ServiceRequest> for LoginRequiredMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let staff = self.staff;

        Box::pin(async move {
            let is_staff = req.extensions().get::<CurrentUser>().map(|u| u.0.is_staff);

            match is_staff {
                None => {
                    let target = req
                        .uri()
                        .path_and_query()
                        .map(|pq| pq.as_str().to_string())
                        .unwrap_or_else(|| req.path().to_string());
                    debug!("Anonymous request to {} redirected to login", target);
                    let response = HttpResponse::Found()
                        .insert_header((LOCATION, login_redirect_url(&target)))
                        .finish();
                    Ok(req.into_response(response.map_into_right_body()))
                }
                Some(false) if staff => {
                    let response = error_response(
                        StatusCode::FORBIDDEN,
                        ErrorCode::Forbidden,
                        "دسترسی به این بخش فقط برای کارکنان مجاز است",
                    );
                    Ok(req.into_response(response.map_into_right_body()))
                }
                Some(_) => Ok(srv.call(req).await?.map_into_left_body()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_redirect_encodes_next() {
        assert_eq!(
            login_redirect_url("/user/tutorials?page=2"),
            "/auth/login?next=%2Fuser%2Ftutorials%3Fpage%3D2"
        );
    }
}
