//! Response and cookie helpers

use actix_web::HttpResponse;
use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::http::StatusCode;
use serde::Serialize;
use tracing::error;

use crate::api::constants::SESSION_COOKIE_NAME;
use crate::config::{AuthConfig, SameSitePolicy};
use crate::errors::MajazamoozError;

use super::error_code::ErrorCode;
use super::types::ApiResponse;

pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// Map an error onto the envelope. Form errors travel in `data` as
/// `{field: [messages]}`.
pub fn error_from_majazamooz(err: &MajazamoozError) -> HttpResponse {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!("Request failed: {}", err);
    }
    let code = ErrorCode::from(err);
    match err.field_errors() {
        Some(fields) => json_response(status, code, err.message(), Some(fields)),
        None => error_response(status, code, &err.message()),
    }
}

/// `Ok` becomes 200 with the data, `Err` goes through [`error_from_majazamooz`].
pub fn api_result<T, E>(result: Result<T, E>) -> HttpResponse
where
    T: Serialize,
    E: Into<MajazamoozError>,
{
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_majazamooz(&e.into()),
    }
}

pub fn with_cookie(mut response: HttpResponse, cookie: Cookie<'static>) -> HttpResponse {
    if let Err(e) = response.add_cookie(&cookie) {
        error!("Failed to set cookie '{}': {}", cookie.name(), e);
    }
    response
}

/// Builds the session cookie from `[auth]` settings.
pub struct CookieBuilder {
    same_site: SameSite,
    secure: bool,
    domain: Option<String>,
}

impl CookieBuilder {
    pub fn new(auth: &AuthConfig) -> Self {
        let same_site = match auth.cookie_same_site {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::None => SameSite::None,
            SameSitePolicy::Lax => SameSite::Lax,
        };
        Self {
            same_site,
            secure: auth.cookie_secure,
            domain: auth.cookie_domain.clone(),
        }
    }

    fn base(&self, value: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(SESSION_COOKIE_NAME, value);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_secure(self.secure);
        cookie.set_same_site(self.same_site);
        if let Some(ref domain) = self.domain {
            cookie.set_domain(domain.clone());
        }
        cookie
    }

    /// Without `max_age` the cookie lasts for the browser session.
    pub fn session_cookie(&self, token: String, max_age: Option<chrono::Duration>) -> Cookie<'static> {
        let mut cookie = self.base(token);
        if let Some(max_age) = max_age {
            cookie.set_max_age(CookieDuration::seconds(max_age.num_seconds()));
        }
        cookie
    }

    pub fn expired_session_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.base(String::new());
        cookie.set_max_age(CookieDuration::ZERO);
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let response = error_from_majazamooz(&MajazamoozError::not_found("آموزش یافت نشد"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn form_errors_map_to_400() {
        let response =
            error_from_majazamooz(&MajazamoozError::invalid_field("title", "این فیلد الزامی است"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_result_success() {
        let response = api_result::<_, MajazamoozError>(Ok("data"));
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn remember_me_cookie_has_max_age() {
        let builder = CookieBuilder::new(&AuthConfig::default());
        let persistent = builder.session_cookie("t".into(), Some(chrono::Duration::days(14)));
        assert_eq!(
            persistent.max_age(),
            Some(CookieDuration::seconds(14 * 24 * 3600))
        );
        assert!(persistent.http_only().unwrap_or(false));

        let session = builder.session_cookie("t".into(), None);
        assert_eq!(session.max_age(), None);

        let expired = builder.expired_session_cookie();
        assert_eq!(expired.max_age(), Some(CookieDuration::ZERO));
    }
}
