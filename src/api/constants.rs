//! Names shared by the auth middleware and handlers.

/// Session JWT cookie.
pub const SESSION_COOKIE_NAME: &str = "majazamooz_session";

/// Header that marks an AJAX request.
pub const AJAX_HEADER: &str = "X-Requested-With";
pub const AJAX_HEADER_VALUE: &str = "XMLHttpRequest";

pub const LOGIN_PATH: &str = "/auth/login";
pub const LOGOUT_REQUIRED_PATH: &str = "/auth/logout_required";
