pub mod admin;
pub mod ajax;
pub mod auth;
pub mod error_code;
pub mod exams;
pub mod health;
pub mod helpers;
pub mod learning;
pub mod panel;
pub mod types;

use actix_web::web;

pub use error_code::ErrorCode;
pub use helpers::{api_result, error_from_majazamooz, error_response, success_response};
pub use types::{AjaxResponse, ApiResponse};

/// Every route of the site. Fixed paths are registered before the slug routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    health::health_routes(cfg);
    auth::auth_routes(cfg);
    ajax::ajax_routes(cfg);
    panel::panel_routes(cfg);
    admin::admin_routes(cfg);
    exams::exam_routes(cfg);
    learning::learning_routes(cfg);
}
