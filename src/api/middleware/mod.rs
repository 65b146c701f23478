pub mod auth;
pub mod request_id;

pub use auth::{CurrentUser, LoginRequired, SessionAuth};
pub use request_id::{RequestId, RequestIdMiddleware};
