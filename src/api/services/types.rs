//! Response envelopes and small request bodies shared by the handlers.

use serde::{Deserialize, Serialize};

/// `{"code": .., "message": .., "data": ..}`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// `{"status": 1 | -1 | 0, "error"?: ..}` for the AJAX endpoints.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AjaxResponse<E = String> {
    pub status: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<E>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct PageQuery {
    pub page: Option<u64>,
}

impl PageQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Bulk moderation body: `{"ids": [..]}`.
#[derive(Deserialize, Clone, Debug)]
pub struct IdsRequest {
    pub ids: Vec<i32>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ConfigUpdateRequest {
    pub value: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct RedirectResponse {
    pub redirect: String,
}
