//! API error codes

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::MajazamoozError;

/// Numeric `code` of the JSON envelope, grouped by thousands:
/// - 0: success
/// - 1000-1099: general
/// - 2000-2099: auth
/// - 3000-3099: learning
/// - 4000-4099: exams
/// - 5000-5099: runtime config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // General 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    InvalidForm = 1006,
    Conflict = 1009,
    InvalidDateFormat = 1012,
    ServiceUnavailable = 1030,

    // Auth 2000-2099
    AuthFailed = 2000,
    TokenExpired = 2001,
    TokenInvalid = 2002,
    EmailNotConfirmed = 2003,
    RateLimitExceeded = 2004,
    EmailDeliveryFailed = 2005,

    // Learning 3000-3099
    TutorialNotFound = 3000,
    CommentNotFound = 3001,
    CategoryNotFound = 3002,
    LearningDatabaseError = 3005,

    // Exams 4000-4099
    ExamNotFound = 4000,
    ExamClosed = 4001,
    ParticipationNotFound = 4002,

    // Runtime config 5000-5099
    ConfigNotFound = 5000,
    ConfigUpdateFailed = 5001,
}

impl From<&MajazamoozError> for ErrorCode {
    fn from(err: &MajazamoozError) -> Self {
        match err {
            MajazamoozError::Validation(_) | MajazamoozError::Serialization(_) => {
                ErrorCode::BadRequest
            }
            MajazamoozError::InvalidForm(_) => ErrorCode::InvalidForm,
            MajazamoozError::DateParse(_) => ErrorCode::InvalidDateFormat,
            MajazamoozError::NotFound(_) => ErrorCode::NotFound,
            MajazamoozError::Unauthorized(_) => ErrorCode::AuthFailed,
            MajazamoozError::Token(_) => ErrorCode::TokenInvalid,
            MajazamoozError::Forbidden(_) => ErrorCode::Forbidden,
            MajazamoozError::Conflict(_) => ErrorCode::Conflict,
            MajazamoozError::Email(_) => ErrorCode::EmailDeliveryFailed,
            MajazamoozError::DatabaseOperation(_) => ErrorCode::LearningDatabaseError,
            MajazamoozError::DatabaseConfig(_)
            | MajazamoozError::DatabaseConnection(_)
            | MajazamoozError::FileOperation(_) => ErrorCode::InternalServerError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::Success).unwrap(), "0");
        assert_eq!(serde_json::to_string(&ErrorCode::ExamClosed).unwrap(), "4001");
    }

    #[test]
    fn maps_errors() {
        assert_eq!(
            ErrorCode::from(&MajazamoozError::not_found("x")),
            ErrorCode::NotFound
        );
        assert_eq!(
            ErrorCode::from(&MajazamoozError::invalid_field("title", "x")),
            ErrorCode::InvalidForm
        );
        assert_eq!(
            ErrorCode::from(&MajazamoozError::token("x")),
            ErrorCode::TokenInvalid
        );
    }
}
