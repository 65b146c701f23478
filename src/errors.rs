use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Per-field form errors, serialized as `{field: [messages]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded, otherwise an `InvalidForm` error.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(MajazamoozError::InvalidForm(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            first = false;
            write!(f, "{}: {}", field, messages.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum MajazamoozError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    InvalidForm(FieldErrors),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    Serialization(String),
    DateParse(String),
    Token(String),
    Email(String),
}

impl MajazamoozError {
    pub fn code(&self) -> &'static str {
        match self {
            MajazamoozError::DatabaseConfig(_) => "E001",
            MajazamoozError::DatabaseConnection(_) => "E002",
            MajazamoozError::DatabaseOperation(_) => "E003",
            MajazamoozError::FileOperation(_) => "E004",
            MajazamoozError::Validation(_) => "E005",
            MajazamoozError::InvalidForm(_) => "E006",
            MajazamoozError::NotFound(_) => "E007",
            MajazamoozError::Unauthorized(_) => "E008",
            MajazamoozError::Forbidden(_) => "E009",
            MajazamoozError::Conflict(_) => "E010",
            MajazamoozError::Serialization(_) => "E011",
            MajazamoozError::DateParse(_) => "E012",
            MajazamoozError::Token(_) => "E013",
            MajazamoozError::Email(_) => "E014",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            MajazamoozError::DatabaseConfig(_) => "Database Configuration Error",
            MajazamoozError::DatabaseConnection(_) => "Database Connection Error",
            MajazamoozError::DatabaseOperation(_) => "Database Operation Error",
            MajazamoozError::FileOperation(_) => "File Operation Error",
            MajazamoozError::Validation(_) => "Validation Error",
            MajazamoozError::InvalidForm(_) => "Invalid Form",
            MajazamoozError::NotFound(_) => "Resource Not Found",
            MajazamoozError::Unauthorized(_) => "Unauthorized",
            MajazamoozError::Forbidden(_) => "Forbidden",
            MajazamoozError::Conflict(_) => "Conflict",
            MajazamoozError::Serialization(_) => "Serialization Error",
            MajazamoozError::DateParse(_) => "Date Parse Error",
            MajazamoozError::Token(_) => "Token Error",
            MajazamoozError::Email(_) => "Email Error",
        }
    }

    /// Human readable detail. Form errors are flattened into one line.
    pub fn message(&self) -> String {
        match self {
            MajazamoozError::InvalidForm(errors) => errors.to_string(),
            MajazamoozError::DatabaseConfig(msg)
            | MajazamoozError::DatabaseConnection(msg)
            | MajazamoozError::DatabaseOperation(msg)
            | MajazamoozError::FileOperation(msg)
            | MajazamoozError::Validation(msg)
            | MajazamoozError::NotFound(msg)
            | MajazamoozError::Unauthorized(msg)
            | MajazamoozError::Forbidden(msg)
            | MajazamoozError::Conflict(msg)
            | MajazamoozError::Serialization(msg)
            | MajazamoozError::DateParse(msg)
            | MajazamoozError::Token(msg)
            | MajazamoozError::Email(msg) => msg.clone(),
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            MajazamoozError::Validation(_)
            | MajazamoozError::InvalidForm(_)
            | MajazamoozError::DateParse(_)
            | MajazamoozError::Serialization(_) => 400,
            MajazamoozError::Unauthorized(_) | MajazamoozError::Token(_) => 401,
            MajazamoozError::Forbidden(_) => 403,
            MajazamoozError::NotFound(_) => 404,
            MajazamoozError::Conflict(_) => 409,
            MajazamoozError::DatabaseConfig(_)
            | MajazamoozError::DatabaseConnection(_)
            | MajazamoozError::DatabaseOperation(_)
            | MajazamoozError::FileOperation(_)
            | MajazamoozError::Email(_) => 500,
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            MajazamoozError::InvalidForm(errors) => Some(errors),
            _ => None,
        }
    }

    /// Colored output for startup failures.
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for MajazamoozError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for MajazamoozError {}

impl MajazamoozError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        MajazamoozError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        MajazamoozError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        MajazamoozError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        MajazamoozError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        MajazamoozError::Validation(msg.into())
    }

    /// Single-field form error.
    pub fn invalid_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, msg);
        MajazamoozError::InvalidForm(errors)
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        MajazamoozError::NotFound(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        MajazamoozError::Unauthorized(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        MajazamoozError::Forbidden(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        MajazamoozError::Conflict(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        MajazamoozError::Serialization(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        MajazamoozError::DateParse(msg.into())
    }

    pub fn token<T: Into<String>>(msg: T) -> Self {
        MajazamoozError::Token(msg.into())
    }

    pub fn email<T: Into<String>>(msg: T) -> Self {
        MajazamoozError::Email(msg.into())
    }
}

impl From<sea_orm::DbErr> for MajazamoozError {
    fn from(err: sea_orm::DbErr) -> Self {
        MajazamoozError::DatabaseOperation(err.to_string())
    }
}

impl From<sea_orm::TransactionError<MajazamoozError>> for MajazamoozError {
    fn from(err: sea_orm::TransactionError<MajazamoozError>) -> Self {
        match err {
            sea_orm::TransactionError::Connection(db) => db.into(),
            sea_orm::TransactionError::Transaction(inner) => inner,
        }
    }
}

impl From<std::io::Error> for MajazamoozError {
    fn from(err: std::io::Error) -> Self {
        MajazamoozError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for MajazamoozError {
    fn from(err: serde_json::Error) -> Self {
        MajazamoozError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for MajazamoozError {
    fn from(err: chrono::ParseError) -> Self {
        MajazamoozError::DateParse(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for MajazamoozError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        MajazamoozError::Token(err.to_string())
    }
}

impl From<lettre::error::Error> for MajazamoozError {
    fn from(err: lettre::error::Error) -> Self {
        MajazamoozError::Email(err.to_string())
    }
}

impl From<lettre::address::AddressError> for MajazamoozError {
    fn from(err: lettre::address::AddressError) -> Self {
        MajazamoozError::Email(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for MajazamoozError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        MajazamoozError::Email(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MajazamoozError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_collect_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("title", "این فیلد الزامی است");
        errors.add("title", "حداکثر ۵۰ کاراکتر");
        errors.add("body", "این فیلد الزامی است");

        assert_eq!(errors.get("title").map(|m| m.len()), Some(2));
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["body"][0], "این فیلد الزامی است");

        let err = errors.into_result().unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert_eq!(err.code(), "E006");
    }

    #[test]
    fn empty_field_errors_are_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn status_mapping() {
        assert_eq!(MajazamoozError::not_found("x").http_status(), 404);
        assert_eq!(MajazamoozError::forbidden("x").http_status(), 403);
        assert_eq!(MajazamoozError::conflict("x").http_status(), 409);
        assert_eq!(
            MajazamoozError::database_operation("x").http_status(),
            500
        );
    }

    #[test]
    fn db_error_converts_to_operation_error() {
        let err: MajazamoozError = sea_orm::DbErr::Custom("boom".into()).into();
        assert!(matches!(err, MajazamoozError::DatabaseOperation(_)));
        assert!(err.message().contains("boom"));
    }
}
