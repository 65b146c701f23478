//! Declared types of runtime settings.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Stored as its lowercase name in `system_config.value_type`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ValueType {
    String,
    Int,
    Bool,
}

impl ValueType {
    /// Whether `raw` can be read back as this type.
    pub fn accepts(self, raw: &str) -> Result<(), String> {
        match self {
            Self::String => Ok(()),
            Self::Int => raw
                .trim()
                .parse::<i64>()
                .map(|_| ())
                .map_err(|_| format!("Expected an integer, got '{}'", raw)),
            Self::Bool => parse_bool(raw)
                .map(|_| ())
                .ok_or_else(|| format!("Expected a boolean, got '{}'", raw)),
        }
    }
}

/// `true/false`, `1/0` and `yes/no`, in any case.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_names_are_lowercase() {
        assert_eq!(ValueType::Int.to_string(), "int");
        assert_eq!("bool".parse::<ValueType>().unwrap(), ValueType::Bool);
        assert!("float".parse::<ValueType>().is_err());
    }

    #[test]
    fn reward_amounts_must_be_integers() {
        assert!(ValueType::Int.accepts(" -3 ").is_ok());
        assert!(ValueType::Int.accepts("3.5").is_err());
        assert!(ValueType::Bool.accepts("Yes").is_ok());
        assert!(ValueType::Bool.accepts("maybe").is_err());
        assert_eq!(parse_bool("0"), Some(false));
    }
}
