//! Validation of runtime configuration values against their definitions.

use super::definitions::get_def;

const MIN_SECRET_LEN: usize = 16;

/// Check that `value` fits the declared type of `key`.
///
/// Unknown keys are rejected; every editable setting has a definition.
pub fn validate_config_value(key: &str, value: &str) -> Result<(), String> {
    let def = get_def(key).ok_or_else(|| format!("Unknown config key: {}", key))?;

    def.value_type.accepts(value)?;
    if def.is_sensitive && value.len() < MIN_SECRET_LEN {
        return Err(format!(
            "Secret values must be at least {} characters",
            MIN_SECRET_LEN
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::keys;

    #[test]
    fn test_int_values() {
        assert!(validate_config_value(keys::TUTORIAL_LIKE_SCORE, "7").is_ok());
        assert!(validate_config_value(keys::TUTORIAL_DOWNVOTE_SCORE, "-2").is_ok());
        assert!(validate_config_value(keys::TUTORIAL_LIKE_SCORE, "five").is_err());
    }

    #[test]
    fn test_unknown_key() {
        assert!(validate_config_value("NOT_A_KEY", "1").is_err());
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(validate_config_value(keys::AUTH_JWT_SECRET, "short").is_err());
        assert!(validate_config_value(keys::AUTH_JWT_SECRET, "0123456789abcdef0123").is_ok());
    }
}
