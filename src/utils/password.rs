//! Account passwords: Argon2id hashes in PHC string form, plus the form
//! rules shared by sign-up, password change and reset.

use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::password_hash::rand_core::OsRng;
use argon2::Argon2;

use crate::errors::{FieldErrors, MajazamoozError};

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug)]
pub enum PasswordError {
    /// Argon2 refused to hash (parameters or output length).
    Hashing(password_hash::Error),
    /// The stored value is not a PHC string.
    StoredHash(password_hash::Error),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hashing(e) => write!(f, "cannot hash password: {}", e),
            Self::StoredHash(e) => write!(f, "stored password hash is malformed: {}", e),
        }
    }
}

impl std::error::Error for PasswordError {}

impl From<PasswordError> for MajazamoozError {
    fn from(err: PasswordError) -> Self {
        MajazamoozError::validation(err.to_string())
    }
}

/// Fresh random salt every call, so equal passwords never share a hash.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(PasswordError::Hashing)?;
    Ok(hash.to_string())
}

/// `Ok(false)` for a wrong password; `Err` only when `stored` is unreadable.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored).map_err(PasswordError::StoredHash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::StoredHash(e)),
    }
}

/// Length and confirmation checks for a new password, reported on `field`
/// and `{field}_confirm`.
pub fn check_new_password(
    errors: &mut FieldErrors,
    field: &str,
    password: &str,
    confirmation: &str,
) {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(
            field,
            format!("رمز عبور باید حداقل {} کاراکتر باشد", MIN_PASSWORD_LENGTH),
        );
    }
    if password != confirmation {
        errors.add(format!("{}_confirm", field), "رمز عبور و تکرار آن یکسان نیستند");
    }
}
