use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{RuntimeConfig, keys};

const SESSION: &str = "session";
const EMAIL_CONFIRM: &str = "email_confirm";

/// Login session carried in the auth cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_type: String,
}

impl SessionClaims {
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

/// E-mail confirmation link payload.
///
/// Binding the address and the confirmed flag makes the token single-use and
/// void once the address changes.
#[derive(Debug, Serialize, Deserialize)]
pub struct EmailConfirmClaims {
    pub sub: String,
    pub email: String,
    pub confirmed: bool,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_type: String,
}

/// JWT Service for generating and validating tokens
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_hours: u64,
    remember_me_days: u64,
    email_confirm_hours: u64,
}

impl JwtService {
    pub fn new(
        secret: &str,
        session_hours: u64,
        remember_me_days: u64,
        email_confirm_hours: u64,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            session_hours,
            remember_me_days,
            email_confirm_hours,
        }
    }

    pub fn from_runtime(rt: &RuntimeConfig) -> Self {
        let jwt_secret = rt
            .get(keys::AUTH_JWT_SECRET)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                warn!("JWT secret not configured or empty, generating secure random token");
                crate::utils::generate_secure_token(32)
            });

        Self::new(
            &jwt_secret,
            rt.get_positive_or(keys::AUTH_SESSION_HOURS, 12),
            rt.get_positive_or(keys::AUTH_REMEMBER_ME_DAYS, 14),
            rt.get_positive_or(keys::AUTH_EMAIL_CONFIRM_HOURS, 72),
        )
    }

    /// Token lifetime for a login; `remember_me` selects the long one.
    pub fn session_lifetime(&self, remember_me: bool) -> Duration {
        if remember_me {
            Duration::days(self.remember_me_days as i64)
        } else {
            Duration::hours(self.session_hours as i64)
        }
    }

    pub fn generate_session_token(
        &self,
        user_id: i32,
        remember_me: bool,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.session_lifetime(remember_me)).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: SESSION.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    pub fn validate_session_token(
        &self,
        token: &str,
    ) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())?;

        if token_data.claims.token_type != SESSION {
            return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
        }

        Ok(token_data.claims)
    }

    pub fn generate_email_confirm_token(
        &self,
        user_id: i32,
        email: &str,
        confirmed: bool,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = EmailConfirmClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            confirmed,
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.email_confirm_hours as i64)).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: EMAIL_CONFIRM.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    pub fn validate_email_confirm_token(
        &self,
        token: &str,
    ) -> Result<EmailConfirmClaims, jsonwebtoken::errors::Error> {
        let token_data =
            decode::<EmailConfirmClaims>(token, &self.decoding_key, &Validation::default())?;

        if token_data.claims.token_type != EMAIL_CONFIRM {
            return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
        }

        Ok(token_data.claims)
    }
}
