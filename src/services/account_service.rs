//! Registration, login, e-mail confirmation and profile management.

use std::str::FromStr;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use tracing::{info, warn};

use super::dto::double_option;
use super::notifications::{EmailMessage, Mailer, send_one};
use crate::api::jwt::JwtService;
use crate::config::SiteConfig;
use crate::errors::{FieldErrors, MajazamoozError, Result};
use crate::storage::SeaOrmStorage;
use crate::storage::backend::{NewUser, ProfileUpdate};
use crate::utils::password::{check_new_password, hash_password, verify_password};
use migration::entities::user;

pub const USERNAME_MAX_CHARS: usize = 150;
const BAD_CREDENTIALS: &str = "نام کاربری یا رمز عبور اشتباه است";
const BAD_CONFIRM_LINK: &str = "لینک تایید ایمیل نامعتبر است یا منقضی شده است";

// ============ Request DTOs ============

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username_or_email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordForm {
    pub old_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub avatar: Option<Option<String>>,
    pub tutorials_count_goal: Option<i64>,
    pub likes_count_goal: Option<i64>,
    pub views_count_goal: Option<i64>,
    pub comments_count_goal: Option<i64>,
}

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: user::Model,
    pub token: String,
    /// Cookie lifetime; `None` for a browser-session cookie.
    pub max_age: Option<chrono::Duration>,
}

/// `[\w.@+-]+`, at most 150 characters.
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.chars().count() <= USERNAME_MAX_CHARS
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
}

pub fn encode_uid(user_id: i32) -> String {
    URL_SAFE_NO_PAD.encode(user_id.to_string())
}

pub fn decode_uid(uid: &str) -> Option<i32> {
    let bytes = URL_SAFE_NO_PAD.decode(uid.trim_end_matches('=')).ok()?;
    String::from_utf8(bytes).ok()?.parse().ok()
}

// ============ AccountService Implementation ============

pub struct AccountService {
    storage: Arc<SeaOrmStorage>,
    jwt: Arc<JwtService>,
    mailer: Arc<dyn Mailer>,
    site: SiteConfig,
}

impl AccountService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        jwt: Arc<JwtService>,
        mailer: Arc<dyn Mailer>,
        site: SiteConfig,
    ) -> Self {
        Self {
            storage,
            jwt,
            mailer,
            site,
        }
    }

    pub async fn register(&self, form: RegisterForm) -> Result<user::Model> {
        let username = form.username.trim().to_string();
        let email = form.email.trim().to_lowercase();

        let mut errors = FieldErrors::new();
        if !is_valid_username(&username) {
            errors.add(
                "username",
                "نام کاربری فقط می تواند شامل حروف، اعداد و کاراکترهای @/./+/-/_ باشد",
            );
        } else if self.storage.username_exists(&username).await? {
            errors.add("username", "این نام کاربری قبلا ثبت شده است");
        }
        if lettre::Address::from_str(&email).is_err() {
            errors.add("email", "ایمیل وارد شده معتبر نیست");
        } else if self.storage.email_exists(&email).await? {
            errors.add("email", "این ایمیل قبلا ثبت شده است");
        }
        check_new_password(&mut errors, "password", &form.password, &form.password_confirm);
        errors.into_result()?;

        let created = self
            .storage
            .create_user(NewUser {
                username,
                email,
                password_hash: hash_password(&form.password)?,
                is_staff: false,
                email_confirmed: false,
            })
            .await?;

        self.send_confirmation_email(&created).await?;
        info!("AccountService: registered user '{}' (id={})", created.username, created.id);
        Ok(created)
    }

    /// Mail a confirmation link. Delivery failures are logged, not returned.
    pub async fn send_confirmation_email(&self, user: &user::Model) -> Result<bool> {
        let link = self.confirmation_link(user)?;
        let message = EmailMessage {
            to: user.email.clone(),
            subject: "تایید ایمیل".to_string(),
            body: format!(
                "{} عزیز، برای تایید ایمیل خود روی لینک زیر کلیک کنید:\n{}",
                user.username, link
            ),
        };
        Ok(send_one(self.mailer.as_ref(), &message).await)
    }

    pub fn confirmation_link(&self, user: &user::Model) -> Result<String> {
        let token = self
            .jwt
            .generate_email_confirm_token(user.id, &user.email, user.email_confirmed)?;
        Ok(self.site.absolute_url(&format!(
            "/auth/confirm_email/{}/{}",
            encode_uid(user.id),
            token
        )))
    }

    /// Valid once: a confirmed account no longer matches the token.
    pub async fn confirm_email(&self, uid: &str, token: &str) -> Result<user::Model> {
        let invalid = || MajazamoozError::validation(BAD_CONFIRM_LINK);

        let user_id = decode_uid(uid).ok_or_else(invalid)?;
        let claims = self
            .jwt
            .validate_email_confirm_token(token)
            .map_err(|_| invalid())?;
        let user = self.storage.find_user(user_id).await?.ok_or_else(invalid)?;

        if claims.sub != user.id.to_string()
            || claims.email != user.email
            || claims.confirmed != user.email_confirmed
            || user.email_confirmed
        {
            return Err(invalid());
        }

        self.storage.confirm_email(user.id).await?;
        info!("AccountService: user {} confirmed {}", user.id, user.email);
        Ok(user::Model {
            email_confirmed: true,
            ..user
        })
    }

    pub async fn login(&self, form: LoginForm) -> Result<LoginOutcome> {
        let user = self
            .storage
            .find_user_by_login(form.username_or_email.trim())
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| MajazamoozError::unauthorized(BAD_CREDENTIALS))?;

        let matches = verify_password(&form.password, &user.password).unwrap_or_else(|e| {
            warn!("Stored password of user {} is unreadable: {}", user.id, e);
            false
        });
        if !matches {
            return Err(MajazamoozError::unauthorized(BAD_CREDENTIALS));
        }

        let token = self.jwt.generate_session_token(user.id, form.remember_me)?;
        self.storage.touch_last_login(user.id).await?;
        info!("AccountService: user {} logged in", user.id);

        Ok(LoginOutcome {
            max_age: form
                .remember_me
                .then(|| self.jwt.session_lifetime(true)),
            user,
            token,
        })
    }

    pub async fn change_password(&self, user_id: i32, form: ChangePasswordForm) -> Result<()> {
        let user = self
            .storage
            .find_user(user_id)
            .await?
            .ok_or_else(|| MajazamoozError::not_found("کاربر یافت نشد"))?;

        let mut errors = FieldErrors::new();
        if !verify_password(&form.old_password, &user.password).unwrap_or(false) {
            errors.add("old_password", "رمز عبور فعلی اشتباه است");
        }
        check_new_password(
            &mut errors,
            "new_password",
            &form.new_password,
            &form.new_password_confirm,
        );
        errors.into_result()?;

        self.storage
            .set_password(user_id, hash_password(&form.new_password)?)
            .await?;
        info!("AccountService: user {} changed password", user_id);
        Ok(())
    }

    pub async fn update_profile(&self, user_id: i32, form: ProfileForm) -> Result<user::Model> {
        let mut errors = FieldErrors::new();
        for (field, value) in [
            ("tutorials_count_goal", form.tutorials_count_goal),
            ("likes_count_goal", form.likes_count_goal),
            ("views_count_goal", form.views_count_goal),
            ("comments_count_goal", form.comments_count_goal),
        ] {
            if value.is_some_and(|v| v < 0) {
                errors.add(field, "مقدار هدف نمی تواند منفی باشد");
            }
        }
        errors.into_result()?;

        self.storage
            .update_profile(
                user_id,
                ProfileUpdate {
                    first_name: form.first_name.map(|s| s.trim().to_string()),
                    last_name: form.last_name.map(|s| s.trim().to_string()),
                    avatar: form.avatar.map(|a| a.filter(|s| !s.is_empty())),
                    tutorials_count_goal: form.tutorials_count_goal,
                    likes_count_goal: form.likes_count_goal,
                    views_count_goal: form.views_count_goal,
                    comments_count_goal: form.comments_count_goal,
                },
            )
            .await
    }

    /// Staff account with a confirmed address, for the CLI.
    pub async fn create_superuser(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<user::Model> {
        let mut errors = FieldErrors::new();
        if !is_valid_username(username) {
            errors.add("username", "نام کاربری معتبر نیست");
        }
        if lettre::Address::from_str(email).is_err() {
            errors.add("email", "ایمیل وارد شده معتبر نیست");
        }
        check_new_password(&mut errors, "password", password, password);
        errors.into_result()?;

        let created = self
            .storage
            .create_user(NewUser {
                username: username.to_string(),
                email: email.trim().to_lowercase(),
                password_hash: hash_password(password)?,
                is_staff: true,
                email_confirmed: true,
            })
            .await?;
        info!("AccountService: superuser '{}' created", created.username);
        Ok(created)
    }
}
