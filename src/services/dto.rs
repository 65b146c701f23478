//! Serializable views shared by the services and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::storage::ConfirmStatus;
use migration::entities::{category, exam, question, tutorial, tutorial_comment, user};

/// What an owner can do with their own tutorial or comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerAction {
    Delete,
    Deactivate,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorSummary {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
}

impl From<&user::Model> for AuthorSummary {
    fn from(u: &user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            avatar: u.avatar.clone(),
        }
    }
}

/// The signed-in user as shown in the panel.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub scores: i64,
    pub coins: i64,
    pub diamonds: i64,
    pub email_confirmed: bool,
    pub is_staff: bool,
    pub tutorials_count_goal: i64,
    pub likes_count_goal: i64,
    pub views_count_goal: i64,
    pub comments_count_goal: i64,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&user::Model> for UserProfile {
    fn from(u: &user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            avatar: u.avatar.clone(),
            scores: u.scores,
            coins: u.coins,
            diamonds: u.diamonds,
            email_confirmed: u.email_confirmed,
            is_staff: u.is_staff,
            tutorials_count_goal: u.tutorials_count_goal,
            likes_count_goal: u.likes_count_goal,
            views_count_goal: u.views_count_goal,
            comments_count_goal: u.comments_count_goal,
            date_joined: u.date_joined,
            last_login: u.last_login,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub id: i32,
    pub parent_id: Option<i32>,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
}

impl From<&category::Model> for CategoryView {
    fn from(c: &category::Model) -> Self {
        Self {
            id: c.id,
            parent_id: c.parent_id,
            name: c.name.clone(),
            slug: c.slug.clone(),
            is_active: c.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TutorialSummary {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub short_description: String,
    pub image: Option<String>,
    pub total_views_count: i32,
    pub user_views_count: i32,
    pub up_votes_count: i32,
    pub down_votes_count: i32,
    pub likes_count: i32,
    pub comments_count: u64,
    pub create_date: DateTime<Utc>,
    pub last_edit_date: DateTime<Utc>,
    pub confirm_status: ConfirmStatus,
    pub confirm_status_label: &'static str,
    pub is_edited: bool,
    pub is_active: bool,
    pub author_id: Option<i32>,
}

impl TutorialSummary {
    pub fn new(t: &tutorial::Model, comments_count: u64) -> Self {
        let status = ConfirmStatus::from_i32(t.confirm_status).unwrap_or(ConfirmStatus::Waiting);
        Self {
            id: t.id,
            title: t.title.clone(),
            slug: t.slug.clone(),
            short_description: t.short_description.clone(),
            image: t.image.clone(),
            total_views_count: t.total_views_count,
            user_views_count: t.user_views_count,
            up_votes_count: t.up_votes_count,
            down_votes_count: t.down_votes_count,
            likes_count: t.likes_count,
            comments_count,
            create_date: t.create_date,
            last_edit_date: t.last_edit_date,
            confirm_status: status,
            confirm_status_label: status.label(),
            is_edited: t.is_edited,
            is_active: t.is_active,
            author_id: t.author_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i32,
    pub title: String,
    pub body: String,
    pub likes_count: i32,
    pub up_votes_count: i32,
    pub down_votes_count: i32,
    pub create_date: DateTime<Utc>,
    pub last_edit_date: DateTime<Utc>,
    pub confirm_status: ConfirmStatus,
    pub confirm_status_label: &'static str,
    pub allow_reply: bool,
    pub notify_replies: bool,
    pub is_active: bool,
    pub user_id: Option<i32>,
    pub tutorial_id: i32,
    pub parent_comment_id: Option<i32>,
}

impl From<&tutorial_comment::Model> for CommentView {
    fn from(c: &tutorial_comment::Model) -> Self {
        let status = ConfirmStatus::from_i32(c.confirm_status).unwrap_or(ConfirmStatus::Waiting);
        Self {
            id: c.id,
            title: c.title.clone(),
            body: c.body.clone(),
            likes_count: c.likes_count,
            up_votes_count: c.up_votes_count,
            down_votes_count: c.down_votes_count,
            create_date: c.create_date,
            last_edit_date: c.last_edit_date,
            confirm_status: status,
            confirm_status_label: status.label(),
            allow_reply: c.allow_reply,
            notify_replies: c.notify_replies,
            is_active: c.is_active,
            user_id: c.user_id,
            tutorial_id: c.tutorial_id,
            parent_comment_id: c.parent_comment_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExamView {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub short_description: String,
    pub full_description: String,
    pub deadline_duration_seconds: i64,
    pub waiting_duration_seconds: i64,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub coin_cost: i64,
    pub diamond_cost: i64,
    pub correct_score: i32,
    pub blank_score: i32,
    pub incorrect_score: i32,
    pub correct_coin: i32,
    pub confirm_status: ConfirmStatus,
    pub views_count: i32,
    pub likes_count: i32,
    pub is_active: bool,
    pub create_date: DateTime<Utc>,
    pub designer_id: Option<i32>,
}

impl From<&exam::Model> for ExamView {
    fn from(e: &exam::Model) -> Self {
        Self {
            id: e.id,
            title: e.title.clone(),
            slug: e.slug.clone(),
            short_description: e.short_description.clone(),
            full_description: e.full_description.clone(),
            deadline_duration_seconds: e.deadline_duration_seconds,
            waiting_duration_seconds: e.waiting_duration_seconds,
            starts_at: e.starts_at,
            ends_at: e.ends_at,
            coin_cost: e.coin_cost,
            diamond_cost: e.diamond_cost,
            correct_score: e.correct_score,
            blank_score: e.blank_score,
            incorrect_score: e.incorrect_score,
            correct_coin: e.correct_coin,
            confirm_status: ConfirmStatus::from_i32(e.confirm_status)
                .unwrap_or(ConfirmStatus::Waiting),
            views_count: e.views_count,
            likes_count: e.likes_count,
            is_active: e.is_active,
            create_date: e.create_date,
            designer_id: e.designer_id,
        }
    }
}

/// A question with its answer key, for staff.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionAdminView {
    pub id: i32,
    pub exam_id: i32,
    pub text: String,
    pub choices: [String; 4],
    pub correct_choice: i32,
    pub correct_full_answer: String,
    pub is_active: bool,
}

impl From<&question::Model> for QuestionAdminView {
    fn from(q: &question::Model) -> Self {
        Self {
            id: q.id,
            exam_id: q.exam_id,
            text: q.text.clone(),
            choices: [
                q.choice_1.clone(),
                q.choice_2.clone(),
                q.choice_3.clone(),
                q.choice_4.clone(),
            ],
            correct_choice: q.correct_choice,
            correct_full_answer: q.correct_full_answer.clone(),
            is_active: q.is_active,
        }
    }
}

/// Tells an absent field (`None`) apart from an explicit `null` (`Some(None)`).
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trimmed, required text field with a character limit.
pub(crate) fn check_text(
    errors: &mut crate::errors::FieldErrors,
    field: &str,
    value: &str,
    max_chars: usize,
) {
    if value.trim().is_empty() {
        errors.add(field, "این فیلد الزامی است");
    } else if value.chars().count() > max_chars {
        errors.add(
            field,
            format!("حداکثر {} کاراکتر مجاز است", max_chars),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FieldErrors;

    #[test]
    fn owner_action_parses_lowercase() {
        let action: OwnerAction = serde_json::from_str("\"deactivate\"").unwrap();
        assert_eq!(action, OwnerAction::Deactivate);
        assert!(serde_json::from_str::<OwnerAction>("\"archive\"").is_err());
    }

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        avatar: Option<Option<String>>,
    }

    #[test]
    fn double_option_keeps_null_apart() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.avatar, None);
        let null: Patch = serde_json::from_str(r#"{"avatar": null}"#).unwrap();
        assert_eq!(null.avatar, Some(None));
        let set: Patch = serde_json::from_str(r#"{"avatar": "a.png"}"#).unwrap();
        assert_eq!(set.avatar, Some(Some("a.png".into())));
    }

    #[test]
    fn text_limits_count_characters() {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "title", &"آ".repeat(50), 50);
        assert!(errors.is_empty());
        check_text(&mut errors, "title", &"آ".repeat(51), 50);
        check_text(&mut errors, "body", "   ", 500);
        assert!(errors.get("title").is_some());
        assert_eq!(errors.get("body").unwrap()[0], "این فیلد الزامی است");
    }
}
