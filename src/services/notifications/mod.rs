//! E-mail notifications sent on moderation events.

mod comment;
pub mod mailer;
mod tutorial;

use std::ops::{Add, AddAssign};

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::errors::Result;
use crate::storage::SeaOrmStorage;
use migration::entities::{tutorial as tutorial_entity, tutorial_comment, user};

pub use comment::{
    CommentConfirmDisproveNotifier, CommentReplyNotifier,
    TutorialAuthorNewConfirmedCommentNotifier,
};
pub use mailer::{ConsoleMailer, EmailMessage, Mailer, SmtpMailer, build_mailer};
pub use tutorial::TutorialConfirmDisproveNotifier;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NotificationResult {
    pub success: usize,
    pub failed: usize,
}

impl Add for NotificationResult {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            success: self.success + other.success,
            failed: self.failed + other.failed,
        }
    }
}

impl AddAssign for NotificationResult {
    fn add_assign(&mut self, other: Self) {
        self.success += other.success;
        self.failed += other.failed;
    }
}

/// Picks items worth notifying about, builds one message each and sends them.
#[async_trait]
pub trait Notifier: Send + Sync {
    type Item: Send + Sync;

    fn accepts(&self, item: &Self::Item) -> bool;

    /// `None` when the item has no usable recipient.
    fn compose(&self, item: &Self::Item) -> Option<EmailMessage>;

    fn select<'a>(&self, items: &'a [Self::Item]) -> Vec<&'a Self::Item> {
        items.iter().filter(|item| self.accepts(item)).collect()
    }

    async fn notify(&self, mailer: &dyn Mailer, items: &[Self::Item]) -> NotificationResult {
        let mut result = NotificationResult::default();
        for item in self.select(items) {
            let Some(message) = self.compose(item) else {
                continue;
            };
            if send_one(mailer, &message).await {
                result.success += 1;
            } else {
                result.failed += 1;
            }
        }
        result
    }
}

/// `false` on failure; the error is logged, never returned.
pub async fn send_one(mailer: &dyn Mailer, message: &EmailMessage) -> bool {
    match mailer.send(message).await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                "Failed to send e-mail '{}' to {} via {}: {}",
                message.subject,
                message.to,
                mailer.backend_name(),
                e
            );
            false
        }
    }
}

/// A tutorial together with its author.
#[derive(Debug, Clone)]
pub struct TutorialNotice {
    pub tutorial: tutorial_entity::Model,
    pub author: Option<user::Model>,
}

/// A comment with the rows its notifiers look at.
#[derive(Debug, Clone)]
pub struct CommentNotice {
    pub comment: tutorial_comment::Model,
    pub author: Option<user::Model>,
    pub tutorial: Option<tutorial_entity::Model>,
    pub tutorial_author: Option<user::Model>,
    pub parent: Option<tutorial_comment::Model>,
    pub parent_author: Option<user::Model>,
}

async fn find_user(storage: &SeaOrmStorage, id: Option<i32>) -> Result<Option<user::Model>> {
    match id {
        Some(id) => storage.find_user(id).await,
        None => Ok(None),
    }
}

pub async fn load_tutorial_notices(
    storage: &SeaOrmStorage,
    ids: &[i32],
) -> Result<Vec<TutorialNotice>> {
    let mut notices = Vec::new();
    for tutorial in storage.find_tutorials_by_ids(ids).await? {
        let author = find_user(storage, tutorial.author_id).await?;
        notices.push(TutorialNotice { tutorial, author });
    }
    Ok(notices)
}

pub async fn load_comment_notices(
    storage: &SeaOrmStorage,
    ids: &[i32],
) -> Result<Vec<CommentNotice>> {
    let mut notices = Vec::new();
    for comment in storage.find_comments_by_ids(ids).await? {
        let author = find_user(storage, comment.user_id).await?;
        let tutorial = storage.find_tutorial(comment.tutorial_id).await?;
        let tutorial_author =
            find_user(storage, tutorial.as_ref().and_then(|t| t.author_id)).await?;
        let parent = match comment.parent_comment_id {
            Some(parent_id) => storage.find_comment(parent_id).await?,
            None => None,
        };
        let parent_author = find_user(storage, parent.as_ref().and_then(|p| p.user_id)).await?;
        notices.push(CommentNotice {
            comment,
            author,
            tutorial,
            tutorial_author,
            parent,
            parent_author,
        });
    }
    Ok(notices)
}

/// Recipient address, skipping users without one.
fn email_of(user: Option<&user::Model>) -> Option<String> {
    user.map(|u| u.email.trim().to_string())
        .filter(|email| !email.is_empty())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;
    use migration::entities::user;

    pub(crate) fn user_with_email(id: i32, email: &str) -> user::Model {
        user::Model {
            id,
            username: format!("user{}", id),
            email: email.into(),
            password: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            avatar: None,
            scores: 0,
            coins: 0,
            diamonds: 0,
            email_confirmed: true,
            is_staff: false,
            is_active: true,
            tutorials_count_goal: 0,
            likes_count_goal: 0,
            views_count_goal: 0,
            comments_count_goal: 0,
            date_joined: Utc::now(),
            last_login: None,
        }
    }
}
