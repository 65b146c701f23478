//! Posting, editing and listing tutorial comments.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::dto::{CommentView, OwnerAction, check_text};
use crate::config::{RuntimeConfig, keys};
use crate::errors::{FieldErrors, MajazamoozError, Result};
use crate::storage::backend::{CommentFilter, CommentUpdate, NewComment};
use crate::storage::{Page, SeaOrmStorage};
use migration::entities::tutorial_comment;

pub const COMMENT_TITLE_MAX_CHARS: usize = 50;
pub const COMMENT_BODY_MAX_CHARS: usize = 500;

// ============ Request DTOs ============

/// New comment as posted from the tutorial page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub tutorial_id: Option<i32>,
    pub parent_comment_id: Option<i32>,
    pub allow_reply: Option<bool>,
    pub notify_replies: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentEditForm {
    pub title: String,
    pub body: String,
    #[serde(default = "default_true")]
    pub allow_reply: bool,
    #[serde(default = "default_true")]
    pub notify_replies: bool,
}

fn default_true() -> bool {
    true
}

// ============ CommentService Implementation ============

pub struct CommentService {
    storage: Arc<SeaOrmStorage>,
    runtime: Arc<RuntimeConfig>,
}

impl CommentService {
    pub fn new(storage: Arc<SeaOrmStorage>, runtime: Arc<RuntimeConfig>) -> Self {
        Self { storage, runtime }
    }

    fn panel_page_size(&self) -> u64 {
        self.runtime.get_positive_or(keys::USER_PANEL_PAGINATE_BY, 15)
    }

    /// Validate and store a new comment. It waits for moderation.
    ///
    /// Every problem is reported per field in one `InvalidForm` error.
    pub async fn create(&self, user_id: i32, form: CommentForm) -> Result<tutorial_comment::Model> {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "title", &form.title, COMMENT_TITLE_MAX_CHARS);
        check_text(&mut errors, "body", &form.body, COMMENT_BODY_MAX_CHARS);

        let tutorial = match form.tutorial_id {
            Some(id) => self.storage.find_visible_tutorial(id).await?,
            None => None,
        };
        match (&tutorial, form.tutorial_id) {
            (None, None) => errors.add("tutorial_id", "این فیلد الزامی است"),
            (None, Some(_)) => errors.add("tutorial_id", "آموزش انتخاب شده معتبر نیست"),
            _ => {}
        }

        if let Some(parent_id) = form.parent_comment_id {
            let parent = self.storage.find_visible_comment(parent_id).await?;
            let valid = parent.is_some_and(|p| {
                p.allow_reply && Some(p.tutorial_id) == tutorial.as_ref().map(|t| t.id)
            });
            if !valid {
                errors.add(
                    "parent_comment_id",
                    "امکان پاسخ به این دیدگاه وجود ندارد",
                );
            }
        }

        errors.into_result()?;
        let tutorial_id = tutorial
            .map(|t| t.id)
            .ok_or_else(|| MajazamoozError::invalid_field("tutorial_id", "این فیلد الزامی است"))?;

        let created = self
            .storage
            .create_comment(NewComment {
                title: form.title.trim().to_string(),
                body: form.body.trim().to_string(),
                tutorial_id,
                parent_comment_id: form.parent_comment_id,
                user_id: Some(user_id),
                allow_reply: form.allow_reply.unwrap_or(true),
                notify_replies: form.notify_replies.unwrap_or(true),
            })
            .await?;
        Ok(created)
    }

    pub async fn owned_comment(&self, owner_id: i32, id: i32) -> Result<tutorial_comment::Model> {
        self.storage
            .find_comment(id)
            .await?
            .filter(|c| c.user_id == Some(owner_id))
            .ok_or_else(|| MajazamoozError::not_found("دیدگاه مورد نظر یافت نشد"))
    }

    /// Owner edit; the comment goes back to moderation.
    pub async fn update(
        &self,
        owner_id: i32,
        id: i32,
        form: CommentEditForm,
    ) -> Result<tutorial_comment::Model> {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "title", &form.title, COMMENT_TITLE_MAX_CHARS);
        check_text(&mut errors, "body", &form.body, COMMENT_BODY_MAX_CHARS);
        errors.into_result()?;

        self.owned_comment(owner_id, id).await?;
        let updated = self
            .storage
            .update_comment(
                id,
                CommentUpdate {
                    title: Some(form.title.trim().to_string()),
                    body: Some(form.body.trim().to_string()),
                    allow_reply: Some(form.allow_reply),
                    notify_replies: Some(form.notify_replies),
                },
            )
            .await?;
        info!("CommentService: user {} edited comment {}", owner_id, id);
        Ok(updated)
    }

    pub async fn delete_or_deactivate(
        &self,
        owner_id: i32,
        id: i32,
        action: OwnerAction,
    ) -> Result<()> {
        self.owned_comment(owner_id, id).await?;
        match action {
            OwnerAction::Delete => self.storage.delete_comment(id).await?,
            OwnerAction::Deactivate => self.storage.deactivate_comment(id).await?,
        };
        info!(
            "CommentService: user {} applied {:?} to comment {}",
            owner_id, action, id
        );
        Ok(())
    }

    pub async fn list_own(&self, owner_id: i32, page: u64) -> Result<Page<CommentView>> {
        let filter = CommentFilter {
            user_id: Some(owner_id),
            ..Default::default()
        };
        let page = self
            .storage
            .list_comments(filter, page.max(1), self.panel_page_size())
            .await?;
        Ok(page.map(|c| CommentView::from(&c)))
    }

    /// Replies other users wrote to the user's comments.
    pub async fn replies_to(&self, owner_id: i32, page: u64) -> Result<Page<CommentView>> {
        let filter = CommentFilter {
            replies_to_user: Some(owner_id),
            ..Default::default()
        };
        let page = self
            .storage
            .list_comments(filter, page.max(1), self.panel_page_size())
            .await?;
        Ok(page.map(|c| CommentView::from(&c)))
    }
}
