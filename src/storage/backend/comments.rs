//! Tutorial comments and replies.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait, Set, sea_query::Expr,
};
use tracing::info;

use super::SeaOrmStorage;
use crate::errors::{MajazamoozError, Result};
use crate::storage::models::{ConfirmStatus, Page};
use migration::entities::tutorial_comment;

#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    pub search: Option<String>,
    pub tutorial_id: Option<i32>,
    pub user_id: Option<i32>,
    pub confirm_status: Option<ConfirmStatus>,
    pub is_active: Option<bool>,
    /// Replies to comments written by this user, excluding their own replies.
    pub replies_to_user: Option<i32>,
}

impl CommentFilter {
    fn cache_key(&self) -> String {
        format!(
            "comments:s={:?}:t={:?}:u={:?}:cs={:?}:ia={:?}:r={:?}",
            self.search,
            self.tutorial_id,
            self.user_id,
            self.confirm_status.map(ConfirmStatus::as_i32),
            self.is_active,
            self.replies_to_user
        )
    }

    fn condition(&self) -> Condition {
        let mut condition = Condition::all();
        if let Some(ref search) = self.search {
            let search = search.trim();
            if !search.is_empty() {
                condition = condition.add(
                    Condition::any()
                        .add(tutorial_comment::Column::Title.contains(search))
                        .add(tutorial_comment::Column::Body.contains(search)),
                );
            }
        }
        if let Some(tutorial_id) = self.tutorial_id {
            condition = condition.add(tutorial_comment::Column::TutorialId.eq(tutorial_id));
        }
        if let Some(user_id) = self.user_id {
            condition = condition.add(tutorial_comment::Column::UserId.eq(user_id));
        }
        if let Some(status) = self.confirm_status {
            condition = condition.add(tutorial_comment::Column::ConfirmStatus.eq(status.as_i32()));
        }
        if let Some(is_active) = self.is_active {
            condition = condition.add(tutorial_comment::Column::IsActive.eq(is_active));
        }
        if let Some(owner) = self.replies_to_user {
            let parents = tutorial_comment::Entity::find()
                .select_only()
                .column(tutorial_comment::Column::Id)
                .filter(tutorial_comment::Column::UserId.eq(owner))
                .into_query();
            condition = condition
                .add(tutorial_comment::Column::ParentCommentId.in_subquery(parents))
                .add(
                    Condition::any()
                        .add(tutorial_comment::Column::UserId.is_null())
                        .add(tutorial_comment::Column::UserId.ne(owner)),
                );
        }
        condition
    }
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub title: String,
    pub body: String,
    pub tutorial_id: i32,
    pub parent_comment_id: Option<i32>,
    pub user_id: Option<i32>,
    pub allow_reply: bool,
    pub notify_replies: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CommentUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub allow_reply: Option<bool>,
    pub notify_replies: Option<bool>,
}

impl SeaOrmStorage {
    pub async fn list_comments(
        &self,
        filter: CommentFilter,
        page: u64,
        page_size: u64,
    ) -> Result<Page<tutorial_comment::Model>> {
        let page_size = page_size.max(1);
        let condition = filter.condition();
        let db = &self.db;

        let cond = condition.clone();
        let total = self
            .cached_count(filter.cache_key(), "list_comments(count)", || async {
                tutorial_comment::Entity::find()
                    .filter(cond.clone())
                    .count(db)
                    .await
            })
            .await?;

        let items = tutorial_comment::Entity::find()
            .filter(condition)
            .order_by_desc(tutorial_comment::Column::CreateDate)
            .order_by_desc(tutorial_comment::Column::Id)
            .paginate(db, page_size)
            .fetch_page(page.saturating_sub(1))
            .await?;

        Ok(Page::new(items, page, page_size, total))
    }

    pub async fn find_comment(&self, id: i32) -> Result<Option<tutorial_comment::Model>> {
        Ok(tutorial_comment::Entity::find_by_id(id).one(&self.db).await?)
    }

    pub async fn find_visible_comment(&self, id: i32) -> Result<Option<tutorial_comment::Model>> {
        Ok(tutorial_comment::Entity::find_by_id(id)
            .filter(tutorial_comment::Column::IsActive.eq(true))
            .filter(tutorial_comment::Column::ConfirmStatus.eq(ConfirmStatus::Confirmed.as_i32()))
            .one(&self.db)
            .await?)
    }

    pub async fn find_comments_by_ids(&self, ids: &[i32]) -> Result<Vec<tutorial_comment::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(tutorial_comment::Entity::find()
            .filter(tutorial_comment::Column::Id.is_in(ids.to_vec()))
            .order_by_asc(tutorial_comment::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Active, confirmed comments in posting order.
    pub async fn visible_comments_of_tutorial(
        &self,
        tutorial_id: i32,
    ) -> Result<Vec<tutorial_comment::Model>> {
        Ok(tutorial_comment::Entity::find()
            .filter(tutorial_comment::Column::TutorialId.eq(tutorial_id))
            .filter(tutorial_comment::Column::IsActive.eq(true))
            .filter(tutorial_comment::Column::ConfirmStatus.eq(ConfirmStatus::Confirmed.as_i32()))
            .order_by_asc(tutorial_comment::Column::CreateDate)
            .order_by_asc(tutorial_comment::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn create_comment(&self, new: NewComment) -> Result<tutorial_comment::Model> {
        let now = Utc::now();
        let model = tutorial_comment::ActiveModel {
            title: Set(new.title),
            body: Set(new.body),
            likes_count: Set(0),
            up_votes_count: Set(0),
            down_votes_count: Set(0),
            create_date: Set(now),
            last_edit_date: Set(now),
            confirm_status: Set(ConfirmStatus::Waiting.as_i32()),
            allow_reply: Set(new.allow_reply),
            notify_replies: Set(new.notify_replies),
            is_active: Set(true),
            user_id: Set(new.user_id),
            tutorial_id: Set(new.tutorial_id),
            parent_comment_id: Set(new.parent_comment_id),
            ..Default::default()
        };

        let created = model.insert(&self.db).await?;
        self.invalidate_count_cache();
        info!(
            "Comment created: id={} tutorial={} user={:?}",
            created.id, created.tutorial_id, created.user_id
        );
        Ok(created)
    }

    /// Owner edit: the comment goes back to moderation.
    pub async fn update_comment(
        &self,
        id: i32,
        update: CommentUpdate,
    ) -> Result<tutorial_comment::Model> {
        let existing = self
            .find_comment(id)
            .await?
            .ok_or_else(|| MajazamoozError::not_found(format!("Comment {} not found", id)))?;

        let mut model: tutorial_comment::ActiveModel = existing.into();
        if let Some(v) = update.title {
            model.title = Set(v);
        }
        if let Some(v) = update.body {
            model.body = Set(v);
        }
        if let Some(v) = update.allow_reply {
            model.allow_reply = Set(v);
        }
        if let Some(v) = update.notify_replies {
            model.notify_replies = Set(v);
        }
        model.confirm_status = Set(ConfirmStatus::Waiting.as_i32());
        model.last_edit_date = Set(Utc::now());

        let updated = model.update(&self.db).await?;
        self.invalidate_count_cache();
        Ok(updated)
    }

    pub async fn delete_comment(&self, id: i32) -> Result<bool> {
        let result = tutorial_comment::Entity::delete_by_id(id)
            .exec(&self.db)
            .await?;
        self.invalidate_count_cache();
        Ok(result.rows_affected > 0)
    }

    pub async fn deactivate_comment(&self, id: i32) -> Result<bool> {
        let result = tutorial_comment::Entity::update_many()
            .col_expr(tutorial_comment::Column::IsActive, Expr::value(false))
            .filter(tutorial_comment::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        self.invalidate_count_cache();
        Ok(result.rows_affected > 0)
    }

    /// Moves active comments not already in `status`. Returns the ids that changed.
    pub async fn set_comments_status(&self, ids: &[i32], status: ConfirmStatus) -> Result<Vec<i32>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let candidates: Vec<i32> = tutorial_comment::Entity::find()
            .select_only()
            .column(tutorial_comment::Column::Id)
            .filter(tutorial_comment::Column::Id.is_in(ids.to_vec()))
            .filter(tutorial_comment::Column::IsActive.eq(true))
            .filter(tutorial_comment::Column::ConfirmStatus.ne(status.as_i32()))
            .into_tuple()
            .all(&self.db)
            .await?;
        if candidates.is_empty() {
            return Ok(candidates);
        }

        tutorial_comment::Entity::update_many()
            .col_expr(
                tutorial_comment::Column::ConfirmStatus,
                Expr::value(status.as_i32()),
            )
            .filter(tutorial_comment::Column::Id.is_in(candidates.clone()))
            .exec(&self.db)
            .await?;

        self.invalidate_count_cache();
        info!(
            "Comments moved to status {}: {:?}",
            status.as_i32(),
            candidates
        );
        Ok(candidates)
    }
}
