//! Tutorials: filtering, lookups, authoring and moderation status.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ExprTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Select, Set,
    sea_query::{Expr, IntoCondition, SelectStatement},
};
use tracing::info;

use super::{SeaOrmStorage, retry};
use crate::errors::{MajazamoozError, Result};
use crate::storage::models::{ConfirmStatus, Page};
use migration::entities::{category, tutorial, tutorial_category, tutorial_comment};

#[derive(Debug, Clone, Default)]
pub struct TutorialFilter {
    /// Substring over title, descriptions, body, slug and category name.
    pub search: Option<String>,
    pub category_slug: Option<String>,
    pub author_id: Option<i32>,
    /// Active and confirmed only.
    pub visible_only: bool,
    pub confirm_status: Option<ConfirmStatus>,
    pub is_active: Option<bool>,
}

impl TutorialFilter {
    pub fn visible() -> Self {
        Self {
            visible_only: true,
            ..Default::default()
        }
    }

    fn cache_key(&self) -> String {
        format!(
            "tutorials:s={:?}:c={:?}:a={:?}:v={}:cs={:?}:ia={:?}",
            self.search,
            self.category_slug,
            self.author_id,
            self.visible_only,
            self.confirm_status.map(ConfirmStatus::as_i32),
            self.is_active
        )
    }

    fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        if self.visible_only {
            condition = condition.add(visible_condition());
        }
        if let Some(status) = self.confirm_status {
            condition = condition.add(tutorial::Column::ConfirmStatus.eq(status.as_i32()));
        }
        if let Some(is_active) = self.is_active {
            condition = condition.add(tutorial::Column::IsActive.eq(is_active));
        }
        if let Some(author_id) = self.author_id {
            condition = condition.add(tutorial::Column::AuthorId.eq(author_id));
        }
        if let Some(ref slug) = self.category_slug {
            let categories = category::Entity::find()
                .select_only()
                .column(category::Column::Id)
                .filter(category::Column::Slug.eq(slug.as_str()))
                .into_query();
            condition = condition.add(tutorial::Column::Id.in_subquery(linked_tutorials(
                tutorial_category::Column::CategoryId.in_subquery(categories),
            )));
        }
        if let Some(ref search) = self.search {
            let search = search.trim();
            if !search.is_empty() {
                let categories = category::Entity::find()
                    .select_only()
                    .column(category::Column::Id)
                    .filter(category::Column::Name.contains(search))
                    .into_query();
                condition = condition.add(
                    Condition::any()
                        .add(tutorial::Column::Title.contains(search))
                        .add(tutorial::Column::ShortDescription.contains(search))
                        .add(tutorial::Column::Body.contains(search))
                        .add(tutorial::Column::Slug.contains(search))
                        .add(tutorial::Column::Id.in_subquery(linked_tutorials(
                            tutorial_category::Column::CategoryId.in_subquery(categories),
                        ))),
                );
            }
        }

        condition
    }
}

/// `is_active AND confirm_status = confirmed`
pub(crate) fn visible_condition() -> Condition {
    Condition::all()
        .add(tutorial::Column::IsActive.eq(true))
        .add(tutorial::Column::ConfirmStatus.eq(ConfirmStatus::Confirmed.as_i32()))
}

fn linked_tutorials<F: IntoCondition>(category_filter: F) -> SelectStatement {
    tutorial_category::Entity::find()
        .select_only()
        .column(tutorial_category::Column::TutorialId)
        .filter(category_filter)
        .into_query()
}

fn visible() -> Select<tutorial::Entity> {
    tutorial::Entity::find().filter(visible_condition())
}

#[derive(Debug, Clone)]
pub struct NewTutorial {
    pub title: String,
    pub slug: String,
    pub short_description: String,
    pub body: String,
    pub image: Option<String>,
    pub author_id: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct TutorialUpdate {
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub body: Option<String>,
    pub image: Option<Option<String>>,
}

#[derive(Debug, FromQueryResult)]
struct CommentCount {
    tutorial_id: i32,
    count: i64,
}

impl SeaOrmStorage {
    pub async fn list_tutorials(
        &self,
        filter: TutorialFilter,
        page: u64,
        page_size: u64,
    ) -> Result<Page<tutorial::Model>> {
        let page_size = std::cmp::Ord::max(page_size, 1);
        let condition = filter.condition();
        let db = &self.db;

        let cond = condition.clone();
        let total = self
            .cached_count(filter.cache_key(), "list_tutorials(count)", || async {
                tutorial::Entity::find().filter(cond.clone()).count(db).await
            })
            .await?;

        let items = tutorial::Entity::find()
            .filter(condition)
            .order_by_desc(tutorial::Column::CreateDate)
            .order_by_desc(tutorial::Column::Id)
            .paginate(db, page_size)
            .fetch_page(page.saturating_sub(1))
            .await?;

        Ok(Page::new(items, page, page_size, total))
    }

    pub async fn find_tutorial(&self, id: i32) -> Result<Option<tutorial::Model>> {
        let db = &self.db;
        Ok(retry::with_retry("find_tutorial", self.retry_config, || async {
            tutorial::Entity::find_by_id(id).one(db).await
        })
        .await?)
    }

    pub async fn find_visible_tutorial(&self, id: i32) -> Result<Option<tutorial::Model>> {
        Ok(visible()
            .filter(tutorial::Column::Id.eq(id))
            .one(&self.db)
            .await?)
    }

    pub async fn find_visible_tutorial_by_slug(&self, slug: &str) -> Result<Option<tutorial::Model>> {
        let db = &self.db;
        Ok(
            retry::with_retry("find_tutorial_by_slug", self.retry_config, || async {
                visible()
                    .filter(tutorial::Column::Slug.eq(slug))
                    .one(db)
                    .await
            })
            .await?,
        )
    }

    pub async fn find_tutorials_by_ids(&self, ids: &[i32]) -> Result<Vec<tutorial::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(tutorial::Entity::find()
            .filter(tutorial::Column::Id.is_in(ids.to_vec()))
            .order_by_asc(tutorial::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn latest_tutorials(&self, limit: u64) -> Result<Vec<tutorial::Model>> {
        Ok(visible()
            .order_by_desc(tutorial::Column::CreateDate)
            .order_by_desc(tutorial::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?)
    }

    pub async fn most_popular_tutorials(&self, limit: u64) -> Result<Vec<tutorial::Model>> {
        Ok(visible()
            .order_by_desc(tutorial::Column::LikesCount)
            .order_by_desc(tutorial::Column::CreateDate)
            .limit(limit)
            .all(&self.db)
            .await?)
    }

    pub async fn latest_tutorials_of_author(
        &self,
        author_id: i32,
        limit: u64,
    ) -> Result<Vec<tutorial::Model>> {
        Ok(tutorial::Entity::find()
            .filter(tutorial::Column::AuthorId.eq(author_id))
            .order_by_desc(tutorial::Column::CreateDate)
            .order_by_desc(tutorial::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?)
    }

    /// Visible tutorials linked to any of `category_ids`, newest first.
    pub async fn visible_tutorials_in_categories(
        &self,
        category_ids: &[i32],
        exclude: &[i32],
        limit: u64,
    ) -> Result<Vec<tutorial::Model>> {
        if category_ids.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let linked = linked_tutorials(
            tutorial_category::Column::CategoryId.is_in(category_ids.to_vec()),
        );
        let mut query = visible().filter(tutorial::Column::Id.in_subquery(linked));
        if !exclude.is_empty() {
            query = query.filter(tutorial::Column::Id.is_not_in(exclude.to_vec()));
        }
        Ok(query
            .order_by_desc(tutorial::Column::CreateDate)
            .order_by_desc(tutorial::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?)
    }

    /// Appends `-2`, `-3`, ... until the slug is free.
    pub async fn unique_tutorial_slug(&self, base: &str, exclude_id: Option<i32>) -> Result<String> {
        let base = if base.is_empty() { "tutorial" } else { base };
        let mut candidate = base.to_string();
        let mut suffix = 2;
        loop {
            let mut query = tutorial::Entity::find().filter(tutorial::Column::Slug.eq(&candidate));
            if let Some(id) = exclude_id {
                query = query.filter(tutorial::Column::Id.ne(id));
            }
            if query.count(&self.db).await? == 0 {
                return Ok(candidate);
            }
            candidate = format!("{}-{}", base, suffix);
            suffix += 1;
        }
    }

    /// New tutorials wait for moderation.
    pub async fn create_tutorial(&self, new: NewTutorial) -> Result<tutorial::Model> {
        let slug = self.unique_tutorial_slug(&new.slug, None).await?;
        let now = Utc::now();
        let model = tutorial::ActiveModel {
            title: Set(new.title),
            slug: Set(slug),
            short_description: Set(new.short_description),
            body: Set(new.body),
            image: Set(new.image),
            total_views_count: Set(0),
            user_views_count: Set(0),
            up_votes_count: Set(0),
            down_votes_count: Set(0),
            likes_count: Set(0),
            create_date: Set(now),
            last_edit_date: Set(now),
            confirm_status: Set(ConfirmStatus::Waiting.as_i32()),
            is_edited: Set(false),
            is_active: Set(true),
            author_id: Set(new.author_id),
            ..Default::default()
        };

        let created = model.insert(&self.db).await?;
        self.invalidate_count_cache();
        info!("Tutorial created: {} (id={})", created.slug, created.id);
        Ok(created)
    }

    /// Owner edit: status goes back to waiting and the row is marked edited.
    pub async fn update_tutorial(&self, id: i32, update: TutorialUpdate) -> Result<tutorial::Model> {
        let existing = self
            .find_tutorial(id)
            .await?
            .ok_or_else(|| MajazamoozError::not_found(format!("Tutorial {} not found", id)))?;

        let mut model: tutorial::ActiveModel = existing.into();
        if let Some(v) = update.title {
            model.title = Set(v);
        }
        if let Some(v) = update.short_description {
            model.short_description = Set(v);
        }
        if let Some(v) = update.body {
            model.body = Set(v);
        }
        if let Some(v) = update.image {
            model.image = Set(v);
        }
        model.confirm_status = Set(ConfirmStatus::Waiting.as_i32());
        model.is_edited = Set(true);
        model.last_edit_date = Set(Utc::now());

        let updated = model.update(&self.db).await?;
        self.invalidate_count_cache();
        Ok(updated)
    }

    pub async fn delete_tutorial(&self, id: i32) -> Result<bool> {
        let result = tutorial::Entity::delete_by_id(id).exec(&self.db).await?;
        self.invalidate_count_cache();
        Ok(result.rows_affected > 0)
    }

    pub async fn deactivate_tutorial(&self, id: i32) -> Result<bool> {
        let result = tutorial::Entity::update_many()
            .col_expr(tutorial::Column::IsActive, Expr::value(false))
            .filter(tutorial::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        self.invalidate_count_cache();
        Ok(result.rows_affected > 0)
    }

    pub async fn increment_total_views(&self, id: i32) -> Result<()> {
        tutorial::Entity::update_many()
            .col_expr(
                tutorial::Column::TotalViewsCount,
                Expr::col(tutorial::Column::TotalViewsCount).add(1),
            )
            .filter(tutorial::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Active, confirmed comments per tutorial. Missing ids have no comments.
    pub async fn comments_count_map(&self, tutorial_ids: &[i32]) -> Result<HashMap<i32, u64>> {
        if tutorial_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = tutorial_comment::Entity::find()
            .select_only()
            .column(tutorial_comment::Column::TutorialId)
            .column_as(tutorial_comment::Column::Id.count(), "count")
            .filter(tutorial_comment::Column::TutorialId.is_in(tutorial_ids.to_vec()))
            .filter(tutorial_comment::Column::IsActive.eq(true))
            .filter(
                tutorial_comment::Column::ConfirmStatus.eq(ConfirmStatus::Confirmed.as_i32()),
            )
            .group_by(tutorial_comment::Column::TutorialId)
            .into_model::<CommentCount>()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.tutorial_id, std::cmp::Ord::max(r.count, 0) as u64))
            .collect())
    }

    /// Moves active tutorials not already in `status`. Returns the ids that changed.
    pub async fn set_tutorials_status(&self, ids: &[i32], status: ConfirmStatus) -> Result<Vec<i32>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let candidates: Vec<i32> = tutorial::Entity::find()
            .select_only()
            .column(tutorial::Column::Id)
            .filter(tutorial::Column::Id.is_in(ids.to_vec()))
            .filter(tutorial::Column::IsActive.eq(true))
            .filter(tutorial::Column::ConfirmStatus.ne(status.as_i32()))
            .into_tuple()
            .all(&self.db)
            .await?;
        if candidates.is_empty() {
            return Ok(candidates);
        }

        tutorial::Entity::update_many()
            .col_expr(tutorial::Column::ConfirmStatus, Expr::value(status.as_i32()))
            .filter(tutorial::Column::Id.is_in(candidates.clone()))
            .exec(&self.db)
            .await?;

        self.invalidate_count_cache();
        info!(
            "Tutorials moved to status {}: {:?}",
            status.as_i32(),
            candidates
        );
        Ok(candidates)
    }
}
