//! Tutorial categories and the tutorial/category link table.

use std::collections::HashSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use tracing::info;

use super::SeaOrmStorage;
use crate::errors::{MajazamoozError, Result};
use migration::entities::{category, tutorial_category};

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i32>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub parent_id: Option<Option<i32>>,
    pub is_active: Option<bool>,
}

impl SeaOrmStorage {
    pub async fn create_category(&self, new: NewCategory) -> Result<category::Model> {
        if let Some(parent_id) = new.parent_id {
            self.find_category(parent_id).await?.ok_or_else(|| {
                MajazamoozError::invalid_field("parent_id", "دسته بندی والد یافت نشد")
            })?;
        }

        let model = category::ActiveModel {
            name: Set(new.name),
            slug: Set(new.slug.clone()),
            parent_id: Set(new.parent_id),
            is_active: Set(new.is_active),
            ..Default::default()
        };

        let created = model.insert(&self.db).await.map_err(|e| {
            let msg = e.to_string().to_lowercase();
            if msg.contains("unique") || msg.contains("duplicate") {
                MajazamoozError::conflict(format!("Category slug '{}' already exists", new.slug))
            } else {
                e.into()
            }
        })?;

        info!("Category created: {} (id={})", created.slug, created.id);
        Ok(created)
    }

    pub async fn update_category(&self, id: i32, update: CategoryUpdate) -> Result<category::Model> {
        let existing = self
            .find_category(id)
            .await?
            .ok_or_else(|| MajazamoozError::not_found(format!("Category {} not found", id)))?;

        if let Some(Some(parent_id)) = update.parent_id {
            if self.category_ancestors(parent_id).await?.contains(&id) || parent_id == id {
                return Err(MajazamoozError::invalid_field(
                    "parent_id",
                    "دسته بندی نمی تواند والد خودش باشد",
                ));
            }
        }

        let mut model: category::ActiveModel = existing.into();
        if let Some(v) = update.name {
            model.name = Set(v);
        }
        if let Some(v) = update.slug {
            model.slug = Set(v);
        }
        if let Some(v) = update.parent_id {
            model.parent_id = Set(v);
        }
        if let Some(v) = update.is_active {
            model.is_active = Set(v);
        }

        Ok(model.update(&self.db).await?)
    }

    pub async fn find_category(&self, id: i32) -> Result<Option<category::Model>> {
        Ok(category::Entity::find_by_id(id).one(&self.db).await?)
    }

    pub async fn find_active_category_by_slug(&self, slug: &str) -> Result<Option<category::Model>> {
        Ok(category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .filter(category::Column::IsActive.eq(true))
            .one(&self.db)
            .await?)
    }

    pub async fn list_categories(&self) -> Result<Vec<category::Model>> {
        Ok(category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Active categories without a parent.
    pub async fn root_categories(&self) -> Result<Vec<category::Model>> {
        Ok(category::Entity::find()
            .filter(category::Column::ParentId.is_null())
            .filter(category::Column::IsActive.eq(true))
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await?)
    }

    pub async fn categories_of_tutorial(&self, tutorial_id: i32) -> Result<Vec<category::Model>> {
        let ids: Vec<i32> = tutorial_category::Entity::find()
            .select_only()
            .column(tutorial_category::Column::CategoryId)
            .filter(tutorial_category::Column::TutorialId.eq(tutorial_id))
            .into_tuple()
            .all(&self.db)
            .await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(category::Entity::find()
            .filter(category::Column::Id.is_in(ids))
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Parent of each given category; `None` entries for roots are dropped.
    pub async fn parent_category_ids(&self, ids: &[i32]) -> Result<Vec<i32>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let parents: Vec<Option<i32>> = category::Entity::find()
            .select_only()
            .column(category::Column::ParentId)
            .filter(category::Column::Id.is_in(ids.to_vec()))
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut seen = HashSet::new();
        Ok(parents
            .into_iter()
            .flatten()
            .filter(|id| seen.insert(*id))
            .collect())
    }

    async fn category_ancestors(&self, id: i32) -> Result<Vec<i32>> {
        let mut ancestors = Vec::new();
        let mut current = vec![id];
        while !current.is_empty() {
            current = self.parent_category_ids(&current).await?;
            current.retain(|c| !ancestors.contains(c));
            ancestors.extend(current.iter().copied());
        }
        Ok(ancestors)
    }

    /// Replace the category links of a tutorial.
    pub async fn set_tutorial_categories(&self, tutorial_id: i32, category_ids: &[i32]) -> Result<()> {
        let mut unique = category_ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        if !unique.is_empty() {
            let found = category::Entity::find()
                .filter(category::Column::Id.is_in(unique.clone()))
                .all(&self.db)
                .await?;
            if found.len() != unique.len() {
                return Err(MajazamoozError::invalid_field(
                    "category_ids",
                    "دسته بندی انتخاب شده معتبر نیست",
                ));
            }
        }

        let txn = self.db.begin().await?;
        tutorial_category::Entity::delete_many()
            .filter(tutorial_category::Column::TutorialId.eq(tutorial_id))
            .exec(&txn)
            .await?;
        if !unique.is_empty() {
            let rows = unique.into_iter().map(|category_id| tutorial_category::ActiveModel {
                tutorial_id: Set(tutorial_id),
                category_id: Set(category_id),
            });
            tutorial_category::Entity::insert_many(rows)
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;

        self.invalidate_count_cache();
        Ok(())
    }
}
