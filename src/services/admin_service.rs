//! Staff listings and category management.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::dto::{CategoryView, CommentView, ExamView, TutorialSummary, UserProfile};
use crate::config::{RuntimeConfig, keys};
use crate::errors::{FieldErrors, MajazamoozError, Result};
use crate::storage::backend::{
    CategoryUpdate, CommentFilter, ExamFilter, NewCategory, TutorialFilter, UserFilter,
};
use crate::storage::{ConfirmStatus, Page, SeaOrmStorage};
use crate::utils::slugify;

// ============ Request DTOs ============

/// Query string shared by the staff listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminListQuery {
    pub search: Option<String>,
    /// `0`, `1` or `-1`.
    pub confirm_status: Option<i32>,
    pub is_active: Option<bool>,
    pub page: Option<u64>,
}

impl AdminListQuery {
    fn status(&self) -> Result<Option<ConfirmStatus>> {
        self.confirm_status
            .map(|s| {
                ConfirmStatus::from_i32(s).ok_or_else(|| {
                    MajazamoozError::invalid_field("confirm_status", "وضعیت تایید معتبر نیست")
                })
            })
            .transpose()
    }

    fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub search: Option<String>,
    pub is_staff: Option<bool>,
    pub page: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    pub slug: Option<String>,
    pub parent_id: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "super::dto::double_option")]
    pub parent_id: Option<Option<i32>>,
    pub is_active: Option<bool>,
}

// ============ AdminService Implementation ============

pub struct AdminService {
    storage: Arc<SeaOrmStorage>,
    runtime: Arc<RuntimeConfig>,
}

impl AdminService {
    pub fn new(storage: Arc<SeaOrmStorage>, runtime: Arc<RuntimeConfig>) -> Self {
        Self { storage, runtime }
    }

    fn page_size(&self) -> u64 {
        self.runtime.get_positive_or(keys::USER_PANEL_PAGINATE_BY, 15)
    }

    pub async fn list_tutorials(&self, query: AdminListQuery) -> Result<Page<TutorialSummary>> {
        let filter = TutorialFilter {
            search: query.search.clone(),
            confirm_status: query.status()?,
            is_active: query.is_active,
            ..Default::default()
        };
        let page = self
            .storage
            .list_tutorials(filter, query.page(), self.page_size())
            .await?;
        let ids: Vec<i32> = page.items.iter().map(|t| t.id).collect();
        let counts = self.storage.comments_count_map(&ids).await?;
        Ok(page.map(|t| TutorialSummary::new(&t, counts.get(&t.id).copied().unwrap_or(0))))
    }

    pub async fn list_comments(&self, query: AdminListQuery) -> Result<Page<CommentView>> {
        let filter = CommentFilter {
            search: query.search.clone(),
            confirm_status: query.status()?,
            is_active: query.is_active,
            ..Default::default()
        };
        let page = self
            .storage
            .list_comments(filter, query.page(), self.page_size())
            .await?;
        Ok(page.map(|c| CommentView::from(&c)))
    }

    pub async fn list_exams(&self, query: AdminListQuery) -> Result<Page<ExamView>> {
        let filter = ExamFilter {
            search: query.search.clone(),
            confirm_status: query.status()?,
            is_active: query.is_active,
            ..Default::default()
        };
        let page = self
            .storage
            .list_exams(filter, query.page(), self.page_size())
            .await?;
        Ok(page.map(|e| ExamView::from(&e)))
    }

    pub async fn list_users(&self, query: UserListQuery) -> Result<Page<UserProfile>> {
        let filter = UserFilter {
            search: query.search,
            is_staff: query.is_staff,
        };
        let page = self
            .storage
            .list_users(filter, query.page.unwrap_or(1).max(1), self.page_size())
            .await?;
        Ok(page.map(|u| UserProfile::from(&u)))
    }

    // ============ Categories ============

    pub async fn list_categories(&self) -> Result<Vec<CategoryView>> {
        let categories = self.storage.list_categories().await?;
        Ok(categories.iter().map(CategoryView::from).collect())
    }

    pub async fn create_category(&self, form: CategoryForm) -> Result<CategoryView> {
        let name = form.name.trim().to_string();
        let slug = form
            .slug
            .as_deref()
            .map(slugify)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&name));

        let mut errors = FieldErrors::new();
        if name.is_empty() {
            errors.add("name", "این فیلد الزامی است");
        }
        if slug.is_empty() {
            errors.add("slug", "نامک معتبر نیست");
        }
        errors.into_result()?;

        let created = self
            .storage
            .create_category(NewCategory {
                name,
                slug,
                parent_id: form.parent_id,
                is_active: form.is_active,
            })
            .await?;
        info!("AdminService: category '{}' created", created.slug);
        Ok(CategoryView::from(&created))
    }

    pub async fn update_category(&self, id: i32, patch: CategoryPatch) -> Result<CategoryView> {
        if patch.parent_id == Some(Some(id)) {
            return Err(MajazamoozError::invalid_field(
                "parent_id",
                "دسته بندی نمی تواند والد خودش باشد",
            ));
        }
        let updated = self
            .storage
            .update_category(
                id,
                CategoryUpdate {
                    name: patch.name.map(|n| n.trim().to_string()),
                    slug: patch.slug.as_deref().map(slugify),
                    parent_id: patch.parent_id,
                    is_active: patch.is_active,
                },
            )
            .await?;
        Ok(CategoryView::from(&updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_status_is_checked() {
        let query = AdminListQuery {
            confirm_status: Some(2),
            ..Default::default()
        };
        assert!(query.status().is_err());

        let query = AdminListQuery {
            confirm_status: Some(-1),
            page: Some(0),
            ..Default::default()
        };
        assert_eq!(query.status().unwrap(), Some(ConfirmStatus::Disproved));
        assert_eq!(query.page(), 1);
    }
}
