//! Public learning pages and the author's tutorial management.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::dto::{
    AuthorSummary, CategoryView, CommentView, OwnerAction, TutorialSummary, check_text,
};
use super::reaction_service::ReactionService;
use crate::config::{RuntimeConfig, keys};
use crate::errors::{FieldErrors, MajazamoozError, Result};
use crate::storage::backend::relations::TutorialLike;
use crate::storage::backend::{NewTutorial, TutorialFilter, TutorialUpdate};
use crate::storage::{Page, SeaOrmStorage};
use crate::utils::slugify;
use migration::entities::tutorial;

pub const RELATED_COUNT: usize = 5;
pub const LATEST_COUNT: u64 = 4;
pub const MOST_POPULAR_COUNT: u64 = 4;
pub const TITLE_MAX_CHARS: usize = 50;
pub const SHORT_DESCRIPTION_MAX_CHARS: usize = 500;

// ============ Request/Response DTOs ============

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArchiveQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchivePage {
    pub tutorials: Page<TutorialSummary>,
    /// Set when the `category` filter names an active category.
    pub category: Option<CategoryView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TutorialDetails {
    pub tutorial: TutorialSummary,
    pub body: String,
    pub author: Option<AuthorSummary>,
    pub categories: Vec<CategoryView>,
    pub comments: Vec<CommentView>,
    pub related: Vec<TutorialSummary>,
    pub latest: Vec<TutorialSummary>,
    pub most_popular: Vec<TutorialSummary>,
    pub liked_by_current_user: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomePage {
    pub latest: Vec<TutorialSummary>,
    pub most_popular: Vec<TutorialSummary>,
    pub categories: Vec<CategoryView>,
    pub keywords: String,
    pub description: String,
}

/// An author's own tutorial, including the body and moderation state.
#[derive(Debug, Clone, Serialize)]
pub struct OwnedTutorial {
    pub tutorial: TutorialSummary,
    pub body: String,
    pub categories: Vec<CategoryView>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TutorialForm {
    pub title: String,
    pub short_description: String,
    pub body: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<i32>,
}

impl TutorialForm {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "title", &self.title, TITLE_MAX_CHARS);
        check_text(
            &mut errors,
            "short_description",
            &self.short_description,
            SHORT_DESCRIPTION_MAX_CHARS,
        );
        if self.body.trim().is_empty() {
            errors.add("body", "این فیلد الزامی است");
        }
        if slugify(&self.title).is_empty() && !self.title.trim().is_empty() {
            errors.add("title", "عنوان باید حداقل یک حرف یا عدد داشته باشد");
        }
        errors.into_result()
    }
}

// ============ TutorialService Implementation ============

pub struct TutorialService {
    storage: Arc<SeaOrmStorage>,
    runtime: Arc<RuntimeConfig>,
    reactions: ReactionService,
}

impl TutorialService {
    pub fn new(storage: Arc<SeaOrmStorage>, runtime: Arc<RuntimeConfig>) -> Self {
        let reactions = ReactionService::new(storage.clone(), runtime.clone());
        Self {
            storage,
            runtime,
            reactions,
        }
    }

    fn archive_page_size(&self) -> u64 {
        self.runtime
            .get_positive_or(keys::LEARNING_TUTORIAL_ARCHIVE_PAGINATE_BY, 30)
    }

    fn panel_page_size(&self) -> u64 {
        self.runtime.get_positive_or(keys::USER_PANEL_PAGINATE_BY, 15)
    }

    /// Summaries with their visible comment counts.
    async fn summaries(&self, tutorials: &[tutorial::Model]) -> Result<Vec<TutorialSummary>> {
        let ids: Vec<i32> = tutorials.iter().map(|t| t.id).collect();
        let counts = self.storage.comments_count_map(&ids).await?;
        Ok(tutorials
            .iter()
            .map(|t| TutorialSummary::new(t, counts.get(&t.id).copied().unwrap_or(0)))
            .collect())
    }

    async fn summary_page(&self, page: Page<tutorial::Model>) -> Result<Page<TutorialSummary>> {
        let items = self.summaries(&page.items).await?;
        Ok(Page::new(items, page.page, page.page_size, page.total))
    }

    // ============ Public pages ============

    pub async fn archive(&self, query: ArchiveQuery) -> Result<ArchivePage> {
        let category = match query.category.as_deref().filter(|s| !s.is_empty()) {
            Some(slug) => self.storage.find_active_category_by_slug(slug).await?,
            None => None,
        };

        let filter = TutorialFilter {
            search: query.search.filter(|s| !s.trim().is_empty()),
            category_slug: query.category.filter(|s| !s.is_empty()),
            ..TutorialFilter::visible()
        };
        let page = self
            .storage
            .list_tutorials(filter, query.page.unwrap_or(1).max(1), self.archive_page_size())
            .await?;

        Ok(ArchivePage {
            tutorials: self.summary_page(page).await?,
            category: category.as_ref().map(CategoryView::from),
        })
    }

    pub async fn home(&self) -> Result<HomePage> {
        let latest = self.storage.latest_tutorials(LATEST_COUNT).await?;
        let most_popular = self.storage.most_popular_tutorials(MOST_POPULAR_COUNT).await?;
        let categories = self.storage.root_categories().await?;

        Ok(HomePage {
            latest: self.summaries(&latest).await?,
            most_popular: self.summaries(&most_popular).await?,
            categories: categories.iter().map(CategoryView::from).collect(),
            keywords: self.runtime.get_or(keys::WEBSITE_KEYWORDS, ""),
            description: self.runtime.get_or(keys::WEBSITE_DESCRIPTION, ""),
        })
    }

    /// Visible tutorial page. Records the view.
    pub async fn details(&self, slug: &str, viewer_id: Option<i32>) -> Result<TutorialDetails> {
        let tutorial = self
            .storage
            .find_visible_tutorial_by_slug(slug)
            .await?
            .ok_or_else(|| MajazamoozError::not_found("آموزش مورد نظر یافت نشد"))?;

        self.reactions
            .record_tutorial_view(viewer_id, &tutorial)
            .await?;

        let author = match tutorial.author_id {
            Some(id) => self.storage.find_user(id).await?,
            None => None,
        };
        let categories = self.storage.categories_of_tutorial(tutorial.id).await?;
        let comments = self.storage.visible_comments_of_tutorial(tutorial.id).await?;
        let related = self.related(&tutorial).await?;
        let latest = self.storage.latest_tutorials(LATEST_COUNT).await?;
        let most_popular = self.storage.most_popular_tutorials(MOST_POPULAR_COUNT).await?;
        let liked_by_current_user = match viewer_id {
            Some(user_id) => {
                self.storage
                    .relation_exists::<TutorialLike>(user_id, tutorial.id)
                    .await?
            }
            None => false,
        };

        let comments_count = comments.len() as u64;
        Ok(TutorialDetails {
            tutorial: TutorialSummary::new(&tutorial, comments_count),
            body: tutorial.body.clone(),
            author: author.as_ref().map(AuthorSummary::from),
            categories: categories.iter().map(CategoryView::from).collect(),
            comments: comments.iter().map(CommentView::from).collect(),
            related: self.summaries(&related).await?,
            latest: self.summaries(&latest).await?,
            most_popular: self.summaries(&most_popular).await?,
            liked_by_current_user,
        })
    }

    /// Tutorials sharing a category, widening to parent categories until
    /// enough are found.
    pub async fn related(&self, tutorial: &tutorial::Model) -> Result<Vec<tutorial::Model>> {
        let mut current: Vec<i32> = self
            .storage
            .categories_of_tutorial(tutorial.id)
            .await?
            .into_iter()
            .filter(|c| c.is_active)
            .map(|c| c.id)
            .collect();

        if current.is_empty() {
            let latest = self
                .storage
                .latest_tutorials(RELATED_COUNT as u64 + 1)
                .await?;
            return Ok(latest
                .into_iter()
                .filter(|t| t.id != tutorial.id)
                .take(RELATED_COUNT)
                .collect());
        }

        let mut found: Vec<tutorial::Model> = Vec::with_capacity(RELATED_COUNT);
        let mut exclude = vec![tutorial.id];
        let mut visited: HashSet<i32> = current.iter().copied().collect();

        while found.len() < RELATED_COUNT && !current.is_empty() {
            let wanted = (RELATED_COUNT - found.len()) as u64;
            let batch = self
                .storage
                .visible_tutorials_in_categories(&current, &exclude, wanted)
                .await?;
            exclude.extend(batch.iter().map(|t| t.id));
            found.extend(batch);

            current = self.storage.parent_category_ids(&current).await?;
            current.retain(|id| visited.insert(*id));
        }

        Ok(found)
    }

    // ============ Author panel ============

    /// A tutorial the user wrote, whatever its status.
    pub async fn owned_tutorial(&self, owner_id: i32, id: i32) -> Result<tutorial::Model> {
        self.storage
            .find_tutorial(id)
            .await?
            .filter(|t| t.author_id == Some(owner_id))
            .ok_or_else(|| MajazamoozError::not_found("آموزش مورد نظر یافت نشد"))
    }

    pub async fn owned_details(&self, owner_id: i32, id: i32) -> Result<OwnedTutorial> {
        let tutorial = self.owned_tutorial(owner_id, id).await?;
        let categories = self.storage.categories_of_tutorial(id).await?;
        let mut summary = self.summaries(std::slice::from_ref(&tutorial)).await?;
        Ok(OwnedTutorial {
            tutorial: summary.remove(0),
            body: tutorial.body,
            categories: categories.iter().map(CategoryView::from).collect(),
        })
    }

    pub async fn list_own(&self, owner_id: i32, page: u64) -> Result<Page<TutorialSummary>> {
        let filter = TutorialFilter {
            author_id: Some(owner_id),
            ..Default::default()
        };
        let page = self
            .storage
            .list_tutorials(filter, page.max(1), self.panel_page_size())
            .await?;
        self.summary_page(page).await
    }

    pub async fn create(&self, author_id: i32, form: TutorialForm) -> Result<tutorial::Model> {
        form.validate()?;

        let created = self
            .storage
            .create_tutorial(NewTutorial {
                slug: slugify(&form.title),
                title: form.title.trim().to_string(),
                short_description: form.short_description.trim().to_string(),
                body: form.body,
                image: form.image.filter(|s| !s.is_empty()),
                author_id: Some(author_id),
            })
            .await?;
        self.storage
            .set_tutorial_categories(created.id, &form.category_ids)
            .await?;

        info!(
            "TutorialService: user {} created tutorial '{}' (id={})",
            author_id, created.slug, created.id
        );
        Ok(created)
    }

    /// Owner edit; the tutorial goes back to moderation.
    pub async fn update(
        &self,
        owner_id: i32,
        id: i32,
        form: TutorialForm,
    ) -> Result<tutorial::Model> {
        form.validate()?;
        self.owned_tutorial(owner_id, id).await?;

        let updated = self
            .storage
            .update_tutorial(
                id,
                TutorialUpdate {
                    title: Some(form.title.trim().to_string()),
                    short_description: Some(form.short_description.trim().to_string()),
                    body: Some(form.body),
                    image: Some(form.image.filter(|s| !s.is_empty())),
                },
            )
            .await?;
        self.storage
            .set_tutorial_categories(id, &form.category_ids)
            .await?;

        info!("TutorialService: user {} edited tutorial {}", owner_id, id);
        Ok(updated)
    }

    pub async fn delete_or_deactivate(
        &self,
        owner_id: i32,
        id: i32,
        action: OwnerAction,
    ) -> Result<()> {
        self.owned_tutorial(owner_id, id).await?;
        match action {
            OwnerAction::Delete => self.storage.delete_tutorial(id).await?,
            OwnerAction::Deactivate => self.storage.deactivate_tutorial(id).await?,
        };
        info!(
            "TutorialService: user {} applied {:?} to tutorial {}",
            owner_id, action, id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(title: &str) -> TutorialForm {
        TutorialForm {
            title: title.to_string(),
            short_description: "خلاصه".to_string(),
            body: "متن".to_string(),
            image: None,
            category_ids: Vec::new(),
        }
    }

    #[test]
    fn form_validation() {
        assert!(form("آموزش راست").validate().is_ok());

        let err = form(&"a".repeat(51)).validate().unwrap_err();
        assert!(err.field_errors().unwrap().get("title").is_some());

        let err = form("!!!").validate().unwrap_err();
        assert!(err.field_errors().unwrap().get("title").is_some());

        let mut empty_body = form("ok");
        empty_body.body = " ".into();
        let err = empty_body.validate().unwrap_err();
        assert!(err.field_errors().unwrap().get("body").is_some());
    }
}
