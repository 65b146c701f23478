//! User accounts.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, sea_query::Expr,
};
use tracing::info;

use super::{SeaOrmStorage, retry};
use crate::errors::{MajazamoozError, Result};
use crate::storage::models::Page;
use migration::entities::user;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub email_confirmed: bool,
}

/// Editable profile fields. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<Option<String>>,
    pub tutorials_count_goal: Option<i64>,
    pub likes_count_goal: Option<i64>,
    pub views_count_goal: Option<i64>,
    pub comments_count_goal: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub search: Option<String>,
    pub is_staff: Option<bool>,
}

impl SeaOrmStorage {
    pub async fn find_user(&self, id: i32) -> Result<Option<user::Model>> {
        let db = &self.db;
        Ok(retry::with_retry("find_user", self.retry_config, || async {
            user::Entity::find_by_id(id).one(db).await
        })
        .await?)
    }

    pub async fn find_user_by_login(&self, username_or_email: &str) -> Result<Option<user::Model>> {
        let needle = username_or_email.trim();
        Ok(user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(needle))
                    .add(user::Column::Email.eq(needle.to_lowercase())),
            )
            .one(&self.db)
            .await?)
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .count(&self.db)
            .await?
            > 0)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(email.to_lowercase()))
            .count(&self.db)
            .await?
            > 0)
    }

    pub async fn create_user(&self, new: NewUser) -> Result<user::Model> {
        let model = user::ActiveModel {
            username: Set(new.username.clone()),
            email: Set(new.email.to_lowercase()),
            password: Set(new.password_hash),
            first_name: Set(String::new()),
            last_name: Set(String::new()),
            avatar: Set(None),
            scores: Set(0),
            coins: Set(0),
            diamonds: Set(0),
            email_confirmed: Set(new.email_confirmed),
            is_staff: Set(new.is_staff),
            is_active: Set(true),
            tutorials_count_goal: Set(0),
            likes_count_goal: Set(0),
            views_count_goal: Set(0),
            comments_count_goal: Set(0),
            date_joined: Set(Utc::now()),
            last_login: Set(None),
            ..Default::default()
        };

        let created = model.insert(&self.db).await.map_err(|e| {
            let msg = e.to_string().to_lowercase();
            if msg.contains("unique") || msg.contains("duplicate") {
                MajazamoozError::conflict(format!("User '{}' already exists", new.username))
            } else {
                e.into()
            }
        })?;

        self.invalidate_count_cache();
        info!("User created: {} (id={})", created.username, created.id);
        Ok(created)
    }

    pub async fn update_profile(&self, id: i32, update: ProfileUpdate) -> Result<user::Model> {
        let existing = self
            .find_user(id)
            .await?
            .ok_or_else(|| MajazamoozError::not_found(format!("User {} not found", id)))?;

        let mut model: user::ActiveModel = existing.into();
        if let Some(v) = update.first_name {
            model.first_name = Set(v);
        }
        if let Some(v) = update.last_name {
            model.last_name = Set(v);
        }
        if let Some(v) = update.avatar {
            model.avatar = Set(v);
        }
        if let Some(v) = update.tutorials_count_goal {
            model.tutorials_count_goal = Set(v);
        }
        if let Some(v) = update.likes_count_goal {
            model.likes_count_goal = Set(v);
        }
        if let Some(v) = update.views_count_goal {
            model.views_count_goal = Set(v);
        }
        if let Some(v) = update.comments_count_goal {
            model.comments_count_goal = Set(v);
        }

        Ok(model.update(&self.db).await?)
    }

    pub async fn set_password(&self, id: i32, password_hash: String) -> Result<()> {
        let model = user::ActiveModel {
            id: Set(id),
            password: Set(password_hash),
            ..Default::default()
        };
        model.update(&self.db).await?;
        Ok(())
    }

    pub async fn touch_last_login(&self, id: i32) -> Result<()> {
        let model = user::ActiveModel {
            id: Set(id),
            last_login: Set(Some(Utc::now())),
            ..Default::default()
        };
        model.update(&self.db).await?;
        Ok(())
    }

    /// Returns `false` when the address was already confirmed.
    pub async fn confirm_email(&self, id: i32) -> Result<bool> {
        let result = user::Entity::update_many()
            .col_expr(user::Column::EmailConfirmed, Expr::value(true))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::EmailConfirmed.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn list_users(
        &self,
        filter: UserFilter,
        page: u64,
        page_size: u64,
    ) -> Result<Page<user::Model>> {
        let mut condition = Condition::all();
        if let Some(ref search) = filter.search {
            condition = condition.add(
                Condition::any()
                    .add(user::Column::Username.contains(search))
                    .add(user::Column::Email.contains(search))
                    .add(user::Column::FirstName.contains(search))
                    .add(user::Column::LastName.contains(search)),
            );
        }
        if let Some(is_staff) = filter.is_staff {
            condition = condition.add(user::Column::IsStaff.eq(is_staff));
        }

        let db = &self.db;
        let cache_key = format!("users:s={:?}:st={:?}", filter.search, filter.is_staff);
        let cond = condition.clone();
        let total = self
            .cached_count(cache_key, "list_users(count)", || async {
                user::Entity::find().filter(cond.clone()).count(db).await
            })
            .await?;

        let items = user::Entity::find()
            .filter(condition)
            .order_by_asc(user::Column::Id)
            .paginate(db, page_size)
            .fetch_page(page.saturating_sub(1))
            .await?;

        Ok(Page::new(items, page, page_size, total))
    }
}
