use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "tutorials")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub short_description: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub image: Option<String>,
    pub total_views_count: i32,
    pub user_views_count: i32,
    pub up_votes_count: i32,
    pub down_votes_count: i32,
    pub likes_count: i32,
    pub create_date: DateTimeUtc,
    pub last_edit_date: DateTimeUtc,
    pub confirm_status: i32,
    pub is_edited: bool,
    pub is_active: bool,
    pub author_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
