use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "exams")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub short_description: String,
    #[sea_orm(column_type = "Text")]
    pub full_description: String,
    pub deadline_duration_seconds: i64,
    pub waiting_duration_seconds: i64,
    pub starts_at: Option<DateTimeUtc>,
    pub ends_at: Option<DateTimeUtc>,
    pub coin_cost: i64,
    pub diamond_cost: i64,
    pub correct_score: i32,
    pub blank_score: i32,
    pub incorrect_score: i32,
    pub correct_coin: i32,
    pub confirm_status: i32,
    pub views_count: i32,
    pub likes_count: i32,
    pub is_active: bool,
    pub create_date: DateTimeUtc,
    pub designer_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
