use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub scores: i64,
    pub coins: i64,
    pub diamonds: i64,
    pub email_confirmed: bool,
    pub is_staff: bool,
    pub is_active: bool,
    pub tutorials_count_goal: i64,
    pub likes_count_goal: i64,
    pub views_count_goal: i64,
    pub comments_count_goal: i64,
    pub date_joined: DateTimeUtc,
    pub last_login: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
