use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "tutorial_comments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub body: String,
    pub likes_count: i32,
    pub up_votes_count: i32,
    pub down_votes_count: i32,
    pub create_date: DateTimeUtc,
    pub last_edit_date: DateTimeUtc,
    pub confirm_status: i32,
    pub allow_reply: bool,
    pub notify_replies: bool,
    pub is_active: bool,
    pub user_id: Option<i32>,
    pub tutorial_id: i32,
    pub parent_comment_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
