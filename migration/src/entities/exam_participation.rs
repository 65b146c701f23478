use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "exam_participations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub exam_id: i32,
    pub user_id: i32,
    pub started_at: DateTimeUtc,
    pub finalized_at: Option<DateTimeUtc>,
    pub deadline: Option<DateTimeUtc>,
    pub total_correct: i32,
    pub total_incorrect: i32,
    pub total_blank: i32,
    pub coin_cost: i64,
    pub coin_earned: i64,
    pub diamond_cost: i64,
    pub score_earned: i64,
    pub score_max: i64,
    pub score_percent: f64,
    pub mark_status: i32,
    pub is_finalized: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
