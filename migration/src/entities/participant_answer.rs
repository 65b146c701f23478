use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "participant_answers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub participation_id: i32,
    pub question_id: i32,
    pub participant_answer: Option<i32>,
    pub correct_answer: Option<i32>,
    pub answer_status: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
