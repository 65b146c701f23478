use sea_orm_migration::prelude::*;

use crate::relation_table::{create_relation_table, drop_relation_table};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Exams::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Exams::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Exams::Title)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Exams::Slug)
                            .string_len(150)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Exams::ShortDescription)
                            .string_len(500)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Exams::FullDescription).text().not_null())
                    .col(
                        ColumnDef::new(Exams::DeadlineDurationSeconds)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Exams::WaitingDurationSeconds)
                            .big_integer()
                            .not_null()
                            .default(60),
                    )
                    .col(
                        ColumnDef::new(Exams::StartsAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Exams::EndsAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Exams::CoinCost)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Exams::DiamondCost)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Exams::CorrectScore)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(
                        ColumnDef::new(Exams::BlankScore)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Exams::IncorrectScore)
                            .integer()
                            .not_null()
                            .default(-1),
                    )
                    .col(
                        ColumnDef::new(Exams::CorrectCoin)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(
                        ColumnDef::new(Exams::ConfirmStatus)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Exams::ViewsCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Exams::LikesCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Exams::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Exams::CreateDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Exams::DesignerId).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exams_designer")
                            .from(Exams::Table, Exams::DesignerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExamCategories::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ExamCategories::ExamId).integer().not_null())
                    .col(
                        ColumnDef::new(ExamCategories::CategoryId)
                            .integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ExamCategories::ExamId)
                            .col(ExamCategories::CategoryId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exam_categories_exam")
                            .from(ExamCategories::Table, ExamCategories::ExamId)
                            .to(Exams::Table, Exams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exam_categories_category")
                            .from(ExamCategories::Table, ExamCategories::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Questions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Questions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Questions::ExamId).integer().not_null())
                    .col(ColumnDef::new(Questions::Text).text().not_null())
                    .col(ColumnDef::new(Questions::Choice1).string_len(500).not_null())
                    .col(ColumnDef::new(Questions::Choice2).string_len(500).not_null())
                    .col(ColumnDef::new(Questions::Choice3).string_len(500).not_null())
                    .col(ColumnDef::new(Questions::Choice4).string_len(500).not_null())
                    .col(ColumnDef::new(Questions::CorrectChoice).integer().not_null())
                    .col(
                        ColumnDef::new(Questions::CorrectFullAnswer)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Questions::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_questions_exam")
                            .from(Questions::Table, Questions::ExamId)
                            .to(Exams::Table, Exams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExamParticipations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExamParticipations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ExamParticipations::ExamId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExamParticipations::UserId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExamParticipations::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExamParticipations::FinalizedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ExamParticipations::Deadline)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(zero_int(ExamParticipations::TotalCorrect))
                    .col(zero_int(ExamParticipations::TotalIncorrect))
                    .col(zero_int(ExamParticipations::TotalBlank))
                    .col(zero_big(ExamParticipations::CoinCost))
                    .col(zero_big(ExamParticipations::CoinEarned))
                    .col(zero_big(ExamParticipations::DiamondCost))
                    .col(zero_big(ExamParticipations::ScoreEarned))
                    .col(zero_big(ExamParticipations::ScoreMax))
                    .col(
                        ColumnDef::new(ExamParticipations::ScorePercent)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(ExamParticipations::MarkStatus)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(ExamParticipations::IsFinalized)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exam_participations_exam")
                            .from(ExamParticipations::Table, ExamParticipations::ExamId)
                            .to(Exams::Table, Exams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exam_participations_user")
                            .from(ExamParticipations::Table, ExamParticipations::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_exam_participations_user_exam")
                    .table(ExamParticipations::Table)
                    .col(ExamParticipations::UserId)
                    .col(ExamParticipations::ExamId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ParticipantAnswers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParticipantAnswers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ParticipantAnswers::ParticipationId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParticipantAnswers::QuestionId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParticipantAnswers::ParticipantAnswer)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ParticipantAnswers::CorrectAnswer)
                            .integer()
                            .null(),
                    )
                    .col(zero_int(ParticipantAnswers::AnswerStatus))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_participant_answers_participation")
                            .from(
                                ParticipantAnswers::Table,
                                ParticipantAnswers::ParticipationId,
                            )
                            .to(ExamParticipations::Table, ExamParticipations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_participant_answers_question")
                            .from(ParticipantAnswers::Table, ParticipantAnswers::QuestionId)
                            .to(Questions::Table, Questions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_participant_answers_participation_question")
                    .table(ParticipantAnswers::Table)
                    .col(ParticipantAnswers::ParticipationId)
                    .col(ParticipantAnswers::QuestionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        create_relation_table(manager, "exam_likes", "exam_id", "exams").await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_relation_table(manager, "exam_likes").await?;

        manager
            .drop_table(Table::drop().table(ParticipantAnswers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExamParticipations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Questions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExamCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Exams::Table).to_owned())
            .await
    }
}

fn zero_int<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .integer()
        .not_null()
        .default(0)
        .to_owned()
}

fn zero_big<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .big_integer()
        .not_null()
        .default(0)
        .to_owned()
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Exams {
    Table,
    Id,
    Title,
    Slug,
    ShortDescription,
    FullDescription,
    DeadlineDurationSeconds,
    WaitingDurationSeconds,
    StartsAt,
    EndsAt,
    CoinCost,
    DiamondCost,
    CorrectScore,
    BlankScore,
    IncorrectScore,
    CorrectCoin,
    ConfirmStatus,
    ViewsCount,
    LikesCount,
    IsActive,
    CreateDate,
    DesignerId,
}

#[derive(DeriveIden)]
enum ExamCategories {
    Table,
    ExamId,
    CategoryId,
}

#[derive(DeriveIden)]
enum Questions {
    Table,
    Id,
    ExamId,
    Text,
    #[sea_orm(iden = "choice_1")]
    Choice1,
    #[sea_orm(iden = "choice_2")]
    Choice2,
    #[sea_orm(iden = "choice_3")]
    Choice3,
    #[sea_orm(iden = "choice_4")]
    Choice4,
    CorrectChoice,
    CorrectFullAnswer,
    IsActive,
}

#[derive(DeriveIden)]
enum ExamParticipations {
    Table,
    Id,
    ExamId,
    UserId,
    StartedAt,
    FinalizedAt,
    Deadline,
    TotalCorrect,
    TotalIncorrect,
    TotalBlank,
    CoinCost,
    CoinEarned,
    DiamondCost,
    ScoreEarned,
    ScoreMax,
    ScorePercent,
    MarkStatus,
    IsFinalized,
}

#[derive(DeriveIden)]
enum ParticipantAnswers {
    Table,
    Id,
    ParticipationId,
    QuestionId,
    ParticipantAnswer,
    CorrectAnswer,
    AnswerStatus,
}
