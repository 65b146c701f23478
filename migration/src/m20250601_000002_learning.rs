use sea_orm_migration::prelude::*;

use crate::relation_table::{create_relation_table, drop_relation_table};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// (table, target column, target table)
const TUTORIAL_RELATIONS: &[(&str, &str, &str)] = &[
    ("tutorial_views", "tutorial_id", "tutorials"),
    ("tutorial_likes", "tutorial_id", "tutorials"),
    ("tutorial_up_votes", "tutorial_id", "tutorials"),
    ("tutorial_down_votes", "tutorial_id", "tutorials"),
    ("tutorial_comment_likes", "comment_id", "tutorial_comments"),
    ("tutorial_comment_up_votes", "comment_id", "tutorial_comments"),
    ("tutorial_comment_down_votes", "comment_id", "tutorial_comments"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::ParentId).integer().null())
                    .col(ColumnDef::new(Categories::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Categories::Slug)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Categories::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_categories_parent")
                            .from(Categories::Table, Categories::ParentId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tutorials::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tutorials::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tutorials::Title).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Tutorials::Slug)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Tutorials::ShortDescription)
                            .string_len(500)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Tutorials::Body).text().not_null())
                    .col(ColumnDef::new(Tutorials::Image).string().null())
                    .col(counter(Tutorials::TotalViewsCount))
                    .col(counter(Tutorials::UserViewsCount))
                    .col(counter(Tutorials::UpVotesCount))
                    .col(counter(Tutorials::DownVotesCount))
                    .col(counter(Tutorials::LikesCount))
                    .col(
                        ColumnDef::new(Tutorials::CreateDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tutorials::LastEditDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tutorials::ConfirmStatus)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Tutorials::IsEdited)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Tutorials::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Tutorials::AuthorId).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tutorials_author")
                            .from(Tutorials::Table, Tutorials::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tutorials_visible")
                    .table(Tutorials::Table)
                    .col(Tutorials::IsActive)
                    .col(Tutorials::ConfirmStatus)
                    .col(Tutorials::CreateDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TutorialCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TutorialCategories::TutorialId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TutorialCategories::CategoryId)
                            .integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(TutorialCategories::TutorialId)
                            .col(TutorialCategories::CategoryId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tutorial_categories_tutorial")
                            .from(TutorialCategories::Table, TutorialCategories::TutorialId)
                            .to(Tutorials::Table, Tutorials::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tutorial_categories_category")
                            .from(TutorialCategories::Table, TutorialCategories::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TutorialComments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TutorialComments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TutorialComments::Title)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TutorialComments::Body)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(counter(TutorialComments::LikesCount))
                    .col(counter(TutorialComments::UpVotesCount))
                    .col(counter(TutorialComments::DownVotesCount))
                    .col(
                        ColumnDef::new(TutorialComments::CreateDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TutorialComments::LastEditDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TutorialComments::ConfirmStatus)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TutorialComments::AllowReply)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(TutorialComments::NotifyReplies)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(TutorialComments::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(TutorialComments::UserId).integer().null())
                    .col(
                        ColumnDef::new(TutorialComments::TutorialId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TutorialComments::ParentCommentId)
                            .integer()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tutorial_comments_user")
                            .from(TutorialComments::Table, TutorialComments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tutorial_comments_tutorial")
                            .from(TutorialComments::Table, TutorialComments::TutorialId)
                            .to(Tutorials::Table, Tutorials::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tutorial_comments_parent")
                            .from(TutorialComments::Table, TutorialComments::ParentCommentId)
                            .to(TutorialComments::Table, TutorialComments::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tutorial_comments_tutorial")
                    .table(TutorialComments::Table)
                    .col(TutorialComments::TutorialId)
                    .to_owned(),
            )
            .await?;

        for (table, target_column, target_table) in TUTORIAL_RELATIONS {
            create_relation_table(manager, table, target_column, target_table).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (table, _, _) in TUTORIAL_RELATIONS.iter().rev() {
            drop_relation_table(manager, table).await?;
        }

        manager
            .drop_table(Table::drop().table(TutorialComments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TutorialCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tutorials::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await
    }
}

fn counter<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .integer()
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
    ParentId,
    Name,
    Slug,
    IsActive,
}

#[derive(DeriveIden)]
enum Tutorials {
    Table,
    Id,
    Title,
    Slug,
    ShortDescription,
    Body,
    Image,
    TotalViewsCount,
    UserViewsCount,
    UpVotesCount,
    DownVotesCount,
    LikesCount,
    CreateDate,
    LastEditDate,
    ConfirmStatus,
    IsEdited,
    IsActive,
    AuthorId,
}

#[derive(DeriveIden)]
enum TutorialCategories {
    Table,
    TutorialId,
    CategoryId,
}

#[derive(DeriveIden)]
enum TutorialComments {
    Table,
    Id,
    Title,
    Body,
    LikesCount,
    UpVotesCount,
    DownVotesCount,
    CreateDate,
    LastEditDate,
    ConfirmStatus,
    AllowReply,
    NotifyReplies,
    IsActive,
    UserId,
    TutorialId,
    ParentCommentId,
}
