//! Score/coin relation tables.
//!
//! Every like, vote and view row snapshots the reward that was granted when
//! it was created. Creating a row adds the snapshot to the recipient and
//! bumps the counter on the target; deleting it reverses exactly that.

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, ExprTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Set,
    TransactionTrait, sea_query::Expr,
};
use serde::Serialize;
use tracing::{debug, info};

use super::{SeaOrmStorage, adjust_balance, retry};
use crate::config::{RuntimeConfig, keys};
use crate::errors::Result;
use crate::storage::models::Page;
use migration::entities::{
    exam, exam_like, tutorial, tutorial_comment, tutorial_comment_down_vote,
    tutorial_comment_like, tutorial_comment_up_vote, tutorial_down_vote, tutorial_like,
    tutorial_up_vote, tutorial_view,
};

/// Who receives the reward of a relation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardRecipient {
    /// The user who created the row (views).
    Actor,
    /// The author of the target (likes and votes).
    TargetOwner,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reward {
    pub score: i32,
    pub coin: i32,
}

impl Reward {
    pub fn new(score: i32, coin: i32) -> Self {
        Self { score, coin }
    }

    /// Current reward amounts of `R` from runtime settings.
    pub fn from_runtime<R: ScoreCoinRelation>(config: &RuntimeConfig) -> Self {
        let read = |key: &str| {
            config
                .get_int(key)
                .and_then(|v| i32::try_from(v).ok())
                .unwrap_or(0)
        };
        Self {
            score: read(R::SCORE_KEY),
            coin: read(R::COIN_KEY),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Created,
    Removed,
}

impl ToggleOutcome {
    /// AJAX status code: 1 created, -1 removed.
    pub fn status(self) -> i32 {
        match self {
            Self::Created => 1,
            Self::Removed => -1,
        }
    }
}

/// A relation row without its table-specific target column name.
#[derive(Debug, Clone, Serialize)]
pub struct RelationRow {
    pub id: i32,
    pub user_id: i32,
    pub target_id: i32,
    pub score: i32,
    pub coin: i32,
    pub create_date: DateTime<Utc>,
}

type EntityColumn<E> = <E as EntityTrait>::Column;
type EntityActiveModel<E> = <E as EntityTrait>::ActiveModel;

/// Describes one relation table and how it pays out.
pub trait ScoreCoinRelation {
    type Entity: EntityTrait<Model: Sync>;
    type Target: EntityTrait;

    const NAME: &'static str;

    const ID_COLUMN: EntityColumn<Self::Entity>;
    const USER_COLUMN: EntityColumn<Self::Entity>;
    const TARGET_COLUMN: EntityColumn<Self::Entity>;
    const SCORE_COLUMN: EntityColumn<Self::Entity>;
    const COIN_COLUMN: EntityColumn<Self::Entity>;
    const CREATE_DATE_COLUMN: EntityColumn<Self::Entity>;

    const TARGET_ID_COLUMN: EntityColumn<Self::Target>;
    const COUNTER_COLUMN: EntityColumn<Self::Target>;
    const OWNER_COLUMN: EntityColumn<Self::Target>;

    const RECIPIENT: RewardRecipient;
    const SCORE_KEY: &'static str;
    const COIN_KEY: &'static str;

    fn new_row(
        user_id: i32,
        target_id: i32,
        reward: Reward,
        now: DateTime<Utc>,
    ) -> EntityActiveModel<Self::Entity>;
}

macro_rules! score_coin_relation {
    (
        $name:ident, $label:literal,
        $entity:ident . $target_field:ident, $target_col:ident,
        $target:ident, $counter:ident, $owner:ident,
        $recipient:ident, $score_key:ident, $coin_key:ident
    ) => {
        pub struct $name;

        impl ScoreCoinRelation for $name {
            type Entity = $entity::Entity;
            type Target = $target::Entity;

            const NAME: &'static str = $label;

            const ID_COLUMN: $entity::Column = $entity::Column::Id;
            const USER_COLUMN: $entity::Column = $entity::Column::UserId;
            const TARGET_COLUMN: $entity::Column = $entity::Column::$target_col;
            const SCORE_COLUMN: $entity::Column = $entity::Column::Score;
            const COIN_COLUMN: $entity::Column = $entity::Column::Coin;
            const CREATE_DATE_COLUMN: $entity::Column = $entity::Column::CreateDate;

            const TARGET_ID_COLUMN: $target::Column = $target::Column::Id;
            const COUNTER_COLUMN: $target::Column = $target::Column::$counter;
            const OWNER_COLUMN: $target::Column = $target::Column::$owner;

            const RECIPIENT: RewardRecipient = RewardRecipient::$recipient;
            const SCORE_KEY: &'static str = keys::$score_key;
            const COIN_KEY: &'static str = keys::$coin_key;

            fn new_row(
                user_id: i32,
                target_id: i32,
                reward: Reward,
                now: DateTime<Utc>,
            ) -> $entity::ActiveModel {
                $entity::ActiveModel {
                    user_id: Set(user_id),
                    $target_field: Set(target_id),
                    score: Set(reward.score),
                    coin: Set(reward.coin),
                    create_date: Set(now),
                    ..Default::default()
                }
            }
        }
    };
}

score_coin_relation!(
    TutorialView, "tutorial_view",
    tutorial_view.tutorial_id, TutorialId,
    tutorial, UserViewsCount, AuthorId,
    Actor, TUTORIAL_VIEW_SCORE, TUTORIAL_VIEW_COIN
);
score_coin_relation!(
    TutorialLike, "tutorial_like",
    tutorial_like.tutorial_id, TutorialId,
    tutorial, LikesCount, AuthorId,
    TargetOwner, TUTORIAL_LIKE_SCORE, TUTORIAL_LIKE_COIN
);
score_coin_relation!(
    TutorialUpVote, "tutorial_up_vote",
    tutorial_up_vote.tutorial_id, TutorialId,
    tutorial, UpVotesCount, AuthorId,
    TargetOwner, TUTORIAL_UPVOTE_SCORE, TUTORIAL_UPVOTE_COIN
);
score_coin_relation!(
    TutorialDownVote, "tutorial_down_vote",
    tutorial_down_vote.tutorial_id, TutorialId,
    tutorial, DownVotesCount, AuthorId,
    TargetOwner, TUTORIAL_DOWNVOTE_SCORE, TUTORIAL_DOWNVOTE_COIN
);
score_coin_relation!(
    TutorialCommentLike, "tutorial_comment_like",
    tutorial_comment_like.comment_id, CommentId,
    tutorial_comment, LikesCount, UserId,
    TargetOwner, TUTORIAL_COMMENT_LIKE_SCORE, TUTORIAL_COMMENT_LIKE_COIN
);
score_coin_relation!(
    TutorialCommentUpVote, "tutorial_comment_up_vote",
    tutorial_comment_up_vote.comment_id, CommentId,
    tutorial_comment, UpVotesCount, UserId,
    TargetOwner, TUTORIAL_COMMENT_UPVOTE_SCORE, TUTORIAL_COMMENT_UPVOTE_COIN
);
score_coin_relation!(
    TutorialCommentDownVote, "tutorial_comment_down_vote",
    tutorial_comment_down_vote.comment_id, CommentId,
    tutorial_comment, DownVotesCount, UserId,
    TargetOwner, TUTORIAL_COMMENT_DOWNVOTE_SCORE, TUTORIAL_COMMENT_DOWNVOTE_COIN
);
score_coin_relation!(
    ExamLike, "exam_like",
    exam_like.exam_id, ExamId,
    exam, LikesCount, DesignerId,
    TargetOwner, EXAM_LIKE_SCORE, EXAM_LIKE_COIN
);

/// Rows of a relation table to list in the user panel.
#[derive(Debug, Clone, Copy)]
pub enum RelationScope {
    /// Rows created by this user.
    CreatedBy(i32),
    /// Rows other users created on targets this user owns.
    OnTargetsOf(i32),
}

impl SeaOrmStorage {
    /// Remove the row if present, otherwise create it.
    ///
    /// Counter and balance changes commit together with the row; the whole
    /// transaction is retried on deadlocks.
    pub async fn toggle_relation<R>(
        &self,
        user_id: i32,
        target_id: i32,
        reward: Reward,
    ) -> Result<ToggleOutcome>
    where
        R: ScoreCoinRelation,
        <R::Entity as EntityTrait>::Model: IntoActiveModel<EntityActiveModel<R::Entity>>,
    {
        let db = &self.db;
        let (outcome, recipient) = retry::with_retry(R::NAME, self.retry_config, || {
            toggle_in_txn::<R>(db, user_id, target_id, reward)
        })
        .await?;

        info!(
            "{} {:?}: user={} target={} recipient={:?}",
            R::NAME,
            outcome,
            user_id,
            target_id,
            recipient
        );
        Ok(outcome)
    }

    /// Create the row unless it already exists. Returns `true` when created.
    pub async fn create_relation_if_absent<R>(
        &self,
        user_id: i32,
        target_id: i32,
        reward: Reward,
    ) -> Result<bool>
    where
        R: ScoreCoinRelation,
        <R::Entity as EntityTrait>::Model: IntoActiveModel<EntityActiveModel<R::Entity>>,
    {
        let db = &self.db;
        let created = retry::with_retry(R::NAME, self.retry_config, || {
            create_in_txn::<R>(db, user_id, target_id, reward)
        })
        .await?;

        if created {
            debug!("{} created: user={} target={}", R::NAME, user_id, target_id);
        }
        Ok(created)
    }

    pub async fn relation_exists<R: ScoreCoinRelation>(
        &self,
        user_id: i32,
        target_id: i32,
    ) -> Result<bool> {
        Ok(R::Entity::find()
            .filter(R::USER_COLUMN.eq(user_id))
            .filter(R::TARGET_COLUMN.eq(target_id))
            .count(&self.db)
            .await?
            > 0)
    }

    /// Newest rows first.
    pub async fn relation_rows<R: ScoreCoinRelation>(
        &self,
        scope: RelationScope,
        page: u64,
        page_size: u64,
    ) -> Result<Page<RelationRow>> {
        let mut query = R::Entity::find()
            .select_only()
            .column(R::ID_COLUMN)
            .column(R::USER_COLUMN)
            .column(R::TARGET_COLUMN)
            .column(R::SCORE_COLUMN)
            .column(R::COIN_COLUMN)
            .column(R::CREATE_DATE_COLUMN);

        query = match scope {
            RelationScope::CreatedBy(user_id) => query.filter(R::USER_COLUMN.eq(user_id)),
            RelationScope::OnTargetsOf(owner_id) => {
                let owned = R::Target::find()
                    .select_only()
                    .column(R::TARGET_ID_COLUMN)
                    .filter(R::OWNER_COLUMN.eq(owner_id))
                    .into_query();
                query
                    .filter(R::TARGET_COLUMN.in_subquery(owned))
                    .filter(R::USER_COLUMN.ne(owner_id))
            }
        };

        let paginator = query
            .order_by_desc(R::CREATE_DATE_COLUMN)
            .order_by_desc(R::ID_COLUMN)
            .into_tuple::<(i32, i32, i32, i32, i32, DateTime<Utc>)>()
            .paginate(&self.db, std::cmp::Ord::max(page_size, 1));

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        let items = rows
            .into_iter()
            .map(|(id, user_id, target_id, score, coin, create_date)| RelationRow {
                id,
                user_id,
                target_id,
                score,
                coin,
                create_date,
            })
            .collect();

        Ok(Page::new(items, page, page_size, total))
    }
}

async fn toggle_in_txn<R>(
    db: &DatabaseConnection,
    user_id: i32,
    target_id: i32,
    reward: Reward,
) -> std::result::Result<(ToggleOutcome, Option<i32>), DbErr>
where
    R: ScoreCoinRelation,
    <R::Entity as EntityTrait>::Model: IntoActiveModel<EntityActiveModel<R::Entity>>,
{
    let txn = db.begin().await?;

    let existing: Option<(i32, i32, i32)> = R::Entity::find()
        .select_only()
        .column(R::ID_COLUMN)
        .column(R::SCORE_COLUMN)
        .column(R::COIN_COLUMN)
        .filter(R::USER_COLUMN.eq(user_id))
        .filter(R::TARGET_COLUMN.eq(target_id))
        .into_tuple()
        .one(&txn)
        .await?;

    let recipient = recipient_of::<R, _>(&txn, user_id, target_id).await?;

    let outcome = match existing {
        Some((row_id, score, coin)) => {
            R::Entity::delete_many()
                .filter(R::ID_COLUMN.eq(row_id))
                .exec(&txn)
                .await?;
            bump_counter::<R, _>(&txn, target_id, false).await?;
            if let Some(recipient) = recipient {
                adjust_balance(&txn, recipient, -i64::from(score), -i64::from(coin), 0).await?;
            }
            ToggleOutcome::Removed
        }
        None => {
            insert_row::<R, _>(&txn, user_id, target_id, reward, recipient).await?;
            ToggleOutcome::Created
        }
    };

    txn.commit().await?;
    Ok((outcome, recipient))
}

async fn create_in_txn<R>(
    db: &DatabaseConnection,
    user_id: i32,
    target_id: i32,
    reward: Reward,
) -> std::result::Result<bool, DbErr>
where
    R: ScoreCoinRelation,
    <R::Entity as EntityTrait>::Model: IntoActiveModel<EntityActiveModel<R::Entity>>,
{
    let txn = db.begin().await?;

    let exists = R::Entity::find()
        .filter(R::USER_COLUMN.eq(user_id))
        .filter(R::TARGET_COLUMN.eq(target_id))
        .count(&txn)
        .await?
        > 0;
    if exists {
        txn.rollback().await?;
        return Ok(false);
    }

    let recipient = recipient_of::<R, _>(&txn, user_id, target_id).await?;
    insert_row::<R, _>(&txn, user_id, target_id, reward, recipient).await?;
    txn.commit().await?;
    Ok(true)
}

async fn recipient_of<R, C>(
    conn: &C,
    user_id: i32,
    target_id: i32,
) -> std::result::Result<Option<i32>, DbErr>
where
    R: ScoreCoinRelation,
    C: ConnectionTrait,
{
    match R::RECIPIENT {
        RewardRecipient::Actor => Ok(Some(user_id)),
        RewardRecipient::TargetOwner => {
            let owner: Option<Option<i32>> = R::Target::find()
                .select_only()
                .column(R::OWNER_COLUMN)
                .filter(R::TARGET_ID_COLUMN.eq(target_id))
                .into_tuple()
                .one(conn)
                .await?;
            Ok(owner.flatten())
        }
    }
}

async fn insert_row<R, C>(
    conn: &C,
    user_id: i32,
    target_id: i32,
    reward: Reward,
    recipient: Option<i32>,
) -> std::result::Result<(), DbErr>
where
    R: ScoreCoinRelation,
    C: ConnectionTrait,
    <R::Entity as EntityTrait>::Model: IntoActiveModel<EntityActiveModel<R::Entity>>,
{
    R::Entity::insert(R::new_row(user_id, target_id, reward, Utc::now()))
        .exec_without_returning(conn)
        .await?;
    bump_counter::<R, _>(conn, target_id, true).await?;
    if let Some(recipient) = recipient {
        adjust_balance(
            conn,
            recipient,
            i64::from(reward.score),
            i64::from(reward.coin),
            0,
        )
        .await?;
    }
    Ok(())
}

async fn bump_counter<R, C>(
    conn: &C,
    target_id: i32,
    up: bool,
) -> std::result::Result<(), DbErr>
where
    R: ScoreCoinRelation,
    C: ConnectionTrait,
{
    let expr = if up {
        Expr::col(R::COUNTER_COLUMN).add(1)
    } else {
        Expr::col(R::COUNTER_COLUMN).sub(1)
    };
    R::Target::update_many()
        .col_expr(R::COUNTER_COLUMN, expr)
        .filter(R::TARGET_ID_COLUMN.eq(target_id))
        .exec(conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_status_codes() {
        assert_eq!(ToggleOutcome::Created.status(), 1);
        assert_eq!(ToggleOutcome::Removed.status(), -1);
    }

    #[test]
    fn recipients_follow_table() {
        assert_eq!(TutorialView::RECIPIENT, RewardRecipient::Actor);
        assert_eq!(TutorialLike::RECIPIENT, RewardRecipient::TargetOwner);
        assert_eq!(ExamLike::RECIPIENT, RewardRecipient::TargetOwner);
        assert_eq!(TutorialCommentLike::SCORE_KEY, "TUTORIAL_COMMENT_LIKE_SCORE");
        assert_eq!(TutorialDownVote::COIN_KEY, "TUTORIAL_DOWNVOTE_COIN");
    }
}
