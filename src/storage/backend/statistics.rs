//! Aggregates for the user panel dashboard.

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, ExprTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QuerySelect, QueryTrait, sea_query::Expr,
};
use serde::Serialize;

use super::SeaOrmStorage;
use super::tutorials::visible_condition;
use crate::errors::Result;
use crate::storage::models::ConfirmStatus;
use migration::entities::{tutorial, tutorial_comment, tutorial_view};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TutorialAggregate {
    pub tutorials_count: u64,
    pub likes_count: u64,
    pub views_count: u64,
    pub comments_count: u64,
}

#[derive(Debug, FromQueryResult)]
struct CounterTotals {
    tutorials_count: i64,
    likes_count: Option<i64>,
    views_count: Option<i64>,
}

#[derive(Debug, FromQueryResult)]
struct MonthBucket {
    bucket: i32,
    count: i64,
}

impl SeaOrmStorage {
    /// Totals over the author's active, confirmed tutorials.
    pub async fn tutorial_aggregate(&self, author_id: i32) -> Result<TutorialAggregate> {
        let totals = tutorial::Entity::find()
            .select_only()
            .column_as(tutorial::Column::Id.count(), "tutorials_count")
            .column_as(tutorial::Column::LikesCount.sum(), "likes_count")
            .column_as(tutorial::Column::UserViewsCount.sum(), "views_count")
            .filter(visible_condition())
            .filter(tutorial::Column::AuthorId.eq(author_id))
            .into_model::<CounterTotals>()
            .one(&self.db)
            .await?;

        let tutorials = tutorial::Entity::find()
            .select_only()
            .column(tutorial::Column::Id)
            .filter(visible_condition())
            .filter(tutorial::Column::AuthorId.eq(author_id))
            .into_query();
        let comments_count = tutorial_comment::Entity::find()
            .filter(tutorial_comment::Column::TutorialId.in_subquery(tutorials))
            .filter(tutorial_comment::Column::IsActive.eq(true))
            .filter(tutorial_comment::Column::ConfirmStatus.eq(ConfirmStatus::Confirmed.as_i32()))
            .count(&self.db)
            .await?;

        let (tutorials_count, likes_count, views_count) = totals
            .map(|t| {
                (
                    t.tutorials_count,
                    t.likes_count.unwrap_or(0),
                    t.views_count.unwrap_or(0),
                )
            })
            .unwrap_or_default();
        Ok(TutorialAggregate {
            tutorials_count: std::cmp::Ord::max(tutorials_count, 0) as u64,
            likes_count: std::cmp::Ord::max(likes_count, 0) as u64,
            views_count: std::cmp::Ord::max(views_count, 0) as u64,
            comments_count,
        })
    }

    /// Views recorded on the author's visible tutorials inside each `[start, end)` range.
    pub async fn monthly_view_counts(
        &self,
        author_id: i32,
        ranges: &[(DateTime<Utc>, DateTime<Utc>)],
    ) -> Result<Vec<u64>> {
        let mut cases = ranges.iter().enumerate().map(|(i, (start, end))| {
            (
                Condition::all()
                    .add(tutorial_view::Column::CreateDate.gte(*start))
                    .add(tutorial_view::Column::CreateDate.lt(*end)),
                i as i32,
            )
        });
        let Some((condition, index)) = cases.next() else {
            return Ok(Vec::new());
        };
        let mut case = Expr::case(condition, index);
        for (condition, index) in cases {
            case = case.case(condition, index);
        }
        let bucket: Expr = case.finally(-1).into();
        let (window_start, window_end) = (ranges[0].0, ranges[ranges.len() - 1].1);

        let tutorials = tutorial::Entity::find()
            .select_only()
            .column(tutorial::Column::Id)
            .filter(visible_condition())
            .filter(tutorial::Column::AuthorId.eq(author_id))
            .into_query();
        let rows = tutorial_view::Entity::find()
            .select_only()
            .column_as(bucket, "bucket")
            .column_as(tutorial_view::Column::Id.count(), "count")
            .filter(tutorial_view::Column::TutorialId.in_subquery(tutorials))
            .filter(tutorial_view::Column::CreateDate.gte(window_start))
            .filter(tutorial_view::Column::CreateDate.lt(window_end))
            .group_by(Expr::cust("bucket"))
            .into_model::<MonthBucket>()
            .all(&self.db)
            .await?;

        let mut counts = vec![0u64; ranges.len()];
        for row in rows {
            if let Some(slot) = usize::try_from(row.bucket)
                .ok()
                .and_then(|i| counts.get_mut(i))
            {
                *slot = std::cmp::Ord::max(row.count, 0) as u64;
            }
        }
        Ok(counts)
    }
}
