//! User panel dashboard: goal progress and monthly views.

use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;

use super::dto::TutorialSummary;
use crate::config::{RuntimeConfig, keys};
use crate::errors::{MajazamoozError, Result};
use crate::storage::SeaOrmStorage;
use crate::storage::backend::TutorialAggregate;
use crate::utils::jalali::{self, JalaliMonth};

pub const PANEL_LATEST_TUTORIALS: u64 = 5;

/// Progress towards a goal, capped at 100.
///
/// A zero goal counts as reached.
pub fn goal_percent(value: u64, goal: i64) -> u32 {
    if goal <= 0 || value > goal as u64 {
        return 100;
    }
    ((value as f64 / goal as f64) * 100.0).ceil() as u32
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct GoalProgress {
    pub value: u64,
    pub goal: i64,
    pub percent: u32,
}

impl GoalProgress {
    fn new(value: u64, goal: i64) -> Self {
        Self {
            value,
            goal,
            percent: goal_percent(value, goal),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyViews {
    pub year: i32,
    pub month: i32,
    pub label: String,
    pub views: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PanelHome {
    pub tutorials: GoalProgress,
    pub likes: GoalProgress,
    pub views: GoalProgress,
    pub comments: GoalProgress,
    /// Oldest month first.
    pub monthly_views: Vec<MonthlyViews>,
    pub latest_tutorials: Vec<TutorialSummary>,
}

pub struct StatisticsService {
    storage: Arc<SeaOrmStorage>,
    runtime: Arc<RuntimeConfig>,
    timezone: FixedOffset,
}

impl StatisticsService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        runtime: Arc<RuntimeConfig>,
        timezone: FixedOffset,
    ) -> Self {
        Self {
            storage,
            runtime,
            timezone,
        }
    }

    pub async fn panel_home(&self, user_id: i32) -> Result<PanelHome> {
        self.panel_home_on(user_id, jalali::today_in(self.timezone))
            .await
    }

    /// Dashboard as seen on `today` in the site's timezone.
    pub async fn panel_home_on(&self, user_id: i32, today: NaiveDate) -> Result<PanelHome> {
        let user = self
            .storage
            .find_user(user_id)
            .await?
            .ok_or_else(|| MajazamoozError::not_found("کاربر یافت نشد"))?;

        let TutorialAggregate {
            tutorials_count,
            likes_count,
            views_count,
            comments_count,
        } = self.storage.tutorial_aggregate(user_id).await?;

        let monthly_views = self.monthly_views(user_id, today).await?;

        let latest = self
            .storage
            .latest_tutorials_of_author(user_id, PANEL_LATEST_TUTORIALS)
            .await?;
        let ids: Vec<i32> = latest.iter().map(|t| t.id).collect();
        let counts = self.storage.comments_count_map(&ids).await?;

        Ok(PanelHome {
            tutorials: GoalProgress::new(tutorials_count, user.tutorials_count_goal),
            likes: GoalProgress::new(likes_count, user.likes_count_goal),
            views: GoalProgress::new(views_count, user.views_count_goal),
            comments: GoalProgress::new(comments_count, user.comments_count_goal),
            monthly_views,
            latest_tutorials: latest
                .iter()
                .map(|t| TutorialSummary::new(t, counts.get(&t.id).copied().unwrap_or(0)))
                .collect(),
        })
    }

    async fn monthly_views(&self, user_id: i32, today: NaiveDate) -> Result<Vec<MonthlyViews>> {
        let count = self
            .runtime
            .get_positive_or(keys::USER_PANEL_STATISTICS_LAST_MONTH_COUNT, 5) as usize;
        let mut months: Vec<JalaliMonth> = jalali::last_months(count, today)?;
        months.reverse();

        let ranges: Vec<_> = months
            .iter()
            .map(|m| m.utc_bounds(self.timezone))
            .collect();
        let views = self.storage.monthly_view_counts(user_id, &ranges).await?;

        Ok(months
            .into_iter()
            .zip(views)
            .map(|(m, views)| MonthlyViews {
                year: m.year,
                month: m.month,
                label: m.label,
                views,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_percent_rounds_up() {
        assert_eq!(goal_percent(1, 3), 34);
        assert_eq!(goal_percent(3, 3), 100);
        assert_eq!(goal_percent(0, 10), 0);
    }

    #[test]
    fn goal_percent_caps() {
        assert_eq!(goal_percent(5, 0), 100);
        assert_eq!(goal_percent(0, 0), 100);
        assert_eq!(goal_percent(11, 10), 100);
    }
}
