//! Likes, votes and views.

use std::sync::Arc;

use tracing::info;

use crate::config::{RuntimeConfig, keys};
use crate::errors::{MajazamoozError, Result};
use crate::storage::backend::relations::{
    ExamLike, RelationRow, RelationScope, Reward, ScoreCoinRelation, ToggleOutcome,
    TutorialCommentDownVote, TutorialCommentLike, TutorialCommentUpVote, TutorialDownVote,
    TutorialLike, TutorialUpVote, TutorialView,
};
use crate::storage::{Page, SeaOrmStorage};
use migration::entities::tutorial;

/// Relation lists shown in the user panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationList {
    /// Views of my tutorials by other users.
    TutorialViewsByOthers,
    TutorialLikesByOthers,
    TutorialLikesByMe,
    CommentLikesByOthers,
    CommentLikesByMe,
}

pub struct ReactionService {
    storage: Arc<SeaOrmStorage>,
    runtime: Arc<RuntimeConfig>,
}

impl ReactionService {
    pub fn new(storage: Arc<SeaOrmStorage>, runtime: Arc<RuntimeConfig>) -> Self {
        Self { storage, runtime }
    }

    async fn toggle<R>(&self, user_id: i32, target_id: i32) -> Result<ToggleOutcome>
    where
        R: ScoreCoinRelation,
        <R::Entity as sea_orm::EntityTrait>::Model:
            sea_orm::IntoActiveModel<<R::Entity as sea_orm::EntityTrait>::ActiveModel>,
    {
        let reward = Reward::from_runtime::<R>(&self.runtime);
        self.storage
            .toggle_relation::<R>(user_id, target_id, reward)
            .await
    }

    async fn ensure_visible_tutorial(&self, tutorial_id: i32) -> Result<()> {
        self.storage
            .find_visible_tutorial(tutorial_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| MajazamoozError::not_found("آموزش مورد نظر یافت نشد"))
    }

    async fn ensure_visible_comment(&self, comment_id: i32) -> Result<()> {
        self.storage
            .find_visible_comment(comment_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| MajazamoozError::not_found("دیدگاه مورد نظر یافت نشد"))
    }

    pub async fn toggle_tutorial_like(&self, user_id: i32, tutorial_id: i32) -> Result<ToggleOutcome> {
        self.ensure_visible_tutorial(tutorial_id).await?;
        self.toggle::<TutorialLike>(user_id, tutorial_id).await
    }

    pub async fn toggle_tutorial_upvote(
        &self,
        user_id: i32,
        tutorial_id: i32,
    ) -> Result<ToggleOutcome> {
        self.ensure_visible_tutorial(tutorial_id).await?;
        self.toggle::<TutorialUpVote>(user_id, tutorial_id).await
    }

    pub async fn toggle_tutorial_downvote(
        &self,
        user_id: i32,
        tutorial_id: i32,
    ) -> Result<ToggleOutcome> {
        self.ensure_visible_tutorial(tutorial_id).await?;
        self.toggle::<TutorialDownVote>(user_id, tutorial_id).await
    }

    pub async fn toggle_comment_like(&self, user_id: i32, comment_id: i32) -> Result<ToggleOutcome> {
        self.ensure_visible_comment(comment_id).await?;
        self.toggle::<TutorialCommentLike>(user_id, comment_id).await
    }

    pub async fn toggle_comment_upvote(
        &self,
        user_id: i32,
        comment_id: i32,
    ) -> Result<ToggleOutcome> {
        self.ensure_visible_comment(comment_id).await?;
        self.toggle::<TutorialCommentUpVote>(user_id, comment_id)
            .await
    }

    pub async fn toggle_comment_downvote(
        &self,
        user_id: i32,
        comment_id: i32,
    ) -> Result<ToggleOutcome> {
        self.ensure_visible_comment(comment_id).await?;
        self.toggle::<TutorialCommentDownVote>(user_id, comment_id)
            .await
    }

    /// Only participants may like an exam, and never its designer.
    pub async fn toggle_exam_like(&self, user_id: i32, exam_id: i32) -> Result<ToggleOutcome> {
        let exam = self
            .storage
            .find_visible_exam(exam_id)
            .await?
            .ok_or_else(|| MajazamoozError::not_found("آزمون مورد نظر یافت نشد"))?;

        if exam.designer_id == Some(user_id) {
            return Err(MajazamoozError::forbidden(
                "طراح آزمون نمی تواند آزمون خود را پسند کند",
            ));
        }
        if !self.storage.has_participation(user_id, exam_id).await? {
            return Err(MajazamoozError::forbidden(
                "برای پسندیدن آزمون ابتدا باید در آن شرکت کنید",
            ));
        }

        self.toggle::<ExamLike>(user_id, exam_id).await
    }

    /// Count a page view. Returns `true` when a first view by this user was recorded.
    ///
    /// Anonymous viewers and the author only bump `total_views_count`.
    pub async fn record_tutorial_view(
        &self,
        viewer_id: Option<i32>,
        tutorial: &tutorial::Model,
    ) -> Result<bool> {
        self.storage.increment_total_views(tutorial.id).await?;

        let Some(viewer_id) = viewer_id.filter(|id| tutorial.author_id != Some(*id)) else {
            return Ok(false);
        };

        let reward = Reward::from_runtime::<TutorialView>(&self.runtime);
        let created = self
            .storage
            .create_relation_if_absent::<TutorialView>(viewer_id, tutorial.id, reward)
            .await?;
        if created {
            info!(
                "First view of tutorial {} by user {} rewarded {:?}",
                tutorial.id, viewer_id, reward
            );
        }
        Ok(created)
    }

    pub async fn relation_list(
        &self,
        user_id: i32,
        list: RelationList,
        page: u64,
    ) -> Result<Page<RelationRow>> {
        let page = page.max(1);
        let size = self.runtime.get_positive_or(keys::USER_PANEL_PAGINATE_BY, 15);
        let storage = &self.storage;
        match list {
            RelationList::TutorialViewsByOthers => {
                storage
                    .relation_rows::<TutorialView>(RelationScope::OnTargetsOf(user_id), page, size)
                    .await
            }
            RelationList::TutorialLikesByOthers => {
                storage
                    .relation_rows::<TutorialLike>(RelationScope::OnTargetsOf(user_id), page, size)
                    .await
            }
            RelationList::TutorialLikesByMe => {
                storage
                    .relation_rows::<TutorialLike>(RelationScope::CreatedBy(user_id), page, size)
                    .await
            }
            RelationList::CommentLikesByOthers => {
                storage
                    .relation_rows::<TutorialCommentLike>(
                        RelationScope::OnTargetsOf(user_id),
                        page,
                        size,
                    )
                    .await
            }
            RelationList::CommentLikesByMe => {
                storage
                    .relation_rows::<TutorialCommentLike>(
                        RelationScope::CreatedBy(user_id),
                        page,
                        size,
                    )
                    .await
            }
        }
    }
}
