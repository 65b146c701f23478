//! Exams: catalogue, participation, answering and staff authoring.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::dto::{ExamView, double_option};
use crate::config::{RuntimeConfig, keys};
use crate::errors::{MajazamoozError, Result};
use crate::storage::backend::relations::ExamLike;
use crate::storage::backend::{
    ExamFilter, ExamUpdate, NewExam, NewQuestion, ParticipationQuery, QuestionUpdate,
    submission_closes_at,
};
use crate::storage::{AnswerStatus, Page, ParticipationStatus, SeaOrmStorage};
use crate::utils::slugify;
use migration::entities::{exam, exam_participation, question};

// ============ Request DTOs ============

#[derive(Debug, Clone, Deserialize)]
pub struct ExamForm {
    pub title: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub full_description: String,
    pub deadline_duration_seconds: i64,
    #[serde(default = "default_waiting_seconds")]
    pub waiting_duration_seconds: i64,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub coin_cost: i64,
    #[serde(default)]
    pub diamond_cost: i64,
    #[serde(default = "default_correct_score")]
    pub correct_score: i32,
    #[serde(default)]
    pub blank_score: i32,
    #[serde(default = "default_incorrect_score")]
    pub incorrect_score: i32,
    #[serde(default = "default_correct_coin")]
    pub correct_coin: i32,
    #[serde(default)]
    pub category_ids: Vec<i32>,
}

fn default_waiting_seconds() -> i64 {
    60
}

fn default_correct_score() -> i32 {
    3
}

fn default_incorrect_score() -> i32 {
    -1
}

fn default_correct_coin() -> i32 {
    3
}

impl ExamForm {
    fn into_new_exam(self, designer_id: Option<i32>) -> NewExam {
        NewExam {
            slug: slugify(&self.title),
            title: self.title.trim().to_string(),
            short_description: self.short_description,
            full_description: self.full_description,
            deadline_duration_seconds: self.deadline_duration_seconds,
            waiting_duration_seconds: self.waiting_duration_seconds,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            coin_cost: self.coin_cost,
            diamond_cost: self.diamond_cost,
            correct_score: self.correct_score,
            blank_score: self.blank_score,
            incorrect_score: self.incorrect_score,
            correct_coin: self.correct_coin,
            designer_id,
            category_ids: self.category_ids,
        }
    }
}

/// Partial exam edit. `null` clears `starts_at`/`ends_at`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExamPatch {
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub full_description: Option<String>,
    pub deadline_duration_seconds: Option<i64>,
    pub waiting_duration_seconds: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub starts_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub ends_at: Option<Option<DateTime<Utc>>>,
    pub coin_cost: Option<i64>,
    pub diamond_cost: Option<i64>,
    pub correct_score: Option<i32>,
    pub blank_score: Option<i32>,
    pub incorrect_score: Option<i32>,
    pub correct_coin: Option<i32>,
    pub is_active: Option<bool>,
    pub category_ids: Option<Vec<i32>>,
}

impl From<ExamPatch> for ExamUpdate {
    fn from(p: ExamPatch) -> Self {
        Self {
            slug: p.title.as_deref().map(slugify),
            title: p.title.map(|t| t.trim().to_string()),
            short_description: p.short_description,
            full_description: p.full_description,
            deadline_duration_seconds: p.deadline_duration_seconds,
            waiting_duration_seconds: p.waiting_duration_seconds,
            starts_at: p.starts_at,
            ends_at: p.ends_at,
            coin_cost: p.coin_cost,
            diamond_cost: p.diamond_cost,
            correct_score: p.correct_score,
            blank_score: p.blank_score,
            incorrect_score: p.incorrect_score,
            correct_coin: p.correct_coin,
            is_active: p.is_active,
            category_ids: p.category_ids,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionForm {
    pub text: String,
    pub choice_1: String,
    pub choice_2: String,
    pub choice_3: String,
    pub choice_4: String,
    pub correct_choice: i32,
    #[serde(default)]
    pub correct_full_answer: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl From<QuestionForm> for NewQuestion {
    fn from(f: QuestionForm) -> Self {
        Self {
            text: f.text,
            choices: [f.choice_1, f.choice_2, f.choice_3, f.choice_4],
            correct_choice: f.correct_choice,
            correct_full_answer: f.correct_full_answer,
            is_active: f.is_active,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionPatch {
    pub text: Option<String>,
    pub choices: Option<[String; 4]>,
    pub correct_choice: Option<i32>,
    pub correct_full_answer: Option<String>,
    pub is_active: Option<bool>,
}

impl From<QuestionPatch> for QuestionUpdate {
    fn from(p: QuestionPatch) -> Self {
        Self {
            text: p.text,
            choices: p.choices,
            correct_choice: p.correct_choice,
            correct_full_answer: p.correct_full_answer,
            is_active: p.is_active,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerInput {
    pub question_id: i32,
    /// `None` leaves the question blank.
    pub answer: Option<i32>,
}

// ============ Response DTOs ============

#[derive(Debug, Clone, Serialize)]
pub struct ExamDetails {
    pub exam: ExamView,
    pub category_ids: Vec<i32>,
    pub question_count: usize,
    pub participated: bool,
    pub liked_by_current_user: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipationSummary {
    pub id: i32,
    pub exam_id: i32,
    pub started_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub mark_status: ParticipationStatus,
    pub is_finalized: bool,
    pub coin_cost: i64,
    pub diamond_cost: i64,
    pub total_correct: i32,
    pub total_incorrect: i32,
    pub total_blank: i32,
    pub coin_earned: i64,
    pub score_earned: i64,
    pub score_max: i64,
    pub score_percent: f64,
}

impl From<&exam_participation::Model> for ParticipationSummary {
    fn from(p: &exam_participation::Model) -> Self {
        Self {
            id: p.id,
            exam_id: p.exam_id,
            started_at: p.started_at,
            deadline: p.deadline,
            finalized_at: p.finalized_at,
            mark_status: ParticipationStatus::from_i32(p.mark_status),
            is_finalized: p.is_finalized,
            coin_cost: p.coin_cost,
            diamond_cost: p.diamond_cost,
            total_correct: p.total_correct,
            total_incorrect: p.total_incorrect,
            total_blank: p.total_blank,
            coin_earned: p.coin_earned,
            score_earned: p.score_earned,
            score_max: p.score_max,
            score_percent: p.score_percent,
        }
    }
}

/// A question as the participant sees it. Correct answers appear only once
/// the participation is graded.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: i32,
    pub text: String,
    pub choices: [String; 4],
    pub your_answer: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_choice: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_full_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_status: Option<AnswerStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipationView {
    pub participation: ParticipationSummary,
    pub exam: ExamView,
    /// Last moment answers are accepted.
    pub closes_at: Option<DateTime<Utc>>,
    pub questions: Vec<QuestionView>,
}

// ============ ExamService Implementation ============

pub struct ExamService {
    storage: Arc<SeaOrmStorage>,
    runtime: Arc<RuntimeConfig>,
}

impl ExamService {
    pub fn new(storage: Arc<SeaOrmStorage>, runtime: Arc<RuntimeConfig>) -> Self {
        Self { storage, runtime }
    }

    fn page_size(&self) -> u64 {
        self.runtime.get_positive_or(keys::USER_PANEL_PAGINATE_BY, 15)
    }

    pub async fn list(&self, search: Option<String>, page: u64) -> Result<Page<ExamView>> {
        let filter = ExamFilter {
            search,
            ..ExamFilter::visible()
        };
        let page = self
            .storage
            .list_exams(filter, page.max(1), self.page_size())
            .await?;
        Ok(page.map(|e| ExamView::from(&e)))
    }

    /// Visible exam page; counts the view.
    pub async fn details(&self, slug: &str, viewer_id: Option<i32>) -> Result<ExamDetails> {
        let exam = self
            .storage
            .find_visible_exam_by_slug(slug)
            .await?
            .ok_or_else(|| MajazamoozError::not_found("آزمون مورد نظر یافت نشد"))?;
        self.storage.increment_exam_views(exam.id).await?;

        let category_ids = self.storage.exam_category_ids(exam.id).await?;
        let question_count = self.storage.questions_of_exam(exam.id, true).await?.len();
        let (participated, liked_by_current_user) = match viewer_id {
            Some(user_id) => (
                self.storage.has_participation(user_id, exam.id).await?,
                self.storage
                    .relation_exists::<ExamLike>(user_id, exam.id)
                    .await?,
            ),
            None => (false, false),
        };

        let mut view = ExamView::from(&exam);
        view.views_count += 1;
        Ok(ExamDetails {
            exam: view,
            category_ids,
            question_count,
            participated,
            liked_by_current_user,
        })
    }

    pub async fn start(&self, user_id: i32, exam_id: i32) -> Result<ParticipationSummary> {
        let participation = self
            .storage
            .start_participation(user_id, exam_id, Utc::now())
            .await?;
        Ok(ParticipationSummary::from(&participation))
    }

    async fn owned_participation(
        &self,
        user_id: i32,
        participation_id: i32,
    ) -> Result<exam_participation::Model> {
        self.storage
            .find_participation(participation_id)
            .await?
            .filter(|p| p.user_id == user_id)
            .ok_or_else(|| MajazamoozError::not_found("شرکت در آزمون یافت نشد"))
    }

    pub async fn submit_answers(
        &self,
        user_id: i32,
        participation_id: i32,
        answers: Vec<AnswerInput>,
    ) -> Result<usize> {
        self.owned_participation(user_id, participation_id).await?;
        let now = Utc::now();
        let count = answers.len();
        for input in answers {
            self.storage
                .upsert_answer(participation_id, input.question_id, input.answer, now)
                .await?;
        }
        Ok(count)
    }

    pub async fn finalize(&self, user_id: i32, participation_id: i32) -> Result<ParticipationSummary> {
        self.owned_participation(user_id, participation_id).await?;
        let (participation, _) = self
            .storage
            .finalize_and_grade(participation_id, Utc::now())
            .await?;
        Ok(ParticipationSummary::from(&participation))
    }

    pub async fn view_participation(
        &self,
        user_id: i32,
        participation_id: i32,
    ) -> Result<ParticipationView> {
        let participation = self.owned_participation(user_id, participation_id).await?;
        let exam = self
            .storage
            .find_exam(participation.exam_id)
            .await?
            .ok_or_else(|| MajazamoozError::not_found("آزمون مورد نظر یافت نشد"))?;

        let graded = participation.is_finalized
            && ParticipationStatus::from_i32(participation.mark_status)
                == ParticipationStatus::Completed;
        let answers: HashMap<i32, _> = self
            .storage
            .answers_of_participation(participation_id)
            .await?
            .into_iter()
            .map(|a| (a.question_id, a))
            .collect();
        let questions = self.storage.questions_of_exam(exam.id, true).await?;

        let questions = questions
            .into_iter()
            .map(|q| {
                let answer = answers.get(&q.id);
                question_view(q, answer.and_then(|a| a.participant_answer), graded)
            })
            .collect();

        Ok(ParticipationView {
            participation: ParticipationSummary::from(&participation),
            closes_at: submission_closes_at(&participation, exam.waiting_duration_seconds),
            exam: ExamView::from(&exam),
            questions,
        })
    }

    pub async fn list_participations(
        &self,
        user_id: i32,
        query: ParticipationQuery,
        page: u64,
    ) -> Result<Page<ParticipationSummary>> {
        let page = self
            .storage
            .list_participations(user_id, query, Utc::now(), page.max(1), self.page_size())
            .await?;
        Ok(page.map(|p| ParticipationSummary::from(&p)))
    }

    // ============ Staff authoring ============

    pub async fn create_exam(&self, designer_id: i32, form: ExamForm) -> Result<exam::Model> {
        let created = self
            .storage
            .create_exam(form.into_new_exam(Some(designer_id)))
            .await?;
        info!("ExamService: user {} created exam {}", designer_id, created.id);
        Ok(created)
    }

    pub async fn update_exam(&self, id: i32, patch: ExamPatch) -> Result<exam::Model> {
        self.storage.update_exam(id, patch.into()).await
    }

    pub async fn create_question(&self, exam_id: i32, form: QuestionForm) -> Result<question::Model> {
        self.storage.create_question(exam_id, form.into()).await
    }

    pub async fn update_question(&self, id: i32, patch: QuestionPatch) -> Result<question::Model> {
        self.storage.update_question(id, patch.into()).await
    }
}

fn question_view(q: question::Model, your_answer: Option<i32>, graded: bool) -> QuestionView {
    let (correct_choice, correct_full_answer, answer_status) = if graded {
        (
            Some(q.correct_choice),
            Some(q.correct_full_answer),
            Some(AnswerStatus::classify(your_answer, Some(q.correct_choice))),
        )
    } else {
        (None, None, None)
    };
    QuestionView {
        id: q.id,
        text: q.text,
        choices: [q.choice_1, q.choice_2, q.choice_3, q.choice_4],
        your_answer,
        correct_choice,
        correct_full_answer,
        answer_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> question::Model {
        question::Model {
            id: 1,
            exam_id: 1,
            text: "۲ + ۲ ؟".into(),
            choice_1: "۳".into(),
            choice_2: "۴".into(),
            choice_3: "۵".into(),
            choice_4: "۶".into(),
            correct_choice: 2,
            correct_full_answer: "چهار".into(),
            is_active: true,
        }
    }

    #[test]
    fn hides_answers_until_graded() {
        let view = question_view(question(), Some(1), false);
        assert_eq!(view.correct_choice, None);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("correct_choice").is_none());
        assert_eq!(json["your_answer"], 1);

        let view = question_view(question(), Some(1), true);
        assert_eq!(view.correct_choice, Some(2));
        assert_eq!(view.answer_status, Some(AnswerStatus::Incorrect));
        let view = question_view(question(), None, true);
        assert_eq!(view.answer_status, Some(AnswerStatus::Blank));
    }

    #[test]
    fn exam_form_defaults() {
        let form: ExamForm = serde_json::from_str(
            r#"{"title": "آزمون راست", "deadline_duration_seconds": 600}"#,
        )
        .unwrap();
        let new = form.into_new_exam(Some(3));
        assert_eq!(new.slug, "آزمون-راست");
        assert_eq!(new.waiting_duration_seconds, 60);
        assert_eq!((new.correct_score, new.blank_score, new.incorrect_score), (3, 0, -1));
        assert_eq!(new.correct_coin, 3);
        assert!(new.validate().is_ok());
    }

    #[test]
    fn patch_retitle_reslugs() {
        let update: ExamUpdate = ExamPatch {
            title: Some(" New Title ".into()),
            ends_at: Some(None),
            ..Default::default()
        }
        .into();
        assert_eq!(update.slug.as_deref(), Some("new-title"));
        assert_eq!(update.title.as_deref(), Some("New Title"));
        assert_eq!(update.ends_at, Some(None));
    }
}
