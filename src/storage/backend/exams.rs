//! Exams, questions, participations and grading.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, ExprTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use tracing::info;

use super::{SeaOrmStorage, adjust_balance, retry};
use crate::errors::{FieldErrors, MajazamoozError, Result};
use crate::storage::models::{AnswerStatus, ConfirmStatus, Page, ParticipationStatus};
use migration::entities::{
    exam, exam_category, exam_participation, participant_answer, question, user,
};

pub const MIN_DEADLINE_SECONDS: i64 = 60;

#[derive(Debug, Clone, Default)]
pub struct ExamFilter {
    pub search: Option<String>,
    pub visible_only: bool,
    pub confirm_status: Option<ConfirmStatus>,
    pub is_active: Option<bool>,
    pub designer_id: Option<i32>,
}

impl ExamFilter {
    pub fn visible() -> Self {
        Self {
            visible_only: true,
            ..Default::default()
        }
    }

    fn condition(&self) -> Condition {
        let mut condition = Condition::all();
        if self.visible_only {
            condition = condition
                .add(exam::Column::IsActive.eq(true))
                .add(exam::Column::ConfirmStatus.eq(ConfirmStatus::Confirmed.as_i32()));
        }
        if let Some(status) = self.confirm_status {
            condition = condition.add(exam::Column::ConfirmStatus.eq(status.as_i32()));
        }
        if let Some(is_active) = self.is_active {
            condition = condition.add(exam::Column::IsActive.eq(is_active));
        }
        if let Some(designer_id) = self.designer_id {
            condition = condition.add(exam::Column::DesignerId.eq(designer_id));
        }
        if let Some(ref search) = self.search {
            let search = search.trim();
            if !search.is_empty() {
                condition = condition.add(
                    Condition::any()
                        .add(exam::Column::Title.contains(search))
                        .add(exam::Column::ShortDescription.contains(search))
                        .add(exam::Column::FullDescription.contains(search)),
                );
            }
        }
        condition
    }
}

/// Exam settings, used both for creation and as the merged state of an update.
#[derive(Debug, Clone)]
pub struct NewExam {
    pub title: String,
    pub slug: String,
    pub short_description: String,
    pub full_description: String,
    pub deadline_duration_seconds: i64,
    pub waiting_duration_seconds: i64,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub coin_cost: i64,
    pub diamond_cost: i64,
    pub correct_score: i32,
    pub blank_score: i32,
    pub incorrect_score: i32,
    pub correct_coin: i32,
    pub designer_id: Option<i32>,
    pub category_ids: Vec<i32>,
}

impl NewExam {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();

        if self.title.trim().is_empty() {
            errors.add("title", "عنوان آزمون الزامی است");
        }
        if self.deadline_duration_seconds < MIN_DEADLINE_SECONDS {
            errors.add("deadline_duration_seconds", "مدت آزمون باید حداقل یک دقیقه باشد");
        }
        if self.waiting_duration_seconds < 0 {
            errors.add("waiting_duration_seconds", "زمان انتظار نمی تواند منفی باشد");
        }
        if self.coin_cost < 0 {
            errors.add("coin_cost", "هزینه سکه نمی تواند منفی باشد");
        }
        if self.diamond_cost < 0 {
            errors.add("diamond_cost", "هزینه الماس نمی تواند منفی باشد");
        }
        if self.correct_score < 1 {
            errors.add("correct_score", "امتیاز پاسخ صحیح باید حداقل ۱ باشد");
        }
        if self.incorrect_score > 0 {
            errors.add("incorrect_score", "امتیاز پاسخ غلط نمی تواند مثبت باشد");
        }
        if self.correct_coin < 1 {
            errors.add("correct_coin", "سکه پاسخ صحیح باید حداقل ۱ باشد");
        }
        if !(self.correct_score > self.blank_score && self.blank_score >= self.incorrect_score) {
            errors.add(
                "blank_score",
                "امتیاز پاسخ صحیح باید بیشتر از نزده و امتیاز نزده حداقل برابر غلط باشد",
            );
        }
        if let (Some(starts_at), Some(ends_at)) = (self.starts_at, self.ends_at) {
            if ends_at <= starts_at {
                errors.add("ends_at", "زمان پایان باید بعد از زمان شروع باشد");
            }
        }

        errors.into_result()
    }
}

impl From<&exam::Model> for NewExam {
    fn from(m: &exam::Model) -> Self {
        Self {
            title: m.title.clone(),
            slug: m.slug.clone(),
            short_description: m.short_description.clone(),
            full_description: m.full_description.clone(),
            deadline_duration_seconds: m.deadline_duration_seconds,
            waiting_duration_seconds: m.waiting_duration_seconds,
            starts_at: m.starts_at,
            ends_at: m.ends_at,
            coin_cost: m.coin_cost,
            diamond_cost: m.diamond_cost,
            correct_score: m.correct_score,
            blank_score: m.blank_score,
            incorrect_score: m.incorrect_score,
            correct_coin: m.correct_coin,
            designer_id: m.designer_id,
            category_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExamUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub short_description: Option<String>,
    pub full_description: Option<String>,
    pub deadline_duration_seconds: Option<i64>,
    pub waiting_duration_seconds: Option<i64>,
    pub starts_at: Option<Option<DateTime<Utc>>>,
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

impl ExamUpdate {
    fn apply(&self, mut base: NewExam) -> NewExam {
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(if let Some(ref v) = self.$field {
                    base.$field = v.clone();
                })*
            };
        }
        merge!(
            title,
            slug,
            short_description,
            full_description,
            deadline_duration_seconds,
            waiting_duration_seconds,
            starts_at,
            ends_at,
            coin_cost,
            diamond_cost,
            correct_score,
            blank_score,
            incorrect_score,
            correct_coin,
        );
        base
    }
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub text: String,
    pub choices: [String; 4],
    pub correct_choice: i32,
    pub correct_full_answer: String,
    pub is_active: bool,
}

impl NewQuestion {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        if self.text.trim().is_empty() {
            errors.add("text", "متن سوال الزامی است");
        }
        for (i, choice) in self.choices.iter().enumerate() {
            if choice.trim().is_empty() {
                errors.add(format!("choice_{}", i + 1), "متن گزینه الزامی است");
            }
        }
        if !(1..=4).contains(&self.correct_choice) {
            errors.add("correct_choice", "گزینه صحیح باید بین ۱ تا ۴ باشد");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuestionUpdate {
    pub text: Option<String>,
    pub choices: Option<[String; 4]>,
    pub correct_choice: Option<i32>,
    pub correct_full_answer: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipationQuery {
    Finalized,
    /// Not finalized, and the deadline plus waiting time has not passed.
    InProgress,
    /// Not finalized, and the deadline plus waiting time has passed.
    Expired,
}

/// Per-exam scoring rules.
#[derive(Debug, Clone, Copy)]
pub struct ScoringRules {
    pub correct_score: i32,
    pub blank_score: i32,
    pub incorrect_score: i32,
    pub correct_coin: i32,
}

impl From<&exam::Model> for ScoringRules {
    fn from(m: &exam::Model) -> Self {
        Self {
            correct_score: m.correct_score,
            blank_score: m.blank_score,
            incorrect_score: m.incorrect_score,
            correct_coin: m.correct_coin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeSummary {
    pub total_correct: i32,
    pub total_incorrect: i32,
    pub total_blank: i32,
    pub coin_earned: i64,
    pub score_earned: i64,
    pub score_max: i64,
    pub score_percent: f64,
}

/// Grade answered statuses against `question_count` questions.
///
/// Questions without a status count as blank.
pub fn grade(
    question_count: usize,
    statuses: impl IntoIterator<Item = AnswerStatus>,
    rules: ScoringRules,
) -> GradeSummary {
    let (mut correct, mut incorrect) = (0i64, 0i64);
    for status in statuses {
        match status {
            AnswerStatus::Correct => correct += 1,
            AnswerStatus::Incorrect => incorrect += 1,
            AnswerStatus::Blank => {}
        }
    }
    let questions = question_count as i64;
    let blank = std::cmp::Ord::max(questions - correct - incorrect, 0);

    let score_max = questions * i64::from(rules.correct_score);
    let score_earned = blank * i64::from(rules.blank_score)
        + correct * i64::from(rules.correct_score)
        + incorrect * i64::from(rules.incorrect_score);
    let score_percent = if score_max == 0 {
        0.0
    } else {
        ((score_earned as f64 / score_max as f64) * 100.0 * 100.0).round() / 100.0
    };

    GradeSummary {
        total_correct: correct as i32,
        total_incorrect: incorrect as i32,
        total_blank: blank as i32,
        coin_earned: correct * i64::from(rules.correct_coin),
        score_earned,
        score_max,
        score_percent,
    }
}

/// Latest moment answers are still accepted.
pub fn submission_closes_at(
    participation: &exam_participation::Model,
    waiting_duration_seconds: i64,
) -> Option<DateTime<Utc>> {
    participation
        .deadline
        .map(|d| d + Duration::seconds(waiting_duration_seconds))
}

impl SeaOrmStorage {
    pub async fn list_exams(
        &self,
        filter: ExamFilter,
        page: u64,
        page_size: u64,
    ) -> Result<Page<exam::Model>> {
        let page_size = std::cmp::Ord::max(page_size, 1);
        let condition = filter.condition();
        let db = &self.db;

        let cache_key = format!(
            "exams:s={:?}:v={}:cs={:?}:ia={:?}:d={:?}",
            filter.search,
            filter.visible_only,
            filter.confirm_status.map(ConfirmStatus::as_i32),
            filter.is_active,
            filter.designer_id
        );
        let cond = condition.clone();
        let total = self
            .cached_count(cache_key, "list_exams(count)", || async {
                exam::Entity::find().filter(cond.clone()).count(db).await
            })
            .await?;

        let items = exam::Entity::find()
            .filter(condition)
            .order_by_desc(exam::Column::CreateDate)
            .order_by_desc(exam::Column::Id)
            .paginate(db, page_size)
            .fetch_page(page.saturating_sub(1))
            .await?;

        Ok(Page::new(items, page, page_size, total))
    }

    pub async fn find_exam(&self, id: i32) -> Result<Option<exam::Model>> {
        let db = &self.db;
        Ok(retry::with_retry("find_exam", self.retry_config, || async {
            exam::Entity::find_by_id(id).one(db).await
        })
        .await?)
    }

    pub async fn find_visible_exam(&self, id: i32) -> Result<Option<exam::Model>> {
        Ok(exam::Entity::find_by_id(id)
            .filter(ExamFilter::visible().condition())
            .one(&self.db)
            .await?)
    }

    pub async fn find_visible_exam_by_slug(&self, slug: &str) -> Result<Option<exam::Model>> {
        Ok(exam::Entity::find()
            .filter(exam::Column::Slug.eq(slug))
            .filter(ExamFilter::visible().condition())
            .one(&self.db)
            .await?)
    }

    pub async fn exam_category_ids(&self, exam_id: i32) -> Result<Vec<i32>> {
        Ok(exam_category::Entity::find()
            .select_only()
            .column(exam_category::Column::CategoryId)
            .filter(exam_category::Column::ExamId.eq(exam_id))
            .into_tuple()
            .all(&self.db)
            .await?)
    }

    async fn unique_exam_slug(&self, base: &str, exclude_id: Option<i32>) -> Result<String> {
        let base = if base.is_empty() { "exam" } else { base };
        let mut candidate = base.to_string();
        let mut suffix = 2;
        loop {
            let mut query = exam::Entity::find().filter(exam::Column::Slug.eq(&candidate));
            if let Some(id) = exclude_id {
                query = query.filter(exam::Column::Id.ne(id));
            }
            if query.count(&self.db).await? == 0 {
                return Ok(candidate);
            }
            candidate = format!("{}-{}", base, suffix);
            suffix += 1;
        }
    }

    async fn ensure_exam_title_free(&self, title: &str, exclude_id: Option<i32>) -> Result<()> {
        let mut query = exam::Entity::find().filter(exam::Column::Title.eq(title));
        if let Some(id) = exclude_id {
            query = query.filter(exam::Column::Id.ne(id));
        }
        if query.count(&self.db).await? > 0 {
            return Err(MajazamoozError::invalid_field(
                "title",
                "آزمونی با این عنوان وجود دارد",
            ));
        }
        Ok(())
    }

    pub async fn create_exam(&self, new: NewExam) -> Result<exam::Model> {
        new.validate()?;
        self.ensure_exam_title_free(&new.title, None).await?;
        let slug = self.unique_exam_slug(&new.slug, None).await?;

        let txn = self.db.begin().await?;
        let created = exam::ActiveModel {
            title: Set(new.title),
            slug: Set(slug),
            short_description: Set(new.short_description),
            full_description: Set(new.full_description),
            deadline_duration_seconds: Set(new.deadline_duration_seconds),
            waiting_duration_seconds: Set(new.waiting_duration_seconds),
            starts_at: Set(new.starts_at),
            ends_at: Set(new.ends_at),
            coin_cost: Set(new.coin_cost),
            diamond_cost: Set(new.diamond_cost),
            correct_score: Set(new.correct_score),
            blank_score: Set(new.blank_score),
            incorrect_score: Set(new.incorrect_score),
            correct_coin: Set(new.correct_coin),
            confirm_status: Set(ConfirmStatus::Waiting.as_i32()),
            views_count: Set(0),
            likes_count: Set(0),
            is_active: Set(true),
            create_date: Set(Utc::now()),
            designer_id: Set(new.designer_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        replace_exam_categories(&txn, created.id, &new.category_ids).await?;
        txn.commit().await?;

        self.invalidate_count_cache();
        info!("Exam created: {} (id={})", created.slug, created.id);
        Ok(created)
    }

    pub async fn update_exam(&self, id: i32, update: ExamUpdate) -> Result<exam::Model> {
        let existing = self
            .find_exam(id)
            .await?
            .ok_or_else(|| MajazamoozError::not_found(format!("Exam {} not found", id)))?;

        let merged = update.apply(NewExam::from(&existing));
        merged.validate()?;
        if update.title.is_some() {
            self.ensure_exam_title_free(&merged.title, Some(id)).await?;
        }
        let slug = if update.slug.is_some() || update.title.is_some() {
            self.unique_exam_slug(&merged.slug, Some(id)).await?
        } else {
            existing.slug.clone()
        };

        let txn = self.db.begin().await?;
        let mut model: exam::ActiveModel = existing.into();
        model.title = Set(merged.title);
        model.slug = Set(slug);
        model.short_description = Set(merged.short_description);
        model.full_description = Set(merged.full_description);
        model.deadline_duration_seconds = Set(merged.deadline_duration_seconds);
        model.waiting_duration_seconds = Set(merged.waiting_duration_seconds);
        model.starts_at = Set(merged.starts_at);
        model.ends_at = Set(merged.ends_at);
        model.coin_cost = Set(merged.coin_cost);
        model.diamond_cost = Set(merged.diamond_cost);
        model.correct_score = Set(merged.correct_score);
        model.blank_score = Set(merged.blank_score);
        model.incorrect_score = Set(merged.incorrect_score);
        model.correct_coin = Set(merged.correct_coin);
        if let Some(is_active) = update.is_active {
            model.is_active = Set(is_active);
        }
        let updated = model.update(&txn).await?;
        if let Some(ref category_ids) = update.category_ids {
            replace_exam_categories(&txn, id, category_ids).await?;
        }
        txn.commit().await?;

        self.invalidate_count_cache();
        Ok(updated)
    }

    pub async fn set_exams_status(&self, ids: &[i32], status: ConfirmStatus) -> Result<Vec<i32>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let candidates: Vec<i32> = exam::Entity::find()
            .select_only()
            .column(exam::Column::Id)
            .filter(exam::Column::Id.is_in(ids.to_vec()))
            .filter(exam::Column::IsActive.eq(true))
            .filter(exam::Column::ConfirmStatus.ne(status.as_i32()))
            .into_tuple()
            .all(&self.db)
            .await?;
        if candidates.is_empty() {
            return Ok(candidates);
        }
        exam::Entity::update_many()
            .col_expr(exam::Column::ConfirmStatus, Expr::value(status.as_i32()))
            .filter(exam::Column::Id.is_in(candidates.clone()))
            .exec(&self.db)
            .await?;

        self.invalidate_count_cache();
        info!("Exams moved to status {}: {:?}", status.as_i32(), candidates);
        Ok(candidates)
    }

    pub async fn increment_exam_views(&self, id: i32) -> Result<()> {
        exam::Entity::update_many()
            .col_expr(
                exam::Column::ViewsCount,
                Expr::col(exam::Column::ViewsCount).add(1),
            )
            .filter(exam::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn create_question(&self, exam_id: i32, new: NewQuestion) -> Result<question::Model> {
        new.validate()?;
        self.find_exam(exam_id)
            .await?
            .ok_or_else(|| MajazamoozError::not_found(format!("Exam {} not found", exam_id)))?;

        let [choice_1, choice_2, choice_3, choice_4] = new.choices;
        let created = question::ActiveModel {
            exam_id: Set(exam_id),
            text: Set(new.text),
            choice_1: Set(choice_1),
            choice_2: Set(choice_2),
            choice_3: Set(choice_3),
            choice_4: Set(choice_4),
            correct_choice: Set(new.correct_choice),
            correct_full_answer: Set(new.correct_full_answer),
            is_active: Set(new.is_active),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(created)
    }

    pub async fn update_question(&self, id: i32, update: QuestionUpdate) -> Result<question::Model> {
        let existing = self
            .find_question(id)
            .await?
            .ok_or_else(|| MajazamoozError::not_found(format!("Question {} not found", id)))?;

        let merged = NewQuestion {
            text: update.text.unwrap_or_else(|| existing.text.clone()),
            choices: update.choices.unwrap_or_else(|| {
                [
                    existing.choice_1.clone(),
                    existing.choice_2.clone(),
                    existing.choice_3.clone(),
                    existing.choice_4.clone(),
                ]
            }),
            correct_choice: update.correct_choice.unwrap_or(existing.correct_choice),
            correct_full_answer: update
                .correct_full_answer
                .unwrap_or_else(|| existing.correct_full_answer.clone()),
            is_active: update.is_active.unwrap_or(existing.is_active),
        };
        merged.validate()?;

        let [choice_1, choice_2, choice_3, choice_4] = merged.choices;
        let mut model: question::ActiveModel = existing.into();
        model.text = Set(merged.text);
        model.choice_1 = Set(choice_1);
        model.choice_2 = Set(choice_2);
        model.choice_3 = Set(choice_3);
        model.choice_4 = Set(choice_4);
        model.correct_choice = Set(merged.correct_choice);
        model.correct_full_answer = Set(merged.correct_full_answer);
        model.is_active = Set(merged.is_active);
        Ok(model.update(&self.db).await?)
    }

    pub async fn find_question(&self, id: i32) -> Result<Option<question::Model>> {
        Ok(question::Entity::find_by_id(id).one(&self.db).await?)
    }

    pub async fn questions_of_exam(
        &self,
        exam_id: i32,
        active_only: bool,
    ) -> Result<Vec<question::Model>> {
        let mut query = question::Entity::find().filter(question::Column::ExamId.eq(exam_id));
        if active_only {
            query = query.filter(question::Column::IsActive.eq(true));
        }
        Ok(query
            .order_by_asc(question::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn has_participation(&self, user_id: i32, exam_id: i32) -> Result<bool> {
        Ok(exam_participation::Entity::find()
            .filter(exam_participation::Column::UserId.eq(user_id))
            .filter(exam_participation::Column::ExamId.eq(exam_id))
            .count(&self.db)
            .await?
            > 0)
    }

    pub async fn find_participation(&self, id: i32) -> Result<Option<exam_participation::Model>> {
        Ok(exam_participation::Entity::find_by_id(id)
            .one(&self.db)
            .await?)
    }

    /// Charge the exam costs and open a participation.
    pub async fn start_participation(
        &self,
        user_id: i32,
        exam_id: i32,
        now: DateTime<Utc>,
    ) -> Result<exam_participation::Model> {
        let exam = self
            .find_visible_exam(exam_id)
            .await?
            .ok_or_else(|| MajazamoozError::not_found(format!("Exam {} not found", exam_id)))?;

        if exam.starts_at.is_some_and(|s| now < s) {
            return Err(MajazamoozError::validation("آزمون هنوز شروع نشده است"));
        }
        if exam.ends_at.is_some_and(|e| now > e) {
            return Err(MajazamoozError::validation("زمان برگزاری آزمون به پایان رسیده است"));
        }

        let txn = self.db.begin().await?;

        // The guarded debit locks the user row, so a concurrent start waits
        // here and then sees the participation opened by the first one.
        let charged = user::Entity::update_many()
            .col_expr(
                user::Column::Coins,
                Expr::col(user::Column::Coins).sub(exam.coin_cost),
            )
            .col_expr(
                user::Column::Diamonds,
                Expr::col(user::Column::Diamonds).sub(exam.diamond_cost),
            )
            .filter(user::Column::Id.eq(user_id))
            .filter(user::Column::Coins.gte(exam.coin_cost))
            .filter(user::Column::Diamonds.gte(exam.diamond_cost))
            .exec(&txn)
            .await?;
        if charged.rows_affected == 0 {
            insufficient_balance(&txn, user_id, &exam).await?;
        }

        let open = exam_participation::Entity::find()
            .filter(exam_participation::Column::UserId.eq(user_id))
            .filter(exam_participation::Column::ExamId.eq(exam_id))
            .filter(participation_condition(
                ParticipationQuery::InProgress,
                now,
                exam.waiting_duration_seconds,
            ))
            .count(&txn)
            .await?;
        if open > 0 {
            return Err(MajazamoozError::conflict("شما در حال شرکت در این آزمون هستید"));
        }

        let by_duration = now + Duration::seconds(exam.deadline_duration_seconds);
        let deadline = match exam.ends_at {
            Some(ends_at) => std::cmp::Ord::min(by_duration, ends_at),
            None => by_duration,
        };

        let participation = exam_participation::ActiveModel {
            exam_id: Set(exam_id),
            user_id: Set(user_id),
            started_at: Set(now),
            finalized_at: Set(None),
            deadline: Set(Some(deadline)),
            total_correct: Set(0),
            total_incorrect: Set(0),
            total_blank: Set(0),
            coin_cost: Set(exam.coin_cost),
            coin_earned: Set(0),
            diamond_cost: Set(exam.diamond_cost),
            score_earned: Set(0),
            score_max: Set(0),
            score_percent: Set(0.0),
            mark_status: Set(ParticipationStatus::InProgress as i32),
            is_finalized: Set(false),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        info!(
            "Participation started: id={} exam={} user={} deadline={}",
            participation.id, exam_id, user_id, deadline
        );
        Ok(participation)
    }

    /// Record an answer; `None` clears it to blank.
    pub async fn upsert_answer(
        &self,
        participation_id: i32,
        question_id: i32,
        answer: Option<i32>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if let Some(choice) = answer {
            if !(1..=4).contains(&choice) {
                return Err(MajazamoozError::invalid_field(
                    "answer",
                    "گزینه انتخاب شده معتبر نیست",
                ));
            }
        }

        let (participation, exam) = self.open_participation(participation_id).await?;
        if participation.is_finalized {
            return Err(MajazamoozError::validation("آزمون قبلا پایان یافته است"));
        }
        if submission_closes_at(&participation, exam.waiting_duration_seconds)
            .is_some_and(|closes| now > closes)
        {
            return Err(MajazamoozError::validation("مهلت آزمون به پایان رسیده است."));
        }

        let belongs = question::Entity::find_by_id(question_id)
            .filter(question::Column::ExamId.eq(exam.id))
            .filter(question::Column::IsActive.eq(true))
            .count(&self.db)
            .await?
            > 0;
        if !belongs {
            return Err(MajazamoozError::invalid_field(
                "question_id",
                "سوال متعلق به این آزمون نیست",
            ));
        }

        let row = participant_answer::ActiveModel {
            participation_id: Set(participation_id),
            question_id: Set(question_id),
            participant_answer: Set(answer),
            correct_answer: Set(None),
            answer_status: Set(AnswerStatus::Blank as i32),
            ..Default::default()
        };
        participant_answer::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    participant_answer::Column::ParticipationId,
                    participant_answer::Column::QuestionId,
                ])
                .update_column(participant_answer::Column::ParticipantAnswer)
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    pub async fn answers_of_participation(
        &self,
        participation_id: i32,
    ) -> Result<Vec<participant_answer::Model>> {
        Ok(participant_answer::Entity::find()
            .filter(participant_answer::Column::ParticipationId.eq(participation_id))
            .order_by_asc(participant_answer::Column::QuestionId)
            .all(&self.db)
            .await?)
    }

    /// Close the participation, classify every answer and pay out.
    pub async fn finalize_and_grade(
        &self,
        participation_id: i32,
        now: DateTime<Utc>,
    ) -> Result<(exam_participation::Model, GradeSummary)> {
        let (participation, exam) = self.open_participation(participation_id).await?;
        if participation.is_finalized {
            return Err(MajazamoozError::validation("آزمون قبلا پایان یافته است"));
        }
        if submission_closes_at(&participation, exam.waiting_duration_seconds)
            .is_some_and(|closes| closes < now)
        {
            return Err(MajazamoozError::validation("مهلت آزمون به پایان رسیده است."));
        }

        let txn = self.db.begin().await?;

        // Claim the participation first; a concurrent finalize sees zero rows.
        let claimed = exam_participation::Entity::update_many()
            .col_expr(exam_participation::Column::IsFinalized, Expr::value(true))
            .col_expr(exam_participation::Column::FinalizedAt, Expr::value(now))
            .filter(exam_participation::Column::Id.eq(participation_id))
            .filter(exam_participation::Column::IsFinalized.eq(false))
            .exec(&txn)
            .await?;
        if claimed.rows_affected != 1 {
            return Err(MajazamoozError::validation("آزمون قبلا پایان یافته است"));
        }

        let questions: Vec<(i32, i32)> = question::Entity::find()
            .select_only()
            .column(question::Column::Id)
            .column(question::Column::CorrectChoice)
            .filter(question::Column::ExamId.eq(exam.id))
            .filter(question::Column::IsActive.eq(true))
            .into_tuple()
            .all(&txn)
            .await?;

        let answers = participant_answer::Entity::find()
            .filter(participant_answer::Column::ParticipationId.eq(participation_id))
            .all(&txn)
            .await?;

        let mut statuses = Vec::with_capacity(answers.len());
        for answer in answers {
            let correct = questions
                .iter()
                .find(|(id, _)| *id == answer.question_id)
                .map(|(_, c)| *c);
            let status = AnswerStatus::classify(answer.participant_answer, correct);
            if correct.is_some() {
                statuses.push(status);
            }
            let mut model: participant_answer::ActiveModel = answer.into();
            model.correct_answer = Set(correct);
            model.answer_status = Set(status as i32);
            model.update(&txn).await?;
        }

        let summary = grade(questions.len(), statuses, ScoringRules::from(&exam));

        let mut model: exam_participation::ActiveModel = participation.into();
        model.total_correct = Set(summary.total_correct);
        model.total_incorrect = Set(summary.total_incorrect);
        model.total_blank = Set(summary.total_blank);
        model.coin_earned = Set(summary.coin_earned);
        model.score_earned = Set(summary.score_earned);
        model.score_max = Set(summary.score_max);
        model.score_percent = Set(summary.score_percent);
        model.mark_status = Set(ParticipationStatus::Completed as i32);
        model.is_finalized = Set(true);
        model.finalized_at = Set(Some(now));
        let updated = model.update(&txn).await?;

        adjust_balance(
            &txn,
            updated.user_id,
            summary.score_earned,
            summary.coin_earned,
            0,
        )
        .await?;

        txn.commit().await?;
        info!(
            "Participation {} graded: {}/{} ({}%), coins +{}",
            participation_id,
            summary.score_earned,
            summary.score_max,
            summary.score_percent,
            summary.coin_earned
        );
        Ok((updated, summary))
    }

    async fn open_participation(
        &self,
        participation_id: i32,
    ) -> Result<(exam_participation::Model, exam::Model)> {
        let participation = self.find_participation(participation_id).await?.ok_or_else(|| {
            MajazamoozError::not_found(format!("Participation {} not found", participation_id))
        })?;
        let exam = self.find_exam(participation.exam_id).await?.ok_or_else(|| {
            MajazamoozError::not_found(format!("Exam {} not found", participation.exam_id))
        })?;
        Ok((participation, exam))
    }

    /// Participations of a user, newest first.
    pub async fn list_participations(
        &self,
        user_id: i32,
        query: ParticipationQuery,
        now: DateTime<Utc>,
        page: u64,
        page_size: u64,
    ) -> Result<Page<exam_participation::Model>> {
        let page_size = std::cmp::Ord::max(page_size, 1);
        let mut select = exam_participation::Entity::find()
            .filter(exam_participation::Column::UserId.eq(user_id));

        select = match query {
            ParticipationQuery::Finalized => {
                select.filter(exam_participation::Column::IsFinalized.eq(true))
            }
            ParticipationQuery::InProgress | ParticipationQuery::Expired => {
                let exams: Vec<(i32, i64)> = exam::Entity::find()
                    .select_only()
                    .column(exam::Column::Id)
                    .column(exam::Column::WaitingDurationSeconds)
                    .into_tuple()
                    .all(&self.db)
                    .await?;
                let mut any = Condition::any();
                for (exam_id, waiting) in exams {
                    any = any.add(
                        Condition::all()
                            .add(exam_participation::Column::ExamId.eq(exam_id))
                            .add(participation_condition(query, now, waiting)),
                    );
                }
                select.filter(any)
            }
        };

        let paginator = select
            .order_by_desc(exam_participation::Column::StartedAt)
            .order_by_desc(exam_participation::Column::Id)
            .paginate(&self.db, page_size);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok(Page::new(items, page, page_size, total))
    }
}

/// Explain a debit that matched no row. Some drivers report zero affected
/// rows for a zero-cost update, so a funded user passes through.
async fn insufficient_balance(
    txn: &DatabaseTransaction,
    user_id: i32,
    exam: &exam::Model,
) -> Result<()> {
    let participant = user::Entity::find_by_id(user_id)
        .one(txn)
        .await?
        .ok_or_else(|| MajazamoozError::not_found(format!("User {} not found", user_id)))?;
    if participant.coins < exam.coin_cost {
        return Err(MajazamoozError::validation("سکه کافی ندارید"));
    }
    if participant.diamonds < exam.diamond_cost {
        return Err(MajazamoozError::validation("الماس کافی ندارید"));
    }
    Ok(())
}

fn participation_condition(
    query: ParticipationQuery,
    now: DateTime<Utc>,
    waiting_duration_seconds: i64,
) -> Condition {
    let cutoff = now - Duration::seconds(waiting_duration_seconds);
    match query {
        ParticipationQuery::Finalized => {
            Condition::all().add(exam_participation::Column::IsFinalized.eq(true))
        }
        ParticipationQuery::InProgress => Condition::all()
            .add(exam_participation::Column::IsFinalized.eq(false))
            .add(
                Condition::any()
                    .add(exam_participation::Column::Deadline.is_null())
                    .add(exam_participation::Column::Deadline.gte(cutoff)),
            ),
        ParticipationQuery::Expired => Condition::all()
            .add(exam_participation::Column::IsFinalized.eq(false))
            .add(exam_participation::Column::Deadline.lt(cutoff)),
    }
}

async fn replace_exam_categories(
    txn: &DatabaseTransaction,
    exam_id: i32,
    category_ids: &[i32],
) -> Result<()> {
    let mut unique = category_ids.to_vec();
    unique.sort_unstable();
    unique.dedup();

    exam_category::Entity::delete_many()
        .filter(exam_category::Column::ExamId.eq(exam_id))
        .exec(txn)
        .await?;
    if unique.is_empty() {
        return Ok(());
    }
    let rows = unique.into_iter().map(|category_id| exam_category::ActiveModel {
        exam_id: Set(exam_id),
        category_id: Set(category_id),
    });
    exam_category::Entity::insert_many(rows)
        .exec_without_returning(txn)
        .await?;
    Ok(())
}
