//! Exam participation: starting, answering, grading and payouts.

mod common;

use chrono::{Duration, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, sea_query::Expr};

use majazamooz::errors::MajazamoozError;
use majazamooz::services::exam_service::{AnswerInput, QuestionPatch};
use majazamooz::storage::backend::ParticipationQuery;
use majazamooz::storage::{AnswerStatus, ParticipationStatus};

use migration::entities::{exam_participation, user};

use common::{TestEnv, exam_form, question_form, setup};

fn answer(question_id: i32, answer: Option<i32>) -> AnswerInput {
    AnswerInput {
        question_id,
        answer,
    }
}

/// Move the deadline of a participation into the past.
async fn backdate_deadline(env: &TestEnv, participation_id: i32, ago: Duration) {
    exam_participation::Entity::update_many()
        .col_expr(
            exam_participation::Column::Deadline,
            Expr::value(Utc::now() - ago),
        )
        .filter(exam_participation::Column::Id.eq(participation_id))
        .exec(env.storage.get_db())
        .await
        .expect("backdate deadline");
}

async fn set_balance(env: &TestEnv, user_id: i32, coins: i64, diamonds: i64) {
    user::Entity::update_many()
        .col_expr(user::Column::Coins, Expr::value(coins))
        .col_expr(user::Column::Diamonds, Expr::value(diamonds))
        .filter(user::Column::Id.eq(user_id))
        .exec(env.storage.get_db())
        .await
        .expect("set balance");
}

fn validation_message(err: MajazamoozError) -> String {
    match err {
        MajazamoozError::Validation(msg) => msg,
        other => panic!("expected a validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_full_participation_is_graded_and_paid() {
    let env = setup().await;
    let designer = env.staff("designer").await;
    let student = env.user("student").await;
    let (exam, questions) = env.exam(&designer, "grading", 3, 0).await;
    let exams = &env.state.exams;

    let started = exams.start(student.id, exam.id).await.unwrap();
    assert_eq!(started.mark_status, ParticipationStatus::InProgress);
    assert!(!started.is_finalized);
    let deadline = started.deadline.unwrap();
    assert!(deadline > Utc::now() + Duration::seconds(590));

    let saved = exams
        .submit_answers(
            student.id,
            started.id,
            vec![answer(questions[0].id, Some(1)), answer(questions[1].id, Some(2))],
        )
        .await
        .unwrap();
    assert_eq!(saved, 2);

    // Answers can be changed until the participation closes.
    exams
        .submit_answers(student.id, started.id, vec![answer(questions[1].id, Some(3))])
        .await
        .unwrap();

    let graded = exams.finalize(student.id, started.id).await.unwrap();
    assert!(graded.is_finalized);
    assert_eq!(graded.mark_status, ParticipationStatus::Completed);
    assert_eq!(graded.total_correct, 1);
    assert_eq!(graded.total_incorrect, 1);
    assert_eq!(graded.total_blank, 1);
    assert_eq!(graded.score_max, 9);
    assert_eq!(graded.score_earned, 2);
    assert_eq!(graded.score_percent, 22.22);
    assert_eq!(graded.coin_earned, 2);

    let student = env.reload(&student).await;
    assert_eq!(student.scores, 2);
    assert_eq!(student.coins, 2);
}

#[tokio::test]
async fn test_results_are_hidden_until_graded() {
    let env = setup().await;
    let designer = env.staff("designer").await;
    let student = env.user("student").await;
    let (exam, questions) = env.exam(&designer, "reveal", 2, 0).await;
    let exams = &env.state.exams;

    let started = exams.start(student.id, exam.id).await.unwrap();
    exams
        .submit_answers(student.id, started.id, vec![answer(questions[0].id, Some(4))])
        .await
        .unwrap();

    let open = exams.view_participation(student.id, started.id).await.unwrap();
    assert_eq!(open.questions.len(), 2);
    assert_eq!(open.questions[0].your_answer, Some(4));
    assert!(open.questions.iter().all(|q| q.correct_choice.is_none()));
    assert!(open.closes_at.is_some());

    exams.finalize(student.id, started.id).await.unwrap();

    let done = exams.view_participation(student.id, started.id).await.unwrap();
    assert_eq!(done.questions[0].correct_choice, Some(1));
    assert_eq!(done.questions[0].answer_status, Some(AnswerStatus::Incorrect));
    assert_eq!(done.questions[1].answer_status, Some(AnswerStatus::Blank));
    assert_eq!(
        done.questions[1].correct_full_answer.as_deref(),
        Some("The first choice")
    );
}

#[tokio::test]
async fn test_second_start_conflicts_while_open() {
    let env = setup().await;
    let designer = env.staff("designer").await;
    let student = env.user("student").await;
    let (exam, _) = env.exam(&designer, "once", 1, 0).await;
    let exams = &env.state.exams;

    let first = exams.start(student.id, exam.id).await.unwrap();
    let err = exams.start(student.id, exam.id).await.unwrap_err();
    assert!(matches!(err, MajazamoozError::Conflict(_)));

    exams.finalize(student.id, first.id).await.unwrap();
    let again = exams.start(student.id, exam.id).await.unwrap();
    assert_ne!(again.id, first.id);

    let finalized = exams
        .list_participations(student.id, ParticipationQuery::Finalized, 1)
        .await
        .unwrap();
    assert_eq!(finalized.total, 1);
    let in_progress = exams
        .list_participations(student.id, ParticipationQuery::InProgress, 1)
        .await
        .unwrap();
    assert_eq!(in_progress.total, 1);
    assert_eq!(in_progress.items[0].id, again.id);
}

#[tokio::test]
async fn test_start_charges_coins() {
    let env = setup().await;
    let designer = env.staff("designer").await;
    let author = env.user("author").await;
    let student = env.user("student").await;
    let (exam, _) = env.exam(&designer, "paid", 1, 5).await;
    let exams = &env.state.exams;

    let err = exams.start(student.id, exam.id).await.unwrap_err();
    assert!(matches!(err, MajazamoozError::Validation(_)));

    // Three first views at 2 coins each.
    for title in ["one", "two", "three"] {
        let tutorial = env.tutorial(&author, title).await;
        env.state
            .reactions
            .record_tutorial_view(Some(student.id), &tutorial)
            .await
            .unwrap();
    }
    assert_eq!(env.reload(&student).await.coins, 6);

    let started = exams.start(student.id, exam.id).await.unwrap();
    assert_eq!(started.coin_cost, 5);
    assert_eq!(env.reload(&student).await.coins, 1);
}

#[tokio::test]
async fn test_invalid_answers_are_rejected() {
    let env = setup().await;
    let designer = env.staff("designer").await;
    let student = env.user("student").await;
    let (exam, questions) = env.exam(&designer, "strict", 1, 0).await;
    let (_, foreign) = env.exam(&designer, "other", 1, 0).await;
    let exams = &env.state.exams;

    let started = exams.start(student.id, exam.id).await.unwrap();

    let err = exams
        .submit_answers(student.id, started.id, vec![answer(questions[0].id, Some(5))])
        .await
        .unwrap_err();
    assert!(matches!(err, MajazamoozError::InvalidForm(_)));

    let err = exams
        .submit_answers(student.id, started.id, vec![answer(foreign[0].id, Some(1))])
        .await
        .unwrap_err();
    assert!(matches!(err, MajazamoozError::InvalidForm(_)));
}

#[tokio::test]
async fn test_participation_belongs_to_its_user() {
    let env = setup().await;
    let designer = env.staff("designer").await;
    let student = env.user("student").await;
    let intruder = env.user("intruder").await;
    let (exam, _) = env.exam(&designer, "private", 1, 0).await;
    let exams = &env.state.exams;

    let started = exams.start(student.id, exam.id).await.unwrap();

    let err = exams
        .view_participation(intruder.id, started.id)
        .await
        .unwrap_err();
    assert!(matches!(err, MajazamoozError::NotFound(_)));
    let err = exams.finalize(intruder.id, started.id).await.unwrap_err();
    assert!(matches!(err, MajazamoozError::NotFound(_)));

    exams.finalize(student.id, started.id).await.unwrap();
    let err = exams.finalize(student.id, started.id).await.unwrap_err();
    assert!(matches!(err, MajazamoozError::Validation(_)));
}

#[tokio::test]
async fn test_exam_window_is_enforced() {
    let env = setup().await;
    let designer = env.staff("designer").await;
    let student = env.user("student").await;
    let exams = &env.state.exams;

    let mut form = exam_form("finished", 0);
    form.starts_at = Some(Utc::now() - Duration::days(2));
    form.ends_at = Some(Utc::now() - Duration::days(1));
    let finished = exams.create_exam(designer.id, form).await.unwrap();

    let mut form = exam_form("upcoming", 0);
    form.starts_at = Some(Utc::now() + Duration::days(1));
    let upcoming = exams.create_exam(designer.id, form).await.unwrap();

    let mut form = exam_form("closing soon", 0);
    let ends_at = Utc::now() + Duration::seconds(120);
    form.ends_at = Some(ends_at);
    let closing = exams.create_exam(designer.id, form).await.unwrap();

    env.state
        .moderation
        .confirm_exams(&[finished.id, upcoming.id, closing.id])
        .await
        .unwrap();

    for id in [finished.id, upcoming.id] {
        let err = exams.start(student.id, id).await.unwrap_err();
        assert!(matches!(err, MajazamoozError::Validation(_)));
    }

    // The deadline never runs past the exam's end.
    let started = exams.start(student.id, closing.id).await.unwrap();
    assert_eq!(
        started.deadline.map(|d| d.timestamp()),
        Some(ends_at.timestamp())
    );
}

#[tokio::test]
async fn test_waiting_exam_cannot_be_started() {
    let env = setup().await;
    let designer = env.staff("designer").await;
    let student = env.user("student").await;
    let exams = &env.state.exams;

    let waiting = exams
        .create_exam(designer.id, exam_form("draft", 0))
        .await
        .unwrap();
    let err = exams.start(student.id, waiting.id).await.unwrap_err();
    assert!(matches!(err, MajazamoozError::NotFound(_)));
}

#[tokio::test]
async fn test_exam_settings_are_validated() {
    let env = setup().await;
    let designer = env.staff("designer").await;
    let exams = &env.state.exams;

    let mut form = exam_form("too short", 0);
    form.deadline_duration_seconds = 30;
    form.incorrect_score = 1;
    let err = exams.create_exam(designer.id, form).await.unwrap_err();
    match err {
        MajazamoozError::InvalidForm(fields) => {
            let json = serde_json::to_value(&fields).unwrap();
            assert!(json["deadline_duration_seconds"].is_array());
            assert!(json["incorrect_score"].is_array());
        }
        other => panic!("expected form errors, got {:?}", other),
    }
}

#[tokio::test]
async fn test_concurrent_finalize_pays_once() {
    let env = setup().await;
    let designer = env.staff("designer").await;
    let student = env.user("student").await;
    let (exam, questions) = env.exam(&designer, "double click", 1, 0).await;
    let exams = &env.state.exams;

    let started = exams.start(student.id, exam.id).await.unwrap();
    exams
        .submit_answers(student.id, started.id, vec![answer(questions[0].id, Some(1))])
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        exams.finalize(student.id, started.id),
        exams.finalize(student.id, started.id)
    );
    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    let err = outcomes
        .into_iter()
        .find_map(|r| r.err())
        .expect("one finalize is rejected");
    assert_eq!(validation_message(err), "آزمون قبلا پایان یافته است");

    let student = env.reload(&student).await;
    assert_eq!(student.scores, 3);
    assert_eq!(student.coins, 2);
}

#[tokio::test]
async fn test_rejected_start_leaves_balance_untouched() {
    let env = setup().await;
    let designer = env.staff("designer").await;
    let student = env.user("student").await;
    let exams = &env.state.exams;

    let mut form = exam_form("gem exam", 5);
    form.diamond_cost = 1;
    let gem_exam = exams.create_exam(designer.id, form).await.unwrap();
    exams
        .create_question(gem_exam.id, question_form("Only question"))
        .await
        .unwrap();
    let (coin_exam, _) = env.exam(&designer, "coin exam", 1, 5).await;
    env.state
        .moderation
        .confirm_exams(&[gem_exam.id])
        .await
        .unwrap();

    set_balance(&env, student.id, 12, 0).await;

    let err = exams.start(student.id, gem_exam.id).await.unwrap_err();
    assert_eq!(validation_message(err), "الماس کافی ندارید");
    assert_eq!(env.reload(&student).await.coins, 12);

    exams.start(student.id, coin_exam.id).await.unwrap();
    assert_eq!(env.reload(&student).await.coins, 7);

    // The conflicting start rolls its debit back.
    let err = exams.start(student.id, coin_exam.id).await.unwrap_err();
    assert!(matches!(err, MajazamoozError::Conflict(_)));
    assert_eq!(env.reload(&student).await.coins, 7);

    set_balance(&env, student.id, 4, 0).await;
    let (cheap_exam, _) = env.exam(&designer, "still too much", 1, 5).await;
    let err = exams.start(student.id, cheap_exam.id).await.unwrap_err();
    assert_eq!(validation_message(err), "سکه کافی ندارید");
    assert_eq!(env.reload(&student).await.coins, 4);
}

#[tokio::test]
async fn test_submissions_close_after_waiting_time() {
    let env = setup().await;
    let designer = env.staff("designer").await;
    let student = env.user("student").await;
    let (exam, questions) = env.exam(&designer, "late", 2, 0).await;
    let exams = &env.state.exams;

    let late = exams.start(student.id, exam.id).await.unwrap();
    // Past the deadline but inside the 60 second waiting time.
    backdate_deadline(&env, late.id, Duration::seconds(20)).await;
    exams
        .submit_answers(student.id, late.id, vec![answer(questions[0].id, Some(1))])
        .await
        .unwrap();

    backdate_deadline(&env, late.id, Duration::seconds(120)).await;
    let err = exams
        .submit_answers(student.id, late.id, vec![answer(questions[1].id, Some(1))])
        .await
        .unwrap_err();
    assert_eq!(validation_message(err), "مهلت آزمون به پایان رسیده است.");

    let err = exams.finalize(student.id, late.id).await.unwrap_err();
    assert_eq!(validation_message(err), "مهلت آزمون به پایان رسیده است.");

    let expired = exams
        .list_participations(student.id, ParticipationQuery::Expired, 1)
        .await
        .unwrap();
    assert_eq!(expired.total, 1);
    assert_eq!(expired.items[0].id, late.id);

    // An expired participation no longer blocks a new attempt.
    let fresh = exams.start(student.id, exam.id).await.unwrap();
    let in_progress = exams
        .list_participations(student.id, ParticipationQuery::InProgress, 1)
        .await
        .unwrap();
    assert_eq!(in_progress.total, 1);
    assert_eq!(in_progress.items[0].id, fresh.id);

    let finalized = exams
        .list_participations(student.id, ParticipationQuery::Finalized, 1)
        .await
        .unwrap();
    assert_eq!(finalized.total, 0);
    assert_eq!(env.reload(&student).await.scores, 0);
}

#[tokio::test]
async fn test_inactive_questions_are_not_graded() {
    let env = setup().await;
    let designer = env.staff("designer").await;
    let student = env.user("student").await;
    let (exam, questions) = env.exam(&designer, "retired question", 3, 0).await;
    let exams = &env.state.exams;

    exams
        .update_question(
            questions[2].id,
            QuestionPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let started = exams.start(student.id, exam.id).await.unwrap();
    exams
        .submit_answers(
            student.id,
            started.id,
            vec![answer(questions[0].id, Some(1)), answer(questions[1].id, Some(1))],
        )
        .await
        .unwrap();
    let err = exams
        .submit_answers(student.id, started.id, vec![answer(questions[2].id, Some(1))])
        .await
        .unwrap_err();
    assert!(matches!(err, MajazamoozError::InvalidForm(_)));

    let graded = exams.finalize(student.id, started.id).await.unwrap();
    assert_eq!(graded.total_correct, 2);
    assert_eq!(graded.total_blank, 0);
    assert_eq!(graded.score_max, 6);
    assert_eq!(graded.score_percent, 100.0);
}
