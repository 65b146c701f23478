//! Panel dashboard: goal progress and Jalali monthly views.

mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, Set};

use majazamooz::config::keys;
use majazamooz::services::account_service::ProfileForm;
use majazamooz::utils::jalali;

use migration::entities::tutorial_view;

use common::setup;

#[tokio::test]
async fn test_goal_progress_from_visible_tutorials() {
    let env = setup().await;
    let author = env.user("author").await;
    let reader = env.user("reader").await;
    let first = env.tutorial(&author, "first").await;
    env.tutorial(&author, "second").await;
    env.waiting_tutorial(&author, "hidden").await;

    env.state
        .reactions
        .toggle_tutorial_like(reader.id, first.id)
        .await
        .unwrap();
    env.state
        .reactions
        .record_tutorial_view(Some(reader.id), &first)
        .await
        .unwrap();
    env.comment(&reader, &first, "thanks").await;

    env.state
        .accounts
        .update_profile(
            author.id,
            ProfileForm {
                tutorials_count_goal: Some(4),
                likes_count_goal: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let home = env.state.statistics.panel_home(author.id).await.unwrap();

    assert_eq!(home.tutorials.value, 2);
    assert_eq!(home.tutorials.percent, 50);
    assert_eq!(home.likes.value, 1);
    assert_eq!(home.likes.percent, 34);
    assert_eq!(home.views.value, 1);
    // No goal set counts as reached.
    assert_eq!(home.views.percent, 100);
    assert_eq!(home.comments.value, 1);
    assert_eq!(home.latest_tutorials.len(), 2);
}

#[tokio::test]
async fn test_monthly_views_end_with_current_month() {
    let env = setup().await;
    let author = env.user("author").await;
    let tutorial = env.tutorial(&author, "counted").await;
    for name in ["r1", "r2", "r3"] {
        let reader = env.user(name).await;
        env.state
            .reactions
            .record_tutorial_view(Some(reader.id), &tutorial)
            .await
            .unwrap();
    }

    let home = env.state.statistics.panel_home(author.id).await.unwrap();
    assert_eq!(home.monthly_views.len(), 5);

    let current = home.monthly_views.last().unwrap();
    let offset = majazamooz::config::get_config().site.timezone();
    let today = jalali::to_jalali(jalali::today_in(offset)).unwrap();
    assert_eq!((current.year, current.month), (today.year, today.month));
    assert_eq!(current.views, 3);
    assert!(home.monthly_views[..4].iter().all(|m| m.views == 0));
}

#[tokio::test]
async fn test_months_cross_the_jalali_new_year() {
    let env = setup().await;
    let author = env.user("author").await;
    env.runtime
        .set(keys::USER_PANEL_STATISTICS_LAST_MONTH_COUNT, "3", Some("test"))
        .await
        .unwrap();

    // 1 Farvardin 1403
    let nowruz = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
    let home = env
        .state
        .statistics
        .panel_home_on(author.id, nowruz)
        .await
        .unwrap();

    let months: Vec<(i32, i32)> = home
        .monthly_views
        .iter()
        .map(|m| (m.year, m.month))
        .collect();
    assert_eq!(months, vec![(1402, 11), (1402, 12), (1403, 1)]);
    assert_eq!(home.monthly_views[2].label, "فروردین 1403");
}

#[tokio::test]
async fn test_views_are_bucketed_into_jalali_months() {
    let env = setup().await;
    let author = env.user("author").await;
    let tutorial = env.tutorial(&author, "seasonal").await;
    let hidden = env.waiting_tutorial(&author, "unconfirmed").await;
    env.runtime
        .set(keys::USER_PANEL_STATISTICS_LAST_MONTH_COUNT, "3", Some("test"))
        .await
        .unwrap();

    let views = [
        // Azar 1402, before the window.
        (tutorial.id, (2023, 12, 1)),
        // Bahman 1402
        (tutorial.id, (2024, 2, 1)),
        // Esfand 1402
        (tutorial.id, (2024, 3, 1)),
        (tutorial.id, (2024, 3, 10)),
        (hidden.id, (2024, 3, 10)),
        // Farvardin 1403
        (tutorial.id, (2024, 3, 25)),
    ];
    // One view per reader and tutorial.
    for (i, (tutorial_id, (y, m, d))) in views.into_iter().enumerate() {
        let reader = env.user(&format!("reader{}", i)).await;
        tutorial_view::ActiveModel {
            user_id: Set(reader.id),
            tutorial_id: Set(tutorial_id),
            score: Set(0),
            coin: Set(0),
            create_date: Set(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()),
            ..Default::default()
        }
        .insert(env.storage.get_db())
        .await
        .unwrap();
    }

    let today = NaiveDate::from_ymd_opt(2024, 3, 28).unwrap();
    let home = env
        .state
        .statistics
        .panel_home_on(author.id, today)
        .await
        .unwrap();

    let counts: Vec<(i32, i32, u64)> = home
        .monthly_views
        .iter()
        .map(|m| (m.year, m.month, m.views))
        .collect();
    assert_eq!(counts, vec![(1402, 11, 1), (1402, 12, 2), (1403, 1, 1)]);
}
