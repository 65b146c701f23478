//! Likes, votes and views: relation rows, counters and the score/coin
//! they move between users.

mod common;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, sea_query::Expr};

use majazamooz::config::keys;
use majazamooz::errors::MajazamoozError;
use majazamooz::services::reaction_service::RelationList;
use majazamooz::storage::backend::ToggleOutcome;

use migration::entities::{tutorial, tutorial_comment};

use common::setup;

#[tokio::test]
async fn test_tutorial_like_rewards_author_and_reverses() {
    let env = setup().await;
    let author = env.user("author").await;
    let reader = env.user("reader").await;
    let tutorial = env.tutorial(&author, "rust basics").await;

    let outcome = env
        .state
        .reactions
        .toggle_tutorial_like(reader.id, tutorial.id)
        .await
        .unwrap();
    assert_eq!(outcome, ToggleOutcome::Created);
    assert_eq!(outcome.status(), 1);

    let paid = env.reload(&author).await;
    assert_eq!(paid.scores, 5);
    assert_eq!(paid.coins, 4);
    // The actor gets nothing for a like.
    assert_eq!(env.reload(&reader).await.scores, 0);

    let counted = env.storage.find_tutorial(tutorial.id).await.unwrap().unwrap();
    assert_eq!(counted.likes_count, 1);

    let outcome = env
        .state
        .reactions
        .toggle_tutorial_like(reader.id, tutorial.id)
        .await
        .unwrap();
    assert_eq!(outcome, ToggleOutcome::Removed);
    assert_eq!(outcome.status(), -1);

    let reverted = env.reload(&author).await;
    assert_eq!(reverted.scores, 0);
    assert_eq!(reverted.coins, 0);
    let counted = env.storage.find_tutorial(tutorial.id).await.unwrap().unwrap();
    assert_eq!(counted.likes_count, 0);
}

#[tokio::test]
async fn test_removal_reverts_snapshot_not_current_setting() {
    let env = setup().await;
    let author = env.user("author").await;
    let reader = env.user("reader").await;
    let tutorial = env.tutorial(&author, "snapshots").await;

    env.state
        .reactions
        .toggle_tutorial_like(reader.id, tutorial.id)
        .await
        .unwrap();

    env.runtime
        .set(keys::TUTORIAL_LIKE_SCORE, "50", Some("test"))
        .await
        .unwrap();
    env.runtime
        .set(keys::TUTORIAL_LIKE_COIN, "40", Some("test"))
        .await
        .unwrap();

    env.state
        .reactions
        .toggle_tutorial_like(reader.id, tutorial.id)
        .await
        .unwrap();

    let author = env.reload(&author).await;
    assert_eq!(author.scores, 0);
    assert_eq!(author.coins, 0);
}

#[tokio::test]
async fn test_like_requires_visible_tutorial() {
    let env = setup().await;
    let author = env.user("author").await;
    let reader = env.user("reader").await;
    let waiting = env.waiting_tutorial(&author, "not yet").await;

    let err = env
        .state
        .reactions
        .toggle_tutorial_like(reader.id, waiting.id)
        .await
        .unwrap_err();
    assert!(matches!(err, MajazamoozError::NotFound(_)));
    assert_eq!(env.reload(&author).await.scores, 0);
}

#[tokio::test]
async fn test_votes_are_independent_rows() {
    let env = setup().await;
    let author = env.user("author").await;
    let reader = env.user("reader").await;
    let tutorial = env.tutorial(&author, "votes").await;

    let reactions = &env.state.reactions;
    assert_eq!(
        reactions
            .toggle_tutorial_upvote(reader.id, tutorial.id)
            .await
            .unwrap(),
        ToggleOutcome::Created
    );
    assert_eq!(
        reactions
            .toggle_tutorial_downvote(reader.id, tutorial.id)
            .await
            .unwrap(),
        ToggleOutcome::Created
    );

    let counted = env.storage.find_tutorial(tutorial.id).await.unwrap().unwrap();
    assert_eq!(counted.up_votes_count, 1);
    assert_eq!(counted.down_votes_count, 1);
}

#[tokio::test]
async fn test_comment_like_rewards_comment_author() {
    let env = setup().await;
    let author = env.user("author").await;
    let commenter = env.user("commenter").await;
    let reader = env.user("reader").await;
    let tutorial = env.tutorial(&author, "comments").await;
    let comment = env.comment(&commenter, &tutorial, "nice").await;

    env.state
        .reactions
        .toggle_comment_like(reader.id, comment.id)
        .await
        .unwrap();

    let commenter = env.reload(&commenter).await;
    assert_eq!(commenter.scores, 3);
    assert_eq!(commenter.coins, 3);
    assert_eq!(env.reload(&author).await.scores, 0);

    let rows = env
        .state
        .reactions
        .relation_list(commenter.id, RelationList::CommentLikesByOthers, 1)
        .await
        .unwrap();
    assert_eq!(rows.total, 1);
    assert_eq!(rows.items[0].user_id, reader.id);
    assert_eq!(rows.items[0].score, 3);
}

#[tokio::test]
async fn test_first_view_rewards_viewer_once() {
    let env = setup().await;
    let author = env.user("author").await;
    let reader = env.user("reader").await;
    let tutorial = env.tutorial(&author, "views").await;
    let reactions = &env.state.reactions;

    assert!(
        reactions
            .record_tutorial_view(Some(reader.id), &tutorial)
            .await
            .unwrap()
    );
    assert!(
        !reactions
            .record_tutorial_view(Some(reader.id), &tutorial)
            .await
            .unwrap()
    );

    let reader = env.reload(&reader).await;
    assert_eq!(reader.scores, 1);
    assert_eq!(reader.coins, 2);
    assert_eq!(env.reload(&author).await.scores, 0);

    let counted = env.storage.find_tutorial(tutorial.id).await.unwrap().unwrap();
    assert_eq!(counted.total_views_count, 2);
    assert_eq!(counted.user_views_count, 1);
}

#[tokio::test]
async fn test_author_and_anonymous_views_only_count() {
    let env = setup().await;
    let author = env.user("author").await;
    let tutorial = env.tutorial(&author, "own views").await;
    let reactions = &env.state.reactions;

    assert!(
        !reactions
            .record_tutorial_view(Some(author.id), &tutorial)
            .await
            .unwrap()
    );
    assert!(!reactions.record_tutorial_view(None, &tutorial).await.unwrap());

    let author = env.reload(&author).await;
    assert_eq!(author.scores, 0);
    assert_eq!(author.coins, 0);

    let counted = env.storage.find_tutorial(tutorial.id).await.unwrap().unwrap();
    assert_eq!(counted.total_views_count, 2);
    assert_eq!(counted.user_views_count, 0);

    let views = reactions
        .relation_list(author.id, RelationList::TutorialViewsByOthers, 1)
        .await
        .unwrap();
    assert_eq!(views.total, 0);
}

#[tokio::test]
async fn test_relation_lists_by_direction() {
    let env = setup().await;
    let author = env.user("author").await;
    let reader = env.user("reader").await;
    let first = env.tutorial(&author, "first").await;
    let second = env.tutorial(&author, "second").await;
    let reactions = &env.state.reactions;

    reactions
        .toggle_tutorial_like(reader.id, first.id)
        .await
        .unwrap();
    reactions
        .toggle_tutorial_like(reader.id, second.id)
        .await
        .unwrap();

    let by_me = reactions
        .relation_list(reader.id, RelationList::TutorialLikesByMe, 1)
        .await
        .unwrap();
    assert_eq!(by_me.total, 2);

    let by_others = reactions
        .relation_list(author.id, RelationList::TutorialLikesByOthers, 1)
        .await
        .unwrap();
    assert_eq!(by_others.total, 2);
    assert!(by_others.items.iter().all(|row| row.user_id == reader.id));

    let none = reactions
        .relation_list(reader.id, RelationList::TutorialLikesByOthers, 1)
        .await
        .unwrap();
    assert_eq!(none.total, 0);
}

#[tokio::test]
async fn test_reactions_without_author_only_move_counters() {
    let env = setup().await;
    let author = env.user("author").await;
    let reader = env.user("reader").await;
    let orphan = env.tutorial(&author, "orphaned").await;
    let comment = env.comment(&author, &orphan, "orphaned comment").await;

    tutorial::Entity::update_many()
        .col_expr(tutorial::Column::AuthorId, Expr::value(Option::<i32>::None))
        .filter(tutorial::Column::Id.eq(orphan.id))
        .exec(env.storage.get_db())
        .await
        .unwrap();
    tutorial_comment::Entity::update_many()
        .col_expr(tutorial_comment::Column::UserId, Expr::value(Option::<i32>::None))
        .filter(tutorial_comment::Column::Id.eq(comment.id))
        .exec(env.storage.get_db())
        .await
        .unwrap();

    let reactions = &env.state.reactions;
    let outcome = reactions
        .toggle_tutorial_like(reader.id, orphan.id)
        .await
        .unwrap();
    assert_eq!(outcome, ToggleOutcome::Created);
    let outcome = reactions
        .toggle_comment_like(reader.id, comment.id)
        .await
        .unwrap();
    assert_eq!(outcome, ToggleOutcome::Created);

    let liked = env.storage.find_tutorial(orphan.id).await.unwrap().unwrap();
    assert_eq!(liked.likes_count, 1);
    let liked = env.storage.find_comment(comment.id).await.unwrap().unwrap();
    assert_eq!(liked.likes_count, 1);

    let outcome = reactions
        .toggle_tutorial_like(reader.id, orphan.id)
        .await
        .unwrap();
    assert_eq!(outcome, ToggleOutcome::Removed);
    let outcome = reactions
        .toggle_comment_like(reader.id, comment.id)
        .await
        .unwrap();
    assert_eq!(outcome, ToggleOutcome::Removed);

    let unliked = env.storage.find_tutorial(orphan.id).await.unwrap().unwrap();
    assert_eq!(unliked.likes_count, 0);
    let unliked = env.storage.find_comment(comment.id).await.unwrap().unwrap();
    assert_eq!(unliked.likes_count, 0);

    for user in [&author, &reader] {
        let balance = env.reload(user).await;
        assert_eq!((balance.scores, balance.coins), (0, 0));
    }
}
