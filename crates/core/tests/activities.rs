mod common;

use common::{register, setup, T0};
use machi_core::contest::CONTEST_ENTRY_POINTS;
use machi_core::game::DEFAULT_GAME;
use machi_core::{init_schema, Contest, ContestEntry, CoreError, FeedItem, GameScore, Stage, User};
use machi_database::params;

#[tokio::test]
async fn schema_seeds_once() {
    let db = setup().await;
    init_schema(&db, T0 + 100).await.unwrap();

    assert_eq!(Contest::list_all(&db).await.unwrap().len(), 1);
    assert_eq!(FeedItem::list(&db, None, None).await.unwrap().len(), 3);

    let tables = db.list_tables().await.unwrap();
    for table in ["users", "rewards", "contests", "contest_entries", "game_scores", "feed_items", "points_log"] {
        assert!(tables.iter().any(|t| t == table), "missing table {table}");
    }
}

#[tokio::test]
async fn seeded_contest_is_active() {
    let db = setup().await;
    let contest = Contest::current(&db, T0 + 1).await.unwrap().expect("active contest");
    assert_eq!(contest.name, "Concours de Noël 🎄");
    assert_eq!(contest.participants, 0);

    // thirty days later it is over
    assert!(Contest::current(&db, T0 + 31 * 24 * 3600).await.unwrap().is_none());
}

#[tokio::test]
async fn entering_a_contest_once() {
    let db = setup().await;
    let user = register(&db, "Lina", None).await;
    let contest = Contest::current(&db, T0).await.unwrap().unwrap();

    let entry = Contest::enter(&db, &user.id, &contest.id, Some("42".into()), T0 + 1).await.unwrap();
    assert_eq!(entry.contest_id, contest.id);
    assert_eq!(entry.answer.as_deref(), Some("42"));

    let user_after = User::get_by_id(&db, &user.id).await.unwrap();
    assert_eq!(user_after.points, CONTEST_ENTRY_POINTS);

    let err = Contest::enter(&db, &user.id, &contest.id, None, T0 + 2).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(msg) if msg == "Already entered this contest"));

    let listed = Contest::list_all(&db).await.unwrap();
    assert_eq!(listed[0].participants, 1);

    let mine = ContestEntry::for_user(&db, &user.id).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].contest_name, contest.name);
    assert_eq!(mine[0].entry.id, entry.id);
}

#[tokio::test]
async fn closed_or_unknown_contests_refuse_entries() {
    let db = setup().await;
    let user = register(&db, "Lina", None).await;
    let contest = Contest::current(&db, T0).await.unwrap().unwrap();

    let err = Contest::enter(&db, &user.id, "nope", None, T0).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(msg) if msg == "Contest not found or not active"));

    db.run("UPDATE contests SET active = 0 WHERE id = ?", &params![&contest.id])
        .await
        .unwrap();
    assert!(matches!(
        Contest::enter(&db, &user.id, &contest.id, None, T0).await,
        Err(CoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn score_earns_points_and_ranks() {
    let db = setup().await;
    let lina = register(&db, "Lina", None).await;
    let malo = register(&db, "Malo", None).await;

    let first = GameScore::record(&db, &malo.id, None, 300, T0).await.unwrap();
    assert_eq!(first.rank, 1);
    assert_eq!(first.points_earned, 600);

    let outcome = GameScore::record(&db, &lina.id, Some(DEFAULT_GAME), 123, T0 + 1).await.unwrap();
    assert_eq!(outcome.points_earned, 240);
    assert_eq!(outcome.high_score, 123);
    assert_eq!(outcome.rank, 2);
    assert_eq!(User::get_by_id(&db, &lina.id).await.unwrap().points, 240);

    let low = GameScore::record(&db, &lina.id, None, 3, T0 + 2).await.unwrap();
    assert_eq!(low.points_earned, 0);
    assert_eq!(low.high_score, 123);
    assert_eq!(low.message, "Score saved!");

    assert!(matches!(
        GameScore::record(&db, &lina.id, None, -1, T0).await,
        Err(CoreError::Validation(msg)) if msg == "Invalid score"
    ));
}

#[tokio::test]
async fn leaderboard_keeps_best_score_per_player() {
    let db = setup().await;
    let lina = register(&db, "Lina", None).await;
    let malo = register(&db, "Malo", None).await;
    db.run("UPDATE users SET mascot_level = 10 WHERE id = ?", &params![&malo.id])
        .await
        .unwrap();

    GameScore::record(&db, &lina.id, None, 50, T0).await.unwrap();
    GameScore::record(&db, &lina.id, None, 80, T0 + 1).await.unwrap();
    GameScore::record(&db, &malo.id, None, 70, T0 + 2).await.unwrap();
    GameScore::record(&db, &malo.id, Some("snake"), 999, T0 + 3).await.unwrap();

    let board = GameScore::leaderboard(&db, None, None).await.unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!((board[0].rank, board[0].name.as_str(), board[0].score), (1, "Lina", 80));
    assert_eq!((board[1].rank, board[1].score), (2, 70));
    assert_eq!(board[1].mascot_stage, Stage::Legendary);

    assert_eq!(GameScore::leaderboard(&db, None, Some(1)).await.unwrap().len(), 1);

    let mine = GameScore::my_scores(&db, &lina.id, None).await.unwrap();
    assert_eq!(mine.high_score, 80);
    assert_eq!(mine.scores.len(), 2);

    let none = GameScore::my_scores(&db, &lina.id, Some("snake")).await.unwrap();
    assert_eq!(none.high_score, 0);
    assert!(none.scores.is_empty());
}

#[tokio::test]
async fn feed_filters_by_type_and_hides_drafts() {
    let db = setup().await;

    let news = FeedItem::list(&db, Some("news"), None).await.unwrap();
    assert_eq!(news.len(), 1);
    assert_eq!(news[0].item_type, "news");

    let all = FeedItem::list(&db, Some("all"), Some(2)).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].item_type, "news");

    db.run("UPDATE feed_items SET published = 0 WHERE id = ?", &params![&news[0].id])
        .await
        .unwrap();
    assert_eq!(FeedItem::list(&db, None, None).await.unwrap().len(), 2);

    let item = FeedItem::get(&db, &news[0].id).await.unwrap();
    assert_eq!(item.title, news[0].title);
    assert!(matches!(
        FeedItem::get(&db, "missing").await,
        Err(CoreError::NotFound(msg)) if msg == "Item not found"
    ));
}
