use reqwest::StatusCode;
use serde_json::{json, Value};

use machi_api::{app_router, ApiServerEnv, GlobalState};
use machi_client::{ApiClient, ApiError, ClientMirror, MirrorError};
use machi_common::get_current_timestamp;
use machi_core::{init_schema, Interaction, NewUser, Stage};
use machi_database::Database;

struct TestApp {
    base_url: String,
    db: Database,
}

impl TestApp {
    fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }
}

async fn spawn_app() -> TestApp {
    let db = Database::connect_url("sqlite::memory:").await.unwrap();
    init_schema(&db, get_current_timestamp()).await.unwrap();

    let state = GlobalState::new(db.clone(), ApiServerEnv::with_secret("test-salt"));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app_router(state)).await.unwrap();
    });

    TestApp { base_url: format!("http://{}", addr), db }
}

fn new_user(name: &str, referral_code: Option<&str>) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        password: "hunter22".to_string(),
        phone: None,
        referral_code: referral_code.map(str::to_string),
    }
}

async fn signed_in(app: &TestApp, name: &str) -> ApiClient {
    let mut client = app.client();
    client.register(&new_user(name, None)).await.unwrap();
    client
}

fn status_of(err: &ApiError) -> (StatusCode, &str) {
    match err {
        ApiError::Status { status, message } => (*status, message.as_str()),
        other => panic!("expected a status error, got {:?}", other),
    }
}

#[tokio::test]
async fn register_then_read_profile() {
    let app = spawn_app().await;
    let mut client = app.client();

    let session = client.register(&new_user("Lina", None)).await.unwrap();
    assert_eq!(session.message, "Welcome to Machi Mouchkil! 🏄‍♂️");
    assert_eq!(session.user.points, 0);
    assert_eq!(session.user.progress.mascot_stage, Stage::Baby);
    assert!(session.user.referral_code.unwrap().starts_with("MACHI-LINA-"));

    let me = client.me().await.unwrap();
    assert_eq!(me.email, "lina@example.com");
    assert_eq!(me.stats.needs.hunger, 50);

    let err = client.register(&new_user("Lina", None)).await.unwrap_err();
    assert_eq!(status_of(&err), (StatusCode::BAD_REQUEST, "Email already registered"));
}

#[tokio::test]
async fn login_checks_credentials() {
    let app = spawn_app().await;
    signed_in(&app, "Omar").await;

    let mut client = app.client();
    let err = client.login("omar@example.com", "wrong").await.unwrap_err();
    assert_eq!(status_of(&err), (StatusCode::UNAUTHORIZED, "Invalid credentials"));

    let err = client.login("", "").await.unwrap_err();
    assert_eq!(status_of(&err).0, StatusCode::BAD_REQUEST);

    let session = client.login("OMAR@example.com", "hunter22").await.unwrap();
    assert_eq!(session.message, "Welcome back! 🌊");
    assert_eq!(client.me().await.unwrap().id, session.user.id);
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = spawn_app().await;
    let http = reqwest::Client::new();

    let response = http.get(app.url("/users/me")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Token required");

    let response = http.get(app.url("/users/me")).bearer_auth("forged").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid token");

    assert!(matches!(app.client().me().await, Err(ApiError::NotAuthenticated)));
}

#[tokio::test]
async fn interactions_apply_and_reject() {
    let app = spawn_app().await;
    let client = signed_in(&app, "Sami").await;

    let update = client.interact(Interaction::Feed).await.unwrap();
    assert_eq!(update.message, "Miam ! Machi s'est régalé.");
    assert_eq!((update.stats.needs.hunger, update.stats.needs.energy), (80, 45));

    client.interact(Interaction::Feed).await.unwrap();
    let err = client.interact(Interaction::Feed).await.unwrap_err();
    assert_eq!(status_of(&err), (StatusCode::BAD_REQUEST, "Il n'a pas faim !"));

    let before = client.me().await.unwrap().stats;
    let response = reqwest::Client::new()
        .post(app.url("/users/interact"))
        .bearer_auth(client.token().unwrap())
        .json(&json!({ "action": "dance" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Unknown action");
    assert_eq!(client.me().await.unwrap().stats, before);
}

#[tokio::test]
async fn mirror_follows_the_server() {
    let app = spawn_app().await;
    let client = signed_in(&app, "Nour").await;

    let mut mirror = ClientMirror::new();
    mirror.refresh(&client).await.unwrap();

    let update = mirror.interact(&client, Interaction::Feed).await.unwrap();
    let snapshot = mirror.snapshot().unwrap();
    assert_eq!(snapshot.stats, update.stats);
    assert_eq!(snapshot.stats.needs.hunger, 80);

    // someone else cleaned the mascot; the stale mirror still thinks it is dirty
    app.db
        .run(
            "UPDATE users SET mascot_hygiene = 95 WHERE id = ?",
            &machi_database::params![snapshot.id.clone()],
        )
        .await
        .unwrap();
    let before = mirror.snapshot().unwrap().stats;
    let err = mirror.interact(&client, Interaction::Clean).await.unwrap_err();
    assert!(matches!(&err, MirrorError::Api(e) if e.status() == Some(StatusCode::BAD_REQUEST)));
    assert_eq!(mirror.snapshot().unwrap().stats, before);

    let fresh = mirror.refresh(&client).await.unwrap();
    assert_eq!(fresh.stats.needs.hygiene, 95);
}

#[tokio::test]
async fn visits_earn_rewards() {
    let app = spawn_app().await;
    let client = signed_in(&app, "Yanis").await;

    let first = client.record_visit().await.unwrap();
    assert_eq!((first.visits, first.points), (1, 100));
    assert!(first.new_reward.is_none());

    client.record_visit().await.unwrap();
    let third = client.record_visit().await.unwrap();
    let reward = third.new_reward.unwrap();
    assert_eq!(reward.reward_type, "drink");

    let overview = client.rewards().await.unwrap();
    assert_eq!(overview.visits, 3);
    let next = overview.next_reward.unwrap();
    assert_eq!((next.visits, next.remaining), (5, 2));
    // welcome drink plus the third-visit drink
    assert_eq!(overview.rewards.len(), 2);

    let used = client.use_reward(&reward.id).await.unwrap();
    assert!(used.is_used());
    let err = client.use_reward(&reward.id).await.unwrap_err();
    assert_eq!(status_of(&err), (StatusCode::NOT_FOUND, "Reward not found or already used"));
}

#[tokio::test]
async fn scores_and_leaderboard() {
    let app = spawn_app().await;
    let client = signed_in(&app, "Ines").await;

    let outcome = client.save_score(23, None).await.unwrap();
    assert_eq!(outcome.points_earned, 40);
    assert_eq!(outcome.rank, 1);
    assert_eq!(outcome.message, "+40 points! 🎮");

    let board = client.leaderboard(None, Some(5)).await.unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].score, 23);

    let response = reqwest::Client::new()
        .post(app.url("/game/score"))
        .bearer_auth(client.token().unwrap())
        .json(&json!({ "score": -1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn feed_is_public_and_filterable() {
    let app = spawn_app().await;
    let client = app.client();

    assert_eq!(client.feed(None, None).await.unwrap().len(), 3);
    assert_eq!(client.feed(Some("all"), None).await.unwrap().len(), 3);
    assert_eq!(client.feed(Some("news"), None).await.unwrap().len(), 1);
    assert_eq!(client.feed(None, Some(2)).await.unwrap().len(), 2);

    let response = reqwest::get(app.url("/feed/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn referral_codes_validate_and_reward() {
    let app = spawn_app().await;
    let mut referrer = app.client();
    let code = referrer
        .register(&new_user("Adam", None))
        .await
        .unwrap()
        .user
        .referral_code
        .unwrap();

    let http = reqwest::Client::new();
    let response = http
        .post(app.url("/referrals/validate"))
        .json(&json!({ "code": "MACHI-NOPE-0000" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Invalid referral code", "valid": false }));

    let body: Value = http
        .post(app.url("/referrals/validate"))
        .json(&json!({ "code": code }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["valid"], true);
    assert_eq!(body["referrer"]["name"], "Adam");

    let mut referee = app.client();
    let session = referee.register(&new_user("Mira", Some(&code))).await.unwrap();
    assert_eq!(session.user.points, 100);
    assert_eq!(referrer.me().await.unwrap().points, 200);

    let stats: Value = http
        .get(app.url("/referrals/stats"))
        .bearer_auth(referrer.token().unwrap())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["pointsEarned"], 200);
    assert_eq!(stats["referrals"][0]["status"], "validated");
}

#[tokio::test]
async fn client_covers_progress_points_contests_and_referrals() {
    let app = spawn_app().await;
    let mut adam = app.client();
    let code = adam.register(&new_user("Adam", None)).await.unwrap().user.referral_code.unwrap();

    let progress = adam.update_mascot(Some(50), Some(4)).await.unwrap();
    assert_eq!((progress.mascot_level, progress.mascot_xp), (4, 50));
    assert_eq!(progress.mascot_stage, Stage::Junior);

    let receipt = adam.add_points(25, Some("bonus")).await.unwrap();
    assert_eq!(receipt.message, "+25 points added!");
    assert_eq!((receipt.points, receipt.reason.as_deref()), (25, Some("bonus")));

    let contests = adam.contests().await.unwrap();
    assert!(!contests.is_empty());
    let entry = adam.enter_contest(&contests[0].id, Some("tajine")).await.unwrap();
    assert_eq!(entry.contest_id, contests[0].id);
    assert_eq!(entry.answer.as_deref(), Some("tajine"));
    let err = adam.enter_contest(&contests[0].id, None).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));

    // validation is public
    let check = app.client().validate_referral_code(&code).await.unwrap();
    assert!(check.valid);
    assert_eq!(check.referrer.name, "Adam");
    let err = app.client().validate_referral_code("MACHI-NOPE-0000").await.unwrap_err();
    assert_eq!(status_of(&err), (StatusCode::NOT_FOUND, "Invalid referral code"));

    app.client().register(&new_user("Mira", Some(&code))).await.unwrap();
    let stats = adam.referral_stats().await.unwrap();
    assert_eq!(stats.code.as_deref(), Some(code.as_str()));
    assert_eq!((stats.total, stats.points_earned), (1, 200));
    assert_eq!(stats.referrals[0].name, "Mira");

    assert!(matches!(app.client().referral_stats().await, Err(ApiError::NotAuthenticated)));
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let app = spawn_app().await;

    let health = app.client().health().await.unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["message"], "🐢 Machi Mouchkil API is running!");
    assert_eq!(health["database"]["backend"], "sqlite");

    let tables: Value = reqwest::get(app.url("/health/tables")).await.unwrap().json().await.unwrap();
    let names: Vec<&str> = tables["tables"].as_array().unwrap().iter().filter_map(Value::as_str).collect();
    assert!(names.contains(&"users"));
    assert!(names.contains(&"points_log"));

    let response = reqwest::get(app.url("/nowhere")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}
