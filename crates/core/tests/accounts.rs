mod common;

use common::{register, setup, T0};
use machi_core::loyalty::{PointsLog, HISTORY_LIMIT};
use machi_core::user::{REFERRAL_WELCOME_POINTS, REFERRER_BONUS, WELCOME_REWARD_NAME};
use machi_core::{CoreError, NewUser, Reward, User};

#[tokio::test]
async fn registration_issues_code_and_welcome_drink() {
    let db = setup().await;
    let user = register(&db, "Lina", None).await;

    assert_eq!(user.points, 0);
    assert_eq!(user.visits, 0);
    assert!(user.referral_code.as_deref().unwrap().starts_with("MACHI-LINA-"));
    assert!(user.referred_by.is_none());
    assert_ne!(user.password_hash, "hunter22");

    let rewards = Reward::list_for_user(&db, &user.id).await.unwrap();
    assert_eq!(rewards.len(), 1);
    assert_eq!(rewards[0].reward_type, "drink");
    assert_eq!(rewards[0].name, WELCOME_REWARD_NAME);
}

#[tokio::test]
async fn registration_requires_name_email_and_password() {
    let db = setup().await;
    let missing = NewUser {
        name: "Lina".into(),
        email: "  ".into(),
        password: "pw".into(),
        ..Default::default()
    };
    let err = User::register(&db, missing, T0).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(msg) if msg == "Name, email and password required"));
}

#[tokio::test]
async fn email_can_only_register_once() {
    let db = setup().await;
    register(&db, "Lina", None).await;

    let again = NewUser {
        name: "Other".into(),
        email: "LINA@example.com".into(),
        password: "pw".into(),
        ..Default::default()
    };
    let err = User::register(&db, again, T0).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(msg) if msg == "Email already registered"));
}

#[tokio::test]
async fn simultaneous_sign_ups_with_one_email() {
    let db = setup().await;
    let form = |name: &str| NewUser {
        name: name.into(),
        email: "same@example.com".into(),
        password: "hunter22".into(),
        ..Default::default()
    };

    let (a, b) = tokio::join!(
        User::register(&db, form("Lina"), T0),
        User::register(&db, form("Omar"), T0),
    );

    let (created, err) = match (a, b) {
        (Ok(user), Err(err)) | (Err(err), Ok(user)) => (user, err),
        (a, b) => panic!("expected exactly one sign-up to win, got {:?} and {:?}", a.is_ok(), b.is_ok()),
    };
    assert!(matches!(err, CoreError::Validation(msg) if msg == "Email already registered"));
    assert_eq!(User::find_by_email(&db, "same@example.com").await.unwrap().unwrap().id, created.id);
}

#[tokio::test]
async fn referral_credits_both_sides() {
    let db = setup().await;
    let referrer = register(&db, "Lina", None).await;
    let code = referrer.referral_code.clone().unwrap();

    let referee = register(&db, "Malo", Some(&code)).await;
    assert_eq!(referee.points, REFERRAL_WELCOME_POINTS);
    assert_eq!(referee.referred_by.as_deref(), Some(referrer.id.as_str()));

    let referrer = User::get_by_id(&db, &referrer.id).await.unwrap();
    assert_eq!(referrer.points, REFERRER_BONUS);

    let history = PointsLog::history(&db, &referrer.id, HISTORY_LIMIT).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].reason, "referral_bonus");

    let stats = User::referral_stats(&db, &referrer.id).await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.points_earned, REFERRER_BONUS);
    assert_eq!(stats.referrals[0].name, "Malo");
    assert_eq!(stats.code.as_deref(), Some(code.as_str()));
}

#[tokio::test]
async fn unknown_referral_code_is_ignored_at_registration() {
    let db = setup().await;
    let user = register(&db, "Lina", Some("MACHI-NOPE-0000")).await;
    assert_eq!(user.points, 0);
    assert!(user.referred_by.is_none());
}

#[tokio::test]
async fn referral_code_validation() {
    let db = setup().await;
    let referrer = register(&db, "Lina", None).await;
    let code = referrer.referral_code.unwrap();

    let owner = User::validate_referral_code(&db, &code).await.unwrap();
    assert_eq!(owner.name, "Lina");

    assert!(matches!(
        User::validate_referral_code(&db, "").await,
        Err(CoreError::Validation(msg)) if msg == "Code required"
    ));
    assert!(matches!(
        User::validate_referral_code(&db, "MACHI-X-0000").await,
        Err(CoreError::NotFound(msg)) if msg == "Invalid referral code"
    ));
}

#[tokio::test]
async fn login_checks_the_password() {
    let db = setup().await;
    let user = register(&db, "Lina", None).await;

    let logged_in = User::login(&db, "lina@example.com", "hunter22").await.unwrap();
    assert_eq!(logged_in.id, user.id);

    assert!(matches!(
        User::login(&db, "lina@example.com", "wrong").await,
        Err(CoreError::Unauthorized(msg)) if msg == "Invalid credentials"
    ));
    assert!(matches!(
        User::login(&db, "ghost@example.com", "hunter22").await,
        Err(CoreError::Unauthorized(_))
    ));
    assert!(matches!(
        User::login(&db, "", "hunter22").await,
        Err(CoreError::Validation(_))
    ));
}

#[tokio::test]
async fn profile_update_touches_only_given_fields() {
    let db = setup().await;
    let user = register(&db, "Lina", None).await;

    let updated = User::update_profile(&db, &user.id, None, Some("0601020304")).await.unwrap();
    assert_eq!(updated.name, "Lina");
    assert_eq!(updated.phone.as_deref(), Some("0601020304"));

    let updated = User::update_profile(&db, &user.id, Some("Lina B."), Some("")).await.unwrap();
    assert_eq!(updated.name, "Lina B.");
    assert!(updated.phone.is_none());

    assert!(matches!(
        User::update_profile(&db, &user.id, Some("  "), None).await,
        Err(CoreError::Validation(_))
    ));
    assert!(matches!(
        User::update_profile(&db, "nobody", Some("X"), None).await,
        Err(CoreError::NotFound(_))
    ));
}
