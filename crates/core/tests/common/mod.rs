#![allow(dead_code)]

use machi_core::{init_schema, NewUser, User};
use machi_database::Database;

pub const HOUR: i64 = 60 * 60;
pub const T0: i64 = 1_734_000_000;

pub async fn setup() -> Database {
    let db = Database::connect_url("sqlite::memory:").await.expect("in-memory sqlite");
    init_schema(&db, T0).await.expect("schema");
    db
}

pub async fn register(db: &Database, name: &str, referral_code: Option<&str>) -> User {
    let new_user = NewUser {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        password: "hunter22".to_string(),
        phone: None,
        referral_code: referral_code.map(str::to_string),
    };
    User::register(db, new_user, T0).await.expect("register")
}

/// Overwrites the stored needs and clock of a user.
pub async fn set_mascot(db: &Database, user_id: &str, needs: [i64; 4], last_update: Option<i64>) {
    db.run(
        "UPDATE users SET mascot_hunger = ?, mascot_energy = ?, mascot_happiness = ?, mascot_hygiene = ?,
            mascot_last_update = ?
         WHERE id = ?",
        &machi_database::params![needs[0], needs[1], needs[2], needs[3], last_update, user_id],
    )
    .await
    .expect("set mascot");
}
