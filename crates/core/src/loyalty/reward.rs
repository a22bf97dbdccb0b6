use serde::{Deserialize, Serialize};
use uuid::Uuid;

use machi_common::days_after;
use machi_database::{params, Database, Dialect, FromRow, OrderDirection, QueryCriteria, SqlxSchema};

use super::REWARD_VALIDITY_DAYS;
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Reward {
    pub id: String,
    pub user_id: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub reward_type: String,
    pub name: String,
    #[serde(with = "crate::flag")]
    pub used: i64,
    pub used_at: Option<i64>,
    pub expires_at: Option<i64>,
    pub created_at: i64,
}

impl SqlxSchema for Reward {
    const TABLE_NAME: &'static str = "rewards";
    const COLUMNS: &'static [&'static str] =
        &["id", "user_id", "type", "name", "used", "used_at", "expires_at", "created_at"];
    const INDEXES_SQL: &'static [&'static str] =
        &["CREATE INDEX IF NOT EXISTS idx_rewards_user_id ON rewards (user_id)"];

    fn create_table_sql(_dialect: &dyn Dialect) -> String {
        "CREATE TABLE IF NOT EXISTS rewards (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            type TEXT NOT NULL,
            name TEXT NOT NULL,
            used BIGINT NOT NULL DEFAULT 0,
            used_at BIGINT,
            expires_at BIGINT,
            created_at BIGINT NOT NULL
        )"
        .to_string()
    }
}

impl Reward {
    pub fn is_used(&self) -> bool {
        self.used != 0
    }

    /// Inserts a fresh reward valid for `REWARD_VALIDITY_DAYS` from `now`.
    pub async fn issue(
        db: &Database,
        user_id: &str,
        reward_type: &str,
        name: &str,
        now: i64,
    ) -> CoreResult<Reward> {
        let reward = Reward {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            reward_type: reward_type.to_string(),
            name: name.to_string(),
            used: 0,
            used_at: None,
            expires_at: Some(days_after(now, REWARD_VALIDITY_DAYS)),
            created_at: now,
        };

        db.run(
            "INSERT INTO rewards (id, user_id, type, name, used, used_at, expires_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            &params![
                &reward.id,
                &reward.user_id,
                &reward.reward_type,
                &reward.name,
                reward.used,
                reward.used_at,
                reward.expires_at,
                reward.created_at
            ],
        )
        .await?;

        Ok(reward)
    }

    pub async fn list_for_user(db: &Database, user_id: &str) -> CoreResult<Vec<Reward>> {
        let criteria = QueryCriteria::new()
            .add_valued_filter("user_id", "=", user_id)
            .order_by("created_at", OrderDirection::Desc);
        Ok(db.find_by_criteria::<Reward>(criteria).await?)
    }

    pub async fn count_available(db: &Database, user_id: &str) -> CoreResult<i64> {
        Ok(db
            .count(
                "SELECT COUNT(*) AS count FROM rewards WHERE user_id = ? AND used = 0",
                &params![user_id],
            )
            .await?)
    }

    /// Marks one of `user_id`'s unused rewards as used at `now`.
    pub async fn redeem(db: &Database, user_id: &str, reward_id: &str, now: i64) -> CoreResult<Reward> {
        let not_found = || CoreError::not_found("Reward not found or already used");

        let criteria = QueryCriteria::new()
            .add_valued_filter("id", "=", reward_id)
            .add_valued_filter("user_id", "=", user_id)
            .add_valued_filter("used", "=", 0i64);
        let mut reward = db
            .find_one_by_criteria::<Reward>(criteria)
            .await?
            .ok_or_else(not_found)?;

        // the used = 0 guard keeps two concurrent redemptions from both succeeding
        let updated = db
            .run(
                "UPDATE rewards SET used = 1, used_at = ? WHERE id = ? AND used = 0",
                &params![now, reward_id],
            )
            .await?;
        if updated == 0 {
            return Err(not_found());
        }

        reward.used = 1;
        reward.used_at = Some(now);
        Ok(reward)
    }
}
