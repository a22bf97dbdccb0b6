use serde::{Serialize, Serializer};
use strum_macros::{Display, EnumString};

use machi_database::{params, Database, Dialect, FromRow, OrderDirection, QueryCriteria, SqlxSchema};

use crate::error::{CoreError, CoreResult};
use crate::user::User;

pub const HISTORY_LIMIT: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, serde::Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PointsReason {
    Visit,
    ReferralWelcome,
    ReferralBonus,
    ContestEntry,
    GameScore,
    Manual,
}

/// Append-only record of a change to a user's points.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PointsLog {
    pub id: i64,
    pub user_id: String,
    pub amount: i64,
    pub reason: String,
    #[serde(serialize_with = "serialize_json_text")]
    pub metadata: Option<String>,
    pub created_at: i64,
}

fn serialize_json_text<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    let parsed = value
        .as_deref()
        .and_then(|text| serde_json::from_str::<serde_json::Value>(text).ok());
    parsed.serialize(serializer)
}

impl SqlxSchema for PointsLog {
    const TABLE_NAME: &'static str = "points_log";
    // JSONB does not decode as text through the Any driver
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "amount",
        "reason",
        "CAST(metadata AS TEXT) AS metadata",
        "created_at",
    ];
    const INDEXES_SQL: &'static [&'static str] =
        &["CREATE INDEX IF NOT EXISTS idx_points_log_user_id ON points_log (user_id, created_at)"];

    fn create_table_sql(dialect: &dyn Dialect) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS points_log (
                id {},
                user_id TEXT NOT NULL REFERENCES users(id),
                amount BIGINT NOT NULL,
                reason TEXT NOT NULL,
                metadata {},
                created_at BIGINT NOT NULL
            )",
            dialect.auto_increment_primary_key(),
            dialect.json_type()
        )
    }
}

impl PointsLog {
    /// Appends a ledger row. Failures are logged and swallowed; the points change it
    /// describes has already been committed.
    pub async fn record(
        db: &Database,
        user_id: &str,
        amount: i64,
        reason: PointsReason,
        metadata: Option<serde_json::Value>,
        now: i64,
    ) {
        let sql = format!(
            "INSERT INTO points_log (user_id, amount, reason, metadata, created_at) VALUES (?, ?, ?, {}, ?)",
            db.dialect().json_param()
        );
        let metadata = metadata.map(|m| m.to_string());

        if let Err(e) = db
            .run(&sql, &params![user_id, amount, reason.to_string(), metadata, now])
            .await
        {
            tracing::warn!("[PointsLog::record] failed to log {} points ({}) for {}: {}", amount, reason, user_id, e);
        }
    }

    /// Most recent entries first.
    pub async fn history(db: &Database, user_id: &str, limit: i64) -> CoreResult<Vec<PointsLog>> {
        let criteria = QueryCriteria::new()
            .add_valued_filter("user_id", "=", user_id)
            .order_by("created_at", OrderDirection::Desc)
            .order_by("id", OrderDirection::Desc)
            .limit(limit.clamp(1, HISTORY_LIMIT));
        Ok(db.find_by_criteria::<PointsLog>(criteria).await?)
    }
}

/// Adds `amount` to the user's balance, logs it, and returns the new balance.
pub async fn award_points(
    db: &Database,
    user_id: &str,
    amount: i64,
    reason: PointsReason,
    metadata: Option<serde_json::Value>,
    now: i64,
) -> CoreResult<i64> {
    if amount == 0 {
        return Err(CoreError::validation("Amount required"));
    }

    let updated = db
        .run("UPDATE users SET points = points + ? WHERE id = ?", &params![amount, user_id])
        .await?;
    if updated == 0 {
        return Err(CoreError::not_found("User not found"));
    }

    PointsLog::record(db, user_id, amount, reason, metadata, now).await;
    Ok(User::get_by_id(db, user_id).await?.points)
}
