use serde::{Deserialize, Serialize};
use uuid::Uuid;

use machi_common::days_after;
use machi_database::{params, Database, Dialect, FromRow, OrderDirection, QueryCriteria, SqlxSchema};

use crate::error::{is_unique_violation, CoreError, CoreResult};
use crate::loyalty::{award_points, PointsReason};

pub const CONTEST_ENTRY_POINTS: i64 = 50;
const SEED_CONTEST_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Contest {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub emoji: Option<String>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    #[serde(with = "crate::flag")]
    pub active: i64,
    pub created_at: i64,
    /// Computed, not stored.
    pub participants: i64,
}

impl SqlxSchema for Contest {
    const TABLE_NAME: &'static str = "contests";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "description",
        "emoji",
        "start_date",
        "end_date",
        "active",
        "created_at",
        "(SELECT COUNT(*) FROM contest_entries WHERE contest_entries.contest_id = contests.id) AS participants",
    ];
    const INDEXES_SQL: &'static [&'static str] = &[];

    fn create_table_sql(_dialect: &dyn Dialect) -> String {
        "CREATE TABLE IF NOT EXISTS contests (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            emoji TEXT DEFAULT '🎁',
            start_date BIGINT,
            end_date BIGINT,
            active BIGINT NOT NULL DEFAULT 1,
            created_at BIGINT NOT NULL
        )"
        .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ContestEntry {
    pub id: String,
    pub user_id: String,
    pub contest_id: String,
    pub answer: Option<String>,
    #[serde(with = "crate::flag")]
    pub won: i64,
    pub created_at: i64,
}

impl SqlxSchema for ContestEntry {
    const TABLE_NAME: &'static str = "contest_entries";
    const COLUMNS: &'static [&'static str] = &["id", "user_id", "contest_id", "answer", "won", "created_at"];
    const INDEXES_SQL: &'static [&'static str] =
        &["CREATE INDEX IF NOT EXISTS idx_contest_entries_contest_id ON contest_entries (contest_id)"];

    fn create_table_sql(_dialect: &dyn Dialect) -> String {
        "CREATE TABLE IF NOT EXISTS contest_entries (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            contest_id TEXT NOT NULL REFERENCES contests(id),
            answer TEXT,
            won BIGINT NOT NULL DEFAULT 0,
            created_at BIGINT NOT NULL,
            UNIQUE (user_id, contest_id)
        )"
        .to_string()
    }
}

/// An entry joined with the contest it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ContestEntryDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub entry: ContestEntry,
    pub contest_name: String,
    pub emoji: Option<String>,
}

impl Contest {
    /// Every contest, running ones first, then by latest end date.
    pub async fn list_all(db: &Database) -> CoreResult<Vec<Contest>> {
        let criteria = QueryCriteria::new()
            .order_by("active", OrderDirection::Desc)
            .order_by("end_date", OrderDirection::Desc);
        Ok(db.find_by_criteria::<Contest>(criteria).await?)
    }

    /// The running contest that ends soonest.
    pub async fn current(db: &Database, now: i64) -> CoreResult<Option<Contest>> {
        let criteria = QueryCriteria::new()
            .add_valued_filter("active", "=", 1i64)
            .add_valued_filter("end_date", ">", now)
            .order_by("end_date", OrderDirection::Asc);
        Ok(db.find_one_by_criteria::<Contest>(criteria).await?)
    }

    async fn find_open(db: &Database, id: &str, now: i64) -> CoreResult<Option<Contest>> {
        let criteria = QueryCriteria::new()
            .add_valued_filter("id", "=", id)
            .add_valued_filter("active", "=", 1i64)
            .add_valued_filter("end_date", ">", now);
        Ok(db.find_one_by_criteria::<Contest>(criteria).await?)
    }

    /// Enters `user_id` into the contest once and credits `CONTEST_ENTRY_POINTS`.
    pub async fn enter(
        db: &Database,
        user_id: &str,
        contest_id: &str,
        answer: Option<String>,
        now: i64,
    ) -> CoreResult<ContestEntry> {
        if Self::find_open(db, contest_id, now).await?.is_none() {
            return Err(CoreError::not_found("Contest not found or not active"));
        }

        let already_entered = || CoreError::validation("Already entered this contest");
        let existing = db
            .count(
                "SELECT COUNT(*) AS count FROM contest_entries WHERE user_id = ? AND contest_id = ?",
                &params![user_id, contest_id],
            )
            .await?;
        if existing > 0 {
            return Err(already_entered());
        }

        let entry = ContestEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            contest_id: contest_id.to_string(),
            answer: Some(answer.unwrap_or_default()),
            won: 0,
            created_at: now,
        };

        let inserted = db
            .run(
                "INSERT INTO contest_entries (id, user_id, contest_id, answer, won, created_at) VALUES (?, ?, ?, ?, ?, ?)",
                &params![
                    &entry.id,
                    &entry.user_id,
                    &entry.contest_id,
                    entry.answer.clone(),
                    entry.won,
                    entry.created_at
                ],
            )
            .await;
        match inserted {
            Ok(_) => {}
            // lost a race with a concurrent entry from the same user
            Err(e) if is_unique_violation(&e) => return Err(already_entered()),
            Err(e) => return Err(e.into()),
        }

        award_points(
            db,
            user_id,
            CONTEST_ENTRY_POINTS,
            PointsReason::ContestEntry,
            Some(serde_json::json!({ "contest_id": contest_id })),
            now,
        )
        .await?;

        Ok(entry)
    }

    /// Inserts the launch contest when the table is empty.
    pub async fn seed_default(db: &Database, now: i64) -> CoreResult<()> {
        if db.count("SELECT COUNT(*) AS count FROM contests", &[]).await? > 0 {
            return Ok(());
        }

        db.run(
            "INSERT INTO contests (id, name, description, emoji, start_date, end_date, active, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            &params![
                Uuid::new_v4().to_string(),
                "Concours de Noël 🎄",
                "Gagne un repas pour 4 + des goodies exclusifs !",
                "🎄",
                now,
                days_after(now, SEED_CONTEST_DAYS),
                1i64,
                now
            ],
        )
        .await?;
        tracing::info!("[Contest::seed_default] seeded the default contest");
        Ok(())
    }
}

impl ContestEntry {
    pub async fn for_user(db: &Database, user_id: &str) -> CoreResult<Vec<ContestEntryDetails>> {
        Ok(db
            .query(
                "SELECT ce.id, ce.user_id, ce.contest_id, ce.answer, ce.won, ce.created_at,
                        c.name AS contest_name, c.emoji
                 FROM contest_entries ce
                 JOIN contests c ON ce.contest_id = c.id
                 WHERE ce.user_id = ?
                 ORDER BY ce.created_at DESC",
                &params![user_id],
            )
            .await?)
    }
}
