mod profile;
mod referral;
mod registration;

use serde::Serialize;

use machi_database::{Database, Dialect, FromRow, QueryCriteria, SqlValue, SqlxSchema};

use crate::error::{CoreError, CoreResult};
use crate::mascot::{MascotProgress, MascotStats, Needs, Stage, MIN_LEVEL};

pub use profile::UserProfile;
pub use referral::{generate_referral_code, Referee, ReferralStats, REFERRAL_WELCOME_POINTS, REFERRER_BONUS};
pub use registration::{NewUser, WELCOME_REWARD_NAME, WELCOME_REWARD_TYPE};

/// Columns added after the first release; `init_schema` adds them to older databases.
pub const MASCOT_NEED_COLUMNS: &[&str] = &[
    "mascot_hunger BIGINT DEFAULT 50",
    "mascot_energy BIGINT DEFAULT 50",
    "mascot_happiness BIGINT DEFAULT 50",
    "mascot_hygiene BIGINT DEFAULT 50",
    "mascot_last_update BIGINT",
];

/// A row of the `users` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: Option<String>,

    pub points: i64,
    pub visits: i64,

    pub mascot_level: i64,
    pub mascot_xp: i64,
    pub mascot_stage: String,
    pub mascot_hunger: Option<i64>,
    pub mascot_energy: Option<i64>,
    pub mascot_happiness: Option<i64>,
    pub mascot_hygiene: Option<i64>,
    pub mascot_last_update: Option<i64>,

    pub referral_code: Option<String>,
    pub referred_by: Option<String>,

    pub created_at: i64,
}

impl SqlxSchema for User {
    const TABLE_NAME: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "email",
        "password_hash",
        "phone",
        "points",
        "visits",
        "mascot_level",
        "mascot_xp",
        "mascot_stage",
        "mascot_hunger",
        "mascot_energy",
        "mascot_happiness",
        "mascot_hygiene",
        "mascot_last_update",
        "referral_code",
        "referred_by",
        "created_at",
    ];
    const INDEXES_SQL: &'static [&'static str] =
        &["CREATE INDEX IF NOT EXISTS idx_users_referred_by ON users (referred_by)"];

    fn create_table_sql(_dialect: &dyn Dialect) -> String {
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            phone TEXT,
            points BIGINT NOT NULL DEFAULT 0,
            visits BIGINT NOT NULL DEFAULT 0,
            mascot_level BIGINT NOT NULL DEFAULT 1,
            mascot_xp BIGINT NOT NULL DEFAULT 0,
            mascot_stage TEXT NOT NULL DEFAULT 'baby',
            mascot_hunger BIGINT DEFAULT 50,
            mascot_energy BIGINT DEFAULT 50,
            mascot_happiness BIGINT DEFAULT 50,
            mascot_hygiene BIGINT DEFAULT 50,
            mascot_last_update BIGINT,
            referral_code TEXT UNIQUE,
            referred_by TEXT,
            created_at BIGINT NOT NULL
        )"
        .to_string()
    }
}

impl User {
    /// Stored needs; NULLs read as the default value.
    pub fn needs(&self) -> Needs {
        Needs::from_stored(
            self.mascot_hunger,
            self.mascot_energy,
            self.mascot_happiness,
            self.mascot_hygiene,
        )
    }

    pub fn stats(&self) -> MascotStats {
        MascotStats {
            needs: self.needs(),
            mascot_last_update: self.mascot_last_update.unwrap_or(self.created_at),
        }
    }

    /// Stage is always derived from the level, whatever the stored text says.
    pub fn progress(&self) -> MascotProgress {
        let level = self.mascot_level.max(MIN_LEVEL);
        MascotProgress {
            mascot_level: level,
            mascot_xp: self.mascot_xp,
            mascot_stage: Stage::for_level(level),
        }
    }

    pub async fn find_by_id(db: &Database, id: &str) -> CoreResult<Option<User>> {
        let criteria = QueryCriteria::new().add_valued_filter("id", "=", id);
        Ok(db.find_one_by_criteria::<User>(criteria).await?)
    }

    /// Same as [`User::find_by_id`], with a missing row reported as `NotFound`.
    pub async fn get_by_id(db: &Database, id: &str) -> CoreResult<User> {
        Self::find_by_id(db, id)
            .await?
            .ok_or_else(|| CoreError::not_found("User not found"))
    }

    pub async fn find_by_email(db: &Database, email: &str) -> CoreResult<Option<User>> {
        let criteria = QueryCriteria::new().add_valued_filter("email", "=", email);
        Ok(db.find_one_by_criteria::<User>(criteria).await?)
    }

    pub async fn find_by_referral_code(db: &Database, code: &str) -> CoreResult<Option<User>> {
        let criteria = QueryCriteria::new().add_valued_filter("referral_code", "=", code);
        Ok(db.find_one_by_criteria::<User>(criteria).await?)
    }

    /// Updates whichever of `name` / `phone` is given. An empty phone clears it.
    pub async fn update_profile(
        db: &Database,
        id: &str,
        name: Option<&str>,
        phone: Option<&str>,
    ) -> CoreResult<User> {
        let mut sets = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();

        if let Some(name) = name {
            let name = name.trim();
            if name.is_empty() {
                return Err(CoreError::validation("Name cannot be empty"));
            }
            sets.push("name = ?");
            values.push(name.into());
        }
        if let Some(phone) = phone {
            let phone = phone.trim();
            sets.push("phone = ?");
            values.push(Some(phone).filter(|p| !p.is_empty()).into());
        }

        if !sets.is_empty() {
            values.push(id.into());
            let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
            if db.run(&sql, &values).await? == 0 {
                return Err(CoreError::not_found("User not found"));
            }
        }

        Self::get_by_id(db, id).await
    }
}
