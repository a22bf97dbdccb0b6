use serde::{Deserialize, Serialize};
use uuid::Uuid;

use machi_database::{params, Database, Dialect, FromRow, OrderDirection, QueryCriteria, SqlxSchema};

use crate::error::{CoreError, CoreResult};
use crate::game::clamp_limit;

pub const FEED_DEFAULT_LIMIT: i64 = 20;
pub const FEED_MAX_LIMIT: i64 = 50;
/// Type filter value that disables filtering.
pub const ALL_TYPES: &str = "all";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FeedItem {
    pub id: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub item_type: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub emoji: Option<String>,
    #[serde(with = "crate::flag")]
    pub published: i64,
    pub created_at: i64,
}

impl SqlxSchema for FeedItem {
    const TABLE_NAME: &'static str = "feed_items";
    const COLUMNS: &'static [&'static str] =
        &["id", "type", "title", "excerpt", "emoji", "published", "created_at"];
    const INDEXES_SQL: &'static [&'static str] =
        &["CREATE INDEX IF NOT EXISTS idx_feed_items_created_at ON feed_items (created_at)"];

    fn create_table_sql(_dialect: &dyn Dialect) -> String {
        "CREATE TABLE IF NOT EXISTS feed_items (
            id TEXT PRIMARY KEY,
            type TEXT NOT NULL,
            title TEXT NOT NULL,
            excerpt TEXT,
            emoji TEXT,
            published BIGINT NOT NULL DEFAULT 1,
            created_at BIGINT NOT NULL
        )"
        .to_string()
    }
}

/// (type, title, excerpt, emoji), newest first.
const SEED_ITEMS: [(&str, &str, &str, &str); 3] = [
    ("news", "🎄 Menu de Noël disponible !", "Découvre notre sélection festive...", "🎄"),
    ("quote", "\"La vie est trop courte pour manger mal\"", "- L'équipe Machi Mouchkil 💪", "💬"),
    ("event", "🎉 Soirée Before de Noël", "Le 23 décembre, viens fêter avec nous !", "🎉"),
];

impl FeedItem {
    /// Published items, newest first, optionally of a single type.
    pub async fn list(db: &Database, item_type: Option<&str>, limit: Option<i64>) -> CoreResult<Vec<FeedItem>> {
        let mut criteria = QueryCriteria::new().add_valued_filter("published", "=", 1i64);
        if let Some(item_type) = item_type.map(str::trim).filter(|t| !t.is_empty() && *t != ALL_TYPES) {
            criteria = criteria.add_valued_filter("type", "=", item_type);
        }
        let criteria = criteria
            .order_by("created_at", OrderDirection::Desc)
            .limit(clamp_limit(limit, FEED_DEFAULT_LIMIT, FEED_MAX_LIMIT));

        Ok(db.find_by_criteria::<FeedItem>(criteria).await?)
    }

    pub async fn get(db: &Database, id: &str) -> CoreResult<FeedItem> {
        let criteria = QueryCriteria::new().add_valued_filter("id", "=", id);
        db.find_one_by_criteria::<FeedItem>(criteria)
            .await?
            .ok_or_else(|| CoreError::not_found("Item not found"))
    }

    /// Inserts the launch items when the feed is empty.
    pub async fn seed_defaults(db: &Database, now: i64) -> CoreResult<()> {
        if db.count("SELECT COUNT(*) AS count FROM feed_items", &[]).await? > 0 {
            return Ok(());
        }

        for (offset, (item_type, title, excerpt, emoji)) in SEED_ITEMS.iter().enumerate() {
            // one second apart so the listing order is stable
            db.run(
                "INSERT INTO feed_items (id, type, title, excerpt, emoji, published, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
                &params![
                    Uuid::new_v4().to_string(),
                    *item_type,
                    *title,
                    *excerpt,
                    *emoji,
                    1i64,
                    now - offset as i64
                ],
            )
            .await?;
        }
        tracing::info!("[FeedItem::seed_defaults] seeded {} feed items", SEED_ITEMS.len());
        Ok(())
    }
}
