use machi_database::Database;

use crate::contest::{Contest, ContestEntry};
use crate::error::CoreResult;
use crate::feed::FeedItem;
use crate::game::GameScore;
use crate::loyalty::{PointsLog, Reward};
use crate::user::{User, MASCOT_NEED_COLUMNS};

/// Creates every table and index that is missing, adds the mascot columns to databases
/// created before they existed, and seeds the default contest and feed.
pub async fn init_schema(db: &Database, now: i64) -> CoreResult<()> {
    tracing::info!("[init_schema] initializing {} database", db.backend());

    db.create_table::<User>().await?;
    db.create_table::<Reward>().await?;
    db.create_table::<Contest>().await?;
    db.create_table::<ContestEntry>().await?;
    db.create_table::<GameScore>().await?;
    db.create_table::<FeedItem>().await?;
    db.create_table::<PointsLog>().await?;

    db.add_missing_columns::<User>(MASCOT_NEED_COLUMNS).await;

    Contest::seed_default(db, now).await?;
    FeedItem::seed_defaults(db, now).await?;

    tracing::info!("[init_schema] database tables ready");
    Ok(())
}
