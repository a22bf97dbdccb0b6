use serde::{Deserialize, Serialize};
use uuid::Uuid;

use machi_database::{params, Database, Dialect, FromRow, SqlxSchema};

use crate::error::{CoreError, CoreResult};
use crate::loyalty::{award_points, PointsReason};
use crate::mascot::Stage;

pub const DEFAULT_GAME: &str = "turtle_surf";
pub const LEADERBOARD_DEFAULT_LIMIT: i64 = 10;
pub const LEADERBOARD_MAX_LIMIT: i64 = 50;
pub const MY_SCORES_LIMIT: i64 = 10;

/// Loyalty points for a game score: 10 points per full 5 game points.
pub fn points_for_score(score: i64) -> i64 {
    (score.max(0) / 5) * 10
}

/// `requested` when positive, else `default`; never above `max`.
pub fn clamp_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested.filter(|limit| *limit > 0).unwrap_or(default).min(max)
}

/// Blank or missing game names fall back to `DEFAULT_GAME`.
pub fn game_or_default(game: Option<&str>) -> &str {
    game.map(str::trim).filter(|g| !g.is_empty()).unwrap_or(DEFAULT_GAME)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GameScore {
    pub id: String,
    pub user_id: String,
    pub game: String,
    pub score: i64,
    pub created_at: i64,
}

impl SqlxSchema for GameScore {
    const TABLE_NAME: &'static str = "game_scores";
    const COLUMNS: &'static [&'static str] = &["id", "user_id", "game", "score", "created_at"];
    const INDEXES_SQL: &'static [&'static str] =
        &["CREATE INDEX IF NOT EXISTS idx_game_scores_game_score ON game_scores (game, score)"];

    fn create_table_sql(_dialect: &dyn Dialect) -> String {
        "CREATE TABLE IF NOT EXISTS game_scores (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            game TEXT NOT NULL DEFAULT 'turtle_surf',
            score BIGINT NOT NULL,
            created_at BIGINT NOT NULL
        )"
        .to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreOutcome {
    pub message: String,
    pub score: i64,
    pub high_score: i64,
    pub points_earned: i64,
    pub rank: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub id: String,
    pub name: String,
    pub score: i64,
    pub mascot_stage: Stage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ScoreLine {
    pub score: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyScores {
    pub game: String,
    pub high_score: i64,
    pub scores: Vec<ScoreLine>,
}

#[derive(FromRow)]
struct LeaderboardRow {
    id: String,
    name: String,
    score: i64,
    mascot_level: i64,
}

#[derive(FromRow)]
struct HighScoreRow {
    high: Option<i64>,
}

impl GameScore {
    /// Stores a score, credits the matching points and reports the player's standing.
    pub async fn record(
        db: &Database,
        user_id: &str,
        game: Option<&str>,
        score: i64,
        now: i64,
    ) -> CoreResult<ScoreOutcome> {
        if score < 0 {
            return Err(CoreError::validation("Invalid score"));
        }
        let game = game_or_default(game);

        db.run(
            "INSERT INTO game_scores (id, user_id, game, score, created_at) VALUES (?, ?, ?, ?, ?)",
            &params![Uuid::new_v4().to_string(), user_id, game, score, now],
        )
        .await?;

        let points_earned = points_for_score(score);
        if points_earned > 0 {
            award_points(
                db,
                user_id,
                points_earned,
                PointsReason::GameScore,
                Some(serde_json::json!({ "game": game, "score": score })),
                now,
            )
            .await?;
        }

        let high_score = Self::high_score(db, user_id, game).await?.unwrap_or(score);
        let rank = db
            .count(
                "SELECT COUNT(*) + 1 AS count FROM (
                    SELECT user_id FROM game_scores WHERE game = ? GROUP BY user_id HAVING MAX(score) > ?
                 ) better",
                &params![game, score],
            )
            .await?;

        let message = if points_earned > 0 {
            format!("+{} points! 🎮", points_earned)
        } else {
            "Score saved!".to_string()
        };

        Ok(ScoreOutcome {
            message,
            score,
            high_score,
            points_earned,
            rank,
        })
    }

    pub async fn high_score(db: &Database, user_id: &str, game: &str) -> CoreResult<Option<i64>> {
        let row: Option<HighScoreRow> = db
            .get(
                "SELECT MAX(score) AS high FROM game_scores WHERE user_id = ? AND game = ?",
                &params![user_id, game],
            )
            .await?;
        Ok(row.and_then(|r| r.high))
    }

    /// Best score per player, highest first.
    pub async fn leaderboard(db: &Database, game: Option<&str>, limit: Option<i64>) -> CoreResult<Vec<LeaderboardEntry>> {
        let game = game_or_default(game);
        let limit = clamp_limit(limit, LEADERBOARD_DEFAULT_LIMIT, LEADERBOARD_MAX_LIMIT);

        let rows: Vec<LeaderboardRow> = db
            .query(
                "SELECT u.id, u.name, MAX(gs.score) AS score, u.mascot_level
                 FROM game_scores gs
                 JOIN users u ON gs.user_id = u.id
                 WHERE gs.game = ?
                 GROUP BY u.id, u.name, u.mascot_level
                 ORDER BY MAX(gs.score) DESC, u.name ASC
                 LIMIT ?",
                &params![game, limit],
            )
            .await?;

        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| LeaderboardEntry {
                rank: index as i64 + 1,
                id: row.id,
                name: row.name,
                score: row.score,
                mascot_stage: Stage::for_level(row.mascot_level),
            })
            .collect())
    }

    pub async fn my_scores(db: &Database, user_id: &str, game: Option<&str>) -> CoreResult<MyScores> {
        let game = game_or_default(game);
        let scores: Vec<ScoreLine> = db
            .query(
                "SELECT score, created_at FROM game_scores
                 WHERE user_id = ? AND game = ?
                 ORDER BY score DESC, created_at DESC
                 LIMIT ?",
                &params![user_id, game, MY_SCORES_LIMIT],
            )
            .await?;

        Ok(MyScores {
            game: game.to_string(),
            high_score: scores.first().map(|s| s.score).unwrap_or(0),
            scores,
        })
    }
}
