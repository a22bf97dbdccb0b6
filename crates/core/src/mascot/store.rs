use serde::{Deserialize, Serialize};

use machi_database::{params, Database, SqlValue};

use super::{decay, Interaction, MascotProgress, MascotStats};
use crate::error::{CoreError, CoreResult};
use crate::user::User;

/// Reply to a successful interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MascotUpdate {
    pub message: String,
    pub stats: MascotStats,
}

/// Loads the user and brings the mascot's needs up to date.
///
/// Decay is written back only when more than an hour has passed. The write is a
/// compare-and-set on the `mascot_last_update` that was read, so two concurrent
/// fetches cannot both apply the same hours; the loser just re-reads the winner's row.
pub async fn fetch_profile(db: &Database, user_id: &str, now: i64) -> CoreResult<User> {
    let user = User::get_by_id(db, user_id).await?;

    let Some(last_update) = user.mascot_last_update else {
        // never stamped: start the clock, nothing to decay yet
        db.run(
            "UPDATE users SET mascot_last_update = ? WHERE id = ? AND mascot_last_update IS NULL",
            &params![now, user_id],
        )
        .await?;
        return User::get_by_id(db, user_id).await;
    };

    let Some(needs) = decay(user.needs(), last_update, now) else {
        return Ok(user);
    };

    let updated = db
        .run(
            "UPDATE users SET mascot_hunger = ?, mascot_energy = ?, mascot_happiness = ?, mascot_hygiene = ?,
                mascot_last_update = ?
             WHERE id = ? AND mascot_last_update = ?",
            &params![
                needs.hunger,
                needs.energy,
                needs.happiness,
                needs.hygiene,
                now,
                user_id,
                last_update
            ],
        )
        .await?;

    if updated == 0 {
        tracing::debug!("[fetch_profile] decay for {} already applied by a concurrent request", user_id);
    }
    User::get_by_id(db, user_id).await
}

/// Applies `action` to the stored needs. Only the needs the action touches and the
/// clock are written; an unknown action or an unmet precondition writes nothing.
pub async fn interact(db: &Database, user_id: &str, action: &str, now: i64) -> CoreResult<MascotUpdate> {
    let interaction = Interaction::parse(action)?;
    let user = User::get_by_id(db, user_id).await?;

    let outcome = interaction.apply(user.needs())?;
    // never move the clock backwards, even if this host lags the one that wrote it
    let stamp = user.mascot_last_update.map_or(now, |last| last.max(now));

    let mut sets: Vec<String> = Vec::with_capacity(outcome.touched.len() + 1);
    let mut values: Vec<SqlValue> = Vec::with_capacity(outcome.touched.len() + 2);
    for need in outcome.touched {
        sets.push(format!("{} = ?", need.column()));
        values.push(outcome.needs.get(*need).into());
    }
    sets.push("mascot_last_update = ?".to_string());
    values.push(stamp.into());
    values.push(user_id.into());

    let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
    if db.run(&sql, &values).await? == 0 {
        return Err(CoreError::not_found("User not found"));
    }

    tracing::debug!("[interact] {} -> {:?}", interaction, outcome.needs);
    Ok(MascotUpdate {
        message: outcome.message.to_string(),
        stats: MascotStats {
            needs: outcome.needs,
            mascot_last_update: stamp,
        },
    })
}

/// Sets level and/or xp; the stage is recomputed from the resulting level.
pub async fn update_progress(
    db: &Database,
    user_id: &str,
    level: Option<i64>,
    xp: Option<i64>,
) -> CoreResult<MascotProgress> {
    let current = User::get_by_id(db, user_id).await?.progress();
    let progress = MascotProgress::new(
        level.unwrap_or(current.mascot_level),
        xp.unwrap_or(current.mascot_xp),
    )?;

    db.run(
        "UPDATE users SET mascot_level = ?, mascot_xp = ?, mascot_stage = ? WHERE id = ?",
        &params![
            progress.mascot_level,
            progress.mascot_xp,
            progress.mascot_stage.to_string(),
            user_id
        ],
    )
    .await?;

    Ok(progress)
}
