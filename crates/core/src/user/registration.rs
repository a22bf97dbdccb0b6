use serde::{Deserialize, Serialize};
use uuid::Uuid;

use machi_common::{hash_password, verify_password};
use machi_database::{params, Database};

use super::{generate_referral_code, User, REFERRAL_WELCOME_POINTS, REFERRER_BONUS};
use crate::error::{is_unique_violation, CoreError, CoreResult};
use crate::loyalty::{award_points, PointsLog, PointsReason, Reward};
use crate::mascot::{MascotProgress, Needs};

pub const WELCOME_REWARD_TYPE: &str = "drink";
pub const WELCOME_REWARD_NAME: &str = "Boisson offerte";

const REFERRAL_CODE_ATTEMPTS: usize = 5;

/// Sign-up form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub phone: Option<String>,
    pub referral_code: Option<String>,
}

impl User {
    /// Creates the account with a fresh mascot, then hands out the referral bonus and the
    /// welcome reward. Those two are secondary writes: failures are logged, never returned.
    pub async fn register(db: &Database, new_user: NewUser, now: i64) -> CoreResult<User> {
        let name = new_user.name.trim();
        let email = new_user.email.trim().to_lowercase();
        if name.is_empty() || email.is_empty() || new_user.password.is_empty() {
            return Err(CoreError::validation("Name, email and password required"));
        }

        if Self::find_by_email(db, &email).await?.is_some() {
            return Err(CoreError::validation("Email already registered"));
        }

        let referrer = match new_user.referral_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => Self::find_by_referral_code(db, code).await?,
            _ => None,
        };

        let mut referral_code = generate_referral_code(name);
        for _ in 1..REFERRAL_CODE_ATTEMPTS {
            if Self::find_by_referral_code(db, &referral_code).await?.is_none() {
                break;
            }
            referral_code = generate_referral_code(name);
        }

        let id = Uuid::new_v4().to_string();
        let phone = new_user.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());
        let starting_points = if referrer.is_some() { REFERRAL_WELCOME_POINTS } else { 0 };
        let needs = Needs::default();
        let progress = MascotProgress::default();
        let password_hash = hash_password(&new_user.password)?;

        let inserted = db.run(
            "INSERT INTO users (
                id, name, email, password_hash, phone, points, visits,
                mascot_level, mascot_xp, mascot_stage,
                mascot_hunger, mascot_energy, mascot_happiness, mascot_hygiene, mascot_last_update,
                referral_code, referred_by, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            &params![
                &id,
                name,
                &email,
                &password_hash,
                phone,
                starting_points,
                0i64,
                progress.mascot_level,
                progress.mascot_xp,
                progress.mascot_stage.to_string(),
                needs.hunger,
                needs.energy,
                needs.happiness,
                needs.hygiene,
                now,
                &referral_code,
                referrer.as_ref().map(|r| r.id.clone()),
                now
            ],
        )
        .await;
        if let Err(e) = inserted {
            // a concurrent sign-up with the same email got in after our lookup
            if is_unique_violation(&e) && Self::find_by_email(db, &email).await?.is_some() {
                return Err(CoreError::validation("Email already registered"));
            }
            return Err(e.into());
        }

        tracing::info!("[User::register] new user {} (referred: {})", id, referrer.is_some());

        if let Some(referrer) = &referrer {
            PointsLog::record(
                db,
                &id,
                REFERRAL_WELCOME_POINTS,
                PointsReason::ReferralWelcome,
                Some(serde_json::json!({ "referrer_id": referrer.id })),
                now,
            )
            .await;

            if let Err(e) = award_points(
                db,
                &referrer.id,
                REFERRER_BONUS,
                PointsReason::ReferralBonus,
                Some(serde_json::json!({ "referee_id": id })),
                now,
            )
            .await
            {
                tracing::warn!("[User::register] referrer {} did not get the bonus for {}: {}", referrer.id, id, e);
            }
        }

        if let Err(e) = Reward::issue(db, &id, WELCOME_REWARD_TYPE, WELCOME_REWARD_NAME, now).await {
            tracing::warn!("[User::register] welcome reward not issued for {}: {}", id, e);
        }

        Self::get_by_id(db, &id).await
    }

    pub async fn login(db: &Database, email: &str, password: &str) -> CoreResult<User> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(CoreError::validation("Email and password required"));
        }

        let invalid = || CoreError::Unauthorized("Invalid credentials".to_string());
        let user = Self::find_by_email(db, &email).await?.ok_or_else(invalid)?;
        if !verify_password(password, &user.password_hash) {
            return Err(invalid());
        }
        Ok(user)
    }
}
