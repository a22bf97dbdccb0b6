use rand::Rng;
use serde::{Deserialize, Serialize};

use machi_database::{params, Database, FromRow};

use super::User;
use crate::error::{CoreError, CoreResult};

/// Points credited to the referrer when someone registers with their code.
pub const REFERRER_BONUS: i64 = 200;
/// Starting balance of a user who registered with a valid code.
pub const REFERRAL_WELCOME_POINTS: i64 = 100;

const CODE_PREFIX: &str = "MACHI";
const CODE_NAME_LEN: usize = 5;
const CODE_SUFFIX_LEN: usize = 4;
const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `MACHI-<up to 5 letters of the name>-<4 random base36 chars>`, all uppercase.
pub fn generate_referral_code(name: &str) -> String {
    let letters: String = name
        .to_ascii_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase())
        .take(CODE_NAME_LEN)
        .collect();

    let mut rng = rand::rng();
    let suffix: String = (0..CODE_SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();

    format!("{CODE_PREFIX}-{letters}-{suffix}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Referee {
    pub id: String,
    pub name: String,
    #[serde(rename = "date")]
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralStats {
    pub code: Option<String>,
    pub total: i64,
    pub points_earned: i64,
    pub referrals: Vec<Referee>,
}

impl User {
    pub async fn referral_stats(db: &Database, id: &str) -> CoreResult<ReferralStats> {
        let user = Self::get_by_id(db, id).await?;
        let referrals: Vec<Referee> = db
            .query(
                "SELECT id, name, created_at FROM users WHERE referred_by = ? ORDER BY created_at DESC",
                &params![id],
            )
            .await?;

        let total = referrals.len() as i64;
        Ok(ReferralStats {
            code: user.referral_code,
            total,
            points_earned: total * REFERRER_BONUS,
            referrals,
        })
    }

    /// Looks up the owner of a referral code, for the sign-up form.
    pub async fn validate_referral_code(db: &Database, code: &str) -> CoreResult<User> {
        let code = code.trim();
        if code.is_empty() {
            return Err(CoreError::validation("Code required"));
        }
        Self::find_by_referral_code(db, code)
            .await?
            .ok_or_else(|| CoreError::not_found("Invalid referral code"))
    }
}
