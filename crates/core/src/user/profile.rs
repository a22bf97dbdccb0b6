use serde::{Deserialize, Serialize};

use super::User;
use crate::mascot::{MascotProgress, MascotStats};

/// What clients see of a user: no password hash, mascot fields flattened in as
/// `mascot_*` keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub points: i64,
    pub visits: i64,
    #[serde(flatten)]
    pub progress: MascotProgress,
    #[serde(flatten)]
    pub stats: MascotStats,
    pub referral_code: Option<String>,
    pub created_at: i64,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            points: user.points,
            visits: user.visits,
            progress: user.progress(),
            stats: user.stats(),
            referral_code: user.referral_code.clone(),
            created_at: user.created_at,
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mascot::Stage;

    fn sample_user() -> User {
        User {
            id: "u1".into(),
            name: "Lina".into(),
            email: "lina@example.com".into(),
            password_hash: "secret$hash".into(),
            phone: None,
            points: 300,
            visits: 3,
            mascot_level: 4,
            mascot_xp: 20,
            mascot_stage: "baby".into(),
            mascot_hunger: Some(10),
            mascot_energy: None,
            mascot_happiness: Some(70),
            mascot_hygiene: Some(100),
            mascot_last_update: None,
            referral_code: Some("MACHI-LINA-AB12".into()),
            referred_by: None,
            created_at: 1_700_000_000,
        }
    }

    #[test]
    fn profile_flattens_mascot_fields() {
        let profile = UserProfile::from(sample_user());
        let json = serde_json::to_value(&profile).unwrap();

        assert_eq!(json["mascot_level"], 4);
        assert_eq!(json["mascot_stage"], "junior");
        assert_eq!(json["mascot_hunger"], 10);
        assert_eq!(json["mascot_energy"], 50);
        assert_eq!(json["mascot_last_update"], 1_700_000_000);
        assert!(json.get("password_hash").is_none());

        let back: UserProfile = serde_json::from_value(json).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn stored_stage_text_is_ignored() {
        let profile = UserProfile::from(sample_user());
        assert_eq!(profile.progress.mascot_stage, Stage::Junior);
    }

    #[test]
    fn user_serialization_hides_password_hash() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "lina@example.com");
    }
}
