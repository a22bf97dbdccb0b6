mod points_log;
mod reward;

use serde::Serialize;

use machi_database::{params, Database};

use crate::error::{CoreError, CoreResult};
use crate::user::User;

pub use points_log::{award_points, PointsLog, PointsReason, HISTORY_LIMIT};
pub use reward::Reward;

/// Points credited for every recorded visit.
pub const VISIT_POINTS: i64 = 100;
pub const REWARD_VALIDITY_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Milestone {
    pub visits: i64,
    #[serde(rename = "type")]
    pub reward_type: &'static str,
    pub name: &'static str,
}

/// Visit counts that unlock a reward, in increasing order.
pub const MILESTONES: [Milestone; 5] = [
    Milestone { visits: 3, reward_type: "drink", name: "Boisson offerte" },
    Milestone { visits: 5, reward_type: "dessert", name: "Dessert offert" },
    Milestone { visits: 8, reward_type: "discount", name: "-20% sur ta commande" },
    Milestone { visits: 10, reward_type: "meal", name: "Repas complet offert" },
    Milestone { visits: 15, reward_type: "goodies", name: "Goodies exclusifs" },
];

/// How a visit count is matched against `MILESTONES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilestoneMatch {
    /// Only a count equal to a milestone unlocks it. Counts that jump past a milestone
    /// (e.g. a manual fix-up) never award it.
    Exact,
    /// Any milestone in `(previous, current]` unlocks; the highest one is returned.
    Crossed,
}

/// The policy `record_visit` uses.
pub const MILESTONE_MATCH: MilestoneMatch = MilestoneMatch::Exact;

impl MilestoneMatch {
    pub fn find(&self, previous_visits: i64, visits: i64) -> Option<&'static Milestone> {
        match self {
            MilestoneMatch::Exact => MILESTONES.iter().find(|m| m.visits == visits),
            MilestoneMatch::Crossed => MILESTONES
                .iter()
                .rev()
                .find(|m| m.visits > previous_visits && m.visits <= visits),
        }
    }
}

/// First milestone strictly ahead of `visits`.
pub fn next_milestone(visits: i64) -> Option<&'static Milestone> {
    MILESTONES.iter().find(|m| m.visits > visits)
}

#[derive(Debug, Clone, Serialize)]
pub struct NewReward {
    pub id: String,
    #[serde(flatten)]
    pub milestone: Milestone,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitOutcome {
    pub visits: i64,
    pub points: i64,
    pub new_reward: Option<NewReward>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NextReward {
    #[serde(flatten)]
    pub milestone: Milestone,
    pub remaining: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardsOverview {
    pub rewards: Vec<Reward>,
    pub visits: i64,
    pub next_reward: Option<NextReward>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MilestoneProgress {
    #[serde(flatten)]
    pub milestone: Milestone,
    pub achieved: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyStats {
    pub visits: i64,
    pub points: i64,
    pub available_rewards: i64,
    pub milestones: Vec<MilestoneProgress>,
}

/// Counts a visit: one UPDATE bumps visits and points, then the row is re-read and the
/// milestone table consulted. A failed reward insert is logged and the visit stands.
pub async fn record_visit(db: &Database, user_id: &str, now: i64) -> CoreResult<VisitOutcome> {
    let updated = db
        .run(
            "UPDATE users SET visits = visits + 1, points = points + ? WHERE id = ?",
            &params![VISIT_POINTS, user_id],
        )
        .await?;
    if updated == 0 {
        return Err(CoreError::not_found("User not found"));
    }

    let user = User::get_by_id(db, user_id).await?;
    PointsLog::record(db, user_id, VISIT_POINTS, PointsReason::Visit, None, now).await;

    let new_reward = match MILESTONE_MATCH.find(user.visits - 1, user.visits) {
        Some(milestone) => {
            match Reward::issue(db, user_id, milestone.reward_type, milestone.name, now).await {
                Ok(reward) => Some(NewReward { id: reward.id, milestone: *milestone }),
                Err(e) => {
                    tracing::warn!(
                        "[record_visit] visit {} recorded for {} but the {} reward was not issued: {}",
                        user.visits, user_id, milestone.reward_type, e
                    );
                    None
                }
            }
        }
        None => None,
    };

    Ok(VisitOutcome {
        visits: user.visits,
        points: user.points,
        new_reward,
    })
}

pub async fn rewards_overview(db: &Database, user_id: &str) -> CoreResult<RewardsOverview> {
    let user = User::get_by_id(db, user_id).await?;
    let rewards = Reward::list_for_user(db, user_id).await?;

    Ok(RewardsOverview {
        rewards,
        visits: user.visits,
        next_reward: next_milestone(user.visits).map(|m| NextReward {
            milestone: *m,
            remaining: m.visits - user.visits,
        }),
    })
}

pub async fn loyalty_stats(db: &Database, user_id: &str) -> CoreResult<LoyaltyStats> {
    let user = User::get_by_id(db, user_id).await?;
    let available_rewards = Reward::count_available(db, user_id).await?;

    Ok(LoyaltyStats {
        visits: user.visits,
        points: user.points,
        available_rewards,
        milestones: MILESTONES
            .iter()
            .map(|m| MilestoneProgress {
                milestone: *m,
                achieved: user.visits >= m.visits,
            })
            .collect(),
    })
}
