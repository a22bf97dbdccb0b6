mod api;
mod mirror;

pub use api::{
    ApiClient, ApiError, ApiResult, AuthSession, NextRewardView, PointsReceipt, ReferralCheck, ReferralStatsView,
    ReferralSummary, ReferrerView, RewardSummary, RewardsView, VisitReceipt,
};
pub use mirror::{ClientMirror, MirrorError, PendingInteraction};
