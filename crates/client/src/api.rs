use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use machi_core::{
    Contest, ContestEntry, FeedItem, Interaction, LeaderboardEntry, MascotProgress, MascotUpdate, NewUser, Reward,
    ScoreOutcome, UserProfile,
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status; `message` is its `error` field.
    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("not logged in")]
    NotAuthenticated,

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub message: String,
    pub user: UserProfile,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RewardSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub reward_type: String,
    pub name: String,
    pub visits: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitReceipt {
    pub message: String,
    pub visits: i64,
    pub points: i64,
    pub new_reward: Option<RewardSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NextRewardView {
    pub visits: i64,
    #[serde(rename = "type")]
    pub reward_type: String,
    pub name: String,
    pub remaining: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardsView {
    pub rewards: Vec<Reward>,
    pub visits: i64,
    pub next_reward: Option<NextRewardView>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointsReceipt {
    pub message: String,
    pub points: i64,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferralSummary {
    pub id: String,
    pub name: String,
    /// Sign-up time of the referee.
    pub date: i64,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralStatsView {
    pub code: Option<String>,
    pub total: i64,
    pub points_earned: i64,
    pub referrals: Vec<ReferralSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferrerView {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferralCheck {
    pub valid: bool,
    pub referrer: ReferrerView,
    pub bonus: String,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: UserProfile,
}

#[derive(Deserialize)]
struct RewardEnvelope {
    reward: Reward,
}

#[derive(Deserialize)]
struct MascotEnvelope {
    mascot: MascotProgress,
}

#[derive(Deserialize)]
struct ContestsEnvelope {
    contests: Vec<Contest>,
}

#[derive(Deserialize)]
struct EntryEnvelope {
    entry: ContestEntry,
}

#[derive(Deserialize)]
struct LeaderboardEnvelope {
    leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Deserialize)]
struct FeedEnvelope {
    items: Vec<FeedItem>,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

/// Thin typed wrapper over the JSON API. `base_url` points at the server root; every
/// path is joined under `/api`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, format!("{}/api{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn authed(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        if self.token.is_none() {
            return Err(ApiError::NotAuthenticated);
        }
        Ok(self.request(method, path))
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> ApiResult<T> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| "API request failed".to_string());
        tracing::debug!("[ApiClient] {} {}", status, message);
        Err(ApiError::Status { status, message })
    }

    pub async fn register(&mut self, new_user: &NewUser) -> ApiResult<AuthSession> {
        let session: AuthSession = Self::send(self.request(Method::POST, "/auth/register").json(new_user)).await?;
        self.token = Some(session.token.clone());
        Ok(session)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> ApiResult<AuthSession> {
        let body = LoginBody { email, password };
        let session: AuthSession = Self::send(self.request(Method::POST, "/auth/login").json(&body)).await?;
        self.token = Some(session.token.clone());
        Ok(session)
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    pub async fn me(&self) -> ApiResult<UserProfile> {
        let envelope: UserEnvelope = Self::send(self.authed(Method::GET, "/users/me")?).await?;
        Ok(envelope.user)
    }

    pub async fn interact(&self, action: Interaction) -> ApiResult<MascotUpdate> {
        let builder = self.authed(Method::POST, "/users/interact")?;
        Self::send(builder.json(&json!({ "action": action }))).await
    }

    /// Sets level and/or xp; the server derives the stage.
    pub async fn update_mascot(&self, xp: Option<i64>, level: Option<i64>) -> ApiResult<MascotProgress> {
        let builder = self.authed(Method::PUT, "/users/mascot")?;
        let envelope: MascotEnvelope = Self::send(builder.json(&json!({ "xp": xp, "level": level }))).await?;
        Ok(envelope.mascot)
    }

    pub async fn add_points(&self, amount: i64, reason: Option<&str>) -> ApiResult<PointsReceipt> {
        let builder = self.authed(Method::PUT, "/users/points")?;
        Self::send(builder.json(&json!({ "amount": amount, "reason": reason }))).await
    }

    pub async fn record_visit(&self) -> ApiResult<VisitReceipt> {
        Self::send(self.authed(Method::POST, "/loyalty/visit")?).await
    }

    pub async fn rewards(&self) -> ApiResult<RewardsView> {
        Self::send(self.authed(Method::GET, "/loyalty/rewards")?).await
    }

    pub async fn use_reward(&self, reward_id: &str) -> ApiResult<Reward> {
        let path = format!("/loyalty/use-reward/{}", reward_id);
        let envelope: RewardEnvelope = Self::send(self.authed(Method::POST, &path)?).await?;
        Ok(envelope.reward)
    }

    pub async fn contests(&self) -> ApiResult<Vec<Contest>> {
        let envelope: ContestsEnvelope = Self::send(self.request(Method::GET, "/contests")).await?;
        Ok(envelope.contests)
    }

    pub async fn enter_contest(&self, contest_id: &str, answer: Option<&str>) -> ApiResult<ContestEntry> {
        let path = format!("/contests/{}/enter", contest_id);
        let builder = self.authed(Method::POST, &path)?;
        let envelope: EntryEnvelope = Self::send(builder.json(&json!({ "answer": answer }))).await?;
        Ok(envelope.entry)
    }

    pub async fn referral_stats(&self) -> ApiResult<ReferralStatsView> {
        Self::send(self.authed(Method::GET, "/referrals/stats")?).await
    }

    /// An unknown code comes back as a 404 `ApiError::Status`.
    pub async fn validate_referral_code(&self, code: &str) -> ApiResult<ReferralCheck> {
        let builder = self.request(Method::POST, "/referrals/validate");
        Self::send(builder.json(&json!({ "code": code }))).await
    }

    pub async fn save_score(&self, score: i64, game: Option<&str>) -> ApiResult<ScoreOutcome> {
        let builder = self.authed(Method::POST, "/game/score")?;
        Self::send(builder.json(&json!({ "score": score, "game": game }))).await
    }

    pub async fn leaderboard(&self, game: Option<&str>, limit: Option<i64>) -> ApiResult<Vec<LeaderboardEntry>> {
        let mut query = Vec::new();
        if let Some(game) = game {
            query.push(("game", game.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        let envelope: LeaderboardEnvelope =
            Self::send(self.request(Method::GET, "/game/leaderboard").query(&query)).await?;
        Ok(envelope.leaderboard)
    }

    pub async fn feed(&self, item_type: Option<&str>, limit: Option<i64>) -> ApiResult<Vec<FeedItem>> {
        let mut query = Vec::new();
        if let Some(item_type) = item_type {
            query.push(("type", item_type.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        let envelope: FeedEnvelope = Self::send(self.request(Method::GET, "/feed").query(&query)).await?;
        Ok(envelope.items)
    }

    pub async fn health(&self) -> ApiResult<Value> {
        Self::send(self.request(Method::GET, "/health")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let client = ApiClient::new("http://localhost:3000/");
        assert_eq!(client.base_url, "http://localhost:3000");
        assert!(client.token().is_none());
    }

    #[test]
    fn protected_calls_need_a_token() {
        let client = ApiClient::new("http://localhost:3000");
        assert!(matches!(client.authed(Method::GET, "/users/me"), Err(ApiError::NotAuthenticated)));
    }

    #[test]
    fn visit_receipt_reads_the_server_shape() {
        let receipt: VisitReceipt = serde_json::from_value(json!({
            "message": "Visit recorded! +100 points 🏄‍♂️",
            "visits": 3,
            "points": 300,
            "newReward": { "id": "r1", "visits": 3, "type": "drink", "name": "Boisson offerte" },
        }))
        .unwrap();
        assert_eq!(receipt.new_reward.unwrap().reward_type, "drink");
    }

    #[test]
    fn referral_stats_read_the_camel_case_totals() {
        let stats: ReferralStatsView = serde_json::from_value(json!({
            "code": "MACHI-ADAM-1A2B",
            "total": 1,
            "pointsEarned": 200,
            "referrals": [{ "id": "u2", "name": "Mira", "date": 1_734_000_000, "status": "validated" }],
        }))
        .unwrap();
        assert_eq!((stats.total, stats.points_earned), (1, 200));
        assert_eq!(stats.referrals[0].name, "Mira");
    }
}
