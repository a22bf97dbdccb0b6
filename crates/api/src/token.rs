use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use machi_common::{days_after, decrypt, encrypt};
use machi_core::User;

pub const TOKEN_VALIDITY_DAYS: i64 = 30;
const TOKEN_ORIGIN: &str = "machi-api";

/// Claims sealed into a bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedRequest {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub timestamp: i64,
    pub origin: String,
}

impl AuthenticatedRequest {
    pub fn for_user(user: &User, now: i64) -> Self {
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            timestamp: now,
            origin: TOKEN_ORIGIN.to_string(),
        }
    }

    pub fn seal(&self, secret_salt: &str) -> Result<String> {
        encrypt(&serde_json::to_string(self)?, secret_salt)
    }

    /// Opens a token and rejects it once `TOKEN_VALIDITY_DAYS` have passed since issue.
    pub fn open(token: &str, secret_salt: &str, now: i64) -> Result<Self> {
        let claims: Self = serde_json::from_str(&decrypt(token, secret_salt)?)?;
        if days_after(claims.timestamp, TOKEN_VALIDITY_DAYS) < now {
            bail!("token issued at {} has expired", claims.timestamp);
        }
        Ok(claims)
    }
}

pub fn issue_token(user: &User, secret_salt: &str, now: i64) -> Result<String> {
    AuthenticatedRequest::for_user(user, now).seal(secret_salt)
}
