use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use machi_core::mascot::InteractionRejected;
use machi_core::{Interaction, MascotStats, MascotUpdate, UserProfile};

use crate::api::{ApiClient, ApiError};

#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error("no local snapshot, refresh first")]
    Empty,

    #[error(transparent)]
    Rejected(#[from] InteractionRejected),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed to access the mirror file: {0}")]
    Io(#[from] std::io::Error),

    #[error("mirror file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// An optimistic patch that has been applied locally and is waiting for the server.
/// Holds the needs as they were before the patch.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a pending interaction must be reconciled or rolled back"]
pub struct PendingInteraction {
    pub action: Interaction,
    pub message: &'static str,
    backup: MascotStats,
}

impl PendingInteraction {
    pub fn backup(&self) -> &MascotStats {
        &self.backup
    }
}

/// Local copy of the signed-in user's profile.
///
/// Interactions are applied here first with the same rules the server uses, so the UI
/// can update at once. Whatever the server answers replaces the local guess.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientMirror {
    snapshot: Option<UserProfile>,
}

impl ClientMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_profile(profile: UserProfile) -> Self {
        Self { snapshot: Some(profile) }
    }

    pub fn snapshot(&self) -> Option<&UserProfile> {
        self.snapshot.as_ref()
    }

    pub fn begin_interaction(&mut self, action: Interaction) -> Result<PendingInteraction, MirrorError> {
        let profile = self.snapshot.as_mut().ok_or(MirrorError::Empty)?;
        let outcome = action.apply(profile.stats.needs)?;

        let backup = profile.stats;
        profile.stats.needs = outcome.needs;
        Ok(PendingInteraction { action, message: outcome.message, backup })
    }

    /// The server's stats always win over the optimistic patch.
    pub fn reconcile(&mut self, pending: PendingInteraction, server: MascotStats) {
        if let Some(profile) = self.snapshot.as_mut() {
            if profile.stats.needs != server.needs {
                tracing::debug!("[ClientMirror] server disagreed with the local {} patch", pending.action);
            }
            profile.stats = server;
        }
    }

    pub fn rollback(&mut self, pending: PendingInteraction) {
        if let Some(profile) = self.snapshot.as_mut() {
            profile.stats = pending.backup;
        }
    }

    /// Optimistic patch, request, then reconcile or roll back.
    pub async fn interact(&mut self, api: &ApiClient, action: Interaction) -> Result<MascotUpdate, MirrorError> {
        let pending = self.begin_interaction(action)?;
        match api.interact(action).await {
            Ok(update) => {
                self.reconcile(pending, update.stats);
                Ok(update)
            }
            Err(e) => {
                self.rollback(pending);
                Err(e.into())
            }
        }
    }

    /// Replaces the snapshot with the server's decayed view.
    pub async fn refresh(&mut self, api: &ApiClient) -> Result<&UserProfile, MirrorError> {
        let profile = api.me().await?;
        Ok(&*self.snapshot.insert(profile))
    }

    /// Local progression only; returns whether the mascot levelled up.
    pub fn add_xp(&mut self, amount: i64) -> Result<bool, MirrorError> {
        let profile = self.snapshot.as_mut().ok_or(MirrorError::Empty)?;
        Ok(profile.progress.gain_xp(amount))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), MirrorError> {
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MirrorError> {
        Ok(serde_json::from_slice(&fs::read(path)?)?)
    }
}
