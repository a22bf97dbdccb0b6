use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

use super::{Need, Needs};
use crate::error::CoreError;

/// A need at or above this value is "full" and refuses its interaction.
pub const FULL_THRESHOLD: i64 = 90;
pub const PLAY_MIN_ENERGY: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Interaction {
    Feed,
    Sleep,
    Play,
    Clean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InteractionRejected {
    #[error("Il n'a pas faim !")]
    NotHungry,
    #[error("Il n'est pas fatigué !")]
    NotTired,
    #[error("Il est déjà au top !")]
    AlreadyHappy,
    #[error("Trop fatigué pour jouer...")]
    TooTiredToPlay,
    #[error("Déjà tout propre !")]
    AlreadyClean,
}

impl From<InteractionRejected> for CoreError {
    fn from(rejected: InteractionRejected) -> Self {
        CoreError::Precondition(rejected.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionOutcome {
    pub needs: Needs,
    /// Needs whose column has to be written back, in addition to the clock.
    pub touched: &'static [Need],
    pub message: &'static str,
}

impl Interaction {
    /// Parses an action name coming from a request body.
    pub fn parse(action: &str) -> Result<Self, CoreError> {
        action.parse().map_err(|_| CoreError::validation("Unknown action"))
    }

    pub fn touched(&self) -> &'static [Need] {
        match self {
            Interaction::Feed => &[Need::Hunger, Need::Energy],
            Interaction::Sleep => &[Need::Energy, Need::Hunger],
            Interaction::Play => &[Need::Happiness, Need::Energy, Need::Hunger],
            Interaction::Clean => &[Need::Hygiene, Need::Happiness],
        }
    }

    fn check(&self, needs: &Needs) -> Result<(), InteractionRejected> {
        match self {
            Interaction::Feed if needs.hunger >= FULL_THRESHOLD => Err(InteractionRejected::NotHungry),
            Interaction::Sleep if needs.energy >= FULL_THRESHOLD => Err(InteractionRejected::NotTired),
            Interaction::Play if needs.happiness >= FULL_THRESHOLD => Err(InteractionRejected::AlreadyHappy),
            Interaction::Play if needs.energy < PLAY_MIN_ENERGY => Err(InteractionRejected::TooTiredToPlay),
            Interaction::Clean if needs.hygiene >= FULL_THRESHOLD => Err(InteractionRejected::AlreadyClean),
            _ => Ok(()),
        }
    }

    /// Checks the precondition against `needs` and returns the patched needs.
    /// Pure; persisting the outcome is up to the caller.
    pub fn apply(&self, needs: Needs) -> Result<InteractionOutcome, InteractionRejected> {
        self.check(&needs)?;

        let mut next = needs;
        let message = match self {
            Interaction::Feed => {
                next.adjust(Need::Hunger, 30);
                next.adjust(Need::Energy, -5);
                "Miam ! Machi s'est régalé."
            }
            Interaction::Sleep => {
                next.set(Need::Energy, 100);
                next.adjust(Need::Hunger, -20);
                "Zzz... Machi a bien dormi."
            }
            Interaction::Play => {
                next.adjust(Need::Happiness, 20);
                next.adjust(Need::Energy, -15);
                next.adjust(Need::Hunger, -10);
                "Youpi ! Machi s'est bien amusé."
            }
            Interaction::Clean => {
                next.set(Need::Hygiene, 100);
                next.adjust(Need::Happiness, 5);
                "Tout propre ! Machi brille."
            }
        };

        Ok(InteractionOutcome {
            needs: next,
            touched: self.touched(),
            message,
        })
    }
}
