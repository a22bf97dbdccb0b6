mod error;
mod flag;

pub mod contest;
pub mod feed;
pub mod game;
pub mod loyalty;
pub mod mascot;
pub mod schema;
pub mod user;

pub use error::{CoreError, CoreResult};

pub use contest::{Contest, ContestEntry, ContestEntryDetails};
pub use feed::FeedItem;
pub use game::{GameScore, LeaderboardEntry, ScoreOutcome};
pub use loyalty::{Milestone, PointsLog, PointsReason, Reward, MILESTONES};
pub use mascot::{Interaction, MascotProgress, MascotStats, MascotUpdate, Need, Needs, Stage};
pub use schema::init_schema;
pub use user::{NewUser, User, UserProfile};
