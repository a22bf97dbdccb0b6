mod auth;
mod contests;
mod feed;
mod game;
mod loyalty;
mod misc;
mod referrals;
mod user;

pub use auth::auth_routes;
pub use contests::contest_routes;
pub use feed::feed_routes;
pub use game::game_routes;
pub use loyalty::loyalty_routes;
pub use misc::misc_routes;
pub use referrals::referral_routes;
pub use user::user_routes;
