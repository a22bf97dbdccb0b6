mod env;
mod global_state;
mod middleware;
mod response;
mod routes;
mod token;
mod utils;

use axum::{http::StatusCode, Router};

pub use routes::{
    auth_routes,
    contest_routes,
    feed_routes,
    game_routes,
    loyalty_routes,
    misc_routes,
    referral_routes,
    user_routes,
};

pub use env::ApiServerEnv;
pub use global_state::GlobalState;
pub use middleware::authenticate;
pub use response::{AppError, AppSuccess, OrInternal};
pub use token::{issue_token, AuthenticatedRequest, TOKEN_VALIDITY_DAYS};
pub use utils::setup_tracing;

/// Every route under `/api`, with state attached. Unknown paths get a JSON 404.
pub fn app_router(state: GlobalState) -> Router {
    let api = Router::new()
        .merge(auth_routes())
        .merge(user_routes(state.clone()))
        .merge(loyalty_routes(state.clone()))
        .merge(contest_routes(state.clone()))
        .merge(game_routes(state.clone()))
        .merge(feed_routes())
        .merge(referral_routes(state.clone()))
        .merge(misc_routes());

    Router::new()
        .nest("/api", api)
        .fallback(|| async { AppError::new(StatusCode::NOT_FOUND, anyhow::anyhow!("Not found")) })
        .with_state(state)
}
