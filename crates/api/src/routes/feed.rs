use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use machi_core::FeedItem;

use crate::{
    response::{AppError, AppSuccess, OrInternal},
    utils::parse_limit,
    GlobalState,
};

pub fn feed_routes() -> Router<GlobalState> {
    Router::new()
        .route("/feed",
            get(list)
        )
        .route("/feed/{item_id}",
            get(item)
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub limit: Option<String>,
}

async fn list(
    State(state): State<GlobalState>,
    Query(query): Query<FeedQuery>,
) -> Result<AppSuccess, AppError> {
    let items = FeedItem::list(&state.db, query.item_type.as_deref(), parse_limit(query.limit.as_deref()))
        .await
        .or_500("Failed to get feed")?;

    Ok(AppSuccess::ok(json!({ "items": items })))
}

async fn item(
    State(state): State<GlobalState>,
    Path(item_id): Path<String>,
) -> Result<AppSuccess, AppError> {
    let item = FeedItem::get(&state.db, &item_id)
        .await
        .or_500("Failed to get feed item")?;

    Ok(AppSuccess::ok(json!({ "item": item })))
}
