use std::sync::Arc;

use machi_database::Database;

use crate::env::ApiServerEnv;

#[derive(Clone)]
pub struct GlobalState {
    pub db: Database,
    pub env: Arc<ApiServerEnv>,
}

impl GlobalState {
    pub fn new(db: Database, env: ApiServerEnv) -> Self {
        Self { db, env: Arc::new(env) }
    }
}
