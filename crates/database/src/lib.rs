mod dialect;
mod env;
mod schema;
mod sqlx_any;

pub use dialect::{dialect_for_url, Backend, Dialect, PostgresDialect, SqliteDialect, POSTGRES, SQLITE};
pub use env::DatabaseEnv;
pub use schema::{FilterCondition, OrderDirection, QueryCriteria, SqlxSchema};
pub use sqlx_any::{CountRow, Database, SqlValue};

pub use sqlx::any::AnyRow;
pub use sqlx::{Error as SqlxError, FromRow};
