use std::sync::Arc;
use std::time::Duration;

use sqlx::any::{AnyArguments, AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Arguments, Error as SqlxError, FromRow};

use crate::dialect::{dialect_for_url, Backend, Dialect};
use crate::env::DatabaseEnv;
use crate::schema::{QueryCriteria, SqlxSchema};

/// A bound parameter. Only integers and text cross the adapter, which keeps the two
/// backends' type systems out of the calling code.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(Option<i64>),
    Text(Option<String>),
}

impl SqlValue {
    fn add_to(&self, args: &mut AnyArguments<'_>) -> Result<(), SqlxError> {
        match self {
            SqlValue::Int(v) => args.add(*v),
            SqlValue::Text(v) => args.add(v.clone()),
        }
        .map_err(SqlxError::Encode)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(Some(v))
    }
}

impl From<Option<i64>> for SqlValue {
    fn from(v: Option<i64>) -> Self {
        SqlValue::Int(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Int(Some(v as i64))
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(Some(v))
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(Some(v.to_string()))
    }
}

impl From<&String> for SqlValue {
    fn from(v: &String) -> Self {
        SqlValue::Text(Some(v.clone()))
    }
}

impl From<Option<String>> for SqlValue {
    fn from(v: Option<String>) -> Self {
        SqlValue::Text(v)
    }
}

impl From<Option<&str>> for SqlValue {
    fn from(v: Option<&str>) -> Self {
        SqlValue::Text(v.map(str::to_string))
    }
}

/// Builds a `Vec<SqlValue>` from heterogeneous values.
#[macro_export]
macro_rules! params {
    () => {
        Vec::<$crate::SqlValue>::new()
    };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::SqlValue::from($value)),+]
    };
}

#[derive(Debug, FromRow)]
pub struct CountRow {
    pub count: i64,
}

/// Pooled handle over either backend.
///
/// `query`, `get`, `run` and `exec` take query text written with `?` placeholders; the
/// dialect picked at connect time rewrites it. Backend errors are returned unchanged.
#[derive(Debug, Clone)]
pub struct Database {
    pool: AnyPool,
    dialect: &'static dyn Dialect,
    init_error: Option<Arc<str>>,
}

impl Database {
    pub async fn connect(env: &DatabaseEnv) -> Result<Self, SqlxError> {
        match &env.database_url {
            Some(url) => {
                tracing::info!("[Database] connecting to PostgreSQL");
                Self::connect_url(url).await
            }
            None if env.vercel => {
                tracing::error!("[Database] running on Vercel but DATABASE_URL is missing, falling back to in-memory SQLite");
                let mut db = Self::connect_url("sqlite::memory:").await?;
                db.init_error = Some(Arc::from("Missing DATABASE_URL on Vercel environment"));
                Ok(db)
            }
            None => {
                tracing::info!("[Database] using local SQLite at {}", env.sqlite_path);
                Self::connect_url(&env.sqlite_url()).await
            }
        }
    }

    pub async fn connect_url(url: &str) -> Result<Self, SqlxError> {
        sqlx::any::install_default_drivers();

        let dialect = dialect_for_url(url);
        let options = if url.contains(":memory:") {
            // every connection to an in-memory sqlite database sees its own empty database
            AnyPoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            AnyPoolOptions::new().max_connections(10)
        };

        let pool = options.connect(url).await?;
        Ok(Self { pool, dialect, init_error: None })
    }

    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    pub fn backend(&self) -> Backend {
        self.dialect.backend()
    }

    pub fn init_error(&self) -> Option<&str> {
        self.init_error.as_deref()
    }

    fn arguments<'q>(params: &[SqlValue]) -> Result<AnyArguments<'q>, SqlxError> {
        let mut args = AnyArguments::default();
        for param in params {
            param.add_to(&mut args)?;
        }
        Ok(args)
    }

    pub async fn query<T>(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<T>, SqlxError>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin,
    {
        let sql = self.dialect.rewrite_placeholders(sql);
        sqlx::query_as_with(&sql, Self::arguments(params)?)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get<T>(&self, sql: &str, params: &[SqlValue]) -> Result<Option<T>, SqlxError>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin,
    {
        let sql = self.dialect.rewrite_placeholders(sql);
        sqlx::query_as_with(&sql, Self::arguments(params)?)
            .fetch_optional(&self.pool)
            .await
    }

    /// Executes a mutation and returns the number of affected rows.
    pub async fn run(&self, sql: &str, params: &[SqlValue]) -> Result<u64, SqlxError> {
        let rewritten = self.dialect.rewrite_placeholders(sql);
        let result = sqlx::query_with(&rewritten, Self::arguments(params)?)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(done.rows_affected()),
            Err(e) => {
                tracing::error!(
                    "[Database::run] {} error: {}\n   Query: {}\n   Params: {}",
                    self.backend(), e, sql.trim(), params.len()
                );
                Err(e)
            }
        }
    }

    /// Raw, possibly multi-statement SQL. No placeholders, no rewriting.
    pub async fn exec(&self, sql: &str) -> Result<(), SqlxError> {
        sqlx::raw_sql(sql).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn count(&self, sql: &str, params: &[SqlValue]) -> Result<i64, SqlxError> {
        Ok(self
            .get::<CountRow>(sql, params)
            .await?
            .map(|row| row.count)
            .unwrap_or(0))
    }

    /// Creates the table and its indexes if they are missing.
    pub async fn create_table<T: SqlxSchema>(&self) -> Result<(), SqlxError> {
        self.exec(&T::create_table_sql(self.dialect)).await?;
        for index_sql in T::INDEXES_SQL {
            self.exec(index_sql).await?;
        }
        Ok(())
    }

    /// Best effort `ADD COLUMN` for each definition; failures (column already there) are ignored.
    pub async fn add_missing_columns<T: SqlxSchema>(&self, column_defs: &[&str]) {
        for column_def in column_defs {
            let sql = self.dialect.add_column_sql(T::TABLE_NAME, column_def);
            if let Err(e) = self.exec(&sql).await {
                tracing::debug!("[{}] column '{}' likely exists or migration skipped: {}", T::TABLE_NAME, column_def, e);
            }
        }
    }

    pub async fn find_by_criteria<T: SqlxSchema>(&self, criteria: QueryCriteria) -> Result<Vec<T>, SqlxError> {
        let (sql, params) = criteria.build(&T::select_sql());
        self.query(&sql, &params).await
    }

    pub async fn find_one_by_criteria<T: SqlxSchema>(&self, criteria: QueryCriteria) -> Result<Option<T>, SqlxError> {
        let (sql, params) = criteria.limit(1).build(&T::select_sql());
        self.get(&sql, &params).await
    }

    pub async fn list_tables(&self) -> Result<Vec<String>, SqlxError> {
        #[derive(FromRow)]
        struct TableName {
            name: String,
        }

        let rows: Vec<TableName> = self.query(self.dialect.list_tables_sql(), &[]).await?;
        Ok(rows.into_iter().map(|row| row.name).collect())
    }
}
