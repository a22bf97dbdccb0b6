use std::borrow::Cow;
use std::fmt::Debug;

use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Backend {
    Sqlite,
    Postgres,
}

/// The handful of things that differ between the two backends.
///
/// Query text everywhere else in the workspace is written once, with `?` placeholders and
/// no backend specific functions, and passed through [`Dialect::rewrite_placeholders`].
/// Time arithmetic is done in Rust and bound as plain integers, so nothing here deals
/// with intervals.
pub trait Dialect: Debug + Send + Sync {
    fn backend(&self) -> Backend;

    /// Rewrites the `?` placeholder convention into the one the backend expects.
    /// `?` inside single-quoted literals is left alone.
    fn rewrite_placeholders<'a>(&self, sql: &'a str) -> Cow<'a, str>;

    /// Column definition for an integer primary key filled in by the backend.
    fn auto_increment_primary_key(&self) -> &'static str;

    fn json_type(&self) -> &'static str;

    /// Placeholder expression for binding a JSON document passed as text.
    fn json_param(&self) -> &'static str;

    fn add_column_sql(&self, table: &str, column_def: &str) -> String;

    /// Lists user tables as a single text column named `name`.
    fn list_tables_sql(&self) -> &'static str;
}

#[derive(Debug)]
pub struct SqliteDialect;

#[derive(Debug)]
pub struct PostgresDialect;

pub static SQLITE: SqliteDialect = SqliteDialect;
pub static POSTGRES: PostgresDialect = PostgresDialect;

impl Dialect for SqliteDialect {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    fn rewrite_placeholders<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(sql)
    }

    fn auto_increment_primary_key(&self) -> &'static str {
        "INTEGER PRIMARY KEY AUTOINCREMENT"
    }

    fn json_type(&self) -> &'static str {
        "TEXT"
    }

    fn json_param(&self) -> &'static str {
        "?"
    }

    fn add_column_sql(&self, table: &str, column_def: &str) -> String {
        // no IF NOT EXISTS on older sqlite; callers ignore the duplicate column error
        format!("ALTER TABLE {table} ADD COLUMN {column_def}")
    }

    fn list_tables_sql(&self) -> &'static str {
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
    }
}

impl Dialect for PostgresDialect {
    fn backend(&self) -> Backend {
        Backend::Postgres
    }

    fn rewrite_placeholders<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        if !sql.contains('?') {
            return Cow::Borrowed(sql);
        }
        Cow::Owned(number_placeholders(sql))
    }

    fn auto_increment_primary_key(&self) -> &'static str {
        "BIGSERIAL PRIMARY KEY"
    }

    fn json_type(&self) -> &'static str {
        "JSONB"
    }

    fn json_param(&self) -> &'static str {
        "CAST(? AS JSONB)"
    }

    fn add_column_sql(&self, table: &str, column_def: &str) -> String {
        format!("ALTER TABLE {table} ADD COLUMN IF NOT EXISTS {column_def}")
    }

    fn list_tables_sql(&self) -> &'static str {
        "SELECT CAST(table_name AS TEXT) AS name FROM information_schema.tables \
         WHERE table_schema = 'public' ORDER BY table_name"
    }
}

/// `?` -> `$1`, `$2`, ... in order of appearance.
fn number_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut index = 0;
    let mut in_literal = false;

    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_literal = !in_literal;
                out.push(ch);
            }
            '?' if !in_literal => {
                index += 1;
                out.push('$');
                out.push_str(&index.to_string());
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Picks the dialect from a connection url scheme.
pub fn dialect_for_url(url: &str) -> &'static dyn Dialect {
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        &POSTGRES
    } else {
        &SQLITE
    }
}
