use sqlx::any::AnyRow;
use sqlx::FromRow;

use crate::dialect::Dialect;
use crate::sqlx_any::SqlValue;

/// Table level description of a record type.
pub trait SqlxSchema: for<'r> FromRow<'r, AnyRow> + Send + Unpin {
    const TABLE_NAME: &'static str;
    /// Select list, in `FromRow` field order. Entries may be expressions with an alias.
    const COLUMNS: &'static [&'static str];
    const INDEXES_SQL: &'static [&'static str];

    fn create_table_sql(dialect: &dyn Dialect) -> String;

    fn select_sql() -> String {
        format!("SELECT {} FROM {}", Self::COLUMNS.join(", "), Self::TABLE_NAME)
    }
}

/// Specifies the direction for ordering query results.
#[derive(Debug, Clone, Copy)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// Represents a single filter condition for a database query.
#[derive(Debug, Clone)]
pub struct FilterCondition {
    pub column: &'static str,
    pub operator: &'static str,
    /// Holds the value for the condition's placeholder, if any.
    pub value: Option<SqlValue>,
}

/// Builder for the `WHERE` / `ORDER BY` / `LIMIT` tail of a select.
#[derive(Debug, Default, Clone)]
pub struct QueryCriteria {
    pub conditions: Vec<FilterCondition>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub order_by: Vec<(&'static str, OrderDirection)>,
}

impl QueryCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// A condition without a bound value, e.g. `("used_at", "IS NULL")`.
    pub fn add_filter(mut self, column: &'static str, operator: &'static str) -> Self {
        self.conditions.push(FilterCondition { column, operator, value: None });
        self
    }

    pub fn add_valued_filter<V: Into<SqlValue>>(mut self, column: &'static str, operator: &'static str, value: V) -> Self {
        self.conditions.push(FilterCondition {
            column,
            operator,
            value: Some(value.into()),
        });
        self
    }

    pub fn limit(mut self, limit_val: i64) -> Self {
        self.limit = Some(limit_val);
        self
    }

    pub fn offset(mut self, offset_val: i64) -> Self {
        self.offset = Some(offset_val);
        self
    }

    pub fn order_by(mut self, column: &'static str, direction: OrderDirection) -> Self {
        self.order_by.push((column, direction));
        self
    }

    /// Appends the criteria to `base` and returns the query text with its parameters.
    pub fn build(self, base: &str) -> (String, Vec<SqlValue>) {
        let mut sql = base.to_string();
        let mut params = Vec::new();

        for (i, condition) in self.conditions.into_iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            sql.push_str(condition.column);
            sql.push(' ');
            sql.push_str(condition.operator);
            if let Some(value) = condition.value {
                sql.push_str(" ?");
                params.push(value);
            }
        }

        if !self.order_by.is_empty() {
            let order = self
                .order_by
                .iter()
                .map(|(column, direction)| format!("{} {}", column, direction.as_sql()))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            params.push(SqlValue::from(limit));
        }
        if let Some(offset) = self.offset {
            sql.push_str(" OFFSET ?");
            params.push(SqlValue::from(offset));
        }

        (sql, params)
    }
}
