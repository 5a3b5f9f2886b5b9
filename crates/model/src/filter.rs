use sea_query::{Expr, ExprTrait, SimpleExpr, Value};

use crate::error::{ModelError, Result};
use crate::params::Params;
use crate::select::table_column;

/// Filter represents database predicates without exposing ``SeaQuery`` types to model code.
///
/// Values are stored as ``sea_query::Value``; callers pass natural Rust types (i32, String,
/// ``DateTime<Utc>``) which convert via From.
///
/// For filters with an optional table parameter: None uses the model's qualifier (alias or
/// table name), ``Some("table_name")`` uses the specified table (useful for joins).
#[derive(Debug, Clone)]
pub enum Filter {
    /// [table.]column = value
    Eq(Option<String>, String, Value),
    /// [table.]column != value
    Ne(Option<String>, String, Value),
    /// [table.]column > value
    Gt(Option<String>, String, Value),
    /// [table.]column >= value
    Gte(Option<String>, String, Value),
    /// [table.]column < value
    Lt(Option<String>, String, Value),
    /// [table.]column <= value
    Lte(Option<String>, String, Value),
    /// [table.]column IN (values)
    In(Option<String>, String, Vec<Value>),
    /// [table.]column NOT IN (values)
    NotIn(Option<String>, String, Vec<Value>),
    /// [table.]column IS NULL
    IsNull(Option<String>, String),
    /// [table.]column IS NOT NULL
    IsNotNull(Option<String>, String),
    /// [table.]column LIKE pattern
    Like(Option<String>, String, String),
    /// [table.]column BETWEEN low AND high
    Between(Option<String>, String, Value, Value),
    /// Column-to-column comparison: table1.col1 = table2.col2
    ColEq(String, String, String, String),
    /// Logical AND of multiple filters
    And(Vec<Self>),
    /// Logical OR of multiple filters
    Or(Vec<Self>),
    /// Logical NOT of a filter
    Not(Box<Self>),
}

impl Filter {
    fn resolve_column(tbl: Option<&str>, col: &str, default_table: &str) -> SimpleExpr {
        Expr::col(table_column(tbl.unwrap_or(default_table), col)).into()
    }

    /// Convert Filter to a ``SeaQuery`` ``SimpleExpr``, qualifying bare columns with
    /// `default_table`.
    #[must_use]
    pub fn into_expr(self, default_table: &str) -> SimpleExpr {
        match self {
            Self::Eq(tbl, col, val) => Self::resolve_column(tbl.as_deref(), &col, default_table).eq(val),
            Self::Ne(tbl, col, val) => Self::resolve_column(tbl.as_deref(), &col, default_table).ne(val),
            Self::Gt(tbl, col, val) => Self::resolve_column(tbl.as_deref(), &col, default_table).gt(val),
            Self::Gte(tbl, col, val) => {
                Self::resolve_column(tbl.as_deref(), &col, default_table).gte(val)
            }
            Self::Lt(tbl, col, val) => Self::resolve_column(tbl.as_deref(), &col, default_table).lt(val),
            Self::Lte(tbl, col, val) => {
                Self::resolve_column(tbl.as_deref(), &col, default_table).lte(val)
            }
            Self::In(tbl, col, vals) => {
                Self::resolve_column(tbl.as_deref(), &col, default_table).is_in(vals)
            }
            Self::NotIn(tbl, col, vals) => {
                Self::resolve_column(tbl.as_deref(), &col, default_table).is_not_in(vals)
            }
            Self::IsNull(tbl, col) => Self::resolve_column(tbl.as_deref(), &col, default_table).is_null(),
            Self::IsNotNull(tbl, col) => {
                Self::resolve_column(tbl.as_deref(), &col, default_table).is_not_null()
            }
            Self::Like(tbl, col, pattern) => {
                Self::resolve_column(tbl.as_deref(), &col, default_table).like(pattern)
            }
            Self::Between(tbl, col, low, high) => {
                Self::resolve_column(tbl.as_deref(), &col, default_table).between(low, high)
            }
            Self::ColEq(tbl1, col1, tbl2, col2) => {
                Expr::col(table_column(&tbl1, &col1)).eq(Expr::col(table_column(&tbl2, &col2)))
            }
            Self::And(filters) => {
                let mut exprs = filters.into_iter().map(|f| f.into_expr(default_table));
                exprs.next().map_or_else(
                    || Expr::value(true), // no filters, so all conditions satisfied, hence `true`
                    |first| exprs.fold(first, SimpleExpr::and),
                )
            }
            Self::Or(filters) => {
                let mut exprs = filters.into_iter().map(|f| f.into_expr(default_table));
                exprs.next().map_or_else(
                    || Expr::value(false), // no filters, so 0 conditions satisfied, hence `false`
                    |first| exprs.fold(first, SimpleExpr::or),
                )
            }
            Self::Not(filter) => Expr::expr(filter.into_expr(default_table)).not(),
        }
    }

    /// Builds one predicate per entry of a caller-supplied filter map, joined with AND.
    ///
    /// Scalars compare with `=`, `null` with `IS NULL` and arrays with `IN`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidParam`] for object values or arrays holding
    /// non-scalar items.
    pub fn from_params(params: &Params) -> Result<Self> {
        let mut filters = Vec::with_capacity(params.len());
        for (column, value) in params {
            let filter = match value {
                serde_json::Value::Null => Self::is_null(column.as_str()),
                serde_json::Value::Array(items) => {
                    let values = items
                        .iter()
                        .map(|item| json_to_value(column, item))
                        .collect::<Result<Vec<_>>>()?;
                    Self::r#in(column.as_str(), values)
                }
                scalar => Self::eq(column.as_str(), json_to_value(column, scalar)?),
            };
            filters.push(filter);
        }
        Ok(Self::And(filters))
    }

    // Convenience constructors for common single-table queries

    /// Creates an equality filter (column = value).
    #[must_use]
    pub fn eq(col: impl Into<String>, val: impl Into<Value>) -> Self {
        Self::Eq(None, col.into(), val.into())
    }

    /// Creates an inequality filter (column != value).
    #[must_use]
    pub fn ne(col: impl Into<String>, val: impl Into<Value>) -> Self {
        Self::Ne(None, col.into(), val.into())
    }

    /// Creates a greater-than filter (column > value).
    #[must_use]
    pub fn gt(col: impl Into<String>, val: impl Into<Value>) -> Self {
        Self::Gt(None, col.into(), val.into())
    }

    /// Creates a greater-than-or-equal filter (column >= value).
    #[must_use]
    pub fn gte(col: impl Into<String>, val: impl Into<Value>) -> Self {
        Self::Gte(None, col.into(), val.into())
    }

    /// Creates a less-than filter (column < value).
    #[must_use]
    pub fn lt(col: impl Into<String>, val: impl Into<Value>) -> Self {
        Self::Lt(None, col.into(), val.into())
    }

    /// Creates a less-than-or-equal filter (column <= value).
    #[must_use]
    pub fn lte(col: impl Into<String>, val: impl Into<Value>) -> Self {
        Self::Lte(None, col.into(), val.into())
    }

    /// Creates an IN filter (column IN (values)).
    #[must_use]
    pub fn r#in(col: impl Into<String>, vals: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::In(None, col.into(), vals.into_iter().map(Into::into).collect())
    }

    /// Creates a NOT IN filter (column NOT IN (values)).
    #[must_use]
    pub fn not_in(col: impl Into<String>, vals: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::NotIn(None, col.into(), vals.into_iter().map(Into::into).collect())
    }

    /// Creates an IS NULL filter.
    #[must_use]
    pub fn is_null(col: impl Into<String>) -> Self {
        Self::IsNull(None, col.into())
    }

    /// Creates an IS NOT NULL filter.
    #[must_use]
    pub fn is_not_null(col: impl Into<String>) -> Self {
        Self::IsNotNull(None, col.into())
    }

    /// Creates a LIKE filter with pattern matching.
    #[must_use]
    pub fn like(col: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Like(None, col.into(), pattern.into())
    }

    /// Creates a BETWEEN filter (column BETWEEN low AND high).
    #[must_use]
    pub fn between(col: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::Between(None, col.into(), low.into(), high.into())
    }

    /// Creates a table-qualified equality filter (table.column = value).
    #[must_use]
    pub fn table_eq(table: impl Into<String>, col: impl Into<String>, val: impl Into<Value>) -> Self {
        Self::Eq(Some(table.into()), col.into(), val.into())
    }

    /// Compare two columns for equality.
    /// Table names are required since we're comparing columns from different tables.
    #[must_use]
    pub fn col_eq(
        table1: impl Into<String>, col1: impl Into<String>, table2: impl Into<String>,
        col2: impl Into<String>,
    ) -> Self {
        Self::ColEq(table1.into(), col1.into(), table2.into(), col2.into())
    }
}

/// Converts a scalar JSON parameter into a query value.
pub(crate) fn json_to_value(param: &str, value: &serde_json::Value) -> Result<Value> {
    match value {
        serde_json::Value::Bool(v) => Ok(Value::from(*v)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Value::from)
            .or_else(|| n.as_u64().map(Value::from))
            .or_else(|| n.as_f64().map(Value::from))
            .ok_or_else(|| ModelError::invalid_param(param, format!("unsupported number {n}"))),
        serde_json::Value::String(s) => Ok(Value::from(s.clone())),
        serde_json::Value::Null => Ok(Value::String(None)),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            Err(ModelError::invalid_param(param, "expected a scalar value"))
        }
    }
}
