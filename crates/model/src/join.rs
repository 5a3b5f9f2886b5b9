use sea_query::{JoinType, SimpleExpr};

use crate::filter::Filter;

/// A JOIN added to a select query by model-specific query building.
#[derive(Debug, Clone)]
pub struct Join {
    table: String,
    alias: Option<String>,
    on: Filter,
    kind: JoinType,
}

impl Join {
    /// Creates an INNER JOIN.
    #[must_use]
    pub fn inner(table: impl Into<String>, on: Filter) -> Self {
        Self::with_kind(table, on, JoinType::InnerJoin)
    }

    /// Creates a LEFT JOIN.
    #[must_use]
    pub fn left(table: impl Into<String>, on: Filter) -> Self {
        Self::with_kind(table, on, JoinType::LeftJoin)
    }

    /// Creates a RIGHT JOIN.
    #[must_use]
    pub fn right(table: impl Into<String>, on: Filter) -> Self {
        Self::with_kind(table, on, JoinType::RightJoin)
    }

    /// Creates a FULL OUTER JOIN.
    #[must_use]
    pub fn full(table: impl Into<String>, on: Filter) -> Self {
        Self::with_kind(table, on, JoinType::FullOuterJoin)
    }

    fn with_kind(table: impl Into<String>, on: Filter, kind: JoinType) -> Self {
        Self {
            table: table.into(),
            alias: None,
            on,
            kind,
        }
    }

    /// Sets an alias for the joined table.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Resolves the ON condition against `qualifier`, the selecting model's alias or
    /// table name.
    pub(crate) fn into_spec(self, qualifier: &str) -> JoinSpec {
        JoinSpec {
            table: self.table,
            alias: self.alias,
            on: self.on.into_expr(qualifier),
            kind: self.kind,
        }
    }
}

pub(crate) struct JoinSpec {
    pub table: String,
    pub alias: Option<String>,
    pub on: SimpleExpr,
    pub kind: JoinType,
}
