use std::marker::PhantomData;

use anyhow::Result;
use sea_query::{Alias, SimpleExpr};

use crate::filter::Filter;
use crate::model::Model;
use crate::params::Params;
use crate::query::{Query, QueryBuilder};

/// Builder for constructing DELETE queries.
pub struct DeleteBuilder<M: Model> {
    filters: Vec<SimpleExpr>,
    _marker: PhantomData<M>,
}

impl<M: Model> Default for DeleteBuilder<M> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<M: Model> DeleteBuilder<M> {
    /// Creates a new DELETE query builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a DELETE matching every entry of `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ModelError::InvalidParam`] if a filter value is an object.
    pub fn from_params(filter: &Params) -> crate::Result<Self> {
        if filter.is_empty() {
            return Ok(Self::new());
        }
        Ok(Self::new().r#where(Filter::from_params(filter)?))
    }

    /// Adds a WHERE clause filter.
    #[must_use]
    pub fn r#where(mut self, filter: Filter) -> Self {
        self.filters.push(filter.into_expr(M::descriptor().table_name()));
        self
    }

    /// Whether the statement has no WHERE clause and so removes every row.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.filters.is_empty()
    }

    /// Build the DELETE query.
    ///
    /// # Errors
    ///
    /// Returns an error if any query values cannot be converted to SQL data types.
    pub fn build(self) -> Result<Query> {
        let table = M::descriptor().table_name();
        let mut statement = sea_query::Query::delete();
        statement.from_table(Alias::new(table));

        for filter in self.filters {
            statement.and_where(filter);
        }

        let (sql, values) = statement.build(QueryBuilder::default());
        let query = Query::from_parts(sql, values)?;

        tracing::debug!(
            table,
            sql = %query.sql,
            param_count = query.params.len(),
            "DeleteBuilder generated SQL"
        );

        Ok(query)
    }
}
