use std::marker::PhantomData;

use anyhow::{Result, bail};
use sea_query::{Alias, SimpleExpr, Value};

use crate::entity::value_to_datatype;
use crate::filter::Filter;
use crate::model::{Model, column_values, resolve_columns};
use crate::query::{Query, QueryBuilder};

/// Builder for constructing UPDATE queries.
pub struct UpdateBuilder<M: Model> {
    set_clauses: Vec<(&'static str, Value)>,
    filters: Vec<SimpleExpr>,
    _marker: PhantomData<M>,
}

impl<M: Model> Default for UpdateBuilder<M> {
    fn default() -> Self {
        Self {
            set_clauses: Vec::new(),
            filters: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<M: Model> UpdateBuilder<M> {
    /// Creates a new UPDATE query builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `columns` from `entity` on the row matching the entity's `keys`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ModelError::UnknownColumn`] if a key or column is not a field of
    /// the model, or [`crate::ModelError::MissingKeys`] if `keys` is empty.
    pub fn from_entity(entity: &M, keys: &[&str], columns: &[&str]) -> crate::Result<Self> {
        let keys = resolve_columns::<M>(keys)?;
        if keys.is_empty() {
            return Err(crate::ModelError::MissingKeys {
                table: M::descriptor().table_name().to_string(),
            });
        }
        let columns = resolve_columns::<M>(columns)?;

        let mut builder = Self::new();
        builder.set_clauses = columns.iter().copied().zip(column_values(entity, &columns)).collect();
        Ok(builder.r#where(key_filter(entity, &keys)))
    }

    /// Sets a column to a new value.
    #[must_use]
    pub fn set<V>(mut self, column: &'static str, value: V) -> Self
    where
        V: Into<Value>,
    {
        self.set_clauses.push((column, value.into()));
        self
    }

    /// Adds a WHERE clause filter.
    #[must_use]
    pub fn r#where(mut self, filter: Filter) -> Self {
        self.filters.push(filter.into_expr(M::descriptor().table_name()));
        self
    }

    /// Build the UPDATE query.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is set or if query values cannot be converted to SQL
    /// data types.
    pub fn build(self) -> Result<Query> {
        let table = M::descriptor().table_name();
        if self.set_clauses.is_empty() {
            bail!("no columns to update in '{table}'");
        }

        let mut statement = sea_query::Query::update();
        statement.table(Alias::new(table));

        for (column, value) in self.set_clauses {
            statement.value(Alias::new(column), value);
        }

        for expr in self.filters {
            statement.and_where(expr);
        }

        let (sql, values) = statement.build(QueryBuilder::default());
        let query = Query::from_parts(sql, values)?;

        tracing::debug!(
            table,
            sql = %query.sql,
            param_count = query.params.len(),
            "UpdateBuilder generated SQL"
        );

        Ok(query)
    }
}

/// Matches the row identified by the entity's values for `keys`. A `None` key
/// matches with `IS NULL`.
pub(crate) fn key_filter<M: Model>(entity: &M, keys: &[&'static str]) -> Filter {
    Filter::And(
        keys.iter()
            .zip(column_values(entity, keys))
            .map(|(key, value)| {
                if value_to_datatype(value.clone()).is_ok_and(|data| data.is_null()) {
                    Filter::is_null(*key)
                } else {
                    Filter::eq(*key, value)
                }
            })
            .collect(),
    )
}
