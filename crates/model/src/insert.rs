use std::marker::PhantomData;

use anyhow::{Result, bail};
use sea_query::{Alias, SimpleExpr, Value};

use crate::model::{Model, column_values, resolve_columns};
use crate::query::{Query, QueryBuilder};

/// Builder for constructing INSERT queries.
///
/// Every row writes the same column list, fixed when the builder is created.
pub struct InsertBuilder<M: Model> {
    columns: Vec<&'static str>,
    rows: Vec<Vec<Value>>,
    _marker: PhantomData<M>,
}

impl<M: Model> InsertBuilder<M> {
    /// Creates an INSERT writing `columns`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ModelError::UnknownColumn`] if a column is not a field of the model.
    pub fn new(columns: &[&str]) -> crate::Result<Self> {
        Ok(Self {
            columns: resolve_columns::<M>(columns)?,
            rows: Vec::new(),
            _marker: PhantomData,
        })
    }

    /// Columns written by each row.
    #[must_use]
    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    /// Appends a row populated from an entity instance.
    #[must_use]
    pub fn row(mut self, entity: &M) -> Self {
        self.rows.push(column_values(entity, &self.columns));
        self
    }

    /// Appends a row for each entity, in order.
    #[must_use]
    pub fn rows<'a>(mut self, entities: impl IntoIterator<Item = &'a M>) -> Self {
        for entity in entities {
            self.rows.push(column_values(entity, &self.columns));
        }
        self
    }

    /// Build the INSERT query.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no rows or no columns, or if any query values cannot
    /// be converted to SQL data types.
    pub fn build(self) -> Result<Query> {
        let table = M::descriptor().table_name();
        if self.rows.is_empty() {
            bail!("no rows to insert into '{table}'");
        }
        if self.columns.is_empty() {
            bail!("no columns to insert into '{table}'");
        }

        let mut statement = sea_query::Query::insert();
        statement.into_table(Alias::new(table));
        statement.columns(self.columns.iter().map(|column| Alias::new(*column)));

        for row in self.rows {
            statement.values(row.into_iter().map(SimpleExpr::Value))?;
        }

        let (sql, values) = statement.build(QueryBuilder::default());
        let query = Query::from_parts(sql, values)?;

        tracing::debug!(
            table,
            sql = %query.sql,
            param_count = query.params.len(),
            "InsertBuilder generated SQL"
        );

        Ok(query)
    }
}
