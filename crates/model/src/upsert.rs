use std::marker::PhantomData;

use anyhow::Result;
use sea_query::Alias;

use crate::insert::InsertBuilder;
use crate::model::{Model, generated_key, resolve_columns};
use crate::query::{Query, QueryBuilder};
use crate::select::table_column;
use crate::update::{UpdateBuilder, key_filter};

/// Builds the statements for an insert-or-update keyed on a set of columns.
///
/// An upsert is run per row as a lookup of the existing row followed by either an
/// UPDATE of the matched row or an INSERT. Running each INSERT on its own lets the
/// caller read back the id generated for every inserted row.
pub struct UpsertBuilder<M: Model> {
    keys: Vec<&'static str>,
    columns: Vec<&'static str>,
    insert_columns: Vec<&'static str>,
    _marker: PhantomData<M>,
}

impl<M: Model> UpsertBuilder<M> {
    /// Creates an upsert matching rows on `keys` and updating `columns` when a row
    /// matches. With no `columns` a matched row is left untouched.
    ///
    /// Inserts write every field except a single integer primary key, unless that
    /// key is one of `keys`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ModelError::UnknownColumn`] if a key or column is not a field of
    /// the model, or [`crate::ModelError::MissingKeys`] if `keys` is empty.
    pub fn new(keys: &[&str], columns: &[&str]) -> crate::Result<Self> {
        let descriptor = M::descriptor();
        let keys = resolve_columns::<M>(keys)?;
        if keys.is_empty() {
            return Err(crate::ModelError::MissingKeys {
                table: descriptor.table_name().to_string(),
            });
        }
        let columns = resolve_columns::<M>(columns)?;

        let generated = generated_key::<M>().filter(|pk| !keys.contains(pk));
        let insert_columns =
            M::projection().iter().copied().filter(|field| Some(*field) != generated).collect();

        Ok(Self {
            keys,
            columns,
            insert_columns,
            _marker: PhantomData,
        })
    }

    /// Columns a row is matched on.
    #[must_use]
    pub fn keys(&self) -> &[&'static str] {
        &self.keys
    }

    /// Columns written when a row matches.
    #[must_use]
    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    /// Columns written when no row matches.
    #[must_use]
    pub fn insert_columns(&self) -> &[&'static str] {
        &self.insert_columns
    }

    /// SELECT returning at most one row whose keys equal the entity's.
    ///
    /// # Errors
    ///
    /// Returns an error if query values cannot be converted to SQL data types.
    pub fn lookup(&self, entity: &M) -> Result<Query> {
        let table = M::descriptor().table_name();
        let mut statement = sea_query::Query::select();
        for key in &self.keys {
            statement.column(table_column(table, key));
        }
        statement
            .from(Alias::new(table))
            .and_where(key_filter(entity, &self.keys).into_expr(table))
            .limit(1);

        let (sql, values) = statement.build(QueryBuilder::default());
        let query = Query::from_parts(sql, values)?;

        tracing::debug!(
            table,
            sql = %query.sql,
            param_count = query.params.len(),
            "UpsertBuilder generated lookup SQL"
        );

        Ok(query)
    }

    /// UPDATE for a matched row, or `None` when matched rows are left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if query values cannot be converted to SQL data types.
    pub fn update(&self, entity: &M) -> Result<Option<Query>> {
        if self.columns.is_empty() {
            return Ok(None);
        }
        let query = UpdateBuilder::from_entity(entity, &self.keys, &self.columns)?.build()?;
        Ok(Some(query))
    }

    /// INSERT for a row with no match.
    ///
    /// # Errors
    ///
    /// Returns an error if query values cannot be converted to SQL data types.
    pub fn insert(&self, entity: &M) -> Result<Query> {
        InsertBuilder::new(&self.insert_columns)?.row(entity).build()
    }
}
