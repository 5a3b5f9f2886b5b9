use std::collections::HashMap;

use sea_query::Value;

use crate::connection::Provider;
use crate::descriptor::ModelDescriptor;
use crate::entity::{Entity, EntityValues};
use crate::error::{ModelError, Result};
use crate::operations::ModelOperations;
use crate::params::{ModelParams, Params};
use crate::result::{DeleteResult, InsertResult, UpdateResult, UpsertResult};
use crate::select::SelectBuilder;

/// A persisted entity: table metadata plus the entity's own select-building logic.
///
/// The CRUD methods are provided and forward to [`ModelOperations`].
///
/// # Examples
///
/// ```ignore
/// entity! {
///     #[derive(Debug, Clone, Default)]
///     pub struct Post {
///         pub id: i64,
///         pub title: String,
///     }
/// }
///
/// impl Model for Post {
///     fn descriptor() -> &'static ModelDescriptor {
///         static DESCRIPTOR: LazyLock<ModelDescriptor> = LazyLock::new(|| {
///             ModelDescriptor::new("blog", "posts").with_primary_key_names(["id"])
///         });
///         &DESCRIPTOR
///     }
///
///     fn build_select_query(
///         query: SelectBuilder<Self>, params: &mut ModelParams,
///     ) -> model::Result<SelectBuilder<Self>> {
///         if params.exists("title") {
///             if let Some(title) = params.get_as::<String>("title")? {
///                 return Ok(query.r#where(Filter::eq("title", title)));
///             }
///         }
///         Ok(query)
///     }
/// }
/// ```
pub trait Model: Entity + EntityValues + Sized + 'static {
    /// Table metadata. Implementations should return a lazily initialized static.
    fn descriptor() -> &'static ModelDescriptor;

    /// Adds model-specific clauses to `query`, consuming the params it understands.
    ///
    /// # Errors
    ///
    /// Implementations return an error when a parameter is unreadable or malformed.
    fn build_select_query(
        query: SelectBuilder<Self>, _params: &mut ModelParams,
    ) -> Result<SelectBuilder<Self>> {
        Ok(query)
    }

    /// See [`ModelOperations::get_query`].
    ///
    /// # Errors
    ///
    /// See [`ModelOperations::get_query`].
    fn get_query(params: Params) -> Result<SelectBuilder<Self>> {
        ModelOperations::<Self>::get_query(params)
    }

    /// See [`ModelOperations::get_rows`].
    ///
    /// # Errors
    ///
    /// See [`ModelOperations::get_rows`].
    fn get_rows(provider: &dyn Provider, params: Params) -> Result<Vec<Self>> {
        ModelOperations::<Self>::get_rows(provider, params)
    }

    /// See [`ModelOperations::get_first`].
    ///
    /// # Errors
    ///
    /// See [`ModelOperations::get_first`].
    fn get_first(provider: &dyn Provider, params: Params) -> Result<Option<Self>> {
        ModelOperations::<Self>::get_first(provider, params)
    }

    /// See [`ModelOperations::get_last`].
    ///
    /// # Errors
    ///
    /// See [`ModelOperations::get_last`].
    fn get_last(provider: &dyn Provider, params: Params) -> Result<Option<Self>> {
        ModelOperations::<Self>::get_last(provider, params)
    }

    /// See [`ModelOperations::insert`].
    ///
    /// # Errors
    ///
    /// See [`ModelOperations::insert`].
    fn insert(&mut self, provider: &dyn Provider, columns: &[&str]) -> Result<InsertResult> {
        ModelOperations::<Self>::insert(provider, self, columns)
    }

    /// See [`ModelOperations::insert_many`].
    ///
    /// # Errors
    ///
    /// See [`ModelOperations::insert_many`].
    fn insert_many(
        provider: &dyn Provider, data: &mut [Self], columns: &[&str],
    ) -> Result<InsertResult> {
        ModelOperations::<Self>::insert_many(provider, data, columns)
    }

    /// See [`ModelOperations::update`].
    ///
    /// # Errors
    ///
    /// See [`ModelOperations::update`].
    fn update(&self, provider: &dyn Provider, keys: &[&str], columns: &[&str]) -> Result<UpdateResult> {
        ModelOperations::<Self>::update(provider, self, keys, columns)
    }

    /// See [`ModelOperations::upsert`].
    ///
    /// # Errors
    ///
    /// See [`ModelOperations::upsert`].
    fn upsert(
        &mut self, provider: &dyn Provider, keys: &[&str], columns: &[&str],
    ) -> Result<UpsertResult> {
        ModelOperations::<Self>::upsert(provider, self, keys, columns)
    }

    /// See [`ModelOperations::upsert_many`].
    ///
    /// # Errors
    ///
    /// See [`ModelOperations::upsert_many`].
    fn upsert_many(
        provider: &dyn Provider, data: &mut [Self], keys: &[&str], columns: &[&str],
    ) -> Result<UpsertResult> {
        ModelOperations::<Self>::upsert_many(provider, data, keys, columns)
    }

    /// See [`ModelOperations::delete`].
    ///
    /// # Errors
    ///
    /// See [`ModelOperations::delete`].
    fn delete(provider: &dyn Provider, filter: Params) -> Result<DeleteResult> {
        ModelOperations::<Self>::delete(provider, filter)
    }
}

/// Maps caller-supplied column names onto the model's fields, dropping duplicates.
pub(crate) fn resolve_columns<M: Model>(columns: &[&str]) -> Result<Vec<&'static str>> {
    let projection = M::projection();
    let mut resolved = Vec::with_capacity(columns.len());

    for column in columns {
        let Some(field) = projection.iter().find(|field| **field == *column) else {
            return Err(ModelError::UnknownColumn {
                table: M::descriptor().table_name().to_string(),
                column: (*column).to_string(),
            });
        };
        if !resolved.contains(field) {
            resolved.push(*field);
        }
    }

    Ok(resolved)
}

/// The entity's values for `columns`, in the same order.
pub(crate) fn column_values<M: EntityValues>(entity: &M, columns: &[&'static str]) -> Vec<Value> {
    let mut values: HashMap<&str, Value> = entity.__to_values().into_iter().collect();
    columns.iter().filter_map(|column| values.remove(column)).collect()
}

/// The single primary key when it is an integer field the database can generate.
pub(crate) fn generated_key<M: Model>() -> Option<&'static str> {
    let pk = M::descriptor().single_primary_key()?;
    M::projection().iter().copied().find(|field| *field == pk && M::__is_integer(field))
}
