//! Generic CRUD dispatch for [`Model`] types.
//!
//! Select queries accept these well-known parameters next to the model's own:
//!
//! - `@orderBy`: `"col"`, `"col DESC"`, `"-col"`, a comma-separated list or array of
//!   those, or an object mapping columns to `"ASC"` / `"DESC"`.
//! - `@limit`: maximum number of rows. `@offset` (default 0) is honored only with it.
//! - `@page`: 1-based page number. `@pageSize` (default 500) is honored only with it.
//!   Paging overrides `@limit`.
//!
//! A well-known key set to `null` is consumed and ignored.

use std::any::{Any, type_name};
use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;

use crate::connection::{Connection, Provider};
use crate::delete::DeleteBuilder;
use crate::error::{ModelError, Result};
use crate::insert::InsertBuilder;
use crate::model::{Model, generated_key};
use crate::params::{ModelParams, Params};
use crate::result::{DeleteResult, InsertResult, UpdateResult, UpsertInsert, UpsertResult};
use crate::select::{OrderSpec, SelectBuilder};
use crate::types::DataType;
use crate::update::UpdateBuilder;
use crate::upsert::UpsertBuilder;

const ORDER_BY: &str = "@orderBy";
const LIMIT: &str = "@limit";
const OFFSET: &str = "@offset";
const PAGE: &str = "@page";
const PAGE_SIZE: &str = "@pageSize";
const DEFAULT_PAGE_SIZE: u64 = 500;

/// Shared select, insert, update, upsert and delete logic for a model type.
pub struct ModelOperations<M: Model>(PhantomData<M>);

impl<M: Model> ModelOperations<M> {
    /// Builds the select query for `params`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ParamUnchecked`] if the model reads a parameter it did not
    /// check, [`ModelError::InvalidParam`] for a malformed well-known parameter, and
    /// [`ModelError::UnusedParams`] if any parameter was left unread.
    pub fn get_query(params: Params) -> Result<SelectBuilder<M>> {
        let mut params = ModelParams::new(params);
        let mut query = M::build_select_query(SelectBuilder::new(), &mut params)?;

        if params.exists(ORDER_BY) {
            for spec in order_specs(&params.get(ORDER_BY)?)? {
                query = query.order(spec);
            }
        }

        if params.exists(LIMIT) {
            let limit = count_param(&mut params, LIMIT)?;
            let offset =
                if params.exists(OFFSET) { count_param(&mut params, OFFSET)? } else { None };
            if let Some(limit) = limit {
                query = query.limit(limit, offset.unwrap_or(0));
            }
        }

        if params.exists(PAGE) {
            let page = count_param(&mut params, PAGE)?;
            let page_size =
                if params.exists(PAGE_SIZE) { count_param(&mut params, PAGE_SIZE)? } else { None };
            if let Some(page) = page {
                if page == 0 {
                    return Err(ModelError::invalid_param(PAGE, "pages start at 1"));
                }
                let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
                if page_size == 0 {
                    return Err(ModelError::invalid_param(PAGE_SIZE, "must be at least 1"));
                }
                query = query.paginate(page, page_size);
            }
        }

        params.check_used()?;
        Ok(query)
    }

    /// Fetches every model matching `params`.
    ///
    /// # Errors
    ///
    /// Returns any [`Self::get_query`] error, or [`ModelError::Sql`] if the query fails
    /// or a row cannot be mapped.
    pub fn get_rows(provider: &dyn Provider, params: Params) -> Result<Vec<M>> {
        let query = Self::get_query(params)?.build()?;
        let rows = Self::connect(provider)?.query(&query)?;

        tracing::debug!(table = M::descriptor().table_name(), rows = rows.len(), "fetched rows");

        let models = rows.iter().map(M::from_row).collect::<anyhow::Result<Vec<_>>>()?;
        Ok(models)
    }

    /// Fetches the first model matching `params`.
    ///
    /// # Errors
    ///
    /// See [`Self::get_rows`].
    pub fn get_first(provider: &dyn Provider, params: Params) -> Result<Option<M>> {
        Ok(Self::get_rows(provider, params)?.into_iter().next())
    }

    /// Fetches the last model matching `params`.
    ///
    /// # Errors
    ///
    /// See [`Self::get_rows`].
    pub fn get_last(provider: &dyn Provider, params: Params) -> Result<Option<M>> {
        Ok(Self::get_rows(provider, params)?.pop())
    }

    /// Inserts `data`, writing `columns` or, when empty, every field except a single
    /// integer primary key.
    ///
    /// The id reported by the database is assigned back only when the model has a
    /// single integer primary key and `columns` leaves it out. A primary key listed in
    /// `columns`, or one that is not an integer, keeps the caller's value.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownColumn`] for a column that is not a field, or
    /// [`ModelError::Sql`] if the statement fails.
    pub fn insert(provider: &dyn Provider, data: &mut M, columns: &[&str]) -> Result<InsertResult> {
        Self::insert_rows(provider, vec![data], columns)
    }

    /// Inserts every item of `data` in a single statement.
    ///
    /// Generated ids are assigned as `first + i` in input order, so the store must hand
    /// out contiguous ids to the rows of one statement.
    ///
    /// # Errors
    ///
    /// See [`Self::insert`].
    pub fn insert_many(
        provider: &dyn Provider, data: &mut [M], columns: &[&str],
    ) -> Result<InsertResult> {
        Self::insert_rows(provider, data.iter_mut().collect(), columns)
    }

    /// Updates the row matching `data` on `keys`, or on the primary keys when `keys` is
    /// empty. Writes `columns`, or every non-key field when empty.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingKeys`] when no keys are given or declared,
    /// [`ModelError::UnknownColumn`] for a column that is not a field, or
    /// [`ModelError::Sql`] if the statement fails.
    pub fn update(
        provider: &dyn Provider, data: &M, keys: &[&str], columns: &[&str],
    ) -> Result<UpdateResult> {
        let keys = Self::keys(keys)?;
        let columns: Vec<&str> = if columns.is_empty() {
            M::projection().iter().copied().filter(|field| !keys.contains(field)).collect()
        } else {
            columns.to_vec()
        };

        let builder = UpdateBuilder::from_entity(data, &keys, &columns)?;
        if columns.is_empty() {
            tracing::debug!(table = M::descriptor().table_name(), "nothing to update");
            return Ok(UpdateResult::default());
        }

        let execution = Self::connect(provider)?.exec(&builder.build()?)?;
        Ok(UpdateResult {
            rows_affected: execution.rows_affected,
        })
    }

    /// Inserts `data`, or updates `columns` of the row matching it on `keys`.
    ///
    /// # Errors
    ///
    /// See [`Self::upsert_many`].
    pub fn upsert(
        provider: &dyn Provider, data: &mut M, keys: &[&str], columns: &[&str],
    ) -> Result<UpsertResult> {
        Self::upsert_rows(provider, vec![data], keys, columns)
    }

    /// Upserts every item of `data`, in order.
    ///
    /// Each item is looked up by `keys` (the primary keys when empty). A matched row has
    /// `columns` updated and is left untouched when `columns` is empty. An unmatched
    /// item is inserted and receives its generated id.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingKeys`] when no keys are given or declared,
    /// [`ModelError::UnknownColumn`] for a column that is not a field, or
    /// [`ModelError::Sql`] if a statement fails. Rows processed before a failure stay
    /// written.
    pub fn upsert_many(
        provider: &dyn Provider, data: &mut [M], keys: &[&str], columns: &[&str],
    ) -> Result<UpsertResult> {
        Self::upsert_rows(provider, data.iter_mut().collect(), keys, columns)
    }

    /// Deletes every row matching `filter`: scalars compare with `=`, `null` with
    /// `IS NULL` and arrays with `IN`. An empty filter deletes every row.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidParam`] for an object filter value, or
    /// [`ModelError::Sql`] if the statement fails.
    pub fn delete(provider: &dyn Provider, filter: Params) -> Result<DeleteResult> {
        let builder = DeleteBuilder::<M>::from_params(&filter)?;
        if builder.is_unfiltered() {
            tracing::warn!(table = M::descriptor().table_name(), "deleting without a filter");
        }

        let execution = Self::connect(provider)?.exec(&builder.build()?)?;
        Ok(DeleteResult {
            rows_affected: execution.rows_affected,
        })
    }

    /// [`Self::insert`] for a value whose type is only known at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeMismatch`] if `data` is not an `M`, otherwise see
    /// [`Self::insert`].
    pub fn insert_any(
        provider: &dyn Provider, data: &mut dyn Any, columns: &[&str],
    ) -> Result<InsertResult> {
        let data = data.downcast_mut::<M>().ok_or_else(Self::type_mismatch)?;
        Self::insert(provider, data, columns)
    }

    /// [`Self::insert_many`] for values whose type is only known at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ItemTypeMismatch`] for the first item that is not an `M`,
    /// before anything is executed. Otherwise see [`Self::insert_many`].
    pub fn insert_many_any(
        provider: &dyn Provider, data: &mut [Box<dyn Any>], columns: &[&str],
    ) -> Result<InsertResult> {
        let items = Self::downcast_items(data)?;
        Self::insert_rows(provider, items, columns)
    }

    /// [`Self::update`] for a value whose type is only known at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeMismatch`] if `data` is not an `M`, otherwise see
    /// [`Self::update`].
    pub fn update_any(
        provider: &dyn Provider, data: &dyn Any, keys: &[&str], columns: &[&str],
    ) -> Result<UpdateResult> {
        let data = data.downcast_ref::<M>().ok_or_else(Self::type_mismatch)?;
        Self::update(provider, data, keys, columns)
    }

    /// [`Self::upsert`] for a value whose type is only known at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeMismatch`] if `data` is not an `M`, otherwise see
    /// [`Self::upsert`].
    pub fn upsert_any(
        provider: &dyn Provider, data: &mut dyn Any, keys: &[&str], columns: &[&str],
    ) -> Result<UpsertResult> {
        let data = data.downcast_mut::<M>().ok_or_else(Self::type_mismatch)?;
        Self::upsert(provider, data, keys, columns)
    }

    /// [`Self::upsert_many`] for values whose type is only known at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ItemTypeMismatch`] for the first item that is not an `M`,
    /// before anything is executed. Otherwise see [`Self::upsert_many`].
    pub fn upsert_many_any(
        provider: &dyn Provider, data: &mut [Box<dyn Any>], keys: &[&str], columns: &[&str],
    ) -> Result<UpsertResult> {
        let items = Self::downcast_items(data)?;
        Self::upsert_rows(provider, items, keys, columns)
    }

    fn insert_rows(
        provider: &dyn Provider, mut items: Vec<&mut M>, columns: &[&str],
    ) -> Result<InsertResult> {
        if items.is_empty() {
            return Ok(InsertResult::default());
        }

        let builder = InsertBuilder::<M>::new(&Self::insert_columns(columns))?;
        let generated = Self::generated_key(builder.columns());
        let query = builder.rows(items.iter().map(|item| &**item)).build()?;
        let execution = Self::connect(provider)?.exec(&query)?;

        if let (Some(pk), Some(first)) = (generated, execution.first_insert_id) {
            for (id, item) in (first..).zip(items.iter_mut()) {
                assign_id(&mut **item, pk, id)?;
            }
        }

        Ok(InsertResult {
            rows_affected: execution.rows_affected,
            inserted_id: execution.first_insert_id,
        })
    }

    fn upsert_rows(
        provider: &dyn Provider, items: Vec<&mut M>, keys: &[&str], columns: &[&str],
    ) -> Result<UpsertResult> {
        if items.is_empty() {
            return Ok(UpsertResult::default());
        }

        let keys = Self::keys(keys)?;
        let builder = UpsertBuilder::<M>::new(&keys, columns)?;
        let generated = Self::generated_key(builder.insert_columns());
        let connection = Self::connect(provider)?;
        let mut result = UpsertResult::default();

        for (index, item) in items.into_iter().enumerate() {
            if connection.query(&builder.lookup(item)?)?.is_empty() {
                let execution = connection.exec(&builder.insert(item)?)?;
                result.rows_affected += execution.rows_affected;
                if let (Some(pk), Some(id)) = (generated, execution.first_insert_id) {
                    assign_id(item, pk, id)?;
                }
                result.inserts.push(UpsertInsert {
                    index,
                    id: execution.first_insert_id,
                });
            } else {
                if let Some(query) = builder.update(item)? {
                    result.rows_affected += connection.exec(&query)?.rows_affected;
                }
                result.updates.push(index);
            }
        }

        tracing::debug!(
            table = M::descriptor().table_name(),
            inserts = result.inserts.len(),
            updates = result.updates.len(),
            "upsert complete"
        );

        Ok(result)
    }

    fn connect(provider: &dyn Provider) -> Result<Arc<dyn Connection>> {
        let database = M::descriptor().database();
        let connection = provider
            .connect(database)
            .with_context(|| format!("connecting to database '{database}'"))?;
        Ok(connection)
    }

    /// Given keys, else the declared primary keys.
    fn keys<'a>(keys: &[&'a str]) -> Result<Vec<&'a str>> {
        if !keys.is_empty() {
            return Ok(keys.to_vec());
        }
        let descriptor = M::descriptor();
        if descriptor.primary_key_names().is_empty() {
            return Err(ModelError::MissingKeys {
                table: descriptor.table_name().to_string(),
            });
        }
        Ok(descriptor.primary_key_names().iter().map(String::as_str).collect())
    }

    /// Given columns, else every field except a generated primary key.
    fn insert_columns<'a>(columns: &[&'a str]) -> Vec<&'a str> {
        if !columns.is_empty() {
            return columns.to_vec();
        }
        let generated = generated_key::<M>();
        M::projection().iter().copied().filter(|field| Some(*field) != generated).collect()
    }

    /// The generated primary key, when rows are written without it.
    fn generated_key(columns: &[&str]) -> Option<&'static str> {
        generated_key::<M>().filter(|pk| !columns.contains(pk))
    }

    fn downcast_items(data: &mut [Box<dyn Any>]) -> Result<Vec<&mut M>> {
        if let Some(index) = data.iter().position(|item| !item.is::<M>()) {
            return Err(ModelError::ItemTypeMismatch {
                index,
                expected: type_name::<M>(),
            });
        }
        Ok(data.iter_mut().filter_map(|item| item.downcast_mut::<M>()).collect())
    }

    fn type_mismatch() -> ModelError {
        ModelError::TypeMismatch {
            expected: type_name::<M>(),
        }
    }
}

fn assign_id<M: Model>(item: &mut M, pk: &str, id: i64) -> Result<()> {
    item.__assign(pk, &DataType::Int64(Some(id)))
        .with_context(|| format!("assigning generated id to '{pk}'"))?;
    Ok(())
}

/// Reads a non-negative integer parameter given as a number or numeric string.
fn count_param(params: &mut ModelParams, key: &str) -> Result<Option<u64>> {
    match params.get(key)? {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| ModelError::invalid_param(key, "expected a non-negative integer")),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_e| ModelError::invalid_param(key, "expected a non-negative integer")),
        _ => Err(ModelError::invalid_param(key, "expected a non-negative integer")),
    }
}

fn order_specs(value: &Value) -> Result<Vec<OrderSpec>> {
    let invalid = |reason: &str| ModelError::invalid_param(ORDER_BY, reason);
    let parse = |spec: &str| {
        OrderSpec::parse(spec).ok_or_else(|| invalid(&format!("invalid ordering '{spec}'")))
    };

    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(list) => list.split(',').map(&parse).collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().ok_or_else(|| invalid("expected an array of strings")).and_then(&parse)
            })
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(column, direction)| {
                let direction =
                    direction.as_str().ok_or_else(|| invalid("expected \"ASC\" or \"DESC\""))?;
                let mut spec = parse(column.as_str())?;
                spec.order = match direction {
                    d if d.eq_ignore_ascii_case("asc") => sea_query::Order::Asc,
                    d if d.eq_ignore_ascii_case("desc") => sea_query::Order::Desc,
                    _ => return Err(invalid("expected \"ASC\" or \"DESC\"")),
                };
                Ok(spec)
            })
            .collect(),
        Value::Bool(_) | Value::Number(_) => Err(invalid("expected a string, array or object")),
    }
}
