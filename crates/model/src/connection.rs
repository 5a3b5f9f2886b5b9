use std::fmt::Debug;
use std::sync::Arc;

use anyhow::Result;

use crate::query::Query;
use crate::types::Row;

/// Opens connections to the databases models are stored in.
pub trait Provider: Debug + Send + Sync {
    /// Returns a connection to the database identified by `database`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    fn connect(&self, database: &str) -> Result<Arc<dyn Connection>>;
}

/// SQL providers implement the [`Connection`] trait to execute statements built by
/// the model layer.
pub trait Connection: Debug + Send + Sync {
    /// Execute a query and return the resulting rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    fn query(&self, query: &Query) -> Result<Vec<Row>>;

    /// Execute a query that does not return rows (e.g., an `INSERT`, `UPDATE`, or `DELETE`).
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    fn exec(&self, query: &Query) -> Result<Execution>;
}

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Execution {
    /// Number of rows inserted, updated or deleted.
    pub rows_affected: u64,

    /// Identifier generated for the first row inserted by the statement, if any.
    pub first_insert_id: Option<i64>,
}
