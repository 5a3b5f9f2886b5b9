//! `SQLite` [`Provider`] over `rusqlite`.
//!
//! This is a lightweight implementation for development and tests.

#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use fromenv::FromEnv;
use parking_lot::Mutex;
use rusqlite::types::{Value as SqliteValue, ValueRef};
use rusqlite::{Connection as SqliteConnection, params_from_iter};
use tracing::instrument;

use crate::connection::{Connection, Execution, Provider};
use crate::query::Query;
use crate::types::{DataType, Field, Row};

const IN_MEMORY: &str = ":memory:";

/// Options used to connect to `SQLite` databases.
///
/// This struct is used to load connection options from environment variables.
#[derive(Debug, Clone, FromEnv)]
pub struct ConnectOptions {
    /// Directory holding one `<database>.db` file per database id, or `:memory:` for a
    /// private in-memory database per id.
    #[env(from = "SQL_DATABASE", default = ":memory:")]
    pub database: String,
}

impl ConnectOptions {
    /// Loads options from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable cannot be parsed.
    pub fn load() -> Result<Self> {
        Self::from_env().finalize().context("issue loading connection options")
    }
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            database: IN_MEMORY.to_string(),
        }
    }
}

/// Opens one `SQLite` connection per database id and hands out shared handles to it.
#[derive(Debug, Clone)]
pub struct SqliteProvider {
    location: Option<PathBuf>,
    // rusqlite::Connection isn't `Sync`
    connections: Arc<Mutex<HashMap<String, Arc<SqliteConnectionImpl>>>>,
}

impl SqliteProvider {
    /// Creates a provider from `options`, creating the database directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database directory cannot be created.
    #[instrument]
    pub fn connect_with(options: ConnectOptions) -> Result<Self> {
        let location = if options.database == IN_MEMORY {
            tracing::debug!("using in-memory SQLite databases");
            None
        } else {
            let dir = PathBuf::from(&options.database);
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create database directory {}", dir.display()))?;
            tracing::debug!("using SQLite databases in: {}", dir.display());
            Some(dir)
        };

        Ok(Self {
            location,
            connections: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Creates a provider with a private in-memory database per database id.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            location: None,
            connections: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn open(&self, database: &str) -> Result<SqliteConnection> {
        let Some(dir) = &self.location else {
            return SqliteConnection::open_in_memory()
                .context("failed to open in-memory SQLite database");
        };
        if database.is_empty() || database.contains(['/', '\\']) || database.contains("..") {
            bail!("invalid database name '{database}'");
        }
        let path = dir.join(format!("{database}.db"));
        SqliteConnection::open(&path)
            .with_context(|| format!("failed to open SQLite database {}", path.display()))
    }
}

impl Provider for SqliteProvider {
    fn connect(&self, database: &str) -> Result<Arc<dyn Connection>> {
        let mut connections = self.connections.lock();
        if let Some(conn) = connections.get(database) {
            return Ok(Arc::clone(conn) as Arc<dyn Connection>);
        }

        tracing::debug!("opening SQL connection to: {database}");
        let conn = Arc::new(SqliteConnectionImpl {
            conn: Mutex::new(self.open(database)?),
        });
        connections.insert(database.to_string(), Arc::clone(&conn));

        Ok(conn as Arc<dyn Connection>)
    }
}

#[derive(Debug)]
struct SqliteConnectionImpl {
    conn: Mutex<SqliteConnection>,
}

impl Connection for SqliteConnectionImpl {
    fn query(&self, query: &Query) -> Result<Vec<Row>> {
        tracing::debug!("executing query: {}", query.sql);

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&query.sql).context("failed to prepare statement")?;
        let params = to_sqlite_values(&query.params)?;

        let column_names: Vec<String> =
            stmt.column_names().iter().map(ToString::to_string).collect();

        let mut rows =
            stmt.query(params_from_iter(params.iter())).context("failed to execute query")?;

        let mut result_rows = Vec::new();
        while let Some(row) = rows.next().context("failed to fetch row")? {
            let mut fields = Vec::with_capacity(column_names.len());
            for (i, name) in column_names.iter().enumerate() {
                let value = row.get_ref(i).context("failed to get column value")?;
                fields.push(Field {
                    name: name.clone(),
                    value: from_sqlite_value(value)?,
                });
            }

            result_rows.push(Row {
                index: result_rows.len().to_string(),
                fields,
            });
        }

        Ok(result_rows)
    }

    fn exec(&self, query: &Query) -> Result<Execution> {
        tracing::debug!("executing statement: {}", query.sql);

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&query.sql).context("failed to prepare statement")?;
        let params = to_sqlite_values(&query.params)?;

        let changes = stmt
            .execute(params_from_iter(params.iter()))
            .context("failed to execute statement")?;
        let rows_affected = u64::try_from(changes)?;

        // rowids of a multi-row INSERT are allocated in order, ending at the last one
        let is_insert =
            query.sql.trim_start().get(..6).is_some_and(|kw| kw.eq_ignore_ascii_case("insert"));
        let first_insert_id = if is_insert && changes > 0 {
            Some(conn.last_insert_rowid() - i64::try_from(changes)? + 1)
        } else {
            None
        };

        Ok(Execution {
            rows_affected,
            first_insert_id,
        })
    }
}

fn to_sqlite_values(params: &[DataType]) -> Result<Vec<SqliteValue>> {
    params.iter().map(to_sqlite_value).collect()
}

fn to_sqlite_value(dt: &DataType) -> Result<SqliteValue> {
    let value = match dt {
        DataType::Boolean(Some(b)) => SqliteValue::Integer(i64::from(*b)),
        DataType::Int32(Some(i)) => SqliteValue::Integer(i64::from(*i)),
        DataType::Int64(Some(i)) => SqliteValue::Integer(*i),
        DataType::Uint32(Some(u)) => SqliteValue::Integer(i64::from(*u)),
        DataType::Uint64(Some(u)) => {
            SqliteValue::Integer(i64::try_from(*u).context("unsigned value exceeds SQLite integer range")?)
        }
        DataType::Float(Some(f)) => SqliteValue::Real(f64::from(*f)),
        DataType::Double(Some(f)) => SqliteValue::Real(*f),
        DataType::Str(Some(s))
        | DataType::Date(Some(s))
        | DataType::Time(Some(s))
        | DataType::Timestamp(Some(s)) => SqliteValue::Text(s.clone()),
        DataType::Binary(Some(b)) => SqliteValue::Blob(b.clone()),
        // all None variants map to NULL
        _ => SqliteValue::Null,
    };
    Ok(value)
}

fn from_sqlite_value(value: ValueRef) -> Result<DataType> {
    match value {
        ValueRef::Null => Ok(DataType::Str(None)),
        ValueRef::Integer(i) => Ok(DataType::Int64(Some(i))),
        ValueRef::Real(f) => Ok(DataType::Double(Some(f))),
        ValueRef::Text(t) => {
            let s = std::str::from_utf8(t).context("invalid UTF-8 in text value")?;
            Ok(DataType::Str(Some(s.to_string())))
        }
        ValueRef::Blob(b) => Ok(DataType::Binary(Some(b.to_vec()))),
    }
}
