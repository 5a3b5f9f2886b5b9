//! Common test helpers shared across integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use webapp_model::{
    Connection, DataType, Execution, Field, Filter, Model, ModelDescriptor, ModelParams, Provider,
    Query, Row, SelectBuilder, entity,
};

// Common test models used across multiple test files

entity! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct FirstOne {
        pub id: i64,
        pub name: String,
        pub score: Option<i32>,
    }
}

impl Model for FirstOne {
    fn descriptor() -> &'static ModelDescriptor {
        static DESCRIPTOR: LazyLock<ModelDescriptor> = LazyLock::new(|| {
            ModelDescriptor::new("db1", "first_one").with_alias("fo").with_primary_key_names(["id"])
        });
        &DESCRIPTOR
    }

    fn build_select_query(
        mut query: SelectBuilder<Self>, params: &mut ModelParams,
    ) -> webapp_model::Result<SelectBuilder<Self>> {
        if params.exists("name") {
            if let Some(name) = params.get_as::<String>("name")? {
                query = query.r#where(Filter::eq("name", name));
            }
        }
        if params.exists("ids") {
            if let Some(ids) = params.subparams("ids")?.as_array() {
                query = query.r#where(Filter::r#in("id", ids.iter().filter_map(serde_json::Value::as_i64)));
            }
        }
        Ok(query)
    }
}

entity! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct SecondTwo {
        pub code: String,
        pub label: String,
        pub qty: i32,
    }
}

impl Model for SecondTwo {
    fn descriptor() -> &'static ModelDescriptor {
        static DESCRIPTOR: LazyLock<ModelDescriptor> = LazyLock::new(|| {
            ModelDescriptor::new("db2", "second_two").with_alias("st").with_primary_key_names(["code"])
        });
        &DESCRIPTOR
    }
}

entity! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Reading {
        pub sensor: String,
        pub value: f64,
    }
}

impl Model for Reading {
    fn descriptor() -> &'static ModelDescriptor {
        static DESCRIPTOR: LazyLock<ModelDescriptor> =
            LazyLock::new(|| ModelDescriptor::new("db1", "readings"));
        &DESCRIPTOR
    }
}

/// A statement seen by [`MockProvider`].
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Query(Query),
    Exec(Query),
}

impl Statement {
    pub fn sql(&self) -> &str {
        match self {
            Self::Query(query) | Self::Exec(query) => &query.sql,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    connects: Vec<String>,
    statements: Vec<Statement>,
    rows: VecDeque<Vec<Row>>,
    executions: VecDeque<Execution>,
}

/// Records every statement and answers with scripted rows and executions, in order.
/// Unscripted queries return no rows and unscripted statements affect one row.
#[derive(Debug, Clone, Default)]
pub struct MockProvider(Arc<Mutex<MockState>>);

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_rows(self, rows: Vec<Row>) -> Self {
        self.0.lock().rows.push_back(rows);
        self
    }

    #[must_use]
    pub fn with_execution(self, rows_affected: u64, first_insert_id: Option<i64>) -> Self {
        self.0.lock().executions.push_back(Execution {
            rows_affected,
            first_insert_id,
        });
        self
    }

    pub fn connects(&self) -> Vec<String> {
        self.0.lock().connects.clone()
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.0.lock().statements.clone()
    }

    pub fn executed(&self) -> Vec<Query> {
        self.statements()
            .into_iter()
            .filter_map(|statement| match statement {
                Statement::Exec(query) => Some(query),
                Statement::Query(_) => None,
            })
            .collect()
    }
}

impl Provider for MockProvider {
    fn connect(&self, database: &str) -> anyhow::Result<Arc<dyn Connection>> {
        self.0.lock().connects.push(database.to_string());
        Ok(Arc::new(MockConnection(Arc::clone(&self.0))))
    }
}

#[derive(Debug)]
struct MockConnection(Arc<Mutex<MockState>>);

impl Connection for MockConnection {
    fn query(&self, query: &Query) -> anyhow::Result<Vec<Row>> {
        let mut state = self.0.lock();
        state.statements.push(Statement::Query(query.clone()));
        Ok(state.rows.pop_front().unwrap_or_default())
    }

    fn exec(&self, query: &Query) -> anyhow::Result<Execution> {
        let mut state = self.0.lock();
        state.statements.push(Statement::Exec(query.clone()));
        Ok(state.executions.pop_front().unwrap_or(Execution {
            rows_affected: 1,
            first_insert_id: None,
        }))
    }
}

/// Builds a result row from column name and value pairs.
pub fn row(fields: &[(&str, DataType)]) -> Row {
    Row {
        index: "0".to_string(),
        fields: fields
            .iter()
            .map(|(name, value)| Field {
                name: (*name).to_string(),
                value: value.clone(),
            })
            .collect(),
    }
}

/// A `first_one` row as the database returns it.
pub fn first_one_row(id: i64, name: &str, score: Option<i64>) -> Row {
    row(&[
        ("id", DataType::Int64(Some(id))),
        ("name", DataType::Str(Some(name.to_string()))),
        ("score", DataType::Int64(score)),
    ])
}

/// Strips identifier quotes and collapses whitespace, leaving string literals alone.
fn canonicalize_sql(sql: &str) -> String {
    let mut cleaned = String::with_capacity(sql.len());
    let mut in_literal = false;

    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_literal = !in_literal;
                cleaned.push(ch);
            }
            '"' if !in_literal => {}
            _ => cleaned.push(ch),
        }
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Assert that SQL contains all expected fragments in order.
///
/// Identifier quotes and whitespace differences are ignored.
#[allow(clippy::missing_panics_doc)]
pub fn assert_sql_contains(actual: &str, fragments: &[&str]) {
    let actual = canonicalize_sql(actual);
    let mut search_start = 0usize;

    for fragment in fragments {
        let fragment = canonicalize_sql(fragment);
        let Some(pos) = actual[search_start..].find(&fragment) else {
            panic!("expected SQL fragment `{fragment}` not found in order in `{actual}`");
        };
        search_start += pos + fragment.len();
    }
}

/// Installs a test subscriber so `RUST_LOG` output shows up in failing tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
