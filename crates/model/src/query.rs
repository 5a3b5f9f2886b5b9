use sea_query::backend::{
    EscapeBuilder, OperLeftAssocDecider, PrecedenceDecider, QuotedBuilder, TableRefBuilder,
};
use sea_query::prepare::SqlWriter;
use sea_query::{BinOper, Oper, Quote, SimpleExpr, SubQueryStatement, Value, Values};

use crate::entity::value_to_datatype;
use crate::types::DataType;

/// A built statement: SQL text plus positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// SQL text using `$1, $2, ...` placeholders.
    pub sql: String,
    /// Parameter values, in placeholder order.
    pub params: Vec<DataType>,
}

impl Query {
    /// Builds a [`Query`] from `sea-query` output, converting every bound value to a
    /// [`DataType`] a [`Connection`](crate::Connection) understands.
    pub(crate) fn from_parts(sql: String, values: Values) -> anyhow::Result<Self> {
        let params = values.into_iter().map(value_to_datatype).collect::<anyhow::Result<_>>()?;
        Ok(Self { sql, params })
    }
}

/// `sea-query` backend used by every model statement.
///
/// Statements are handed to a [`Provider`](crate::Provider) that may sit on
/// `PostgreSQL` or `SQLite`, so the output sticks to the syntax both accept:
/// double-quoted identifiers and numbered `$n` placeholders. `SQLite` binds `$n`
/// positionally because the numbers appear in order, which keeps
/// [`Query::params`] valid for either store.
pub(crate) struct QueryBuilder {
    quote: Quote,
    placeholder: &'static str,
    numbered: bool,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self {
            quote: Quote::new(b'"'),
            placeholder: "$",
            numbered: true,
        }
    }
}

// Identifiers are always quoted, so column names that are keywords (`order`,
// `group`) stay usable as model fields.
impl QuotedBuilder for QueryBuilder {
    fn quote(&self) -> Quote {
        self.quote
    }
}

impl EscapeBuilder for QueryBuilder {}

impl TableRefBuilder for QueryBuilder {}

/// Lets chained `AND`/`OR` from [`Filter`](crate::Filter) trees render flat instead of
/// nesting a parenthesis per combinator.
impl OperLeftAssocDecider for QueryBuilder {
    fn well_known_left_associative(&self, op: &BinOper) -> bool {
        // same set as sea-query's `common_well_known_left_associative`
        matches!(
            op,
            BinOper::And | BinOper::Or | BinOper::Add | BinOper::Sub | BinOper::Mul | BinOper::Mod
        )
    }
}

/// Every operand is parenthesized. Filters are built from caller data at runtime and
/// mix `NOT`, `IN` and `BETWEEN` freely, so grouping never depends on operator
/// precedence rules that differ between backends.
impl PrecedenceDecider for QueryBuilder {
    fn inner_expr_well_known_greater_precedence(
        &self, _inner: &SimpleExpr, _outer_oper: &Oper,
    ) -> bool {
        // always parenthesize
        false
    }
}

impl sea_query::backend::QueryBuilder for QueryBuilder {
    fn prepare_query_statement(&self, query: &SubQueryStatement, sql: &mut dyn SqlWriter) {
        match query {
            SubQueryStatement::SelectStatement(s) => self.prepare_select_statement(s, sql),
            SubQueryStatement::InsertStatement(s) => self.prepare_insert_statement(s, sql),
            SubQueryStatement::UpdateStatement(s) => self.prepare_update_statement(s, sql),
            SubQueryStatement::DeleteStatement(s) => self.prepare_delete_statement(s, sql),
            SubQueryStatement::WithStatement(s) => self.prepare_with_query(s, sql),
        }
    }

    // values are always bound, never inlined into the SQL text
    fn prepare_value(&self, value: &Value, sql: &mut dyn SqlWriter) {
        sql.push_param(value.clone(), self);
    }

    fn placeholder(&self) -> (&str, bool) {
        (self.placeholder, self.numbered)
    }
}
