use std::marker::PhantomData;

use sea_query::{Alias, ColumnRef, IntoIden, Order, SimpleExpr};

use crate::filter::Filter;
use crate::join::{Join, JoinSpec};
use crate::model::Model;
use crate::query::{Query, QueryBuilder};

/// A single ORDER BY term.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSpec {
    /// Table or alias qualifying the column; `None` uses the model's qualifier.
    pub table: Option<String>,
    /// Column name.
    pub column: String,
    /// Direction.
    pub order: Order,
}

impl OrderSpec {
    /// Ascending order on `column`.
    #[must_use]
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            table: None,
            column: column.into(),
            order: Order::Asc,
        }
    }

    /// Descending order on `column`.
    #[must_use]
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            table: None,
            column: column.into(),
            order: Order::Desc,
        }
    }

    /// Parses `"column"`, `"column ASC"`, `"column DESC"` or `"-column"`. The column may
    /// be qualified as `"table.column"`.
    #[must_use]
    pub fn parse(spec: &str) -> Option<Self> {
        let mut parts = spec.split_whitespace();
        let column = parts.next()?;
        let direction = parts.next();
        if parts.next().is_some() {
            return None;
        }

        let (column, mut order) = match column.strip_prefix('-') {
            Some(column) => (column, Order::Desc),
            None => (column, Order::Asc),
        };
        match direction {
            None => {}
            Some(dir) if dir.eq_ignore_ascii_case("asc") => order = Order::Asc,
            Some(dir) if dir.eq_ignore_ascii_case("desc") => order = Order::Desc,
            Some(_) => return None,
        }

        let (table, column) = match column.split_once('.') {
            Some((table, column)) => (Some(table.to_string()), column),
            None => (None, column),
        };
        if column.is_empty() || table.as_deref() == Some("") {
            return None;
        }

        Some(Self {
            table,
            column: column.to_string(),
            order,
        })
    }
}

/// Builder for constructing SELECT queries against a model's table.
pub struct SelectBuilder<M: Model> {
    filters: Vec<SimpleExpr>,
    joins: Vec<JoinSpec>,
    order: Vec<(ColumnRef, Order)>,
    limit: Option<u64>,
    offset: Option<u64>,
    _marker: PhantomData<M>,
}

impl<M: Model> Default for SelectBuilder<M> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            joins: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            _marker: PhantomData,
        }
    }
}

impl<M: Model> SelectBuilder<M> {
    /// Creates a SELECT over the model's table and alias.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Source table name.
    #[must_use]
    pub fn table(&self) -> &'static str {
        M::descriptor().table_name()
    }

    /// Source table alias, if any.
    #[must_use]
    pub fn alias(&self) -> Option<&'static str> {
        M::descriptor().table_alias()
    }

    /// Adds a WHERE clause filter.
    #[must_use]
    pub fn r#where(mut self, filter: Filter) -> Self {
        self.filters.push(filter.into_expr(M::descriptor().qualifier()));
        self
    }

    /// Adds a JOIN clause to the query.
    #[must_use]
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join.into_spec(M::descriptor().qualifier()));
        self
    }

    /// Adds ascending ORDER BY clause.
    #[must_use]
    pub fn order_by(self, column: impl Into<String>) -> Self {
        self.order(OrderSpec::asc(column))
    }

    /// Adds descending ORDER BY clause.
    #[must_use]
    pub fn order_by_desc(self, column: impl Into<String>) -> Self {
        self.order(OrderSpec::desc(column))
    }

    /// Adds an ORDER BY term.
    #[must_use]
    pub fn order(mut self, spec: OrderSpec) -> Self {
        let table = spec.table.as_deref().unwrap_or_else(|| M::descriptor().qualifier());
        self.order.push((table_column(table, &spec.column), spec.order));
        self
    }

    /// Restricts the number of rows returned, skipping `offset` rows first.
    #[must_use]
    pub const fn limit(mut self, limit: u64, offset: u64) -> Self {
        self.limit = Some(limit);
        self.offset = if offset == 0 { None } else { Some(offset) };
        self
    }

    /// Returns the `page`-th chunk of `page_size` rows. Pages start at 1.
    #[must_use]
    pub const fn paginate(self, page: u64, page_size: u64) -> Self {
        let offset = page.saturating_sub(1).saturating_mul(page_size);
        self.limit(page_size, offset)
    }

    /// Build the SELECT query.
    ///
    /// # Errors
    ///
    /// Returns an error if query values cannot be converted to SQL data types.
    pub fn build(self) -> anyhow::Result<Query> {
        let descriptor = M::descriptor();
        let qualifier = descriptor.qualifier();
        let mut statement = sea_query::Query::select();

        for field in M::projection() {
            statement.column(table_column(qualifier, field));
        }

        match descriptor.table_alias() {
            Some(alias) => statement.from_as(Alias::new(descriptor.table_name()), Alias::new(alias)),
            None => statement.from(Alias::new(descriptor.table_name())),
        };

        for JoinSpec {
            table,
            alias,
            on,
            kind,
        } in self.joins
        {
            if let Some(alias) = alias {
                statement.join_as(kind, Alias::new(table), Alias::new(alias), on);
            } else {
                statement.join(kind, Alias::new(table), on);
            }
        }

        for filter in self.filters {
            statement.and_where(filter);
        }

        for (column, order) in self.order {
            statement.order_by(column, order);
        }

        if let Some(limit) = self.limit {
            statement.limit(limit);
        }

        if let Some(offset) = self.offset {
            statement.offset(offset);
        }

        let (sql, values) = statement.build(QueryBuilder::default());
        let query = Query::from_parts(sql, values)?;

        tracing::debug!(
            table = descriptor.table_name(),
            sql = %query.sql,
            param_count = query.params.len(),
            "SelectBuilder generated SQL"
        );

        Ok(query)
    }
}

pub(crate) fn table_column(table: &str, column: &str) -> ColumnRef {
    ColumnRef::TableColumn(Alias::new(table).into_iden(), Alias::new(column).into_iden())
}
