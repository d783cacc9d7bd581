//! Update statements.
//!
//! ```ignore
//! let model = update(&person, |u| {
//!     u.set(&occupation).equal_to("Programmer");
//!     u.set(&first_name).equal_to_when_present(None::<String>);
//!     u.where_(|w| { w.col(&id).is_equal_to(3); });
//! })?;
//! // update Person set occupation = :p1 where id = :p2
//! ```

use crate::column::BasicColumn;
use crate::config::StatementConfiguration;
use crate::criteria::condition::value_of;
use crate::criteria::{CriteriaCollector, CriteriaGroup};
use crate::error::{DslError, DslResult};
use crate::log;
use crate::render::{
    AliasScope, RenderingContext, RenderingStrategy, UpdateStatementProvider, join_fragments,
};
use crate::select::{SelectModel, SubQueryBuilder, render_order_by};
use crate::table::{ColumnRef, SortSpec, SqlColumn, SqlTable};
use crate::value::Value;
use std::marker::PhantomData;

#[derive(Debug, Clone)]
enum SetValue {
    /// `None` when a `*_when_present` value was absent; the set clause is dropped.
    Bound(Option<Value>),
    Null,
    Constant(String),
    StringConstant(String),
    Column(BasicColumn),
    SubQuery(Box<SelectModel>),
}

#[derive(Debug, Clone)]
struct SetMapping {
    column: ColumnRef,
    value: SetValue,
}

/// A complete update statement, ready to render.
#[derive(Debug, Clone)]
pub struct UpdateModel {
    table: String,
    alias: Option<String>,
    sets: Vec<SetMapping>,
    where_clause: Option<CriteriaGroup>,
    order_by: Vec<SortSpec>,
    limit: Option<i64>,
    config: StatementConfiguration,
}

impl UpdateModel {
    pub fn render(&self, strategy: RenderingStrategy) -> DslResult<UpdateStatementProvider> {
        let mut ctx = RenderingContext::new(strategy);
        let mut scope = AliasScope::new();
        scope.add_table(&self.table, self.alias.as_deref());
        let sql = ctx.with_scope(scope, |ctx| self.render_statement(ctx))?;
        log::rendered("update", strategy, &sql, ctx.parameters().len());
        Ok(UpdateStatementProvider::new(sql, ctx.into_parameters(), strategy))
    }

    fn render_statement(&self, ctx: &mut RenderingContext) -> DslResult<String> {
        let mut sets = Vec::with_capacity(self.sets.len());
        for mapping in &self.sets {
            let value = match &mapping.value {
                SetValue::Bound(None) => continue,
                SetValue::Bound(Some(value)) => ctx.bind(value.clone(), mapping.column.jdbc_type),
                SetValue::Null => "null".to_string(),
                SetValue::Constant(c) => c.clone(),
                SetValue::StringConstant(s) => format!("'{}'", s.replace('\'', "''")),
                SetValue::Column(column) => column.render(ctx)?,
                SetValue::SubQuery(query) => format!("({})", query.render_nested(ctx)?),
            };
            sets.push(format!("{} = {}", mapping.column.name, value));
        }
        if sets.is_empty() {
            return Err(DslError::invalid(
                "an update requires at least one set clause with a value",
            ));
        }

        let table = match &self.alias {
            Some(alias) => format!("{} {}", self.table, alias),
            None => self.table.clone(),
        };
        let mut parts = vec![
            self.config.keyword("update"),
            table,
            format!("set {}", sets.join(", ")),
        ];

        if let Some(where_clause) = &self.where_clause {
            match where_clause.render_clause(ctx)? {
                Some(sql) => parts.push(format!("where {sql}")),
                None if !self.config.is_non_rendering_where_clause_allowed() => {
                    return Err(DslError::NonRenderingWhereClause);
                }
                None => {}
            }
        }

        parts.push(render_order_by(&self.order_by));
        if let Some(limit) = self.limit {
            parts.push(format!("limit {}", ctx.bind(Value::BigInt(limit), None)));
        }

        Ok(self.config.wrap(join_fragments(parts)))
    }
}

#[derive(Debug)]
pub struct UpdateBuilder {
    sets: Vec<SetMapping>,
    where_clause: Option<CriteriaGroup>,
    order_by: Vec<SortSpec>,
    limit: Option<i64>,
    config: StatementConfiguration,
    build_error: Option<String>,
}

impl UpdateBuilder {
    fn fail(&mut self, message: impl Into<String>) {
        if self.build_error.is_none() {
            self.build_error = Some(message.into());
        }
    }

    /// Start a set clause: `u.set(&name).equal_to("Fred")`.
    pub fn set<T>(&mut self, column: &SqlColumn<T>) -> UpdateSetter<'_, T> {
        UpdateSetter {
            builder: self,
            column: column.column_ref().clone(),
            _marker: PhantomData,
        }
    }

    pub fn where_(&mut self, completer: impl FnOnce(&mut CriteriaCollector)) -> &mut Self {
        if self.where_clause.is_some() {
            self.fail("where is already set for this update; use and/or to add criteria");
            return self;
        }
        match CriteriaCollector::collect(completer) {
            Ok(group) => self.where_clause = Some(group),
            Err(err) => self.fail(err.into_message()),
        }
        self
    }

    pub fn order_by<I>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<SortSpec>,
    {
        let columns: Vec<SortSpec> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            self.fail("order by requires at least one column");
        } else {
            self.order_by.extend(columns);
        }
        self
    }

    pub fn limit(&mut self, limit: i64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn limit_when_present(&mut self, limit: Option<i64>) -> &mut Self {
        if let Some(limit) = limit {
            self.limit = Some(limit);
        }
        self
    }

    pub fn configure_statement(&mut self, f: impl FnOnce(&mut StatementConfiguration)) -> &mut Self {
        f(&mut self.config);
        self
    }

    fn push(&mut self, column: ColumnRef, value: SetValue) {
        self.sets.push(SetMapping { column, value });
    }
}

/// Second half of `set(&column)` in an update.
pub struct UpdateSetter<'a, T> {
    builder: &'a mut UpdateBuilder,
    column: ColumnRef,
    _marker: PhantomData<fn() -> T>,
}

impl<T> UpdateSetter<'_, T> {
    pub fn equal_to_null(self) {
        self.builder.push(self.column, SetValue::Null);
    }

    pub fn equal_to_constant(self, constant: impl Into<String>) {
        self.builder
            .push(self.column, SetValue::Constant(constant.into()));
    }

    pub fn equal_to_string_constant(self, constant: impl Into<String>) {
        self.builder
            .push(self.column, SetValue::StringConstant(constant.into()));
    }

    /// `col = other_col`
    pub fn equal_to_column(self, column: impl Into<BasicColumn>) {
        self.builder
            .push(self.column, SetValue::Column(column.into()));
    }

    /// `col = (select ...)`
    pub fn equal_to_subquery(self, completer: impl FnOnce(&mut SubQueryBuilder)) {
        match SubQueryBuilder::collect(completer) {
            Ok(query) => self
                .builder
                .push(self.column, SetValue::SubQuery(Box::new(query))),
            Err(err) => self.builder.fail(err.into_message()),
        }
    }
}

impl<T: Into<Value>> UpdateSetter<'_, T> {
    pub fn equal_to(self, value: impl Into<T>) {
        let value = value_of::<T, _>(value);
        self.builder.push(self.column, SetValue::Bound(Some(value)));
    }

    /// The set clause is dropped when `value` is `None`.
    pub fn equal_to_when_present<V: Into<T>>(self, value: Option<V>) {
        let value = value.map(value_of::<T, V>);
        self.builder.push(self.column, SetValue::Bound(value));
    }
}

/// `update table set ... [where ...] [order by ...] [limit ...]`
pub fn update(table: &SqlTable, completer: impl FnOnce(&mut UpdateBuilder)) -> DslResult<UpdateModel> {
    build(table, None, completer)
}

/// `update table alias set ...`; the alias qualifies the table's columns in
/// set values and the where clause, including correlated subqueries.
pub fn update_as(
    table: &SqlTable,
    alias: &str,
    completer: impl FnOnce(&mut UpdateBuilder),
) -> DslResult<UpdateModel> {
    build(table, Some(alias.to_string()), completer)
}

fn build(
    table: &SqlTable,
    alias: Option<String>,
    completer: impl FnOnce(&mut UpdateBuilder),
) -> DslResult<UpdateModel> {
    let mut builder = UpdateBuilder {
        sets: Vec::new(),
        where_clause: None,
        order_by: Vec::new(),
        limit: None,
        config: StatementConfiguration::default(),
        build_error: None,
    };
    completer(&mut builder);
    if let Some(err) = builder.build_error {
        return Err(DslError::InvalidSql(err));
    }
    if builder.sets.is_empty() {
        return Err(DslError::invalid("an update requires at least one set clause"));
    }
    Ok(UpdateModel {
        table: table.name().to_string(),
        alias,
        sets: builder.sets,
        where_clause: builder.where_clause,
        order_by: builder.order_by,
        limit: builder.limit,
        config: builder.config,
    })
}
