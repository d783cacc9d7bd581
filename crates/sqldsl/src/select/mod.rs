//! Select statements.
//!
//! ```ignore
//! let model = select(columns![id, first_name], |s| {
//!     s.from_as(&person, "p");
//!     s.where_(|w| { w.col(&id).is_greater_than(3); });
//!     s.order_by([first_name.desc()]);
//!     s.limit(10);
//! })?;
//! let provider = model.render(RenderingStrategy::SpringNamedParameter)?;
//! // select p.id, p.first_name from Person p where p.id > :p1 order by first_name DESC limit :p2
//! ```

mod builder;
mod join;
mod multi;

#[cfg(test)]
mod tests;

pub use builder::{SelectBuilder, SubQueryBuilder};
pub use join::JoinType;
pub use multi::{MultiSelectBuilder, MultiSelectModel, multi_select};

use crate::column::{self as expr, BasicColumn};
use crate::config::StatementConfiguration;
use crate::criteria::CriteriaGroup;
use crate::error::{DslError, DslResult};
use crate::log;
use crate::render::{
    AliasScope, RenderingContext, RenderingStrategy, SelectStatementProvider, join_fragments,
};
use crate::table::{SortSpec, SqlTable};
use crate::value::Value;
use join::{JoinSpec, TableExpression};

/// Connector placed before a query expression in a union.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionKind {
    Union,
    UnionAll,
}

impl UnionKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            UnionKind::Union => "union",
            UnionKind::UnionAll => "union all",
        }
    }
}

/// Row lock requested with `for ...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Update,
    NoKeyUpdate,
    Share,
    KeyShare,
}

impl LockMode {
    pub fn as_sql(self) -> &'static str {
        match self {
            LockMode::Update => "for update",
            LockMode::NoKeyUpdate => "for no key update",
            LockMode::Share => "for share",
            LockMode::KeyShare => "for key share",
        }
    }
}

/// What to do with rows locked by other transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockWait {
    SkipLocked,
    Nowait,
}

impl LockWait {
    pub fn as_sql(self) -> &'static str {
        match self {
            LockWait::SkipLocked => "skip locked",
            LockWait::Nowait => "nowait",
        }
    }
}

/// One `select ... from ... where ...` block of a (possibly unioned) select.
#[derive(Debug, Clone)]
pub(crate) struct QueryExpression {
    pub(crate) connector: Option<UnionKind>,
    pub(crate) distinct: bool,
    pub(crate) columns: Vec<BasicColumn>,
    pub(crate) from: Option<TableExpression>,
    pub(crate) joins: Vec<JoinSpec>,
    pub(crate) where_clause: Option<CriteriaGroup>,
    pub(crate) group_by: Vec<BasicColumn>,
    pub(crate) having: Option<CriteriaGroup>,
}

impl QueryExpression {
    pub(crate) fn new(columns: Vec<BasicColumn>, distinct: bool, connector: Option<UnionKind>) -> Self {
        Self {
            connector,
            distinct,
            columns,
            from: None,
            joins: Vec::new(),
            where_clause: None,
            group_by: Vec::new(),
            having: None,
        }
    }

    fn scope(&self) -> AliasScope {
        let mut scope = AliasScope::new().qualify_tables(!self.joins.is_empty());
        if let Some(TableExpression::Table { name, alias }) = &self.from {
            scope.add_table(name, alias.as_deref());
        }
        for join in &self.joins {
            if let TableExpression::Table { name, alias } = &join.table {
                scope.add_table(name, alias.as_deref());
            }
        }
        scope
    }

    fn render(
        &self,
        ctx: &mut RenderingContext,
        keyword: String,
        config: &StatementConfiguration,
    ) -> DslResult<String> {
        ctx.with_scope(self.scope(), |ctx| {
            let mut parts = vec![keyword];
            if self.distinct {
                parts.push("distinct".to_string());
            }

            let columns = self
                .columns
                .iter()
                .map(|c| c.render_selected(ctx))
                .collect::<DslResult<Vec<_>>>()?;
            parts.push(columns.join(", "));

            if let Some(from) = &self.from {
                parts.push(format!("from {}", from.render(ctx)?));
            }

            for join in &self.joins {
                parts.push(join.render(ctx)?);
            }

            if let Some(where_clause) = &self.where_clause {
                match where_clause.render_clause(ctx)? {
                    Some(sql) => parts.push(format!("where {sql}")),
                    None if !config.is_non_rendering_where_clause_allowed() => {
                        return Err(DslError::NonRenderingWhereClause);
                    }
                    None => {}
                }
            }

            if !self.group_by.is_empty() {
                let columns = self
                    .group_by
                    .iter()
                    .map(|c| c.render(ctx))
                    .collect::<DslResult<Vec<_>>>()?;
                parts.push(format!("group by {}", columns.join(", ")));
            }

            if let Some(having) = &self.having {
                if let Some(sql) = having.render_clause(ctx)? {
                    parts.push(format!("having {sql}"));
                }
            }

            Ok(join_fragments(parts))
        })
    }
}

/// `limit`/`offset`/`fetch first` values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Paging {
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
    pub(crate) fetch_first: Option<i64>,
}

impl Paging {
    /// `limit ph [offset ph]`, or `[offset ph rows] [fetch first ph rows only]` without a limit.
    pub(crate) fn render(&self, ctx: &mut RenderingContext) -> String {
        let mut parts = Vec::new();
        if let Some(limit) = self.limit {
            parts.push(format!("limit {}", ctx.bind(Value::BigInt(limit), None)));
            if let Some(offset) = self.offset {
                parts.push(format!("offset {}", ctx.bind(Value::BigInt(offset), None)));
            }
        } else {
            if let Some(offset) = self.offset {
                parts.push(format!("offset {} rows", ctx.bind(Value::BigInt(offset), None)));
            }
            if let Some(fetch_first) = self.fetch_first {
                parts.push(format!(
                    "fetch first {} rows only",
                    ctx.bind(Value::BigInt(fetch_first), None)
                ));
            }
        }
        join_fragments(parts)
    }
}

pub(crate) fn render_order_by(order_by: &[SortSpec]) -> String {
    if order_by.is_empty() {
        return String::new();
    }
    let items: Vec<String> = order_by.iter().map(SortSpec::render).collect();
    format!("order by {}", items.join(", "))
}

/// A complete select statement, ready to render.
#[derive(Debug, Clone)]
pub struct SelectModel {
    pub(crate) expressions: Vec<QueryExpression>,
    pub(crate) order_by: Vec<SortSpec>,
    pub(crate) paging: Paging,
    pub(crate) lock: Option<LockMode>,
    pub(crate) lock_wait: Option<LockWait>,
    pub(crate) config: StatementConfiguration,
}

impl SelectModel {
    /// Render with a fresh parameter sequence.
    pub fn render(&self, strategy: RenderingStrategy) -> DslResult<SelectStatementProvider> {
        let mut ctx = RenderingContext::new(strategy);
        let sql = self.render_nested(&mut ctx)?;
        log::rendered("select", strategy, &sql, ctx.parameters().len());
        Ok(SelectStatementProvider::new(sql, ctx.into_parameters(), strategy))
    }

    /// Render inside an enclosing statement, sharing its parameter sequence and aliases.
    pub(crate) fn render_nested(&self, ctx: &mut RenderingContext) -> DslResult<String> {
        let mut parts = Vec::new();
        for (i, expression) in self.expressions.iter().enumerate() {
            if let Some(connector) = expression.connector {
                parts.push(connector.as_sql().to_string());
            }
            let keyword = if i == 0 {
                self.config.keyword("select")
            } else {
                "select".to_string()
            };
            parts.push(expression.render(ctx, keyword, &self.config)?);
        }
        parts.push(render_order_by(&self.order_by));
        parts.push(self.paging.render(ctx));
        if let Some(lock) = self.lock {
            parts.push(lock.as_sql().to_string());
            if let Some(wait) = self.lock_wait {
                parts.push(wait.as_sql().to_string());
            }
        }
        Ok(self.config.wrap(join_fragments(parts)))
    }
}

// ==================== Entry points ====================

fn build(
    columns: Vec<BasicColumn>,
    distinct: bool,
    completer: impl FnOnce(&mut SelectBuilder),
) -> DslResult<SelectModel> {
    let mut builder = SelectBuilder::new(columns, distinct);
    completer(&mut builder);
    builder.build()
}

/// `select a, b from ...`
pub fn select<I>(columns: I, completer: impl FnOnce(&mut SelectBuilder)) -> DslResult<SelectModel>
where
    I: IntoIterator,
    I::Item: Into<BasicColumn>,
{
    build(columns.into_iter().map(Into::into).collect(), false, completer)
}

/// `select distinct a, b from ...`
pub fn select_distinct<I>(
    columns: I,
    completer: impl FnOnce(&mut SelectBuilder),
) -> DslResult<SelectModel>
where
    I: IntoIterator,
    I::Item: Into<BasicColumn>,
{
    build(columns.into_iter().map(Into::into).collect(), true, completer)
}

/// `select count(*) from table ...`
pub fn count_from(table: &SqlTable, completer: impl FnOnce(&mut SelectBuilder)) -> DslResult<SelectModel> {
    build(vec![expr::count_all()], false, |s| {
        s.from(table);
        completer(s);
    })
}

/// `select count(column) from ...`; the completer supplies `from`.
pub fn count(
    column: impl Into<BasicColumn>,
    completer: impl FnOnce(&mut SelectBuilder),
) -> DslResult<SelectModel> {
    build(vec![expr::count(column)], false, completer)
}

/// `select count(distinct column) from ...`; the completer supplies `from`.
pub fn count_distinct(
    column: impl Into<BasicColumn>,
    completer: impl FnOnce(&mut SelectBuilder),
) -> DslResult<SelectModel> {
    build(vec![expr::count_distinct(column)], false, completer)
}
