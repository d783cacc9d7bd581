//! Delete statements.

use crate::config::StatementConfiguration;
use crate::criteria::{CriteriaCollector, CriteriaGroup};
use crate::error::{DslError, DslResult};
use crate::log;
use crate::render::{
    AliasScope, DeleteStatementProvider, RenderingContext, RenderingStrategy, join_fragments,
};
use crate::select::render_order_by;
use crate::table::{SortSpec, SqlTable};
use crate::value::Value;

/// A complete delete statement, ready to render.
#[derive(Debug, Clone)]
pub struct DeleteModel {
    table: String,
    alias: Option<String>,
    where_clause: Option<CriteriaGroup>,
    order_by: Vec<SortSpec>,
    limit: Option<i64>,
    config: StatementConfiguration,
}

impl DeleteModel {
    pub fn render(&self, strategy: RenderingStrategy) -> DslResult<DeleteStatementProvider> {
        let mut ctx = RenderingContext::new(strategy);
        let mut scope = AliasScope::new();
        scope.add_table(&self.table, self.alias.as_deref());
        let sql = ctx.with_scope(scope, |ctx| self.render_statement(ctx))?;
        log::rendered("delete", strategy, &sql, ctx.parameters().len());
        Ok(DeleteStatementProvider::new(sql, ctx.into_parameters(), strategy))
    }

    fn render_statement(&self, ctx: &mut RenderingContext) -> DslResult<String> {
        let table = match &self.alias {
            Some(alias) => format!("from {} {}", self.table, alias),
            None => format!("from {}", self.table),
        };
        let mut parts = vec![self.config.keyword("delete"), table];

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

#[derive(Debug, Default)]
pub struct DeleteBuilder {
    where_clause: Option<CriteriaGroup>,
    order_by: Vec<SortSpec>,
    limit: Option<i64>,
    config: StatementConfiguration,
    build_error: Option<String>,
}

impl DeleteBuilder {
    fn fail(&mut self, message: impl Into<String>) {
        if self.build_error.is_none() {
            self.build_error = Some(message.into());
        }
    }

    pub fn where_(&mut self, completer: impl FnOnce(&mut CriteriaCollector)) -> &mut Self {
        if self.where_clause.is_some() {
            self.fail("where is already set for this delete; use and/or to add criteria");
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
}

/// `delete from table [where ...] [order by ...] [limit ...]`
pub fn delete_from(table: &SqlTable, completer: impl FnOnce(&mut DeleteBuilder)) -> DslResult<DeleteModel> {
    build(table, None, completer)
}

/// `delete from table alias ...`; the alias qualifies the table's columns,
/// including inside correlated subqueries.
pub fn delete_from_as(
    table: &SqlTable,
    alias: &str,
    completer: impl FnOnce(&mut DeleteBuilder),
) -> DslResult<DeleteModel> {
    build(table, Some(alias.to_string()), completer)
}

fn build(
    table: &SqlTable,
    alias: Option<String>,
    completer: impl FnOnce(&mut DeleteBuilder),
) -> DslResult<DeleteModel> {
    let mut builder = DeleteBuilder::default();
    completer(&mut builder);
    if let Some(err) = builder.build_error {
        return Err(DslError::InvalidSql(err));
    }
    Ok(DeleteModel {
        table: table.name().to_string(),
        alias,
        where_clause: builder.where_clause,
        order_by: builder.order_by,
        limit: builder.limit,
        config: builder.config,
    })
}
