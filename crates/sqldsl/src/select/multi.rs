use super::builder::{SelectBuilder, SubQueryBuilder};
use super::{Paging, SelectModel, UnionKind, render_order_by};
use crate::column::BasicColumn;
use crate::config::StatementConfiguration;
use crate::error::{DslError, DslResult};
use crate::log;
use crate::render::{RenderingContext, RenderingStrategy, SelectStatementProvider, join_fragments};
use crate::table::SortSpec;

/// Union of complete selects, each rendered in parentheses.
///
/// ```ignore
/// multi_select(|m| {
///     m.select([&id], |s| { s.from(&person); s.where_(|w| { w.col(&id).is_less_than(2); }); s.limit(1); });
///     m.union_all(|u| { u.select([&id], |s| { s.from(&person); }); });
///     m.order_by([id.asc()]);
/// })?
/// // (select id from Person where id < ? limit ?) union all (select id from Person) order by id
/// ```
#[derive(Debug, Clone)]
pub struct MultiSelectModel {
    selects: Vec<(Option<UnionKind>, SelectModel)>,
    order_by: Vec<SortSpec>,
    paging: Paging,
    config: StatementConfiguration,
}

impl MultiSelectModel {
    pub fn render(&self, strategy: RenderingStrategy) -> DslResult<SelectStatementProvider> {
        let mut ctx = RenderingContext::new(strategy);
        let mut parts = Vec::new();
        for (connector, select) in &self.selects {
            if let Some(connector) = connector {
                parts.push(connector.as_sql().to_string());
            }
            parts.push(format!("({})", select.render_nested(&mut ctx)?));
        }
        parts.push(render_order_by(&self.order_by));
        parts.push(self.paging.render(&mut ctx));
        let sql = self.config.wrap(join_fragments(parts));

        log::rendered("multi_select", strategy, &sql, ctx.parameters().len());
        Ok(SelectStatementProvider::new(sql, ctx.into_parameters(), strategy))
    }
}

#[derive(Debug, Default)]
pub struct MultiSelectBuilder {
    selects: Vec<(Option<UnionKind>, SelectModel)>,
    order_by: Vec<SortSpec>,
    paging: Paging,
    config: StatementConfiguration,
    build_error: Option<String>,
}

impl MultiSelectBuilder {
    fn fail(&mut self, message: impl Into<String>) {
        if self.build_error.is_none() {
            self.build_error = Some(message.into());
        }
    }

    fn push(&mut self, connector: Option<UnionKind>, result: DslResult<SelectModel>) {
        match result {
            Ok(select) => self.selects.push((connector, select)),
            Err(err) => self.fail(err.into_message()),
        }
    }

    /// The first select. Further selects are added with `union`/`union_all`.
    pub fn select<I>(&mut self, columns: I, completer: impl FnOnce(&mut SelectBuilder))
    where
        I: IntoIterator,
        I::Item: Into<BasicColumn>,
    {
        if !self.selects.is_empty() {
            self.fail("a multi-select may only start with one select; use union or union_all");
            return;
        }
        self.push(None, super::select(columns, completer));
    }

    pub fn select_distinct<I>(&mut self, columns: I, completer: impl FnOnce(&mut SelectBuilder))
    where
        I: IntoIterator,
        I::Item: Into<BasicColumn>,
    {
        if !self.selects.is_empty() {
            self.fail("a multi-select may only start with one select; use union or union_all");
            return;
        }
        self.push(None, super::select_distinct(columns, completer));
    }

    fn add_union(&mut self, kind: UnionKind, completer: impl FnOnce(&mut SubQueryBuilder)) {
        if self.selects.is_empty() {
            self.fail(format!("{} requires a preceding select", kind.as_sql()));
            return;
        }
        self.push(Some(kind), SubQueryBuilder::collect(completer));
    }

    pub fn union(&mut self, completer: impl FnOnce(&mut SubQueryBuilder)) {
        self.add_union(UnionKind::Union, completer);
    }

    pub fn union_all(&mut self, completer: impl FnOnce(&mut SubQueryBuilder)) {
        self.add_union(UnionKind::UnionAll, completer);
    }

    pub fn order_by<I>(&mut self, columns: I)
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
    }

    pub fn limit(&mut self, limit: i64) {
        self.paging.limit = Some(limit);
    }

    pub fn offset(&mut self, offset: i64) {
        self.paging.offset = Some(offset);
    }

    pub fn fetch_first(&mut self, rows: i64) {
        self.paging.fetch_first = Some(rows);
    }

    pub fn configure_statement(&mut self, f: impl FnOnce(&mut StatementConfiguration)) {
        f(&mut self.config);
    }

    fn build(self) -> DslResult<MultiSelectModel> {
        if let Some(err) = self.build_error {
            return Err(DslError::InvalidSql(err));
        }
        if self.selects.is_empty() {
            return Err(DslError::invalid("a multi-select requires at least one select"));
        }
        if self.paging.limit.is_some() && self.paging.fetch_first.is_some() {
            return Err(DslError::invalid("limit and fetch first cannot be combined"));
        }
        Ok(MultiSelectModel {
            selects: self.selects,
            order_by: self.order_by,
            paging: self.paging,
            config: self.config,
        })
    }
}

/// `(select ...) union (select ...) [order by ...] [paging]`
pub fn multi_select(completer: impl FnOnce(&mut MultiSelectBuilder)) -> DslResult<MultiSelectModel> {
    let mut builder = MultiSelectBuilder::default();
    completer(&mut builder);
    builder.build()
}
