use super::builder::{SelectBuilder, SubQueryBuilder};
use super::SelectModel;
use crate::criteria::{CriteriaCollector, CriteriaGroup};
use crate::error::{DslError, DslResult};
use crate::render::RenderingContext;
use crate::table::SqlTable;

/// Kind of join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinType::Inner => "join",
            JoinType::Left => "left join",
            JoinType::Right => "right join",
            JoinType::Full => "full join",
        }
    }
}

/// Something rows are selected from: a table or an aliased subquery.
#[derive(Debug, Clone)]
pub(crate) enum TableExpression {
    Table { name: String, alias: Option<String> },
    SubQuery { query: Box<SelectModel>, alias: String },
}

impl TableExpression {
    pub(crate) fn table(table: &SqlTable, alias: Option<&str>) -> Self {
        TableExpression::Table {
            name: table.name().to_string(),
            alias: alias.map(str::to_string),
        }
    }

    pub(crate) fn render(&self, ctx: &mut RenderingContext) -> DslResult<String> {
        match self {
            TableExpression::Table { name, alias: None } => Ok(name.clone()),
            TableExpression::Table {
                name,
                alias: Some(alias),
            } => Ok(format!("{name} {alias}")),
            TableExpression::SubQuery { query, alias } => {
                Ok(format!("({}) {}", query.render_nested(ctx)?, alias))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct JoinSpec {
    pub(crate) join_type: JoinType,
    pub(crate) table: TableExpression,
    pub(crate) on: CriteriaGroup,
}

impl JoinSpec {
    pub(crate) fn render(&self, ctx: &mut RenderingContext) -> DslResult<String> {
        let table = self.table.render(ctx)?;
        let on = self
            .on
            .render_clause(ctx)?
            .ok_or_else(|| DslError::invalid("a join requires at least one on condition"))?;
        Ok(format!("{} {} on {}", self.join_type.as_sql(), table, on))
    }
}

// ==================== Builder methods ====================

impl SelectBuilder {
    fn add_join(
        &mut self,
        join_type: JoinType,
        table: TableExpression,
        on: impl FnOnce(&mut CriteriaCollector),
    ) -> &mut Self {
        match CriteriaCollector::collect(on) {
            Ok(group) if group.is_empty() => {
                self.fail("a join requires at least one on condition");
            }
            Ok(group) => self.current.joins.push(JoinSpec {
                join_type,
                table,
                on: group,
            }),
            Err(err) => self.fail(err.into_message()),
        }
        self
    }

    fn add_subquery_join(
        &mut self,
        join_type: JoinType,
        query: impl FnOnce(&mut SubQueryBuilder),
        alias: &str,
        on: impl FnOnce(&mut CriteriaCollector),
    ) -> &mut Self {
        match SubQueryBuilder::collect(query) {
            Ok(query) => {
                let table = TableExpression::SubQuery {
                    query: Box::new(query),
                    alias: alias.to_string(),
                };
                self.add_join(join_type, table, on)
            }
            Err(err) => {
                self.fail(err.into_message());
                self
            }
        }
    }

    /// `join table on ...`
    pub fn join(&mut self, table: &SqlTable, on: impl FnOnce(&mut CriteriaCollector)) -> &mut Self {
        self.add_join(JoinType::Inner, TableExpression::table(table, None), on)
    }

    /// `join table alias on ...`
    pub fn join_as(
        &mut self,
        table: &SqlTable,
        alias: &str,
        on: impl FnOnce(&mut CriteriaCollector),
    ) -> &mut Self {
        self.add_join(JoinType::Inner, TableExpression::table(table, Some(alias)), on)
    }

    /// `join (select ...) alias on ...`
    pub fn join_subquery(
        &mut self,
        query: impl FnOnce(&mut SubQueryBuilder),
        alias: &str,
        on: impl FnOnce(&mut CriteriaCollector),
    ) -> &mut Self {
        self.add_subquery_join(JoinType::Inner, query, alias, on)
    }

    pub fn left_join(&mut self, table: &SqlTable, on: impl FnOnce(&mut CriteriaCollector)) -> &mut Self {
        self.add_join(JoinType::Left, TableExpression::table(table, None), on)
    }

    pub fn left_join_as(
        &mut self,
        table: &SqlTable,
        alias: &str,
        on: impl FnOnce(&mut CriteriaCollector),
    ) -> &mut Self {
        self.add_join(JoinType::Left, TableExpression::table(table, Some(alias)), on)
    }

    pub fn left_join_subquery(
        &mut self,
        query: impl FnOnce(&mut SubQueryBuilder),
        alias: &str,
        on: impl FnOnce(&mut CriteriaCollector),
    ) -> &mut Self {
        self.add_subquery_join(JoinType::Left, query, alias, on)
    }

    pub fn right_join(&mut self, table: &SqlTable, on: impl FnOnce(&mut CriteriaCollector)) -> &mut Self {
        self.add_join(JoinType::Right, TableExpression::table(table, None), on)
    }

    pub fn right_join_as(
        &mut self,
        table: &SqlTable,
        alias: &str,
        on: impl FnOnce(&mut CriteriaCollector),
    ) -> &mut Self {
        self.add_join(JoinType::Right, TableExpression::table(table, Some(alias)), on)
    }

    pub fn right_join_subquery(
        &mut self,
        query: impl FnOnce(&mut SubQueryBuilder),
        alias: &str,
        on: impl FnOnce(&mut CriteriaCollector),
    ) -> &mut Self {
        self.add_subquery_join(JoinType::Right, query, alias, on)
    }

    pub fn full_join(&mut self, table: &SqlTable, on: impl FnOnce(&mut CriteriaCollector)) -> &mut Self {
        self.add_join(JoinType::Full, TableExpression::table(table, None), on)
    }

    pub fn full_join_as(
        &mut self,
        table: &SqlTable,
        alias: &str,
        on: impl FnOnce(&mut CriteriaCollector),
    ) -> &mut Self {
        self.add_join(JoinType::Full, TableExpression::table(table, Some(alias)), on)
    }

    pub fn full_join_subquery(
        &mut self,
        query: impl FnOnce(&mut SubQueryBuilder),
        alias: &str,
        on: impl FnOnce(&mut CriteriaCollector),
    ) -> &mut Self {
        self.add_subquery_join(JoinType::Full, query, alias, on)
    }
}
