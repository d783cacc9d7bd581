//! Criteria trees for where, having and join clauses.
//!
//! A scope holds at most one *initial criterion* plus an ordered list of
//! sub-criteria, each joined to what precedes it by `and` or `or`:
//!
//! ```ignore
//! s.where_(|w| {
//!     w.group(|g| {
//!         g.col(&first_name).is_equal_to("Fred");
//!         g.or(|o| { o.col(&first_name).is_equal_to("Wilma"); });
//!     });
//!     w.and(|a| { a.col(&last_name).is_equal_to("Flintstone"); });
//! })
//! // where (first_name = :p1 or first_name = :p2) and last_name = :p3
//! ```
//!
//! Rendering rules:
//! - criteria that render nothing (absent `*_when_present` values) are dropped
//!   together with their connector;
//! - the first criterion that renders has no connector;
//! - a nested group is wrapped in parentheses only when more than one of its
//!   criteria rendered.

mod collector;
pub mod condition;


pub use collector::{
    BetweenBuilder, BetweenWhenPresentBuilder, ColumnCriterion, CriteriaCollector, and_then,
};
pub use condition::{CompareOp, Condition};

use crate::column::BasicColumn;
use crate::error::DslResult;
use crate::render::RenderingContext;
use crate::select::SelectModel;
use condition::{ConditionKind, render_condition};

/// Word joining a sub-criterion to the criteria before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    pub fn as_sql(self) -> &'static str {
        match self {
            Connector::And => "and",
            Connector::Or => "or",
        }
    }
}

/// A column (or expression) with a condition applied to it.
#[derive(Debug, Clone)]
pub struct ColumnCondition {
    pub(crate) column: BasicColumn,
    pub(crate) condition: ConditionKind,
    pub(crate) case_insensitive: bool,
}

/// One node of a criteria tree.
#[derive(Debug, Clone)]
pub enum SqlCriterion {
    /// `col = ph`, `col in (...)`, ...
    Condition(ColumnCondition),
    /// `exists (select ...)` / `not exists (select ...)`
    Exists {
        query: Box<SelectModel>,
        negated: bool,
    },
    /// Parenthesized group.
    Group(CriteriaGroup),
    /// `not X` / `not (X and Y)`
    Not(CriteriaGroup),
}

/// An optional initial criterion followed by and/or sub-criteria.
#[derive(Debug, Clone, Default)]
pub struct CriteriaGroup {
    pub(crate) initial: Option<Box<SqlCriterion>>,
    pub(crate) sub_criteria: Vec<AndOrCriteriaGroup>,
}

/// A criteria group joined to its predecessor with a connector.
#[derive(Debug, Clone)]
pub struct AndOrCriteriaGroup {
    pub(crate) connector: Connector,
    pub(crate) group: CriteriaGroup,
}

impl AndOrCriteriaGroup {
    /// Build a standalone `and` group, for use with the `*_all` list overloads.
    pub fn and(completer: impl FnOnce(&mut CriteriaCollector)) -> DslResult<Self> {
        Ok(Self {
            connector: Connector::And,
            group: CriteriaCollector::collect(completer)?,
        })
    }

    /// Build a standalone `or` group, for use with the `*_all` list overloads.
    pub fn or(completer: impl FnOnce(&mut CriteriaCollector)) -> DslResult<Self> {
        Ok(Self {
            connector: Connector::Or,
            group: CriteriaCollector::collect(completer)?,
        })
    }

    pub fn connector(&self) -> Connector {
        self.connector
    }
}

/// Rendered criteria plus the number of top-level fragments that rendered.
pub(crate) struct RenderedCriteria {
    pub(crate) sql: String,
    pub(crate) fragments: usize,
}

impl RenderedCriteria {
    /// Parenthesize when more than one fragment rendered.
    fn grouped(self) -> String {
        if self.fragments > 1 {
            format!("({})", self.sql)
        } else {
            self.sql
        }
    }
}

impl CriteriaGroup {
    pub fn is_empty(&self) -> bool {
        self.initial.is_none() && self.sub_criteria.is_empty()
    }

    /// Render without outer parentheses; `None` when nothing rendered.
    pub(crate) fn render(&self, ctx: &mut RenderingContext) -> DslResult<Option<RenderedCriteria>> {
        let mut parts: Vec<(Connector, String)> = Vec::new();

        if let Some(initial) = &self.initial {
            if let Some(sql) = initial.render(ctx)? {
                parts.push((Connector::And, sql));
            }
        }

        for sub in &self.sub_criteria {
            if let Some(rendered) = sub.group.render(ctx)? {
                parts.push((sub.connector, rendered.grouped()));
            }
        }

        if parts.is_empty() {
            return Ok(None);
        }

        let fragments = parts.len();
        let mut sql = String::new();
        for (i, (connector, part)) in parts.into_iter().enumerate() {
            if i > 0 {
                sql.push(' ');
                sql.push_str(connector.as_sql());
                sql.push(' ');
            }
            sql.push_str(&part);
        }
        Ok(Some(RenderedCriteria { sql, fragments }))
    }

    /// Render as a clause body (`where`, `having`, `on`, `when`); never parenthesized.
    pub(crate) fn render_clause(&self, ctx: &mut RenderingContext) -> DslResult<Option<String>> {
        Ok(self.render(ctx)?.map(|r| r.sql))
    }
}

impl SqlCriterion {
    pub(crate) fn render(&self, ctx: &mut RenderingContext) -> DslResult<Option<String>> {
        match self {
            SqlCriterion::Condition(c) => {
                render_condition(&c.column, &c.condition, c.case_insensitive, ctx)
            }
            SqlCriterion::Exists { query, negated } => {
                let sub = query.render_nested(ctx)?;
                let keyword = if *negated { "not exists" } else { "exists" };
                Ok(Some(format!("{keyword} ({sub})")))
            }
            SqlCriterion::Group(group) => Ok(group.render(ctx)?.map(RenderedCriteria::grouped)),
            SqlCriterion::Not(group) => Ok(group
                .render(ctx)?
                .map(|r| format!("not {}", r.grouped()))),
        }
    }
}
