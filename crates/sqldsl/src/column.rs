//! Selectable expressions: columns, constants, aggregates, window functions,
//! case expressions and scalar subqueries.

use crate::case_expr::CaseModel;
use crate::error::DslResult;
use crate::render::RenderingContext;
use crate::select::{SelectModel, SubQueryBuilder};
use crate::table::{ColumnRef, SortSpec, SqlColumn};
use crate::value::{JdbcType, Value};

/// Anything that can appear in a select list, a group by, or on either side
/// of a condition.
#[derive(Debug, Clone)]
pub enum BasicColumn {
    Column(ColumnRef),
    /// `t.*`, or `*` when the table is not qualified.
    AllColumns { table: String },
    /// Rendered verbatim.
    Constant(String),
    /// Rendered in single quotes.
    StringConstant(String),
    /// A bound parameter.
    Bound(Value),
    CountAll,
    Count(Box<BasicColumn>),
    CountDistinct(Box<BasicColumn>),
    Function {
        name: &'static str,
        arg: Box<BasicColumn>,
    },
    RowNumber,
    /// `expr over(...)`
    Windowed {
        inner: Box<BasicColumn>,
        window: Box<WindowModel>,
    },
    Case(Box<CaseModel>),
    SubQuery(Box<SelectModel>),
    Aliased {
        inner: Box<BasicColumn>,
        alias: String,
    },
}

impl BasicColumn {
    /// Give this expression an alias in select lists.
    pub fn as_(self, alias: impl Into<String>) -> Self {
        match self {
            BasicColumn::Column(mut c) => {
                c.alias = Some(alias.into());
                BasicColumn::Column(c)
            }
            BasicColumn::Aliased { inner, .. } => BasicColumn::Aliased {
                inner,
                alias: alias.into(),
            },
            other => BasicColumn::Aliased {
                inner: Box::new(other),
                alias: alias.into(),
            },
        }
    }

    /// Turn an aggregate into a window function: `sum(profit) over(partition by country)`.
    pub fn over(self, window: WindowModel) -> Self {
        match self {
            BasicColumn::Aliased { inner, alias } => BasicColumn::Aliased {
                inner: Box::new(inner.over(window)),
                alias,
            },
            other => BasicColumn::Windowed {
                inner: Box::new(other),
                window: Box::new(window),
            },
        }
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            BasicColumn::Column(c) => c.alias.as_deref(),
            BasicColumn::Aliased { alias, .. } => Some(alias),
            _ => None,
        }
    }

    /// JDBC type used when binding values compared against this expression.
    pub fn jdbc_type(&self) -> Option<JdbcType> {
        match self {
            BasicColumn::Column(c) => c.jdbc_type,
            BasicColumn::Function { arg, .. } => arg.jdbc_type(),
            BasicColumn::Windowed { inner, .. } => inner.jdbc_type(),
            BasicColumn::Aliased { inner, .. } => inner.jdbc_type(),
            _ => None,
        }
    }

    /// Render the expression itself, without any alias.
    pub(crate) fn render(&self, ctx: &mut RenderingContext) -> DslResult<String> {
        let sql = match self {
            BasicColumn::Column(c) => ctx.column_name(c),
            BasicColumn::AllColumns { table } => match ctx.qualifier_for(table) {
                Some(q) => format!("{q}.*"),
                None => "*".to_string(),
            },
            BasicColumn::Constant(s) => s.clone(),
            BasicColumn::StringConstant(s) => format!("'{}'", s.replace('\'', "''")),
            BasicColumn::Bound(value) => ctx.bind(value.clone(), None),
            BasicColumn::CountAll => "count(*)".to_string(),
            BasicColumn::Count(inner) => format!("count({})", inner.render(ctx)?),
            BasicColumn::CountDistinct(inner) => format!("count(distinct {})", inner.render(ctx)?),
            BasicColumn::Function { name, arg } => format!("{}({})", name, arg.render(ctx)?),
            BasicColumn::RowNumber => "row_number()".to_string(),
            BasicColumn::Windowed { inner, window } => {
                format!("{} {}", inner.render(ctx)?, window.render(ctx)?)
            }
            BasicColumn::Case(case) => case.render(ctx)?,
            BasicColumn::SubQuery(query) => format!("({})", query.render_nested(ctx)?),
            BasicColumn::Aliased { inner, .. } => inner.render(ctx)?,
        };
        Ok(sql)
    }

    /// Render for a select list: `expr` or `expr as alias`.
    pub(crate) fn render_selected(&self, ctx: &mut RenderingContext) -> DslResult<String> {
        let sql = self.render(ctx)?;
        Ok(match self.alias() {
            Some(alias) => format!("{sql} as {alias}"),
            None => sql,
        })
    }
}

impl<T> From<&SqlColumn<T>> for BasicColumn {
    fn from(col: &SqlColumn<T>) -> Self {
        BasicColumn::Column(col.inner.clone())
    }
}

impl<T> From<SqlColumn<T>> for BasicColumn {
    fn from(col: SqlColumn<T>) -> Self {
        BasicColumn::Column(col.inner)
    }
}

impl From<&BasicColumn> for BasicColumn {
    fn from(col: &BasicColumn) -> Self {
        col.clone()
    }
}

/// The window of a window function.
#[derive(Debug, Clone, Default)]
pub struct WindowModel {
    partition_by: Vec<BasicColumn>,
    order_by: Vec<SortSpec>,
}

impl WindowModel {
    /// An empty window, `over()`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partition_by<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<BasicColumn>,
    {
        self.partition_by = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SortSpec>,
    {
        self.order_by = columns.into_iter().map(Into::into).collect();
        self
    }

    fn render(&self, ctx: &mut RenderingContext) -> DslResult<String> {
        let mut parts = Vec::with_capacity(2);
        if !self.partition_by.is_empty() {
            let columns = self
                .partition_by
                .iter()
                .map(|c| c.render(ctx))
                .collect::<DslResult<Vec<_>>>()?;
            parts.push(format!("partition by {}", columns.join(", ")));
        }
        if !self.order_by.is_empty() {
            let specs: Vec<String> = self.order_by.iter().map(SortSpec::render).collect();
            parts.push(format!("order by {}", specs.join(", ")));
        }
        Ok(format!("over({})", parts.join(" ")))
    }
}

/// `WindowModel::new().partition_by(columns)`
pub fn partition_by<I>(columns: I) -> WindowModel
where
    I: IntoIterator,
    I::Item: Into<BasicColumn>,
{
    WindowModel::new().partition_by(columns)
}

/// Build a select list from heterogeneous expressions.
///
/// ```ignore
/// select(columns![id, first_name, count_all().as_("total")], |s| { ... })
/// ```
#[macro_export]
macro_rules! columns {
    ($($col:expr),* $(,)?) => {
        vec![$($crate::BasicColumn::from(&$col)),*]
    };
}

// ==================== Constructors ====================

/// A constant rendered verbatim, e.g. `constant("3")`.
pub fn constant(value: impl Into<String>) -> BasicColumn {
    BasicColumn::Constant(value.into())
}

/// A string literal rendered in single quotes.
pub fn string_constant(value: impl Into<String>) -> BasicColumn {
    BasicColumn::StringConstant(value.into())
}

/// A bound value usable where a column is expected.
pub fn value(value: impl Into<Value>) -> BasicColumn {
    BasicColumn::Bound(value.into())
}

pub fn count_all() -> BasicColumn {
    BasicColumn::CountAll
}

pub fn count(column: impl Into<BasicColumn>) -> BasicColumn {
    BasicColumn::Count(Box::new(column.into()))
}

pub fn count_distinct(column: impl Into<BasicColumn>) -> BasicColumn {
    BasicColumn::CountDistinct(Box::new(column.into()))
}

fn function(name: &'static str, column: impl Into<BasicColumn>) -> BasicColumn {
    BasicColumn::Function {
        name,
        arg: Box::new(column.into()),
    }
}

pub fn max(column: impl Into<BasicColumn>) -> BasicColumn {
    function("max", column)
}

pub fn min(column: impl Into<BasicColumn>) -> BasicColumn {
    function("min", column)
}

pub fn avg(column: impl Into<BasicColumn>) -> BasicColumn {
    function("avg", column)
}

pub fn sum(column: impl Into<BasicColumn>) -> BasicColumn {
    function("sum", column)
}

/// `row_number()`, meant to be used with [`BasicColumn::over`].
pub fn row_number() -> BasicColumn {
    BasicColumn::RowNumber
}

pub fn upper(column: impl Into<BasicColumn>) -> BasicColumn {
    function("upper", column)
}

pub fn lower(column: impl Into<BasicColumn>) -> BasicColumn {
    function("lower", column)
}

/// A scalar subquery: `(select ...)`.
pub fn sub_query(completer: impl FnOnce(&mut SubQueryBuilder)) -> DslResult<BasicColumn> {
    let query = SubQueryBuilder::collect(completer)?;
    Ok(BasicColumn::SubQuery(Box::new(query)))
}
