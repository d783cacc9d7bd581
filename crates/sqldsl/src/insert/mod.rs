//! Insert statements.
//!
//! - general inserts set each column to an explicit value;
//! - record inserts read values from any `Serialize` record
//!   (single row, multi-row `values (...), (...)`, or batch);
//! - insert-select copies the result of a select.

mod record;


pub use record::{
    BatchInsertModel, InsertModel, MultiRowInsertModel, PropertyMapper, RecordInsertBuilder,
    insert, insert_batch, insert_multiple,
};

use crate::column::BasicColumn;
use crate::config::StatementConfiguration;
use crate::criteria::condition::value_of;
use crate::error::{DslError, DslResult};
use crate::log;
use crate::render::{InsertStatementProvider, RenderingContext, RenderingStrategy, join_fragments};
use crate::select::{SelectBuilder, SelectModel};
use crate::table::{ColumnRef, SqlColumn, SqlTable};
use crate::value::Value;
use std::marker::PhantomData;

/// Value side of one general insert column.
#[derive(Debug, Clone)]
enum InsertValue {
    /// Bound value; `None` when a `*_when_present` value was absent.
    Bound(Option<Value>),
    Null,
    Constant(String),
    StringConstant(String),
}

#[derive(Debug, Clone)]
struct InsertMapping {
    column: ColumnRef,
    value: InsertValue,
}

/// Render `insert into table (a, b) <tail>`.
pub(crate) fn render_insert(
    config: &StatementConfiguration,
    table: &str,
    columns: &[&str],
    tail: &str,
) -> String {
    let body = join_fragments([
        config.keyword("insert").as_str(),
        "into",
        table,
        &format!("({})", columns.join(", ")),
        tail,
    ]);
    config.wrap(body)
}

// ==================== General insert ====================

/// `insert into table (a, b) values (x, y)` built column by column.
#[derive(Debug, Clone)]
pub struct GeneralInsertModel {
    table: String,
    mappings: Vec<InsertMapping>,
    config: StatementConfiguration,
}

impl GeneralInsertModel {
    pub fn render(&self, strategy: RenderingStrategy) -> DslResult<InsertStatementProvider> {
        let mut ctx = RenderingContext::new(strategy);
        let mut columns = Vec::new();
        let mut values = Vec::new();
        for mapping in &self.mappings {
            let rendered = match &mapping.value {
                InsertValue::Bound(None) => continue,
                InsertValue::Bound(Some(value)) => ctx.bind(value.clone(), mapping.column.jdbc_type),
                InsertValue::Null => "null".to_string(),
                InsertValue::Constant(c) => c.clone(),
                InsertValue::StringConstant(s) => format!("'{}'", s.replace('\'', "''")),
            };
            columns.push(mapping.column.name.as_str());
            values.push(rendered);
        }
        if columns.is_empty() {
            return Err(DslError::invalid(
                "an insert requires at least one column with a value",
            ));
        }

        let tail = format!("values ({})", values.join(", "));
        let sql = render_insert(&self.config, &self.table, &columns, &tail);
        log::rendered("general_insert", strategy, &sql, ctx.parameters().len());
        Ok(InsertStatementProvider::new(sql, ctx.into_parameters(), strategy))
    }
}

#[derive(Debug)]
pub struct GeneralInsertBuilder {
    table: String,
    mappings: Vec<InsertMapping>,
    config: StatementConfiguration,
}

impl GeneralInsertBuilder {
    /// Start a column mapping: `i.set(&id).to_value(3)`.
    pub fn set<T>(&mut self, column: &SqlColumn<T>) -> InsertSetter<'_, T> {
        InsertSetter {
            builder: self,
            column: column.column_ref().clone(),
            _marker: PhantomData,
        }
    }

    pub fn configure_statement(&mut self, f: impl FnOnce(&mut StatementConfiguration)) -> &mut Self {
        f(&mut self.config);
        self
    }

    fn push(&mut self, column: ColumnRef, value: InsertValue) {
        self.mappings.push(InsertMapping { column, value });
    }
}

/// Second half of `set(&column)` in a general insert.
pub struct InsertSetter<'a, T> {
    builder: &'a mut GeneralInsertBuilder,
    column: ColumnRef,
    _marker: PhantomData<fn() -> T>,
}

impl<T> InsertSetter<'_, T> {
    pub fn to_null(self) {
        self.builder.push(self.column, InsertValue::Null);
    }

    pub fn to_constant(self, constant: impl Into<String>) {
        self.builder
            .push(self.column, InsertValue::Constant(constant.into()));
    }

    pub fn to_string_constant(self, constant: impl Into<String>) {
        self.builder
            .push(self.column, InsertValue::StringConstant(constant.into()));
    }
}

impl<T: Into<Value>> InsertSetter<'_, T> {
    pub fn to_value(self, value: impl Into<T>) {
        let value = value_of::<T, _>(value);
        self.builder.push(self.column, InsertValue::Bound(Some(value)));
    }

    /// Column is left out of the statement when `value` is `None`.
    pub fn to_value_when_present<V: Into<T>>(self, value: Option<V>) {
        let value = value.map(value_of::<T, V>);
        self.builder.push(self.column, InsertValue::Bound(value));
    }
}

/// `insert into table (...) values (...)` from explicit column values.
pub fn insert_into(
    table: &SqlTable,
    completer: impl FnOnce(&mut GeneralInsertBuilder),
) -> DslResult<GeneralInsertModel> {
    let mut builder = GeneralInsertBuilder {
        table: table.name().to_string(),
        mappings: Vec::new(),
        config: StatementConfiguration::default(),
    };
    completer(&mut builder);
    if builder.mappings.is_empty() {
        return Err(DslError::invalid("an insert requires at least one column mapping"));
    }
    Ok(GeneralInsertModel {
        table: builder.table,
        mappings: builder.mappings,
        config: builder.config,
    })
}

// ==================== Insert select ====================

/// `insert into table [(a, b)] select ...`
#[derive(Debug, Clone)]
pub struct InsertSelectModel {
    table: String,
    columns: Vec<String>,
    select: SelectModel,
    config: StatementConfiguration,
}

impl InsertSelectModel {
    pub fn render(&self, strategy: RenderingStrategy) -> DslResult<InsertStatementProvider> {
        let mut ctx = RenderingContext::new(strategy);
        let select = self.select.render_nested(&mut ctx)?;
        let body = if self.columns.is_empty() {
            join_fragments([
                self.config.keyword("insert").as_str(),
                "into",
                &self.table,
                &select,
            ])
        } else {
            join_fragments([
                self.config.keyword("insert").as_str(),
                "into",
                &self.table,
                &format!("({})", self.columns.join(", ")),
                &select,
            ])
        };
        let sql = self.config.wrap(body);
        log::rendered("insert_select", strategy, &sql, ctx.parameters().len());
        Ok(InsertStatementProvider::new(sql, ctx.into_parameters(), strategy))
    }
}

#[derive(Debug)]
pub struct InsertSelectBuilder {
    columns: Vec<String>,
    select: Option<SelectModel>,
    config: StatementConfiguration,
    build_error: Option<String>,
}

impl InsertSelectBuilder {
    fn fail(&mut self, message: impl Into<String>) {
        if self.build_error.is_none() {
            self.build_error = Some(message.into());
        }
    }

    /// Target columns; omitted entirely when never called.
    pub fn columns<I>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<BasicColumn>,
    {
        for column in columns {
            match column.into() {
                BasicColumn::Column(c) => self.columns.push(c.name),
                _ => self.fail("insert select columns must be table columns"),
            }
        }
        self
    }

    pub fn select<I>(&mut self, columns: I, completer: impl FnOnce(&mut SelectBuilder)) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<BasicColumn>,
    {
        if self.select.is_some() {
            self.fail("select is already set for this insert");
            return self;
        }
        match crate::select::select(columns, completer) {
            Ok(select) => self.select = Some(select),
            Err(err) => self.fail(err.into_message()),
        }
        self
    }

    pub fn configure_statement(&mut self, f: impl FnOnce(&mut StatementConfiguration)) -> &mut Self {
        f(&mut self.config);
        self
    }
}

pub fn insert_select(
    table: &SqlTable,
    completer: impl FnOnce(&mut InsertSelectBuilder),
) -> DslResult<InsertSelectModel> {
    let mut builder = InsertSelectBuilder {
        columns: Vec::new(),
        select: None,
        config: StatementConfiguration::default(),
        build_error: None,
    };
    completer(&mut builder);
    if let Some(err) = builder.build_error {
        return Err(DslError::InvalidSql(err));
    }
    let select = builder
        .select
        .ok_or_else(|| DslError::invalid("an insert select requires a select"))?;
    Ok(InsertSelectModel {
        table: table.name().to_string(),
        columns: builder.columns,
        select,
        config: builder.config,
    })
}
