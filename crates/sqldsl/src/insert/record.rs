use super::render_insert;
use crate::config::StatementConfiguration;
use crate::error::{DslError, DslResult};
use crate::log;
use crate::render::{
    BatchInsert, InsertStatementProvider, ParameterMap, RenderingContext, RenderingStrategy,
};
use crate::table::{ColumnRef, SqlColumn, SqlTable};
use crate::value::Value;
use serde::Serialize;

/// Where a record insert column takes its value from.
#[derive(Debug, Clone)]
enum RecordSource {
    Property(String),
    PropertyWhenPresent(String),
    Row,
    Null,
    Constant(String),
    StringConstant(String),
}

#[derive(Debug, Clone)]
struct RecordMapping {
    column: ColumnRef,
    source: RecordSource,
}

/// Look up a (dot separated) property of a serialized record.
fn property<'a>(record: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    path.split('.')
        .try_fold(record, |value, segment| value.as_object()?.get(segment))
}

/// Render the values of one record. `None` entries are dropped columns.
fn render_values(
    mappings: &[RecordMapping],
    record: &serde_json::Value,
    ctx: &mut RenderingContext,
) -> DslResult<Vec<Option<String>>> {
    mappings
        .iter()
        .map(|mapping| -> DslResult<Option<String>> {
            let jdbc = mapping.column.jdbc_type;
            let rendered = match &mapping.source {
                RecordSource::Property(name) => {
                    let value = property(record, name).cloned().ok_or_else(|| {
                        DslError::invalid(format!("record has no property '{name}'"))
                    })?;
                    Some(ctx.bind(Value::from_json_property(value), jdbc))
                }
                RecordSource::PropertyWhenPresent(name) => match property(record, name) {
                    Some(value) if !value.is_null() => {
                        Some(ctx.bind(Value::from_json_property(value.clone()), jdbc))
                    }
                    _ => None,
                },
                RecordSource::Row => Some(ctx.bind(Value::from_json_property(record.clone()), jdbc)),
                RecordSource::Null => Some("null".to_string()),
                RecordSource::Constant(c) => Some(c.clone()),
                RecordSource::StringConstant(s) => Some(format!("'{}'", s.replace('\'', "''"))),
            };
            Ok(rendered)
        })
        .collect()
}

fn to_records<T: Serialize>(rows: impl IntoIterator<Item = T>) -> DslResult<Vec<serde_json::Value>> {
    rows.into_iter()
        .map(|row| serde_json::to_value(row).map_err(DslError::from))
        .collect()
}

// ==================== Builder ====================

/// Maps record properties to table columns.
#[derive(Debug)]
pub struct RecordInsertBuilder {
    mappings: Vec<RecordMapping>,
    config: StatementConfiguration,
}

impl RecordInsertBuilder {
    fn new() -> Self {
        Self {
            mappings: Vec::new(),
            config: StatementConfiguration::default(),
        }
    }

    /// Start a mapping: `i.map(&id).to_property("id")`.
    pub fn map<T>(&mut self, column: &SqlColumn<T>) -> PropertyMapper<'_> {
        PropertyMapper {
            builder: self,
            column: column.column_ref().clone(),
        }
    }

    pub fn configure_statement(&mut self, f: impl FnOnce(&mut StatementConfiguration)) -> &mut Self {
        f(&mut self.config);
        self
    }

    fn collect(completer: impl FnOnce(&mut RecordInsertBuilder)) -> DslResult<Self> {
        let mut builder = Self::new();
        completer(&mut builder);
        if builder.mappings.is_empty() {
            return Err(DslError::invalid("an insert requires at least one column mapping"));
        }
        Ok(builder)
    }

    /// Multi-row and batch inserts need the same column list for every record.
    fn ensure_fixed_columns(&self) -> DslResult<()> {
        if self
            .mappings
            .iter()
            .any(|m| matches!(m.source, RecordSource::PropertyWhenPresent(_)))
        {
            return Err(DslError::invalid(
                "to_property_when_present is only supported for single record inserts",
            ));
        }
        Ok(())
    }
}

/// Second half of `map(&column)`.
pub struct PropertyMapper<'a> {
    builder: &'a mut RecordInsertBuilder,
    column: ColumnRef,
}

impl PropertyMapper<'_> {
    fn push(self, source: RecordSource) {
        self.builder.mappings.push(RecordMapping {
            column: self.column,
            source,
        });
    }

    /// Bind the named property of the record; `a.b` reads nested properties.
    pub fn to_property(self, name: impl Into<String>) {
        self.push(RecordSource::Property(name.into()));
    }

    /// Bind the property, or leave the column out when it is missing or null.
    pub fn to_property_when_present(self, name: impl Into<String>) {
        self.push(RecordSource::PropertyWhenPresent(name.into()));
    }

    /// Bind the whole record, for records that are scalars.
    pub fn to_row(self) {
        self.push(RecordSource::Row);
    }

    pub fn to_null(self) {
        self.push(RecordSource::Null);
    }

    pub fn to_constant(self, constant: impl Into<String>) {
        self.push(RecordSource::Constant(constant.into()));
    }

    pub fn to_string_constant(self, constant: impl Into<String>) {
        self.push(RecordSource::StringConstant(constant.into()));
    }
}

// ==================== Single record ====================

#[derive(Debug, Clone)]
pub struct InsertModel {
    table: String,
    record: serde_json::Value,
    mappings: Vec<RecordMapping>,
    config: StatementConfiguration,
}

impl InsertModel {
    pub fn render(&self, strategy: RenderingStrategy) -> DslResult<InsertStatementProvider> {
        let mut ctx = RenderingContext::new(strategy);
        let values = render_values(&self.mappings, &self.record, &mut ctx)?;

        let mut columns = Vec::new();
        let mut placeholders = Vec::new();
        for (mapping, value) in self.mappings.iter().zip(values) {
            if let Some(value) = value {
                columns.push(mapping.column.name.as_str());
                placeholders.push(value);
            }
        }
        if columns.is_empty() {
            return Err(DslError::invalid(
                "an insert requires at least one column with a value",
            ));
        }

        let tail = format!("values ({})", placeholders.join(", "));
        let sql = render_insert(&self.config, &self.table, &columns, &tail);
        log::rendered("insert", strategy, &sql, ctx.parameters().len());
        Ok(InsertStatementProvider::new(sql, ctx.into_parameters(), strategy))
    }
}

/// Insert one record, reading column values from its serialized properties.
///
/// ```ignore
/// insert(&person_record, &person, |i| {
///     i.map(&id).to_property("id");
///     i.map(&first_name).to_property("first_name");
///     i.map(&employed).to_constant("true");
/// })?
/// ```
pub fn insert<T: Serialize>(
    row: &T,
    table: &SqlTable,
    completer: impl FnOnce(&mut RecordInsertBuilder),
) -> DslResult<InsertModel> {
    let builder = RecordInsertBuilder::collect(completer)?;
    Ok(InsertModel {
        table: table.name().to_string(),
        record: serde_json::to_value(row)?,
        mappings: builder.mappings,
        config: builder.config,
    })
}

// ==================== Multi-row ====================

/// `insert into table (a, b) values (x, y), (x, y)`
#[derive(Debug, Clone)]
pub struct MultiRowInsertModel {
    table: String,
    records: Vec<serde_json::Value>,
    mappings: Vec<RecordMapping>,
    config: StatementConfiguration,
}

impl MultiRowInsertModel {
    pub fn render(&self, strategy: RenderingStrategy) -> DslResult<InsertStatementProvider> {
        let mut ctx = RenderingContext::new(strategy);
        let mut rows = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let values: Vec<String> = render_values(&self.mappings, record, &mut ctx)?
                .into_iter()
                .flatten()
                .collect();
            rows.push(format!("({})", values.join(", ")));
        }

        let columns: Vec<&str> = self.mappings.iter().map(|m| m.column.name.as_str()).collect();
        let tail = format!("values {}", rows.join(", "));
        let sql = render_insert(&self.config, &self.table, &columns, &tail);
        log::rendered("insert_multiple", strategy, &sql, ctx.parameters().len());
        Ok(InsertStatementProvider::new(sql, ctx.into_parameters(), strategy))
    }
}

pub fn insert_multiple<T, I>(
    rows: I,
    table: &SqlTable,
    completer: impl FnOnce(&mut RecordInsertBuilder),
) -> DslResult<MultiRowInsertModel>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let records = to_records(rows)?;
    if records.is_empty() {
        return Err(DslError::invalid("a multi-row insert requires at least one record"));
    }
    let builder = RecordInsertBuilder::collect(completer)?;
    builder.ensure_fixed_columns()?;
    Ok(MultiRowInsertModel {
        table: table.name().to_string(),
        records,
        mappings: builder.mappings,
        config: builder.config,
    })
}

// ==================== Batch ====================

/// One insert statement executed once per record.
#[derive(Debug, Clone)]
pub struct BatchInsertModel {
    table: String,
    records: Vec<serde_json::Value>,
    mappings: Vec<RecordMapping>,
    config: StatementConfiguration,
}

impl BatchInsertModel {
    pub fn render(&self, strategy: RenderingStrategy) -> DslResult<BatchInsert> {
        let columns: Vec<&str> = self.mappings.iter().map(|m| m.column.name.as_str()).collect();
        let mut sql = String::new();
        let mut parameters: Vec<ParameterMap> = Vec::with_capacity(self.records.len());

        for record in &self.records {
            let mut ctx = RenderingContext::new(strategy);
            let values: Vec<String> = render_values(&self.mappings, record, &mut ctx)?
                .into_iter()
                .flatten()
                .collect();
            if sql.is_empty() {
                let tail = format!("values ({})", values.join(", "));
                sql = render_insert(&self.config, &self.table, &columns, &tail);
            }
            parameters.push(ctx.into_parameters());
        }

        log::rendered("insert_batch", strategy, &sql, parameters.len());
        Ok(BatchInsert::new(sql, parameters, strategy))
    }
}

pub fn insert_batch<T, I>(
    rows: I,
    table: &SqlTable,
    completer: impl FnOnce(&mut RecordInsertBuilder),
) -> DslResult<BatchInsertModel>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let records = to_records(rows)?;
    if records.is_empty() {
        return Err(DslError::invalid("a batch insert requires at least one record"));
    }
    let builder = RecordInsertBuilder::collect(completer)?;
    builder.ensure_fixed_columns()?;
    Ok(BatchInsertModel {
        table: table.name().to_string(),
        records,
        mappings: builder.mappings,
        config: builder.config,
    })
}
