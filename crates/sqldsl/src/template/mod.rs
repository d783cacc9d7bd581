//! Named-parameter execution template.
//!
//! [`NamedParameterTemplate`] runs statements rendered with
//! [`RenderingStrategy::SpringNamedParameter`] (`:p1` placeholders) through any
//! [`GenericClient`]. Named placeholders are rewritten to positional `$n`
//! just before execution.
//!
//! ```ignore
//! let template = NamedParameterTemplate::new(&client);
//!
//! let rows = template
//!     .select(columns![id, first_name], |s| {
//!         s.from(&person);
//!         s.where_(|w| { w.col(&id).is_less_than(4); });
//!     })
//!     .with_row_mapper(|row| row.try_get_column::<String>("first_name"))
//!     .await?;
//!
//! let deleted = template.delete_from(&person, |d| {
//!     d.where_(|w| { w.col(&id).is_equal_to(3); });
//! }).await?;
//! ```

mod key_holder;
mod named;

pub use key_holder::{KeyHolder, KeyHolderHelper};

use crate::client::GenericClient;
use crate::column::BasicColumn;
use crate::delete::{self, DeleteBuilder};
use crate::error::{DslError, DslResult};
use crate::insert::{self, GeneralInsertBuilder, InsertSelectBuilder, RecordInsertBuilder};
use crate::log;
use crate::render::{
    BatchInsert, DeleteStatementProvider, InsertStatementProvider, ParameterMap,
    RenderingStrategy, SelectStatementProvider, StatementProvider, UpdateStatementProvider,
};
use crate::row::{FromRow, count_of};
use crate::select::{self, SelectBuilder};
use crate::table::SqlTable;
use crate::update::{self, UpdateBuilder};
use serde::Serialize;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

const STRATEGY: RenderingStrategy = RenderingStrategy::SpringNamedParameter;

/// Configuration for [`NamedParameterTemplate`].
#[derive(Debug, Clone)]
pub struct TemplateConfig {
    /// Truncate logged SQL to this many bytes.
    pub max_sql_length: Option<usize>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            max_sql_length: Some(log::DEFAULT_MAX_SQL_LENGTH),
        }
    }
}

impl TemplateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Log SQL untruncated.
    pub fn full_sql(mut self) -> Self {
        self.max_sql_length = None;
        self
    }
}

/// Executes named-parameter statements through a [`GenericClient`].
pub struct NamedParameterTemplate<'c, C: GenericClient> {
    client: &'c C,
    config: TemplateConfig,
}

impl<'c, C: GenericClient> NamedParameterTemplate<'c, C> {
    pub fn new(client: &'c C) -> Self {
        Self::with_config(client, TemplateConfig::default())
    }

    pub fn with_config(client: &'c C, config: TemplateConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &'c C {
        self.client
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    // ==================== Raw named SQL ====================

    /// Run `:name` SQL and return all rows.
    pub async fn query_named(&self, sql: &str, params: &ParameterMap) -> DslResult<Vec<Row>> {
        self.query_rendered(sql, params, STRATEGY).await
    }

    /// Run `:name` SQL and return the affected row count.
    pub async fn execute_named(&self, sql: &str, params: &ParameterMap) -> DslResult<u64> {
        self.execute_rendered(sql, params, STRATEGY).await
    }

    fn bind<'p>(
        &self,
        sql: &str,
        params: &'p ParameterMap,
        strategy: RenderingStrategy,
    ) -> DslResult<(String, Vec<&'p (dyn ToSql + Sync)>)> {
        let (sql, params) = match strategy {
            RenderingStrategy::SpringNamedParameter => {
                let positional = named::to_positional(sql, params)?;
                (positional.sql, positional.params)
            }
            RenderingStrategy::Postgres => (sql.to_string(), params.as_refs()),
            other => {
                return Err(DslError::invalid(format!(
                    "statements rendered with the {other} strategy cannot be executed by a named parameter template"
                )));
            }
        };
        log::executing("template", &sql, params.len(), self.config.max_sql_length);
        Ok((sql, params))
    }

    pub(crate) async fn query_rendered(
        &self,
        sql: &str,
        params: &ParameterMap,
        strategy: RenderingStrategy,
    ) -> DslResult<Vec<Row>> {
        let (sql, params) = self.bind(sql, params, strategy)?;
        self.client.query(&sql, &params).await
    }

    async fn execute_rendered(
        &self,
        sql: &str,
        params: &ParameterMap,
        strategy: RenderingStrategy,
    ) -> DslResult<u64> {
        let (sql, params) = self.bind(sql, params, strategy)?;
        self.client.execute(&sql, &params).await
    }

    async fn execute_provider(&self, provider: &impl StatementProvider) -> DslResult<u64> {
        self.execute_rendered(provider.sql(), provider.parameters(), provider.strategy())
            .await
    }

    // ==================== Count ====================

    /// Run a rendered count statement.
    pub async fn count(&self, provider: &SelectStatementProvider) -> DslResult<i64> {
        let rows = self
            .query_rendered(provider.sql(), provider.parameters(), provider.strategy())
            .await?;
        let row = rows
            .first()
            .ok_or_else(|| DslError::not_found("count returned no rows"))?;
        count_of(row)
    }

    /// `select count(*) from table ...`
    pub async fn count_from(
        &self,
        table: &SqlTable,
        completer: impl FnOnce(&mut SelectBuilder),
    ) -> DslResult<i64> {
        let provider = select::count_from(table, completer)?.render(STRATEGY)?;
        self.count(&provider).await
    }

    /// `select count(column) ...`; the completer supplies `from`.
    pub async fn count_column(
        &self,
        column: impl Into<BasicColumn>,
        completer: impl FnOnce(&mut SelectBuilder),
    ) -> DslResult<i64> {
        let provider = select::count(column, completer)?.render(STRATEGY)?;
        self.count(&provider).await
    }

    /// `select count(distinct column) ...`; the completer supplies `from`.
    pub async fn count_distinct(
        &self,
        column: impl Into<BasicColumn>,
        completer: impl FnOnce(&mut SelectBuilder),
    ) -> DslResult<i64> {
        let provider = select::count_distinct(column, completer)?.render(STRATEGY)?;
        self.count(&provider).await
    }

    // ==================== Delete / update ====================

    pub async fn delete(&self, provider: &DeleteStatementProvider) -> DslResult<u64> {
        self.execute_provider(provider).await
    }

    pub async fn delete_from(
        &self,
        table: &SqlTable,
        completer: impl FnOnce(&mut DeleteBuilder),
    ) -> DslResult<u64> {
        let provider = delete::delete_from(table, completer)?.render(STRATEGY)?;
        self.delete(&provider).await
    }

    pub async fn update(&self, provider: &UpdateStatementProvider) -> DslResult<u64> {
        self.execute_provider(provider).await
    }

    pub async fn update_table(
        &self,
        table: &SqlTable,
        completer: impl FnOnce(&mut UpdateBuilder),
    ) -> DslResult<u64> {
        let provider = update::update(table, completer)?.render(STRATEGY)?;
        self.update(&provider).await
    }

    // ==================== Insert ====================

    /// Run any rendered insert (general, record, multi-row or insert-select).
    pub async fn general_insert(&self, provider: &InsertStatementProvider) -> DslResult<u64> {
        self.execute_provider(provider).await
    }

    pub async fn insert_into(
        &self,
        table: &SqlTable,
        completer: impl FnOnce(&mut GeneralInsertBuilder),
    ) -> DslResult<u64> {
        let provider = insert::insert_into(table, completer)?.render(STRATEGY)?;
        self.general_insert(&provider).await
    }

    pub async fn insert<T: Serialize>(
        &self,
        row: &T,
        table: &SqlTable,
        completer: impl FnOnce(&mut RecordInsertBuilder),
    ) -> DslResult<u64> {
        let provider = insert::insert(row, table, completer)?.render(STRATEGY)?;
        self.general_insert(&provider).await
    }

    pub async fn insert_multiple<T, I>(
        &self,
        records: I,
        table: &SqlTable,
        completer: impl FnOnce(&mut RecordInsertBuilder),
    ) -> DslResult<u64>
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        let provider = insert::insert_multiple(records, table, completer)?.render(STRATEGY)?;
        self.general_insert(&provider).await
    }

    pub async fn insert_select(
        &self,
        table: &SqlTable,
        completer: impl FnOnce(&mut InsertSelectBuilder),
    ) -> DslResult<u64> {
        let provider = insert::insert_select(table, completer)?.render(STRATEGY)?;
        self.general_insert(&provider).await
    }

    /// Run a rendered batch, one execution per record, stopping at the first failure.
    pub async fn insert_batch(&self, batch: &BatchInsert) -> DslResult<Vec<u64>> {
        let mut counts = Vec::with_capacity(batch.records().len());
        for params in batch.records() {
            counts.push(
                self.execute_rendered(batch.insert_statement(), params, batch.strategy())
                    .await?,
            );
        }
        Ok(counts)
    }

    pub async fn insert_batch_records<T, I>(
        &self,
        records: I,
        table: &SqlTable,
        completer: impl FnOnce(&mut RecordInsertBuilder),
    ) -> DslResult<Vec<u64>>
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        let batch = insert::insert_batch(records, table, completer)?.render(STRATEGY)?;
        self.insert_batch(&batch).await
    }

    /// Capture generated keys from the next insert into `keys`.
    pub fn with_key_holder<'t>(&'t self, keys: &'t mut KeyHolder) -> KeyHolderHelper<'t, 'c, C> {
        KeyHolderHelper {
            template: self,
            keys,
        }
    }

    // ==================== Select ====================

    /// Run a rendered select and map every row.
    pub async fn select_list<T, F>(&self, provider: &SelectStatementProvider, mapper: F) -> DslResult<Vec<T>>
    where
        F: Fn(&Row) -> DslResult<T>,
    {
        let rows = self
            .query_rendered(provider.sql(), provider.parameters(), provider.strategy())
            .await?;
        rows.iter().map(mapper).collect()
    }

    /// Run a rendered select and map every row with [`FromRow`].
    pub async fn select_list_as<T: FromRow>(&self, provider: &SelectStatementProvider) -> DslResult<Vec<T>> {
        self.select_list(provider, T::from_row).await
    }

    /// Run a rendered select expected to return at most one row.
    ///
    /// Semantics:
    /// - 0 rows: returns `Ok(None)`
    /// - 1 row: returns the mapped row
    /// - multiple rows: returns [`DslError::TooManyRows`]
    pub async fn select_one<T, F>(&self, provider: &SelectStatementProvider, mapper: F) -> DslResult<Option<T>>
    where
        F: Fn(&Row) -> DslResult<T>,
    {
        let rows = self
            .query_rendered(provider.sql(), provider.parameters(), provider.strategy())
            .await?;
        match rows.as_slice() {
            [] => Ok(None),
            [row] => mapper(row).map(Some),
            _ => Err(DslError::too_many_rows(1, rows.len())),
        }
    }

    /// `select ...`; finish with [`SelectListMapperGatherer::with_row_mapper`].
    pub fn select<I>(
        &self,
        columns: I,
        completer: impl FnOnce(&mut SelectBuilder),
    ) -> SelectListMapperGatherer<'_, 'c, C>
    where
        I: IntoIterator,
        I::Item: Into<BasicColumn>,
    {
        SelectListMapperGatherer {
            template: self,
            provider: select::select(columns, completer).and_then(|m| m.render(STRATEGY)),
        }
    }

    /// `select distinct ...`; finish with [`SelectListMapperGatherer::with_row_mapper`].
    pub fn select_distinct<I>(
        &self,
        columns: I,
        completer: impl FnOnce(&mut SelectBuilder),
    ) -> SelectListMapperGatherer<'_, 'c, C>
    where
        I: IntoIterator,
        I::Item: Into<BasicColumn>,
    {
        SelectListMapperGatherer {
            template: self,
            provider: select::select_distinct(columns, completer).and_then(|m| m.render(STRATEGY)),
        }
    }

    /// `select ...` expecting at most one row; finish with
    /// [`SelectOneMapperGatherer::with_row_mapper`].
    pub fn select_single<I>(
        &self,
        columns: I,
        completer: impl FnOnce(&mut SelectBuilder),
    ) -> SelectOneMapperGatherer<'_, 'c, C>
    where
        I: IntoIterator,
        I::Item: Into<BasicColumn>,
    {
        SelectOneMapperGatherer {
            template: self,
            provider: select::select(columns, completer).and_then(|m| m.render(STRATEGY)),
        }
    }
}

/// A built select waiting for its row mapper.
///
/// Build and render errors are reported when the mapper is supplied.
pub struct SelectListMapperGatherer<'t, 'c, C: GenericClient> {
    template: &'t NamedParameterTemplate<'c, C>,
    provider: DslResult<SelectStatementProvider>,
}

impl<C: GenericClient> SelectListMapperGatherer<'_, '_, C> {
    pub async fn with_row_mapper<T, F>(self, mapper: F) -> DslResult<Vec<T>>
    where
        F: Fn(&Row) -> DslResult<T>,
    {
        let provider = self.provider?;
        self.template.select_list(&provider, mapper).await
    }

    pub async fn as_type<T: FromRow>(self) -> DslResult<Vec<T>> {
        self.with_row_mapper(T::from_row).await
    }
}

/// A built single-row select waiting for its row mapper.
pub struct SelectOneMapperGatherer<'t, 'c, C: GenericClient> {
    template: &'t NamedParameterTemplate<'c, C>,
    provider: DslResult<SelectStatementProvider>,
}

impl<C: GenericClient> SelectOneMapperGatherer<'_, '_, C> {
    pub async fn with_row_mapper<T, F>(self, mapper: F) -> DslResult<Option<T>>
    where
        F: Fn(&Row) -> DslResult<T>,
    {
        let provider = self.provider?;
        self.template.select_one(&provider, mapper).await
    }

    pub async fn as_type<T: FromRow>(self) -> DslResult<Option<T>> {
        self.with_row_mapper(T::from_row).await
    }
}
