use super::NamedParameterTemplate;
use crate::client::GenericClient;
use crate::error::{DslError, DslResult};
use crate::insert::{self, GeneralInsertBuilder, InsertSelectBuilder, RecordInsertBuilder};
use crate::render::{InsertStatementProvider, RenderingStrategy, StatementProvider};
use crate::row::RowExt;
use crate::table::SqlTable;
use serde::Serialize;
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

const STRATEGY: RenderingStrategy = RenderingStrategy::SpringNamedParameter;

/// Receives generated keys from inserts run through [`KeyHolderHelper`].
///
/// The key columns are requested with a `returning` clause; each inserted row
/// contributes one entry.
///
/// ```ignore
/// let mut keys = KeyHolder::new(["id"]);
/// let rows = template
///     .with_key_holder(&mut keys)
///     .insert_into(&person, |i| { i.set(&first_name).to_value("Fred"); })
///     .await?;
/// let id: i32 = keys.key_as("id")?;
/// ```
#[derive(Debug, Default)]
pub struct KeyHolder {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl KeyHolder {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// One row per inserted record, holding the key columns.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Key of the single inserted row.
    pub fn key_as<T>(&self, column: &str) -> DslResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        match self.rows.as_slice() {
            [] => Err(DslError::not_found("no generated keys were returned")),
            [row] => row.try_get_column(column),
            rows => Err(DslError::too_many_rows(1, rows.len())),
        }
    }

    /// Keys of every inserted row, in insertion order.
    pub fn keys_as<T>(&self, column: &str) -> DslResult<Vec<T>>
    where
        T: for<'a> FromSql<'a>,
    {
        self.rows.iter().map(|row| row.try_get_column(column)).collect()
    }

    pub(crate) fn returning_clause(&self) -> DslResult<String> {
        if self.columns.is_empty() {
            return Err(DslError::invalid("a key holder requires at least one key column"));
        }
        Ok(format!(" returning {}", self.columns.join(", ")))
    }
}

/// Insert operations that capture generated keys into a [`KeyHolder`].
///
/// Created by [`NamedParameterTemplate::with_key_holder`]. Every operation
/// returns the number of inserted rows.
pub struct KeyHolderHelper<'t, 'c, C: GenericClient> {
    pub(super) template: &'t NamedParameterTemplate<'c, C>,
    pub(super) keys: &'t mut KeyHolder,
}

impl<C: GenericClient> KeyHolderHelper<'_, '_, C> {
    /// Run an already rendered insert with a `returning` clause for the key columns.
    pub async fn general_insert(&mut self, provider: &InsertStatementProvider) -> DslResult<u64> {
        let returning = self.keys.returning_clause()?;
        let sql = format!("{}{returning}", provider.insert_statement());
        let rows = self
            .template
            .query_rendered(&sql, provider.parameters(), provider.strategy())
            .await?;
        let count = rows.len() as u64;
        self.keys.rows = rows;
        Ok(count)
    }

    pub async fn insert_into(
        &mut self,
        table: &SqlTable,
        completer: impl FnOnce(&mut GeneralInsertBuilder),
    ) -> DslResult<u64> {
        let provider = insert::insert_into(table, completer)?.render(STRATEGY)?;
        self.general_insert(&provider).await
    }

    pub async fn insert<T: Serialize>(
        &mut self,
        row: &T,
        table: &SqlTable,
        completer: impl FnOnce(&mut RecordInsertBuilder),
    ) -> DslResult<u64> {
        let provider = insert::insert(row, table, completer)?.render(STRATEGY)?;
        self.general_insert(&provider).await
    }

    pub async fn insert_multiple<T, I>(
        &mut self,
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
        &mut self,
        table: &SqlTable,
        completer: impl FnOnce(&mut InsertSelectBuilder),
    ) -> DslResult<u64> {
        let provider = insert::insert_select(table, completer)?.render(STRATEGY)?;
        self.general_insert(&provider).await
    }
}
