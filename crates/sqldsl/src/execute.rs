//! Direct execution of statement models through a [`GenericClient`].
//!
//! Models are rendered with [`RenderingStrategy::Postgres`] so the SQL can be
//! handed to `tokio-postgres` as is.
//!
//! ```ignore
//! use sqldsl::prelude::*;
//!
//! let model = select(columns![id, first_name], |s| {
//!     s.from(&person);
//!     s.where_(|w| { w.col(&id).is_greater_than(3); });
//! })?;
//! let names: Vec<String> = client.select_list(&model, |row| row.try_get_column("first_name")).await?;
//! ```

use crate::client::GenericClient;
use crate::delete::DeleteModel;
use crate::error::{DslError, DslResult};
use crate::insert::{
    BatchInsertModel, GeneralInsertModel, InsertModel, InsertSelectModel, MultiRowInsertModel,
};
use crate::log;
use crate::render::{
    DeleteStatementProvider, InsertStatementProvider, RenderingStrategy, SelectStatementProvider,
    StatementProvider, UpdateStatementProvider,
};
use crate::row::count_of;
use crate::select::{MultiSelectModel, SelectModel};
use crate::update::UpdateModel;
use futures_util::future::try_join_all;
use tokio_postgres::Row;

/// A statement model that renders to a single SQL statement.
pub trait Renderable {
    type Provider: StatementProvider + Send + Sync;

    fn render_with(&self, strategy: RenderingStrategy) -> DslResult<Self::Provider>;
}

macro_rules! impl_renderable {
    ($($model:ty => $provider:ty),* $(,)?) => {
        $(
            impl Renderable for $model {
                type Provider = $provider;

                fn render_with(&self, strategy: RenderingStrategy) -> DslResult<$provider> {
                    self.render(strategy)
                }
            }
        )*
    };
}

impl_renderable! {
    SelectModel => SelectStatementProvider,
    MultiSelectModel => SelectStatementProvider,
    DeleteModel => DeleteStatementProvider,
    UpdateModel => UpdateStatementProvider,
    GeneralInsertModel => InsertStatementProvider,
    InsertModel => InsertStatementProvider,
    MultiRowInsertModel => InsertStatementProvider,
    InsertSelectModel => InsertStatementProvider,
}

async fn query_provider<C, P>(client: &C, provider: &P) -> DslResult<Vec<Row>>
where
    C: GenericClient + ?Sized,
    P: StatementProvider + Sync,
{
    let params = provider.parameters().as_refs();
    log::executing("client", provider.sql(), params.len(), Some(log::DEFAULT_MAX_SQL_LENGTH));
    client.query(provider.sql(), &params).await
}

async fn execute_provider<C, P>(client: &C, provider: &P) -> DslResult<u64>
where
    C: GenericClient + ?Sized,
    P: StatementProvider + Sync,
{
    let params = provider.parameters().as_refs();
    log::executing("client", provider.sql(), params.len(), Some(log::DEFAULT_MAX_SQL_LENGTH));
    client.execute(provider.sql(), &params).await
}

/// Render-and-run helpers available on every [`GenericClient`].
pub trait ClientExt: GenericClient {
    /// Run a select and map every row.
    fn select_list<M, T, F>(
        &self,
        model: &M,
        mapper: F,
    ) -> impl std::future::Future<Output = DslResult<Vec<T>>> + Send
    where
        M: Renderable,
        T: Send,
        F: Fn(&Row) -> DslResult<T> + Send,
    {
        let rendered = model.render_with(RenderingStrategy::Postgres);
        async move {
            let provider = rendered?;
            let rows = query_provider(self, &provider).await?;
            rows.iter().map(|row| mapper(row)).collect()
        }
    }

    /// Run a select expected to return at most one row.
    ///
    /// Semantics:
    /// - 0 rows: returns `Ok(None)`
    /// - 1 row: returns the mapped row
    /// - multiple rows: returns [`DslError::TooManyRows`]
    fn select_one<M, T, F>(
        &self,
        model: &M,
        mapper: F,
    ) -> impl std::future::Future<Output = DslResult<Option<T>>> + Send
    where
        M: Renderable,
        T: Send,
        F: Fn(&Row) -> DslResult<T> + Send,
    {
        let rendered = model.render_with(RenderingStrategy::Postgres);
        async move {
            let provider = rendered?;
            let rows = query_provider(self, &provider).await?;
            match rows.as_slice() {
                [] => Ok(None),
                [row] => mapper(row).map(Some),
                _ => Err(DslError::too_many_rows(1, rows.len())),
            }
        }
    }

    /// Run a `count(...)` select and read the first column.
    fn count<M>(&self, model: &M) -> impl std::future::Future<Output = DslResult<i64>> + Send
    where
        M: Renderable,
    {
        let rendered = model.render_with(RenderingStrategy::Postgres);
        async move {
            let provider = rendered?;
            let rows = query_provider(self, &provider).await?;
            let row = rows
                .first()
                .ok_or_else(|| DslError::not_found("count returned no rows"))?;
            count_of(row)
        }
    }

    /// Run an insert, update or delete and return the affected row count.
    ///
    /// Named apart from [`GenericClient::execute`], which takes raw SQL.
    fn execute_model<M>(&self, model: &M) -> impl std::future::Future<Output = DslResult<u64>> + Send
    where
        M: Renderable,
    {
        let rendered = model.render_with(RenderingStrategy::Postgres);
        async move {
            let provider = rendered?;
            execute_provider(self, &provider).await
        }
    }

    /// Run a batch insert, one execution per record, and return each row count.
    ///
    /// The executions are issued together and pipelined on the connection.
    fn execute_batch(
        &self,
        model: &BatchInsertModel,
    ) -> impl std::future::Future<Output = DslResult<Vec<u64>>> + Send {
        let rendered = model.render(RenderingStrategy::Postgres);
        async move {
            let batch = rendered?;
            let statements = batch.statements();
            try_join_all(
                statements
                    .iter()
                    .map(|provider| execute_provider(self, provider)),
            )
            .await
        }
    }
}

impl<C: GenericClient> ClientExt for C {}
