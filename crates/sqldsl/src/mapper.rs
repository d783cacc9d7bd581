//! Helpers for mapper-style data access.
//!
//! Each function builds a statement, renders it with
//! [`RenderingStrategy::MyBatis3`] and hands the provider to a caller supplied
//! mapper, returning whatever the mapper returns. The mapper is usually a thin
//! wrapper around a statement executor that understands
//! `#{parameters.p1}` placeholders.
//!
//! ```ignore
//! let rows = sqldsl::mapper::select_list(
//!     |provider| executor.select_many(provider),
//!     columns![id, first_name],
//!     &person,
//!     |s| { s.where_(|w| { w.col(&id).is_equal_to(1); }); },
//! )?;
//! ```

use crate::column::BasicColumn;
use crate::delete::{self, DeleteBuilder};
use crate::error::DslResult;
use crate::insert::{self, GeneralInsertBuilder, InsertSelectBuilder, RecordInsertBuilder};
use crate::render::{
    DeleteStatementProvider, InsertStatementProvider, RenderingStrategy, SelectStatementProvider,
    UpdateStatementProvider,
};
use crate::select::{self, SelectBuilder};
use crate::table::SqlTable;
use crate::update::{self, UpdateBuilder};
use serde::Serialize;

const STRATEGY: RenderingStrategy = RenderingStrategy::MyBatis3;

// ==================== Count ====================

/// `select count(column) from table ...`
pub fn count<R>(
    mapper: impl FnOnce(SelectStatementProvider) -> R,
    column: impl Into<BasicColumn>,
    table: &SqlTable,
    completer: impl FnOnce(&mut SelectBuilder),
) -> DslResult<R> {
    let model = select::count(column, |s| {
        s.from(table);
        completer(s);
    })?;
    Ok(mapper(model.render(STRATEGY)?))
}

/// `select count(distinct column) from table ...`
pub fn count_distinct<R>(
    mapper: impl FnOnce(SelectStatementProvider) -> R,
    column: impl Into<BasicColumn>,
    table: &SqlTable,
    completer: impl FnOnce(&mut SelectBuilder),
) -> DslResult<R> {
    let model = select::count_distinct(column, |s| {
        s.from(table);
        completer(s);
    })?;
    Ok(mapper(model.render(STRATEGY)?))
}

/// `select count(*) from table ...`
pub fn count_from<R>(
    mapper: impl FnOnce(SelectStatementProvider) -> R,
    table: &SqlTable,
    completer: impl FnOnce(&mut SelectBuilder),
) -> DslResult<R> {
    let model = select::count_from(table, completer)?;
    Ok(mapper(model.render(STRATEGY)?))
}

// ==================== Delete / update ====================

pub fn delete_from<R>(
    mapper: impl FnOnce(DeleteStatementProvider) -> R,
    table: &SqlTable,
    completer: impl FnOnce(&mut DeleteBuilder),
) -> DslResult<R> {
    let model = delete::delete_from(table, completer)?;
    Ok(mapper(model.render(STRATEGY)?))
}

pub fn update<R>(
    mapper: impl FnOnce(UpdateStatementProvider) -> R,
    table: &SqlTable,
    completer: impl FnOnce(&mut UpdateBuilder),
) -> DslResult<R> {
    let model = update::update(table, completer)?;
    Ok(mapper(model.render(STRATEGY)?))
}

// ==================== Insert ====================

/// Insert one record.
pub fn insert<T: Serialize, R>(
    mapper: impl FnOnce(InsertStatementProvider) -> R,
    row: &T,
    table: &SqlTable,
    completer: impl FnOnce(&mut RecordInsertBuilder),
) -> DslResult<R> {
    let model = insert::insert(row, table, completer)?;
    Ok(mapper(model.render(STRATEGY)?))
}

/// Insert every record with its own statement, collecting one mapper result per record.
///
/// Batching on the executor side (if any) is up to the caller.
pub fn insert_batch<T, I, R>(
    mut mapper: impl FnMut(InsertStatementProvider) -> R,
    records: I,
    table: &SqlTable,
    completer: impl FnOnce(&mut RecordInsertBuilder),
) -> DslResult<Vec<R>>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let batch = insert::insert_batch(records, table, completer)?.render(STRATEGY)?;
    Ok(batch.statements().into_iter().map(&mut mapper).collect())
}

/// Insert explicit column values.
pub fn insert_into<R>(
    mapper: impl FnOnce(InsertStatementProvider) -> R,
    table: &SqlTable,
    completer: impl FnOnce(&mut GeneralInsertBuilder),
) -> DslResult<R> {
    let model = insert::insert_into(table, completer)?;
    Ok(mapper(model.render(STRATEGY)?))
}

/// Insert several records with one multi-row `values` statement.
pub fn insert_multiple<T, I, R>(
    mapper: impl FnOnce(InsertStatementProvider) -> R,
    records: I,
    table: &SqlTable,
    completer: impl FnOnce(&mut RecordInsertBuilder),
) -> DslResult<R>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let model = insert::insert_multiple(records, table, completer)?;
    Ok(mapper(model.render(STRATEGY)?))
}

pub fn insert_select<R>(
    mapper: impl FnOnce(InsertStatementProvider) -> R,
    table: &SqlTable,
    completer: impl FnOnce(&mut InsertSelectBuilder),
) -> DslResult<R> {
    let model = insert::insert_select(table, completer)?;
    Ok(mapper(model.render(STRATEGY)?))
}

// ==================== Select ====================

/// `select distinct ... from table ...`
pub fn select_distinct<I, R>(
    mapper: impl FnOnce(SelectStatementProvider) -> R,
    columns: I,
    table: &SqlTable,
    completer: impl FnOnce(&mut SelectBuilder),
) -> DslResult<R>
where
    I: IntoIterator,
    I::Item: Into<BasicColumn>,
{
    let model = select::select_distinct(columns, |s| {
        s.from(table);
        completer(s);
    })?;
    Ok(mapper(model.render(STRATEGY)?))
}

/// `select ... from table ...`; the mapper typically returns a list of rows.
pub fn select_list<I, R>(
    mapper: impl FnOnce(SelectStatementProvider) -> R,
    columns: I,
    table: &SqlTable,
    completer: impl FnOnce(&mut SelectBuilder),
) -> DslResult<R>
where
    I: IntoIterator,
    I::Item: Into<BasicColumn>,
{
    let model = select::select(columns, |s| {
        s.from(table);
        completer(s);
    })?;
    Ok(mapper(model.render(STRATEGY)?))
}

/// Same statement as [`select_list`]; the mapper typically returns an `Option`.
pub fn select_one<I, R>(
    mapper: impl FnOnce(SelectStatementProvider) -> R,
    columns: I,
    table: &SqlTable,
    completer: impl FnOnce(&mut SelectBuilder),
) -> DslResult<R>
where
    I: IntoIterator,
    I::Item: Into<BasicColumn>,
{
    select_list(mapper, columns, table, completer)
}
