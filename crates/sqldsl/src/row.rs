//! Row mapping traits and utilities

use crate::error::{DslError, DslResult};
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

/// Trait for types that can be constructed from a database row.
///
/// Adapters accept either a `FromRow` type or an explicit row mapper closure
/// (`Fn(&Row) -> DslResult<T>`).
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> DslResult<Self>;
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning DslError::Decode on failure
    fn try_get_column<T>(&self, column: &str) -> DslResult<T>
    where
        T: for<'a> FromSql<'a>;

    /// Try to get the value at a column index
    fn try_get_index<T>(&self, index: usize) -> DslResult<T>
    where
        T: for<'a> FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> DslResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| DslError::decode(column, e.to_string()))
    }

    fn try_get_index<T>(&self, index: usize) -> DslResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(index)
            .map_err(|e| DslError::decode(format!("#{index}"), e.to_string()))
    }
}

/// Read a `count(*)` style result from the first column.
pub(crate) fn count_of(row: &Row) -> DslResult<i64> {
    row.try_get_index::<i64>(0)
}
