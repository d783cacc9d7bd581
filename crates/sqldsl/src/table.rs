//! Tables, typed columns and sort specifications.

use crate::column::BasicColumn;
use crate::value::{JdbcType, SqlType};
use std::fmt;
use std::marker::PhantomData;

/// A database table referenced by statements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SqlTable {
    name: String,
}

impl SqlTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Define a column of this table holding values of type `T`.
    pub fn column<T>(&self, name: impl Into<String>) -> SqlColumn<T> {
        SqlColumn::new(ColumnRef::new(&self.name, name))
    }

    /// Define a column annotated with the default JDBC type of `T`.
    pub fn typed_column<T: SqlType>(&self, name: impl Into<String>) -> SqlColumn<T> {
        self.column::<T>(name).with_jdbc_type(T::jdbc_type())
    }

    /// `table.*`, or `*` when the table is not qualified in the rendered statement.
    pub fn all_columns(&self) -> BasicColumn {
        BasicColumn::AllColumns {
            table: self.name.clone(),
        }
    }
}

/// Untyped column reference shared by every statement model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub(crate) name: String,
    pub(crate) table: String,
    pub(crate) qualifier: Option<String>,
    pub(crate) alias: Option<String>,
    pub(crate) jdbc_type: Option<JdbcType>,
    pub(crate) descending: bool,
}

impl ColumnRef {
    pub(crate) fn new(table: &str, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.to_string(),
            qualifier: None,
            alias: None,
            jdbc_type: None,
            descending: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn jdbc_type(&self) -> Option<JdbcType> {
        self.jdbc_type
    }
}

/// A column whose values have Rust type `T`.
///
/// The type parameter is what makes conditions type-safe: `is_equal_to` on a
/// `SqlColumn<i32>` only accepts values convertible into `i32`.
pub struct SqlColumn<T> {
    pub(crate) inner: ColumnRef,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SqlColumn<T> {
    pub(crate) fn new(inner: ColumnRef) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn table_name(&self) -> &str {
        &self.inner.table
    }

    pub fn column_ref(&self) -> &ColumnRef {
        &self.inner
    }

    /// Annotate the column with a JDBC type (rendered by the MyBatis3 strategy).
    pub fn with_jdbc_type(mut self, jdbc_type: JdbcType) -> Self {
        self.inner.jdbc_type = Some(jdbc_type);
        self
    }

    /// Qualify the column explicitly, overriding any table alias.
    pub fn qualified_with(&self, qualifier: impl Into<String>) -> Self {
        let mut col = self.clone();
        col.inner.qualifier = Some(qualifier.into());
        col
    }

    /// Give the column an alias in select lists (`col as alias`).
    pub fn as_(&self, alias: impl Into<String>) -> Self {
        let mut col = self.clone();
        col.inner.alias = Some(alias.into());
        col
    }

    pub fn descending(&self) -> Self {
        let mut col = self.clone();
        col.inner.descending = true;
        col
    }

    pub fn asc(&self) -> SortSpec {
        SortSpec::from(self)
    }

    pub fn desc(&self) -> SortSpec {
        SortSpec::from(&self.descending())
    }
}

impl<T> Clone for SqlColumn<T> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<T> fmt::Debug for SqlColumn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlColumn")
            .field("table", &self.inner.table)
            .field("name", &self.inner.name)
            .finish()
    }
}

/// One `order by` item.
///
/// Sort columns always render unqualified: the alias when the column has one,
/// the column name otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub(crate) name: String,
    pub(crate) descending: bool,
}

impl SortSpec {
    /// Sort by an arbitrary name, typically a select-list alias.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descending: false,
        }
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    pub(crate) fn render(&self) -> String {
        if self.descending {
            format!("{} DESC", self.name)
        } else {
            self.name.clone()
        }
    }
}

impl<T> From<&SqlColumn<T>> for SortSpec {
    fn from(col: &SqlColumn<T>) -> Self {
        Self {
            name: col.inner.alias.clone().unwrap_or_else(|| col.inner.name.clone()),
            descending: col.inner.descending,
        }
    }
}

impl<T> From<SqlColumn<T>> for SortSpec {
    fn from(col: SqlColumn<T>) -> Self {
        SortSpec::from(&col)
    }
}
