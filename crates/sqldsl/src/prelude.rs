//! Convenient imports for typical `sqldsl` usage.
//!
//! ```ignore
//! use sqldsl::prelude::*;
//! ```

pub use crate::columns;
pub use crate::column::{
    WindowModel, avg, constant, count_all, lower, max, min, partition_by, row_number,
    string_constant, sub_query, sum, upper,
};
pub use crate::criteria::condition;
pub use crate::{
    BasicColumn, ClientExt, CriteriaCollector, DslError, DslResult, FromRow, GenericClient,
    NamedParameterTemplate, RenderingStrategy, RowExt, SortSpec, SqlColumn, SqlTable,
    StatementProvider, Value, and_then,
};
pub use crate::{
    count_from, delete_from, delete_from_as, insert, insert_batch, insert_into, insert_multiple,
    insert_select, multi_select, select, select_distinct, update, update_as,
};
