//! # sqldsl
//!
//! A fluent, type-safe DSL for building SQL statements in Rust.
//!
//! ## Features
//!
//! - **Completer style**: statements are assembled by closures handed a scoped builder
//! - **Typed columns**: `SqlColumn<T>` only accepts values convertible to `T`
//! - **Conditional criteria**: `*_when_present` conditions drop out when the value is `None`
//! - **Minimal parentheses**: groups are parenthesized only when more than one criterion renders
//! - **Several placeholder styles**: MyBatis3, Spring named parameters, Postgres `$n`, JDBC `?`
//! - **Adapters**: mapper functions, a named-parameter template and direct execution on any `GenericClient`
//!
//! ## Building statements
//!
//! ```ignore
//! use sqldsl::prelude::*;
//!
//! let person = SqlTable::new("Person");
//! let id = person.column::<i32>("id");
//! let first_name = person.column::<String>("first_name");
//! let last_name = person.column::<String>("last_name");
//!
//! let provider = select(columns![id, first_name], |s| {
//!     s.from(&person);
//!     s.where_(|w| {
//!         w.group(|g| {
//!             g.col(&first_name).is_equal_to("Fred");
//!             g.or(|o| { o.col(&first_name).is_equal_to("Wilma"); });
//!         });
//!         w.and(|a| { a.col(&last_name).is_equal_to_when_present(filter); });
//!     });
//!     s.order_by([id.asc()]);
//! })?
//! .render(RenderingStrategy::SpringNamedParameter)?;
//!
//! // select id, first_name from Person
//! //   where (first_name = :p1 or first_name = :p2) and last_name = :p3 order by id
//! ```
//!
//! ## Executing
//!
//! ```ignore
//! // Directly, rendered with `$n` placeholders:
//! let names = client.select_list(&model, |row| row.try_get_column::<String>("first_name")).await?;
//!
//! // Through the named-parameter template:
//! let template = NamedParameterTemplate::new(&client);
//! let deleted = template.delete_from(&person, |d| {
//!     d.where_(|w| { w.col(&id).is_equal_to(3); });
//! }).await?;
//!
//! // Through a mapper:
//! let rows = sqldsl::mapper::select_list(|p| executor.run(p), columns![id], &person, |_| {})?;
//! ```

pub mod case_expr;
pub mod client;
pub mod column;
pub mod config;
pub mod criteria;
pub mod delete;
pub mod error;
pub mod execute;
pub mod insert;
mod log;
pub mod mapper;
pub mod prelude;
pub mod render;
pub mod row;
pub mod select;
pub mod table;
pub mod template;
pub mod update;
pub mod value;

pub use client::GenericClient;
pub use column::{BasicColumn, WindowModel};
pub use config::StatementConfiguration;
pub use criteria::{CriteriaCollector, and_then};
pub use error::{DslError, DslResult};
pub use execute::{ClientExt, Renderable};
pub use log::DEFAULT_MAX_SQL_LENGTH;
pub use render::{
    BatchInsert, DeleteStatementProvider, InsertStatementProvider, ParameterMap,
    RenderingStrategy, SelectStatementProvider, StatementProvider, UpdateStatementProvider,
};
pub use row::{FromRow, RowExt};
pub use table::{SortSpec, SqlColumn, SqlTable};
pub use template::{KeyHolder, NamedParameterTemplate, TemplateConfig};
pub use value::{FromValue, JdbcType, SqlType, Value};

// Statement entry points. `select::count` and `select::count_distinct` stay in
// their module next to the `column::count` aggregate they wrap.
pub use delete::{delete_from, delete_from_as};
pub use insert::{insert, insert_batch, insert_into, insert_multiple, insert_select};
pub use select::{count_from, multi_select, select, select_distinct};
pub use update::{update, update_as};
