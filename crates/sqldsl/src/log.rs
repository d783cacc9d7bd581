//! Debug events for rendering and execution.
//!
//! Render events go to target `sqldsl.render`, executed SQL to `sqldsl.sql`.
//! Without the `tracing` feature both helpers compile to nothing.

use crate::render::RenderingStrategy;

/// Default SQL truncation length (in bytes) for execution events.
pub const DEFAULT_MAX_SQL_LENGTH: usize = 200;

#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
pub(crate) fn truncate_sql(sql: &str, max_sql_length: Option<usize>) -> String {
    match max_sql_length {
        Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
        _ => sql.to_string(),
    }
}

/// A statement model was rendered.
pub(crate) fn rendered(kind: &str, strategy: RenderingStrategy, sql: &str, param_count: usize) {
    #[cfg(feature = "tracing")]
    tracing::debug!(
        target: "sqldsl.render",
        kind,
        strategy = %strategy,
        param_count,
        sql_len = sql.len(),
    );
    #[cfg(not(feature = "tracing"))]
    let _ = (kind, strategy, sql, param_count);
}

/// A statement is about to be executed by one of the adapters.
pub(crate) fn executing(adapter: &str, sql: &str, param_count: usize, max_sql_length: Option<usize>) {
    #[cfg(feature = "tracing")]
    {
        let sql = truncate_sql(sql, max_sql_length);
        tracing::debug!(target: "sqldsl.sql", adapter, param_count, sql = %sql);
    }
    #[cfg(not(feature = "tracing"))]
    let _ = (adapter, sql, param_count, max_sql_length);
}
