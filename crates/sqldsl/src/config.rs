//! Per-statement rendering configuration.

use crate::render::join_fragments;

/// Options applied while rendering a single statement.
///
/// Configured through `configure_statement(|c| ...)` on any statement builder.
///
/// ```ignore
/// delete_from(&person, |d| {
///     d.configure_statement(|c| {
///         c.with_sql_before_statement("/* before statement */");
///     });
///     d.where_(|w| { w.col(&id).is_equal_to(2); });
/// })?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementConfiguration {
    non_rendering_where_clause_allowed: bool,
    before_statement: Option<String>,
    after_keyword: Option<String>,
    after_statement: Option<String>,
}

impl StatementConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a where clause whose criteria all drop out may render as no where clause.
    ///
    /// Defaults to `false`, in which case rendering fails with
    /// [`DslError::NonRenderingWhereClause`](crate::DslError::NonRenderingWhereClause).
    pub fn is_non_rendering_where_clause_allowed(&self) -> bool {
        self.non_rendering_where_clause_allowed
    }

    pub fn set_non_rendering_where_clause_allowed(&mut self, allowed: bool) -> &mut Self {
        self.non_rendering_where_clause_allowed = allowed;
        self
    }

    /// SQL emitted before the statement keyword.
    pub fn with_sql_before_statement(&mut self, sql: impl Into<String>) -> &mut Self {
        self.before_statement = Some(sql.into());
        self
    }

    /// SQL emitted right after the statement keyword (hints).
    pub fn with_sql_after_keyword(&mut self, sql: impl Into<String>) -> &mut Self {
        self.after_keyword = Some(sql.into());
        self
    }

    /// SQL emitted after the whole statement.
    pub fn with_sql_after_statement(&mut self, sql: impl Into<String>) -> &mut Self {
        self.after_statement = Some(sql.into());
        self
    }

    /// Render `keyword` followed by the after-keyword fragment, if any.
    pub(crate) fn keyword(&self, keyword: &str) -> String {
        join_fragments([keyword, self.after_keyword.as_deref().unwrap_or("")])
    }

    /// Wrap a rendered statement body with the before/after fragments.
    pub(crate) fn wrap(&self, body: String) -> String {
        if self.before_statement.is_none() && self.after_statement.is_none() {
            return body;
        }
        join_fragments([
            self.before_statement.as_deref().unwrap_or(""),
            body.as_str(),
            self.after_statement.as_deref().unwrap_or(""),
        ])
    }
}
