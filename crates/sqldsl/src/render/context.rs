use crate::render::params::ParameterMap;
use crate::render::strategy::RenderingStrategy;
use crate::table::ColumnRef;
use crate::value::{JdbcType, Value};
use std::collections::HashMap;

/// Table qualifiers visible in one query expression.
#[derive(Debug, Clone, Default)]
pub(crate) struct AliasScope {
    aliases: HashMap<String, String>,
    tables: Vec<String>,
    qualify_tables: bool,
}

impl AliasScope {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a table appearing in `from` or `join`.
    pub(crate) fn add_table(&mut self, table: &str, alias: Option<&str>) {
        self.tables.push(table.to_string());
        if let Some(alias) = alias {
            self.aliases.insert(table.to_string(), alias.to_string());
        }
    }

    /// Qualify unaliased tables with their own name (statements with joins).
    pub(crate) fn qualify_tables(mut self, yes: bool) -> Self {
        self.qualify_tables = yes;
        self
    }

    /// `None` when the table is not part of this scope; `Some(None)` when it is
    /// but renders unqualified.
    fn resolve(&self, table: &str) -> Option<Option<String>> {
        if let Some(alias) = self.aliases.get(table) {
            return Some(Some(alias.clone()));
        }
        if !self.tables.iter().any(|t| t == table) {
            return None;
        }
        Some(self.qualify_tables.then(|| table.to_string()))
    }
}

/// Mutable state threaded through one render pass.
///
/// The parameter sequence is shared by the statement and all of its
/// subqueries, so keys stay unique (`p1`, `p2`, ...) across nesting levels.
/// Alias scopes form a stack: a subquery sees its own tables first and falls
/// back to the enclosing query's tables. A table listed in the subquery
/// shadows the same table in an enclosing query.
#[derive(Debug)]
pub struct RenderingContext {
    strategy: RenderingStrategy,
    sequence: usize,
    parameters: ParameterMap,
    scopes: Vec<AliasScope>,
}

impl RenderingContext {
    pub fn new(strategy: RenderingStrategy) -> Self {
        Self {
            strategy,
            sequence: 1,
            parameters: ParameterMap::new(),
            scopes: Vec::new(),
        }
    }

    pub fn strategy(&self) -> RenderingStrategy {
        self.strategy
    }

    /// Register a bind value and return its placeholder.
    pub(crate) fn bind(&mut self, value: Value, jdbc_type: Option<JdbcType>) -> String {
        let key = self.strategy.parameter_key(self.sequence);
        self.sequence += 1;
        let placeholder = self.strategy.placeholder(&key, jdbc_type);
        self.parameters.insert(key, value);
        placeholder
    }

    /// Run `f` with `scope` pushed on the alias stack.
    pub(crate) fn with_scope<R>(
        &mut self,
        scope: AliasScope,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.scopes.push(scope);
        let out = f(self);
        self.scopes.pop();
        out
    }

    /// The innermost scope listing `table` decides its qualifier.
    pub(crate) fn qualifier_for(&self, table: &str) -> Option<String> {
        self.scopes.iter().rev().find_map(|s| s.resolve(table)).flatten()
    }

    /// Column name with its qualifier, if any applies.
    pub(crate) fn column_name(&self, col: &ColumnRef) -> String {
        let qualifier = col
            .qualifier
            .clone()
            .or_else(|| self.qualifier_for(&col.table));
        match qualifier {
            Some(q) => format!("{}.{}", q, col.name),
            None => col.name.clone(),
        }
    }

    pub fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    pub(crate) fn into_parameters(self) -> ParameterMap {
        self.parameters
    }
}
