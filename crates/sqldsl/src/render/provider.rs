//! Rendered statements handed to execution adapters.

use crate::render::params::ParameterMap;
use crate::render::strategy::RenderingStrategy;
use serde::Serialize;

/// Common view over every rendered statement.
pub trait StatementProvider {
    /// The rendered SQL text.
    fn sql(&self) -> &str;

    /// Bind parameters in placeholder order.
    fn parameters(&self) -> &ParameterMap;

    /// Strategy the statement was rendered with.
    fn strategy(&self) -> RenderingStrategy;
}

macro_rules! statement_provider {
    ($(#[$meta:meta])* $name:ident, $field:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize)]
        pub struct $name {
            $field: String,
            parameters: ParameterMap,
            #[serde(skip)]
            strategy: RenderingStrategy,
        }

        impl $name {
            pub(crate) fn new(
                $field: String,
                parameters: ParameterMap,
                strategy: RenderingStrategy,
            ) -> Self {
                Self {
                    $field,
                    parameters,
                    strategy,
                }
            }

            pub fn $field(&self) -> &str {
                &self.$field
            }

            pub fn into_parts(self) -> (String, ParameterMap) {
                (self.$field, self.parameters)
            }
        }

        impl StatementProvider for $name {
            fn sql(&self) -> &str {
                &self.$field
            }

            fn parameters(&self) -> &ParameterMap {
                &self.parameters
            }

            fn strategy(&self) -> RenderingStrategy {
                self.strategy
            }
        }
    };
}

statement_provider!(
    /// A rendered select, count or multi-select statement.
    SelectStatementProvider,
    select_statement
);
statement_provider!(
    /// A rendered delete statement.
    DeleteStatementProvider,
    delete_statement
);
statement_provider!(
    /// A rendered update statement.
    UpdateStatementProvider,
    update_statement
);
statement_provider!(
    /// A rendered insert statement (general, record, multi-row or insert-select).
    InsertStatementProvider,
    insert_statement
);

/// A batch insert: one statement executed once per record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchInsert {
    insert_statement: String,
    records: Vec<ParameterMap>,
    #[serde(skip)]
    strategy: RenderingStrategy,
}

impl BatchInsert {
    pub(crate) fn new(
        insert_statement: String,
        records: Vec<ParameterMap>,
        strategy: RenderingStrategy,
    ) -> Self {
        Self {
            insert_statement,
            records,
            strategy,
        }
    }

    pub fn insert_statement(&self) -> &str {
        &self.insert_statement
    }

    /// One parameter map per record, all keyed identically.
    pub fn records(&self) -> &[ParameterMap] {
        &self.records
    }

    pub fn strategy(&self) -> RenderingStrategy {
        self.strategy
    }

    /// Split into one provider per record.
    pub fn statements(&self) -> Vec<InsertStatementProvider> {
        self.records
            .iter()
            .map(|params| {
                InsertStatementProvider::new(
                    self.insert_statement.clone(),
                    params.clone(),
                    self.strategy,
                )
            })
            .collect()
    }
}
