//! Placeholder formats for the supported execution frameworks.

use crate::value::JdbcType;
use std::fmt;

/// How bind parameters are written into rendered SQL.
///
/// | strategy               | key  | placeholder                            |
/// |------------------------|------|----------------------------------------|
/// | `MyBatis3`             | `p1` | `#{parameters.p1}` / `#{parameters.p1,jdbcType=INTEGER}` |
/// | `SpringNamedParameter` | `p1` | `:p1`                                  |
/// | `Postgres`             | `$1` | `$1`                                   |
/// | `RawJdbc`              | `1`  | `?`                                    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderingStrategy {
    MyBatis3,
    SpringNamedParameter,
    Postgres,
    RawJdbc,
}

impl RenderingStrategy {
    /// Parameter map key for the given 1-based sequence number.
    pub fn parameter_key(self, sequence: usize) -> String {
        match self {
            RenderingStrategy::MyBatis3 | RenderingStrategy::SpringNamedParameter => {
                format!("p{sequence}")
            }
            RenderingStrategy::Postgres => format!("${sequence}"),
            RenderingStrategy::RawJdbc => sequence.to_string(),
        }
    }

    /// Placeholder text for a parameter key.
    pub fn placeholder(self, key: &str, jdbc_type: Option<JdbcType>) -> String {
        match self {
            RenderingStrategy::MyBatis3 => match jdbc_type {
                Some(t) => format!("#{{parameters.{key},jdbcType={t}}}"),
                None => format!("#{{parameters.{key}}}"),
            },
            RenderingStrategy::SpringNamedParameter => format!(":{key}"),
            RenderingStrategy::Postgres => key.to_string(),
            RenderingStrategy::RawJdbc => "?".to_string(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RenderingStrategy::MyBatis3 => "mybatis3",
            RenderingStrategy::SpringNamedParameter => "spring_named_parameter",
            RenderingStrategy::Postgres => "postgres",
            RenderingStrategy::RawJdbc => "raw_jdbc",
        }
    }
}

impl fmt::Display for RenderingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
