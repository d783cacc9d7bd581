//! `case` expressions for select lists.
//!
//! Searched case:
//!
//! ```ignore
//! searched_case(|c| {
//!     c.when(|w| {
//!         w.col(&animal_name).is_equal_to("Artic fox");
//!         w.or(|o| { o.col(&animal_name).is_equal_to("Red fox"); });
//!         w.then("Fox");
//!     });
//!     c.else_("Not a Fox");
//! })?.as_("animal_type")
//! // case when animal_name = :p1 or animal_name = :p2 then 'Fox' else 'Not a Fox' end as animal_type
//! ```
//!
//! Simple case compares one column against lists of values:
//!
//! ```ignore
//! simple_case(&animal_name, |c| {
//!     c.when(["Artic fox", "Red fox"], "Fox");
//!     c.else_("Not a Fox");
//! })?
//! // case animal_name when :p1, :p2 then 'Fox' else 'Not a Fox' end
//! ```

use crate::column::{BasicColumn, constant, string_constant};
use crate::criteria::condition::value_of;
use crate::criteria::{CriteriaCollector, CriteriaGroup};
use crate::error::{DslError, DslResult};
use crate::render::RenderingContext;
use crate::table::SqlColumn;
use crate::value::Value;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

/// Values accepted by `then` and `else_`.
///
/// Strings render as quoted literals, numbers and booleans render verbatim,
/// and columns render as column references.
pub trait CaseValue {
    fn into_case_value(self) -> BasicColumn;
}

impl CaseValue for &str {
    fn into_case_value(self) -> BasicColumn {
        string_constant(self)
    }
}

impl CaseValue for String {
    fn into_case_value(self) -> BasicColumn {
        string_constant(self)
    }
}

macro_rules! impl_case_value_literal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CaseValue for $ty {
                fn into_case_value(self) -> BasicColumn {
                    constant(self.to_string())
                }
            }
        )*
    };
}

impl_case_value_literal!(bool, i16, i32, i64, f32, f64);

impl CaseValue for BasicColumn {
    fn into_case_value(self) -> BasicColumn {
        self
    }
}

impl<T> CaseValue for &SqlColumn<T> {
    fn into_case_value(self) -> BasicColumn {
        BasicColumn::from(self)
    }
}

#[derive(Debug, Clone)]
enum CaseBranch {
    Searched {
        condition: CriteriaGroup,
        then: BasicColumn,
    },
    Simple {
        values: Vec<Value>,
        then: BasicColumn,
    },
}

/// A rendered-on-demand `case ... end` expression.
#[derive(Debug, Clone)]
pub struct CaseModel {
    column: Option<BasicColumn>,
    branches: Vec<CaseBranch>,
    else_value: Option<BasicColumn>,
}

impl CaseModel {
    pub(crate) fn render(&self, ctx: &mut RenderingContext) -> DslResult<String> {
        let mut sql = String::from("case");
        let jdbc = self.column.as_ref().and_then(BasicColumn::jdbc_type);
        if let Some(column) = &self.column {
            sql.push(' ');
            sql.push_str(&column.render(ctx)?);
        }

        for branch in &self.branches {
            let (when, then) = match branch {
                CaseBranch::Searched { condition, then } => {
                    let when = condition.render_clause(ctx)?.ok_or_else(|| {
                        DslError::invalid("a case when condition rendered nothing")
                    })?;
                    (when, then)
                }
                CaseBranch::Simple { values, then } => {
                    let placeholders: Vec<String> = values
                        .iter()
                        .map(|v| ctx.bind(v.clone(), jdbc))
                        .collect();
                    (placeholders.join(", "), then)
                }
            };
            sql.push_str(" when ");
            sql.push_str(&when);
            sql.push_str(" then ");
            sql.push_str(&then.render(ctx)?);
        }

        if let Some(else_value) = &self.else_value {
            sql.push_str(" else ");
            sql.push_str(&else_value.render(ctx)?);
        }
        sql.push_str(" end");
        Ok(sql)
    }
}

#[derive(Debug, Default)]
struct CaseState {
    branches: Vec<CaseBranch>,
    else_value: Option<BasicColumn>,
    build_error: Option<String>,
}

impl CaseState {
    fn fail(&mut self, message: impl Into<String>) {
        if self.build_error.is_none() {
            self.build_error = Some(message.into());
        }
    }

    fn set_else(&mut self, value: BasicColumn) {
        if self.else_value.is_some() {
            self.fail("else is already set for this case expression");
        } else {
            self.else_value = Some(value);
        }
    }

    fn build(self, column: Option<BasicColumn>) -> DslResult<BasicColumn> {
        if let Some(err) = self.build_error {
            return Err(DslError::InvalidSql(err));
        }
        if self.branches.is_empty() {
            return Err(DslError::invalid("a case expression requires at least one when"));
        }
        Ok(BasicColumn::Case(Box::new(CaseModel {
            column,
            branches: self.branches,
            else_value: self.else_value,
        })))
    }
}

// ==================== Searched case ====================

/// Criteria for one `when` of a searched case, plus its `then` value.
///
/// Dereferences to [`CriteriaCollector`], so all criteria methods are available.
#[derive(Debug, Default)]
pub struct CaseWhenCollector {
    criteria: CriteriaCollector,
    then: Option<BasicColumn>,
}

impl CaseWhenCollector {
    pub fn then(&mut self, value: impl CaseValue) {
        if self.then.is_some() {
            self.criteria
                .fail("then is already set for this case when branch");
        } else {
            self.then = Some(value.into_case_value());
        }
    }
}

impl Deref for CaseWhenCollector {
    type Target = CriteriaCollector;

    fn deref(&self) -> &Self::Target {
        &self.criteria
    }
}

impl DerefMut for CaseWhenCollector {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.criteria
    }
}

#[derive(Debug, Default)]
pub struct SearchedCaseBuilder {
    state: CaseState,
}

impl SearchedCaseBuilder {
    pub fn when(&mut self, completer: impl FnOnce(&mut CaseWhenCollector)) {
        let mut collector = CaseWhenCollector::default();
        completer(&mut collector);
        let then = collector.then;
        match collector.criteria.into_group() {
            Err(err) => self.state.fail(err.into_message()),
            Ok(condition) if condition.is_empty() => {
                self.state.fail("a case when branch requires a condition");
            }
            Ok(condition) => match then {
                Some(then) => self.state.branches.push(CaseBranch::Searched { condition, then }),
                None => self.state.fail("a case when branch requires a then value"),
            },
        }
    }

    pub fn else_(&mut self, value: impl CaseValue) {
        self.state.set_else(value.into_case_value());
    }
}

/// `case when ... then ... [else ...] end`
pub fn searched_case(completer: impl FnOnce(&mut SearchedCaseBuilder)) -> DslResult<BasicColumn> {
    let mut builder = SearchedCaseBuilder::default();
    completer(&mut builder);
    builder.state.build(None)
}

// ==================== Simple case ====================

pub struct SimpleCaseBuilder<T> {
    state: CaseState,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Into<Value>> SimpleCaseBuilder<T> {
    /// `when v1, v2 then value`
    pub fn when<I>(&mut self, values: I, then: impl CaseValue)
    where
        I: IntoIterator,
        I::Item: Into<T>,
    {
        let values: Vec<Value> = values.into_iter().map(value_of::<T, I::Item>).collect();
        if values.is_empty() {
            self.state.fail("a case when branch requires at least one value");
            return;
        }
        self.state.branches.push(CaseBranch::Simple {
            values,
            then: then.into_case_value(),
        });
    }

    pub fn else_(&mut self, value: impl CaseValue) {
        self.state.set_else(value.into_case_value());
    }
}

/// `case column when ... then ... [else ...] end`
pub fn simple_case<T: Into<Value>>(
    column: &SqlColumn<T>,
    completer: impl FnOnce(&mut SimpleCaseBuilder<T>),
) -> DslResult<BasicColumn> {
    let mut builder = SimpleCaseBuilder {
        state: CaseState::default(),
        _marker: PhantomData,
    };
    completer(&mut builder);
    builder.state.build(Some(BasicColumn::from(column)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderingStrategy;
    use crate::table::SqlTable;

    fn render(col: &BasicColumn) -> (String, usize) {
        let mut ctx = RenderingContext::new(RenderingStrategy::SpringNamedParameter);
        let sql = col.render_selected(&mut ctx).unwrap();
        (sql, ctx.parameters().len())
    }

    #[test]
    fn searched_case_renders_criteria_without_outer_parentheses() {
        let animal = SqlTable::new("AnimalData");
        let name = animal.column::<String>("animal_name");
        let case = searched_case(|c| {
            c.when(|w| {
                w.col(&name).is_equal_to("Artic fox");
                w.or(|o| {
                    o.col(&name).is_equal_to("Red fox");
                });
                w.then("Fox");
            });
            c.else_("Not a Fox");
        })
        .unwrap()
        .as_("animal_type");

        let (sql, params) = render(&case);
        assert_eq!(
            sql,
            "case when animal_name = :p1 or animal_name = :p2 then 'Fox' else 'Not a Fox' end as animal_type"
        );
        assert_eq!(params, 2);
    }

    #[test]
    fn simple_case_binds_values() {
        let animal = SqlTable::new("AnimalData");
        let name = animal.column::<String>("animal_name");
        let weight = animal.column::<f64>("body_weight");
        let case = simple_case(&name, |c| {
            c.when(["Artic fox", "Red fox"], "Fox");
            c.when(["Big brown bat"], 1);
            c.else_(&weight);
        })
        .unwrap();

        let (sql, params) = render(&case);
        assert_eq!(
            sql,
            "case animal_name when :p1, :p2 then 'Fox' when :p3 then 1 else body_weight end"
        );
        assert_eq!(params, 3);
    }

    #[test]
    fn then_twice_is_an_error() {
        let animal = SqlTable::new("AnimalData");
        let id = animal.column::<i32>("id");
        let err = searched_case(|c| {
            c.when(|w| {
                w.col(&id).is_equal_to(1);
                w.then("a");
                w.then("b");
            });
        })
        .unwrap_err();
        assert!(err.to_string().contains("then is already set"));
    }

    #[test]
    fn else_twice_is_an_error() {
        let animal = SqlTable::new("AnimalData");
        let id = animal.column::<i32>("id");
        let err = simple_case(&id, |c| {
            c.when([1], "one");
            c.else_("x");
            c.else_("y");
        })
        .unwrap_err();
        assert!(err.to_string().contains("else is already set"));
    }

    #[test]
    fn missing_then_is_an_error() {
        let animal = SqlTable::new("AnimalData");
        let id = animal.column::<i32>("id");
        let err = searched_case(|c| {
            c.when(|w| {
                w.col(&id).is_equal_to(1);
            });
        })
        .unwrap_err();
        assert!(err.is_invalid_sql());
    }
}
