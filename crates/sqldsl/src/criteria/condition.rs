//! Typed conditions applied to a column.

use crate::column::BasicColumn;
use crate::error::{DslError, DslResult};
use crate::render::RenderingContext;
use crate::select::SelectModel;
use crate::value::{FromValue, JdbcType, Value};
use std::marker::PhantomData;

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
    NotLike,
}

impl CompareOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Like => "like",
            CompareOp::NotLike => "not like",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum ConditionKind {
    /// `col op ph`; `None` means the value was absent and the condition drops out.
    Compare { op: CompareOp, value: Option<Value> },
    /// `col op other`
    CompareColumn { op: CompareOp, column: BasicColumn },
    /// `col op (select ...)`
    CompareSubQuery { op: CompareOp, query: Box<SelectModel> },
    /// `col [not] in (select ...)`
    InSubQuery { query: Box<SelectModel>, negated: bool },
    /// `col is [not] null`
    Null { negated: bool },
    /// `col [not] between ph and ph`
    Between {
        from: Option<Value>,
        to: Option<Value>,
        negated: bool,
    },
    /// `col [not] in (ph,ph)`
    In {
        values: Vec<Value>,
        negated: bool,
        when_present: bool,
    },
}

/// A condition on a column of type `T`.
///
/// Built with the free functions in this module and applied with
/// [`CriteriaCollector::condition`](crate::CriteriaCollector::condition):
///
/// ```ignore
/// w.condition(&id, is_in([1, 2, 3]));
/// ```
#[derive(Debug, Clone)]
pub struct Condition<T> {
    pub(crate) kind: ConditionKind,
    pub(crate) case_insensitive: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Condition<T> {
    pub(crate) fn new(kind: ConditionKind) -> Self {
        Self {
            kind,
            case_insensitive: false,
            _marker: PhantomData,
        }
    }

    fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// Returns `true` when this condition will render nothing.
    pub fn is_empty(&self) -> bool {
        self.kind.drops_out()
    }
}

impl<T: FromValue> Condition<T> {
    /// Keep only the values `predicate` accepts.
    ///
    /// A single value condition whose value is rejected drops out, as does a
    /// between condition unless both bounds pass. An in list keeps the
    /// accepted values; if none remain, `is_in` fails to render while the
    /// `_when_present` forms drop out. Other conditions are returned unchanged.
    pub fn filter(self, predicate: impl Fn(&T) -> bool) -> Self {
        let accept = |v: &Value| T::from_value(v.clone()).is_some_and(|t| predicate(&t));
        let kind = match self.kind {
            ConditionKind::Compare { op, value } => ConditionKind::Compare {
                op,
                value: value.filter(|v| accept(v)),
            },
            ConditionKind::Between { from, to, negated } => {
                let keep = matches!((&from, &to), (Some(f), Some(t)) if accept(f) && accept(t));
                if keep {
                    ConditionKind::Between { from, to, negated }
                } else {
                    ConditionKind::Between {
                        from: None,
                        to: None,
                        negated,
                    }
                }
            }
            ConditionKind::In {
                values,
                negated,
                when_present,
            } => ConditionKind::In {
                values: values.into_iter().filter(|v| accept(v)).collect(),
                negated,
                when_present,
            },
            other => other,
        };
        Self {
            kind,
            case_insensitive: self.case_insensitive,
            _marker: PhantomData,
        }
    }

    /// Convert every value with `mapper`. A condition that already dropped out
    /// stays empty.
    pub fn map<R: Into<Value>>(self, mapper: impl Fn(T) -> R) -> Condition<R> {
        let apply = |v: Value| -> Option<Value> { T::from_value(v).map(|t| mapper(t).into()) };
        let kind = match self.kind {
            ConditionKind::Compare { op, value } => ConditionKind::Compare {
                op,
                value: value.and_then(apply),
            },
            ConditionKind::Between { from, to, negated } => match (from, to) {
                (Some(from), Some(to)) => match (apply(from), apply(to)) {
                    (Some(from), Some(to)) => ConditionKind::Between {
                        from: Some(from),
                        to: Some(to),
                        negated,
                    },
                    _ => ConditionKind::Between {
                        from: None,
                        to: None,
                        negated,
                    },
                },
                _ => ConditionKind::Between {
                    from: None,
                    to: None,
                    negated,
                },
            },
            ConditionKind::In {
                values,
                negated,
                when_present,
            } => ConditionKind::In {
                values: values.into_iter().filter_map(apply).collect(),
                negated,
                when_present,
            },
            other => other,
        };
        Condition {
            kind,
            case_insensitive: self.case_insensitive,
            _marker: PhantomData,
        }
    }
}

impl ConditionKind {
    /// Absent values make the whole criterion disappear, left operand included.
    pub(crate) fn drops_out(&self) -> bool {
        match self {
            ConditionKind::Compare { value, .. } => value.is_none(),
            ConditionKind::Between { from, to, .. } => from.is_none() || to.is_none(),
            ConditionKind::In {
                values,
                when_present,
                ..
            } => *when_present && values.is_empty(),
            _ => false,
        }
    }
}

pub(crate) fn value_of<T: Into<Value>, V: Into<T>>(v: V) -> Value {
    let t: T = v.into();
    t.into()
}

fn compare<T: Into<Value>, V: Into<T>>(op: CompareOp, v: V) -> Condition<T> {
    Condition::new(ConditionKind::Compare {
        op,
        value: Some(value_of::<T, V>(v)),
    })
}

fn compare_when_present<T: Into<Value>, V: Into<T>>(op: CompareOp, v: Option<V>) -> Condition<T> {
    Condition::new(ConditionKind::Compare {
        op,
        value: v.map(value_of::<T, V>),
    })
}

pub fn is_equal_to<T: Into<Value>, V: Into<T>>(value: V) -> Condition<T> {
    compare(CompareOp::Eq, value)
}

pub fn is_equal_to_when_present<T: Into<Value>, V: Into<T>>(value: Option<V>) -> Condition<T> {
    compare_when_present(CompareOp::Eq, value)
}

pub fn is_not_equal_to<T: Into<Value>, V: Into<T>>(value: V) -> Condition<T> {
    compare(CompareOp::Ne, value)
}

pub fn is_not_equal_to_when_present<T: Into<Value>, V: Into<T>>(
    value: Option<V>,
) -> Condition<T> {
    compare_when_present(CompareOp::Ne, value)
}

pub fn is_greater_than<T: Into<Value>, V: Into<T>>(value: V) -> Condition<T> {
    compare(CompareOp::Gt, value)
}

pub fn is_greater_than_when_present<T: Into<Value>, V: Into<T>>(
    value: Option<V>,
) -> Condition<T> {
    compare_when_present(CompareOp::Gt, value)
}

pub fn is_greater_than_or_equal_to<T: Into<Value>, V: Into<T>>(value: V) -> Condition<T> {
    compare(CompareOp::Ge, value)
}

pub fn is_greater_than_or_equal_to_when_present<T: Into<Value>, V: Into<T>>(
    value: Option<V>,
) -> Condition<T> {
    compare_when_present(CompareOp::Ge, value)
}

pub fn is_less_than<T: Into<Value>, V: Into<T>>(value: V) -> Condition<T> {
    compare(CompareOp::Lt, value)
}

pub fn is_less_than_when_present<T: Into<Value>, V: Into<T>>(value: Option<V>) -> Condition<T> {
    compare_when_present(CompareOp::Lt, value)
}

pub fn is_less_than_or_equal_to<T: Into<Value>, V: Into<T>>(value: V) -> Condition<T> {
    compare(CompareOp::Le, value)
}

pub fn is_less_than_or_equal_to_when_present<T: Into<Value>, V: Into<T>>(
    value: Option<V>,
) -> Condition<T> {
    compare_when_present(CompareOp::Le, value)
}

pub fn is_like<T: Into<Value>, V: Into<T>>(value: V) -> Condition<T> {
    compare(CompareOp::Like, value)
}

pub fn is_like_when_present<T: Into<Value>, V: Into<T>>(value: Option<V>) -> Condition<T> {
    compare_when_present(CompareOp::Like, value)
}

pub fn is_not_like<T: Into<Value>, V: Into<T>>(value: V) -> Condition<T> {
    compare(CompareOp::NotLike, value)
}

pub fn is_not_like_when_present<T: Into<Value>, V: Into<T>>(value: Option<V>) -> Condition<T> {
    compare_when_present(CompareOp::NotLike, value)
}

pub fn is_null<T>() -> Condition<T> {
    Condition::new(ConditionKind::Null { negated: false })
}

pub fn is_not_null<T>() -> Condition<T> {
    Condition::new(ConditionKind::Null { negated: true })
}

pub fn is_between<T: Into<Value>, V: Into<T>>(from: V, to: V) -> Condition<T> {
    Condition::new(ConditionKind::Between {
        from: Some(value_of::<T, V>(from)),
        to: Some(value_of::<T, V>(to)),
        negated: false,
    })
}

/// Drops out unless both bounds are present.
pub fn is_between_when_present<T: Into<Value>, V: Into<T>>(
    from: Option<V>,
    to: Option<V>,
) -> Condition<T> {
    Condition::new(ConditionKind::Between {
        from: from.map(value_of::<T, V>),
        to: to.map(value_of::<T, V>),
        negated: false,
    })
}

pub fn is_not_between<T: Into<Value>, V: Into<T>>(from: V, to: V) -> Condition<T> {
    Condition::new(ConditionKind::Between {
        from: Some(value_of::<T, V>(from)),
        to: Some(value_of::<T, V>(to)),
        negated: true,
    })
}

pub fn is_not_between_when_present<T: Into<Value>, V: Into<T>>(
    from: Option<V>,
    to: Option<V>,
) -> Condition<T> {
    Condition::new(ConditionKind::Between {
        from: from.map(value_of::<T, V>),
        to: to.map(value_of::<T, V>),
        negated: true,
    })
}

fn in_list<T, I>(values: I, negated: bool) -> Condition<T>
where
    T: Into<Value>,
    I: IntoIterator,
    I::Item: Into<T>,
{
    Condition::new(ConditionKind::In {
        values: values.into_iter().map(value_of::<T, I::Item>).collect(),
        negated,
        when_present: false,
    })
}

fn in_list_when_present<T, V, I>(values: I, negated: bool) -> Condition<T>
where
    T: Into<Value>,
    V: Into<T>,
    I: IntoIterator<Item = Option<V>>,
{
    Condition::new(ConditionKind::In {
        values: values
            .into_iter()
            .flatten()
            .map(value_of::<T, V>)
            .collect(),
        negated,
        when_present: true,
    })
}

/// `col in (...)`. Rendering fails if `values` is empty.
pub fn is_in<T, I>(values: I) -> Condition<T>
where
    T: Into<Value>,
    I: IntoIterator,
    I::Item: Into<T>,
{
    in_list(values, false)
}

/// `col in (...)` over the present values; drops out when none are present.
pub fn is_in_when_present<T, V, I>(values: I) -> Condition<T>
where
    T: Into<Value>,
    V: Into<T>,
    I: IntoIterator<Item = Option<V>>,
{
    in_list_when_present(values, false)
}

pub fn is_not_in<T, I>(values: I) -> Condition<T>
where
    T: Into<Value>,
    I: IntoIterator,
    I::Item: Into<T>,
{
    in_list(values, true)
}

pub fn is_not_in_when_present<T, V, I>(values: I) -> Condition<T>
where
    T: Into<Value>,
    V: Into<T>,
    I: IntoIterator<Item = Option<V>>,
{
    in_list_when_present(values, true)
}

pub fn is_like_case_insensitive(value: impl Into<String>) -> Condition<String> {
    is_like::<String, String>(value.into()).case_insensitive()
}

pub fn is_like_case_insensitive_when_present<V: Into<String>>(
    value: Option<V>,
) -> Condition<String> {
    is_like_when_present::<String, String>(value.map(Into::into)).case_insensitive()
}

pub fn is_not_like_case_insensitive(value: impl Into<String>) -> Condition<String> {
    is_not_like::<String, String>(value.into()).case_insensitive()
}

pub fn is_not_like_case_insensitive_when_present<V: Into<String>>(
    value: Option<V>,
) -> Condition<String> {
    is_not_like_when_present::<String, String>(value.map(Into::into)).case_insensitive()
}

pub fn is_in_case_insensitive<I>(values: I) -> Condition<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    in_list::<String, I>(values, false).case_insensitive()
}

pub fn is_in_case_insensitive_when_present<V, I>(values: I) -> Condition<String>
where
    V: Into<String>,
    I: IntoIterator<Item = Option<V>>,
{
    in_list_when_present::<String, V, I>(values, false).case_insensitive()
}

pub fn is_not_in_case_insensitive<I>(values: I) -> Condition<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    in_list::<String, I>(values, true).case_insensitive()
}

pub fn is_not_in_case_insensitive_when_present<V, I>(values: I) -> Condition<String>
where
    V: Into<String>,
    I: IntoIterator<Item = Option<V>>,
{
    in_list_when_present::<String, V, I>(values, true).case_insensitive()
}

fn bind(ctx: &mut RenderingContext, value: &Value, upper: bool, jdbc: Option<JdbcType>) -> String {
    let value = if upper {
        value.to_uppercase()
    } else {
        value.clone()
    };
    ctx.bind(value, jdbc)
}

/// Render `column <condition>`, or `None` when the condition drops out.
pub(crate) fn render_condition(
    column: &BasicColumn,
    kind: &ConditionKind,
    case_insensitive: bool,
    ctx: &mut RenderingContext,
) -> DslResult<Option<String>> {
    if kind.drops_out() {
        return Ok(None);
    }
    let jdbc = column.jdbc_type();
    let mut left = column.render(ctx)?;
    if case_insensitive {
        left = format!("upper({left})");
    }

    let sql = match kind {
        ConditionKind::Compare { op, value } => match value {
            Some(value) => {
                let ph = bind(ctx, value, case_insensitive, jdbc);
                format!("{} {} {}", left, op.as_sql(), ph)
            }
            None => return Ok(None),
        },
        ConditionKind::CompareColumn { op, column } => {
            format!("{} {} {}", left, op.as_sql(), column.render(ctx)?)
        }
        ConditionKind::CompareSubQuery { op, query } => {
            format!("{} {} ({})", left, op.as_sql(), query.render_nested(ctx)?)
        }
        ConditionKind::InSubQuery { query, negated } => {
            let op = if *negated { "not in" } else { "in" };
            format!("{} {} ({})", left, op, query.render_nested(ctx)?)
        }
        ConditionKind::Null { negated } => {
            if *negated {
                format!("{left} is not null")
            } else {
                format!("{left} is null")
            }
        }
        ConditionKind::Between { from, to, negated } => match (from, to) {
            (Some(from), Some(to)) => {
                let op = if *negated { "not between" } else { "between" };
                let p1 = bind(ctx, from, false, jdbc);
                let p2 = bind(ctx, to, false, jdbc);
                format!("{left} {op} {p1} and {p2}")
            }
            _ => return Ok(None),
        },
        ConditionKind::In {
            values,
            negated,
            when_present,
        } => {
            if values.is_empty() {
                if *when_present {
                    return Ok(None);
                }
                return Err(DslError::invalid(
                    "an in condition requires at least one value",
                ));
            }
            let placeholders: Vec<String> = values
                .iter()
                .map(|v| bind(ctx, v, case_insensitive, jdbc))
                .collect();
            let op = if *negated { "not in" } else { "in" };
            format!("{} {} ({})", left, op, placeholders.join(","))
        }
    };
    Ok(Some(sql))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderingStrategy;
    use crate::table::SqlTable;

    fn render<T>(column: &BasicColumn, cond: Condition<T>) -> (Option<String>, usize) {
        let mut ctx = RenderingContext::new(RenderingStrategy::SpringNamedParameter);
        let sql = render_condition(column, &cond.kind, cond.case_insensitive, &mut ctx).unwrap();
        (sql, ctx.parameters().len())
    }

    #[test]
    fn comparisons() {
        let t = SqlTable::new("Person");
        let id = BasicColumn::from(&t.column::<i32>("id"));
        assert_eq!(render(&id, is_equal_to::<i32, _>(3)).0.unwrap(), "id = :p1");
        assert_eq!(render(&id, is_not_equal_to::<i32, _>(3)).0.unwrap(), "id <> :p1");
        assert_eq!(render(&id, is_greater_than_or_equal_to::<i32, _>(3)).0.unwrap(), "id >= :p1");
        assert_eq!(render(&id, is_null::<i32>()).0.unwrap(), "id is null");
        assert_eq!(render(&id, is_not_null::<i32>()).0.unwrap(), "id is not null");
    }

    #[test]
    fn when_present_drops_absent_values() {
        let t = SqlTable::new("Person");
        let id = BasicColumn::from(&t.column::<i32>("id"));
        let (sql, params) = render(&id, is_equal_to_when_present::<i32, i32>(None));
        assert!(sql.is_none());
        assert_eq!(params, 0);
        assert!(is_between_when_present::<i32, i32>(Some(1), None).is_empty());
    }

    #[test]
    fn in_lists() {
        let t = SqlTable::new("Person");
        let id = BasicColumn::from(&t.column::<i32>("id"));
        assert_eq!(render(&id, is_in::<i32, _>([1, 2])).0.unwrap(), "id in (:p1,:p2)");
        assert_eq!(render(&id, is_not_in::<i32, _>([1])).0.unwrap(), "id not in (:p1)");

        let (sql, params) = render(&id, is_in_when_present::<i32, i32, _>([Some(1), None, Some(3)]));
        assert_eq!(sql.unwrap(), "id in (:p1,:p2)");
        assert_eq!(params, 2);

        let (sql, _) = render(&id, is_in_when_present::<i32, i32, _>([None]));
        assert!(sql.is_none());
    }

    #[test]
    fn empty_in_list_is_an_error() {
        let t = SqlTable::new("Person");
        let id = BasicColumn::from(&t.column::<i32>("id"));
        let cond = is_in::<i32, Vec<i32>>(Vec::new());
        let mut ctx = RenderingContext::new(RenderingStrategy::MyBatis3);
        let err = render_condition(&id, &cond.kind, false, &mut ctx).unwrap_err();
        assert!(err.is_invalid_sql());
    }

    #[test]
    fn case_insensitive_uppercases_values() {
        let t = SqlTable::new("Person");
        let name = BasicColumn::from(&t.column::<String>("first_name"));
        let mut ctx = RenderingContext::new(RenderingStrategy::SpringNamedParameter);
        let cond = is_in_case_insensitive(["fred", "Wilma"]);
        let sql = render_condition(&name, &cond.kind, cond.case_insensitive, &mut ctx)
            .unwrap()
            .unwrap();
        assert_eq!(sql, "upper(first_name) in (:p1,:p2)");
        assert_eq!(ctx.parameters().get("p1"), Some(&Value::from("FRED")));
        assert_eq!(ctx.parameters().get("p2"), Some(&Value::from("WILMA")));
    }

    #[test]
    fn filter_drops_rejected_values() {
        let t = SqlTable::new("Person");
        let id = BasicColumn::from(&t.column::<i32>("id"));
        let even = |v: &i32| v % 2 == 0;

        assert_eq!(render(&id, is_equal_to::<i32, _>(4).filter(even)).0.unwrap(), "id = :p1");
        let (sql, params) = render(&id, is_equal_to::<i32, _>(3).filter(even));
        assert!(sql.is_none());
        assert_eq!(params, 0);

        assert!(is_between::<i32, _>(2, 5).filter(even).is_empty());
        assert_eq!(
            render(&id, is_between::<i32, _>(2, 6).filter(even)).0.unwrap(),
            "id between :p1 and :p2"
        );

        let mut ctx = RenderingContext::new(RenderingStrategy::SpringNamedParameter);
        let cond = is_in::<i32, _>([1, 2, 3, 4]).filter(even);
        let sql = render_condition(&id, &cond.kind, false, &mut ctx).unwrap().unwrap();
        assert_eq!(sql, "id in (:p1,:p2)");
        assert_eq!(ctx.parameters().get("p1"), Some(&Value::Int(2)));
        assert_eq!(ctx.parameters().get("p2"), Some(&Value::Int(4)));
    }

    #[test]
    fn filtered_out_in_list_keeps_its_empty_list_semantics() {
        let t = SqlTable::new("Person");
        let id = BasicColumn::from(&t.column::<i32>("id"));
        let even = |v: &i32| v % 2 == 0;

        let cond = is_in::<i32, _>([1, 3]).filter(even);
        let mut ctx = RenderingContext::new(RenderingStrategy::SpringNamedParameter);
        let err = render_condition(&id, &cond.kind, false, &mut ctx).unwrap_err();
        assert!(err.is_invalid_sql());

        let cond = is_in_when_present::<i32, i32, _>([Some(1), Some(3)]).filter(even);
        assert!(cond.is_empty());
        assert!(render(&id, cond).0.is_none());

        let empty = is_equal_to_when_present::<i32, i32>(None).filter(|_| true);
        assert!(empty.is_empty());
    }

    #[test]
    fn map_converts_every_value() {
        let t = SqlTable::new("Person");
        let id = BasicColumn::from(&t.column::<i64>("id"));

        let mut ctx = RenderingContext::new(RenderingStrategy::SpringNamedParameter);
        let cond = is_in::<i32, _>([1, 2]).map(|v| i64::from(v) * 10);
        let sql = render_condition(&id, &cond.kind, false, &mut ctx).unwrap().unwrap();
        assert_eq!(sql, "id in (:p1,:p2)");
        assert_eq!(ctx.parameters().get("p1"), Some(&Value::BigInt(10)));
        assert_eq!(ctx.parameters().get("p2"), Some(&Value::BigInt(20)));

        let name = BasicColumn::from(&t.column::<String>("last_name"));
        let mut ctx = RenderingContext::new(RenderingStrategy::SpringNamedParameter);
        let cond = is_like::<String, _>("flint").map(|v| format!("%{v}%"));
        render_condition(&name, &cond.kind, false, &mut ctx).unwrap();
        assert_eq!(ctx.parameters().get("p1"), Some(&Value::from("%flint%")));

        let between = is_between::<i32, _>(1, 2).map(|v| v + 1);
        assert_eq!(render(&id, between).0.unwrap(), "id between :p1 and :p2");

        let absent = is_like_when_present::<String, String>(None).map(|v| format!("%{v}%"));
        assert!(absent.is_empty());
    }

    #[test]
    fn between_binds_two_values() {
        let t = SqlTable::new("Person");
        let id = BasicColumn::from(&t.column::<i32>("id"));
        assert_eq!(
            render(&id, is_not_between::<i32, _>(1, 4)).0.unwrap(),
            "id not between :p1 and :p2"
        );
    }
}
