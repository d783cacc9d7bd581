use super::condition::{self, CompareOp, Condition, ConditionKind, value_of};
use super::{AndOrCriteriaGroup, ColumnCondition, Connector, CriteriaGroup, SqlCriterion};
use crate::column::BasicColumn;
use crate::error::{DslError, DslResult};
use crate::select::{SelectModel, SubQueryBuilder};
use crate::table::SqlColumn;
use crate::value::Value;
use std::marker::PhantomData;

/// Collects the criteria of one scope (a where/having/on clause, or a nested group).
///
/// Only one initial criterion may be set per scope: a column condition,
/// `exists`, `group` or `not`. Further criteria go through `and`/`or`.
/// Misuse is recorded and reported when the enclosing statement is built.
#[derive(Debug, Default)]
pub struct CriteriaCollector {
    initial: Option<SqlCriterion>,
    sub_criteria: Vec<AndOrCriteriaGroup>,
    error: Option<String>,
}

impl CriteriaCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a completer against a fresh collector and build its group.
    pub(crate) fn collect(completer: impl FnOnce(&mut CriteriaCollector)) -> DslResult<CriteriaGroup> {
        let mut collector = CriteriaCollector::new();
        completer(&mut collector);
        collector.into_group()
    }

    pub(crate) fn into_group(self) -> DslResult<CriteriaGroup> {
        if let Some(message) = self.error {
            return Err(DslError::InvalidSql(message));
        }
        Ok(CriteriaGroup {
            initial: self.initial.map(Box::new),
            sub_criteria: self.sub_criteria,
        })
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(message.into());
        }
    }

    fn set_initial(&mut self, criterion: SqlCriterion) {
        if self.initial.is_some() {
            self.fail("an initial criterion is already set in this scope; use and/or to add more criteria");
            return;
        }
        self.initial = Some(criterion);
    }

    fn nested(&mut self, completer: impl FnOnce(&mut CriteriaCollector)) -> CriteriaGroup {
        let mut collector = CriteriaCollector::new();
        completer(&mut collector);
        if let Some(message) = collector.error.take() {
            self.fail(message);
        }
        CriteriaGroup {
            initial: collector.initial.map(Box::new),
            sub_criteria: collector.sub_criteria,
        }
    }

    pub(crate) fn subquery(&mut self, completer: impl FnOnce(&mut SubQueryBuilder)) -> Option<SelectModel> {
        match SubQueryBuilder::collect(completer) {
            Ok(query) => Some(query),
            Err(err) => {
                self.fail(err.into_message());
                None
            }
        }
    }

    /// Add criteria joined with `and`. Parenthesized if more than one of them renders.
    pub fn and(&mut self, completer: impl FnOnce(&mut CriteriaCollector)) {
        let group = self.nested(completer);
        self.sub_criteria.push(AndOrCriteriaGroup {
            connector: Connector::And,
            group,
        });
    }

    /// Add criteria joined with `or`. Parenthesized if more than one of them renders.
    pub fn or(&mut self, completer: impl FnOnce(&mut CriteriaCollector)) {
        let group = self.nested(completer);
        self.sub_criteria.push(AndOrCriteriaGroup {
            connector: Connector::Or,
            group,
        });
    }

    /// Add pre-built groups joined with `and`; the first one that renders drops its connector.
    pub fn and_all(&mut self, criteria: impl IntoIterator<Item = AndOrCriteriaGroup>) {
        self.sub_criteria.push(AndOrCriteriaGroup {
            connector: Connector::And,
            group: CriteriaGroup {
                initial: None,
                sub_criteria: criteria.into_iter().collect(),
            },
        });
    }

    /// Add pre-built groups joined with `or`.
    pub fn or_all(&mut self, criteria: impl IntoIterator<Item = AndOrCriteriaGroup>) {
        self.sub_criteria.push(AndOrCriteriaGroup {
            connector: Connector::Or,
            group: CriteriaGroup {
                initial: None,
                sub_criteria: criteria.into_iter().collect(),
            },
        });
    }

    /// Initial criterion: `not X`, or `not (...)` when more than one criterion renders.
    pub fn not(&mut self, completer: impl FnOnce(&mut CriteriaCollector)) {
        let group = self.nested(completer);
        self.set_initial(SqlCriterion::Not(group));
    }

    pub fn not_all(&mut self, criteria: impl IntoIterator<Item = AndOrCriteriaGroup>) {
        self.set_initial(SqlCriterion::Not(CriteriaGroup {
            initial: None,
            sub_criteria: criteria.into_iter().collect(),
        }));
    }

    /// Initial criterion: a parenthesized group.
    pub fn group(&mut self, completer: impl FnOnce(&mut CriteriaCollector)) {
        let group = self.nested(completer);
        self.set_initial(SqlCriterion::Group(group));
    }

    pub fn group_all(&mut self, criteria: impl IntoIterator<Item = AndOrCriteriaGroup>) {
        self.set_initial(SqlCriterion::Group(CriteriaGroup {
            initial: None,
            sub_criteria: criteria.into_iter().collect(),
        }));
    }

    /// Initial criterion: `exists (select ...)`.
    pub fn exists(&mut self, completer: impl FnOnce(&mut SubQueryBuilder)) {
        if let Some(query) = self.subquery(completer) {
            self.set_initial(SqlCriterion::Exists {
                query: Box::new(query),
                negated: false,
            });
        }
    }

    /// Initial criterion: `not exists (select ...)`.
    pub fn not_exists(&mut self, completer: impl FnOnce(&mut SubQueryBuilder)) {
        if let Some(query) = self.subquery(completer) {
            self.set_initial(SqlCriterion::Exists {
                query: Box::new(query),
                negated: true,
            });
        }
    }

    /// Start an infix-style criterion on a column: `w.col(&id).is_equal_to(3)`.
    pub fn col<T>(&mut self, column: &SqlColumn<T>) -> ColumnCriterion<'_, T> {
        ColumnCriterion::new(self, BasicColumn::from(column))
    }

    /// Start a criterion on an arbitrary expression, e.g. `count(*)` in a having clause.
    pub fn expr(&mut self, column: impl Into<BasicColumn>) -> ColumnCriterion<'_, Value> {
        ColumnCriterion::new(self, column.into())
    }

    /// Initial criterion from a prebuilt condition: `w.condition(&id, is_in([1, 2]))`.
    pub fn condition<T>(&mut self, column: &SqlColumn<T>, condition: Condition<T>) {
        self.col(column).matches(condition);
    }
}

/// Compose two completers into one that applies `first` then `after`.
///
/// Useful for reusing a where clause across statements:
///
/// ```ignore
/// let by_name = |w: &mut CriteriaCollector| { w.col(&last_name).is_equal_to("Rubble"); };
/// s.where_(and_then(by_name, |w| { w.and(|a| { a.col(&id).is_greater_than(3); }); }));
/// ```
pub fn and_then<F, G>(first: F, after: G) -> impl FnOnce(&mut CriteriaCollector)
where
    F: FnOnce(&mut CriteriaCollector),
    G: FnOnce(&mut CriteriaCollector),
{
    move |c: &mut CriteriaCollector| {
        first(c);
        after(c);
    }
}

/// Infix-style criterion builder returned by [`CriteriaCollector::col`].
pub struct ColumnCriterion<'a, T> {
    collector: &'a mut CriteriaCollector,
    column: BasicColumn,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T> ColumnCriterion<'a, T> {
    fn new(collector: &'a mut CriteriaCollector, column: BasicColumn) -> Self {
        Self {
            collector,
            column,
            _marker: PhantomData,
        }
    }

    fn apply(self, condition: ConditionKind, case_insensitive: bool) {
        self.collector
            .set_initial(SqlCriterion::Condition(ColumnCondition {
                column: self.column,
                condition,
                case_insensitive,
            }));
    }

    /// Apply a prebuilt condition.
    pub fn matches(self, condition: Condition<T>) {
        let case_insensitive = condition.case_insensitive;
        self.apply(condition.kind, case_insensitive);
    }

    pub fn is_null(self) {
        self.apply(ConditionKind::Null { negated: false }, false);
    }

    pub fn is_not_null(self) {
        self.apply(ConditionKind::Null { negated: true }, false);
    }

    fn compare_column(self, op: CompareOp, column: BasicColumn) {
        self.apply(ConditionKind::CompareColumn { op, column }, false);
    }

    fn compare_subquery(self, op: CompareOp, completer: impl FnOnce(&mut SubQueryBuilder)) {
        if let Some(query) = self.collector.subquery(completer) {
            self.apply(
                ConditionKind::CompareSubQuery {
                    op,
                    query: Box::new(query),
                },
                false,
            );
        }
    }

    fn in_subquery(self, negated: bool, completer: impl FnOnce(&mut SubQueryBuilder)) {
        if let Some(query) = self.collector.subquery(completer) {
            self.apply(
                ConditionKind::InSubQuery {
                    query: Box::new(query),
                    negated,
                },
                false,
            );
        }
    }

    pub fn is_in_subquery(self, completer: impl FnOnce(&mut SubQueryBuilder)) {
        self.in_subquery(false, completer);
    }

    pub fn is_not_in_subquery(self, completer: impl FnOnce(&mut SubQueryBuilder)) {
        self.in_subquery(true, completer);
    }
}

macro_rules! comparison_methods {
    ($($op:ident => $value:ident, $when_present:ident, $column:ident, $subquery:ident;)*) => {
        $(
            pub fn $value(self, value: impl Into<T>) {
                let value = Some(value_of::<T, _>(value));
                self.apply(ConditionKind::Compare { op: CompareOp::$op, value }, false);
            }

            pub fn $when_present<V: Into<T>>(self, value: Option<V>) {
                let value = value.map(value_of::<T, V>);
                self.apply(ConditionKind::Compare { op: CompareOp::$op, value }, false);
            }

            pub fn $column(self, column: impl Into<BasicColumn>) {
                self.compare_column(CompareOp::$op, column.into());
            }

            pub fn $subquery(self, completer: impl FnOnce(&mut SubQueryBuilder)) {
                self.compare_subquery(CompareOp::$op, completer);
            }
        )*
    };
}

impl<'a, T: Into<Value>> ColumnCriterion<'a, T> {
    comparison_methods! {
        Eq => is_equal_to, is_equal_to_when_present, is_equal_to_column, is_equal_to_subquery;
        Ne => is_not_equal_to, is_not_equal_to_when_present, is_not_equal_to_column, is_not_equal_to_subquery;
        Gt => is_greater_than, is_greater_than_when_present, is_greater_than_column, is_greater_than_subquery;
        Ge => is_greater_than_or_equal_to, is_greater_than_or_equal_to_when_present,
            is_greater_than_or_equal_to_column, is_greater_than_or_equal_to_subquery;
        Lt => is_less_than, is_less_than_when_present, is_less_than_column, is_less_than_subquery;
        Le => is_less_than_or_equal_to, is_less_than_or_equal_to_when_present,
            is_less_than_or_equal_to_column, is_less_than_or_equal_to_subquery;
    }

    pub fn is_like(self, value: impl Into<T>) {
        self.matches(condition::is_like::<T, _>(value));
    }

    pub fn is_like_when_present<V: Into<T>>(self, value: Option<V>) {
        self.matches(condition::is_like_when_present::<T, V>(value));
    }

    pub fn is_not_like(self, value: impl Into<T>) {
        self.matches(condition::is_not_like::<T, _>(value));
    }

    pub fn is_not_like_when_present<V: Into<T>>(self, value: Option<V>) {
        self.matches(condition::is_not_like_when_present::<T, V>(value));
    }

    pub fn is_in<I>(self, values: I)
    where
        I: IntoIterator,
        I::Item: Into<T>,
    {
        self.matches(condition::is_in::<T, I>(values));
    }

    pub fn is_in_when_present<V, I>(self, values: I)
    where
        V: Into<T>,
        I: IntoIterator<Item = Option<V>>,
    {
        self.matches(condition::is_in_when_present::<T, V, I>(values));
    }

    pub fn is_not_in<I>(self, values: I)
    where
        I: IntoIterator,
        I::Item: Into<T>,
    {
        self.matches(condition::is_not_in::<T, I>(values));
    }

    pub fn is_not_in_when_present<V, I>(self, values: I)
    where
        V: Into<T>,
        I: IntoIterator<Item = Option<V>>,
    {
        self.matches(condition::is_not_in_when_present::<T, V, I>(values));
    }

    /// `col between a and b`, written `w.col(&id).is_between(a).and(b)`.
    pub fn is_between(self, from: impl Into<T>) -> BetweenBuilder<'a, T> {
        BetweenBuilder {
            criterion: self,
            from: value_of::<T, _>(from),
            negated: false,
        }
    }

    pub fn is_not_between(self, from: impl Into<T>) -> BetweenBuilder<'a, T> {
        BetweenBuilder {
            criterion: self,
            from: value_of::<T, _>(from),
            negated: true,
        }
    }

    pub fn is_between_when_present<V: Into<T>>(self, from: Option<V>) -> BetweenWhenPresentBuilder<'a, T> {
        BetweenWhenPresentBuilder {
            criterion: self,
            from: from.map(value_of::<T, V>),
            negated: false,
        }
    }

    pub fn is_not_between_when_present<V: Into<T>>(
        self,
        from: Option<V>,
    ) -> BetweenWhenPresentBuilder<'a, T> {
        BetweenWhenPresentBuilder {
            criterion: self,
            from: from.map(value_of::<T, V>),
            negated: true,
        }
    }
}

impl ColumnCriterion<'_, bool> {
    pub fn is_true(self) {
        self.is_equal_to(true);
    }

    pub fn is_false(self) {
        self.is_equal_to(false);
    }
}

impl ColumnCriterion<'_, String> {
    pub fn is_like_case_insensitive(self, value: impl Into<String>) {
        self.matches(condition::is_like_case_insensitive(value));
    }

    pub fn is_like_case_insensitive_when_present<V: Into<String>>(self, value: Option<V>) {
        self.matches(condition::is_like_case_insensitive_when_present(value));
    }

    pub fn is_not_like_case_insensitive(self, value: impl Into<String>) {
        self.matches(condition::is_not_like_case_insensitive(value));
    }

    pub fn is_not_like_case_insensitive_when_present<V: Into<String>>(self, value: Option<V>) {
        self.matches(condition::is_not_like_case_insensitive_when_present(value));
    }

    pub fn is_in_case_insensitive<I>(self, values: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.matches(condition::is_in_case_insensitive(values));
    }

    pub fn is_in_case_insensitive_when_present<V, I>(self, values: I)
    where
        V: Into<String>,
        I: IntoIterator<Item = Option<V>>,
    {
        self.matches(condition::is_in_case_insensitive_when_present(values));
    }

    pub fn is_not_in_case_insensitive<I>(self, values: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.matches(condition::is_not_in_case_insensitive(values));
    }

    pub fn is_not_in_case_insensitive_when_present<V, I>(self, values: I)
    where
        V: Into<String>,
        I: IntoIterator<Item = Option<V>>,
    {
        self.matches(condition::is_not_in_case_insensitive_when_present(values));
    }
}

/// Second half of `is_between(a).and(b)`.
#[must_use = "call `.and(value)` to supply the upper bound"]
pub struct BetweenBuilder<'a, T> {
    criterion: ColumnCriterion<'a, T>,
    from: Value,
    negated: bool,
}

impl<T: Into<Value>> BetweenBuilder<'_, T> {
    pub fn and(self, to: impl Into<T>) {
        let kind = ConditionKind::Between {
            from: Some(self.from),
            to: Some(value_of::<T, _>(to)),
            negated: self.negated,
        };
        self.criterion.apply(kind, false);
    }
}

/// Second half of `is_between_when_present(a).and(b)`; drops out unless both are present.
#[must_use = "call `.and(value)` to supply the upper bound"]
pub struct BetweenWhenPresentBuilder<'a, T> {
    criterion: ColumnCriterion<'a, T>,
    from: Option<Value>,
    negated: bool,
}

impl<T: Into<Value>> BetweenWhenPresentBuilder<'_, T> {
    pub fn and<V: Into<T>>(self, to: Option<V>) {
        let kind = ConditionKind::Between {
            from: self.from,
            to: to.map(value_of::<T, V>),
            negated: self.negated,
        };
        self.criterion.apply(kind, false);
    }
}
