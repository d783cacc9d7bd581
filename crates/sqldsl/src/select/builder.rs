use super::join::TableExpression;
use super::{LockMode, LockWait, Paging, QueryExpression, SelectModel, UnionKind};
use crate::column::BasicColumn;
use crate::config::StatementConfiguration;
use crate::criteria::CriteriaCollector;
use crate::error::{DslError, DslResult};
use crate::table::{SortSpec, SqlTable};

/// Builder behind [`select`](super::select) and the other select entry points.
///
/// Methods apply to the query expression currently being built; after
/// [`union`](Self::union) they apply to the new expression. `order_by`,
/// paging and locking always apply to the whole statement.
#[derive(Debug)]
pub struct SelectBuilder {
    pub(super) current: QueryExpression,
    previous: Vec<QueryExpression>,
    order_by: Vec<SortSpec>,
    paging: Paging,
    lock: Option<LockMode>,
    lock_wait: Option<LockWait>,
    config: StatementConfiguration,
    build_error: Option<String>,
}

impl SelectBuilder {
    pub(crate) fn new(columns: Vec<BasicColumn>, distinct: bool) -> Self {
        Self {
            current: QueryExpression::new(columns, distinct, None),
            previous: Vec::new(),
            order_by: Vec::new(),
            paging: Paging::default(),
            lock: None,
            lock_wait: None,
            config: StatementConfiguration::default(),
            build_error: None,
        }
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        if self.build_error.is_none() {
            self.build_error = Some(message.into());
        }
    }

    fn set_from(&mut self, from: TableExpression) -> &mut Self {
        if self.current.from.is_some() {
            self.fail("from is already set for this select");
        } else {
            self.current.from = Some(from);
        }
        self
    }

    // ==================== FROM ====================

    pub fn from(&mut self, table: &SqlTable) -> &mut Self {
        self.set_from(TableExpression::table(table, None))
    }

    /// `from table alias`; columns of `table` render as `alias.column`.
    pub fn from_as(&mut self, table: &SqlTable, alias: &str) -> &mut Self {
        self.set_from(TableExpression::table(table, Some(alias)))
    }

    /// `from (select ...) alias`
    pub fn from_subquery(&mut self, query: impl FnOnce(&mut SubQueryBuilder), alias: &str) -> &mut Self {
        match SubQueryBuilder::collect(query) {
            Ok(query) => self.set_from(TableExpression::SubQuery {
                query: Box::new(query),
                alias: alias.to_string(),
            }),
            Err(err) => {
                self.fail(err.into_message());
                self
            }
        }
    }

    // ==================== WHERE / GROUP BY / HAVING ====================

    pub fn where_(&mut self, completer: impl FnOnce(&mut CriteriaCollector)) -> &mut Self {
        if self.current.where_clause.is_some() {
            self.fail("where is already set for this select; use and/or to add criteria");
            return self;
        }
        match CriteriaCollector::collect(completer) {
            Ok(group) => self.current.where_clause = Some(group),
            Err(err) => self.fail(err.into_message()),
        }
        self
    }

    pub fn group_by<I>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<BasicColumn>,
    {
        let columns: Vec<BasicColumn> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            self.fail("group by requires at least one column");
        } else {
            self.current.group_by.extend(columns);
        }
        self
    }

    pub fn having(&mut self, completer: impl FnOnce(&mut CriteriaCollector)) -> &mut Self {
        if self.current.having.is_some() {
            self.fail("having is already set for this select; use and/or to add criteria");
            return self;
        }
        match CriteriaCollector::collect(completer) {
            Ok(group) => self.current.having = Some(group),
            Err(err) => self.fail(err.into_message()),
        }
        self
    }

    // ==================== UNION ====================

    fn start_expression(&mut self, columns: Vec<BasicColumn>, distinct: bool, kind: UnionKind) -> &mut Self {
        let next = QueryExpression::new(columns, distinct, Some(kind));
        let done = std::mem::replace(&mut self.current, next);
        self.previous.push(done);
        self
    }

    /// Start a new query expression joined with `union`.
    pub fn union<I>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<BasicColumn>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        self.start_expression(columns, false, UnionKind::Union)
    }

    /// Start a new `select distinct` query expression joined with `union`.
    pub fn union_distinct<I>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<BasicColumn>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        self.start_expression(columns, true, UnionKind::Union)
    }

    /// Start a new query expression joined with `union all`.
    pub fn union_all<I>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<BasicColumn>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        self.start_expression(columns, false, UnionKind::UnionAll)
    }

    // ==================== ORDER BY / PAGING ====================

    pub fn order_by<I>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<SortSpec>,
    {
        let columns: Vec<SortSpec> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            self.fail("order by requires at least one column");
        } else {
            self.order_by.extend(columns);
        }
        self
    }

    pub fn limit(&mut self, limit: i64) -> &mut Self {
        self.paging.limit = Some(limit);
        self
    }

    pub fn limit_when_present(&mut self, limit: Option<i64>) -> &mut Self {
        if let Some(limit) = limit {
            self.paging.limit = Some(limit);
        }
        self
    }

    pub fn offset(&mut self, offset: i64) -> &mut Self {
        self.paging.offset = Some(offset);
        self
    }

    pub fn offset_when_present(&mut self, offset: Option<i64>) -> &mut Self {
        if let Some(offset) = offset {
            self.paging.offset = Some(offset);
        }
        self
    }

    pub fn fetch_first(&mut self, rows: i64) -> &mut Self {
        self.paging.fetch_first = Some(rows);
        self
    }

    pub fn fetch_first_when_present(&mut self, rows: Option<i64>) -> &mut Self {
        if let Some(rows) = rows {
            self.paging.fetch_first = Some(rows);
        }
        self
    }

    // ==================== Locking ====================

    fn set_lock(&mut self, lock: LockMode) -> &mut Self {
        if self.lock.is_some() {
            self.fail("a lock mode is already set for this select");
        } else {
            self.lock = Some(lock);
        }
        self
    }

    fn set_lock_wait(&mut self, wait: LockWait) -> &mut Self {
        if self.lock.is_none() {
            self.fail(format!("{} requires a lock mode such as for update", wait.as_sql()));
        } else if self.lock_wait.is_some() {
            self.fail("only one of skip locked or nowait may be set");
        } else {
            self.lock_wait = Some(wait);
        }
        self
    }

    pub fn for_update(&mut self) -> &mut Self {
        self.set_lock(LockMode::Update)
    }

    pub fn for_no_key_update(&mut self) -> &mut Self {
        self.set_lock(LockMode::NoKeyUpdate)
    }

    pub fn for_share(&mut self) -> &mut Self {
        self.set_lock(LockMode::Share)
    }

    pub fn for_key_share(&mut self) -> &mut Self {
        self.set_lock(LockMode::KeyShare)
    }

    pub fn skip_locked(&mut self) -> &mut Self {
        self.set_lock_wait(LockWait::SkipLocked)
    }

    pub fn nowait(&mut self) -> &mut Self {
        self.set_lock_wait(LockWait::Nowait)
    }

    pub fn configure_statement(&mut self, f: impl FnOnce(&mut StatementConfiguration)) -> &mut Self {
        f(&mut self.config);
        self
    }

    pub(crate) fn build(self) -> DslResult<SelectModel> {
        if let Some(err) = self.build_error {
            return Err(DslError::InvalidSql(err));
        }
        let mut expressions = self.previous;
        expressions.push(self.current);
        if expressions.iter().any(|e| e.columns.is_empty()) {
            return Err(DslError::invalid("a select requires at least one column"));
        }
        if self.paging.limit.is_some() && self.paging.fetch_first.is_some() {
            return Err(DslError::invalid("limit and fetch first cannot be combined"));
        }
        Ok(SelectModel {
            expressions,
            order_by: self.order_by,
            paging: self.paging,
            lock: self.lock,
            lock_wait: self.lock_wait,
            config: self.config,
        })
    }
}

/// Collects the single select of a subquery.
///
/// ```ignore
/// w.col(&id).is_in_subquery(|q| {
///     q.select([&detail_id], |s| { s.from(&detail); });
/// });
/// ```
#[derive(Debug, Default)]
pub struct SubQueryBuilder {
    query: Option<SelectModel>,
    build_error: Option<String>,
}

impl SubQueryBuilder {
    fn set(&mut self, result: DslResult<SelectModel>) {
        if self.build_error.is_some() {
            return;
        }
        match result {
            Ok(_) if self.query.is_some() => {
                self.build_error = Some("a subquery may contain only one select".to_string());
            }
            Ok(query) => self.query = Some(query),
            Err(err) => self.build_error = Some(err.into_message()),
        }
    }

    pub fn select<I>(&mut self, columns: I, completer: impl FnOnce(&mut SelectBuilder))
    where
        I: IntoIterator,
        I::Item: Into<BasicColumn>,
    {
        self.set(super::select(columns, completer));
    }

    pub fn select_distinct<I>(&mut self, columns: I, completer: impl FnOnce(&mut SelectBuilder))
    where
        I: IntoIterator,
        I::Item: Into<BasicColumn>,
    {
        self.set(super::select_distinct(columns, completer));
    }

    pub(crate) fn collect(completer: impl FnOnce(&mut SubQueryBuilder)) -> DslResult<SelectModel> {
        let mut builder = SubQueryBuilder::default();
        completer(&mut builder);
        if let Some(err) = builder.build_error {
            return Err(DslError::InvalidSql(err));
        }
        builder
            .query
            .ok_or_else(|| DslError::invalid("a subquery requires a select"))
    }
}
