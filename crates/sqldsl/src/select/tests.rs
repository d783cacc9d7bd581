use super::*;
use crate::column::{count_all, sub_query};
use crate::render::StatementProvider;
use crate::table::SqlColumn;

struct Orders {
    master: SqlTable,
    detail: SqlTable,
    om_id: SqlColumn<i32>,
    om_date: SqlColumn<String>,
    od_id: SqlColumn<i32>,
    od_line: SqlColumn<i32>,
    od_description: SqlColumn<String>,
}

fn orders() -> Orders {
    let master = SqlTable::new("OrderMaster");
    let detail = SqlTable::new("OrderDetail");
    Orders {
        om_id: master.column("order_id"),
        om_date: master.column("order_date"),
        od_id: detail.column("order_id"),
        od_line: detail.column("line_number"),
        od_description: detail.column("description"),
        master,
        detail,
    }
}

struct Person {
    table: SqlTable,
    id: SqlColumn<i32>,
    first_name: SqlColumn<String>,
}

fn person() -> Person {
    let table = SqlTable::new("Person");
    Person {
        id: table.column("id"),
        first_name: table.column("first_name"),
        table,
    }
}

// ==================== Joins ====================

#[test]
fn join_with_aliases() {
    let o = orders();
    let provider = select(
        crate::columns![o.om_id, o.om_date, o.od_line, o.od_description],
        |s| {
            s.from_as(&o.master, "om");
            s.join_as(&o.detail, "od", |on| {
                on.col(&o.om_id).is_equal_to_column(&o.od_id);
            });
            s.where_(|w| {
                w.col(&o.om_id).is_equal_to(2);
            });
        },
    )
    .unwrap()
    .render(RenderingStrategy::MyBatis3)
    .unwrap();

    assert_eq!(
        provider.select_statement(),
        "select om.order_id, om.order_date, od.line_number, od.description from OrderMaster om join OrderDetail od on om.order_id = od.order_id where om.order_id = #{parameters.p1}"
    );
}

#[test]
fn join_without_aliases_qualifies_with_table_names() {
    let o = orders();
    let provider = select(crate::columns![o.om_id, o.od_line], |s| {
        s.from(&o.master);
        s.left_join(&o.detail, |on| {
            on.col(&o.om_id).is_equal_to_column(&o.od_id);
            on.and(|a| {
                a.col(&o.od_line).is_greater_than(1);
            });
        });
    })
    .unwrap()
    .render(RenderingStrategy::SpringNamedParameter)
    .unwrap();

    assert_eq!(
        provider.sql(),
        "select OrderMaster.order_id, OrderDetail.line_number from OrderMaster left join OrderDetail on OrderMaster.order_id = OrderDetail.order_id and OrderDetail.line_number > :p1"
    );
}

#[test]
fn join_kinds() {
    let o = orders();
    for (kind, expected) in [
        (JoinType::Inner, "join"),
        (JoinType::Left, "left join"),
        (JoinType::Right, "right join"),
        (JoinType::Full, "full join"),
    ] {
        let model = select([&o.om_id], |s| {
            s.from_as(&o.master, "om");
            let on = |on: &mut crate::CriteriaCollector| {
                on.col(&o.om_id).is_equal_to_column(&o.od_id);
            };
            match kind {
                JoinType::Inner => s.join_as(&o.detail, "od", on),
                JoinType::Left => s.left_join_as(&o.detail, "od", on),
                JoinType::Right => s.right_join_as(&o.detail, "od", on),
                JoinType::Full => s.full_join_as(&o.detail, "od", on),
            };
        })
        .unwrap();
        let sql = model.render(RenderingStrategy::RawJdbc).unwrap().sql().to_string();
        assert_eq!(
            sql,
            format!("select om.order_id from OrderMaster om {expected} OrderDetail od on om.order_id = od.order_id")
        );
    }
}

#[test]
fn join_subquery() {
    let o = orders();
    let provider = select([&o.om_id], |s| {
        s.from_as(&o.master, "om");
        s.left_join_subquery(
            |q| {
                q.select([&o.od_id], |s| {
                    s.from(&o.detail);
                    s.where_(|w| {
                        w.col(&o.od_line).is_less_than(3);
                    });
                });
            },
            "d",
            |on| {
                on.col(&o.om_id).is_equal_to_column(&o.od_id.qualified_with("d"));
            },
        );
    })
    .unwrap()
    .render(RenderingStrategy::Postgres)
    .unwrap();

    assert_eq!(
        provider.sql(),
        "select om.order_id from OrderMaster om left join (select order_id from OrderDetail where line_number < $1) d on om.order_id = d.order_id"
    );
}

#[test]
fn join_without_on_condition_is_an_error() {
    let o = orders();
    let err = select([&o.om_id], |s| {
        s.from(&o.master);
        s.join(&o.detail, |_| {});
    })
    .unwrap_err();
    assert!(err.to_string().contains("at least one on condition"));
}

// ==================== Subqueries ====================

#[test]
fn scalar_subquery_column_sees_outer_alias() {
    let o = orders();
    let line_count = sub_query(|q| {
        q.select([count_all()], |s| {
            s.from_as(&o.detail, "od");
            s.where_(|w| {
                w.col(&o.om_id).is_equal_to_column(&o.od_id);
            });
        });
    })
    .unwrap()
    .as_("linecount");

    let provider = select(crate::columns![o.om_id, line_count], |s| {
        s.from_as(&o.master, "om");
        s.order_by([SortSpec::named("linecount").descending()]);
    })
    .unwrap()
    .render(RenderingStrategy::MyBatis3)
    .unwrap();

    assert_eq!(
        provider.sql(),
        "select om.order_id, (select count(*) from OrderDetail od where om.order_id = od.order_id) as linecount from OrderMaster om order by linecount DESC"
    );
}

#[test]
fn from_subquery_shares_parameter_sequence() {
    let p = person();
    let provider = select([&p.first_name], |s| {
        s.from_subquery(
            |q| {
                q.select(crate::columns![p.id, p.first_name], |s| {
                    s.from(&p.table);
                    s.where_(|w| {
                        w.col(&p.id).is_greater_than(1);
                    });
                });
            },
            "t",
        );
        s.where_(|w| {
            w.col(&p.id).is_less_than(10);
        });
    })
    .unwrap()
    .render(RenderingStrategy::SpringNamedParameter)
    .unwrap();

    assert_eq!(
        provider.sql(),
        "select first_name from (select id, first_name from Person where id > :p1) t where id < :p2"
    );
    assert_eq!(provider.parameters().get("p2"), Some(&Value::Int(10)));
}

#[test]
fn exists_and_not_exists() {
    let o = orders();
    let provider = select([&o.om_id], |s| {
        s.from_as(&o.master, "om");
        s.where_(|w| {
            w.exists(|q| {
                q.select([o.detail.all_columns()], |s| {
                    s.from_as(&o.detail, "od");
                    s.where_(|w| {
                        w.col(&o.od_id).is_equal_to_column(&o.om_id);
                    });
                });
            });
            w.and(|a| {
                a.not_exists(|q| {
                    q.select([o.detail.all_columns()], |s| {
                        s.from_as(&o.detail, "od");
                        s.where_(|w| {
                            w.col(&o.od_line).is_greater_than(5);
                        });
                    });
                });
            });
        });
    })
    .unwrap()
    .render(RenderingStrategy::SpringNamedParameter)
    .unwrap();

    assert_eq!(
        provider.sql(),
        "select om.order_id from OrderMaster om where exists (select od.* from OrderDetail od where od.order_id = om.order_id) and not exists (select od.* from OrderDetail od where od.line_number > :p1)"
    );
}

#[test]
fn subquery_without_select_is_an_error() {
    let p = person();
    let err = select([&p.id], |s| {
        s.from(&p.table);
        s.where_(|w| {
            w.col(&p.id).is_in_subquery(|_| {});
        });
    })
    .unwrap_err();
    assert!(err.to_string().contains("a subquery requires a select"));
    assert!(!err.to_string().contains("Invalid SQL: Invalid SQL"));
}

// ==================== Paging ====================

#[test]
fn limit_and_offset() {
    let p = person();
    let provider = select([&p.id], |s| {
        s.from(&p.table);
        s.order_by([p.id.asc()]);
        s.limit(3);
        s.offset(2);
    })
    .unwrap()
    .render(RenderingStrategy::MyBatis3)
    .unwrap();

    assert_eq!(
        provider.sql(),
        "select id from Person order by id limit #{parameters.p1} offset #{parameters.p2}"
    );
    assert_eq!(provider.parameters().get("p1"), Some(&Value::BigInt(3)));
    assert_eq!(provider.parameters().get("p2"), Some(&Value::BigInt(2)));
}

#[test]
fn offset_and_fetch_first() {
    let p = person();
    let render = |completer: &dyn Fn(&mut SelectBuilder)| {
        select([&p.id], |s| {
            s.from(&p.table);
            completer(s);
        })
        .unwrap()
        .render(RenderingStrategy::SpringNamedParameter)
        .unwrap()
        .sql()
        .to_string()
    };

    assert_eq!(
        render(&|s| {
            s.offset(2).fetch_first(3);
        }),
        "select id from Person offset :p1 rows fetch first :p2 rows only"
    );
    assert_eq!(
        render(&|s| {
            s.fetch_first(3);
        }),
        "select id from Person fetch first :p1 rows only"
    );
    assert_eq!(
        render(&|s| {
            s.offset(5);
        }),
        "select id from Person offset :p1 rows"
    );
    assert_eq!(
        render(&|s| {
            s.limit_when_present(None).offset_when_present(None);
        }),
        "select id from Person"
    );
}

#[test]
fn absent_paging_values_keep_earlier_ones() {
    let p = person();
    let provider = select([&p.id], |s| {
        s.from(&p.table);
        s.limit(10).limit_when_present(None);
        s.offset(20).offset_when_present(None);
    })
    .unwrap()
    .render(RenderingStrategy::Postgres)
    .unwrap();
    assert_eq!(provider.sql(), "select id from Person limit $1 offset $2");

    let provider = select([&p.id], |s| {
        s.from(&p.table);
        s.fetch_first(5).fetch_first_when_present(None);
        s.limit_when_present(None);
    })
    .unwrap()
    .render(RenderingStrategy::Postgres)
    .unwrap();
    assert_eq!(provider.sql(), "select id from Person fetch first $1 rows only");
    assert_eq!(provider.parameters().get("$1"), Some(&Value::BigInt(5)));
}

#[test]
fn limit_with_fetch_first_is_an_error() {
    let p = person();
    let err = select([&p.id], |s| {
        s.from(&p.table);
        s.limit(1).fetch_first(2);
    })
    .unwrap_err();
    assert!(err.is_invalid_sql());
}

// ==================== Locking ====================

#[test]
fn lock_modes() {
    let p = person();
    let provider = select([&p.id], |s| {
        s.from(&p.table);
        s.where_(|w| {
            w.col(&p.id).is_equal_to(1);
        });
        s.for_update().skip_locked();
    })
    .unwrap()
    .render(RenderingStrategy::Postgres)
    .unwrap();
    assert_eq!(
        provider.sql(),
        "select id from Person where id = $1 for update skip locked"
    );

    let provider = select([&p.id], |s| {
        s.from(&p.table);
        s.limit(1);
        s.for_key_share().nowait();
    })
    .unwrap()
    .render(RenderingStrategy::Postgres)
    .unwrap();
    assert_eq!(provider.sql(), "select id from Person limit $1 for key share nowait");
}

#[test]
fn lock_misuse_is_an_error() {
    let p = person();
    let err = select([&p.id], |s| {
        s.from(&p.table);
        s.nowait();
    })
    .unwrap_err();
    assert!(err.to_string().contains("requires a lock mode"));

    let err = select([&p.id], |s| {
        s.from(&p.table);
        s.for_update().for_share();
    })
    .unwrap_err();
    assert!(err.to_string().contains("lock mode is already set"));

    let err = select([&p.id], |s| {
        s.from(&p.table);
        s.for_no_key_update().skip_locked().nowait();
    })
    .unwrap_err();
    assert!(err.to_string().contains("only one of skip locked or nowait"));
}

// ==================== Unions ====================

#[test]
fn union_starts_a_new_query_expression() {
    let p = person();
    let provider = select([&p.id, &p.id], |s| {
        s.from(&p.table);
        s.where_(|w| {
            w.col(&p.id).is_less_than(3);
        });
        s.union([&p.id, &p.id]);
        s.from_as(&p.table, "p");
        s.where_(|w| {
            w.col(&p.id).is_greater_than(8);
        });
        s.union_all([&p.id, &p.id]);
        s.from(&p.table);
        s.order_by([p.id.desc()]);
    })
    .unwrap()
    .render(RenderingStrategy::SpringNamedParameter)
    .unwrap();

    assert_eq!(
        provider.sql(),
        "select id, id from Person where id < :p1 union select p.id, p.id from Person p where p.id > :p2 union all select id, id from Person order by id DESC"
    );
}

#[test]
fn multi_select_parenthesizes_each_select() {
    let p = person();
    let provider = multi_select(|m| {
        m.select([&p.id], |s| {
            s.from(&p.table);
            s.where_(|w| {
                w.col(&p.id).is_less_than(2);
            });
            s.order_by([p.id.asc()]);
            s.limit(1);
        });
        m.union_all(|u| {
            u.select_distinct([&p.id], |s| {
                s.from(&p.table);
            });
        });
        m.order_by([p.id.desc()]);
        m.offset(1);
    })
    .unwrap()
    .render(RenderingStrategy::RawJdbc)
    .unwrap();

    assert_eq!(
        provider.sql(),
        "(select id from Person where id < ? order by id limit ?) union all (select distinct id from Person) order by id DESC offset ? rows"
    );
    let keys: Vec<&str> = provider.parameters().keys().collect();
    assert_eq!(keys, ["1", "2", "3"]);
}

#[test]
fn multi_select_requires_leading_select() {
    let p = person();
    let err = multi_select(|m| {
        m.union(|u| {
            u.select([&p.id], |s| {
                s.from(&p.table);
            });
        });
    })
    .unwrap_err();
    assert!(err.to_string().contains("requires a preceding select"));
    assert!(multi_select(|_| {}).unwrap_err().is_invalid_sql());
}

// ==================== Counts and grouping ====================

#[test]
fn count_entry_points() {
    let p = person();
    let sql = count_from(&p.table, |s| {
        s.where_(|w| {
            w.col(&p.id).is_greater_than(3);
        });
    })
    .unwrap()
    .render(RenderingStrategy::SpringNamedParameter)
    .unwrap()
    .sql()
    .to_string();
    assert_eq!(sql, "select count(*) from Person where id > :p1");

    let sql = count(&p.first_name, |s| {
        s.from(&p.table);
    })
    .unwrap()
    .render(RenderingStrategy::SpringNamedParameter)
    .unwrap()
    .sql()
    .to_string();
    assert_eq!(sql, "select count(first_name) from Person");

    let sql = count_distinct(&p.first_name, |s| {
        s.from(&p.table);
    })
    .unwrap()
    .render(RenderingStrategy::SpringNamedParameter)
    .unwrap()
    .sql()
    .to_string();
    assert_eq!(sql, "select count(distinct first_name) from Person");
}

#[test]
fn distinct_group_by_having() {
    let p = person();
    let provider = select_distinct(crate::columns![p.first_name, count_all().as_("n")], |s| {
        s.from(&p.table);
        s.group_by([&p.first_name]);
        s.having(|h| {
            h.expr(count_all()).is_greater_than_or_equal_to(2);
        });
        s.order_by([SortSpec::named("n").descending(), p.first_name.asc()]);
    })
    .unwrap()
    .render(RenderingStrategy::SpringNamedParameter)
    .unwrap();

    assert_eq!(
        provider.sql(),
        "select distinct first_name, count(*) as n from Person group by first_name having count(*) >= :p1 order by n DESC, first_name"
    );
}

// ==================== Statement configuration and misuse ====================

#[test]
fn non_rendering_where_clause() {
    let p = person();
    let model = select([&p.id], |s| {
        s.from(&p.table);
        s.where_(|w| {
            w.col(&p.id).is_equal_to_when_present(None::<i32>);
        });
    })
    .unwrap();
    assert!(matches!(
        model.render(RenderingStrategy::MyBatis3),
        Err(DslError::NonRenderingWhereClause)
    ));

    let provider = select([&p.id], |s| {
        s.configure_statement(|c| {
            c.set_non_rendering_where_clause_allowed(true);
        });
        s.from(&p.table);
        s.where_(|w| {
            w.col(&p.id).is_equal_to_when_present(None::<i32>);
        });
    })
    .unwrap()
    .render(RenderingStrategy::MyBatis3)
    .unwrap();
    assert_eq!(provider.sql(), "select id from Person");
}

#[test]
fn statement_fragments_wrap_select() {
    let p = person();
    let provider = select([&p.id], |s| {
        s.configure_statement(|c| {
            c.with_sql_after_keyword("/*+ index(Person) */");
        });
        s.from(&p.table);
    })
    .unwrap()
    .render(RenderingStrategy::MyBatis3)
    .unwrap();
    assert_eq!(provider.sql(), "select /*+ index(Person) */ id from Person");
}

#[test]
fn builder_misuse_is_reported_at_build() {
    let p = person();
    let err = select([&p.id], |s| {
        s.from(&p.table);
        s.from(&p.table);
    })
    .unwrap_err();
    assert!(err.to_string().contains("from is already set"));

    let err = select([&p.id], |s| {
        s.from(&p.table);
        s.where_(|w| {
            w.col(&p.id).is_equal_to(1);
        });
        s.where_(|w| {
            w.col(&p.id).is_equal_to(2);
        });
    })
    .unwrap_err();
    assert!(err.to_string().contains("where is already set"));

    let err = select(crate::columns![p.first_name, count_all()], |s| {
        s.from(&p.table);
        s.group_by([&p.first_name]);
        s.having(|h| {
            h.expr(count_all()).is_greater_than(1);
        });
        s.having(|h| {
            h.expr(count_all()).is_less_than(5);
        });
    })
    .unwrap_err();
    assert!(err.is_invalid_sql());
    assert!(err.to_string().contains("having is already set"));

    let err = select(Vec::<BasicColumn>::new(), |s| {
        s.from(&p.table);
    })
    .unwrap_err();
    assert!(err.to_string().contains("at least one column"));

    let err = select([&p.id], |s| {
        s.from(&p.table);
        s.order_by(Vec::<SortSpec>::new());
    })
    .unwrap_err();
    assert!(err.is_invalid_sql());
}

#[test]
fn select_without_from() {
    let provider = select([expr::constant("1")], |_| {})
        .unwrap()
        .render(RenderingStrategy::Postgres)
        .unwrap();
    assert_eq!(provider.sql(), "select 1");
}
