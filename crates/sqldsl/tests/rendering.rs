//! End-to-end rendering scenarios through the public API.

use sqldsl::case_expr::searched_case;
use sqldsl::column::{count_all, max};
use sqldsl::criteria::condition;
use sqldsl::prelude::*;
use sqldsl::select::count as count_column;
use sqldsl::{ParameterMap, columns};

struct Animals {
    table: SqlTable,
    id: SqlColumn<i32>,
    name: SqlColumn<String>,
    brain_weight: SqlColumn<f64>,
    body_weight: SqlColumn<f64>,
}

fn animals() -> Animals {
    let table = SqlTable::new("AnimalData");
    Animals {
        id: table.column("id"),
        name: table.column("animal_name"),
        brain_weight: table.column("brain_weight"),
        body_weight: table.column("body_weight"),
        table,
    }
}

struct Shop {
    users: SqlTable,
    orders: SqlTable,
    user_id: SqlColumn<i64>,
    user_name: SqlColumn<String>,
    order_user: SqlColumn<i64>,
    order_total: SqlColumn<i32>,
    order_status: SqlColumn<String>,
}

fn shop() -> Shop {
    let users = SqlTable::new("users");
    let orders = SqlTable::new("orders");
    Shop {
        user_id: users.column("id"),
        user_name: users.column("name"),
        order_user: orders.column("user_id"),
        order_total: orders.column("total"),
        order_status: orders.column("status"),
        users,
        orders,
    }
}

/// Optional search form fields.
#[derive(Default)]
struct Search {
    name: Option<&'static str>,
    min_id: Option<i32>,
    max_id: Option<i32>,
}

fn search_model(a: &Animals, search: &Search) -> DslResult<sqldsl::select::SelectModel> {
    select(columns![a.id, a.name], |s| {
        s.from(&a.table);
        s.where_(|w| {
            w.col(&a.name).is_like_when_present(search.name);
            w.and(|c| {
                c.col(&a.id).is_greater_than_or_equal_to_when_present(search.min_id);
            });
            w.and(|c| {
                c.col(&a.id).is_less_than_or_equal_to_when_present(search.max_id);
            });
        });
        s.configure_statement(|c| {
            c.set_non_rendering_where_clause_allowed(true);
        });
        s.order_by([a.id.asc()]);
    })
}

#[test]
fn optional_search_filters() {
    let a = animals();

    let full = Search {
        name: Some("%fox%"),
        min_id: Some(10),
        max_id: Some(20),
    };
    let provider = search_model(&a, &full)
        .unwrap()
        .render(RenderingStrategy::SpringNamedParameter)
        .unwrap();
    assert_eq!(
        provider.sql(),
        "select id, animal_name from AnimalData where animal_name like :p1 and id >= :p2 and id <= :p3 order by id"
    );

    let partial = Search {
        max_id: Some(20),
        ..Search::default()
    };
    let provider = search_model(&a, &partial)
        .unwrap()
        .render(RenderingStrategy::SpringNamedParameter)
        .unwrap();
    assert_eq!(
        provider.sql(),
        "select id, animal_name from AnimalData where id <= :p1 order by id"
    );
    assert_eq!(provider.parameters().get("p1"), Some(&Value::Int(20)));

    let provider = search_model(&a, &Search::default())
        .unwrap()
        .render(RenderingStrategy::SpringNamedParameter)
        .unwrap();
    assert_eq!(provider.sql(), "select id, animal_name from AnimalData order by id");
    assert!(provider.parameters().is_empty());
}

#[test]
fn one_model_every_strategy() {
    let a = animals();
    let model = select(columns![a.id], |s| {
        s.from(&a.table);
        s.where_(|w| {
            w.col(&a.id).is_in([1, 5, 7]);
            w.or(|o| {
                o.col(&a.name).is_equal_to("Moose");
            });
        });
    })
    .unwrap();

    let cases = [
        (
            RenderingStrategy::MyBatis3,
            "select id from AnimalData where id in (#{parameters.p1},#{parameters.p2},#{parameters.p3}) or animal_name = #{parameters.p4}",
            ["p1", "p2", "p3", "p4"],
        ),
        (
            RenderingStrategy::SpringNamedParameter,
            "select id from AnimalData where id in (:p1,:p2,:p3) or animal_name = :p4",
            ["p1", "p2", "p3", "p4"],
        ),
        (
            RenderingStrategy::Postgres,
            "select id from AnimalData where id in ($1,$2,$3) or animal_name = $4",
            ["$1", "$2", "$3", "$4"],
        ),
        (
            RenderingStrategy::RawJdbc,
            "select id from AnimalData where id in (?,?,?) or animal_name = ?",
            ["1", "2", "3", "4"],
        ),
    ];

    for (strategy, sql, keys) in cases {
        let provider = model.render(strategy).unwrap();
        assert_eq!(provider.sql(), sql, "{strategy}");
        assert_eq!(provider.parameters().keys().collect::<Vec<_>>(), keys, "{strategy}");
        assert_eq!(provider.strategy(), strategy);
    }
}

#[test]
fn join_group_and_subquery_share_one_sequence() {
    let s = shop();
    let provider = select(columns![s.user_name, count_all().as_("order_count")], |q| {
        q.from_as(&s.users, "u");
        q.join_as(&s.orders, "o", |on| {
            on.col(&s.user_id).is_equal_to_column(&s.order_user);
            on.and(|a| {
                a.col(&s.order_status).is_not_equal_to("cancelled");
            });
        });
        q.where_(|w| {
            w.group(|g| {
                g.col(&s.order_total).is_greater_than(100);
                g.or(|o| {
                    o.col(&s.user_name).is_like("A%");
                });
            });
            w.and(|a| {
                a.col(&s.user_id).is_not_in_subquery(|sub| {
                    sub.select([&s.order_user], |inner| {
                        inner.from(&s.orders);
                        inner.where_(|w| {
                            w.col(&s.order_status).is_equal_to("fraud");
                        });
                    });
                });
            });
        });
        q.group_by([&s.user_name]);
        q.having(|h| {
            h.expr(count_all()).is_greater_than(2);
        });
        q.limit(10);
    })
    .unwrap()
    .render(RenderingStrategy::Postgres)
    .unwrap();

    assert_eq!(
        provider.sql(),
        "select u.name, count(*) as order_count from users u join orders o on u.id = o.user_id and o.status <> $1 \
         where (o.total > $2 or u.name like $3) and u.id not in (select user_id from orders where status = $4) \
         group by u.name having count(*) > $5 limit $6"
    );
    assert_eq!(provider.parameters().len(), 6);
    assert_eq!(provider.parameters().get("$4"), Some(&Value::from("fraud")));
    assert_eq!(provider.parameters().get("$6"), Some(&Value::BigInt(10)));
}

#[test]
fn searched_case_in_select_list() {
    let a = animals();
    let kind = searched_case(|c| {
        c.when(|w| {
            w.col(&a.name).is_in(["Artic fox", "Red fox"]);
            w.then("Fox");
        });
        c.when(|w| {
            w.col(&a.brain_weight).is_greater_than(100.0);
            w.then("Big brain");
        });
        c.else_("Other");
    })
    .unwrap()
    .as_("kind");

    let provider = select(columns![a.id, kind], |s| {
        s.from(&a.table);
        s.where_(|w| {
            w.col(&a.body_weight).is_between(1.0).and(500.0);
        });
    })
    .unwrap()
    .render(RenderingStrategy::SpringNamedParameter)
    .unwrap();

    assert_eq!(
        provider.sql(),
        "select id, case when animal_name in (:p1,:p2) then 'Fox' when brain_weight > :p3 then 'Big brain' else 'Other' end as kind \
         from AnimalData where body_weight between :p4 and :p5"
    );
}

#[test]
fn count_variants() {
    let a = animals();
    let total = count_from(&a.table, |s| {
        s.where_(|w| {
            w.condition(&a.id, condition::is_less_than(50));
        });
    })
    .unwrap()
    .render(RenderingStrategy::MyBatis3)
    .unwrap();
    assert_eq!(
        total.sql(),
        "select count(*) from AnimalData where id < #{parameters.p1}"
    );

    let names = count_column(&a.name, |s| {
        s.from(&a.table);
    })
    .unwrap()
    .render(RenderingStrategy::MyBatis3)
    .unwrap();
    assert_eq!(names.sql(), "select count(animal_name) from AnimalData");
}

#[test]
fn window_functions_in_select_list() {
    let o = shop();
    let provider = select(
        columns![
            o.order_user,
            o.order_total,
            sum(&o.order_total).over(WindowModel::new()).as_("grand_total"),
            sum(&o.order_total)
                .over(partition_by([&o.order_user]))
                .as_("user_total"),
            row_number()
                .over(partition_by([&o.order_user]).order_by([o.order_total.desc()]))
                .as_("position"),
        ],
        |s| {
            s.from(&o.orders);
            s.where_(|w| {
                w.col(&o.order_status).is_equal_to("paid");
            });
            s.order_by([o.order_user.asc()]);
        },
    )
    .unwrap()
    .render(RenderingStrategy::Postgres)
    .unwrap();

    assert_eq!(
        provider.sql(),
        "select user_id, total, sum(total) over() as grand_total, \
         sum(total) over(partition by user_id) as user_total, \
         row_number() over(partition by user_id order by total DESC) as position \
         from orders where status = $1 order by user_id"
    );
    assert_eq!(provider.parameters().len(), 1);
}

#[test]
fn update_with_subquery_and_delete_with_limit() {
    let a = animals();
    let updated = update(&a.table, |u| {
        u.set(&a.brain_weight).equal_to(1.5);
        u.set(&a.id).equal_to_subquery(|q| {
            q.select([max(&a.id)], |s| {
                s.from(&a.table);
            });
        });
        u.where_(|w| {
            w.col(&a.name).is_equal_to("Lesser short-tailed shrew");
        });
    })
    .unwrap()
    .render(RenderingStrategy::SpringNamedParameter)
    .unwrap();
    assert_eq!(
        updated.sql(),
        "update AnimalData set brain_weight = :p1, id = (select max(id) from AnimalData) where animal_name = :p2"
    );

    let deleted = delete_from(&a.table, |d| {
        d.where_(|w| {
            w.col(&a.body_weight).is_greater_than(100.0);
        });
        d.order_by([a.id.desc()]);
        d.limit(3);
    })
    .unwrap()
    .render(RenderingStrategy::SpringNamedParameter)
    .unwrap();
    assert_eq!(
        deleted.sql(),
        "delete from AnimalData where body_weight > :p1 order by id DESC limit :p2"
    );
}

#[test]
fn reusable_where_clause() {
    let a = animals();
    let small = |w: &mut CriteriaCollector| {
        w.col(&a.body_weight).is_less_than(10.0);
    };

    let select_sql = select(columns![a.id], |s| {
        s.from(&a.table);
        s.where_(small);
    })
    .unwrap()
    .render(RenderingStrategy::SpringNamedParameter)
    .unwrap();
    let delete_sql = delete_from(&a.table, |d| {
        d.where_(and_then(small, |w| {
            w.and(|c| {
                c.col(&a.name).is_not_null();
            });
        }));
    })
    .unwrap()
    .render(RenderingStrategy::SpringNamedParameter)
    .unwrap();

    assert_eq!(select_sql.sql(), "select id from AnimalData where body_weight < :p1");
    assert_eq!(
        delete_sql.sql(),
        "delete from AnimalData where body_weight < :p1 and animal_name is not null"
    );
}

#[test]
fn providers_serialize_with_their_parameters() {
    let a = animals();
    let provider = select(columns![a.id], |s| {
        s.from(&a.table);
        s.where_(|w| {
            w.col(&a.name).is_equal_to("Owl");
        });
    })
    .unwrap()
    .render(RenderingStrategy::SpringNamedParameter)
    .unwrap();

    let json = serde_json::to_value(&provider).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "select_statement": "select id from AnimalData where animal_name = :p1",
            "parameters": { "p1": "Owl" }
        })
    );

    let (sql, params): (String, ParameterMap) = provider.into_parts();
    assert!(sql.ends_with(":p1"));
    assert_eq!(params.len(), 1);
}

#[test]
fn misuse_is_reported_as_invalid_sql() {
    let a = animals();

    let twice = select(columns![a.id], |s| {
        s.from(&a.table);
        s.where_(|w| {
            w.col(&a.id).is_equal_to(1);
        });
        s.where_(|w| {
            w.col(&a.id).is_equal_to(2);
        });
    });
    assert!(twice.unwrap_err().is_invalid_sql());

    let empty_set = update(&a.table, |u| {
        u.set(&a.name).equal_to_when_present(None::<String>);
    })
    .and_then(|m| m.render(RenderingStrategy::MyBatis3));
    assert!(empty_set.unwrap_err().is_invalid_sql());

    let dropped_where = delete_from(&a.table, |d| {
        d.where_(|w| {
            w.col(&a.id).is_equal_to_when_present(None::<i32>);
        });
    })
    .and_then(|m| m.render(RenderingStrategy::MyBatis3));
    assert!(matches!(dropped_where, Err(DslError::NonRenderingWhereClause)));
}
