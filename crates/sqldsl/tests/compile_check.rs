//! Compile-only checks for the execution adapters.
//!
//! These functions are never called. They verify that the adapters accept
//! plain clients, transactions and pooled clients.

#![allow(dead_code)]

use serde::Serialize;
use sqldsl::ParameterMap;
use sqldsl::prelude::*;
use sqldsl::template::KeyHolder;
use tokio_postgres::Row;

struct Person {
    table: SqlTable,
    id: SqlColumn<i32>,
    first_name: SqlColumn<String>,
}

fn person() -> Person {
    let table = SqlTable::new("person");
    Person {
        id: table.column("id"),
        first_name: table.column("first_name"),
        table,
    }
}

#[derive(Debug, Serialize)]
struct NewPerson {
    id: i32,
    first_name: String,
}

#[derive(Debug)]
struct PersonRow {
    id: i32,
    first_name: String,
}

impl FromRow for PersonRow {
    fn from_row(row: &Row) -> DslResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            first_name: row.try_get_column("first_name")?,
        })
    }
}

// ── ClientExt ───────────────────────────────────────────────────────────────

async fn _client_ext_compiles(client: &tokio_postgres::Client) -> DslResult<()> {
    let p = person();
    let model = select(columns![p.id, p.first_name], |s| {
        s.from(&p.table);
    })?;

    let _rows: Vec<PersonRow> = client.select_list(&model, PersonRow::from_row).await?;
    let _one: Option<String> = client
        .select_one(&model, |row| row.try_get_column("first_name"))
        .await?;
    let _total: i64 = client.count(&count_from(&p.table, |_| {})?).await?;

    let deleted: u64 = client
        .execute_model(&delete_from(&p.table, |d| {
            d.where_(|w| {
                w.col(&p.id).is_equal_to(1);
            });
        })?)
        .await?;
    let _ = deleted;

    let batch = insert_batch(
        vec![NewPerson { id: 1, first_name: "Fred".into() }],
        &p.table,
        |i| {
            i.map(&p.id).to_property("id");
            i.map(&p.first_name).to_property("first_name");
        },
    )?;
    let _counts: Vec<u64> = client.execute_batch(&batch).await?;
    Ok(())
}

async fn _client_ext_in_transaction_compiles(client: &mut tokio_postgres::Client) -> DslResult<()> {
    let p = person();
    let tx = client.transaction().await.map_err(DslError::from_db_error)?;
    tx.execute_model(&update(&p.table, |u| {
        u.set(&p.first_name).equal_to("Barney");
    })?)
    .await?;
    tx.commit().await.map_err(DslError::from_db_error)?;
    Ok(())
}

#[cfg(feature = "pool")]
async fn _client_ext_on_pool_compiles(pool: &deadpool_postgres::Pool) -> DslResult<()> {
    let p = person();
    let client = pool.get().await?;
    let _total = client.count(&count_from(&p.table, |_| {})?).await?;
    Ok(())
}

fn _client_ext_futures_are_send(client: &tokio_postgres::Client) {
    fn assert_send<T: Send>(_: T) {}
    let p = person();
    if let Ok(model) = count_from(&p.table, |_| {}) {
        assert_send(client.count(&model));
    }
}

// ── NamedParameterTemplate ──────────────────────────────────────────────────

async fn _template_compiles(client: &tokio_postgres::Client) -> DslResult<()> {
    let p = person();
    let template = NamedParameterTemplate::new(client);

    let _names: Vec<String> = template
        .select(columns![p.first_name], |s| {
            s.from(&p.table);
            s.where_(|w| {
                w.col(&p.id).is_less_than(10);
            });
        })
        .with_row_mapper(|row| row.try_get_column("first_name"))
        .await?;

    let _typed: Vec<PersonRow> = template
        .select_distinct(columns![p.id, p.first_name], |s| {
            s.from(&p.table);
        })
        .as_type()
        .await?;

    let _single: Option<PersonRow> = template
        .select_single(columns![p.id, p.first_name], |s| {
            s.from(&p.table);
            s.where_(|w| {
                w.col(&p.id).is_equal_to(1);
            });
        })
        .as_type()
        .await?;

    let _count: i64 = template.count_from(&p.table, |_| {}).await?;
    let _updated: u64 = template
        .update_table(&p.table, |u| {
            u.set(&p.first_name).equal_to("Wilma");
        })
        .await?;
    let _inserted: u64 = template
        .insert(&NewPerson { id: 2, first_name: "Betty".into() }, &p.table, |i| {
            i.map(&p.id).to_property("id");
            i.map(&p.first_name).to_property("first_name");
        })
        .await?;

    let mut keys = KeyHolder::new(["id"]);
    template
        .with_key_holder(&mut keys)
        .insert_into(&p.table, |i| {
            i.set(&p.first_name).to_value("Pebbles");
        })
        .await?;
    let _id: i32 = keys.key_as("id")?;

    let mut params = ParameterMap::new();
    params.insert("name", Value::from("Dino"));
    let _rows = template
        .query_named("select id from person where first_name = :name", &params)
        .await?;
    let _deleted = template
        .execute_named("delete from person where first_name = :name", &params)
        .await?;
    Ok(())
}

async fn _template_in_transaction_compiles(client: &mut tokio_postgres::Client) -> DslResult<()> {
    let p = person();
    let tx = client.transaction().await.map_err(DslError::from_db_error)?;
    {
        let template = NamedParameterTemplate::new(&tx);
        template
            .delete_from(&p.table, |d| {
                d.where_(|w| {
                    w.col(&p.id).is_greater_than(100);
                });
            })
            .await?;
    }
    tx.commit().await.map_err(DslError::from_db_error)?;
    Ok(())
}

// ── Mapper ──────────────────────────────────────────────────────────────────

#[test]
fn mapper_functions_hand_over_mybatis_providers() {
    let p = person();
    let sql = sqldsl::mapper::select_one(
        |provider| provider.select_statement().to_string(),
        columns![p.id, p.first_name],
        &p.table,
        |s| {
            s.where_(|w| {
                w.col(&p.id).is_equal_to(1);
            });
        },
    )
    .unwrap();
    assert_eq!(
        sql,
        "select id, first_name from person where id = #{parameters.p1}"
    );
}
