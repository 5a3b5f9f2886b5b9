//! Integration tests for the query builders.
//!
//! Tests the SQL generated for each statement kind as model code would build it.

#![allow(missing_docs)]

mod common;

use common::{FirstOne, Reading, SecondTwo, assert_sql_contains};
use webapp_model::{
    DataType, DeleteBuilder, Filter, InsertBuilder, Join, ModelError, OrderSpec, SelectBuilder,
    UpdateBuilder, UpsertBuilder, params,
};

// SELECT

#[test]
fn select_without_alias() {
    let query = SelectBuilder::<Reading>::new().build().unwrap();

    assert_sql_contains(&query.sql, &["SELECT readings.sensor, readings.value", "FROM readings"]);
    assert!(!query.sql.contains(" AS "));
    assert!(query.params.is_empty());
}

#[test]
fn select_qualifies_with_alias() {
    let query = SelectBuilder::<FirstOne>::new()
        .r#where(Filter::eq("name", "ada"))
        .r#where(Filter::gte("score", 10))
        .order_by("name")
        .order_by_desc("id")
        .limit(10, 5)
        .build()
        .unwrap();

    assert_sql_contains(&query.sql, &[
        "SELECT fo.id, fo.name, fo.score",
        "FROM first_one AS fo",
        "WHERE ((fo.name) = ($1)) AND ((fo.score) >= ($2))",
        "ORDER BY fo.name ASC, fo.id DESC",
        "LIMIT $3",
        "OFFSET $4",
    ]);
    assert_eq!(query.params, vec![
        DataType::Str(Some("ada".to_string())),
        DataType::Int32(Some(10)),
        DataType::Uint64(Some(10)),
        DataType::Uint64(Some(5)),
    ]);
}

#[test]
fn select_paginates_from_one() {
    let query = SelectBuilder::<FirstOne>::new().paginate(4, 50).build().unwrap();

    assert_sql_contains(&query.sql, &["LIMIT $1", "OFFSET $2"]);
    assert_eq!(query.params, vec![DataType::Uint64(Some(50)), DataType::Uint64(Some(150))]);
}

#[test]
fn select_order_on_joined_table() {
    let query = SelectBuilder::<FirstOne>::new()
        .join(Join::left("second_two", Filter::col_eq("fo", "name", "st", "code")).alias("st"))
        .order(OrderSpec::parse("st.qty DESC").unwrap())
        .build()
        .unwrap();

    assert_sql_contains(&query.sql, &[
        "FROM first_one AS fo",
        "LEFT JOIN second_two AS st ON (fo.name) = (st.code)",
        "ORDER BY st.qty DESC",
    ]);
}

#[test]
fn select_join_kinds() {
    let on = || Filter::col_eq("readings", "sensor", "sensors", "id");
    let query = SelectBuilder::<Reading>::new()
        .join(Join::inner("sensors", on()))
        .join(Join::right("sensors", on()).alias("s2"))
        .join(Join::full("sensors", on()).alias("s3"))
        .build()
        .unwrap();

    assert_sql_contains(&query.sql, &[
        "FROM readings",
        "INNER JOIN sensors ON",
        "RIGHT JOIN sensors AS s2",
        "FULL OUTER JOIN sensors AS s3",
    ]);
}

#[test]
fn join_condition_uses_model_qualifier() {
    let query = SelectBuilder::<FirstOne>::new()
        .join(Join::inner("tags", Filter::eq("active", true)))
        .build()
        .unwrap();

    // unqualified columns in ON resolve against the selecting model
    assert_sql_contains(&query.sql, &["INNER JOIN tags ON (fo.active) = ($1)"]);
}

// filters

#[test]
fn filter_combinators() {
    let query = SelectBuilder::<FirstOne>::new()
        .r#where(Filter::Or(vec![
            Filter::And(vec![Filter::eq("name", "ada"), Filter::gt("score", 10)]),
            Filter::Not(Box::new(Filter::lt("id", 5))),
        ]))
        .build()
        .unwrap();

    assert_sql_contains(&query.sql, &["WHERE", "AND", "OR", "NOT"]);
    assert_eq!(query.params.len(), 3);
    assert_eq!(query.params[2], DataType::Int32(Some(5)));
}

#[test]
fn filter_ranges_and_patterns() {
    let query = SelectBuilder::<FirstOne>::new()
        .r#where(Filter::between("score", 1, 100))
        .r#where(Filter::like("name", "a%"))
        .r#where(Filter::ne("id", 0))
        .r#where(Filter::lte("id", 1000))
        .build()
        .unwrap();

    assert_sql_contains(&query.sql, &[
        "fo.score", "BETWEEN", "$1", "AND", "$2", "fo.name", "LIKE", "<>", "<=",
    ]);
    assert_eq!(query.params.len(), 5);
    assert!(matches!(&query.params[2], DataType::Str(Some(s)) if s == "a%"));
}

#[test]
fn filter_sets_and_nulls() {
    let query = SelectBuilder::<FirstOne>::new()
        .r#where(Filter::r#in("id", [1, 2, 3]))
        .r#where(Filter::not_in("name", ["x", "y"]))
        .r#where(Filter::is_null("score"))
        .r#where(Filter::table_eq("st", "code", "a"))
        .build()
        .unwrap();

    assert_sql_contains(&query.sql, &[
        "fo.id",
        "IN",
        "fo.name",
        "NOT IN",
        "fo.score",
        "IS (NULL)",
        "(st.code) = ($6)",
    ]);
    assert_eq!(query.params.len(), 6);
}

#[test]
fn filter_is_not_null() {
    let query = SelectBuilder::<Reading>::new().r#where(Filter::is_not_null("value")).build().unwrap();

    assert_sql_contains(&query.sql, &["WHERE", "readings.value", "IS NOT (NULL)"]);
    assert!(query.params.is_empty());
}

#[test]
fn filter_from_params() {
    let filter = Filter::from_params(&params! { "sensor" => "t1", "value" => [1.5, 2.5] }).unwrap();
    let query = SelectBuilder::<Reading>::new().r#where(filter).build().unwrap();

    assert_sql_contains(&query.sql, &["(readings.sensor) = ($1)", "readings.value", "IN"]);
    assert_eq!(query.params[1], DataType::Double(Some(1.5)));
}

// INSERT

#[test]
fn insert_rows() {
    let first = FirstOne {
        id: 1,
        name: "ada".to_string(),
        score: Some(3),
    };
    let second = FirstOne {
        id: 2,
        name: "bob".to_string(),
        score: None,
    };

    let query = InsertBuilder::<FirstOne>::new(&["name", "score", "name"])
        .unwrap()
        .rows([&first, &second])
        .build()
        .unwrap();

    // duplicate columns are written once
    assert_sql_contains(&query.sql, &["INSERT INTO first_one (name, score) VALUES ($1, $2), ($3, $4)"]);
    assert_eq!(query.params, vec![
        DataType::Str(Some("ada".to_string())),
        DataType::Int32(Some(3)),
        DataType::Str(Some("bob".to_string())),
        DataType::Int32(None),
    ]);
}

#[test]
fn insert_requires_rows_and_columns() {
    InsertBuilder::<FirstOne>::new(&["name"]).unwrap().build().unwrap_err();
    InsertBuilder::<FirstOne>::new(&[]).unwrap().row(&FirstOne::default()).build().unwrap_err();
}

#[test]
fn insert_unknown_column() {
    let Err(ModelError::UnknownColumn { column, .. }) = InsertBuilder::<Reading>::new(&["temp"])
    else {
        panic!("expected UnknownColumn");
    };
    assert_eq!(column, "temp");
}

// UPDATE

#[test]
fn update_from_entity() {
    let item = SecondTwo {
        code: "a1".to_string(),
        label: "Alpha".to_string(),
        qty: 4,
    };

    let query = UpdateBuilder::from_entity(&item, &["code"], &["label", "qty"]).unwrap().build().unwrap();

    assert_sql_contains(&query.sql, &[
        "UPDATE second_two",
        "SET label = $1, qty = $2",
        "WHERE (second_two.code) = ($3)",
    ]);
    assert_eq!(query.params[2], DataType::Str(Some("a1".to_string())));
}

#[test]
fn update_composite_keys() {
    let reading = Reading {
        sensor: "t1".to_string(),
        value: 2.0,
    };

    let query = UpdateBuilder::from_entity(&reading, &["sensor", "value"], &["value"])
        .unwrap()
        .build()
        .unwrap();

    assert_sql_contains(&query.sql, &[
        "UPDATE readings SET value = $1",
        "WHERE ((readings.sensor) = ($2)) AND ((readings.value) = ($3))",
    ]);
}

#[test]
fn update_manual() {
    let query = UpdateBuilder::<FirstOne>::new()
        .set("score", 0)
        .r#where(Filter::is_null("score"))
        .build()
        .unwrap();

    assert_sql_contains(&query.sql, &["UPDATE first_one", "SET score = $1", "WHERE", "IS (NULL)"]);
}

#[test]
fn update_null_key_matches_is_null() {
    let item = FirstOne {
        id: 3,
        name: "ada".to_string(),
        score: None,
    };

    let query = UpdateBuilder::from_entity(&item, &["score"], &["name"]).unwrap().build().unwrap();

    assert_sql_contains(&query.sql, &[
        "UPDATE first_one SET name = $1",
        "WHERE",
        "first_one.score",
        "IS (NULL)",
    ]);
    assert!(!query.sql.contains("$2"));
    assert_eq!(query.params, vec![DataType::Str(Some("ada".to_string()))]);
}

#[test]
fn update_requires_keys_and_columns() {
    let Err(ModelError::MissingKeys { table }) =
        UpdateBuilder::from_entity(&Reading::default(), &[], &["value"])
    else {
        panic!("expected MissingKeys");
    };
    assert_eq!(table, "readings");

    UpdateBuilder::<Reading>::new().build().unwrap_err();
}

// UPSERT

#[test]
fn upsert_statements() {
    let item = FirstOne {
        id: 0,
        name: "ada".to_string(),
        score: Some(1),
    };
    let builder = UpsertBuilder::<FirstOne>::new(&["name"], &["score"]).unwrap();

    assert_eq!(builder.keys(), ["name"]);
    assert_eq!(builder.insert_columns(), ["name", "score"]);

    let lookup = builder.lookup(&item).unwrap();
    assert_sql_contains(&lookup.sql, &[
        "SELECT first_one.name FROM first_one",
        "WHERE (first_one.name) = ($1)",
        "LIMIT $2",
    ]);

    let update = builder.update(&item).unwrap().unwrap();
    assert_sql_contains(&update.sql, &["UPDATE first_one SET score = $1 WHERE (first_one.name) = ($2)"]);

    let insert = builder.insert(&item).unwrap();
    assert_sql_contains(&insert.sql, &["INSERT INTO first_one (name, score) VALUES ($1, $2)"]);
}

#[test]
fn upsert_on_primary_key_writes_it() {
    let builder = UpsertBuilder::<FirstOne>::new(&["id"], &[]).unwrap();

    assert_eq!(builder.insert_columns(), ["id", "name", "score"]);
    assert!(builder.update(&FirstOne::default()).unwrap().is_none());
}

#[test]
fn upsert_writes_natural_primary_key() {
    let builder = UpsertBuilder::<SecondTwo>::new(&["label"], &["qty"]).unwrap();

    assert_eq!(builder.insert_columns(), ["code", "label", "qty"]);
}

#[test]
fn upsert_lookup_matches_null_keys() {
    let builder = UpsertBuilder::<FirstOne>::new(&["score"], &["name"]).unwrap();
    let lookup = builder.lookup(&FirstOne::default()).unwrap();

    assert_sql_contains(&lookup.sql, &["WHERE", "first_one.score", "IS (NULL)", "LIMIT $1"]);
}

// DELETE

#[test]
fn delete_from_params() {
    let query = DeleteBuilder::<SecondTwo>::from_params(&params! { "code" => ["a", "b"] })
        .unwrap()
        .build()
        .unwrap();

    assert_sql_contains(&query.sql, &["DELETE FROM second_two", "WHERE", "second_two.code", "IN", "$2"]);
    assert_eq!(query.params.len(), 2);
}

#[test]
fn delete_all() {
    let builder = DeleteBuilder::<SecondTwo>::from_params(&params! {}).unwrap();
    assert!(builder.is_unfiltered());

    let query = builder.build().unwrap();
    assert_sql_contains(&query.sql, &["DELETE FROM second_two"]);
    assert!(!query.sql.contains("WHERE"));
}

#[test]
fn delete_manual() {
    let query = DeleteBuilder::<FirstOne>::new().r#where(Filter::lt("score", 0)).build().unwrap();

    assert_sql_contains(&query.sql, &["DELETE FROM first_one", "WHERE (first_one.score) < ($1)"]);
}
