//! Sample people shown by the demo.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use tablestate::value::compare_values;
use tablestate::{Column, Record, TableRow, Value};

const PEOPLE: &[(i64, &str, &str, &str, i64, f64)] = &[
    (1, "Ada Lovelace", "ada@example.org", "London", 36, 91.5),
    (2, "Alan Turing", "alan@example.org", "Wilmslow", 41, 88.0),
    (3, "Grace Hopper", "grace@example.org", "Arlington", 85, 95.25),
    (4, "Edsger Dijkstra", "edsger@example.org", "Nuenen", 72, 79.0),
    (5, "Barbara Liskov", "barbara@example.org", "Cambridge", 84, 97.5),
    (6, "Donald Knuth", "don@example.org", "Stanford", 86, 99.0),
    (7, "Frances Allen", "fran@example.org", "Schenectady", 88, 84.75),
    (8, "Ken Thompson", "ken@example.org", "Berkeley", 81, 82.0),
    (9, "Margaret Hamilton", "margaret@example.org", "Boston", 88, 93.0),
    (10, "John Backus", "john@example.org", "Ashland", 82, 76.5),
    (11, "Radia Perlman", "radia@example.org", "Portsmouth", 73, 90.0),
    (12, "Niklaus Wirth", "niklaus@example.org", "Zürich", 89, 87.25),
    (13, "Leslie Lamport", "leslie@example.org", "Palo Alto", 83, 94.0),
    (14, "Sophie Wilson", "sophie@example.org", "Cambridge", 67, 86.5),
    (15, "Tony Hoare", "tony@example.org", "Oxford", 90, 89.0),
    (16, "Hedy Lamarr", "hedy@example.org", "Vienna", 85, 80.25),
];

pub fn rows() -> Vec<Record> {
    PEOPLE
        .iter()
        .map(|&(id, name, email, city, age, score)| {
            let mut address = BTreeMap::new();
            address.insert("city".to_string(), Value::from(city));
            let joined = Utc
                .with_ymd_and_hms(2015 + (id % 9) as i32, 1 + (id % 12) as u32, 1 + id as u32, 9, 0, 0)
                .single()
                .map(Value::from)
                .unwrap_or(Value::Null);
            Record::new()
                .set("id", id)
                .set("name", name)
                .set("email", email)
                .set("address", address)
                .set("age", age)
                .set("score", score)
                .set("joined", joined)
        })
        .collect()
}

/// Rows in their natural order, for when a manual sort is cleared.
pub fn by_id(rows: &[Record]) -> Vec<Record> {
    let mut rows = rows.to_vec();
    rows.sort_by(|a, b| field_order(a, b, "id"));
    rows
}

fn field_order(a: &Record, b: &Record, field: &str) -> Ordering {
    compare_values(
        &a.field(field).unwrap_or_default(),
        &b.field(field).unwrap_or_default(),
    )
}

pub fn columns() -> Vec<Column<Record>> {
    vec![
        Column::new("id", "ID").sortable(),
        Column::new("name", "Name").sortable().filterable(),
        Column::new("email", "Email").filterable(),
        Column::new("address.city", "City")
            .sortable()
            .filterable(),
        Column::new("age", "Age").sortable(),
        // Sorted by the app through the manual sort callback.
        Column::new("score", "Score")
            .sortable()
            .sort_function(|a: &Record, b: &Record| field_order(a, b, "score"))
            .formatter(|value, _| match value.as_f64() {
                Some(score) => format!("{:.1}", score),
                None => String::new(),
            }),
        Column::new("joined", "Joined")
            .sortable()
            .formatter(|value, _| match value {
                Value::DateTime(dt) => dt.format("%Y-%m-%d").to_string(),
                other => other.to_text(),
            }),
    ]
}
