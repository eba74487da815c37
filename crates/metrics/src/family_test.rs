//! Tests for metric primitives

use super::*;

#[test]
fn test_counter_increments() {
    let counter = Counter::new("things");
    assert_eq!(counter.get(), 0);
    counter.inc();
    counter.inc();
    assert_eq!(counter.get(), 2);
}

#[test]
fn test_gauge_holds_latest_value() {
    let gauge = Gauge::new("level");
    gauge.set(7);
    assert_eq!(gauge.get(), 7);
    gauge.set(3);
    assert_eq!(gauge.get(), 3);
}

#[test]
fn test_counter_vec_separates_label_sets() {
    let vec = CounterVec::new("records", &["kind", "name"]);
    vec.inc(&["flow", "a"]);
    vec.inc(&["flow", "a"]);
    vec.add(&["clusterflow", "b"], 5);

    assert_eq!(vec.get(&["flow", "a"]), 2);
    assert_eq!(vec.get(&["clusterflow", "b"]), 5);
    assert_eq!(vec.get(&["flow", "b"]), 0);
}

#[test]
fn test_counter_render_includes_type_line() {
    let counter = Counter::new("healthchecks");
    counter.inc();
    let mut out = String::new();
    counter.render("log_socket", &mut out);
    assert!(out.contains("# TYPE log_socket_healthchecks counter"));
    assert!(out.contains("log_socket_healthchecks 1"));
}

#[test]
fn test_counter_vec_render_sorted_and_labelled() {
    let vec = CounterVec::new("records", &["kind", "name"]);
    vec.inc(&["flow", "b"]);
    vec.add(&["flow", "a"], 3);

    let mut out = String::new();
    vec.render("log_socket", &mut out);

    let a = out.find(r#"log_socket_records{kind="flow",name="a"} 3"#).unwrap();
    let b = out.find(r#"log_socket_records{kind="flow",name="b"} 1"#).unwrap();
    assert!(a < b, "cells render in sorted label order:\n{out}");
}

#[test]
fn test_label_values_are_escaped() {
    let vec = CounterVec::new("records", &["user"]);
    vec.inc(&["sa\"quote\\slash"]);
    let mut out = String::new();
    vec.render("log_socket", &mut out);
    assert!(out.contains(r#"user="sa\"quote\\slash""#), "{out}");
}
