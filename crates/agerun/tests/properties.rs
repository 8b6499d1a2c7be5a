//! The six testable properties named for the language core: heap accounting,
//! dotted map access, referential transparency of memory-free expressions,
//! the parse/build round trip, segment-wise path prefixing, and 1-based
//! method line counting.

#[path = "support/mod.rs"]
mod support;

use agerun::{ExprAst, ExprParser, Frame, HeapStats, Path, Value};
use pretty_assertions::assert_eq;
use support::run;

// =============================================================================
// 1. No leaks across a full construct/destroy cycle.
// =============================================================================

#[test]
fn property_1_no_leaks_for_any_constructor_destructor_sequence() {
    let before = HeapStats::snapshot();
    let mut m = Value::map();
    m.set_map_path("a", Value::integer(1)).unwrap();
    m.set_map_path("b", Value::string("x")).unwrap();
    let mut list = Value::list();
    list.list_push(Value::double(1.5)).unwrap();
    m.set_map_path("c", list).unwrap();
    m.destroy().unwrap();
    let after = HeapStats::snapshot();
    assert!(before.diff(&after).is_empty(), "{}", before.diff(&after));
}

// =============================================================================
// 2. Flat set/get round-trips; dotted set requires an existing parent map and
//    fails without mutating on a missing interior segment.
// =============================================================================

#[test]
fn property_2_flat_key_round_trips() {
    let mut m = Value::map();
    m.set_map_path("k", Value::integer(7)).unwrap();
    assert_eq!(m.get_map_path("k").unwrap().as_int(), 7);
}

#[test]
fn property_2_dotted_set_fails_without_mutating_when_parent_is_missing() {
    let mut m = Value::map();
    assert!(m.set_map_path("a.b", Value::integer(1)).is_err());
    assert!(m.get_map_path("a").is_none());
    assert!(m.get_map_path("a.b").is_none());
}

#[test]
fn property_2_dotted_set_succeeds_once_the_parent_map_exists() {
    let mut m = Value::map();
    m.set_map_path("a", Value::map()).unwrap();
    m.set_map_path("a.b", Value::integer(9)).unwrap();
    assert_eq!(m.get_map_path("a.b").unwrap().as_int(), 9);
}

// =============================================================================
// 3. An expression with no memory access evaluates the same regardless of
//    which frame it is evaluated against.
// =============================================================================

#[test]
fn property_3_memory_free_expression_is_referentially_transparent() {
    let expr: ExprAst = ExprParser::new("(1 + 2) * 3").parse_expression().unwrap();

    let mut memory_a = Value::map();
    memory_a.set_map_path("x", Value::integer(100)).unwrap();
    let context_a = Value::map();
    let message_a = Value::integer(1);
    let frame_a = Frame::new(&mut memory_a, &context_a, &message_a);

    let mut memory_b = Value::map();
    let context_b = Value::map();
    let message_b = Value::integer(999);
    let frame_b = Frame::new(&mut memory_b, &context_b, &message_b);

    let result_a = agerun::eval_expr(&expr, &frame_a).unwrap();
    let result_b = agerun::eval_expr(&expr, &frame_b).unwrap();
    assert_eq!(result_a, result_b);
    assert_eq!(result_a.as_int(), 9);
}

// =============================================================================
// 4. parse(T, build(T, m)) == m for scalar-only maps whose keys don't appear
//    in the template's literal text.
// =============================================================================

#[test]
fn property_4_parse_build_round_trip_for_a_scalar_only_map() {
    let template = "name={name}, age={age}";

    let mut build_memory = Value::map();
    let mut values = Value::map();
    values.set_map_path("name", Value::string("Ada")).unwrap();
    values.set_map_path("age", Value::integer(36)).unwrap();
    build_memory.set_map_path("v", values).unwrap();
    run(
        &format!("memory.out := build(\"{template}\", memory.v)"),
        &mut build_memory,
    )
    .unwrap();
    let built = build_memory.get_map_path("out").unwrap().as_str().unwrap().to_string();
    assert_eq!(built, "name=Ada, age=36");

    let mut parse_memory = Value::map();
    run(
        &format!("memory.out := parse(\"{template}\", \"{built}\")"),
        &mut parse_memory,
    )
    .unwrap();
    let parsed = parse_memory.get_map_path("out").unwrap();
    assert_eq!(parsed.get_map_path("name").unwrap().as_str(), Some("Ada"));
    assert_eq!(parsed.get_map_path("age").unwrap().as_int(), 36);
}

// =============================================================================
// 5. `starts_with` is segment-wise, not a byte prefix test.
// =============================================================================

#[test]
fn property_5_starts_with_is_segment_wise() {
    assert!(!Path::new_variable("memoryx").starts_with("memory"));
    assert!(Path::new_variable("memory.x").starts_with("memory"));
}

// =============================================================================
// 6. Method parser line counting treats \n, \r, and \r\n each as one
//    separator, counted 1-based.
// =============================================================================

#[test]
fn property_6_error_line_counts_crlf_and_bare_cr_as_one_separator_each() {
    let err = agerun::parse_method("memory.x := 1\r\nexit\rmemory.z := 3\n").unwrap_err();
    assert_eq!(err.0, 2);
}
