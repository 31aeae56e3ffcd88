use serde_json::{json, Value};

use super::*;
use crate::error::{EvalError, ParseError};

fn compile(expr: &str) -> JsonPath {
    JsonPath::compile("test", expr).unwrap()
}

fn get(expr: &str, doc: &Value) -> Vec<Value> {
    compile(expr).get(doc).unwrap()
}

fn get_err(expr: &str, doc: &Value) -> EvalError {
    compile(expr).get(doc).unwrap_err()
}

fn set(expr: &str, mut doc: Value, change: Value) -> Value {
    compile(expr).set(&mut doc, change).unwrap();
    doc
}

fn set_err(expr: &str, mut doc: Value, change: Value) -> EvalError {
    compile(expr).set(&mut doc, change).unwrap_err()
}

/// Compare as multisets; object key iteration order is not part of the
/// engine's contract, so tests that pass through objects use this.
fn assert_same_items(result: Vec<Value>, expected: Vec<Value>) {
    let mut remaining = result.clone();
    for item in &expected {
        match remaining.iter().position(|r| r == item) {
            Some(at) => {
                remaining.remove(at);
            }
            None => panic!("missing {item} in result {result:?}"),
        }
    }
    assert!(
        remaining.is_empty(),
        "unexpected extras {remaining:?} in result {result:?}"
    );
}

fn items(value: Value) -> Vec<Value> {
    value.as_array().unwrap().clone()
}

#[test]
fn array_slice_basics() {
    let doc = json!(["first", "second", "third", "forth", "fifth"]);
    let cases = [
        ("$[1:3]", json!(["second", "third"])),
        ("$[0:5]", json!(["first", "second", "third", "forth", "fifth"])),
        ("$[1:]", json!(["second", "third", "forth", "fifth"])),
        ("$[:2]", json!(["first", "second"])),
        ("$[:]", json!(["first", "second", "third", "forth", "fifth"])),
        ("$[::]", json!(["first", "second", "third", "forth", "fifth"])),
        ("$[0:1]", json!(["first"])),
        ("$[2:1]", json!([])),
        ("$[0:0]", json!([])),
    ];
    for (expr, expected) in cases {
        assert_eq!(get(expr, &doc), items(expected), "expr {expr}");
    }
}

#[test]
fn array_slice_with_step() {
    let doc = json!(["first", "second", "third", "forth", "fifth"]);
    let cases = [
        ("$[0:3:2]", json!(["first", "third"])),
        // A zero step is coerced to one.
        ("$[0:3:0]", json!(["first", "second", "third"])),
        ("$[0:3:1]", json!(["first", "second", "third"])),
        ("$[0:4:2]", json!(["first", "third"])),
        ("$[1:3:]", json!(["second", "third"])),
        ("$[::2]", json!(["first", "third", "fifth"])),
    ];
    for (expr, expected) in cases {
        assert_eq!(get(expr, &doc), items(expected), "expr {expr}");
    }
}

#[test]
fn array_slice_with_leading_zeros() {
    let doc = json!([
        0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23,
        24, 25
    ]);
    assert_eq!(get("$[010:024:010]", &doc), vec![json!(10), json!(20)]);
}

#[test]
fn array_slice_negative_step() {
    let doc = json!(["first", "second", "third", "forth", "fifth"]);
    let cases = [
        ("$[3:0:-2]", json!(["forth", "second"])),
        ("$[7:3:-1]", json!(["fifth"])),
        ("$[0:3:-2]", json!([])),
        ("$[::-2]", json!(["fifth", "third", "first"])),
        ("$[3::-1]", json!(["forth", "third", "second", "first"])),
        ("$[:2:-1]", json!(["fifth", "forth"])),
    ];
    for (expr, expected) in cases {
        assert_eq!(get(expr, &doc), items(expected), "expr {expr}");
    }
}

#[test]
fn array_slice_negative_bounds() {
    let doc = json!([2, "a", 4, 5, 100, "nice"]);
    let cases = [
        ("$[-4:-5]", json!([])),
        ("$[-4:-3]", json!([4])),
        ("$[-4:1]", json!([])),
        ("$[-4:2]", json!([])),
        ("$[-4:3]", json!([4])),
        ("$[3:-4]", json!([])),
        ("$[3:-3]", json!([])),
        ("$[3:-2]", json!([5])),
    ];
    for (expr, expected) in cases {
        assert_eq!(get(expr, &doc), items(expected), "expr {expr}");
    }

    let doc = json!(["first", "second", "third"]);
    assert_eq!(get("$[-1:]", &doc), vec![json!("third")]);
    assert_eq!(
        get("$[-2:]", &doc),
        vec![json!("second"), json!("third")]
    );
    // A start further back than the array is long clamps to the front.
    assert_eq!(get("$[-4:]", &doc), items(doc.clone()));
}

#[test]
fn array_slice_with_large_numbers() {
    let doc = json!(["first", "second", "third", "forth", "fifth"]);
    assert_eq!(
        get("$[2:113667776004]", &doc),
        vec![json!("third"), json!("forth"), json!("fifth")]
    );
    assert_eq!(
        get("$[2:-113667776004:-1]", &doc),
        vec![json!("third"), json!("second"), json!("first")]
    );
    assert_eq!(
        get("$[-113667776004:2]", &doc),
        vec![json!("first"), json!("second")]
    );
    assert_eq!(
        get("$[113667776004:2:-1]", &doc),
        vec![json!("fifth"), json!("forth")]
    );
}

#[test]
fn array_slice_out_of_range() {
    let doc = json!(["first", "second", "third"]);
    assert_eq!(get("$[7:10]", &doc), Vec::<Value>::new());
    assert_eq!(get("$[1:10]", &doc), vec![json!("second"), json!("third")]);
}

#[test]
fn array_slice_on_object_selects_nothing() {
    let doc = json!({":": 42, "more": "string", "a": 1, "b": 2, "c": 3, "1:3": "nice"});
    let mut path = compile("$[1:3]");
    assert_eq!(path.get(&doc).unwrap(), Vec::<Value>::new());
    assert!(!path.warnings().is_empty());

    assert_eq!(
        get("$[:]", &json!({":": 42, "more": "string"})),
        Vec::<Value>::new()
    );
}

#[test]
fn bracket_notation_with_string_keys() {
    assert_eq!(get("$['key']", &json!({"key": "value"})), vec![json!("value")]);
    assert_eq!(get("$[\"key\"]", &json!({"key": "value"})), vec![json!("value")]);
    assert_eq!(get("$['missing']", &json!({"key": "value"})), Vec::<Value>::new());
}

#[test]
fn bracket_notation_with_empty_string_key() {
    let doc = json!({"": 42, "''": 123, "\"\"": 222});
    assert_eq!(get("$['']", &doc), vec![json!(42)]);
    assert_eq!(get("$[\"\"]", &doc), vec![json!(42)]);
}

#[test]
fn bracket_notation_with_dotted_key() {
    let doc = json!({
        "one": {"key": "value"},
        "two": {"some": "more", "key": "other value"},
        "two.some": "42",
        "two'.'some": "43"
    });
    assert_eq!(get("$['two.some']", &doc), vec![json!("42")]);
    // The scanner honors the quoted runs, the classifier strips only the
    // outermost quotes.
    assert_eq!(get("$['two'.'some']", &doc), vec![json!("43")]);
}

#[test]
fn bracket_notation_with_special_literal_keys() {
    assert_eq!(
        get("$[':']", &json!({":": "value", "another": "entry"})),
        vec![json!("value")]
    );
    assert_eq!(get("$[']']", &json!({"]": 42})), vec![json!(42)]);
    assert_eq!(
        get("$['@']", &json!({"@": "value", "another": "entry"})),
        vec![json!("value")]
    );
    assert_eq!(
        get("$['.']", &json!({".": "value", "another": "entry"})),
        vec![json!("value")]
    );
    assert_eq!(
        get("$['$']", &json!({"$": "value", "another": "entry"})),
        vec![json!("value")]
    );
    assert_eq!(
        get("$[',']", &json!({",": "value", "another": "entry"})),
        vec![json!("value")]
    );
    assert_eq!(
        get("$['.*']", &json!({"key": 42, ".*": 1, "": 10})),
        vec![json!(1)]
    );
    assert_eq!(
        get("$['ni.*']", &json!({"nice": 42, "ni.*": 1, "mice": 100})),
        vec![json!(1)]
    );
}

#[test]
fn bracket_notation_with_wildcard_literal_key() {
    assert_eq!(
        get("$['*']", &json!({"*": "value", "another": "entry"})),
        vec![json!("value")]
    );
    assert_eq!(
        get("$['*']", &json!({"another": "entry"})),
        Vec::<Value>::new()
    );
}

#[test]
fn bracket_notation_with_spaces() {
    let doc = json!({
        " a": 1, "a": 2, " a ": 3, "a ": 4, " 'a' ": 5,
        " 'a": 6, "a' ": 7, " \"a\" ": 8, "\"a\"": 9
    });
    assert_eq!(get("$[ 'a' ]", &doc), vec![json!(2)]);
}

#[test]
fn bracket_notation_with_numbers() {
    let doc = json!(["first", "second", "third", "forth", "fifth"]);
    assert_eq!(get("$[0]", &doc), vec![json!("first")]);
    assert_eq!(get("$[2]", &doc), vec![json!("third")]);
    assert_eq!(get("$[-1]", &json!(["first", "second", "third"])), vec![json!("third")]);

    assert_eq!(get("$[1]", &json!(["one element"])), Vec::<Value>::new());
    assert_eq!(get("$[-2]", &json!(["one element"])), Vec::<Value>::new());
    assert_eq!(get("$[-1]", &json!([])), Vec::<Value>::new());
}

#[test]
fn bracket_notation_with_number_on_object() {
    // Index segments and quoted keys do not cross over.
    assert_eq!(get("$[0]", &json!({"0": "value"})), Vec::<Value>::new());
    assert_eq!(get("$['0']", &json!({"0": "value"})), vec![json!("value")]);
    assert_eq!(get("$[0]", &json!("Hello World")), Vec::<Value>::new());
}

#[test]
fn bracket_notation_with_unspecified_index() {
    // An empty bracket is an unspecified index; it falls back to the head
    // of an array and selects nothing elsewhere.
    assert_eq!(get("$[]", &json!(["a", "b"])), vec![json!("a")]);
    assert_eq!(
        get("$[]", &json!({"": 42, "''": 123})),
        Vec::<Value>::new()
    );
}

#[test]
fn wildcard_on_array() {
    let doc = json!(["string", 42, {"key": "value"}, [0, 1]]);
    assert_eq!(get("$[*]", &doc), items(doc.clone()));
    assert_eq!(get("$.*", &doc), items(doc));
    assert_eq!(get("$[*]", &json!([])), Vec::<Value>::new());
    assert_eq!(get("$[*]", &json!([40, null, 42])), vec![json!(40), json!(null), json!(42)]);
}

#[test]
fn wildcard_on_object() {
    let doc = json!({
        "some": "string",
        "int": 42,
        "object": {"key": "value"},
        "array": [0, 1]
    });
    let expected = vec![json!("string"), json!(42), json!({"key": "value"}), json!([0, 1])];
    assert_same_items(get("$[*]", &doc), expected.clone());
    assert_same_items(get("$.*", &doc), expected);
    assert_eq!(get("$[*]", &json!({})), Vec::<Value>::new());
}

#[test]
fn wildcard_chains() {
    assert_eq!(get("$[0:2][*]", &json!([[1, 2], ["a", "b"], [0, 0]])), vec![
        json!(1),
        json!(2),
        json!("a"),
        json!("b"),
    ]);
    assert_eq!(get("$[*].bar[*]", &json!([{"bar": [42]}])), vec![json!(42)]);
    assert_eq!(get("$.*.bar.*", &json!([{"bar": [42]}])), vec![json!(42)]);
    assert_eq!(
        get("$.*.*", &json!([[1, 2, 3], [4, 5, 6]])),
        vec![json!(1), json!(2), json!(3), json!(4), json!(5), json!(6)]
    );
    assert_eq!(get("$.*[1]", &json!([[1], [2, 3]])), vec![json!(3)]);
}

#[test]
fn dot_notation() {
    assert_eq!(get("$.key", &json!({"key": "value"})), vec![json!("value")]);
    assert_eq!(
        get("$.key", &json!({"key": ["first", "second"]})),
        vec![json!(["first", "second"])]
    );
    assert_eq!(get("$.key", &json!({"key": {}})), vec![json!({})]);
    assert_eq!(get("$.key", &json!({"key": null})), vec![json!(null)]);
    assert_eq!(get("$.missing", &json!({"key": "value"})), Vec::<Value>::new());
    assert_eq!(get(".key", &json!({"key": "value"})), vec![json!("value")]);
    assert_eq!(get("@.a", &json!({"a": 1})), vec![json!(1)]);
}

#[test]
fn dot_notation_on_non_objects_warns_and_skips() {
    let mut path = compile("$.key");
    assert_eq!(path.get(&json!([0, 1])).unwrap(), Vec::<Value>::new());
    assert!(!path.warnings().is_empty());

    assert_eq!(get("$.id", &json!([{"id": 2}])), Vec::<Value>::new());
    assert_eq!(get("$.length", &json!([4, 5, 6])), Vec::<Value>::new());
    assert_eq!(get("$.-1", &json!(["first", "second"])), Vec::<Value>::new());
}

#[test]
fn dot_notation_with_reserved_words() {
    assert_eq!(get("$.in", &json!({"in": "value"})), vec![json!("value")]);
    assert_eq!(get("$.length", &json!({"length": "value"})), vec![json!("value")]);
    assert_eq!(get("$.null", &json!({"null": "value"})), vec![json!("value")]);
    assert_eq!(get("$.true", &json!({"true": "value"})), vec![json!("value")]);
}

#[test]
fn dot_notation_with_unusual_keys() {
    let doc = json!({
        "key": 42,
        "key-": 43,
        "-": 44,
        "dash": 45,
        "-dash": 46,
        "": 47,
        "key-dash": "value",
        "something": "else"
    });
    assert_eq!(get("$.key-dash", &doc), vec![json!("value")]);

    assert_eq!(
        get("$.\"key\"", &json!({"key": "value", "\"key\"": 42})),
        vec![json!(42)]
    );
    assert_eq!(
        get("$.'key'", &json!({"key": "value", "'key'": 42})),
        vec![json!(42)]
    );
    assert_eq!(
        get(
            "$.'some.key'",
            &json!({"some.key": 42, "some": {"key": "value"}, "'some.key'": 43, "'some": {"key'": 0}})
        ),
        vec![json!(0)]
    );
    assert_eq!(get("$.屬性", &json!({"屬性": "value"})), vec![json!("value")]);
    assert_eq!(
        get("$.2", &json!({"a": "first", "2": "second", "b": "third"})),
        vec![json!("second")]
    );
    assert_eq!(get("$.2", &json!(["first", "second", "third"])), Vec::<Value>::new());
}

#[test]
fn dot_notation_with_empty_name() {
    assert_eq!(
        get("$.", &json!({"key": 42, "": 9001, "''": "nice"})),
        vec![json!(9001)]
    );
    // `$` inside a name terminates it, so `$.$` is the empty field again.
    assert_eq!(get("$.$", &json!({"$": "value"})), Vec::<Value>::new());
}

#[test]
fn dot_bracket_notation_reads_as_empty_field_then_bracket() {
    let doc = json!({"key": "value", "other": {"key": [{"key": 42}]}});
    assert_eq!(get("$.['key']", &doc), Vec::<Value>::new());
    assert_eq!(get("$.[\"key\"]", &doc), Vec::<Value>::new());
}

#[test]
fn union_of_indexes() {
    let doc = json!([{"key": "ey"}, {"key": "bee"}, {"key": "see"}]);
    assert_eq!(get("$[0,2].key", &doc), vec![json!("ey"), json!("see")]);
}

#[test]
fn union_of_keys() {
    let doc = json!({
        "one": {"key": "value"},
        "two": {"k": "v"},
        "three": {"some": "more", "key": "other value"}
    });
    assert_eq!(
        get("$['one','three'].key", &doc),
        vec![json!("value"), json!("other value")]
    );
}

#[test]
fn recursive_descent_collects_all_matching_fields() {
    let doc = json!({
        "object": {
            "key": "value",
            "array": [
                {"key": "something"},
                {"key": {"key": "russian dolls"}}
            ]
        },
        "key": "top"
    });
    let expected = vec![
        json!("top"),
        json!("value"),
        json!("something"),
        json!({"key": "russian dolls"}),
        json!("russian dolls"),
    ];
    assert_same_items(get("$..key", &doc), expected.clone());
    // The third dot is consumed as part of the field.
    assert_same_items(get("$...key", &doc), expected);
}

#[test]
fn recursive_descent_after_dot_notation() {
    let doc = json!({
        "store": {
            "book": [
                {"category": "reference", "author": "Nigel Rees", "price": 8.95},
                {"category": "fiction", "author": "Evelyn Waugh", "price": 12.99},
                {"category": "fiction", "author": "Herman Melville", "price": 8.99},
                {"category": "fiction", "author": "J. R. R. Tolkien", "price": 22.99}
            ],
            "bicycle": {"color": "red", "price": 19.95}
        }
    });
    assert_same_items(
        get("$.store..price", &doc),
        vec![json!(8.95), json!(12.99), json!(8.99), json!(22.99), json!(19.95)],
    );
}

#[test]
fn recursive_descent_with_index() {
    let doc = json!([
        "first",
        {
            "key": [
                "first nested",
                {
                    "more": [
                        {"nested": ["deepest", "second"]},
                        ["more", "values"]
                    ]
                }
            ]
        }
    ]);
    assert_same_items(
        get("$..[0]", &doc),
        vec![
            json!("first"),
            json!("first nested"),
            json!({"nested": ["deepest", "second"]}),
            json!("deepest"),
            json!("more"),
        ],
    );

    let doc = json!({
        "k": [{"key": "some value"}, {"key": 42}],
        "kk": [
            [{"key": 100}, {"key": 200}, {"key": 300}],
            [{"key": 400}, {"key": 500}, {"key": 600}]
        ],
        "key": [0, 1]
    });
    assert_same_items(
        get("$..[1].key", &doc),
        vec![json!(42), json!(200), json!(500)],
    );
}

#[test]
fn recursive_descent_with_wildcard() {
    let doc = json!({
        "key": "value",
        "another key": {
            "complex": "string",
            "primitives": [0, 1]
        }
    });
    let expected = vec![
        json!("string"),
        json!("value"),
        json!(0),
        json!(1),
        json!([0, 1]),
        json!({"complex": "string", "primitives": [0, 1]}),
    ];
    assert_same_items(get("$..[*]", &doc), expected.clone());
    assert_same_items(get("$..*", &doc), expected);
}

#[test]
fn recursive_descent_with_wildcard_on_arrays() {
    assert_same_items(
        get("$..*", &json!([40, null, 42])),
        vec![json!(40), json!(null), json!(42)],
    );
}

#[test]
fn recursive_descent_with_wildcard_on_scalar() {
    assert_eq!(get("$..*", &json!(42)), Vec::<Value>::new());
}

#[test]
fn filter_with_comparison() {
    let doc = json!([{"id": 42, "name": "forty-two"}, {"id": 1, "name": "one"}]);
    assert_eq!(get("$[?(@.id==42)].name", &doc), vec![json!("forty-two")]);
    assert_eq!(get("$[?(@.id!=42)].name", &doc), vec![json!("one")]);
    assert_eq!(get("$[?(@.id<42)].name", &doc), vec![json!("one")]);
    assert_eq!(get("$[?(@.id<=1)].name", &doc), vec![json!("one")]);
    assert_eq!(get("$[?(@.id>1)].name", &doc), vec![json!("forty-two")]);
    assert_eq!(get("$[?(@.id>=42)].name", &doc), vec![json!("forty-two")]);
}

#[test]
fn filter_widens_ints_and_floats() {
    let doc = json!([{"price": 8.95}, {"price": 12}, {"price": 22.99}]);
    assert_eq!(
        get("$[?(@.price<9)]", &doc),
        vec![json!({"price": 8.95})]
    );
    assert_eq!(
        get("$[?(@.price==12.0)]", &doc),
        vec![json!({"price": 12})]
    );
}

#[test]
fn filter_existence() {
    let doc = json!({"key": 42, "another": {"key": 1}});
    assert_eq!(get("$[?(@.key)]", &doc), vec![json!({"key": 1})]);

    let doc = json!([{"id": 1}, {"name": "no id"}, {"id": 3}]);
    assert_same_items(
        get("$[?(@.id)]", &doc),
        vec![json!({"id": 1}), json!({"id": 3})],
    );
}

#[test]
fn filter_key_names_may_contain_operators() {
    let doc = json!([{"key": 60}, {"key": 50}, {"key": 10}, {"key": -50}, {"key+50": 100}]);
    assert_eq!(get("$[?(@.key+50==100)]", &doc), vec![json!({"key+50": 100})]);
}

#[test]
fn filter_after_recursive_descent() {
    let doc = json!({"id": 2, "more": [{"id": 2}, {"more": {"id": 2}}, {"id": {"id": 2}}, [{"id": 2}]]});
    assert_same_items(
        get("$..[?(@.id==2)]", &doc),
        vec![json!({"id": 2}), json!({"id": 2}), json!({"id": 2}), json!({"id": 2})],
    );
}

#[test]
fn filter_after_recursive_wildcard() {
    let doc = json!([
        {
            "complext": {
                "one": [
                    {"name": "first", "id": 1},
                    {"name": "next", "id": 2},
                    {"name": "another", "id": 3},
                    {"name": "more", "id": 4}
                ],
                "more": {"name": "next to last", "id": 5}
            }
        },
        {"name": "last", "id": 6}
    ]);
    assert_same_items(
        get("$..*[?(@.id>2)]", &doc),
        vec![
            json!({"name": "another", "id": 3}),
            json!({"name": "more", "id": 4}),
            json!({"name": "next to last", "id": 5}),
        ],
    );
}

#[test]
fn filter_comparison_against_mismatched_kinds_warns_and_drops() {
    let doc = json!([{"id": "42"}, {"id": 42}]);
    let mut path = compile("$[?(@.id==42)]");
    assert_eq!(path.get(&doc).unwrap(), vec![json!({"id": 42})]);
    assert!(!path.warnings().is_empty());
}

#[test]
fn filter_string_literal_sides_are_rejected() {
    // Quoted strings inside a filter parse as raw text, which carries no
    // evaluation rule.
    let doc = json!([{"name": "one"}]);
    assert_eq!(get_err("$[?(@.name==\"one\")]", &doc), EvalError::UnexpectedNode("text"));
}

#[test]
fn bare_identifiers_fail_evaluation() {
    assert_eq!(
        get_err("$a", &json!({"a": 1, "$a": 2})),
        EvalError::UnexpectedNode("identifier")
    );
    assert_eq!(
        get_err("key", &json!({"key": "value"})),
        EvalError::UnexpectedNode("identifier")
    );
    assert_eq!(
        get_err("$. a", &json!({" a": 1, "a": 2})),
        EvalError::UnexpectedNode("identifier")
    );
}

#[test]
fn empty_expressions_fail_compilation() {
    assert!(matches!(
        JsonPath::compile("empty", ""),
        Err(ParseError::Empty { .. })
    ));
    assert!(matches!(
        JsonPath::compile("bare root", "$"),
        Err(ParseError::Empty { .. })
    ));
}

#[test]
fn warnings_report_missing_fields() {
    let mut path = compile("$.missing");
    path.get(&json!({"key": "value"})).unwrap();
    assert_eq!(path.warnings(), ["cannot find the field: missing"]);
}

#[test]
fn warnings_reset_between_runs() {
    let mut path = compile("$.missing");
    path.get(&json!({"key": "value"})).unwrap();
    assert_eq!(path.warnings().len(), 1);
    path.get(&json!({"missing": 1})).unwrap();
    assert!(path.warnings().is_empty());
}

#[test]
fn get_does_not_mutate_the_document() {
    let doc = json!({"a": {"b": [1, 2, 3]}});
    let before = doc.clone();
    get("$..b[1:]", &doc);
    assert_eq!(doc, before);
}

#[test]
fn set_replaces_matched_field() {
    let doc = set("$.key", json!({"key": "value"}), json!("new"));
    assert_eq!(doc, json!({"key": "new"}));
}

#[test]
fn set_materializes_missing_objects() {
    let doc = set("$.a.b.c", json!({}), json!(null));
    assert_eq!(doc, json!({"a": {"b": {"c": null}}}));
}

#[test]
fn set_materializes_deep_chain() {
    let doc = set("$.a.b.c.d.e", json!({}), json!(null));
    assert_eq!(doc, json!({"a": {"b": {"c": {"d": {"e": null}}}}}));
}

#[test]
fn set_materializes_into_existing_data() {
    let doc = set(
        "$.a.b.c.d.e",
        json!({"a": {"b": {"c": {"x": "y"}}}}),
        json!(null),
    );
    assert_eq!(doc, json!({"a": {"b": {"c": {"x": "y", "d": {"e": null}}}}}));
}

#[test]
fn set_overwrites_value_below_match() {
    let doc = set(
        "$.a.b.c.d.e",
        json!({"a": {"b": {"c": {"d": {"e": {"f": "some chars"}, "x": "y"}}}}}),
        json!(null),
    );
    assert_eq!(doc, json!({"a": {"b": {"c": {"d": {"e": null, "x": "y"}}}}}));
}

#[test]
fn set_single_index() {
    assert_eq!(set("$[0]", json!([]), json!(false)), json!([false]));
    assert_eq!(
        set("$[0]", json!([0, 1, 2, 3, 4, 5, 6]), json!(false)),
        json!([false, 1, 2, 3, 4, 5, 6])
    );
}

#[test]
fn set_grows_array_with_nulls() {
    assert_eq!(
        set("$[4]", json!([0, 1]), json!("end")),
        json!([0, 1, null, null, "end"])
    );
}

#[test]
fn set_slice_range() {
    assert_eq!(
        set("$[1:3]", json!([0, 1, 2, 3, 4, 5, 6]), json!(false)),
        json!([0, false, false, 3, 4, 5, 6])
    );
    assert_eq!(
        set("$[1:3]", json!([]), json!(false)),
        json!([null, false, false])
    );
}

#[test]
fn set_wildcard_replaces_every_element() {
    let doc = set(
        "$.list[*]",
        json!({"list": ["red", "green", "blue"]}),
        json!("black"),
    );
    assert_eq!(doc, json!({"list": ["black", "black", "black"]}));
}

#[test]
fn set_through_filter() {
    let doc = set(
        "$[?(@.id==1)].name",
        json!([{"id": 1, "name": "one"}, {"id": 2, "name": "two"}]),
        json!("ONE"),
    );
    assert_eq!(doc, json!([{"id": 1, "name": "ONE"}, {"id": 2, "name": "two"}]));
}

#[test]
fn set_materializes_array_under_new_key() {
    let doc = set("$.a[0]", json!({}), json!(42));
    assert_eq!(doc, json!({"a": [42]}));
}

#[test]
fn set_then_get_returns_the_change() {
    let mut doc = json!({});
    compile("$.a.b").set(&mut doc, json!([1, 2])).unwrap();
    assert_eq!(get("$.a.b", &doc), vec![json!([1, 2])]);
}

#[test]
fn set_rejects_negative_index() {
    assert_eq!(
        set_err("$[-1]", json!([1, 2, 3]), json!(0)),
        EvalError::NegativeIndex
    );
}

#[test]
fn set_rejects_unspecified_index() {
    assert_eq!(set_err("$[]", json!([1, 2, 3]), json!(0)), EvalError::UnknownIndex);
}

#[test]
fn set_rejects_field_on_array_root() {
    assert!(matches!(
        set_err("$.a", json!([1, 2]), json!(0)),
        EvalError::NotAnObject(_)
    ));
}

#[test]
fn set_rejects_index_on_object_root() {
    assert!(matches!(
        set_err("$[0]", json!({}), json!(0)),
        EvalError::NotAnArray(_)
    ));
}

#[test]
fn set_rejects_full_slice_of_virtual_array() {
    assert_eq!(
        set_err("$.a[:]", json!({}), json!(0)),
        EvalError::WildcardOnVirtual
    );
}

#[test]
fn replace_every_match() {
    let mut doc = json!({"list": ["red", "green", "blue"]});
    compile("$.list[*]")
        .replace(&mut doc, |_| json!("black"))
        .unwrap();
    assert_eq!(doc, json!({"list": ["black", "black", "black"]}));
}

#[test]
fn replace_sees_the_current_value() {
    let mut doc = json!({"counts": [1, 2, 3]});
    compile("$.counts[*]")
        .replace(&mut doc, |old| json!(old.as_i64().unwrap() * 10))
        .unwrap();
    assert_eq!(doc, json!({"counts": [10, 20, 30]}));
}

#[test]
fn replace_does_not_materialize() {
    let mut doc = json!({});
    compile("$.a.b").replace(&mut doc, |_| json!(1)).unwrap();
    assert_eq!(doc, json!({}));
}

#[test]
fn delete_single_element() {
    let mut doc =
        json!({"inner": {"list": ["one", "two", "three"]}, "outer": ["one", "two", "three"]});
    compile("$.inner.list[1]").delete(&mut doc).unwrap();
    assert_eq!(
        doc,
        json!({"inner": {"list": ["one", "three"]}, "outer": ["one", "two", "three"]})
    );
}

#[test]
fn delete_every_element() {
    let mut doc = json!({"list": ["one", "two", "three", "four"]});
    compile("$.list[*]").delete(&mut doc).unwrap();
    assert_eq!(doc, json!({"list": []}));
}

#[test]
fn delete_matched_keys_recursively() {
    let mut doc = json!({
        "keep": 1,
        "secret": "a",
        "nested": {"secret": "b", "also keep": [{"secret": "c"}]}
    });
    compile("$..secret").delete(&mut doc).unwrap();
    assert_eq!(doc, json!({"keep": 1, "nested": {"also keep": [{}]}}));
}

#[test]
fn find_compiles_and_gets_in_one_call() {
    let doc = json!([{"id": 42, "name": "forty-two"}, {"id": 1, "name": "one"}]);
    assert_eq!(find("$[?(@.id==42)].name", &doc).unwrap(), vec![json!("forty-two")]);
    assert!(find("$[key]", &doc).is_err());
}

#[test]
fn find_str_deserializes_first() {
    let found = find_str("$[1:3]", r#"["first", "second", "third", "forth", "fifth"]"#).unwrap();
    assert_eq!(found, vec![json!("second"), json!("third")]);
    assert!(find_str("$.a", "not json").is_err());
}
