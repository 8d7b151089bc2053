// tests/builtin_tests.rs

use serde_json::json;

use nutmeg_lang::memory::{Memory, SimpleObjectMemory};
use nutmeg_lang::options::Options;
use nutmeg_lang::parser::parse;
use nutmeg_lang::value::Value;

fn eval(text: &str, memory: &dyn Memory) -> (Option<Value>, Option<String>) {
    let expr = parse(text).unwrap();
    expr.try_evaluate(memory, &Options::default())
}

fn eval_value(text: &str, memory: &dyn Memory) -> Value {
    let (value, error) = eval(text, memory);
    assert_eq!(error, None, "Unexpected error for: {}", text);
    value.unwrap_or_else(|| panic!("No value for: {}", text))
}

fn eval_error(text: &str, memory: &dyn Memory) -> String {
    let (value, error) = eval(text, memory);
    assert_eq!(value, None, "Unexpected value for: {}", text);
    error.unwrap_or_else(|| panic!("No error for: {}", text))
}

fn eval_value_with(text: &str, memory: &dyn Memory, options: &Options) -> Value {
    let expr = parse(text).unwrap();
    let (value, error) = expr.try_evaluate(memory, options);
    assert_eq!(error, None, "Unexpected error for: {}", text);
    value.unwrap_or_else(|| panic!("No value for: {}", text))
}

fn empty() -> SimpleObjectMemory {
    SimpleObjectMemory::from_json(json!({}))
}

// ============================================================================
// Math
// ============================================================================

#[test]
fn test_arithmetic_preserves_integers() {
    let memory = empty();
    let test_cases = vec![
        ("1 + 2", Value::Integer(3)),
        ("10 - 3 - 2", Value::Integer(5)),
        ("6 * 7", Value::Integer(42)),
        ("6 / 3", Value::Integer(2)),
        ("7 / 2", Value::Float(3.5)),
        ("7 % 3", Value::Integer(1)),
        ("2.5 + 1", Value::Float(3.5)),
        // Mixed arithmetic narrows back to an integer when the result is whole
        ("1 + 2.0", Value::Integer(3)),
        ("5 * 0.5", Value::Float(2.5)),
        ("3.0 - 1", Value::Integer(2)),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            eval_value(input, &memory),
            expected,
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_plus_concatenates_strings() {
    let memory = empty();
    assert_eq!(
        eval_value("'total: ' + 42", &memory),
        Value::String("total: 42".into())
    );
    assert_eq!(
        eval_value("1 + 'a'", &memory),
        Value::String("1a".into())
    );
}

#[test]
fn test_variadic_operators_fold_left() {
    let memory = empty();
    assert_eq!(eval_value("add(1, 2, 3)", &memory), Value::Integer(6));
    assert_eq!(eval_value("mul(2, 3, 4)", &memory), Value::Integer(24));
}

#[test]
fn test_integer_overflow_promotes_to_float() {
    let memory = empty();
    let value = eval_value("9223372036854775807 + 1", &memory);
    assert!(matches!(value, Value::Float(_)), "got: {:?}", value);
}

#[test]
fn test_division_by_zero() {
    let memory = empty();
    assert_eq!(eval_error("1 / 0", &memory), "Cannot divide by zero");
    assert_eq!(eval_error("1 % 0", &memory), "Cannot modulo by zero");
}

#[test]
fn test_arithmetic_type_errors() {
    let memory = empty();
    let error = eval_error("'a' * 2", &memory);
    assert!(error.contains("is not a number"), "got: {}", error);
}

#[test]
fn test_min_max_flatten_list_arguments() {
    let memory = empty();
    assert_eq!(eval_value("min(3, 1, 2)", &memory), Value::Integer(1));
    assert_eq!(eval_value("max([1, 5], 3)", &memory), Value::Integer(5));
    // The winner keeps its original representation
    assert_eq!(eval_value("max(1, 2.0)", &memory), Value::Float(2.0));
}

#[test]
fn test_sum_and_average() {
    let memory = empty();
    assert_eq!(eval_value("sum([1, 2, 3])", &memory), Value::Integer(6));
    assert_eq!(eval_value("sum([1, 2.5])", &memory), Value::Float(3.5));
    assert_eq!(
        eval_value("average([1, 2, 3])", &memory),
        Value::Float(2.0)
    );

    let error = eval_error("average([])", &memory);
    assert_eq!(error, "average requires a non-empty list");
}

#[test]
fn test_rounding() {
    let memory = empty();
    let test_cases = vec![
        ("abs(-3)", Value::Integer(3)),
        ("abs(-2.5)", Value::Float(2.5)),
        ("floor(3.7)", Value::Integer(3)),
        ("ceiling(3.2)", Value::Integer(4)),
        ("floor(4)", Value::Integer(4)),
        ("round(3.456)", Value::Integer(3)),
        ("round(2.5)", Value::Integer(3)),
        ("round(3.456, 2)", Value::Float(3.46)),
        ("sqrt(16)", Value::Float(4.0)),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            eval_value(input, &memory),
            expected,
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_rounding_errors() {
    let memory = empty();
    assert_eq!(
        eval_error("sqrt(-1)", &memory),
        "Cannot take the square root of a negative number"
    );
    let error = eval_error("round(1.5, 20)", &memory);
    assert!(error.contains("between 0 and 15"), "got: {}", error);
}

#[test]
fn test_range() {
    let memory = empty();
    assert_eq!(
        eval_value("range(1, 4)", &memory),
        Value::from(json!([1, 2, 3, 4]))
    );
    assert_eq!(
        eval_value("range(-2, 3)", &memory),
        Value::from(json!([-2, -1, 0]))
    );
    let error = eval_error("range(5, 0)", &memory);
    assert!(error.contains("greater than zero"), "got: {}", error);
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn test_concat() {
    let memory = empty();
    assert_eq!(
        eval_value("concat('a', 'b', 'c')", &memory),
        Value::String("abc".into())
    );
    // Nulls render as nothing
    assert_eq!(
        eval_value("concat('a', null, 'c')", &memory),
        Value::String("ac".into())
    );
    assert_eq!(
        eval_value("concat('n=', 42)", &memory),
        Value::String("n=42".into())
    );
}

#[test]
fn test_join() {
    let memory = SimpleObjectMemory::from_json(json!({"items": ["a", "b", "c"]}));
    assert_eq!(
        eval_value("join(items, ', ')", &memory),
        Value::String("a, b, c".into())
    );
    assert_eq!(
        eval_value("join(items, ', ', ' and ')", &memory),
        Value::String("a, b and c".into())
    );
    // Without a separator the options default applies
    assert_eq!(
        eval_value("join(items)", &memory),
        Value::String("a,b,c".into())
    );

    let options = Options {
        list_separator: "; ".to_string(),
        ..Options::default()
    };
    assert_eq!(
        eval_value_with("join(items)", &memory, &options),
        Value::String("a; b; c".into())
    );
}

#[test]
fn test_case_and_trim() {
    let memory = empty();
    let test_cases = vec![
        ("toUpper('abc')", "ABC"),
        ("toLower('ABC')", "abc"),
        ("trim('  padded  ')", "padded"),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            eval_value(input, &memory),
            Value::String(expected.into()),
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_replace() {
    let memory = empty();
    assert_eq!(
        eval_value("replace('hello', 'l', 'L')", &memory),
        Value::String("heLLo".into())
    );
    assert_eq!(
        eval_value("replaceIgnoreCase('Hello', 'h', 'j')", &memory),
        Value::String("jello".into())
    );
    let error = eval_error("replace('hello', '', 'x')", &memory);
    assert!(error.contains("non-empty"), "got: {}", error);
}

#[test]
fn test_substring() {
    let memory = empty();
    assert_eq!(
        eval_value("substring('hello', 1, 3)", &memory),
        Value::String("ell".into())
    );
    assert_eq!(
        eval_value("substring('hello', 1)", &memory),
        Value::String("ello".into())
    );
    let error = eval_error("substring('hello', 2, 9)", &memory);
    assert!(error.contains("out of range"), "got: {}", error);
}

#[test]
fn test_split() {
    let memory = empty();
    assert_eq!(
        eval_value("split('a,b,c', ',')", &memory),
        Value::from(json!(["a", "b", "c"]))
    );
    // Without a separator, split into characters
    assert_eq!(
        eval_value("split('abc')", &memory),
        Value::from(json!(["a", "b", "c"]))
    );
}

#[test]
fn test_length_counts_characters() {
    let memory = empty();
    assert_eq!(eval_value("length('héllo')", &memory), Value::Integer(5));
    assert_eq!(eval_value("length('')", &memory), Value::Integer(0));
}

#[test]
fn test_starts_and_ends_with() {
    let memory = empty();
    assert_eq!(
        eval_value("startsWith('filename.txt', 'file')", &memory),
        Value::Boolean(true)
    );
    assert_eq!(
        eval_value("endsWith('filename.txt', '.txt')", &memory),
        Value::Boolean(true)
    );
    assert_eq!(
        eval_value("startsWith('filename.txt', 'x')", &memory),
        Value::Boolean(false)
    );
}

#[test]
fn test_index_of_is_character_based() {
    let memory = empty();
    assert_eq!(
        eval_value("indexOf('héllo', 'llo')", &memory),
        Value::Integer(2)
    );
    assert_eq!(
        eval_value("indexOf('abc', 'z')", &memory),
        Value::Integer(-1)
    );
    assert_eq!(
        eval_value("lastIndexOf('abcabc', 'b')", &memory),
        Value::Integer(4)
    );
    // Lists search by element equality
    assert_eq!(
        eval_value("indexOf([10, 20, 30], 20)", &memory),
        Value::Integer(1)
    );
}

#[test]
fn test_is_match() {
    let memory = empty();
    assert_eq!(
        eval_value("isMatch('hello123', '^[a-z]+[0-9]+$')", &memory),
        Value::Boolean(true)
    );
    assert_eq!(
        eval_value("isMatch('hello', '^[0-9]+$')", &memory),
        Value::Boolean(false)
    );
    let error = eval_error("isMatch('a', '[')", &memory);
    assert!(error.contains("invalid regex"), "got: {}", error);
}

// ============================================================================
// Collections
// ============================================================================

#[test]
fn test_count() {
    let memory = empty();
    assert_eq!(eval_value("count([1, 2, 3])", &memory), Value::Integer(3));
    assert_eq!(eval_value("count('abc')", &memory), Value::Integer(3));
}

#[test]
fn test_contains() {
    let memory = SimpleObjectMemory::from_json(json!({"user": {"name": "Ada", "age": 36}}));
    let test_cases = vec![
        ("contains('hello', 'ell')", true),
        ("contains('hello', 'z')", false),
        ("contains([1, 2, 3], 2)", true),
        ("contains([1, 2, 3], 9)", false),
        ("contains(user, 'name')", true),
        ("contains(user, 'email')", false),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            eval_value(input, &memory),
            Value::Boolean(expected),
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_empty() {
    let memory = empty();
    let test_cases = vec![
        ("empty('')", true),
        ("empty([])", true),
        ("empty(null)", true),
        ("empty(ghost)", true),
        ("empty('x')", false),
        ("empty([1])", false),
        ("empty(0)", false),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            eval_value(input, &memory),
            Value::Boolean(expected),
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_first_and_last() {
    let memory = empty();
    assert_eq!(eval_value("first([1, 2, 3])", &memory), Value::Integer(1));
    assert_eq!(eval_value("last([1, 2, 3])", &memory), Value::Integer(3));
    assert_eq!(eval_value("first([])", &memory), Value::Null);
    assert_eq!(eval_value("last([])", &memory), Value::Null);
    assert_eq!(
        eval_value("first('abc')", &memory),
        Value::String("a".into())
    );
    assert_eq!(
        eval_value("last('abc')", &memory),
        Value::String("c".into())
    );
}

#[test]
fn test_union_and_intersection() {
    let memory = empty();
    assert_eq!(
        eval_value("union([1, 2], [2, 3])", &memory),
        Value::from(json!([1, 2, 3]))
    );
    assert_eq!(
        eval_value("intersection([1, 2, 3], [2, 3, 4], [3, 9])", &memory),
        Value::from(json!([3]))
    );
}

#[test]
fn test_skip_and_take() {
    let memory = empty();
    assert_eq!(
        eval_value("skip([1, 2, 3], 1)", &memory),
        Value::from(json!([2, 3]))
    );
    // Counts past the end clamp to the boundary
    assert_eq!(
        eval_value("skip([1, 2], 5)", &memory),
        Value::from(json!([]))
    );
    assert_eq!(
        eval_value("take([1, 2, 3], 2)", &memory),
        Value::from(json!([1, 2]))
    );
    assert_eq!(
        eval_value("take('hello', 2)", &memory),
        Value::String("he".into())
    );

    let error = eval_error("skip([1, 2], -1)", &memory);
    assert!(error.contains("non-negative"), "got: {}", error);
}

#[test]
fn test_reverse() {
    let memory = empty();
    assert_eq!(
        eval_value("reverse([1, 2, 3])", &memory),
        Value::from(json!([3, 2, 1]))
    );
    assert_eq!(
        eval_value("reverse('abc')", &memory),
        Value::String("cba".into())
    );
}

#[test]
fn test_flatten() {
    let memory = empty();
    assert_eq!(
        eval_value("flatten([[1, [2]], [3]])", &memory),
        Value::from(json!([1, 2, 3]))
    );
    assert_eq!(
        eval_value("flatten([[1, [2]]], 1)", &memory),
        Value::from(json!([1, [2]]))
    );
}

#[test]
fn test_sort_by() {
    let memory = SimpleObjectMemory::from_json(json!({
        "items": [{"n": 2, "tag": "b"}, {"n": 1, "tag": "a"}, {"n": 3, "tag": "c"}]
    }));
    assert_eq!(
        eval_value("sortBy([3, 1, 2])", &memory),
        Value::from(json!([1, 2, 3]))
    );
    assert_eq!(
        eval_value("sortBy(items, 'n')", &memory),
        Value::from(json!([
            {"n": 1, "tag": "a"},
            {"n": 2, "tag": "b"},
            {"n": 3, "tag": "c"}
        ]))
    );
    assert_eq!(
        eval_value("sortByDescending([1, 3, 2])", &memory),
        Value::from(json!([3, 2, 1]))
    );
}

#[test]
fn test_indices_and_values() {
    let memory = empty();
    assert_eq!(
        eval_value("indicesAndValues(['a', 'b'])[1].value", &memory),
        Value::String("b".into())
    );
    assert_eq!(
        eval_value("indicesAndValues(['a', 'b'])[1].index", &memory),
        Value::Integer(1)
    );
}

#[test]
fn test_foreach() {
    let memory = SimpleObjectMemory::from_json(json!({"nums": [1, 2, 3]}));
    assert_eq!(
        eval_value("foreach(nums, x, x * 2)", &memory),
        Value::from(json!([2, 4, 6]))
    );
    assert_eq!(
        eval_value("foreach([[1], [2, 3]], row, count(row))", &memory),
        Value::from(json!([1, 2]))
    );
    // select is the same operation under another name
    assert_eq!(
        eval_value("select(nums, x, x + 1)", &memory),
        Value::from(json!([2, 3, 4]))
    );
}

#[test]
fn test_foreach_over_objects_yields_pairs() {
    let memory = SimpleObjectMemory::from_json(json!({"user": {"name": "Ada", "age": 36}}));
    // Object iteration is in sorted key order
    assert_eq!(
        eval_value("foreach(user, p, p.key)", &memory),
        Value::from(json!(["age", "name"]))
    );
    assert_eq!(
        eval_value("foreach(user, p, p.value)", &memory),
        Value::from(json!([36, "Ada"]))
    );
}

#[test]
fn test_foreach_iterator_sees_outer_state() {
    let memory = SimpleObjectMemory::from_json(json!({"nums": [1, 2], "offset": 10}));
    assert_eq!(
        eval_value("foreach(nums, x, x + offset)", &memory),
        Value::from(json!([11, 12]))
    );
}

#[test]
fn test_where() {
    let memory = SimpleObjectMemory::from_json(json!({"nums": [1, 2, 3, 4]}));
    assert_eq!(
        eval_value("where(nums, x, x > 2)", &memory),
        Value::from(json!([3, 4]))
    );
    assert_eq!(
        eval_value("where(nums, x, x > 9)", &memory),
        Value::from(json!([]))
    );
}

#[test]
fn test_where_over_objects_keeps_entries() {
    let memory = SimpleObjectMemory::from_json(json!({"user": {"name": "Ada", "age": 36}}));
    assert_eq!(
        eval_value("where(user, p, isString(p.value))", &memory),
        Value::from(json!({"name": "Ada"}))
    );
}

#[test]
fn test_iterating_a_scalar_is_an_error() {
    let memory = empty();
    let error = eval_error("foreach(5, x, x)", &memory);
    assert!(error.contains("is not a collection"), "got: {}", error);
}

#[test]
fn test_errors_inside_the_lambda_propagate() {
    let memory = SimpleObjectMemory::from_json(json!({"nums": [1, 0, 2]}));
    assert_eq!(
        eval_error("foreach(nums, x, 1 / x)", &memory),
        "Cannot divide by zero"
    );
}

// ============================================================================
// Conversions
// ============================================================================

#[test]
fn test_string_conversion() {
    let memory = empty();
    assert_eq!(
        eval_value("string(42)", &memory),
        Value::String("42".into())
    );
    assert_eq!(
        eval_value("string(true)", &memory),
        Value::String("true".into())
    );
    assert_eq!(eval_value("string(null)", &memory), Value::String("".into()));
    // Arrays render with the options list separator
    assert_eq!(
        eval_value("string([1, 2])", &memory),
        Value::String("1,2".into())
    );
}

#[test]
fn test_int_conversion() {
    let memory = empty();
    assert_eq!(eval_value("int('42')", &memory), Value::Integer(42));
    assert_eq!(eval_value("int(' 7 ')", &memory), Value::Integer(7));
    assert_eq!(eval_value("int(3.9)", &memory), Value::Integer(3));
    assert_eq!(eval_value("int('3.9')", &memory), Value::Integer(3));

    let error = eval_error("int('x')", &memory);
    assert_eq!(error, "'x' cannot be converted to an integer");
}

#[test]
fn test_float_conversion() {
    let memory = empty();
    assert_eq!(eval_value("float('3.5')", &memory), Value::Float(3.5));
    assert_eq!(eval_value("float(2)", &memory), Value::Float(2.0));
}

#[test]
fn test_bool_conversion() {
    let memory = empty();
    assert_eq!(eval_value("bool('true')", &memory), Value::Boolean(true));
    assert_eq!(eval_value("bool('FALSE')", &memory), Value::Boolean(false));
    assert_eq!(eval_value("bool(0)", &memory), Value::Boolean(false));
    assert_eq!(eval_value("bool(3)", &memory), Value::Boolean(true));
    assert_eq!(eval_value("bool(null)", &memory), Value::Boolean(false));

    let error = eval_error("bool('yes')", &memory);
    assert!(error.contains("cannot be converted"), "got: {}", error);
}

#[test]
fn test_json_parsing() {
    let memory = empty();
    assert_eq!(
        eval_value(r#"json('{"a": 1}').a"#, &memory),
        Value::Integer(1)
    );
    assert_eq!(
        eval_value("json('[1, 2]')[0]", &memory),
        Value::Integer(1)
    );
    let error = eval_error("json('not json')", &memory);
    assert!(error.contains("invalid json"), "got: {}", error);
}

#[test]
fn test_create_array() {
    let memory = empty();
    assert_eq!(
        eval_value("createArray(1, 'a', true)", &memory),
        Value::Array(vec![
            Value::Integer(1),
            Value::String("a".into()),
            Value::Boolean(true)
        ])
    );
}

#[test]
fn test_type_predicates() {
    let memory = SimpleObjectMemory::from_json(json!({"user": {"name": "Ada"}}));
    let test_cases = vec![
        ("isString('x')", true),
        ("isString(5)", false),
        ("isInteger(5)", true),
        ("isInteger(5.0)", false),
        ("isFloat(5.0)", true),
        ("isBoolean(true)", true),
        ("isArray([1])", true),
        ("isArray('x')", false),
        ("isObject(user)", true),
        ("isObject(user.name)", false),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            eval_value(input, &memory),
            Value::Boolean(expected),
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_is_date_time() {
    let memory = empty();
    assert_eq!(
        eval_value("isDateTime('2021-03-17T08:00:00Z')", &memory),
        Value::Boolean(true)
    );
    assert_eq!(
        eval_value("isDateTime('2021-03-17')", &memory),
        Value::Boolean(true)
    );
    assert_eq!(
        eval_value("isDateTime('tuesday')", &memory),
        Value::Boolean(false)
    );
    assert_eq!(eval_value("isDateTime(5)", &memory), Value::Boolean(false));
}

// ============================================================================
// Date and time
// ============================================================================

#[test]
fn test_format_date_time_defaults_to_iso() {
    let memory = empty();
    assert_eq!(
        eval_value("formatDateTime('2023-01-01T00:00:00Z')", &memory),
        Value::String("2023-01-01T00:00:00.000Z".into())
    );
    // Offsets normalize to UTC
    assert_eq!(
        eval_value("formatDateTime('2023-01-01T12:00:00+02:00')", &memory),
        Value::String("2023-01-01T10:00:00.000Z".into())
    );
    // Offsetless timestamps are taken as UTC
    assert_eq!(
        eval_value("formatDateTime('2023-01-01T12:00:00')", &memory),
        Value::String("2023-01-01T12:00:00.000Z".into())
    );
    // Bare dates mean midnight
    assert_eq!(
        eval_value("formatDateTime('2023-01-01')", &memory),
        Value::String("2023-01-01T00:00:00.000Z".into())
    );
}

#[test]
fn test_format_date_time_custom_formats() {
    let memory = empty();
    // 2023-07-15 was a Saturday
    let test_cases = vec![
        ("yyyy-MM-dd", "2023-07-15"),
        ("dd/MM/yyyy", "15/07/2023"),
        ("MMM d, yyyy", "Jul 15, 2023"),
        ("MMMM", "July"),
        ("ddd", "Sat"),
        ("dddd", "Saturday"),
        ("HH:mm:ss", "14:30:05"),
        ("h:mm tt", "2:30 PM"),
        ("hh:mm", "02:30"),
        ("yy", "23"),
    ];

    for (format, expected) in test_cases {
        let input = format!("formatDateTime('2023-07-15T14:30:05Z', '{}')", format);
        assert_eq!(
            eval_value(&input, &memory),
            Value::String(expected.into()),
            "Failed for format: {}",
            format
        );
    }
}

#[test]
fn test_format_date_time_literal_text() {
    let memory = empty();
    assert_eq!(
        eval_value(
            "formatDateTime('2023-07-15T14:30:05Z', 'HH \"hours\"')",
            &memory
        ),
        Value::String("14 hours".into())
    );
    assert_eq!(
        eval_value(
            "formatDateTime('2023-07-15T14:30:05.123Z', 'ss.fff')",
            &memory
        ),
        Value::String("05.123".into())
    );
}

#[test]
fn test_format_date_time_rejects_bad_input() {
    let memory = empty();
    assert_eq!(
        eval_error("formatDateTime('nope')", &memory),
        "nope is not a valid timestamp"
    );
}

#[test]
fn test_ticks_and_back() {
    let memory = empty();
    assert_eq!(
        eval_value("ticks('2021-03-17T00:00:00Z')", &memory),
        Value::Integer(637515360000000000)
    );
    assert_eq!(
        eval_value("formatTicks(637515360000000000)", &memory),
        Value::String("2021-03-17T00:00:00.000Z".into())
    );
    assert_eq!(
        eval_value("formatTicks(637515360000000000, 'yyyy-MM-dd')", &memory),
        Value::String("2021-03-17".into())
    );
}

#[test]
fn test_format_epoch() {
    let memory = empty();
    assert_eq!(
        eval_value("formatEpoch(1615939200)", &memory),
        Value::String("2021-03-17T00:00:00.000Z".into())
    );
    // Fractional seconds round to milliseconds
    assert_eq!(
        eval_value("formatEpoch(1615939200.5)", &memory),
        Value::String("2021-03-17T00:00:00.500Z".into())
    );
}

#[test]
fn test_duration_arithmetic() {
    let memory = empty();
    let test_cases = vec![
        (
            "addSeconds('2021-03-15T00:00:00Z', 90)",
            "2021-03-15T00:01:30.000Z",
        ),
        (
            "addMinutes('2021-03-15T00:00:00Z', 90)",
            "2021-03-15T01:30:00.000Z",
        ),
        (
            "addHours('2021-03-15T23:00:00Z', 2)",
            "2021-03-16T01:00:00.000Z",
        ),
        (
            "addDays('2021-01-31T08:00:00Z', 1)",
            "2021-02-01T08:00:00.000Z",
        ),
        ("addDays('2021-03-15T00:00:00Z', -1)", "2021-03-14T00:00:00.000Z"),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            eval_value(input, &memory),
            Value::String(expected.into()),
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_duration_arithmetic_with_format() {
    let memory = empty();
    assert_eq!(
        eval_value("addDays('2021-03-15T00:00:00Z', 1, 'yyyy-MM-dd')", &memory),
        Value::String("2021-03-16".into())
    );
}

#[test]
fn test_date_parts() {
    let memory = empty();
    let test_cases = vec![
        ("year('2021-03-17T08:30:00Z')", 2021),
        ("month('2021-03-17T08:30:00Z')", 3),
        ("dayOfMonth('2021-03-17T08:30:00Z')", 17),
        // 2021-03-17 was a Wednesday; Sunday is 0
        ("dayOfWeek('2021-03-17T08:30:00Z')", 3),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            eval_value(input, &memory),
            Value::Integer(expected),
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_get_time_of_day() {
    let memory = empty();
    let test_cases = vec![
        ("2021-01-01T00:00:00Z", "midnight"),
        ("2021-01-01T00:01:00Z", "morning"),
        ("2021-01-01T11:59:00Z", "morning"),
        ("2021-01-01T12:00:00Z", "afternoon"),
        ("2021-01-01T17:59:00Z", "afternoon"),
        ("2021-01-01T18:00:00Z", "evening"),
        ("2021-01-01T21:59:00Z", "evening"),
        ("2021-01-01T22:00:00Z", "night"),
        ("2021-01-01T23:59:00Z", "night"),
    ];

    for (timestamp, expected) in test_cases {
        let input = format!("getTimeOfDay('{}')", timestamp);
        assert_eq!(
            eval_value(&input, &memory),
            Value::String(expected.into()),
            "Failed for timestamp: {}",
            timestamp
        );
    }
}

#[test]
fn test_utc_now_produces_a_timestamp() {
    let memory = empty();
    assert_eq!(
        eval_value("isDateTime(utcNow())", &memory),
        Value::Boolean(true)
    );
    let year = eval_value("int(utcNow('yyyy'))", &memory);
    assert!(
        matches!(year, Value::Integer(y) if y >= 2024),
        "got: {:?}",
        year
    );
}
