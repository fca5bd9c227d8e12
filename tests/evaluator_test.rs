use std::rc::Rc;

use color_eyre::{eyre::eyre, Result};
use proptest::prelude::*;

use brook::{
    evaluate_with,
    interpreter::{BufferedContext, InterpreterConfig, TreeWalkInterpreter},
    parser::Parser,
    resolver::Resolver,
    value::{error::RuntimeError, Arity, HostFunction, HostValue, OpaqueValue, Value},
    EvalError,
};

fn eval(source: &str) -> Result<Value, EvalError> {
    evaluate_with(source, BufferedContext::new(), InterpreterConfig::default())
}

/// `eval` with the error flattened into a report.
fn eval_ok(source: &str) -> Result<Value> {
    eval(source).map_err(|error| eyre!("{error}"))
}

fn eval_int(source: &str) -> Result<i64> {
    match eval_ok(source)? {
        Value::Int(v) => Ok(v),
        other => Err(eyre!("Expected an int but got {other:?}")),
    }
}

fn eval_string(source: &str) -> Result<String> {
    match eval_ok(source)? {
        Value::String(v) => Ok(v.to_string()),
        other => Err(eyre!("Expected a string but got {other:?}")),
    }
}

/// The class name of the uncaught exception raised by `source`.
fn raised_class(source: &str) -> Option<String> {
    match eval(source) {
        Err(EvalError::Runtime(exception)) => Some(exception.class_name.to_string()),
        _ => None,
    }
}

fn run_with_host(interpreter: &mut TreeWalkInterpreter, source: &str) -> Result<Value> {
    let program = Parser::new(source)
        .parse()
        .map_err(|error| eyre!("{error}"))?;
    Resolver::new()
        .resolve_program(&program)
        .map_err(|error| eyre!("{error}"))?;
    interpreter.run(&program).map_err(|error| eyre!("{error}"))
}

#[test]
fn addition_of_ints_is_an_int() -> Result<()> {
    assert_eq!(eval_int("2 + 3")?, 5);
    Ok(())
}

#[test]
fn true_division_yields_a_float() -> Result<()> {
    match eval_ok("2 / 3")? {
        Value::Float(v) => assert!((v - 2.0 / 3.0).abs() < f64::EPSILON),
        other => return Err(eyre!("Expected a float but got {other:?}")),
    }
    Ok(())
}

#[test]
fn division_by_zero_is_raised() {
    for source in ["1 / 0", "1 // 0", "1 % 0", "1.0 / 0", "1 // 0.0", "1.5 % 0.0"] {
        assert_eq!(
            raised_class(source).as_deref(),
            Some("DivByZero"),
            "Failed on {source}"
        );
    }
}

#[test]
fn closure_counter_counts() -> Result<()> {
    let source = "
fun make_counter() {
  count = 0
  fun increment() { count += 1; return count }
  return increment
}
counter = make_counter()
counter()
counter()
counter()
";
    assert_eq!(eval_int(source)?, 3);
    Ok(())
}

#[test]
fn recursive_factorial() -> Result<()> {
    let source = "
fun factorial(n) {
  if n <= 1 { return 1 }
  return n * factorial(n - 1)
}
factorial(10)
";
    assert_eq!(eval_int(source)?, 3628800);
    Ok(())
}

const VECTOR3D: &str = "
class Vector3D {
  fun __init__(x, y, z) { this.x = x; this.y = y; this.z = z }
  fun __add__(o) { return Vector3D(this.x + o.x, this.y + o.y, this.z + o.z) }
  fun __neg__() { return Vector3D(-this.x, -this.y, -this.z) }
  fun __sub__(o) { return Vector3D(this.x - o.x, this.y - o.y, this.z - o.z) }
  fun __eq__(o) { return this.x == o.x and this.y == o.y and this.z == o.z }
}
";

fn vector_identity(v1: [&str; 3], v2: [&str; 3]) -> String {
    format!(
        "{VECTOR3D}v1 = Vector3D({})\nv2 = Vector3D({})\nv1 - v2 == v1 + (-v2)",
        v1.join(", "),
        v2.join(", "),
    )
}

#[test]
fn vector_subtraction_matches_adding_the_negation() -> Result<()> {
    let source = vector_identity(["1", "-2", "3.5"], ["4", "5", "-6"]);
    assert!(matches!(eval_ok(&source)?, Value::Bool(true)));
    Ok(())
}

#[test]
fn user_iterator_collects_like_a_list() -> Result<()> {
    let source = "
class Upto {
  fun __init__(n) { this.i = 0; this.n = n }
  fun iter() { return this }
  fun next() {
    if this.i >= this.n { return null }
    this.i += 1
    return Item(this.i)
  }
}
fun collect(iterable) {
  out = []
  for x in iterable { out.push(x) }
  return out
}
dump(collect(Upto(4))) == dump(collect([1, 2, 3, 4]))
";
    assert!(matches!(eval_ok(source)?, Value::Bool(true)));
    Ok(())
}

#[test]
fn last_expression_is_the_result() -> Result<()> {
    assert_eq!(eval_int("x = 2; x * 21")?, 42);
    assert!(matches!(eval_ok("fun f() {}")?, Value::Null));
    Ok(())
}

#[test]
fn print_writes_through_the_context() -> Result<()> {
    let context = BufferedContext::new();
    evaluate_with(
        "print(1, 'a', [1, 'a'], 2.0)\nprint()",
        context.clone(),
        InterpreterConfig::default(),
    )
    .map_err(|error| eyre!("{error}"))?;
    assert_eq!(context.data(), "1 a [1, 'a'] 2.0\n\n");
    Ok(())
}

#[test]
fn entry_point_reports_each_failure_stage() {
    assert!(matches!(eval("1 +"), Err(EvalError::Parse(_))));
    assert!(matches!(eval("return 1"), Err(EvalError::Resolution(_))));
    assert!(matches!(eval("exit(4)"), Err(EvalError::Exit(4))));
    assert!(matches!(eval("missing"), Err(EvalError::Runtime(_))));
}

#[test]
fn call_depth_limit_raises_stack_overflow() {
    let config = InterpreterConfig {
        max_call_depth: 100,
        ..Default::default()
    };
    let result = evaluate_with(
        "fun down(n) { return down(n + 1) }\ndown(0)",
        BufferedContext::new(),
        config,
    );
    match result {
        Err(EvalError::Runtime(exception)) => {
            assert_eq!(exception.class_name, "StackOverflow");
            let innermost = exception.traceback.last().map(|frame| frame.name.as_str());
            assert_eq!(innermost, Some("down"));
        }
        other => panic!("Expected a stack overflow but got {other:?}"),
    }
}

#[test]
fn deep_recursion_within_the_limit_succeeds() -> Result<()> {
    let source = "
fun sum(n) {
  if n == 0 { return 0 }
  return n + sum(n - 1)
}
sum(1500)
";
    assert_eq!(eval_int(source)?, 1125750);
    Ok(())
}

#[test]
fn circular_include_is_rejected() {
    let context = BufferedContext::new().with_include("loop.brook", "include \"loop.brook\"");
    let result = evaluate_with(
        "include \"loop.brook\"",
        context,
        InterpreterConfig::default(),
    );
    match result {
        Err(EvalError::Runtime(exception)) => {
            assert_eq!(exception.class_name, "IncludeError");
            assert!(exception.message.contains("circular include"));
        }
        other => panic!("Expected an include error but got {other:?}"),
    }
}

#[test]
fn hook_failure_is_not_swallowed() {
    let source = "
class Loud {
  fun __str__() { return missing_name }
}
str(Loud())
";
    assert_eq!(raised_class(source).as_deref(), Some("VarNotFound"));
}

#[test]
fn exceptions_carry_their_payload() {
    let source = "
class Failure(Exception) {}
raise(Failure('bad'))
";
    match eval(source) {
        Err(EvalError::Runtime(exception)) => {
            assert_eq!(exception.message, "bad");
            assert!(exception.code.is_none());
            assert!(matches!(
                exception.payload.get_field("message"),
                Some(Value::String(message)) if message == "bad"
            ));
        }
        other => panic!("Expected a raised Failure but got {other:?}"),
    }
}

#[test]
fn host_functions_marshal_values() -> Result<()> {
    let mut interpreter =
        TreeWalkInterpreter::new(BufferedContext::new(), InterpreterConfig::default());
    let sum = HostFunction::new("host_sum", Arity::exact(1), |arguments| {
        match &arguments[0] {
            HostValue::Sequence(items) => {
                let mut total = 0;
                for item in items {
                    match item {
                        HostValue::Int(v) => total += v,
                        other => return Err(format!("Can't add {other:?}.")),
                    }
                }
                Ok(HostValue::Int(total))
            }
            other => Err(format!("Expected a sequence but got {other:?}.")),
        }
    });
    interpreter.define_global("host_sum", sum.into_value());
    let pairs = HostFunction::new("host_pairs", Arity::exact(0), |_| {
        Ok(HostValue::Mapping(vec![
            (HostValue::String("a".into()), HostValue::Float(0.5)),
            (HostValue::String("b".into()), HostValue::None),
        ]))
    });
    interpreter.define_global("host_pairs", pairs.into_value());

    assert!(matches!(
        run_with_host(&mut interpreter, "host_sum([1, 2, 3])")?,
        Value::Int(6)
    ));
    match run_with_host(&mut interpreter, "dump(host_pairs())")? {
        Value::String(text) => assert_eq!(text, "{'a': 0.5, 'b': null}"),
        other => return Err(eyre!("Expected a string but got {other:?}")),
    }
    match run_with_host(&mut interpreter, "host_sum(['x'])") {
        Err(error) => assert!(error.to_string().contains("Can't add")),
        Ok(value) => return Err(eyre!("Expected an error but got {value:?}")),
    }
    Ok(())
}

#[test]
fn opaque_host_values_pass_through_untouched() -> Result<()> {
    let mut interpreter =
        TreeWalkInterpreter::new(BufferedContext::new(), InterpreterConfig::default());
    let make = HostFunction::new("make_handle", Arity::exact(0), |_| {
        Ok(HostValue::Opaque(OpaqueValue::from_host(Rc::new(7u32))))
    });
    let read = HostFunction::new("read_handle", Arity::exact(1), |arguments| {
        match &arguments[0] {
            HostValue::Opaque(handle) => handle
                .downcast::<u32>()
                .map(|value| HostValue::Int(i64::from(*value)))
                .ok_or_else(|| "Not a handle.".to_string()),
            other => Err(format!("Expected a handle but got {other:?}.")),
        }
    });
    interpreter.define_global("make_handle", make.into_value());
    interpreter.define_global("read_handle", read.into_value());

    let value = run_with_host(&mut interpreter, "h = make_handle(); [type(h), read_handle(h)]")?;
    assert_eq!(value.to_string(), "['opaque', 7]");
    Ok(())
}

#[test]
fn exit_is_not_an_exception() {
    let mut interpreter =
        TreeWalkInterpreter::new(BufferedContext::new(), InterpreterConfig::default());
    let program = Parser::new("fun f() { exit(2) }\nf()")
        .parse()
        .expect("Source should parse.");
    assert!(matches!(interpreter.run(&program), Err(RuntimeError::Exit(2))));
}

// Property-based tests

proptest! {
    #[test]
    fn floor_division_and_modulo_agree(a in -1_000_000i64..1_000_000, b in -1_000i64..1_000) {
        prop_assume!(b != 0);
        let source = format!("(({a}) // ({b})) * ({b}) + ({a}) % ({b}) == ({a})");
        prop_assert!(matches!(eval(&source), Ok(Value::Bool(true))));
    }

    #[test]
    fn modulo_takes_the_sign_of_the_divisor(a in -1_000_000i64..1_000_000, b in 1i64..1_000) {
        let source = format!("({a}) % ({b})");
        match eval(&source) {
            Ok(Value::Int(r)) => prop_assert!((0..b).contains(&r)),
            other => prop_assert!(false, "Unexpected result {:?}", other),
        }
    }

    #[test]
    fn zero_divisor_always_raises(a in -1_000_000i64..1_000_000, op in prop_oneof![Just("/"), Just("//"), Just("%")]) {
        let source = format!("({a}) {op} 0");
        let raised = raised_class(&source);
        prop_assert_eq!(raised.as_deref(), Some("DivByZero"));
    }

    #[test]
    fn dump_of_ints_is_canonical(n in (i64::MIN + 1)..=i64::MAX) {
        prop_assert_eq!(eval_string(&format!("dump({n})")).ok(), Some(n.to_string()));
    }

    #[test]
    fn dump_of_floats_is_canonical(f in 1e-3f64..1e6) {
        let literal = format!("{f:?}");
        let dumped = eval_string(&format!("dump({literal})")).ok();
        prop_assert_eq!(dumped, Some(format!("{f}")).map(|text| {
            if text.contains('.') { text } else { format!("{text}.0") }
        }));
    }

    #[test]
    fn dump_of_strings_is_quoted(s in "[a-zA-Z0-9 ]*") {
        prop_assert_eq!(eval_string(&format!("dump('{s}')")).ok(), Some(format!("'{s}'")));
    }

    #[test]
    fn vector_identity_holds_for_any_components(
        v1 in prop::array::uniform3(-1_000_000_000i64..1_000_000_000),
        v2 in prop::array::uniform3(-1_000_000_000i64..1_000_000_000),
    ) {
        let v1 = v1.map(|component| component.to_string());
        let v2 = v2.map(|component| component.to_string());
        let source = vector_identity(
            [v1[0].as_str(), v1[1].as_str(), v1[2].as_str()],
            [v2[0].as_str(), v2[1].as_str(), v2[2].as_str()],
        );
        prop_assert!(matches!(eval(&source), Ok(Value::Bool(true))));
    }

    #[test]
    fn integer_arithmetic_matches_the_host(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
        let source = format!("[({a}) + ({b}), ({a}) - ({b}), ({a}) * ({b})]");
        let value = eval(&source).map(|value| value.to_string()).ok();
        prop_assert_eq!(value, Some(format!("[{}, {}, {}]", a + b, a - b, a * b)));
    }
}

#[test]
fn dump_of_atomic_literals() -> Result<()> {
    for literal in ["null", "true", "false", "'text'", "42", "2.5", "1.0"] {
        assert_eq!(eval_string(&format!("dump({literal})"))?, literal);
    }
    Ok(())
}
