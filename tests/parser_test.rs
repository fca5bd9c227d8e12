use color_eyre::eyre::{Context, Result};
use std::{
    fs::{read_dir, read_to_string},
    path::Path,
};

use brook::{
    parser::{
        formatter::{ExpressionFormatter, ProgramFormatter, SExpressionFormatter},
        Parser, ParserErrorKind,
    },
    resolver::{ResolutionErrorKind, Resolver},
};

fn check(input: &str, expected: &str, test_name: &str) {
    let mut parser = Parser::new(input);
    let actual = match parser.parse() {
        Ok(program) => ProgramFormatter::format(&SExpressionFormatter, &program),
        Err(error) => format!("{error}"),
    };
    assert_eq!(
        actual.trim_end(),
        expected.trim_end(),
        "Failed the test {test_name}"
    );
}

fn parse_expression(input: &str) -> String {
    let mut parser = Parser::new(input);
    let expression = parser
        .parse_expression()
        .expect("Expression should be valid.");
    ExpressionFormatter::format(&SExpressionFormatter, &expression)
}

#[test]
fn smoke_test() {
    check("", "", "smoke");
}

#[test]
fn bitwise_or_binds_tighter_than_comparison() {
    assert_eq!(parse_expression("1 | 2 < 3"), "(< (| 1 2) 3)");
}

#[test]
fn subtraction_is_left_associative() {
    assert_eq!(parse_expression("1 - 2 - 3"), "(- (- 1 2) 3)");
}

#[test]
fn negation_applies_after_power() {
    assert_eq!(parse_expression("-2 ** 2"), "(- (** 2 2))");
}

#[test]
fn compound_assignment_to_attribute_and_subscript() {
    check("a.b += 1\nc[0] //= 2", "(+= (. a b) 1)\n(//= ([] c 0) 2)", "targets");
}

#[test]
fn semicolons_are_optional() {
    check("a = 1; b = 2;;\nc = 3", "(= a 1)\n(= b 2)\n(= c 3)", "semicolons");
}

#[test]
fn assignment_to_call_is_rejected() {
    let error = Parser::new("f() = 1").parse().unwrap_err();
    assert!(matches!(error.kind, ParserErrorKind::InvalidAssignmentTarget));
}

#[test]
fn unclosed_block_is_rejected() {
    let error = Parser::new("while true { 1").parse().unwrap_err();
    assert!(matches!(error.kind, ParserErrorKind::UnexpectedToken { .. }));
}

#[test]
fn new_requires_a_class_name() {
    let error = Parser::new("new 1()").parse().unwrap_err();
    assert!(matches!(error.kind, ParserErrorKind::InvalidNewTarget));
}

#[test]
fn resolver_rejects_misplaced_control_flow() {
    let cases = [
        ("break", ResolutionErrorKind::BreakOutsideLoop),
        ("continue", ResolutionErrorKind::ContinueOutsideLoop),
        ("return 1", ResolutionErrorKind::NonFunctionReturn),
        ("class C { return 1 }", ResolutionErrorKind::NonFunctionReturn),
        (
            "while true { fun f() { break } }",
            ResolutionErrorKind::BreakOutsideLoop,
        ),
    ];
    for (source, expected) in cases {
        let program = Parser::new(source).parse().expect("Source should parse.");
        let error = Resolver::new()
            .resolve_program(&program)
            .expect_err("Resolution should fail.");
        assert_eq!(error.kind, expected, "Failed on {source:?}");
    }
}

#[test]
fn resolver_accepts_nested_loops_and_functions() {
    let source = "fun f() { for x in xs { while x { break } continue } return 1 }";
    let program = Parser::new(source).parse().expect("Source should parse.");
    assert!(Resolver::new().resolve_program(&program).is_ok());
}

#[test]
fn test_all() -> Result<()> {
    let input_dir = Path::new("./test_data/parser/in");
    let output_dir = Path::new("./test_data/parser/out");

    let mut succeeded = true;
    for entry in read_dir(input_dir).context("Failed to open input test data folder")? {
        let entry = entry?;
        let path = entry.path();

        let Some(extension) = path.extension() else {
            continue;
        };

        if extension != "brook" {
            continue;
        }

        let test_name = AsRef::<Path>::as_ref(
            path.file_name()
                .expect("File name can't be none as the path is to a real file."),
        );

        let input = read_to_string(&path).context("Failed to open input test data file")?;

        let expected = {
            let output_file_name = test_name.with_extension("txt");
            let output_path = output_dir.join(output_file_name);
            read_to_string(output_path).context("Failed to open output test data file")?
        };

        let res = std::panic::catch_unwind(|| {
            check(&input, &expected, &test_name.to_string_lossy());
        });
        if res.is_err() {
            succeeded = false;
        }
    }

    assert!(succeeded, "Some parser test cases failed.");

    Ok(())
}
