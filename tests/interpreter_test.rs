use std::{
    fs::{read_dir, read_to_string},
    path::Path,
};

use brook::{
    interpreter::{AssignmentScope, BufferedContext, InterpreterConfig, TreeWalkInterpreter},
    lexer::LineBreaks,
    parser::Parser,
    resolver::Resolver,
    value::error::RuntimeError,
};
use color_eyre::{eyre::Context, Result};

#[test]
fn test_arithmetic() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/arithmetic");
    test_engine(input_dir)
}

#[test]
fn test_assignment() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/assignment");
    test_engine(input_dir)
}

#[test]
fn test_class() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/class");
    test_engine(input_dir)
}

#[test]
fn test_closure() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/closure");
    test_engine(input_dir)
}

#[test]
fn test_collection() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/collection");
    test_engine(input_dir)
}

#[test]
fn test_control_flow() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/control_flow");
    test_engine(input_dir)
}

#[test]
fn test_exception() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/exception");
    test_engine(input_dir)
}

#[test]
fn test_include() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/include");
    test_engine(input_dir)
}

#[test]
fn test_iterator() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/iterator");
    test_engine(input_dir)
}

#[test]
fn test_module() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/module");
    test_engine(input_dir)
}

#[test]
fn test_overload() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/overload");
    test_engine(input_dir)
}

#[test]
fn test_string() -> Result<()> {
    let input_dir = Path::new("./test_data/interpreter/string");
    test_engine(input_dir)
}

struct TestCase {
    name: String,
    source: String,
    config: InterpreterConfig,
    /// Files reachable through `include`, keyed by their file name.
    includes: Vec<(String, String)>,
    output: String,
    compiler_errors: String,
    runtime_errors: String,
}

impl TestCase {
    pub fn check(&self) {
        let line_breaks = LineBreaks::new(&self.source);

        let program = match Parser::new(&self.source).parse() {
            Ok(program) => program,
            Err(error) => {
                let line = line_breaks.get_line_from_span(error.span);
                let actual = format!("({line}) [Compiler] {error}");
                assert_eq!(
                    self.compiler_errors, actual,
                    "Failed test {} at parsing stage.",
                    self.name,
                );
                return;
            }
        };

        if let Err(error) = Resolver::new().resolve_program(&program) {
            let line = line_breaks.get_line_from_span(error.span);
            let actual = format!("({line}) [Compiler] {error}");
            assert_eq!(
                self.compiler_errors, actual,
                "Failed test {} at resolution stage.",
                self.name,
            );
            return;
        }
        assert!(
            self.compiler_errors.is_empty(),
            "Test {} expected a compile error.",
            self.name
        );

        let mut context = BufferedContext::new();
        for (path, source) in &self.includes {
            context = context.with_include(path, source);
        }
        let mut interpreter = TreeWalkInterpreter::new(context.clone(), self.config.clone());
        let runtime_errors = match interpreter.run(&program) {
            Ok(_) | Err(RuntimeError::Exit(_)) => String::new(),
            Err(RuntimeError::Exception(exception)) => {
                let line = line_breaks.get_line_from_span(exception.span);
                format!("({line}) [Runtime] {exception}")
            }
        };
        assert_eq!(
            self.runtime_errors, runtime_errors,
            "Failed test {} at runtime.",
            self.name,
        );
        assert_eq!(
            self.output,
            context.into_data(),
            "Failed test {} at print.",
            self.name
        );
    }
}

fn test_engine(input_dir: &Path) -> Result<()> {
    let includes = collect_includes(input_dir)?;

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

        println!("Parsing {path:?}");
        let mut test_case = parse_test_case(&path)?;
        test_case.includes = includes.clone();
        println!("Checking {}", test_case.name);

        let res = std::panic::catch_unwind(|| {
            test_case.check();
        });
        if res.is_err() {
            println!("\tFails test case {}", test_case.name);
            succeeded = false;
        }
    }

    assert!(succeeded, "Some interpreter test cases failed.");

    Ok(())
}

/// Files ending in `.inc` are only run through `include`.
fn collect_includes(input_dir: &Path) -> Result<Vec<(String, String)>> {
    let mut includes = Vec::new();
    for entry in read_dir(input_dir).context("Failed to open input test data folder")? {
        let path = entry?.path();
        if path.extension().is_some_and(|extension| extension == "inc") {
            let name = path
                .file_name()
                .expect("File name can't be none as the path is to a real file.")
                .to_string_lossy()
                .into_owned();
            let source = read_to_string(&path).context("Failed to open include file")?;
            includes.push((name, source));
        }
    }
    Ok(includes)
}

fn parse_test_case(input_path: &Path) -> Result<TestCase> {
    let test_name = AsRef::<Path>::as_ref(
        input_path
            .file_name()
            .expect("File name can't be none as the path is to a real file."),
    )
    .to_string_lossy();

    let input = read_to_string(input_path).context("Failed to open input test data file")?;

    let mut config = InterpreterConfig::default();
    let mut expected_outputs = Vec::new();
    let mut expected_compiler_errors = Vec::new();
    let mut expected_runtime_errors = Vec::new();

    for (line_index, line) in input.lines().enumerate() {
        if let Some((_, expected)) = line.split_once("# expect: ") {
            expected_outputs.push(expected.trim_end().to_string());
        } else if let Some((_, expected)) = line.split_once("# expect runtime error: ") {
            let expected = format!("({}) [Runtime] {}", line_index + 1, expected.trim_end());
            expected_runtime_errors.push(expected);
        } else if let Some((_, expected)) = line.split_once("# expect compile error: ") {
            let expected = format!("({}) [Compiler] {}", line_index + 1, expected.trim_end());
            expected_compiler_errors.push(expected);
        } else if let Some((_, option)) = line.split_once("# config: ") {
            match option.trim().split_once('=') {
                Some(("max-call-depth", depth)) => {
                    config.max_call_depth = depth.parse().context("Invalid call depth")?;
                }
                None if option.trim() == "global-assignment" => {
                    config.assignment_scope = AssignmentScope::Global;
                }
                _ => panic!("Unknown config option {option:?} in {test_name}"),
            }
        }
    }

    let mut output = expected_outputs.join("\n");
    if !output.is_empty() {
        output.push('\n');
    }
    Ok(TestCase {
        name: test_name.into_owned(),
        source: input,
        config,
        includes: Vec::new(),
        output,
        compiler_errors: expected_compiler_errors.join("\n"),
        runtime_errors: expected_runtime_errors.join("\n"),
    })
}
