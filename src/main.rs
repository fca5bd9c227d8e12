use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::{fs::read_to_string, process::ExitCode};

use brook::interpreter::{AssignmentScope, InterpreterConfig, StdioContext, TreeWalkInterpreter};

const EXIT_SYNTAX_ERROR: u8 = 65;
const EXIT_RUNTIME_ERROR: u8 = 70;

static TRACING_INIT: Once = Once::new();

#[derive(Debug, Parser)]
#[clap(name = "brook", version)]
pub struct CLArgs {
    #[clap(subcommand)]
    pub routine: BrookCommand,
}

#[derive(Debug, Subcommand)]
pub enum BrookCommand {
    /// Print the token stream of a script.
    Tokenize {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "basic")]
        format: TokenFormat,
    },
    /// Print the syntax tree of a script.
    Parse {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "sexpr")]
        format: ProgramFormat,
    },
    /// Run a script.
    Run {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "pretty")]
        format: ErrorFormat,
        /// Maximum depth of nested guest calls.
        #[clap(long = "max-call-depth", default_value_t = InterpreterConfig::default().max_call_depth)]
        max_call_depth: usize,
        /// Bind plain assignments and function declarations in the global scope.
        #[clap(long = "global-assignment")]
        global_assignment: bool,
    },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum TokenFormat {
    Debug,
    Basic,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ProgramFormat {
    Debug,
    #[clap(name = "sexpr")]
    SExpr,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ErrorFormat {
    Debug,
    Basic,
    Pretty,
}

/// Installs a subscriber when `RUST_LOG` is set, e.g. `RUST_LOG=brook=debug`.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}

fn main() -> ExitCode {
    brook_main().expect("Encountered an error!")
}

fn brook_main() -> Result<ExitCode> {
    color_eyre::install().expect("Can't fail at first call!");
    init_tracing();
    let args = CLArgs::parse();
    let code = match args.routine {
        BrookCommand::Tokenize { path, format } => {
            let src = read_to_string(path)?;
            tokenize(&src, &format)
        }
        BrookCommand::Parse { path, format } => {
            let src = read_to_string(path)?;
            parse(&src, &format)
        }
        BrookCommand::Run {
            path,
            format,
            max_call_depth,
            global_assignment,
        } => {
            let src = read_to_string(&path)?;
            let config = InterpreterConfig {
                max_call_depth,
                assignment_scope: if global_assignment {
                    AssignmentScope::Global
                } else {
                    AssignmentScope::Lexical
                },
            };
            run(&src, &path, &format, config)
        }
    };
    Ok(code)
}

fn tokenize(src: &str, format: &TokenFormat) -> ExitCode {
    use brook::lexer::formatter::{BasicFormatter, DebugFormatter, ToFormatter, TokenFormatter};
    use brook::lexer::{Lexer, TokenKind};

    let mut scanner = Lexer::new(src);
    let formatter: Box<dyn TokenFormatter + '_> = match format {
        TokenFormat::Debug => Box::new(ToFormatter::<DebugFormatter>::create_formatter(&scanner)),
        TokenFormat::Basic => Box::new(ToFormatter::<BasicFormatter>::create_formatter(&scanner)),
    };
    let mut succeeded = true;
    loop {
        match scanner.next_token() {
            Ok(token) => {
                println!("{}", formatter.format(&token));
                if matches!(token.kind, TokenKind::Eof) {
                    break;
                }
            }
            Err(error) => {
                eprintln!("{}", formatter.format_lexical_error(&error));
                succeeded = false;
            }
        };
    }
    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_SYNTAX_ERROR)
    }
}

fn parse(src: &str, format: &ProgramFormat) -> ExitCode {
    use brook::parser::formatter::{
        BasicParserFormatter, DebugExpressionFormatter, ParserFormatter, ProgramFormatter,
        SExpressionFormatter,
    };
    use brook::parser::Parser;

    let formatter: Box<dyn ProgramFormatter> = match format {
        ProgramFormat::Debug => Box::new(DebugExpressionFormatter),
        ProgramFormat::SExpr => Box::new(SExpressionFormatter),
    };
    match Parser::new(src).parse() {
        Ok(program) => {
            println!("{}", formatter.format(&program));
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{}", BasicParserFormatter::new(src).format_error(&error));
            ExitCode::from(EXIT_SYNTAX_ERROR)
        }
    }
}

fn run(src: &str, path: &Path, format: &ErrorFormat, config: InterpreterConfig) -> ExitCode {
    use brook::parser::formatter::{
        BasicParserFormatter, DebugParserFormatter, ParserFormatter, PrettyParserFormatter,
    };
    use brook::parser::Parser;
    use brook::resolver::formatter::{
        BasicResolverFormatter, DebugResolverFormatter, PrettyResolverFormatter,
        ResolverFormatter,
    };
    use brook::resolver::Resolver;
    use brook::value::error::RuntimeError;
    use brook::value::formatter::{BasicFormatter, DebugFormatter, PrettyFormatter, ValueFormatter};

    let program = match Parser::new(src).parse() {
        Ok(program) => program,
        Err(error) => {
            let formatter: Box<dyn ParserFormatter + '_> = match format {
                ErrorFormat::Debug => Box::new(DebugParserFormatter),
                ErrorFormat::Basic => Box::new(BasicParserFormatter::new(src)),
                ErrorFormat::Pretty => Box::new(PrettyParserFormatter::new(src, path)),
            };
            eprintln!("{}", formatter.format_error(&error));
            return ExitCode::from(EXIT_SYNTAX_ERROR);
        }
    };

    if let Err(error) = Resolver::new().resolve_program(&program) {
        let formatter: Box<dyn ResolverFormatter + '_> = match format {
            ErrorFormat::Debug => Box::new(DebugResolverFormatter),
            ErrorFormat::Basic => Box::new(BasicResolverFormatter::new(src)),
            ErrorFormat::Pretty => Box::new(PrettyResolverFormatter::new(src, path)),
        };
        eprintln!("{}", formatter.format_error(&error));
        return ExitCode::from(EXIT_SYNTAX_ERROR);
    }

    let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut interpreter = TreeWalkInterpreter::new(StdioContext::with_root(root), config);
    match interpreter.run(&program) {
        Ok(_) => ExitCode::SUCCESS,
        Err(RuntimeError::Exit(code)) => ExitCode::from(exit_status(code)),
        Err(RuntimeError::Exception(exception)) => {
            let formatter: Box<dyn ValueFormatter + '_> = match format {
                ErrorFormat::Debug => Box::new(DebugFormatter),
                ErrorFormat::Basic => Box::new(BasicFormatter::new(src)),
                ErrorFormat::Pretty => Box::new(PrettyFormatter::new(src, path)),
            };
            eprintln!("{}", formatter.format_error(&exception));
            ExitCode::from(EXIT_RUNTIME_ERROR)
        }
    }
}

/// Codes outside `0..=255` can't be reported by the OS and map to 255.
fn exit_status(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::exit_status;

    #[test]
    fn exit_codes_never_wrap_to_success() {
        assert_eq!(exit_status(0), 0);
        assert_eq!(exit_status(3), 3);
        assert_eq!(exit_status(255), 255);
        assert_eq!(exit_status(256), 255);
        assert_eq!(exit_status(-1), 255);
    }
}
