use super::{ResolutionError, ResolutionErrorKind};
use crate::lexer::LineBreaks;
use ariadne::{Color, Label, Report, ReportKind, Source};
use std::{fmt::Write, path::Path};

const WRITE_FMT_MSG: &str =
    "Encountered an error while attempting to write format string to buffer.";
const ARIADNE_MSG: &str = "Ariadne produces valid utf-8 strings";
const ARIADNE_WRITE_MSG: &str = "Write into buffer should not fail.";

pub trait ResolverFormatter {
    fn format_error(&self, error: &ResolutionError) -> String {
        let mut buffer = String::new();
        self.format_error_in_place(&mut buffer, error);
        buffer
    }
    fn format_error_in_place(&self, buffer: &mut String, error: &ResolutionError);
}

pub struct DebugResolverFormatter;

impl ResolverFormatter for DebugResolverFormatter {
    fn format_error_in_place(&self, buffer: &mut String, error: &ResolutionError) {
        write!(buffer, "{error:?}").expect(WRITE_FMT_MSG);
    }
}

pub struct BasicResolverFormatter {
    line_breaks: LineBreaks,
}

impl BasicResolverFormatter {
    pub fn new(text: &str) -> Self {
        Self {
            line_breaks: LineBreaks::new(text),
        }
    }
}

impl ResolverFormatter for BasicResolverFormatter {
    fn format_error_in_place(&self, buffer: &mut String, error: &ResolutionError) {
        let (line, column) = self.line_breaks.get_position(error.span);
        write!(buffer, "[line {line}:{column}] Error: {}", error.kind).expect(WRITE_FMT_MSG);
    }
}

pub struct PrettyResolverFormatter<'src> {
    text: &'src str,
    path: &'src Path,
}

impl<'src> PrettyResolverFormatter<'src> {
    pub fn new(text: &'src str, path: &'src Path) -> Self {
        Self { text, path }
    }
}

impl<'src> ResolverFormatter for PrettyResolverFormatter<'src> {
    fn format_error_in_place(&self, buffer: &mut String, error: &ResolutionError) {
        let text = self.text;
        let path = &self.path.to_string_lossy();
        let mut output = std::io::Cursor::new(Vec::new());
        let span = error.span;
        let (message, label) = match error.kind {
            ResolutionErrorKind::BreakOutsideLoop => (
                "Breaking outside of a loop",
                "There is no enclosing loop to break out of",
            ),
            ResolutionErrorKind::ContinueOutsideLoop => (
                "Continuing outside of a loop",
                "There is no enclosing loop to continue",
            ),
            ResolutionErrorKind::NonFunctionReturn => (
                "Returning from a non-function context",
                "Returning from here is an invalid operation",
            ),
        };
        Report::build(ReportKind::Error, (path, span.range()))
            .with_code(error.code())
            .with_message(message)
            .with_label(
                Label::new((path, span.range()))
                    .with_message(label)
                    .with_color(Color::BrightRed),
            )
            .finish()
            .write((path, Source::from(text)), &mut output)
            .expect(ARIADNE_WRITE_MSG);
        buffer.push_str(&String::from_utf8(output.into_inner()).expect(ARIADNE_MSG));
    }
}
