use std::path::Path;

use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};

use super::{error::Exception, Value};
use crate::lexer::LineBreaks;

const ARIADNE_MSG: &str = "Ariadne produces valid utf-8 strings";
const ARIADNE_WRITE_MSG: &str = "Write into buffer should not fail.";

pub trait ValueFormatter {
    fn format(&self, value: &Value) -> String;
    fn format_error(&self, error: &Exception) -> String;
}

pub struct DebugFormatter;

impl ValueFormatter for DebugFormatter {
    fn format(&self, value: &Value) -> String {
        format!("{value:?}")
    }

    fn format_error(&self, error: &Exception) -> String {
        format!("{error:?}")
    }
}

pub struct BasicFormatter {
    line_breaks: LineBreaks,
}

impl BasicFormatter {
    pub fn new(text: &str) -> Self {
        Self {
            line_breaks: LineBreaks::new(text),
        }
    }
}

impl ValueFormatter for BasicFormatter {
    fn format(&self, value: &Value) -> String {
        format!("{value}")
    }

    fn format_error(&self, error: &Exception) -> String {
        let (line, column) = self.line_breaks.get_position(error.span);
        format!("({line}:{column}) [Runtime] {error}")
    }
}

/// Renders uncaught exceptions as annotated source reports.
pub struct PrettyFormatter<'src> {
    text: &'src str,
    path: &'src Path,
    line_breaks: LineBreaks,
}

impl<'src> PrettyFormatter<'src> {
    pub fn new(text: &'src str, path: &'src Path) -> Self {
        Self {
            text,
            path,
            line_breaks: LineBreaks::new(text),
        }
    }
}

impl<'src> ValueFormatter for PrettyFormatter<'src> {
    fn format(&self, value: &Value) -> String {
        format!("{value}")
    }

    fn format_error(&self, error: &Exception) -> String {
        let path = self.path.to_string_lossy();
        let path: &str = &path;
        let mut output = std::io::Cursor::new(Vec::new());
        let mut report = Report::build(ReportKind::Error, (path, error.span.range()))
            .with_code(error.code())
            .with_message(format!("Uncaught {}", error.class_name.as_str().fg(Color::Red)))
            .with_label(
                Label::new((path, error.span.range()))
                    .with_message(error.message.as_str())
                    .with_color(Color::Red),
            );
        for frame in error.traceback.iter().rev() {
            let (line, column) = self.line_breaks.get_position(frame.span);
            report = report.with_note(format!(
                "in {} called at line {line}:{column}",
                frame.name.as_str().fg(Color::Cyan)
            ));
        }
        report
            .finish()
            .write((path, Source::from(self.text)), &mut output)
            .expect(ARIADNE_WRITE_MSG);
        String::from_utf8(output.into_inner()).expect(ARIADNE_MSG)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::{
        lexer::Span,
        value::{error::CallFrame, Class, Instance},
    };

    fn exception(span: Span) -> Exception {
        let class = Rc::new(Class::new("DivByZero", Default::default(), None));
        Exception {
            payload: Rc::new(Instance::new(class)),
            class_name: "DivByZero".into(),
            message: "Division by zero.".into(),
            span,
            traceback: vec![CallFrame {
                name: "divide".into(),
                span: Span::new(0, 3),
            }],
            code: Some("RT001"),
        }
    }

    #[test]
    fn basic_reports_position_class_and_message() {
        let text = "x = 1\ny = x / 0\n";
        let formatter = BasicFormatter::new(text);
        let error = exception(Span::new(10, 15));
        assert_eq!(
            formatter.format_error(&error),
            "(2:5) [Runtime] DivByZero: Division by zero."
        );
    }

    #[test]
    fn pretty_includes_code_and_traceback() {
        let text = "x = 1\ny = x / 0\n";
        let path = Path::new("test.brook");
        let formatter = PrettyFormatter::new(text, path);
        let report = formatter.format_error(&exception(Span::new(10, 15)));
        assert!(report.contains("RT001"));
        assert!(report.contains("Division by zero."));
        assert!(report.contains("divide"));
    }
}
