use super::{
    token::{Token, TokenKind},
    unescape_string, LineBreaks,
};
use crate::lexer::{Lexer, LexicalError, LexicalErrorKind};

/// Interface for creating new token formatters.
pub trait TokenFormatter {
    /// Formats a token into a string.
    fn format(&self, token: &Token) -> String;
    /// Formats a lexer error into a string.
    fn format_lexical_error(&self, error: &LexicalError) -> String;
}

pub trait ToFormatter<F>
where
    F: TokenFormatter,
{
    fn create_formatter(&self) -> F;
}

/// Prints one token per line as `KIND lexeme literal`.
pub struct BasicFormatter<'src> {
    text: &'src str,
    line_breaks: LineBreaks,
}

impl<'src> ToFormatter<BasicFormatter<'src>> for Lexer<'src> {
    fn create_formatter(&self) -> BasicFormatter<'src> {
        BasicFormatter {
            text: self.get_source(),
            line_breaks: self.get_line_breaks(),
        }
    }
}

impl<'src> TokenFormatter for BasicFormatter<'src> {
    fn format(&self, token: &Token) -> String {
        let lexeme = &self.text[token.span.range()];
        match token.kind {
            TokenKind::Eof => "EOF  null".into(),
            TokenKind::IntLiteral => {
                let value: i64 = lexeme
                    .replace('_', "")
                    .parse()
                    .expect("Integer literals are validated by the lexer.");
                format!("INT {lexeme} {value}")
            }
            TokenKind::FloatLiteral => {
                let value: f64 = lexeme
                    .replace('_', "")
                    .parse()
                    .expect("Float literals are guaranteed to be parseable into f64.");
                format!("FLOAT {lexeme} {value:?}")
            }
            TokenKind::StringLiteral => {
                let value = unescape_string(lexeme);
                format!("STRING {lexeme} {value}")
            }
            TokenKind::Ident => format!("IDENTIFIER {lexeme} null"),
            kind => format!("{kind} {lexeme} null"),
        }
    }

    fn format_lexical_error(&self, error: &LexicalError) -> String {
        let (line, column) = self.line_breaks.get_position(error.span);
        match &error.kind {
            LexicalErrorKind::Unrecognized(c) => {
                format!("[line {line}:{column}] Error: Unexpected character: {c}")
            }
            LexicalErrorKind::UnclosedString => {
                format!("[line {line}:{column}] Error: Unterminated string.")
            }
            LexicalErrorKind::IntegerTooLarge(digits) => {
                format!("[line {line}:{column}] Error: Integer literal {digits} is too large.")
            }
        }
    }
}

pub struct DebugFormatter;

impl<'src> ToFormatter<DebugFormatter> for Lexer<'src> {
    fn create_formatter(&self) -> DebugFormatter {
        DebugFormatter {}
    }
}

impl TokenFormatter for DebugFormatter {
    fn format(&self, token: &Token) -> String {
        format!("{token:?}")
    }

    fn format_lexical_error(&self, error: &LexicalError) -> String {
        format!("{error:?}")
    }
}
