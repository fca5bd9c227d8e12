mod cursor;
mod error;
pub mod formatter;
mod token;

use cursor::{Cursor, SourceChar};
pub use error::{LexicalError, LexicalErrorKind};
use std::{ops::Range, rc::Rc};
pub use token::{Span, Token, TokenKind, KEYWORD_HASHMAP};

/// Maps byte offsets into 1-based line and column numbers.
#[derive(Debug, Clone)]
pub struct LineBreaks {
    line_breaks: Rc<[Range<usize>]>,
}

impl LineBreaks {
    pub fn new(text: &str) -> Self {
        let line_breaks = if !text.is_empty() {
            let mut line_breaks = Vec::new();
            let mut cursor = 0;
            for (offset, byte) in text.bytes().enumerate() {
                let offset = offset + 1;
                if byte == b'\n' {
                    line_breaks.push(cursor..offset);
                    cursor = offset;
                }
            }
            if !text.ends_with('\n') {
                line_breaks.push(cursor..text.len() + 1);
            }
            line_breaks
        } else {
            vec![0..1]
        };
        Self {
            line_breaks: line_breaks.into(),
        }
    }

    pub fn get_max_line(&self) -> u32 {
        (self.line_breaks.len() + 1) as u32
    }

    pub fn get_line(&self, offset: usize) -> u32 {
        self.find(offset)
            .map(|v| (v + 1) as u32)
            .unwrap_or(self.get_max_line())
    }

    pub fn get_column(&self, offset: usize) -> u32 {
        match self.find(offset) {
            Some(index) => (offset - self.line_breaks[index].start + 1) as u32,
            None => 1,
        }
    }

    pub fn get_line_from_span(&self, span: Span) -> u32 {
        self.get_line(span.start as usize)
    }

    pub fn get_position(&self, span: Span) -> (u32, u32) {
        let offset = span.start as usize;
        (self.get_line(offset), self.get_column(offset))
    }

    fn find(&self, offset: usize) -> Option<usize> {
        self.line_breaks
            .binary_search_by(|r| {
                if offset < r.start {
                    std::cmp::Ordering::Greater
                } else if offset >= r.end {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .ok()
    }
}

#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    source: &'src str,
    cursor: Cursor<'src>,
    line_breaks: LineBreaks,
    finished: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            cursor: Cursor::new(source),
            line_breaks: LineBreaks::new(source),
            finished: false,
        }
    }

    pub fn get_source(&self) -> &'src str {
        self.source
    }

    pub fn get_line_breaks(&self) -> LineBreaks {
        self.line_breaks.clone()
    }

    pub fn get_lexeme(&self, span: &Span) -> Option<&'src str> {
        self.source.get(span.range())
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl<'src> Lexer<'src> {
    pub fn next_token(&mut self) -> Result<Token, LexicalError> {
        self.skip_trivia();

        let Some(first) = self.cursor.bump() else {
            self.finished = true;
            return Ok(Token {
                kind: TokenKind::Eof,
                span: Span::new(self.source.len(), self.source.len()),
            });
        };

        let kind = match first.value {
            '(' => TokenKind::LeftParenthesis,
            ')' => TokenKind::RightParenthesis,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '~' => TokenKind::Tilde,
            '+' => self.with_equal(TokenKind::Plus, TokenKind::PlusEqual),
            '-' => self.with_equal(TokenKind::Minus, TokenKind::MinusEqual),
            '%' => self.with_equal(TokenKind::Percent, TokenKind::PercentEqual),
            '^' => self.with_equal(TokenKind::Caret, TokenKind::CaretEqual),
            '!' => self.with_equal(TokenKind::Bang, TokenKind::BangEqual),
            '=' => self.with_equal(TokenKind::Equal, TokenKind::EqualEqual),
            '*' => {
                if self.cursor.bump_if('*') {
                    self.with_equal(TokenKind::StarStar, TokenKind::StarStarEqual)
                } else {
                    self.with_equal(TokenKind::Star, TokenKind::StarEqual)
                }
            }
            '/' => {
                if self.cursor.bump_if('/') {
                    self.with_equal(TokenKind::SlashSlash, TokenKind::SlashSlashEqual)
                } else {
                    self.with_equal(TokenKind::Slash, TokenKind::SlashEqual)
                }
            }
            '&' => {
                if self.cursor.bump_if('&') {
                    TokenKind::AmpersandAmpersand
                } else {
                    self.with_equal(TokenKind::Ampersand, TokenKind::AmpersandEqual)
                }
            }
            '|' => {
                if self.cursor.bump_if('|') {
                    TokenKind::PipePipe
                } else {
                    self.with_equal(TokenKind::Pipe, TokenKind::PipeEqual)
                }
            }
            '<' => {
                if self.cursor.bump_if('<') {
                    self.with_equal(TokenKind::LessLess, TokenKind::LessLessEqual)
                } else {
                    self.with_equal(TokenKind::LessThan, TokenKind::LessThanEqual)
                }
            }
            '>' => {
                if self.cursor.bump_if('>') {
                    self.with_equal(TokenKind::GreaterGreater, TokenKind::GreaterGreaterEqual)
                } else {
                    self.with_equal(TokenKind::GreaterThan, TokenKind::GreaterThanEqual)
                }
            }
            '"' | '\'' => return self.lex_string(first),
            '0'..='9' => return self.lex_number(first),
            'a'..='z' | 'A'..='Z' | '_' => {
                self.cursor
                    .bump_while(|c| c.is_ascii_alphanumeric() || c == '_');
                let span = Span::new(first.offset, self.cursor.offset());
                let lexeme = &self.source[span.range()];
                let kind = KEYWORD_HASHMAP
                    .get(lexeme)
                    .copied()
                    .unwrap_or(TokenKind::Ident);
                return Ok(Token { kind, span });
            }
            c => {
                return Err(LexicalError {
                    kind: LexicalErrorKind::Unrecognized(c),
                    span: Span::new(first.offset, first.next_offset()),
                })
            }
        };

        Ok(Token {
            kind,
            span: Span::new(first.offset, self.cursor.offset()),
        })
    }

    fn with_equal(&mut self, bare: TokenKind, with_equal: TokenKind) -> TokenKind {
        if self.cursor.bump_if('=') {
            with_equal
        } else {
            bare
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.cursor.peek() {
                Some(c) if c.is_whitespace() => {
                    self.cursor.bump();
                }
                Some('#') => self.cursor.bump_while(|c| c != '\n'),
                _ => break,
            }
        }
    }

    fn lex_number(&mut self, first: SourceChar) -> Result<Token, LexicalError> {
        self.cursor.bump_while(|c| c.is_ascii_digit() || c == '_');

        let mut kind = TokenKind::IntLiteral;
        if self.cursor.peek() == Some('.')
            && self.cursor.peek_second().is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.bump();
            self.cursor.bump_while(|c| c.is_ascii_digit() || c == '_');
            kind = TokenKind::FloatLiteral;
        }

        if matches!(self.cursor.peek(), Some('e' | 'E')) {
            let mut lookahead = self.cursor.clone();
            lookahead.bump();
            if !lookahead.bump_if('+') {
                lookahead.bump_if('-');
            }
            if lookahead.peek().is_some_and(|c| c.is_ascii_digit()) {
                lookahead.bump_while(|c| c.is_ascii_digit());
                self.cursor = lookahead;
                kind = TokenKind::FloatLiteral;
            }
        }

        let span = Span::new(first.offset, self.cursor.offset());
        if kind == TokenKind::IntLiteral {
            let digits = self.source[span.range()].replace('_', "");
            if digits.parse::<i64>().is_err() {
                return Err(LexicalError {
                    kind: LexicalErrorKind::IntegerTooLarge(digits),
                    span,
                });
            }
        }
        Ok(Token { kind, span })
    }

    fn lex_string(&mut self, first: SourceChar) -> Result<Token, LexicalError> {
        let quote = first.value;
        loop {
            match self.cursor.bump() {
                Some(SourceChar { value: '\\', .. }) => {
                    self.cursor.bump();
                }
                Some(SourceChar { value, .. }) if value == quote => {
                    return Ok(Token {
                        kind: TokenKind::StringLiteral,
                        span: Span::new(first.offset, self.cursor.offset()),
                    });
                }
                Some(_) => {}
                None => {
                    return Err(LexicalError {
                        kind: LexicalErrorKind::UnclosedString,
                        span: Span::new(first.offset, self.cursor.offset()),
                    })
                }
            }
        }
    }
}

/// Decodes the body of a string literal lexeme, quotes included.
pub fn unescape_string(lexeme: &str) -> String {
    let body = lexeme
        .get(1..lexeme.len().saturating_sub(1))
        .unwrap_or_default();
    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some('r') => value.push('\r'),
            Some('0') => value.push('\0'),
            Some(other) => value.push(other),
            None => value.push('\\'),
        }
    }
    value
}
