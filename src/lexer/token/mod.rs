use std::collections::HashMap;
use std::fmt::Display;
use std::ops::Range;
use std::sync::LazyLock;

/// The hashmap for keywords
pub static KEYWORD_HASHMAP: LazyLock<HashMap<&'static str, TokenKind>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    map.insert("and", TokenKind::KeywordAnd);
    map.insert("break", TokenKind::KeywordBreak);
    map.insert("class", TokenKind::KeywordClass);
    map.insert("continue", TokenKind::KeywordContinue);
    map.insert("do", TokenKind::KeywordDo);
    map.insert("else", TokenKind::KeywordElse);
    map.insert("false", TokenKind::KeywordFalse);
    map.insert("for", TokenKind::KeywordFor);
    map.insert("fun", TokenKind::KeywordFun);
    map.insert("if", TokenKind::KeywordIf);
    map.insert("in", TokenKind::KeywordIn);
    map.insert("include", TokenKind::KeywordInclude);
    map.insert("module", TokenKind::KeywordModule);
    map.insert("new", TokenKind::KeywordNew);
    map.insert("null", TokenKind::KeywordNull);
    map.insert("or", TokenKind::KeywordOr);
    map.insert("return", TokenKind::KeywordReturn);
    map.insert("true", TokenKind::KeywordTrue);
    map.insert("while", TokenKind::KeywordWhile);
    map
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// The byte position of the start of the token.
    pub start: u32,
    /// The length of the token in bytes.
    pub length: u32,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start as u32,
            length: end.saturating_sub(start) as u32,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end() as usize
    }

    pub fn end(&self) -> u32 {
        self.start + self.length
    }

    pub fn merge(&self, other: &Span) -> Span {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        Span {
            start,
            length: end - start,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Brackets
    LeftParenthesis,
    RightParenthesis,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    // Punctuation
    Comma,
    Dot,
    Colon,
    Semicolon,
    // Arithmetic
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    // Bitwise
    Ampersand,
    Pipe,
    Caret,
    Tilde,
    LessLess,
    GreaterGreater,
    // Logical
    Bang,
    AmpersandAmpersand,
    PipePipe,
    // Comparison
    BangEqual,
    EqualEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    // Assignment
    Equal,
    PlusEqual,
    MinusEqual,
    StarEqual,
    StarStarEqual,
    SlashEqual,
    SlashSlashEqual,
    PercentEqual,
    AmpersandEqual,
    PipeEqual,
    CaretEqual,
    LessLessEqual,
    GreaterGreaterEqual,

    // Literals
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    Ident,

    // Keywords
    KeywordAnd,
    KeywordBreak,
    KeywordClass,
    KeywordContinue,
    KeywordDo,
    KeywordElse,
    KeywordFalse,
    KeywordFor,
    KeywordFun,
    KeywordIf,
    KeywordIn,
    KeywordInclude,
    KeywordModule,
    KeywordNew,
    KeywordNull,
    KeywordOr,
    KeywordReturn,
    KeywordTrue,
    KeywordWhile,

    // End of file.
    Eof,
}

impl TokenKind {
    /// The fixed spelling of the token, or `None` for literals and identifiers.
    pub fn lexeme(&self) -> Option<&'static str> {
        let lexeme = match self {
            TokenKind::LeftParenthesis => "(",
            TokenKind::RightParenthesis => ")",
            TokenKind::LeftBrace => "{",
            TokenKind::RightBrace => "}",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::StarStar => "**",
            TokenKind::Slash => "/",
            TokenKind::SlashSlash => "//",
            TokenKind::Percent => "%",
            TokenKind::Ampersand => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::LessLess => "<<",
            TokenKind::GreaterGreater => ">>",
            TokenKind::Bang => "!",
            TokenKind::AmpersandAmpersand => "&&",
            TokenKind::PipePipe => "||",
            TokenKind::BangEqual => "!=",
            TokenKind::EqualEqual => "==",
            TokenKind::LessThan => "<",
            TokenKind::LessThanEqual => "<=",
            TokenKind::GreaterThan => ">",
            TokenKind::GreaterThanEqual => ">=",
            TokenKind::Equal => "=",
            TokenKind::PlusEqual => "+=",
            TokenKind::MinusEqual => "-=",
            TokenKind::StarEqual => "*=",
            TokenKind::StarStarEqual => "**=",
            TokenKind::SlashEqual => "/=",
            TokenKind::SlashSlashEqual => "//=",
            TokenKind::PercentEqual => "%=",
            TokenKind::AmpersandEqual => "&=",
            TokenKind::PipeEqual => "|=",
            TokenKind::CaretEqual => "^=",
            TokenKind::LessLessEqual => "<<=",
            TokenKind::GreaterGreaterEqual => ">>=",
            TokenKind::KeywordAnd => "and",
            TokenKind::KeywordBreak => "break",
            TokenKind::KeywordClass => "class",
            TokenKind::KeywordContinue => "continue",
            TokenKind::KeywordDo => "do",
            TokenKind::KeywordElse => "else",
            TokenKind::KeywordFalse => "false",
            TokenKind::KeywordFor => "for",
            TokenKind::KeywordFun => "fun",
            TokenKind::KeywordIf => "if",
            TokenKind::KeywordIn => "in",
            TokenKind::KeywordInclude => "include",
            TokenKind::KeywordModule => "module",
            TokenKind::KeywordNew => "new",
            TokenKind::KeywordNull => "null",
            TokenKind::KeywordOr => "or",
            TokenKind::KeywordReturn => "return",
            TokenKind::KeywordTrue => "true",
            TokenKind::KeywordWhile => "while",
            TokenKind::IntLiteral
            | TokenKind::FloatLiteral
            | TokenKind::StringLiteral
            | TokenKind::Ident
            | TokenKind::Eof => return None,
        };
        Some(lexeme)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::LeftParenthesis => write!(f, "LEFT_PAREN"),
            TokenKind::RightParenthesis => write!(f, "RIGHT_PAREN"),
            TokenKind::LeftBrace => write!(f, "LEFT_BRACE"),
            TokenKind::RightBrace => write!(f, "RIGHT_BRACE"),
            TokenKind::LeftBracket => write!(f, "LEFT_BRACKET"),
            TokenKind::RightBracket => write!(f, "RIGHT_BRACKET"),
            TokenKind::Comma => write!(f, "COMMA"),
            TokenKind::Dot => write!(f, "DOT"),
            TokenKind::Colon => write!(f, "COLON"),
            TokenKind::Semicolon => write!(f, "SEMICOLON"),
            TokenKind::Plus => write!(f, "PLUS"),
            TokenKind::Minus => write!(f, "MINUS"),
            TokenKind::Star => write!(f, "STAR"),
            TokenKind::StarStar => write!(f, "STAR_STAR"),
            TokenKind::Slash => write!(f, "SLASH"),
            TokenKind::SlashSlash => write!(f, "SLASH_SLASH"),
            TokenKind::Percent => write!(f, "PERCENT"),
            TokenKind::Ampersand => write!(f, "AMPERSAND"),
            TokenKind::Pipe => write!(f, "PIPE"),
            TokenKind::Caret => write!(f, "CARET"),
            TokenKind::Tilde => write!(f, "TILDE"),
            TokenKind::LessLess => write!(f, "LESS_LESS"),
            TokenKind::GreaterGreater => write!(f, "GREATER_GREATER"),
            TokenKind::Bang => write!(f, "BANG"),
            TokenKind::AmpersandAmpersand => write!(f, "AMPERSAND_AMPERSAND"),
            TokenKind::PipePipe => write!(f, "PIPE_PIPE"),
            TokenKind::BangEqual => write!(f, "BANG_EQUAL"),
            TokenKind::EqualEqual => write!(f, "EQUAL_EQUAL"),
            TokenKind::LessThan => write!(f, "LESS"),
            TokenKind::LessThanEqual => write!(f, "LESS_EQUAL"),
            TokenKind::GreaterThan => write!(f, "GREATER"),
            TokenKind::GreaterThanEqual => write!(f, "GREATER_EQUAL"),
            TokenKind::Equal => write!(f, "EQUAL"),
            TokenKind::PlusEqual => write!(f, "PLUS_EQUAL"),
            TokenKind::MinusEqual => write!(f, "MINUS_EQUAL"),
            TokenKind::StarEqual => write!(f, "STAR_EQUAL"),
            TokenKind::StarStarEqual => write!(f, "STAR_STAR_EQUAL"),
            TokenKind::SlashEqual => write!(f, "SLASH_EQUAL"),
            TokenKind::SlashSlashEqual => write!(f, "SLASH_SLASH_EQUAL"),
            TokenKind::PercentEqual => write!(f, "PERCENT_EQUAL"),
            TokenKind::AmpersandEqual => write!(f, "AMPERSAND_EQUAL"),
            TokenKind::PipeEqual => write!(f, "PIPE_EQUAL"),
            TokenKind::CaretEqual => write!(f, "CARET_EQUAL"),
            TokenKind::LessLessEqual => write!(f, "LESS_LESS_EQUAL"),
            TokenKind::GreaterGreaterEqual => write!(f, "GREATER_GREATER_EQUAL"),
            TokenKind::IntLiteral => write!(f, "INT"),
            TokenKind::FloatLiteral => write!(f, "FLOAT"),
            TokenKind::StringLiteral => write!(f, "STRING"),
            TokenKind::Ident => write!(f, "IDENTIFIER"),
            TokenKind::KeywordAnd => write!(f, "AND"),
            TokenKind::KeywordBreak => write!(f, "BREAK"),
            TokenKind::KeywordClass => write!(f, "CLASS"),
            TokenKind::KeywordContinue => write!(f, "CONTINUE"),
            TokenKind::KeywordDo => write!(f, "DO"),
            TokenKind::KeywordElse => write!(f, "ELSE"),
            TokenKind::KeywordFalse => write!(f, "FALSE"),
            TokenKind::KeywordFor => write!(f, "FOR"),
            TokenKind::KeywordFun => write!(f, "FUN"),
            TokenKind::KeywordIf => write!(f, "IF"),
            TokenKind::KeywordIn => write!(f, "IN"),
            TokenKind::KeywordInclude => write!(f, "INCLUDE"),
            TokenKind::KeywordModule => write!(f, "MODULE"),
            TokenKind::KeywordNew => write!(f, "NEW"),
            TokenKind::KeywordNull => write!(f, "NULL"),
            TokenKind::KeywordOr => write!(f, "OR"),
            TokenKind::KeywordReturn => write!(f, "RETURN"),
            TokenKind::KeywordTrue => write!(f, "TRUE"),
            TokenKind::KeywordWhile => write!(f, "WHILE"),
            TokenKind::Eof => write!(f, "EOF"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}
