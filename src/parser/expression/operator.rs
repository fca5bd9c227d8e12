use crate::lexer::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    Plus,
    Minus,
    Tilde,
    Bang,
}

impl PrefixOperator {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Plus => Some(Self::Plus),
            TokenKind::Minus => Some(Self::Minus),
            TokenKind::Tilde => Some(Self::Tilde),
            TokenKind::Bang => Some(Self::Bang),
            _ => None,
        }
    }

    pub fn get_binding_power(&self) -> u8 {
        match self {
            // 3. Prefix operators
            Self::Plus | Self::Minus | Self::Tilde | Self::Bang => 23,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Tilde => "~",
            Self::Bang => "!",
        }
    }

    /// Name of the overload hook consulted on instances.
    pub fn hook(&self) -> &'static str {
        match self {
            Self::Plus => "__pos__",
            Self::Minus => "__neg__",
            Self::Tilde => "__invert__",
            Self::Bang => "__not__",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    FloorDivide,
    Modulo,
    Power,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    EqualEqual,
    BangEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
}

impl InfixOperator {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Plus => Some(Self::Add),
            TokenKind::Minus => Some(Self::Subtract),
            TokenKind::Star => Some(Self::Multiply),
            TokenKind::Slash => Some(Self::Divide),
            TokenKind::SlashSlash => Some(Self::FloorDivide),
            TokenKind::Percent => Some(Self::Modulo),
            TokenKind::StarStar => Some(Self::Power),
            TokenKind::Ampersand => Some(Self::BitAnd),
            TokenKind::Pipe => Some(Self::BitOr),
            TokenKind::Caret => Some(Self::BitXor),
            TokenKind::LessLess => Some(Self::ShiftLeft),
            TokenKind::GreaterGreater => Some(Self::ShiftRight),
            TokenKind::EqualEqual => Some(Self::EqualEqual),
            TokenKind::BangEqual => Some(Self::BangEqual),
            TokenKind::LessThan => Some(Self::LessThan),
            TokenKind::LessThanEqual => Some(Self::LessThanEqual),
            TokenKind::GreaterThan => Some(Self::GreaterThan),
            TokenKind::GreaterThanEqual => Some(Self::GreaterThanEqual),
            _ => None,
        }
    }

    pub fn get_binding_power(&self) -> (u8, u8) {
        match self {
            // 2. Exponentiation (right associative)
            Self::Power => (26, 25),
            // 4. Multiplicative operators
            Self::Multiply | Self::Divide | Self::FloorDivide | Self::Modulo => (21, 22),
            // 5. Additive operators
            Self::Add | Self::Subtract => (19, 20),
            // 6. Shifts
            Self::ShiftLeft | Self::ShiftRight => (17, 18),
            // 7. Bitwise operators
            Self::BitAnd => (15, 16),
            Self::BitXor => (13, 14),
            Self::BitOr => (11, 12),
            // 8. Comparison operators
            Self::LessThan | Self::LessThanEqual | Self::GreaterThan | Self::GreaterThanEqual => {
                (9, 10)
            }
            // 9. Equality operators
            Self::EqualEqual | Self::BangEqual => (7, 8),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::FloorDivide => "//",
            Self::Modulo => "%",
            Self::Power => "**",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
            Self::EqualEqual => "==",
            Self::BangEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanEqual => ">=",
        }
    }

    /// Name of the overload hook consulted on instances.
    pub fn hook(&self) -> &'static str {
        match self {
            Self::Add => "__add__",
            Self::Subtract => "__sub__",
            Self::Multiply => "__mul__",
            Self::Divide => "__div__",
            Self::FloorDivide => "__floordiv__",
            Self::Modulo => "__mod__",
            Self::Power => "__pow__",
            Self::BitAnd => "__and__",
            Self::BitOr => "__or__",
            Self::BitXor => "__xor__",
            Self::ShiftLeft => "__lshift__",
            Self::ShiftRight => "__rshift__",
            Self::EqualEqual => "__eq__",
            Self::BangEqual => "__ne__",
            Self::LessThan => "__lt__",
            Self::LessThanEqual => "__le__",
            Self::GreaterThan => "__gt__",
            Self::GreaterThanEqual => "__ge__",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixShortCircuitOperator {
    And,
    Or,
}

impl InfixShortCircuitOperator {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::KeywordAnd | TokenKind::AmpersandAmpersand => Some(Self::And),
            TokenKind::KeywordOr | TokenKind::PipePipe => Some(Self::Or),
            _ => None,
        }
    }

    pub fn get_binding_power(&self) -> (u8, u8) {
        match self {
            // 10. Logical AND operator
            Self::And => (5, 6),
            // 11. Logical OR operator
            Self::Or => (3, 4),
        }
    }
}

/// `=` or one of the in-place operators such as `+=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixAssignmentOperator {
    Assign,
    Inplace(InfixOperator),
}

impl InfixAssignmentOperator {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        let operator = match kind {
            TokenKind::Equal => return Some(Self::Assign),
            TokenKind::PlusEqual => InfixOperator::Add,
            TokenKind::MinusEqual => InfixOperator::Subtract,
            TokenKind::StarEqual => InfixOperator::Multiply,
            TokenKind::StarStarEqual => InfixOperator::Power,
            TokenKind::SlashEqual => InfixOperator::Divide,
            TokenKind::SlashSlashEqual => InfixOperator::FloorDivide,
            TokenKind::PercentEqual => InfixOperator::Modulo,
            TokenKind::AmpersandEqual => InfixOperator::BitAnd,
            TokenKind::PipeEqual => InfixOperator::BitOr,
            TokenKind::CaretEqual => InfixOperator::BitXor,
            TokenKind::LessLessEqual => InfixOperator::ShiftLeft,
            TokenKind::GreaterGreaterEqual => InfixOperator::ShiftRight,
            _ => return None,
        };
        Some(Self::Inplace(operator))
    }

    pub fn get_binding_power(&self) -> (u8, u8) {
        // 12. Assignment operators
        (2, 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixOperator {
    Call,
    Subscript,
    Dot,
}

impl PostfixOperator {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::LeftParenthesis => Some(Self::Call),
            TokenKind::LeftBracket => Some(Self::Subscript),
            TokenKind::Dot => Some(Self::Dot),
            _ => None,
        }
    }

    pub fn get_binding_power(&self) -> u8 {
        match self {
            // 1. Call, subscript and attribute access
            Self::Call | Self::Subscript | Self::Dot => 27,
        }
    }
}
