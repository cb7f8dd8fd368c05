use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub col: usize,
    pub len: usize,
}

impl Span {
    pub fn new(line: usize, col: usize, len: usize) -> Self {
        Self { line, col, len }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOpToken {
    Equals,
    Minus,
    Plus,
    Star,
    Slash,
    Greater,
    Smaller,
    GreaterOrEquals,
    SmallerOrEquals,
}

/// Words that open a compound goal description or effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicToken {
    And,
    Or,
    Not,
    Imply,
    ForAll,
    Exists,
    When,
    Either,
    Preference,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TokenKind<'a> {
    OpenParenthesis,
    CloseParenthesis,
    BinOp(BinOpToken),
    Logic(LogicToken),
    /// `:name`, stored without the colon.
    Keyword(&'a str),
    /// `?name`, stored without the question mark.
    Variable(&'a str),
    Identifier(&'a str),
    Number(f64),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Token<'a> {
    pub span: Span,
    pub kind: TokenKind<'a>,
}

impl fmt::Display for BinOpToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BinOpToken::*;
        match self {
            Equals => write!(f, "="),
            Minus => write!(f, "-"),
            Plus => write!(f, "+"),
            Star => write!(f, "*"),
            Slash => write!(f, "/"),
            Greater => write!(f, ">"),
            Smaller => write!(f, "<"),
            GreaterOrEquals => write!(f, ">="),
            SmallerOrEquals => write!(f, "<="),
        }
    }
}

impl fmt::Display for LogicToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use LogicToken::*;
        match self {
            And => write!(f, "and"),
            Or => write!(f, "or"),
            Not => write!(f, "not"),
            Imply => write!(f, "imply"),
            ForAll => write!(f, "forall"),
            Exists => write!(f, "exists"),
            When => write!(f, "when"),
            Either => write!(f, "either"),
            Preference => write!(f, "preference"),
        }
    }
}

impl fmt::Display for TokenKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        match self {
            OpenParenthesis => write!(f, "("),
            CloseParenthesis => write!(f, ")"),
            BinOp(op) => write!(f, "{}", op),
            Logic(word) => write!(f, "{}", word),
            Keyword(k) => write!(f, ":{}", k),
            Variable(v) => write!(f, "?{}", v),
            Identifier(s) => write!(f, "{}", s),
            Number(n) => write!(f, "{}", n),
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}
