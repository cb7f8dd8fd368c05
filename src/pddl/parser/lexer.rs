use std::iter::Peekable;
use std::str::CharIndices;

use super::tokens::{Token, Span, TokenKind, BinOpToken, LogicToken};
use super::{Error, Position};
use TokenKind::*;
use BinOpToken::*;

pub struct Lexer<'a> {
    text: &'a str,
    it: Peekable<CharIndices<'a>>,
    line: usize, // current source line, used for error reporting by Tokens
    col: usize, // current source column, used for error reporting by Tokens
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            it: text.char_indices().peekable(),
            line: 1,
            col: 1,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_trivia();
        let (offset, c) = self.it.next()?;
        let span = Span::new(self.line, self.col, 1);
        let new_token = match c {
            '(' => Ok(Token { span, kind: OpenParenthesis }),
            ')' => Ok(Token { span, kind: CloseParenthesis }),
            '=' => Ok(Token { span, kind: BinOp(Equals) }),
            '+' => Ok(Token { span, kind: BinOp(Plus) }),
            '*' => Ok(Token { span, kind: BinOp(Star) }),
            '/' => Ok(Token { span, kind: BinOp(Slash) }),
            '-' => match self.it.peek() {
                Some((_, d)) if d.is_ascii_digit() => self.number(offset),
                _ => Ok(Token { span, kind: BinOp(Minus) }),
            },
            '>' => match self.it.next_if(|(_, c)| *c == '=') {
                Some(_) => Ok(Token { span: Span::new(self.line, self.col, 2), kind: BinOp(GreaterOrEquals) }),
                None => Ok(Token { span, kind: BinOp(Greater) }),
            },
            '<' => match self.it.next_if(|(_, c)| *c == '=') {
                Some(_) => Ok(Token { span: Span::new(self.line, self.col, 2), kind: BinOp(SmallerOrEquals) }),
                None => Ok(Token { span, kind: BinOp(Smaller) }),
            },
            ':' => self.prefixed(offset, Keyword, "Expected keyword after ':'."),
            '?' => self.prefixed(offset, Variable, "Expected variable name after '?'."),
            c if c.is_alphabetic() || c == '_' => Ok(self.identifier(offset)),
            c if c.is_ascii_digit() => self.number(offset),
            _ => Err(Error::new(Position::Span(span), "Unexpected character.")),
        };
        match &new_token {
            Ok(t) => self.col += t.span.len,
            Err(_) => self.col += 1,
        }
        Some(new_token)
    }
}

impl<'a> Lexer<'a> {
    /// Consumes whitespace and `;` comments, keeping line/column in sync.
    fn skip_trivia(&mut self) {
        loop {
            match self.it.peek() {
                Some((_, '\n')) => {
                    self.it.next();
                    self.line += 1;
                    self.col = 1;
                }
                Some((_, ';')) => {
                    while self.it.next_if(|(_, c)| *c != '\n').is_some() {}
                }
                Some((_, c)) if c.is_whitespace() => {
                    self.it.next();
                    self.col += 1;
                }
                _ => return,
            }
        }
    }

    fn end_offset(&mut self) -> usize {
        match self.it.peek() {
            Some((end, _)) => *end,
            None => self.text.len(),
        }
    }

    fn name(&mut self, start: usize) -> &'a str {
        while self.it.next_if(|(_, c)| c.is_alphanumeric() || *c == '_' || *c == '-').is_some() {}
        let end = self.end_offset();
        &self.text[start..end]
    }

    fn prefixed(&mut self, offset: usize, kind: fn(&'a str) -> TokenKind<'a>, err: &str) -> Result<Token<'a>, Error> {
        let start = offset + 1;
        let slice = self.name(start);
        if slice.is_empty() {
            return Err(Error::new(Position::Span(Span::new(self.line, self.col, 1)), err));
        }
        Ok(Token { span: Span::new(self.line, self.col, slice.chars().count() + 1), kind: kind(slice) })
    }

    fn number(&mut self, offset: usize) -> Result<Token<'a>, Error> {
        while self.it.next_if(|(_, c)| c.is_ascii_digit() || *c == '.').is_some() {}
        let end = self.end_offset();
        let slice = &self.text[offset..end];
        match slice.parse::<f64>() {
            Ok(literal) => Ok(Token { span: Span::new(self.line, self.col, slice.len()), kind: Number(literal) }),
            Err(_) => Err(Error::new(Position::Span(Span::new(self.line, self.col, slice.len())), "Unable to parse number.")),
        }
    }

    fn identifier(&mut self, offset: usize) -> Token<'a> {
        use LogicToken::*;
        let slice = self.name(offset);
        let span = Span::new(self.line, self.col, slice.chars().count());
        let kind = match slice.to_ascii_lowercase().as_str() {
            "and" => Logic(And),
            "or" => Logic(Or),
            "not" => Logic(Not),
            "imply" => Logic(Imply),
            "forall" => Logic(ForAll),
            "exists" => Logic(Exists),
            "when" => Logic(When),
            "either" => Logic(Either),
            "preference" => Logic(Preference),
            _ => Identifier(slice),
        };
        Token { span, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::{Lexer, Token, Span, TokenKind::*, BinOpToken::*, LogicToken};

    #[test]
    fn test_action_header() {
        let code = "(:action pick-up\n :parameters (?b - block))";
        let mut l = Lexer::new(code);
        assert_eq!(l.next(), Some(Ok(Token { span: Span::new(1, 1, 1), kind: OpenParenthesis })));
        assert_eq!(l.next(), Some(Ok(Token { span: Span::new(1, 2, 7), kind: Keyword("action") })));
        assert_eq!(l.next(), Some(Ok(Token { span: Span::new(1, 10, 7), kind: Identifier("pick-up") })));
        assert_eq!(l.next(), Some(Ok(Token { span: Span::new(2, 2, 11), kind: Keyword("parameters") })));
        assert_eq!(l.next(), Some(Ok(Token { span: Span::new(2, 14, 1), kind: OpenParenthesis })));
        assert_eq!(l.next(), Some(Ok(Token { span: Span::new(2, 15, 2), kind: Variable("b") })));
        assert_eq!(l.next(), Some(Ok(Token { span: Span::new(2, 18, 1), kind: BinOp(Minus) })));
        assert_eq!(l.next(), Some(Ok(Token { span: Span::new(2, 20, 5), kind: Identifier("block") })));
        assert_eq!(l.next(), Some(Ok(Token { span: Span::new(2, 25, 1), kind: CloseParenthesis })));
        assert_eq!(l.next(), Some(Ok(Token { span: Span::new(2, 26, 1), kind: CloseParenthesis })));
        assert_eq!(l.next(), None);
    }

    #[test]
    fn test_comments_and_logic_words() {
        let code = "; a comment\n(AND (not (= ?x ?y)) (>= 1.5 -2))";
        let kinds: Vec<_> = Lexer::new(code).map(|t| t.map(|t| t.kind)).collect::<Result<_, _>>().unwrap();
        assert_eq!(kinds, vec![
            OpenParenthesis, Logic(LogicToken::And),
            OpenParenthesis, Logic(LogicToken::Not),
            OpenParenthesis, BinOp(Equals), Variable("x"), Variable("y"), CloseParenthesis,
            CloseParenthesis,
            OpenParenthesis, BinOp(GreaterOrEquals), Number(1.5), Number(-2.0), CloseParenthesis,
            CloseParenthesis,
        ]);
    }

    #[test]
    fn test_unexpected_character() {
        let mut l = Lexer::new("(#)");
        assert!(matches!(l.next(), Some(Ok(_))));
        assert!(matches!(l.next(), Some(Err(_))));
        assert!(matches!(l.next(), Some(Ok(Token { kind: CloseParenthesis, .. }))));
    }
}
