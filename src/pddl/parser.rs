pub mod lexer;
pub mod ast;
pub mod tokens;

use std::fmt;
use std::iter::Peekable;
use std::mem;

use enumset::EnumSet;
use log::warn;

use ast::{Stmt, TypedList, Atom, Term, Expr, Effect, ComparisonOp, NumericOp, Requirements};
use lexer::Lexer;
use tokens::{Token, Span, TokenKind, BinOpToken, LogicToken};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    Span(Span),
    EOF,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Span(span) => write!(f, "line:{} col:{}", span.line, span.col),
            Position::EOF => write!(f, "end of file:"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{pos} {message}")]
pub struct Error {
    pub pos: Position,
    pub message: String,
}

impl Error {
    pub fn new(pos: Position, message: &str) -> Self {
        Self { pos, message: message.to_owned() }
    }
}

/// Parses the PDDL subset used by classical planning domains
/// Based on https://github.com/jan-dolejsi/pddl-reference/blob/master/_citedpapers/pddl3bnf.pdf
pub struct Parser<'a> {
    lexer: Peekable<Lexer<'a>>,
}

impl<'a> Iterator for Parser<'a> {
    type Item = Result<Stmt, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lexer.peek()?;
        let r = self.root();
        if r.is_err() {
            self.error_recover();
        }
        Some(r)
    }
}

const EXPECTED_IDENTIFIER: &str = "Expected identifier.";
const EXPECTED_OPEN_PARENTHESIS: &str = "Expected '('.";
const EXPECTED_CLOSE_PARENTHESIS: &str = "Expected matched ')'.";

macro_rules! expect {
    ($input:expr, {$($p:pat $(if $g:expr)? => $b:expr$(,)?)+}, $err:expr) => {
        match $input {
            $($p $(if $g)? => $b,)+
            Some(Ok(Token{span,..})) => Err(Error { pos: Position::Span(span), message: String::from($err) }),
            Some(Err(e)) => Err(e),
            None => Err(Error { pos: Position::EOF, message: String::from($err) })
        }
    };
}

fn variable_token<'a>(kind: &TokenKind<'a>) -> Option<&'a str> {
    match kind {
        TokenKind::Variable(s) => Some(*s),
        _ => None,
    }
}

fn name_token<'a>(kind: &TokenKind<'a>) -> Option<&'a str> {
    match kind {
        TokenKind::Identifier(s) => Some(*s),
        _ => None,
    }
}

fn numeric_op(word: &str) -> Option<NumericOp> {
    match word.to_ascii_lowercase().as_str() {
        "increase" => Some(NumericOp::Increase),
        "decrease" => Some(NumericOp::Decrease),
        "assign" => Some(NumericOp::Assign),
        "scale-up" => Some(NumericOp::ScaleUp),
        "scale-down" => Some(NumericOp::ScaleDown),
        _ => None,
    }
}

impl<'a> Parser<'a> {
    pub fn new(code: &'a str) -> Self {
        let lexer = Lexer::new(code).peekable();
        Self { lexer }
    }

    /// A failed `define` block leaves the token stream at an unknown depth,
    /// so nothing after it can be trusted.
    fn error_recover(&mut self) {
        for _ in self.lexer.by_ref() {}
    }

    fn position(&mut self) -> Position {
        match self.lexer.peek() {
            Some(Ok(t)) => Position::Span(t.span),
            _ => Position::EOF,
        }
    }

    fn open(&mut self) -> Result<(), Error> {
        use TokenKind::OpenParenthesis;
        expect!(self.lexer.next(), {Some(Ok(Token{kind:OpenParenthesis,..})) => Ok(())}, EXPECTED_OPEN_PARENTHESIS)
    }

    fn close(&mut self) -> Result<(), Error> {
        use TokenKind::CloseParenthesis;
        expect!(self.lexer.next(), {Some(Ok(Token{kind:CloseParenthesis,..})) => Ok(())}, EXPECTED_CLOSE_PARENTHESIS)
    }

    fn next_if_open(&mut self) -> bool {
        self.lexer.next_if(|t| matches!(t, Ok(Token{kind:TokenKind::OpenParenthesis,..}))).is_some()
    }

    fn next_if_close(&mut self) -> bool {
        self.lexer.next_if(|t| matches!(t, Ok(Token{kind:TokenKind::CloseParenthesis,..}))).is_some()
    }

    fn peek_open(&mut self) -> bool {
        matches!(self.lexer.peek(), Some(Ok(Token{kind:TokenKind::OpenParenthesis,..})))
    }

    fn identifier(&mut self) -> Result<&'a str, Error> {
        use TokenKind::Identifier;
        expect!(self.lexer.next(), {Some(Ok(Token{kind:Identifier(s),..})) => Ok(s)}, EXPECTED_IDENTIFIER)
    }

    fn word(&mut self, word: &str) -> Result<(), Error> {
        use TokenKind::Identifier;
        expect!(self.lexer.next(), {
            Some(Ok(Token{kind:Identifier(s),..})) if s.eq_ignore_ascii_case(word) => Ok(())
        }, format!("Expected '{}'.", word))
    }

    fn next_keyword(&mut self) -> Option<(&'a str, Span)> {
        match self.lexer.next_if(|t| matches!(t, Ok(Token{kind:TokenKind::Keyword(_),..}))) {
            Some(Ok(Token{kind:TokenKind::Keyword(k), span})) => Some((k, span)),
            _ => None,
        }
    }

    /// Consumes everything up to (not including) the `)` closing the current
    /// group and returns the consumed tokens as text.
    fn skip_group(&mut self) -> Result<Vec<String>, Error> {
        use TokenKind::{OpenParenthesis, CloseParenthesis};
        let mut depth = 0usize;
        let mut skipped = Vec::new();
        loop {
            if depth == 0 && matches!(self.lexer.peek(), Some(Ok(Token{kind:CloseParenthesis,..}))) {
                return Ok(skipped);
            }
            let token = match self.lexer.next() {
                Some(Ok(token)) => token,
                Some(Err(e)) => return Err(e),
                None => return Err(Error::new(Position::EOF, EXPECTED_CLOSE_PARENTHESIS)),
            };
            match token.kind {
                OpenParenthesis => depth += 1,
                CloseParenthesis => depth -= 1,
                _ => (),
            }
            skipped.push(token.kind.to_string());
        }
    }

    fn requirements(&mut self) -> Result<EnumSet<Requirements>, Error> {
        let mut r = EnumSet::empty();
        while let Some((keyword, span)) = self.next_keyword() {
            match Requirements::from_keyword(keyword) {
                Some(requirement) => { r.insert(requirement); },
                None => warn!("Ignoring unknown requirement :{} at line {}", keyword, span.line),
            }
        }
        Ok(r)
    }

    fn kind(&mut self) -> Result<Vec<String>, Error> {
        use TokenKind::{Identifier, OpenParenthesis, Logic};
        expect!(self.lexer.next(), {
            Some(Ok(Token{kind:Identifier(s),..})) => Ok(vec![s.to_ascii_lowercase()]),
            Some(Ok(Token{kind:OpenParenthesis,..})) => {
                expect!(self.lexer.next(), {Some(Ok(Token{kind:Logic(LogicToken::Either),..})) => Ok(())}, "Expected 'either'.")?;
                let mut kinds = Vec::new();
                while let Some(Ok(Token{kind:Identifier(s),..})) = self.lexer.next_if(|t| matches!(t, Ok(Token{kind:Identifier(_),..}))) {
                    kinds.push(s.to_ascii_lowercase());
                }
                self.close()?;
                Ok(kinds)
            },
        }, "Expected type name.")
    }

    /// `a b - t c - (either u v) d` style lists; trailing untyped entries become `object`.
    fn typed_list(&mut self, item: fn(&TokenKind<'a>) -> Option<&'a str>) -> Result<Vec<TypedList>, Error> {
        let mut lists = Vec::new();
        let mut pending = Vec::new();
        loop {
            let kind = match self.lexer.peek() {
                Some(Ok(t)) => t.kind,
                _ => break,
            };
            if let Some(s) = item(&kind) {
                self.lexer.next();
                pending.push(s.to_ascii_lowercase());
            } else if matches!(kind, TokenKind::BinOp(BinOpToken::Minus)) {
                self.lexer.next();
                let kind = self.kind()?;
                lists.push(TypedList::new(mem::take(&mut pending), kind));
            } else {
                break;
            }
        }
        if !pending.is_empty() {
            lists.push(TypedList::untyped(pending));
        }
        Ok(lists)
    }

    fn variables(&mut self) -> Result<Vec<TypedList>, Error> {
        self.open()?;
        let variables = self.typed_list(variable_token)?;
        self.close()?;
        Ok(variables)
    }

    fn terms(&mut self) -> Result<Vec<Term>, Error> {
        use TokenKind::{Variable, Identifier};
        let mut terms = Vec::new();
        loop {
            match self.lexer.next_if(|t| matches!(t, Ok(Token{kind:Variable(_) | Identifier(_),..}))) {
                Some(Ok(Token{kind:Variable(s),..})) => terms.push(Term::Variable(s.to_ascii_lowercase())),
                Some(Ok(Token{kind:Identifier(s),..})) => terms.push(Term::Name(s.to_ascii_lowercase())),
                _ => return Ok(terms),
            }
        }
    }

    fn atom(&mut self) -> Result<Atom, Error> {
        let name = self.identifier()?.to_ascii_lowercase();
        let terms = self.terms()?;
        Ok(Atom { name, terms })
    }

    fn exprs(&mut self) -> Result<Vec<Expr>, Error> {
        let mut group = Vec::new();
        while self.peek_open() {
            group.push(self.expr()?);
        }
        Ok(group)
    }

    fn comparison(&mut self, op: BinOpToken, span: Span) -> Result<Expr, Error> {
        use TokenKind::{Variable, Identifier};
        let op = match op {
            BinOpToken::Equals => ComparisonOp::Equals,
            BinOpToken::Greater => ComparisonOp::Greater,
            BinOpToken::Smaller => ComparisonOp::Smaller,
            BinOpToken::GreaterOrEquals => ComparisonOp::GreaterOrEquals,
            BinOpToken::SmallerOrEquals => ComparisonOp::SmallerOrEquals,
            _ => return Err(Error { pos: Position::Span(span), message: format!("Unexpected operator '{}'.", op) }),
        };
        let is_equality = op == ComparisonOp::Equals
            && matches!(self.lexer.peek(), Some(Ok(Token{kind:Variable(_) | Identifier(_),..})));
        if is_equality {
            Ok(Expr::Atom(Atom { name: String::from("="), terms: self.terms()? }))
        } else {
            Ok(Expr::Comparison(op, self.skip_group()?))
        }
    }

    fn expr(&mut self) -> Result<Expr, Error> {
        use TokenKind::{Logic, BinOp, Identifier};
        use LogicToken::*;
        self.open()?;
        if self.next_if_close() {
            return Ok(Expr::And(Vec::new()));
        }
        let result = expect!(self.lexer.next(), {
            Some(Ok(Token{kind:Logic(And),..})) => Ok(Expr::And(self.exprs()?)),
            Some(Ok(Token{kind:Logic(Or),..})) => Ok(Expr::Or(self.exprs()?)),
            Some(Ok(Token{kind:Logic(Not),..})) => Ok(Expr::Not(Box::new(self.expr()?))),
            Some(Ok(Token{kind:Logic(Imply),..})) => Ok(Expr::Imply(Box::new(self.expr()?), Box::new(self.expr()?))),
            Some(Ok(Token{kind:Logic(ForAll),..})) => Ok(Expr::ForAll(self.variables()?, Box::new(self.expr()?))),
            Some(Ok(Token{kind:Logic(Exists),..})) => Ok(Expr::Exists(self.variables()?, Box::new(self.expr()?))),
            Some(Ok(Token{kind:Logic(Preference),..})) => {
                let name = match self.lexer.next_if(|t| matches!(t, Ok(Token{kind:Identifier(_),..}))) {
                    Some(Ok(Token{kind:Identifier(s),..})) => Some(s.to_ascii_lowercase()),
                    _ => None,
                };
                Ok(Expr::Preference(name, Box::new(self.expr()?)))
            },
            Some(Ok(Token{kind:BinOp(op), span})) => self.comparison(op, span),
            Some(Ok(Token{kind:Identifier(s),..})) => Ok(Expr::Atom(Atom { name: s.to_ascii_lowercase(), terms: self.terms()? })),
        }, "Expected goal description.")?;
        self.close()?;
        Ok(result)
    }

    fn effect(&mut self) -> Result<Vec<Effect>, Error> {
        use TokenKind::{Logic, Identifier};
        use LogicToken::*;
        self.open()?;
        if self.next_if_close() {
            return Ok(Vec::new());
        }
        let result = expect!(self.lexer.next(), {
            Some(Ok(Token{kind:Logic(And),..})) => {
                let mut effects = Vec::new();
                while self.peek_open() {
                    effects.extend(self.effect()?);
                }
                Ok(effects)
            },
            Some(Ok(Token{kind:Logic(Not),..})) => {
                self.open()?;
                let atom = self.atom()?;
                self.close()?;
                Ok(vec![Effect::Delete(atom)])
            },
            Some(Ok(Token{kind:Logic(When),..})) => {
                let condition = self.expr()?;
                Ok(vec![Effect::When(condition, self.effect()?)])
            },
            Some(Ok(Token{kind:Logic(ForAll),..})) => {
                let variables = self.variables()?;
                Ok(vec![Effect::ForAll(variables, self.effect()?)])
            },
            Some(Ok(Token{kind:Identifier(s),..})) => match numeric_op(s) {
                Some(op) => Ok(vec![Effect::Numeric(op, self.skip_group()?)]),
                None => Ok(vec![Effect::Add(Atom { name: s.to_ascii_lowercase(), terms: self.terms()? })]),
            },
        }, "Expected effect.")?;
        self.close()?;
        Ok(result)
    }

    fn predicate_head(&mut self) -> Result<ast::Predicate, Error> {
        let name = self.identifier()?.to_ascii_lowercase();
        let variables = self.typed_list(variable_token)?;
        Ok(ast::Predicate { name, variables })
    }

    fn predicates(&mut self) -> Result<Vec<ast::Predicate>, Error> {
        let mut predicates = Vec::new();
        while self.next_if_open() {
            predicates.push(self.predicate_head()?);
            self.close()?;
        }
        Ok(predicates)
    }

    fn action(&mut self) -> Result<ast::Action, Error> {
        let name = self.identifier()?.to_ascii_lowercase();
        let mut action = ast::Action { name, parameters: Vec::new(), precondition: None, effect: Vec::new() };
        while let Some((keyword, span)) = self.next_keyword() {
            match keyword.to_ascii_lowercase().as_str() {
                "parameters" => action.parameters = self.variables()?,
                "precondition" => action.precondition = Some(self.expr()?),
                "effect" => action.effect = self.effect()?,
                _ => return Err(Error { pos: Position::Span(span), message: format!("Unexpected action keyword ':{}'.", keyword) }),
            }
        }
        Ok(action)
    }

    fn derived(&mut self) -> Result<ast::DerivedPredicate, Error> {
        self.open()?;
        let head = self.predicate_head()?;
        self.close()?;
        let body = self.expr()?;
        Ok(ast::DerivedPredicate { head, body })
    }

    fn axiom(&mut self) -> Result<ast::Axiom, Error> {
        let mut variables = Vec::new();
        let mut context = Expr::And(Vec::new());
        let mut implies = None;
        while let Some((keyword, span)) = self.next_keyword() {
            match keyword.to_ascii_lowercase().as_str() {
                "vars" => variables = self.variables()?,
                "context" => context = self.expr()?,
                "implies" => {
                    self.open()?;
                    implies = Some(self.atom()?);
                    self.close()?;
                },
                _ => return Err(Error { pos: Position::Span(span), message: format!("Unexpected axiom keyword ':{}'.", keyword) }),
            }
        }
        match implies {
            Some(implies) => Ok(ast::Axiom { variables, context, implies }),
            None => Err(Error::new(self.position(), "Expected ':implies' in axiom.")),
        }
    }

    fn domain_section(&mut self, keyword: &str, span: Span, domain: &mut ast::Domain) -> Result<(), Error> {
        match keyword.to_ascii_lowercase().as_str() {
            "requirements" => domain.requirements.insert_all(self.requirements()?),
            "types" => domain.types.extend(self.typed_list(name_token)?),
            "constants" => domain.constants.extend(self.typed_list(name_token)?),
            "predicates" => domain.predicates.extend(self.predicates()?),
            "action" => domain.actions.push(self.action()?),
            "derived" => domain.derived.push(self.derived()?),
            "axiom" => domain.axioms.push(self.axiom()?),
            "functions" | "constraints" => {
                warn!("Skipping unsupported domain section :{} at line {}", keyword, span.line);
                self.skip_group()?;
            },
            _ => return Err(Error { pos: Position::Span(span), message: format!("Unsupported domain section ':{}'.", keyword) }),
        }
        Ok(())
    }

    fn domain(&mut self) -> Result<Stmt, Error> {
        use TokenKind::Keyword;
        let name = self.identifier()?.to_ascii_lowercase();
        self.close()?;
        let mut domain = ast::Domain {
            name,
            requirements: EnumSet::empty(),
            types: Vec::new(),
            constants: Vec::new(),
            predicates: Vec::new(),
            actions: Vec::new(),
            derived: Vec::new(),
            axioms: Vec::new(),
        };
        while self.next_if_open() {
            expect!(self.lexer.next(), {
                Some(Ok(Token{kind:Keyword(k), span})) => self.domain_section(k, span, &mut domain),
            }, "Expected :requirements, :types, :constants, :predicates, :action, :derived or :axiom.")?;
            self.close()?;
        }
        Ok(Stmt::Domain(domain))
    }

    fn init(&mut self) -> Result<Vec<Atom>, Error> {
        use TokenKind::{Identifier, BinOp, Logic};
        let mut atoms = Vec::new();
        while self.next_if_open() {
            expect!(self.lexer.next(), {
                Some(Ok(Token{kind:Identifier(s), span})) => {
                    let terms = self.terms()?;
                    if let Some(Term::Variable(v)) = terms.iter().find(|t| matches!(t, Term::Variable(_))) {
                        return Err(Error { pos: Position::Span(span), message: format!("Variable ?{} is not allowed in :init.", v) });
                    }
                    atoms.push(Atom { name: s.to_ascii_lowercase(), terms });
                    Ok(())
                },
                Some(Ok(Token{kind:BinOp(BinOpToken::Equals), span})) => {
                    warn!("Skipping numeric initialization at line {}", span.line);
                    self.skip_group().map(|_| ())
                },
                // Negative facts are implied by the closed-world assumption.
                Some(Ok(Token{kind:Logic(LogicToken::Not),..})) => {
                    self.open()?;
                    self.atom()?;
                    self.close()
                },
            }, "Expected initial fact.")?;
            self.close()?;
        }
        Ok(atoms)
    }

    fn problem(&mut self) -> Result<Stmt, Error> {
        use TokenKind::Keyword;
        let name = self.identifier()?.to_ascii_lowercase();
        self.close()?;
        let mut domain = None;
        let mut requirements = EnumSet::empty();
        let mut objects = Vec::new();
        let mut init = Vec::new();
        let mut goal = None;
        while self.next_if_open() {
            expect!(self.lexer.next(), {
                Some(Ok(Token{kind:Keyword(k), span})) => match k.to_ascii_lowercase().as_str() {
                    "domain" => self.identifier().map(|s| domain = Some(s.to_ascii_lowercase())),
                    "requirements" => self.requirements().map(|r| requirements.insert_all(r)),
                    "objects" => self.typed_list(name_token).map(|o| objects.extend(o)),
                    "init" => self.init().map(|atoms| init.extend(atoms)),
                    "goal" => self.expr().map(|e| goal = Some(e)),
                    "metric" | "constraints" => {
                        warn!("Skipping unsupported problem section :{} at line {}", k, span.line);
                        self.skip_group().map(|_| ())
                    },
                    _ => Err(Error { pos: Position::Span(span), message: format!("Unsupported problem section ':{}'.", k) }),
                },
            }, "Expected :domain, :requirements, :objects, :init or :goal.")?;
            self.close()?;
        }
        let domain = match domain {
            Some(domain) => domain,
            None => return Err(Error::new(self.position(), "Expected (:domain ...) in problem.")),
        };
        let goal = match goal {
            Some(goal) => goal,
            None => return Err(Error::new(self.position(), "Expected (:goal ...) in problem.")),
        };
        Ok(Stmt::Problem(ast::Problem { name, domain, requirements, objects, init, goal }))
    }

    fn root(&mut self) -> Result<Stmt, Error> {
        use TokenKind::Identifier;
        self.open()?;
        self.word("define")?;
        self.open()?;
        let body = expect!(self.lexer.next(), {
            Some(Ok(Token{kind:Identifier(s),..})) if s.eq_ignore_ascii_case("domain") => self.domain(),
            Some(Ok(Token{kind:Identifier(s),..})) if s.eq_ignore_ascii_case("problem") => self.problem(),
        }, "Expected 'domain' or 'problem'.")?;
        self.close()?;
        Ok(body)
    }
}
