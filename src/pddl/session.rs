use std::fs;
use std::path::Path;

use log::debug;

use super::error::{Error, Result};
use super::parser::{self, ast, Parser, Position};

/// Parser error followed by the offending source line and a caret under the column.
fn render(source: &str, e: &parser::Error) -> String {
    let Position::Span(span) = e.pos else { return e.to_string() };
    match span.line.checked_sub(1).and_then(|i| source.lines().nth(i)) {
        Some(line) => {
            let number = span.line.to_string();
            format!("{}\n\t{}: {}\n\t{:->width$}", e, number, line, '^', width = number.len() + 2 + span.col)
        },
        None => e.to_string(),
    }
}

/// State of one load: the file being read and what has been parsed so far.
/// Discarded once the domain and problem are handed over.
#[derive(Debug, Default)]
pub struct LoadSession {
    file: String,
    domain: Option<ast::Domain>,
    problem: Option<ast::Problem>,
}

impl LoadSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(&self, message: impl Into<String>) -> Error {
        Error::Load { file: self.file.clone(), message: message.into() }
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.file = path.display().to_string();
        let source = fs::read_to_string(path).map_err(|e| self.fail(e.to_string()))?;
        self.parse(&source)
    }

    /// `name` stands in for a file name in error messages.
    pub fn load_str(&mut self, name: &str, source: &str) -> Result<()> {
        self.file = name.to_owned();
        self.parse(source)
    }

    fn parse(&mut self, source: &str) -> Result<()> {
        let mut found = false;
        for stmt in Parser::new(source) {
            match stmt.map_err(|e| self.fail(render(source, &e)))? {
                ast::Stmt::Domain(domain) => {
                    if self.domain.is_some() {
                        return Err(self.fail(format!("second domain definition '{}'", domain.name)));
                    }
                    debug!("{}: parsed domain {}", self.file, domain.name);
                    self.domain = Some(domain);
                },
                ast::Stmt::Problem(problem) => {
                    if self.problem.is_some() {
                        return Err(self.fail(format!("second problem definition '{}'", problem.name)));
                    }
                    debug!("{}: parsed problem {}", self.file, problem.name);
                    self.problem = Some(problem);
                },
            }
            found = true;
        }
        if !found {
            return Err(self.fail("no domain or problem definition"));
        }
        Ok(())
    }

    pub fn finish(self) -> Result<(ast::Domain, ast::Problem)> {
        match (self.domain, self.problem) {
            (Some(domain), Some(problem)) => Ok((domain, problem)),
            (None, _) => Err(Error::Load { file: self.file, message: String::from("no domain definition loaded") }),
            (_, None) => Err(Error::Load { file: self.file, message: String::from("no problem definition loaded") }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_str() {
        let mut session = LoadSession::new();
        session.load_str("d.pddl", "(define (domain d))").unwrap();
        session.load_str("p.pddl", "(define (problem p) (:domain d) (:goal (and)))").unwrap();
        let (domain, problem) = session.finish().unwrap();
        assert_eq!(domain.name, "d");
        assert_eq!(problem.domain, "d");
    }

    #[test]
    fn test_errors_name_the_file() {
        let mut session = LoadSession::new();
        session.load_str("d.pddl", "(define (domain d))").unwrap();
        match session.load_str("p.pddl", "(define (problem p) (:domain d) (:goal (and))") {
            Err(Error::Load { file, message }) => {
                assert_eq!(file, "p.pddl");
                assert!(message.contains("end of file"));
            },
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(LoadSession::new().load_str("e.pddl", "  ; nothing\n"), Err(Error::Load { .. })));
        let mut session = LoadSession::new();
        session.load_str("d.pddl", "(define (domain d))").unwrap();
        assert!(matches!(session.finish(), Err(Error::Load { file, .. }) if file == "d.pddl"));
    }

    #[test]
    fn test_error_excerpt() {
        let mut session = LoadSession::new();
        let err = session.load_str("d.pddl", "(define (domain d)\n  (:predicates #))").unwrap_err();
        assert_eq!(err.to_string(), "d.pddl: line:2 col:16 Unexpected character.\n\t2:   (:predicates #))\n\t------------------^");
    }

    #[test]
    fn test_missing_file() {
        let mut session = LoadSession::new();
        let err = session.load_file("/nonexistent/domain.pddl").unwrap_err();
        assert!(matches!(err, Error::Load { file, .. } if file == "/nonexistent/domain.pddl"));
    }
}
