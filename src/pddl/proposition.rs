use std::collections::HashMap;
use std::fmt;

use super::error::{Error, Result};
use super::object::{Object, ObjectRegistry};

/// A ground fact, e.g. `on(a, b)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Proposition {
    pub name: String,
    pub arguments: Vec<Object>,
}

impl Proposition {
    pub fn new(name: impl Into<String>, arguments: Vec<Object>) -> Self {
        Self { name: name.into(), arguments }
    }

    /// Parses `name(a, b)` against the registry. `arities` holds the declared
    /// predicate signatures; names missing from it are not arity checked.
    pub fn parse(text: &str, objects: &ObjectRegistry, arities: &HashMap<String, usize>) -> Result<Self> {
        let (name, tokens) = split_call(text)?;
        let name = name.to_ascii_lowercase();
        if let Some(&expected) = arities.get(&name) {
            if expected != tokens.len() {
                return Err(Error::ArityMismatch { name, expected, actual: tokens.len() });
            }
        }
        let arguments = tokens.into_iter()
            .map(|t| objects.get(t).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(name, arguments))
    }
}

/// Splits `name(a, b)` into `("name", ["a", "b"])`. `name()` has no arguments.
pub fn split_call(text: &str) -> Result<(&str, Vec<&str>)> {
    let malformed = || Error::MalformedCall(text.to_owned());
    let text = text.trim();
    let open = text.find('(').ok_or_else(malformed)?;
    let inner = text[open + 1..].strip_suffix(')').ok_or_else(malformed)?;
    let name = text[..open].trim();
    if name.is_empty() || inner.contains(|c: char| c == '(' || c == ')') {
        return Err(malformed());
    }
    let arguments = if inner.trim().is_empty() {
        Vec::new()
    } else {
        inner.split(',').map(str::trim).collect::<Vec<_>>()
    };
    if arguments.iter().any(|a| a.is_empty()) {
        return Err(malformed());
    }
    Ok((name, arguments))
}

impl fmt::Display for Proposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pddl::parser::Parser;

    fn registry() -> ObjectRegistry {
        let domain = Parser::new("(define (domain d) (:types block))").next().unwrap().unwrap().into_domain().unwrap();
        let problem = Parser::new("(define (problem p) (:domain d) (:objects a b - block) (:goal (and)))")
            .next().unwrap().unwrap().into_problem().unwrap();
        ObjectRegistry::new(&domain, &problem).unwrap()
    }

    #[test]
    fn test_split_call() {
        assert_eq!(split_call("on(a, b)").unwrap(), ("on", vec!["a", "b"]));
        assert_eq!(split_call(" handempty() ").unwrap(), ("handempty", vec![]));
        assert_eq!(split_call("on(a,b)").unwrap(), ("on", vec!["a", "b"]));
        assert!(matches!(split_call("on a b"), Err(Error::MalformedCall(_))));
        assert!(matches!(split_call("on(a, )"), Err(Error::MalformedCall(_))));
        assert!(matches!(split_call("(a)"), Err(Error::MalformedCall(_))));
    }

    #[test]
    fn test_text_form() {
        let objects = registry();
        let arities = HashMap::from([("on".to_owned(), 2), ("handempty".to_owned(), 0)]);
        let p = Proposition::parse("on(a, b)", &objects, &arities).unwrap();
        assert_eq!(p.to_string(), "on(a, b)");
        assert_eq!(Proposition::parse("handempty()", &objects, &arities).unwrap().to_string(), "handempty()");
        assert_eq!(Proposition::parse("On(A, b)", &objects, &arities).unwrap(), p);
        assert!(matches!(Proposition::parse("on(a, c)", &objects, &arities), Err(Error::UnknownObject(o)) if o == "c"));
        assert!(matches!(
            Proposition::parse("on(a)", &objects, &arities),
            Err(Error::ArityMismatch { expected: 2, actual: 1, .. })
        ));
    }
}
