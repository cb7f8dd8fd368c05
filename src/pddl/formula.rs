use log::trace;

use super::error::{Error, Result};
use super::object::{Object, ObjectRegistry};
use super::parameter_generator::{Parameter, ParameterGenerator};
use super::parser::ast::{self, Expr, Term};
use super::proposition::Proposition;
use super::state::State;

/// Name of the built-in equality predicate.
pub const EQUALITY: &str = "=";

/// A term after name resolution: an index into the bound arguments, or a
/// fixed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    Parameter(usize),
    Constant(Object),
}

impl Argument {
    fn compile(term: &Term, objects: &ObjectRegistry, scope: &[String]) -> Result<Self> {
        match term {
            Term::Variable(v) => scope.iter()
                .rposition(|s| s == v)
                .map(Argument::Parameter)
                .ok_or_else(|| Error::UnknownVariable(v.clone())),
            Term::Name(n) => Ok(Argument::Constant(objects.get(n)?.clone())),
        }
    }

    pub fn resolve<'a>(&'a self, args: &'a [Object]) -> &'a Object {
        match self {
            Argument::Parameter(i) => &args[*i],
            Argument::Constant(o) => o,
        }
    }
}

/// An atom whose variables are positions in the argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropositionPattern {
    pub name: String,
    pub arguments: Vec<Argument>,
}

impl PropositionPattern {
    pub fn compile(atom: &ast::Atom, objects: &ObjectRegistry, scope: &[String]) -> Result<Self> {
        let arguments = atom.terms.iter()
            .map(|t| Argument::compile(t, objects, scope))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { name: atom.name.clone(), arguments })
    }

    pub fn ground(&self, args: &[Object]) -> Proposition {
        Proposition::new(self.name.clone(), self.arguments.iter().map(|a| a.resolve(args).clone()).collect())
    }
}

/// Variables introduced by `forall`/`exists`, with their bindings precomputed.
#[derive(Debug, Clone)]
pub struct Quantifier {
    pub parameters: Vec<Parameter>,
    pub generator: ParameterGenerator,
}

impl Quantifier {
    /// Builds the quantifier and returns the scope extended with its variables.
    pub fn compile(variables: &[ast::TypedList], objects: &ObjectRegistry, scope: &[String]) -> (Self, Vec<String>) {
        let parameters = Parameter::from_typed_lists(variables);
        let generator = ParameterGenerator::new(objects, &parameters);
        let mut inner = scope.to_vec();
        inner.extend(parameters.iter().map(|p| p.name.clone()));
        (Self { parameters, generator }, inner)
    }

    /// Calls `f` with `args` followed by each binding, stopping at the first
    /// `Some` result.
    pub fn find_map<T>(&self, args: &[Object], mut f: impl FnMut(&[Object]) -> Result<Option<T>>) -> Result<Option<T>> {
        let mut bound = args.to_vec();
        for binding in &self.generator {
            bound.truncate(args.len());
            bound.extend(binding);
            if let Some(found) = f(&bound)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

/// A goal description compiled against an object registry.
#[derive(Debug, Clone)]
pub enum Formula {
    Proposition(PropositionPattern),
    Equals(Argument, Argument),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Not(Box<Formula>),
    ForAll(Quantifier, Box<Formula>),
    Exists(Quantifier, Box<Formula>),
    /// Kept so that evaluation can report it.
    Unsupported(String),
}

impl Formula {
    /// `scope` names the variables bound by the enclosing action or predicate,
    /// in argument order.
    pub fn compile(expr: &Expr, objects: &ObjectRegistry, scope: &[String]) -> Result<Self> {
        Ok(match expr {
            Expr::Atom(atom) if atom.name == EQUALITY => match atom.terms.as_slice() {
                [l, r] => Formula::Equals(Argument::compile(l, objects, scope)?, Argument::compile(r, objects, scope)?),
                terms => return Err(Error::ArityMismatch { name: EQUALITY.to_owned(), expected: 2, actual: terms.len() }),
            },
            Expr::Atom(atom) => Formula::Proposition(PropositionPattern::compile(atom, objects, scope)?),
            Expr::And(exprs) => Formula::And(Self::compile_all(exprs, objects, scope)?),
            Expr::Or(exprs) => Formula::Or(Self::compile_all(exprs, objects, scope)?),
            Expr::Not(e) => Formula::Not(Box::new(Self::compile(e, objects, scope)?)),
            Expr::ForAll(variables, e) => {
                let (quantifier, inner) = Quantifier::compile(variables, objects, scope);
                Formula::ForAll(quantifier, Box::new(Self::compile(e, objects, &inner)?))
            },
            Expr::Exists(variables, e) => {
                let (quantifier, inner) = Quantifier::compile(variables, objects, scope);
                Formula::Exists(quantifier, Box::new(Self::compile(e, objects, &inner)?))
            },
            Expr::Imply(..) | Expr::Preference(..) | Expr::Comparison(..) => Formula::Unsupported(expr.to_string()),
        })
    }

    fn compile_all(exprs: &[Expr], objects: &ObjectRegistry, scope: &[String]) -> Result<Vec<Self>> {
        exprs.iter().map(|e| Self::compile(e, objects, scope)).collect()
    }

    /// `args` must bind every variable of the scope the formula was compiled in.
    pub fn evaluate(&self, state: &State, args: &[Object]) -> Result<bool> {
        match self {
            Formula::Proposition(p) => Ok(state.contains(&p.ground(args))),
            Formula::Equals(l, r) => Ok(l.resolve(args) == r.resolve(args)),
            Formula::And(fs) => {
                for f in fs {
                    if !f.evaluate(state, args)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            },
            Formula::Or(fs) => {
                for f in fs {
                    if f.evaluate(state, args)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            },
            Formula::Not(f) => Ok(!f.evaluate(state, args)?),
            Formula::ForAll(q, body) => {
                let counterexample = q.find_map(args, |bound| {
                    Ok(if body.evaluate(state, bound)? { None } else { Some(()) })
                })?;
                if counterexample.is_some() {
                    trace!("forall failed for {:?}", q.parameters);
                }
                Ok(counterexample.is_none())
            },
            Formula::Exists(q, body) => {
                let witness = q.find_map(args, |bound| {
                    Ok(if body.evaluate(state, bound)? { Some(()) } else { None })
                })?;
                Ok(witness.is_some())
            },
            Formula::Unsupported(construct) => Err(Error::UnsupportedGoalConstruct(construct.clone())),
        }
    }

    /// Predicate names read by the formula, each flagged when it sits under
    /// an odd number of `not`s.
    pub fn predicates(&self) -> Vec<(&str, bool)> {
        let mut found = Vec::new();
        self.collect_predicates(false, &mut found);
        found
    }

    fn collect_predicates<'a>(&'a self, negated: bool, found: &mut Vec<(&'a str, bool)>) {
        match self {
            Formula::Proposition(p) => found.push((p.name.as_str(), negated)),
            Formula::And(fs) | Formula::Or(fs) => fs.iter().for_each(|f| f.collect_predicates(negated, found)),
            Formula::Not(f) => f.collect_predicates(!negated, found),
            Formula::ForAll(_, f) | Formula::Exists(_, f) => f.collect_predicates(negated, found),
            Formula::Equals(..) | Formula::Unsupported(_) => (),
        }
    }
}
