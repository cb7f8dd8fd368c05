use std::collections::{HashMap, HashSet};
use std::fmt;

use super::formula::EQUALITY;
use super::object::TypeHierarchy;
use super::parser::ast::{self, Expr, Effect, Term, TypedList, ROOT_TYPE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Where the problem was found, e.g. `action pick-up`.
    pub context: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}: {}: {}", severity, self.context, self.message)
    }
}

/// Domain and problem pass or fail independently.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TypeCheckReport {
    pub domain: Vec<Diagnostic>,
    pub problem: Vec<Diagnostic>,
}

fn passed(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().all(|d| d.severity != Severity::Error)
}

impl TypeCheckReport {
    pub fn domain_passed(&self) -> bool {
        passed(&self.domain)
    }

    pub fn problem_passed(&self) -> bool {
        passed(&self.problem)
    }

    pub fn passed(&self) -> bool {
        self.domain_passed() && self.problem_passed()
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.domain.iter().chain(self.problem.iter())
    }
}

impl fmt::Display for TypeCheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = |ok| if ok { "passed" } else { "failed" };
        writeln!(f, "Domain type check {}", verdict(self.domain_passed()))?;
        writeln!(f, "Problem type check {}", verdict(self.problem_passed()))?;
        for diagnostic in self.diagnostics() {
            writeln!(f, "\t{}", diagnostic)?;
        }
        Ok(())
    }
}

/// Variables in scope with their declared types. Later entries shadow earlier ones.
type Scope = Vec<(String, Vec<String>)>;
/// Object or constant name to declared types.
type Names = HashMap<String, Vec<String>>;

fn scope_of(lists: &[TypedList]) -> Scope {
    ast::flatten(lists).into_iter().map(|(n, k)| (n.to_owned(), k.to_vec())).collect()
}

fn names_of(lists: &[TypedList]) -> Names {
    ast::flatten(lists).into_iter().map(|(n, k)| (n.to_owned(), k.to_vec())).collect()
}

fn kinds(kinds: &[String]) -> String {
    match kinds {
        [single] => single.clone(),
        many => format!("(either {})", many.join(" ")),
    }
}

pub struct TypeChecker<'a> {
    domain: &'a ast::Domain,
    hierarchy: TypeHierarchy,
    declared: HashSet<String>,
    signatures: HashMap<String, Vec<Vec<String>>>,
    constants: Names,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> TypeChecker<'a> {
    pub fn new(domain: &'a ast::Domain) -> Self {
        let mut declared = HashSet::from([ROOT_TYPE.to_owned()]);
        declared.extend(domain.types.iter().flat_map(|l| l.identifiers.iter().cloned()));
        Self {
            domain,
            hierarchy: TypeHierarchy::new(&domain.types),
            declared,
            signatures: HashMap::new(),
            constants: names_of(&domain.constants),
            diagnostics: Vec::new(),
        }
    }

    pub fn run(domain: &ast::Domain, problem: &ast::Problem) -> TypeCheckReport {
        let mut checker = TypeChecker::new(domain);
        let domain = checker.check_domain();
        let problem = checker.check_problem(problem);
        TypeCheckReport { domain, problem }
    }

    fn report(&mut self, severity: Severity, context: &str, message: String) {
        self.diagnostics.push(Diagnostic { severity, context: context.to_owned(), message });
    }

    fn error(&mut self, context: &str, message: String) {
        self.report(Severity::Error, context, message)
    }

    fn warning(&mut self, context: &str, message: String) {
        self.report(Severity::Warning, context, message)
    }

    fn check_kinds(&mut self, lists: &[TypedList], context: &str) {
        for list in lists {
            for kind in &list.kind {
                if !self.declared.contains(kind) {
                    self.error(context, format!("undeclared type '{}'", kind));
                }
            }
        }
    }

    fn declare_signature(&mut self, head: &ast::Predicate, context: &str) {
        let signature = ast::flatten(&head.variables).into_iter().map(|(_, k)| k.to_vec()).collect::<Vec<_>>();
        match self.signatures.get(&head.name) {
            Some(existing) if existing.len() != signature.len() => {
                let expected = existing.len();
                self.error(context, format!("'{}' declared with {} and {} argument(s)", head.name, expected, signature.len()));
            },
            Some(_) => (),
            None => { self.signatures.insert(head.name.clone(), signature); },
        }
    }

    /// Returns the domain diagnostics and leaves the checker ready for a problem.
    pub fn check_domain(&mut self) -> Vec<Diagnostic> {
        let domain = self.domain;
        self.check_kinds(&domain.types, "types");
        self.check_kinds(&domain.constants, "constants");
        let mut seen = HashSet::new();
        for list in &domain.constants {
            for name in &list.identifiers {
                if !seen.insert(name.as_str()) {
                    self.error("constants", format!("duplicate constant '{}'", name));
                }
            }
        }
        for predicate in &domain.predicates {
            let context = format!("predicate {}", predicate.name);
            self.check_kinds(&predicate.variables, &context);
            self.declare_signature(predicate, &context);
        }
        for derived in &domain.derived {
            let context = format!("derived {}", derived.head.name);
            self.check_kinds(&derived.head.variables, &context);
            self.declare_signature(&derived.head, &context);
        }
        let names = self.constants.clone();
        let mut seen = HashSet::new();
        for action in &domain.actions {
            let context = format!("action {}", action.name);
            if !seen.insert(action.name.as_str()) {
                self.error(&context, format!("duplicate action '{}'", action.name));
            }
            self.check_kinds(&action.parameters, &context);
            let scope = scope_of(&action.parameters);
            if let Some(precondition) = &action.precondition {
                self.check_expr(precondition, &scope, &names, &context);
            }
            for effect in &action.effect {
                self.check_effect(effect, &scope, &names, &context);
            }
        }
        for derived in &domain.derived {
            let context = format!("derived {}", derived.head.name);
            self.check_expr(&derived.body, &scope_of(&derived.head.variables), &names, &context);
        }
        for axiom in &domain.axioms {
            let context = format!("axiom {}", axiom.implies.name);
            self.check_kinds(&axiom.variables, &context);
            let scope = scope_of(&axiom.variables);
            self.check_expr(&axiom.context, &scope, &names, &context);
            self.check_atom(&axiom.implies, &scope, &names, &context);
        }
        std::mem::take(&mut self.diagnostics)
    }

    pub fn check_problem(&mut self, problem: &ast::Problem) -> Vec<Diagnostic> {
        let domain = self.domain;
        if problem.domain != domain.name {
            self.error("problem", format!("problem '{}' is for domain '{}', not '{}'", problem.name, problem.domain, domain.name));
        }
        self.check_kinds(&problem.objects, "objects");
        let mut names = self.constants.clone();
        for (name, kinds) in ast::flatten(&problem.objects) {
            if names.insert(name.to_owned(), kinds.to_vec()).is_some() {
                self.error("objects", format!("duplicate object '{}'", name));
            }
        }
        let derived = domain.derived.iter().map(|d| d.head.name.as_str()).collect::<HashSet<_>>();
        for atom in &problem.init {
            if derived.contains(atom.name.as_str()) {
                self.warning("init", format!("{} asserts a derived predicate", atom));
            }
            self.check_atom(atom, &Scope::new(), &names, "init");
        }
        self.check_expr(&problem.goal, &Scope::new(), &names, "goal");
        std::mem::take(&mut self.diagnostics)
    }

    fn check_atom(&mut self, atom: &ast::Atom, scope: &Scope, names: &Names, context: &str) {
        let mut actual = Vec::new();
        for term in &atom.terms {
            match term {
                Term::Variable(v) => match scope.iter().rev().find(|(n, _)| n == v) {
                    Some((_, k)) => actual.push(Some(k.clone())),
                    None => {
                        self.error(context, format!("unbound variable ?{} in {}", v, atom));
                        actual.push(None);
                    },
                },
                Term::Name(n) => match names.get(n) {
                    Some(k) => actual.push(Some(k.clone())),
                    None => {
                        self.error(context, format!("unknown object '{}' in {}", n, atom));
                        actual.push(None);
                    },
                },
            }
        }
        if atom.name == EQUALITY {
            if atom.terms.len() != 2 {
                self.error(context, format!("{} takes 2 arguments", atom));
            }
            return;
        }
        let signature = match self.signatures.get(&atom.name) {
            Some(signature) => signature.clone(),
            None => return self.error(context, format!("undeclared predicate '{}'", atom.name)),
        };
        if signature.len() != atom.terms.len() {
            return self.error(context, format!("{} has {} argument(s), '{}' takes {}", atom, atom.terms.len(), atom.name, signature.len()));
        }
        for (i, (expected, actual)) in signature.iter().zip(&actual).enumerate() {
            let Some(actual) = actual else { continue };
            let fits = actual.iter().any(|a| expected.iter().any(|e| self.hierarchy.is_subtype(a, e)));
            if !fits {
                self.error(context, format!("argument {} of {} is {}, expected {}", i + 1, atom, kinds(actual), kinds(expected)));
            }
        }
    }

    fn check_expr(&mut self, expr: &Expr, scope: &Scope, names: &Names, context: &str) {
        match expr {
            Expr::Atom(atom) => self.check_atom(atom, scope, names, context),
            Expr::And(exprs) | Expr::Or(exprs) => {
                for e in exprs {
                    self.check_expr(e, scope, names, context);
                }
            },
            Expr::Not(e) => self.check_expr(e, scope, names, context),
            Expr::Imply(l, r) => {
                self.warning(context, format!("{} cannot be evaluated", expr));
                self.check_expr(l, scope, names, context);
                self.check_expr(r, scope, names, context);
            },
            Expr::ForAll(variables, e) | Expr::Exists(variables, e) => {
                self.check_kinds(variables, context);
                let mut inner = scope.clone();
                inner.extend(scope_of(variables));
                self.check_expr(e, &inner, names, context);
            },
            Expr::Preference(_, e) => {
                self.warning(context, format!("{} cannot be evaluated", expr));
                self.check_expr(e, scope, names, context);
            },
            Expr::Comparison(..) => self.warning(context, format!("{} cannot be evaluated", expr)),
        }
    }

    fn check_effect(&mut self, effect: &Effect, scope: &Scope, names: &Names, context: &str) {
        match effect {
            Effect::Add(atom) | Effect::Delete(atom) => self.check_atom(atom, scope, names, context),
            Effect::When(condition, effects) => {
                self.check_expr(condition, scope, names, context);
                for e in effects {
                    self.check_effect(e, scope, names, context);
                }
            },
            Effect::ForAll(variables, effects) => {
                self.check_kinds(variables, context);
                let mut inner = scope.clone();
                inner.extend(scope_of(variables));
                for e in effects {
                    self.check_effect(e, &inner, names, context);
                }
            },
            Effect::Numeric(..) => self.warning(context, format!("{} cannot be applied", effect)),
        }
    }
}
