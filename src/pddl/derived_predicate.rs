use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use super::error::{Error, Result};
use super::formula::{Formula, PropositionPattern};
use super::object::ObjectRegistry;
use super::parameter_generator::{Parameter, ParameterGenerator};
use super::parser::ast;
use super::proposition::Proposition;
use super::state::State;

/// A fact defined by a formula: the head holds for every binding of the
/// parameters under which the body holds.
#[derive(Debug, Clone)]
pub struct DerivedPredicate {
    name: String,
    parameters: Vec<Parameter>,
    head: PropositionPattern,
    body: Formula,
    generator: ParameterGenerator,
    stratum: usize,
}

/// `(:axiom :vars ... :context ... :implies ...)` has the same shape.
pub type Axiom = DerivedPredicate;

impl DerivedPredicate {
    pub fn compile(derived: &ast::DerivedPredicate, objects: &ObjectRegistry) -> Result<Self> {
        let head = ast::Atom {
            name: derived.head.name.clone(),
            terms: ast::flatten(&derived.head.variables).into_iter()
                .map(|(v, _)| ast::Term::Variable(v.to_owned()))
                .collect(),
        };
        Self::build(&head, &derived.head.variables, &derived.body, objects)
    }

    pub fn from_axiom(axiom: &ast::Axiom, objects: &ObjectRegistry) -> Result<Self> {
        Self::build(&axiom.implies, &axiom.variables, &axiom.context, objects)
    }

    fn build(head: &ast::Atom, variables: &[ast::TypedList], body: &ast::Expr, objects: &ObjectRegistry) -> Result<Self> {
        let parameters = Parameter::from_typed_lists(variables);
        let scope = parameters.iter().map(|p| p.name.clone()).collect::<Vec<_>>();
        Ok(Self {
            name: head.name.clone(),
            head: PropositionPattern::compile(head, objects, &scope)?,
            body: Formula::compile(body, objects, &scope)?,
            generator: ParameterGenerator::new(objects, &parameters),
            parameters,
            stratum: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn body(&self) -> &Formula {
        &self.body
    }

    /// Evaluation layer assigned by [`DerivedPredicate::stratify`].
    pub fn stratum(&self) -> usize {
        self.stratum
    }

    /// Orders predicates so that each is closed only after every predicate it
    /// reads negatively. Fails when a predicate depends on its own negation.
    pub fn stratify(predicates: &mut [Self]) -> Result<()> {
        let mut strata = predicates.iter()
            .map(|p| (p.name.clone(), 0usize))
            .collect::<HashMap<_, _>>();
        let limit = strata.len();
        let mut changed = true;
        while changed {
            changed = false;
            for predicate in predicates.iter() {
                for (dependency, negated) in predicate.body.predicates() {
                    let Some(&level) = strata.get(dependency) else { continue };
                    let needed = if negated { level + 1 } else { level };
                    if needed <= strata[&predicate.name] {
                        continue;
                    }
                    if needed >= limit {
                        return Err(Error::NegativeCycle(predicate.name.clone()));
                    }
                    strata.insert(predicate.name.clone(), needed);
                    changed = true;
                }
            }
        }
        for predicate in predicates.iter_mut() {
            predicate.stratum = strata[&predicate.name];
        }
        Ok(())
    }

    /// Head facts not yet in `state` whose body holds in `state`.
    pub fn derive(&self, state: &State) -> Result<Vec<Proposition>> {
        let mut derived = Vec::new();
        for args in &self.generator {
            let head = self.head.ground(&args);
            if !state.contains(&head) && self.body.evaluate(state, &args)? {
                trace!("derived {}", head);
                derived.push(head);
            }
        }
        Ok(derived)
    }

    /// Upper bound on the passes a closure over `predicates` can take.
    pub fn closure_bound(predicates: &[Self]) -> usize {
        Self::bound(predicates.iter())
    }

    fn bound<'a>(predicates: impl Iterator<Item = &'a Self>) -> usize {
        predicates
            .fold(0usize, |n, p| n.saturating_add(p.generator.len()))
            .saturating_add(1)
    }

    /// Adds derived facts stratum by stratum, each until a full pass adds
    /// nothing. Returns whether anything was added.
    pub fn apply(predicates: &[Self], state: &mut State) -> Result<bool> {
        let top = predicates.iter().map(Self::stratum).max().unwrap_or(0);
        let mut changed = false;
        for stratum in 0..=top {
            let layer = predicates.iter().filter(|p| p.stratum == stratum).collect::<Vec<_>>();
            changed |= Self::saturate(stratum, &layer, state)?;
        }
        Ok(changed)
    }

    fn saturate(stratum: usize, layer: &[&Self], state: &mut State) -> Result<bool> {
        let bound = Self::bound(layer.iter().copied());
        let mut changed = false;
        for pass in 0..bound {
            let mut derived = Vec::new();
            for predicate in layer {
                derived.extend(predicate.derive(state)?);
            }
            let before = state.len();
            state.extend(derived);
            if state.len() == before {
                debug!("Stratum {} reached a fixpoint after {} pass(es)", stratum, pass + 1);
                return Ok(changed);
            }
            changed = true;
        }
        Err(Error::ClosureDiverged(bound))
    }

    /// Removes every fact whose predicate is one of `predicates` and returns them.
    pub fn retract(predicates: &[Self], state: &mut State) -> Vec<Proposition> {
        let names = predicates.iter().map(Self::name).collect::<HashSet<_>>();
        let (removed, kept) = std::mem::take(&mut state.0).into_iter()
            .partition::<Vec<_>, _>(|p| names.contains(p.name.as_str()));
        state.extend(kept);
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pddl::object::Object;
    use crate::pddl::parser::Parser;

    const DOMAIN: &str = "(define (domain towers)
        (:types block)
        (:predicates (on ?x ?y - block) (above ?x ?y - block) (clear ?x - block))
        (:derived (above ?x ?y - block) (or (on ?x ?y) (exists (?z - block) (and (on ?x ?z) (above ?z ?y)))))
        (:axiom :vars (?x - block) :context (not (exists (?y - block) (on ?y ?x))) :implies (clear ?x)))";

    fn setup() -> (ObjectRegistry, Vec<DerivedPredicate>, Vec<Axiom>) {
        let domain = Parser::new(DOMAIN).next().unwrap().unwrap().into_domain().unwrap();
        let problem = Parser::new("(define (problem p) (:domain towers) (:objects a b c d - block) (:goal (and)))")
            .next().unwrap().unwrap().into_problem().unwrap();
        let objects = ObjectRegistry::new(&domain, &problem).unwrap();
        let derived = domain.derived.iter().map(|d| DerivedPredicate::compile(d, &objects)).collect::<Result<_>>().unwrap();
        let axioms = domain.axioms.iter().map(|a| Axiom::from_axiom(a, &objects)).collect::<Result<_>>().unwrap();
        (objects, derived, axioms)
    }

    fn fact(objects: &ObjectRegistry, name: &str, args: &[&str]) -> Proposition {
        Proposition::new(name, args.iter().map(|a| objects.get(a).unwrap().clone()).collect::<Vec<Object>>())
    }

    fn tower(objects: &ObjectRegistry) -> State {
        vec![
            fact(objects, "on", &["a", "b"]),
            fact(objects, "on", &["b", "c"]),
            fact(objects, "on", &["c", "d"]),
        ].into_iter().collect()
    }

    #[test]
    fn test_transitive_fixpoint() {
        let (objects, derived, _) = setup();
        let mut state = tower(&objects);
        assert!(DerivedPredicate::apply(&derived, &mut state).unwrap());
        assert!(state.contains(&fact(&objects, "above", &["a", "d"])));
        assert!(state.contains(&fact(&objects, "above", &["b", "d"])));
        assert!(!state.contains(&fact(&objects, "above", &["d", "a"])));
        assert_eq!(state.len(), 3 + 6);
    }

    #[test]
    fn test_idempotent_and_monotone() {
        let (objects, derived, _) = setup();
        let before = tower(&objects);
        let mut once = before.clone();
        DerivedPredicate::apply(&derived, &mut once).unwrap();
        let mut twice = once.clone();
        assert!(!DerivedPredicate::apply(&derived, &mut twice).unwrap());
        assert_eq!(once, twice);
        assert!(once.is_superset(&before));
    }

    #[test]
    fn test_retract() {
        let (objects, derived, _) = setup();
        let mut state = tower(&objects);
        DerivedPredicate::apply(&derived, &mut state).unwrap();
        let removed = DerivedPredicate::retract(&derived, &mut state);
        assert_eq!(removed.len(), 6);
        assert_eq!(state, tower(&objects));
    }

    #[test]
    fn test_axiom_shape() {
        let (objects, _, axioms) = setup();
        assert_eq!(axioms[0].name(), "clear");
        let mut state = tower(&objects);
        DerivedPredicate::apply(&axioms, &mut state).unwrap();
        assert!(state.contains(&fact(&objects, "clear", &["a"])));
        assert!(!state.contains(&fact(&objects, "clear", &["b"])));
    }

    fn compile_derived(domain: &str, objects: &str) -> (ObjectRegistry, Vec<DerivedPredicate>) {
        let domain = Parser::new(domain).next().unwrap().unwrap().into_domain().unwrap();
        let problem = Parser::new(&format!("(define (problem p) (:domain d) (:objects {}) (:goal (and)))", objects))
            .next().unwrap().unwrap().into_problem().unwrap();
        let objects = ObjectRegistry::new(&domain, &problem).unwrap();
        let derived = domain.derived.iter().map(|d| DerivedPredicate::compile(d, &objects)).collect::<Result<_>>().unwrap();
        (objects, derived)
    }

    #[test]
    fn test_negation_reads_lower_strata() {
        for rules in [
            "(:derived (p ?x - block) (not (q ?x))) (:derived (q ?x - block) (r ?x))",
            "(:derived (q ?x - block) (r ?x)) (:derived (p ?x - block) (not (q ?x)))",
        ] {
            let text = format!("(define (domain d) (:types block) (:predicates (p ?x - block) (q ?x - block) (r ?x - block)) {})", rules);
            let (objects, mut derived) = compile_derived(&text, "a - block");
            DerivedPredicate::stratify(&mut derived).unwrap();
            let p = derived.iter().find(|d| d.name() == "p").unwrap();
            let q = derived.iter().find(|d| d.name() == "q").unwrap();
            assert!(p.stratum() > q.stratum());

            let mut state = State::from_iter([fact(&objects, "r", &["a"])]);
            DerivedPredicate::apply(&derived, &mut state).unwrap();
            assert_eq!(state, State::from_iter([fact(&objects, "q", &["a"]), fact(&objects, "r", &["a"])]));
        }
    }

    #[test]
    fn test_positive_recursion_shares_a_stratum() {
        let (_, mut derived, _) = setup();
        DerivedPredicate::stratify(&mut derived).unwrap();
        assert_eq!(derived[0].stratum(), 0);
    }

    #[test]
    fn test_negative_cycle_is_rejected() {
        let text = "(define (domain d) (:types block) (:predicates (p ?x - block) (q ?x - block))
            (:derived (p ?x - block) (not (q ?x))) (:derived (q ?x - block) (p ?x)))";
        let (_, mut derived) = compile_derived(text, "a - block");
        assert!(matches!(DerivedPredicate::stratify(&mut derived), Err(Error::NegativeCycle(_))));

        let text = "(define (domain d) (:types block) (:predicates (p ?x - block)) (:derived (p ?x - block) (not (p ?x))))";
        let (_, mut derived) = compile_derived(text, "a - block");
        assert!(matches!(DerivedPredicate::stratify(&mut derived), Err(Error::NegativeCycle(name)) if name == "p"));
    }

    #[test]
    fn test_no_predicates() {
        let (objects, _, _) = setup();
        let mut state = tower(&objects);
        assert_eq!(DerivedPredicate::closure_bound(&[]), 1);
        assert!(!DerivedPredicate::apply(&[], &mut state).unwrap());
    }
}
