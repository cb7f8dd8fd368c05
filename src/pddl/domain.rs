use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use std::path::Path;

use log::{debug, info};

use super::action::Action;
use super::derived_predicate::{Axiom, DerivedPredicate};
use super::error::{Error, Result};
use super::formula::{Formula, PropositionPattern};
use super::object::{Object, ObjectMap, ObjectRegistry};
use super::parser::ast;
use super::proposition::split_call;
use super::session::LoadSession;
use super::state::State;
use super::typecheck::{TypeCheckReport, TypeChecker};

/// A loaded domain+problem pair. Immutable after construction; every query
/// takes the state it works on, so one `Pddl` can serve many threads.
#[derive(Debug)]
pub struct Pddl {
    domain: ast::Domain,
    problem: ast::Problem,
    objects: ObjectRegistry,
    arities: HashMap<String, usize>,
    actions: Vec<Action>,
    derived_predicates: Vec<DerivedPredicate>,
    axioms: Vec<Axiom>,
    goal: Formula,
    initial_state: State,
}

impl Pddl {
    pub fn from_files(domain: impl AsRef<Path>, problem: impl AsRef<Path>) -> Result<Self> {
        let mut session = LoadSession::new();
        session.load_file(domain)?;
        session.load_file(problem)?;
        let (domain, problem) = session.finish()?;
        Self::new(domain, problem)
    }

    pub fn from_sources(domain: &str, problem: &str) -> Result<Self> {
        let mut session = LoadSession::new();
        session.load_str("domain", domain)?;
        session.load_str("problem", problem)?;
        let (domain, problem) = session.finish()?;
        Self::new(domain, problem)
    }

    /// Builds the model from parsed definitions. The type checker is not run;
    /// see [`Pddl::type_check`].
    pub fn new(domain: ast::Domain, problem: ast::Problem) -> Result<Self> {
        let objects = ObjectRegistry::new(&domain, &problem)?;
        let arities = domain.predicates.iter()
            .chain(domain.derived.iter().map(|d| &d.head))
            .map(|p| (p.name.clone(), p.arity()))
            .collect();
        let actions = domain.actions.iter()
            .map(|a| Action::compile(a, &objects))
            .collect::<Result<Vec<_>>>()?;
        if let Some(duplicate) = actions.iter().enumerate()
            .find(|(i, a)| actions[..*i].iter().any(|b| b.name() == a.name()))
            .map(|(_, a)| a.name())
        {
            return Err(Error::DuplicateAction(duplicate.to_owned()));
        }
        let mut derived_predicates = domain.derived.iter()
            .map(|d| DerivedPredicate::compile(d, &objects))
            .collect::<Result<Vec<_>>>()?;
        DerivedPredicate::stratify(&mut derived_predicates)?;
        let axioms = domain.axioms.iter()
            .map(|a| Axiom::from_axiom(a, &objects))
            .collect::<Result<Vec<_>>>()?;
        let goal = Formula::compile(&problem.goal, &objects, &[])?;
        let mut initial_state = problem.init.iter()
            .map(|atom| PropositionPattern::compile(atom, &objects, &[]).map(|p| p.ground(&[])))
            .collect::<Result<State>>()?;
        DerivedPredicate::apply(&derived_predicates, &mut initial_state)?;
        info!(
            "Loaded {}/{}: {} object(s), {} action(s), {} derived predicate(s), {} initial fact(s)",
            domain.name, problem.name, objects.objects().len(), actions.len(), derived_predicates.len(), initial_state.len()
        );
        Ok(Self { domain, problem, objects, arities, actions, derived_predicates, axioms, goal, initial_state })
    }

    pub fn type_check(&self) -> TypeCheckReport {
        TypeChecker::run(&self.domain, &self.problem)
    }

    /// Type checks domain and problem, writing the diagnostics to `out` when
    /// `verbose` is set.
    pub fn is_valid(&self, verbose: bool, out: &mut impl Write) -> Result<bool> {
        let report = self.type_check();
        if verbose {
            write!(out, "{}", report)?;
        }
        Ok(report.passed())
    }

    pub fn domain(&self) -> &ast::Domain {
        &self.domain
    }

    pub fn problem(&self) -> &ast::Problem {
        &self.problem
    }

    pub fn objects(&self) -> &[Object] {
        self.objects.objects()
    }

    pub fn object_map(&self) -> &ObjectMap {
        self.objects.object_map()
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.objects
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn action(&self, name: &str) -> Result<&Action> {
        self.actions.iter()
            .find(|a| a.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::UnknownAction(name.to_owned()))
    }

    pub fn derived_predicates(&self) -> &[DerivedPredicate] {
        &self.derived_predicates
    }

    pub fn axioms(&self) -> &[Axiom] {
        &self.axioms
    }

    pub fn goal(&self) -> &Formula {
        &self.goal
    }

    pub fn initial_state(&self) -> &State {
        &self.initial_state
    }

    pub fn parse_state<I, S>(&self, texts: I) -> Result<State>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        State::parse(texts, &self.objects, &self.arities)
    }

    /// Resolves `name(a, b)` to the action and its arguments.
    pub fn parse_action_call(&self, text: &str) -> Result<(&Action, Vec<Object>)> {
        let (name, tokens) = split_call(text)?;
        let action = self.action(name)?;
        if tokens.len() != action.arity() {
            return Err(Error::ArityMismatch { name: name.to_owned(), expected: action.arity(), actual: tokens.len() });
        }
        let args = tokens.into_iter()
            .map(|t| self.objects.get(t).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok((action, args))
    }

    /// Applies the action, then recomputes derived facts from scratch. Returns
    /// whether the state changed.
    pub fn transition(&self, state: &mut State, action: &Action, args: &[Object]) -> Result<bool> {
        let changed = action.apply_mut(state, args)?;
        self.close(state, changed)
    }

    fn transition_unchecked(&self, state: &mut State, action: &Action, args: &[Object]) -> Result<bool> {
        let changed = action.apply_unchecked(state, args)?;
        self.close(state, changed)
    }

    fn close(&self, state: &mut State, changed: bool) -> Result<bool> {
        let len = state.len();
        let retracted = DerivedPredicate::retract(&self.derived_predicates, state);
        DerivedPredicate::apply(&self.derived_predicates, state)?;
        Ok(changed || state.len() != len || retracted.iter().any(|p| !state.contains(p)))
    }

    /// In-place form of [`Pddl::next_state`].
    pub fn next_state_mut(&self, state: &mut State, call: &str) -> Result<bool> {
        let (action, args) = self.parse_action_call(call)?;
        self.transition(state, action, &args)
    }

    /// Does not reject the call when the precondition is false: such an
    /// action has no effects and only the closure runs.
    pub fn next_state(&self, state: &State, call: &str) -> Result<State> {
        let mut next = state.clone();
        self.next_state_mut(&mut next, call)?;
        Ok(next)
    }

    pub fn is_valid_action(&self, state: &State, call: &str) -> Result<bool> {
        let (action, args) = self.parse_action_call(call)?;
        action.is_valid(state, &args)
    }

    pub fn is_valid_tuple(&self, state: &State, call: &str, next_state: &State) -> Result<bool> {
        let (action, args) = self.parse_action_call(call)?;
        if !action.is_valid(state, &args)? {
            return Ok(false);
        }
        let mut next = state.clone();
        self.transition_unchecked(&mut next, action, &args)?;
        Ok(&next == next_state)
    }

    pub fn is_goal_satisfied(&self, state: &State) -> Result<bool> {
        self.goal.evaluate(state, &[])
    }

    /// Runs `plan` from the initial state. False as soon as an action is not
    /// applicable, otherwise whether the final state satisfies the goal.
    pub fn is_valid_plan<S: AsRef<str>>(&self, plan: &[S]) -> Result<bool> {
        let mut state = self.initial_state.clone();
        for (step, call) in plan.iter().enumerate() {
            let (action, args) = self.parse_action_call(call.as_ref())?;
            if !action.is_valid(&state, &args)? {
                debug!("Plan step {} ({}) is not applicable", step + 1, call.as_ref());
                return Ok(false);
            }
            self.transition_unchecked(&mut state, action, &args)?;
        }
        self.is_goal_satisfied(&state)
    }

    pub fn list_valid_arguments(&self, state: &State, action: &Action) -> Result<Vec<Vec<Object>>> {
        let mut valid = Vec::new();
        for args in action.generator() {
            if action.is_valid(state, &args)? {
                valid.push(args);
            }
        }
        Ok(valid)
    }

    /// Ground action calls applicable in `state`, in action order then
    /// argument order.
    pub fn list_valid_actions(&self, state: &State) -> Result<Vec<String>> {
        let mut calls = Vec::new();
        for action in &self.actions {
            for args in self.list_valid_arguments(state, action)? {
                calls.push(action.to_call_string(&args)?);
            }
        }
        Ok(calls)
    }

    pub fn next_state_str(&self, state: &BTreeSet<String>, call: &str) -> Result<BTreeSet<String>> {
        Ok(self.next_state(&self.parse_state(state)?, call)?.stringify())
    }

    pub fn is_valid_action_str(&self, state: &BTreeSet<String>, call: &str) -> Result<bool> {
        self.is_valid_action(&self.parse_state(state)?, call)
    }

    pub fn is_valid_tuple_str(&self, state: &BTreeSet<String>, call: &str, next_state: &BTreeSet<String>) -> Result<bool> {
        self.is_valid_tuple(&self.parse_state(state)?, call, &self.parse_state(next_state)?)
    }

    pub fn is_goal_satisfied_str(&self, state: &BTreeSet<String>) -> Result<bool> {
        self.is_goal_satisfied(&self.parse_state(state)?)
    }

    pub fn list_valid_arguments_str(&self, state: &BTreeSet<String>, action: &str) -> Result<Vec<Vec<String>>> {
        let arguments = self.list_valid_arguments(&self.parse_state(state)?, self.action(action)?)?;
        Ok(stringify_arguments(&arguments))
    }

    pub fn list_valid_actions_str(&self, state: &BTreeSet<String>) -> Result<Vec<String>> {
        self.list_valid_actions(&self.parse_state(state)?)
    }
}

pub fn stringify_state(state: &State) -> BTreeSet<String> {
    state.stringify()
}

pub fn stringify_arguments(arguments: &[Vec<Object>]) -> Vec<Vec<String>> {
    arguments.iter().map(|args| stringify_objects(args)).collect()
}

pub fn stringify_actions(actions: &[Action]) -> Vec<String> {
    actions.iter().map(|a| a.name().to_owned()).collect()
}

pub fn stringify_objects(objects: &[Object]) -> Vec<String> {
    objects.iter().map(|o| o.name().to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = "(define (domain blocks)
        (:requirements :strips :typing)
        (:types block)
        (:predicates (on-table ?b - block))
        (:action pick-up
            :parameters (?b - block)
            :precondition (on-table ?b)
            :effect (not (on-table ?b))))";

    const PROBLEM: &str = "(define (problem two) (:domain blocks)
        (:objects a b - block)
        (:init (on-table a) (on-table b))
        (:goal (and (not (on-table a)) (not (on-table b)))))";

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scenario() {
        let pddl = Pddl::from_sources(DOMAIN, PROBLEM).unwrap();
        let initial = pddl.initial_state().clone();
        assert_eq!(initial.stringify(), set(&["on-table(a)", "on-table(b)"]));
        assert!(pddl.is_valid_action(&initial, "pick-up(a)").unwrap());
        let next = pddl.next_state(&initial, "pick-up(a)").unwrap();
        assert_eq!(next.stringify(), set(&["on-table(b)"]));
        assert!(!pddl.is_valid_action(&next, "pick-up(a)").unwrap());
        assert!(pddl.is_valid_tuple(&initial, "pick-up(a)", &next).unwrap());
        assert!(!pddl.is_valid_tuple(&initial, "pick-up(b)", &next).unwrap());
        assert!(pddl.is_valid_plan(&["pick-up(a)", "pick-up(b)"]).unwrap());
        assert!(!pddl.is_valid_plan(&["pick-up(a)", "pick-up(a)"]).unwrap());
        assert!(!pddl.is_valid_plan(&["pick-up(a)"]).unwrap());
    }

    #[test]
    fn test_text_overloads() {
        let pddl = Pddl::from_sources(DOMAIN, PROBLEM).unwrap();
        let initial = set(&["on-table(a)", "on-table(b)"]);
        assert_eq!(pddl.next_state_str(&initial, "pick-up(b)").unwrap(), set(&["on-table(a)"]));
        assert!(pddl.is_valid_action_str(&initial, "pick-up(b)").unwrap());
        assert!(pddl.is_valid_tuple_str(&initial, "pick-up(b)", &set(&["on-table(a)"])).unwrap());
        assert!(pddl.is_goal_satisfied_str(&set(&[])).unwrap());
        assert!(!pddl.is_goal_satisfied_str(&initial).unwrap());
        assert_eq!(pddl.list_valid_actions_str(&initial).unwrap(), vec!["pick-up(a)", "pick-up(b)"]);
        assert_eq!(pddl.list_valid_arguments_str(&set(&["on-table(b)"]), "pick-up").unwrap(), vec![vec!["b".to_owned()]]);
        assert_eq!(stringify_actions(pddl.actions()), vec!["pick-up"]);
        assert_eq!(stringify_objects(pddl.objects()), vec!["a", "b"]);
    }

    #[test]
    fn test_call_errors() {
        let pddl = Pddl::from_sources(DOMAIN, PROBLEM).unwrap();
        let initial = pddl.initial_state();
        assert!(matches!(pddl.is_valid_action(initial, "put-down(a)"), Err(Error::UnknownAction(n)) if n == "put-down"));
        assert!(matches!(pddl.is_valid_action(initial, "pick-up(z)"), Err(Error::UnknownObject(n)) if n == "z"));
        assert!(matches!(pddl.next_state(initial, "pick-up(a, b)"), Err(Error::ArityMismatch { expected: 1, actual: 2, .. })));
        assert!(matches!(pddl.next_state(initial, "pick-up"), Err(Error::MalformedCall(_))));
        assert!(matches!(pddl.parse_state(["on-table(a, b)"]), Err(Error::ArityMismatch { .. })));
    }

    #[test]
    fn test_false_precondition_passes_state_through() {
        let pddl = Pddl::from_sources(DOMAIN, PROBLEM).unwrap();
        let state = pddl.parse_state(["on-table(b)"]).unwrap();
        let mut next = state.clone();
        assert!(!pddl.next_state_mut(&mut next, "pick-up(a)").unwrap());
        assert_eq!(next, state);
    }

    #[test]
    fn test_duplicate_actions_are_rejected() {
        let domain = DOMAIN.replace("(:action pick-up", "(:action pick-up :parameters (?b - block) :effect (on-table ?b)) (:action PICK-UP");
        assert!(matches!(Pddl::from_sources(&domain, PROBLEM), Err(Error::DuplicateAction(n)) if n == "pick-up"));
    }

    #[test]
    fn test_names_ignore_case() {
        let problem = PROBLEM.replace("(:objects a b - block)", "(:objects A B - Block)");
        let pddl = Pddl::from_sources(DOMAIN, &problem).unwrap();
        assert_eq!(stringify_objects(pddl.objects()), vec!["a", "b"]);
        let next = pddl.next_state(pddl.initial_state(), "Pick-Up(A)").unwrap();
        assert_eq!(next.stringify(), set(&["on-table(b)"]));
        assert!(pddl.is_valid_plan(&["PICK-UP(a)", "pick-up(B)"]).unwrap());
    }

    #[test]
    fn test_negated_derived_predicates_are_stratified() {
        let domain = "(define (domain strata)
            (:requirements :strips :derived-predicates)
            (:predicates (r) (q) (p))
            (:derived (p) (not (q)))
            (:derived (q) (r))
            (:action drop :parameters () :precondition (r) :effect (not (r))))";
        let problem = "(define (problem one) (:domain strata) (:init (r)) (:goal (p)))";
        let pddl = Pddl::from_sources(domain, problem).unwrap();
        assert_eq!(pddl.initial_state().stringify(), set(&["q()", "r()"]));
        assert!(!pddl.is_goal_satisfied(pddl.initial_state()).unwrap());
        assert!(pddl.is_valid_plan(&["drop()"]).unwrap());

        let cyclic = domain.replace("(:derived (q) (r))", "(:derived (q) (p))");
        assert!(matches!(Pddl::from_sources(&cyclic, problem), Err(Error::NegativeCycle(_))));
    }

    #[test]
    fn test_is_valid_writes_report() {
        let pddl = Pddl::from_sources(DOMAIN, PROBLEM).unwrap();
        let mut out = Vec::new();
        assert!(pddl.is_valid(true, &mut out).unwrap());
        assert_eq!(String::from_utf8(out).unwrap(), "Domain type check passed\nProblem type check passed\n");
        let mut quiet = Vec::new();
        assert!(pddl.is_valid(false, &mut quiet).unwrap());
        assert!(quiet.is_empty());
    }

    #[test]
    fn test_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pddl>();
        let pddl = Pddl::from_sources(DOMAIN, PROBLEM).unwrap();
        std::thread::scope(|s| {
            for call in ["pick-up(a)", "pick-up(b)"] {
                let pddl = &pddl;
                s.spawn(move || assert!(pddl.is_valid_action(pddl.initial_state(), call).unwrap()));
            }
        });
    }
}
