use std::collections::HashSet;

use log::{debug, trace};

use super::error::{Error, Result};
use super::formula::{Formula, PropositionPattern, Quantifier};
use super::object::{Object, ObjectRegistry};
use super::parameter_generator::{Parameter, ParameterGenerator};
use super::parser::ast;
use super::proposition::Proposition;
use super::state::State;

#[derive(Debug, Clone)]
pub enum Effect {
    Add(PropositionPattern),
    Delete(PropositionPattern),
    Conditional { condition: Formula, effects: Vec<Effect> },
    ForAll { quantifier: Quantifier, effects: Vec<Effect> },
    Unsupported(String),
}

/// Facts an action application adds and deletes, collected against one
/// pre-transition state.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Delta {
    pub add: Vec<Proposition>,
    pub delete: Vec<Proposition>,
}

impl Delta {
    /// Deletes first, then adds, so a fact both added and deleted ends up
    /// present. Returns whether the state changed.
    pub fn merge_into(self, state: &mut State) -> bool {
        let added = self.add.iter().collect::<HashSet<_>>();
        let mut changed = false;
        for p in &self.delete {
            if !added.contains(p) {
                changed |= state.remove(p);
            }
        }
        for p in self.add {
            changed |= state.insert(p);
        }
        changed
    }
}

impl Effect {
    pub fn compile(effect: &ast::Effect, objects: &ObjectRegistry, scope: &[String]) -> Result<Self> {
        Ok(match effect {
            ast::Effect::Add(atom) => Effect::Add(PropositionPattern::compile(atom, objects, scope)?),
            ast::Effect::Delete(atom) => Effect::Delete(PropositionPattern::compile(atom, objects, scope)?),
            ast::Effect::When(condition, effects) => Effect::Conditional {
                condition: Formula::compile(condition, objects, scope)?,
                effects: Self::compile_all(effects, objects, scope)?,
            },
            ast::Effect::ForAll(variables, effects) => {
                let (quantifier, inner) = Quantifier::compile(variables, objects, scope);
                Effect::ForAll { quantifier, effects: Self::compile_all(effects, objects, &inner)? }
            },
            ast::Effect::Numeric(..) => Effect::Unsupported(effect.to_string()),
        })
    }

    pub fn compile_all(effects: &[ast::Effect], objects: &ObjectRegistry, scope: &[String]) -> Result<Vec<Self>> {
        effects.iter().map(|e| Self::compile(e, objects, scope)).collect()
    }

    /// Appends this effect's contribution to `delta`. Conditions read `state` only.
    pub fn collect(&self, state: &State, args: &[Object], delta: &mut Delta) -> Result<()> {
        match self {
            Effect::Add(p) => delta.add.push(p.ground(args)),
            Effect::Delete(p) => delta.delete.push(p.ground(args)),
            Effect::Conditional { condition, effects } => {
                if condition.evaluate(state, args)? {
                    for e in effects {
                        e.collect(state, args, delta)?;
                    }
                }
            },
            Effect::ForAll { quantifier, effects } => {
                quantifier.find_map(args, |bound| {
                    for e in effects {
                        e.collect(state, bound, delta)?;
                    }
                    Ok(None::<()>)
                })?;
            },
            Effect::Unsupported(construct) => return Err(Error::UnsupportedGoalConstruct(construct.clone())),
        }
        Ok(())
    }
}

/// A parameterized operator. Arguments are supplied per call.
#[derive(Debug, Clone)]
pub struct Action {
    name: String,
    parameters: Vec<Parameter>,
    precondition: Formula,
    effects: Vec<Effect>,
    generator: ParameterGenerator,
}

impl Action {
    pub fn compile(action: &ast::Action, objects: &ObjectRegistry) -> Result<Self> {
        let parameters = Parameter::from_typed_lists(&action.parameters);
        let scope = parameters.iter().map(|p| p.name.clone()).collect::<Vec<_>>();
        let precondition = match &action.precondition {
            Some(expr) => Formula::compile(expr, objects, &scope)?,
            None => Formula::And(Vec::new()),
        };
        let effects = Effect::compile_all(&action.effect, objects, &scope)?;
        let generator = ParameterGenerator::new(objects, &parameters);
        debug!("Compiled action {} with {} parameter(s), {} grounding(s)", action.name, parameters.len(), generator.len());
        Ok(Self { name: action.name.clone(), parameters, precondition, effects, generator })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn precondition(&self) -> &Formula {
        &self.precondition
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Every well-typed argument tuple.
    pub fn generator(&self) -> &ParameterGenerator {
        &self.generator
    }

    fn check_arity(&self, args: &[Object]) -> Result<()> {
        if args.len() != self.arity() {
            return Err(Error::ArityMismatch { name: self.name.clone(), expected: self.arity(), actual: args.len() });
        }
        Ok(())
    }

    fn well_typed(&self, args: &[Object]) -> bool {
        self.parameters.iter()
            .zip(args)
            .all(|(p, a)| p.types.iter().any(|t| a.is_a(t)))
    }

    /// True iff every argument has an admissible type and the precondition holds.
    pub fn is_valid(&self, state: &State, args: &[Object]) -> Result<bool> {
        self.check_arity(args)?;
        if !self.well_typed(args) {
            trace!("{} rejected ill-typed arguments", self.to_call_string(args)?);
            return Ok(false);
        }
        self.precondition.evaluate(state, args)
    }

    /// Effects of the action against `state`, without checking the precondition.
    pub fn delta(&self, state: &State, args: &[Object]) -> Result<Delta> {
        self.check_arity(args)?;
        let mut delta = Delta::default();
        for effect in &self.effects {
            effect.collect(state, args, &mut delta)?;
        }
        Ok(delta)
    }

    /// Applies the action in place. An action whose precondition does not hold
    /// contributes no effects. Returns whether the state changed.
    pub fn apply_mut(&self, state: &mut State, args: &[Object]) -> Result<bool> {
        if !self.is_valid(state, args)? {
            debug!("Precondition of {} does not hold, state left unchanged", self.to_call_string(args)?);
            return Ok(false);
        }
        self.apply_unchecked(state, args)
    }

    /// Merges the effects without consulting the precondition. For callers
    /// that have already checked it.
    pub fn apply_unchecked(&self, state: &mut State, args: &[Object]) -> Result<bool> {
        let delta = self.delta(state, args)?;
        Ok(delta.merge_into(state))
    }

    pub fn apply(&self, state: &State, args: &[Object]) -> Result<State> {
        let mut next = state.clone();
        self.apply_mut(&mut next, args)?;
        Ok(next)
    }

    /// `name(a, b)`
    pub fn to_call_string(&self, args: &[Object]) -> Result<String> {
        self.check_arity(args)?;
        let args = args.iter().map(Object::name).collect::<Vec<_>>();
        Ok(format!("{}({})", self.name, args.join(", ")))
    }
}
