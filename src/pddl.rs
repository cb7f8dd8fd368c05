pub mod action;
pub mod derived_predicate;
pub mod domain;
pub mod error;
pub mod formula;
pub mod object;
pub mod parameter_generator;
pub mod parser;
pub mod proposition;
pub mod session;
pub mod state;
pub mod typecheck;

mod dump;

pub use action::{Action, Delta, Effect};
pub use derived_predicate::{Axiom, DerivedPredicate};
pub use domain::{Pddl, stringify_actions, stringify_arguments, stringify_objects, stringify_state};
pub use error::{Error, Result};
pub use formula::{Argument, Formula, PropositionPattern, Quantifier};
pub use object::{Object, ObjectMap, ObjectRegistry, TypeHierarchy};
pub use parameter_generator::{Parameter, ParameterGenerator};
pub use proposition::Proposition;
pub use session::LoadSession;
pub use state::State;
pub use typecheck::{Diagnostic, Severity, TypeCheckReport, TypeChecker};
