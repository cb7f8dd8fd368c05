pub mod pddl;

pub use pddl::{Error, Pddl, Proposition, Result, State};
