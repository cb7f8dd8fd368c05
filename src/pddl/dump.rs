use std::fmt::{self, Write};

use super::domain::Pddl;
use super::parser::ast::{self, Expr, Effect, TypedList};

fn padding(depth: usize) -> String {
    "\t".repeat(depth)
}

/// `(?x: block, ?y: (either a b))`
struct Parameters<'a>(&'a [TypedList]);

impl fmt::Display for Parameters<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = ast::flatten(self.0).into_iter()
            .map(|(name, kinds)| match kinds {
                [single] => format!("?{}: {}", name, single),
                many => format!("?{}: (either {})", name, many.join(" ")),
            })
            .collect::<Vec<_>>();
        write!(f, "({})", params.join(", "))
    }
}

/// `on(?x, b)`
struct Call<'a>(&'a ast::Atom);

impl fmt::Display for Call<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms = self.0.terms.iter().map(ToString::to_string).collect::<Vec<_>>();
        write!(f, "{}({})", self.0.name, terms.join(", "))
    }
}

fn write_goal(f: &mut impl Write, goal: &Expr, depth: usize) -> fmt::Result {
    let pad = padding(depth);
    match goal {
        Expr::Atom(atom) => writeln!(f, "{}{}", pad, Call(atom)),
        Expr::And(goals) | Expr::Or(goals) => {
            writeln!(f, "{}{}:", pad, if matches!(goal, Expr::And(_)) { "and" } else { "or" })?;
            goals.iter().try_for_each(|g| write_goal(f, g, depth + 1))
        },
        Expr::Not(g) => {
            writeln!(f, "{}neg:", pad)?;
            write_goal(f, g, depth + 1)
        },
        Expr::ForAll(vars, g) | Expr::Exists(vars, g) => {
            let quantifier = if matches!(goal, Expr::ForAll(..)) { "forall" } else { "exists" };
            writeln!(f, "{}{}{}:", pad, quantifier, Parameters(vars))?;
            write_goal(f, g, depth + 1)
        },
        Expr::Imply(..) | Expr::Preference(..) | Expr::Comparison(..) => writeln!(f, "{}unsupported: {}", pad, goal),
    }
}

fn write_effects(f: &mut impl Write, effects: &[Effect], depth: usize) -> fmt::Result {
    let pad = padding(depth);
    for effect in effects {
        match effect {
            Effect::Add(atom) => writeln!(f, "{}(+) {}", pad, Call(atom))?,
            Effect::Delete(atom) => writeln!(f, "{}(-) {}", pad, Call(atom))?,
            Effect::ForAll(vars, effects) => {
                writeln!(f, "{}forall{}:", pad, Parameters(vars))?;
                write_effects(f, effects, depth + 1)?;
            },
            Effect::When(condition, effects) => {
                writeln!(f, "{}when:", pad)?;
                write_goal(f, condition, depth + 1)?;
                writeln!(f, "{}then:", pad)?;
                write_effects(f, effects, depth + 1)?;
            },
            Effect::Numeric(..) => writeln!(f, "{}unsupported: {}", pad, effect)?,
        }
    }
    Ok(())
}

fn requirements(requirements: &enumset::EnumSet<ast::Requirements>) -> String {
    requirements.iter().map(|r| format!(":{}", r.keyword())).collect::<Vec<_>>().join(" ")
}

fn write_domain(f: &mut impl Write, domain: &ast::Domain) -> fmt::Result {
    writeln!(f, "DOMAIN")?;
    writeln!(f, "======")?;
    writeln!(f, "Name: {}", domain.name)?;
    writeln!(f, "Requirements: {}", requirements(&domain.requirements))?;
    writeln!(f, "Types:")?;
    for (name, kinds) in ast::flatten(&domain.types) {
        writeln!(f, "\t{}: {}", name, kinds.join(" "))?;
    }
    writeln!(f, "Constants:")?;
    for (name, kinds) in ast::flatten(&domain.constants) {
        writeln!(f, "\t{}: {}", name, kinds.join(" "))?;
    }
    writeln!(f, "Predicates:")?;
    for predicate in &domain.predicates {
        writeln!(f, "\t{}{}", predicate.name, Parameters(&predicate.variables))?;
    }
    if !domain.derived.is_empty() {
        writeln!(f, "Derived predicates:")?;
        for derived in &domain.derived {
            writeln!(f, "\t{}{}", derived.head.name, Parameters(&derived.head.variables))?;
            write_goal(f, &derived.body, 2)?;
        }
    }
    if !domain.axioms.is_empty() {
        writeln!(f, "Axioms:")?;
        for axiom in &domain.axioms {
            writeln!(f, "\t{}{}", Call(&axiom.implies), Parameters(&axiom.variables))?;
            write_goal(f, &axiom.context, 2)?;
        }
    }
    writeln!(f, "Actions:")?;
    for action in &domain.actions {
        writeln!(f, "\t{}{}", action.name, Parameters(&action.parameters))?;
        if let Some(precondition) = &action.precondition {
            writeln!(f, "\t\tPreconditions:")?;
            write_goal(f, precondition, 3)?;
        }
        writeln!(f, "\t\tEffects:")?;
        write_effects(f, &action.effect, 3)?;
    }
    Ok(())
}

fn write_problem(f: &mut impl Write, problem: &ast::Problem) -> fmt::Result {
    writeln!(f, "PROBLEM")?;
    writeln!(f, "=======")?;
    writeln!(f, "Name: {}", problem.name)?;
    writeln!(f, "Domain: {}", problem.domain)?;
    writeln!(f, "Requirements: {}", requirements(&problem.requirements))?;
    writeln!(f, "Objects:")?;
    for (name, kinds) in ast::flatten(&problem.objects) {
        writeln!(f, "\t{}: {}", name, kinds.join(" "))?;
    }
    writeln!(f, "Initial State:")?;
    for atom in &problem.init {
        writeln!(f, "\t(+) {}", Call(atom))?;
    }
    writeln!(f, "Goal:")?;
    write_goal(f, &problem.goal, 1)
}

impl fmt::Display for Pddl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_domain(f, self.domain())?;
        writeln!(f)?;
        write_problem(f, self.problem())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump() {
        let pddl = Pddl::from_sources(
            "(define (domain blocks) (:requirements :strips) (:types block)
                (:predicates (on-table ?b - block) (clean ?b - block))
                (:action pick-up :parameters (?b - block) :precondition (and (on-table ?b))
                    :effect (and (not (on-table ?b)) (forall (?o - block) (when (not (clean ?o)) (clean ?o))))))",
            "(define (problem two) (:domain blocks) (:objects a - block) (:init (on-table a)) (:goal (exists (?b - block) (not (on-table ?b)))))",
        ).unwrap();
        let expected = "\
DOMAIN
======
Name: blocks
Requirements: :strips
Types:
\tblock: object
Constants:
Predicates:
\ton-table(?b: block)
\tclean(?b: block)
Actions:
\tpick-up(?b: block)
\t\tPreconditions:
\t\t\tand:
\t\t\t\ton-table(?b)
\t\tEffects:
\t\t\t(-) on-table(?b)
\t\t\tforall(?o: block):
\t\t\t\twhen:
\t\t\t\t\tneg:
\t\t\t\t\t\tclean(?o)
\t\t\t\tthen:
\t\t\t\t\t(+) clean(?o)

PROBLEM
=======
Name: two
Domain: blocks
Requirements: \nObjects:
\ta: block
Initial State:
\t(+) on-table(a)
Goal:
\texists(?b: block):
\t\tneg:
\t\t\ton-table(?b)
";
        assert_eq!(pddl.to_string(), expected);
    }
}
