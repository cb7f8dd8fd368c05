#![allow(dead_code)]

use pddl_symbolic::{Pddl, State};

pub const BLOCKSWORLD_DOMAIN: &str = "
; Blocksworld with derived clear/above and a tower-painting action.
(define (domain blocksworld)
  (:requirements :strips :typing :equality :derived-predicates :conditional-effects)
  (:types block)
  (:predicates (on ?x ?y - block) (ontable ?x - block) (holding ?x - block)
               (handempty) (painted ?x - block))
  (:derived (clear ?x - block)
    (and (not (holding ?x)) (not (exists (?y - block) (on ?y ?x)))))
  (:derived (above ?x ?y - block)
    (or (on ?x ?y) (exists (?z - block) (and (on ?x ?z) (above ?z ?y)))))
  (:action pick-up
    :parameters (?x - block)
    :precondition (and (clear ?x) (ontable ?x) (handempty))
    :effect (and (not (ontable ?x)) (not (handempty)) (holding ?x)))
  (:action put-down
    :parameters (?x - block)
    :precondition (holding ?x)
    :effect (and (ontable ?x) (handempty) (not (holding ?x))))
  (:action stack
    :parameters (?x ?y - block)
    :precondition (and (holding ?x) (clear ?y) (not (= ?x ?y)))
    :effect (and (on ?x ?y) (handempty) (not (holding ?x))))
  (:action unstack
    :parameters (?x ?y - block)
    :precondition (and (on ?x ?y) (clear ?x) (handempty))
    :effect (and (holding ?x) (not (on ?x ?y)) (not (handempty))))
  (:action paint-tower
    :parameters (?b - block)
    :precondition (handempty)
    :effect (forall (?x - block) (when (or (= ?x ?b) (above ?x ?b)) (painted ?x)))))
";

pub const BLOCKSWORLD_PROBLEM: &str = "
(define (problem three)
  (:domain blocksworld)
  (:objects a b c - block)
  (:init (ontable a) (ontable b) (on c a) (handempty))
  (:goal (and (on a b) (on b c))))
";

pub const BLOCKSWORLD_PLAN: [&str; 6] = [
    "unstack(c, a)",
    "put-down(c)",
    "pick-up(b)",
    "stack(b, c)",
    "pick-up(a)",
    "stack(a, b)",
];

pub fn blocksworld() -> Pddl {
    Pddl::from_sources(BLOCKSWORLD_DOMAIN, BLOCKSWORLD_PROBLEM).unwrap()
}

pub fn run(pddl: &Pddl, plan: &[&str]) -> State {
    plan.iter().fold(pddl.initial_state().clone(), |state, call| pddl.next_state(&state, call).unwrap())
}
