mod common;

use std::fs;
use std::io::Write;

use pddl_symbolic::pddl::LoadSession;
use pddl_symbolic::{Error, Pddl};
use tempfile::{tempdir, NamedTempFile};

const DOMAIN: &str = "(define (domain pick)
  (:requirements :strips :typing)
  (:types block)
  (:predicates (on-table ?b - block))
  (:action pick-up
    :parameters (?b - block)
    :precondition (on-table ?b)
    :effect (not (on-table ?b))))";

const PROBLEM: &str = "(define (problem pick-two)
  (:domain pick)
  (:objects a b - block)
  (:init (on-table a) (on-table b))
  (:goal (and (not (on-table a)) (not (on-table b)))))";

#[test]
fn test_from_files() {
    let dir = tempdir().unwrap();
    let domain = dir.path().join("domain.pddl");
    let problem = dir.path().join("problem.pddl");
    fs::write(&domain, DOMAIN).unwrap();
    fs::write(&problem, PROBLEM).unwrap();

    let pddl = Pddl::from_files(&domain, &problem).unwrap();
    let initial = pddl.initial_state().clone();
    assert!(pddl.is_valid_action(&initial, "pick-up(a)").unwrap());
    let next = pddl.next_state(&initial, "pick-up(a)").unwrap();
    assert_eq!(next.stringify().into_iter().collect::<Vec<_>>(), vec!["on-table(b)"]);
    assert!(!pddl.is_valid_action(&next, "pick-up(a)").unwrap());
    assert!(pddl.is_valid_plan(&["pick-up(a)", "pick-up(b)"]).unwrap());
}

#[test]
fn test_load_error_names_the_file() {
    let mut domain = NamedTempFile::new().unwrap();
    domain.write_all(DOMAIN.as_bytes()).unwrap();
    let mut problem = NamedTempFile::new().unwrap();
    problem.write_all(b"(define (problem broken) (:domain pick) (:init (on-table ?x)) (:goal (and)))").unwrap();

    match Pddl::from_files(domain.path(), problem.path()) {
        Err(Error::Load { file, message }) => {
            assert_eq!(file, problem.path().display().to_string());
            assert!(message.contains("?x"), "{}", message);
        },
        other => panic!("expected a load error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_single_file_with_both_definitions() {
    let mut both = NamedTempFile::new().unwrap();
    write!(both, "{}\n{}", common::BLOCKSWORLD_DOMAIN, common::BLOCKSWORLD_PROBLEM).unwrap();
    let mut session = LoadSession::new();
    session.load_file(both.path()).unwrap();
    let (domain, problem) = session.finish().unwrap();
    let pddl = Pddl::new(domain, problem).unwrap();
    assert!(pddl.is_valid_plan(&common::BLOCKSWORLD_PLAN).unwrap());

    let empty = NamedTempFile::new().unwrap();
    assert!(matches!(Pddl::from_files(both.path(), empty.path()), Err(Error::Load { .. })));
}

#[test]
fn test_unknown_object_in_init() {
    let err = Pddl::from_sources(DOMAIN, "(define (problem p) (:domain pick) (:objects a - block) (:init (on-table z)) (:goal (and)))")
        .unwrap_err();
    assert!(matches!(err, Error::UnknownObject(name) if name == "z"));
}
