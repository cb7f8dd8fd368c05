mod common;

use std::collections::BTreeSet;

use common::{blocksworld, run, BLOCKSWORLD_PLAN};

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_initial_state_is_closed() {
    let pddl = blocksworld();
    assert_eq!(pddl.initial_state().stringify(), set(&[
        "above(c, a)",
        "clear(b)",
        "clear(c)",
        "handempty()",
        "on(c, a)",
        "ontable(a)",
        "ontable(b)",
    ]));
    assert!(pddl.type_check().passed());
}

#[test]
fn test_valid_actions() {
    let pddl = blocksworld();
    assert_eq!(pddl.list_valid_actions(pddl.initial_state()).unwrap(), vec![
        "pick-up(b)",
        "unstack(c, a)",
        "paint-tower(a)",
        "paint-tower(b)",
        "paint-tower(c)",
    ]);
}

#[test]
fn test_derived_facts_follow_their_support() {
    let pddl = blocksworld();
    let state = pddl.next_state(pddl.initial_state(), "unstack(c, a)").unwrap();
    assert_eq!(state.stringify(), set(&[
        "clear(a)",
        "clear(b)",
        "holding(c)",
        "ontable(a)",
        "ontable(b)",
    ]));
}

#[test]
fn test_plan() {
    let pddl = blocksworld();
    assert!(pddl.is_valid_plan(&BLOCKSWORLD_PLAN).unwrap());
    assert!(!pddl.is_valid_plan(&BLOCKSWORLD_PLAN[..5]).unwrap());
    assert!(!pddl.is_valid_plan(&["pick-up(a)"]).unwrap());
    assert!(!pddl.is_valid_plan(&["unstack(c, a)", "stack(c, c)"]).unwrap());

    let tower = run(&pddl, &BLOCKSWORLD_PLAN);
    assert!(pddl.is_goal_satisfied(&tower).unwrap());
    for fact in ["above(a, c)", "above(a, b)", "above(b, c)", "clear(a)"] {
        assert!(tower.stringify().contains(fact), "{} missing", fact);
    }
}

#[test]
fn test_quantified_conditional_effect() {
    let pddl = blocksworld();
    let tower = run(&pddl, &BLOCKSWORLD_PLAN);
    let painted = |state: &pddl_symbolic::State| {
        state.stringify().into_iter().filter(|p| p.starts_with("painted")).collect::<Vec<_>>()
    };
    let middle = pddl.next_state(&tower, "paint-tower(b)").unwrap();
    assert_eq!(painted(&middle), vec!["painted(a)", "painted(b)"]);
    let all = pddl.next_state(&tower, "paint-tower(c)").unwrap();
    assert_eq!(painted(&all), vec!["painted(a)", "painted(b)", "painted(c)"]);
    assert!(pddl.is_valid_tuple(&tower, "paint-tower(c)", &all).unwrap());
    assert!(!pddl.is_valid_tuple(&tower, "paint-tower(b)", &all).unwrap());
}

#[test]
fn test_equality_excludes_same_object() {
    let pddl = blocksworld();
    let holding = pddl.next_state(pddl.initial_state(), "pick-up(b)").unwrap();
    let stacks = pddl.list_valid_arguments_str(&holding.stringify(), "stack").unwrap();
    assert_eq!(stacks, vec![vec!["b".to_owned(), "c".to_owned()]]);
    assert!(!pddl.is_valid_action(&holding, "stack(b, b)").unwrap());
}
