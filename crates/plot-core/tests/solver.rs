// File: crates/plot-core/tests/solver.rs
// Purpose: Cassowary solver behavior: strengths, edit variables, removal and error cases.

use plot_core::solver::{strength, Constraint, Solver, SolverError, Variable};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn required_beats_weak() {
    let mut s = Solver::new();
    let x = Variable::new();
    s.add_constraint(Constraint::ge(x, 10.0, strength::REQUIRED)).expect("ge");
    s.add_constraint(Constraint::eq(x, 0.0, strength::WEAK)).expect("eq");
    s.update_variables();
    assert!(approx(s.value(x), 10.0), "{}", s.value(x));
}

#[test]
fn stronger_preference_wins() {
    let mut s = Solver::new();
    let x = Variable::new();
    s.add_constraint(Constraint::eq(x, 20.0, strength::WEAK)).expect("weak");
    s.add_constraint(Constraint::eq(x, 10.0, strength::STRONG)).expect("strong");
    s.update_variables();
    assert!(approx(s.value(x), 10.0));
}

#[test]
fn expressions_combine_variables() {
    let mut s = Solver::new();
    let (a, b) = (Variable::new(), Variable::new());
    s.add_constraint(Constraint::eq(a + b, 10.0, strength::REQUIRED)).expect("sum");
    s.add_constraint(Constraint::eq(a, 3.0, strength::MEDIUM)).expect("a");
    s.add_constraint(Constraint::eq(b * 2.0 - a, 11.0, strength::REQUIRED)).expect("mix");
    s.update_variables();
    assert!(approx(s.value(a), 3.0));
    assert!(approx(s.value(b), 7.0));
}

#[test]
fn edit_variables_follow_suggestions() {
    let mut s = Solver::new();
    let x = Variable::new();
    s.add_edit_variable(x, strength::STRONG).expect("edit");
    assert!(s.has_edit_variable(x));

    s.suggest_value(x, 42.0).expect("suggest");
    s.update_variables();
    assert!(approx(s.value(x), 42.0));

    let cap = s.add_constraint(Constraint::le(x, 30.0, strength::REQUIRED)).expect("cap");
    s.update_variables();
    assert!(approx(s.value(x), 30.0));

    s.remove_constraint(cap).expect("remove");
    assert!(!s.has_constraint(cap));
    s.suggest_value(x, 42.0).expect("suggest again");
    s.update_variables();
    assert!(approx(s.value(x), 42.0));

    for v in [5.0, 500.0, -3.0] {
        s.suggest_value(x, v).expect("drag");
        s.update_variables();
        assert!(approx(s.value(x), v));
    }
}

#[test]
fn dependent_variables_track_edits() {
    let mut s = Solver::new();
    let (w, half) = (Variable::new(), Variable::new());
    s.add_constraint(Constraint::eq(half * 2.0, w, strength::REQUIRED)).expect("half");
    s.add_edit_variable(w, strength::STRONG).expect("edit");
    for v in [100.0, 640.0, 1.0] {
        s.suggest_value(w, v).expect("suggest");
        s.update_variables();
        assert!(approx(s.value(half), v / 2.0));
    }
}

#[test]
fn conflicting_required_constraints_fail() {
    let mut s = Solver::new();
    let x = Variable::new();
    s.add_constraint(Constraint::eq(x, 1.0, strength::REQUIRED)).expect("first");
    let err = s.add_constraint(Constraint::eq(x, 2.0, strength::REQUIRED));
    assert_eq!(err, Err(SolverError::Unsatisfiable));
}

#[test]
fn edit_variable_errors() {
    let mut s = Solver::new();
    let x = Variable::new();
    assert_eq!(s.suggest_value(x, 1.0), Err(SolverError::UnknownEditVariable));
    assert_eq!(s.add_edit_variable(x, strength::REQUIRED), Err(SolverError::BadRequiredStrength));
    s.add_edit_variable(x, strength::MEDIUM).expect("edit");
    assert_eq!(s.add_edit_variable(x, strength::WEAK), Err(SolverError::DuplicateEditVariable));
    s.remove_edit_variable(x).expect("remove");
    assert_eq!(s.remove_edit_variable(x), Err(SolverError::UnknownEditVariable));
}

#[test]
fn reset_clears_everything() {
    let mut s = Solver::new();
    let x = Variable::new();
    s.add_constraint(Constraint::eq(x, 4.0, strength::REQUIRED)).expect("eq");
    assert_eq!(s.constraint_count(), 1);
    s.reset();
    assert_eq!(s.constraint_count(), 0);
    s.add_constraint(Constraint::eq(x, 9.0, strength::REQUIRED)).expect("eq after reset");
    s.update_variables();
    assert!(approx(s.value(x), 9.0));
}

#[test]
fn strength_helpers() {
    assert_eq!(strength::create(1.0, 0.0, 0.0, 1.0), strength::STRONG);
    assert_eq!(strength::clip(1e12), strength::REQUIRED);
    assert_eq!(strength::clip(-5.0), 0.0);
    assert!(strength::REQUIRED > strength::STRONG);
    assert!(strength::STRONG > strength::MEDIUM && strength::MEDIUM > strength::WEAK);
}
