//! Template inheritance tests
//!
//! Definition, construction, subtype binding and scoped dispatch, driven
//! through surface syntax.

use imp::interp::RuntimeError;
use imp::{Outcome, Session};
use pretty_assertions::assert_eq;

fn execute(session: &mut Session, source: &str) -> Result<Vec<Outcome>, RuntimeError> {
    let units = imp::parse(source).expect("source should parse");
    units.iter().map(|unit| session.execute(unit)).collect()
}

fn output(source: &str) -> Vec<String> {
    let mut session = Session::new();
    if let Err(e) = execute(&mut session, source) {
        panic!("Interpretation failed: {}", e);
    }
    session.take_output()
}

fn fault(source: &str) -> RuntimeError {
    let mut session = Session::new();
    match execute(&mut session, source) {
        Ok(_) => panic!("Expected a runtime fault"),
        Err(e) => e,
    }
}

/// `A(x)` with `show` and `peek`; `B(y)` passes `y` up as `x`, overrides
/// `show` and adds `extra`
const HIERARCHY: &str = r#"
class (A Object (x) () ((show () print x;) (peek () print x;)))
class (B A (y) (y) ((show () print (+ y 100);) (extra () print "extra";)))
"#;

fn with_hierarchy(rest: &str) -> String {
    format!("{}\n{}", HIERARCHY, rest)
}

// ==================== Definition ====================

#[test]
fn test_definition_messages_use_full_names() {
    let mut session = Session::new();
    let outcomes = execute(&mut session, HIERARCHY).unwrap();
    assert_eq!(
        outcomes,
        vec![
            Outcome::Defined("A.Object defined".into()),
            Outcome::Defined("B.A.Object defined".into()),
        ]
    );
}

#[test]
fn test_concrete_template_with_stub_is_rejected() {
    let source = r#"
        absclass (Shape Object () () ((area () <>)))
        class (Blob Shape () () ())
    "#;
    assert_eq!(
        fault(source),
        RuntimeError::AbstractMethodContract {
            template: "Blob.Shape.Object".into(),
            method: "area".into(),
        }
    );
}

#[test]
fn test_abstract_template_may_keep_stubs() {
    let source = r#"
        absclass (Shape Object () () ((area () <>)))
        absclass (Blob Shape () () ())
    "#;
    let mut session = Session::new();
    assert!(execute(&mut session, source).is_ok());
}

#[test]
fn test_concrete_template_with_own_stub_is_rejected() {
    assert!(matches!(
        fault("class (Half Object () () ((todo () <>)))"),
        RuntimeError::AbstractMethodContract { .. }
    ));
}

#[test]
fn test_superclass_must_be_a_template() {
    assert_eq!(
        fault("var n = 1; class (A n () () ())"),
        RuntimeError::TypeMismatch {
            context: "class definition".into(),
            expected: "template".into(),
            found: "integer".into(),
        }
    );
}

// ==================== Construction ====================

#[test]
fn test_superclass_arguments_reach_parent_level() {
    assert_eq!(
        output(&with_hierarchy("obj B b = new B(5)\n(with b peek ())")),
        vec!["5"]
    );
}

#[test]
fn test_superclass_arguments_see_leaf_parameters() {
    let source = r#"
        class (P Object (p) () ((show () print p;)))
        class (C P (c) ((* c 2)) ())
        obj C o = new C(21)
        (with o show ())
    "#;
    assert_eq!(output(source), vec!["42"]);
}

#[test]
fn test_constructor_arity() {
    assert_eq!(
        fault(&with_hierarchy("obj B b = new B()")),
        RuntimeError::Arity {
            callee: "B.A.Object".into(),
            expected: 1,
            received: 0,
        }
    );
}

#[test]
fn test_abstract_template_cannot_be_instantiated() {
    let source = r#"
        absclass (Shape Object () () ((area () <>)))
        obj Shape s = new Shape()
    "#;
    assert_eq!(
        fault(source),
        RuntimeError::AbstractInstantiation {
            template: "Shape.Object".into()
        }
    );
}

// ==================== Binding ====================

#[test]
fn test_assignment_message_names_both_templates() {
    let mut session = Session::new();
    let outcomes = execute(&mut session, &with_hierarchy("obj A a = new B(1)")).unwrap();
    assert_eq!(
        outcomes.last(),
        Some(&Outcome::Defined(
            "a of type A.Object got assigned a B.A.Object object".into()
        ))
    );
}

#[test]
fn test_binding_to_descendant_type_fails() {
    assert_eq!(
        fault(&with_hierarchy("obj B b = new A(1)")),
        RuntimeError::SubtypeMismatch {
            object_type: "A.Object".into(),
            expected_type: "B.A.Object".into(),
        }
    );
}

#[test]
fn test_binding_to_unrelated_type_fails() {
    let source = with_hierarchy(
        r#"
        class (Z Object () () ())
        obj Z z = new A(1)
        "#,
    );
    assert!(matches!(fault(&source), RuntimeError::SubtypeMismatch { .. }));
}

#[test]
fn test_every_template_binds_to_root() {
    assert_eq!(
        output(&with_hierarchy("obj Object o = new B(1)\nprint o;")),
        vec!["<object binding <template Object> <object of type B.A.Object>>"]
    );
}

#[test]
fn test_binding_survives_parent_redeclaration() {
    let source = r#"
        class (A Object () () ((m () print 1;)))
        class (B A () () ())
        class (A Object () () ((m () print 2;)))
        obj A o = new B()
        (with o m ())
    "#;
    // `B` still holds the first `A`, whose method the object runs
    assert_eq!(output(source), vec!["1"]);
}

#[test]
fn test_binding_matches_whole_level_names() {
    let source = r#"
        class (A Object () () ())
        class (BA Object () () ())
        obj A o = new BA()
    "#;
    assert_eq!(
        fault(source),
        RuntimeError::SubtypeMismatch {
            object_type: "BA.Object".into(),
            expected_type: "A.Object".into(),
        }
    );
}

// ==================== Dispatch ====================

#[test]
fn test_with_runs_most_derived_override() {
    assert_eq!(
        output(&with_hierarchy("obj A a = new B(1)\n(with a show ())")),
        vec!["101"]
    );
}

#[test]
fn test_abstract_ancestor_dispatches_to_override() {
    let source = r#"
        absclass (Shape Object () () ((area () <>)))
        class (Square Shape (side) () ((area () print (* side side);)))
        obj Shape s = new Square(3)
        (with s area ())
    "#;
    assert_eq!(output(source), vec!["9"]);
}

#[test]
fn test_method_not_visible_at_bound_level() {
    assert_eq!(
        fault(&with_hierarchy("obj A a = new B(1)\n(with a extra ())")),
        RuntimeError::InaccessibleMethod {
            method: "extra".into(),
            template: "A.Object".into(),
        }
    );
    assert_eq!(
        output(&with_hierarchy("obj B b = new B(1)\n(with b extra ())")),
        vec!["extra"]
    );
}

#[test]
fn test_method_arguments_evaluate_in_caller_scope() {
    let source = r#"
        class (Acc Object (base) () ((add (n) print (+ base n);)))
        obj Acc acc = new Acc(10)
        var k = 7;
        (with acc add (k))
    "#;
    assert_eq!(output(source), vec!["17"]);
}

#[test]
fn test_method_arity() {
    let source = r#"
        class (Acc Object (base) () ((add (n) print (+ base n);)))
        obj Acc acc = new Acc(10)
        (with acc add ())
    "#;
    assert_eq!(
        fault(source),
        RuntimeError::Arity {
            callee: "add".into(),
            expected: 1,
            received: 0,
        }
    );
}

#[test]
fn test_methods_update_object_state() {
    let source = r#"
        class (Counter Object (n) () ((tick () n <- (+ n 1);) (show () print n;)))
        obj Counter c = new Counter(0)
        (with c tick ())
        (with c tick ())
        (with c show ())
    "#;
    assert_eq!(output(source), vec!["2"]);
}

#[test]
fn test_with_target_must_be_a_binding() {
    assert_eq!(
        fault("var x = 1; (with x show ())"),
        RuntimeError::TypeMismatch {
            context: "with".into(),
            expected: "object binding".into(),
            found: "integer".into(),
        }
    );
}

#[test]
fn test_with_statement_yields_none() {
    let mut session = Session::new();
    let outcomes = execute(&mut session, &with_hierarchy("obj A a = new A(1)\n(with a show ())")).unwrap();
    assert_eq!(outcomes.last(), Some(&Outcome::Completed(imp::Value::None)));
}
