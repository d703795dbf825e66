//! Unit tests for scope resolution.
//!
//! Programs are assembled with the construction API, resolved, and checked
//! for either the bindings they produce or the first diagnostic.

use crate::ast::{
    ast::Program,
    declarations::{DeclId, Modifiers},
    expressions::{Expr, ExprKind, Reference},
    statements::{Stmt, StmtKind},
    types::TypeDenoter,
};
use crate::errors::errors::{Error, ErrorPolicy};
use crate::Position;

use super::{resolver::resolve, scope_table::ScopeTable};

fn string_args() -> Vec<(&'static str, TypeDenoter)> {
    vec![("args", TypeDenoter::array(TypeDenoter::class("String")))]
}

fn add_main(program: &mut Program, class: &str, body: Vec<Stmt>) -> DeclId {
    program
        .class(class)
        .method(
            "main",
            TypeDenoter::void(),
            Modifiers::STATIC,
            string_args(),
            body,
        )
        .last()
}

fn first_error(program: &mut Program) -> Error {
    let errors = resolve(program, ErrorPolicy::FailFast).unwrap_err();
    assert_eq!(errors.len(), 1);
    errors[0].clone()
}

fn body(program: &Program, class: usize, method: usize) -> &[Stmt] {
    &program.classes[class].methods[method].body
}

#[test]
fn test_same_member_names_in_different_classes() {
    let mut program = Program::new();
    program
        .class("A")
        .field("value", TypeDenoter::int(), Modifiers::PUBLIC)
        .method("get", TypeDenoter::int(), Modifiers::PUBLIC, vec![], vec![]);
    program
        .class("B")
        .field("value", TypeDenoter::int(), Modifiers::PUBLIC)
        .method("get", TypeDenoter::int(), Modifiers::PUBLIC, vec![], vec![]);

    assert!(resolve(&mut program, ErrorPolicy::FailFast).is_ok());
}

#[test]
fn test_duplicate_class() {
    let mut program = Program::new();
    program.class("A");
    program.class("A").at(7, 1);

    let error = first_error(&mut program);
    assert_eq!(error.get_error_name(), "DuplicateClass");
    assert_eq!(*error.get_position(), Position::new(7, 1));
}

#[test]
fn test_class_named_like_predefined_class() {
    let mut program = Program::new();
    program.class("System");

    assert_eq!(first_error(&mut program).get_error_name(), "DuplicateClass");
}

#[test]
fn test_field_and_method_share_namespace() {
    let mut program = Program::new();
    program
        .class("A")
        .field("x", TypeDenoter::int(), Modifiers::PUBLIC)
        .method("x", TypeDenoter::void(), Modifiers::PUBLIC, vec![], vec![])
        .at(3, 5);

    let error = first_error(&mut program);
    assert_eq!(error.get_error_name(), "DuplicateMember");
    assert_eq!(*error.get_position(), Position::new(3, 5));
}

#[test]
fn test_private_method_called_from_other_class() {
    let mut program = Program::new();
    program.class("A").method(
        "secret",
        TypeDenoter::void(),
        Modifiers::PRIVATE,
        vec![],
        vec![],
    );
    let a = program.local("a", TypeDenoter::class("A"));
    add_main(
        &mut program,
        "B",
        vec![
            Stmt::var_decl(a, Expr::new_object("A")),
            Stmt::call(Reference::id("a").member("secret").at(4, 9), vec![]),
        ],
    );

    let error = first_error(&mut program);
    assert_eq!(error.get_error_name(), "PrivateAccess");
    assert_eq!(*error.get_position(), Position::new(4, 9));
}

#[test]
fn test_private_member_visible_inside_own_class() {
    let mut program = Program::new();
    let other = program.local("other", TypeDenoter::class("A"));
    program
        .class("A")
        .field("secret", TypeDenoter::int(), Modifiers::PRIVATE)
        .method(
            "peek",
            TypeDenoter::int(),
            Modifiers::PUBLIC,
            vec![],
            vec![
                Stmt::var_decl(other, Expr::new_object("A")),
                Stmt::return_value(Expr::reference(Reference::id("other").member("secret"))),
            ],
        );

    assert!(resolve(&mut program, ErrorPolicy::FailFast).is_ok());
}

#[test]
fn test_this_in_static_method() {
    let mut program = Program::new();
    add_main(
        &mut program,
        "A",
        vec![Stmt::assign(
            Reference::this().member("x"),
            Expr::int(1),
        )],
    );

    assert_eq!(first_error(&mut program).get_error_name(), "ThisInStaticMethod");
}

#[test]
fn test_self_initialization() {
    let mut program = Program::new();
    let x = program.local("x", TypeDenoter::int());
    add_main(
        &mut program,
        "A",
        vec![Stmt::var_decl(
            x,
            Expr::binary(
                crate::ast::expressions::Operator::Plus,
                Expr::reference(Reference::id("x").at(3, 17)),
                Expr::int(1),
            ),
        )],
    );

    let error = first_error(&mut program);
    assert_eq!(error.get_error_name(), "SelfInitialization");
    assert_eq!(*error.get_position(), Position::new(3, 17));
}

#[test]
fn test_local_cannot_hide_parameter() {
    let mut program = Program::new();
    let args = program.local_at("args", TypeDenoter::int(), Position::new(3, 9));
    add_main(&mut program, "A", vec![Stmt::var_decl(args, Expr::int(0))]);

    assert_eq!(first_error(&mut program).get_error_name(), "HidesLocal");
}

#[test]
fn test_local_redeclared_in_same_scope() {
    let mut program = Program::new();
    let first = program.local("y", TypeDenoter::int());
    let second = program.local("y", TypeDenoter::int());
    add_main(
        &mut program,
        "A",
        vec![
            Stmt::var_decl(first, Expr::int(0)),
            Stmt::var_decl(second, Expr::int(1)),
        ],
    );

    assert_eq!(first_error(&mut program).get_error_name(), "AlreadyDeclared");
}

#[test]
fn test_local_may_shadow_field() {
    let mut program = Program::new();
    let count = program.local("count", TypeDenoter::boolean());
    program
        .class("A")
        .field("count", TypeDenoter::int(), Modifiers::STATIC)
        .method(
            "main",
            TypeDenoter::void(),
            Modifiers::STATIC,
            string_args(),
            vec![
                Stmt::var_decl(count, Expr::boolean(true)),
                Stmt::assign(Reference::id("count"), Expr::boolean(false)),
            ],
        );

    assert!(resolve(&mut program, ErrorPolicy::FailFast).is_ok());
    let StmtKind::Assign { target, .. } = &body(&program, 0, 0)[1].kind else {
        panic!("expected an assignment");
    };
    assert_eq!(target.decl(), Some(count));
}

#[test]
fn test_sibling_blocks_may_reuse_names() {
    let mut program = Program::new();
    let first = program.local("i", TypeDenoter::int());
    let second = program.local("i", TypeDenoter::int());
    add_main(
        &mut program,
        "A",
        vec![
            Stmt::block(vec![Stmt::var_decl(first, Expr::int(0))]),
            Stmt::block(vec![Stmt::var_decl(second, Expr::int(1))]),
        ],
    );

    assert!(resolve(&mut program, ErrorPolicy::FailFast).is_ok());
}

#[test]
fn test_instance_field_from_static_method() {
    let mut program = Program::new();
    program
        .class("A")
        .field("x", TypeDenoter::int(), Modifiers::PUBLIC)
        .method(
            "main",
            TypeDenoter::void(),
            Modifiers::STATIC,
            string_args(),
            vec![Stmt::assign(Reference::id("x"), Expr::int(1))],
        );

    assert_eq!(first_error(&mut program).get_error_name(), "StaticContext");
}

#[test]
fn test_instance_member_through_class_name() {
    let mut program = Program::new();
    program
        .class("A")
        .field("x", TypeDenoter::int(), Modifiers::PUBLIC);
    add_main(
        &mut program,
        "B",
        vec![Stmt::assign(Reference::id("A").member("x"), Expr::int(1))],
    );

    assert_eq!(first_error(&mut program).get_error_name(), "NonStaticMember");
}

#[test]
fn test_static_member_through_class_name() {
    let mut program = Program::new();
    let a = program
        .class("A")
        .field("count", TypeDenoter::int(), Modifiers::STATIC)
        .id();
    add_main(
        &mut program,
        "B",
        vec![Stmt::assign(Reference::id("A").member("count"), Expr::int(1))],
    );

    assert!(resolve(&mut program, ErrorPolicy::FailFast).is_ok());
    let count = program.find_member(a, "count");
    let StmtKind::Assign { target, .. } = &body(&program, 1, 0)[0].kind else {
        panic!("expected an assignment");
    };
    assert_eq!(target.decl(), count);
}

#[test]
fn test_undeclared_identifier() {
    let mut program = Program::new();
    add_main(
        &mut program,
        "A",
        vec![Stmt::assign(Reference::id("nope").at(2, 3), Expr::int(1))],
    );

    let error = first_error(&mut program);
    assert_eq!(error.get_error_name(), "UndeclaredIdentifier");
    assert_eq!(*error.get_position(), Position::new(2, 3));
}

#[test]
fn test_undeclared_type() {
    let mut program = Program::new();
    program
        .class("A")
        .field("b", TypeDenoter::class("Missing"), Modifiers::PUBLIC);

    assert_eq!(first_error(&mut program).get_error_name(), "UndeclaredType");

    let mut program = Program::new();
    add_main(
        &mut program,
        "A",
        vec![Stmt::call(
            Reference::id("System").member("out").member("println"),
            vec![Expr::reference(Reference::id("x"))],
        )],
    );
    assert_eq!(
        first_error(&mut program).get_error_name(),
        "UndeclaredIdentifier"
    );
}

#[test]
fn test_println_binds_predefined_method() {
    let mut program = Program::new();
    add_main(
        &mut program,
        "A",
        vec![Stmt::call(
            Reference::id("System").member("out").member("println"),
            vec![Expr::int(1)],
        )],
    );

    assert!(resolve(&mut program, ErrorPolicy::FailFast).is_ok());
    let StmtKind::Call { callee, .. } = &body(&program, 0, 0)[0].kind else {
        panic!("expected a call");
    };
    assert_eq!(callee.decl(), Some(program.predefined.println));
}

#[test]
fn test_array_length_binds_pseudo_field() {
    let mut program = Program::new();
    let n = program.local("n", TypeDenoter::int());
    add_main(
        &mut program,
        "A",
        vec![Stmt::var_decl(
            n,
            Expr::reference(Reference::id("args").member("length")),
        )],
    );

    assert!(resolve(&mut program, ErrorPolicy::FailFast).is_ok());
    let StmtKind::VarDecl { init, .. } = &body(&program, 0, 0)[0].kind else {
        panic!("expected a declaration");
    };
    let ExprKind::Ref(reference) = &init.kind else {
        panic!("expected a reference");
    };
    assert_eq!(reference.decl(), Some(program.predefined.array_length));
}

#[test]
fn test_qualifying_an_int() {
    let mut program = Program::new();
    let n = program.local("n", TypeDenoter::int());
    let m = program.local("m", TypeDenoter::int());
    add_main(
        &mut program,
        "A",
        vec![
            Stmt::var_decl(n, Expr::int(1)),
            Stmt::var_decl(m, Expr::reference(Reference::id("n").member("size"))),
        ],
    );

    assert_eq!(first_error(&mut program).get_error_name(), "NotAnObject");
}

#[test]
fn test_method_in_qualified_reference() {
    let mut program = Program::new();
    program
        .class("A")
        .field("x", TypeDenoter::int(), Modifiers::PUBLIC)
        .method("f", TypeDenoter::class("A"), Modifiers::PUBLIC, vec![], vec![
            Stmt::assign(Reference::id("f").member("x"), Expr::int(1)),
            Stmt::return_value(Expr::reference(Reference::this())),
        ]);

    assert_eq!(
        first_error(&mut program).get_error_name(),
        "MethodInQualifiedReference"
    );
}

#[test]
fn test_solitary_declaration_in_branch() {
    let mut program = Program::new();
    let x = program.local("x", TypeDenoter::int());
    add_main(
        &mut program,
        "A",
        vec![Stmt::if_then(
            Expr::boolean(true),
            Stmt::var_decl(x, Expr::int(1)).at(5, 13),
        )],
    );

    let error = first_error(&mut program);
    assert_eq!(error.get_error_name(), "SolitaryDeclaration");
    assert_eq!(*error.get_position(), Position::new(5, 13));
}

#[test]
fn test_collect_all_reports_every_violation() {
    let mut program = Program::new();
    add_main(
        &mut program,
        "A",
        vec![
            Stmt::assign(Reference::id("a"), Expr::int(1)),
            Stmt::assign(Reference::id("b"), Expr::int(2)),
            Stmt::assign(Reference::this().member("c"), Expr::int(3)),
        ],
    );

    let errors = resolve(&mut program, ErrorPolicy::CollectAll).unwrap_err();
    let names: Vec<&str> = errors.iter().map(|error| error.get_error_name()).collect();
    assert_eq!(
        names,
        vec![
            "UndeclaredIdentifier",
            "UndeclaredIdentifier",
            "ThisInStaticMethod",
            "UndeclaredMember"
        ]
    );
}

#[test]
fn test_resolving_twice_keeps_bindings() {
    let mut program = Program::new();
    let x = program.local("x", TypeDenoter::int());
    add_main(
        &mut program,
        "A",
        vec![
            Stmt::var_decl(x, Expr::int(1)),
            Stmt::assign(Reference::id("x"), Expr::int(2)),
        ],
    );

    assert!(resolve(&mut program, ErrorPolicy::FailFast).is_ok());
    let before = program.classes.clone();
    assert!(resolve(&mut program, ErrorPolicy::FailFast).is_ok());
    assert_eq!(program.classes, before);
}

#[test]
fn test_scope_table_levels() {
    let mut table = ScopeTable::new();
    let mut program = Program::new();
    let outer = program.local("v", TypeDenoter::int());
    let inner = program.local("v", TypeDenoter::int());

    table.open_scope();
    table.open_scope();
    table.enter("v", outer, Position::null()).unwrap();
    table.open_scope();
    // A member-level name may be shadowed by a parameter.
    assert!(table.enter("v", inner, Position::null()).is_ok());
    assert_eq!(table.lookup_local("v"), Some(inner));

    table.open_scope();
    let error = table.enter("v", outer, Position::null()).unwrap_err();
    assert_eq!(error.get_error_name(), "HidesLocal");
    table.close_scope();
    table.close_scope();

    assert_eq!(table.lookup_local("v"), None);
    assert_eq!(table.level(), 2);
}
