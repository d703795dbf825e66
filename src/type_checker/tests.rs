//! Unit tests for the type checker.
//!
//! This module contains tests for the structural type equality relation and
//! for the checking rules of expressions and statements.

use crate::ast::{
    ast::Program,
    declarations::Modifiers,
    expressions::{Expr, Operator, Reference},
    statements::{Stmt, StmtKind},
    types::{TypeDenoter, TypeKind},
};
use crate::errors::errors::{Error, ErrorPolicy};
use crate::resolver::resolver::resolve;

use super::{equality::types_equal, type_checker::type_check};

fn string_args() -> Vec<(&'static str, TypeDenoter)> {
    vec![("args", TypeDenoter::array(TypeDenoter::class("String")))]
}

/// Resolves and type checks a program whose only class `A` has a static
/// `main` with `body`.
fn check_main(program: &mut Program, body: Vec<Stmt>) -> Result<(), Vec<Error>> {
    program.class("A").method(
        "main",
        TypeDenoter::void(),
        Modifiers::STATIC,
        string_args(),
        body,
    );
    check(program)
}

fn check(program: &mut Program) -> Result<(), Vec<Error>> {
    resolve(program, ErrorPolicy::FailFast).expect("program should resolve");
    type_check(program, ErrorPolicy::FailFast)
}

fn error_name(result: Result<(), Vec<Error>>) -> String {
    let errors = result.unwrap_err();
    errors[0].get_error_name().to_string()
}

#[test]
fn test_equality_reflexive() {
    let mut program = Program::new();
    let class = program.class("A").id();
    resolve(&mut program, ErrorPolicy::FailFast).unwrap();
    let a = program.decls[class].ty.clone();

    for ty in [
        TypeDenoter::int(),
        TypeDenoter::boolean(),
        TypeDenoter::void(),
        TypeDenoter::null(),
        a.clone(),
        TypeDenoter::array(TypeDenoter::int()),
        TypeDenoter::array(a.clone()),
    ] {
        assert!(types_equal(&program.decls, &ty, &ty), "{} != {}", ty, ty);
    }
}

#[test]
fn test_equality_null_and_error() {
    let program = Program::new();
    let decls = &program.decls;
    let print_stream = program.decls[program.predefined.out].ty.clone();

    assert!(types_equal(
        decls,
        &TypeDenoter::array(TypeDenoter::int()),
        &TypeDenoter::null()
    ));
    assert!(types_equal(decls, &TypeDenoter::null(), &print_stream));
    assert!(types_equal(decls, &TypeDenoter::error(), &TypeDenoter::unsupported()));
    assert!(!types_equal(
        decls,
        &TypeDenoter::unsupported(),
        &TypeDenoter::unsupported()
    ));
    assert!(!types_equal(decls, &TypeDenoter::int(), &TypeDenoter::null()));
    assert!(!types_equal(
        decls,
        &TypeDenoter::array(TypeDenoter::int()),
        &TypeDenoter::int()
    ));
    assert!(!types_equal(
        decls,
        &TypeDenoter::array(TypeDenoter::int()),
        &TypeDenoter::array(TypeDenoter::boolean())
    ));
}

#[test]
fn test_equality_classes() {
    let program = Program::new();
    let decls = &program.decls;
    let predefined = program.predefined;

    let print_stream = decls[predefined.out].ty.clone();
    let system = decls[predefined.system].ty.clone();
    let string = crate::ast::declarations::class_type_of("String", predefined.string);

    assert!(types_equal(decls, &print_stream, &print_stream.clone()));
    assert!(!types_equal(decls, &print_stream, &system));
    // String's class type is unsupported, so not even String equals String.
    assert!(!types_equal(decls, &string, &string));
    // Unresolved class names never match.
    assert!(!types_equal(
        decls,
        &TypeDenoter::class("Ghost"),
        &TypeDenoter::class("Ghost")
    ));
}

#[test]
fn test_arithmetic_and_comparison_types() {
    let mut program = Program::new();
    let sum = program.local("sum", TypeDenoter::int());
    let less = program.local("less", TypeDenoter::boolean());
    let result = check_main(
        &mut program,
        vec![
            Stmt::var_decl(
                sum,
                Expr::binary(
                    Operator::Times,
                    Expr::int(2),
                    Expr::binary(Operator::Minus, Expr::int(5), Expr::int(1)),
                ),
            ),
            Stmt::var_decl(
                less,
                Expr::binary(Operator::LessEqual, Expr::id("sum"), Expr::int(3)),
            ),
        ],
    );
    assert!(result.is_ok());

    let body = &program.classes[0].methods[0].body;
    let StmtKind::VarDecl { init, .. } = &body[0].kind else {
        panic!("expected a declaration");
    };
    assert_eq!(init.ty, Some(TypeDenoter::int()));
    let StmtKind::VarDecl { init, .. } = &body[1].kind else {
        panic!("expected a declaration");
    };
    assert_eq!(init.ty, Some(TypeDenoter::boolean()));
}

#[test]
fn test_operand_type_error() {
    let mut program = Program::new();
    let x = program.local("x", TypeDenoter::int());
    let result = check_main(
        &mut program,
        vec![Stmt::var_decl(
            x,
            Expr::binary(Operator::Plus, Expr::int(1), Expr::boolean(true)),
        )],
    );

    assert_eq!(error_name(result), "OperandTypeError");
}

#[test]
fn test_error_type_suppresses_cascade() {
    let mut program = Program::new();
    let x = program.local("x", TypeDenoter::int());
    program.class("A").method(
        "main",
        TypeDenoter::void(),
        Modifiers::STATIC,
        string_args(),
        vec![Stmt::var_decl(
            x,
            Expr::binary(
                Operator::Times,
                Expr::binary(Operator::Plus, Expr::int(1), Expr::boolean(true)),
                Expr::int(3),
            ),
        )],
    );
    resolve(&mut program, ErrorPolicy::FailFast).unwrap();

    let errors = type_check(&mut program, ErrorPolicy::CollectAll).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].get_error_name(), "OperandTypeError");
}

#[test]
fn test_equality_operator_requires_compatible_operands() {
    let mut program = Program::new();
    let ok = program.local("ok", TypeDenoter::boolean());
    let bad = program.local("bad", TypeDenoter::boolean());
    let result = check_main(
        &mut program,
        vec![
            Stmt::var_decl(
                ok,
                Expr::binary(Operator::Equal, Expr::id("args"), Expr::null()),
            ),
            Stmt::var_decl(
                bad,
                Expr::binary(Operator::NotEqual, Expr::int(1), Expr::boolean(false)),
            ),
        ],
    );

    assert_eq!(error_name(result), "OperandTypeError");
}

#[test]
fn test_condition_must_be_boolean() {
    let mut program = Program::new();
    let result = check_main(
        &mut program,
        vec![Stmt::while_loop(Expr::int(1), Stmt::block(vec![]))],
    );

    assert_eq!(error_name(result), "ConditionNotBoolean");
}

#[test]
fn test_call_argument_rules() {
    let mut program = Program::new();
    program
        .class("A")
        .method(
            "main",
            TypeDenoter::void(),
            Modifiers::STATIC,
            string_args(),
            vec![Stmt::call(Reference::id("f"), vec![Expr::int(1)])],
        )
        .method(
            "f",
            TypeDenoter::int(),
            Modifiers::STATIC,
            vec![("a", TypeDenoter::int()), ("b", TypeDenoter::boolean())],
            vec![Stmt::return_value(Expr::id("a"))],
        );
    assert_eq!(error_name(check(&mut program)), "UnexpectedArguments");

    let mut program = Program::new();
    program
        .class("A")
        .method(
            "main",
            TypeDenoter::void(),
            Modifiers::STATIC,
            string_args(),
            vec![Stmt::call(
                Reference::id("f"),
                vec![Expr::int(1), Expr::int(2)],
            )],
        )
        .method(
            "f",
            TypeDenoter::int(),
            Modifiers::STATIC,
            vec![("a", TypeDenoter::int()), ("b", TypeDenoter::boolean())],
            vec![Stmt::return_value(Expr::id("a"))],
        );
    let errors = check(&mut program).unwrap_err();
    assert_eq!(errors[0].get_error_name(), "ArgumentTypeMatchError");
    assert_eq!(
        errors[0].get_tip().to_string(),
        "Argument 2 expected type `boolean`, received `int`"
    );
}

#[test]
fn test_call_yields_return_type() {
    let mut program = Program::new();
    let n = program.local("n", TypeDenoter::int());
    program
        .class("A")
        .method(
            "main",
            TypeDenoter::void(),
            Modifiers::STATIC,
            string_args(),
            vec![Stmt::var_decl(
                n,
                Expr::call(Reference::id("seven"), vec![]),
            )],
        )
        .method(
            "seven",
            TypeDenoter::int(),
            Modifiers::STATIC,
            vec![],
            vec![Stmt::return_value(Expr::int(7))],
        );

    assert!(check(&mut program).is_ok());
}

#[test]
fn test_return_rules() {
    let mut program = Program::new();
    program.class("A").method(
        "f",
        TypeDenoter::int(),
        Modifiers::PUBLIC,
        vec![],
        vec![Stmt::if_else(
            Expr::boolean(true),
            Stmt::block(vec![Stmt::return_value(Expr::int(1))]),
            Stmt::block(vec![Stmt::return_value(Expr::boolean(false))]),
        )],
    );
    assert_eq!(error_name(check(&mut program)), "ReturnTypeMatchError");

    let mut program = Program::new();
    program.class("A").method(
        "f",
        TypeDenoter::int(),
        Modifiers::PUBLIC,
        vec![],
        vec![Stmt::return_void()],
    );
    assert_eq!(error_name(check(&mut program)), "MissingReturnValue");

    let mut program = Program::new();
    let result = check_main(&mut program, vec![Stmt::return_value(Expr::int(0))]);
    assert_eq!(error_name(result), "ReturnTypeMatchError");
}

#[test]
fn test_indexing_rules() {
    let mut program = Program::new();
    let numbers = program.local("numbers", TypeDenoter::array(TypeDenoter::int()));
    let first = program.local("first", TypeDenoter::int());
    let result = check_main(
        &mut program,
        vec![
            Stmt::var_decl(
                numbers,
                Expr::new_array(TypeDenoter::int(), Expr::int(4)),
            ),
            Stmt::index_assign(Reference::id("numbers"), Expr::int(0), Expr::int(9)),
            Stmt::var_decl(first, Expr::index(Reference::id("numbers"), Expr::int(0))),
        ],
    );
    assert!(result.is_ok());

    let mut program = Program::new();
    let numbers = program.local("numbers", TypeDenoter::array(TypeDenoter::int()));
    let result = check_main(
        &mut program,
        vec![
            Stmt::var_decl(
                numbers,
                Expr::new_array(TypeDenoter::int(), Expr::int(4)),
            ),
            Stmt::index_assign(Reference::id("numbers"), Expr::boolean(true), Expr::int(9)),
        ],
    );
    assert_eq!(error_name(result), "IndexNotInt");

    let mut program = Program::new();
    let n = program.local("n", TypeDenoter::int());
    let result = check_main(
        &mut program,
        vec![
            Stmt::var_decl(n, Expr::int(3)),
            Stmt::index_assign(Reference::id("n"), Expr::int(0), Expr::int(9)),
        ],
    );
    assert_eq!(error_name(result), "NotAnArray");

    let mut program = Program::new();
    let numbers = program.local("numbers", TypeDenoter::array(TypeDenoter::int()));
    let result = check_main(
        &mut program,
        vec![Stmt::var_decl(
            numbers,
            Expr::new_array(TypeDenoter::int(), Expr::boolean(true)),
        )],
    );
    assert_eq!(error_name(result), "ArraySizeNotInt");
}

#[test]
fn test_array_length_is_read_only() {
    let mut program = Program::new();
    let n = program.local("n", TypeDenoter::int());
    let result = check_main(
        &mut program,
        vec![Stmt::var_decl(
            n,
            Expr::reference(Reference::id("args").member("length")),
        )],
    );
    assert!(result.is_ok());

    let mut program = Program::new();
    let result = check_main(
        &mut program,
        vec![Stmt::assign(
            Reference::id("args").member("length"),
            Expr::int(3),
        )],
    );
    assert_eq!(error_name(result), "ReadOnlyLength");
}

#[test]
fn test_class_and_method_are_not_values() {
    let mut program = Program::new();
    let a = program.local("a", TypeDenoter::class("A"));
    let result = check_main(&mut program, vec![Stmt::var_decl(a, Expr::id("A"))]);
    assert_eq!(error_name(result), "ClassAsValue");

    let mut program = Program::new();
    let n = program.local("n", TypeDenoter::int());
    let result = check_main(&mut program, vec![Stmt::var_decl(n, Expr::id("main"))]);
    assert_eq!(error_name(result), "MethodAsValue");

    let mut program = Program::new();
    let result = check_main(
        &mut program,
        vec![Stmt::assign(Reference::id("main"), Expr::int(1))],
    );
    assert_eq!(error_name(result), "InvalidAssignmentTarget");
}

#[test]
fn test_null_assignable_to_objects_and_arrays() {
    let mut program = Program::new();
    let a = program.local("a", TypeDenoter::class("A"));
    let result = check_main(
        &mut program,
        vec![
            Stmt::var_decl(a, Expr::null()),
            Stmt::assign(Reference::id("args"), Expr::null()),
        ],
    );
    assert!(result.is_ok());
}

#[test]
fn test_string_values_are_unsupported() {
    let mut program = Program::new();
    let s = program.local("s", TypeDenoter::class("String"));
    let result = check_main(
        &mut program,
        vec![Stmt::var_decl(s, Expr::index(Reference::id("args"), Expr::int(0)))],
    );
    assert_eq!(error_name(result), "TypeMatchError");
}

#[test]
fn test_println_takes_one_int() {
    let mut program = Program::new();
    let result = check_main(
        &mut program,
        vec![Stmt::call(
            Reference::id("System").member("out").member("println"),
            vec![Expr::boolean(true)],
        )],
    );
    assert_eq!(error_name(result), "ArgumentTypeMatchError");
}

#[test]
fn test_type_check_twice_keeps_types() {
    let mut program = Program::new();
    let x = program.local("x", TypeDenoter::int());
    let result = check_main(
        &mut program,
        vec![
            Stmt::var_decl(x, Expr::int(1)),
            Stmt::assign(
                Reference::id("x"),
                Expr::unary(Operator::Minus, Expr::id("x")),
            ),
        ],
    );
    assert!(result.is_ok());

    let before = program.classes.clone();
    assert!(type_check(&mut program, ErrorPolicy::FailFast).is_ok());
    assert_eq!(program.classes, before);

    let StmtKind::Assign { value, .. } = &program.classes[0].methods[0].body[1].kind else {
        panic!("expected an assignment");
    };
    assert!(value.ty.as_ref().is_some_and(|ty| ty.is_kind(TypeKind::Int)));
}
